//! Wiring: builds agents and their collaborators from configuration

use std::sync::Arc;
use std::time::Duration;

use eyre::{Context, Result};
use tracing::{debug, info, warn};

use crate::agents::{AgentDeps, EfficiencyAgent, QaAgent, SearchAgent, SprintAgent};
use crate::config::Config;
use crate::domain::Inventory;
use crate::llm::{LlmClient, create_client};
use crate::pipeline::PlanningPipeline;
use crate::prompts::PromptLoader;
use crate::state::StateManager;
use crate::tools::{DocRetriever, GlossaryTool, ResourceMatcherTool, ToolExecutor, WebSearchTool};

/// Open the HubStore, seeding the sample inventory into an empty store
pub async fn open_state(config: &Config) -> Result<StateManager> {
    debug!(dir = %config.storage.hubstore_dir.display(), "open_state: called");
    let state = StateManager::spawn(&config.storage.hubstore_dir).context("Failed to open HubStore")?;

    let inventory = state.inventory().await?;
    if inventory.is_empty() {
        let sample = Inventory::sample()?;
        let count = state.upsert_inventory(sample).await?;
        info!(count, "Seeded sample inventory into empty HubStore");
    }
    Ok(state)
}

/// Tool executor over the configured corpus, web search, glossary and inventory
pub fn build_tools(config: &Config, state: StateManager) -> Result<ToolExecutor> {
    debug!("build_tools: called");
    let timeout = Duration::from_millis(config.tools.timeout_ms);
    let mut tools = ToolExecutor::new(timeout)
        .with_tool(Arc::new(GlossaryTool::embedded()?))
        .with_tool(Arc::new(ResourceMatcherTool::new(state)));

    match DocRetriever::open(&config.storage.docstore_dir, config.tools.retrieval.top_k) {
        Ok(retriever) => tools = tools.with_retriever(Arc::new(retriever)),
        Err(e) => warn!(error = %e, "DocStore unavailable, retrieval disabled"),
    }

    if config.tools.web_search.enabled {
        tools.add_tool(Arc::new(WebSearchTool::from_config(&config.tools.web_search, timeout)?));
    }

    info!(tools = ?tools.tool_names(), "Tool executor ready");
    Ok(tools)
}

/// Everything the LLM-backed commands need
#[derive(Clone)]
pub struct Hub {
    pub deps: AgentDeps,
    pub state: StateManager,
    passage_limit: usize,
}

impl Hub {
    /// Build from configuration with the configured LLM provider
    pub async fn build(config: &Config) -> Result<Self> {
        debug!("Hub::build: called");
        config.validate()?;
        let llm = create_client(&config.llm).context("Failed to create LLM client")?;
        Self::with_llm(config, llm).await
    }

    /// Build with a caller-supplied LLM client
    pub async fn with_llm(config: &Config, llm: Arc<dyn LlmClient>) -> Result<Self> {
        debug!("Hub::with_llm: called");
        let state = open_state(config).await?;
        let tools = build_tools(config, state.clone())?;
        let prompts = PromptLoader::from_config(&config.prompts);
        Ok(Self {
            deps: AgentDeps::new(llm, Arc::new(prompts), Arc::new(tools)),
            state,
            passage_limit: config.tools.retrieval.top_k,
        })
    }

    fn search(&self) -> SearchAgent {
        SearchAgent::new(self.deps.clone()).with_passage_limit(self.passage_limit)
    }

    pub fn pipeline(&self) -> PlanningPipeline {
        PlanningPipeline::new(self.deps.clone()).with_search(self.search())
    }

    pub fn qa(&self) -> QaAgent {
        QaAgent::new(self.deps.clone()).with_search(self.search())
    }

    pub fn sprint(&self) -> SprintAgent {
        SprintAgent::new(self.deps.clone(), self.state.clone())
    }

    pub fn efficiency(&self) -> EfficiencyAgent {
        EfficiencyAgent::new(self.deps.clone(), self.state.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::mock::MockLlmClient;
    use crate::tools::{GLOSSARY_TOOL, RESOURCE_MATCHER_TOOL, WEB_SEARCH_TOOL};
    use tempfile::TempDir;

    fn test_config(temp: &TempDir) -> Config {
        let mut config = Config::default();
        config.storage.hubstore_dir = temp.path().join("hub");
        config.storage.docstore_dir = temp.path().join("docs");
        config.tools.web_search.enabled = false;
        config
    }

    #[tokio::test]
    async fn test_open_state_seeds_inventory_once() {
        let temp = TempDir::new().unwrap();
        let config = test_config(&temp);

        let state = open_state(&config).await.unwrap();
        let seeded = state.inventory().await.unwrap();
        assert!(!seeded.personnel.is_empty());
        state.shutdown().await.unwrap();

        let state = open_state(&config).await.unwrap();
        let reopened = state.inventory().await.unwrap();
        assert_eq!(reopened.personnel.len(), seeded.personnel.len());
    }

    #[tokio::test]
    async fn test_build_tools_respects_web_search_flag() {
        let temp = TempDir::new().unwrap();
        let mut config = test_config(&temp);
        let state = StateManager::spawn(&config.storage.hubstore_dir).unwrap();

        let tools = build_tools(&config, state.clone()).unwrap();
        assert!(tools.has_tool(GLOSSARY_TOOL));
        assert!(tools.has_tool(RESOURCE_MATCHER_TOOL));
        assert!(!tools.has_tool(WEB_SEARCH_TOOL));

        config.tools.web_search.enabled = true;
        let tools = build_tools(&config, state).unwrap();
        assert!(tools.has_tool(WEB_SEARCH_TOOL));
    }

    #[tokio::test]
    async fn test_hub_with_scripted_llm() {
        let temp = TempDir::new().unwrap();
        let config = test_config(&temp);
        let llm = Arc::new(MockLlmClient::with_texts(&["out_of_scope"]));

        let hub = Hub::with_llm(&config, llm.clone()).await.unwrap();
        let answer = hub.qa().answer("Who won the match?").await.unwrap();
        assert_eq!(answer.answer, crate::agents::OUT_OF_SCOPE_REPLY);
        assert_eq!(llm.call_count(), 1);
    }
}
