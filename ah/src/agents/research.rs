//! Search/QA research agent

use serde::Serialize;
use tracing::{debug, info};

use super::{AgentDeps, AgentError, section};
use crate::tools::{GLOSSARY_TOOL, WEB_SEARCH_TOOL};

/// Maximum passages folded into a prompt by default
pub const DEFAULT_PASSAGE_LIMIT: usize = 5;

/// The three research sections, in prompt order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResearchContext {
    /// Retrieved passages joined by blank lines
    pub retrieval: String,
    pub web: String,
    pub glossary: String,
}

impl ResearchContext {
    /// Copy with blank sections replaced by the no-data marker
    pub fn for_prompt(&self) -> Self {
        Self {
            retrieval: section(&self.retrieval).to_string(),
            web: section(&self.web).to_string(),
            glossary: section(&self.glossary).to_string(),
        }
    }
}

/// Aggregates retrieval, web search and glossary lookups into one synthesis
#[derive(Clone)]
pub struct SearchAgent {
    deps: AgentDeps,
    passage_limit: usize,
}

impl SearchAgent {
    pub fn new(deps: AgentDeps) -> Self {
        Self {
            deps,
            passage_limit: DEFAULT_PASSAGE_LIMIT,
        }
    }

    /// Override how many passages reach the prompt
    pub fn with_passage_limit(mut self, limit: usize) -> Self {
        self.passage_limit = limit;
        self
    }

    /// Run the three lookups concurrently
    ///
    /// Each lookup fails independently into an empty section.
    pub async fn gather(&self, query: &str) -> ResearchContext {
        debug!(%query, "SearchAgent::gather: called");
        let tools = &self.deps.tools;
        let (passages, web, glossary) = tokio::join!(
            tools.retrieve_passages(query, self.passage_limit),
            tools.run_tool(WEB_SEARCH_TOOL, query),
            tools.run_tool(GLOSSARY_TOOL, query),
        );

        let retrieval = passages
            .iter()
            .map(|p| p.text.trim())
            .collect::<Vec<_>>()
            .join("\n\n");

        debug!(
            passages = passages.len(),
            web_len = web.len(),
            glossary_len = glossary.len(),
            "SearchAgent::gather: lookups done"
        );
        ResearchContext {
            retrieval,
            web,
            glossary,
        }
    }

    /// Research a fault or question and return the synthesized analysis
    pub async fn run(&self, query: &str) -> Result<String, AgentError> {
        info!(%query, "Running research agent");
        let research = self.gather(query).await.for_prompt();

        self.deps
            .ask(
                "research",
                &serde_json::json!({
                    "query": query,
                    "retrieval": research.retrieval,
                    "web": research.web,
                    "glossary": research.glossary,
                }),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::NO_DATA;
    use crate::agents::test_support::deps_with;
    use crate::llm::client::mock::MockLlmClient;
    use crate::tools::{GlossaryTool, Retriever, Tool, ToolError, ToolExecutor};
    use async_trait::async_trait;
    use docstore::Passage;
    use std::sync::Arc;

    struct FixedRetriever(usize);

    #[async_trait]
    impl Retriever for FixedRetriever {
        async fn retrieve(&self, _query: &str) -> Result<Vec<Passage>, ToolError> {
            Ok((1..=self.0)
                .map(|n| Passage {
                    chunk_ref: format!("ctx/{:04}", n),
                    source: "amt.md".to_string(),
                    text: format!("passage {}", n),
                    matched_terms: 1,
                    hits: 1,
                })
                .collect())
        }
    }

    struct BrokenWeb;

    #[async_trait]
    impl Tool for BrokenWeb {
        fn name(&self) -> &'static str {
            WEB_SEARCH_TOOL
        }

        fn description(&self) -> &'static str {
            "broken"
        }

        async fn invoke(&self, _input: &str) -> Result<String, ToolError> {
            Err(ToolError::InvalidArgument("network down".to_string()))
        }
    }

    #[tokio::test]
    async fn test_sections_in_order_with_limit() {
        let llm = Arc::new(MockLlmClient::with_texts(&["analysis"]));
        let tools = ToolExecutor::empty()
            .with_retriever(Arc::new(FixedRetriever(7)))
            .with_tool(Arc::new(GlossaryTool::embedded().unwrap()));
        let agent = SearchAgent::new(deps_with(llm.clone(), tools));

        let out = agent.run("hydraulic leak on aileron actuator").await.unwrap();
        assert_eq!(out, "analysis");

        let prompt = llm.user_prompt(0);
        assert!(prompt.contains("passage 1\n\npassage 2"));
        assert!(prompt.contains("passage 5"));
        assert!(!prompt.contains("passage 6"));

        let retrieval = prompt.find("--- FAA/AMT DOCUMENTS ---").unwrap();
        let web = prompt.find("--- WEB SEARCH RESULTS ---").unwrap();
        let glossary = prompt.find("--- AVIATION GLOSSARY ---").unwrap();
        assert!(retrieval < web && web < glossary);
        assert!(prompt[web..glossary].contains(NO_DATA));
        assert!(prompt[glossary..].contains("Aileron:"));
    }

    #[tokio::test]
    async fn test_all_lookups_failing_renders_no_data() {
        let llm = Arc::new(MockLlmClient::with_texts(&["analysis"]));
        let tools = ToolExecutor::empty().with_tool(Arc::new(BrokenWeb));
        let agent = SearchAgent::new(deps_with(llm.clone(), tools));

        agent.run("hydraulic leak").await.unwrap();
        assert_eq!(llm.user_prompt(0).matches(NO_DATA).count(), 3);
    }

    #[tokio::test]
    async fn test_gather_respects_custom_limit() {
        let llm = Arc::new(MockLlmClient::with_texts(&[]));
        let tools = ToolExecutor::empty().with_retriever(Arc::new(FixedRetriever(4)));
        let agent = SearchAgent::new(deps_with(llm, tools)).with_passage_limit(2);

        let research = agent.gather("spoiler").await;
        assert_eq!(research.retrieval, "passage 1\n\npassage 2");
        assert_eq!(research.web, "");
    }
}
