//! LLM-backed agents
//!
//! Every agent has the same shape: render its system and user prompt,
//! make one LLM call with the two messages, return the text. Tool lookups
//! go through the shared `ToolExecutor`, so a failing tool only empties a
//! prompt section. LLM transport failures propagate as `AgentError::Llm`.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::llm::{CompletionRequest, LlmClient, LlmError};
use crate::prompts::PromptLoader;
use crate::state::StateError;
use crate::tools::ToolExecutor;

mod efficiency;
mod guard;
mod planner;
mod qa;
mod research;
mod resource;
mod review;
mod sprint;

pub use efficiency::{EfficiencyAgent, EfficiencyReport};
pub use guard::{GuardAgent, Intent, ModerationVerdict, OUT_OF_SCOPE_REPLY, SAFE_RESPONSE, parse_intent, parse_moderation};
pub use planner::PlannerAgent;
pub use qa::{QaAgent, QaAnswer};
pub use research::{ResearchContext, SearchAgent};
pub use resource::ResourceAgent;
pub use review::ReviewAgent;
pub use sprint::{BacklogOperation, BacklogResult, SprintAgent};

/// Placeholder rendered for an empty prompt section
pub const NO_DATA: &str = "(no data)";

/// Errors from agent runs
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Prompt error: {0}")]
    Prompt(String),

    #[error("State error: {0}")]
    State(#[from] StateError),
}

/// Collaborators shared by every agent
#[derive(Clone)]
pub struct AgentDeps {
    pub llm: Arc<dyn LlmClient>,
    pub prompts: Arc<PromptLoader>,
    pub tools: Arc<ToolExecutor>,
}

impl AgentDeps {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: Arc<PromptLoader>, tools: Arc<ToolExecutor>) -> Self {
        Self { llm, prompts, tools }
    }

    /// Render `{agent}-system`/`{agent}-user` and make one LLM call
    ///
    /// Returns the response text, empty when the model returned no content.
    pub async fn ask<C: Serialize>(&self, agent: &str, context: &C) -> Result<String, AgentError> {
        debug!(%agent, "AgentDeps::ask: called");
        let (system, user) = self
            .prompts
            .render_pair(agent, context)
            .map_err(|e| AgentError::Prompt(e.to_string()))?;

        let response = self.llm.complete(CompletionRequest::from_prompts(system, user)).await?;
        debug!(
            %agent,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "AgentDeps::ask: response received"
        );
        Ok(response.content_text().to_string())
    }
}

/// Text for a prompt section, or the no-data marker when blank
pub fn section(text: &str) -> &str {
    if text.trim().is_empty() { NO_DATA } else { text }
}
