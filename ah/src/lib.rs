//! AeroHub - multi-agent aircraft-maintenance planning
//!
//! A planning pipeline of independent LLM-backed agents (research, work
//! package planner, resource matcher, QA review), a guarded question
//! answering assistant, a free-text backlog translator and an efficiency
//! analyst over completed work.
//!
//! # Modules
//!
//! - [`llm`] - LLM client trait with OpenAI and Anthropic implementations
//! - [`tools`] - Retrieval, web search, glossary and resource matching tools
//! - [`prompts`] - Handlebars prompt templates
//! - [`agents`] - The individual agents
//! - [`pipeline`] - Planning pipeline orchestration
//! - [`domain`] - Backlog, inventory, analytics and work package types
//! - [`state`] - Actor over the HubStore
//! - [`hub`] - Wiring from configuration
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod agents;
pub mod cli;
pub mod config;
pub mod domain;
pub mod hub;
pub mod llm;
pub mod pipeline;
pub mod prompts;
pub mod state;
pub mod tools;

// Re-export commonly used types
pub use agents::{AgentDeps, AgentError, GuardAgent, Intent, ModerationVerdict, QaAgent, SprintAgent};
pub use config::{Config, LlmConfig};
pub use domain::{BacklogItem, BacklogStatus, BacklogType, WorkPackage, WorkPackageReport};
pub use hub::Hub;
pub use llm::{
    AnthropicClient, CompletionRequest, CompletionResponse, LlmClient, LlmError, OpenAIClient, create_client,
};
pub use pipeline::{PlanningPipeline, PlanningResult};
pub use prompts::PromptLoader;
pub use state::{StateCommand, StateError, StateManager, StateResponse};
pub use tools::{Tool, ToolError, ToolExecutor};
