//! Tool and Retriever trait definitions

use async_trait::async_trait;
use docstore::Passage;

use super::ToolError;

/// A text-in/text-out lookup invoked by an agent
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name used for registration and logging
    fn name(&self) -> &'static str;

    /// Human-readable description
    fn description(&self) -> &'static str;

    /// Run the tool on free-form input
    async fn invoke(&self, input: &str) -> Result<String, ToolError>;
}

/// A passage source for research agents
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Return passages relevant to the query, best first
    async fn retrieve(&self, query: &str) -> Result<Vec<Passage>, ToolError>;
}
