//! ToolExecutor - runs tools and retrievers for agents
//!
//! Every call runs under the configured timeout. Errors, timeouts and
//! unknown tool names all come back as an empty result so that a failing
//! lookup never stops an agent.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use docstore::Passage;
use tracing::{debug, warn};

use super::{Retriever, Tool, ToolError};

/// Default per-call timeout when none is configured
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(15);

/// Registry of tools plus the optional retrieval backend
pub struct ToolExecutor {
    tools: HashMap<String, Arc<dyn Tool>>,
    retriever: Option<Arc<dyn Retriever>>,
    timeout: Duration,
}

impl ToolExecutor {
    /// Create an executor with no tools
    pub fn new(timeout: Duration) -> Self {
        debug!(?timeout, "ToolExecutor::new: called");
        Self {
            tools: HashMap::new(),
            retriever: None,
            timeout,
        }
    }

    /// Create an empty executor with the default timeout
    pub fn empty() -> Self {
        Self::new(DEFAULT_TOOL_TIMEOUT)
    }

    /// Attach a retriever
    pub fn with_retriever(mut self, retriever: Arc<dyn Retriever>) -> Self {
        debug!("ToolExecutor::with_retriever: called");
        self.retriever = Some(retriever);
        self
    }

    /// Register a tool under its own name
    pub fn add_tool(&mut self, tool: Arc<dyn Tool>) {
        debug!(tool_name = %tool.name(), "ToolExecutor::add_tool: called");
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Builder form of `add_tool`
    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.add_tool(tool);
        self
    }

    /// Check if a tool exists
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Registered tool names, sorted
    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// Per-call timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Invoke a tool, returning its output or an empty string on any failure
    pub async fn run_tool(&self, name: &str, input: &str) -> String {
        debug!(%name, input_len = input.len(), "ToolExecutor::run_tool: called");
        match self.try_run_tool(name, input).await {
            Ok(output) => {
                debug!(%name, output_len = output.len(), "ToolExecutor::run_tool: success");
                output
            }
            Err(ToolError::UnknownTool { .. }) => {
                debug!(%name, "ToolExecutor::run_tool: tool not registered");
                String::new()
            }
            Err(e) => {
                warn!(tool = %name, error = %e, "Tool failed, continuing without its output");
                String::new()
            }
        }
    }

    /// Invoke a tool and surface its error
    pub async fn try_run_tool(&self, name: &str, input: &str) -> Result<String, ToolError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool { name: name.to_string() })?;

        match tokio::time::timeout(self.timeout, tool.invoke(input)).await {
            Ok(result) => result,
            Err(_) => Err(ToolError::Timeout(self.timeout)),
        }
    }

    /// Fetch at most `limit` passages, or none on any failure
    pub async fn retrieve_passages(&self, query: &str, limit: usize) -> Vec<Passage> {
        debug!(%query, %limit, "ToolExecutor::retrieve_passages: called");
        let Some(retriever) = &self.retriever else {
            debug!("ToolExecutor::retrieve_passages: no retriever configured");
            return Vec::new();
        };

        match tokio::time::timeout(self.timeout, retriever.retrieve(query)).await {
            Ok(Ok(mut passages)) => {
                passages.truncate(limit);
                debug!(count = passages.len(), "ToolExecutor::retrieve_passages: success");
                passages
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Retrieval failed, continuing without passages");
                Vec::new()
            }
            Err(_) => {
                warn!(timeout = ?self.timeout, "Retrieval timed out, continuing without passages");
                Vec::new()
            }
        }
    }
}

impl Default for ToolExecutor {
    fn default() -> Self {
        Self::empty()
    }
}
