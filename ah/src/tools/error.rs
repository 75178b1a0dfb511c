//! Tool error types

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during tool execution
///
/// `ToolExecutor` turns every one of these into an empty result; they only
/// surface in logs and in direct calls from tests.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {name}")]
    UnknownTool { name: String },

    #[error("Tool timed out after {0:?}")]
    Timeout(Duration),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Missing API key: environment variable {0} not set")]
    MissingApiKey(String),

    #[error("Document store error: {0}")]
    DocStore(String),

    #[error("State error: {0}")]
    State(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
