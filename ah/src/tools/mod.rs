//! Tool adapters for the agents
//!
//! Agents never call a lookup directly: they go through `ToolExecutor`,
//! which applies the per-call timeout and turns any failure into an empty
//! result. Research agents pull passages from a `Retriever` and text from
//! the web search and glossary tools; the resource agent uses the resource
//! matcher.

mod error;
mod executor;
mod glossary;
mod resource_matcher;
mod retriever;
mod traits;
mod web_search;

pub use error::ToolError;
pub use executor::{DEFAULT_TOOL_TIMEOUT, ToolExecutor};
pub use glossary::{GLOSSARY_TOOL, GlossaryEntry, GlossaryTool};
pub use resource_matcher::{RESOURCE_MATCHER_TOOL, ResourceMatcherTool};
pub use retriever::DocRetriever;
pub use traits::{Retriever, Tool};
pub use web_search::{SearchProvider, WEB_SEARCH_TOOL, WebSearchTool};
