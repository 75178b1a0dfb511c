//! glossary tool - embedded aviation glossary lookups

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{Tool, ToolError};

/// Registered name of the glossary tool
pub const GLOSSARY_TOOL: &str = "glossary";

const EMBEDDED_GLOSSARY: &str = include_str!("../../data/glossary.yml");

/// A glossary entry
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GlossaryEntry {
    pub term: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub definition: String,
}

impl GlossaryEntry {
    fn matches(&self, padded_query: &str) -> bool {
        std::iter::once(&self.term)
            .chain(self.aliases.iter())
            .any(|name| padded_query.contains(&pad(&normalize(name))))
    }
}

/// Looks up every glossary term mentioned in the input
pub struct GlossaryTool {
    entries: Vec<GlossaryEntry>,
}

impl GlossaryTool {
    /// Load the glossary compiled into the binary
    pub fn embedded() -> Result<Self, ToolError> {
        Self::from_yaml(EMBEDDED_GLOSSARY)
    }

    /// Parse a glossary from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self, ToolError> {
        let entries: Vec<GlossaryEntry> =
            serde_yaml::from_str(yaml).map_err(|e| ToolError::InvalidArgument(format!("invalid glossary: {}", e)))?;
        debug!(count = entries.len(), "GlossaryTool::from_yaml: loaded entries");
        Ok(Self { entries })
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the glossary has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries whose term or alias appears in `query`, in glossary order
    pub fn lookup(&self, query: &str) -> Vec<&GlossaryEntry> {
        let padded = pad(&normalize(query));
        self.entries.iter().filter(|e| e.matches(&padded)).collect()
    }
}

#[async_trait]
impl Tool for GlossaryTool {
    fn name(&self) -> &'static str {
        GLOSSARY_TOOL
    }

    fn description(&self) -> &'static str {
        "Explain aviation maintenance terms (aileron, spoiler, Part-145, ...) found in the input."
    }

    async fn invoke(&self, input: &str) -> Result<String, ToolError> {
        debug!(input_len = input.len(), "GlossaryTool::invoke: called");
        let lines: Vec<String> = self
            .lookup(input)
            .into_iter()
            .map(|e| format!("{}: {}", e.term, e.definition))
            .collect();
        Ok(lines.join("\n"))
    }
}

/// Lower-case and collapse every non-alphanumeric run into one space
fn normalize(text: &str) -> String {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn pad(text: &str) -> String {
    format!(" {} ", text)
}
