//! Prompt Loader
//!
//! Loads prompt templates from the override directory or falls back to
//! embedded defaults.

use std::path::PathBuf;

use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::debug;

use super::embedded;
use crate::config::PromptsConfig;

/// Loads and renders prompt templates
pub struct PromptLoader {
    /// Handlebars template engine
    hbs: Handlebars<'static>,
    /// Override directory searched before the embedded templates
    override_dir: Option<PathBuf>,
}

impl PromptLoader {
    /// Create a loader with an optional override directory
    pub fn new(override_dir: Option<PathBuf>) -> Self {
        debug!(?override_dir, "PromptLoader::new: called");
        let override_dir = match override_dir {
            Some(dir) if dir.is_dir() => Some(dir),
            Some(dir) => {
                tracing::warn!("Prompt override directory {} not found, using embedded prompts", dir.display());
                None
            }
            None => None,
        };

        let mut hbs = Handlebars::new();
        // Prompts are plain text, never HTML
        hbs.register_escape_fn(handlebars::no_escape);

        Self { hbs, override_dir }
    }

    /// Create a loader from configuration
    pub fn from_config(config: &PromptsConfig) -> Self {
        Self::new(config.dir.clone())
    }

    /// Create a loader that only uses embedded prompts
    pub fn embedded_only() -> Self {
        Self::new(None)
    }

    /// Load a template by name
    ///
    /// Checks `{override_dir}/{name}.pmt` first, then the embedded copy.
    pub fn load_template(&self, name: &str) -> Result<String> {
        debug!(%name, "PromptLoader::load_template: called");
        if let Some(ref dir) = self.override_dir {
            let path = dir.join(format!("{}.pmt", name));
            if path.exists() {
                debug!(?path, "PromptLoader::load_template: found in override directory");
                return std::fs::read_to_string(&path)
                    .map_err(|e| eyre!("Failed to read prompt {}: {}", path.display(), e));
            }
        }

        embedded::get_embedded(name)
            .map(str::to_string)
            .ok_or_else(|| eyre!("Prompt template not found: {}", name))
    }

    /// Render a template with the given context
    pub fn render<C: Serialize>(&self, template_name: &str, context: &C) -> Result<String> {
        debug!(%template_name, "PromptLoader::render: called");
        let template = self.load_template(template_name)?;
        self.hbs
            .render_template(&template, context)
            .map_err(|e| eyre!("Failed to render template {}: {}", template_name, e))
    }

    /// Render an agent's `{agent}-system` and `{agent}-user` templates
    pub fn render_pair<C: Serialize>(&self, agent: &str, context: &C) -> Result<(String, String)> {
        let system = self.render(&format!("{}-system", agent), context)?;
        let user = self.render(&format!("{}-user", agent), context)?;
        Ok((system, user))
    }
}

impl Default for PromptLoader {
    fn default() -> Self {
        Self::embedded_only()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;

    #[test]
    fn test_render_does_not_escape() {
        let loader = PromptLoader::embedded_only();
        let user = loader
            .render("resource-user", &json!({"work_package": "{\"steps\": [\"a & b\"]}", "resource_data": "<none>"}))
            .unwrap();
        assert!(user.contains("{\"steps\": [\"a & b\"]}"));
        assert!(user.contains("<none>"));
    }

    #[test]
    fn test_render_pair() {
        let loader = PromptLoader::embedded_only();
        let (system, user) = loader.render_pair("intent", &json!({"question": "What is an aileron?"})).unwrap();
        assert!(system.contains("maintenance"));
        assert!(user.contains("What is an aileron?"));
    }

    #[test]
    fn test_override_directory_wins() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("intent-user.pmt"), "Classify: {{question}}").unwrap();

        let loader = PromptLoader::new(Some(temp.path().to_path_buf()));
        let user = loader.render("intent-user", &json!({"question": "hi"})).unwrap();
        assert_eq!(user, "Classify: hi");

        // Templates missing from the override directory fall back to embedded
        assert!(loader.load_template("intent-system").unwrap().contains("intent classification"));
    }

    #[test]
    fn test_missing_override_directory_is_ignored() {
        let loader = PromptLoader::new(Some(PathBuf::from("/nonexistent/prompts")));
        assert!(loader.load_template("qa-system").is_ok());
    }

    #[test]
    fn test_unknown_template() {
        let loader = PromptLoader::embedded_only();
        assert!(loader.load_template("nonexistent-template").is_err());
    }
}
