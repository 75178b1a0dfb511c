//! Efficiency agent: improvement suggestions from completed-work analytics

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{AgentDeps, AgentError};
use crate::domain::{CompletedWorkPackage, EfficiencyMetrics, strip_code_fences};
use crate::state::StateManager;

/// Completed packages shown to the model as examples
pub const SAMPLE_LIMIT: usize = 10;

/// Summary and suggestions, with the metrics they were drawn from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyReport {
    pub summary: String,
    pub suggestions: Vec<String>,
    pub metrics: EfficiencyMetrics,
}

#[derive(Deserialize)]
struct LlmReport {
    #[serde(default)]
    summary: String,
    #[serde(default)]
    suggestions: Vec<String>,
}

impl EfficiencyReport {
    /// Parse the model's JSON, keeping raw text as the summary on failure
    pub fn from_llm_text(text: &str, metrics: EfficiencyMetrics) -> Self {
        match serde_json::from_str::<LlmReport>(strip_code_fences(text)) {
            Ok(parsed) => Self {
                summary: parsed.summary,
                suggestions: parsed.suggestions,
                metrics,
            },
            Err(e) => {
                warn!(error = %e, "Efficiency response is not valid JSON, using raw text");
                Self {
                    summary: text.to_string(),
                    suggestions: Vec::new(),
                    metrics,
                }
            }
        }
    }
}

#[derive(Serialize)]
struct Sample<'a> {
    id: &'a str,
    sprint_id: Option<&'a str>,
    first_pass_success: bool,
    rework_count: u32,
    criticality: &'a str,
}

impl<'a> From<&'a CompletedWorkPackage> for Sample<'a> {
    fn from(c: &'a CompletedWorkPackage) -> Self {
        Self {
            id: &c.id,
            sprint_id: c.sprint_id.as_deref(),
            first_pass_success: c.first_pass_success,
            rework_count: c.rework_count,
            criticality: &c.criticality,
        }
    }
}

/// Analyses completed work packages
#[derive(Clone)]
pub struct EfficiencyAgent {
    deps: AgentDeps,
    state: StateManager,
}

impl EfficiencyAgent {
    pub fn new(deps: AgentDeps, state: StateManager) -> Self {
        Self { deps, state }
    }

    /// Analyse every completed package, optionally limited to one sprint
    pub async fn run(&self, sprint_id: Option<String>) -> Result<EfficiencyReport, AgentError> {
        debug!(?sprint_id, "EfficiencyAgent::run: called");
        let completed = self.state.list_completed(sprint_id).await?;
        let metrics = EfficiencyMetrics::compute(&completed);
        info!(total = metrics.total_completed, "Computed efficiency metrics");

        let samples: Vec<Sample> = completed.iter().take(SAMPLE_LIMIT).map(Sample::from).collect();
        let metrics_json = serde_json::to_string_pretty(&metrics).map_err(|e| AgentError::Prompt(e.to_string()))?;
        let samples_json = serde_json::to_string_pretty(&serde_json::json!({
            "total_completed": completed.len(),
            "samples": samples,
        }))
        .map_err(|e| AgentError::Prompt(e.to_string()))?;

        let raw = self
            .deps
            .ask(
                "efficiency",
                &serde_json::json!({ "metrics": metrics_json, "samples": samples_json }),
            )
            .await?;
        Ok(EfficiencyReport::from_llm_text(&raw, metrics))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::test_support::deps;
    use crate::llm::client::mock::MockLlmClient;
    use chrono::{Duration, Utc};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn completed(id: &str, first_pass: bool, rework: u32) -> CompletedWorkPackage {
        let started = Utc::now() - Duration::hours(3);
        CompletedWorkPackage {
            id: id.to_string(),
            work_package_id: format!("WP-{}", id),
            sprint_id: Some("S-24-08".to_string()),
            started_at: started,
            completed_at: started + Duration::minutes(150),
            first_pass_success: first_pass,
            rework_count: rework,
            planned_minutes: Some(120),
            actual_minutes: None,
            assigned_personnel_count: Some(2),
            criticality: "high".to_string(),
            updated_at: 0,
        }
    }

    #[test]
    fn test_from_llm_text_parses_json() {
        let text = "```json\n{\"summary\": \"Rework is low\", \"suggestions\": [\"Pre-stage parts\"]}\n```";
        let report = EfficiencyReport::from_llm_text(text, EfficiencyMetrics::default());
        assert_eq!(report.summary, "Rework is low");
        assert_eq!(report.suggestions, vec!["Pre-stage parts".to_string()]);
    }

    #[test]
    fn test_from_llm_text_falls_back_to_raw() {
        let metrics = EfficiencyMetrics {
            total_completed: 4,
            ..Default::default()
        };
        let report = EfficiencyReport::from_llm_text("Things look fine.", metrics.clone());
        assert_eq!(report.summary, "Things look fine.");
        assert!(report.suggestions.is_empty());
        assert_eq!(report.metrics, metrics);
    }

    #[tokio::test]
    async fn test_run_attaches_metrics_and_samples() {
        let temp = TempDir::new().unwrap();
        let state = StateManager::spawn(temp.path()).unwrap();
        for i in 0..12 {
            state.add_completed(completed(&format!("C-{:02}", i), i % 4 != 0, 1)).await.unwrap();
        }

        let llm = Arc::new(MockLlmClient::with_texts(&["not json"]));
        let agent = EfficiencyAgent::new(deps(llm.clone()), state);

        let report = agent.run(None).await.unwrap();
        assert_eq!(report.summary, "not json");
        assert_eq!(report.metrics.total_completed, 12);
        assert_eq!(report.metrics.first_pass_success_rate, 75.0);

        let prompt = llm.user_prompt(0);
        assert!(prompt.contains("\"total_completed\": 12"));
        assert!(prompt.contains("C-09"));
        assert!(!prompt.contains("C-10"));
    }

    #[tokio::test]
    async fn test_run_with_empty_store() {
        let temp = TempDir::new().unwrap();
        let state = StateManager::spawn(temp.path()).unwrap();
        let llm = Arc::new(MockLlmClient::with_texts(&[r#"{"summary": "No data yet", "suggestions": []}"#]));
        let agent = EfficiencyAgent::new(deps(llm), state);

        let report = agent.run(None).await.unwrap();
        assert_eq!(report.summary, "No data yet");
        assert_eq!(report.metrics, EfficiencyMetrics::default());
    }
}
