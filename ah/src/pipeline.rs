//! Planning pipeline: research, plan, resource match, review
//!
//! Stages run strictly in sequence and each one receives the previous
//! stages' text. Only an LLM failure stops the run; a malformed work package
//! is recorded on the result and the later stages still see the raw text.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::agents::{AgentDeps, AgentError, PlannerAgent, ResourceAgent, ReviewAgent, SearchAgent};
use crate::domain::WorkPackageReport;

/// Everything a planning run produced
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanningResult {
    pub fault_description: String,
    pub tech_context: String,
    /// Planner output exactly as returned
    pub work_package: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_package_report: Option<WorkPackageReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_package_error: Option<String>,
    pub resource_plan: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qa_review: Option<String>,
}

/// Search -> Planner -> Resource -> optional Review
#[derive(Clone)]
pub struct PlanningPipeline {
    search: SearchAgent,
    planner: PlannerAgent,
    resource: ResourceAgent,
    review: ReviewAgent,
}

impl PlanningPipeline {
    pub fn new(deps: AgentDeps) -> Self {
        Self {
            search: SearchAgent::new(deps.clone()),
            planner: PlannerAgent::new(deps.clone()),
            resource: ResourceAgent::new(deps.clone()),
            review: ReviewAgent::new(deps),
        }
    }

    /// Override the research agent, e.g. to change the passage limit
    pub fn with_search(mut self, search: SearchAgent) -> Self {
        self.search = search;
        self
    }

    /// Plan a fault end to end
    pub async fn run(&self, fault_description: &str, with_review: bool) -> Result<PlanningResult, AgentError> {
        debug!(%fault_description, %with_review, "PlanningPipeline::run: called");

        info!("Pipeline stage: research");
        let tech_context = self.search.run(fault_description).await?;

        info!("Pipeline stage: planner");
        let work_package = self.planner.run(fault_description, &tech_context).await?;
        let (work_package_report, work_package_error) = match WorkPackageReport::parse(&work_package) {
            Ok(report) => {
                if !report.is_clean() {
                    warn!(issues = report.issues.len(), "Work package has consistency issues");
                }
                (Some(report), None)
            }
            Err(e) => {
                warn!(error = %e, "Planner returned a malformed work package");
                (None, Some(e.to_string()))
            }
        };

        info!("Pipeline stage: resource");
        let resource_plan = self.resource.run(&work_package).await?;

        let qa_review = if with_review {
            info!("Pipeline stage: review");
            Some(self.review(&tech_context, &work_package, &resource_plan).await?)
        } else {
            None
        };

        Ok(PlanningResult {
            fault_description: fault_description.to_string(),
            tech_context,
            work_package,
            work_package_report,
            work_package_error,
            resource_plan,
            qa_review,
        })
    }

    /// Run the review stage on its own
    pub async fn review(&self, tech_context: &str, work_package: &str, resource_plan: &str) -> Result<String, AgentError> {
        debug!("PlanningPipeline::review: called");
        self.review.run(tech_context, work_package, resource_plan).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::test_support::deps;
    use crate::llm::client::mock::MockLlmClient;
    use std::sync::Arc;

    const WORK_PACKAGE: &str = r#"{
        "work_package_id": "WP-001",
        "component": "Aileron actuator",
        "steps": [
            {"id": "S1", "title": "Depressurize hydraulics", "estimated_minutes": 20, "required_ratings": ["B1"]},
            {"id": "S2", "title": "Replace seal", "estimated_minutes": 60, "dependencies": ["S1"]}
        ],
        "total_estimated_minutes": 90
    }"#;

    #[tokio::test]
    async fn test_run_threads_stage_outputs() {
        let llm = Arc::new(MockLlmClient::with_texts(&[
            "Tech context about actuators",
            WORK_PACKAGE,
            "Resource plan text",
            "## Summary\nLooks fine",
        ]));
        let pipeline = PlanningPipeline::new(deps(llm.clone()));

        let result = pipeline.run("Aileron actuator leaking", true).await.unwrap();
        assert_eq!(llm.call_count(), 4);
        assert_eq!(result.tech_context, "Tech context about actuators");
        assert_eq!(result.resource_plan, "Resource plan text");
        assert_eq!(result.qa_review.as_deref(), Some("## Summary\nLooks fine"));
        assert!(result.work_package_error.is_none());

        let report = result.work_package_report.unwrap();
        assert_eq!(report.work_package.total_estimated_minutes, 80);
        assert!(!report.is_clean());

        assert!(llm.user_prompt(1).contains("Tech context about actuators"));
        assert!(llm.user_prompt(1).contains("Aileron actuator leaking"));
        assert!(llm.user_prompt(2).contains("WP-001"));
        let review_prompt = llm.user_prompt(3);
        assert!(review_prompt.contains("Tech context about actuators"));
        assert!(review_prompt.contains("Resource plan text"));
    }

    #[tokio::test]
    async fn test_malformed_work_package_does_not_stop_pipeline() {
        let llm = Arc::new(MockLlmClient::with_texts(&["ctx", "Sorry, here is a plan in prose", "plan"]));
        let pipeline = PlanningPipeline::new(deps(llm.clone()));

        let result = pipeline.run("fault", false).await.unwrap();
        assert_eq!(llm.call_count(), 3);
        assert!(result.work_package_report.is_none());
        assert!(result.work_package_error.is_some());
        assert!(result.qa_review.is_none());
        assert!(llm.user_prompt(2).contains("Sorry, here is a plan in prose"));
    }

    #[tokio::test]
    async fn test_llm_failure_stops_pipeline() {
        let llm = Arc::new(MockLlmClient::with_texts(&["ctx"]));
        let pipeline = PlanningPipeline::new(deps(llm.clone()));

        assert!(matches!(pipeline.run("fault", true).await, Err(AgentError::Llm(_))));
        assert_eq!(llm.call_count(), 2);
    }
}
