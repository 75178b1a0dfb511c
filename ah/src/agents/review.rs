//! Plan review (QA) agent

use tracing::info;

use super::{AgentDeps, AgentError};

/// Audits research, work package and resource plan together
///
/// Pure aggregator: no tools, one LLM call.
#[derive(Clone)]
pub struct ReviewAgent {
    deps: AgentDeps,
}

impl ReviewAgent {
    pub fn new(deps: AgentDeps) -> Self {
        Self { deps }
    }

    pub async fn run(&self, tech_context: &str, work_package: &str, resource_plan: &str) -> Result<String, AgentError> {
        info!("Running review agent");
        self.deps
            .ask(
                "review",
                &serde_json::json!({
                    "tech_context": tech_context,
                    "work_package": work_package,
                    "resource_plan": resource_plan,
                }),
            )
            .await
    }
}
