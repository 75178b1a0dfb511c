//! Resource & compliance agent

use tracing::info;

use super::{AgentDeps, AgentError, section};
use crate::tools::RESOURCE_MATCHER_TOOL;

/// Turns a work package and the inventory match into an allocation report
#[derive(Clone)]
pub struct ResourceAgent {
    deps: AgentDeps,
}

impl ResourceAgent {
    pub fn new(deps: AgentDeps) -> Self {
        Self { deps }
    }

    /// Match resources for the work package text and narrate the plan
    ///
    /// A failed match leaves the resource section empty; the narrative is
    /// still generated.
    pub async fn run(&self, work_package: &str) -> Result<String, AgentError> {
        info!("Running resource agent");
        let resource_data = self.deps.tools.run_tool(RESOURCE_MATCHER_TOOL, work_package).await;

        self.deps
            .ask(
                "resource",
                &serde_json::json!({
                    "work_package": work_package,
                    "resource_data": section(&resource_data),
                }),
            )
            .await
    }
}
