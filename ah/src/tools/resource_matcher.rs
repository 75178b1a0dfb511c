//! resource_matcher tool - matches work package needs against inventory

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::{Tool, ToolError};
use crate::domain::{ResourcePlanResult, strip_code_fences};
use crate::state::StateManager;

/// Registered name of the resource matcher tool
pub const RESOURCE_MATCHER_TOOL: &str = "resource_matcher";

/// Reads personnel, tools and parts from the state actor and reports which
/// of them cover the ratings, tools and parts a work package requires
pub struct ResourceMatcherTool {
    state: StateManager,
}

impl ResourceMatcherTool {
    pub fn new(state: StateManager) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Tool for ResourceMatcherTool {
    fn name(&self) -> &'static str {
        RESOURCE_MATCHER_TOOL
    }

    fn description(&self) -> &'static str {
        "Evaluate a work package JSON against available personnel ratings, tools and stocked parts."
    }

    async fn invoke(&self, input: &str) -> Result<String, ToolError> {
        debug!(input_len = input.len(), "ResourceMatcherTool::invoke: called");
        let work_package: Value = match serde_json::from_str(strip_code_fences(input)) {
            Ok(v) => v,
            Err(e) => {
                debug!(error = %e, "ResourceMatcherTool::invoke: invalid work package JSON");
                return Ok(serde_json::json!({
                    "error": "Invalid work package JSON",
                    "raw": input,
                })
                .to_string());
            }
        };

        let inventory = self
            .state
            .inventory()
            .await
            .map_err(|e| ToolError::State(e.to_string()))?;
        let result = ResourcePlanResult::compute(&work_package, &inventory);
        debug!(
            personnel = result.matched_personnel.len(),
            tools = result.matched_tools.len(),
            parts = result.matched_parts.len(),
            "ResourceMatcherTool::invoke: matched"
        );
        Ok(serde_json::to_string(&result)?)
    }
}
