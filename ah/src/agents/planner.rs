//! Work package planner agent

use tracing::info;

use super::{AgentDeps, AgentError};

/// Produces a JSON work package from a fault description and research text
///
/// The agent does not parse its output; callers validate it with
/// `WorkPackageReport::parse`.
#[derive(Clone)]
pub struct PlannerAgent {
    deps: AgentDeps,
}

impl PlannerAgent {
    pub fn new(deps: AgentDeps) -> Self {
        Self { deps }
    }

    pub async fn run(&self, fault_description: &str, tech_context: &str) -> Result<String, AgentError> {
        info!(%fault_description, "Running planner agent");
        self.deps
            .ask(
                "planner",
                &serde_json::json!({
                    "fault_description": fault_description,
                    "tech_context": tech_context,
                }),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::test_support::deps;
    use crate::llm::client::mock::MockLlmClient;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_returns_raw_text() {
        let llm = Arc::new(MockLlmClient::with_texts(&["```json\n{\"steps\": []}\n```"]));
        let agent = PlannerAgent::new(deps(llm.clone()));

        let out = agent.run("hydraulic leak", "Seals degrade with age.").await.unwrap();
        assert_eq!(out, "```json\n{\"steps\": []}\n```");

        let prompt = llm.user_prompt(0);
        assert!(prompt.contains("TECHNICAL CONTEXT:\nSeals degrade with age."));
        assert!(prompt.ends_with("FAULT DESCRIPTION: hydraulic leak\n"));
    }
}
