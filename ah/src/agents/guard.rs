//! Guard agent: intent classification and answer moderation
//!
//! Both classifiers fail closed. Unrecognized intent output means
//! out-of-scope, unrecognized moderation output means block.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{AgentDeps, AgentError};

/// Fixed refusal for out-of-scope questions
pub const OUT_OF_SCOPE_REPLY: &str = "Within AeroHub I only help with aircraft maintenance, flight control surfaces, \
Part-145 compliance and related technical or operational topics. This question is outside my scope.";

/// Fixed message shown instead of a blocked answer
pub const SAFE_RESPONSE: &str = "I should not go into very detailed or sensitive information on this topic. \
You can still ask about general principles and safety-focused high-level explanations.";

/// Moderation reason used when the moderator's output cannot be read
pub const UNCERTAIN_REASON: &str = "policy_check_uncertain";

/// What a user question is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Maintenance,
    SmallTalk,
    OutOfScope,
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Maintenance => write!(f, "maintenance"),
            Self::SmallTalk => write!(f, "small_talk"),
            Self::OutOfScope => write!(f, "out_of_scope"),
        }
    }
}

/// Outcome of answer moderation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ModerationVerdict {
    Ok,
    Block { reason: String },
}

impl ModerationVerdict {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

/// Interpret the intent classifier's raw output
///
/// Substring checks run in order maintenance, small, out_of_scope.
pub fn parse_intent(raw: &str) -> Intent {
    let label = raw.trim().to_lowercase();
    if label.contains("maintenance") {
        Intent::Maintenance
    } else if label.contains("small") {
        Intent::SmallTalk
    } else {
        // Explicit out_of_scope and anything unrecognized land here
        Intent::OutOfScope
    }
}

/// Interpret the moderator's raw output
pub fn parse_moderation(raw: &str) -> ModerationVerdict {
    let text = raw.trim().to_lowercase();
    if text.starts_with("ok") {
        ModerationVerdict::Ok
    } else if text.starts_with("block") {
        let reason = text.split_once(':').map(|(_, r)| r.trim().to_string()).unwrap_or_default();
        ModerationVerdict::Block { reason }
    } else {
        ModerationVerdict::Block {
            reason: UNCERTAIN_REASON.to_string(),
        }
    }
}

/// Intent classification and answer moderation
#[derive(Clone)]
pub struct GuardAgent {
    deps: AgentDeps,
}

impl GuardAgent {
    pub fn new(deps: AgentDeps) -> Self {
        Self { deps }
    }

    /// Classify a question with one LLM call
    pub async fn detect_intent(&self, question: &str) -> Result<Intent, AgentError> {
        debug!(%question, "GuardAgent::detect_intent: called");
        let raw = self
            .deps
            .ask("intent", &serde_json::json!({ "question": question }))
            .await?;
        let intent = parse_intent(&raw);
        info!(%intent, raw = %raw.trim(), "Classified question intent");
        Ok(intent)
    }

    /// Short greeting that points the user at what the system can do
    pub async fn small_talk_reply(&self, question: &str) -> Result<String, AgentError> {
        debug!("GuardAgent::small_talk_reply: called");
        self.deps
            .ask("small-talk", &serde_json::json!({ "question": question }))
            .await
    }

    /// Fixed refusal, no LLM call
    pub fn out_of_scope_reply(&self) -> &'static str {
        OUT_OF_SCOPE_REPLY
    }

    /// Check an answer with one LLM call
    pub async fn moderate_answer(&self, question: &str, answer: &str) -> Result<ModerationVerdict, AgentError> {
        debug!("GuardAgent::moderate_answer: called");
        let raw = self
            .deps
            .ask(
                "moderation",
                &serde_json::json!({ "question": question, "answer": answer }),
            )
            .await?;
        let verdict = parse_moderation(&raw);
        info!(?verdict, "Moderated answer");
        Ok(verdict)
    }

    /// Message shown instead of a blocked answer
    pub fn safe_response(reason: &str) -> String {
        if reason.is_empty() {
            SAFE_RESPONSE.to_string()
        } else {
            format!("{}\n\n(Note: internal review result: {})", SAFE_RESPONSE, reason)
        }
    }
}
