//! QA assistant: guarded question answering

use serde::Serialize;
use tracing::{debug, info};

use super::{AgentDeps, AgentError, GuardAgent, Intent, ModerationVerdict, SearchAgent};

/// Answer to a user question with the guard decisions that shaped it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QaAnswer {
    pub intent: Intent,
    pub answer: String,
    /// Present only on the maintenance path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moderation: Option<ModerationVerdict>,
}

/// Classify, answer, moderate
#[derive(Clone)]
pub struct QaAgent {
    deps: AgentDeps,
    guard: GuardAgent,
    search: SearchAgent,
}

impl QaAgent {
    pub fn new(deps: AgentDeps) -> Self {
        Self {
            guard: GuardAgent::new(deps.clone()),
            search: SearchAgent::new(deps.clone()),
            deps,
        }
    }

    /// Override the research agent, e.g. to change the passage limit
    pub fn with_search(mut self, search: SearchAgent) -> Self {
        self.search = search;
        self
    }

    pub async fn answer(&self, question: &str) -> Result<QaAnswer, AgentError> {
        debug!(%question, "QaAgent::answer: called");
        let intent = self.guard.detect_intent(question).await?;
        info!(%intent, "QaAgent::answer: routing question");

        match intent {
            Intent::SmallTalk => Ok(QaAnswer {
                intent,
                answer: self.guard.small_talk_reply(question).await?,
                moderation: None,
            }),
            Intent::OutOfScope => Ok(QaAnswer {
                intent,
                answer: self.guard.out_of_scope_reply().to_string(),
                moderation: None,
            }),
            Intent::Maintenance => self.answer_maintenance(question).await,
        }
    }

    async fn answer_maintenance(&self, question: &str) -> Result<QaAnswer, AgentError> {
        let research = self.search.gather(question).await.for_prompt();
        let draft = self
            .deps
            .ask(
                "qa",
                &serde_json::json!({
                    "question": question,
                    "retrieval": research.retrieval,
                    "web": research.web,
                    "glossary": research.glossary,
                }),
            )
            .await?;

        let verdict = self.guard.moderate_answer(question, &draft).await?;
        let answer = match &verdict {
            ModerationVerdict::Ok => draft,
            ModerationVerdict::Block { reason } => {
                info!(%reason, "QaAgent::answer: answer blocked");
                GuardAgent::safe_response(reason)
            }
        };

        Ok(QaAnswer {
            intent: Intent::Maintenance,
            answer,
            moderation: Some(verdict),
        })
    }
}
