//! Backlog operation translator
//!
//! Turns a free-text request into one backlog operation and applies it.
//! Domain failures come back as `{operation, error}` results, only LLM
//! transport failures are errors.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{AgentDeps, AgentError};
use crate::domain::{
    BacklogFilter, BacklogItem, BacklogStatus, BacklogType, normalize_status, status_from_request, strip_code_fences,
};
use crate::state::{StateError, StateManager};

pub const MISSING_IDENTIFIER: &str = "item_id veya item_title (başlık) eksik";
pub const INVALID_STATUS: &str = "status eksik veya geçersiz";
pub const ITEM_NOT_FOUND: &str = "item bulunamadı";

/// Requested status change, as the model wrote it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusUpdate {
    pub item_id: Option<String>,
    pub item_title: Option<String>,
    pub status: Option<String>,
}

/// One backlog operation translated from a request
#[derive(Debug, Clone, PartialEq)]
pub enum BacklogOperation {
    /// Raw item objects, built leniently at apply time
    CreateItems(Vec<Value>),
    ListItems(BacklogFilter),
    UpdateStatus(StatusUpdate),
}

impl BacklogOperation {
    /// Parse the model's JSON
    ///
    /// Unparseable output lists everything. An unknown operation lists with
    /// whatever filters were given.
    pub fn parse(text: &str) -> Self {
        let Ok(value) = serde_json::from_str::<Value>(strip_code_fences(text)) else {
            warn!("Backlog operation is not valid JSON, falling back to list_items");
            return Self::ListItems(BacklogFilter::default());
        };

        match value.get("operation").and_then(Value::as_str) {
            Some("create_items") => {
                let items = value
                    .get("items")
                    .and_then(Value::as_array)
                    .cloned()
                    .unwrap_or_default();
                Self::CreateItems(items)
            }
            Some("update_status") => {
                let update = value.get("update").cloned().unwrap_or(Value::Null);
                Self::UpdateStatus(StatusUpdate {
                    item_id: non_empty_str(&update, "item_id"),
                    item_title: non_empty_str(&update, "item_title"),
                    status: non_empty_str(&update, "status").or_else(|| non_empty_str(&update, "target_status")),
                })
            }
            _ => Self::ListItems(parse_filters(&value)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateItems(_) => "create_items",
            Self::ListItems(_) => "list_items",
            Self::UpdateStatus(_) => "update_status",
        }
    }
}

fn non_empty_str(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn parse_filters(value: &Value) -> BacklogFilter {
    let Some(filters) = value.get("filters") else {
        return BacklogFilter::default();
    };
    BacklogFilter {
        item_type: non_empty_str(filters, "type"),
        sprint: non_empty_str(filters, "sprint"),
        status: non_empty_str(filters, "status"),
    }
}

/// Build an item from a loosely shaped object
///
/// Type defaults to product, status to todo. Missing ids get a fresh UUID.
fn build_item(raw: &Value) -> BacklogItem {
    let item_type = non_empty_str(raw, "type")
        .and_then(|t| t.parse().ok())
        .unwrap_or(BacklogType::Product);
    let mut item = BacklogItem::new(item_type, non_empty_str(raw, "title").unwrap_or_default());

    if let Some(id) = non_empty_str(raw, "id") {
        item.id = id;
    }
    if let Some(status) = non_empty_str(raw, "status").and_then(|s| normalize_status(&s).parse().ok()) {
        item.status = status;
    }
    item.description = non_empty_str(raw, "description").unwrap_or_default();
    item.sprint = non_empty_str(raw, "sprint");
    item.priority = raw.get("priority").and_then(Value::as_i64);
    item.estimate_hours = raw.get("estimate_hours").and_then(Value::as_f64);
    item.owner = non_empty_str(raw, "owner");
    item
}

/// Outcome of a backlog operation, serialized as a flat JSON object
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BacklogResult {
    Created {
        operation: String,
        created: Vec<String>,
        backlog_size: usize,
    },
    Updated {
        operation: String,
        item: BacklogItem,
    },
    Listed {
        operation: String,
        items: Vec<BacklogItem>,
    },
    Failed {
        operation: String,
        error: String,
    },
}

impl BacklogResult {
    fn failed(operation: &BacklogOperation, error: impl Into<String>) -> Self {
        Self::Failed {
            operation: operation.name().to_string(),
            error: error.into(),
        }
    }

    pub fn operation(&self) -> &str {
        match self {
            Self::Created { operation, .. }
            | Self::Updated { operation, .. }
            | Self::Listed { operation, .. }
            | Self::Failed { operation, .. } => operation,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Sprint planning assistant over the backlog store
#[derive(Clone)]
pub struct SprintAgent {
    deps: AgentDeps,
    state: StateManager,
}

impl SprintAgent {
    pub fn new(deps: AgentDeps, state: StateManager) -> Self {
        Self { deps, state }
    }

    /// Translate a request with one LLM call and apply it
    pub async fn run(&self, request: &str) -> Result<BacklogResult, AgentError> {
        debug!(%request, "SprintAgent::run: called");
        let raw = self
            .deps
            .ask("sprint", &serde_json::json!({ "request": request }))
            .await?;
        let operation = BacklogOperation::parse(&raw);
        info!(operation = operation.name(), "Translated backlog request");
        Ok(self.apply(&operation, request).await)
    }

    /// Apply an already translated operation
    ///
    /// `request` is rescanned for status keywords when the operation's own
    /// status is unusable.
    pub async fn apply(&self, operation: &BacklogOperation, request: &str) -> BacklogResult {
        debug!(operation = operation.name(), "SprintAgent::apply: called");
        let result = match operation {
            BacklogOperation::CreateItems(raw) => self.create_items(operation, raw).await,
            BacklogOperation::ListItems(filter) => self.list_items(operation, filter).await,
            BacklogOperation::UpdateStatus(update) => self.update_status(operation, update, request).await,
        };
        result.unwrap_or_else(|e| {
            warn!(error = %e, "SprintAgent::apply: store failure");
            BacklogResult::failed(operation, e.to_string())
        })
    }

    async fn create_items(&self, operation: &BacklogOperation, raw: &[Value]) -> Result<BacklogResult, StateError> {
        let items: Vec<BacklogItem> = raw.iter().filter(|v| v.is_object()).map(build_item).collect();
        let created = self.state.add_backlog_items(items).await?;
        let backlog_size = self.state.count_backlog_items().await?;
        info!(created = created.len(), backlog_size, "Created backlog items");
        Ok(BacklogResult::Created {
            operation: operation.name().to_string(),
            created,
            backlog_size,
        })
    }

    async fn list_items(&self, operation: &BacklogOperation, filter: &BacklogFilter) -> Result<BacklogResult, StateError> {
        let items = self.state.list_backlog_items(filter.clone()).await?;
        Ok(BacklogResult::Listed {
            operation: operation.name().to_string(),
            items,
        })
    }

    async fn update_status(
        &self,
        operation: &BacklogOperation,
        update: &StatusUpdate,
        request: &str,
    ) -> Result<BacklogResult, StateError> {
        let item_id = match (&update.item_id, &update.item_title) {
            (Some(id), _) => Some(id.clone()),
            (None, Some(title)) => self.state.find_backlog_item_by_title(title).await?.map(|item| item.id),
            (None, None) => None,
        };
        let Some(item_id) = item_id else {
            return Ok(BacklogResult::failed(operation, MISSING_IDENTIFIER));
        };

        let status = update
            .status
            .as_deref()
            .and_then(|s| normalize_status(s).parse::<BacklogStatus>().ok())
            .or_else(|| status_from_request(request));
        let Some(status) = status else {
            return Ok(BacklogResult::failed(operation, INVALID_STATUS));
        };

        match self.state.update_backlog_status(&item_id, status).await {
            Ok(item) => {
                info!(%item_id, %status, "Updated backlog item status");
                Ok(BacklogResult::Updated {
                    operation: operation.name().to_string(),
                    item,
                })
            }
            Err(StateError::NotFound(_)) => Ok(BacklogResult::failed(operation, ITEM_NOT_FOUND)),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::test_support::deps;
    use crate::llm::client::mock::MockLlmClient;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn setup(responses: &[&str]) -> (SprintAgent, StateManager, Arc<MockLlmClient>, TempDir) {
        let temp = TempDir::new().unwrap();
        let state = StateManager::spawn(temp.path()).unwrap();
        let llm = Arc::new(MockLlmClient::with_texts(responses));
        let agent = SprintAgent::new(deps(llm.clone()), state.clone());
        (agent, state, llm, temp)
    }

    #[test]
    fn test_parse_garbage_lists_everything() {
        assert_eq!(
            BacklogOperation::parse("I cannot help"),
            BacklogOperation::ListItems(BacklogFilter::default())
        );
    }

    #[test]
    fn test_parse_unknown_operation_keeps_filters() {
        let op = BacklogOperation::parse(r#"{"operation": "archive", "filters": {"type": "sprint", "status": null}}"#);
        assert_eq!(
            op,
            BacklogOperation::ListItems(BacklogFilter {
                item_type: Some("sprint".to_string()),
                ..Default::default()
            })
        );
    }

    #[test]
    fn test_parse_update_with_target_status_in_fences() {
        let text = "```json\n{\"operation\": \"update_status\", \"update\": {\"item_title\": \"seal\", \"target_status\": \"done\"}}\n```";
        assert_eq!(
            BacklogOperation::parse(text),
            BacklogOperation::UpdateStatus(StatusUpdate {
                item_id: None,
                item_title: Some("seal".to_string()),
                status: Some("done".to_string()),
            })
        );
    }

    #[test]
    fn test_build_item_defaults() {
        let item = build_item(&serde_json::json!({"title": "Inspect aileron hinge", "status": "weird"}));
        assert_eq!(item.item_type, BacklogType::Product);
        assert_eq!(item.status, BacklogStatus::Todo);
        assert!(uuid::Uuid::parse_str(&item.id).is_ok());

        let item = build_item(&serde_json::json!({
            "id": "BL-1", "type": "Sprint", "title": "t", "status": "devam ediyor",
            "sprint": "S-24-08", "priority": 2, "estimate_hours": 3.5, "owner": "P-001"
        }));
        assert_eq!(item.id, "BL-1");
        assert_eq!(item.item_type, BacklogType::Sprint);
        assert_eq!(item.status, BacklogStatus::InProgress);
        assert_eq!(item.priority, Some(2));
        assert_eq!(item.estimate_hours, Some(3.5));
    }

    #[test]
    fn test_result_serializes_flat() {
        let result = BacklogResult::Failed {
            operation: "update_status".to_string(),
            error: ITEM_NOT_FOUND.to_string(),
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value, serde_json::json!({"operation": "update_status", "error": "item bulunamadı"}));
    }

    #[tokio::test]
    async fn test_create_items() {
        let (agent, _state, llm, _temp) = setup(&[
            r#"{"operation": "create_items", "items": [{"title": "Replace seal"}, {"type": "sprint", "title": "Rig aileron", "sprint": "S1"}]}"#,
        ]);

        let result = agent.run("add two items").await.unwrap();
        match result {
            BacklogResult::Created { created, backlog_size, .. } => {
                assert_eq!(created.len(), 2);
                assert_ne!(created[0], created[1]);
                assert_eq!(backlog_size, 2);
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(llm.user_prompt(0).contains("add two items"));
    }

    #[tokio::test]
    async fn test_list_items_in_insertion_order() {
        let list = r#"{"operation": "list_items", "filters": {"type": "product"}}"#;
        let (agent, state, _llm, _temp) = setup(&[list, list]);
        let items = vec![
            BacklogItem::new(BacklogType::Product, "first"),
            BacklogItem::new(BacklogType::Sprint, "sprint only"),
            BacklogItem::new(BacklogType::Product, "second"),
        ];
        state.add_backlog_items(items).await.unwrap();

        let first = agent.run("show product backlog").await.unwrap();
        let second = agent.run("show product backlog").await.unwrap();
        assert_eq!(first, second);
        match first {
            BacklogResult::Listed { items, .. } => {
                let titles: Vec<_> = items.iter().map(|i| i.title.as_str()).collect();
                assert_eq!(titles, vec!["first", "second"]);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_update_by_title_with_synonym() {
        let (agent, state, _llm, _temp) = setup(&[
            r#"{"operation": "update_status", "update": {"item_title": "actuator seal", "status": "devam ediyor"}}"#,
        ]);
        state
            .add_backlog_items(vec![BacklogItem::new(BacklogType::Product, "Replace aileron actuator seal")])
            .await
            .unwrap();

        let result = agent.run("aktüatör görevi devam ediyor").await.unwrap();
        match result {
            BacklogResult::Updated { item, .. } => assert_eq!(item.status, BacklogStatus::InProgress),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_update_status_rescans_request() {
        let (agent, state, _llm, _temp) = setup(&[
            r#"{"operation": "update_status", "update": {"item_id": "BL-7", "status": "finished-ish"}}"#,
        ]);
        let mut item = BacklogItem::new(BacklogType::Product, "Borescope inspection");
        item.id = "BL-7".to_string();
        state.add_backlog_items(vec![item]).await.unwrap();

        let result = agent.run("BL-7 bitti").await.unwrap();
        match result {
            BacklogResult::Updated { item, .. } => assert_eq!(item.status, BacklogStatus::Done),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_update_error_order() {
        let (agent, _state, _llm, _temp) = setup(&[
            r#"{"operation": "update_status", "update": {"status": "blocked"}}"#,
            r#"{"operation": "update_status", "update": {"item_id": "BL-9", "status": "blocked"}}"#,
            r#"{"operation": "update_status", "update": {"item_id": "BL-9", "status": "done"}}"#,
            r#"{"operation": "update_status", "update": {"item_title": "no such title", "status": "done"}}"#,
        ]);

        let missing_id = agent.run("set it").await.unwrap();
        assert_eq!(missing_id.error(), Some(MISSING_IDENTIFIER));

        let bad_status = agent.run("set it").await.unwrap();
        assert_eq!(bad_status.error(), Some(INVALID_STATUS));

        let not_found = agent.run("set it").await.unwrap();
        assert_eq!(not_found.error(), Some(ITEM_NOT_FOUND));
        assert_eq!(not_found.operation(), "update_status");

        let unresolved_title = agent.run("set it").await.unwrap();
        assert_eq!(unresolved_title.error(), Some(MISSING_IDENTIFIER));
    }

    #[tokio::test]
    async fn test_llm_failure_propagates() {
        let (agent, _state, _llm, _temp) = setup(&[]);
        assert!(matches!(agent.run("anything").await, Err(AgentError::Llm(_))));
    }
}
