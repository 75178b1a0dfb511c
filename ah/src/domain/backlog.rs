//! Backlog domain types
//!
//! Product and sprint backlog items plus the status synonym table used when
//! translating free-text requests.

use hubstore::{IndexValue, Record, now_ms};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use tracing::debug;

/// Backlog level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BacklogType {
    #[default]
    Product,
    Sprint,
}

impl std::fmt::Display for BacklogType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Product => write!(f, "product"),
            Self::Sprint => write!(f, "sprint"),
        }
    }
}

impl FromStr for BacklogType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "product" => Ok(Self::Product),
            "sprint" => Ok(Self::Sprint),
            other => Err(format!("unknown backlog type: {}", other)),
        }
    }
}

/// Backlog item lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BacklogStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

impl BacklogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Done => "done",
        }
    }
}

impl std::fmt::Display for BacklogStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BacklogStatus {
    type Err = String;

    /// Strict parse of a canonical status
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "todo" => Ok(Self::Todo),
            "in_progress" => Ok(Self::InProgress),
            "done" => Ok(Self::Done),
            other => Err(format!("invalid status: {}", other)),
        }
    }
}

/// Map a status phrase to its canonical form
///
/// Known synonyms (English and Turkish) map to `todo`, `in_progress` or
/// `done`. Anything else is returned trimmed and lower-cased so the caller's
/// validity check rejects it.
pub fn normalize_status(raw: &str) -> String {
    let key = raw.trim().to_lowercase();
    let canonical = match key.as_str() {
        "todo" | "pending" | "beklemede" | "bekleyen" => "todo",
        "in_progress" | "in progress" | "devam ediyor" => "in_progress",
        "done" | "completed" | "tamamlandı" | "tamamlanan" => "done",
        _ => return key,
    };
    canonical.to_string()
}

/// Scan a whole request for status keywords
///
/// Checked in order in_progress, done, todo; the first group with a hit wins.
pub fn status_from_request(request: &str) -> Option<BacklogStatus> {
    let lowered = request.to_lowercase();
    let has_any = |words: &[&str]| words.iter().any(|w| lowered.contains(w));

    if has_any(&["devam ediyor", "in progress", "sürüyor"]) {
        Some(BacklogStatus::InProgress)
    } else if has_any(&["tamamlandı", "tamamla", "bitti", "done"]) {
        Some(BacklogStatus::Done)
    } else if has_any(&["beklemede", "bekleyen", "todo", "pending"]) {
        Some(BacklogStatus::Todo)
    } else {
        None
    }
}

/// A product or sprint backlog item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacklogItem {
    /// Unique identifier
    pub id: String,

    /// Backlog level
    #[serde(rename = "type")]
    pub item_type: BacklogType,

    pub title: String,

    #[serde(default)]
    pub description: String,

    pub status: BacklogStatus,

    /// Sprint name, for sprint-level items
    #[serde(default)]
    pub sprint: Option<String>,

    #[serde(default)]
    pub priority: Option<i64>,

    #[serde(default)]
    pub estimate_hours: Option<f64>,

    #[serde(default)]
    pub owner: Option<String>,

    /// Creation timestamp (Unix milliseconds)
    pub created_at: i64,

    /// Last update timestamp (Unix milliseconds)
    pub updated_at: i64,
}

impl BacklogItem {
    /// Create a todo item with a fresh id
    pub fn new(item_type: BacklogType, title: impl Into<String>) -> Self {
        let now = now_ms();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            item_type,
            title: title.into(),
            description: String::new(),
            status: BacklogStatus::Todo,
            sprint: None,
            priority: None,
            estimate_hours: None,
            owner: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Change status and bump `updated_at`
    pub fn set_status(&mut self, status: BacklogStatus) {
        debug!(%self.id, %status, "BacklogItem::set_status: called");
        self.status = status;
        self.updated_at = now_ms();
    }
}

impl Record for BacklogItem {
    fn id(&self) -> &str {
        &self.id
    }

    fn updated_at(&self) -> i64 {
        self.updated_at
    }

    fn collection_name() -> &'static str {
        "backlog_items"
    }

    fn indexed_fields(&self) -> HashMap<String, IndexValue> {
        let mut fields = HashMap::new();
        fields.insert("type".to_string(), IndexValue::String(self.item_type.to_string()));
        fields.insert("status".to_string(), IndexValue::String(self.status.to_string()));
        if let Some(ref sprint) = self.sprint {
            fields.insert("sprint".to_string(), IndexValue::String(sprint.clone()));
        }
        fields
    }
}

/// Optional filters for listing backlog items
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacklogFilter {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub item_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sprint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl BacklogFilter {
    /// True when no field is set
    pub fn is_empty(&self) -> bool {
        self.item_type.is_none() && self.sprint.is_none() && self.status.is_none()
    }

    /// Store filters for the set fields
    pub fn to_filters(&self) -> Vec<hubstore::Filter> {
        let mut filters = Vec::new();
        if let Some(ref t) = self.item_type {
            filters.push(hubstore::Filter::eq("type", t.trim().to_lowercase()));
        }
        if let Some(ref s) = self.sprint {
            filters.push(hubstore::Filter::eq("sprint", s.as_str()));
        }
        if let Some(ref s) = self.status {
            filters.push(hubstore::Filter::eq("status", normalize_status(s)));
        }
        filters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_status_synonyms() {
        assert_eq!(normalize_status("devam ediyor"), "in_progress");
        assert_eq!(normalize_status("In Progress"), "in_progress");
        assert_eq!(normalize_status("tamamlandı"), "done");
        assert_eq!(normalize_status(" COMPLETED "), "done");
        assert_eq!(normalize_status("beklemede"), "todo");
        assert_eq!(normalize_status("pending"), "todo");
    }

    #[test]
    fn test_normalize_status_unknown_passthrough() {
        assert_eq!(normalize_status("  Blocked "), "blocked");
        assert!("blocked".parse::<BacklogStatus>().is_err());
        assert_eq!(normalize_status(""), "");
    }

    #[test]
    fn test_status_from_request_order() {
        assert_eq!(
            status_from_request("Aileron görevini devam ediyora al"),
            Some(BacklogStatus::InProgress)
        );
        assert_eq!(status_from_request("Kablo kontrolü bitti"), Some(BacklogStatus::Done));
        assert_eq!(status_from_request("move it back to pending"), Some(BacklogStatus::Todo));
        assert_eq!(status_from_request("show me the backlog"), None);
    }

    #[test]
    fn test_status_serde_snake_case() {
        let json = serde_json::to_string(&BacklogStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
        assert_eq!("in_progress".parse::<BacklogStatus>().unwrap(), BacklogStatus::InProgress);
    }

    #[test]
    fn test_item_serializes_type_field() {
        let item = BacklogItem::new(BacklogType::Sprint, "Replace actuator seal");
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["type"], "sprint");
        assert_eq!(value["status"], "todo");
    }

    #[test]
    fn test_indexed_fields() {
        let mut item = BacklogItem::new(BacklogType::Sprint, "Rigging check");
        item.sprint = Some("S-24-08".to_string());

        let fields = item.indexed_fields();
        assert_eq!(fields.get("type"), Some(&IndexValue::String("sprint".to_string())));
        assert_eq!(fields.get("status"), Some(&IndexValue::String("todo".to_string())));
        assert_eq!(fields.get("sprint"), Some(&IndexValue::String("S-24-08".to_string())));
    }

    #[test]
    fn test_filter_normalizes_status() {
        let filter = BacklogFilter {
            status: Some("devam ediyor".to_string()),
            ..Default::default()
        };
        let filters = filter.to_filters();
        assert_eq!(filters.len(), 1);
        assert_eq!(filters[0].value, IndexValue::String("in_progress".to_string()));
        assert!(BacklogFilter::default().is_empty());
    }
}
