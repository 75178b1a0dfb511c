//! Store error types

use thiserror::Error;

/// Errors that can occur during store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Record {id} already exists in {collection}")]
    AlreadyExists { collection: String, id: String },

    #[error("Record {id} not found in {collection}")]
    NotFound { collection: String, id: String },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid filter on '{field}': {reason}")]
    InvalidFilter { field: String, reason: String },
}

/// Result alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_already_exists_message() {
        let err = StoreError::AlreadyExists {
            collection: "backlog_items".to_string(),
            id: "item-1".to_string(),
        };

        let msg = err.to_string();
        assert!(msg.contains("item-1"));
        assert!(msg.contains("backlog_items"));
    }
}
