//! State manager messages
//!
//! Commands and responses for the actor pattern.

use thiserror::Error;
use tokio::sync::oneshot;

use crate::domain::{BacklogFilter, BacklogItem, BacklogStatus, CompletedWorkPackage, Inventory};

/// Errors from state operations
#[derive(Debug, Error)]
pub enum StateError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    StoreError(String),

    #[error("Channel error")]
    ChannelError,
}

/// Response from state operations
pub type StateResponse<T> = Result<T, StateError>;

/// Commands sent to the StateManager actor
#[derive(Debug)]
pub enum StateCommand {
    // Backlog operations
    AddBacklogItems {
        items: Vec<BacklogItem>,
        reply: oneshot::Sender<StateResponse<Vec<String>>>,
    },
    GetBacklogItem {
        id: String,
        reply: oneshot::Sender<StateResponse<Option<BacklogItem>>>,
    },
    ListBacklogItems {
        filter: BacklogFilter,
        reply: oneshot::Sender<StateResponse<Vec<BacklogItem>>>,
    },
    FindBacklogItemByTitle {
        title: String,
        reply: oneshot::Sender<StateResponse<Option<BacklogItem>>>,
    },
    UpdateBacklogStatus {
        id: String,
        status: BacklogStatus,
        reply: oneshot::Sender<StateResponse<BacklogItem>>,
    },
    CountBacklogItems {
        reply: oneshot::Sender<StateResponse<usize>>,
    },

    // Inventory operations
    UpsertInventory {
        inventory: Inventory,
        reply: oneshot::Sender<StateResponse<usize>>,
    },
    GetInventory {
        reply: oneshot::Sender<StateResponse<Inventory>>,
    },

    // Analytics operations
    AddCompleted {
        record: CompletedWorkPackage,
        reply: oneshot::Sender<StateResponse<String>>,
    },
    ListCompleted {
        sprint_id: Option<String>,
        reply: oneshot::Sender<StateResponse<Vec<CompletedWorkPackage>>>,
    },

    // Sync operations
    Sync {
        reply: oneshot::Sender<StateResponse<()>>,
    },

    // Shutdown
    Shutdown,
}
