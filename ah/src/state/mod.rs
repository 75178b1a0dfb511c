//! State management with actor pattern
//!
//! StateManager owns the HubStore and processes messages via channels,
//! providing thread-safe access to backlog, inventory and analytics state.

mod manager;
mod messages;

pub use manager::StateManager;
pub use messages::{StateCommand, StateError, StateResponse};
