//! HubStore - generic persistent record storage
//!
//! Records are grouped into collections. Each collection is an append-only
//! JSONL file that acts as the source of truth; a SQLite database caches the
//! latest version of every record plus its index rows so filtered listing
//! does not need to scan the log.
//!
//! # Layout
//!
//! ```text
//! <store>/
//! ├── hubstore.db          # SQLite cache (records + indexes)
//! ├── backlog_items.jsonl  # one line per write
//! └── personnel.jsonl
//! ```
//!
//! # Example
//!
//! ```ignore
//! use hubstore::{Filter, FilterOp, IndexValue, Store};
//!
//! let mut store = Store::open(".hubstore")?;
//! store.rebuild_indexes::<BacklogItem>()?;
//! store.create(item)?;
//! let todo: Vec<BacklogItem> = store.list(&[Filter::eq("status", "todo")])?;
//! ```

mod error;
mod record;
mod store;

pub use error::{StoreError, StoreResult};
pub use record::{Filter, FilterOp, IndexValue, Record};
pub use store::Store;

/// Current time as Unix milliseconds
pub fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
