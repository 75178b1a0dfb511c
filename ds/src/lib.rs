//! DocStore - chunked document corpus for maintenance retrieval
//!
//! Stores manuals, task cards and notes as overlapping text chunks and
//! answers lexical queries over every ingested context. Agents use
//! `retrieve` as their retrieval backend; `search`, `get_chunk` and
//! `get_window` support manual inspection through the `ds` binary.
//!
//! # Architecture
//!
//! ```text
//! docstore/
//! └── {context_id}/
//!     ├── index.jsonl      # chunk metadata
//!     └── chunks/
//!         ├── 0001.txt
//!         ├── 0002.txt
//!         └── ...
//! ```
//!
//! # Example
//!
//! ```ignore
//! use docstore::DocStore;
//!
//! let store = DocStore::open("docstore")?;
//! let ctx_id = store.ingest(&["manuals/**/*.md".to_string()], Default::default())?;
//! let passages = store.retrieve("hydraulic actuator leak", 5)?;
//! ```

pub mod cli;
pub mod config;
mod store;

pub use store::{
    ChunkMeta, ContextId, ContextStats, DocStore, IngestOptions, Passage, SearchMatch, SearchOptions, tokenize,
};

/// Default chunk size (2KB), sized to fit several passages in one prompt
pub const DEFAULT_CHUNK_SIZE: usize = 2 * 1024;

/// Default overlap between chunks (256 bytes)
pub const DEFAULT_OVERLAP: usize = 256;

/// Default number of passages returned by `retrieve`
pub const DEFAULT_TOP_K: usize = 5;
