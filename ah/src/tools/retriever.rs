//! DocRetriever - lexical retrieval over the docstore corpus

use std::sync::Arc;

use async_trait::async_trait;
use docstore::{DocStore, Passage};
use tracing::debug;

use super::{Retriever, ToolError};

/// Retriever backed by a `DocStore`
///
/// Lookups run on the blocking pool since the store reads chunk files
/// synchronously.
pub struct DocRetriever {
    store: Arc<DocStore>,
    top_k: usize,
}

impl DocRetriever {
    /// Create a retriever returning at most `top_k` passages per query
    pub fn new(store: Arc<DocStore>, top_k: usize) -> Self {
        debug!(%top_k, "DocRetriever::new: called");
        Self { store, top_k }
    }

    /// Open the store at `path`
    pub fn open(path: impl AsRef<std::path::Path>, top_k: usize) -> Result<Self, ToolError> {
        let store = DocStore::open(path).map_err(|e| ToolError::DocStore(e.to_string()))?;
        Ok(Self::new(Arc::new(store), top_k))
    }
}

#[async_trait]
impl Retriever for DocRetriever {
    async fn retrieve(&self, query: &str) -> Result<Vec<Passage>, ToolError> {
        debug!(%query, "DocRetriever::retrieve: called");
        let store = Arc::clone(&self.store);
        let query = query.to_string();
        let top_k = self.top_k;

        tokio::task::spawn_blocking(move || store.retrieve(&query, top_k))
            .await
            .map_err(|e| ToolError::DocStore(e.to_string()))?
            .map_err(|e| ToolError::DocStore(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn seeded_retriever(top_k: usize) -> (TempDir, DocRetriever) {
        let temp = TempDir::new().unwrap();
        let docs = temp.path().join("docs");
        fs::create_dir_all(&docs).unwrap();
        fs::write(
            docs.join("ata27.md"),
            "Aileron actuator hydraulic leak inspection. Check seals and hydraulic lines.",
        )
        .unwrap();
        fs::write(docs.join("ata32.md"), "Landing gear retraction test procedure.").unwrap();

        let retriever = DocRetriever::open(temp.path().join("store"), top_k).unwrap();
        retriever
            .store
            .ingest(&[docs.to_string_lossy().to_string()], Default::default())
            .unwrap();
        (temp, retriever)
    }

    #[tokio::test]
    async fn test_retrieve_ranks_matching_chunk_first() {
        let (_temp, retriever) = seeded_retriever(5);

        let passages = retriever.retrieve("hydraulic leak on aileron actuator").await.unwrap();
        assert!(!passages.is_empty());
        assert!(passages[0].source.ends_with("ata27.md"));
    }

    #[tokio::test]
    async fn test_retrieve_no_match_is_empty() {
        let (_temp, retriever) = seeded_retriever(5);
        assert!(retriever.retrieve("pressurization").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_store_is_empty() {
        let temp = TempDir::new().unwrap();
        let retriever = DocRetriever::open(temp.path(), 5).unwrap();
        assert!(retriever.retrieve("hydraulic").await.unwrap().is_empty());
    }
}
