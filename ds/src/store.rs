//! Core DocStore implementation

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;
use walkdir::WalkDir;

/// Unique identifier for a context
pub type ContextId = String;

/// Identifier for a chunk within a context
pub type ChunkId = String;

/// Metadata for a single chunk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMeta {
    /// Chunk ID, local to its context
    pub chunk_id: ChunkId,
    /// Source file path
    pub source: String,
    /// Byte offset in source file
    pub byte_start: u64,
    /// Byte end in source file
    pub byte_end: u64,
    /// Content hash for staleness detection
    pub content_hash: String,
    /// Creation timestamp (unix ms)
    pub created_at: i64,
}

/// Options for ingesting content
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Maximum size of each chunk in bytes
    pub chunk_size: usize,
    /// Overlap between adjacent chunks in bytes
    pub overlap: usize,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            chunk_size: crate::DEFAULT_CHUNK_SIZE,
            overlap: crate::DEFAULT_OVERLAP,
        }
    }
}

/// Options for regex search
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Maximum number of results
    pub max_results: usize,
    /// Case insensitive search
    pub case_insensitive: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            max_results: 10,
            case_insensitive: false,
        }
    }
}

/// A regex search match
#[derive(Debug, Clone)]
pub struct SearchMatch {
    /// Chunk ID containing the match
    pub chunk_id: ChunkId,
    /// Byte offset within chunk
    pub offset: usize,
    /// Snippet of matching text
    pub snippet: String,
}

/// A chunk returned by lexical retrieval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    /// Full chunk reference: `context_id/chunk_id`
    pub chunk_ref: String,
    /// Source file the chunk came from
    pub source: String,
    /// Chunk text
    pub text: String,
    /// Number of distinct query terms found
    pub matched_terms: usize,
    /// Total occurrences of query terms
    pub hits: usize,
}

/// Statistics for a context
#[derive(Debug, Clone)]
pub struct ContextStats {
    /// Number of chunks
    pub chunk_count: usize,
    /// Total bytes stored
    pub total_bytes: u64,
    /// Number of source files
    pub source_count: usize,
}

/// The document store
pub struct DocStore {
    base_path: PathBuf,
}

impl DocStore {
    /// Open or create a document store at the given path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path).context("Failed to create store directory")?;
        debug!(?base_path, "Opened document store");
        Ok(Self { base_path })
    }

    /// Ingest files, directories or glob patterns into a new context
    pub fn ingest(&self, patterns: &[String], options: IngestOptions) -> Result<ContextId> {
        let files = expand_patterns(patterns)?;
        if files.is_empty() {
            return Err(eyre::eyre!("No files matched: {}", patterns.join(", ")));
        }

        let context_id = Uuid::now_v7().to_string();
        let ctx_path = self.base_path.join(&context_id);
        let chunks_path = ctx_path.join("chunks");
        fs::create_dir_all(&chunks_path)?;

        let mut index_file = fs::File::create(ctx_path.join("index.jsonl"))?;
        let mut chunk_num = 0u32;

        for path in &files {
            let content = match fs::read_to_string(path) {
                Ok(content) => content,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable file");
                    continue;
                }
            };
            let source = path.to_string_lossy().to_string();

            for (start, end) in chunk_spans(&content, options.chunk_size, options.overlap) {
                chunk_num += 1;
                let chunk_id = format!("{:04}", chunk_num);
                let text = &content[start..end];
                fs::write(chunks_path.join(format!("{}.txt", chunk_id)), text)?;

                let meta = ChunkMeta {
                    chunk_id,
                    source: source.clone(),
                    byte_start: start as u64,
                    byte_end: end as u64,
                    content_hash: format!("{:x}", content_hash(text.as_bytes())),
                    created_at: chrono::Utc::now().timestamp_millis(),
                };
                writeln!(index_file, "{}", serde_json::to_string(&meta)?)?;
            }
        }

        info!(context_id, files = files.len(), chunk_count = chunk_num, "Ingestion complete");
        Ok(context_id)
    }

    /// Rank chunks across every context against a free-text query
    ///
    /// Chunks score by distinct query terms matched, then total hits. Ties
    /// keep context and chunk order. Chunks matching no term are dropped.
    pub fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<Passage>> {
        let terms = tokenize(query);
        debug!(?terms, top_k, "retrieve: called");
        if terms.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        let mut passages = Vec::new();
        for context_id in self.list_contexts()? {
            for meta in self.read_index(&context_id)? {
                let chunk_ref = format!("{}/{}", context_id, meta.chunk_id);
                let text = self.get_chunk(&chunk_ref)?;
                let lowered = text.to_lowercase();

                let mut matched_terms = 0;
                let mut hits = 0;
                for term in &terms {
                    let count = lowered.matches(term.as_str()).count();
                    if count > 0 {
                        matched_terms += 1;
                        hits += count;
                    }
                }

                if matched_terms > 0 {
                    passages.push(Passage {
                        chunk_ref,
                        source: meta.source,
                        text,
                        matched_terms,
                        hits,
                    });
                }
            }
        }

        // Stable sort keeps context/chunk order for ties
        passages.sort_by(|a, b| b.matched_terms.cmp(&a.matched_terms).then(b.hits.cmp(&a.hits)));
        passages.truncate(top_k);
        debug!(count = passages.len(), "retrieve: ranked passages");
        Ok(passages)
    }

    /// Search for a regex pattern within a context
    pub fn search(&self, context_id: &str, pattern: &str, options: SearchOptions) -> Result<Vec<SearchMatch>> {
        let regex = regex::RegexBuilder::new(pattern)
            .case_insensitive(options.case_insensitive)
            .build()?;

        let mut matches = Vec::new();
        for meta in self.read_index(context_id)? {
            let content = self.get_chunk(&format!("{}/{}", context_id, meta.chunk_id))?;

            for m in regex.find_iter(&content) {
                let start = floor_char_boundary(&content, m.start().saturating_sub(30));
                let end = ceil_char_boundary(&content, (m.end() + 30).min(content.len()));

                matches.push(SearchMatch {
                    chunk_id: meta.chunk_id.clone(),
                    offset: m.start(),
                    snippet: content[start..end].to_string(),
                });

                if matches.len() >= options.max_results {
                    return Ok(matches);
                }
            }
        }

        Ok(matches)
    }

    /// Get the full content of a chunk (`context_id/chunk_id`)
    pub fn get_chunk(&self, chunk_ref: &str) -> Result<String> {
        let Some((context_id, chunk_id)) = chunk_ref.split_once('/') else {
            return Err(eyre::eyre!("Chunk ID must include context: context_id/chunk_num"));
        };

        let chunk_path = self
            .base_path
            .join(context_id)
            .join("chunks")
            .join(format!("{}.txt", chunk_id));

        fs::read_to_string(&chunk_path).context(format!("Chunk not found: {}", chunk_ref))
    }

    /// Get a window of text around a byte offset, widened to char boundaries
    pub fn get_window(&self, chunk_ref: &str, center: usize, radius: usize) -> Result<String> {
        let content = self.get_chunk(chunk_ref)?;
        let center = center.min(content.len());

        let start = floor_char_boundary(&content, center.saturating_sub(radius));
        let end = ceil_char_boundary(&content, (center + radius).min(content.len()));

        Ok(content[start..end].to_string())
    }

    /// Get statistics for a context
    pub fn stats(&self, context_id: &str) -> Result<ContextStats> {
        let metas = self.read_index(context_id)?;

        let sources: HashSet<&str> = metas.iter().map(|m| m.source.as_str()).collect();
        Ok(ContextStats {
            chunk_count: metas.len(),
            total_bytes: metas.iter().map(|m| m.byte_end - m.byte_start).sum(),
            source_count: sources.len(),
        })
    }

    /// List all context IDs, oldest first
    pub fn list_contexts(&self) -> Result<Vec<ContextId>> {
        let mut contexts = Vec::new();

        for entry in fs::read_dir(&self.base_path)? {
            let entry = entry?;
            if !entry.path().join("index.jsonl").is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                contexts.push(name.to_string());
            }
        }

        // v7 ids sort by creation time
        contexts.sort();
        Ok(contexts)
    }

    /// Delete a context and all its data
    pub fn delete(&self, context_id: &str) -> Result<()> {
        let ctx_path = self.base_path.join(context_id);
        if ctx_path.exists() {
            fs::remove_dir_all(&ctx_path)?;
            info!(context_id, "Deleted context");
        }
        Ok(())
    }

    fn read_index(&self, context_id: &str) -> Result<Vec<ChunkMeta>> {
        let index_path = self.base_path.join(context_id).join("index.jsonl");
        if !index_path.exists() {
            return Err(eyre::eyre!("Context not found: {}", context_id));
        }

        let reader = BufReader::new(fs::File::open(&index_path)?);
        let mut metas = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            metas.push(serde_json::from_str(&line).context(format!("Corrupt index in context {}", context_id))?);
        }
        Ok(metas)
    }
}

/// Split a query into lower-cased alphanumeric terms of 3+ chars, deduplicated
pub fn tokenize(query: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= 3)
        .map(|t| t.to_lowercase())
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

/// Expand globs and walk directories into a sorted, deduplicated file list
fn expand_patterns(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let path = Path::new(pattern);
        if path.is_dir() {
            for entry in WalkDir::new(path).sort_by_file_name() {
                let entry = entry?;
                if entry.file_type().is_file() {
                    files.push(entry.into_path());
                }
            }
            continue;
        }

        let paths = glob::glob(pattern).context(format!("Invalid glob pattern: {}", pattern))?;
        for entry in paths {
            let path = entry?;
            if path.is_file() {
                files.push(path);
            }
        }
    }

    let mut seen = HashSet::new();
    files.retain(|p| seen.insert(p.clone()));
    Ok(files)
}

/// Byte spans of overlapping chunks, every edge on a char boundary
fn chunk_spans(text: &str, chunk_size: usize, overlap: usize) -> Vec<(usize, usize)> {
    let len = text.len();
    let chunk_size = chunk_size.max(1);
    let mut spans = Vec::new();
    let mut start = 0;

    while start < len {
        let mut end = floor_char_boundary(text, (start + chunk_size).min(len));
        if end <= start {
            // A single char wider than the chunk size
            end = ceil_char_boundary(text, start + 1);
        }
        spans.push((start, end));
        if end >= len {
            break;
        }

        let next = floor_char_boundary(text, end.saturating_sub(overlap));
        start = if next <= start { end } else { next };
    }

    spans
}

fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn ceil_char_boundary(text: &str, mut index: usize) -> usize {
    while !text.is_char_boundary(index) {
        index += 1;
    }
    index
}

/// Simple hash for content (not cryptographic, just for change detection)
fn content_hash(data: &[u8]) -> u64 {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    data.hash(&mut hasher);
    hasher.finish()
}
