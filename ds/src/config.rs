//! Configuration for docstore

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Path to the document store directory
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    /// Default chunk size in bytes
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Default overlap between chunks
    #[serde(default = "default_overlap")]
    pub overlap: usize,

    /// Default number of passages for `retrieve`
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

/// Store location shared with the aerohub agents
pub fn default_store_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("aerohub")
        .join("docstore")
}

fn default_chunk_size() -> usize {
    crate::DEFAULT_CHUNK_SIZE
}

fn default_overlap() -> usize {
    crate::DEFAULT_OVERLAP
}

fn default_top_k() -> usize {
    crate::DEFAULT_TOP_K
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            chunk_size: default_chunk_size(),
            overlap: default_overlap(),
            top_k: default_top_k(),
        }
    }
}

impl Config {
    /// Load config from file, or use defaults
    pub fn load(path: Option<&PathBuf>) -> Result<Self> {
        if let Some(config_path) = path {
            return Self::load_from(config_path);
        }

        let default_paths = [
            Some(PathBuf::from("docstore.yml")),
            dirs::config_dir().map(|p| p.join("aerohub").join("docstore.yml")),
        ];

        for path in default_paths.iter().flatten() {
            if path.exists() {
                return Self::load_from(path);
            }
        }

        Ok(Config::default())
    }

    fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).context(format!("Failed to read config: {}", path.display()))?;
        serde_yaml::from_str(&content).context(format!("Failed to parse config: {}", path.display()))
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
