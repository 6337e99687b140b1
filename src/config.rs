//! Carve run configuration.
//!
//! `CarveConfig` is the full option table handed to the engine; it can be
//! assembled from CLI flags or loaded from a TOML file. Validation happens
//! once, before any scanning begins.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::CarveError;

pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;
pub const DEFAULT_OVERLAP_SIZE: usize = 4 * 1024;
pub const DEFAULT_SEARCH_WINDOW: u64 = 1024 * 1024;
pub const MIN_CHUNK_SIZE: usize = 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CarveConfig {
    /// Path to the byte source.
    pub input_file: PathBuf,
    /// Extraction destination; created if absent.
    pub output_directory: PathBuf,
    /// Signature names to carve; empty accepts any.
    pub file_types: Vec<String>,
    /// Candidates smaller than this are dropped.
    pub min_file_size: u64,
    /// Candidates larger than this are dropped; 0 means unlimited.
    pub max_file_size: u64,
    /// Streaming window size.
    pub chunk_size: usize,
    /// Inter-window retention.
    pub overlap_size: usize,
    /// Maximum bytes examined past a header when locating a footer, and
    /// the size fallback when none is found.
    pub search_window: u64,
    /// When false, catalogue only.
    pub extract_files: bool,
    /// When false, every candidate is search-window bounded.
    pub use_footers: bool,
}

impl Default for CarveConfig {
    fn default() -> Self {
        Self {
            input_file: PathBuf::new(),
            output_directory: PathBuf::from("carved"),
            file_types: Vec::new(),
            min_file_size: 512,
            max_file_size: 0,
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap_size: DEFAULT_OVERLAP_SIZE,
            search_window: DEFAULT_SEARCH_WINDOW,
            extract_files: true,
            use_footers: true,
        }
    }
}

impl CarveConfig {
    /// Reject configurations the engine cannot run with.
    pub fn validate(&self) -> Result<(), CarveError> {
        if self.chunk_size < MIN_CHUNK_SIZE {
            return Err(CarveError::InvalidConfig(format!(
                "chunk_size {} is below the minimum of {}",
                self.chunk_size, MIN_CHUNK_SIZE
            )));
        }
        if self.overlap_size == 0 || self.overlap_size >= self.chunk_size {
            return Err(CarveError::InvalidConfig(format!(
                "overlap_size {} must be non-zero and smaller than chunk_size {}",
                self.overlap_size, self.chunk_size
            )));
        }
        if self.max_file_size > 0 && self.min_file_size > self.max_file_size {
            return Err(CarveError::InvalidConfig(format!(
                "min_file_size {} exceeds max_file_size {}",
                self.min_file_size, self.max_file_size
            )));
        }
        Ok(())
    }

    /// Load a config from a TOML file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;

        let config: CarveConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;

        Ok(config)
    }
}
