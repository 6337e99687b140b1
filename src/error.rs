//! Error taxonomy for the carving engine.
//!
//! `IoOpen` and `IoRead` are fatal for a run; `IoWrite` covers per-candidate
//! extraction and report output; `InvalidConfig` is rejected before any
//! scanning begins. Absence of matches is not an error.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CarveError {
    #[error("failed to open input {path}: {source}")]
    IoOpen { path: PathBuf, source: io::Error },

    #[error("read failed at offset {offset}: {source}")]
    IoRead { offset: u64, source: io::Error },

    #[error("failed to write {path}: {source}")]
    IoWrite { path: PathBuf, source: io::Error },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
