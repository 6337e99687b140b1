//! CLI module - command line definitions and config assembly.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

use crate::config::CarveConfig;

/// Relic - signature-based file carver for raw disk images
///
/// Scans a raw byte stream (disk image, partition dump, unallocated
/// space) for known file-format magic headers and recovers the files
/// they begin. No filesystem metadata is consulted; the input is treated
/// as an opaque ordered sequence of bytes.
#[derive(Parser, Debug)]
#[command(name = "relic")]
#[command(version)]
#[command(about = "Signature-based file carver for raw disk images", long_about = None)]
pub struct Cli {
    /// Input image or byte stream to scan
    #[arg(required = true)]
    pub input: PathBuf,

    /// Output directory for extracted files [default: carved]
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Only carve these signature names, e.g. JPEG,PNG,PDF
    #[arg(long, short = 't', value_delimiter = ',')]
    pub file_types: Option<Vec<String>>,

    /// Minimum candidate size, e.g. 512 or 4KB [default: 512]
    #[arg(long)]
    pub min_size: Option<String>,

    /// Maximum candidate size; 0 means unlimited [default: 0]
    #[arg(long)]
    pub max_size: Option<String>,

    /// Streaming window size, at least 1KB [default: 64KB]
    #[arg(long)]
    pub chunk_size: Option<String>,

    /// Bytes retained between windows, smaller than the window [default: 4KB]
    #[arg(long)]
    pub overlap_size: Option<String>,

    /// Bytes examined past a header for a footer, and the size fallback
    /// when none is found [default: 1MB]
    #[arg(long)]
    pub search_window: Option<String>,

    /// Catalogue candidates without writing extracted files
    #[arg(long, short = 'n')]
    pub no_extract: bool,

    /// Disable footer matching; every candidate is window-bounded
    #[arg(long)]
    pub no_footers: bool,

    /// Load run options from a TOML file; explicit flags still win
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Load additional signatures from a TOML file
    #[arg(long, short)]
    pub signatures: Option<PathBuf>,

    /// Write a human-readable report here after the run
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Write a CSV report here after the run
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Write a JSON report here after the run
    #[arg(long)]
    pub json: Option<PathBuf>,

    /// Verbose logging (debug level)
    #[arg(long, short)]
    pub verbose: bool,

    /// Suppress the progress bar
    #[arg(long, short)]
    pub quiet: bool,
}

impl Cli {
    /// Assemble the engine config: TOML file (if given) under explicit
    /// flags, defaults underneath both.
    pub fn to_config(&self) -> Result<CarveConfig> {
        let mut config = match &self.config {
            Some(path) => CarveConfig::load_from(path)?,
            None => CarveConfig::default(),
        };

        config.input_file = self.input.clone();
        if let Some(output) = &self.output {
            config.output_directory = output.clone();
        }
        if let Some(types) = &self.file_types {
            config.file_types = types.clone();
        }
        if let Some(s) = &self.min_size {
            config.min_file_size = parse_size(s)?;
        }
        if let Some(s) = &self.max_size {
            config.max_file_size = parse_size(s)?;
        }
        if let Some(s) = &self.chunk_size {
            config.chunk_size = parse_size(s)? as usize;
        }
        if let Some(s) = &self.overlap_size {
            config.overlap_size = parse_size(s)? as usize;
        }
        if let Some(s) = &self.search_window {
            config.search_window = parse_size(s)?;
        }
        if self.no_extract {
            config.extract_files = false;
        }
        if self.no_footers {
            config.use_footers = false;
        }

        Ok(config)
    }
}

/// Parse a human size: bare bytes ("512") or a binary unit suffix
/// ("4KB", "64K", "1MB", "2GiB").
pub fn parse_size(s: &str) -> Result<u64> {
    let s = s.trim();
    let split = s
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len());
    let (digits, unit) = s.split_at(split);

    if digits.is_empty() {
        bail!("Invalid size: {s}");
    }
    let value: u64 = digits
        .parse()
        .with_context(|| format!("Invalid size: {s}"))?;

    let multiplier: u64 = match unit.trim().to_ascii_uppercase().as_str() {
        "" | "B" => 1,
        "K" | "KB" | "KIB" => 1024,
        "M" | "MB" | "MIB" => 1024 * 1024,
        "G" | "GB" | "GIB" => 1024 * 1024 * 1024,
        "T" | "TB" | "TIB" => 1024u64.pow(4),
        other => bail!("Unknown size unit: {other}"),
    };

    value
        .checked_mul(multiplier)
        .with_context(|| format!("Size overflows: {s}"))
}
