//! Carving engine - recover embedded files from raw byte streams.
//!
//! Scans an input of arbitrary size through overlapping streaming windows,
//! matches file-format magic headers against the signature registry,
//! bounds each candidate with a footer search (or a size-window fallback),
//! and emits a catalogue of carved files with optional extraction.
//!
//! # Design
//!
//! - **Streaming windows**: the input is never materialized; memory stays
//!   bounded by one window plus one search window (`reader::ChunkReader`)
//! - **Exactly-once positions**: the retained tail of each non-final
//!   window is deferred to the next window, so headers in the overlap
//!   region are evaluated once, with full lookahead, at correct offsets
//! - **First-match dispatch**: registry insertion order decides between
//!   signatures whose headers share a prefix
//! - **Nested candidates**: after a hit, scanning resumes at the next
//!   byte rather than after the carved range, so embedded files (a JPEG
//!   inside a PDF, ZIP-container siblings) are all reported

pub mod matcher;
pub mod reader;
pub mod signatures;

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::CarveConfig;
use crate::error::CarveError;
use self::reader::{Chunk, ChunkReader};
use self::signatures::{FileSignature, SignatureRegistry};

/// Scan positions stop this many bytes minus one short of the final
/// window's end; shorter magics are not probed in that extreme tail.
const MIN_HEADER_LEN: usize = 4;

/// One recovered candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarvedFile {
    /// Name of the matched signature.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Absolute offset of the header's first byte.
    pub start_offset: u64,
    /// Absolute offset one past the last attributed byte.
    pub end_offset: u64,
    pub file_size: u64,
    /// True when the end was fixed by a footer match rather than the
    /// size-window fallback.
    pub has_valid_footer: bool,
    /// True when the bytes were written to the output directory.
    pub extracted: bool,
    /// Basename used for extraction and reports.
    pub filename: String,
}

/// Aggregate counters for one engine.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CarveStats {
    pub files_found: u64,
    pub files_extracted: u64,
    pub bytes_processed: u64,
}

/// How a carve run ended. Errors are reported separately via
/// [`CarveError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarveOutcome {
    Completed,
    Cancelled,
}

type ProgressFn = Box<dyn Fn(f64) + Send>;

/// The carving engine. Owns its registry, result catalogue, and per-type
/// filename counters; one instance can carve several inputs in sequence
/// and keeps filenames unique across those runs.
pub struct FileCarver {
    config: CarveConfig,
    registry: SignatureRegistry,
    results: Vec<CarvedFile>,
    type_counters: HashMap<String, u32>,
    stats: CarveStats,
    progress_callback: Option<ProgressFn>,
    cancel_flag: Option<Arc<AtomicBool>>,
}

impl FileCarver {
    /// Engine with the built-in signature set.
    pub fn new(config: CarveConfig) -> Result<Self, CarveError> {
        Self::with_registry(config, SignatureRegistry::builtin())
    }

    /// Engine with a caller-supplied registry.
    pub fn with_registry(
        config: CarveConfig,
        registry: SignatureRegistry,
    ) -> Result<Self, CarveError> {
        config.validate()?;
        Ok(Self {
            config,
            registry,
            results: Vec::new(),
            type_counters: HashMap::new(),
            stats: CarveStats::default(),
            progress_callback: None,
            cancel_flag: None,
        })
    }

    /// Carve `input` using the configured type filter.
    pub fn carve(&mut self, input: &Path) -> Result<CarveOutcome, CarveError> {
        let filter = self.config.file_types.clone();
        self.carve_types(input, &filter)
    }

    /// Carve `input`, accepting only the named signatures (empty accepts
    /// any). Fatal read errors leave the results accumulated so far
    /// drainable via [`results`](Self::results).
    pub fn carve_types(
        &mut self,
        input: &Path,
        types: &[String],
    ) -> Result<CarveOutcome, CarveError> {
        let mut reader =
            ChunkReader::open(input, self.config.chunk_size, self.config.overlap_size)?;

        tracing::info!(
            input = %input.display(),
            total_len = reader.total_len(),
            signatures = self.registry.len(),
            types = ?types,
            extract = self.config.extract_files,
            "starting carve"
        );

        if self.registry.max_header_len() > self.config.overlap_size + 1 {
            tracing::warn!(
                overlap_size = self.config.overlap_size,
                max_header_len = self.registry.max_header_len(),
                "overlap is shorter than the longest header; boundary-straddling matches may be missed"
            );
        }

        if self.config.extract_files {
            if let Err(e) = fs::create_dir_all(&self.config.output_directory) {
                tracing::warn!(
                    dir = %self.config.output_directory.display(),
                    error = %e,
                    "failed to create output directory; extractions will fail"
                );
            }
        }

        loop {
            if self.is_cancelled() {
                tracing::info!(
                    processed = self.stats.bytes_processed,
                    "carve cancelled"
                );
                return Ok(CarveOutcome::Cancelled);
            }

            let Some(chunk) = reader.read_chunk()? else {
                break;
            };
            self.stats.bytes_processed += chunk.fresh as u64;
            self.scan_window(&mut reader, &chunk, types)?;

            if let Some(cb) = &self.progress_callback {
                cb(reader.progress());
            }
        }

        tracing::info!(
            files_found = self.stats.files_found,
            files_extracted = self.stats.files_extracted,
            bytes_processed = self.stats.bytes_processed,
            "carve complete"
        );

        Ok(CarveOutcome::Completed)
    }

    /// Emitted records in discovery order.
    pub fn results(&self) -> &[CarvedFile] {
        &self.results
    }

    pub fn stats(&self) -> CarveStats {
        self.stats
    }

    /// Drop results and stats from previous runs. Per-type filename
    /// counters are kept so reused engines never repeat a name.
    pub fn clear(&mut self) {
        self.results.clear();
        self.stats = CarveStats::default();
    }

    /// Called synchronously after each window with the reader's progress
    /// percentage. Must be non-blocking.
    pub fn set_progress_callback<F>(&mut self, callback: F)
    where
        F: Fn(f64) + Send + 'static,
    {
        self.progress_callback = Some(Box::new(callback));
    }

    /// Cooperative cancellation; the flag is checked once per window.
    pub fn set_cancel_flag(&mut self, flag: Arc<AtomicBool>) {
        self.cancel_flag = Some(flag);
    }

    /// Register an additional signature ahead of a carve run.
    pub fn add_custom_signature(&mut self, signature: FileSignature) {
        self.registry.add(signature);
    }

    pub fn registry(&self) -> &SignatureRegistry {
        &self.registry
    }

    pub fn config(&self) -> &CarveConfig {
        &self.config
    }

    fn is_cancelled(&self) -> bool {
        self.cancel_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::Relaxed))
    }

    /// Scan one window for header hits.
    ///
    /// Positions inside the retained tail are left to the next window,
    /// which sees them again with full lookahead; on the final window the
    /// scan runs to the end minus the minimum header allowance.
    fn scan_window(
        &mut self,
        reader: &mut ChunkReader,
        chunk: &Chunk,
        types: &[String],
    ) -> Result<(), CarveError> {
        let scan_end = if chunk.retained > 0 {
            chunk.data.len() - chunk.retained
        } else {
            chunk.data.len().saturating_sub(MIN_HEADER_LEN - 1)
        };

        for i in 0..scan_end {
            let sig = match self.registry.detect(&chunk.data[i..]) {
                Some(sig) if types.is_empty() || types.iter().any(|t| t == &sig.name) => {
                    sig.clone()
                }
                _ => continue,
            };

            let start = chunk.offset + i as u64;
            self.carve_candidate(reader, &sig, start)?;
        }

        Ok(())
    }

    /// Bound, filter, record and optionally extract one header hit.
    fn carve_candidate(
        &mut self,
        reader: &mut ChunkReader,
        sig: &FileSignature,
        start: u64,
    ) -> Result<(), CarveError> {
        let search_window = if sig.max_size > 0 {
            self.config.search_window.min(sig.max_size)
        } else {
            self.config.search_window
        };

        let (end, has_valid_footer) = if self.config.use_footers && sig.has_footer {
            let haystack = reader.read_at(start, search_window as usize)?;
            match matcher::find(&haystack, &sig.footer) {
                Some(pos) => (start + pos as u64 + sig.footer.len() as u64, true),
                None => (start + search_window, false),
            }
        } else {
            (start + search_window, false)
        };
        let end = end.min(reader.total_len());

        let file_size = end - start;
        if file_size < self.config.min_file_size {
            return Ok(());
        }
        if self.config.max_file_size > 0 && file_size > self.config.max_file_size {
            return Ok(());
        }

        let filename = self.next_filename(sig);
        let mut record = CarvedFile {
            type_name: sig.name.clone(),
            start_offset: start,
            end_offset: end,
            file_size,
            has_valid_footer,
            extracted: false,
            filename,
        };

        if self.config.extract_files {
            record.extracted = self.extract(reader, &record)?;
            if record.extracted {
                self.stats.files_extracted += 1;
            }
        }

        tracing::info!(
            file_type = %record.type_name,
            start_offset = record.start_offset,
            file_size = record.file_size,
            valid_footer = record.has_valid_footer,
            "file carved"
        );

        self.results.push(record);
        self.stats.files_found += 1;
        Ok(())
    }

    /// `<TYPE>_<NNNNNN><ext>` with a per-type counter starting at 0.
    fn next_filename(&mut self, sig: &FileSignature) -> String {
        let counter = self.type_counters.entry(sig.name.clone()).or_insert(0);
        let filename = format!("{}_{:06}{}", sig.name, counter, sig.extension);
        *counter += 1;
        filename
    }

    /// Write one candidate's bytes to the output directory. Write-side
    /// failures are non-fatal and reported through the record's
    /// `extracted` flag; read failures propagate.
    fn extract(&mut self, reader: &mut ChunkReader, record: &CarvedFile) -> Result<bool, CarveError> {
        let path = self.config.output_directory.join(&record.filename);

        let mut out = match File::create(&path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to create output file");
                return Ok(false);
            }
        };

        let data = reader.read_at(record.start_offset, record.file_size as usize)?;
        if data.is_empty() {
            drop(out);
            let _ = fs::remove_file(&path);
            return Ok(false);
        }

        if let Err(e) = out.write_all(&data) {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                offset = record.start_offset,
                size = record.file_size,
                "failed to write carved file"
            );
            return Ok(false);
        }

        Ok(true)
    }
}
