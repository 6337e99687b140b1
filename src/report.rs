//! Report generation for carve results.
//!
//! Formats the engine's catalogue into a human-readable text report, a
//! CSV table, or a JSON document, plus the per-type summary shown on the
//! terminal after a run.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use chrono::Utc;
use humansize::{format_size, BINARY};
use serde::Serialize;

use crate::carve::{CarveStats, CarvedFile};
use crate::error::CarveError;

/// Shape of the JSON report document.
#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    generated_at: String,
    stats: &'a CarveStats,
    files: &'a [CarvedFile],
}

/// Per-type rollup used by the terminal summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSummary {
    pub type_name: String,
    pub count: u64,
    pub total_bytes: u64,
}

/// Aggregate results per signature name, sorted by name.
pub fn type_summary(results: &[CarvedFile]) -> Vec<TypeSummary> {
    let mut by_type: BTreeMap<&str, (u64, u64)> = BTreeMap::new();
    for file in results {
        let entry = by_type.entry(&file.type_name).or_insert((0, 0));
        entry.0 += 1;
        entry.1 += file.file_size;
    }

    by_type
        .into_iter()
        .map(|(name, (count, total_bytes))| TypeSummary {
            type_name: name.to_string(),
            count,
            total_bytes,
        })
        .collect()
}

/// Human-readable run report.
pub fn write_text_report(
    path: &Path,
    results: &[CarvedFile],
    stats: &CarveStats,
) -> Result<(), CarveError> {
    let mut out = String::new();

    let _ = writeln!(out, "=== FILE CARVING REPORT ===");
    let _ = writeln!(out, "Generated: {}", Utc::now().format("%Y-%m-%d %H:%M:%S UTC"));
    let _ = writeln!(out, "Files found: {}", stats.files_found);
    let _ = writeln!(out, "Files extracted: {}", stats.files_extracted);
    let _ = writeln!(out, "Bytes processed: {}", stats.bytes_processed);
    let _ = writeln!(out);
    let _ = writeln!(out, "FILE DETAILS:");
    let _ = writeln!(out, "{}", "-".repeat(80));

    for file in results {
        let _ = writeln!(out, "File: {}", file.filename);
        let _ = writeln!(out, "  Type: {}", file.type_name);
        let _ = writeln!(
            out,
            "  Start offset: 0x{:x} ({})",
            file.start_offset, file.start_offset
        );
        let _ = writeln!(
            out,
            "  End offset: 0x{:x} ({})",
            file.end_offset, file.end_offset
        );
        let _ = writeln!(out, "  Size: {} bytes", file.file_size);
        let _ = writeln!(
            out,
            "  Valid footer: {}",
            if file.has_valid_footer { "yes" } else { "no" }
        );
        let _ = writeln!(
            out,
            "  Extracted: {}",
            if file.extracted { "yes" } else { "no" }
        );
        let _ = writeln!(out);
    }

    write_file(path, out.as_bytes())
}

/// One row per record, suitable for spreadsheet import.
pub fn write_csv_report(
    path: &Path,
    results: &[CarvedFile],
) -> Result<(), CarveError> {
    let mut out = String::from("filename,type,start_offset,end_offset,size,valid_footer,extracted\n");

    for file in results {
        let _ = writeln!(
            out,
            "{},{},{},{},{},{},{}",
            file.filename,
            file.type_name,
            file.start_offset,
            file.end_offset,
            file.file_size,
            file.has_valid_footer,
            file.extracted
        );
    }

    write_file(path, out.as_bytes())
}

/// Machine-readable report with stats and all records.
pub fn write_json_report(
    path: &Path,
    results: &[CarvedFile],
    stats: &CarveStats,
) -> Result<(), CarveError> {
    let report = JsonReport {
        generated_at: Utc::now().to_rfc3339(),
        stats,
        files: results,
    };

    let json = serde_json::to_string_pretty(&report)
        .map_err(|e| CarveError::IoWrite {
            path: path.to_path_buf(),
            source: std::io::Error::other(e),
        })?;

    write_file(path, json.as_bytes())
}

/// Per-type table printed after a run.
pub fn format_summary(results: &[CarvedFile]) -> String {
    if results.is_empty() {
        return "No files were found.\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(out, "{:<10} {:>6} {:>12}", "Type", "Count", "Total");
    let _ = writeln!(out, "{}", "-".repeat(30));
    for row in type_summary(results) {
        let _ = writeln!(
            out,
            "{:<10} {:>6} {:>12}",
            row.type_name,
            row.count,
            format_size(row.total_bytes, BINARY)
        );
    }
    out
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), CarveError> {
    std::fs::write(path, bytes).map_err(|source| CarveError::IoWrite {
        path: path.to_path_buf(),
        source,
    })
}
