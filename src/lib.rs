//! Relic Library
//!
//! Signature-based file carving for raw disk images: recovers embedded
//! files from an opaque byte stream by scanning for file-format magic
//! headers and matching footers. No filesystem metadata is consulted.
//!
//! # Features
//!
//! - **Streaming windows**: bounded memory on arbitrarily large inputs,
//!   with inter-window overlap so no header is lost at a read boundary
//! - **Ordered signature registry**: first-match semantics with a
//!   built-in catalogue of common formats, extensible at runtime
//! - **Footer-delimited carving**: precise end offsets where formats
//!   define a trailer, with a bounded size-window fallback elsewhere
//! - **Nested candidates**: embedded files (a JPEG inside a PDF) are
//!   reported alongside their containers
//!
//! # Example
//!
//! ```no_run
//! use relic::{CarveConfig, FileCarver};
//! use std::path::Path;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = CarveConfig {
//!         output_directory: "recovered".into(),
//!         min_file_size: 1024,
//!         ..Default::default()
//!     };
//!
//!     let mut carver = FileCarver::new(config)?;
//!     carver.carve(Path::new("disk.img"))?;
//!
//!     for file in carver.results() {
//!         println!(
//!             "{} at {:#x} ({} bytes)",
//!             file.type_name, file.start_offset, file.file_size
//!         );
//!     }
//!     Ok(())
//! }
//! ```

pub mod carve;
pub mod cli;
pub mod config;
pub mod error;
pub mod report;

// Re-export commonly used types
pub use carve::signatures::{FileSignature, SignatureRegistry};
pub use carve::{CarveOutcome, CarveStats, CarvedFile, FileCarver};
pub use config::CarveConfig;
pub use error::CarveError;
