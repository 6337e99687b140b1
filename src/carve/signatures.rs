//! File signature catalogue for carving.
//!
//! Each signature defines header magic bytes, an optional footer, and an
//! advisory size cap. The registry keeps signatures in insertion order;
//! scan order is significant because the first header that matches at a
//! position wins. The built-in set therefore lists more specific magics
//! (GIF87a/GIF89a) as distinct entries, and ZIP ahead of other
//! PK-prefixed formats.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::matcher;

/// A file format descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileSignature {
    /// Short identifier, unique within a registry ("JPEG", "PNG", ...).
    pub name: String,
    /// Extension used when composing output filenames, with leading dot.
    pub extension: String,
    /// Magic bytes required at the start of a candidate.
    pub header: Vec<u8>,
    /// Terminator bytes whose last byte is the candidate's last byte.
    /// Empty when the format has no footer.
    pub footer: Vec<u8>,
    /// True iff `footer` is non-empty.
    pub has_footer: bool,
    /// Advisory per-type size cap; 0 means none. Caps the footer search
    /// window, while the global max size filter still applies.
    pub max_size: u64,
}

impl FileSignature {
    /// A signature with no footer.
    pub fn new(name: &str, extension: &str, header: &[u8]) -> Self {
        Self {
            name: name.to_string(),
            extension: extension.to_string(),
            header: header.to_vec(),
            footer: Vec::new(),
            has_footer: false,
            max_size: 0,
        }
    }

    /// A footer-delimited signature.
    pub fn with_footer(name: &str, extension: &str, header: &[u8], footer: &[u8]) -> Self {
        Self {
            name: name.to_string(),
            extension: extension.to_string(),
            header: header.to_vec(),
            footer: footer.to_vec(),
            has_footer: !footer.is_empty(),
            max_size: 0,
        }
    }
}

/// Ordered signature catalogue with exact-name lookup.
#[derive(Debug, Clone, Default)]
pub struct SignatureRegistry {
    signatures: Vec<FileSignature>,
    by_name: HashMap<String, usize>,
}

impl SignatureRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The canonical built-in set, in canonical scan order.
    ///
    /// ZIP precedes DOCX, so DOCX magic (an extension of the ZIP magic)
    /// is reported as ZIP under first-match semantics.
    pub fn builtin() -> Self {
        let mut reg = Self::new();

        reg.add(FileSignature::with_footer(
            "JPEG",
            ".jpg",
            &[0xFF, 0xD8, 0xFF],
            &[0xFF, 0xD9],
        ));
        reg.add(FileSignature::with_footer(
            "PNG",
            ".png",
            &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A],
            &[0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82],
        ));
        reg.add(FileSignature::with_footer(
            "GIF87a",
            ".gif",
            b"GIF87a",
            &[0x00, 0x3B],
        ));
        reg.add(FileSignature::with_footer(
            "GIF89a",
            ".gif",
            b"GIF89a",
            &[0x00, 0x3B],
        ));
        reg.add(FileSignature::with_footer("PDF", ".pdf", b"%PDF-", b"%%EOF"));
        reg.add(FileSignature::with_footer(
            "ZIP",
            ".zip",
            &[0x50, 0x4B, 0x03, 0x04],
            &[0x50, 0x4B, 0x05, 0x06],
        ));
        reg.add(FileSignature::new(
            "RAR",
            ".rar",
            &[0x52, 0x61, 0x72, 0x21, 0x1A, 0x07, 0x00],
        ));
        reg.add(FileSignature::new(
            "7ZIP",
            ".7z",
            &[0x37, 0x7A, 0xBC, 0xAF, 0x27, 0x1C],
        ));
        reg.add(FileSignature::new(
            "DOCX",
            ".docx",
            &[0x50, 0x4B, 0x03, 0x04, 0x14, 0x00, 0x06, 0x00],
        ));
        reg.add(FileSignature::new("MP3", ".mp3", b"ID3"));
        reg.add(FileSignature::new("MP3_ALT", ".mp3", &[0xFF, 0xFB]));
        reg.add(FileSignature::new(
            "MP4",
            ".mp4",
            &[0x00, 0x00, 0x00, 0x20, 0x66, 0x74, 0x79, 0x70],
        ));
        reg.add(FileSignature::new("AVI", ".avi", b"RIFF"));
        reg.add(FileSignature::new("BMP", ".bmp", &[0x42, 0x4D]));
        reg.add(FileSignature::new("TIFF_LE", ".tiff", &[0x49, 0x49, 0x2A, 0x00]));
        reg.add(FileSignature::new("TIFF_BE", ".tiff", &[0x4D, 0x4D, 0x00, 0x2A]));
        reg.add(FileSignature::new(
            "DOC",
            ".doc",
            &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1],
        ));
        reg.add(FileSignature::new("EXE", ".exe", &[0x4D, 0x5A]));
        reg.add(FileSignature::new("SQLITE", ".db", b"SQLite format 3\x00"));

        reg
    }

    /// Append a signature. A duplicate name keeps both entries in scan
    /// order but repoints the name lookup at the newer entry.
    pub fn add(&mut self, signature: FileSignature) {
        self.by_name
            .insert(signature.name.clone(), self.signatures.len());
        self.signatures.push(signature);
    }

    /// Signatures in insertion (scan) order.
    pub fn iter(&self) -> impl Iterator<Item = &FileSignature> {
        self.signatures.iter()
    }

    /// Exact-name lookup.
    pub fn get(&self, name: &str) -> Option<&FileSignature> {
        self.by_name.get(name).map(|&i| &self.signatures[i])
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    /// Longest header in the registry; the overlap must be at least one
    /// byte shorter than this for boundary-straddling headers to be seen.
    pub fn max_header_len(&self) -> usize {
        self.signatures
            .iter()
            .map(|s| s.header.len())
            .max()
            .unwrap_or(0)
    }

    /// First signature whose header matches at the start of `buf`,
    /// walking insertion order.
    pub fn detect(&self, buf: &[u8]) -> Option<&FileSignature> {
        self.signatures
            .iter()
            .find(|sig| matcher::match_prefix(buf, &sig.header))
    }

    /// Load additional signatures from a TOML file and append them in
    /// file order. Header and footer are hex strings.
    pub fn extend_from_file(&mut self, path: &Path) -> Result<usize> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read signature file: {}", path.display()))?;

        let file: SignatureFile = toml::from_str(&content)
            .with_context(|| format!("Failed to parse signature file: {}", path.display()))?;

        let count = file.signature.len();
        for spec in file.signature {
            let header = hex::decode(&spec.header)
                .with_context(|| format!("Bad header hex for signature {}", spec.name))?;
            anyhow::ensure!(!header.is_empty(), "Signature {} has an empty header", spec.name);

            let footer = match &spec.footer {
                Some(f) if !f.is_empty() => hex::decode(f)
                    .with_context(|| format!("Bad footer hex for signature {}", spec.name))?,
                _ => Vec::new(),
            };

            let mut sig = FileSignature::with_footer(&spec.name, &spec.extension, &header, &footer);
            sig.max_size = spec.max_size;
            self.add(sig);
        }

        tracing::info!(path = %path.display(), count, "custom signatures loaded");
        Ok(count)
    }
}

/// On-disk shape of a custom signature file.
#[derive(Debug, Deserialize)]
struct SignatureFile {
    #[serde(default)]
    signature: Vec<SignatureSpec>,
}

#[derive(Debug, Deserialize)]
struct SignatureSpec {
    name: String,
    extension: String,
    /// Hex-encoded magic bytes, e.g. "FFD8FF".
    header: String,
    /// Hex-encoded footer bytes; absent or empty for none.
    #[serde(default)]
    footer: Option<String>,
    #[serde(default)]
    max_size: u64,
}
