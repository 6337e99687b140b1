//! Integration tests for Relic
//!
//! Drives the full carving pipeline over temp disk images: detection,
//! footer bounding, chunk-boundary behavior, filters, extraction and
//! report output.

use std::path::{Path, PathBuf};

use tempfile::tempdir;

use relic::{report, CarveConfig, CarveOutcome, FileCarver, SignatureRegistry};

// ═══════════════════════════════════════════════════════════════════
// Helpers
// ═══════════════════════════════════════════════════════════════════

fn write_img(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
    let p = dir.join(name);
    std::fs::write(&p, data).unwrap();
    p
}

fn catalogue_config(dir: &Path) -> CarveConfig {
    CarveConfig {
        output_directory: dir.join("out"),
        min_file_size: 1,
        search_window: 4096,
        extract_files: false,
        ..Default::default()
    }
}

/// Deterministic noise that is identical across runs.
fn noise(len: usize, seed: u64) -> Vec<u8> {
    let mut state = seed;
    (0..len)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (state >> 33) as u8
        })
        .collect()
}

fn jpeg_of_size(size: usize) -> Vec<u8> {
    assert!(size >= 6);
    let mut v = vec![0xFF, 0xD8, 0xFF, 0xE0];
    v.extend(std::iter::repeat(0u8).take(size - 6));
    v.extend_from_slice(&[0xFF, 0xD9]);
    v
}

// ═══════════════════════════════════════════════════════════════════
// Detection: JPEG in surrounding noise
// ═══════════════════════════════════════════════════════════════════

#[test]
fn jpeg_between_noise_bytes_is_carved_exactly() {
    let dir = tempdir().unwrap();
    let mut data = vec![0xAA, 0xBB, 0xCC];
    data.extend_from_slice(&[
        0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46, 0x00, 0x01,
    ]);
    data.extend_from_slice(&[0xFF, 0xD9]);
    data.extend_from_slice(&[0xDE, 0xAD]);
    let path = write_img(dir.path(), "s1.img", &data);

    let mut carver = FileCarver::new(catalogue_config(dir.path())).unwrap();
    assert_eq!(carver.carve(&path).unwrap(), CarveOutcome::Completed);

    assert_eq!(carver.results().len(), 1);
    let r = &carver.results()[0];
    assert_eq!(
        (r.type_name.as_str(), r.start_offset, r.end_offset, r.file_size),
        ("JPEG", 3, 17, 14)
    );
    assert!(r.has_valid_footer);
}

// ═══════════════════════════════════════════════════════════════════
// Nested candidates: JPEG embedded in a PDF
// ═══════════════════════════════════════════════════════════════════

#[test]
fn pdf_with_embedded_jpeg_yields_both_files() {
    let dir = tempdir().unwrap();
    let mut data = vec![0u8; 705];
    data[..8].copy_from_slice(b"%PDF-1.4");
    // Embedded JPEG at 200: header, 300-byte body, footer.
    data[200..204].copy_from_slice(&[0xFF, 0xD8, 0xFF, 0xE0]);
    data[504..506].copy_from_slice(&[0xFF, 0xD9]);
    data[700..705].copy_from_slice(b"%%EOF");
    let path = write_img(dir.path(), "nested.img", &data);

    let mut config = catalogue_config(dir.path());
    config.extract_files = true;
    let mut carver = FileCarver::new(config).unwrap();
    carver.carve(&path).unwrap();

    assert_eq!(carver.results().len(), 2);
    let pdf = &carver.results()[0];
    let jpeg = &carver.results()[1];

    assert_eq!(pdf.type_name, "PDF");
    assert_eq!((pdf.start_offset, pdf.end_offset), (0, 705));
    assert!(pdf.has_valid_footer);

    assert_eq!(jpeg.type_name, "JPEG");
    assert_eq!((jpeg.start_offset, jpeg.end_offset), (200, 506));
    assert!(jpeg.has_valid_footer);
    assert!(jpeg.start_offset > pdf.start_offset);

    for r in carver.results() {
        assert!(r.extracted, "{} should extract", r.filename);
        let written = std::fs::read(dir.path().join("out").join(&r.filename)).unwrap();
        assert_eq!(written, &data[r.start_offset as usize..r.end_offset as usize]);
    }
}

// ═══════════════════════════════════════════════════════════════════
// Chunk boundary: header straddling the first window's end
// ═══════════════════════════════════════════════════════════════════

#[test]
fn header_straddling_chunk_boundary_is_found_once() {
    let dir = tempdir().unwrap();
    let mut data = vec![0u8; 128 * 1024];
    // PNG header placed so it crosses the default 64 KiB window end.
    let at = 65536 - 3;
    data[at..at + 8].copy_from_slice(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]);
    data[66000..66008].copy_from_slice(&[0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82]);
    let path = write_img(dir.path(), "boundary.img", &data);

    let mut carver = FileCarver::new(catalogue_config(dir.path())).unwrap();
    carver.carve(&path).unwrap();

    assert_eq!(carver.results().len(), 1);
    let r = &carver.results()[0];
    assert_eq!(r.type_name, "PNG");
    assert_eq!(r.start_offset, at as u64);
    assert_eq!(r.end_offset, 66008);
    assert!(r.has_valid_footer);
}

#[test]
fn headers_around_window_seams_are_each_reported_once() {
    let dir = tempdir().unwrap();
    // chunk 1024 / overlap 128: first window defers positions >= 896.
    let offsets = [893u64, 896, 1022, 1200, 2047];
    let mut data = vec![0u8; 3 * 1024];
    for &off in &offsets {
        data[off as usize..off as usize + 3].copy_from_slice(&[0xFF, 0xD8, 0xFF]);
    }
    let path = write_img(dir.path(), "seams.img", &data);

    let mut config = catalogue_config(dir.path());
    config.chunk_size = 1024;
    config.overlap_size = 128;
    config.search_window = 64;
    let mut carver = FileCarver::new(config).unwrap();
    carver.carve(&path).unwrap();

    let found: Vec<u64> = carver.results().iter().map(|r| r.start_offset).collect();
    assert_eq!(found, offsets, "each header exactly once, in order");
}

// ═══════════════════════════════════════════════════════════════════
// Chunking invisibility: window size must not change the result set
// ═══════════════════════════════════════════════════════════════════

#[test]
fn chunked_and_single_window_runs_agree() {
    let dir = tempdir().unwrap();
    let mut data = noise(16 * 1024, 0xC0FFEE);
    // Plant recognizable files, one inside the first seam's overlap.
    data[777..780].copy_from_slice(&[0xFF, 0xD8, 0xFF]);
    data[1277..1279].copy_from_slice(&[0xFF, 0xD9]);
    data[1000..1008].copy_from_slice(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]);
    data[5000..5016].copy_from_slice(b"SQLite format 3\x00");
    let path = write_img(dir.path(), "invisible.img", &data);

    let run = |chunk_size: usize, overlap_size: usize| {
        let mut config = catalogue_config(dir.path());
        config.chunk_size = chunk_size;
        config.overlap_size = overlap_size;
        config.search_window = 2048;
        let mut carver = FileCarver::new(config).unwrap();
        carver.carve(&path).unwrap();
        let records: Vec<(u64, String, u64, bool)> = carver
            .results()
            .iter()
            .map(|r| {
                (
                    r.start_offset,
                    r.type_name.clone(),
                    r.end_offset,
                    r.has_valid_footer,
                )
            })
            .collect();
        (records, carver.stats())
    };

    let (chunked, chunked_stats) = run(1024, 64);
    let (single, single_stats) = run(32 * 1024, 4096);

    assert_eq!(chunked, single);
    assert_eq!(chunked_stats.files_found, single_stats.files_found);
    assert_eq!(chunked_stats.bytes_processed, 16 * 1024);
    assert_eq!(single_stats.bytes_processed, 16 * 1024);

    // The planted files are among the results.
    assert!(chunked.iter().any(|(s, t, ..)| *s == 777 && t == "JPEG"));
    assert!(chunked.iter().any(|(s, t, ..)| *s == 1000 && t == "PNG"));
    assert!(chunked.iter().any(|(s, t, ..)| *s == 5000 && t == "SQLITE"));
}

// ═══════════════════════════════════════════════════════════════════
// Result invariants over noisy input
// ═══════════════════════════════════════════════════════════════════

#[test]
fn emitted_records_satisfy_bounds_order_and_witnesses() {
    let dir = tempdir().unwrap();
    let mut data = noise(8 * 1024, 42);
    data[100..103].copy_from_slice(&[0xFF, 0xD8, 0xFF]);
    data[600..602].copy_from_slice(&[0xFF, 0xD9]);
    data[3000..3005].copy_from_slice(b"%PDF-");
    let path = write_img(dir.path(), "witness.img", &data);

    let mut config = catalogue_config(dir.path());
    config.min_file_size = 16;
    config.search_window = 1024;
    let mut carver = FileCarver::new(config).unwrap();
    carver.carve(&path).unwrap();

    let registry = SignatureRegistry::builtin();
    let input_size = data.len() as u64;
    let mut prev_start = 0u64;

    assert!(!carver.results().is_empty());
    for r in carver.results() {
        // Bounds validity.
        assert!(r.start_offset < r.end_offset);
        assert!(r.end_offset <= input_size);
        assert_eq!(r.file_size, r.end_offset - r.start_offset);
        assert!(r.file_size >= 16);

        // Discovery order is nondecreasing in start offset.
        assert!(r.start_offset >= prev_start);
        prev_start = r.start_offset;

        // Header witness.
        let sig = registry.get(&r.type_name).unwrap();
        let s = r.start_offset as usize;
        assert_eq!(&data[s..s + sig.header.len()], &sig.header[..]);

        // Footer witness.
        if r.has_valid_footer {
            let e = r.end_offset as usize;
            assert_eq!(&data[e - sig.footer.len()..e], &sig.footer[..]);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
// Size filter
// ═══════════════════════════════════════════════════════════════════

#[test]
fn size_bounds_keep_only_the_mid_sized_jpeg() {
    let dir = tempdir().unwrap();
    let mut data = Vec::new();
    for size in [100usize, 1000, 10_000] {
        data.extend(jpeg_of_size(size));
    }
    let path = write_img(dir.path(), "sizes.img", &data);

    let mut config = catalogue_config(dir.path());
    config.min_file_size = 512;
    config.max_file_size = 5000;
    config.search_window = 65536;
    let mut carver = FileCarver::new(config).unwrap();
    carver.carve(&path).unwrap();

    assert_eq!(carver.results().len(), 1);
    let r = &carver.results()[0];
    assert_eq!(r.file_size, 1000);
    assert_eq!(r.start_offset, 100);
    assert!(r.has_valid_footer);
}

// ═══════════════════════════════════════════════════════════════════
// Type filter
// ═══════════════════════════════════════════════════════════════════

#[test]
fn type_filter_is_the_subset_of_an_unfiltered_run() {
    let dir = tempdir().unwrap();
    let mut data = jpeg_of_size(64);
    data.extend_from_slice(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]);
    data.extend_from_slice(&[0u8; 40]);
    data.extend_from_slice(&[0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82]);
    let path = write_img(dir.path(), "mixed.img", &data);

    let mut unfiltered = FileCarver::new(catalogue_config(dir.path())).unwrap();
    unfiltered.carve(&path).unwrap();
    assert_eq!(unfiltered.results().len(), 2);

    let mut config = catalogue_config(dir.path());
    config.file_types = vec!["PNG".to_string()];
    let mut filtered = FileCarver::new(config).unwrap();
    filtered.carve(&path).unwrap();

    assert_eq!(filtered.results().len(), 1);
    assert_eq!(filtered.stats().files_found, 1);

    let expected: Vec<_> = unfiltered
        .results()
        .iter()
        .filter(|r| r.type_name == "PNG")
        .map(|r| (r.start_offset, r.end_offset))
        .collect();
    let got: Vec<_> = filtered
        .results()
        .iter()
        .map(|r| (r.start_offset, r.end_offset))
        .collect();
    assert_eq!(got, expected);
}

// ═══════════════════════════════════════════════════════════════════
// Catalogue-only runs write nothing
// ═══════════════════════════════════════════════════════════════════

#[test]
fn catalogue_only_run_touches_no_output() {
    let dir = tempdir().unwrap();
    let path = write_img(dir.path(), "cat.img", &jpeg_of_size(64));

    let mut carver = FileCarver::new(catalogue_config(dir.path())).unwrap();
    carver.carve(&path).unwrap();

    assert_eq!(carver.results().len(), 1);
    assert!(!carver.results()[0].extracted);
    assert_eq!(carver.stats().files_extracted, 0);
    assert!(!dir.path().join("out").exists());
}

// ═══════════════════════════════════════════════════════════════════
// Reports over a real run
// ═══════════════════════════════════════════════════════════════════

#[test]
fn reports_reflect_a_completed_run() {
    let dir = tempdir().unwrap();
    let path = write_img(dir.path(), "rep.img", &jpeg_of_size(128));

    let mut carver = FileCarver::new(catalogue_config(dir.path())).unwrap();
    carver.carve(&path).unwrap();

    let csv_path = dir.path().join("report.csv");
    let json_path = dir.path().join("report.json");
    report::write_csv_report(&csv_path, carver.results()).unwrap();
    report::write_json_report(&json_path, carver.results(), &carver.stats()).unwrap();

    let csv = std::fs::read_to_string(&csv_path).unwrap();
    assert!(csv.lines().count() == 2);
    assert!(csv.contains("JPEG_000000.jpg,JPEG,0,128,128,true,false"));

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(json["stats"]["files_found"], 1);
    assert_eq!(json["files"][0]["type"], "JPEG");
}
