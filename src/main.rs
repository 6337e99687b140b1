//! Relic - signature-based file carver for raw disk images.
//!
//! Scans a raw byte stream for known file-format headers, recovers the
//! files they begin, and writes catalogue reports. The engine lives in
//! the library; this binary adds logging, a progress bar, and the
//! terminal summary.

use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use relic::carve::CarveOutcome;
use relic::cli::Cli;
use relic::{report, FileCarver, SignatureRegistry};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "relic=debug" } else { "relic=warn" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).compact())
        .with(EnvFilter::from_default_env().add_directive(default_level.parse()?))
        .init();

    let config = cli.to_config()?;
    let input = config.input_file.clone();

    let mut registry = SignatureRegistry::builtin();
    if let Some(path) = &cli.signatures {
        registry.extend_from_file(path)?;
    }

    let mut carver = FileCarver::with_registry(config, registry)?;

    let progress = if cli.quiet || cli.verbose {
        None
    } else {
        let pb = ProgressBar::new(100);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}%")?,
        );
        let bar = pb.clone();
        carver.set_progress_callback(move |pct| bar.set_position(pct as u64));
        Some(pb)
    };

    println!("Scanning {} ...", input.display());
    let start = Instant::now();
    let outcome = carver.carve(&input)?;
    let elapsed = start.elapsed().as_secs_f64();

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }
    if outcome == CarveOutcome::Cancelled {
        println!("{}", "Carve cancelled.".yellow());
    }

    let stats = carver.stats();

    println!();
    println!("{}", "=".repeat(60));
    println!("{}", "FINAL STATISTICS".bold());
    println!("{}", "=".repeat(60));
    println!("Files found:     {}", stats.files_found);
    println!("Files extracted: {}", stats.files_extracted);
    println!(
        "Data processed:  {}",
        format_size(stats.bytes_processed, BINARY)
    );
    println!("Elapsed:         {elapsed:.2}s");
    if elapsed > 0.0 {
        let speed = (stats.bytes_processed as f64 / elapsed) as u64;
        println!("Throughput:      {}/s", format_size(speed, BINARY));
    }
    if stats.files_found > 0 {
        let rate = stats.files_extracted as f64 / stats.files_found as f64 * 100.0;
        println!("Success rate:    {rate:.1}%");
    }
    println!();
    print!("{}", report::format_summary(carver.results()));

    if let Some(path) = &cli.report {
        report::write_text_report(path, carver.results(), &stats)?;
        println!("Report written to {}", path.display());
    }
    if let Some(path) = &cli.csv {
        report::write_csv_report(path, carver.results())?;
        println!("CSV report written to {}", path.display());
    }
    if let Some(path) = &cli.json {
        report::write_json_report(path, carver.results(), &stats)?;
        println!("JSON report written to {}", path.display());
    }

    Ok(())
}
