//! # pimsim command line drivers
//!
//! Shared setup for the `plan` and `hash_probe` binaries.
//!
//! ```sh
//! # plan a BLIMP layout with hitmaps, fill a bank and dump it
//! cargo run --release --bin=plan -- --config config/system.json \
//!     --layout blimp-hitmap --generate --dump bank.txt
//!
//! # build a hash table of 10000 keys and probe it
//! cargo run --release --bin=hash_probe -- --keys 10000 --initial-buckets 256
//! ```
//!
//! Both binaries log through `env_logger` (default level `info`, override with
//! `RUST_LOG`) and can write a JSON run report with `--report`.

use anyhow::Context;
use indicatif::{MultiProgress, ProgressStyle};
use indicatif_log_bridge::LogWrapper;
use log::info;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Initializes `env_logger` behind a progress bar aware log bridge.
pub fn init_logging_with_progress() -> anyhow::Result<MultiProgress> {
    let logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).build();
    let progress = MultiProgress::new();
    LogWrapper::new(progress.clone(), logger).try_init()?;
    Ok(progress)
}

/// Progress bar style with a fixed-width label.
pub fn named_bar(name: &str) -> ProgressStyle {
    let template = format!(
        "{:<31} {{wide_bar:40.cyan/blue}} {{pos:>7}}/{{len:<7}} [{{elapsed_precise}} ({{eta}} remaining)] {{msg}}",
        name
    );
    ProgressStyle::default_bar()
        .template(&template)
        .unwrap_or(ProgressStyle::default_bar())
}

/// Result of one binary run, written as JSON.
#[derive(Serialize)]
pub struct RunReport<A, R> {
    /// RFC 3339 timestamp of the run
    date: String,
    /// Command line arguments
    args: A,
    /// Run results
    results: R,
}

impl<A: Serialize, R: Serialize> RunReport<A, R> {
    /// Stamps `args` and `results` with the current local time.
    pub fn new(args: A, results: R) -> Self {
        Self {
            date: chrono::Local::now().to_rfc3339(),
            args,
            results,
        }
    }

    /// Writes the report as pretty-printed JSON.
    pub fn save(&self, filepath: impl AsRef<Path>) -> anyhow::Result<()> {
        let filepath = filepath.as_ref();
        let file = File::create(filepath)
            .with_context(|| format!("creating report {}", filepath.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        info!("Report saved to {}", filepath.display());
        Ok(())
    }
}
