use anyhow::{Result, bail};
use clap::{Parser, ValueEnum};
use indicatif::ProgressBar;
use log::{info, warn};
use pimsim_bin::{RunReport, init_logging_with_progress, named_bar};
use pimsim_core::config::HardwareProfile;
use pimsim_core::layout::RowRange;
use pimsim_core::memory::{Bank, DEFAULT_BYTE};
use pimsim_core::util::Size;
use pimsim_hashmap::{BucketFormat, ChainedHashTable};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

#[derive(Debug, Clone, Copy, ValueEnum, Serialize)]
enum Format {
    /// 31 32-bit keys per bucket
    Blimp,
    /// 15 32-bit key/value pairs per bucket
    BlimpKv,
}

impl Format {
    fn bucket_format(self) -> BucketFormat {
        match self {
            Format::Blimp => BucketFormat::BLIMP,
            Format::BlimpKv => BucketFormat::BLIMP_KV,
        }
    }
}

/// CLI arguments for the `hash_probe` binary.
///
/// Builds a chained hash table from random keys, probes it with hits and
/// misses and reports the average probe cost.
#[derive(Debug, Parser, Serialize, Clone)]
struct CliArgs {
    /// Bucket format.
    #[clap(long = "format", value_enum, default_value = "blimp-kv")]
    format: Format,
    /// Number of keys to insert.
    #[clap(long = "keys", default_value = "10000")]
    keys: usize,
    /// Number of home buckets (power of two).
    #[clap(long = "initial-buckets", default_value = "256")]
    initial_buckets: usize,
    /// Maximum number of buckets. Defaults to what `--rows` rows hold.
    #[clap(long = "maximum-buckets")]
    maximum_buckets: Option<usize>,
    /// Rows available to the table.
    #[clap(long = "rows", default_value = "512")]
    rows: usize,
    /// Row buffer size in bytes.
    #[clap(long = "row-buffer", default_value = "1024")]
    row_buffer_bytes: usize,
    /// Number of lookups, half of them for absent keys.
    #[clap(long = "probes", default_value = "10000")]
    probes: usize,
    /// Random seed.
    #[clap(long = "seed", default_value = "0")]
    seed: u64,
    /// Save the hash table to this file.
    #[clap(long = "output")]
    output: Option<String>,
    /// Place the table into a bank of `--rows` rows and save a dump to this file.
    #[clap(long = "dump")]
    dump: Option<String>,
    /// Save a JSON run report to this file.
    #[clap(long = "report")]
    report: Option<String>,
}

#[derive(Debug, Default, Serialize)]
struct ProbeResult {
    inserted: usize,
    buckets: usize,
    size_bytes: usize,
    hits: usize,
    misses: usize,
    average_buckets_per_probe: f64,
    average_scans_per_probe: f64,
}

fn main() -> Result<()> {
    let progress = init_logging_with_progress()?;
    let args = CliArgs::parse();
    info!("CLI args: {:?}", args);

    let format = args.format.bucket_format();
    let mut table = match args.maximum_buckets {
        Some(maximum) => ChainedHashTable::new(format, args.initial_buckets, maximum)?,
        None => ChainedHashTable::for_rows(format, args.initial_buckets, args.rows, args.row_buffer_bytes)?,
    };
    info!(
        "table: {} home buckets, at most {} buckets ({} B)",
        table.initial_buckets(),
        table.maximum_buckets(),
        table.maximum_size_bytes()
    );

    let key_limit = 1u64 << (format.key_bytes.min(7) * 8);
    let value_limit = 1u64 << (format.value_bytes.min(7) * 8);
    let mut rng = StdRng::seed_from_u64(args.seed);
    let mut keys = Vec::with_capacity(args.keys);
    let mut result = ProbeResult::default();

    let p = progress.add(ProgressBar::new(args.keys as u64));
    p.set_style(named_bar("Inserting keys"));
    for _ in 0..args.keys {
        let key = rng.random_range(0..key_limit / 2) * 2;
        let value = rng.random_range(0..value_limit);
        if let Err(e) = table.insert(key, value) {
            warn!("insert stopped after {} keys: {}", keys.len(), e);
            break;
        }
        keys.push(key);
        p.inc(1);
    }
    p.finish_and_clear();
    result.inserted = table.len();
    result.buckets = table.buckets().len();
    result.size_bytes = table.size_bytes();
    info!(
        "{} distinct keys in {} buckets ({} B)",
        result.inserted, result.buckets, result.size_bytes
    );
    if keys.is_empty() {
        bail!("no key was inserted");
    }

    let p = progress.add(ProgressBar::new(args.probes as u64));
    p.set_style(named_bar("Probing"));
    let (mut buckets, mut scans) = (0usize, 0usize);
    for i in 0..args.probes {
        // odd keys are never inserted
        let key = if i % 2 == 0 {
            keys[rng.random_range(0..keys.len())]
        } else {
            rng.random_range(0..key_limit / 2) * 2 + 1
        };
        let trace = table.traced_fetch(key);
        buckets += trace.buckets.len();
        scans += trace.total_scans();
        match trace.value {
            Some(_) => result.hits += 1,
            None => result.misses += 1,
        }
        p.inc(1);
    }
    p.finish_and_clear();
    if args.probes > 0 {
        result.average_buckets_per_probe = buckets as f64 / args.probes as f64;
        result.average_scans_per_probe = scans as f64 / args.probes as f64;
    }
    info!(
        "{} hits, {} misses, {:.2} buckets and {:.2} slots per probe",
        result.hits, result.misses, result.average_buckets_per_probe, result.average_scans_per_probe
    );

    if let Some(output) = &args.output {
        table.save(output)?;
    }
    if let Some(dump) = &args.dump {
        let hardware = HardwareProfile::new(
            Size::B(args.rows * args.row_buffer_bytes),
            Size::B(args.row_buffer_bytes),
            0.0,
            0.0,
            0.0,
        )?;
        let mut bank = Bank::new(hardware, DEFAULT_BYTE)?;
        table.place(&mut bank, RowRange::new(0, args.rows))?;
        bank.save(dump)?;
    }
    if let Some(report) = &args.report {
        RunReport::new(&args, &result).save(report)?;
    }
    Ok(())
}
