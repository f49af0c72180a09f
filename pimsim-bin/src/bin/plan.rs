use anyhow::{Context, Result, bail};
use clap::Parser;
use indicatif::ProgressBar;
use log::{info, warn};
use pimsim_bin::{RunReport, init_logging_with_progress};
use pimsim_core::config::SystemConfig;
use pimsim_core::layout::{LayoutKind, LayoutMetadata, LayoutPlanner, RowMapping};
use pimsim_core::memory::{Bank, DEFAULT_BYTE};
use pimsim_core::records::{FieldGenerator, RecordGenerator};
use pimsim_core::util::Rng;
use serde::Serialize;
use std::time::Duration;

/// CLI arguments for the `plan` binary.
///
/// Plans a bank layout for a system configuration and optionally fills a
/// simulated bank with generated records.
#[derive(Debug, Parser, Serialize, Clone)]
struct CliArgs {
    /// The system configuration file (hardware and database profiles).
    #[clap(long = "config", default_value = "config/system.json")]
    config: String,
    /// The layout kind, e.g. `cpu-aligned`, `blimp-hitmap` or `blimp-ambit-pi-field`.
    #[clap(long = "layout", default_value = "cpu-aligned")]
    layout: String,
    /// Cap the number of records the layout is planned for.
    #[clap(long = "records")]
    records: Option<usize>,
    /// Plan every layout kind the hardware supports and log a summary.
    #[clap(long = "all")]
    all: bool,
    /// Save the planned layout configuration to this file.
    #[clap(long = "output")]
    output: Option<String>,
    /// Generate records and place them into a simulated bank.
    #[clap(long = "generate")]
    generate: bool,
    /// Seed for the random data fields of generated records.
    #[clap(long = "seed", default_value = "0")]
    seed: u64,
    /// Byte value of rows never written.
    #[clap(long = "default-byte", default_value_t = DEFAULT_BYTE)]
    default_byte: u8,
    /// Save a dump of the filled bank to this file. Implies `--generate`.
    #[clap(long = "dump")]
    dump: Option<String>,
    /// Save a JSON run report to this file.
    #[clap(long = "report")]
    report: Option<String>,
}

#[derive(Debug, Serialize)]
struct PlanResult {
    layout: String,
    row_mapping: Option<RowMapping>,
    metadata: Option<LayoutMetadata>,
    placed_items: Option<usize>,
    error: Option<String>,
}

fn plan_all(config: &SystemConfig, args: &CliArgs) -> Vec<PlanResult> {
    let planner = LayoutPlanner::new(&config.hardware, &config.database).with_record_hint(args.records);
    LayoutKind::all()
        .into_iter()
        .filter(|kind| kind.check_capabilities(&config.hardware).is_ok())
        .map(|kind| match planner.plan(kind) {
            Ok(layout) => {
                info!("{:<28} {}", kind.name(), layout.metadata());
                PlanResult {
                    layout: kind.name(),
                    row_mapping: Some(layout.mapping().clone()),
                    metadata: Some(layout.metadata().clone()),
                    placed_items: None,
                    error: None,
                }
            }
            Err(e) => {
                warn!("{:<28} {}", kind.name(), e);
                PlanResult {
                    layout: kind.name(),
                    row_mapping: None,
                    metadata: None,
                    placed_items: None,
                    error: Some(e.to_string()),
                }
            }
        })
        .collect()
}

fn main() -> Result<()> {
    let progress = init_logging_with_progress()?;
    let args = CliArgs::parse();
    info!("CLI args: {:?}", args);

    let config = SystemConfig::from_jsonfile(&args.config)
        .with_context(|| format!("loading {}", args.config))?;
    info!(
        "bank: {} rows of {} B, record {} B, index {} B",
        config.hardware.bank_rows(),
        config.hardware.row_buffer_size_bytes,
        config.database.total_record_size_bytes,
        config.database.total_index_size_bytes
    );

    if args.all {
        let results = plan_all(&config, &args);
        let failed = results.iter().filter(|r| r.error.is_some()).count();
        info!("planned {} layouts, {} failed", results.len(), failed);
        if let Some(report) = &args.report {
            RunReport::new(&args, &results).save(report)?;
        }
        return Ok(());
    }

    let kind: LayoutKind = args.layout.parse()?;
    let layout = LayoutPlanner::new(&config.hardware, &config.database)
        .with_record_hint(args.records)
        .plan(kind)?;
    for (region, range) in layout.mapping().iter() {
        info!("  {:<20} {}", region.name(), range);
    }
    if let Some(output) = &args.output {
        layout.save(output)?;
    }

    let mut placed_items = None;
    if args.generate || args.dump.is_some() {
        let total = layout.metadata().total_records_processable;
        if total == 0 {
            bail!("layout {} holds no records", kind);
        }
        let mut source = RecordGenerator::for_database(
            &config.database,
            FieldGenerator::Incremental,
            FieldGenerator::UniformRandom(Rng::from_seed(args.seed)),
        )
        .with_total(total);
        let mut bank = Bank::new(config.hardware.clone(), args.default_byte)?;

        let spinner = progress.add(ProgressBar::new_spinner());
        spinner.set_message(format!("placing {} records", total));
        spinner.enable_steady_tick(Duration::from_millis(100));
        let placed = layout.perform(&mut bank, &mut source)?;
        spinner.finish_and_clear();
        info!("placed {} items in {} rows", placed.items, placed.rows);
        placed_items = Some(placed.items);

        if let Some(dump) = &args.dump {
            bank.save(dump)?;
        }
    }

    if let Some(report) = &args.report {
        let result = PlanResult {
            layout: kind.name(),
            row_mapping: Some(layout.mapping().clone()),
            metadata: Some(layout.metadata().clone()),
            placed_items,
            error: None,
        };
        RunReport::new(&args, &result).save(report)?;
    }
    Ok(())
}
