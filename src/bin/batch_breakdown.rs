//! Reconstruct breakdowns for a whole snapshot export
//!
//! Reads a JSON array of persisted calculation snapshots (as exported by the
//! refunds backend), reconstructs every applicable record in parallel, and
//! writes a CSV summary for the reporting pipeline.
//!
//! Usage: batch_breakdown <snapshots.json> [output.csv] [--tables <dir>]

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;

use refund_engine::engine::Snapshot;
use refund_engine::runner::BatchRunner;
use refund_engine::tables::RateTables;

#[derive(Debug, Parser)]
#[command(name = "batch_breakdown")]
struct Args {
    /// JSON array of persisted snapshots
    snapshots: PathBuf,

    /// Output CSV path
    #[arg(default_value = "breakdown_output.csv")]
    output: PathBuf,

    /// Directory with JSON table documents (built-in market tables when omitted)
    #[arg(long)]
    tables: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let start = Instant::now();
    let json = fs::read_to_string(&args.snapshots)
        .with_context(|| format!("reading {}", args.snapshots.display()))?;
    let snapshots: Vec<Snapshot> =
        serde_json::from_str(&json).context("parsing snapshot export")?;
    println!("Loaded {} snapshots in {:?}", snapshots.len(), start.elapsed());

    let tables = match &args.tables {
        Some(dir) => RateTables::from_json_path(dir)
            .with_context(|| format!("loading rate tables from {}", dir.display()))?,
        None => RateTables::default_market(),
    };

    let runner = BatchRunner::new(tables);
    let start = Instant::now();
    let breakdowns = runner.reconstruct_all(&snapshots);
    let applicable = breakdowns.iter().filter(|b| b.is_some()).count();
    println!(
        "Reconstructed {} of {} snapshots in {:?}",
        applicable,
        snapshots.len(),
        start.elapsed()
    );

    let mut writer = csv::Writer::from_path(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    writer.write_record([
        "banco",
        "monto",
        "cuotas_pendientes",
        "desgravamen",
        "cesantia",
        "total",
        "margen_pct",
        "total_con_margen",
    ])?;

    for (snapshot, breakdown) in snapshots.iter().zip(&breakdowns) {
        let Some(b) = breakdown else { continue };
        writer.write_record([
            snapshot.institution.clone(),
            snapshot.amount.map_or_else(String::new, |a| format!("{a:.0}")),
            snapshot
                .remaining_installments
                .map_or_else(String::new, |r| r.to_string()),
            b.desgravamen_differential.to_string(),
            b.cesantia.differential.to_string(),
            b.total_differential.to_string(),
            format!("{:.0}", b.margin_pct),
            b.total_with_margin.to_string(),
        ])?;
    }
    writer.flush()?;

    println!("Wrote {}", args.output.display());
    Ok(())
}
