//! Refund Engine CLI
//!
//! Runs a single refund simulation from command-line flags and prints the
//! coverage breakdown.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use refund_engine::engine::{CalculationInput, CoverageMode, EngineConfig, RefundEngine};
use refund_engine::tables::RateTables;

#[derive(Debug, Parser)]
#[command(name = "refund_engine", about = "Simulate an insurance premium refund")]
struct Args {
    /// Bank name (free text, normalized internally)
    #[arg(long, short = 'i')]
    institution: String,

    /// Client age in years
    #[arg(long)]
    age: u8,

    /// Credit amount in CLP
    #[arg(long)]
    amount: f64,

    /// Total installment count
    #[arg(long)]
    installments: u32,

    /// Installments still pending
    #[arg(long)]
    remaining: u32,

    /// Coverage mode: desgravamen, cesantia, or ambos
    #[arg(long, default_value = "ambos")]
    mode: CoverageMode,

    /// Service margin percentage
    #[arg(long, default_value_t = 10.0)]
    margin: f64,

    /// Directory with JSON table documents (built-in market tables when omitted)
    #[arg(long)]
    tables: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let tables = match &args.tables {
        Some(dir) => RateTables::from_json_path(dir)
            .with_context(|| format!("loading rate tables from {}", dir.display()))?,
        None => RateTables::default_market(),
    };

    let engine = RefundEngine::with_config(
        tables,
        EngineConfig {
            margin_pct: args.margin,
        },
    );

    let result = engine.calculate(&CalculationInput {
        institution: args.institution,
        age: args.age,
        amount: args.amount,
        total_installments: args.installments,
        remaining_installments: args.remaining,
        mode: args.mode,
    });

    if let Some(error) = &result.error {
        println!("Calculation failed: {error}");
        return Ok(());
    }

    println!("Institution: {}", result.institution);
    println!("Mode:        {}", result.mode);

    if let Some(leg) = &result.desgravamen {
        println!("\nDesgravamen ({})", leg.segment);
        println!(
            "  bank rate {:.6} at {} installments (amount row {})",
            leg.bank_rate, leg.installments_used, leg.rounded_amount
        );
        println!("  bank premium remaining:         ${}", leg.remaining_premium_bank);
        println!("  preferential premium remaining: ${}", leg.remaining_premium_preferential);
        println!("  differential:                   ${}", leg.differential);
    }

    if let Some(leg) = &result.cesantia {
        println!("\nCesantía ({})", leg.tranche.as_str());
        println!("  bank premium:         ${}", leg.premium_bank);
        println!("  preferential premium: ${}", leg.premium_preferential);
        println!("  differential:         ${}", leg.differential);
    }

    println!("\nTotal differential: ${}", result.total_differential);
    println!("Margin:             {}%", result.margin_pct);
    println!("Client refund:      ${}", result.refund);

    Ok(())
}
