//! Snapshot breakdown reconstruction
//!
//! Persisted refund records are a lossy projection of the original
//! simulation: only the desgravamen monthly premiums, the amounts, and the
//! final saving figure survive. For "ambos" records the breakdown view needs
//! both legs again, so the cesantía leg is recomputed from the rate tables
//! and the margin percentage that was in effect at save time is inferred from
//! the stored saving.
//!
//! This is a best-effort display reconstruction, not a binding calculation:
//! missing cesantía table data degrades to zero rates instead of aborting.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::tables::{canonical_key, RateTables, Tranche};

use super::cesantia::CesantiaLeg;
use super::margin::{apply_margin, DEFAULT_MARGIN_PCT};
use super::orchestrator::CoverageMode;

/// Persisted calculation snapshot, as returned by the refunds backend.
///
/// Read-only input; field names follow the persisted wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Credit amount (CLP)
    #[serde(rename = "montoCredito")]
    pub amount: Option<f64>,

    /// Installments still pending at simulation time
    #[serde(rename = "cuotasPendientes")]
    pub remaining_installments: Option<u32>,

    /// Bank desgravamen monthly premium stored at simulation time
    #[serde(rename = "valorCuotaActual")]
    pub current_monthly_premium: Option<f64>,

    /// Preferential desgravamen monthly premium stored at simulation time
    #[serde(rename = "valorCuotaNueva")]
    pub new_monthly_premium: Option<f64>,

    /// Final client-facing saving stored at simulation time (after margin)
    #[serde(rename = "ahorroTotal")]
    pub stored_saving: Option<f64>,

    /// Bank name as persisted (free text)
    #[serde(rename = "banco")]
    pub institution: String,

    /// Coverage the record was simulated for
    #[serde(rename = "tipoSeguro")]
    pub coverage: CoverageMode,

    /// Simulation date
    #[serde(rename = "fechaCreacion", default)]
    pub created_at: Option<NaiveDate>,
}

/// Reconstructed per-coverage breakdown of a persisted snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownResult {
    /// Desgravamen differential recovered from the stored premiums (CLP)
    pub desgravamen_differential: i64,

    /// Cesantía leg recomputed from the rate tables
    pub cesantia: CesantiaLeg,

    /// Combined differential before the margin (CLP)
    pub total_differential: i64,

    /// Margin percentage inferred from the stored saving (or the default)
    pub margin_pct: f64,

    /// Combined differential after the margin (CLP)
    pub total_with_margin: i64,
}

/// Reconstruct the coverage breakdown of a persisted snapshot.
///
/// Returns `None` when the breakdown view does not apply: the record was not
/// simulated for both coverages, or the snapshot is missing the amount or the
/// remaining installment count. `None` is a normal outcome, not an error.
pub fn reconstruct(tables: &RateTables, snapshot: &Snapshot) -> Option<BreakdownResult> {
    if snapshot.coverage != CoverageMode::Ambos {
        return None;
    }
    let amount = snapshot.amount?;
    let remaining = snapshot.remaining_installments?;

    // The desgravamen leg is not recomputed from rates: the stored monthly
    // premiums already reflect the simulation-time tables.
    let current = snapshot.current_monthly_premium.unwrap_or(0.0);
    let new = snapshot.new_monthly_premium.unwrap_or(0.0);
    let desgravamen_differential = (((current - new) * remaining as f64).max(0.0)).round() as i64;

    let cesantia = recompute_cesantia(tables, &snapshot.institution, amount, remaining);

    let total_differential = desgravamen_differential + cesantia.differential;

    let margin_pct = infer_margin(snapshot.stored_saving, total_differential);
    let total_with_margin = apply_margin(total_differential as f64, margin_pct);

    Some(BreakdownResult {
        desgravamen_differential,
        cesantia,
        total_differential,
        margin_pct,
        total_with_margin,
    })
}

/// Cesantía leg for the breakdown view. Same tranche/rate logic as the
/// calculator, but tolerant: an untabulated institution degrades to zero
/// rates instead of aborting; rates are never fabricated.
fn recompute_cesantia(
    tables: &RateTables,
    institution: &str,
    amount: f64,
    remaining_installments: u32,
) -> CesantiaLeg {
    let key = canonical_key(institution);
    let tranche = Tranche::from_amount(amount);

    let (bank_rate, preferential_rate) = match tables.cesantia.monthly_rate(&key, tranche) {
        Some(rate) => (rate, tables.cesantia_preferential.monthly_rate(tranche)),
        None => (0.0, 0.0),
    };

    let months = remaining_installments as f64;
    let premium_bank = amount * bank_rate * months;
    let premium_preferential = amount * preferential_rate * months;
    let differential = (premium_bank - premium_preferential).max(0.0);

    CesantiaLeg {
        tranche,
        bank_rate,
        preferential_rate,
        premium_bank: premium_bank.round() as i64,
        premium_preferential: premium_preferential.round() as i64,
        differential: differential.round() as i64,
    }
}

/// Infer the margin percentage that reconciles the stored saving with the
/// reconstructed total. The stored saving is rounded data, so this is a
/// heuristic inverse: a negative inference means the saving exceeded the
/// differential (stale snapshot data) and is flagged, then floored at zero.
fn infer_margin(stored_saving: Option<f64>, total_differential: i64) -> f64 {
    match stored_saving {
        Some(saving) if total_differential > 0 => {
            let inferred = ((1.0 - saving / total_differential as f64) * 100.0).round();
            if inferred < 0.0 {
                log::warn!(
                    "inferred margin {}% is negative (stored saving {} exceeds \
                     reconstructed differential {}), flooring at 0",
                    inferred,
                    saving,
                    total_differential
                );
            }
            inferred.max(0.0)
        }
        _ => DEFAULT_MARGIN_PCT,
    }
}
