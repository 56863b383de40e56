//! Desgravamen leg calculator
//!
//! Bank desgravamen is priced as a single premium for the whole schedule and
//! amortized across installments; the preferential side is a monthly rate on
//! the proportionally outstanding capital. The recoverable differential is
//! the gap between the two premiums over the remaining installments.

use serde::Serialize;

use crate::tables::{AgeBand, RateTables};

use super::error::{ensure_finite, CalcError};

/// Desgravamen coverage breakdown, all monetary fields in integer CLP
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DesgravamenLeg {
    /// Bank single-premium rate actually used
    pub bank_rate: f64,

    /// Preferential monthly rate actually used
    pub preferential_rate: f64,

    /// Installment count the bank rate was tabulated for (may differ from
    /// the requested total when the table fell back to the nearest count)
    pub installments_used: u32,

    /// Amount row used for the bank lookup (rounded and clamped)
    pub rounded_amount: u64,

    /// Age segment label used for both lookups
    pub segment: &'static str,

    pub single_premium_bank: i64,
    pub total_premium_bank: i64,
    pub monthly_premium_bank: i64,
    pub remaining_premium_bank: i64,

    /// Proportional outstanding balance over the remaining installments
    pub remaining_capital: i64,

    pub total_premium_preferential: i64,
    pub monthly_premium_preferential: i64,
    pub remaining_premium_preferential: i64,

    /// Recoverable amount before the service margin, floored at zero
    pub differential: i64,
}

/// Compute the desgravamen leg for a credit.
///
/// `institution` must already be a canonical table key. Intermediate values
/// stay in `f64` and are rounded only on the reported fields, except the
/// total bank premium and the remaining capital, which the persisted
/// calculations round before carrying forward.
pub fn compute_desgravamen(
    tables: &RateTables,
    institution: &str,
    age: u8,
    amount: f64,
    total_installments: u32,
    remaining_installments: u32,
) -> Result<DesgravamenLeg, CalcError> {
    let quote = tables
        .desgravamen
        .bank_rate(institution, age, amount, total_installments)
        .ok_or_else(|| CalcError::LookupMiss {
            institution: institution.to_string(),
            installments: total_installments,
        })?;

    let preferential_rate = tables.desgravamen_preferential.monthly_rate(amount, age);

    let single_premium_bank = ensure_finite(amount * quote.rate, "bank single premium")?;

    // Re-base a premium tabulated for a possibly substituted installment
    // count onto the actual schedule length.
    let total_premium_bank = ensure_finite(
        (single_premium_bank / quote.installments_used as f64 * total_installments as f64).round(),
        "bank total premium",
    )?;
    let monthly_premium_bank = total_premium_bank / total_installments as f64;
    let remaining_premium_bank = monthly_premium_bank * remaining_installments as f64;

    let remaining_capital =
        (amount * remaining_installments as f64 / total_installments as f64).round();

    let total_premium_preferential = ensure_finite(
        remaining_capital * preferential_rate * remaining_installments as f64,
        "preferential total premium",
    )?;
    let monthly_premium_preferential = total_premium_preferential / remaining_installments as f64;
    let remaining_premium_preferential =
        monthly_premium_preferential * remaining_installments as f64;

    let differential = (remaining_premium_bank - remaining_premium_preferential).max(0.0);

    Ok(DesgravamenLeg {
        bank_rate: quote.rate,
        preferential_rate,
        installments_used: quote.installments_used,
        rounded_amount: quote.rounded_amount,
        segment: AgeBand::from_age(age).as_str(),
        single_premium_bank: single_premium_bank.round() as i64,
        total_premium_bank: total_premium_bank as i64,
        monthly_premium_bank: monthly_premium_bank.round() as i64,
        remaining_premium_bank: remaining_premium_bank.round() as i64,
        remaining_capital: remaining_capital as i64,
        total_premium_preferential: total_premium_preferential.round() as i64,
        monthly_premium_preferential: monthly_premium_preferential.round() as i64,
        remaining_premium_preferential: remaining_premium_preferential.round() as i64,
        differential: differential.round() as i64,
    })
}
