//! Cesantía leg calculator
//!
//! Flat-rate model: both premiums are principal x monthly rate x remaining
//! installments, with no amortization and no age dependency. The bank rate
//! comes from the institution's tranche table; the preferential rate from the
//! fixed program table, which is complete for every tranche.

use serde::Serialize;

use crate::tables::{RateTables, Tranche};

use super::error::{ensure_finite, CalcError};

/// Cesantía coverage breakdown, monetary fields in integer CLP
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CesantiaLeg {
    /// Amount tranche used for both lookups
    pub tranche: Tranche,

    /// Bank monthly rate
    pub bank_rate: f64,

    /// Preferential monthly rate
    pub preferential_rate: f64,

    pub premium_bank: i64,
    pub premium_preferential: i64,

    /// Recoverable amount before the service margin, floored at zero
    pub differential: i64,
}

/// Compute the cesantía leg for a credit.
///
/// `institution` must already be a canonical table key.
pub fn compute_cesantia(
    tables: &RateTables,
    institution: &str,
    amount: f64,
    remaining_installments: u32,
) -> Result<CesantiaLeg, CalcError> {
    let tranche = Tranche::from_amount(amount);

    let bank_rate = tables
        .cesantia
        .monthly_rate(institution, tranche)
        .ok_or_else(|| CalcError::CesantiaLookupMiss {
            institution: institution.to_string(),
        })?;
    let preferential_rate = tables.cesantia_preferential.monthly_rate(tranche);

    let months = remaining_installments as f64;
    let premium_bank = ensure_finite(amount * bank_rate * months, "bank cesantía premium")?;
    let premium_preferential = ensure_finite(
        amount * preferential_rate * months,
        "preferential cesantía premium",
    )?;

    let differential = (premium_bank - premium_preferential).max(0.0);

    Ok(CesantiaLeg {
        tranche,
        bank_rate,
        preferential_rate,
        premium_bank: premium_bank.round() as i64,
        premium_preferential: premium_preferential.round() as i64,
        differential: differential.round() as i64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_value_breakdown() {
        let tables = RateTables::default_market();
        let leg = compute_cesantia(&tables, "BANCO CHILE", 4_500_000.0, 30).unwrap();

        assert_eq!(leg.tranche, Tranche::Tramo3);
        assert_eq!(leg.bank_rate, 0.00092);
        assert_eq!(leg.preferential_rate, 0.00041);

        // 4.5M * 0.00092 * 30 = 124200; 4.5M * 0.00041 * 30 = 55350
        assert_eq!(leg.premium_bank, 124_200);
        assert_eq!(leg.premium_preferential, 55_350);
        assert_eq!(leg.differential, 68_850);
    }

    #[test]
    fn test_unknown_institution_is_lookup_miss() {
        let tables = RateTables::default_market();
        let err = compute_cesantia(&tables, "BANCO INEXISTENTE", 4_500_000.0, 30).unwrap_err();
        assert_eq!(
            err,
            CalcError::CesantiaLookupMiss {
                institution: "BANCO INEXISTENTE".to_string(),
            }
        );
    }

    #[test]
    fn test_small_amounts_use_lowest_tranche() {
        let tables = RateTables::default_market();
        let leg = compute_cesantia(&tables, "BANCO CHILE", 200_000.0, 12).unwrap();
        assert_eq!(leg.tranche, Tranche::Tramo1);
        assert_eq!(leg.bank_rate, 0.00120);
    }

    #[test]
    fn test_differential_floors_at_zero() {
        use crate::tables::{
            DesgravamenTable, PreferentialDesgravamenRates, PreferentialUnemploymentTable,
            UnemploymentTable,
        };

        let mut cesantia = UnemploymentTable::new();
        // bank rate below preferential
        cesantia.insert_institution("BANCO TEST", [0.0001; 5]);

        let tables = RateTables {
            desgravamen: DesgravamenTable::new(),
            desgravamen_preferential: PreferentialDesgravamenRates::default_market(),
            cesantia,
            cesantia_preferential: PreferentialUnemploymentTable::default_market(),
        };

        let leg = compute_cesantia(&tables, "BANCO TEST", 4_500_000.0, 30).unwrap();
        assert!(leg.premium_bank < leg.premium_preferential);
        assert_eq!(leg.differential, 0);
    }
}
