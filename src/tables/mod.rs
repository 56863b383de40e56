//! Rate tables for both coverages, bank and preferential side
//!
//! Tables are immutable once constructed and injected into the engine, so
//! tests can substitute fixture tables without touching global state. Hosts
//! that hot-reload tables must swap the whole [`RateTables`] value, never
//! mutate in place.

mod cesantia;
mod desgravamen;
mod institutions;
pub mod loader;

pub use cesantia::{PreferentialUnemploymentTable, Tranche, TrancheBand, UnemploymentTable};
pub use desgravamen::{
    AgeBand, BankRateQuote, DesgravamenTable, PreferentialDesgravamenRates, rounded_amount,
    MAX_TABLE_AMOUNT, MIN_TABLE_AMOUNT, PREFERENTIAL_AMOUNT_THRESHOLD,
};
pub use institutions::canonical_key;
pub use loader::TableLoadError;

use std::fs;
use std::path::Path;

/// Container for all rate tables used by a calculation
#[derive(Debug, Clone)]
pub struct RateTables {
    /// Bank desgravamen single-premium rates
    pub desgravamen: DesgravamenTable,

    /// Preferential desgravamen monthly rates (four constants)
    pub desgravamen_preferential: PreferentialDesgravamenRates,

    /// Bank cesantía tranche rates
    pub cesantia: UnemploymentTable,

    /// Preferential cesantía tranche rates (complete for all tranches)
    pub cesantia_preferential: PreferentialUnemploymentTable,
}

impl RateTables {
    /// Built-in market tables covering the institutions the program works with
    pub fn default_market() -> Self {
        Self {
            desgravamen: DesgravamenTable::default_market(),
            desgravamen_preferential: PreferentialDesgravamenRates::default_market(),
            cesantia: UnemploymentTable::default_market(),
            cesantia_preferential: PreferentialUnemploymentTable::default_market(),
        }
    }

    /// Load all four table documents from a directory (see [`loader`] for the
    /// expected file names and shapes)
    pub fn from_json_path(dir: &Path) -> Result<Self, TableLoadError> {
        let desgravamen = loader::parse_desgravamen(&read_doc(dir, "desgravamen.json")?)?;
        let desgravamen_preferential = loader::parse_desgravamen_preferential(&read_doc(
            dir,
            "desgravamen_preferencial.json",
        )?)?;
        let cesantia = loader::parse_cesantia(&read_doc(dir, "cesantia.json")?)?;
        let cesantia_preferential =
            loader::parse_cesantia_preferential(&read_doc(dir, "cesantia_preferencial.json")?)?;

        Ok(Self {
            desgravamen,
            desgravamen_preferential,
            cesantia,
            cesantia_preferential,
        })
    }
}

fn read_doc(dir: &Path, name: &str) -> Result<String, TableLoadError> {
    let path = dir.join(name);
    fs::read_to_string(&path).map_err(|source| TableLoadError::Io { path, source })
}
