//! Unemployment-insurance (cesantía) rate tables
//!
//! Cesantía coverage is priced as a flat monthly rate on the loan principal,
//! selected by a five-band amount tranche. Banks each publish their own tranche
//! rates; the refund program substitutes one fixed preferential table that is
//! complete for all five tranches by construction.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Amount tranche used for unemployment-insurance rate selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tranche {
    /// [500000, 1000000]
    Tramo1,
    /// [1000001, 3000000]
    Tramo2,
    /// [3000001, 5000000]
    Tramo3,
    /// [5000001, 7000000]
    Tramo4,
    /// [7000001, Inf)
    Tramo5,
}

impl Tranche {
    /// All tranches in ascending amount order
    pub const ALL: [Tranche; 5] = [
        Tranche::Tramo1,
        Tranche::Tramo2,
        Tranche::Tramo3,
        Tranche::Tramo4,
        Tranche::Tramo5,
    ];

    /// Classify a credit amount into its tranche.
    ///
    /// Amounts below the lowest band still classify into the lowest band;
    /// amounts above the last lower bound classify into the top band. Every
    /// non-negative amount classifies.
    pub fn from_amount(amount: f64) -> Self {
        if amount <= 1_000_000.0 {
            Tranche::Tramo1
        } else if amount <= 3_000_000.0 {
            Tranche::Tramo2
        } else if amount <= 5_000_000.0 {
            Tranche::Tramo3
        } else if amount <= 7_000_000.0 {
            Tranche::Tramo4
        } else {
            Tranche::Tramo5
        }
    }

    /// Table key matching the persisted document format
    pub fn as_str(&self) -> &'static str {
        match self {
            Tranche::Tramo1 => "tramo_1",
            Tranche::Tramo2 => "tramo_2",
            Tranche::Tramo3 => "tramo_3",
            Tranche::Tramo4 => "tramo_4",
            Tranche::Tramo5 => "tramo_5",
        }
    }

    /// Parse a document key back into a tranche
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "tramo_1" => Some(Tranche::Tramo1),
            "tramo_2" => Some(Tranche::Tramo2),
            "tramo_3" => Some(Tranche::Tramo3),
            "tramo_4" => Some(Tranche::Tramo4),
            "tramo_5" => Some(Tranche::Tramo5),
            _ => None,
        }
    }

    /// Inclusive amount bounds of the tranche; the top band is open-ended
    pub fn bounds(&self) -> (u64, Option<u64>) {
        match self {
            Tranche::Tramo1 => (500_000, Some(1_000_000)),
            Tranche::Tramo2 => (1_000_001, Some(3_000_000)),
            Tranche::Tramo3 => (3_000_001, Some(5_000_000)),
            Tranche::Tramo4 => (5_000_001, Some(7_000_000)),
            Tranche::Tramo5 => (7_000_001, None),
        }
    }
}

/// One tranche entry of an unemployment rate document
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrancheBand {
    /// Inclusive lower bound of the band (CLP)
    #[serde(rename = "lowerBound")]
    pub lower_bound: u64,

    /// Inclusive upper bound, `None` for the open-ended top band
    #[serde(rename = "upperBound")]
    pub upper_bound: Option<u64>,

    /// Monthly rate applied to the loan principal (fraction)
    #[serde(rename = "monthlyRate")]
    pub monthly_rate: f64,
}

impl TrancheBand {
    fn for_tranche(tranche: Tranche, monthly_rate: f64) -> Self {
        let (lower_bound, upper_bound) = tranche.bounds();
        Self {
            lower_bound,
            upper_bound,
            monthly_rate,
        }
    }
}

/// Per-institution unemployment rate table (bank side)
#[derive(Debug, Clone, Default)]
pub struct UnemploymentTable {
    institutions: HashMap<String, HashMap<Tranche, TrancheBand>>,
}

/// Default bank cesantía rates by tranche (tramo_1 .. tramo_5)
const DEFAULT_BANK_RATES: &[(&str, [f64; 5])] = &[
    ("BANCO CHILE", [0.00120, 0.00105, 0.00092, 0.00081, 0.00072]),
    ("BANCO SANTANDER", [0.00128, 0.00112, 0.00098, 0.00086, 0.00076]),
    ("BANCO BCI", [0.00115, 0.00101, 0.00089, 0.00078, 0.00069]),
    ("BANCO ESTADO", [0.00104, 0.00091, 0.00080, 0.00070, 0.00062]),
    ("BANCO ITAU-CORPBANCA", [0.00132, 0.00116, 0.00102, 0.00090, 0.00079]),
    ("BANCO FALABELLA", [0.00156, 0.00137, 0.00120, 0.00106, 0.00093]),
    ("SCOTIABANK", [0.00124, 0.00109, 0.00096, 0.00084, 0.00074]),
    ("BANCO RIPLEY", [0.00164, 0.00144, 0.00126, 0.00111, 0.00098]),
];

/// Preferential cesantía rates by tranche, fixed for the whole program
const DEFAULT_PREFERENTIAL_RATES: [f64; 5] = [0.00058, 0.00049, 0.00041, 0.00036, 0.00031];

impl UnemploymentTable {
    /// Create an empty table (populate with [`Self::insert_institution`])
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in market table covering the institutions the program works with
    pub fn default_market() -> Self {
        let mut table = Self::new();
        for (institution, rates) in DEFAULT_BANK_RATES {
            table.insert_institution(institution, *rates);
        }
        table
    }

    /// Insert or replace an institution's five tranche rates
    pub fn insert_institution(&mut self, institution: &str, rates: [f64; 5]) {
        let mut bands = HashMap::new();
        for (tranche, rate) in Tranche::ALL.iter().zip(rates.iter()) {
            bands.insert(*tranche, TrancheBand::for_tranche(*tranche, *rate));
        }
        self.institutions.insert(institution.to_string(), bands);
    }

    /// Insert a single band (used by the document loader)
    pub fn insert_band(&mut self, institution: &str, tranche: Tranche, band: TrancheBand) {
        self.institutions
            .entry(institution.to_string())
            .or_default()
            .insert(tranche, band);
    }

    /// Monthly rate for an institution/tranche pair.
    ///
    /// Direct single-level lookup, no fallback: a miss means the institution
    /// is not tabulated and the calculation must surface an error.
    pub fn monthly_rate(&self, institution: &str, tranche: Tranche) -> Option<f64> {
        self.institutions
            .get(institution)
            .and_then(|bands| bands.get(&tranche))
            .map(|band| band.monthly_rate)
    }

    /// Whether any tranche is tabulated for the institution
    pub fn has_institution(&self, institution: &str) -> bool {
        self.institutions.contains_key(institution)
    }
}

/// Fixed preferential unemployment rate table.
///
/// Complete for all five tranches by construction, so lookups are infallible.
#[derive(Debug, Clone)]
pub struct PreferentialUnemploymentTable {
    rates: [f64; 5],
}

impl PreferentialUnemploymentTable {
    /// Program-negotiated preferential rates
    pub fn default_market() -> Self {
        Self {
            rates: DEFAULT_PREFERENTIAL_RATES,
        }
    }

    /// Create from explicit per-tranche rates (tramo_1 .. tramo_5)
    pub fn new(rates: [f64; 5]) -> Self {
        Self { rates }
    }

    /// Monthly rate for a tranche; never fails
    pub fn monthly_rate(&self, tranche: Tranche) -> f64 {
        match tranche {
            Tranche::Tramo1 => self.rates[0],
            Tranche::Tramo2 => self.rates[1],
            Tranche::Tramo3 => self.rates[2],
            Tranche::Tramo4 => self.rates[3],
            Tranche::Tramo5 => self.rates[4],
        }
    }
}
