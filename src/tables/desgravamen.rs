//! Life/disability (desgravamen) rate tables
//!
//! Bank desgravamen premiums are tabulated as single-premium rates keyed by
//! institution, age band, credit amount rounded to the nearest million, and
//! installment count. Not every installment count is tabulated for every
//! amount row; the accessor falls back to the nearest tabulated count and
//! reports which count it actually used.
//!
//! The preferential side is four fixed monthly rates keyed by amount and age
//! thresholds.

use std::collections::HashMap;

/// Age band used by the desgravamen tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgeBand {
    /// Age 55 or below
    UpTo55,
    /// Age 56 and above
    Over55,
}

impl AgeBand {
    pub fn from_age(age: u8) -> Self {
        if age <= 55 {
            AgeBand::UpTo55
        } else {
            AgeBand::Over55
        }
    }

    /// Table key matching the persisted document format
    pub fn as_str(&self) -> &'static str {
        match self {
            AgeBand::UpTo55 => "hasta_55",
            AgeBand::Over55 => "mayor_55",
        }
    }

    /// Parse a document key back into an age band
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "hasta_55" => Some(AgeBand::UpTo55),
            "mayor_55" => Some(AgeBand::Over55),
            _ => None,
        }
    }
}

/// Lowest amount row in the bank tables (CLP)
pub const MIN_TABLE_AMOUNT: u64 = 2_000_000;

/// Highest amount row in the bank tables (CLP)
pub const MAX_TABLE_AMOUNT: u64 = 60_000_000;

/// Round a credit amount to the nearest million and clamp it into the
/// tabulated range. Amounts outside the range use the clamped row, they
/// never fail the lookup.
pub fn rounded_amount(amount: f64) -> u64 {
    // Clamp while still in millions so arbitrarily large inputs cannot
    // overflow the conversion back to CLP.
    let millions = (amount / 1_000_000.0).round().clamp(
        (MIN_TABLE_AMOUNT / 1_000_000) as f64,
        (MAX_TABLE_AMOUNT / 1_000_000) as f64,
    );
    millions as u64 * 1_000_000
}

/// Result of a bank desgravamen rate lookup
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BankRateQuote {
    /// Single-premium rate (fraction of the credit amount)
    pub rate: f64,

    /// Installment count the rate was tabulated for. Equals the requested
    /// count when it was tabulated, otherwise the nearest tabulated count.
    pub installments_used: u32,

    /// Amount row actually used (rounded and clamped)
    pub rounded_amount: u64,
}

/// Rates tabulated per installment count
type InstallmentRates = HashMap<u32, f64>;

/// Amount row -> installment count -> rate
type AmountGrid = HashMap<u64, InstallmentRates>;

#[derive(Debug, Clone, Default)]
struct InstitutionGrid {
    up_to_55: AmountGrid,
    over_55: AmountGrid,
}

impl InstitutionGrid {
    fn band(&self, band: AgeBand) -> &AmountGrid {
        match band {
            AgeBand::UpTo55 => &self.up_to_55,
            AgeBand::Over55 => &self.over_55,
        }
    }

    fn band_mut(&mut self, band: AgeBand) -> &mut AmountGrid {
        match band {
            AgeBand::UpTo55 => &mut self.up_to_55,
            AgeBand::Over55 => &mut self.over_55,
        }
    }
}

/// Bank desgravamen rate table
#[derive(Debug, Clone, Default)]
pub struct DesgravamenTable {
    institutions: HashMap<String, InstitutionGrid>,
}

/// Default single-premium base rates per month of term
/// (institution, up-to-55 monthly base, over-55 monthly base)
const DEFAULT_BASE_RATES: &[(&str, f64, f64)] = &[
    ("BANCO CHILE", 0.00042, 0.00080),
    ("BANCO SANTANDER", 0.00046, 0.00087),
    ("BANCO BCI", 0.00040, 0.00076),
    ("BANCO ESTADO", 0.00036, 0.00068),
    ("BANCO ITAU-CORPBANCA", 0.00048, 0.00091),
    ("BANCO FALABELLA", 0.00058, 0.00110),
    ("SCOTIABANK", 0.00044, 0.00084),
    ("BANCO RIPLEY", 0.00062, 0.00118),
];

/// Installment counts tabulated in the default market table
const DEFAULT_INSTALLMENT_COUNTS: &[u32] = &[6, 12, 18, 24, 36, 48, 60, 72];

impl DesgravamenTable {
    /// Create an empty table (populate with [`Self::insert_rate`])
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in market table: amount rows 2M..=60M in 1M steps, the standard
    /// installment grid, single-premium rate = base monthly rate x term.
    pub fn default_market() -> Self {
        let mut table = Self::new();
        for (institution, base_up_to_55, base_over_55) in DEFAULT_BASE_RATES {
            for amount in (MIN_TABLE_AMOUNT..=MAX_TABLE_AMOUNT).step_by(1_000_000) {
                for &installments in DEFAULT_INSTALLMENT_COUNTS {
                    let term = installments as f64;
                    table.insert_rate(
                        institution,
                        AgeBand::UpTo55,
                        amount,
                        installments,
                        base_up_to_55 * term,
                    );
                    table.insert_rate(
                        institution,
                        AgeBand::Over55,
                        amount,
                        installments,
                        base_over_55 * term,
                    );
                }
            }
        }
        table
    }

    /// Insert or replace one tabulated rate
    pub fn insert_rate(
        &mut self,
        institution: &str,
        band: AgeBand,
        amount: u64,
        installments: u32,
        rate: f64,
    ) {
        self.institutions
            .entry(institution.to_string())
            .or_default()
            .band_mut(band)
            .entry(amount)
            .or_default()
            .insert(installments, rate);
    }

    /// Look up the bank single-premium rate for a credit.
    ///
    /// The amount is rounded to the nearest million and clamped into
    /// [`MIN_TABLE_AMOUNT`, `MAX_TABLE_AMOUNT`]. If the exact installment
    /// count is not tabulated for that row, the tabulated count with the
    /// smallest absolute distance is used instead; on a tie the larger count
    /// wins. Returns `None` when the institution, age band, or amount row is
    /// absent, or when the row tabulates no installment counts at all.
    pub fn bank_rate(
        &self,
        institution: &str,
        age: u8,
        amount: f64,
        installments: u32,
    ) -> Option<BankRateQuote> {
        let band = AgeBand::from_age(age);
        let row_amount = rounded_amount(amount);

        let rates = self
            .institutions
            .get(institution)?
            .band(band)
            .get(&row_amount)?;

        if let Some(&rate) = rates.get(&installments) {
            return Some(BankRateQuote {
                rate,
                installments_used: installments,
                rounded_amount: row_amount,
            });
        }

        // Nearest tabulated count; ties resolve to the larger count. This is
        // load-bearing: changing it would alter historical refund amounts for
        // borderline installment counts.
        let mut best: Option<(u32, f64)> = None;
        for (&count, &rate) in rates {
            match best {
                None => best = Some((count, rate)),
                Some((best_count, _)) => {
                    let dist = count.abs_diff(installments);
                    let best_dist = best_count.abs_diff(installments);
                    if dist < best_dist || (dist == best_dist && count > best_count) {
                        best = Some((count, rate));
                    }
                }
            }
        }

        best.map(|(installments_used, rate)| {
            log::debug!(
                "desgravamen lookup for {} substituted {} installments for requested {}",
                institution,
                installments_used,
                installments
            );
            BankRateQuote {
                rate,
                installments_used,
                rounded_amount: row_amount,
            }
        })
    }

    /// Whether any rates are tabulated for the institution
    pub fn has_institution(&self, institution: &str) -> bool {
        self.institutions.contains_key(institution)
    }
}

/// Amount threshold separating the two preferential desgravamen rate columns
pub const PREFERENTIAL_AMOUNT_THRESHOLD: f64 = 20_000_000.0;

/// The four fixed preferential desgravamen monthly rates, keyed by amount
/// threshold and age band
#[derive(Debug, Clone, Copy)]
pub struct PreferentialDesgravamenRates {
    pub up_to_20m_up_to_55: f64,
    pub up_to_20m_over_55: f64,
    pub over_20m_up_to_55: f64,
    pub over_20m_over_55: f64,
}

impl PreferentialDesgravamenRates {
    /// Program-negotiated preferential rates
    pub fn default_market() -> Self {
        Self {
            up_to_20m_up_to_55: 0.00017,
            up_to_20m_over_55: 0.00033,
            over_20m_up_to_55: 0.00015,
            over_20m_over_55: 0.00029,
        }
    }

    /// Select the monthly rate for a credit; never fails
    pub fn monthly_rate(&self, amount: f64, age: u8) -> f64 {
        let over_threshold = amount > PREFERENTIAL_AMOUNT_THRESHOLD;
        match (over_threshold, AgeBand::from_age(age)) {
            (false, AgeBand::UpTo55) => self.up_to_20m_up_to_55,
            (false, AgeBand::Over55) => self.up_to_20m_over_55,
            (true, AgeBand::UpTo55) => self.over_20m_up_to_55,
            (true, AgeBand::Over55) => self.over_20m_over_55,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn fixture_table() -> DesgravamenTable {
        let mut table = DesgravamenTable::new();
        for &installments in &[12u32, 24, 36, 48] {
            table.insert_rate(
                "BANCO TEST",
                AgeBand::UpTo55,
                4_000_000,
                installments,
                0.0004 * installments as f64,
            );
        }
        table
    }

    #[test]
    fn test_rounded_amount() {
        assert_eq!(rounded_amount(4_499_999.0), 4_000_000);
        assert_eq!(rounded_amount(4_500_000.0), 5_000_000);
        assert_eq!(rounded_amount(12_000_000.0), 12_000_000);
    }

    #[test]
    fn test_rounded_amount_clamps() {
        assert_eq!(rounded_amount(800_000.0), MIN_TABLE_AMOUNT);
        assert_eq!(rounded_amount(95_000_000.0), MAX_TABLE_AMOUNT);
    }

    #[test]
    fn test_rounded_amount_extreme_inputs_clamp_without_overflow() {
        assert_eq!(rounded_amount(1e19), MAX_TABLE_AMOUNT);
        assert_eq!(rounded_amount(f64::MAX), MAX_TABLE_AMOUNT);
        assert_eq!(rounded_amount(0.0), MIN_TABLE_AMOUNT);
    }

    #[test]
    fn test_exact_installment_count() {
        let table = fixture_table();
        let quote = table.bank_rate("BANCO TEST", 40, 4_100_000.0, 36).unwrap();
        assert_eq!(quote.installments_used, 36);
        assert_eq!(quote.rounded_amount, 4_000_000);
        assert_relative_eq!(quote.rate, 0.0004 * 36.0);
    }

    #[test]
    fn test_nearest_installment_fallback() {
        let table = fixture_table();

        // 25 is closest to 24
        let quote = table.bank_rate("BANCO TEST", 40, 4_000_000.0, 25).unwrap();
        assert_eq!(quote.installments_used, 24);

        // 44 is closest to 48
        let quote = table.bank_rate("BANCO TEST", 40, 4_000_000.0, 44).unwrap();
        assert_eq!(quote.installments_used, 48);
    }

    #[test]
    fn test_nearest_installment_tie_prefers_larger() {
        let table = fixture_table();

        // 18 is equidistant from 12 and 24
        let quote = table.bank_rate("BANCO TEST", 40, 4_000_000.0, 18).unwrap();
        assert_eq!(quote.installments_used, 24);

        // 30 is equidistant from 24 and 36
        let quote = table.bank_rate("BANCO TEST", 40, 4_000_000.0, 30).unwrap();
        assert_eq!(quote.installments_used, 36);
    }

    #[test]
    fn test_missing_branches_are_not_found() {
        let table = fixture_table();

        assert!(table.bank_rate("BANCO OTRO", 40, 4_000_000.0, 24).is_none());
        // age band not tabulated in the fixture
        assert!(table.bank_rate("BANCO TEST", 60, 4_000_000.0, 24).is_none());
        // amount row not tabulated in the fixture
        assert!(table.bank_rate("BANCO TEST", 40, 9_000_000.0, 24).is_none());
    }

    #[test]
    fn test_default_market_coverage() {
        let table = DesgravamenTable::default_market();

        let quote = table.bank_rate("BANCO CHILE", 34, 4_500_000.0, 48).unwrap();
        assert_eq!(quote.rounded_amount, 5_000_000);
        assert_eq!(quote.installments_used, 48);
        assert_relative_eq!(quote.rate, 0.00042 * 48.0);

        // clamped amounts still resolve
        assert!(table.bank_rate("BANCO ESTADO", 70, 900_000.0, 12).is_some());
        assert!(table.bank_rate("BANCO ESTADO", 70, 80_000_000.0, 12).is_some());
    }

    #[test]
    fn test_preferential_rate_selection() {
        let rates = PreferentialDesgravamenRates::default_market();

        assert_relative_eq!(rates.monthly_rate(4_500_000.0, 34), rates.up_to_20m_up_to_55);
        assert_relative_eq!(rates.monthly_rate(20_000_000.0, 55), rates.up_to_20m_up_to_55);
        assert_relative_eq!(rates.monthly_rate(20_000_001.0, 55), rates.over_20m_up_to_55);
        assert_relative_eq!(rates.monthly_rate(4_500_000.0, 56), rates.up_to_20m_over_55);
        assert_relative_eq!(rates.monthly_rate(25_000_000.0, 61), rates.over_20m_over_55);
    }
}
