//! Refund calculation orchestrator
//!
//! Composes the two coverage calculators per requested mode, applies the
//! service margin exactly once on the combined differential, and converts
//! every pipeline failure into the result's `error` field. Partial results
//! are never returned: an error in any leg required by the mode zeroes the
//! whole result.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::tables::{canonical_key, RateTables};

use super::cesantia::{compute_cesantia, CesantiaLeg};
use super::desgravamen::{compute_desgravamen, DesgravamenLeg};
use super::error::CalcError;
use super::margin::{apply_margin, DEFAULT_MARGIN_PCT};

/// Coverage requested for a calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverageMode {
    /// Life/disability coverage only
    Desgravamen,
    /// Unemployment coverage only
    Cesantia,
    /// Both coverages combined
    Ambos,
}

impl CoverageMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoverageMode::Desgravamen => "desgravamen",
            CoverageMode::Cesantia => "cesantia",
            CoverageMode::Ambos => "ambos",
        }
    }
}

impl fmt::Display for CoverageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CoverageMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "desgravamen" => Ok(CoverageMode::Desgravamen),
            "cesantia" | "cesantía" => Ok(CoverageMode::Cesantia),
            "ambos" => Ok(CoverageMode::Ambos),
            other => Err(format!("unknown coverage mode '{other}'")),
        }
    }
}

/// One refund simulation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationInput {
    /// Bank name as entered in the form (free text)
    pub institution: String,

    /// Age in whole years
    pub age: u8,

    /// Credit amount in CLP
    pub amount: f64,

    /// Total installment count of the schedule
    pub total_installments: u32,

    /// Installments still pending
    pub remaining_installments: u32,

    /// Coverage to simulate
    pub mode: CoverageMode,
}

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Service margin retained from the differential (percent)
    pub margin_pct: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            margin_pct: DEFAULT_MARGIN_PCT,
        }
    }
}

/// Complete result of one refund calculation.
///
/// When `error` is set, every numeric field is zero and both legs are `None`;
/// callers must check `error` before trusting the numbers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResult {
    /// Canonical institution key the lookups used
    pub institution: String,

    /// Coverage mode the result was computed for
    pub mode: CoverageMode,

    /// Desgravamen breakdown, present when the mode includes it
    pub desgravamen: Option<DesgravamenLeg>,

    /// Cesantía breakdown, present when the mode includes it
    pub cesantia: Option<CesantiaLeg>,

    /// Combined differential before the margin (CLP)
    pub total_differential: i64,

    /// Margin percentage applied
    pub margin_pct: f64,

    /// Client-facing refund after the margin (CLP)
    #[serde(rename = "montoDevolucion")]
    pub refund: i64,

    /// Failure description; set means the calculation did not produce numbers
    pub error: Option<String>,
}

impl CalculationResult {
    fn failed(institution: String, mode: CoverageMode, margin_pct: f64, error: CalcError) -> Self {
        Self {
            institution,
            mode,
            desgravamen: None,
            cesantia: None,
            total_differential: 0,
            margin_pct,
            refund: 0,
            error: Some(error.to_string()),
        }
    }
}

/// Premium differential calculation engine.
///
/// Pure: owns no mutable state and performs no I/O, so one engine is safe to
/// share across threads against its immutable tables.
#[derive(Debug, Clone)]
pub struct RefundEngine {
    tables: RateTables,
    config: EngineConfig,
}

impl RefundEngine {
    /// Engine with the default 10% margin
    pub fn new(tables: RateTables) -> Self {
        Self::with_config(tables, EngineConfig::default())
    }

    pub fn with_config(tables: RateTables, config: EngineConfig) -> Self {
        Self { tables, config }
    }

    pub fn tables(&self) -> &RateTables {
        &self.tables
    }

    pub fn margin_pct(&self) -> f64 {
        self.config.margin_pct
    }

    /// Run one refund calculation. Never panics and never returns partial
    /// numbers: any failure lands in the result's `error` field.
    pub fn calculate(&self, input: &CalculationInput) -> CalculationResult {
        let institution = canonical_key(&input.institution);
        match self.try_calculate(&institution, input) {
            Ok(result) => result,
            Err(error) => CalculationResult::failed(
                institution,
                input.mode,
                self.config.margin_pct,
                error,
            ),
        }
    }

    /// Reconstruct the coverage breakdown of a persisted snapshot
    pub fn reconstruct(
        &self,
        snapshot: &super::breakdown::Snapshot,
    ) -> Option<super::breakdown::BreakdownResult> {
        super::breakdown::reconstruct(&self.tables, snapshot)
    }

    fn try_calculate(
        &self,
        institution: &str,
        input: &CalculationInput,
    ) -> Result<CalculationResult, CalcError> {
        validate(input)?;

        let margin_pct = self.config.margin_pct;
        let (desgravamen, cesantia) = match input.mode {
            CoverageMode::Desgravamen => (
                Some(compute_desgravamen(
                    &self.tables,
                    institution,
                    input.age,
                    input.amount,
                    input.total_installments,
                    input.remaining_installments,
                )?),
                None,
            ),
            CoverageMode::Cesantia => (
                None,
                Some(compute_cesantia(
                    &self.tables,
                    institution,
                    input.amount,
                    input.remaining_installments,
                )?),
            ),
            CoverageMode::Ambos => (
                Some(compute_desgravamen(
                    &self.tables,
                    institution,
                    input.age,
                    input.amount,
                    input.total_installments,
                    input.remaining_installments,
                )?),
                Some(compute_cesantia(
                    &self.tables,
                    institution,
                    input.amount,
                    input.remaining_installments,
                )?),
            ),
        };

        let total_differential = desgravamen.as_ref().map_or(0, |leg| leg.differential)
            + cesantia.as_ref().map_or(0, |leg| leg.differential);

        // Margin is applied exactly once, on the combined total.
        let refund = apply_margin(total_differential as f64, margin_pct);

        Ok(CalculationResult {
            institution: institution.to_string(),
            mode: input.mode,
            desgravamen,
            cesantia,
            total_differential,
            margin_pct,
            refund,
            error: None,
        })
    }
}

fn validate(input: &CalculationInput) -> Result<(), CalcError> {
    if !(input.amount > 0.0) || !input.amount.is_finite() {
        return Err(CalcError::InvalidInput(format!(
            "credit amount must be positive, got {}",
            input.amount
        )));
    }
    if input.total_installments == 0 || input.remaining_installments == 0 {
        return Err(CalcError::InvalidInput(
            "installment counts must be positive".to_string(),
        ));
    }
    if input.remaining_installments > input.total_installments {
        return Err(CalcError::InvalidInput(format!(
            "remaining installments ({}) exceed total ({})",
            input.remaining_installments, input.total_installments
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> RefundEngine {
        RefundEngine::new(RateTables::default_market())
    }

    fn input(mode: CoverageMode) -> CalculationInput {
        CalculationInput {
            institution: "Chile".to_string(),
            age: 34,
            amount: 4_500_000.0,
            total_installments: 48,
            remaining_installments: 30,
            mode,
        }
    }

    #[test]
    fn test_cesantia_only_scenario() {
        let result = engine().calculate(&input(CoverageMode::Cesantia));

        assert_eq!(result.error, None);
        assert_eq!(result.institution, "BANCO CHILE");
        assert!(result.desgravamen.is_none());

        let leg = result.cesantia.as_ref().unwrap();
        assert_eq!(leg.differential, 68_850);
        assert_eq!(result.total_differential, 68_850);
        // 10% margin applied once: round(0.9 * 68850)
        assert_eq!(result.refund, 61_965);
    }

    #[test]
    fn test_ambos_sums_legs_and_applies_margin_once() {
        let engine = engine();
        let both = engine.calculate(&input(CoverageMode::Ambos));
        let desgravamen = engine.calculate(&input(CoverageMode::Desgravamen));
        let cesantia = engine.calculate(&input(CoverageMode::Cesantia));

        assert_eq!(both.error, None);
        assert_eq!(
            both.total_differential,
            desgravamen.total_differential + cesantia.total_differential
        );
        assert_eq!(
            both.refund,
            apply_margin(both.total_differential as f64, 10.0)
        );
    }

    #[test]
    fn test_unknown_institution_zeroes_everything() {
        let result = engine().calculate(&CalculationInput {
            institution: "Banco Inexistente".to_string(),
            ..input(CoverageMode::Desgravamen)
        });

        assert!(result.error.is_some());
        assert!(result.error.as_ref().unwrap().contains("BANCO INEXISTENTE"));
        assert_eq!(result.total_differential, 0);
        assert_eq!(result.refund, 0);
        assert!(result.desgravamen.is_none());
        assert!(result.cesantia.is_none());
    }

    #[test]
    fn test_ambos_fails_whole_calculation_when_one_leg_fails() {
        // tables with desgravamen data but no cesantía data for the bank
        let mut tables = RateTables::default_market();
        tables.cesantia = crate::tables::UnemploymentTable::new();
        let engine = RefundEngine::new(tables);

        let result = engine.calculate(&input(CoverageMode::Ambos));
        assert!(result.error.is_some());
        assert!(result.desgravamen.is_none());
        assert_eq!(result.refund, 0);
    }

    #[test]
    fn test_invalid_inputs_are_errors_not_panics() {
        let engine = engine();

        let mut bad = input(CoverageMode::Ambos);
        bad.remaining_installments = 60; // exceeds total of 48
        assert!(engine.calculate(&bad).error.is_some());

        let mut bad = input(CoverageMode::Ambos);
        bad.amount = 0.0;
        assert!(engine.calculate(&bad).error.is_some());

        let mut bad = input(CoverageMode::Ambos);
        bad.total_installments = 0;
        assert!(engine.calculate(&bad).error.is_some());
    }

    #[test]
    fn test_idempotent_for_identical_inputs() {
        let engine = engine();
        let first = engine.calculate(&input(CoverageMode::Ambos));
        let second = engine.calculate(&input(CoverageMode::Ambos));
        assert_eq!(first, second);
    }

    #[test]
    fn test_configured_margin_is_used() {
        let engine = RefundEngine::with_config(
            RateTables::default_market(),
            EngineConfig { margin_pct: 20.0 },
        );
        let result = engine.calculate(&input(CoverageMode::Cesantia));
        assert_eq!(result.margin_pct, 20.0);
        assert_eq!(result.refund, apply_margin(68_850.0, 20.0));
    }

    #[test]
    fn test_coverage_mode_parsing() {
        assert_eq!("ambos".parse::<CoverageMode>(), Ok(CoverageMode::Ambos));
        assert_eq!(
            "Cesantía".parse::<CoverageMode>(),
            Ok(CoverageMode::Cesantia)
        );
        assert!("vida".parse::<CoverageMode>().is_err());
    }
}
