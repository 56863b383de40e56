//! Calculation error taxonomy
//!
//! Failures never escape the public entry points as panics: the orchestrator
//! converts every `CalcError` into the result's `error` string, and callers
//! check that field before trusting numeric fields. A failed calculation is a
//! normal outcome for unsupported institution/installment combinations.

use thiserror::Error;

/// Errors raised inside the calculation pipeline
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    /// Institution, age band, amount row, or installment branch absent from
    /// the bank desgravamen table
    #[error("no desgravamen rate data for {institution} ({installments} installments)")]
    LookupMiss {
        institution: String,
        installments: u32,
    },

    /// Institution absent from the bank cesantía table
    #[error("no cesantía rate data for {institution}")]
    CesantiaLookupMiss { institution: String },

    /// Input violates the engine's invariants
    #[error("invalid calculation input: {0}")]
    InvalidInput(String),

    /// Non-finite value produced by the numeric pipeline (corrupted table
    /// entry or degenerate input)
    #[error("arithmetic fault during calculation: {0}")]
    Arithmetic(String),
}

/// Reject non-finite intermediates so a corrupted table entry surfaces as a
/// reportable fault instead of propagating NaN into the result.
pub fn ensure_finite(value: f64, what: &str) -> Result<f64, CalcError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CalcError::Arithmetic(format!("{what} is not finite")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_finite() {
        assert_eq!(ensure_finite(1.5, "x"), Ok(1.5));
        assert!(matches!(
            ensure_finite(f64::NAN, "premium"),
            Err(CalcError::Arithmetic(_))
        ));
        assert!(ensure_finite(f64::INFINITY, "premium").is_err());
    }

    #[test]
    fn test_error_messages_identify_the_lookup() {
        let err = CalcError::LookupMiss {
            institution: "BANCO INEXISTENTE".to_string(),
            installments: 30,
        };
        let msg = err.to_string();
        assert!(msg.contains("BANCO INEXISTENTE"));
        assert!(msg.contains("30"));
    }
}
