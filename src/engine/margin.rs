//! Service margin deduction

/// Margin retained by the service when none is configured explicitly (percent)
pub const DEFAULT_MARGIN_PCT: f64 = 10.0;

/// Deduct the service margin from a differential and round to integer CLP.
///
/// Deterministic and total: zero or negative input passes through unmodified
/// (callers floor at zero beforehand when required).
pub fn apply_margin(amount: f64, margin_pct: f64) -> i64 {
    (amount * (1.0 - margin_pct / 100.0)).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_margin() {
        assert_eq!(apply_margin(100_000.0, DEFAULT_MARGIN_PCT), 90_000);
        assert_eq!(apply_margin(0.0, DEFAULT_MARGIN_PCT), 0);
    }

    #[test]
    fn test_rounding_to_integer_clp() {
        assert_eq!(apply_margin(100_005.0, 10.0), 90_005); // 90004.5 rounds up
        assert_eq!(apply_margin(1.0, 10.0), 1); // 0.9 rounds up
    }

    #[test]
    fn test_other_margins() {
        assert_eq!(apply_margin(50_000.0, 0.0), 50_000);
        assert_eq!(apply_margin(50_000.0, 25.0), 37_500);
        assert_eq!(apply_margin(50_000.0, 100.0), 0);
    }

    #[test]
    fn test_negative_input_passes_through() {
        assert_eq!(apply_margin(-1_000.0, 10.0), -900);
    }
}
