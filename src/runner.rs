//! Batch runner for bulk calculation and reconstruction
//!
//! The admin console's export paths re-run hundreds of simulations or
//! reconstruct whole pages of persisted records at once. Tables are loaded
//! once and shared; each item is independent, so batches parallelize with
//! rayon without coordination.

use rayon::prelude::*;

use crate::engine::{
    BreakdownResult, CalculationInput, CalculationResult, EngineConfig, RefundEngine, Snapshot,
};
use crate::tables::RateTables;

/// Pre-loaded batch runner
///
/// # Example
/// ```ignore
/// let runner = BatchRunner::new(RateTables::default_market());
/// let results = runner.calculate_all(&inputs);
/// ```
#[derive(Debug, Clone)]
pub struct BatchRunner {
    engine: RefundEngine,
}

impl BatchRunner {
    /// Runner with the default 10% margin
    pub fn new(tables: RateTables) -> Self {
        Self {
            engine: RefundEngine::new(tables),
        }
    }

    pub fn with_config(tables: RateTables, config: EngineConfig) -> Self {
        Self {
            engine: RefundEngine::with_config(tables, config),
        }
    }

    pub fn engine(&self) -> &RefundEngine {
        &self.engine
    }

    /// Calculate a batch of simulation requests in parallel; result order
    /// matches input order.
    pub fn calculate_all(&self, inputs: &[CalculationInput]) -> Vec<CalculationResult> {
        inputs
            .par_iter()
            .map(|input| self.engine.calculate(input))
            .collect()
    }

    /// Reconstruct a batch of persisted snapshots in parallel. Entries that
    /// do not apply (non-"ambos" or incomplete snapshots) come back as `None`
    /// in their original position.
    pub fn reconstruct_all(&self, snapshots: &[Snapshot]) -> Vec<Option<BreakdownResult>> {
        snapshots
            .par_iter()
            .map(|snapshot| self.engine.reconstruct(snapshot))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::CoverageMode;

    #[test]
    fn test_batch_results_preserve_order() {
        let runner = BatchRunner::new(RateTables::default_market());

        let inputs: Vec<CalculationInput> = (1..=20)
            .map(|i| CalculationInput {
                institution: "Chile".to_string(),
                age: 34,
                amount: 1_000_000.0 * i as f64,
                total_installments: 48,
                remaining_installments: 24,
                mode: CoverageMode::Ambos,
            })
            .collect();

        let results = runner.calculate_all(&inputs);
        assert_eq!(results.len(), inputs.len());

        let engine = RefundEngine::new(RateTables::default_market());
        for (input, result) in inputs.iter().zip(&results) {
            assert_eq!(*result, engine.calculate(input));
        }
    }

    #[test]
    fn test_batch_reconstruction_keeps_non_applicable_slots() {
        let runner = BatchRunner::new(RateTables::default_market());

        let applicable = Snapshot {
            amount: Some(4_500_000.0),
            remaining_installments: Some(30),
            current_monthly_premium: Some(4_000.0),
            new_monthly_premium: Some(1_000.0),
            stored_saving: None,
            institution: "Chile".to_string(),
            coverage: CoverageMode::Ambos,
            created_at: None,
        };
        let mut not_applicable = applicable.clone();
        not_applicable.coverage = CoverageMode::Desgravamen;

        let results =
            runner.reconstruct_all(&[applicable.clone(), not_applicable, applicable]);
        assert!(results[0].is_some());
        assert!(results[1].is_none());
        assert!(results[2].is_some());
    }
}
