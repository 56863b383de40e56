//! Refund Engine - Premium differential calculation for consumer-credit insurance
//!
//! This library provides:
//! - Bank vs. preferential premium comparison for desgravamen (life/disability)
//!   and cesantía (unemployment) coverage
//! - Tiered rate-table lookups with nearest-installment-count fallback
//! - Service-margin deduction and the composed refund calculation
//! - Breakdown reconstruction from persisted calculation snapshots, including
//!   margin inference
//! - Batch calculation/reconstruction over pre-loaded tables

pub mod engine;
pub mod runner;
pub mod tables;

// Re-export commonly used types
pub use engine::{
    BreakdownResult, CalcError, CalculationInput, CalculationResult, CoverageMode, RefundEngine,
    Snapshot,
};
pub use runner::BatchRunner;
pub use tables::RateTables;
