//! Premium differential calculation engine
//!
//! Pure calculation layer: the orchestrator composes the two coverage
//! calculators over injected rate tables, and the breakdown module is the
//! parallel read path over persisted snapshots.

mod breakdown;
mod cesantia;
mod desgravamen;
mod error;
mod margin;
mod orchestrator;

pub use breakdown::{reconstruct, BreakdownResult, Snapshot};
pub use cesantia::{compute_cesantia, CesantiaLeg};
pub use desgravamen::{compute_desgravamen, DesgravamenLeg};
pub use error::CalcError;
pub use margin::{apply_margin, DEFAULT_MARGIN_PCT};
pub use orchestrator::{
    CalculationInput, CalculationResult, CoverageMode, EngineConfig, RefundEngine,
};
