#![doc = "Parameter-space construction and execution scheduling for the lhascan engine."]

/// Scan configuration loading and validation.
pub mod config;
/// Batch and streaming scheduling.
pub mod dispatch;
/// Whitelisted expression evaluation.
pub mod expr;
/// Raw-assignment resolution.
pub mod resolve;
/// External runner contract.
pub mod runner;
/// Top-level scan orchestration.
pub mod scan;
/// Grid expansion and random draws.
pub mod space;

pub use config::{RunnerConfig, ScanConfig};
pub use dispatch::{
    default_workers, partition_quotas, run_batch, run_streaming, ConstraintOutcome, ConstraintSet,
};
pub use expr::{eval_number, EmptyScope, Expr, ExprError, ExprValue, Scope};
pub use resolve::{resolve, RawAssignment, ScanPoint};
pub use runner::Runner;
pub use scan::{RandomScan, Scan};
pub use space::{expand_range, ScanSpace};
