//! Batch runs: target selection, the checkpoint ledger and run totals.

pub mod ledger;
pub mod orchestrator;

pub use ledger::ProgressLedger;
pub use orchestrator::{BatchOrchestrator, RunSummary, Target};
