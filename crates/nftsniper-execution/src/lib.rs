//! Nftsniper Execution
//!
//! Counter-order construction, bounded confirmation polling, and the
//! purchase orchestrator.

pub mod confirm;
pub mod counter_order;
pub mod dry_run;
pub mod orchestrator;

pub use confirm::{poll_until, PollSettings};
pub use dry_run::DryRunProtocol;
pub use orchestrator::PurchaseOrchestrator;
