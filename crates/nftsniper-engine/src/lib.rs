//! Nftsniper Engine
//!
//! Task scheduling and event notification for the sniper.

pub mod notifier;
pub mod scheduler;

pub use notifier::EventNotifier;
pub use scheduler::TaskScheduler;
