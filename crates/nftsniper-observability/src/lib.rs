//! Nftsniper Observability
//!
//! Logging setup for the sniper.

pub mod logging;

pub use logging::{init_default_logging, init_logging, LogFormat};
