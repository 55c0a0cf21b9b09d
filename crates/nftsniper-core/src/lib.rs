//! Nftsniper Core
//!
//! Core types, traits, events, and the order matcher for the sniper engine.

pub mod config;
pub mod error;
pub mod events;
pub mod matcher;
pub mod traits;
pub mod types;
pub mod units;

// Re-export commonly used types
pub use config::*;
pub use error::*;
pub use events::*;
pub use matcher::*;
pub use traits::*;
pub use types::*;
pub use units::*;
