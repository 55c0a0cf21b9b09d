//! Nftsniper Data
//!
//! Listing discovery layer: aggregator search, marketplace asset orders,
//! and normalization into candidate orders.

pub mod aggregator;
pub mod discovery;
pub mod marketplace;
pub mod normalize;

pub use aggregator::AggregatorClient;
pub use discovery::ListingDiscovery;
pub use marketplace::MarketplaceClient;
