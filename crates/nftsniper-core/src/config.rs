//! Application configuration types, loaded from TOML.

use crate::error::ConfigError;
use crate::types::TaskSpec;
use alloy_primitives::{address, Address};
use serde::{Deserialize, Serialize};

/// Default aggregator search endpoint
pub const DEFAULT_AGGREGATOR_URL: &str = "https://gem.simon4545.workers.dev/";

/// Fee recipient applied to counter-orders when the listing carries none
pub const MARKETPLACE_FEE_RECIPIENT: Address =
    address!("5b3256965e7c3cf26e11fcaf296dfc8807c01073");

/// Target chain environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
}

impl Network {
    /// Marketplace REST base for this network
    pub fn marketplace_url(&self) -> &'static str {
        match self {
            Network::Mainnet => "https://api.opensea.io",
            Network::Testnet => "https://rinkeby-api.opensea.io",
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub network: Network,
    pub discovery: DiscoveryConfig,
    pub execution: ExecutionConfig,
    pub logging: LoggingConfig,
    /// Initial task set, registered at startup
    pub tasks: Vec<TaskSpec>,
}

impl AppConfig {
    /// Validate every section. A failure here rejects construction of the
    /// whole engine; no task can be added afterwards.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.discovery.validate()?;
        self.execution.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Listing discovery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Aggregator search endpoint
    pub aggregator_url: String,
    /// Marketplace REST base; empty selects the network default
    pub marketplace_url: String,
    /// Marketplace API key, sent as `x-api-key` when present
    pub api_key: Option<String>,
    /// Maximum tokens pulled per aggregator search
    pub search_limit: u32,
    pub request_timeout_secs: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            aggregator_url: DEFAULT_AGGREGATOR_URL.to_string(),
            marketplace_url: String::new(),
            api_key: None,
            search_limit: 10,
            request_timeout_secs: 10,
        }
    }
}

impl DiscoveryConfig {
    /// Marketplace base, falling back to the network default
    pub fn marketplace_base(&self, network: Network) -> String {
        if self.marketplace_url.trim().is_empty() {
            network.marketplace_url().to_string()
        } else {
            self.marketplace_url.trim_end_matches('/').to_string()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.aggregator_url.trim().is_empty() {
            return Err(invalid_value(
                "discovery.aggregator_url",
                "must not be empty",
            ));
        }
        if self.search_limit == 0 {
            return Err(invalid_value(
                "discovery.search_limit",
                "must be greater than zero",
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(invalid_value(
                "discovery.request_timeout_secs",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// Purchase execution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Approve and fabricate executions instead of touching a chain
    pub dry_run: bool,
    /// Gas budget margin over the raw estimate, in basis points
    pub gas_margin_bps: u64,
    /// Total validation attempts before surfacing failure
    pub validation_attempts: u32,
    /// Fixed delay between validation attempts
    pub validation_retry_delay_ms: u64,
    /// Bounded confirmation poll attempts (approvals, proxy setup)
    pub confirm_poll_attempts: u32,
    /// Fixed delay between confirmation probes
    pub confirm_poll_interval_ms: u64,
    /// Clock-skew allowance subtracted from counter-order listing times
    pub listing_time_skew_secs: u64,
    /// Fee recipient applied when the listing carries none
    pub fee_recipient: Address,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            dry_run: true,
            gas_margin_bps: 10_100,
            validation_attempts: 2,
            validation_retry_delay_ms: 500,
            confirm_poll_attempts: 60,
            confirm_poll_interval_ms: 5_000,
            listing_time_skew_secs: 100,
            fee_recipient: MARKETPLACE_FEE_RECIPIENT,
        }
    }
}

impl ExecutionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        // The margin must keep the budget strictly above the raw estimate
        if self.gas_margin_bps <= 10_000 {
            return Err(invalid_value(
                "execution.gas_margin_bps",
                "must exceed 10000 (a margin above the raw estimate)",
            ));
        }
        if self.validation_attempts == 0 {
            return Err(invalid_value(
                "execution.validation_attempts",
                "must be greater than zero",
            ));
        }
        if self.confirm_poll_attempts == 0 {
            return Err(invalid_value(
                "execution.confirm_poll_attempts",
                "must be greater than zero",
            ));
        }
        if self.fee_recipient == Address::ZERO {
            return Err(invalid_value(
                "execution.fee_recipient",
                "must not be the zero address",
            ));
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// trace | debug | info | warn | error
    pub level: String,
    /// pretty | json | compact
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(invalid_value(
                    "logging.level",
                    format!("unknown level {other:?}"),
                ))
            }
        }
        match self.format.to_lowercase().as_str() {
            "pretty" | "json" | "compact" => {}
            other => {
                return Err(invalid_value(
                    "logging.format",
                    format!("unknown format {other:?}"),
                ))
            }
        }
        Ok(())
    }
}

fn invalid_value(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message: message.into(),
    }
}
