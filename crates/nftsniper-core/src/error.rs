use alloy_primitives::Address;
use thiserror::Error;

/// Task registry errors, rejected synchronously at add/remove time
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("Invalid value for {field}: {message}")]
    InvalidField { field: String, message: String },

    #[error("Task already exists for contract {0}")]
    DuplicateContract(Address),

    #[error("No task for contract {0}")]
    NotFound(Address),
}

/// Listing discovery errors
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    #[error("Upstream returned status {code}: {message}")]
    StatusError { code: u16, message: String },

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Exchange protocol errors
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Order validation rejected: {0}")]
    ValidationRejected(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Signer denied: {0}")]
    SignerDenied(String),
}

/// Bounded confirmation poll errors
#[derive(Error, Debug)]
pub enum ConfirmError {
    #[error("Not confirmed after {attempts} attempts: {last_error}")]
    TimedOut { attempts: u32, last_error: String },
}

/// Price conversion errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PriceError {
    #[error("Price cannot be negative")]
    Negative,

    #[error("Price does not fit the integer unit range")]
    Unrepresentable,

    #[error("Unparseable price: {0}")]
    Unparseable(String),
}

/// Configuration errors, fatal at construction time
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}
