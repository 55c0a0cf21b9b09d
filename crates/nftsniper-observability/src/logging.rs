//! Structured logging driven by the `[logging]` config section

use nftsniper_core::LoggingConfig;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Environment override for `logging.format`
const ENV_FORMAT: &str = "LOG_FORMAT";

/// Environment override for `logging.level`
const ENV_LEVEL: &str = "LOG_LEVEL";

/// Log line rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable output
    Pretty,
    /// One JSON object per line, for aggregation
    Json,
    /// Dense single-line output
    Compact,
}

impl LogFormat {
    /// Map a config or environment string to a format. Unrecognized values
    /// fall back to `Pretty` rather than failing startup.
    fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            "compact" => LogFormat::Compact,
            _ => LogFormat::Pretty,
        }
    }
}

/// Map a config or environment string to a level, falling back to `INFO`
fn parse_level(value: &str) -> Level {
    value.parse().unwrap_or(Level::INFO)
}

fn env_or(key: &str, configured: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| configured.to_string())
}

/// Install the global subscriber from the logging config.
///
/// `LOG_FORMAT` and `LOG_LEVEL` override the configured values, and
/// `RUST_LOG` directives refine the filter further.
pub fn init_logging(config: &LoggingConfig) {
    let format = LogFormat::parse(&env_or(ENV_FORMAT, &config.format));
    let level = parse_level(&env_or(ENV_LEVEL, &config.level));
    init_subscriber(format, level);
}

/// Install the global subscriber with stock settings
pub fn init_default_logging() {
    init_logging(&LoggingConfig::default());
}

fn init_subscriber(format: LogFormat, level: Level) {
    // HTTP client internals stay at warn regardless of the default level
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy()
        .add_directive("hyper=warn".parse().unwrap())
        .add_directive("reqwest=warn".parse().unwrap());

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_span_events(FmtSpan::CLOSE))
            .init(),
        LogFormat::Compact => registry
            .with(fmt::layer().compact().with_target(false))
            .init(),
    }
}
