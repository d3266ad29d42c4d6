//! Structured logging with tracing
//!
//! Centralized logging setup using the tracing ecosystem. The filter comes
//! from the `ARMATURE_LOG` environment variable when set, falling back to
//! the level passed in.

use tracing::{info, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::error::{ContainerError, Result};

/// Environment variable controlling the log filter
pub const LOG_FILTER_ENV: &str = "ARMATURE_LOG";

/// Initialize logging at the given default level
pub fn init_logging(level: &str) -> Result<()> {
    let parsed = parse_log_level(level)?;
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new(level));
    let stdout = fmt::layer().with_target(true);
    Registry::default().with(filter).with(stdout).init();
    info!("Logging initialized with level: {}", parsed);
    Ok(())
}

/// Parse a log level string to a tracing Level
pub fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" | "warning" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        other => Err(ContainerError::configuration(format!(
            "Invalid log level: {other}. Use trace, debug, info, warn, or error"
        ))),
    }
}
