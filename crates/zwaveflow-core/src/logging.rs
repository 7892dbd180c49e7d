/*!
 * Logging functionality for zwaveflow.
 *
 * This module provides tracing setup and the spans used around per-node and
 * per-entity work.
 */
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingConfig;
use crate::error::{Error, Result};

/// Initialize the logging system with default configuration
pub fn init() -> Result<()> {
    init_with_filter("info")
}

/// Initialize the logging system with a specific filter
///
/// `RUST_LOG` takes precedence over `filter` when it is set.
///
/// # Arguments
///
/// * `filter` - The log filter string (e.g., "info", "debug", "zwaveflow_engine=trace")
pub fn init_with_filter(filter: &str) -> Result<()> {
    install(filter, true)
}

/// Initialize the logging system from the logging section of the configuration
pub fn init_from_config(config: &LoggingConfig) -> Result<()> {
    install(&config.level, config.show_target)
}

fn install(filter: &str, show_target: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(show_target))
        .with(filter)
        .try_init()
        .map_err(|e| Error::logging(format!("Failed to initialize logging: {}", e)))?;

    Ok(())
}

/// A type alias for a tracing span
pub type Span = tracing::Span;

/// Create a span for work scoped to one Z-Wave node
pub fn node_span(node_id: u8) -> Span {
    tracing::debug_span!("node", node_id = node_id)
}

/// Create a span for work scoped to one entity
///
/// # Arguments
///
/// * `kind` - The entity kind (e.g. "light")
/// * `unique_id` - The entity's unique id
pub fn entity_span(kind: &str, unique_id: &str) -> Span {
    tracing::info_span!("entity", kind = %kind, unique_id = %unique_id)
}
