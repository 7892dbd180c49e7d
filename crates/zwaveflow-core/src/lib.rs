/*!
 * zwaveflow core
 *
 * Shared building blocks for the zwaveflow crates: the value payload type,
 * configuration, logging and typed listener registries.
 */

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod event;
pub mod logging;
pub mod prelude;
pub mod types;

pub use error::{Error, Result};

/// Re-export of dependencies that are part of the public API
pub mod deps {
    pub use serde;
    pub use serde_json;
    pub use tracing;
}

/// zwaveflow core crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library initialization with the default log filter
pub fn init() -> Result<()> {
    logging::init()?;
    tracing::info!("zwaveflow core {} initialized", VERSION);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
