/*!
 * Error types for the zwaveflow engine crate.
 */
use thiserror::Error;

/// Error type for engine operations
#[derive(Error, Debug)]
pub enum Error {
    /// The node is not known to the session
    #[error("Unknown node {0}")]
    UnknownNode(u8),

    /// The node has no configuration value with this index
    #[error("Unknown config parameter {parameter} on node {node_id}")]
    UnknownConfigParameter {
        /// Node the parameter was looked up on
        node_id: u8,
        /// Parameter index
        parameter: u16,
    },

    /// A service or command argument could not be used
    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    /// The entity cannot perform the requested command
    #[error("Unsupported command: {0}")]
    UnsupportedCommand(String),

    /// Device error
    #[error("Device error: {0}")]
    Device(#[from] zwaveflow_devices::DeviceError),

    /// Core error
    #[error("Core error: {0}")]
    Core(#[from] zwaveflow_core::error::Error),
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a new invalid selection error
    pub fn invalid_selection<S: AsRef<str>>(msg: S) -> Self {
        Error::InvalidSelection(msg.as_ref().to_string())
    }

    /// Create a new unsupported command error
    pub fn unsupported<S: AsRef<str>>(msg: S) -> Self {
        Error::UnsupportedCommand(msg.as_ref().to_string())
    }
}
