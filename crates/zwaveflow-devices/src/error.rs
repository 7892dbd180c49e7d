/*!
 * Error types for the devices crate.
 */
use thiserror::Error;

use zwaveflow_core::error::Error as CoreError;

/// Errors raised while decoding daemon messages or talking to the broker
#[derive(Error, Debug)]
pub enum DeviceError {
    /// A topic looked like a daemon topic but could not be parsed
    #[error("Invalid topic {0}")]
    InvalidTopic(String),

    /// A payload on a recognised topic could not be decoded
    #[error("Invalid payload on {topic}: {reason}")]
    InvalidPayload {
        /// Topic the payload arrived on
        topic: String,
        /// Decoder error message
        reason: String,
    },

    /// The broker connection is not available
    #[error("Not connected")]
    NotConnected,

    /// Communication error with the broker
    #[error("Communication error: {0}")]
    Communication(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Core error
    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}

/// Result type for device operations
pub type Result<T> = std::result::Result<T, DeviceError>;

impl DeviceError {
    /// Create an invalid payload error
    pub fn invalid_payload<T: AsRef<str>, R: ToString>(topic: T, reason: R) -> Self {
        DeviceError::InvalidPayload {
            topic: topic.as_ref().to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a communication error
    pub fn communication<S: ToString>(msg: S) -> Self {
        DeviceError::Communication(msg.to_string())
    }
}

impl From<serde_json::Error> for DeviceError {
    fn from(err: serde_json::Error) -> Self {
        DeviceError::Serialization(err.to_string())
    }
}
