/*!
 * zwaveflow devices
 *
 * The Z-Wave side of zwaveflow: node and value records, the node registry,
 * decoding of daemon MQTT messages and publishing of value and controller
 * commands.
 */

#![warn(missing_docs)]

// Re-export core types
pub use zwaveflow_core::prelude;

pub mod command;
pub mod command_class;
pub mod device_class;
pub mod error;
pub mod message;
pub mod node;
pub mod protocols;
pub mod registry;
pub mod status;
pub mod value;

pub use command::{
    CommandSender, ControllerCommand, RecordingSender, SentCommand, SentControllerCommand,
    SetValueCommand,
};
pub use command_class::CommandClass;
pub use error::{DeviceError, Result};
pub use message::{OzwEvent, OzwMessageDecoder};
pub use node::NodeRecord;
pub use registry::{NodeRegistry, ValueStored};
pub use status::{DriverState, InstanceStatus};
pub use value::{ValueGenre, ValueId, ValueRecord, ValueType};

/// zwaveflow devices crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Information about available transports
pub fn available_protocols() -> Vec<&'static str> {
    let mut protocols = Vec::new();

    #[cfg(feature = "mqtt")]
    protocols.push("mqtt");

    protocols
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocols() {
        #[cfg(feature = "mqtt")]
        assert_eq!(available_protocols(), vec!["mqtt"]);
        assert!(!VERSION.is_empty());
    }
}
