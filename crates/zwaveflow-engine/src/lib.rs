/*!
 * zwaveflow Engine
 *
 * This crate turns the node and value records published by an OpenZWave
 * daemon into entities. A declarative schema table says which values make
 * up which kind of entity; the discovery session matches every incoming
 * value against it and announces entities once their required values are
 * present. Platform adapters then render those entities and send commands
 * back to the devices.
 */

#![warn(missing_docs)]

// Re-export core types
pub use zwaveflow_core::prelude;

pub mod dispatcher;
pub mod entity_values;
pub mod error;
pub mod matcher;
pub mod platforms;
pub mod schema;
pub mod services;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export main types for convenience
pub use dispatcher::{DiscoveryListener, DiscoverySession, SceneActivation};
pub use zwaveflow_devices::status::{DriverState, InstanceStatus};
pub use entity_values::{EntityState, EntityValues, Notice};
pub use error::{Error, Result};
pub use matcher::{matches_node, matches_value};
pub use platforms::{EntityStore, Platform, ZwaveEntity};
pub use schema::{DiscoverySchema, EntityKind, NodeFilter, SchemaId, SchemaRegistry, Slot, ValueFilter};
pub use services::{
    add_node, cancel_command, remove_failed_node, remove_node, replace_failed_node,
    set_config_parameter,
};

/// zwaveflow engine crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the engine
pub fn init() -> Result<()> {
    tracing::info!(
        "zwaveflow Engine {} initialized with {} discovery schemas",
        VERSION,
        SchemaRegistry::builtin().len()
    );
    Ok(())
}
