/*!
 * Prelude module for zwaveflow core.
 *
 * Re-exports the commonly used types of this crate.
 */

pub use crate::error::{Error, Result};

pub use crate::types::{ListOption, ListValue, Value};

pub use crate::event::{ListenerId, ListenerSet};

pub use crate::config::{Config, ConfigBuilder, DiscoveryConfig, MqttConfig, SharedConfig};

pub use tracing::{debug, error, info, trace, warn};
