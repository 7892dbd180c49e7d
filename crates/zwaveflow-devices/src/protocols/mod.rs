/*!
 * Transports for reaching the Z-Wave daemon.
 */

#[cfg(feature = "mqtt")]
pub mod mqtt;

#[cfg(feature = "mqtt")]
pub use mqtt::{MqttCommandSender, MqttConnection};
