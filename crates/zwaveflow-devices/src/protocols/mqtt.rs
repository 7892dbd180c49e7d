/*!
 * MQTT transport for the Z-Wave daemon.
 *
 * Wraps a `rumqttc` client: incoming publishes are handed out one at a time
 * and value commands are queued with `try_publish` so callers never block.
 */
use std::time::Duration;

use bytes::Bytes;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use tracing::{debug, info, warn};

use zwaveflow_core::config::MqttConfig;
use zwaveflow_core::types::Value;

use crate::command::{command_topic, set_value_topic, CommandSender, ControllerCommand, SetValueCommand};
use crate::error::{DeviceError, Result};
use crate::value::ValueRecord;

/// Delay before polling again after a connection error
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// A connection to the broker carrying daemon traffic
pub struct MqttConnection {
    client: AsyncClient,
    eventloop: EventLoop,
    prefix: String,
    subscription: String,
}

impl MqttConnection {
    /// Create a connection from configuration
    ///
    /// Nothing is sent until [`MqttConnection::next_message`] is polled.
    pub fn new(config: &MqttConfig) -> Self {
        let client_id = format!("{}-{}", config.client_id, uuid::Uuid::new_v4());
        let mut options = MqttOptions::new(client_id.clone(), config.host.clone(), config.port);
        options.set_keep_alive(Duration::from_secs(config.keep_alive_secs));
        options.set_clean_session(true);

        let (client, eventloop) = AsyncClient::new(options, config.channel_capacity);
        debug!(
            "Created MQTT client {} for {}:{}",
            client_id, config.host, config.port
        );

        Self {
            client,
            eventloop,
            prefix: config.topic_prefix.clone(),
            subscription: format!("{}#", config.topic_prefix),
        }
    }

    /// A command sender publishing through this connection
    pub fn sender(&self) -> MqttCommandSender {
        MqttCommandSender {
            client: self.client.clone(),
            prefix: self.prefix.clone(),
        }
    }

    /// Wait for the next publish on the daemon topics
    ///
    /// Subscribes on every (re)connect and retries after connection errors.
    pub async fn next_message(&mut self) -> Result<(String, Bytes)> {
        loop {
            match self.eventloop.poll().await {
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    return Ok((publish.topic, publish.payload));
                }
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    info!("Connected to MQTT broker, subscribing to {}", self.subscription);
                    self.client
                        .try_subscribe(self.subscription.clone(), QoS::AtMostOnce)
                        .map_err(DeviceError::communication)?;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(
                        "MQTT connection error: {}, retrying in {:?}",
                        e, RECONNECT_DELAY
                    );
                    tokio::time::sleep(RECONNECT_DELAY).await;
                }
            }
        }
    }

    /// Disconnect from the broker
    pub async fn disconnect(&self) -> Result<()> {
        self.client
            .disconnect()
            .await
            .map_err(DeviceError::communication)
    }
}

/// Publishes value commands to the daemon
#[derive(Clone)]
pub struct MqttCommandSender {
    client: AsyncClient,
    prefix: String,
}

impl CommandSender for MqttCommandSender {
    fn send_value(&self, target: &ValueRecord, new_value: Value) -> Result<()> {
        let topic = set_value_topic(&self.prefix, target.ozw_instance);
        let payload = serde_json::to_vec(&SetValueCommand {
            value_id: target.value_id,
            value: new_value,
        })?;

        debug!(
            "Publishing to {} for value {} (payload size: {} bytes)",
            topic,
            target.value_id,
            payload.len()
        );
        self.client
            .try_publish(topic, QoS::AtLeastOnce, false, payload)
            .map_err(DeviceError::communication)
    }

    fn send_controller_command(&self, ozw_instance: u32, command: ControllerCommand) -> Result<()> {
        let topic = command_topic(&self.prefix, ozw_instance, command.as_str());
        let payload = serde_json::to_vec(&command.payload())?;

        debug!("Publishing {} to {}", command.as_str(), topic);
        self.client
            .try_publish(topic, QoS::AtLeastOnce, false, payload)
            .map_err(DeviceError::communication)
    }
}
