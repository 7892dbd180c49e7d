/*!
 * Outbound commands.
 *
 * Entities change device state by asking the daemon to set a value. The
 * request is fire-and-forget: the new state arrives later as a regular
 * "value changed" message. Controller commands (inclusion, exclusion and
 * failed node handling) travel the same way on their own topics.
 */
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use tracing::debug;

use zwaveflow_core::types::Value;

use crate::error::{DeviceError, Result};
use crate::value::{ValueId, ValueRecord};

/// JSON body of a `setvalue` command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetValueCommand {
    /// Target value
    #[serde(rename = "ValueIDKey")]
    pub value_id: ValueId,
    /// New payload
    #[serde(rename = "Value")]
    pub value: Value,
}

/// A command addressed to the controller of a daemon instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerCommand {
    /// Enter inclusion mode
    AddNode {
        /// Include the node with security
        secure: bool,
    },
    /// Enter exclusion mode
    RemoveNode,
    /// Remove a node the controller marked as failed
    RemoveFailedNode {
        /// The failed node
        node_id: u8,
    },
    /// Replace a failed node with a new device
    ReplaceFailedNode {
        /// The failed node
        node_id: u8,
    },
    /// Cancel the controller command in progress
    CancelCommand,
}

impl ControllerCommand {
    /// Name of the command in its topic
    pub fn as_str(&self) -> &'static str {
        match self {
            ControllerCommand::AddNode { .. } => "addnode",
            ControllerCommand::RemoveNode => "removenode",
            ControllerCommand::RemoveFailedNode { .. } => "removefailednode",
            ControllerCommand::ReplaceFailedNode { .. } => "replacefailednode",
            ControllerCommand::CancelCommand => "cancelcontrollercommand",
        }
    }

    /// JSON body of the command
    pub fn payload(&self) -> JsonValue {
        match self {
            ControllerCommand::AddNode { secure } => json!({ "secure": secure }),
            ControllerCommand::RemoveFailedNode { node_id }
            | ControllerCommand::ReplaceFailedNode { node_id } => json!({ "node": node_id }),
            ControllerCommand::RemoveNode | ControllerCommand::CancelCommand => json!({}),
        }
    }
}

/// Topic of command `name` on daemon instance `ozw_instance`
pub fn command_topic(prefix: &str, ozw_instance: u32, name: &str) -> String {
    format!("{}{}/command/{}/", prefix, ozw_instance, name)
}

/// Topic used to set values on daemon instance `ozw_instance`
pub fn set_value_topic(prefix: &str, ozw_instance: u32) -> String {
    command_topic(prefix, ozw_instance, "setvalue")
}

/// A sink for daemon commands
pub trait CommandSender: Send + Sync {
    /// Ask the daemon to set `target` to `new_value`
    fn send_value(&self, target: &ValueRecord, new_value: Value) -> Result<()>;

    /// Send a controller command to daemon instance `ozw_instance`
    fn send_controller_command(&self, ozw_instance: u32, command: ControllerCommand) -> Result<()>;
}

/// A command captured by [`RecordingSender`]
#[derive(Debug, Clone, PartialEq)]
pub struct SentCommand {
    /// Topic the command would be published on
    pub topic: String,
    /// Command body
    pub command: SetValueCommand,
}

/// A controller command captured by [`RecordingSender`]
#[derive(Debug, Clone, PartialEq)]
pub struct SentControllerCommand {
    /// Topic the command would be published on
    pub topic: String,
    /// The command
    pub command: ControllerCommand,
}

/// A sender that keeps commands in memory instead of publishing them
#[derive(Debug, Clone)]
pub struct RecordingSender {
    prefix: String,
    sent: Arc<Mutex<Vec<SentCommand>>>,
    controller: Arc<Mutex<Vec<SentControllerCommand>>>,
}

impl RecordingSender {
    /// Create a recorder using the default `OpenZWave/` prefix
    pub fn new() -> Self {
        Self::with_prefix("OpenZWave/")
    }

    /// Create a recorder for a custom topic prefix
    pub fn with_prefix<S: Into<String>>(prefix: S) -> Self {
        Self {
            prefix: prefix.into(),
            sent: Arc::new(Mutex::new(Vec::new())),
            controller: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// All commands recorded so far
    pub fn sent(&self) -> Vec<SentCommand> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }

    /// Payloads recorded so far, in order
    pub fn values(&self) -> Vec<Value> {
        self.sent()
            .into_iter()
            .map(|sent| sent.command.value)
            .collect()
    }

    /// Controller commands recorded so far
    pub fn controller_commands(&self) -> Vec<SentControllerCommand> {
        self.controller
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }

    /// Drop all recorded commands
    pub fn clear(&self) {
        if let Ok(mut sent) = self.sent.lock() {
            sent.clear();
        }
        if let Ok(mut sent) = self.controller.lock() {
            sent.clear();
        }
    }
}

impl Default for RecordingSender {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandSender for RecordingSender {
    fn send_value(&self, target: &ValueRecord, new_value: Value) -> Result<()> {
        let topic = set_value_topic(&self.prefix, target.ozw_instance);
        debug!("Recording {} for value {} on {}", new_value, target.value_id, topic);
        let mut sent = self
            .sent
            .lock()
            .map_err(|_| DeviceError::communication("command log poisoned"))?;
        sent.push(SentCommand {
            topic,
            command: SetValueCommand {
                value_id: target.value_id,
                value: new_value,
            },
        });
        Ok(())
    }

    fn send_controller_command(&self, ozw_instance: u32, command: ControllerCommand) -> Result<()> {
        let topic = command_topic(&self.prefix, ozw_instance, command.as_str());
        debug!("Recording {} on {}", command.payload(), topic);
        self.controller
            .lock()
            .map_err(|_| DeviceError::communication("command log poisoned"))?
            .push(SentControllerCommand { topic, command });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command_class::CommandClass;

    #[test]
    fn test_set_value_payload() {
        let command = SetValueCommand {
            value_id: ValueId(659128337),
            value: Value::Bool(true),
        };
        let json = serde_json::to_value(&command).unwrap();
        assert_eq!(json, serde_json::json!({"ValueIDKey": 659128337u64, "Value": true}));
    }

    #[test]
    fn test_recording_sender() -> Result<()> {
        let sender = RecordingSender::new();
        let target = ValueRecord::new(32, CommandClass::SwitchBinary, 0, ValueId(541671440));

        sender.send_value(&target, Value::Bool(false))?;
        sender.send_value(&target, Value::Integer(99))?;

        let sent = sender.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].topic, "OpenZWave/1/command/setvalue/");
        assert_eq!(sent[0].command.value_id, ValueId(541671440));
        assert_eq!(sender.values(), vec![Value::Bool(false), Value::Integer(99)]);

        sender.clear();
        assert!(sender.sent().is_empty());
        Ok(())
    }

    #[test]
    fn test_controller_commands() -> Result<()> {
        let sender = RecordingSender::with_prefix("zwave/");
        sender.send_controller_command(1, ControllerCommand::AddNode { secure: true })?;
        sender.send_controller_command(2, ControllerCommand::RemoveFailedNode { node_id: 12 })?;
        sender.send_controller_command(1, ControllerCommand::CancelCommand)?;

        let sent = sender.controller_commands();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[0].topic, "zwave/1/command/addnode/");
        assert_eq!(sent[1].topic, "zwave/2/command/removefailednode/");
        assert_eq!(sent[2].topic, "zwave/1/command/cancelcontrollercommand/");
        assert!(sender.sent().is_empty());

        assert_eq!(sent[0].command.payload(), json!({"secure": true}));
        assert_eq!(sent[1].command.payload(), json!({"node": 12}));
        assert_eq!(
            ControllerCommand::ReplaceFailedNode { node_id: 4 }.payload(),
            json!({"node": 4})
        );
        assert_eq!(ControllerCommand::RemoveNode.payload(), json!({}));

        sender.clear();
        assert!(sender.controller_commands().is_empty());
        Ok(())
    }
}
