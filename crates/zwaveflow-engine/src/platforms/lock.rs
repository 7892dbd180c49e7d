//! Door locks.

use std::sync::Arc;

use serde_json::{json, Map, Value as JsonValue};

use zwaveflow_devices::command::CommandSender;
use zwaveflow_devices::node::NodeRecord;

use crate::entity_values::EntityValues;
use crate::error::Result;
use crate::platforms::{EntityBase, ZwaveEntity};
use crate::schema::Slot;

/// A door lock
#[derive(Debug)]
pub struct ZwaveLock {
    base: EntityBase,
}

impl ZwaveLock {
    /// Create the adapter
    pub fn new(node: &NodeRecord, values: &EntityValues, sender: Arc<dyn CommandSender>) -> Self {
        Self {
            base: EntityBase::new(node, values, sender),
        }
    }

    /// Whether the lock is locked
    pub fn is_locked(&self) -> bool {
        self.base.primary().value.as_bool().unwrap_or(false)
    }

    /// Lock
    pub fn lock(&self) -> Result<()> {
        self.base.send(Slot::Primary, true)
    }

    /// Unlock
    pub fn unlock(&self) -> Result<()> {
        self.base.send(Slot::Primary, false)
    }
}

impl ZwaveEntity for ZwaveLock {
    fn values(&self) -> &EntityValues {
        self.base.values()
    }

    fn name(&self) -> String {
        self.base.name()
    }

    fn state(&self) -> String {
        if self.is_locked() { "locked" } else { "unlocked" }.to_string()
    }

    fn update_values(&mut self, values: &EntityValues) {
        self.base.update(values);
    }

    fn attributes(&self) -> Map<String, JsonValue> {
        let mut attributes = Map::new();
        attributes.insert("node_id".to_string(), json!(self.values().node_id()));
        for (slot, key) in [
            (Slot::AlarmType, "alarm_type"),
            (Slot::AlarmLevel, "alarm_level"),
            (Slot::AccessControl, "access_control"),
        ] {
            if let Some(value) = self.base.get(slot) {
                attributes.insert(key.to_string(), json!(value.value.to_string()));
            }
        }
        attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::EntityKind;
    use crate::test_support::*;
    use zwaveflow_core::types::Value;
    use zwaveflow_devices::command::RecordingSender;
    use zwaveflow_devices::command_class::CommandClass;
    use zwaveflow_devices::value::{ValueId, ValueRecord, ValueType};

    #[test]
    fn test_lock() {
        let sender = RecordingSender::new();
        let locked = ValueRecord::new(12, CommandClass::DoorLock, 0, ValueId(120))
            .with_type(ValueType::Bool)
            .with_label("Locked")
            .with_value(true);
        let alarm_type = ValueRecord::new(12, CommandClass::ALARM, 0, ValueId(121)).with_value(21);
        let (node, values) = materialize(lock_node(12), vec![locked, alarm_type], EntityKind::Lock);
        let lock = ZwaveLock::new(&node, &values, Arc::new(sender.clone()));

        assert!(lock.is_locked());
        assert_eq!(lock.state(), "locked");
        assert_eq!(lock.attributes()["alarm_type"], json!("21"));
        assert!(lock.attributes().get("alarm_level").is_none());

        lock.unlock().unwrap();
        lock.lock().unwrap();
        assert_eq!(sender.values(), vec![Value::Bool(false), Value::Bool(true)]);
    }
}
