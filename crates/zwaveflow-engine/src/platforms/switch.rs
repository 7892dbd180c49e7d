//! On/off switches.

use std::sync::Arc;

use zwaveflow_devices::command::CommandSender;
use zwaveflow_devices::node::NodeRecord;

use crate::entity_values::EntityValues;
use crate::error::Result;
use crate::platforms::{EntityBase, ZwaveEntity};
use crate::schema::Slot;

/// A binary switch
#[derive(Debug)]
pub struct ZwaveSwitch {
    base: EntityBase,
}

impl ZwaveSwitch {
    /// Create the adapter
    pub fn new(node: &NodeRecord, values: &EntityValues, sender: Arc<dyn CommandSender>) -> Self {
        Self {
            base: EntityBase::new(node, values, sender),
        }
    }

    /// Whether the switch is on
    pub fn is_on(&self) -> bool {
        self.base.primary().value.as_bool().unwrap_or(false)
    }

    /// Current power draw, when a power value is bound
    pub fn current_power(&self) -> Option<f64> {
        self.base.get(Slot::Power).and_then(|value| value.value.as_float())
    }

    /// Turn the switch on
    pub fn turn_on(&self) -> Result<()> {
        self.base.send(Slot::Primary, true)
    }

    /// Turn the switch off
    pub fn turn_off(&self) -> Result<()> {
        self.base.send(Slot::Primary, false)
    }
}

impl ZwaveEntity for ZwaveSwitch {
    fn values(&self) -> &EntityValues {
        self.base.values()
    }

    fn name(&self) -> String {
        self.base.name()
    }

    fn state(&self) -> String {
        if self.is_on() { "on" } else { "off" }.to_string()
    }

    fn update_values(&mut self, values: &EntityValues) {
        self.base.update(values);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::EntityKind;
    use crate::test_support::*;
    use zwaveflow_core::types::Value;
    use zwaveflow_devices::command::RecordingSender;

    #[test]
    fn test_switch_commands() {
        let sender = RecordingSender::new();
        let (node, values) = materialize(
            switch_node(3),
            vec![switch_binary(3, 30), meter_power(3, 31, 1).with_value(4.5)],
            EntityKind::Switch,
        );
        let switch = ZwaveSwitch::new(&node, &values, Arc::new(sender.clone()));

        assert!(!switch.is_on());
        assert_eq!(switch.current_power(), Some(4.5));

        switch.turn_on().unwrap();
        switch.turn_off().unwrap();
        assert_eq!(sender.values(), vec![Value::Bool(true), Value::Bool(false)]);
        assert_eq!(sender.sent()[0].topic, "OpenZWave/1/command/setvalue/");
        assert_eq!(sender.sent()[0].command.value_id.0, 30);
    }
}
