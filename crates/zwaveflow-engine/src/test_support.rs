//! Fixtures shared by the unit tests of this crate.

use std::sync::{Arc, Mutex};

use zwaveflow_devices::command_class::CommandClass;
use zwaveflow_devices::device_class::{generic, specific};
use zwaveflow_devices::node::NodeRecord;
use zwaveflow_devices::status::InstanceStatus;
use zwaveflow_devices::value::{index, ValueGenre, ValueId, ValueRecord, ValueType};

use crate::dispatcher::{DiscoveryListener, DiscoverySession, SceneActivation};
use crate::entity_values::EntityValues;
use crate::schema::{EntityKind, Slot};

#[derive(Debug, Default)]
struct Recorded {
    materialized: Vec<(EntityKind, String)>,
    slots_added: Vec<(String, Slot)>,
    updated: Vec<(String, ValueId)>,
    scenes: Vec<SceneActivation>,
    statuses: Vec<InstanceStatus>,
}

/// Listener that remembers every notification; clones share the record
#[derive(Debug, Clone, Default)]
pub(crate) struct RecordingListener {
    recorded: Arc<Mutex<Recorded>>,
}

impl RecordingListener {
    pub(crate) fn materialized(&self) -> Vec<(EntityKind, String)> {
        self.recorded.lock().unwrap().materialized.clone()
    }

    pub(crate) fn slots_added(&self) -> Vec<(String, Slot)> {
        self.recorded.lock().unwrap().slots_added.clone()
    }

    pub(crate) fn updated(&self) -> Vec<(String, ValueId)> {
        self.recorded.lock().unwrap().updated.clone()
    }

    pub(crate) fn scenes(&self) -> Vec<SceneActivation> {
        self.recorded.lock().unwrap().scenes.clone()
    }

    pub(crate) fn statuses(&self) -> Vec<InstanceStatus> {
        self.recorded.lock().unwrap().statuses.clone()
    }
}

impl DiscoveryListener for RecordingListener {
    fn entity_materialized(&mut self, _node: &NodeRecord, entity: &EntityValues) {
        self.recorded
            .lock()
            .unwrap()
            .materialized
            .push((entity.kind(), entity.unique_id().to_string()));
    }

    fn slot_added(&mut self, entity: &EntityValues, slot: Slot) {
        self.recorded
            .lock()
            .unwrap()
            .slots_added
            .push((entity.unique_id().to_string(), slot));
    }

    fn value_updated(&mut self, entity: &EntityValues, value: &ValueRecord) {
        self.recorded
            .lock()
            .unwrap()
            .updated
            .push((entity.unique_id().to_string(), value.value_id));
    }

    fn scene_activated(&mut self, scene: &SceneActivation) {
        self.recorded.lock().unwrap().scenes.push(scene.clone());
    }

    fn instance_status_changed(&mut self, status: &InstanceStatus) {
        self.recorded.lock().unwrap().statuses.push(status.clone());
    }
}

/// A session over the built-in schemas with a recording listener attached
pub(crate) fn session_with_recorder() -> (DiscoverySession, RecordingListener) {
    let mut session = DiscoverySession::default();
    let recorder = RecordingListener::default();
    session.add_listener(Box::new(recorder.clone()));
    (session, recorder)
}

/// Feed a node and its values through a built-in session and return the
/// first ready entity of `kind`
pub(crate) fn materialize(
    node: NodeRecord,
    values: Vec<ValueRecord>,
    kind: EntityKind,
) -> (NodeRecord, EntityValues) {
    let node_id = node.node_id;
    let mut session = DiscoverySession::default();
    session.node_added(node.clone());
    for value in values {
        session.value_added(value);
    }
    let entity = session
        .entities(node_id)
        .iter()
        .find(|entity| entity.kind() == kind && entity.is_ready())
        .cloned()
        .unwrap_or_else(|| panic!("no ready {} on node {}", kind, node_id));
    (node, entity)
}

pub(crate) fn binary_sensor_node(node_id: u8) -> NodeRecord {
    NodeRecord::new(node_id, generic::SENSOR_BINARY, 1)
}

pub(crate) fn switch_node(node_id: u8) -> NodeRecord {
    NodeRecord::new(node_id, generic::SWITCH_BINARY, 1)
}

pub(crate) fn light_node(node_id: u8) -> NodeRecord {
    NodeRecord::new(node_id, generic::SWITCH_MULTILEVEL, specific::POWER_SWITCH_MULTILEVEL)
}

pub(crate) fn fan_node(node_id: u8) -> NodeRecord {
    NodeRecord::new(node_id, generic::SWITCH_MULTILEVEL, specific::FAN_SWITCH)
}

pub(crate) fn cover_node(node_id: u8) -> NodeRecord {
    NodeRecord::new(node_id, generic::SWITCH_MULTILEVEL, specific::CLASS_B_MOTOR_CONTROL)
}

pub(crate) fn lock_node(node_id: u8) -> NodeRecord {
    NodeRecord::new(node_id, generic::ENTRY_CONTROL, specific::DOOR_LOCK)
}

pub(crate) fn thermostat_node(node_id: u8) -> NodeRecord {
    NodeRecord::new(node_id, generic::THERMOSTAT, specific::THERMOSTAT_GENERAL_V2)
}

pub(crate) fn sensor_binary(node_id: u8, id: u64) -> ValueRecord {
    ValueRecord::new(node_id, CommandClass::SensorBinary, 0, ValueId(id))
        .with_genre(ValueGenre::User)
        .with_type(ValueType::Bool)
        .with_label("Sensor")
        .with_value(false)
}

pub(crate) fn switch_binary(node_id: u8, id: u64) -> ValueRecord {
    ValueRecord::new(node_id, CommandClass::SwitchBinary, 0, ValueId(id))
        .with_genre(ValueGenre::User)
        .with_type(ValueType::Bool)
        .with_label("Switch")
        .with_value(false)
}

pub(crate) fn multilevel_level(node_id: u8, id: u64, level: i64) -> ValueRecord {
    ValueRecord::new(
        node_id,
        CommandClass::SwitchMultilevel,
        index::SWITCH_MULTILEVEL_LEVEL,
        ValueId(id),
    )
    .with_genre(ValueGenre::User)
    .with_type(ValueType::Byte)
    .with_label("Level")
    .with_value(level)
}

pub(crate) fn meter_power(node_id: u8, id: u64, instance: u8) -> ValueRecord {
    ValueRecord::new(node_id, CommandClass::Meter, index::METER_POWER, ValueId(id))
        .with_instance(instance)
        .with_genre(ValueGenre::User)
        .with_type(ValueType::Decimal)
        .with_label("Power")
        .with_units("W")
        .with_value(0.0)
}

pub(crate) fn config_value(node_id: u8, parameter: u16, id: u64) -> ValueRecord {
    ValueRecord::new(node_id, CommandClass::Configuration, parameter, ValueId(id))
        .with_genre(ValueGenre::Config)
        .with_type(ValueType::Byte)
        .with_label("Parameter")
        .with_value(0)
}
