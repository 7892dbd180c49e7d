/*!
 * Binary sensors.
 *
 * Plain sensor-binary values become a single on/off sensor. Notification
 * values are option lists holding one of several event states; every state
 * listed in `NOTIFICATION_SENSORS` for the value's notification type becomes
 * its own binary sensor that is on while that state is selected.
 */
use std::sync::Arc;

use serde_json::{json, Map, Value as JsonValue};
use tracing::warn;

use zwaveflow_devices::command::CommandSender;
use zwaveflow_devices::node::NodeRecord;
use zwaveflow_devices::value::{index, ValueType};

use crate::entity_values::EntityValues;
use crate::platforms::{EntityBase, Platform, ZwaveEntity};

/// Notification state that clears every other state of a type
pub const NOTIFICATION_VALUE_CLEAR: i64 = 0;

/// What a binary sensor detects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum BinarySensorDeviceClass {
    Door,
    Gas,
    Heat,
    Lock,
    Moisture,
    Motion,
    Power,
    Problem,
    Safety,
    Smoke,
    Sound,
}

impl BinarySensorDeviceClass {
    /// Device class name
    pub fn as_str(&self) -> &'static str {
        match self {
            BinarySensorDeviceClass::Door => "door",
            BinarySensorDeviceClass::Gas => "gas",
            BinarySensorDeviceClass::Heat => "heat",
            BinarySensorDeviceClass::Lock => "lock",
            BinarySensorDeviceClass::Moisture => "moisture",
            BinarySensorDeviceClass::Motion => "motion",
            BinarySensorDeviceClass::Power => "power",
            BinarySensorDeviceClass::Problem => "problem",
            BinarySensorDeviceClass::Safety => "safety",
            BinarySensorDeviceClass::Smoke => "smoke",
            BinarySensorDeviceClass::Sound => "sound",
        }
    }
}

/// Mapping of notification states to binary sensors
#[derive(Debug, Clone, Copy)]
pub struct NotificationSensor {
    /// Notification type, the index of the value
    pub notification_type: u16,
    /// States that each get a sensor
    pub states: &'static [i64],
    /// Device class of the sensors
    pub device_class: Option<BinarySensorDeviceClass>,
    /// Whether the sensors are enabled when first seen
    pub enabled: bool,
    /// State that turns the sensor off; `None` means any other state does
    pub off_value: Option<i64>,
}

const fn mapping(
    notification_type: u16,
    states: &'static [i64],
    device_class: Option<BinarySensorDeviceClass>,
) -> NotificationSensor {
    NotificationSensor {
        notification_type,
        states,
        device_class,
        enabled: true,
        off_value: Some(NOTIFICATION_VALUE_CLEAR),
    }
}

const fn hidden(mut sensor: NotificationSensor) -> NotificationSensor {
    sensor.enabled = false;
    sensor
}

const fn off_value(mut sensor: NotificationSensor, off_value: Option<i64>) -> NotificationSensor {
    sensor.off_value = off_value;
    sensor
}

use BinarySensorDeviceClass as Class;

/// Notification states rendered as binary sensors
pub const NOTIFICATION_SENSORS: &[NotificationSensor] = &[
    mapping(index::NOTIFICATION_SMOKE_ALARM, &[1, 2], Some(Class::Smoke)),
    hidden(mapping(index::NOTIFICATION_SMOKE_ALARM, &[3, 4, 5, 6, 7, 8], Some(Class::Smoke))),
    mapping(index::NOTIFICATION_CARBON_MONOXIDE, &[1, 2], Some(Class::Gas)),
    hidden(mapping(index::NOTIFICATION_CARBON_MONOXIDE, &[4, 5, 7], Some(Class::Gas))),
    mapping(index::NOTIFICATION_CARBON_DIOXIDE, &[1, 2], Some(Class::Gas)),
    hidden(mapping(index::NOTIFICATION_CARBON_DIOXIDE, &[4, 5, 7], Some(Class::Gas))),
    mapping(index::NOTIFICATION_HEAT, &[1, 2, 5, 6], Some(Class::Heat)),
    hidden(mapping(index::NOTIFICATION_HEAT, &[3, 4, 8, 10, 11], Some(Class::Heat))),
    mapping(index::NOTIFICATION_WATER, &[1, 2, 3, 4], Some(Class::Moisture)),
    hidden(mapping(index::NOTIFICATION_WATER, &[5], Some(Class::Moisture))),
    mapping(index::NOTIFICATION_ACCESS_CONTROL, &[1, 2, 3, 4], Some(Class::Lock)),
    off_value(
        mapping(index::NOTIFICATION_ACCESS_CONTROL, &[22], Some(Class::Door)),
        Some(23),
    ),
    mapping(index::NOTIFICATION_HOME_SECURITY, &[1, 2], Some(Class::Safety)),
    mapping(index::NOTIFICATION_HOME_SECURITY, &[3, 4, 9], Some(Class::Safety)),
    mapping(index::NOTIFICATION_HOME_SECURITY, &[5, 6], Some(Class::Safety)),
    mapping(index::NOTIFICATION_HOME_SECURITY, &[7, 8], Some(Class::Motion)),
    hidden(mapping(
        index::NOTIFICATION_POWER_MANAGEMENT,
        &[1, 2, 3, 4, 5, 6, 7, 8, 9],
        Some(Class::Power),
    )),
    // battery states replace each other
    off_value(
        hidden(mapping(
            index::NOTIFICATION_POWER_MANAGEMENT,
            &[10, 11, 12, 13, 14, 15],
            Some(Class::Power),
        )),
        None,
    ),
    hidden(mapping(index::NOTIFICATION_SYSTEM, &[1, 2, 6, 7], Some(Class::Problem))),
    mapping(index::NOTIFICATION_EMERGENCY, &[1, 2, 3], Some(Class::Problem)),
    hidden(mapping(index::NOTIFICATION_CLOCK, &[1, 2], None)),
    mapping(
        index::NOTIFICATION_APPLIANCE,
        &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21],
        None,
    ),
    mapping(index::NOTIFICATION_HOME_HEALTH, &[1, 2, 3, 4, 5], None),
    mapping(index::NOTIFICATION_SIREN, &[1], Some(Class::Sound)),
    mapping(index::NOTIFICATION_WATER_VALVE, &[3, 4], Some(Class::Problem)),
    mapping(index::NOTIFICATION_WEATHER, &[1, 2], Some(Class::Problem)),
    mapping(index::NOTIFICATION_IRRIGATION, &[1, 2, 3, 4, 5], None),
    mapping(index::NOTIFICATION_GAS, &[1, 2, 3, 4], Some(Class::Gas)),
    mapping(index::NOTIFICATION_GAS, &[6], Some(Class::Problem)),
];

/// Build the binary sensors for a materialized entity
pub(crate) fn build(node: &NodeRecord, values: &EntityValues, sender: Arc<dyn CommandSender>) -> Vec<Platform> {
    let primary = values.primary();
    match primary.value_type {
        ValueType::Bool => vec![Platform::BinarySensor(ZwaveBinarySensor::new(node, values, sender))],
        ValueType::List => {
            let options = match primary.value.as_list() {
                Some(list) => list.options.clone(),
                None => {
                    warn!("Notification value {} carries no option list", primary.value_id);
                    return Vec::new();
                }
            };
            let mut sensors = Vec::new();
            for option in &options {
                for mapping in NOTIFICATION_SENSORS {
                    if mapping.notification_type != primary.index || !mapping.states.contains(&option.value) {
                        continue;
                    }
                    sensors.push(Platform::NotificationSensor(ZwaveNotificationSensor::new(
                        node,
                        values,
                        Arc::clone(&sender),
                        option.value,
                        mapping,
                    )));
                }
            }
            sensors
        }
        _ => {
            warn!("Binary sensor not implemented for value {}", primary.label);
            Vec::new()
        }
    }
}

/// A plain on/off sensor
#[derive(Debug)]
pub struct ZwaveBinarySensor {
    base: EntityBase,
}

impl ZwaveBinarySensor {
    /// Create the adapter
    pub fn new(node: &NodeRecord, values: &EntityValues, sender: Arc<dyn CommandSender>) -> Self {
        Self {
            base: EntityBase::new(node, values, sender),
        }
    }

    /// Whether the sensor is on
    pub fn is_on(&self) -> bool {
        self.base.primary().value.as_bool().unwrap_or(false)
    }
}

impl ZwaveEntity for ZwaveBinarySensor {
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

    // superseded by notification sensors
    fn enabled_by_default(&self) -> bool {
        false
    }
}

/// One state of a notification value
#[derive(Debug)]
pub struct ZwaveNotificationSensor {
    base: EntityBase,
    on_value: i64,
    off_value: Option<i64>,
    device_class: Option<BinarySensorDeviceClass>,
    enabled: bool,
    state: bool,
}

impl ZwaveNotificationSensor {
    /// Create the sensor for notification state `on_value`
    pub fn new(
        node: &NodeRecord,
        values: &EntityValues,
        sender: Arc<dyn CommandSender>,
        on_value: i64,
        mapping: &NotificationSensor,
    ) -> Self {
        let mut sensor = Self {
            base: EntityBase::new(node, values, sender),
            on_value,
            off_value: mapping.off_value,
            device_class: mapping.device_class,
            enabled: mapping.enabled,
            state: false,
        };
        sensor.refresh_state();
        sensor
    }

    fn refresh_state(&mut self) {
        let selected = self.base.primary().value.selected_id();
        if selected == Some(self.on_value) {
            self.state = true;
        } else if self.off_value.is_some() && selected == self.off_value {
            self.state = false;
        } else if self.off_value.is_none() {
            self.state = false;
        }
    }

    /// Whether the watched state is active
    pub fn is_on(&self) -> bool {
        self.state
    }

    /// Notification state this sensor watches
    pub fn on_value(&self) -> i64 {
        self.on_value
    }

    /// Device class
    pub fn device_class(&self) -> Option<BinarySensorDeviceClass> {
        self.device_class
    }
}

impl ZwaveEntity for ZwaveNotificationSensor {
    fn values(&self) -> &EntityValues {
        self.base.values()
    }

    fn unique_id(&self) -> String {
        format!("{}.{}", self.base.values().unique_id(), self.on_value)
    }

    /// Base name followed by the state label, without its location suffix
    fn name(&self) -> String {
        let label = self
            .base
            .primary()
            .value
            .as_list()
            .and_then(|list| list.label_for(self.on_value))
            .unwrap_or_default();
        let label = label.split(" on ").next().unwrap_or_default();
        let label = label.split(" at ").next().unwrap_or_default();
        format!("{} - {}", self.base.name(), label)
    }

    fn state(&self) -> String {
        if self.state { "on" } else { "off" }.to_string()
    }

    fn update_values(&mut self, values: &EntityValues) {
        self.base.update(values);
        self.refresh_state();
    }

    fn enabled_by_default(&self) -> bool {
        self.enabled
    }

    fn attributes(&self) -> Map<String, JsonValue> {
        let mut attributes = Map::new();
        attributes.insert("node_id".to_string(), json!(self.values().node_id()));
        if let Some(class) = self.device_class {
            attributes.insert("device_class".to_string(), json!(class.as_str()));
        }
        attributes
    }
}
