//! Numeric and list sensors.

use std::sync::Arc;

use serde_json::{json, Map, Value as JsonValue};
use tracing::warn;

use zwaveflow_core::types::Value;
use zwaveflow_devices::command::CommandSender;
use zwaveflow_devices::command_class::CommandClass;
use zwaveflow_devices::node::NodeRecord;

use crate::entity_values::EntityValues;
use crate::platforms::{format_number, round_to, EntityBase, ZwaveEntity};

/// What a sensor measures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum SensorDeviceClass {
    Battery,
    Humidity,
    Illuminance,
    Power,
    Pressure,
    Temperature,
}

impl SensorDeviceClass {
    /// Device class name
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorDeviceClass::Battery => "battery",
            SensorDeviceClass::Humidity => "humidity",
            SensorDeviceClass::Illuminance => "illuminance",
            SensorDeviceClass::Power => "power",
            SensorDeviceClass::Pressure => "pressure",
            SensorDeviceClass::Temperature => "temperature",
        }
    }
}

/// Label fragments checked in order when the command class says nothing
const LABEL_CLASSES: [(&str, SensorDeviceClass); 7] = [
    ("Temperature", SensorDeviceClass::Temperature),
    ("Illuminance", SensorDeviceClass::Illuminance),
    ("Humidity", SensorDeviceClass::Humidity),
    ("Power", SensorDeviceClass::Power),
    ("Energy", SensorDeviceClass::Power),
    ("Electric", SensorDeviceClass::Power),
    ("Pressure", SensorDeviceClass::Pressure),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reading {
    Numeric,
    List,
}

/// A read-only sensor
#[derive(Debug)]
pub struct ZwaveSensor {
    base: EntityBase,
    reading: Reading,
}

impl ZwaveSensor {
    /// Create the adapter
    ///
    /// Returns `None` when the primary value is neither numeric nor a list.
    pub fn new(node: &NodeRecord, values: &EntityValues, sender: Arc<dyn CommandSender>) -> Option<Self> {
        let reading = match &values.primary().value {
            Value::Integer(_) | Value::Float(_) => Reading::Numeric,
            Value::List(_) => Reading::List,
            _ => {
                warn!("Sensor not implemented for value {}", values.primary().label);
                return None;
            }
        };
        Some(Self {
            base: EntityBase::new(node, values, sender),
            reading,
        })
    }

    /// Whether this sensor reports a list selection
    pub fn is_list(&self) -> bool {
        self.reading == Reading::List
    }

    /// Numeric reading rounded to two decimals
    pub fn numeric_value(&self) -> Option<f64> {
        self.base
            .primary()
            .value
            .as_float()
            .map(|value| round_to(value, 2))
    }

    /// Unit of measurement
    pub fn unit_of_measurement(&self) -> Option<String> {
        if self.is_list() {
            return None;
        }
        match self.base.primary().units.as_str() {
            "C" => Some("°C".to_string()),
            "F" => Some("°F".to_string()),
            "" => None,
            units => Some(units.to_string()),
        }
    }

    /// Device class derived from command class and label
    pub fn device_class(&self) -> Option<SensorDeviceClass> {
        let primary = self.base.primary();
        if primary.command_class == CommandClass::Battery {
            return Some(SensorDeviceClass::Battery);
        }
        if primary.command_class == CommandClass::Meter {
            return Some(SensorDeviceClass::Power);
        }
        LABEL_CLASSES
            .iter()
            .find(|(fragment, _)| primary.label.contains(fragment))
            .map(|(_, class)| *class)
    }
}

impl ZwaveEntity for ZwaveSensor {
    fn values(&self) -> &EntityValues {
        self.base.values()
    }

    fn name(&self) -> String {
        self.base.name()
    }

    fn state(&self) -> String {
        match self.reading {
            Reading::Numeric => self
                .numeric_value()
                .map(format_number)
                .unwrap_or_default(),
            Reading::List => self
                .base
                .primary()
                .value
                .selected_id()
                .map(|id| id.to_string())
                .unwrap_or_default(),
        }
    }

    fn update_values(&mut self, values: &EntityValues) {
        self.base.update(values);
    }

    fn enabled_by_default(&self) -> bool {
        if self.is_list() {
            return false;
        }
        !matches!(
            CommandClass::from_id(self.base.primary().command_class.id()),
            CommandClass::Basic | CommandClass::Indicator | CommandClass::Notification
        )
    }

    fn attributes(&self) -> Map<String, JsonValue> {
        let mut attributes = Map::new();
        attributes.insert("node_id".to_string(), json!(self.values().node_id()));
        if let Some(list) = self.base.primary().value.as_list() {
            attributes.insert("label".to_string(), json!(list.selected));
        }
        attributes
    }
}
