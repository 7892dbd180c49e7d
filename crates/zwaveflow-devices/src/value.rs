/*!
 * Value records.
 *
 * A value is one attribute of a node (a switch level, a sensor reading, a
 * configuration parameter). Its identity is the daemon's `ValueIDKey`.
 */
use std::fmt;

use serde::{Deserialize, Serialize};

use zwaveflow_core::types::Value;

use crate::command_class::CommandClass;

/// Stable value identifier assigned by the daemon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValueId(pub u64);

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ValueId {
    fn from(id: u64) -> Self {
        ValueId(id)
    }
}

/// Value genre
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ValueGenre {
    /// Basic command class values
    Basic,
    /// Values meant for end users
    User,
    /// Device configuration parameters
    Config,
    /// Values used by the daemon itself
    System,
    /// Genre not reported or not recognised
    #[default]
    #[serde(other)]
    Unknown,
}

/// Value data type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ValueType {
    /// Boolean
    Bool,
    /// Unsigned byte
    Byte,
    /// Decimal number
    Decimal,
    /// 32-bit integer
    Int,
    /// Option list
    List,
    /// Schedule
    Schedule,
    /// 16-bit integer
    Short,
    /// Text
    String,
    /// Write-only momentary button
    Button,
    /// Raw bytes
    Raw,
    /// Bit set
    BitSet,
    /// Type not reported or not recognised
    #[default]
    #[serde(other)]
    Unknown,
}

/// Well-known value indices, per command class
pub mod index {
    /// Multilevel switch: current level
    pub const SWITCH_MULTILEVEL_LEVEL: u16 = 0;
    /// Multilevel switch: bright (open) button
    pub const SWITCH_MULTILEVEL_BRIGHT: u16 = 1;
    /// Multilevel switch: dim (close) button
    pub const SWITCH_MULTILEVEL_DIM: u16 = 2;
    /// Multilevel switch: dimming duration
    pub const SWITCH_MULTILEVEL_DURATION: u16 = 5;
    /// Multilevel switch: target level
    pub const SWITCH_MULTILEVEL_TARGET: u16 = 9;

    /// Color switch: color string
    pub const SWITCH_COLOR_COLOR: u16 = 0;
    /// Color switch: supported channels bitmask
    pub const SWITCH_COLOR_CHANNELS: u16 = 2;

    /// Door lock: locked state
    pub const DOOR_LOCK_LOCK: u16 = 0;
    /// Barrier operator: state label
    pub const BARRIER_OPERATOR_LABEL: u16 = 1;

    /// Alarm: type
    pub const ALARM_TYPE: u16 = 0;
    /// Alarm: level
    pub const ALARM_LEVEL: u16 = 1;
    /// Alarm: access control
    pub const ALARM_ACCESS_CONTROL: u16 = 9;

    /// Multilevel sensor: air temperature
    pub const SENSOR_MULTILEVEL_AIR_TEMPERATURE: u16 = 1;
    /// Multilevel sensor: power
    pub const SENSOR_MULTILEVEL_POWER: u16 = 4;
    /// Meter: power
    pub const METER_POWER: u16 = 8;

    /// Notification: smoke alarm
    pub const NOTIFICATION_SMOKE_ALARM: u16 = 1;
    /// Notification: carbon monoxide
    pub const NOTIFICATION_CARBON_MONOXIDE: u16 = 2;
    /// Notification: carbon dioxide
    pub const NOTIFICATION_CARBON_DIOXIDE: u16 = 3;
    /// Notification: heat
    pub const NOTIFICATION_HEAT: u16 = 4;
    /// Notification: water
    pub const NOTIFICATION_WATER: u16 = 5;
    /// Notification: access control
    pub const NOTIFICATION_ACCESS_CONTROL: u16 = 6;
    /// Notification: home security
    pub const NOTIFICATION_HOME_SECURITY: u16 = 7;
    /// Notification: power management
    pub const NOTIFICATION_POWER_MANAGEMENT: u16 = 8;
    /// Notification: system
    pub const NOTIFICATION_SYSTEM: u16 = 9;
    /// Notification: emergency
    pub const NOTIFICATION_EMERGENCY: u16 = 10;
    /// Notification: clock
    pub const NOTIFICATION_CLOCK: u16 = 11;
    /// Notification: appliance
    pub const NOTIFICATION_APPLIANCE: u16 = 12;
    /// Notification: home health
    pub const NOTIFICATION_HOME_HEALTH: u16 = 13;
    /// Notification: siren
    pub const NOTIFICATION_SIREN: u16 = 14;
    /// Notification: water valve
    pub const NOTIFICATION_WATER_VALVE: u16 = 15;
    /// Notification: weather
    pub const NOTIFICATION_WEATHER: u16 = 16;
    /// Notification: irrigation
    pub const NOTIFICATION_IRRIGATION: u16 = 17;
    /// Notification: gas
    pub const NOTIFICATION_GAS: u16 = 18;
}

/// One value reported by the daemon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueRecord {
    /// Daemon instance the value belongs to, used to address commands
    pub ozw_instance: u32,
    /// Owning node
    pub node_id: u8,
    /// Endpoint (multi-channel instance) within the node
    pub instance: u8,
    /// Command class the value belongs to
    pub command_class: CommandClass,
    /// Index within the command class
    pub index: u16,
    /// Genre
    pub genre: ValueGenre,
    /// Data type
    pub value_type: ValueType,
    /// Current payload
    pub value: Value,
    /// Stable identifier
    pub value_id: ValueId,
    /// Human readable label
    pub label: String,
    /// Units of measurement, possibly empty
    pub units: String,
    /// Whether the value cannot be written
    pub read_only: bool,
    /// Whether the value cannot be read
    pub write_only: bool,
    /// Help text
    pub help: String,
}

impl ValueRecord {
    /// Create a record with the identifying fields set and everything else empty
    pub fn new(node_id: u8, command_class: CommandClass, index: u16, value_id: ValueId) -> Self {
        Self {
            ozw_instance: 1,
            node_id,
            instance: 1,
            command_class,
            index,
            genre: ValueGenre::Unknown,
            value_type: ValueType::Unknown,
            value: Value::Null,
            value_id,
            label: String::new(),
            units: String::new(),
            read_only: false,
            write_only: false,
            help: String::new(),
        }
    }

    /// Set the endpoint instance
    pub fn with_instance(mut self, instance: u8) -> Self {
        self.instance = instance;
        self
    }

    /// Set the genre
    pub fn with_genre(mut self, genre: ValueGenre) -> Self {
        self.genre = genre;
        self
    }

    /// Set the data type
    pub fn with_type(mut self, value_type: ValueType) -> Self {
        self.value_type = value_type;
        self
    }

    /// Set the payload
    pub fn with_value<V: Into<Value>>(mut self, value: V) -> Self {
        self.value = value.into();
        self
    }

    /// Set the label
    pub fn with_label<S: Into<String>>(mut self, label: S) -> Self {
        self.label = label.into();
        self
    }

    /// Set the units
    pub fn with_units<S: Into<String>>(mut self, units: S) -> Self {
        self.units = units.into();
        self
    }
}

impl fmt::Display for ValueRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "node {} instance {} {} index {} ({}) = {}",
            self.node_id,
            self.instance,
            self.command_class.name(),
            self.index,
            self.label,
            self.value
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genre_and_type_names() {
        let genre: ValueGenre = serde_json::from_str("\"User\"").unwrap();
        assert_eq!(genre, ValueGenre::User);
        let genre: ValueGenre = serde_json::from_str("\"Invalid\"").unwrap();
        assert_eq!(genre, ValueGenre::Unknown);

        let value_type: ValueType = serde_json::from_str("\"BitSet\"").unwrap();
        assert_eq!(value_type, ValueType::BitSet);
        let value_type: ValueType = serde_json::from_str("\"Something\"").unwrap();
        assert_eq!(value_type, ValueType::Unknown);
    }

    #[test]
    fn test_builder() {
        let record = ValueRecord::new(7, CommandClass::SwitchBinary, 0, ValueId(42))
            .with_instance(2)
            .with_genre(ValueGenre::User)
            .with_type(ValueType::Bool)
            .with_value(true)
            .with_label("Switch");

        assert_eq!(record.instance, 2);
        assert_eq!(record.value, Value::Bool(true));
        assert_eq!(
            record.to_string(),
            "node 7 instance 2 COMMAND_CLASS_SWITCH_BINARY index 0 (Switch) = true"
        );
    }
}
