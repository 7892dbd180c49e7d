//! Multilevel fans with three speeds.

use std::fmt;
use std::sync::Arc;

use serde_json::{json, Map, Value as JsonValue};

use zwaveflow_devices::command::CommandSender;
use zwaveflow_devices::node::NodeRecord;

use crate::entity_values::EntityValues;
use crate::error::Result;
use crate::platforms::{EntityBase, ZwaveEntity};
use crate::schema::Slot;

/// Level that makes the device return to its previous level
const RESTORE_LEVEL: i64 = 255;

/// Fan speed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanSpeed {
    /// Stopped
    Off,
    /// Low speed
    Low,
    /// Medium speed
    Medium,
    /// High speed
    High,
}

impl FanSpeed {
    /// Every speed, slowest first
    pub const ALL: [FanSpeed; 4] = [FanSpeed::Off, FanSpeed::Low, FanSpeed::Medium, FanSpeed::High];

    /// Speed name
    pub fn as_str(&self) -> &'static str {
        match self {
            FanSpeed::Off => "off",
            FanSpeed::Low => "low",
            FanSpeed::Medium => "medium",
            FanSpeed::High => "high",
        }
    }

    /// Parse a speed name
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "off" => Some(FanSpeed::Off),
            "low" => Some(FanSpeed::Low),
            "medium" => Some(FanSpeed::Medium),
            "high" => Some(FanSpeed::High),
            _ => None,
        }
    }

    /// Speed for a 0..99 level
    pub fn from_level(level: i64) -> Self {
        match (level * 3 + 99) / 100 {
            i64::MIN..=0 => FanSpeed::Off,
            1 => FanSpeed::Low,
            2 => FanSpeed::Medium,
            _ => FanSpeed::High,
        }
    }

    /// Level sent to select this speed
    pub fn level(&self) -> i64 {
        match self {
            FanSpeed::Off => 0,
            FanSpeed::Low => 1,
            FanSpeed::Medium => 50,
            FanSpeed::High => 99,
        }
    }
}

impl fmt::Display for FanSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fan controlled through a multilevel switch
#[derive(Debug)]
pub struct ZwaveFan {
    base: EntityBase,
}

impl ZwaveFan {
    /// Create the adapter
    pub fn new(node: &NodeRecord, values: &EntityValues, sender: Arc<dyn CommandSender>) -> Self {
        Self {
            base: EntityBase::new(node, values, sender),
        }
    }

    fn level(&self) -> i64 {
        self.base.primary().value.as_integer().unwrap_or(0)
    }

    /// Whether the fan is running
    pub fn is_on(&self) -> bool {
        self.level() > 0
    }

    /// Current speed
    pub fn speed(&self) -> FanSpeed {
        FanSpeed::from_level(self.level())
    }

    /// Select a speed
    pub fn set_speed(&self, speed: FanSpeed) -> Result<()> {
        self.base.send(Slot::Primary, speed.level())
    }

    /// Turn on, at `speed` or at the previous level
    pub fn turn_on(&self, speed: Option<FanSpeed>) -> Result<()> {
        match speed {
            Some(speed) => self.set_speed(speed),
            None => self.base.send(Slot::Primary, RESTORE_LEVEL),
        }
    }

    /// Turn off
    pub fn turn_off(&self) -> Result<()> {
        self.base.send(Slot::Primary, 0i64)
    }
}

impl ZwaveEntity for ZwaveFan {
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

    fn attributes(&self) -> Map<String, JsonValue> {
        let mut attributes = Map::new();
        attributes.insert("node_id".to_string(), json!(self.values().node_id()));
        attributes.insert("speed".to_string(), json!(self.speed().as_str()));
        attributes
    }
}
