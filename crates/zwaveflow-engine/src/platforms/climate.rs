/*!
 * Thermostats.
 *
 * Two shapes exist. A single setpoint thermostat is anchored on its setpoint
 * and may carry a mode value. A multiple setpoint thermostat is anchored on
 * its mode value, and the mode that is currently selected decides which of
 * its setpoints are the targets.
 *
 * Device modes are folded into HVAC modes. Modes that fold onto an HVAC mode
 * already offered by the device become presets instead.
 */
use std::fmt;
use std::sync::Arc;

use serde_json::{json, Map, Value as JsonValue};

use zwaveflow_devices::command::CommandSender;
use zwaveflow_devices::command_class::CommandClass;
use zwaveflow_devices::node::NodeRecord;
use zwaveflow_devices::value::ValueRecord;

use crate::entity_values::EntityValues;
use crate::error::{Error, Result};
use crate::platforms::{round_to, EntityBase, ZwaveEntity};
use crate::schema::Slot;

/// Preset meaning "follow the HVAC mode"
pub const PRESET_NONE: &str = "none";

/// Device mode announcing away setpoints
const MODE_AWAY: i64 = 13;

/// Supported climate features
pub mod features {
    /// A single target temperature can be set
    pub const TARGET_TEMPERATURE: u32 = 1;
    /// A low/high target range can be set
    pub const TARGET_TEMPERATURE_RANGE: u32 = 2;
    /// Fan mode can be set
    pub const FAN_MODE: u32 = 8;
    /// Preset can be set
    pub const PRESET_MODE: u32 = 16;
}

/// Operation mode of a thermostat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum HvacMode {
    Off,
    Heat,
    Cool,
    HeatCool,
    Auto,
    Dry,
    FanOnly,
}

impl HvacMode {
    /// Fallback order when the selected device mode has no HVAC mode
    pub const PREFERENCE: [HvacMode; 7] = [
        HvacMode::HeatCool,
        HvacMode::Heat,
        HvacMode::Cool,
        HvacMode::FanOnly,
        HvacMode::Dry,
        HvacMode::Off,
        HvacMode::Auto,
    ];

    /// Mode name
    pub fn as_str(&self) -> &'static str {
        match self {
            HvacMode::Off => "off",
            HvacMode::Heat => "heat",
            HvacMode::Cool => "cool",
            HvacMode::HeatCool => "heat_cool",
            HvacMode::Auto => "auto",
            HvacMode::Dry => "dry",
            HvacMode::FanOnly => "fan_only",
        }
    }

    /// Parse a mode name
    pub fn from_str(name: &str) -> Option<Self> {
        match name {
            "off" => Some(HvacMode::Off),
            "heat" => Some(HvacMode::Heat),
            "cool" => Some(HvacMode::Cool),
            "heat_cool" => Some(HvacMode::HeatCool),
            "auto" => Some(HvacMode::Auto),
            "dry" => Some(HvacMode::Dry),
            "fan_only" => Some(HvacMode::FanOnly),
            _ => None,
        }
    }

    /// HVAC mode a device mode folds onto
    pub fn from_zwave(mode: i64) -> Option<Self> {
        match mode {
            0x00 => Some(HvacMode::Off),
            0x01 | 0x04 | 0x07 | 0x0B => Some(HvacMode::Heat),
            0x02 | 0x0C => Some(HvacMode::Cool),
            0x03 => Some(HvacMode::Auto),
            0x06 => Some(HvacMode::FanOnly),
            0x08 => Some(HvacMode::Dry),
            0x0A | 0x0D | 0x0F => Some(HvacMode::HeatCool),
            _ => None,
        }
    }

    /// Device mode that selects this HVAC mode
    pub fn to_zwave(self) -> i64 {
        match self {
            HvacMode::Off => 0x00,
            HvacMode::Heat => 0x01,
            HvacMode::Cool => 0x02,
            HvacMode::Auto => 0x03,
            HvacMode::FanOnly => 0x06,
            HvacMode::Dry => 0x08,
            HvacMode::HeatCool => 0x0A,
        }
    }
}

impl fmt::Display for HvacMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the thermostat is doing right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum HvacAction {
    Idle,
    Heating,
    Cooling,
    Fan,
    Off,
}

impl HvacAction {
    /// Action name
    pub fn as_str(&self) -> &'static str {
        match self {
            HvacAction::Idle => "idle",
            HvacAction::Heating => "heating",
            HvacAction::Cooling => "cooling",
            HvacAction::Fan => "fan",
            HvacAction::Off => "off",
        }
    }

    /// Map an operating state reported as text
    pub fn from_operating_state(state: &str) -> Option<Self> {
        match state.to_lowercase().as_str() {
            "idle" | "pending heat" | "pending cool" => Some(HvacAction::Idle),
            "heat" | "heating" => Some(HvacAction::Heating),
            "cool" | "cooling" => Some(HvacAction::Cooling),
            "fan only" | "vent / economiser" => Some(HvacAction::Fan),
            "off" => Some(HvacAction::Off),
            _ => None,
        }
    }
}

/// Setpoints that are targets while a device mode is selected
pub fn mode_setpoints(mode: i64) -> &'static [Slot] {
    match mode {
        1 | 4 => &[Slot::SetpointHeating],
        2 => &[Slot::SetpointCooling],
        3 => &[Slot::SetpointHeating, Slot::SetpointCooling],
        7 => &[Slot::SetpointFurnace],
        8 => &[Slot::SetpointDryAir],
        9 => &[Slot::SetpointMoistAir],
        10 => &[Slot::SetpointAutoChangeover],
        11 => &[Slot::SetpointEcoHeating],
        12 => &[Slot::SetpointEcoCooling],
        13 => &[Slot::SetpointAwayHeating, Slot::SetpointAwayCooling],
        14 => &[Slot::SetpointFullPower],
        _ => &[],
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    SingleSetpoint,
    MultipleSetpoint,
}

/// Arguments of a set temperature command
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SetTemperature {
    /// Target for thermostats with one active setpoint
    pub temperature: Option<f64>,
    /// Lower target for thermostats with two active setpoints
    pub target_low: Option<f64>,
    /// Upper target for thermostats with two active setpoints
    pub target_high: Option<f64>,
}

/// A thermostat
#[derive(Debug)]
pub struct ZwaveClimate {
    base: EntityBase,
    shape: Shape,
    hvac_modes: Vec<HvacMode>,
    presets: Vec<i64>,
    mode_labels: Vec<(i64, String)>,
    default_mode: Option<HvacMode>,
    zw_mode: Option<i64>,
    preset: Option<i64>,
}

impl ZwaveClimate {
    /// Create the adapter
    pub fn new(node: &NodeRecord, values: &EntityValues, sender: Arc<dyn CommandSender>) -> Self {
        let shape = if values.primary().command_class == CommandClass::ThermostatSetpoint {
            Shape::SingleSetpoint
        } else {
            Shape::MultipleSetpoint
        };
        let mut climate = Self {
            base: EntityBase::new(node, values, sender),
            shape,
            hvac_modes: Vec::new(),
            presets: Vec::new(),
            mode_labels: Vec::new(),
            default_mode: None,
            zw_mode: None,
            preset: None,
        };
        climate.refresh_modes();
        climate
    }

    fn mode_slot(&self) -> Slot {
        match self.shape {
            Shape::SingleSetpoint => Slot::Mode,
            Shape::MultipleSetpoint => Slot::Primary,
        }
    }

    fn mode_value(&self) -> Option<&ValueRecord> {
        self.base.get(self.mode_slot())
    }

    fn refresh_modes(&mut self) {
        let list = match self.mode_value().and_then(|mode| mode.value.as_list()) {
            Some(list) => list.clone(),
            None => return,
        };

        self.hvac_modes.clear();
        self.presets.clear();
        self.mode_labels.clear();
        for option in &list.options {
            match HvacMode::from_zwave(option.value) {
                Some(mode) if !self.hvac_modes.contains(&mode) => self.hvac_modes.push(mode),
                _ => self.presets.push(option.value),
            }
            self.mode_labels.push((option.value, option.label.clone()));
        }

        self.default_mode = HvacMode::PREFERENCE
            .iter()
            .copied()
            .find(|mode| self.hvac_modes.contains(mode));

        let selected = match list.selected_id {
            Some(selected) => selected,
            None => return,
        };
        if HvacMode::from_zwave(selected).is_some() {
            self.zw_mode = Some(selected);
            self.preset = None;
            return;
        }

        let label = self.mode_label(selected).unwrap_or_default().to_lowercase();
        let mode = if label.contains("heat") && self.hvac_modes.contains(&HvacMode::Heat) {
            Some(HvacMode::Heat)
        } else if label.contains("cool") && self.hvac_modes.contains(&HvacMode::Cool) {
            Some(HvacMode::Cool)
        } else {
            self.default_mode
        };
        self.zw_mode = mode.map(HvacMode::to_zwave);
        self.preset = Some(selected);
    }

    fn mode_label(&self, mode: i64) -> Option<&str> {
        self.mode_labels
            .iter()
            .find(|(value, _)| *value == mode)
            .map(|(_, label)| label.as_str())
    }

    /// Setpoint slots that are targets in the current mode
    ///
    /// Slots the device does not expose still count towards the shape of
    /// the target.
    pub fn current_setpoints(&self) -> Vec<Slot> {
        match self.shape {
            Shape::SingleSetpoint => vec![Slot::Primary],
            Shape::MultipleSetpoint => self
                .base
                .primary()
                .value
                .selected_id()
                .map(|mode| mode_setpoints(mode).to_vec())
                .unwrap_or_default(),
        }
    }

    fn setpoint(&self, slot: Slot) -> Option<f64> {
        self.base
            .get(slot)
            .and_then(|value| value.value.as_float())
            .map(|value| round_to(value, 1))
    }

    /// Current HVAC mode
    pub fn hvac_mode(&self) -> Option<HvacMode> {
        if self.mode_value().is_none() {
            return self.default_mode;
        }
        self.zw_mode.and_then(HvacMode::from_zwave)
    }

    /// HVAC modes offered by the device
    pub fn hvac_modes(&self) -> &[HvacMode] {
        if self.mode_value().is_none() {
            return &[];
        }
        &self.hvac_modes
    }

    /// Current preset label, `PRESET_NONE` when following the HVAC mode
    pub fn preset_mode(&self) -> String {
        match self.preset {
            Some(preset) if self.mode_value().is_some() => {
                self.mode_label(preset).unwrap_or(PRESET_NONE).to_string()
            }
            _ => PRESET_NONE.to_string(),
        }
    }

    /// Preset labels followed by `PRESET_NONE`
    pub fn preset_modes(&self) -> Vec<String> {
        if self.mode_value().is_none() {
            return Vec::new();
        }
        let mut labels: Vec<String> = self
            .presets
            .iter()
            .filter_map(|preset| self.mode_label(*preset))
            .map(str::to_string)
            .collect();
        labels.push(PRESET_NONE.to_string());
        labels
    }

    /// What the thermostat is doing
    pub fn hvac_action(&self) -> Option<HvacAction> {
        let state = self.base.get(Slot::OperatingState)?;
        let text = match state.value.as_list() {
            Some(list) => list.selected.clone()?,
            None => state.value.to_string(),
        };
        HvacAction::from_operating_state(&text)
    }

    /// Measured temperature
    pub fn current_temperature(&self) -> Option<f64> {
        self.base
            .get(Slot::Temperature)
            .and_then(|value| value.value.as_float())
    }

    /// Temperature unit
    pub fn temperature_unit(&self) -> &'static str {
        match self.base.get(Slot::Temperature).map(|value| value.units.as_str()) {
            Some("F") => "°F",
            _ => "°C",
        }
    }

    /// Target when one setpoint is active
    pub fn target_temperature(&self) -> Option<f64> {
        match self.current_setpoints().as_slice() {
            [slot] => self.setpoint(*slot),
            _ => None,
        }
    }

    /// Targets when two setpoints are active
    pub fn target_temperature_range(&self) -> (Option<f64>, Option<f64>) {
        match self.current_setpoints().as_slice() {
            [low, high] => (self.setpoint(*low), self.setpoint(*high)),
            _ => (None, None),
        }
    }

    /// Fan mode labels
    pub fn fan_modes(&self) -> Vec<String> {
        self.base
            .get(Slot::FanMode)
            .and_then(|value| value.value.as_list())
            .map(|list| list.options.iter().map(|option| option.label.clone()).collect())
            .unwrap_or_default()
    }

    /// Current fan mode label
    pub fn fan_mode(&self) -> Option<String> {
        let list = self.base.get(Slot::FanMode)?.value.as_list()?;
        list.label_for(list.selected_id?).map(str::to_string)
    }

    /// Bitmask of `features`
    pub fn supported_features(&self) -> u32 {
        let mut support = features::TARGET_TEMPERATURE;
        if self.hvac_modes.contains(&HvacMode::HeatCool)
            || self.presets.contains(&MODE_AWAY)
            || self.current_setpoints().len() > 1
        {
            support |= features::TARGET_TEMPERATURE_RANGE;
        }
        if self.base.values().is_bound(Slot::FanMode) {
            support |= features::FAN_MODE;
        }
        if !self.presets.is_empty() {
            support |= features::PRESET_MODE;
        }
        support
    }

    /// Send new targets to the active setpoints
    ///
    /// Targets that do not fit the shape of the current mode are ignored.
    pub fn set_temperature(&mut self, command: SetTemperature) -> Result<()> {
        match self.current_setpoints().as_slice() {
            [slot] => {
                if let Some(temperature) = command.temperature {
                    self.send_setpoint(*slot, temperature)?;
                }
            }
            [low, high] => {
                if let Some(target) = command.target_low {
                    self.send_setpoint(*low, target)?;
                }
                if let Some(target) = command.target_high {
                    self.send_setpoint(*high, target)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn send_setpoint(&self, slot: Slot, temperature: f64) -> Result<()> {
        if self.base.values().is_bound(slot) {
            self.base.send(slot, temperature)?;
        }
        Ok(())
    }

    /// Select a fan mode by label
    pub fn set_fan_mode(&mut self, fan_mode: &str) -> Result<()> {
        let id = match self.base.get(Slot::FanMode).and_then(|value| value.value.as_list()) {
            Some(list) => list
                .id_for(fan_mode)
                .ok_or_else(|| Error::invalid_selection(format!("unknown fan mode {}", fan_mode)))?,
            None => return Ok(()),
        };
        self.base.send(Slot::FanMode, id)
    }

    /// Select an HVAC mode
    pub fn set_hvac_mode(&mut self, mode: HvacMode) -> Result<()> {
        if self.mode_value().is_none() {
            return Ok(());
        }
        self.preset = None;
        self.base.send(self.mode_slot(), mode.to_zwave())
    }

    /// Select a preset by label, or `PRESET_NONE` to go back to the HVAC mode
    pub fn set_preset_mode(&mut self, preset: &str) -> Result<()> {
        if self.mode_value().is_none() {
            return Ok(());
        }
        let mode = if preset == PRESET_NONE {
            self.zw_mode
                .ok_or_else(|| Error::invalid_selection("no current mode to return to"))?
        } else {
            let wanted = preset.to_lowercase();
            self.mode_labels
                .iter()
                .find(|(_, label)| label.to_lowercase() == wanted)
                .map(|(value, _)| *value)
                .ok_or_else(|| Error::invalid_selection(format!("unknown preset {}", preset)))?
        };
        self.base.send(self.mode_slot(), mode)
    }
}

impl ZwaveEntity for ZwaveClimate {
    fn values(&self) -> &EntityValues {
        self.base.values()
    }

    fn name(&self) -> String {
        self.base.name()
    }

    fn state(&self) -> String {
        self.hvac_mode()
            .map(|mode| mode.as_str().to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }

    fn update_values(&mut self, values: &EntityValues) {
        self.base.update(values);
        self.refresh_modes();
    }

    fn attributes(&self) -> Map<String, JsonValue> {
        let mut attributes = Map::new();
        attributes.insert("node_id".to_string(), json!(self.values().node_id()));
        attributes.insert(
            "hvac_modes".to_string(),
            json!(self.hvac_modes().iter().map(HvacMode::as_str).collect::<Vec<_>>()),
        );
        attributes.insert("preset_mode".to_string(), json!(self.preset_mode()));
        attributes.insert("temperature_unit".to_string(), json!(self.temperature_unit()));
        if let Some(temperature) = self.current_temperature() {
            attributes.insert("current_temperature".to_string(), json!(temperature));
        }
        if let Some(target) = self.target_temperature() {
            attributes.insert("temperature".to_string(), json!(target));
        }
        if let (Some(low), Some(high)) = self.target_temperature_range() {
            attributes.insert("target_temp_low".to_string(), json!(low));
            attributes.insert("target_temp_high".to_string(), json!(high));
        }
        if let Some(action) = self.hvac_action() {
            attributes.insert("hvac_action".to_string(), json!(action.as_str()));
        }
        if let Some(fan_mode) = self.fan_mode() {
            attributes.insert("fan_mode".to_string(), json!(fan_mode));
        }
        if let Some(fan_action) = self.base.get(Slot::FanAction) {
            attributes.insert("fan_action".to_string(), json!(fan_action.value.to_string()));
        }
        attributes
    }
}
