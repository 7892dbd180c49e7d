/*!
 * Z-Wave command classes.
 *
 * The daemon addresses command classes by their numeric id in topics; the
 * enum gives the ones the discovery table refers to a name and keeps every
 * other id as `Other`.
 */
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

macro_rules! command_classes {
    ($($(#[$doc:meta])* $variant:ident = $id:literal => $name:literal,)+) => {
        /// A Z-Wave command class
        #[derive(Debug, Clone, Copy, Eq, Serialize, Deserialize)]
        #[serde(from = "u8", into = "u8")]
        pub enum CommandClass {
            $($(#[$doc])* $variant,)+
            /// Any command class without a named variant
            Other(u8),
        }

        impl CommandClass {
            /// Numeric command class id
            pub fn id(self) -> u8 {
                match self {
                    $(CommandClass::$variant => $id,)+
                    CommandClass::Other(id) => id,
                }
            }

            /// Resolve a numeric id, falling back to `Other`
            pub fn from_id(id: u8) -> Self {
                match id {
                    $($id => CommandClass::$variant,)+
                    other => CommandClass::Other(other),
                }
            }

            /// Name as used by the daemon (`COMMAND_CLASS_...`)
            pub fn name(self) -> &'static str {
                match CommandClass::from_id(self.id()) {
                    $(CommandClass::$variant => $name,)+
                    CommandClass::Other(_) => "COMMAND_CLASS_UNKNOWN",
                }
            }
        }
    };
}

command_classes! {
    /// Basic
    Basic = 0x20 => "COMMAND_CLASS_BASIC",
    /// Binary switch
    SwitchBinary = 0x25 => "COMMAND_CLASS_SWITCH_BINARY",
    /// Multilevel switch
    SwitchMultilevel = 0x26 => "COMMAND_CLASS_SWITCH_MULTILEVEL",
    /// Scene activation
    SceneActivation = 0x2B => "COMMAND_CLASS_SCENE_ACTIVATION",
    /// Binary sensor
    SensorBinary = 0x30 => "COMMAND_CLASS_SENSOR_BINARY",
    /// Multilevel sensor
    SensorMultilevel = 0x31 => "COMMAND_CLASS_SENSOR_MULTILEVEL",
    /// Meter
    Meter = 0x32 => "COMMAND_CLASS_METER",
    /// Color switch
    SwitchColor = 0x33 => "COMMAND_CLASS_SWITCH_COLOR",
    /// Thermostat mode
    ThermostatMode = 0x40 => "COMMAND_CLASS_THERMOSTAT_MODE",
    /// Thermostat operating state
    ThermostatOperatingState = 0x42 => "COMMAND_CLASS_THERMOSTAT_OPERATING_STATE",
    /// Thermostat setpoint
    ThermostatSetpoint = 0x43 => "COMMAND_CLASS_THERMOSTAT_SETPOINT",
    /// Thermostat fan mode
    ThermostatFanMode = 0x44 => "COMMAND_CLASS_THERMOSTAT_FAN_MODE",
    /// Thermostat fan state
    ThermostatFanState = 0x45 => "COMMAND_CLASS_THERMOSTAT_FAN_STATE",
    /// Central scene
    CentralScene = 0x5B => "COMMAND_CLASS_CENTRAL_SCENE",
    /// Door lock
    DoorLock = 0x62 => "COMMAND_CLASS_DOOR_LOCK",
    /// Barrier operator
    BarrierOperator = 0x66 => "COMMAND_CLASS_BARRIER_OPERATOR",
    /// Configuration parameters
    Configuration = 0x70 => "COMMAND_CLASS_CONFIGURATION",
    /// Notification, formerly called alarm
    Notification = 0x71 => "COMMAND_CLASS_NOTIFICATION",
    /// Manufacturer specific
    ManufacturerSpecific = 0x72 => "COMMAND_CLASS_MANUFACTURER_SPECIFIC",
    /// Battery
    Battery = 0x80 => "COMMAND_CLASS_BATTERY",
    /// Wake up
    WakeUp = 0x84 => "COMMAND_CLASS_WAKE_UP",
    /// Version
    Version = 0x86 => "COMMAND_CLASS_VERSION",
    /// Indicator
    Indicator = 0x87 => "COMMAND_CLASS_INDICATOR",
    /// Manufacturer proprietary
    ManufacturerProprietary = 0x91 => "COMMAND_CLASS_MANUFACTURER_PROPRIETARY",
    /// Alarm sensor
    SensorAlarm = 0x9C => "COMMAND_CLASS_SENSOR_ALARM",
}

impl CommandClass {
    /// Alias kept for devices that still report the alarm command class
    pub const ALARM: CommandClass = CommandClass::Notification;

    /// Whether values of this class carry scene activations
    pub fn is_scene(self) -> bool {
        matches!(
            CommandClass::from_id(self.id()),
            CommandClass::SceneActivation | CommandClass::CentralScene
        )
    }
}

// `Other(0x25)` and `SwitchBinary` are the same class.
impl PartialEq for CommandClass {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Hash for CommandClass {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl From<u8> for CommandClass {
    fn from(id: u8) -> Self {
        CommandClass::from_id(id)
    }
}

impl From<CommandClass> for u8 {
    fn from(cc: CommandClass) -> Self {
        cc.id()
    }
}

impl fmt::Display for CommandClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:02X})", self.name(), self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_round_trip() {
        assert_eq!(CommandClass::from_id(0x25), CommandClass::SwitchBinary);
        assert_eq!(CommandClass::SwitchMultilevel.id(), 0x26);
        assert_eq!(CommandClass::from_id(0x5B), CommandClass::CentralScene);
        assert_eq!(CommandClass::from_id(0xEE), CommandClass::Other(0xEE));
    }

    #[test]
    fn test_other_equals_named() {
        assert_eq!(CommandClass::Other(0x70), CommandClass::Configuration);
        assert_eq!(CommandClass::Other(0x70).name(), "COMMAND_CLASS_CONFIGURATION");
        assert_eq!(CommandClass::ALARM, CommandClass::from_id(0x71));
    }

    #[test]
    fn test_scene_classes() {
        assert!(CommandClass::SceneActivation.is_scene());
        assert!(CommandClass::from_id(91).is_scene());
        assert!(!CommandClass::Basic.is_scene());
    }

    #[test]
    fn test_display_and_serde() {
        assert_eq!(
            CommandClass::Battery.to_string(),
            "COMMAND_CLASS_BATTERY (0x80)"
        );
        assert_eq!(serde_json::to_string(&CommandClass::Meter).unwrap(), "50");
        let cc: CommandClass = serde_json::from_str("43").unwrap();
        assert_eq!(cc, CommandClass::SceneActivation);
    }
}
