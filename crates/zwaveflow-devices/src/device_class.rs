//! Generic and specific device class ids reported in node payloads.
//!
//! Specific classes are only meaningful together with their generic class,
//! so several specific constants share a number.

/// Generic device classes
pub mod generic {
    /// Generic controller
    pub const GENERIC_CONTROLLER: u8 = 0x01;
    /// Notification sensor
    pub const SENSOR_NOTIFICATION: u8 = 0x07;
    /// Thermostat
    pub const THERMOSTAT: u8 = 0x08;
    /// Repeater slave
    pub const REPEATER_SLAVE: u8 = 0x0F;
    /// Binary switch
    pub const SWITCH_BINARY: u8 = 0x10;
    /// Multilevel switch
    pub const SWITCH_MULTILEVEL: u8 = 0x11;
    /// Remote switch
    pub const SWITCH_REMOTE: u8 = 0x12;
    /// Wall controller
    pub const WALL_CONTROLLER: u8 = 0x18;
    /// Binary sensor
    pub const SENSOR_BINARY: u8 = 0x20;
    /// Multilevel sensor
    pub const SENSOR_MULTILEVEL: u8 = 0x21;
    /// Meter
    pub const METER: u8 = 0x31;
    /// Entry control
    pub const ENTRY_CONTROL: u8 = 0x40;
    /// Alarm sensor
    pub const SENSOR_ALARM: u8 = 0xA1;
}

/// Specific device classes
pub mod specific {
    /// No specific class
    pub const NOT_USED: u8 = 0x00;

    /// Heating thermostat
    pub const THERMOSTAT_HEATING: u8 = 0x01;
    /// General thermostat
    pub const THERMOSTAT_GENERAL: u8 = 0x02;
    /// Setpoint thermostat
    pub const SETPOINT_THERMOSTAT: u8 = 0x04;
    /// Setback thermostat
    pub const SETBACK_THERMOSTAT: u8 = 0x05;
    /// General thermostat, version 2
    pub const THERMOSTAT_GENERAL_V2: u8 = 0x06;

    /// Multilevel power switch
    pub const POWER_SWITCH_MULTILEVEL: u8 = 0x01;
    /// Multiposition motor
    pub const MOTOR_MULTIPOSITION: u8 = 0x03;
    /// Multilevel scene switch
    pub const SCENE_SWITCH_MULTILEVEL: u8 = 0x04;
    /// Class A motor control
    pub const CLASS_A_MOTOR_CONTROL: u8 = 0x05;
    /// Class B motor control
    pub const CLASS_B_MOTOR_CONTROL: u8 = 0x06;
    /// Class C motor control
    pub const CLASS_C_MOTOR_CONTROL: u8 = 0x07;
    /// Fan switch
    pub const FAN_SWITCH: u8 = 0x08;

    /// Door lock
    pub const DOOR_LOCK: u8 = 0x01;
    /// Advanced door lock
    pub const ADVANCED_DOOR_LOCK: u8 = 0x02;
    /// Secure keypad door lock
    pub const SECURE_KEYPAD_DOOR_LOCK: u8 = 0x03;
    /// Secure door
    pub const SECURE_DOOR: u8 = 0x05;
    /// Secure barrier add-on
    pub const SECURE_BARRIER_ADDON: u8 = 0x07;
    /// Secure lockbox
    pub const SECURE_LOCKBOX: u8 = 0x0A;
}
