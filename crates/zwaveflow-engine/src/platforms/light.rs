/*!
 * Dimmers and color lights.
 *
 * Brightness travels as a 0-99 level on the wire and as 0-255 on the entity.
 * Color bulbs expose a `#rrggbbwwcw` string whose trailing white channels are
 * present only when the channel mask announces them.
 */
use std::sync::Arc;

use serde_json::{json, Map, Value as JsonValue};
use tracing::{debug, warn};

use zwaveflow_devices::command::CommandSender;
use zwaveflow_devices::node::NodeRecord;

use crate::entity_values::EntityValues;
use crate::error::Result;
use crate::platforms::{EntityBase, ZwaveEntity};
use crate::schema::Slot;

/// Supported light features
pub mod features {
    /// Brightness can be set
    pub const BRIGHTNESS: u32 = 1;
    /// Color can be set
    pub const COLOR: u32 = 16;
    /// Transitions are honoured
    pub const TRANSITION: u32 = 32;
    /// White level can be set
    pub const WHITE_VALUE: u32 = 128;
}

/// Channel mask bits of the color capability value
pub mod channel {
    #[allow(missing_docs)]
    pub const WARM_WHITE: i64 = 0x01;
    #[allow(missing_docs)]
    pub const COLD_WHITE: i64 = 0x02;
    #[allow(missing_docs)]
    pub const RED: i64 = 0x04;
    #[allow(missing_docs)]
    pub const GREEN: i64 = 0x08;
    #[allow(missing_docs)]
    pub const BLUE: i64 = 0x10;
}

/// Level that restores the last brightness
const LEVEL_RESTORE: u8 = 255;
/// Duration byte meaning "device default"
const DURATION_DEFAULT: i64 = 255;
/// Longest transition that can be encoded, in seconds
const DURATION_MAX_SECS: f64 = 7620.0;
const DURATION_MAX: i64 = 254;

/// Scale 0-255 brightness to a 0-99 level, keeping any non-zero input on
pub fn byte_to_zwave_brightness(value: u8) -> u8 {
    if value == 0 {
        return 0;
    }
    let level = (f64::from(value) / 255.0 * 99.0) as u8;
    level.max(1)
}

/// Scale a 0-99 level to 0-255 brightness
pub fn zwave_to_byte_brightness(level: i64) -> u8 {
    (level.clamp(0, 99) as f64 / 99.0 * 255.0).round() as u8
}

/// Encode a transition in seconds as a duration byte
///
/// Up to 127 seconds encode as seconds, longer ones as minutes offset by
/// 128. `None` asks for the device default.
pub fn encode_duration(transition: Option<f64>) -> i64 {
    match transition {
        None => DURATION_DEFAULT,
        Some(secs) if secs <= 127.0 => secs.max(0.0) as i64,
        Some(secs) if secs > DURATION_MAX_SECS => {
            warn!("Transition of {}s exceeds the maximum of {}s", secs, DURATION_MAX_SECS);
            DURATION_MAX
        }
        Some(secs) => (secs / 60.0) as i64 + 128,
    }
}

/// Arguments of a turn on command
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LightTurnOn {
    /// Brightness 0-255
    pub brightness: Option<u8>,
    /// Red, green and blue 0-255
    pub rgb: Option<(u8, u8, u8)>,
    /// White level 0-255
    pub white: Option<u8>,
    /// Transition time in seconds
    pub transition: Option<f64>,
}

impl LightTurnOn {
    /// Turn on at a brightness
    pub fn brightness(brightness: u8) -> Self {
        Self {
            brightness: Some(brightness),
            ..Self::default()
        }
    }
}

/// A dimmable light, possibly with color
#[derive(Debug)]
pub struct ZwaveLight {
    base: EntityBase,
    supported_features: u32,
    rgb: Option<(u8, u8, u8)>,
    white: Option<u8>,
}

impl ZwaveLight {
    /// Create the adapter
    pub fn new(node: &NodeRecord, values: &EntityValues, sender: Arc<dyn CommandSender>) -> Self {
        let mut light = Self {
            base: EntityBase::new(node, values, sender),
            supported_features: 0,
            rgb: None,
            white: None,
        };
        light.refresh();
        light
    }

    fn level(&self) -> i64 {
        self.base.primary().value.as_integer().unwrap_or(0)
    }

    fn channels(&self) -> i64 {
        self.base
            .get(Slot::ColorChannels)
            .and_then(|value| value.value.as_integer())
            .unwrap_or(0)
    }

    fn refresh(&mut self) {
        let channels = self.channels();
        let mut features = features::BRIGHTNESS;
        if self.base.values().is_bound(Slot::DimmingDuration) {
            features |= features::TRANSITION;
        }
        if channels & (channel::WARM_WHITE | channel::COLD_WHITE) != 0 {
            features |= features::WHITE_VALUE;
        }
        if channels & (channel::RED | channel::GREEN | channel::BLUE) != 0 {
            features |= features::COLOR;
        }
        self.supported_features = features;

        let color = self
            .base
            .get(Slot::Color)
            .and_then(|value| value.value.as_str())
            .map(str::to_string);
        match color {
            Some(color) => {
                let (rgb, white) = parse_color(&color, channels);
                self.rgb = rgb;
                self.white = white;
            }
            None => {
                self.rgb = None;
                self.white = None;
            }
        }
    }

    /// Whether the light is on
    pub fn is_on(&self) -> bool {
        self.level() > 0
    }

    /// Brightness 0-255
    pub fn brightness(&self) -> u8 {
        zwave_to_byte_brightness(self.level())
    }

    /// Current color
    pub fn rgb(&self) -> Option<(u8, u8, u8)> {
        self.rgb
    }

    /// Current white level, warm white before cold white
    pub fn white(&self) -> Option<u8> {
        self.white
    }

    /// Bitmask of `features`
    pub fn supported_features(&self) -> u32 {
        self.supported_features
    }

    fn set_duration(&self, transition: Option<f64>) -> Result<()> {
        let duration = match self.base.get(Slot::DimmingDuration) {
            Some(duration) => duration,
            None => {
                if let Some(secs) = transition {
                    debug!(
                        "{} cannot honour a transition of {}s",
                        self.base.values().unique_id(),
                        secs
                    );
                }
                return Ok(());
            }
        };
        let encoded = encode_duration(transition);
        if duration.value.as_integer() == Some(encoded) {
            return Ok(());
        }
        self.base.send(Slot::DimmingDuration, encoded)
    }

    /// Turn the light on
    ///
    /// Color goes out first, then the transition, then the level.
    pub fn turn_on(&mut self, command: LightTurnOn) -> Result<()> {
        let mut white = command.white;
        if command.rgb.is_some() && white.is_none() {
            white = Some(0);
        }

        let wants_color = command.rgb.is_some() || white.map_or(false, |w| w > 0);
        if wants_color && self.base.values().is_bound(Slot::Color) {
            let (r, g, b) = command.rgb.unwrap_or((255, 255, 255));
            let mut color = format!("#{:02x}{:02x}{:02x}", r, g, b);
            match white {
                Some(white) => color.push_str(&format!("{:02x}00", white)),
                None => color.push_str("0000"),
            }
            self.base.send(Slot::Color, color)?;
        }

        self.set_duration(command.transition)?;

        let level = match command.brightness {
            Some(brightness) => byte_to_zwave_brightness(brightness),
            None => LEVEL_RESTORE,
        };
        self.base.send(Slot::Primary, level)
    }

    /// Turn the light off
    pub fn turn_off(&mut self, transition: Option<f64>) -> Result<()> {
        self.set_duration(transition)?;
        self.base.send(Slot::Primary, 0u8)
    }
}

/// Read rgb and white from a `#rrggbb[ww[cw]]` string
fn parse_color(color: &str, channels: i64) -> (Option<(u8, u8, u8)>, Option<u8>) {
    let byte_at = |start: usize| {
        color
            .get(start..start + 2)
            .and_then(|hex| u8::from_str_radix(hex, 16).ok())
    };

    let rgb = match (byte_at(1), byte_at(3), byte_at(5)) {
        (Some(r), Some(g), Some(b)) => Some((r, g, b)),
        _ => None,
    };

    let mut position = 7;
    let mut warm = None;
    let mut cold = None;
    if channels & channel::WARM_WHITE != 0 {
        warm = byte_at(position);
        position += 2;
    }
    if channels & channel::COLD_WHITE != 0 {
        cold = byte_at(position);
    }
    (rgb, warm.or(cold))
}

impl ZwaveEntity for ZwaveLight {
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
        self.refresh();
    }

    fn attributes(&self) -> Map<String, JsonValue> {
        let mut attributes = Map::new();
        attributes.insert("node_id".to_string(), json!(self.values().node_id()));
        attributes.insert("brightness".to_string(), json!(self.brightness()));
        attributes.insert(
            "supported_features".to_string(),
            json!(self.supported_features),
        );
        if let Some((r, g, b)) = self.rgb {
            attributes.insert("rgb_color".to_string(), json!([r, g, b]));
        }
        if let Some(white) = self.white {
            attributes.insert("white_value".to_string(), json!(white));
        }
        if let Some(power) = self.base.get(Slot::Power).and_then(|p| p.value.as_float()) {
            attributes.insert("current_power_w".to_string(), json!(power));
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
    use zwaveflow_devices::value::{index, ValueGenre, ValueId, ValueRecord, ValueType};

    fn duration(node: u8, value: i64) -> ValueRecord {
        ValueRecord::new(node, CommandClass::SwitchMultilevel, index::SWITCH_MULTILEVEL_DURATION, ValueId(901))
            .with_genre(ValueGenre::System)
            .with_type(ValueType::Byte)
            .with_value(value)
    }

    fn color(node: u8, hex: &str) -> ValueRecord {
        ValueRecord::new(node, CommandClass::SwitchColor, index::SWITCH_COLOR_COLOR, ValueId(902))
            .with_genre(ValueGenre::User)
            .with_type(ValueType::String)
            .with_value(hex)
    }

    fn channels(node: u8, mask: i64) -> ValueRecord {
        ValueRecord::new(node, CommandClass::SwitchColor, index::SWITCH_COLOR_CHANNELS, ValueId(903))
            .with_genre(ValueGenre::System)
            .with_type(ValueType::Int)
            .with_value(mask)
    }

    fn light(values: Vec<ValueRecord>) -> (ZwaveLight, RecordingSender) {
        let sender = RecordingSender::new();
        let (node, values) = materialize(light_node(20), values, EntityKind::Light);
        (ZwaveLight::new(&node, &values, Arc::new(sender.clone())), sender)
    }

    #[test]
    fn test_brightness_scaling() {
        assert_eq!(byte_to_zwave_brightness(0), 0);
        assert_eq!(byte_to_zwave_brightness(1), 1);
        assert_eq!(byte_to_zwave_brightness(128), 49);
        assert_eq!(byte_to_zwave_brightness(255), 99);
        assert_eq!(zwave_to_byte_brightness(99), 255);
        assert_eq!(zwave_to_byte_brightness(0), 0);
    }

    #[test]
    fn test_duration_encoding() {
        assert_eq!(encode_duration(None), 255);
        assert_eq!(encode_duration(Some(10.0)), 10);
        assert_eq!(encode_duration(Some(127.0)), 127);
        assert_eq!(encode_duration(Some(180.0)), 131);
        assert_eq!(encode_duration(Some(8000.0)), 254);
    }

    #[test]
    fn test_dimmer() {
        let (mut light, sender) = light(vec![multilevel_level(20, 200, 99)]);
        assert!(light.is_on());
        assert_eq!(light.brightness(), 255);
        assert_eq!(light.supported_features(), features::BRIGHTNESS);

        light.turn_on(LightTurnOn::default()).unwrap();
        light.turn_on(LightTurnOn::brightness(128)).unwrap();
        // no duration slot, transition is ignored
        light.turn_off(Some(5.0)).unwrap();
        assert_eq!(
            sender.values(),
            vec![Value::from(255u8), Value::from(49u8), Value::from(0u8)]
        );
    }

    #[test]
    fn test_transition_sent_only_when_changed() {
        let (mut light, sender) = light(vec![multilevel_level(20, 200, 0), duration(20, 10)]);
        assert_eq!(
            light.supported_features(),
            features::BRIGHTNESS | features::TRANSITION
        );

        light
            .turn_on(LightTurnOn {
                brightness: Some(255),
                transition: Some(10.0),
                ..LightTurnOn::default()
            })
            .unwrap();
        assert_eq!(sender.values(), vec![Value::from(99u8)]);

        sender.clear();
        light.turn_off(Some(180.0)).unwrap();
        assert_eq!(sender.values(), vec![Value::from(131i64), Value::from(0u8)]);
        assert_eq!(sender.sent()[0].command.value_id, ValueId(901));
    }

    #[test]
    fn test_color_is_read_and_written() {
        let (mut light, sender) = light(vec![
            multilevel_level(20, 200, 50),
            color(20, "#ff8000c8"),
            channels(20, 0x1d),
        ]);
        assert_eq!(
            light.supported_features(),
            features::BRIGHTNESS | features::COLOR | features::WHITE_VALUE
        );
        assert_eq!(light.rgb(), Some((255, 128, 0)));
        assert_eq!(light.white(), Some(200));

        light
            .turn_on(LightTurnOn {
                rgb: Some((0, 0, 255)),
                ..LightTurnOn::default()
            })
            .unwrap();
        assert_eq!(
            sender.values(),
            vec![Value::from("#0000ff0000"), Value::from(255u8)]
        );

        sender.clear();
        light
            .turn_on(LightTurnOn {
                white: Some(16),
                ..LightTurnOn::default()
            })
            .unwrap();
        assert_eq!(sender.values()[0], Value::from("#ffffff1000"));
    }

    #[test]
    fn test_cold_white_only() {
        let (light, _) = light(vec![
            multilevel_level(20, 200, 50),
            color(20, "#000000ff"),
            channels(20, 0x02),
        ]);
        assert_eq!(light.white(), Some(255));
        assert_eq!(light.supported_features(), features::BRIGHTNESS | features::WHITE_VALUE);
    }
}
