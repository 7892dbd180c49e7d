/*!
 * Discovery schemas.
 *
 * A schema describes one kind of entity: which nodes may carry it, the value
 * that anchors it (the primary slot) and the auxiliary values it picks up
 * from the same node and endpoint. The registry is an ordered, immutable
 * table evaluated in declaration order.
 */
use std::fmt;

use serde::{Deserialize, Serialize};

use zwaveflow_devices::command_class::CommandClass;
use zwaveflow_devices::device_class::{generic, specific};
use zwaveflow_devices::value::{index, ValueGenre, ValueType};

/// Platform an entity is rendered on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// On/off sensor
    BinarySensor,
    /// Thermostat
    Climate,
    /// Shutter, garage door or barrier
    Cover,
    /// Fan
    Fan,
    /// Dimmer or color light
    Light,
    /// Door lock
    Lock,
    /// Numeric or list sensor
    Sensor,
    /// On/off switch
    Switch,
}

impl EntityKind {
    /// Platform name
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::BinarySensor => "binary_sensor",
            EntityKind::Climate => "climate",
            EntityKind::Cover => "cover",
            EntityKind::Fan => "fan",
            EntityKind::Light => "light",
            EntityKind::Lock => "lock",
            EntityKind::Sensor => "sensor",
            EntityKind::Switch => "switch",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named position of a value inside an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum Slot {
    /// The value that anchors the entity
    Primary,
    OffDelay,
    Temperature,
    Mode,
    FanMode,
    OperatingState,
    FanAction,
    SetpointHeating,
    SetpointCooling,
    SetpointFurnace,
    SetpointDryAir,
    SetpointMoistAir,
    SetpointAutoChangeover,
    SetpointEcoHeating,
    SetpointEcoCooling,
    SetpointAwayHeating,
    SetpointAwayCooling,
    SetpointFullPower,
    SwingMode,
    Open,
    Close,
    SlatPosition,
    TiltPosition,
    DimmingDuration,
    Color,
    ColorChannels,
    AccessControl,
    AlarmType,
    AlarmLevel,
    AdvancedLockConfig,
    Power,
}

impl Slot {
    /// Slot name as used in logs
    pub fn as_str(self) -> &'static str {
        match self {
            Slot::Primary => "primary",
            Slot::OffDelay => "off_delay",
            Slot::Temperature => "temperature",
            Slot::Mode => "mode",
            Slot::FanMode => "fan_mode",
            Slot::OperatingState => "operating_state",
            Slot::FanAction => "fan_action",
            Slot::SetpointHeating => "setpoint_heating",
            Slot::SetpointCooling => "setpoint_cooling",
            Slot::SetpointFurnace => "setpoint_furnace",
            Slot::SetpointDryAir => "setpoint_dry_air",
            Slot::SetpointMoistAir => "setpoint_moist_air",
            Slot::SetpointAutoChangeover => "setpoint_auto_changeover",
            Slot::SetpointEcoHeating => "setpoint_eco_heating",
            Slot::SetpointEcoCooling => "setpoint_eco_cooling",
            Slot::SetpointAwayHeating => "setpoint_away_heating",
            Slot::SetpointAwayCooling => "setpoint_away_cooling",
            Slot::SetpointFullPower => "setpoint_full_power",
            Slot::SwingMode => "swing_mode",
            Slot::Open => "open",
            Slot::Close => "close",
            Slot::SlatPosition => "slat_position",
            Slot::TiltPosition => "tilt_position",
            Slot::DimmingDuration => "dimming_duration",
            Slot::Color => "color",
            Slot::ColorChannels => "color_channels",
            Slot::AccessControl => "access_control",
            Slot::AlarmType => "alarm_type",
            Slot::AlarmLevel => "alarm_level",
            Slot::AdvancedLockConfig => "advanced_lock_config",
            Slot::Power => "power",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Predicate over value records
///
/// Every dimension left as `None` is not checked. Alternatives, when
/// declared, must have at least one member that matches as well.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueFilter {
    /// Allowed command classes
    pub command_classes: Option<Vec<CommandClass>>,
    /// Allowed value types
    pub value_types: Option<Vec<ValueType>>,
    /// Allowed genres
    pub genres: Option<Vec<ValueGenre>>,
    /// Allowed indices
    pub indices: Option<Vec<u16>>,
    /// Allowed endpoint instances
    pub instances: Option<Vec<u8>>,
    /// Nested alternatives, OR-ed together
    pub any_of: Option<Vec<ValueFilter>>,
    /// Whether an entity may become ready without this slot
    pub optional: bool,
}

impl ValueFilter {
    /// A filter that accepts every value
    pub fn any() -> Self {
        Self::default()
    }

    /// Accept values of one command class
    pub fn command_class(command_class: CommandClass) -> Self {
        Self::command_classes([command_class])
    }

    /// Accept values of several command classes
    pub fn command_classes<I: IntoIterator<Item = CommandClass>>(command_classes: I) -> Self {
        Self {
            command_classes: Some(command_classes.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Restrict to one value type
    pub fn value_type(self, value_type: ValueType) -> Self {
        self.value_types([value_type])
    }

    /// Restrict to several value types
    pub fn value_types<I: IntoIterator<Item = ValueType>>(mut self, value_types: I) -> Self {
        self.value_types = Some(value_types.into_iter().collect());
        self
    }

    /// Restrict to one genre
    pub fn genre(mut self, genre: ValueGenre) -> Self {
        self.genres = Some(vec![genre]);
        self
    }

    /// Restrict to one index
    pub fn index(mut self, index: u16) -> Self {
        self.indices = Some(vec![index]);
        self
    }

    /// Restrict to endpoint instances
    pub fn instances<I: IntoIterator<Item = u8>>(mut self, instances: I) -> Self {
        self.instances = Some(instances.into_iter().collect());
        self
    }

    /// Require at least one of the given alternatives to match
    pub fn any_of<I: IntoIterator<Item = ValueFilter>>(mut self, alternatives: I) -> Self {
        self.any_of = Some(alternatives.into_iter().collect());
        self
    }

    /// Mark the slot as optional
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Restrict this filter and every nested alternative to one instance
    pub(crate) fn scope_to_instance(&mut self, instance: u8) {
        self.instances = Some(vec![instance]);
        if let Some(alternatives) = self.any_of.as_mut() {
            for alternative in alternatives {
                alternative.scope_to_instance(instance);
            }
        }
    }
}

/// Predicate over nodes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeFilter {
    /// Allowed node ids
    pub node_ids: Option<Vec<u8>>,
    /// Allowed generic device classes
    pub generic: Option<Vec<u8>>,
    /// Allowed specific device classes
    pub specific: Option<Vec<u8>>,
}

impl NodeFilter {
    /// A filter that accepts every node
    pub fn any() -> Self {
        Self::default()
    }

    /// Restrict to generic device classes
    pub fn generic<I: IntoIterator<Item = u8>>(mut self, classes: I) -> Self {
        self.generic = Some(classes.into_iter().collect());
        self
    }

    /// Restrict to specific device classes
    pub fn specific<I: IntoIterator<Item = u8>>(mut self, classes: I) -> Self {
        self.specific = Some(classes.into_iter().collect());
        self
    }

    /// Restrict to node ids
    pub fn node_ids<I: IntoIterator<Item = u8>>(mut self, node_ids: I) -> Self {
        self.node_ids = Some(node_ids.into_iter().collect());
        self
    }
}

/// Position of a schema in its registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaId(pub usize);

impl fmt::Display for SchemaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Declarative description of one entity kind
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoverySchema {
    name: &'static str,
    kind: EntityKind,
    node_filter: NodeFilter,
    primary: ValueFilter,
    slots: Vec<(Slot, ValueFilter)>,
}

impl DiscoverySchema {
    /// Create a schema with its primary slot
    pub fn new(name: &'static str, kind: EntityKind, primary: ValueFilter) -> Self {
        Self {
            name,
            kind,
            node_filter: NodeFilter::any(),
            primary,
            slots: Vec::new(),
        }
    }

    /// Set the node filter
    pub fn with_nodes(mut self, node_filter: NodeFilter) -> Self {
        self.node_filter = node_filter;
        self
    }

    /// Add or replace an auxiliary slot
    ///
    /// `Slot::Primary` replaces the primary filter.
    pub fn with_slot(mut self, slot: Slot, filter: ValueFilter) -> Self {
        if slot == Slot::Primary {
            self.primary = filter;
            return self;
        }
        match self.slots.iter_mut().find(|(existing, _)| *existing == slot) {
            Some((_, existing)) => *existing = filter,
            None => self.slots.push((slot, filter)),
        }
        self
    }

    /// Descriptive name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Entity kind produced by this schema
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Node filter
    pub fn node_filter(&self) -> &NodeFilter {
        &self.node_filter
    }

    /// Primary slot filter
    pub fn primary(&self) -> &ValueFilter {
        &self.primary
    }

    /// Auxiliary slots in declaration order
    pub fn slots(&self) -> &[(Slot, ValueFilter)] {
        &self.slots
    }
}

/// Ordered table of discovery schemas
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    schemas: Vec<DiscoverySchema>,
}

impl SchemaRegistry {
    /// Create a registry from a list of schemas
    pub fn new(schemas: Vec<DiscoverySchema>) -> Self {
        Self { schemas }
    }

    /// The schemas in evaluation order
    pub fn schemas(&self) -> &[DiscoverySchema] {
        &self.schemas
    }

    /// Get a schema by id
    pub fn get(&self, id: SchemaId) -> Option<&DiscoverySchema> {
        self.schemas.get(id.0)
    }

    /// Iterate schemas together with their ids
    pub fn iter(&self) -> impl Iterator<Item = (SchemaId, &DiscoverySchema)> + '_ {
        self.schemas
            .iter()
            .enumerate()
            .map(|(position, schema)| (SchemaId(position), schema))
    }

    /// Number of schemas
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// The built-in schema table
    pub fn builtin() -> Self {
        Self::new(builtin_schemas())
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn setpoint(setpoint_index: u16) -> ValueFilter {
    ValueFilter::command_class(CommandClass::ThermostatSetpoint)
        .index(setpoint_index)
        .optional()
}

fn power_meter() -> ValueFilter {
    ValueFilter::command_classes([CommandClass::SensorMultilevel, CommandClass::Meter])
        .any_of([
            ValueFilter::command_class(CommandClass::SensorMultilevel)
                .index(index::SENSOR_MULTILEVEL_POWER),
            ValueFilter::command_class(CommandClass::Meter).index(index::METER_POWER),
        ])
        .optional()
}

fn cover_nodes() -> NodeFilter {
    NodeFilter::any()
        .generic([generic::SWITCH_MULTILEVEL, generic::ENTRY_CONTROL])
        .specific([
            specific::CLASS_A_MOTOR_CONTROL,
            specific::CLASS_B_MOTOR_CONTROL,
            specific::CLASS_C_MOTOR_CONTROL,
            specific::MOTOR_MULTIPOSITION,
            specific::SECURE_BARRIER_ADDON,
            specific::SECURE_DOOR,
        ])
}

fn builtin_schemas() -> Vec<DiscoverySchema> {
    vec![
        DiscoverySchema::new(
            "binary sensor",
            EntityKind::BinarySensor,
            ValueFilter::command_class(CommandClass::SensorBinary)
                .value_type(ValueType::Bool)
                .genre(ValueGenre::User),
        )
        .with_nodes(NodeFilter::any().generic([
            generic::ENTRY_CONTROL,
            generic::SENSOR_ALARM,
            generic::SENSOR_BINARY,
            generic::SWITCH_BINARY,
            generic::METER,
            generic::SENSOR_MULTILEVEL,
            generic::SWITCH_MULTILEVEL,
            generic::THERMOSTAT,
            generic::SENSOR_NOTIFICATION,
        ]))
        .with_slot(
            Slot::OffDelay,
            ValueFilter::command_class(CommandClass::Configuration)
                .index(9)
                .optional(),
        ),
        DiscoverySchema::new(
            "notification binary sensor",
            EntityKind::BinarySensor,
            ValueFilter::command_class(CommandClass::Notification)
                .genre(ValueGenre::User)
                .value_types([ValueType::Bool, ValueType::List]),
        ),
        DiscoverySchema::new(
            "single setpoint thermostat",
            EntityKind::Climate,
            ValueFilter::command_class(CommandClass::ThermostatSetpoint),
        )
        .with_nodes(
            NodeFilter::any()
                .generic([generic::THERMOSTAT, generic::SENSOR_MULTILEVEL])
                .specific([
                    specific::THERMOSTAT_HEATING,
                    specific::SETPOINT_THERMOSTAT,
                    specific::NOT_USED,
                ]),
        )
        .with_slot(
            Slot::Temperature,
            ValueFilter::command_class(CommandClass::SensorMultilevel)
                .index(index::SENSOR_MULTILEVEL_AIR_TEMPERATURE)
                .optional(),
        )
        .with_slot(
            Slot::Mode,
            ValueFilter::command_class(CommandClass::ThermostatMode).optional(),
        )
        .with_slot(
            Slot::FanMode,
            ValueFilter::command_class(CommandClass::ThermostatFanMode).optional(),
        )
        .with_slot(
            Slot::OperatingState,
            ValueFilter::command_class(CommandClass::ThermostatOperatingState).optional(),
        )
        .with_slot(
            Slot::FanAction,
            ValueFilter::command_class(CommandClass::ThermostatFanState).optional(),
        ),
        DiscoverySchema::new(
            "multiple setpoint thermostat",
            EntityKind::Climate,
            ValueFilter::command_class(CommandClass::ThermostatMode),
        )
        .with_nodes(
            NodeFilter::any()
                .generic([generic::THERMOSTAT, generic::SENSOR_MULTILEVEL])
                .specific([
                    specific::THERMOSTAT_GENERAL,
                    specific::THERMOSTAT_GENERAL_V2,
                    specific::SETBACK_THERMOSTAT,
                ]),
        )
        .with_slot(Slot::SetpointHeating, setpoint(1))
        .with_slot(Slot::SetpointCooling, setpoint(2))
        .with_slot(Slot::SetpointFurnace, setpoint(7))
        .with_slot(Slot::SetpointDryAir, setpoint(8))
        .with_slot(Slot::SetpointMoistAir, setpoint(9))
        .with_slot(Slot::SetpointAutoChangeover, setpoint(10))
        .with_slot(Slot::SetpointEcoHeating, setpoint(11))
        .with_slot(Slot::SetpointEcoCooling, setpoint(12))
        .with_slot(Slot::SetpointAwayHeating, setpoint(13))
        .with_slot(Slot::SetpointAwayCooling, setpoint(14))
        .with_slot(Slot::SetpointFullPower, setpoint(15))
        .with_slot(
            Slot::Temperature,
            ValueFilter::command_class(CommandClass::SensorMultilevel)
                .index(index::SENSOR_MULTILEVEL_AIR_TEMPERATURE)
                .optional(),
        )
        .with_slot(
            Slot::FanMode,
            ValueFilter::command_class(CommandClass::ThermostatFanMode).optional(),
        )
        .with_slot(
            Slot::OperatingState,
            ValueFilter::command_class(CommandClass::ThermostatOperatingState).optional(),
        )
        .with_slot(
            Slot::FanAction,
            ValueFilter::command_class(CommandClass::ThermostatFanState).optional(),
        )
        .with_slot(
            Slot::SwingMode,
            ValueFilter::command_class(CommandClass::Configuration)
                .index(33)
                .optional(),
        ),
        DiscoverySchema::new(
            "roller shutter",
            EntityKind::Cover,
            ValueFilter::command_class(CommandClass::SwitchMultilevel)
                .index(index::SWITCH_MULTILEVEL_LEVEL)
                .genre(ValueGenre::User),
        )
        .with_nodes(cover_nodes())
        .with_slot(
            Slot::Open,
            ValueFilter::command_class(CommandClass::SwitchMultilevel)
                .index(index::SWITCH_MULTILEVEL_BRIGHT)
                .optional(),
        )
        .with_slot(
            Slot::Close,
            ValueFilter::command_class(CommandClass::SwitchMultilevel)
                .index(index::SWITCH_MULTILEVEL_DIM)
                .optional(),
        )
        .with_slot(
            Slot::SlatPosition,
            ValueFilter::command_class(CommandClass::ManufacturerProprietary)
                .index(0)
                .optional(),
        )
        .with_slot(
            Slot::TiltPosition,
            ValueFilter::command_class(CommandClass::ManufacturerProprietary)
                .index(1)
                .optional(),
        ),
        DiscoverySchema::new(
            "garage door switch",
            EntityKind::Cover,
            ValueFilter::command_class(CommandClass::SwitchBinary).genre(ValueGenre::User),
        )
        .with_nodes(cover_nodes()),
        DiscoverySchema::new(
            "garage door barrier",
            EntityKind::Cover,
            ValueFilter::command_class(CommandClass::BarrierOperator)
                .index(index::BARRIER_OPERATOR_LABEL),
        )
        .with_nodes(cover_nodes()),
        DiscoverySchema::new(
            "fan",
            EntityKind::Fan,
            ValueFilter::command_class(CommandClass::SwitchMultilevel)
                .index(index::SWITCH_MULTILEVEL_LEVEL)
                .value_type(ValueType::Byte),
        )
        .with_nodes(
            NodeFilter::any()
                .generic([generic::SWITCH_MULTILEVEL])
                .specific([specific::FAN_SWITCH]),
        ),
        DiscoverySchema::new(
            "light",
            EntityKind::Light,
            ValueFilter::command_class(CommandClass::SwitchMultilevel)
                .index(index::SWITCH_MULTILEVEL_LEVEL)
                .value_type(ValueType::Byte),
        )
        .with_nodes(
            NodeFilter::any()
                .generic([generic::SWITCH_MULTILEVEL, generic::SWITCH_REMOTE])
                .specific([
                    specific::POWER_SWITCH_MULTILEVEL,
                    specific::SCENE_SWITCH_MULTILEVEL,
                    specific::NOT_USED,
                ]),
        )
        .with_slot(
            Slot::DimmingDuration,
            ValueFilter::command_class(CommandClass::SwitchMultilevel)
                .index(index::SWITCH_MULTILEVEL_DURATION)
                .optional(),
        )
        .with_slot(
            Slot::Color,
            ValueFilter::command_class(CommandClass::SwitchColor)
                .index(index::SWITCH_COLOR_COLOR)
                .optional(),
        )
        .with_slot(
            Slot::ColorChannels,
            ValueFilter::command_class(CommandClass::SwitchColor)
                .index(index::SWITCH_COLOR_CHANNELS)
                .optional(),
        )
        .with_slot(Slot::Power, power_meter()),
        DiscoverySchema::new(
            "lock",
            EntityKind::Lock,
            ValueFilter::command_class(CommandClass::DoorLock).index(index::DOOR_LOCK_LOCK),
        )
        .with_nodes(
            NodeFilter::any()
                .generic([generic::ENTRY_CONTROL])
                .specific([
                    specific::DOOR_LOCK,
                    specific::ADVANCED_DOOR_LOCK,
                    specific::SECURE_KEYPAD_DOOR_LOCK,
                    specific::SECURE_LOCKBOX,
                ]),
        )
        .with_slot(
            Slot::AccessControl,
            ValueFilter::command_class(CommandClass::ALARM)
                .index(index::ALARM_ACCESS_CONTROL)
                .optional(),
        )
        .with_slot(
            Slot::AlarmType,
            ValueFilter::command_class(CommandClass::ALARM)
                .index(index::ALARM_TYPE)
                .optional(),
        )
        .with_slot(
            Slot::AlarmLevel,
            ValueFilter::command_class(CommandClass::ALARM)
                .index(index::ALARM_LEVEL)
                .optional(),
        )
        .with_slot(
            Slot::AdvancedLockConfig,
            ValueFilter::command_class(CommandClass::Configuration)
                .index(12)
                .optional(),
        ),
        DiscoverySchema::new(
            "sensor",
            EntityKind::Sensor,
            ValueFilter::command_classes([
                CommandClass::SensorMultilevel,
                CommandClass::Meter,
                CommandClass::Notification,
                CommandClass::SensorAlarm,
                CommandClass::Indicator,
                CommandClass::Battery,
                CommandClass::Basic,
            ])
            .value_types([
                ValueType::Decimal,
                ValueType::Int,
                ValueType::String,
                ValueType::Byte,
                ValueType::List,
            ]),
        ),
        DiscoverySchema::new(
            "switch",
            EntityKind::Switch,
            ValueFilter::command_class(CommandClass::SwitchBinary)
                .value_type(ValueType::Bool)
                .genre(ValueGenre::User),
        )
        .with_nodes(NodeFilter::any().generic([
            generic::METER,
            generic::SENSOR_ALARM,
            generic::SENSOR_BINARY,
            generic::SWITCH_BINARY,
            generic::ENTRY_CONTROL,
            generic::SENSOR_MULTILEVEL,
            generic::SWITCH_MULTILEVEL,
            generic::GENERIC_CONTROLLER,
            generic::SWITCH_REMOTE,
            generic::REPEATER_SLAVE,
            generic::THERMOSTAT,
            generic::WALL_CONTROLLER,
        ]))
        .with_slot(Slot::Power, power_meter()),
    ]
}
