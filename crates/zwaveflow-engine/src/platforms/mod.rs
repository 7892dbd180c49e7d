/*!
 * Entity adapters.
 *
 * Adapters turn a materialized `EntityValues` into something with a state
 * and commands, one module per platform. They read from the bound slots and
 * change device state only through a `CommandSender`; the new state comes
 * back later as a value change. An adapter is available while the daemon
 * instance of its primary value reports that the nodes were queried.
 */
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use serde_json::{json, Map, Value as JsonValue};
use tracing::{debug, warn};

use zwaveflow_core::types::Value;
use zwaveflow_devices::command::CommandSender;
use zwaveflow_devices::node::NodeRecord;
use zwaveflow_devices::status::InstanceStatus;
use zwaveflow_devices::value::ValueRecord;

use crate::dispatcher::{DiscoveryListener, SceneActivation};
use crate::entity_values::EntityValues;
use crate::error::{Error, Result};
use crate::schema::{EntityKind, Slot};

pub mod binary_sensor;
pub mod climate;
pub mod cover;
pub mod fan;
pub mod light;
pub mod lock;
pub mod sensor;
pub mod switch;

pub use binary_sensor::{ZwaveBinarySensor, ZwaveNotificationSensor};
pub use climate::ZwaveClimate;
pub use cover::ZwaveCover;
pub use fan::ZwaveFan;
pub use light::ZwaveLight;
pub use lock::ZwaveLock;
pub use sensor::ZwaveSensor;
pub use switch::ZwaveSwitch;

/// Behaviour shared by every adapter
pub trait ZwaveEntity: Send {
    /// The backing values
    fn values(&self) -> &EntityValues;

    /// Display name
    fn name(&self) -> String;

    /// Current state rendered as text
    fn state(&self) -> String;

    /// Take over a fresh snapshot of the backing values
    fn update_values(&mut self, values: &EntityValues);

    /// An optional slot was bound after creation
    fn value_added(&mut self, values: &EntityValues, slot: Slot) {
        debug!("{} gained {}", self.unique_id(), slot);
        self.update_values(values);
    }

    /// Unique id, defaults to the one of the backing values
    fn unique_id(&self) -> String {
        self.values().unique_id().to_string()
    }

    /// Platform
    fn kind(&self) -> EntityKind {
        self.values().kind()
    }

    /// Whether the entity should be enabled when first seen
    fn enabled_by_default(&self) -> bool {
        true
    }

    /// Extra state attributes
    fn attributes(&self) -> Map<String, JsonValue> {
        let mut attributes = Map::new();
        attributes.insert("node_id".to_string(), json!(self.values().node_id()));
        attributes
    }
}

/// State shared by every adapter: the values snapshot, the node name and
/// the command sink
pub struct EntityBase {
    values: EntityValues,
    node_name: String,
    sender: Arc<dyn CommandSender>,
}

impl fmt::Debug for EntityBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityBase")
            .field("unique_id", &self.values.unique_id())
            .field("kind", &self.values.kind())
            .field("node_name", &self.node_name)
            .finish()
    }
}

impl EntityBase {
    /// Create the base for an adapter
    pub fn new(node: &NodeRecord, values: &EntityValues, sender: Arc<dyn CommandSender>) -> Self {
        Self {
            values: values.clone(),
            node_name: node.display_name(),
            sender,
        }
    }

    /// The backing values
    pub fn values(&self) -> &EntityValues {
        &self.values
    }

    /// Replace the values snapshot
    pub fn update(&mut self, values: &EntityValues) {
        self.values = values.clone();
    }

    /// Value bound to `slot`
    pub fn get(&self, slot: Slot) -> Option<&ValueRecord> {
        self.values.get(slot)
    }

    /// The primary value
    pub fn primary(&self) -> &ValueRecord {
        self.values.primary()
    }

    /// "{manufacturer} {product}: {primary label}"
    pub fn name(&self) -> String {
        format!("{}: {}", self.node_name, self.values.primary().label)
    }

    /// Send a new value to the value bound to `slot`
    pub fn send<V: Into<Value>>(&self, slot: Slot, value: V) -> Result<()> {
        let target = self.values.get(slot).ok_or_else(|| {
            Error::unsupported(format!(
                "{} {} has no {} value",
                self.values.kind(),
                self.values.unique_id(),
                slot
            ))
        })?;
        self.sender.send_value(target, value.into())?;
        Ok(())
    }
}

/// An adapter of any platform
#[derive(Debug)]
#[allow(missing_docs)]
pub enum Platform {
    BinarySensor(ZwaveBinarySensor),
    NotificationSensor(ZwaveNotificationSensor),
    Climate(ZwaveClimate),
    Cover(ZwaveCover),
    Fan(ZwaveFan),
    Light(ZwaveLight),
    Lock(ZwaveLock),
    Sensor(ZwaveSensor),
    Switch(ZwaveSwitch),
}

impl Platform {
    /// Shared view of the adapter
    pub fn entity(&self) -> &dyn ZwaveEntity {
        match self {
            Platform::BinarySensor(e) => e,
            Platform::NotificationSensor(e) => e,
            Platform::Climate(e) => e,
            Platform::Cover(e) => e,
            Platform::Fan(e) => e,
            Platform::Light(e) => e,
            Platform::Lock(e) => e,
            Platform::Sensor(e) => e,
            Platform::Switch(e) => e,
        }
    }

    /// Mutable view of the adapter
    pub fn entity_mut(&mut self) -> &mut dyn ZwaveEntity {
        match self {
            Platform::BinarySensor(e) => e,
            Platform::NotificationSensor(e) => e,
            Platform::Climate(e) => e,
            Platform::Cover(e) => e,
            Platform::Fan(e) => e,
            Platform::Light(e) => e,
            Platform::Lock(e) => e,
            Platform::Sensor(e) => e,
            Platform::Switch(e) => e,
        }
    }
}

/// Build the adapters for a materialized entity
///
/// Most entities produce one adapter. Notification list values produce one
/// binary sensor per mapped state; values no adapter can render produce
/// none.
pub fn build(node: &NodeRecord, values: &EntityValues, sender: Arc<dyn CommandSender>) -> Vec<Platform> {
    match values.kind() {
        EntityKind::BinarySensor => binary_sensor::build(node, values, sender),
        EntityKind::Climate => vec![Platform::Climate(ZwaveClimate::new(node, values, sender))],
        EntityKind::Cover => ZwaveCover::new(node, values, sender)
            .map(Platform::Cover)
            .into_iter()
            .collect(),
        EntityKind::Fan => vec![Platform::Fan(ZwaveFan::new(node, values, sender))],
        EntityKind::Light => vec![Platform::Light(ZwaveLight::new(node, values, sender))],
        EntityKind::Lock => vec![Platform::Lock(ZwaveLock::new(node, values, sender))],
        EntityKind::Sensor => ZwaveSensor::new(node, values, sender)
            .map(Platform::Sensor)
            .into_iter()
            .collect(),
        EntityKind::Switch => vec![Platform::Switch(ZwaveSwitch::new(node, values, sender))],
    }
}

/// Adapters for every materialized entity, keyed by `"{kind}.{unique_id}"`
pub struct EntityStore {
    sender: Arc<dyn CommandSender>,
    entities: BTreeMap<String, Platform>,
    by_values: HashMap<(EntityKind, String), Vec<String>>,
    scenes: Vec<SceneActivation>,
    ready_instances: HashMap<u32, bool>,
}

impl fmt::Debug for EntityStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityStore")
            .field("entities", &self.entities.len())
            .field("scenes", &self.scenes.len())
            .field("ready_instances", &self.ready_instances)
            .finish()
    }
}

impl EntityStore {
    /// Create an empty store whose adapters send through `sender`
    pub fn new(sender: Arc<dyn CommandSender>) -> Self {
        Self {
            sender,
            entities: BTreeMap::new(),
            by_values: HashMap::new(),
            scenes: Vec::new(),
            ready_instances: HashMap::new(),
        }
    }

    /// Look up an adapter
    pub fn get(&self, key: &str) -> Option<&Platform> {
        self.entities.get(key)
    }

    /// Look up an adapter for commands
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Platform> {
        self.entities.get_mut(key)
    }

    /// All adapters in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Platform)> + '_ {
        self.entities.iter().map(|(key, platform)| (key.as_str(), platform))
    }

    /// All keys in order
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entities.keys().map(String::as_str)
    }

    /// Number of adapters
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Scene activations seen so far
    pub fn scenes(&self) -> &[SceneActivation] {
        &self.scenes
    }

    /// Whether the adapter under `key` is available
    ///
    /// Unknown keys and adapters whose daemon instance has not reported a
    /// queried state are unavailable.
    pub fn is_available(&self, key: &str) -> bool {
        self.entities
            .get(key)
            .map(|platform| platform.entity().values().primary().ozw_instance)
            .and_then(|instance| self.ready_instances.get(&instance).copied())
            .unwrap_or(false)
    }

    fn for_values<F>(&mut self, values: &EntityValues, mut f: F)
    where
        F: FnMut(&mut dyn ZwaveEntity),
    {
        let keys = match self
            .by_values
            .get(&(values.kind(), values.unique_id().to_string()))
        {
            Some(keys) => keys,
            None => return,
        };
        for key in keys {
            if let Some(platform) = self.entities.get_mut(key) {
                f(platform.entity_mut());
            }
        }
    }
}

impl DiscoveryListener for EntityStore {
    fn entity_materialized(&mut self, node: &NodeRecord, entity: &EntityValues) {
        let platforms = build(node, entity, Arc::clone(&self.sender));
        if platforms.is_empty() {
            warn!("No adapter for {} ({})", entity, entity.primary());
            return;
        }

        let mut keys = Vec::with_capacity(platforms.len());
        for platform in platforms {
            let key = format!("{}.{}", platform.entity().kind(), platform.entity().unique_id());
            debug!("Adding {} ({})", key, platform.entity().name());
            self.entities.insert(key.clone(), platform);
            keys.push(key);
        }
        self.by_values
            .entry((entity.kind(), entity.unique_id().to_string()))
            .or_default()
            .extend(keys);
    }

    fn slot_added(&mut self, entity: &EntityValues, slot: Slot) {
        self.for_values(entity, |adapter| adapter.value_added(entity, slot));
    }

    fn value_updated(&mut self, entity: &EntityValues, _value: &ValueRecord) {
        self.for_values(entity, |adapter| adapter.update_values(entity));
    }

    fn scene_activated(&mut self, scene: &SceneActivation) {
        self.scenes.push(scene.clone());
    }

    fn instance_status_changed(&mut self, status: &InstanceStatus) {
        let affected = self
            .entities
            .values()
            .filter(|platform| platform.entity().values().primary().ozw_instance == status.ozw_instance)
            .count();
        debug!(
            "{} adapters of instance {} are {}",
            affected,
            status.ozw_instance,
            if status.is_ready() { "available" } else { "unavailable" }
        );
        self.ready_instances.insert(status.ozw_instance, status.is_ready());
    }
}

/// Render a numeric value without trailing zeros
pub(crate) fn format_number(value: f64) -> String {
    format!("{}", value)
}

/// Round to `places` decimal places
pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::DiscoverySession;
    use crate::test_support::*;
    use std::sync::Mutex;
    use zwaveflow_devices::command::RecordingSender;

    fn session_with_store() -> (DiscoverySession, Arc<Mutex<EntityStore>>, RecordingSender) {
        let sender = RecordingSender::new();
        let store = Arc::new(Mutex::new(EntityStore::new(Arc::new(sender.clone()))));
        let mut session = DiscoverySession::default();
        session.add_listener(Box::new(store.clone()));
        (session, store, sender)
    }

    #[test]
    fn test_store_follows_session() {
        let (mut session, store, sender) = session_with_store();
        session.node_added(switch_node(3).with_product("Aeotec", "Smart Switch 6"));
        session.value_added(switch_binary(3, 30).with_label("Switch"));

        {
            let store = store.lock().unwrap();
            assert_eq!(store.keys().collect::<Vec<_>>(), vec!["switch.3-30"]);
            let switch = store.get("switch.3-30").expect("switch adapter");
            assert_eq!(switch.entity().name(), "Aeotec Smart Switch 6: Switch");
            assert_eq!(switch.entity().state(), "off");
            assert_eq!(switch.entity().attributes()["node_id"], json!(3));
        }

        session.value_changed(switch_binary(3, 30).with_label("Switch").with_value(true));
        {
            let mut store = store.lock().unwrap();
            let switch = store.get_mut("switch.3-30").unwrap();
            assert_eq!(switch.entity().state(), "on");
            if let Platform::Switch(switch) = switch {
                switch.turn_off().unwrap();
            }
        }
        assert_eq!(sender.values(), vec![Value::Bool(false)]);
    }

    #[test]
    fn test_store_keeps_scenes() {
        let (mut session, store, _) = session_with_store();
        session.node_added(NodeRecord::new(39, 0x18, 0x01));
        let scene = zwaveflow_devices::value::ValueRecord::new(
            39,
            zwaveflow_devices::command_class::CommandClass::SceneActivation,
            0,
            zwaveflow_devices::value::ValueId(8),
        )
        .with_value(0);
        session.value_added(scene.clone());
        session.value_changed(scene.with_value(2));

        let store = store.lock().unwrap();
        assert_eq!(store.scenes().len(), 1);
        assert_eq!(store.scenes()[0].scene_value_id, 2);
    }

    #[test]
    fn test_availability_follows_instance_status() {
        use zwaveflow_devices::status::DriverState;

        let (mut session, store, _) = session_with_store();
        session.node_added(switch_node(3));
        session.value_added(switch_binary(3, 30));
        assert!(!store.lock().unwrap().is_available("switch.3-30"));

        session.instance_status_changed(InstanceStatus::new(1, DriverState::AllNodesQueriedSomeDead));
        assert!(store.lock().unwrap().is_available("switch.3-30"));

        session.instance_status_changed(InstanceStatus::new(2, DriverState::AllNodesQueried));
        session.instance_status_changed(InstanceStatus::new(1, DriverState::DriverReset));
        let store = store.lock().unwrap();
        assert!(!store.is_available("switch.3-30"));
        assert!(!store.is_available("switch.9-90"));
    }

    #[test]
    fn test_send_without_slot_is_unsupported() {
        let sender = RecordingSender::new();
        let (node, values) = materialize(switch_node(3), vec![switch_binary(3, 30)], EntityKind::Switch);
        let base = EntityBase::new(&node, &values, Arc::new(sender.clone()));

        assert!(matches!(base.send(Slot::Color, 1), Err(Error::UnsupportedCommand(_))));
        assert!(base.send(Slot::Primary, true).is_ok());
        assert_eq!(sender.sent().len(), 1);
    }

    #[test]
    fn test_number_helpers() {
        assert_eq!(round_to(21.456, 2), 21.46);
        assert_eq!(round_to(21.44, 1), 21.4);
        assert_eq!(format_number(22.0), "22");
        assert_eq!(format_number(21.5), "21.5");
    }
}
