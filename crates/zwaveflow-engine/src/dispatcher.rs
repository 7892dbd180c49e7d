/*!
 * Discovery dispatcher.
 *
 * `DiscoverySession` owns everything discovery needs for one network: the
 * node registry, the entities created per node and the set of
 * (schema, primary value) pairs already claimed. Inbound daemon events are
 * applied one at a time; listeners are told about materialized entities,
 * late slot bindings, value refreshes, scene activations and changes of the
 * daemon instance status.
 */
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, trace, warn};

use zwaveflow_core::config::{Config, DiscoveryConfig};
use zwaveflow_core::event::{ListenerId, ListenerSet};
use zwaveflow_core::logging::{entity_span, node_span};
use zwaveflow_devices::command_class::CommandClass;
use zwaveflow_devices::message::OzwEvent;
use zwaveflow_devices::node::NodeRecord;
use zwaveflow_devices::registry::NodeRegistry;
use zwaveflow_devices::status::InstanceStatus;
use zwaveflow_devices::value::{ValueId, ValueRecord};

use crate::entity_values::{EntityValues, Notice};
use crate::matcher::{matches_node, matches_value};
use crate::schema::{EntityKind, SchemaId, SchemaRegistry, Slot};

/// A scene triggered on a node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneActivation {
    /// Node that reported the scene
    pub node_id: u8,
    /// Scene id, the index of the reporting value
    pub scene_id: u16,
    /// Scene label, the label of the reporting value
    pub scene_label: String,
    /// Reported scene value
    pub scene_value_id: i64,
    /// Label of the reported scene value (central scene only)
    pub scene_value_label: Option<String>,
    /// When the activation was observed
    pub timestamp: DateTime<Utc>,
}

impl SceneActivation {
    /// Build an activation from a changed scene value
    ///
    /// Returns `None` for values of other command classes and for payloads
    /// that carry no scene value.
    pub fn from_value(value: &ValueRecord) -> Option<Self> {
        let (scene_value_id, scene_value_label) =
            match CommandClass::from_id(value.command_class.id()) {
                CommandClass::SceneActivation => (value.value.as_integer()?, None),
                CommandClass::CentralScene => {
                    let list = value.value.as_list()?;
                    (list.selected_id?, list.selected.clone())
                }
                _ => return None,
            };

        Some(Self {
            node_id: value.node_id,
            scene_id: value.index,
            scene_label: value.label.clone(),
            scene_value_id,
            scene_value_label,
            timestamp: Utc::now(),
        })
    }
}

/// Receiver of discovery notifications
///
/// Every method has an empty default so listeners only implement what they
/// care about.
#[allow(unused_variables)]
pub trait DiscoveryListener: Send {
    /// An entity became ready
    fn entity_materialized(&mut self, node: &NodeRecord, entity: &EntityValues) {}

    /// An optional slot of a ready entity was bound
    fn slot_added(&mut self, entity: &EntityValues, slot: Slot) {}

    /// A value bound to an entity changed
    fn value_updated(&mut self, entity: &EntityValues, value: &ValueRecord) {}

    /// A scene was activated
    fn scene_activated(&mut self, scene: &SceneActivation) {}

    /// A daemon instance reported a new driver state
    fn instance_status_changed(&mut self, status: &InstanceStatus) {}
}

fn with_shared<L, F>(shared: &Mutex<L>, notification: &str, f: F)
where
    L: DiscoveryListener + ?Sized,
    F: FnOnce(&mut L),
{
    match shared.lock() {
        Ok(mut listener) => f(&mut *listener),
        Err(_) => warn!("Listener lock poisoned, dropping {} notification", notification),
    }
}

impl<L: DiscoveryListener + ?Sized> DiscoveryListener for Arc<Mutex<L>> {
    fn entity_materialized(&mut self, node: &NodeRecord, entity: &EntityValues) {
        with_shared(&**self, "entity materialized", |l| l.entity_materialized(node, entity));
    }

    fn slot_added(&mut self, entity: &EntityValues, slot: Slot) {
        with_shared(&**self, "slot added", |l| l.slot_added(entity, slot));
    }

    fn value_updated(&mut self, entity: &EntityValues, value: &ValueRecord) {
        with_shared(&**self, "value updated", |l| l.value_updated(entity, value));
    }

    fn scene_activated(&mut self, scene: &SceneActivation) {
        with_shared(&**self, "scene activated", |l| l.scene_activated(scene));
    }

    fn instance_status_changed(&mut self, status: &InstanceStatus) {
        with_shared(&**self, "instance status", |l| l.instance_status_changed(status));
    }
}

/// Discovery state for one network
#[derive(Debug)]
pub struct DiscoverySession {
    schemas: SchemaRegistry,
    options: DiscoveryConfig,
    nodes: NodeRegistry,
    entities: HashMap<u8, Vec<EntityValues>>,
    claimed: HashSet<(SchemaId, ValueId)>,
    statuses: HashMap<u32, InstanceStatus>,
    listeners: ListenerSet<dyn DiscoveryListener>,
}

impl DiscoverySession {
    /// Create a session over a schema table
    pub fn new(schemas: SchemaRegistry, options: DiscoveryConfig) -> Self {
        Self {
            schemas,
            options,
            nodes: NodeRegistry::new(),
            entities: HashMap::new(),
            claimed: HashSet::new(),
            statuses: HashMap::new(),
            listeners: ListenerSet::new(),
        }
    }

    /// Create a session over the built-in schemas using the discovery section
    /// of `config`
    pub fn from_config(config: &Config) -> Self {
        Self::new(SchemaRegistry::builtin(), config.discovery.clone())
    }

    /// Register a listener
    pub fn add_listener(&mut self, listener: Box<dyn DiscoveryListener>) -> ListenerId {
        self.listeners.register(listener)
    }

    /// Remove a listener
    pub fn remove_listener(&mut self, id: ListenerId) -> Option<Box<dyn DiscoveryListener>> {
        self.listeners.unregister(id)
    }

    /// Apply one decoded daemon event
    pub fn handle(&mut self, event: OzwEvent) {
        match event {
            OzwEvent::NodeAdded(node) => self.node_added(node),
            OzwEvent::NodeChanged(node) => self.node_changed(node),
            OzwEvent::ValueAdded(value) => self.value_added(value),
            OzwEvent::ValueChanged(value) => self.value_changed(value),
            OzwEvent::InstanceStatus(status) => self.instance_status_changed(status),
        }
    }

    /// Record the driver state of a daemon instance
    ///
    /// Listeners are only told when the state differs from the last one seen.
    pub fn instance_status_changed(&mut self, status: InstanceStatus) {
        if self.statuses.get(&status.ozw_instance) == Some(&status) {
            trace!("Instance {} still {}", status.ozw_instance, status.state);
            return;
        }
        info!(
            "Instance {} is now {} ({})",
            status.ozw_instance,
            status.state,
            if status.is_ready() { "available" } else { "unavailable" }
        );
        self.listeners.notify(|l| l.instance_status_changed(&status));
        self.statuses.insert(status.ozw_instance, status);
    }

    /// Record a new node
    ///
    /// A node that is already known is handled as a change.
    pub fn node_added(&mut self, node: NodeRecord) {
        if self.nodes.contains_node(node.node_id) {
            self.node_changed(node);
            return;
        }
        let _span = node_span(node.node_id).entered();
        debug!("Node added: {}", node.display_name());
        self.nodes.upsert_node(node);
    }

    /// Replace a node record
    ///
    /// When rediscovery is enabled the node's known values are offered to
    /// discovery again, so schemas whose node filter now matches can claim
    /// them. Already claimed pairs are never instantiated twice.
    pub fn node_changed(&mut self, node: NodeRecord) {
        let node_id = node.node_id;
        let _span = node_span(node_id).entered();
        debug!("Node changed: {}", node.display_name());
        self.nodes.upsert_node(node.clone());

        if !self.options.rediscover_on_node_changed {
            return;
        }
        let values: Vec<ValueRecord> = self.nodes.values(node_id).cloned().collect();
        for value in &values {
            self.route_to_entities(&node, value);
            self.discover(&node, value);
        }
    }

    /// Store a new value and run discovery on it
    ///
    /// Existing entities of the node see the value before any schema does.
    pub fn value_added(&mut self, value: ValueRecord) {
        let node_id = value.node_id;
        let _span = node_span(node_id).entered();
        let node = match self.nodes.node(node_id) {
            Some(node) => node.clone(),
            None => {
                debug!("Dropping value {} for unknown node {}", value.value_id, node_id);
                return;
            }
        };
        trace!("Value added: {}", value);

        self.nodes.store_value(value.clone());
        self.route_to_entities(&node, &value);
        self.discover(&node, &value);
    }

    /// Store a changed value and refresh the entities holding it
    ///
    /// Changes never trigger discovery.
    pub fn value_changed(&mut self, value: ValueRecord) {
        let node_id = value.node_id;
        let _span = node_span(node_id).entered();
        if self.nodes.store_value(value.clone()).is_none() {
            debug!("Dropping change of {} for unknown node {}", value.value_id, node_id);
            return;
        }
        trace!("Value changed: {}", value);

        let listeners = &mut self.listeners;
        if let Some(entities) = self.entities.get_mut(&node_id) {
            for entity in entities.iter_mut() {
                if entity.refresh(&value) {
                    listeners.notify(|l| l.value_updated(entity, &value));
                }
            }
        }

        if value.command_class.is_scene() {
            if let Some(scene) = SceneActivation::from_value(&value) {
                debug!(
                    "Scene {} activated on node {} with value {}",
                    scene.scene_id, scene.node_id, scene.scene_value_id
                );
                self.listeners.notify(|l| l.scene_activated(&scene));
            }
        }
    }

    fn route_to_entities(&mut self, node: &NodeRecord, value: &ValueRecord) {
        let listeners = &mut self.listeners;
        let entities = match self.entities.get_mut(&node.node_id) {
            Some(entities) => entities,
            None => return,
        };
        for entity in entities.iter_mut() {
            for notice in entity.check_value(node, value) {
                announce(listeners, node, entity, notice);
            }
        }
    }

    fn discover(&mut self, node: &NodeRecord, value: &ValueRecord) {
        for (schema_id, schema) in self.schemas.iter() {
            if self.claimed.contains(&(schema_id, value.value_id)) {
                continue;
            }
            if !matches_node(node, schema.node_filter()) || !matches_value(value, schema.primary()) {
                continue;
            }

            self.claimed.insert((schema_id, value.value_id));
            let (entity, notice) = EntityValues::new(
                schema_id,
                schema,
                node,
                value.clone(),
                self.nodes.values(node.node_id),
            );
            debug!("Schema {} ({}) claimed value {}", schema_id, schema.name(), value.value_id);

            if let Some(notice) = notice {
                announce(&mut self.listeners, node, &entity, notice);
            }
            self.entities.entry(node.node_id).or_default().push(entity);

            if self.options.stop_at_first_match {
                break;
            }
        }
    }

    /// Known nodes and their values
    pub fn nodes(&self) -> &NodeRegistry {
        &self.nodes
    }

    /// The schema table
    pub fn schemas(&self) -> &SchemaRegistry {
        &self.schemas
    }

    /// Entities created for a node, ready or not
    pub fn entities(&self, node_id: u8) -> &[EntityValues] {
        self.entities.get(&node_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Look up an entity by kind and unique id
    pub fn entity(&self, kind: EntityKind, unique_id: &str) -> Option<&EntityValues> {
        self.all_entities()
            .find(|entity| entity.kind() == kind && entity.unique_id() == unique_id)
    }

    /// Every entity of the session
    pub fn all_entities(&self) -> impl Iterator<Item = &EntityValues> + '_ {
        self.entities.values().flatten()
    }

    /// Number of ready entities
    pub fn ready_count(&self) -> usize {
        self.all_entities().filter(|entity| entity.is_ready()).count()
    }

    /// Last driver state reported by daemon instance `ozw_instance`
    pub fn instance_status(&self, ozw_instance: u32) -> Option<&InstanceStatus> {
        self.statuses.get(&ozw_instance)
    }

    /// Whether entities of daemon instance `ozw_instance` are available
    pub fn is_instance_ready(&self, ozw_instance: u32) -> bool {
        self.instance_status(ozw_instance)
            .map(InstanceStatus::is_ready)
            .unwrap_or(false)
    }

    /// Whether `schema` already claimed `value_id` as its primary
    pub fn is_claimed(&self, schema: SchemaId, value_id: ValueId) -> bool {
        self.claimed.contains(&(schema, value_id))
    }
}

impl Default for DiscoverySession {
    fn default() -> Self {
        Self::new(SchemaRegistry::builtin(), DiscoveryConfig::default())
    }
}

fn announce(
    listeners: &mut ListenerSet<dyn DiscoveryListener>,
    node: &NodeRecord,
    entity: &EntityValues,
    notice: Notice,
) {
    match notice {
        Notice::Materialized => {
            let _span = entity_span(entity.kind().as_str(), entity.unique_id()).entered();
            info!(
                "Materialized {} from schema {} on {}",
                entity.kind(),
                entity.schema_name(),
                node.display_name()
            );
            listeners.notify(|l| l.entity_materialized(node, entity));
        }
        Notice::SlotAdded(slot) => {
            debug!("Slot {} added to {}", slot, entity);
            listeners.notify(|l| l.slot_added(entity, slot));
        }
    }
}
