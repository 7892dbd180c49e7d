/*!
 * Per-entity value aggregation.
 *
 * An `EntityValues` is created when a value satisfies a schema's primary
 * slot. It keeps its own copy of the schema filters, scoped to the node and
 * endpoint instance of the primary value, and collects the auxiliary values
 * of that node as they show up. Once every required slot is bound the entity
 * becomes ready, exactly once.
 */
use std::fmt;

use tracing::debug;

use zwaveflow_devices::node::NodeRecord;
use zwaveflow_devices::value::{ValueId, ValueRecord};

use crate::matcher::{matches_node, matches_value};
use crate::schema::{DiscoverySchema, EntityKind, NodeFilter, SchemaId, Slot, ValueFilter};

/// Lifecycle of an [`EntityValues`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityState {
    /// Waiting for required slots
    Accumulating,
    /// Every required slot is bound
    Ready,
}

/// Notification produced while feeding values into an [`EntityValues`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// The entity just became ready
    Materialized,
    /// An optional slot was bound after the entity became ready
    SlotAdded(Slot),
}

#[derive(Debug, Clone)]
struct SlotBinding {
    slot: Slot,
    filter: ValueFilter,
    value: Option<ValueRecord>,
}

/// Values backing one entity
#[derive(Debug, Clone)]
pub struct EntityValues {
    schema_id: SchemaId,
    schema_name: &'static str,
    kind: EntityKind,
    node_id: u8,
    node_filter: NodeFilter,
    primary: ValueRecord,
    slots: Vec<SlotBinding>,
    state: EntityState,
    unique_id: String,
}

impl EntityValues {
    /// Create the aggregate for `primary`
    ///
    /// `known` are the values already stored for the node; they are bound
    /// before readiness is checked, so the only notice this can return is
    /// [`Notice::Materialized`].
    pub fn new<'a, I>(
        schema_id: SchemaId,
        schema: &DiscoverySchema,
        node: &NodeRecord,
        primary: ValueRecord,
        known: I,
    ) -> (Self, Option<Notice>)
    where
        I: IntoIterator<Item = &'a ValueRecord>,
    {
        let mut node_filter = schema.node_filter().clone();
        node_filter.node_ids = Some(vec![primary.node_id]);

        let slots = schema
            .slots()
            .iter()
            .map(|(slot, filter)| {
                let mut filter = filter.clone();
                filter.scope_to_instance(primary.instance);
                SlotBinding {
                    slot: *slot,
                    filter,
                    value: None,
                }
            })
            .collect();

        let mut entity = Self {
            schema_id,
            schema_name: schema.name(),
            kind: schema.kind(),
            node_id: primary.node_id,
            node_filter,
            unique_id: format!("{}-{}", primary.node_id, primary.value_id),
            primary,
            slots,
            state: EntityState::Accumulating,
        };

        if matches_node(node, &entity.node_filter) {
            for value in known {
                entity.bind_matching(value);
            }
        }

        let notice = entity.check_ready();
        (entity, notice)
    }

    /// Offer a value of the node to this entity
    ///
    /// Binds every unbound slot whose filter accepts the value. Bound slots
    /// keep their binding.
    pub fn check_value(&mut self, node: &NodeRecord, value: &ValueRecord) -> Vec<Notice> {
        let mut notices = Vec::new();
        if !matches_node(node, &self.node_filter) {
            return notices;
        }

        for position in 0..self.slots.len() {
            if !self.bind_at(position, value) {
                continue;
            }
            match self.state {
                EntityState::Ready => notices.push(Notice::SlotAdded(self.slots[position].slot)),
                EntityState::Accumulating => notices.extend(self.check_ready()),
            }
        }
        notices
    }

    /// Refresh bound copies of a changed value
    ///
    /// Returns whether this entity holds the value.
    pub fn refresh(&mut self, value: &ValueRecord) -> bool {
        let mut held = false;
        if self.primary.value_id == value.value_id {
            self.primary = value.clone();
            held = true;
        }
        for binding in self.slots.iter_mut() {
            if let Some(bound) = binding.value.as_mut() {
                if bound.value_id == value.value_id {
                    *bound = value.clone();
                    held = true;
                }
            }
        }
        held
    }

    fn bind_matching(&mut self, value: &ValueRecord) {
        for position in 0..self.slots.len() {
            self.bind_at(position, value);
        }
    }

    fn bind_at(&mut self, position: usize, value: &ValueRecord) -> bool {
        let binding = &mut self.slots[position];
        if binding.value.is_some() || !matches_value(value, &binding.filter) {
            return false;
        }
        debug!(
            "Bound {} to slot {} of {} {}",
            value.value_id, binding.slot, self.kind, self.unique_id
        );
        binding.value = Some(value.clone());
        true
    }

    fn check_ready(&mut self) -> Option<Notice> {
        if self.state == EntityState::Ready {
            return None;
        }
        let missing = self
            .slots
            .iter()
            .any(|binding| binding.value.is_none() && !binding.filter.optional);
        if missing {
            return None;
        }
        self.state = EntityState::Ready;
        Some(Notice::Materialized)
    }

    /// Value bound to `slot`, if any
    pub fn get(&self, slot: Slot) -> Option<&ValueRecord> {
        if slot == Slot::Primary {
            return Some(&self.primary);
        }
        self.slots
            .iter()
            .find(|binding| binding.slot == slot)
            .and_then(|binding| binding.value.as_ref())
    }

    /// The primary value
    pub fn primary(&self) -> &ValueRecord {
        &self.primary
    }

    /// Whether the schema declares `slot`
    pub fn contains_slot(&self, slot: Slot) -> bool {
        slot == Slot::Primary || self.slots.iter().any(|binding| binding.slot == slot)
    }

    /// Whether a value is bound to `slot`
    pub fn is_bound(&self, slot: Slot) -> bool {
        self.get(slot).is_some()
    }

    /// Bound values, primary first
    pub fn values(&self) -> impl Iterator<Item = &ValueRecord> + '_ {
        std::iter::once(&self.primary).chain(self.slots.iter().filter_map(|b| b.value.as_ref()))
    }

    /// Bound slots, primary first
    pub fn bound_slots(&self) -> impl Iterator<Item = (Slot, &ValueRecord)> + '_ {
        std::iter::once((Slot::Primary, &self.primary)).chain(
            self.slots
                .iter()
                .filter_map(|b| b.value.as_ref().map(|value| (b.slot, value))),
        )
    }

    /// Whether `value_id` is bound to any slot
    pub fn holds(&self, value_id: ValueId) -> bool {
        self.values().any(|value| value.value_id == value_id)
    }

    /// `"{node_id}-{primary value_id}"`
    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    /// Entity kind
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Schema this entity was created from
    pub fn schema_id(&self) -> SchemaId {
        self.schema_id
    }

    /// Name of the schema this entity was created from
    pub fn schema_name(&self) -> &'static str {
        self.schema_name
    }

    /// Owning node
    pub fn node_id(&self) -> u8 {
        self.node_id
    }

    /// Endpoint instance of the primary value
    pub fn instance(&self) -> u8 {
        self.primary.instance
    }

    /// Lifecycle state
    pub fn state(&self) -> EntityState {
        self.state
    }

    /// Whether every required slot is bound
    pub fn is_ready(&self) -> bool {
        self.state == EntityState::Ready
    }
}

impl fmt::Display for EntityValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.kind, self.unique_id, self.schema_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zwaveflow_devices::command_class::CommandClass;
    use zwaveflow_devices::device_class::generic;
    use zwaveflow_devices::value::{ValueGenre, ValueType};

    fn sensor_node() -> NodeRecord {
        NodeRecord::new(7, generic::SENSOR_BINARY, 1)
    }

    fn schema() -> DiscoverySchema {
        DiscoverySchema::new(
            "test binary sensor",
            EntityKind::BinarySensor,
            ValueFilter::command_class(CommandClass::SensorBinary).value_type(ValueType::Bool),
        )
        .with_slot(
            Slot::OffDelay,
            ValueFilter::command_class(CommandClass::Configuration)
                .index(9)
                .optional(),
        )
        .with_slot(
            Slot::Temperature,
            ValueFilter::command_class(CommandClass::SensorMultilevel).index(1),
        )
    }

    fn primary() -> ValueRecord {
        ValueRecord::new(7, CommandClass::SensorBinary, 0, ValueId(100))
            .with_type(ValueType::Bool)
            .with_genre(ValueGenre::User)
            .with_value(false)
    }

    fn temperature(instance: u8, id: u64) -> ValueRecord {
        ValueRecord::new(7, CommandClass::SensorMultilevel, 1, ValueId(id))
            .with_instance(instance)
            .with_type(ValueType::Decimal)
            .with_value(21.5)
    }

    fn off_delay() -> ValueRecord {
        ValueRecord::new(7, CommandClass::Configuration, 9, ValueId(300)).with_value(30)
    }

    #[test]
    fn test_waits_for_required_slot() {
        let node = sensor_node();
        let (mut entity, notice) =
            EntityValues::new(SchemaId(0), &schema(), &node, primary(), &[primary()]);

        assert_eq!(notice, None);
        assert_eq!(entity.state(), EntityState::Accumulating);
        assert_eq!(entity.unique_id(), "7-100");

        let notices = entity.check_value(&node, &temperature(1, 200));
        assert_eq!(notices, vec![Notice::Materialized]);
        assert!(entity.is_ready());
        assert!(!entity.is_bound(Slot::OffDelay));

        let notices = entity.check_value(&node, &off_delay());
        assert_eq!(notices, vec![Notice::SlotAdded(Slot::OffDelay)]);
        assert_eq!(entity.get(Slot::OffDelay).map(|v| v.value_id), Some(ValueId(300)));
    }

    #[test]
    fn test_replay_binds_before_ready() {
        let node = sensor_node();
        let known = vec![primary(), off_delay(), temperature(1, 200)];
        let (entity, notice) = EntityValues::new(SchemaId(0), &schema(), &node, primary(), &known);

        assert_eq!(notice, Some(Notice::Materialized));
        let slots: Vec<Slot> = entity.bound_slots().map(|(slot, _)| slot).collect();
        assert_eq!(slots, vec![Slot::Primary, Slot::OffDelay, Slot::Temperature]);
    }

    #[test]
    fn test_instance_scoping() {
        let node = sensor_node();
        let (mut entity, _) = EntityValues::new(SchemaId(0), &schema(), &node, primary(), &[]);

        assert!(entity.check_value(&node, &temperature(2, 201)).is_empty());
        assert!(!entity.is_bound(Slot::Temperature));
        assert!(!entity.is_ready());
    }

    #[test]
    fn test_no_rebinding() {
        let node = sensor_node();
        let (mut entity, _) =
            EntityValues::new(SchemaId(0), &schema(), &node, primary(), &[temperature(1, 200)]);
        assert!(entity.is_ready());

        assert!(entity.check_value(&node, &temperature(1, 202)).is_empty());
        assert_eq!(
            entity.get(Slot::Temperature).map(|v| v.value_id),
            Some(ValueId(200))
        );
    }

    #[test]
    fn test_replaying_values_after_ready_is_silent() {
        let node = sensor_node();
        let (mut entity, _) = EntityValues::new(SchemaId(0), &schema(), &node, primary(), &[]);
        let sequence = [primary(), temperature(1, 200), off_delay()];

        let notices: Vec<Notice> = sequence
            .iter()
            .flat_map(|value| entity.check_value(&node, value))
            .collect();
        assert_eq!(
            notices,
            vec![Notice::Materialized, Notice::SlotAdded(Slot::OffDelay)]
        );
        let bound = |entity: &EntityValues| -> Vec<(Slot, ValueId)> {
            entity
                .bound_slots()
                .map(|(slot, value)| (slot, value.value_id))
                .collect()
        };
        let before = bound(&entity);

        for value in &sequence {
            assert!(entity.check_value(&node, value).is_empty());
        }
        assert_eq!(bound(&entity), before);
        assert_eq!(entity.state(), EntityState::Ready);
    }

    #[test]
    fn test_other_node_is_ignored() {
        let node = sensor_node();
        let (mut entity, _) = EntityValues::new(SchemaId(0), &schema(), &node, primary(), &[]);

        let stranger = NodeRecord::new(8, generic::SENSOR_BINARY, 1);
        let mut value = temperature(1, 500);
        value.node_id = 8;
        assert!(entity.check_value(&stranger, &value).is_empty());
    }

    #[test]
    fn test_refresh_updates_bound_copies() {
        let node = sensor_node();
        let (mut entity, _) =
            EntityValues::new(SchemaId(0), &schema(), &node, primary(), &[temperature(1, 200)]);

        let changed = temperature(1, 200).with_value(23.0);
        assert!(entity.refresh(&changed));
        assert_eq!(
            entity.get(Slot::Temperature).and_then(|v| v.value.as_float()),
            Some(23.0)
        );

        assert!(entity.refresh(&primary().with_value(true)));
        assert_eq!(entity.primary().value.as_bool(), Some(true));

        assert!(!entity.refresh(&temperature(1, 999)));
        assert!(entity.holds(ValueId(200)));
        assert!(!entity.holds(ValueId(999)));
    }

    #[test]
    fn test_slot_lookup() {
        let node = sensor_node();
        let (entity, _) = EntityValues::new(SchemaId(3), &schema(), &node, primary(), &[]);

        assert!(entity.contains_slot(Slot::Primary));
        assert!(entity.contains_slot(Slot::OffDelay));
        assert!(!entity.contains_slot(Slot::Color));
        assert_eq!(entity.get(Slot::Color), None);
        assert_eq!(entity.schema_id(), SchemaId(3));
        assert_eq!(entity.to_string(), "binary_sensor 7-100 (test binary sensor)");
    }
}
