/*!
 * Node registry.
 *
 * Keeps every known node together with the values reported for it, in the
 * order they were first seen. Nodes are replaced in place when they change
 * and are never removed during a session.
 */
use std::collections::{BTreeMap, HashMap};

use tracing::{debug, trace};

use crate::node::NodeRecord;
use crate::value::{ValueId, ValueRecord};

/// Outcome of storing a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueStored {
    /// First time the value was stored
    Inserted,
    /// An existing value was replaced in place
    Replaced,
}

#[derive(Debug)]
struct NodeEntry {
    node: NodeRecord,
    values: Vec<ValueRecord>,
    positions: HashMap<ValueId, usize>,
}

/// Registry of nodes and their values
#[derive(Debug, Default)]
pub struct NodeRegistry {
    nodes: BTreeMap<u8, NodeEntry>,
    owners: HashMap<ValueId, u8>,
}

impl NodeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a node, returning true if it was not known before
    pub fn upsert_node(&mut self, node: NodeRecord) -> bool {
        let node_id = node.node_id;
        match self.nodes.get_mut(&node_id) {
            Some(entry) => {
                trace!("Replacing node {}", node_id);
                entry.node = node;
                false
            }
            None => {
                debug!("Registered node {}", node_id);
                self.nodes.insert(
                    node_id,
                    NodeEntry {
                        node,
                        values: Vec::new(),
                        positions: HashMap::new(),
                    },
                );
                true
            }
        }
    }

    /// Get a node by id
    pub fn node(&self, node_id: u8) -> Option<&NodeRecord> {
        self.nodes.get(&node_id).map(|entry| &entry.node)
    }

    /// Whether a node is known
    pub fn contains_node(&self, node_id: u8) -> bool {
        self.nodes.contains_key(&node_id)
    }

    /// Ids of all known nodes, ascending
    pub fn node_ids(&self) -> impl Iterator<Item = u8> + '_ {
        self.nodes.keys().copied()
    }

    /// Number of known nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether no node is known
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Store a value under its node
    ///
    /// Returns `None` when the node is unknown; the value is not stored.
    pub fn store_value(&mut self, value: ValueRecord) -> Option<ValueStored> {
        let node_id = value.node_id;
        let entry = self.nodes.get_mut(&node_id)?;

        if let Some(&position) = entry.positions.get(&value.value_id) {
            entry.values[position] = value;
            return Some(ValueStored::Replaced);
        }

        // A value id belongs to exactly one node
        if let Some(previous) = self.owners.insert(value.value_id, node_id) {
            if previous != node_id {
                debug!(
                    "Value {} moved from node {} to node {}",
                    value.value_id, previous, node_id
                );
                if let Some(old) = self.nodes.get_mut(&previous) {
                    old.remove(value.value_id);
                }
            }
        }

        let entry = self.nodes.get_mut(&node_id)?;
        entry.positions.insert(value.value_id, entry.values.len());
        entry.values.push(value);
        Some(ValueStored::Inserted)
    }

    /// Get a value by id
    pub fn value(&self, value_id: ValueId) -> Option<&ValueRecord> {
        let node_id = self.owners.get(&value_id)?;
        let entry = self.nodes.get(node_id)?;
        let position = entry.positions.get(&value_id)?;
        entry.values.get(*position)
    }

    /// All values of a node in the order they were first stored
    pub fn values(&self, node_id: u8) -> impl Iterator<Item = &ValueRecord> + '_ {
        self.nodes
            .get(&node_id)
            .map(|entry| entry.values.as_slice())
            .unwrap_or(&[])
            .iter()
    }
}

impl NodeEntry {
    fn remove(&mut self, value_id: ValueId) {
        if let Some(position) = self.positions.remove(&value_id) {
            self.values.remove(position);
            for index in self.positions.values_mut() {
                if *index > position {
                    *index -= 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command_class::CommandClass;
    use zwaveflow_core::types::Value;

    fn value(node_id: u8, id: u64) -> ValueRecord {
        ValueRecord::new(node_id, CommandClass::SwitchBinary, 0, ValueId(id))
    }

    #[test]
    fn test_node_upsert() {
        let mut registry = NodeRegistry::new();
        assert!(registry.upsert_node(NodeRecord::new(3, 0x10, 0x01)));
        assert!(!registry.upsert_node(NodeRecord::new(3, 0x11, 0x01)));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.node(3).map(|n| n.generic_device_class), Some(0x11));
    }

    #[test]
    fn test_value_for_unknown_node_is_not_stored() {
        let mut registry = NodeRegistry::new();
        assert_eq!(registry.store_value(value(9, 1)), None);
        assert!(registry.value(ValueId(1)).is_none());
    }

    #[test]
    fn test_values_keep_insertion_order() {
        let mut registry = NodeRegistry::new();
        registry.upsert_node(NodeRecord::new(3, 0x10, 0x01));

        assert_eq!(registry.store_value(value(3, 30)), Some(ValueStored::Inserted));
        assert_eq!(registry.store_value(value(3, 10)), Some(ValueStored::Inserted));
        assert_eq!(
            registry.store_value(value(3, 30).with_value(true)),
            Some(ValueStored::Replaced)
        );

        let ids: Vec<u64> = registry.values(3).map(|v| v.value_id.0).collect();
        assert_eq!(ids, vec![30, 10]);
        assert_eq!(registry.value(ValueId(30)).map(|v| &v.value), Some(&Value::Bool(true)));
        assert_eq!(registry.values(4).count(), 0);
    }

    #[test]
    fn test_value_moving_between_nodes() {
        let mut registry = NodeRegistry::new();
        registry.upsert_node(NodeRecord::new(3, 0x10, 0x01));
        registry.upsert_node(NodeRecord::new(4, 0x10, 0x01));

        registry.store_value(value(3, 1));
        registry.store_value(value(3, 2));
        registry.store_value(value(4, 1));

        let ids: Vec<u64> = registry.values(3).map(|v| v.value_id.0).collect();
        assert_eq!(ids, vec![2]);
        assert_eq!(registry.value(ValueId(2)).map(|v| v.node_id), Some(3));
        assert_eq!(registry.value(ValueId(1)).map(|v| v.node_id), Some(4));
    }
}
