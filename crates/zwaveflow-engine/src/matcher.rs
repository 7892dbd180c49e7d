/*!
 * Node and value predicates.
 *
 * Both matchers compare by exact equality and skip every dimension a filter
 * leaves undeclared. A declared dimension fails closed: an empty allow-list
 * matches nothing.
 */
use zwaveflow_devices::node::NodeRecord;
use zwaveflow_devices::value::ValueRecord;

use crate::schema::{NodeFilter, ValueFilter};

fn allowed<T: PartialEq>(allow: &Option<Vec<T>>, item: &T) -> bool {
    allow.as_ref().map_or(true, |allow| allow.contains(item))
}

/// Check a node against a node filter
pub fn matches_node(node: &NodeRecord, filter: &NodeFilter) -> bool {
    allowed(&filter.node_ids, &node.node_id)
        && allowed(&filter.generic, &node.generic_device_class)
        && allowed(&filter.specific, &node.specific_device_class)
}

/// Check a value against a value filter
///
/// When the filter declares alternatives at least one of them has to match
/// as well.
pub fn matches_value(value: &ValueRecord, filter: &ValueFilter) -> bool {
    if !allowed(&filter.command_classes, &value.command_class)
        || !allowed(&filter.value_types, &value.value_type)
        || !allowed(&filter.genres, &value.genre)
        || !allowed(&filter.indices, &value.index)
        || !allowed(&filter.instances, &value.instance)
    {
        return false;
    }

    match &filter.any_of {
        Some(alternatives) => alternatives.iter().any(|alt| matches_value(value, alt)),
        None => true,
    }
}
