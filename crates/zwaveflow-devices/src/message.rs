/*!
 * Decoding of daemon MQTT messages.
 *
 * The daemon publishes retained JSON documents under
 *
 * - `{prefix}{instance}/status/` for the driver state of an instance,
 * - `{prefix}{instance}/node/{node}/` for nodes and
 * - `{prefix}{instance}/node/{node}/instance/{i}/commandclass/{cc}/value/{key}/`
 *   for values.
 *
 * Identifiers are taken from the topic: the node id inside a value payload is
 * not reliable. The first message seen for a node or value is reported as
 * "added", later ones as "changed". A value only counts as seen once its
 * node has been seen, so a value published ahead of its node is reported as
 * "added" again after the node shows up.
 */
use std::collections::HashSet;

use serde::Deserialize;
use tracing::trace;

use zwaveflow_core::types::Value;

use crate::command_class::CommandClass;
use crate::error::{DeviceError, Result};
use crate::node::NodeRecord;
use crate::status::{DriverState, InstanceStatus};
use crate::value::{ValueGenre, ValueId, ValueRecord, ValueType};

/// A decoded daemon notification
#[derive(Debug, Clone, PartialEq)]
pub enum OzwEvent {
    /// A node was seen for the first time
    NodeAdded(NodeRecord),
    /// A known node was republished
    NodeChanged(NodeRecord),
    /// A value was seen for the first time
    ValueAdded(ValueRecord),
    /// A known value was republished
    ValueChanged(ValueRecord),
    /// A daemon instance reported its driver state
    InstanceStatus(InstanceStatus),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StatusPayload {
    status: DriverState,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct NodePayload {
    #[serde(default)]
    node_manufacturer_name: String,
    #[serde(default)]
    node_product_name: String,
    #[serde(default)]
    node_generic: u8,
    #[serde(default)]
    node_specific: u8,
    #[serde(default, rename = "NodeManufacturerID")]
    node_manufacturer_id: String,
    #[serde(default)]
    node_product_type: String,
    #[serde(default, rename = "NodeProductID")]
    node_product_id: String,
    #[serde(default)]
    node_name: String,
    #[serde(default)]
    node_location: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ValuePayload {
    #[serde(default)]
    label: String,
    #[serde(default)]
    value: Value,
    #[serde(default)]
    units: String,
    #[serde(default, rename = "Type")]
    value_type: ValueType,
    #[serde(default)]
    index: u16,
    #[serde(default)]
    genre: ValueGenre,
    #[serde(default)]
    read_only: bool,
    #[serde(default)]
    write_only: bool,
    #[serde(default)]
    help: String,
}

enum Route {
    Status {
        ozw_instance: u32,
    },
    Node {
        ozw_instance: u32,
        node_id: u8,
    },
    Value {
        ozw_instance: u32,
        node_id: u8,
        instance: u8,
        command_class: u8,
        value_id: u64,
    },
}

/// Stateful decoder turning daemon messages into [`OzwEvent`]s
#[derive(Debug)]
pub struct OzwMessageDecoder {
    prefix: String,
    seen_nodes: HashSet<(u32, u8)>,
    seen_values: HashSet<ValueId>,
}

impl OzwMessageDecoder {
    /// Create a decoder for topics under `prefix` (e.g. `OpenZWave/`)
    pub fn new<S: Into<String>>(prefix: S) -> Self {
        Self {
            prefix: prefix.into(),
            seen_nodes: HashSet::new(),
            seen_values: HashSet::new(),
        }
    }

    /// The topic prefix this decoder accepts
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Subscription filter covering every daemon topic
    pub fn subscription(&self) -> String {
        format!("{}#", self.prefix)
    }

    /// Decode one message
    ///
    /// Returns `Ok(None)` for topics outside the node/value layout and for
    /// empty payloads.
    pub fn decode(&mut self, topic: &str, payload: &[u8]) -> Result<Option<OzwEvent>> {
        let route = match self.route(topic)? {
            Some(route) => route,
            None => {
                trace!("Ignoring topic {}", topic);
                return Ok(None);
            }
        };

        if payload.iter().all(u8::is_ascii_whitespace) {
            trace!("Ignoring empty payload on {}", topic);
            return Ok(None);
        }

        match route {
            Route::Status { ozw_instance } => {
                let payload: StatusPayload = serde_json::from_slice(payload)
                    .map_err(|e| DeviceError::invalid_payload(topic, e))?;
                Ok(Some(OzwEvent::InstanceStatus(InstanceStatus::new(
                    ozw_instance,
                    payload.status,
                ))))
            }
            Route::Node {
                ozw_instance,
                node_id,
            } => {
                let payload: NodePayload = serde_json::from_slice(payload)
                    .map_err(|e| DeviceError::invalid_payload(topic, e))?;
                let node = NodeRecord {
                    ozw_instance,
                    node_id,
                    generic_device_class: payload.node_generic,
                    specific_device_class: payload.node_specific,
                    manufacturer_name: payload.node_manufacturer_name,
                    product_name: payload.node_product_name,
                    manufacturer_id: payload.node_manufacturer_id,
                    product_type: payload.node_product_type,
                    product_id: payload.node_product_id,
                    name: payload.node_name,
                    location: payload.node_location,
                };
                if self.seen_nodes.insert((ozw_instance, node_id)) {
                    Ok(Some(OzwEvent::NodeAdded(node)))
                } else {
                    Ok(Some(OzwEvent::NodeChanged(node)))
                }
            }
            Route::Value {
                ozw_instance,
                node_id,
                instance,
                command_class,
                value_id,
            } => {
                let payload: ValuePayload = serde_json::from_slice(payload)
                    .map_err(|e| DeviceError::invalid_payload(topic, e))?;
                let value = ValueRecord {
                    ozw_instance,
                    node_id,
                    instance,
                    command_class: CommandClass::from_id(command_class),
                    index: payload.index,
                    genre: payload.genre,
                    value_type: payload.value_type,
                    value: payload.value,
                    value_id: ValueId(value_id),
                    label: payload.label,
                    units: payload.units,
                    read_only: payload.read_only,
                    write_only: payload.write_only,
                    help: payload.help,
                };
                if !self.seen_nodes.contains(&(ozw_instance, node_id)) {
                    trace!("Value {} arrived before node {}", value.value_id, node_id);
                    return Ok(Some(OzwEvent::ValueAdded(value)));
                }
                if self.seen_values.insert(value.value_id) {
                    Ok(Some(OzwEvent::ValueAdded(value)))
                } else {
                    Ok(Some(OzwEvent::ValueChanged(value)))
                }
            }
        }
    }

    fn route(&self, topic: &str) -> Result<Option<Route>> {
        let rest = match topic.strip_prefix(self.prefix.as_str()) {
            Some(rest) => rest,
            None => return Ok(None),
        };
        let parts: Vec<&str> = rest.split('/').filter(|p| !p.is_empty()).collect();

        let route = match parts.as_slice() {
            [ozw_instance, "status"] => Route::Status {
                ozw_instance: parse(topic, ozw_instance)?,
            },
            [ozw_instance, "node", node_id] => Route::Node {
                ozw_instance: parse(topic, ozw_instance)?,
                node_id: parse(topic, node_id)?,
            },
            [ozw_instance, "node", node_id, "instance", instance, "commandclass", cc, "value", key] => {
                Route::Value {
                    ozw_instance: parse(topic, ozw_instance)?,
                    node_id: parse(topic, node_id)?,
                    instance: parse(topic, instance)?,
                    command_class: parse(topic, cc)?,
                    value_id: parse(topic, key)?,
                }
            }
            _ => return Ok(None),
        };
        Ok(Some(route))
    }
}

fn parse<T: std::str::FromStr>(topic: &str, segment: &str) -> Result<T> {
    segment
        .parse()
        .map_err(|_| DeviceError::InvalidTopic(topic.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENE_TOPIC: &str =
        "OpenZWave/1/node/39/instance/1/commandclass/43/value/562950622511127/";
    const SCENE_PAYLOAD: &str = r#"{
        "Label": "Scene",
        "Value": 16,
        "Units": "",
        "Min": -2147483648,
        "Max": 2147483647,
        "Type": "Int",
        "Instance": 1,
        "CommandClass": "COMMAND_CLASS_SCENE_ACTIVATION",
        "Index": 0,
        "Node": 7,
        "Genre": "User",
        "Help": "",
        "ValueIDKey": 122339347,
        "ReadOnly": false,
        "WriteOnly": false,
        "Event": "valueChanged",
        "TimeStamp": 1579630367
    }"#;

    #[test]
    fn test_value_topic_wins_over_payload() {
        let mut decoder = OzwMessageDecoder::new("OpenZWave/");
        let event = decoder
            .decode(SCENE_TOPIC, SCENE_PAYLOAD.as_bytes())
            .unwrap()
            .expect("value event");

        match event {
            OzwEvent::ValueAdded(value) => {
                assert_eq!(value.node_id, 39);
                assert_eq!(value.ozw_instance, 1);
                assert_eq!(value.instance, 1);
                assert_eq!(value.command_class, CommandClass::SceneActivation);
                assert_eq!(value.value_id, ValueId(562950622511127));
                assert_eq!(value.value, Value::Integer(16));
                assert_eq!(value.value_type, ValueType::Int);
                assert_eq!(value.genre, ValueGenre::User);
                assert_eq!(value.label, "Scene");
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    const SCENE_NODE_TOPIC: &str = "OpenZWave/1/node/39/";
    const SCENE_NODE_PAYLOAD: &str = r#"{"NodeID": 39, "NodeGeneric": 24, "NodeSpecific": 1}"#;

    #[test_log::test]
    fn test_second_sighting_is_a_change() {
        let mut decoder = OzwMessageDecoder::new("OpenZWave/");
        decoder
            .decode(SCENE_NODE_TOPIC, SCENE_NODE_PAYLOAD.as_bytes())
            .unwrap();
        let first = decoder.decode(SCENE_TOPIC, SCENE_PAYLOAD.as_bytes()).unwrap();
        let second = decoder.decode(SCENE_TOPIC, SCENE_PAYLOAD.as_bytes()).unwrap();

        assert!(matches!(first, Some(OzwEvent::ValueAdded(_))));
        assert!(matches!(second, Some(OzwEvent::ValueChanged(_))));
    }

    #[test_log::test]
    fn test_value_before_node_is_added_again() {
        let mut decoder = OzwMessageDecoder::new("OpenZWave/");

        let early = decoder.decode(SCENE_TOPIC, SCENE_PAYLOAD.as_bytes()).unwrap();
        let node = decoder
            .decode(SCENE_NODE_TOPIC, SCENE_NODE_PAYLOAD.as_bytes())
            .unwrap();
        let again = decoder.decode(SCENE_TOPIC, SCENE_PAYLOAD.as_bytes()).unwrap();
        let later = decoder.decode(SCENE_TOPIC, SCENE_PAYLOAD.as_bytes()).unwrap();

        assert!(matches!(early, Some(OzwEvent::ValueAdded(_))));
        assert!(matches!(node, Some(OzwEvent::NodeAdded(_))));
        assert!(matches!(again, Some(OzwEvent::ValueAdded(_))));
        assert!(matches!(later, Some(OzwEvent::ValueChanged(_))));
    }

    #[test]
    fn test_instance_status() {
        let mut decoder = OzwMessageDecoder::new("OpenZWave/");
        let payload = br#"{
            "Status": "driverAllNodesQueried",
            "TimeStamp": 1579566933,
            "ManufacturerSpecificDBReady": true,
            "homeID": 3245146787,
            "getControllerNodeId": 1
        }"#;

        let event = decoder.decode("OpenZWave/1/status/", payload).unwrap();
        match event {
            Some(OzwEvent::InstanceStatus(status)) => {
                assert_eq!(status.ozw_instance, 1);
                assert_eq!(status.state, DriverState::AllNodesQueried);
                assert!(status.is_ready());
            }
            other => panic!("unexpected event {:?}", other),
        }

        assert!(matches!(
            decoder.decode("OpenZWave/1/status/", b"{}"),
            Err(DeviceError::InvalidPayload { .. })
        ));
    }

    #[test]
    fn test_node_payload() {
        let mut decoder = OzwMessageDecoder::new("OpenZWave/");
        let payload = br#"{
            "NodeID": 32,
            "NodeManufacturerName": "Fibargroup",
            "NodeProductName": "FGRM222 Roller Shutter Controller 2",
            "NodeGeneric": 17,
            "NodeSpecific": 6,
            "NodeManufacturerID": "0x010f",
            "NodeProductType": "0x0302",
            "NodeProductID": "0x1000",
            "NodeName": "",
            "NodeLocation": ""
        }"#;

        let event = decoder.decode("OpenZWave/1/node/32/", payload).unwrap();
        match event {
            Some(OzwEvent::NodeAdded(node)) => {
                assert_eq!(node.node_id, 32);
                assert_eq!(node.generic_device_class, 0x11);
                assert_eq!(node.specific_device_class, 0x06);
                assert_eq!(node.manufacturer_id, "0x010f");
                assert_eq!(node.product_type, "0x0302");
                assert_eq!(node.display_name(), "Fibargroup FGRM222 Roller Shutter Controller 2");
            }
            other => panic!("unexpected event {:?}", other),
        }

        let event = decoder.decode("OpenZWave/1/node/32", payload).unwrap();
        assert!(matches!(event, Some(OzwEvent::NodeChanged(_))));
    }

    #[test]
    fn test_unrelated_topics_and_empty_payloads() {
        let mut decoder = OzwMessageDecoder::new("OpenZWave/");
        assert_eq!(decoder.decode("OpenZWave/1/status/", b"").unwrap(), None);
        assert_eq!(
            decoder.decode("OpenZWave/1/node/3/statistics/", b"{}").unwrap(),
            None
        );
        assert_eq!(decoder.decode("homeassistant/light/x", b"{}").unwrap(), None);
        assert_eq!(decoder.decode("OpenZWave/1/node/3/", b"").unwrap(), None);
    }

    #[test]
    fn test_malformed_input() {
        let mut decoder = OzwMessageDecoder::new("OpenZWave/");
        assert!(matches!(
            decoder.decode("OpenZWave/1/node/abc/", b"{}"),
            Err(DeviceError::InvalidTopic(_))
        ));
        assert!(matches!(
            decoder.decode("OpenZWave/1/node/3/", b"{not json"),
            Err(DeviceError::InvalidPayload { .. })
        ));
    }

    #[test]
    fn test_subscription() {
        let decoder = OzwMessageDecoder::new("OpenZWave/");
        assert_eq!(decoder.subscription(), "OpenZWave/#");
        assert_eq!(decoder.prefix(), "OpenZWave/");
    }
}
