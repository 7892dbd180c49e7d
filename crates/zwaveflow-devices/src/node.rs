//! Node records.

use serde::{Deserialize, Serialize};

/// Descriptive information about one Z-Wave node
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Daemon instance the node belongs to
    pub ozw_instance: u32,
    /// Node id within the network
    pub node_id: u8,
    /// Generic device class
    pub generic_device_class: u8,
    /// Specific device class
    pub specific_device_class: u8,
    /// Manufacturer name
    pub manufacturer_name: String,
    /// Product name
    pub product_name: String,
    /// Manufacturer id, as a hex string (`0x010f`)
    pub manufacturer_id: String,
    /// Product type, as a hex string
    pub product_type: String,
    /// Product id, as a hex string
    pub product_id: String,
    /// User assigned name
    pub name: String,
    /// User assigned location
    pub location: String,
}

impl NodeRecord {
    /// Create a node with the given device classes
    pub fn new(node_id: u8, generic_device_class: u8, specific_device_class: u8) -> Self {
        Self {
            ozw_instance: 1,
            node_id,
            generic_device_class,
            specific_device_class,
            ..Default::default()
        }
    }

    /// Set manufacturer and product names
    pub fn with_product<M: Into<String>, P: Into<String>>(mut self, manufacturer: M, product: P) -> Self {
        self.manufacturer_name = manufacturer.into();
        self.product_name = product.into();
        self
    }

    /// Display name: "{manufacturer} {product}"
    pub fn display_name(&self) -> String {
        format!("{} {}", self.manufacturer_name, self.product_name)
    }
}
