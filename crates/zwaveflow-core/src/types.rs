/*!
 * Core data types for zwaveflow.
 *
 * This module defines the value payload shared by inbound telemetry and
 * outbound commands.
 */
use std::fmt;

use serde::{Deserialize, Serialize};

/// One selectable entry of a list value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListOption {
    /// Numeric id of the option
    #[serde(rename = "Value")]
    pub value: i64,
    /// Human readable label
    #[serde(rename = "Label")]
    pub label: String,
}

/// A labeled option list with the currently selected entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListValue {
    /// All options offered by the device
    #[serde(rename = "List", default)]
    pub options: Vec<ListOption>,
    /// Label of the selected option
    #[serde(rename = "Selected", default)]
    pub selected: Option<String>,
    /// Id of the selected option
    #[serde(rename = "Selected_id", default)]
    pub selected_id: Option<i64>,
}

impl ListValue {
    /// Look up the label of an option by id
    pub fn label_for(&self, id: i64) -> Option<&str> {
        self.options
            .iter()
            .find(|option| option.value == id)
            .map(|option| option.label.as_str())
    }

    /// Look up the id of an option by label
    pub fn id_for(&self, label: &str) -> Option<i64> {
        self.options
            .iter()
            .find(|option| option.label == label)
            .map(|option| option.value)
    }

    /// Check whether an option id is offered
    pub fn contains(&self, id: i64) -> bool {
        self.options.iter().any(|option| option.value == id)
    }
}

/// A value payload as carried by the Z-Wave daemon
///
/// Scalars map to their natural variant; list values carry their options
/// together with the current selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// No value reported yet
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Integer(i64),
    /// Floating-point value
    Float(f64),
    /// String value
    String(String),
    /// Option list with a selection
    List(ListValue),
}

impl Value {
    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if the value is numeric (integer or float)
    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Float(_))
    }

    /// Check if the value is an option list
    pub fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }

    /// Try to get a boolean value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get an integer value
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Float(f) if *f == (*f as i64) as f64 => Some(*f as i64),
            _ => None,
        }
    }

    /// Try to get a float value
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Try to get a string value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get an option list
    pub fn as_list(&self) -> Option<&ListValue> {
        match self {
            Value::List(list) => Some(list),
            _ => None,
        }
    }

    /// Id of the selected option, for list values
    pub fn selected_id(&self) -> Option<i64> {
        self.as_list().and_then(|list| list.selected_id)
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::String(s) => write!(f, "{}", s),
            Value::List(list) => match (&list.selected, list.selected_id) {
                (Some(label), Some(id)) => write!(f, "{} ({})", label, id),
                (Some(label), None) => write!(f, "{}", label),
                (None, Some(id)) => write!(f, "{}", id),
                (None, None) => write!(f, "<unselected>"),
            },
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i as i64)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<u8> for Value {
    fn from(i: u8) -> Self {
        Value::Integer(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<ListValue> for Value {
    fn from(list: ListValue) -> Self {
        Value::List(list)
    }
}
