//! Declarative pipeline specifications.
//!
//! A specification is a schema-free tree, usually read from JSON:
//!
//! ```json
//! {
//!     "color": { "type": "sequence gradient", "gradient": ["red", "blue"] },
//!     "render": "ball and stick",
//!     "scale": 0.2
//! }
//! ```
//!
//! The reserved role keys select subgraph templates; everything else is a
//! literal parameter available to every subgraph input of the same name.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One node of a specification tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpecValue {
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<SpecValue>),
    Map(BTreeMap<String, SpecValue>),
}

impl SpecValue {
    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let table: toml::Table = toml::from_str(s)?;
        Ok(Self::from(toml::Value::Table(table)))
    }

    /// An empty map.
    pub fn empty_map() -> Self {
        SpecValue::Map(BTreeMap::new())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SpecValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SpecValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SpecValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[SpecValue]> {
        match self {
            SpecValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, SpecValue>> {
        match self {
            SpecValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Look up `key` if this is a map.
    pub fn get(&self, key: &str) -> Option<&SpecValue> {
        self.as_map().and_then(|m| m.get(key))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SpecValue::Bool(_) => "bool",
            SpecValue::Number(_) => "number",
            SpecValue::String(_) => "string",
            SpecValue::List(_) => "list",
            SpecValue::Map(_) => "map",
        }
    }
}

impl fmt::Display for SpecValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecValue::Bool(b) => write!(f, "{}", b),
            SpecValue::Number(n) => write!(f, "{}", n),
            SpecValue::String(s) => write!(f, "{:?}", s),
            SpecValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            SpecValue::Map(map) => {
                write!(f, "{{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<toml::Value> for SpecValue {
    fn from(value: toml::Value) -> Self {
        match value {
            toml::Value::String(s) => SpecValue::String(s),
            toml::Value::Integer(i) => SpecValue::Number(i as f64),
            toml::Value::Float(f) => SpecValue::Number(f),
            toml::Value::Boolean(b) => SpecValue::Bool(b),
            toml::Value::Datetime(d) => SpecValue::String(d.to_string()),
            toml::Value::Array(items) => {
                SpecValue::List(items.into_iter().map(SpecValue::from).collect())
            }
            toml::Value::Table(table) => SpecValue::Map(
                table
                    .into_iter()
                    .map(|(k, v)| (k, SpecValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for SpecValue {
    fn from(s: &str) -> Self {
        SpecValue::String(s.to_string())
    }
}

impl From<String> for SpecValue {
    fn from(s: String) -> Self {
        SpecValue::String(s)
    }
}

impl From<f64> for SpecValue {
    fn from(n: f64) -> Self {
        SpecValue::Number(n)
    }
}

impl From<bool> for SpecValue {
    fn from(b: bool) -> Self {
        SpecValue::Bool(b)
    }
}

impl<T: Into<SpecValue>> From<Vec<T>> for SpecValue {
    fn from(items: Vec<T>) -> Self {
        SpecValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl<K: Into<String>, V: Into<SpecValue>> FromIterator<(K, V)> for SpecValue {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        SpecValue::Map(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
