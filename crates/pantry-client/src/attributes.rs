//! Attribute trees for node configuration data.
//!
//! Node attributes are arbitrary JSON-shaped data. They are represented as a
//! tagged variant ([`Attribute`]) instead of raw `serde_json::Value` so that
//! scalar construction is explicit and trees can be walked without run-time
//! type inspection. A tree-level read-only flag covers server-computed
//! attribute sets: a read-only [`AttributeTree`] never hands out a mutable
//! handle into its nodes.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::{ClientError, ClientResult};

/// A single attribute value: scalar, sequence, or mapping.
#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<Attribute>),
    Map(BTreeMap<String, Attribute>),
}

impl Attribute {
    /// Explicit scalar constructors.
    pub fn null() -> Self {
        Self::Null
    }

    pub fn bool(value: bool) -> Self {
        Self::Bool(value)
    }

    pub fn int(value: i64) -> Self {
        Self::Int(value)
    }

    pub fn float(value: f64) -> Self {
        Self::Float(value)
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    /// Convert a parsed JSON value into an attribute tree.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => Self::String(s.clone()),
            Value::Array(items) => Self::Array(items.iter().map(Self::from_json).collect()),
            Value::Object(fields) => Self::Map(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), Self::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Render the attribute back into JSON.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::from(*i),
            Self::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Self::String(s) => Value::String(s.clone()),
            Self::Array(items) => Value::Array(items.iter().map(Attribute::to_json).collect()),
            Self::Map(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }

    /// Look up a nested value by mapping keys.
    pub fn get(&self, path: &[&str]) -> Option<&Attribute> {
        match path.split_first() {
            None => Some(self),
            Some((key, rest)) => match self {
                Self::Map(fields) => fields.get(*key)?.get(rest),
                _ => None,
            },
        }
    }

    fn get_mut(&mut self, path: &[&str]) -> Option<&mut Attribute> {
        match path.split_first() {
            None => Some(self),
            Some((key, rest)) => match self {
                Self::Map(fields) => fields.get_mut(*key)?.get_mut(rest),
                _ => None,
            },
        }
    }
}

/// One named attribute set of a node (default, normal, override, automatic).
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeTree {
    root: Attribute,
    read_only: bool,
}

impl AttributeTree {
    /// A writable tree.
    pub fn new(root: Attribute) -> Self {
        Self {
            root,
            read_only: false,
        }
    }

    /// A read-only tree; the flag applies to every node reachable from it.
    pub fn read_only(root: Attribute) -> Self {
        Self {
            root,
            read_only: true,
        }
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn root(&self) -> &Attribute {
        &self.root
    }

    /// Look up a nested value by mapping keys.
    pub fn get(&self, path: &[&str]) -> Option<&Attribute> {
        self.root.get(path)
    }

    /// Replace the value at `path`, failing on read-only trees.
    ///
    /// Intermediate mappings must already exist; a missing segment is a
    /// normal `None`-like failure reported as `Parse`.
    pub fn set(&mut self, path: &[&str], value: Attribute) -> ClientResult<()> {
        if self.read_only {
            return Err(ClientError::Config {
                message: "attribute tree is read-only".into(),
            });
        }
        match self.root.get_mut(path) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(ClientError::Parse {
                message: format!("no attribute at path {:?}", path),
            }),
        }
    }
}

impl Default for AttributeTree {
    fn default() -> Self {
        Self::new(Attribute::Map(BTreeMap::new()))
    }
}
