//! The Value type - one node of a complex feature.
//!
//! Complex features are trees: leaves are scalars or geometries, internal
//! nodes map attribute names to child values, and multi-valued attributes
//! hold an array of values.

use std::collections::BTreeMap;

use crate::{GeometryValue, Path};

/// A node in a complex feature.
///
/// # Design Notes
///
/// - Uses `BTreeMap` so children are ordered and looked up by name
/// - Multi-valued attributes are `Array`s of the attribute's values
/// - Geometries carry their own reference system tag (see `GeometryValue`)
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    /// An absent optional value.
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    /// A geometry tagged with its reference system.
    Geometry(GeometryValue),
    /// The values of a multi-valued attribute.
    Array(Vec<Value>),
    /// A nested complex attribute: child name to child value.
    Map(BTreeMap<String, Value>),
}

impl Value {
    pub fn as_geometry(&self) -> Option<&GeometryValue> {
        match self {
            Value::Geometry(g) => Some(g),
            _ => None,
        }
    }

    /// Get a reference to a nested value by path.
    ///
    /// Numeric components index into arrays. Returns `None` if the path
    /// doesn't exist or runs into a leaf.
    pub fn get(&self, path: &Path) -> Option<&Value> {
        let mut current = self;
        for component in path.iter() {
            current = match current {
                Value::Map(map) => map.get(component)?,
                Value::Array(arr) => {
                    let index: usize = component.parse().ok()?;
                    arr.get(index)?
                }
                _ => return None,
            };
        }
        Some(current)
    }

    /// Visit every geometry found at the attribute path `names`.
    ///
    /// `names` are attribute names only, never indexes: multi-valued
    /// attributes met along the way fan out to each of their values. Missing
    /// and null attributes are skipped, as are non-geometry leaves.
    pub fn try_for_each_geometry_at<E, F>(&mut self, names: &[String], f: &mut F) -> Result<(), E>
    where
        F: FnMut(&mut GeometryValue) -> Result<(), E>,
    {
        match self {
            Value::Array(values) => values
                .iter_mut()
                .try_for_each(|value| value.try_for_each_geometry_at(names, f)),
            Value::Geometry(geometry) if names.is_empty() => f(geometry),
            Value::Map(children) => match names.split_first() {
                Some((first, rest)) => match children.get_mut(first) {
                    Some(child) => child.try_for_each_geometry_at(rest, f),
                    None => Ok(()),
                },
                None => Ok(()),
            },
            _ => Ok(()),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<GeometryValue> for Value {
    fn from(v: GeometryValue) -> Self {
        Value::Geometry(v)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(v: BTreeMap<String, Value>) -> Self {
        Value::Map(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}
