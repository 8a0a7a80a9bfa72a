//! The Feature type - one complex record pulled from a stream.

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::{Error, GeometryValue, Path, Schema, Value};

/// Identifier of a feature. Immutable once the feature is built.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct FeatureId(String);

impl FeatureId {
    pub fn new(id: impl Into<String>) -> Self {
        FeatureId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque metadata attached to a feature.
///
/// Entries are shared by reference: cloning the bag, or carrying it into a
/// rebuilt feature, clones the `Arc`s and never the entries themselves.
#[derive(Clone, Default)]
pub struct UserData {
    entries: HashMap<String, Arc<dyn Any + Send + Sync>>,
}

impl UserData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.entries.insert(key.into(), Arc::new(value));
    }

    pub fn get(&self, key: &str) -> Option<&Arc<dyn Any + Send + Sync>> {
        self.entries.get(key)
    }

    /// Get an entry downcast to a concrete type.
    pub fn get_as<T: Any>(&self, key: &str) -> Option<&T> {
        self.entries.get(key)?.downcast_ref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl fmt::Debug for UserData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&str> = self.keys().collect();
        keys.sort_unstable();
        f.debug_struct("UserData").field("keys", &keys).finish()
    }
}

/// A complex feature: an identifier, a tree of named attribute values
/// conforming to a schema, and a bag of opaque user data.
#[derive(Clone, Debug)]
pub struct Feature {
    id: FeatureId,
    schema: Arc<Schema>,
    values: BTreeMap<String, Value>,
    user_data: UserData,
}

impl Feature {
    /// Build a feature, checking the values against the schema.
    pub fn new(
        id: FeatureId,
        schema: Arc<Schema>,
        values: BTreeMap<String, Value>,
    ) -> Result<Self, Error> {
        schema.check_values(&values)?;
        Ok(Self {
            id,
            schema,
            values,
            user_data: UserData::new(),
        })
    }

    #[must_use]
    pub fn with_user_data(mut self, user_data: UserData) -> Self {
        self.user_data = user_data;
        self
    }

    pub fn id(&self) -> &FeatureId {
        &self.id
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn values(&self) -> &BTreeMap<String, Value> {
        &self.values
    }

    pub fn user_data(&self) -> &UserData {
        &self.user_data
    }

    /// Get a value by attribute path.
    pub fn get(&self, path: &Path) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        self.values.get(first)?.get(&Path {
            components: rest.to_vec(),
        })
    }

    /// Visit every geometry stored under the attribute path `path`, fanning
    /// out over multi-valued attributes. Absent values are skipped.
    pub fn try_for_each_geometry_mut<E, F>(&mut self, path: &Path, f: &mut F) -> Result<(), E>
    where
        F: FnMut(&mut GeometryValue) -> Result<(), E>,
    {
        let Some((first, rest)) = path.split_first() else {
            return Ok(());
        };
        match self.values.get_mut(first) {
            Some(value) => value.try_for_each_geometry_at(rest, f),
            None => Ok(()),
        }
    }

    /// Re-express this feature under another schema.
    ///
    /// Values are kept as they are; they are checked against `schema`, and
    /// each geometry's reference system tag is relabeled to what its
    /// descriptor in `schema` declares. Coordinates are never touched. The
    /// identifier and user data are carried over.
    pub fn retype(mut self, schema: Arc<Schema>) -> Result<Feature, Error> {
        schema.check_values(&self.values)?;
        for (path, declared) in schema.geometry_attributes() {
            if let Some(crs) = declared {
                self.try_for_each_geometry_mut(&path, &mut |geometry: &mut GeometryValue| {
                    geometry.set_crs(Some(crs.clone()));
                    Ok::<_, Error>(())
                })?;
            }
        }
        self.schema = schema;
        Ok(self)
    }
}
