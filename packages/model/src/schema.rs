//! Schemas for complex features, and the reference system rewriter.
//!
//! A `Schema` is a tree of `AttributeDescriptor`s mirroring the shape of the
//! features it describes. Geometry descriptors declare the reference system
//! of the geometries stored under them.

use std::collections::{BTreeMap, HashSet};

use crate::path::validate_name;
use crate::{Crs, Error, Path, Value};

/// The kind of value an attribute holds.
#[derive(Clone, Debug, PartialEq)]
pub enum AttributeType {
    Bool,
    Integer,
    Float,
    String,
    Bytes,
    /// A geometry expressed in the declared reference system (if known).
    Geometry { crs: Option<Crs> },
    /// A nested complex attribute with its own child descriptors.
    Complex(Vec<AttributeDescriptor>),
}

/// Describes one named attribute of a schema.
#[derive(Clone, Debug, PartialEq)]
pub struct AttributeDescriptor {
    name: String,
    attribute_type: AttributeType,
    multiple: bool,
}

impl AttributeDescriptor {
    pub fn new(name: impl Into<String>, attribute_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            attribute_type,
            multiple: false,
        }
    }

    pub fn geometry(name: impl Into<String>, crs: Option<Crs>) -> Self {
        Self::new(name, AttributeType::Geometry { crs })
    }

    pub fn complex(name: impl Into<String>, children: Vec<AttributeDescriptor>) -> Self {
        Self::new(name, AttributeType::Complex(children))
    }

    /// Mark the attribute as multi-valued.
    #[must_use]
    pub fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attribute_type(&self) -> &AttributeType {
        &self.attribute_type
    }

    pub fn is_multiple(&self) -> bool {
        self.multiple
    }

    pub fn is_geometry(&self) -> bool {
        matches!(self.attribute_type, AttributeType::Geometry { .. })
    }

    /// The declared reference system, for geometry descriptors.
    pub fn crs(&self) -> Option<&Crs> {
        match &self.attribute_type {
            AttributeType::Geometry { crs } => crs.as_ref(),
            _ => None,
        }
    }

    fn children(&self) -> &[AttributeDescriptor] {
        match &self.attribute_type {
            AttributeType::Complex(children) => children,
            _ => &[],
        }
    }
}

/// The type of a feature stream.
#[derive(Clone, Debug, PartialEq)]
pub struct Schema {
    name: String,
    attributes: Vec<AttributeDescriptor>,
    default_geometry: Option<Path>,
}

impl Schema {
    /// Create a schema, checking that every attribute name is a valid
    /// identifier and unique among its siblings.
    pub fn new(
        name: impl Into<String>,
        attributes: Vec<AttributeDescriptor>,
    ) -> Result<Self, Error> {
        check_names(&attributes, 0)?;
        Ok(Self {
            name: name.into(),
            attributes,
            default_geometry: None,
        })
    }

    /// Designate the geometry attribute whose reference system is the
    /// schema's own reference system.
    pub fn with_default_geometry(mut self, path: Path) -> Result<Self, Error> {
        match self.descriptor(&path) {
            Some(descriptor) if descriptor.is_geometry() => {
                self.default_geometry = Some(path);
                Ok(self)
            }
            _ => Err(Error::schema_incompatible(format!(
                "default geometry '{}' is not a geometry attribute of '{}'",
                path, self.name
            ))),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &[AttributeDescriptor] {
        &self.attributes
    }

    pub fn default_geometry(&self) -> Option<&Path> {
        self.default_geometry.as_ref()
    }

    /// Look up a descriptor by attribute path.
    pub fn descriptor(&self, path: &Path) -> Option<&AttributeDescriptor> {
        let (first, rest) = path.split_first()?;
        let mut current = self.attributes.iter().find(|a| a.name == first)?;
        for name in rest {
            current = current.children().iter().find(|a| &a.name == name)?;
        }
        Some(current)
    }

    /// Every geometry attribute at any depth, depth-first in declaration
    /// order, with its declared reference system.
    pub fn geometry_attributes(&self) -> Vec<(Path, Option<&Crs>)> {
        let mut found = Vec::new();
        collect_geometries(&self.attributes, &Path::root(), &mut found);
        found
    }

    /// The schema's reference system: the default geometry's declared
    /// system, or else the first geometry attribute's.
    pub fn crs(&self) -> Option<&Crs> {
        match &self.default_geometry {
            Some(path) => self.descriptor(path).and_then(AttributeDescriptor::crs),
            None => self
                .geometry_attributes()
                .into_iter()
                .next()
                .and_then(|(_, crs)| crs),
        }
    }

    /// Whether rewriting to `crs` would leave every geometry declaration
    /// unchanged.
    pub fn declares_crs(&self, crs: &Crs, only_missing: bool) -> bool {
        self.geometry_attributes()
            .into_iter()
            .all(|(_, declared)| match declared {
                Some(declared) => only_missing || declared == crs,
                None => false,
            })
    }

    /// Produce a structurally identical schema whose geometry attributes
    /// declare `crs`.
    ///
    /// With `only_missing`, only geometry attributes with no declared
    /// reference system are rewritten. With `strict`, a schema that has no
    /// geometry attribute at all is rejected, since it cannot carry the
    /// reference system.
    pub fn with_crs(&self, crs: &Crs, only_missing: bool, strict: bool) -> Result<Schema, Error> {
        if strict && self.geometry_attributes().is_empty() {
            return Err(Error::schema_incompatible(format!(
                "schema '{}' has no geometry attribute to declare {}",
                self.name, crs
            )));
        }
        Ok(Schema {
            name: self.name.clone(),
            attributes: rewrite_crs(&self.attributes, crs, only_missing),
            default_geometry: self.default_geometry.clone(),
        })
    }

    /// Check that `values` fit this schema: every attribute is declared,
    /// only multi-valued attributes hold arrays, and each value matches its
    /// descriptor's type. Absent and null attributes are always accepted.
    pub fn check_values(&self, values: &BTreeMap<String, Value>) -> Result<(), Error> {
        check_map(&self.attributes, values, &Path::root())
    }
}

/// Whether a stream with `schema` needs reprojecting to reach `target`:
/// true when any geometry attribute declares a different reference system.
pub fn needs_reprojection(schema: &Schema, target: &Crs) -> bool {
    schema
        .geometry_attributes()
        .into_iter()
        .any(|(_, declared)| declared.is_some_and(|declared| declared != target))
}

fn check_names(attributes: &[AttributeDescriptor], depth: usize) -> Result<(), Error> {
    let mut seen = HashSet::new();
    for attribute in attributes {
        validate_name(&attribute.name, depth)?;
        if !seen.insert(attribute.name.as_str()) {
            return Err(Error::schema_incompatible(format!(
                "duplicate attribute name '{}'",
                attribute.name
            )));
        }
        check_names(attribute.children(), depth + 1)?;
    }
    Ok(())
}

fn collect_geometries<'a>(
    attributes: &'a [AttributeDescriptor],
    parent: &Path,
    found: &mut Vec<(Path, Option<&'a Crs>)>,
) {
    for attribute in attributes {
        let mut components = parent.components.clone();
        components.push(attribute.name.clone());
        let path = Path { components };
        match &attribute.attribute_type {
            AttributeType::Geometry { crs } => found.push((path, crs.as_ref())),
            AttributeType::Complex(children) => collect_geometries(children, &path, found),
            _ => {}
        }
    }
}

fn rewrite_crs(
    attributes: &[AttributeDescriptor],
    crs: &Crs,
    only_missing: bool,
) -> Vec<AttributeDescriptor> {
    attributes
        .iter()
        .map(|attribute| {
            let attribute_type = match &attribute.attribute_type {
                AttributeType::Geometry { crs: declared } if only_missing && declared.is_some() => {
                    attribute.attribute_type.clone()
                }
                AttributeType::Geometry { .. } => AttributeType::Geometry {
                    crs: Some(crs.clone()),
                },
                AttributeType::Complex(children) => {
                    AttributeType::Complex(rewrite_crs(children, crs, only_missing))
                }
                other => other.clone(),
            };
            AttributeDescriptor {
                name: attribute.name.clone(),
                attribute_type,
                multiple: attribute.multiple,
            }
        })
        .collect()
}

fn check_map(
    attributes: &[AttributeDescriptor],
    values: &BTreeMap<String, Value>,
    parent: &Path,
) -> Result<(), Error> {
    for (name, value) in values {
        let descriptor = attributes
            .iter()
            .find(|a| &a.name == name)
            .ok_or_else(|| {
                Error::schema_incompatible(format!(
                    "attribute '{}' is not declared at '{}'",
                    name, parent
                ))
            })?;
        let path = parent.child(name)?;
        match value {
            Value::Array(items) if descriptor.is_multiple() => {
                for item in items {
                    check_value(descriptor, item, &path)?;
                }
            }
            Value::Array(_) => {
                return Err(Error::schema_incompatible(format!(
                    "attribute '{}' is single-valued but holds an array",
                    path
                )))
            }
            single => check_value(descriptor, single, &path)?,
        }
    }
    Ok(())
}

fn check_value(descriptor: &AttributeDescriptor, value: &Value, path: &Path) -> Result<(), Error> {
    let fits = match (&descriptor.attribute_type, value) {
        (_, Value::Null) => true,
        (AttributeType::Bool, Value::Bool(_))
        | (AttributeType::Integer, Value::Integer(_))
        | (AttributeType::Float, Value::Float(_))
        | (AttributeType::String, Value::String(_))
        | (AttributeType::Bytes, Value::Bytes(_))
        | (AttributeType::Geometry { .. }, Value::Geometry(_)) => true,
        (AttributeType::Complex(children), Value::Map(map)) => {
            return check_map(children, map, path);
        }
        _ => false,
    };
    if fits {
        Ok(())
    } else {
        Err(Error::schema_incompatible(format!(
            "attribute '{}' expects {:?}, found {:?}",
            path,
            TypeName(&descriptor.attribute_type),
            value
        )))
    }
}

struct TypeName<'a>(&'a AttributeType);

impl std::fmt::Debug for TypeName<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self.0 {
            AttributeType::Bool => "bool",
            AttributeType::Integer => "integer",
            AttributeType::Float => "float",
            AttributeType::String => "string",
            AttributeType::Bytes => "bytes",
            AttributeType::Geometry { .. } => "geometry",
            AttributeType::Complex(_) => "complex",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{path, GeometryValue};
    use collection_literals::btree;
    use geo_types::point;

    fn wgs84() -> Crs {
        Crs::new("EPSG:4326")
    }

    fn mercator() -> Crs {
        Crs::new("EPSG:3857")
    }

    /// A station with a footprint and a nested list of sensors, each with
    /// its own position.
    fn station_schema(sensor_crs: Option<Crs>) -> Schema {
        Schema::new(
            "Station",
            vec![
                AttributeDescriptor::new("name", AttributeType::String),
                AttributeDescriptor::geometry("footprint", Some(wgs84())),
                AttributeDescriptor::complex(
                    "sensor",
                    vec![
                        AttributeDescriptor::new("model", AttributeType::String),
                        AttributeDescriptor::geometry("position", sensor_crs),
                    ],
                )
                .multiple(),
            ],
        )
        .unwrap()
    }

    #[test]
    fn rejects_duplicate_and_invalid_names() {
        let duplicate = Schema::new(
            "S",
            vec![
                AttributeDescriptor::new("a", AttributeType::Integer),
                AttributeDescriptor::new("a", AttributeType::String),
            ],
        );
        assert!(matches!(duplicate, Err(Error::SchemaIncompatible { .. })));

        let invalid = Schema::new(
            "S",
            vec![AttributeDescriptor::complex(
                "outer",
                vec![AttributeDescriptor::new("bad-name", AttributeType::Integer)],
            )],
        );
        assert!(matches!(invalid, Err(Error::Path(_))));
    }

    #[test]
    fn finds_geometries_at_every_depth() {
        let schema = station_schema(None);
        let geometries = schema.geometry_attributes();
        assert_eq!(
            geometries,
            vec![(path!("footprint"), Some(&wgs84())), (path!("sensor/position"), None)]
        );
        assert!(schema.descriptor(&path!("sensor/model")).is_some());
        assert!(schema.descriptor(&path!("sensor/missing")).is_none());
    }

    #[test]
    fn schema_crs_prefers_default_geometry() {
        let schema = station_schema(Some(mercator()));
        assert_eq!(schema.crs(), Some(&wgs84()));

        let schema = schema.with_default_geometry(path!("sensor/position")).unwrap();
        assert_eq!(schema.crs(), Some(&mercator()));
    }

    #[test]
    fn default_geometry_must_be_geometry() {
        let result = station_schema(None).with_default_geometry(path!("name"));
        assert!(matches!(result, Err(Error::SchemaIncompatible { .. })));
    }

    #[test]
    fn rewrite_all_geometries() {
        let schema = station_schema(None);
        let rewritten = schema.with_crs(&mercator(), false, true).unwrap();
        assert_eq!(
            rewritten.geometry_attributes(),
            vec![
                (path!("footprint"), Some(&mercator())),
                (path!("sensor/position"), Some(&mercator()))
            ]
        );
        // Everything but the declarations is preserved
        assert_eq!(rewritten.name(), "Station");
        assert!(rewritten
            .descriptor(&path!("sensor"))
            .unwrap()
            .is_multiple());
        assert_eq!(
            rewritten.descriptor(&path!("name")),
            schema.descriptor(&path!("name"))
        );
    }

    #[test]
    fn rewrite_only_missing() {
        let rewritten = station_schema(None).with_crs(&mercator(), true, false).unwrap();
        assert_eq!(
            rewritten.geometry_attributes(),
            vec![
                (path!("footprint"), Some(&wgs84())),
                (path!("sensor/position"), Some(&mercator()))
            ]
        );
    }

    #[test]
    fn strict_rewrite_requires_a_geometry() {
        let plain = Schema::new(
            "Plain",
            vec![AttributeDescriptor::new("n", AttributeType::Integer)],
        )
        .unwrap();
        assert!(matches!(
            plain.with_crs(&wgs84(), false, true),
            Err(Error::SchemaIncompatible { .. })
        ));
        assert_eq!(plain.with_crs(&wgs84(), false, false).unwrap(), plain);
    }

    #[test]
    fn declares_crs_checks_every_geometry() {
        assert!(!station_schema(None).declares_crs(&wgs84(), false));
        assert!(!station_schema(None).declares_crs(&wgs84(), true));
        assert!(station_schema(Some(wgs84())).declares_crs(&wgs84(), false));
        assert!(!station_schema(Some(mercator())).declares_crs(&wgs84(), false));
        assert!(station_schema(Some(mercator())).declares_crs(&wgs84(), true));
    }

    #[test]
    fn needs_reprojection_compares_declared_systems() {
        assert!(!needs_reprojection(&station_schema(None), &wgs84()));
        assert!(needs_reprojection(&station_schema(None), &mercator()));
        assert!(needs_reprojection(&station_schema(Some(mercator())), &wgs84()));

        let plain = Schema::new(
            "Plain",
            vec![AttributeDescriptor::new("n", AttributeType::Integer)],
        )
        .unwrap();
        assert!(!needs_reprojection(&plain, &wgs84()));
    }

    #[test]
    fn check_values_accepts_conforming_tree() {
        let schema = station_schema(Some(wgs84()));
        let values = btree! {
            "name".into() => Value::from("north"),
            "footprint".into() => Value::Null,
            "sensor".into() => Value::Array(vec![
                Value::Map(btree! {
                    "model".into() => Value::from("x1"),
                    "position".into() => GeometryValue::new(point!(x: 1.0, y: 1.0), Some(wgs84()))
                        .into(),
                }),
            ]),
        };
        schema.check_values(&values).unwrap();
    }

    #[test]
    fn check_values_rejects_mismatches() {
        let schema = station_schema(Some(wgs84()));

        let undeclared = btree! { "colour".into() => Value::from("red") };
        assert!(matches!(
            schema.check_values(&undeclared),
            Err(Error::SchemaIncompatible { .. })
        ));

        let wrong_type = btree! { "footprint".into() => Value::from("not a geometry") };
        let err = schema.check_values(&wrong_type).unwrap_err();
        assert!(err.to_string().contains("footprint"));
        assert!(err.to_string().contains("geometry"));

        let array_in_single = btree! { "name".into() => Value::from(vec!["a", "b"]) };
        assert!(schema.check_values(&array_in_single).is_err());

        let nested = btree! {
            "sensor".into() => Value::Map(btree! { "serial".into() => Value::from(7i64) }),
        };
        let err = schema.check_values(&nested).unwrap_err();
        assert!(err.to_string().contains("serial"));
    }
}
