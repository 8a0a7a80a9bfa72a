//! ReprojectReader: transform geometry coordinates into a target reference
//! system while features are pulled.

use std::collections::BTreeMap;
use std::sync::Arc;

use featurecrs_model::{
    Crs, Error, Feature, FeatureReader, GeometryValue, Path, ReaderState, Schema, TransformError,
};

use crate::transform::{transform_geometry, CoordinateTransform, CrsAuthority};

const COMPONENT: &str = "ReprojectReader";

/// The transform applied to one geometry attribute, with the reference
/// systems it maps between.
#[derive(Clone, Debug)]
pub struct CachedTransform {
    pub source: Option<Crs>,
    pub target: Option<Crs>,
    pub transform: Arc<dyn CoordinateTransform>,
}

struct Open<R> {
    inner: R,
    schema: Arc<Schema>,
    transforms: BTreeMap<Path, CachedTransform>,
}

/// Wraps a reader and reprojects the geometry attributes of every pulled
/// feature.
///
/// One transform per geometry attribute path is resolved when the reader is
/// built; attributes whose declared reference system already matches the
/// target get none and are left alone. Pulled features keep their id,
/// user data and every other attribute, and are re-expressed under the
/// target schema.
///
/// A transform failure while pulling is returned as
/// `Error::TransformFailed` for that feature only. The reader stays open and
/// the next feature can still be pulled.
pub struct ReprojectReader<R> {
    state: ReaderState<Open<R>>,
}

impl<R: FeatureReader> ReprojectReader<R> {
    /// Reproject every geometry attribute of `inner` into `target`.
    ///
    /// # Errors
    ///
    /// * `Error::InvalidArgument` - `target` is `None`, or nothing needs
    ///   reprojecting.
    /// * `Error::SchemaIncompatible` - the inner schema has no geometry
    ///   attribute.
    /// * `Error::TransformUnavailable` - `authority` knows no transform for an
    ///   attribute, or the attribute declares no reference system.
    pub fn new(
        inner: R,
        target: Option<Crs>,
        authority: &dyn CrsAuthority,
    ) -> Result<Self, Error> {
        let target =
            target.ok_or_else(|| Error::invalid_argument("a target reference system is required"))?;
        let schema = inner.schema()?.with_crs(&target, false, true)?;
        Self::with_schema(inner, Arc::new(schema), authority)
    }

    /// Reproject `inner` into an already-rewritten target schema.
    ///
    /// The target schema must have the same geometry attributes as the
    /// inner schema; each one whose declared reference system differs gets
    /// a transform from `authority`.
    pub fn with_schema(
        inner: R,
        schema: Arc<Schema>,
        authority: &dyn CrsAuthority,
    ) -> Result<Self, Error> {
        let source_schema = inner.schema()?;
        let mut transforms = BTreeMap::new();

        for (path, source) in source_schema.geometry_attributes() {
            let descriptor = schema
                .descriptor(&path)
                .filter(|descriptor| descriptor.is_geometry())
                .ok_or_else(|| {
                    Error::schema_incompatible(format!(
                        "geometry attribute '{}' is missing from target schema '{}'",
                        path,
                        schema.name()
                    ))
                })?;

            let Some(target) = descriptor.crs() else {
                return Err(Error::schema_incompatible(format!(
                    "target schema '{}' declares no reference system for '{}'",
                    schema.name(),
                    path
                )));
            };
            if source == Some(target) {
                continue;
            }

            let Some(source) = source else {
                return Err(Error::TransformUnavailable {
                    component: COMPONENT,
                    attribute: path,
                    from: None,
                    to: target.clone(),
                    source: TransformError::UnknownSource,
                });
            };
            let transform = authority
                .find_transform(source, target, true)
                .map_err(|e| Error::TransformUnavailable {
                    component: COMPONENT,
                    attribute: path.clone(),
                    from: Some(source.clone()),
                    to: target.clone(),
                    source: e,
                })?;

            log::debug!("Reprojecting '{}' from {} to {}", path, source, target);
            transforms.insert(
                path,
                CachedTransform {
                    source: Some(source.clone()),
                    target: Some(target.clone()),
                    transform,
                },
            );
        }

        Self::from_parts(inner, schema, transforms)
    }

    /// Apply `transform` to every geometry attribute of `schema`.
    ///
    /// For callers that already hold the transform, typically for a stream
    /// with a single default geometry.
    pub fn with_transform(
        inner: R,
        schema: Arc<Schema>,
        transform: Arc<dyn CoordinateTransform>,
    ) -> Result<Self, Error> {
        let source_schema = inner.schema()?;
        let transforms = schema
            .geometry_attributes()
            .into_iter()
            .map(|(path, target)| {
                let source = source_schema
                    .descriptor(&path)
                    .and_then(|descriptor| descriptor.crs())
                    .cloned();
                let cached = CachedTransform {
                    source,
                    target: target.cloned(),
                    transform: Arc::clone(&transform),
                };
                (path, cached)
            })
            .collect();

        Self::from_parts(inner, schema, transforms)
    }

    fn from_parts(
        inner: R,
        schema: Arc<Schema>,
        transforms: BTreeMap<Path, CachedTransform>,
    ) -> Result<Self, Error> {
        if transforms.is_empty() {
            return Err(Error::invalid_argument(format!(
                "nothing to reproject in schema '{}'",
                schema.name()
            )));
        }
        log::debug!(
            "{} built for '{}' with {} transformed attribute(s)",
            COMPONENT,
            schema.name(),
            transforms.len()
        );
        Ok(Self {
            state: ReaderState::Open(Open {
                inner,
                schema,
                transforms,
            }),
        })
    }

    /// The transform resolved for each geometry attribute path.
    pub fn transforms(&self) -> Result<&BTreeMap<Path, CachedTransform>, Error> {
        Ok(&self.state.open(COMPONENT)?.transforms)
    }

    /// The wrapped reader.
    pub fn delegate(&self) -> Result<&R, Error> {
        Ok(&self.state.open(COMPONENT)?.inner)
    }
}

impl<R: FeatureReader> FeatureReader for ReprojectReader<R> {
    fn schema(&self) -> Result<Arc<Schema>, Error> {
        Ok(Arc::clone(&self.state.open(COMPONENT)?.schema))
    }

    fn has_next(&mut self) -> Result<bool, Error> {
        self.state.open_mut(COMPONENT)?.inner.has_next()
    }

    fn next_feature(&mut self) -> Result<Feature, Error> {
        let open = self.state.open_mut(COMPONENT)?;
        let mut feature = open.inner.next_feature()?;

        for (path, cached) in &open.transforms {
            log::trace!("Transforming '{}' of feature '{}'", path, feature.id());
            feature
                .try_for_each_geometry_mut(
                    path,
                    &mut |geometry: &mut GeometryValue| -> Result<(), TransformError> {
                        let moved =
                            transform_geometry(cached.transform.as_ref(), geometry.geometry())?;
                        geometry.replace(moved, cached.target.clone());
                        Ok(())
                    },
                )
                .map_err(|source| Error::TransformFailed {
                    component: COMPONENT,
                    feature: feature.id().to_string(),
                    attribute: path.clone(),
                    source,
                })?;
        }

        feature.retype(Arc::clone(&open.schema))
    }

    fn close(&mut self) -> Result<(), Error> {
        let mut open = self.state.close(COMPONENT)?;
        log::debug!("Closing {}", COMPONENT);
        open.inner.close()
    }
}
