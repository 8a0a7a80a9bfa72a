//! TransformRegistry: a CrsAuthority backed by explicitly registered pairs.

use std::collections::HashMap;
use std::sync::Arc;

use featurecrs_model::{Crs, TransformError};

use crate::transform::{
    CoordinateTransform, CrsAuthority, Identity, WebMercator, EPSG_3857, EPSG_4326,
};

/// Resolves transforms from a table of registered (source, target) pairs.
///
/// Lookup order for `find_transform(a, b)`:
/// 1. `a == b` resolves to `Identity`
/// 2. a transform registered for `(a, b)`
/// 3. the inverse of a transform registered for `(b, a)`, if it has one
///
/// The registry does not distinguish lenient from strict lookups.
#[derive(Clone, Debug, Default)]
pub struct TransformRegistry {
    transforms: HashMap<(Crs, Crs), Arc<dyn CoordinateTransform>>,
}

impl TransformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry that knows EPSG:4326 to EPSG:3857 (and back).
    pub fn with_web_mercator() -> Self {
        let mut registry = Self::new();
        registry.register(
            Crs::new(EPSG_4326),
            Crs::new(EPSG_3857),
            WebMercator::Forward,
        );
        registry
    }

    /// Register the transform from `source` to `target`.
    ///
    /// Returns the previously registered transform for that pair, if any.
    pub fn register<T: CoordinateTransform + 'static>(
        &mut self,
        source: Crs,
        target: Crs,
        transform: T,
    ) -> Option<Arc<dyn CoordinateTransform>> {
        self.register_shared(source, target, Arc::new(transform))
    }

    pub fn register_shared(
        &mut self,
        source: Crs,
        target: Crs,
        transform: Arc<dyn CoordinateTransform>,
    ) -> Option<Arc<dyn CoordinateTransform>> {
        self.transforms.insert((source, target), transform)
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

impl CrsAuthority for TransformRegistry {
    fn find_transform(
        &self,
        source: &Crs,
        target: &Crs,
        _lenient: bool,
    ) -> Result<Arc<dyn CoordinateTransform>, TransformError> {
        if source == target {
            return Ok(Arc::new(Identity));
        }

        let key = (source.clone(), target.clone());
        if let Some(transform) = self.transforms.get(&key) {
            return Ok(Arc::clone(transform));
        }

        let reverse = (target.clone(), source.clone());
        self.transforms
            .get(&reverse)
            .and_then(|transform| transform.inverse())
            .ok_or_else(|| TransformError::NoPath {
                from: source.clone(),
                to: target.clone(),
            })
    }
}
