//! ForceCrsReader: declare a reference system without touching coordinates.

use std::sync::Arc;

use featurecrs_model::{Crs, Error, Feature, FeatureReader, ReaderState, Schema};

const COMPONENT: &str = "ForceCrsReader";

/// How pulled features are re-expressed.
enum Retype {
    /// The inner schema already declares the forced system.
    Identity,
    /// Re-express every feature under the rewritten schema.
    Rewrite(Arc<Schema>),
}

struct Open<R> {
    inner: R,
    retype: Retype,
}

/// Wraps a reader to force its geometry attributes to a caller-supplied
/// reference system.
///
/// Use this when the declared reference system of a stream is wrong or
/// missing but the coordinates are already expressed in `crs`: the exposed
/// schema and each geometry's reference system tag change, the numbers do
/// not.
///
/// # Example
///
/// ```rust,ignore
/// let forced = ForceCrsReader::new(reader, Some(Crs::new("EPSG:4326")))?;
/// assert_eq!(forced.schema()?.crs(), Some(&Crs::new("EPSG:4326")));
/// ```
pub struct ForceCrsReader<R> {
    state: ReaderState<Open<R>>,
}

impl<R: FeatureReader> ForceCrsReader<R> {
    /// Force every geometry attribute of `inner` to declare `crs`.
    ///
    /// # Errors
    ///
    /// * `Error::InvalidArgument` - `crs` is `None`.
    /// * `Error::SchemaIncompatible` - the schema could not be rewritten.
    pub fn new(inner: R, crs: Option<Crs>) -> Result<Self, Error> {
        Self::with_mode(inner, crs, false)
    }

    /// Like `new`, but with `only_missing` only geometry attributes with no
    /// declared reference system are forced.
    pub fn with_mode(inner: R, crs: Option<Crs>, only_missing: bool) -> Result<Self, Error> {
        let crs = crs.ok_or_else(|| Error::invalid_argument("a reference system is required"))?;
        let schema = inner.schema()?;

        let retype = if schema.declares_crs(&crs, only_missing) {
            log::debug!(
                "Schema '{}' already declares {}, passing features through",
                schema.name(),
                crs
            );
            Retype::Identity
        } else {
            log::debug!("Forcing schema '{}' to declare {}", schema.name(), crs);
            Retype::Rewrite(Arc::new(schema.with_crs(&crs, only_missing, false)?))
        };

        Ok(Self {
            state: ReaderState::Open(Open { inner, retype }),
        })
    }

    /// Use an already-rewritten schema for the features of `inner`.
    pub fn with_schema(inner: R, schema: Arc<Schema>) -> Self {
        Self {
            state: ReaderState::Open(Open {
                inner,
                retype: Retype::Rewrite(schema),
            }),
        }
    }

    /// Whether features pass through unchanged.
    pub fn is_identity(&self) -> Result<bool, Error> {
        Ok(matches!(
            self.state.open(COMPONENT)?.retype,
            Retype::Identity
        ))
    }

    /// The wrapped reader.
    pub fn inner(&self) -> Result<&R, Error> {
        Ok(&self.state.open(COMPONENT)?.inner)
    }

    /// Unwrap the reader without closing it.
    pub fn into_inner(mut self) -> Result<R, Error> {
        Ok(self.state.close(COMPONENT)?.inner)
    }
}

impl<R: FeatureReader> FeatureReader for ForceCrsReader<R> {
    fn schema(&self) -> Result<Arc<Schema>, Error> {
        let open = self.state.open(COMPONENT)?;
        match &open.retype {
            Retype::Identity => open.inner.schema(),
            Retype::Rewrite(schema) => Ok(Arc::clone(schema)),
        }
    }

    fn has_next(&mut self) -> Result<bool, Error> {
        self.state.open_mut(COMPONENT)?.inner.has_next()
    }

    fn next_feature(&mut self) -> Result<Feature, Error> {
        let open = self.state.open_mut(COMPONENT)?;
        let feature = open.inner.next_feature()?;
        match &open.retype {
            Retype::Identity => Ok(feature),
            Retype::Rewrite(schema) => feature.retype(Arc::clone(schema)),
        }
    }

    fn close(&mut self) -> Result<(), Error> {
        let mut open = self.state.close(COMPONENT)?;
        log::debug!("Closing {}", COMPONENT);
        open.inner.close()
    }
}
