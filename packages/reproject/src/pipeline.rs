//! Decide which decorators a feature stream needs and wrap it in them.

use featurecrs_model::{needs_reprojection, Error, FeatureReader, Stage};

use crate::force_crs::ForceCrsReader;
use crate::query::ReprojectionQuery;
use crate::reproject::ReprojectReader;
use crate::transform::CrsAuthority;

/// Wrap `reader` so that it yields features as `query` asks.
///
/// 1. If `query.source_crs` differs from the stream's own reference system,
///    the stream is relabeled to it with a `ForceCrsReader`. Coordinates are
///    not touched.
/// 2. If `query.target_crs` is set and some geometry attribute declares a
///    different system, the stream is wrapped in a `ReprojectReader`.
///
/// A stream that needs neither is returned as it is.
///
/// # Errors
///
/// * `Error::InvalidArgument` - a target is requested but neither
///   `query.source_crs` nor the stream declares a reference system.
/// * `Error::Initialization` - building a decorator failed; `stage` says
///   which one.
pub fn reproject_features<R: FeatureReader + 'static>(
    query: &ReprojectionQuery,
    reader: R,
    authority: &dyn CrsAuthority,
) -> Result<Box<dyn FeatureReader>, Error> {
    let native = reader.schema()?.crs().cloned();
    let mut reader: Box<dyn FeatureReader> = Box::new(reader);
    let mut current = native.clone();

    if let Some(source) = &query.source_crs {
        if native.as_ref() != Some(source) {
            log::debug!(
                "Declaring stream as {} (native {:?})",
                source,
                native.as_ref().map(|crs| crs.as_str())
            );
            reader = Box::new(
                ForceCrsReader::with_mode(reader, Some(source.clone()), query.only_missing)
                    .map_err(|e| e.during(Stage::Override))?,
            );
            current = Some(source.clone());
        }
    }

    if let Some(target) = &query.target_crs {
        if current.is_none() {
            return Err(Error::invalid_argument(
                "cannot reproject data, the source CRS is not available",
            ));
        }
        let schema = reader.schema()?;
        if needs_reprojection(&schema, target) {
            log::debug!("Reprojecting stream '{}' to {}", schema.name(), target);
            reader = Box::new(
                ReprojectReader::new(reader, Some(target.clone()), authority)
                    .map_err(|e| e.during(Stage::Reproject))?,
            );
        } else {
            log::debug!("Stream '{}' is already in {}", schema.name(), target);
        }
    }

    Ok(reader)
}
