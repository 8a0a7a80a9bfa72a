//! Reference system handling for feature streams
//!
//! Decorators that sit between a `FeatureReader` and its consumer:
//! - `ForceCrsReader`: Declares a reference system without moving coordinates
//! - `ReprojectReader`: Transforms every geometry attribute into a target system
//! - `reproject_features`: Picks and stacks the decorators a `ReprojectionQuery` needs
//!
//! Transforms come from a `CrsAuthority`; `TransformRegistry` is a table-backed
//! one that ships with Web Mercator.

mod force_crs;
mod pipeline;
mod query;
mod registry;
mod reproject;
mod transform;

pub use force_crs::ForceCrsReader;
pub use pipeline::reproject_features;
pub use query::ReprojectionQuery;
pub use registry::TransformRegistry;
pub use reproject::{CachedTransform, ReprojectReader};
pub use transform::{
    transform_geometry, Affine2D, CoordinateTransform, CrsAuthority, Identity, WebMercator,
    EARTH_RADIUS, EPSG_3857, EPSG_4326, MAX_LATITUDE,
};
