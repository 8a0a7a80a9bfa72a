//! Complex feature model
//!
//! The data model that feature pipelines operate on:
//! - `Feature`: An identified tree of named attribute values plus user data
//! - `Value`: One node of that tree (scalar, geometry, array or nested map)
//! - `Schema`: The tree of attribute descriptors a stream's features follow
//! - `Crs`: Opaque identifier of a coordinate reference system
//! - `FeatureReader`: Pull-based, single-pass stream of features
//!
//! # Example
//!
//! ```rust
//! use featurecrs_model::{AttributeDescriptor, AttributeType, Crs, Schema, path};
//!
//! let schema = Schema::new(
//!     "Site",
//!     vec![
//!         AttributeDescriptor::new("name", AttributeType::String),
//!         AttributeDescriptor::complex(
//!             "location",
//!             vec![AttributeDescriptor::geometry("shape", Some(Crs::new("EPSG:4326")))],
//!         ),
//!     ],
//! )
//! .unwrap();
//!
//! assert_eq!(schema.crs(), Some(&Crs::new("EPSG:4326")));
//! assert!(schema.descriptor(&path!("location/shape")).unwrap().is_geometry());
//! ```

mod crs;
mod error;
mod feature;
mod geometry;
mod path;
mod reader;
mod schema;
mod value;

#[cfg(any(test, feature = "test-utils"))]
mod memory;

pub use crs::Crs;
pub use error::{Error, Stage, TransformError};
pub use feature::{Feature, FeatureId, UserData};
pub use geometry::{try_map_coords, GeometryValue};
pub use path::{Path, PathError};
pub use reader::{FeatureReader, Features, ReaderState};
pub use schema::{needs_reprojection, AttributeDescriptor, AttributeType, Schema};
pub use value::Value;

#[cfg(any(test, feature = "test-utils"))]
pub use memory::MemoryFeatureReader;

// Geometry types used throughout the public API
pub use geo_types;
