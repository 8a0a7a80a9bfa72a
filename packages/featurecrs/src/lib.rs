//! featurecrs: streaming reference system override and reprojection for
//! complex features.
//!
//! Features are trees of named attributes, any number of which may hold
//! geometries in their own reference system. `featurecrs` wraps a pull-based
//! `FeatureReader` so that each feature comes out relabeled or reprojected as
//! it is pulled, without buffering the stream.
//!
//! # Example
//!
//! ```rust
//! use featurecrs::{reproject_features, ReprojectionQuery, TransformRegistry};
//!
//! let query: ReprojectionQuery =
//!     serde_json::from_str(r#"{"target_crs": "EPSG:3857"}"#).unwrap();
//! let authority = TransformRegistry::with_web_mercator();
//! # let _ = (query, authority);
//! ```

pub use featurecrs_model::*;
pub use featurecrs_reproject::*;
