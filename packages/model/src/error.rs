//! Error types shared by feature readers and their decorators.

use std::fmt;

use crate::crs::crs_label;
use crate::{Crs, Path, PathError};

/// Errors raised while building or pulling from a feature pipeline.
///
/// Every variant that originates in a collaborator (a schema rewrite, a
/// transform lookup, a per-coordinate transform) carries enough context to
/// tell which decorator and which attribute triggered it.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A required argument was absent or meaningless, e.g. forcing an unset
    /// reference system or reprojecting with nothing to transform.
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    /// A schema could not be rewritten or a feature does not fit a schema.
    #[error("incompatible schema: {message}")]
    SchemaIncompatible { message: String },

    /// No coordinate transform exists for an attribute's source/target pair.
    #[error(
        "{component}: no transform for attribute '{attribute}' from {} to {to}: {source}",
        crs_label(.from)
    )]
    TransformUnavailable {
        component: &'static str,
        attribute: Path,
        from: Option<Crs>,
        to: Crs,
        #[source]
        source: TransformError,
    },

    /// Applying a transform to one pulled feature failed. The reader that
    /// raised this is still usable.
    #[error("{component}: transform failed for attribute '{attribute}' of feature '{feature}'")]
    TransformFailed {
        component: &'static str,
        feature: String,
        attribute: Path,
        #[source]
        source: TransformError,
    },

    /// An operation was invoked on a reader after `close()`.
    #[error("{component} has already been closed")]
    UseAfterClose { component: &'static str },

    /// `next_feature()` was called with no features left.
    #[error("no more features available")]
    Exhausted,

    /// Wrapping a reader in a pipeline stage failed.
    #[error("{stage} stage failed: {source}")]
    Initialization {
        stage: Stage,
        #[source]
        source: Box<Error>,
    },

    /// Invalid attribute path or name.
    #[error("{0}")]
    Path(#[from] PathError),
}

impl Error {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Error::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn schema_incompatible(message: impl Into<String>) -> Self {
        Error::SchemaIncompatible {
            message: message.into(),
        }
    }

    /// Attach the pipeline stage that failed.
    pub fn during(self, stage: Stage) -> Self {
        Error::Initialization {
            stage,
            source: Box::new(self),
        }
    }
}

/// The pipeline stages a reader can be wrapped in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Relabeling the declared reference system.
    Override,
    /// Transforming coordinates into a target reference system.
    Reproject,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Override => f.write_str("override"),
            Stage::Reproject => f.write_str("reproject"),
        }
    }
}

/// Errors produced by coordinate transforms and reference system lookups.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    /// The coordinate lies outside the domain of the transform.
    #[error("coordinate ({x}, {y}) is out of domain: {reason}")]
    OutOfDomain { x: f64, y: f64, reason: String },

    /// The transform produced a NaN or infinite ordinate.
    #[error("coordinate ({x}, {y}) did not transform to a finite value")]
    NonFinite { x: f64, y: f64 },

    /// No transform path is registered between two reference systems.
    #[error("no transform path registered from {from} to {to}")]
    NoPath { from: Crs, to: Crs },

    /// The source reference system is unknown.
    #[error("source reference system is not set")]
    UnknownSource,

    /// Any other failure reported by a transform implementation.
    #[error("{message}")]
    Other { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path;
    use std::error::Error as StdError;

    #[test]
    fn transform_unavailable_names_attribute_and_systems() {
        let e = Error::TransformUnavailable {
            component: "ReprojectReader",
            attribute: path!("site/location"),
            from: Some(Crs::new("EPSG:4326")),
            to: Crs::new("EPSG:27700"),
            source: TransformError::NoPath {
                from: Crs::new("EPSG:4326"),
                to: Crs::new("EPSG:27700"),
            },
        };
        let display = e.to_string();
        assert!(display.starts_with("ReprojectReader: "));
        assert!(display.contains("site/location"));
        assert!(display.contains("EPSG:4326"));
        assert!(display.contains("EPSG:27700"));
        assert!(StdError::source(&e).is_some());
    }

    #[test]
    fn transform_unavailable_with_unset_source() {
        let e = Error::TransformUnavailable {
            component: "ReprojectReader",
            attribute: path!("shape"),
            from: None,
            to: Crs::new("EPSG:3857"),
            source: TransformError::UnknownSource,
        };
        assert!(e.to_string().contains("<unset>"));
    }

    #[test]
    fn transform_failed_keeps_source() {
        let e = Error::TransformFailed {
            component: "ReprojectReader",
            feature: "f.1".to_string(),
            attribute: path!("shape"),
            source: TransformError::OutOfDomain {
                x: 0.0,
                y: 91.0,
                reason: "latitude beyond the poles".to_string(),
            },
        };
        let display = e.to_string();
        assert!(display.contains("ReprojectReader"));
        assert!(display.contains("f.1"));
        let source = StdError::source(&e).unwrap();
        assert!(source.to_string().contains("latitude beyond the poles"));
    }

    #[test]
    fn initialization_names_stage() {
        let e = Error::invalid_argument("nothing to reproject").during(Stage::Reproject);
        let display = e.to_string();
        assert!(display.starts_with("reproject stage failed"));
        assert!(display.contains("nothing to reproject"));
        assert!(StdError::source(&e).is_some());
        match &e {
            Error::Initialization { stage, source } => {
                assert_eq!(*stage, Stage::Reproject);
                assert!(matches!(**source, Error::InvalidArgument { .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn use_after_close_display() {
        let e = Error::UseAfterClose {
            component: "ForceCrsReader",
        };
        assert_eq!(e.to_string(), "ForceCrsReader has already been closed");
    }

    #[test]
    fn path_error_conversion() {
        let e: Error = PathError::InvalidPath {
            message: "test".to_string(),
        }
        .into();
        assert!(matches!(e, Error::Path(_)));
        assert!(StdError::source(&e).is_some());
    }
}
