//! Coordinate reference system identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An opaque identifier for a coordinate reference system.
///
/// Two `Crs` values are the same reference system exactly when their
/// identifiers are equal. Nothing here parses or interprets the identifier;
/// resolving it to real math is the job of a `CrsAuthority`.
///
/// Absence of a reference system is modelled as `Option<Crs>`.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Crs(String);

impl Crs {
    pub fn new(id: impl Into<String>) -> Self {
        Crs(id.into())
    }

    /// The identifier this reference system was created with.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Crs {
    fn from(id: &str) -> Self {
        Crs::new(id)
    }
}

impl From<String> for Crs {
    fn from(id: String) -> Self {
        Crs(id)
    }
}

/// Display helper for a possibly-absent reference system.
pub(crate) fn crs_label(crs: &Option<Crs>) -> &str {
    crs.as_ref().map(Crs::as_str).unwrap_or("<unset>")
}
