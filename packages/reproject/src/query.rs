use featurecrs_model::Crs;
use serde::{Deserialize, Serialize};

/// What a caller asks of a feature stream's reference systems.
///
/// Loaded from configuration as JSON such as
/// `{"source_crs": "EPSG:27700", "target_crs": "EPSG:4326"}`; every field is
/// optional.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReprojectionQuery {
    /// Declare the stream to be in this system, without moving coordinates.
    pub source_crs: Option<Crs>,
    /// Reproject the stream into this system.
    pub target_crs: Option<Crs>,
    /// When declaring `source_crs`, only relabel geometry attributes that
    /// declare no system.
    pub only_missing: bool,
}

impl ReprojectionQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, crs: impl Into<Crs>) -> Self {
        self.source_crs = Some(crs.into());
        self
    }

    pub fn with_target(mut self, crs: impl Into<Crs>) -> Self {
        self.target_crs = Some(crs.into());
        self
    }

    pub fn only_missing(mut self, only_missing: bool) -> Self {
        self.only_missing = only_missing;
        self
    }
}
