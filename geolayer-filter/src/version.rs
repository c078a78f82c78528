//! Filter Encoding versions.

use crate::error::FilterError;
use std::fmt;
use std::str::FromStr;

/// Supported OGC Filter Encoding versions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FilterVersion {
    /// Filter Encoding 1.0.0 (WFS 1.0.0 / WMS 1.1.1 era).
    V1_0_0,
    /// Filter Encoding 1.1.0, used with WFS 1.1.0.
    #[default]
    V1_1_0,
}

impl FilterVersion {
    /// The dotted version string.
    pub fn as_str(self) -> &'static str {
        match self {
            FilterVersion::V1_0_0 => "1.0.0",
            FilterVersion::V1_1_0 => "1.1.0",
        }
    }
}

impl fmt::Display for FilterVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterVersion {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1.0.0" | "1.0" => Ok(FilterVersion::V1_0_0),
            "1.1.0" | "1.1" => Ok(FilterVersion::V1_1_0),
            other => Err(FilterError::UnsupportedVersion(other.to_owned())),
        }
    }
}
