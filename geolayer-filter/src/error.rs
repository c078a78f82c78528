//! Filter encoding errors.

use thiserror::Error;

/// Why a filter could not be encoded.
#[non_exhaustive]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    /// `And` / `Or` with fewer than two operands.
    #[error("{op} needs at least two operands, got {got}")]
    TooFewOperands {
        /// The logical operator.
        op: &'static str,
        /// How many operands it had.
        got: usize,
    },

    /// The element needs a property name the filter did not give.
    #[error("{element} requires a property name in filter version {version}")]
    MissingProperty {
        /// The element being written.
        element: &'static str,
        /// The filter version in use.
        version: &'static str,
    },

    /// A feature id filter with no ids.
    #[error("feature id filter has no ids")]
    EmptyFeatureIds,

    /// A bounding box with min greater than max.
    #[error("invalid bounding box: {0}")]
    InvalidBounds(String),

    /// Unknown version string.
    #[error("unsupported filter version: {0}")]
    UnsupportedVersion(String),

    /// The XML writer failed.
    #[error("xml error: {0}")]
    Xml(String),
}
