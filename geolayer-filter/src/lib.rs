#![deny(missing_docs)]
//! OGC Filter Encoding writer for geolayer filters.
//!
//! Raster layers cannot hand a [`Filter`] tree to the map server directly;
//! WMS takes the filter as an XML string in the `FILTER` request
//! parameter. [`FilterEncoder`] produces that string.
//!
//! ```
//! use geolayer_core::Filter;
//! use geolayer_filter::{FilterEncoder, FilterVersion};
//!
//! let xml = FilterEncoder::new(FilterVersion::V1_1_0)
//!     .encode(&Filter::greater_than("larvas", 10))
//!     .unwrap();
//! assert!(xml.contains("<ogc:PropertyIsGreaterThan>"));
//! ```

mod encoder;
mod error;
mod version;

pub use encoder::{FilterEncoder, encode_filter};
pub use error::FilterError;
pub use version::FilterVersion;

pub use geolayer_core::Filter;

/// Namespace of the `ogc:` filter elements.
pub const OGC_NAMESPACE: &str = "http://www.opengis.net/ogc";
/// Namespace of the `gml:` geometry elements.
pub const GML_NAMESPACE: &str = "http://www.opengis.net/gml";
