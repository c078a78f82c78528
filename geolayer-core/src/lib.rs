//! # geolayer-core: core types and protocol traits for OGC-backed map layers
//!
//! This crate defines the data model shared by every geolayer crate and
//! the one protocol boundary they compose around.
//!
//! ## The Pieces
//!
//! | Concern | Types | What it does |
//! |---------|-------|-------------|
//! | Configuration | [`DataSource`] | Server host, workspace and projection |
//! | Filtering | [`Filter`] | Server-side filter tree (OGC Filter Encoding) |
//! | Features | [`Feature`], [`FeatureCollection`] | GeoJSON-shaped records with edit state |
//! | Protocol | [`ProtocolDescriptor`], [`FeatureService`] | Where features live and how to reach them |
//! | Commit | [`CommitResponse`] | Outcome of a save against the feature service |
//!
//! ## Design Principle
//!
//! [`FeatureService`] is operation-defined: [`FeatureService::read`] means
//! "fetch the features this descriptor points at", not "issue an HTTP GET".
//! The WFS transport, an in-memory fixture and a future offline cache all
//! implement the same trait, which is what lets layers be built and
//! exercised without a live server.

#![deny(missing_docs)]

pub mod commit;
pub mod error;
pub mod feature;
pub mod filter;
pub mod protocol;
pub mod source;

#[cfg(feature = "test-utils")]
pub mod test_utils;

// Re-exports for convenience
pub use commit::CommitResponse;
pub use error::{ConfigError, ProtocolError};
pub use feature::{Feature, FeatureCollection, FeatureState};
pub use filter::{Bounds, ComparisonOp, Filter};
pub use protocol::{FeatureService, ProtocolDescriptor, WFS_VERSION};
pub use source::DataSource;
