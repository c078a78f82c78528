#![deny(missing_docs)]
//! WFS 1.1.0 transport for geolayer.
//!
//! [`WfsService`] implements [`geolayer_core::FeatureService`] against a
//! WFS endpoint such as GeoServer's `/ows`: reads are `GetFeature`
//! requests answered as GeoJSON, commits are `Transaction` documents
//! whose `TransactionResponse` becomes a [`geolayer_core::CommitResponse`].

pub mod client;
pub(crate) mod error;
pub(crate) mod gml;
pub mod request;
pub(crate) mod response;
pub mod transaction;

pub use client::WfsService;

pub use geolayer_core::{FeatureService, ProtocolError};

/// Namespace of the `wfs:` elements.
pub const WFS_NAMESPACE: &str = "http://www.opengis.net/wfs";

/// Prefix bound to the feature namespace in requests and transactions.
pub const FEATURE_PREFIX: &str = "feature";
