//! The feature protocol: where a vector layer's features live and how
//! they are read and committed.

use crate::{
    commit::CommitResponse, error::ProtocolError, feature::Feature, feature::FeatureCollection,
    filter::Filter,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// WFS version every descriptor speaks.
pub const WFS_VERSION: &str = "1.1.0";

/// Everything needed to address one feature type on a feature service.
///
/// Built once per vector layer by the protocol builder and never changed
/// afterwards, so there are no setters: the `with_*` methods consume the
/// descriptor during construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolDescriptor {
    service_url: String,
    version: String,
    feature_type: String,
    geometry_name: String,
    srs_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    feature_namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    filter: Option<Filter>,
}

impl ProtocolDescriptor {
    /// Create a descriptor with no namespace and no filter.
    pub fn new(
        service_url: impl Into<String>,
        feature_type: impl Into<String>,
        geometry_name: impl Into<String>,
        srs_name: impl Into<String>,
    ) -> Self {
        Self {
            service_url: service_url.into(),
            version: WFS_VERSION.to_owned(),
            feature_type: feature_type.into(),
            geometry_name: geometry_name.into(),
            srs_name: srs_name.into(),
            feature_namespace: None,
            filter: None,
        }
    }

    /// Set the feature namespace URI.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.feature_namespace = Some(namespace.into());
        self
    }

    /// Set the read filter.
    #[must_use]
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Service endpoint, e.g. `http://host/geoserver/ows`.
    pub fn service_url(&self) -> &str {
        &self.service_url
    }

    /// Protocol version, always [`WFS_VERSION`].
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Feature type (layer) name.
    pub fn feature_type(&self) -> &str {
        &self.feature_type
    }

    /// Name of the geometry column.
    pub fn geometry_name(&self) -> &str {
        &self.geometry_name
    }

    /// Projection requested for reads and declared on writes.
    pub fn srs_name(&self) -> &str {
        &self.srs_name
    }

    /// Feature namespace URI, when one was configured.
    pub fn feature_namespace(&self) -> Option<&str> {
        self.feature_namespace.as_deref()
    }

    /// Read filter, when one was configured.
    pub fn filter(&self) -> Option<&Filter> {
        self.filter.as_ref()
    }
}

/// A remote feature service.
///
/// Implementations:
/// - `WfsService` (geolayer-wfs): WFS 1.1.0 over HTTP
/// - `InMemoryFeatureService` (test-utils): scripted, no network
///
/// Both operations are addressed by a [`ProtocolDescriptor`]; the service
/// itself holds only transport concerns (HTTP client, timeouts).
#[async_trait]
pub trait FeatureService: Send + Sync {
    /// Fetch every feature the descriptor selects.
    async fn read(&self, protocol: &ProtocolDescriptor)
    -> Result<FeatureCollection, ProtocolError>;

    /// Commit locally edited features. Each feature's
    /// [`crate::FeatureState`] decides whether it is inserted, updated or
    /// deleted; features in state `Unknown` are ignored.
    async fn commit(
        &self,
        protocol: &ProtocolDescriptor,
        features: &[Feature],
    ) -> Result<CommitResponse, ProtocolError>;
}
