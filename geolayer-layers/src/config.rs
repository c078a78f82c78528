//! Vector layer configuration.

use geolayer_core::{FeatureCollection, Filter, ProtocolError};
use std::fmt;
use std::sync::Arc;

/// Receives the outcome of a vector layer's initial read.
pub type DataCallback = Arc<dyn Fn(Result<FeatureCollection, ProtocolError>) + Send + Sync>;

/// What to build a vector layer from.
///
/// A config with neither `geometry_name` nor `feature_namespace` (blank
/// counts as unset) yields a plain display layer that the caller fills itself. Anything else yields
/// a live layer bound to the feature service.
#[derive(Clone, Default)]
pub struct LayerConfig {
    /// Layer (feature type) name.
    pub layer_name: String,
    /// Geometry column of the feature type.
    pub geometry_name: Option<String>,
    /// Namespace URI of the workspace the layer lives in.
    pub feature_namespace: Option<String>,
    /// Service suffix on the server root (`"ows"`, `"wfs"`).
    pub service: Option<String>,
    /// Read filter.
    pub filter: Option<Filter>,
    /// Called with the result of the initial read, if set.
    pub on_data: Option<DataCallback>,
}

impl LayerConfig {
    /// Config for the named layer with nothing else set.
    pub fn new(layer_name: impl Into<String>) -> Self {
        Self {
            layer_name: layer_name.into(),
            ..Self::default()
        }
    }

    /// Set the geometry column.
    #[must_use]
    pub fn geometry_name(mut self, name: impl Into<String>) -> Self {
        self.geometry_name = Some(name.into());
        self
    }

    /// Set the feature namespace.
    #[must_use]
    pub fn feature_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.feature_namespace = Some(namespace.into());
        self
    }

    /// Set the service suffix.
    #[must_use]
    pub fn service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    /// Set the read filter.
    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Set the initial-read callback.
    #[must_use]
    pub fn on_data<F>(mut self, callback: F) -> Self
    where
        F: Fn(Result<FeatureCollection, ProtocolError>) + Send + Sync + 'static,
    {
        self.on_data = Some(Arc::new(callback));
        self
    }

    /// Whether this config describes a plain display layer.
    pub fn is_display_only(&self) -> bool {
        blank(self.geometry_name.as_deref()) && blank(self.feature_namespace.as_deref())
    }

    /// The namespace URI, unless unset or blank.
    pub(crate) fn namespace(&self) -> Option<&str> {
        self.feature_namespace
            .as_deref()
            .map(str::trim)
            .filter(|ns| !ns.is_empty())
    }
}

fn blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

impl fmt::Debug for LayerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerConfig")
            .field("layer_name", &self.layer_name)
            .field("geometry_name", &self.geometry_name)
            .field("feature_namespace", &self.feature_namespace)
            .field("service", &self.service)
            .field("filter", &self.filter)
            .field("on_data", &self.on_data.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_fields_count_as_unset() {
        assert!(LayerConfig::new("dibujo").is_display_only());
        assert!(LayerConfig::new("dibujo").geometry_name("").is_display_only());
        assert!(
            LayerConfig::new("dibujo")
                .geometry_name("  ")
                .feature_namespace("\t")
                .is_display_only()
        );
        assert!(!LayerConfig::new("patios").geometry_name("the_geom").is_display_only());
        assert!(!LayerConfig::new("patios").feature_namespace("http://geodengue.org").is_display_only());
    }

    #[test]
    fn blank_namespace_is_dropped() {
        assert_eq!(LayerConfig::new("patios").feature_namespace(" ").namespace(), None);
        assert_eq!(
            LayerConfig::new("patios").feature_namespace("http://geodengue.org").namespace(),
            Some("http://geodengue.org")
        );
    }
}
