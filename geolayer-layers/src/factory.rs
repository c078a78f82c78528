//! [`LayerFactory`]: the layer builders over one data source and service.

use crate::config::LayerConfig;
use crate::error::LayerError;
use crate::vector::{VectorLayer, build_vector_layer};
use crate::wms::{RasterLayer, WmsLayerConfig, build_wms_layers};
use geolayer_core::{DataSource, FeatureService};
use std::sync::Arc;

/// Builds layers against one server.
///
/// Holds nothing but the injected data source and feature service; every
/// layer it builds is independent of the others.
#[derive(Clone)]
pub struct LayerFactory {
    source: DataSource,
    service: Arc<dyn FeatureService>,
}

impl LayerFactory {
    /// Create a factory.
    pub fn new(source: DataSource, service: Arc<dyn FeatureService>) -> Self {
        Self { source, service }
    }

    /// The data source layers are built against.
    pub fn source(&self) -> &DataSource {
        &self.source
    }

    /// See [`build_vector_layer`].
    ///
    /// # Errors
    ///
    /// As [`build_vector_layer`].
    pub fn vector_layer(&self, config: &LayerConfig) -> Result<VectorLayer, LayerError> {
        build_vector_layer(&self.source, Arc::clone(&self.service), config)
    }

    /// See [`build_wms_layers`].
    ///
    /// # Errors
    ///
    /// As [`build_wms_layers`].
    pub fn wms_layers(&self, config: &WmsLayerConfig) -> Result<Vec<RasterLayer>, LayerError> {
        build_wms_layers(&self.source, config)
    }
}

impl std::fmt::Debug for LayerFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerFactory")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}
