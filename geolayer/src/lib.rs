#![deny(missing_docs)]
//! # geolayer: umbrella crate
//!
//! One import surface for the geolayer crates. Re-exports the data model,
//! filter encoder, WFS transport and layer factories behind feature flags,
//! plus a `prelude` for the common path.

#[cfg(feature = "core")]
pub use geolayer_core;
#[cfg(feature = "filter")]
pub use geolayer_filter;
#[cfg(feature = "layers")]
pub use geolayer_layers;
#[cfg(feature = "wfs")]
pub use geolayer_wfs;

/// Common imports for building layers.
pub mod prelude {
    #[cfg(feature = "core")]
    pub use geolayer_core::{
        Bounds, CommitResponse, ConfigError, DataSource, Feature, FeatureCollection,
        FeatureService, FeatureState, Filter, ProtocolDescriptor, ProtocolError,
    };

    #[cfg(feature = "filter")]
    pub use geolayer_filter::{FilterEncoder, FilterError, FilterVersion};

    #[cfg(feature = "layers")]
    pub use geolayer_layers::{
        CommitOptions, LayerConfig, LayerError, LayerFactory, RasterLayer, SaveFailure,
        VectorLayer, WmsLayerConfig, build_protocol, build_save_strategy, build_vector_layer,
        build_wms_layers,
    };

    #[cfg(feature = "wfs")]
    pub use geolayer_wfs::WfsService;
}
