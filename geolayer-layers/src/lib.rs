#![deny(missing_docs)]
//! Vector and raster layer factories.
//!
//! | Builder | Produces |
//! |---------|----------|
//! | [`build_protocol`] | [`ProtocolDescriptor`](geolayer_core::ProtocolDescriptor) for a layer config |
//! | [`build_save_strategy`] | An unbound [`SaveStrategy`] |
//! | [`build_vector_layer`] | A [`VectorLayer`], live or display-only |
//! | [`build_wms_layers`] | One [`RasterLayer`] per published name |
//!
//! [`LayerFactory`] groups the builders over one [`DataSource`](geolayer_core::DataSource)
//! and [`FeatureService`](geolayer_core::FeatureService).
//!
//! ```no_run
//! use geolayer_core::DataSource;
//! use geolayer_layers::{CommitOptions, LayerConfig, build_vector_layer};
//! use geolayer_wfs::WfsService;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let source = DataSource::new("http://localhost:8080/geoserver/");
//! let layer = build_vector_layer(
//!     &source,
//!     Arc::new(WfsService::new()),
//!     &LayerConfig::new("larvitrampas").geometry_name("the_geom"),
//! )?;
//! layer.load().await?;
//! let options = CommitOptions::new()
//!     .on_success(|r| println!("saved, {} inserted", r.total_inserted))
//!     .on_failure(|f| eprintln!("not saved: {:?}", f.message()));
//! layer.commit(Some(options)).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod factory;
pub mod fixed;
pub mod protocol;
pub mod save;
pub mod vector;
pub mod wms;

pub use config::{DataCallback, LayerConfig};
pub use error::LayerError;
pub use factory::LayerFactory;
pub use fixed::FixedStrategy;
pub use protocol::{DEFAULT_SERVICE, build_protocol};
pub use save::{
    CommitOptions, FailureCallback, SaveFailure, SaveStrategy, SuccessCallback,
    build_save_strategy,
};
pub use vector::{Strategy, VectorLayer, build_vector_layer};
pub use wms::{
    LayerName, RasterLayer, TransitionEffect, WMS_FORMAT, WMS_SERVICE, WmsLayerConfig, WmsParams,
    build_wms_layers,
};
