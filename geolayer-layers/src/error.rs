//! Layer construction and operation errors.

use geolayer_core::{ConfigError, ProtocolError};
use geolayer_filter::FilterError;
use thiserror::Error;

/// Errors from the layer factories and from layer operations.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum LayerError {
    /// The layer configuration was incomplete or invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The feature service failed.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// A raster filter could not be encoded.
    #[error("filter error: {0}")]
    Filter(#[from] FilterError),

    /// The operation needs a protocol and the layer is a plain display layer.
    #[error("layer {0} has no protocol")]
    NoProtocol(String),

    /// The layer was cancelled (explicitly or by being dropped).
    #[error("layer operation cancelled")]
    Cancelled,

    /// A background read was requested outside a tokio runtime.
    #[error("no tokio runtime available to run the initial read")]
    NoRuntime,

    /// The save strategy is not attached to a live layer.
    #[error("save strategy is not bound to a layer")]
    Detached,

    /// A request URL could not be built.
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}
