//! Save strategy: commit a layer's pending edits, report, reload.

use crate::error::LayerError;
use crate::vector::LayerShared;
use geolayer_core::CommitResponse;
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock, PoisonError, Weak};
use tracing::{debug, warn};

/// Called with the server's answer after an accepted commit.
pub type SuccessCallback = Arc<dyn Fn(&CommitResponse) + Send + Sync>;

/// Called when a commit is rejected or cannot be sent.
pub type FailureCallback = Arc<dyn Fn(&SaveFailure) + Send + Sync>;

/// Why a save did not go through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveFailure {
    /// The server answered and refused the transaction.
    Rejected(CommitResponse),
    /// The transaction never got an answer.
    Transport(String),
}

impl SaveFailure {
    /// Human-readable reason, when there is one.
    pub fn message(&self) -> Option<&str> {
        match self {
            SaveFailure::Rejected(response) => response.message.as_deref(),
            SaveFailure::Transport(message) => Some(message),
        }
    }
}

/// The callback pair a commit binds onto the save strategy.
///
/// Binding replaces both slots: a commit that only sets `success` clears a
/// previously bound `failure`.
#[derive(Clone, Default)]
pub struct CommitOptions {
    /// Invoked after an accepted commit.
    pub success: Option<SuccessCallback>,
    /// Invoked after a rejected or failed commit.
    pub failure: Option<FailureCallback>,
}

impl CommitOptions {
    /// No callbacks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the success callback.
    #[must_use]
    pub fn on_success<F>(mut self, callback: F) -> Self
    where
        F: Fn(&CommitResponse) + Send + Sync + 'static,
    {
        self.success = Some(Arc::new(callback));
        self
    }

    /// Set the failure callback.
    #[must_use]
    pub fn on_failure<F>(mut self, callback: F) -> Self
    where
        F: Fn(&SaveFailure) + Send + Sync + 'static,
    {
        self.failure = Some(Arc::new(callback));
        self
    }
}

impl fmt::Debug for CommitOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommitOptions")
            .field("success", &self.success.is_some())
            .field("failure", &self.failure.is_some())
            .finish()
    }
}

/// Commits the owning layer's dirty features and decides what happens next.
///
/// After the commit:
///
/// - accepted: the success callback (if any) gets the response, then the
///   layer is refreshed;
/// - rejected: the failure callback gets the response, or a warning is
///   logged when none is bound; the layer is left as is, edits intact;
/// - not sent at all: the failure callback (or a warning) and the error is
///   returned, no refresh.
///
/// The callback always runs before the refresh starts. Cancelling the layer
/// while the commit is in flight skips every callback.
pub struct SaveStrategy {
    callbacks: Mutex<CommitOptions>,
    layer: OnceLock<Weak<LayerShared>>,
}

/// A save strategy with no callbacks, not yet bound to a layer.
pub fn build_save_strategy() -> SaveStrategy {
    SaveStrategy::new()
}

impl SaveStrategy {
    /// Same as [`build_save_strategy`].
    pub fn new() -> Self {
        Self {
            callbacks: Mutex::new(CommitOptions::default()),
            layer: OnceLock::new(),
        }
    }

    /// Replace both callbacks.
    pub fn set_callbacks(&self, options: CommitOptions) {
        *self.callbacks.lock().unwrap_or_else(PoisonError::into_inner) = options;
    }

    /// Whether a success callback is bound.
    pub fn has_success_callback(&self) -> bool {
        self.current().success.is_some()
    }

    /// Whether a failure callback is bound.
    pub fn has_failure_callback(&self) -> bool {
        self.current().failure.is_some()
    }

    /// Whether the strategy is attached to a layer that is still alive.
    pub fn is_bound(&self) -> bool {
        self.layer.get().is_some_and(|weak| weak.strong_count() > 0)
    }

    pub(crate) fn bind(&self, layer: Weak<LayerShared>) {
        if self.layer.set(layer).is_err() {
            warn!("save strategy is already bound, keeping the first layer");
        }
    }

    fn current(&self) -> CommitOptions {
        self.callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Commit the owning layer's dirty features.
    ///
    /// Returns the server's answer, including a rejection. Transport
    /// failures and cancellation come back as errors.
    ///
    /// # Errors
    ///
    /// [`LayerError::Detached`] if the layer is gone,
    /// [`LayerError::Protocol`] if the commit could not be sent,
    /// [`LayerError::Cancelled`] if the layer was cancelled meanwhile.
    pub async fn save(&self) -> Result<CommitResponse, LayerError> {
        let layer = self
            .layer
            .get()
            .and_then(Weak::upgrade)
            .ok_or(LayerError::Detached)?;
        let CommitOptions { success, failure } = self.current();
        let (protocol, service) = layer.endpoint()?;
        let pending = layer.dirty_features();

        debug!(layer = %layer.name(), pending = pending.len(), "committing");
        let result = layer
            .until_cancelled(service.commit(protocol, &pending))
            .await?;

        let response = match result {
            Err(err) => {
                match &failure {
                    Some(callback) => callback(&SaveFailure::Transport(err.to_string())),
                    None => {
                        warn!(layer = %layer.name(), error = %err, "commit failed and no failure handler is bound");
                    }
                }
                return Err(err.into());
            }
            Ok(response) if response.is_success() => {
                layer.mark_committed(&pending, &response);
                if let Some(callback) = &success {
                    callback(&response);
                }
                response
            }
            Ok(response) => {
                match &failure {
                    Some(callback) => callback(&SaveFailure::Rejected(response.clone())),
                    None => warn!(
                        layer = %layer.name(),
                        message = response.message.as_deref().unwrap_or(""),
                        "commit rejected and no failure handler is bound"
                    ),
                }
                return Ok(response);
            }
        };

        match layer.refresh_after_save().await {
            Ok(_) => {}
            Err(LayerError::Cancelled) => return Err(LayerError::Cancelled),
            Err(err) => warn!(layer = %layer.name(), error = %err, "refresh after commit failed"),
        }
        Ok(response)
    }
}

impl Default for SaveStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SaveStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SaveStrategy")
            .field("callbacks", &self.current())
            .field("bound", &self.is_bound())
            .finish()
    }
}
