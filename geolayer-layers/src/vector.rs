//! Vector layer factory and the layer it builds.

use crate::config::LayerConfig;
use crate::error::LayerError;
use crate::fixed::FixedStrategy;
use crate::protocol::{DEFAULT_SERVICE, build_protocol};
use crate::save::{CommitOptions, SaveStrategy, build_save_strategy};
use geolayer_core::{
    CommitResponse, DataSource, Feature, FeatureService, FeatureState, ProtocolDescriptor,
};
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// A loading/saving behaviour attached to a live vector layer.
#[derive(Debug)]
pub enum Strategy {
    /// Load everything once.
    Fixed(FixedStrategy),
    /// Commit edits on request.
    Save(SaveStrategy),
}

impl Strategy {
    /// Short name: `"fixed"` or `"save"`.
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Fixed(_) => "fixed",
            Strategy::Save(_) => "save",
        }
    }
}

pub(crate) struct LayerShared {
    name: String,
    display_in_layer_switcher: bool,
    protocol: Option<ProtocolDescriptor>,
    service: Option<Arc<dyn FeatureService>>,
    strategies: Vec<Strategy>,
    features: RwLock<Vec<Feature>>,
    cancel: CancellationToken,
    refreshes: AtomicUsize,
}

impl LayerShared {
    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn endpoint(
        &self,
    ) -> Result<(&ProtocolDescriptor, &Arc<dyn FeatureService>), LayerError> {
        match (&self.protocol, &self.service) {
            (Some(protocol), Some(service)) => Ok((protocol, service)),
            _ => Err(LayerError::NoProtocol(self.name.clone())),
        }
    }

    fn fixed_strategy(&self) -> Option<&FixedStrategy> {
        self.strategies.iter().find_map(|s| match s {
            Strategy::Fixed(fixed) => Some(fixed),
            Strategy::Save(_) => None,
        })
    }

    fn save_strategy(&self) -> Option<&SaveStrategy> {
        self.strategies.iter().find_map(|s| match s {
            Strategy::Save(save) => Some(save),
            Strategy::Fixed(_) => None,
        })
    }

    pub(crate) async fn until_cancelled<F: Future>(
        &self,
        fut: F,
    ) -> Result<F::Output, LayerError> {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(LayerError::Cancelled),
            out = fut => Ok(out),
        }
    }

    pub(crate) fn dirty_features(&self) -> Vec<Feature> {
        self.features
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|f| f.is_dirty())
            .cloned()
            .collect()
    }

    /// Bring the buffer in line with an accepted commit of `sent`.
    ///
    /// Only buffered features still equal to what was sent are touched:
    /// deletions drop out, insertions take the server ids in the order they
    /// were sent, the rest turn clean. Edits made while the commit was in
    /// flight stay dirty.
    pub(crate) fn mark_committed(&self, sent: &[Feature], response: &CommitResponse) {
        let mut features = self.features.write().unwrap_or_else(PoisonError::into_inner);
        let mut matched = vec![false; features.len()];
        let mut dropped = Vec::new();
        let mut ids = response.inserted_ids.iter();
        for committed in sent {
            let inserted_id = match committed.state {
                FeatureState::Insert => ids.next(),
                _ => None,
            };
            let Some(pos) = features
                .iter()
                .enumerate()
                .position(|(i, f)| !matched[i] && f == committed)
            else {
                continue;
            };
            matched[pos] = true;
            if committed.state == FeatureState::Delete {
                dropped.push(pos);
                continue;
            }
            if let Some(id) = inserted_id {
                features[pos].id = Some(id.clone());
            }
            features[pos].state = FeatureState::Unknown;
        }
        dropped.sort_unstable();
        for pos in dropped.into_iter().rev() {
            features.remove(pos);
        }
    }

    /// Replace the buffer with the server's features. With `keep_edits`,
    /// features still dirty in the buffer are laid over the fresh copy.
    async fn read_into_buffer(&self, keep_edits: bool) -> Result<usize, LayerError> {
        let (protocol, service) = self.endpoint()?;
        let collection = self.until_cancelled(service.read(protocol)).await??;
        let mut fresh: Vec<Feature> = collection
            .features
            .into_iter()
            .map(|f| f.with_state(FeatureState::Unknown))
            .collect();
        let count = fresh.len();
        let mut features = self.features.write().unwrap_or_else(PoisonError::into_inner);
        if keep_edits {
            for edit in features.iter().filter(|f| f.is_dirty()) {
                let existing = edit
                    .id
                    .as_deref()
                    .and_then(|id| fresh.iter().position(|f| f.id.as_deref() == Some(id)));
                match existing {
                    Some(pos) => fresh[pos] = edit.clone(),
                    None => fresh.push(edit.clone()),
                }
            }
        }
        *features = fresh;
        drop(features);
        if let Some(fixed) = self.fixed_strategy() {
            fixed.mark_loaded();
        }
        debug!(layer = %self.name, features = count, "layer loaded");
        Ok(count)
    }

    pub(crate) async fn refresh(&self) -> Result<usize, LayerError> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        self.read_into_buffer(false).await
    }

    /// Refresh after a save, keeping edits the save did not carry.
    pub(crate) async fn refresh_after_save(&self) -> Result<usize, LayerError> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        self.read_into_buffer(true).await
    }
}

impl Drop for LayerShared {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// A vector layer: either a plain display layer or one bound to a feature
/// service through a [`ProtocolDescriptor`].
///
/// Clones share the same layer. Dropping the last clone cancels any read
/// or commit still in flight.
#[derive(Clone)]
pub struct VectorLayer {
    shared: Arc<LayerShared>,
}

impl VectorLayer {
    fn display_only(name: String) -> Self {
        Self {
            shared: Arc::new(LayerShared {
                name,
                display_in_layer_switcher: false,
                protocol: None,
                service: None,
                strategies: Vec::new(),
                features: RwLock::new(Vec::new()),
                cancel: CancellationToken::new(),
                refreshes: AtomicUsize::new(0),
            }),
        }
    }

    fn live(
        name: String,
        protocol: ProtocolDescriptor,
        service: Arc<dyn FeatureService>,
        cancel: CancellationToken,
    ) -> Self {
        let shared = Arc::new_cyclic(|weak| {
            let save = build_save_strategy();
            save.bind(weak.clone());
            LayerShared {
                name,
                display_in_layer_switcher: false,
                protocol: Some(protocol),
                service: Some(service),
                strategies: vec![Strategy::Fixed(FixedStrategy::new()), Strategy::Save(save)],
                features: RwLock::new(Vec::new()),
                cancel,
                refreshes: AtomicUsize::new(0),
            }
        });
        Self { shared }
    }

    /// Layer name.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Whether the layer shows up in a layer switcher. Always `false`.
    pub fn display_in_layer_switcher(&self) -> bool {
        self.shared.display_in_layer_switcher
    }

    /// The protocol, for live layers.
    pub fn protocol(&self) -> Option<&ProtocolDescriptor> {
        self.shared.protocol.as_ref()
    }

    /// Whether the layer is bound to a feature service.
    pub fn is_live(&self) -> bool {
        self.shared.protocol.is_some()
    }

    /// Attached strategies, in order. Empty for display layers.
    pub fn strategies(&self) -> &[Strategy] {
        &self.shared.strategies
    }

    /// The save strategy, for live layers.
    pub fn save_strategy(&self) -> Option<&SaveStrategy> {
        self.shared.save_strategy()
    }

    /// Snapshot of the buffered features.
    pub fn features(&self) -> Vec<Feature> {
        self.shared
            .features
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Snapshot of the features a commit would send.
    pub fn dirty_features(&self) -> Vec<Feature> {
        self.shared.dirty_features()
    }

    /// Number of buffered features, including ones marked for deletion.
    pub fn feature_count(&self) -> usize {
        self.shared
            .features
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Add features to the buffer. On live layers they are marked for
    /// insertion.
    pub fn add_features<I>(&self, features: I)
    where
        I: IntoIterator<Item = Feature>,
    {
        let state = if self.is_live() {
            FeatureState::Insert
        } else {
            FeatureState::Unknown
        };
        self.shared
            .features
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(features.into_iter().map(|f| f.with_state(state)));
    }

    /// Replace the buffered feature with the same id. Returns `false` if
    /// there is none.
    pub fn update_feature(&self, feature: Feature) -> bool {
        let Some(id) = feature.id.clone() else {
            return false;
        };
        let live = self.is_live();
        let mut features = self
            .shared
            .features
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(existing) = features.iter_mut().find(|f| f.id.as_deref() == Some(id.as_str())) else {
            return false;
        };
        let state = match existing.state {
            FeatureState::Insert => FeatureState::Insert,
            _ if live => FeatureState::Update,
            _ => FeatureState::Unknown,
        };
        *existing = feature.with_state(state);
        true
    }

    /// Remove the feature with `id`. On live layers a feature the server
    /// knows is kept and marked for deletion until the next commit.
    pub fn remove_feature(&self, id: &str) -> bool {
        let live = self.is_live();
        let mut features = self
            .shared
            .features
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(pos) = features.iter().position(|f| f.id.as_deref() == Some(id)) else {
            return false;
        };
        if live && features[pos].state != FeatureState::Insert {
            features[pos].state = FeatureState::Delete;
        } else {
            features.remove(pos);
        }
        true
    }

    /// Load the features through the fixed strategy. Only the first call
    /// reads; later calls return the buffered count.
    ///
    /// # Errors
    ///
    /// [`LayerError::NoProtocol`] on display layers, otherwise whatever the
    /// read fails with.
    pub async fn load(&self) -> Result<usize, LayerError> {
        let Some(fixed) = self.shared.fixed_strategy() else {
            return Err(LayerError::NoProtocol(self.shared.name.clone()));
        };
        if !fixed.begin() {
            return Ok(self.feature_count());
        }
        let result = self.shared.read_into_buffer(false).await;
        if result.is_err() {
            fixed.reset();
        }
        result
    }

    /// Re-read every feature from the service, replacing the buffer and any
    /// unsaved edits in it.
    ///
    /// # Errors
    ///
    /// [`LayerError::NoProtocol`] on display layers, otherwise whatever the
    /// read fails with.
    pub async fn refresh(&self) -> Result<usize, LayerError> {
        self.shared.refresh().await
    }

    /// Number of refreshes so far, including the ones a save triggers.
    pub fn refresh_count(&self) -> usize {
        self.shared.refreshes.load(Ordering::SeqCst)
    }

    /// Commit pending edits through the save strategy.
    ///
    /// With `Some(options)` both callbacks are rebound first; with `None`
    /// whatever was bound before stays.
    ///
    /// # Errors
    ///
    /// See [`SaveStrategy::save`]. [`LayerError::NoProtocol`] on display
    /// layers.
    pub async fn commit(
        &self,
        options: Option<CommitOptions>,
    ) -> Result<CommitResponse, LayerError> {
        let save = self
            .shared
            .save_strategy()
            .ok_or_else(|| LayerError::NoProtocol(self.shared.name.clone()))?;
        if let Some(options) = options {
            save.set_callbacks(options);
        }
        save.save().await
    }

    /// Cancel in-flight and future reads and commits on this layer.
    pub fn cancel(&self) {
        self.shared.cancel.cancel();
    }

    /// Whether the layer was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.shared.cancel.is_cancelled()
    }
}

impl fmt::Debug for VectorLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VectorLayer")
            .field("name", &self.shared.name)
            .field("protocol", &self.shared.protocol)
            .field("strategies", &self.shared.strategies)
            .field("features", &self.feature_count())
            .finish()
    }
}

/// Build a vector layer from a layer config.
///
/// A config with neither a geometry column nor a namespace gives a plain
/// display layer. Otherwise the config is copied, its service forced to
/// [`DEFAULT_SERVICE`], and a protocol built from the copy; the layer gets
/// a fixed and a save strategy. If `on_data` is set, an initial read is
/// spawned on the current tokio runtime and its result handed to the
/// callback. The read is abandoned if the layer is cancelled or dropped
/// first.
///
/// # Errors
///
/// [`LayerError::Config`] if the protocol cannot be built,
/// [`LayerError::NoRuntime`] if `on_data` is set outside a runtime.
pub fn build_vector_layer(
    source: &DataSource,
    service: Arc<dyn FeatureService>,
    config: &LayerConfig,
) -> Result<VectorLayer, LayerError> {
    if config.is_display_only() {
        debug!(layer = %config.layer_name, "built display layer");
        return Ok(VectorLayer::display_only(config.layer_name.clone()));
    }

    let mut params = config.clone();
    params.service = Some(DEFAULT_SERVICE.to_owned());
    let protocol = build_protocol(source, &params)?;

    let runtime = match params.on_data {
        Some(_) => Some(tokio::runtime::Handle::try_current().map_err(|_| LayerError::NoRuntime)?),
        None => None,
    };

    let cancel = CancellationToken::new();
    if let (Some(runtime), Some(callback)) = (runtime, params.on_data.clone()) {
        let service = Arc::clone(&service);
        let protocol = protocol.clone();
        let token = cancel.clone();
        runtime.spawn(async move {
            tokio::select! {
                biased;
                () = token.cancelled() => {
                    debug!(layer = %protocol.feature_type(), "initial read cancelled");
                }
                result = service.read(&protocol) => callback(result),
            }
        });
    }

    debug!(
        layer = %params.layer_name,
        url = %protocol.service_url(),
        "built vector layer"
    );
    Ok(VectorLayer::live(params.layer_name, protocol, service, cancel))
}
