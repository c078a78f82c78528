//! InMemoryFeatureService: a feature store with scripted outcomes.

use crate::commit::CommitResponse;
use crate::error::ProtocolError;
use crate::feature::{Feature, FeatureCollection, FeatureState};
use crate::protocol::{FeatureService, ProtocolDescriptor};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

/// A feature service that keeps "server-side" features in a `Vec`.
///
/// Commits are applied to the stored features (inserts get ids of the form
/// `<feature_type>.<n>`) unless a rejection was scripted with
/// [`InMemoryFeatureService::reject_next_commit`]. Every read and commit is
/// recorded for inspection.
pub struct InMemoryFeatureService {
    stored: Mutex<Vec<Feature>>,
    scripted_commits: Mutex<VecDeque<CommitResponse>>,
    read_failure: Mutex<Option<String>>,
    commit_failure: Mutex<Option<String>>,
    delay: Mutex<Option<Duration>>,
    reads: AtomicUsize,
    read_protocols: Mutex<Vec<ProtocolDescriptor>>,
    commits: Mutex<Vec<Vec<Feature>>>,
    next_id: AtomicU64,
}

impl InMemoryFeatureService {
    /// Create an empty service.
    pub fn new() -> Self {
        Self {
            stored: Mutex::new(Vec::new()),
            scripted_commits: Mutex::new(VecDeque::new()),
            read_failure: Mutex::new(None),
            commit_failure: Mutex::new(None),
            delay: Mutex::new(None),
            reads: AtomicUsize::new(0),
            read_protocols: Mutex::new(Vec::new()),
            commits: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Create a service pre-loaded with features.
    pub fn with_features(features: Vec<Feature>) -> Self {
        let service = Self::new();
        *service.stored.lock().unwrap() = features
            .into_iter()
            .map(|f| f.with_state(FeatureState::Unknown))
            .collect();
        service
    }

    /// Answer the next commit with a rejection carrying `message`.
    pub fn reject_next_commit(&self, message: impl Into<String>) {
        self.scripted_commits
            .lock()
            .unwrap()
            .push_back(CommitResponse::rejected(message));
    }

    /// Make every read fail with a service exception until cleared.
    pub fn fail_reads(&self, message: Option<&str>) {
        *self.read_failure.lock().unwrap() = message.map(str::to_owned);
    }

    /// Make every commit fail at the transport level until cleared.
    pub fn fail_commits(&self, message: Option<&str>) {
        *self.commit_failure.lock().unwrap() = message.map(str::to_owned);
    }

    /// Delay every operation, to exercise cancellation.
    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock().unwrap() = delay;
    }

    /// Number of reads served so far.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Descriptors received by reads, in order.
    pub fn read_protocols(&self) -> Vec<ProtocolDescriptor> {
        self.read_protocols.lock().unwrap().clone()
    }

    /// Feature batches received by commits, in order.
    pub fn commits(&self) -> Vec<Vec<Feature>> {
        self.commits.lock().unwrap().clone()
    }

    /// Current server-side features.
    pub fn stored(&self) -> Vec<Feature> {
        self.stored.lock().unwrap().clone()
    }

    async fn pause(&self) {
        let delay = *self.delay.lock().unwrap();
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
        }
    }

    fn apply(&self, feature_type: &str, features: &[Feature]) -> CommitResponse {
        let mut stored = self.stored.lock().unwrap();
        let mut inserted = Vec::new();
        let (mut updated, mut deleted) = (0, 0);
        for f in features {
            match f.state {
                FeatureState::Insert => {
                    let n = self.next_id.fetch_add(1, Ordering::SeqCst);
                    let id = format!("{feature_type}.{n}");
                    stored.push(
                        f.clone()
                            .with_id(id.clone())
                            .with_state(FeatureState::Unknown),
                    );
                    inserted.push(id);
                }
                FeatureState::Update => {
                    if let Some(existing) = stored.iter_mut().find(|s| s.id == f.id) {
                        *existing = f.clone().with_state(FeatureState::Unknown);
                        updated += 1;
                    }
                }
                FeatureState::Delete => {
                    let before = stored.len();
                    stored.retain(|s| s.id != f.id);
                    deleted += (before - stored.len()) as u64;
                }
                FeatureState::Unknown => {}
            }
        }
        CommitResponse::accepted()
            .with_inserted(inserted)
            .with_totals(updated, deleted)
    }
}

impl Default for InMemoryFeatureService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FeatureService for InMemoryFeatureService {
    async fn read(
        &self,
        protocol: &ProtocolDescriptor,
    ) -> Result<FeatureCollection, ProtocolError> {
        self.pause().await;
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.read_protocols.lock().unwrap().push(protocol.clone());
        if let Some(message) = self.read_failure.lock().unwrap().clone() {
            return Err(ProtocolError::ServiceException(message));
        }
        Ok(FeatureCollection::new(self.stored()))
    }

    async fn commit(
        &self,
        protocol: &ProtocolDescriptor,
        features: &[Feature],
    ) -> Result<CommitResponse, ProtocolError> {
        self.pause().await;
        self.commits.lock().unwrap().push(features.to_vec());
        if let Some(message) = self.commit_failure.lock().unwrap().clone() {
            return Err(ProtocolError::Network(message.into()));
        }
        if let Some(scripted) = self.scripted_commits.lock().unwrap().pop_front() {
            if !scripted.is_success() {
                return Ok(scripted);
            }
        }
        Ok(self.apply(protocol.feature_type(), features))
    }
}
