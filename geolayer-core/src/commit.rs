//! Outcome of committing local edits to a feature service.

use serde::{Deserialize, Serialize};

/// What the server said about a commit.
///
/// A response with `success == false` is a well-formed answer from the
/// server rejecting the transaction. Failures to reach the server at all
/// are [`crate::ProtocolError`]s instead.
#[non_exhaustive]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitResponse {
    /// Whether the server accepted the transaction.
    pub success: bool,
    /// Ids assigned to inserted features, in insertion order.
    #[serde(default)]
    pub inserted_ids: Vec<String>,
    /// Number of features inserted.
    #[serde(default)]
    pub total_inserted: u64,
    /// Number of features updated.
    #[serde(default)]
    pub total_updated: u64,
    /// Number of features deleted.
    #[serde(default)]
    pub total_deleted: u64,
    /// Server message, usually present on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CommitResponse {
    /// An accepted commit with no counts.
    pub fn accepted() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    /// A rejected commit with the server's message.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            ..Self::default()
        }
    }

    /// Set the insert results.
    #[must_use]
    pub fn with_inserted(mut self, ids: Vec<String>) -> Self {
        self.total_inserted = ids.len() as u64;
        self.inserted_ids = ids;
        self
    }

    /// Set the update and delete totals.
    #[must_use]
    pub fn with_totals(mut self, updated: u64, deleted: u64) -> Self {
        self.total_updated = updated;
        self.total_deleted = deleted;
        self
    }

    /// Attach a server message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// The success signal the save strategy branches on.
    pub fn is_success(&self) -> bool {
        self.success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepted_with_inserts_counts_them() {
        let r = CommitResponse::accepted().with_inserted(vec!["a.1".into(), "a.2".into()]);
        assert!(r.is_success());
        assert_eq!(r.total_inserted, 2);
    }

    #[test]
    fn rejected_carries_message() {
        let r = CommitResponse::rejected("lock expired");
        assert!(!r.is_success());
        assert_eq!(r.message.as_deref(), Some("lock expired"));
    }
}
