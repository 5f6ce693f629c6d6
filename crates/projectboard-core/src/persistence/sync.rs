//! Save bookkeeping between the surface and its stored record.

use super::record::{WhiteboardRecord, WhiteboardRepository};
use crate::storage::{Backend, BackendError};
use crate::surface::SnapshotError;
use thiserror::Error;

/// Failures while loading or saving a whiteboard.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("backend request failed: {0}")]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// How a save request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The record was written.
    Saved,
    /// The surface matches the last saved form; nothing was sent.
    NoChanges,
    /// A save is already in flight; a follow-up was queued behind it.
    Coalesced,
    /// No project is attached to the session.
    NoProject,
    /// The session has been disposed.
    Disposed,
}

/// How a load ended when the backend answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The stored surface was installed.
    Loaded,
    /// No record exists; the default template was installed.
    Template,
    /// The session has been disposed; nothing was fetched.
    Disposed,
}

/// What the tracker decided for a save attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveDecision {
    Proceed,
    NoChanges,
    Coalesced,
}

/// Tracks the last saved serialized form and the in-flight save.
///
/// At most one save is in flight. Requests arriving meanwhile collapse into
/// a single follow-up, reported when the in-flight save finishes.
#[derive(Debug, Clone, Default)]
pub struct SaveTracker {
    last_saved: Option<String>,
    in_flight: bool,
    follow_up: bool,
}

impl SaveTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialized form of the last successful save or load.
    pub fn last_saved(&self) -> Option<&str> {
        self.last_saved.as_deref()
    }

    /// Whether `current` differs from what the backend holds.
    pub fn is_dirty(&self, current: &str) -> bool {
        self.last_saved.as_deref() != Some(current)
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn begin(&mut self, current: &str) -> SaveDecision {
        if self.in_flight {
            self.follow_up = true;
            SaveDecision::Coalesced
        } else if !self.is_dirty(current) {
            SaveDecision::NoChanges
        } else {
            self.in_flight = true;
            SaveDecision::Proceed
        }
    }

    /// Close the in-flight save. Returns whether a follow-up was requested.
    pub fn finish(&mut self, sent: String, succeeded: bool) -> bool {
        self.in_flight = false;
        if succeeded {
            self.last_saved = Some(sent);
        }
        std::mem::take(&mut self.follow_up)
    }

    /// Record the form that now matches the backend (`None` when there is
    /// no stored record yet).
    pub fn mark_synced(&mut self, saved: Option<String>) {
        self.last_saved = saved;
    }
}

/// A save ready to be sent. It owns everything it needs, so the session
/// stays free for editing while the write is awaited.
pub struct SaveRequest<B: Backend> {
    pub(crate) repository: WhiteboardRepository<B>,
    pub(crate) project_id: String,
    pub(crate) canvas_json: String,
}

impl<B: Backend> SaveRequest<B> {
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn canvas_json(&self) -> &str {
        &self.canvas_json
    }

    /// Write the record.
    pub async fn send(self) -> SaveReceipt {
        let result = self
            .repository
            .upsert(&self.project_id, &self.canvas_json)
            .await;
        SaveReceipt {
            canvas_json: self.canvas_json,
            result,
        }
    }
}

/// Result of a sent save, handed back to the session.
#[derive(Debug)]
pub struct SaveReceipt {
    pub(crate) canvas_json: String,
    pub(crate) result: Result<WhiteboardRecord, BackendError>,
}

impl SaveReceipt {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Start of a save attempt.
pub enum SaveStart<B: Backend> {
    Ready(SaveRequest<B>),
    /// Nothing to send; carries why.
    Skipped(SaveOutcome),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_tracker_is_dirty() {
        let tracker = SaveTracker::new();
        assert!(tracker.is_dirty("{}"));
        assert_eq!(tracker.last_saved(), None);
    }

    #[test]
    fn test_save_then_no_changes() {
        let mut tracker = SaveTracker::new();
        assert_eq!(tracker.begin("a"), SaveDecision::Proceed);
        assert!(!tracker.finish("a".into(), true));
        assert_eq!(tracker.begin("a"), SaveDecision::NoChanges);
        assert_eq!(tracker.begin("b"), SaveDecision::Proceed);
    }

    #[test]
    fn test_coalescing() {
        let mut tracker = SaveTracker::new();
        assert_eq!(tracker.begin("a"), SaveDecision::Proceed);
        assert_eq!(tracker.begin("b"), SaveDecision::Coalesced);
        assert_eq!(tracker.begin("c"), SaveDecision::Coalesced);
        assert!(tracker.finish("a".into(), true));
        assert!(!tracker.in_flight());
        assert_eq!(tracker.last_saved(), Some("a"));
    }

    #[test]
    fn test_failed_save_keeps_marker() {
        let mut tracker = SaveTracker::new();
        tracker.mark_synced(Some("old".into()));
        assert_eq!(tracker.begin("new"), SaveDecision::Proceed);
        tracker.finish("new".into(), false);
        assert_eq!(tracker.last_saved(), Some("old"));
        assert_eq!(tracker.begin("new"), SaveDecision::Proceed);
    }
}
