//! Linear undo/redo history of full-surface snapshots.

use crate::surface::{SnapshotError, SurfaceState};
use std::sync::Arc;

/// Default number of snapshots kept before the oldest is dropped.
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Immutable capture of the surface at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot(Arc<SurfaceState>);

impl Snapshot {
    pub fn capture(state: &SurfaceState) -> Self {
        Self(Arc::new(state.clone()))
    }

    pub fn state(&self) -> &SurfaceState {
        &self.0
    }

    /// Owned copy of the captured content, for restoring into a surface.
    pub fn to_state(&self) -> SurfaceState {
        (*self.0).clone()
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        self.0.to_json()
    }

    /// Two snapshots are the same user-visible state when their
    /// serialized forms match.
    pub fn same_as(&self, other: &Snapshot) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

/// Snapshot sequence plus cursor.
///
/// The cursor is `None` exactly when the sequence is empty and otherwise
/// always indexes a stored snapshot.
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<Snapshot>,
    cursor: Option<usize>,
    capacity: usize,
    restoring: bool,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl History {
    /// Create an empty history. A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            cursor: None,
            capacity: capacity.max(1),
            restoring: false,
        }
    }

    /// Append a snapshot after the cursor, discarding any redo tail.
    ///
    /// Returns `false` (and records nothing) while a restore is in progress.
    pub fn record(&mut self, snapshot: Snapshot) -> bool {
        if self.restoring {
            return false;
        }
        if let Some(cursor) = self.cursor {
            self.entries.truncate(cursor + 1);
        }
        self.entries.push(snapshot);
        if self.entries.len() > self.capacity {
            self.entries.remove(0);
        }
        self.cursor = Some(self.entries.len() - 1);
        true
    }

    /// Step back one snapshot. `None` at the start of history.
    pub fn undo(&mut self) -> Option<Snapshot> {
        let cursor = self.cursor?;
        if cursor == 0 {
            return None;
        }
        self.cursor = Some(cursor - 1);
        self.entries.get(cursor - 1).cloned()
    }

    /// Step forward one snapshot. `None` at the end of history.
    pub fn redo(&mut self) -> Option<Snapshot> {
        let cursor = self.cursor?;
        if cursor + 1 >= self.entries.len() {
            return None;
        }
        self.cursor = Some(cursor + 1);
        self.entries.get(cursor + 1).cloned()
    }

    /// Replace the whole history with a single baseline snapshot.
    pub fn reset(&mut self, baseline: Snapshot) {
        self.entries.clear();
        self.entries.push(baseline);
        self.cursor = Some(0);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = None;
    }

    /// Mark the start of a restore; records are ignored until `end_restore`.
    pub fn begin_restore(&mut self) {
        self.restoring = true;
    }

    pub fn end_restore(&mut self) {
        self.restoring = false;
    }

    pub fn is_restoring(&self) -> bool {
        self.restoring
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Snapshot under the cursor.
    pub fn current(&self) -> Option<&Snapshot> {
        self.cursor.and_then(|c| self.entries.get(c))
    }

    pub fn entries(&self) -> &[Snapshot] {
        &self.entries
    }

    pub fn can_undo(&self) -> bool {
        matches!(self.cursor, Some(c) if c > 0)
    }

    pub fn can_redo(&self) -> bool {
        matches!(self.cursor, Some(c) if c + 1 < self.entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::SerializableColor;

    fn snap(shade: u8) -> Snapshot {
        Snapshot::capture(&SurfaceState {
            background: SerializableColor::rgb(shade, shade, shade),
            objects: Vec::new(),
        })
    }

    #[test]
    fn test_empty_history() {
        let mut history = History::default();
        assert_eq!(history.cursor(), None);
        assert!(history.undo().is_none());
        assert!(history.redo().is_none());
        assert_eq!(history.cursor(), None);
    }

    #[test]
    fn test_undo_at_start_is_noop() {
        let mut history = History::default();
        history.record(snap(0));
        assert!(history.undo().is_none());
        assert_eq!(history.cursor(), Some(0));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_redo_at_end_is_noop() {
        let mut history = History::default();
        history.record(snap(0));
        history.record(snap(1));
        assert!(history.redo().is_none());
        assert_eq!(history.cursor(), Some(1));
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_branch_truncation() {
        let mut history = History::default();
        history.record(snap(0));
        history.record(snap(1));
        history.record(snap(2));
        history.undo();
        history.undo();
        assert_eq!(history.cursor(), Some(0));

        history.record(snap(9));
        assert_eq!(history.len(), 2);
        assert_eq!(history.cursor(), Some(1));
        assert!(history.entries()[0].same_as(&snap(0)));
        assert!(history.entries()[1].same_as(&snap(9)));
    }

    #[test]
    fn test_navigation_does_not_grow() {
        let mut history = History::default();
        for i in 0..4 {
            history.record(snap(i));
        }
        for _ in 0..10 {
            history.undo();
        }
        for _ in 0..3 {
            history.redo();
        }
        history.undo();
        assert_eq!(history.len(), 4);
        assert_eq!(history.cursor(), Some(2));
    }

    #[test]
    fn test_restore_guard() {
        let mut history = History::default();
        history.record(snap(0));
        history.begin_restore();
        assert!(history.is_restoring());
        assert!(!history.record(snap(1)));
        history.end_restore();
        assert!(!history.is_restoring());
        assert_eq!(history.len(), 1);
        assert!(history.record(snap(1)));
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut history = History::new(3);
        for i in 0..5 {
            history.record(snap(i));
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.cursor(), Some(2));
        assert!(history.entries()[0].same_as(&snap(2)));
        assert!(history.current().unwrap().same_as(&snap(4)));
    }

    #[test]
    fn test_reset_to_baseline() {
        let mut history = History::default();
        history.record(snap(0));
        history.record(snap(1));
        history.reset(snap(7));
        assert_eq!(history.len(), 1);
        assert_eq!(history.cursor(), Some(0));
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }
}
