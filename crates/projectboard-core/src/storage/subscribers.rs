//! Change subscription bookkeeping shared by backends.

use super::{Change, ChangeCallback, ChangeKind, Filter, Row};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

struct Entry {
    id: u64,
    table: String,
    filter: Filter,
    callback: ChangeCallback,
}

type EntryList = Mutex<Vec<Entry>>;

/// Registered change listeners for one backend.
#[derive(Default)]
pub struct Subscribers {
    entries: Arc<EntryList>,
    next_id: AtomicU64,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. It stays registered while the handle lives.
    pub fn add(&self, table: &str, filter: Filter, callback: ChangeCallback) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(Entry {
                id,
                table: table.to_string(),
                filter,
                callback,
            });
        }
        Subscription {
            id,
            entries: Arc::downgrade(&self.entries),
        }
    }

    /// Deliver a change to every matching listener.
    pub fn notify(&self, table: &str, kind: ChangeKind, row: &Row) {
        // Callbacks run outside the lock so they may subscribe or unsubscribe.
        let callbacks: Vec<ChangeCallback> = match self.entries.lock() {
            Ok(entries) => entries
                .iter()
                .filter(|e| e.table == table && e.filter.matches(row))
                .map(|e| Arc::clone(&e.callback))
                .collect(),
            Err(_) => return,
        };
        if callbacks.is_empty() {
            return;
        }
        let change = Change {
            table: table.to_string(),
            kind,
            row: row.clone(),
        };
        for callback in callbacks {
            callback(&change);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Handle for a change subscription; dropping it unsubscribes.
pub struct Subscription {
    id: u64,
    entries: Weak<EntryList>,
}

impl Subscription {
    /// Stop receiving changes.
    pub fn unsubscribe(self) {}

    /// Whether the backend that issued this handle still exists.
    pub fn is_active(&self) -> bool {
        self.entries.strong_count() > 0
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(entries) = self.entries.upgrade() {
            if let Ok(mut entries) = entries.lock() {
                entries.retain(|e| e.id != self.id);
            }
        }
    }
}
