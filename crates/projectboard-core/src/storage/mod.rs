//! Backend data service abstraction.
//!
//! Rows are JSON objects grouped into named tables. Filters match on
//! column equality, which is all the whiteboard needs from a hosted
//! backend-as-a-service.

mod memory;
mod subscribers;

#[cfg(not(target_arch = "wasm32"))]
mod file;

pub use memory::MemoryBackend;
pub use subscribers::{Subscribers, Subscription};

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileBackend;

use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Backend errors.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Row not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Backend error: {0}")]
    Other(String),
}

/// Result type for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// Boxed future for async operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A table row.
pub type Row = serde_json::Map<String, Value>;

/// Column equality filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub value: Value,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, row: &Row) -> bool {
        row.get(&self.column) == Some(&self.value)
    }
}

/// Kind of change delivered to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    Update,
}

/// A committed row change.
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    pub table: String,
    pub kind: ChangeKind,
    pub row: Row,
}

/// Callback invoked for each matching change.
pub type ChangeCallback = Arc<dyn Fn(&Change) + Send + Sync>;

/// Trait for table-oriented data backends.
///
/// Implementations must be usable from any thread; the returned futures
/// own everything they need so callers can hold them across edits.
pub trait Backend: Send + Sync {
    /// Rows matching `filter`.
    fn select(&self, table: &str, filter: &Filter) -> BoxFuture<'_, BackendResult<Vec<Row>>>;

    /// Insert a row and return it as stored. An `id` is assigned when the
    /// row has none.
    fn insert(&self, table: &str, row: Row) -> BoxFuture<'_, BackendResult<Row>>;

    /// Merge `patch` into every row matching `filter`; returns the updated rows.
    fn update(
        &self,
        table: &str,
        filter: &Filter,
        patch: Row,
    ) -> BoxFuture<'_, BackendResult<Vec<Row>>>;

    /// Delete matching rows; returns how many were removed.
    fn delete(&self, table: &str, filter: &Filter) -> BoxFuture<'_, BackendResult<usize>>;

    /// Watch inserts and updates on matching rows until the handle drops.
    fn subscribe(
        &self,
        table: &str,
        filter: Filter,
        callback: ChangeCallback,
    ) -> BackendResult<Subscription>;
}

impl<B: Backend + ?Sized> Backend for Arc<B> {
    fn select(&self, table: &str, filter: &Filter) -> BoxFuture<'_, BackendResult<Vec<Row>>> {
        (**self).select(table, filter)
    }

    fn insert(&self, table: &str, row: Row) -> BoxFuture<'_, BackendResult<Row>> {
        (**self).insert(table, row)
    }

    fn update(
        &self,
        table: &str,
        filter: &Filter,
        patch: Row,
    ) -> BoxFuture<'_, BackendResult<Vec<Row>>> {
        (**self).update(table, filter, patch)
    }

    fn delete(&self, table: &str, filter: &Filter) -> BoxFuture<'_, BackendResult<usize>> {
        (**self).delete(table, filter)
    }

    fn subscribe(
        &self,
        table: &str,
        filter: Filter,
        callback: ChangeCallback,
    ) -> BackendResult<Subscription> {
        (**self).subscribe(table, filter, callback)
    }
}

/// Append `row`, assigning an id if missing.
pub(crate) fn insert_row(rows: &mut Vec<Row>, mut row: Row) -> Row {
    if !row.contains_key("id") {
        row.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
    }
    rows.push(row.clone());
    row
}

pub(crate) fn update_rows(rows: &mut [Row], filter: &Filter, patch: &Row) -> Vec<Row> {
    rows.iter_mut()
        .filter(|row| filter.matches(row))
        .map(|row| {
            for (key, value) in patch {
                row.insert(key.clone(), value.clone());
            }
            row.clone()
        })
        .collect()
}

pub(crate) fn delete_rows(rows: &mut Vec<Row>, filter: &Filter) -> usize {
    let before = rows.len();
    rows.retain(|row| !filter.matches(row));
    before - rows.len()
}
