//! In-memory backend implementation.

use super::{
    BoxFuture, Backend, BackendError, BackendResult, ChangeCallback, ChangeKind, Filter, Row,
    Subscribers, Subscription, delete_rows, insert_row, update_rows,
};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory backend for testing and ephemeral use.
#[derive(Default)]
pub struct MemoryBackend {
    tables: RwLock<HashMap<String, Vec<Row>>>,
    subscribers: Subscribers,
}

impl MemoryBackend {
    /// Create a new empty memory backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows currently stored in `table`.
    pub fn row_count(&self, table: &str) -> usize {
        self.tables
            .read()
            .map(|t| t.get(table).map_or(0, Vec::len))
            .unwrap_or(0)
    }
}

fn lock_error(e: impl std::fmt::Display) -> BackendError {
    BackendError::Other(format!("Lock error: {}", e))
}

impl Backend for MemoryBackend {
    fn select(&self, table: &str, filter: &Filter) -> BoxFuture<'_, BackendResult<Vec<Row>>> {
        let table = table.to_string();
        let filter = filter.clone();
        Box::pin(async move {
            let tables = self.tables.read().map_err(lock_error)?;
            Ok(tables
                .get(&table)
                .map(|rows| rows.iter().filter(|r| filter.matches(r)).cloned().collect())
                .unwrap_or_default())
        })
    }

    fn insert(&self, table: &str, row: Row) -> BoxFuture<'_, BackendResult<Row>> {
        let table = table.to_string();
        Box::pin(async move {
            let stored = {
                let mut tables = self.tables.write().map_err(lock_error)?;
                insert_row(tables.entry(table.clone()).or_default(), row)
            };
            self.subscribers.notify(&table, ChangeKind::Insert, &stored);
            Ok(stored)
        })
    }

    fn update(
        &self,
        table: &str,
        filter: &Filter,
        patch: Row,
    ) -> BoxFuture<'_, BackendResult<Vec<Row>>> {
        let table = table.to_string();
        let filter = filter.clone();
        Box::pin(async move {
            let updated = {
                let mut tables = self.tables.write().map_err(lock_error)?;
                match tables.get_mut(&table) {
                    Some(rows) => update_rows(rows, &filter, &patch),
                    None => Vec::new(),
                }
            };
            for row in &updated {
                self.subscribers.notify(&table, ChangeKind::Update, row);
            }
            Ok(updated)
        })
    }

    fn delete(&self, table: &str, filter: &Filter) -> BoxFuture<'_, BackendResult<usize>> {
        let table = table.to_string();
        let filter = filter.clone();
        Box::pin(async move {
            let mut tables = self.tables.write().map_err(lock_error)?;
            Ok(tables
                .get_mut(&table)
                .map_or(0, |rows| delete_rows(rows, &filter)))
        })
    }

    fn subscribe(
        &self,
        table: &str,
        filter: Filter,
        callback: ChangeCallback,
    ) -> BackendResult<Subscription> {
        Ok(self.subscribers.add(table, filter, callback))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn row(value: serde_json::Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_insert_and_select() {
        let backend = MemoryBackend::new();
        pollster::block_on(backend.insert("t", row(json!({"k": "a"})))).unwrap();
        pollster::block_on(backend.insert("t", row(json!({"k": "b"})))).unwrap();

        let rows = pollster::block_on(backend.select("t", &Filter::eq("k", "a"))).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(backend.row_count("t"), 2);
    }

    #[test]
    fn test_select_unknown_table() {
        let backend = MemoryBackend::new();
        let rows = pollster::block_on(backend.select("nope", &Filter::eq("k", 1))).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_update_and_delete() {
        let backend = MemoryBackend::new();
        pollster::block_on(backend.insert("t", row(json!({"k": "a", "v": 1})))).unwrap();

        let updated =
            pollster::block_on(backend.update("t", &Filter::eq("k", "a"), row(json!({"v": 2}))))
                .unwrap();
        assert_eq!(updated[0]["v"], 2);

        let removed = pollster::block_on(backend.delete("t", &Filter::eq("k", "a"))).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(backend.row_count("t"), 0);
    }

    #[test]
    fn test_subscription_sees_insert_and_update() {
        let backend = MemoryBackend::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handle = backend
            .subscribe(
                "t",
                Filter::eq("k", "a"),
                Arc::new(move |change| sink.lock().unwrap().push(change.kind)),
            )
            .unwrap();

        pollster::block_on(backend.insert("t", row(json!({"k": "a"})))).unwrap();
        pollster::block_on(backend.update("t", &Filter::eq("k", "a"), row(json!({"v": 1}))))
            .unwrap();
        drop(handle);
        pollster::block_on(backend.insert("t", row(json!({"k": "a"})))).unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![ChangeKind::Insert, ChangeKind::Update]);
    }
}
