//! File-based backend for native platforms.

use super::{
    BoxFuture, Backend, BackendError, BackendResult, ChangeCallback, ChangeKind, Filter, Row,
    Subscribers, Subscription, delete_rows, insert_row, update_rows,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// File-based backend for native platforms.
///
/// Each table is one JSON array of rows in `<base>/<table>.json`.
pub struct FileBackend {
    base_path: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
    subscribers: Subscribers,
}

impl FileBackend {
    /// Create a backend rooted at `base_path`, creating the directory if needed.
    pub fn new(base_path: PathBuf) -> BackendResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                BackendError::Io(format!("Failed to create data directory: {}", e))
            })?;
        }
        Ok(Self {
            base_path,
            write_lock: Mutex::new(()),
            subscribers: Subscribers::new(),
        })
    }

    /// Create a backend in the default location.
    ///
    /// On Unix: `~/.local/share/projectboard/tables/`
    /// On Windows: `%LOCALAPPDATA%\projectboard\tables\`
    pub fn default_location() -> BackendResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| BackendError::Io("Could not determine home directory".to_string()))?;

        Self::new(base.join("projectboard").join("tables"))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn table_path(&self, table: &str) -> PathBuf {
        let safe: String = table
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_path.join(format!("{}.json", safe))
    }

    fn read_table(path: &Path) -> BackendResult<Vec<Row>> {
        if !path.exists() {
            return Ok(Vec::new());
        }
        let json = fs::read_to_string(path)
            .map_err(|e| BackendError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
        serde_json::from_str(&json).map_err(|e| {
            BackendError::Serialization(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    fn write_table(path: &Path, rows: &[Row]) -> BackendResult<()> {
        let json = serde_json::to_string_pretty(rows)
            .map_err(|e| BackendError::Serialization(e.to_string()))?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .map_err(|e| BackendError::Io(format!("Failed to write {}: {}", tmp.display(), e)))?;
        fs::rename(&tmp, path)
            .map_err(|e| BackendError::Io(format!("Failed to replace {}: {}", path.display(), e)))
    }

    /// Run `f` over the table's rows and write them back.
    fn modify_table<T>(
        &self,
        table: &str,
        f: impl FnOnce(&mut Vec<Row>) -> T,
    ) -> BackendResult<T> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|e| BackendError::Other(format!("Lock error: {}", e)))?;
        let path = self.table_path(table);
        let mut rows = Self::read_table(&path)?;
        let out = f(&mut rows);
        Self::write_table(&path, &rows)?;
        Ok(out)
    }
}

impl Backend for FileBackend {
    fn select(&self, table: &str, filter: &Filter) -> BoxFuture<'_, BackendResult<Vec<Row>>> {
        let path = self.table_path(table);
        let filter = filter.clone();
        Box::pin(async move {
            let rows = Self::read_table(&path)?;
            Ok(rows.into_iter().filter(|r| filter.matches(r)).collect())
        })
    }

    fn insert(&self, table: &str, row: Row) -> BoxFuture<'_, BackendResult<Row>> {
        let table = table.to_string();
        Box::pin(async move {
            let stored = self.modify_table(&table, |rows| insert_row(rows, row))?;
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
            let updated = self.modify_table(&table, |rows| update_rows(rows, &filter, &patch))?;
            for row in &updated {
                self.subscribers.notify(&table, ChangeKind::Update, row);
            }
            Ok(updated)
        })
    }

    fn delete(&self, table: &str, filter: &Filter) -> BoxFuture<'_, BackendResult<usize>> {
        let table = table.to_string();
        let filter = filter.clone();
        Box::pin(async move { self.modify_table(&table, |rows| delete_rows(rows, &filter)) })
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
