//! The persisted whiteboard record and its table access.

use crate::storage::{Backend, BackendError, BackendResult, Filter, Row, Subscription};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

/// Table holding one whiteboard per project.
pub const WHITEBOARDS_TABLE: &str = "whiteboards";

/// A project's stored whiteboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhiteboardRecord {
    pub id: String,
    pub project_id: String,
    /// Serialized surface, opaque to the backend.
    pub canvas_json: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WhiteboardRecord {
    pub fn from_row(row: Row) -> BackendResult<Self> {
        serde_json::from_value(Value::Object(row))
            .map_err(|e| BackendError::Serialization(format!("Malformed whiteboard row: {}", e)))
    }

    pub fn to_row(&self) -> BackendResult<Row> {
        match serde_json::to_value(self) {
            Ok(Value::Object(row)) => Ok(row),
            Ok(_) => Err(BackendError::Serialization(
                "Whiteboard record is not an object".to_string(),
            )),
            Err(e) => Err(BackendError::Serialization(e.to_string())),
        }
    }
}

/// Whiteboard reads and writes against a backend.
pub struct WhiteboardRepository<B: Backend> {
    backend: Arc<B>,
}

impl<B: Backend> Clone for WhiteboardRepository<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
        }
    }
}

impl<B: Backend> WhiteboardRepository<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    fn project_filter(project_id: &str) -> Filter {
        Filter::eq("project_id", project_id)
    }

    /// The project's record, if any. The most recently updated row wins
    /// should the table hold duplicates.
    pub async fn fetch(&self, project_id: &str) -> BackendResult<Option<WhiteboardRecord>> {
        let rows = self
            .backend
            .select(WHITEBOARDS_TABLE, &Self::project_filter(project_id))
            .await?;
        let mut latest: Option<WhiteboardRecord> = None;
        for row in rows {
            let record = WhiteboardRecord::from_row(row)?;
            if latest.as_ref().is_none_or(|l| record.updated_at >= l.updated_at) {
                latest = Some(record);
            }
        }
        Ok(latest)
    }

    /// Create the project's record or replace its canvas.
    pub async fn upsert(
        &self,
        project_id: &str,
        canvas_json: &str,
    ) -> BackendResult<WhiteboardRecord> {
        let filter = Self::project_filter(project_id);
        let now = Utc::now();
        let existing = self.backend.select(WHITEBOARDS_TABLE, &filter).await?;

        if existing.is_empty() {
            let record = WhiteboardRecord {
                id: Uuid::new_v4().to_string(),
                project_id: project_id.to_string(),
                canvas_json: canvas_json.to_string(),
                created_at: now,
                updated_at: now,
            };
            let stored = self
                .backend
                .insert(WHITEBOARDS_TABLE, record.to_row()?)
                .await?;
            log::debug!("Created whiteboard record for project {}", project_id);
            return WhiteboardRecord::from_row(stored);
        }

        let mut patch = Row::new();
        patch.insert("canvas_json".into(), Value::String(canvas_json.to_string()));
        patch.insert(
            "updated_at".into(),
            serde_json::to_value(now).map_err(|e| BackendError::Serialization(e.to_string()))?,
        );
        let updated = self
            .backend
            .update(WHITEBOARDS_TABLE, &filter, patch)
            .await?;
        let row = updated
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::NotFound(project_id.to_string()))?;
        log::debug!("Updated whiteboard record for project {}", project_id);
        WhiteboardRecord::from_row(row)
    }

    /// Deliver every insert or update of the project's record to `on_change`.
    /// Rows that fail to decode are skipped.
    pub fn subscribe<F>(&self, project_id: &str, on_change: F) -> BackendResult<Subscription>
    where
        F: Fn(WhiteboardRecord) + Send + Sync + 'static,
    {
        self.backend.subscribe(
            WHITEBOARDS_TABLE,
            Self::project_filter(project_id),
            Arc::new(move |change| match WhiteboardRecord::from_row(change.row.clone()) {
                Ok(record) => on_change(record),
                Err(e) => log::warn!("Ignoring whiteboard change: {}", e),
            }),
        )
    }
}
