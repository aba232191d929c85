//! Workspace persistence
//!
//! Serializes the whole workspace as one JSON document under a single key.

use super::backend::StorageBackend;
use crate::error::{AppError, Result};
use crate::workspace::WorkspaceSnapshot;
use chrono::Utc;

/// Reads and writes the workspace snapshot through a storage backend
#[derive(Clone)]
pub struct PersistenceAdapter {
    backend: StorageBackend,
    key: String,
}

impl PersistenceAdapter {
    pub fn new(backend: StorageBackend, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn backend(&self) -> &StorageBackend {
        &self.backend
    }

    /// Load the stored snapshot, if any
    pub async fn load(&self) -> Result<Option<WorkspaceSnapshot>> {
        let Some(raw) = self.backend.get(&self.key).await? else {
            return Ok(None);
        };

        let snapshot = serde_json::from_str(&raw)?;
        Ok(Some(snapshot))
    }

    /// Load the stored snapshot, starting empty when nothing usable exists.
    ///
    /// An unparseable document is kept under `<key>.corrupt-<timestamp>` before
    /// the empty workspace is returned, so the next save cannot destroy it.
    pub async fn load_or_default(&self) -> Result<WorkspaceSnapshot> {
        match self.load().await {
            Ok(Some(snapshot)) => {
                tracing::info!(
                    "Loaded workspace from {} backend ({} canvases)",
                    self.backend.name(),
                    snapshot.canvases.len()
                );
                Ok(snapshot)
            }
            Ok(None) => {
                tracing::info!("No stored workspace found, starting empty");
                Ok(WorkspaceSnapshot::default())
            }
            Err(AppError::Serialization(e)) => {
                let quarantine_key =
                    format!("{}.corrupt-{}", self.key, Utc::now().format("%Y%m%d%H%M%S"));
                tracing::warn!(
                    "Stored workspace is unreadable ({}), keeping it as {} and starting empty",
                    e,
                    quarantine_key
                );

                if let Some(raw) = self.backend.get(&self.key).await? {
                    self.backend.set(&quarantine_key, &raw).await?;
                }
                self.backend.remove(&self.key).await?;

                Ok(WorkspaceSnapshot::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Serialize and store the snapshot
    pub async fn save(&self, snapshot: &WorkspaceSnapshot) -> Result<()> {
        let raw = serde_json::to_string(snapshot)?;
        self.backend.set(&self.key, &raw).await?;

        tracing::debug!("Saved workspace ({} bytes)", raw.len());
        Ok(())
    }

    /// Remove the stored snapshot
    pub async fn clear(&self) -> Result<()> {
        self.backend.remove(&self.key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::WorkspaceStore;

    #[tokio::test]
    async fn test_save_and_load() {
        let adapter = PersistenceAdapter::new(StorageBackend::memory(), "test");

        let mut store = WorkspaceStore::new();
        let id = store.create_canvas();
        store.rename_canvas(&id, "Alpha").unwrap();
        store.add_calendar_event("2024-01-05", "09:00", "Standup").unwrap();

        adapter.save(&store.snapshot()).await.unwrap();
        let loaded = adapter.load().await.unwrap().unwrap();

        assert_eq!(loaded, store.snapshot());
    }

    #[tokio::test]
    async fn test_load_missing_returns_none() {
        let adapter = PersistenceAdapter::new(StorageBackend::memory(), "test");
        assert!(adapter.load().await.unwrap().is_none());
        assert_eq!(
            adapter.load_or_default().await.unwrap(),
            WorkspaceSnapshot::default()
        );
    }

    #[tokio::test]
    async fn test_corrupt_document_is_quarantined() {
        let backend = StorageBackend::memory();
        backend.set("test", "{ definitely not json").await.unwrap();
        let adapter = PersistenceAdapter::new(backend.clone(), "test");

        let snapshot = adapter.load_or_default().await.unwrap();
        assert_eq!(snapshot, WorkspaceSnapshot::default());
        assert!(backend.get("test").await.unwrap().is_none());

        let StorageBackend::Memory(map) = &backend else {
            panic!("expected memory backend");
        };
        let map = map.lock().await;
        let quarantined: Vec<&String> = map.keys().filter(|k| k.starts_with("test.corrupt-")).collect();
        assert_eq!(quarantined.len(), 1);
        assert_eq!(map[quarantined[0]], "{ definitely not json");
    }

    #[tokio::test]
    async fn test_records_without_timestamps_are_not_quarantined() {
        let backend = StorageBackend::memory();
        backend
            .set(
                "test",
                r#"{"canvases":{"a":{"id":"a","title":"Keep me"}},"folders":{"f":{"id":"f","name":"Work"}}}"#,
            )
            .await
            .unwrap();
        let adapter = PersistenceAdapter::new(backend.clone(), "test");

        let snapshot = adapter.load_or_default().await.unwrap();

        assert_eq!(snapshot.canvases.len(), 1);
        assert_eq!(snapshot.canvases["a"].title, "Keep me");
        assert_eq!(snapshot.folders.len(), 1);
        assert!(backend.get("test").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_clear() {
        let adapter = PersistenceAdapter::new(StorageBackend::memory(), "test");
        adapter.save(&WorkspaceSnapshot::default()).await.unwrap();
        adapter.clear().await.unwrap();
        assert!(adapter.load().await.unwrap().is_none());
    }
}
