//! Application state and initialization
//!
//! This module manages the central application state and lifecycle.
//! All services are initialized here and made available through AppState.

use crate::config::{DATABASE_FILE, STORAGE_KEY};
use crate::database::{create_pool, Repository};
use crate::error::{AppError, Result};
use crate::services::{AppSettings, BackupService, ChatRelayClient, ChatService, SettingsService};
use crate::storage::{Autosave, PersistenceAdapter, StorageBackend};
use crate::workspace::WorkspaceStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub app_data_dir: PathBuf,
    pub settings: AppSettings,
    pub store: Arc<Mutex<WorkspaceStore>>,
    pub persistence: PersistenceAdapter,
    pub autosave: Arc<Autosave>,
    pub chat_service: ChatService,
    pub backup_service: BackupService,
    pub settings_service: SettingsService,
}

impl AppState {
    /// Archive the current workspace
    pub async fn create_backup(&self) -> Result<PathBuf> {
        let snapshot = self.store.lock().await.snapshot();
        self.backup_service.create_backup(&snapshot).await
    }

    /// Replace the workspace with a verified backup and persist it at once
    pub async fn restore_backup(&self, backup_path: &Path) -> Result<()> {
        let snapshot = self.backup_service.restore_backup(backup_path).await?;
        self.store.lock().await.replace_with(snapshot);
        self.autosave.flush().await?;

        tracing::info!("Restore completed successfully");
        Ok(())
    }

    /// Flush pending changes and stop background work
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Shutting down");
        self.autosave.shutdown().await
    }
}

async fn open_backend(app_data_dir: &Path, name: &str) -> Result<StorageBackend> {
    match name {
        "sqlite" => {
            let pool = create_pool(&app_data_dir.join(DATABASE_FILE)).await?;
            Ok(StorageBackend::sqlite(Repository::new(pool)))
        }
        "file" => Ok(StorageBackend::file(app_data_dir.join("workspace"))),
        "memory" => Ok(StorageBackend::memory()),
        other => Err(AppError::InvalidInput(format!(
            "Unknown storage backend '{}'",
            other
        ))),
    }
}

/// Application setup - called once on startup
pub async fn setup(app_data_dir: PathBuf) -> Result<AppState> {
    tracing::info!("Initializing application");
    tracing::info!("App data directory: {:?}", app_data_dir);

    // Create necessary directories
    std::fs::create_dir_all(&app_data_dir)?;
    std::fs::create_dir_all(app_data_dir.join("backups"))?;

    let settings_service = SettingsService::new(app_data_dir.clone());
    let settings = settings_service.load().await?;
    settings.validate()?;

    let backend = open_backend(&app_data_dir, &settings.persistence.backend).await?;
    tracing::info!("Using {} storage backend", backend.name());

    let persistence = PersistenceAdapter::new(backend, STORAGE_KEY);
    let snapshot = persistence.load_or_default().await?;
    let store = Arc::new(Mutex::new(WorkspaceStore::from_snapshot(snapshot)));

    let autosave = Autosave::spawn(
        store.clone(),
        persistence.clone(),
        Duration::from_millis(u64::from(settings.persistence.auto_save_delay)),
    )
    .await;

    let client = ChatRelayClient::from_settings(&settings.chat)?;
    let chat_service = ChatService::new(store.clone(), client, settings.chat.fallback_message.clone());
    let backup_service = BackupService::new(&app_data_dir, settings.backup.retention_count);

    tracing::info!("Application initialized successfully");

    Ok(AppState {
        app_data_dir,
        settings,
        store,
        persistence,
        autosave: Arc::new(autosave),
        chat_service,
        backup_service,
        settings_service,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::settings::PersistenceSettings;
    use tempfile::TempDir;

    async fn write_settings(dir: &Path, backend: &str) {
        let mut settings = AppSettings::default();
        settings.persistence = PersistenceSettings {
            backend: backend.to_string(),
            auto_save_delay: 100,
        };
        SettingsService::new(dir.to_path_buf())
            .save(&settings)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_setup_creates_layout() {
        let temp = TempDir::new().unwrap();
        let state = setup(temp.path().to_path_buf()).await.unwrap();

        assert!(temp.path().join("settings.json").exists());
        assert!(temp.path().join("backups").exists());
        assert!(temp.path().join(DATABASE_FILE).exists());
        assert_eq!(state.persistence.backend().name(), "sqlite");

        state.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_workspace_survives_restart() {
        let temp = TempDir::new().unwrap();
        write_settings(temp.path(), "file").await;

        {
            let state = setup(temp.path().to_path_buf()).await.unwrap();
            let mut store = state.store.lock().await;
            let id = store.create_canvas();
            store.rename_canvas(&id, "Persistent").unwrap();
            drop(store);
            state.shutdown().await.unwrap();
        }

        let state = setup(temp.path().to_path_buf()).await.unwrap();
        let store = state.store.lock().await;
        let titles: Vec<&str> = store.canvases().values().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Persistent"]);
        drop(store);
        state.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_restore_replaces_workspace() {
        let temp = TempDir::new().unwrap();
        write_settings(temp.path(), "memory").await;
        let state = setup(temp.path().to_path_buf()).await.unwrap();

        state.store.lock().await.create_folder("Before");
        let backup = state.create_backup().await.unwrap();
        state.store.lock().await.create_folder("After");

        state.restore_backup(&backup).await.unwrap();

        let saved = state.persistence.load().await.unwrap().unwrap();
        assert_eq!(saved.folders.len(), 1);
        assert_eq!(state.store.lock().await.folders()[0].name, "Before");

        state.shutdown().await.unwrap();
    }
}
