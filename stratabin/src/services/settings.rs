//! Settings service
//!
//! Manages application settings persistence using JSON file storage.

use crate::config::{
    CHAT_FALLBACK_MESSAGE, DEFAULT_AUTO_SAVE_DELAY_MS, DEFAULT_BACKUP_RETENTION_COUNT,
    DEFAULT_CHAT_ENDPOINT, DEFAULT_CHAT_TIMEOUT_SECS, MAX_AUTO_SAVE_DELAY_MS,
    MAX_BACKUP_RETENTION_COUNT, MAX_CHAT_TIMEOUT_SECS, MIN_AUTO_SAVE_DELAY_MS, SETTINGS_FILE,
    VALID_STORAGE_BACKENDS,
};
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;

/// Where and how often the workspace is written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistenceSettings {
    /// One of "sqlite", "file", "memory"
    #[serde(default = "default_storage_backend")]
    pub backend: String,
    /// Autosave debounce in milliseconds
    #[serde(default = "default_auto_save_delay")]
    pub auto_save_delay: u32,
}

fn default_storage_backend() -> String {
    "sqlite".to_string()
}

fn default_auto_save_delay() -> u32 {
    DEFAULT_AUTO_SAVE_DELAY_MS
}

impl Default for PersistenceSettings {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            auto_save_delay: default_auto_save_delay(),
        }
    }
}

/// Chat relay configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSettings {
    #[serde(default = "default_chat_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_chat_timeout")]
    pub timeout_secs: u64,
    /// Assistant text recorded when the relay cannot be reached
    #[serde(default = "default_fallback_message")]
    pub fallback_message: String,
}

fn default_chat_endpoint() -> String {
    DEFAULT_CHAT_ENDPOINT.to_string()
}

fn default_chat_timeout() -> u64 {
    DEFAULT_CHAT_TIMEOUT_SECS
}

fn default_fallback_message() -> String {
    CHAT_FALLBACK_MESSAGE.to_string()
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            endpoint: default_chat_endpoint(),
            timeout_secs: default_chat_timeout(),
            fallback_message: default_fallback_message(),
        }
    }
}

/// Backup configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupSettings {
    #[serde(default = "default_backup_retention")]
    pub retention_count: usize,
}

fn default_backup_retention() -> usize {
    DEFAULT_BACKUP_RETENTION_COUNT
}

impl Default for BackupSettings {
    fn default() -> Self {
        Self {
            retention_count: default_backup_retention(),
        }
    }
}

/// Application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AppSettings {
    #[serde(default)]
    pub persistence: PersistenceSettings,
    #[serde(default)]
    pub chat: ChatSettings,
    #[serde(default)]
    pub backup: BackupSettings,
}

impl AppSettings {
    /// Check every value against its allowed range
    pub fn validate(&self) -> Result<()> {
        if !VALID_STORAGE_BACKENDS.contains(&self.persistence.backend.as_str()) {
            return Err(AppError::InvalidInput(format!(
                "Unknown storage backend '{}'",
                self.persistence.backend
            )));
        }

        let delay = self.persistence.auto_save_delay;
        if !(MIN_AUTO_SAVE_DELAY_MS..=MAX_AUTO_SAVE_DELAY_MS).contains(&delay) {
            return Err(AppError::InvalidInput(format!(
                "Autosave delay must be between {} and {} ms",
                MIN_AUTO_SAVE_DELAY_MS, MAX_AUTO_SAVE_DELAY_MS
            )));
        }

        if self.chat.endpoint.trim().is_empty() {
            return Err(AppError::InvalidInput("Chat endpoint is empty".to_string()));
        }

        if self.chat.timeout_secs == 0 || self.chat.timeout_secs > MAX_CHAT_TIMEOUT_SECS {
            return Err(AppError::InvalidInput(format!(
                "Chat timeout must be between 1 and {} seconds",
                MAX_CHAT_TIMEOUT_SECS
            )));
        }

        if self.backup.retention_count == 0 || self.backup.retention_count > MAX_BACKUP_RETENTION_COUNT
        {
            return Err(AppError::InvalidInput(format!(
                "Backup retention must be between 1 and {}",
                MAX_BACKUP_RETENTION_COUNT
            )));
        }

        Ok(())
    }
}

/// Service for managing application settings
#[derive(Clone)]
pub struct SettingsService {
    settings_path: PathBuf,
}

impl SettingsService {
    pub fn new(app_data_dir: PathBuf) -> Self {
        Self {
            settings_path: app_data_dir.join(SETTINGS_FILE),
        }
    }

    /// Load settings from disk or create default if not exists
    pub async fn load(&self) -> Result<AppSettings> {
        if !self.settings_path.exists() {
            tracing::info!("Settings file not found, creating default settings");
            let default = AppSettings::default();
            self.save(&default).await?;
            return Ok(default);
        }

        let content = fs::read_to_string(&self.settings_path).await?;
        let settings: AppSettings = serde_json::from_str(&content)
            .map_err(|e| AppError::Generic(format!("Failed to parse settings: {}", e)))?;

        Ok(settings)
    }

    /// Validate and save settings to disk
    pub async fn save(&self, settings: &AppSettings) -> Result<()> {
        settings.validate()?;

        let content = serde_json::to_string_pretty(settings)
            .map_err(|e| AppError::Generic(format!("Failed to serialize settings: {}", e)))?;

        if let Some(parent) = self.settings_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&self.settings_path, content).await?;
        tracing::info!("Settings saved to {:?}", self.settings_path);

        Ok(())
    }

    pub async fn get_persistence(&self) -> Result<PersistenceSettings> {
        Ok(self.load().await?.persistence)
    }

    pub async fn update_persistence(&self, persistence: PersistenceSettings) -> Result<()> {
        let mut settings = self.load().await?;
        settings.persistence = persistence;
        self.save(&settings).await
    }

    pub async fn get_chat(&self) -> Result<ChatSettings> {
        Ok(self.load().await?.chat)
    }

    pub async fn update_chat(&self, chat: ChatSettings) -> Result<()> {
        let mut settings = self.load().await?;
        settings.chat = chat;
        self.save(&settings).await
    }

    pub async fn get_backup(&self) -> Result<BackupSettings> {
        Ok(self.load().await?.backup)
    }

    pub async fn update_backup(&self, backup: BackupSettings) -> Result<()> {
        let mut settings = self.load().await?;
        settings.backup = backup;
        self.save(&settings).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_service() -> (SettingsService, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let service = SettingsService::new(temp_dir.path().to_path_buf());
        (service, temp_dir)
    }

    #[tokio::test]
    async fn test_default_settings_created_on_load() {
        let (service, temp) = create_test_service();

        let settings = service.load().await.unwrap();

        assert_eq!(settings.persistence.backend, "sqlite");
        assert_eq!(settings.persistence.auto_save_delay, 750);
        assert_eq!(settings.chat.endpoint, "http://localhost:3001/api/chat");
        assert_eq!(settings.backup.retention_count, 10);
        assert!(temp.path().join("settings.json").exists());
    }

    #[tokio::test]
    async fn test_chat_settings_get_and_update() {
        let (service, _temp) = create_test_service();

        let updated = ChatSettings {
            endpoint: "https://relay.example.com/api/chat".to_string(),
            timeout_secs: 30,
            fallback_message: "Offline".to_string(),
        };
        service.update_chat(updated.clone()).await.unwrap();

        assert_eq!(service.get_chat().await.unwrap(), updated);
    }

    #[tokio::test]
    async fn test_settings_persistence() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().to_path_buf();

        {
            let service = SettingsService::new(path.clone());
            service
                .update_persistence(PersistenceSettings {
                    backend: "file".to_string(),
                    auto_save_delay: 2000,
                })
                .await
                .unwrap();
        }

        {
            let service = SettingsService::new(path);
            let loaded = service.get_persistence().await.unwrap();
            assert_eq!(loaded.backend, "file");
            assert_eq!(loaded.auto_save_delay, 2000);
        }
    }

    #[tokio::test]
    async fn test_invalid_values_are_rejected() {
        let (service, _temp) = create_test_service();

        let too_fast = PersistenceSettings {
            auto_save_delay: 10,
            ..PersistenceSettings::default()
        };
        assert!(service.update_persistence(too_fast).await.is_err());

        let unknown_backend = PersistenceSettings {
            backend: "redis".to_string(),
            ..PersistenceSettings::default()
        };
        assert!(service.update_persistence(unknown_backend).await.is_err());

        assert!(service
            .update_backup(BackupSettings { retention_count: 0 })
            .await
            .is_err());

        assert_eq!(
            service.get_persistence().await.unwrap(),
            PersistenceSettings::default()
        );
    }

    #[tokio::test]
    async fn test_partial_file_uses_defaults() {
        let (service, temp) = create_test_service();
        std::fs::write(
            temp.path().join("settings.json"),
            r#"{"chat":{"timeout_secs":5}}"#,
        )
        .unwrap();

        let settings = service.load().await.unwrap();
        assert_eq!(settings.chat.timeout_secs, 5);
        assert_eq!(settings.chat.endpoint, DEFAULT_CHAT_ENDPOINT);
        assert_eq!(settings.persistence, PersistenceSettings::default());
    }
}
