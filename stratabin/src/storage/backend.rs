//! Key-value storage backends
//!
//! The workspace is persisted as one string value under one key. Three
//! backends are available:
//!
//! - `Memory`: process-local map, used by tests and ephemeral sessions
//! - `File`: one `<key>.json` file per key, written atomically via a temp file
//! - `Sqlite`: the `kv_store` table through [`Repository`]

use crate::database::Repository;
use crate::error::{AppError, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Storage backend for persisted values
#[derive(Clone)]
pub enum StorageBackend {
    Memory(Arc<Mutex<HashMap<String, String>>>),
    File(PathBuf),
    Sqlite(Repository),
}

impl StorageBackend {
    pub fn memory() -> Self {
        StorageBackend::Memory(Arc::new(Mutex::new(HashMap::new())))
    }

    /// File backend rooted at a directory (created on first write)
    pub fn file(root: PathBuf) -> Self {
        StorageBackend::File(root)
    }

    pub fn sqlite(repo: Repository) -> Self {
        StorageBackend::Sqlite(repo)
    }

    pub fn name(&self) -> &'static str {
        match self {
            StorageBackend::Memory(_) => "memory",
            StorageBackend::File(_) => "file",
            StorageBackend::Sqlite(_) => "sqlite",
        }
    }

    /// Read a value
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        match self {
            StorageBackend::Memory(map) => Ok(map.lock().await.get(key).cloned()),
            StorageBackend::File(root) => {
                let path = file_path(root, key)?;
                if !path.exists() {
                    return Ok(None);
                }
                Ok(Some(fs::read_to_string(&path).await?))
            }
            StorageBackend::Sqlite(repo) => repo.get_value(key).await,
        }
    }

    /// Write a value, replacing any previous one
    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        match self {
            StorageBackend::Memory(map) => {
                map.lock().await.insert(key.to_string(), value.to_string());
                Ok(())
            }
            StorageBackend::File(root) => {
                let path = file_path(root, key)?;
                fs::create_dir_all(root).await?;

                // Write to temp file first (atomic write)
                let temp_path = path.with_extension("json.tmp");
                let mut file = fs::File::create(&temp_path).await?;
                file.write_all(value.as_bytes()).await?;
                file.sync_all().await?;

                fs::rename(&temp_path, &path).await?;

                tracing::debug!("Wrote {} ({} bytes)", path.display(), value.len());
                Ok(())
            }
            StorageBackend::Sqlite(repo) => repo.set_value(key, value).await,
        }
    }

    /// Remove a value; missing keys are not an error
    pub async fn remove(&self, key: &str) -> Result<()> {
        match self {
            StorageBackend::Memory(map) => {
                map.lock().await.remove(key);
                Ok(())
            }
            StorageBackend::File(root) => {
                let path = file_path(root, key)?;
                if path.exists() {
                    fs::remove_file(&path).await?;
                }
                Ok(())
            }
            StorageBackend::Sqlite(repo) => repo.delete_value(key).await.map(|_| ()),
        }
    }
}

/// Map a key to its file, rejecting keys that could escape the root
fn file_path(root: &Path, key: &str) -> Result<PathBuf> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

    if !valid {
        return Err(AppError::Storage(format!("Invalid storage key: {:?}", key)));
    }

    Ok(root.join(format!("{}.json", key)))
}
