//! Backup service
//!
//! Packages workspace snapshots as ZIP files with a manifest of SHA-256
//! checksums. Restores verify every checksum before anything is returned.

use crate::error::{AppError, Result};
use crate::workspace::WorkspaceSnapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tokio::fs;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const WORKSPACE_ENTRY: &str = "workspace.json";
const MANIFEST_ENTRY: &str = "manifest.json";

/// Backup manifest structure
#[derive(Debug, Serialize, Deserialize)]
pub struct BackupManifest {
    pub version: String,
    pub timestamp: String,
    pub files: Vec<FileEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FileEntry {
    pub path: String,
    pub size: u64,
    pub checksum: String,
}

/// A backup archive found on disk
#[derive(Debug, Clone, Serialize)]
pub struct BackupInfo {
    pub path: PathBuf,
    pub size: u64,
    pub created_at: DateTime<Utc>,
}

/// Backup service
#[derive(Clone)]
pub struct BackupService {
    backups_dir: PathBuf,
    retention_count: usize,
}

impl BackupService {
    pub fn new(app_data_dir: &Path, retention_count: usize) -> Self {
        Self {
            backups_dir: app_data_dir.join("backups"),
            retention_count: retention_count.max(1),
        }
    }

    pub fn backups_dir(&self) -> &Path {
        &self.backups_dir
    }

    /// Write a snapshot to a new backup archive
    pub async fn create_backup(&self, snapshot: &WorkspaceSnapshot) -> Result<PathBuf> {
        tracing::info!("Creating backup");

        fs::create_dir_all(&self.backups_dir).await?;

        let now = Utc::now();
        let timestamp = now.format("%Y%m%d_%H%M%S_%3f").to_string();
        let backup_path = self.backups_dir.join(format!("backup_{}.zip", timestamp));
        let temp_path = self.backups_dir.join(format!("backup_{}.zip.tmp", timestamp));

        let workspace_json = serde_json::to_vec_pretty(snapshot)?;
        let manifest = BackupManifest {
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: now.to_rfc3339(),
            files: vec![FileEntry {
                path: WORKSPACE_ENTRY.to_string(),
                size: workspace_json.len() as u64,
                checksum: calculate_checksum(&workspace_json),
            }],
        };
        let manifest_json = serde_json::to_vec_pretty(&manifest)?;

        let archive = build_archive(&workspace_json, &manifest_json)?;

        // Write to temp file first so a crash never leaves a truncated archive
        fs::write(&temp_path, &archive).await?;
        fs::rename(&temp_path, &backup_path).await?;

        tracing::info!(
            "Backup created: {:?} ({} bytes, {} canvases)",
            backup_path,
            archive.len(),
            snapshot.canvases.len()
        );

        self.apply_retention_policy().await?;

        Ok(backup_path)
    }

    /// Delete all but the newest `retention_count` archives
    async fn apply_retention_policy(&self) -> Result<()> {
        let backups = self.list_backups().await?;

        for backup in backups.iter().skip(self.retention_count) {
            tracing::info!("Deleting old backup: {:?}", backup.path);
            if let Err(e) = fs::remove_file(&backup.path).await {
                tracing::warn!("Failed to delete backup file {:?}: {}", backup.path, e);
            }
        }

        Ok(())
    }

    /// Backup archives on disk, newest first
    pub async fn list_backups(&self) -> Result<Vec<BackupInfo>> {
        if !self.backups_dir.exists() {
            return Ok(Vec::new());
        }

        let mut backups = Vec::new();
        let mut entries = fs::read_dir(&self.backups_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !name.starts_with("backup_") || !name.ends_with(".zip") {
                continue;
            }

            let metadata = entry.metadata().await?;
            let created_at = metadata
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());

            backups.push(BackupInfo {
                path,
                size: metadata.len(),
                created_at,
            });
        }

        // Names embed a sortable timestamp
        backups.sort_by(|a, b| b.path.cmp(&a.path));
        Ok(backups)
    }

    /// Read and verify a backup archive, returning the workspace it holds
    pub async fn restore_backup(&self, backup_path: &Path) -> Result<WorkspaceSnapshot> {
        tracing::info!("Restoring from backup: {:?}", backup_path);

        let data = fs::read(backup_path).await?;
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(data))?;

        let manifest: BackupManifest = {
            let contents = read_entry(&mut archive, MANIFEST_ENTRY)?;
            serde_json::from_slice(&contents)
                .map_err(|e| AppError::Restore(format!("Invalid manifest: {}", e)))?
        };

        tracing::info!(
            "Backup version: {}, timestamp: {}, files: {}",
            manifest.version,
            manifest.timestamp,
            manifest.files.len()
        );

        let mut workspace = None;
        for file_entry in &manifest.files {
            let contents = read_entry(&mut archive, &file_entry.path)?;

            let actual_checksum = calculate_checksum(&contents);
            if actual_checksum != file_entry.checksum {
                return Err(AppError::Restore(format!(
                    "Checksum mismatch for {}: expected {}, got {}",
                    file_entry.path, file_entry.checksum, actual_checksum
                )));
            }

            tracing::debug!("Verified: {}", file_entry.path);
            if file_entry.path == WORKSPACE_ENTRY {
                workspace = Some(contents);
            }
        }

        let Some(workspace) = workspace else {
            return Err(AppError::Restore(format!(
                "Manifest does not list {}",
                WORKSPACE_ENTRY
            )));
        };

        let snapshot: WorkspaceSnapshot = serde_json::from_slice(&workspace)
            .map_err(|e| AppError::Restore(format!("Invalid workspace data: {}", e)))?;

        tracing::info!(
            "Restore verified ({} canvases, {} folders)",
            snapshot.canvases.len(),
            snapshot.folders.len()
        );

        Ok(snapshot)
    }
}

fn build_archive(workspace_json: &[u8], manifest_json: &[u8]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    zip.start_file(WORKSPACE_ENTRY, options)?;
    zip.write_all(workspace_json)?;

    zip.start_file(MANIFEST_ENTRY, options)?;
    zip.write_all(manifest_json)?;

    Ok(zip.finish()?.into_inner())
}

fn read_entry<R: Read + std::io::Seek>(
    archive: &mut zip::ZipArchive<R>,
    name: &str,
) -> Result<Vec<u8>> {
    let mut file = archive
        .by_name(name)
        .map_err(|e| AppError::Restore(format!("Missing {} in backup: {}", name, e)))?;
    let mut contents = Vec::new();
    file.read_to_end(&mut contents)?;
    Ok(contents)
}

fn calculate_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}
