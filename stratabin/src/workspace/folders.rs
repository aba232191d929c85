//! Folder operations
//!
//! Folders group canvases and timelines. Deleting a folder moves its
//! contents back to "no folder".

use chrono::Utc;

use super::models::Folder;
use super::store::WorkspaceStore;
use crate::error::{AppError, Result};

impl WorkspaceStore {
    pub fn create_folder(&mut self, name: &str) -> String {
        let id = Self::new_id();
        let folder = Folder {
            id: id.clone(),
            name: name.to_string(),
            created_at: Utc::now(),
        };
        self.folders.insert(id.clone(), folder);
        self.mark_changed();

        tracing::info!("Created folder: {} ({})", name, id);
        id
    }

    pub fn folder(&self, id: &str) -> Result<&Folder> {
        self.folders
            .get(id)
            .ok_or_else(|| AppError::FolderNotFound(id.to_string()))
    }

    /// All folders, oldest first
    pub fn folders(&self) -> Vec<&Folder> {
        let mut folders: Vec<&Folder> = self.folders.values().collect();
        folders.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        folders
    }

    pub fn rename_folder(&mut self, id: &str, name: &str) -> Result<()> {
        let folder = self
            .folders
            .get_mut(id)
            .ok_or_else(|| AppError::FolderNotFound(id.to_string()))?;
        folder.name = name.to_string();
        self.mark_changed();
        Ok(())
    }

    /// Delete a folder and reparent everything that referenced it
    pub fn delete_folder(&mut self, id: &str) -> Result<()> {
        if self.folders.remove(id).is_none() {
            return Err(AppError::FolderNotFound(id.to_string()));
        }

        let mut reparented = 0;
        for canvas in self.canvases.values_mut() {
            if canvas.folder_id.as_deref() == Some(id) {
                canvas.folder_id = None;
                reparented += 1;
            }
        }
        for timeline in self.timelines.values_mut() {
            if timeline.folder_id.as_deref() == Some(id) {
                timeline.folder_id = None;
                reparented += 1;
            }
        }

        if self.active_folder_id.as_deref() == Some(id) {
            self.active_folder_id = None;
        }
        self.mark_changed();

        tracing::info!("Deleted folder {} ({} items moved out)", id, reparented);
        Ok(())
    }

    pub fn active_folder_id(&self) -> Option<&str> {
        self.active_folder_id.as_deref()
    }

    /// Select the folder new canvases and timelines are created in
    pub fn set_active_folder(&mut self, id: Option<&str>) -> Result<()> {
        if let Some(id) = id {
            if !self.folders.contains_key(id) {
                return Err(AppError::FolderNotFound(id.to_string()));
            }
        }

        self.active_folder_id = id.map(str::to_string);
        self.mark_changed();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delete_folder_reparents_children() {
        let mut store = WorkspaceStore::new();
        let folder = store.create_folder("Work");
        let other = store.create_folder("Home");
        store.set_active_folder(Some(folder.as_str())).unwrap();

        let c1 = store.create_canvas();
        let c2 = store.create_canvas();
        let timeline = store
            .create_timeline(
                "Roadmap",
                "2024-01-01".parse().unwrap(),
                "2024-06-30".parse().unwrap(),
            )
            .unwrap();

        store.set_active_folder(Some(other.as_str())).unwrap();
        let elsewhere = store.create_canvas();

        store.delete_folder(&folder).unwrap();

        assert!(store.folder(&folder).is_err());
        assert!(store.canvas(&c1).unwrap().folder_id.is_none());
        assert!(store.canvas(&c2).unwrap().folder_id.is_none());
        assert!(store.timeline(&timeline).unwrap().folder_id.is_none());
        assert_eq!(
            store.canvas(&elsewhere).unwrap().folder_id.as_deref(),
            Some(other.as_str())
        );
    }

    #[test]
    fn test_delete_active_folder_clears_selection() {
        let mut store = WorkspaceStore::new();
        let folder = store.create_folder("Work");
        store.set_active_folder(Some(folder.as_str())).unwrap();

        store.delete_folder(&folder).unwrap();

        assert!(store.active_folder_id().is_none());
    }

    #[test]
    fn test_set_active_folder_rejects_unknown_id() {
        let mut store = WorkspaceStore::new();
        assert!(matches!(
            store.set_active_folder(Some("nope")),
            Err(AppError::FolderNotFound(_))
        ));
        assert!(store.active_folder_id().is_none());
    }

    #[test]
    fn test_rename_folder() {
        let mut store = WorkspaceStore::new();
        let folder = store.create_folder("Wrok");
        store.rename_folder(&folder, "Work").unwrap();
        assert_eq!(store.folder(&folder).unwrap().name, "Work");
    }
}
