//! Canvas operations
//!
//! Creation, navigation metadata, writing sections, todos, comments and
//! images, plus the merged-project and sub-project workflows.

use chrono::Utc;

use super::models::*;
use super::store::WorkspaceStore;
use crate::config::{
    PLACEHOLDER_COLUMNS, PLACEHOLDER_SPACING_X, PLACEHOLDER_SPACING_Y, SUB_PROJECT_NODE_PREFIX,
    SUB_PROJECT_NODE_TYPE, UNTITLED_CANVAS,
};
use crate::error::{AppError, Result};
use crate::sections::{self, Section};

impl WorkspaceStore {
    /// Create an empty canvas in the active folder and make it current
    pub fn create_canvas(&mut self) -> String {
        let id = Self::new_id();
        let canvas = Canvas::new(id.clone(), self.active_folder_id.clone());
        self.canvases.insert(id.clone(), canvas);

        self.current_canvas_id = Some(id.clone());
        self.nodes.clear();
        self.edges.clear();
        self.mark_changed();

        tracing::info!("Created canvas: {}", id);
        id
    }

    /// Delete a canvas.
    ///
    /// References held by merged canvases or sub-project nodes are left in
    /// place; see [`WorkspaceStore::dangling_references`].
    pub fn delete_canvas(&mut self, id: &str) -> Result<()> {
        if self.canvases.remove(id).is_none() {
            return Err(AppError::CanvasNotFound(id.to_string()));
        }

        if self.current_canvas_id.as_deref() == Some(id) {
            self.clear_current_canvas();
        }
        self.mark_changed();

        tracing::info!("Deleted canvas: {}", id);
        Ok(())
    }

    pub fn rename_canvas(&mut self, id: &str, title: &str) -> Result<()> {
        let canvas = self.canvas_mut(id)?;
        canvas.title = title.to_string();
        canvas.touch();
        self.mark_changed();
        Ok(())
    }

    /// Flip the pinned flag, returning the new value
    pub fn toggle_pin(&mut self, id: &str) -> Result<bool> {
        let canvas = self.canvas_mut(id)?;
        canvas.is_pinned = !canvas.is_pinned;
        canvas.touch();
        let pinned = canvas.is_pinned;
        self.mark_changed();
        Ok(pinned)
    }

    /// Move a canvas into a folder, or out of any folder with `None`
    pub fn move_canvas_to_folder(&mut self, id: &str, folder_id: Option<&str>) -> Result<()> {
        if let Some(folder_id) = folder_id {
            if !self.folders.contains_key(folder_id) {
                return Err(AppError::FolderNotFound(folder_id.to_string()));
            }
        }

        let canvas = self.canvas_mut(id)?;
        canvas.folder_id = folder_id.map(str::to_string);
        canvas.touch();
        self.mark_changed();
        Ok(())
    }

    /// Replace the raw writing content of a canvas
    pub fn update_writing_content(&mut self, id: &str, content: &str) -> Result<()> {
        let canvas = self.canvas_mut(id)?;
        canvas.writing_content = content.to_string();
        canvas.touch();
        self.mark_changed();
        Ok(())
    }

    /// Decoded writing sections of a canvas (never empty)
    pub fn canvas_sections(&self, id: &str) -> Result<Vec<Section>> {
        Ok(sections::decode(&self.canvas(id)?.writing_content))
    }

    /// Encode and store writing sections
    pub fn set_canvas_sections(&mut self, id: &str, sections: &[Section]) -> Result<()> {
        let encoded = sections::encode(sections);
        self.update_writing_content(id, &encoded)
    }

    // ===== Todos, comments, images =====

    pub fn add_todo(&mut self, canvas_id: &str, text: &str) -> Result<String> {
        let todo = Todo {
            id: Self::new_id(),
            text: text.to_string(),
            completed: false,
            created_at: Utc::now(),
        };
        let id = todo.id.clone();

        let canvas = self.canvas_mut(canvas_id)?;
        canvas.todos.push(todo);
        canvas.touch();
        self.mark_changed();
        Ok(id)
    }

    /// Flip a todo's completion flag, returning the new value
    pub fn toggle_todo(&mut self, canvas_id: &str, todo_id: &str) -> Result<bool> {
        let canvas = self.canvas_mut(canvas_id)?;
        let todo = canvas
            .todos
            .iter_mut()
            .find(|todo| todo.id == todo_id)
            .ok_or_else(|| AppError::TodoNotFound(todo_id.to_string()))?;
        todo.completed = !todo.completed;
        let completed = todo.completed;
        canvas.touch();
        self.mark_changed();
        Ok(completed)
    }

    pub fn remove_todo(&mut self, canvas_id: &str, todo_id: &str) -> Result<()> {
        let canvas = self.canvas_mut(canvas_id)?;
        let before = canvas.todos.len();
        canvas.todos.retain(|todo| todo.id != todo_id);
        if canvas.todos.len() == before {
            return Err(AppError::TodoNotFound(todo_id.to_string()));
        }
        canvas.touch();
        self.mark_changed();
        Ok(())
    }

    pub fn add_comment(&mut self, canvas_id: &str, text: &str) -> Result<String> {
        let comment = Comment {
            id: Self::new_id(),
            text: text.to_string(),
            created_at: Utc::now(),
        };
        let id = comment.id.clone();

        let canvas = self.canvas_mut(canvas_id)?;
        canvas.comments.push(comment);
        canvas.touch();
        self.mark_changed();
        Ok(id)
    }

    pub fn remove_comment(&mut self, canvas_id: &str, comment_id: &str) -> Result<()> {
        let canvas = self.canvas_mut(canvas_id)?;
        let before = canvas.comments.len();
        canvas.comments.retain(|comment| comment.id != comment_id);
        if canvas.comments.len() == before {
            return Err(AppError::CommentNotFound(comment_id.to_string()));
        }
        canvas.touch();
        self.mark_changed();
        Ok(())
    }

    pub fn add_image(&mut self, canvas_id: &str, src: &str, caption: &str) -> Result<String> {
        let image = CanvasImage {
            id: Self::new_id(),
            src: src.to_string(),
            caption: caption.to_string(),
        };
        let id = image.id.clone();

        let canvas = self.canvas_mut(canvas_id)?;
        canvas.images.push(image);
        canvas.touch();
        self.mark_changed();
        Ok(id)
    }

    pub fn remove_image(&mut self, canvas_id: &str, image_id: &str) -> Result<()> {
        let canvas = self.canvas_mut(canvas_id)?;
        let before = canvas.images.len();
        canvas.images.retain(|image| image.id != image_id);
        if canvas.images.len() == before {
            return Err(AppError::ImageNotFound(image_id.to_string()));
        }
        canvas.touch();
        self.mark_changed();
        Ok(())
    }

    // ===== Queries =====

    /// Canvases whose title or writing text contains the query (case-insensitive)
    pub fn search_canvases(&self, query: &str) -> Vec<&Canvas> {
        let query_lower = query.to_lowercase();

        self.canvases
            .values()
            .filter(|canvas| {
                canvas.title.to_lowercase().contains(&query_lower)
                    || sections::to_plain_text(&sections::decode(&canvas.writing_content))
                        .to_lowercase()
                        .contains(&query_lower)
            })
            .collect()
    }

    /// Canvases in a folder, or uncategorized canvases for `None`,
    /// most recently updated first
    pub fn canvases_in_folder(&self, folder_id: Option<&str>) -> Vec<&Canvas> {
        let mut canvases: Vec<&Canvas> = self
            .canvases
            .values()
            .filter(|canvas| canvas.folder_id.as_deref() == folder_id)
            .collect();
        canvases.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        canvases
    }

    pub fn pinned_canvases(&self) -> Vec<&Canvas> {
        self.canvases.values().filter(|canvas| canvas.is_pinned).collect()
    }

    /// Display name for a canvas id; missing canvases render as "Untitled"
    pub fn canvas_display_name(&self, id: &str) -> &str {
        self.canvases
            .get(id)
            .map(Canvas::display_name)
            .unwrap_or(UNTITLED_CANVAS)
    }

    // ===== Merged projects =====

    /// Create a merged canvas referencing existing canvases.
    ///
    /// Only the references are stored; constituent graphs are not copied.
    pub fn merge_canvases(&mut self, ids: &[String], title: &str) -> Result<String> {
        if let Some(missing) = ids.iter().find(|id| !self.canvases.contains_key(id.as_str())) {
            return Err(AppError::CanvasNotFound(missing.clone()));
        }

        let id = Self::new_id();
        let mut canvas = Canvas::new(id.clone(), self.active_folder_id.clone());
        canvas.title = title.to_string();
        canvas.merged_canvas_ids = Some(ids.to_vec());
        self.canvases.insert(id.clone(), canvas);
        self.mark_changed();

        tracing::info!("Merged {} canvases into {}", ids.len(), id);
        Ok(id)
    }

    /// Ensure a merged canvas has one placeholder node per constituent.
    ///
    /// Missing placeholders are created and stale labels refreshed; nodes
    /// for ids no longer listed are kept. Returns whether anything changed.
    pub fn sync_sub_project_nodes(&mut self, merged_id: &str) -> Result<bool> {
        let merged = self.canvas(merged_id)?;
        let Some(sub_ids) = merged.merged_canvas_ids.clone() else {
            return Ok(false);
        };

        let mut nodes = merged.nodes.clone();
        let mut changed = false;

        for (index, sub_id) in sub_ids.iter().enumerate() {
            let node_id = format!("{}{}", SUB_PROJECT_NODE_PREFIX, sub_id);
            let label = self.canvas_display_name(sub_id).to_string();

            match nodes.iter_mut().find(|node| node.id == node_id) {
                Some(node) => {
                    if node.data.label != label {
                        node.data.label = label;
                        changed = true;
                    }
                }
                None => {
                    let position = Position::new(
                        (index % PLACEHOLDER_COLUMNS) as f64 * PLACEHOLDER_SPACING_X,
                        (index / PLACEHOLDER_COLUMNS) as f64 * PLACEHOLDER_SPACING_Y,
                    );
                    let mut node = Node::new(node_id, label, position);
                    node.node_type = SUB_PROJECT_NODE_TYPE.to_string();
                    node.data.sub_canvas_id = Some(sub_id.clone());
                    nodes.push(node);
                    changed = true;
                }
            }
        }

        if !changed {
            return Ok(false);
        }

        let merged = self.canvas_mut(merged_id)?;
        merged.nodes = nodes;
        merged.touch();
        self.refresh_view_if_current(merged_id);
        self.mark_changed();

        tracing::debug!("Synchronized sub-project nodes of {}", merged_id);
        Ok(true)
    }

    // ===== Sub-projects =====

    /// Promote a node into its own canvas and link the node to it.
    ///
    /// The current canvas does not change.
    pub fn convert_node_to_project(&mut self, canvas_id: &str, node_id: &str) -> Result<String> {
        let source = self.canvas(canvas_id)?;
        let node = source
            .nodes
            .iter()
            .find(|node| node.id == node_id)
            .ok_or_else(|| AppError::NodeNotFound(node_id.to_string()))?;

        let title = node.data.label.clone();
        let folder_id = source.folder_id.clone();

        let sub_id = Self::new_id();
        let mut sub_canvas = Canvas::new(sub_id.clone(), folder_id);
        sub_canvas.title = title;
        self.canvases.insert(sub_id.clone(), sub_canvas);

        let source = self.canvas_mut(canvas_id)?;
        if let Some(node) = source.nodes.iter_mut().find(|node| node.id == node_id) {
            node.data.sub_canvas_id = Some(sub_id.clone());
        }
        source.touch();
        self.refresh_view_if_current(canvas_id);
        self.mark_changed();

        tracing::info!("Converted node {} of {} into project {}", node_id, canvas_id, sub_id);
        Ok(sub_id)
    }

    /// Navigate to the canvas a node was promoted into
    pub fn open_sub_project(&mut self, canvas_id: &str, node_id: &str) -> Result<String> {
        let sub_id = self
            .canvas(canvas_id)?
            .nodes
            .iter()
            .find(|node| node.id == node_id)
            .ok_or_else(|| AppError::NodeNotFound(node_id.to_string()))?
            .data
            .sub_canvas_id
            .clone()
            .ok_or_else(|| AppError::InvalidInput(format!("Node {} has no sub-project", node_id)))?;

        self.set_current_canvas(&sub_id)?;
        Ok(sub_id)
    }

    /// References to canvases that have been deleted
    pub fn dangling_references(&self) -> Vec<DanglingReference> {
        let mut dangling = Vec::new();

        for canvas in self.canvases.values() {
            for missing in canvas
                .merged_canvas_ids
                .iter()
                .flatten()
                .filter(|id| !self.canvases.contains_key(id.as_str()))
            {
                dangling.push(DanglingReference::MergedCanvas {
                    merged_id: canvas.id.clone(),
                    missing_id: missing.clone(),
                });
            }

            for node in &canvas.nodes {
                // Placeholders of merged canvases are reported through the merged list
                if canvas.is_merged() && node.node_type == SUB_PROJECT_NODE_TYPE {
                    continue;
                }
                if let Some(sub_id) = &node.data.sub_canvas_id {
                    if !self.canvases.contains_key(sub_id) {
                        dangling.push(DanglingReference::SubCanvasLink {
                            canvas_id: canvas.id.clone(),
                            node_id: node.id.clone(),
                            missing_id: sub_id.clone(),
                        });
                    }
                }
            }
        }

        dangling
    }
}
