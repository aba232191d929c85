//! Workspace store
//!
//! Single source of truth for every domain record. The store is a plain
//! value owned by the application context; operations are synchronous and
//! each one either completes or leaves the state untouched.
//!
//! Every mutation bumps a revision number published on a watch channel so
//! the autosave task can persist the workspace without callers having to
//! remember to.
//!
//! Entity operations live next to this file, one module per entity.

use std::collections::BTreeMap;

use chrono::Utc;
use tokio::sync::watch;
use uuid::Uuid;

use super::graph::{self, Connection, EdgeChange, NodeChange};
use super::models::*;
use crate::error::{AppError, Result};

/// Owner of all workspace records plus the active graph view
#[derive(Debug)]
pub struct WorkspaceStore {
    pub(super) canvases: BTreeMap<String, Canvas>,
    pub(super) folders: BTreeMap<String, Folder>,
    pub(super) timelines: BTreeMap<String, Timeline>,
    pub(super) diagrams: BTreeMap<String, Diagram>,
    pub(super) calendar_events: BTreeMap<String, Vec<CalendarEvent>>,
    pub(super) chat_history: BTreeMap<String, Vec<ChatMessage>>,
    pub(super) active_folder_id: Option<String>,
    pub(super) is_authenticated: bool,
    pub(super) project_map: ProjectMap,

    /// Canvas mirrored by the active graph view
    pub(super) current_canvas_id: Option<String>,
    pub(super) nodes: Vec<Node>,
    pub(super) edges: Vec<Edge>,

    revision: u64,
    changes: watch::Sender<u64>,
}

impl Default for WorkspaceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkspaceStore {
    /// Create an empty workspace
    pub fn new() -> Self {
        Self::from_snapshot(WorkspaceSnapshot::default())
    }

    /// Rebuild a workspace from its persisted form
    pub fn from_snapshot(snapshot: WorkspaceSnapshot) -> Self {
        let (changes, _) = watch::channel(0);

        Self {
            canvases: snapshot.canvases,
            folders: snapshot.folders,
            timelines: snapshot.timelines,
            diagrams: snapshot.diagrams,
            calendar_events: snapshot.calendar_events,
            chat_history: snapshot.chat_history,
            active_folder_id: snapshot.active_folder_id,
            is_authenticated: snapshot.is_authenticated,
            project_map: snapshot.project_map,
            current_canvas_id: None,
            nodes: Vec::new(),
            edges: Vec::new(),
            revision: 0,
            changes,
        }
    }

    /// Persisted form of the workspace
    pub fn snapshot(&self) -> WorkspaceSnapshot {
        WorkspaceSnapshot {
            canvases: self.canvases.clone(),
            folders: self.folders.clone(),
            timelines: self.timelines.clone(),
            diagrams: self.diagrams.clone(),
            calendar_events: self.calendar_events.clone(),
            chat_history: self.chat_history.clone(),
            active_folder_id: self.active_folder_id.clone(),
            is_authenticated: self.is_authenticated,
            project_map: self.project_map.clone(),
        }
    }

    /// Replace every record with a snapshot (used by restore).
    ///
    /// The active graph view is reset; subscribers are kept.
    pub fn replace_with(&mut self, snapshot: WorkspaceSnapshot) {
        tracing::info!(
            "Replacing workspace contents ({} canvases, {} folders)",
            snapshot.canvases.len(),
            snapshot.folders.len()
        );

        self.canvases = snapshot.canvases;
        self.folders = snapshot.folders;
        self.timelines = snapshot.timelines;
        self.diagrams = snapshot.diagrams;
        self.calendar_events = snapshot.calendar_events;
        self.chat_history = snapshot.chat_history;
        self.active_folder_id = snapshot.active_folder_id;
        self.is_authenticated = snapshot.is_authenticated;
        self.project_map = snapshot.project_map;
        self.current_canvas_id = None;
        self.nodes.clear();
        self.edges.clear();
        self.mark_changed();
    }

    /// Subscribe to revision changes
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    /// Number of mutations applied since the store was created
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub(super) fn mark_changed(&mut self) {
        self.revision += 1;
        self.changes.send_replace(self.revision);
    }

    pub(super) fn new_id() -> String {
        Uuid::new_v4().to_string()
    }

    // ===== Queries =====

    pub fn canvas(&self, id: &str) -> Result<&Canvas> {
        self.canvases
            .get(id)
            .ok_or_else(|| AppError::CanvasNotFound(id.to_string()))
    }

    pub(super) fn canvas_mut(&mut self, id: &str) -> Result<&mut Canvas> {
        self.canvases
            .get_mut(id)
            .ok_or_else(|| AppError::CanvasNotFound(id.to_string()))
    }

    pub fn canvases(&self) -> &BTreeMap<String, Canvas> {
        &self.canvases
    }

    pub fn current_canvas_id(&self) -> Option<&str> {
        self.current_canvas_id.as_deref()
    }

    pub fn current_canvas(&self) -> Option<&Canvas> {
        self.current_canvas_id
            .as_deref()
            .and_then(|id| self.canvases.get(id))
    }

    /// Nodes of the active graph view
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Edges of the active graph view
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }

    pub fn set_authenticated(&mut self, authenticated: bool) {
        self.is_authenticated = authenticated;
        self.mark_changed();
    }

    // ===== Active graph view =====

    /// Make a canvas current and load its graph into the active view.
    ///
    /// Unknown ids are reported and leave the current canvas unchanged.
    pub fn set_current_canvas(&mut self, id: &str) -> Result<()> {
        let canvas = self.canvas(id)?;
        let nodes = canvas.nodes.clone();
        let edges = canvas.edges.clone();

        self.current_canvas_id = Some(id.to_string());
        self.nodes = nodes;
        self.edges = edges;

        tracing::debug!("Current canvas set to {}", id);
        Ok(())
    }

    /// Close the current canvas and empty the active view
    pub fn clear_current_canvas(&mut self) {
        self.current_canvas_id = None;
        self.nodes.clear();
        self.edges.clear();
    }

    pub fn on_nodes_change(&mut self, changes: &[NodeChange]) {
        let nodes = graph::apply_node_changes(changes, &self.nodes);
        self.commit_graph(Some(nodes), None);
    }

    pub fn on_edges_change(&mut self, changes: &[EdgeChange]) {
        let edges = graph::apply_edge_changes(changes, &self.edges);
        self.commit_graph(None, Some(edges));
    }

    pub fn add_node(&mut self, node: Node) {
        let mut nodes = self.nodes.clone();
        nodes.push(node);
        self.commit_graph(Some(nodes), None);
    }

    pub fn add_edge(&mut self, edge: Edge) {
        let mut edges = self.edges.clone();
        edges.push(edge);
        self.commit_graph(None, Some(edges));
    }

    pub fn delete_edge(&mut self, id: &str) {
        let edges: Vec<Edge> = self
            .edges
            .iter()
            .filter(|edge| edge.id != id)
            .cloned()
            .collect();
        self.commit_graph(None, Some(edges));
    }

    /// Connect two nodes; returns false when an identical edge already exists
    pub fn on_connect(&mut self, connection: &Connection) -> bool {
        match graph::connect(connection, &self.edges) {
            Some(edges) => {
                self.commit_graph(None, Some(edges));
                true
            }
            None => false,
        }
    }

    /// Write the active view and, when a canvas is current, its stored copy
    /// in the same step.
    fn commit_graph(&mut self, nodes: Option<Vec<Node>>, edges: Option<Vec<Edge>>) {
        if let Some(nodes) = nodes {
            self.nodes = nodes;
        }
        if let Some(edges) = edges {
            self.edges = edges;
        }

        let Some(current_id) = self.current_canvas_id.clone() else {
            return;
        };

        let Some(canvas) = self.canvases.get_mut(&current_id) else {
            tracing::warn!(
                "Current canvas {} no longer exists, graph change not stored",
                current_id
            );
            return;
        };

        canvas.nodes = self.nodes.clone();
        canvas.edges = self.edges.clone();
        canvas.updated_at = Utc::now();
        self.mark_changed();
    }

    /// Keep the active view in step after a canvas's stored graph changed
    pub(super) fn refresh_view_if_current(&mut self, canvas_id: &str) {
        if self.current_canvas_id.as_deref() != Some(canvas_id) {
            return;
        }
        if let Some(canvas) = self.canvases.get(canvas_id) {
            self.nodes = canvas.nodes.clone();
            self.edges = canvas.edges.clone();
        }
    }
}
