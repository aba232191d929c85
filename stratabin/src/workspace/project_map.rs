//! Project map operations
//!
//! A workspace-wide graph whose nodes stand for canvases.

use super::graph::{self, Connection, NodeChange};
use super::models::{Node, Position, ProjectMap};
use super::store::WorkspaceStore;
use crate::error::Result;

impl WorkspaceStore {
    pub fn project_map(&self) -> &ProjectMap {
        &self.project_map
    }

    /// Place a canvas on the project map, returning the map node id.
    ///
    /// A canvas already on the map keeps its existing node.
    pub fn add_project_map_node(&mut self, canvas_id: &str, position: Position) -> Result<String> {
        let label = self.canvas(canvas_id)?.display_name().to_string();
        let node_id = format!("project-{}", canvas_id);

        if self.project_map.nodes.iter().any(|node| node.id == node_id) {
            return Ok(node_id);
        }

        let mut node = Node::new(node_id.clone(), label, position);
        node.data.sub_canvas_id = Some(canvas_id.to_string());
        self.project_map.nodes.push(node);
        self.mark_changed();
        Ok(node_id)
    }

    pub fn on_project_map_nodes_change(&mut self, changes: &[NodeChange]) {
        self.project_map.nodes = graph::apply_node_changes(changes, &self.project_map.nodes);
        self.mark_changed();
    }

    /// Link two projects; returns false when the link already exists
    pub fn connect_projects(&mut self, connection: &Connection) -> bool {
        match graph::connect(connection, &self.project_map.edges) {
            Some(edges) => {
                self.project_map.edges = edges;
                self.mark_changed();
                true
            }
            None => false,
        }
    }

    pub fn remove_project_map_edge(&mut self, edge_id: &str) {
        let before = self.project_map.edges.len();
        self.project_map.edges.retain(|edge| edge.id != edge_id);
        if self.project_map.edges.len() != before {
            self.mark_changed();
        }
    }
}
