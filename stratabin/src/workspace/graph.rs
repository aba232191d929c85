//! Graph change application
//!
//! Incremental node and edge changes emitted by the canvas editor, and the
//! pure functions that apply them to node/edge lists.

use serde::{Deserialize, Serialize};

use super::models::{Edge, Node, Position};

/// A change to one node of the active graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NodeChange {
    Position {
        id: String,
        position: Option<Position>,
    },
    Dimensions {
        id: String,
        width: f64,
        height: f64,
    },
    Select {
        id: String,
        selected: bool,
    },
    Remove {
        id: String,
    },
    Add {
        item: Node,
    },
    Replace {
        id: String,
        item: Node,
    },
}

/// A change to one edge of the active graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EdgeChange {
    Select { id: String, selected: bool },
    Remove { id: String },
    Add { item: Edge },
    Replace { id: String, item: Edge },
}

/// A user-drawn connection between two node handles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub source_handle: Option<String>,
    #[serde(default)]
    pub target_handle: Option<String>,
}

/// Apply node changes in order. Changes addressing unknown ids are skipped.
pub fn apply_node_changes(changes: &[NodeChange], nodes: &[Node]) -> Vec<Node> {
    let mut nodes = nodes.to_vec();

    for change in changes {
        match change {
            NodeChange::Position { id, position } => {
                if let (Some(node), Some(position)) = (find_node(&mut nodes, id), position) {
                    node.position = *position;
                }
            }
            NodeChange::Dimensions { id, width, height } => {
                if let Some(node) = find_node(&mut nodes, id) {
                    node.width = Some(*width);
                    node.height = Some(*height);
                }
            }
            NodeChange::Select { id, selected } => {
                if let Some(node) = find_node(&mut nodes, id) {
                    node.selected = *selected;
                }
            }
            NodeChange::Remove { id } => nodes.retain(|node| &node.id != id),
            NodeChange::Add { item } => nodes.push(item.clone()),
            NodeChange::Replace { id, item } => {
                if let Some(node) = find_node(&mut nodes, id) {
                    *node = item.clone();
                }
            }
        }
    }

    nodes
}

/// Apply edge changes in order. Changes addressing unknown ids are skipped.
pub fn apply_edge_changes(changes: &[EdgeChange], edges: &[Edge]) -> Vec<Edge> {
    let mut edges = edges.to_vec();

    for change in changes {
        match change {
            EdgeChange::Select { id, selected } => {
                if let Some(edge) = edges.iter_mut().find(|edge| &edge.id == id) {
                    edge.selected = *selected;
                }
            }
            EdgeChange::Remove { id } => edges.retain(|edge| &edge.id != id),
            EdgeChange::Add { item } => edges.push(item.clone()),
            EdgeChange::Replace { id, item } => {
                if let Some(edge) = edges.iter_mut().find(|edge| &edge.id == id) {
                    *edge = item.clone();
                }
            }
        }
    }

    edges
}

/// Add an edge for a connection unless an identical one already exists.
///
/// Returns `None` when the connection is a duplicate.
pub fn connect(connection: &Connection, edges: &[Edge]) -> Option<Vec<Edge>> {
    let duplicate = edges.iter().any(|edge| {
        edge.source == connection.source
            && edge.target == connection.target
            && edge.source_handle == connection.source_handle
            && edge.target_handle == connection.target_handle
    });
    if duplicate {
        return None;
    }

    let mut edges = edges.to_vec();
    edges.push(Edge {
        id: connection_edge_id(connection),
        source: connection.source.clone(),
        target: connection.target.clone(),
        source_handle: connection.source_handle.clone(),
        target_handle: connection.target_handle.clone(),
        label: None,
        selected: false,
    });
    Some(edges)
}

/// Deterministic edge id for a connection
pub fn connection_edge_id(connection: &Connection) -> String {
    format!(
        "edge-{}{}-{}{}",
        connection.source,
        connection.source_handle.as_deref().unwrap_or(""),
        connection.target,
        connection.target_handle.as_deref().unwrap_or("")
    )
}

fn find_node<'a>(nodes: &'a mut [Node], id: &str) -> Option<&'a mut Node> {
    nodes.iter_mut().find(|node| node.id == id)
}
