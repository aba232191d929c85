//! Workspace models
//!
//! Rust structs representing the domain records held by the workspace store.
//! All models use serde with camelCase field names, matching the persisted
//! workspace layout.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::UNTITLED_CANVAS;

/// Position of a node on a canvas
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Payload carried by a graph node
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    #[serde(default)]
    pub label: String,
    /// Canvas this node was promoted into, or the constituent it stands for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_canvas_id: Option<String>,
}

/// A node in a canvas graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    #[serde(rename = "type", default = "default_node_type")]
    pub node_type: String,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub data: NodeData,
    #[serde(default)]
    pub selected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

/// Timestamp for records persisted before the field existed
fn default_now() -> DateTime<Utc> {
    Utc::now()
}

fn default_today() -> NaiveDate {
    Utc::now().date_naive()
}

fn default_node_type() -> String {
    "default".to_string()
}

impl Node {
    pub fn new(id: impl Into<String>, label: impl Into<String>, position: Position) -> Self {
        Self {
            id: id.into(),
            node_type: default_node_type(),
            position,
            data: NodeData {
                label: label.into(),
                sub_canvas_id: None,
            },
            selected: false,
            width: None,
            height: None,
        }
    }
}

/// A directed edge between two nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub selected: bool,
}

impl Edge {
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            source_handle: None,
            target_handle: None,
            label: None,
            selected: false,
        }
    }
}

/// A to-do item attached to a canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default = "default_now")]
    pub created_at: DateTime<Utc>,
}

/// A comment left on a canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub text: String,
    #[serde(default = "default_now")]
    pub created_at: DateTime<Utc>,
}

/// An image reference stored with a canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasImage {
    pub id: String,
    /// Data URL or remote URL of the image
    pub src: String,
    #[serde(default)]
    pub caption: String,
}

/// A single project: node graph, writing document, todos and metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Canvas {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    /// Encoded writing sections, see [`crate::sections`]
    #[serde(default)]
    pub writing_content: String,
    #[serde(default)]
    pub images: Vec<CanvasImage>,
    #[serde(default)]
    pub todos: Vec<Todo>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merged_canvas_ids: Option<Vec<String>>,
    #[serde(default)]
    pub folder_id: Option<String>,
    #[serde(default = "default_now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "default_now")]
    pub updated_at: DateTime<Utc>,
}

impl Canvas {
    pub fn new(id: String, folder_id: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            title: String::new(),
            nodes: Vec::new(),
            edges: Vec::new(),
            writing_content: String::new(),
            images: Vec::new(),
            todos: Vec::new(),
            comments: Vec::new(),
            is_pinned: false,
            merged_canvas_ids: None,
            folder_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Title shown in the UI; blank titles render as "Untitled"
    pub fn display_name(&self) -> &str {
        let title = self.title.trim();
        if title.is_empty() {
            UNTITLED_CANVAS
        } else {
            title
        }
    }

    pub fn is_merged(&self) -> bool {
        self.merged_canvas_ids.is_some()
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// A folder grouping canvases and timelines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_now")]
    pub created_at: DateTime<Utc>,
}

/// A horizontal lane of a timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lane {
    pub id: String,
    pub name: String,
}

/// An item placed on a timeline lane
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineItem {
    pub id: String,
    pub lane_id: String,
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// A timeline with lanes and items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeline {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_today")]
    pub start_date: NaiveDate,
    #[serde(default = "default_today")]
    pub end_date: NaiveDate,
    #[serde(default)]
    pub lanes: Vec<Lane>,
    #[serde(default)]
    pub items: Vec<TimelineItem>,
    #[serde(default)]
    pub folder_id: Option<String>,
    #[serde(default = "default_now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "default_now")]
    pub updated_at: DateTime<Utc>,
}

/// Partial update of a timeline's own fields
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTimelineRequest {
    pub title: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Partial update of a timeline item
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTimelineItemRequest {
    pub lane_id: Option<String>,
    pub title: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Kind of diagram generated from text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DiagramKind {
    Branch,
    Flowchart,
}

/// One node of a branch diagram tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    pub label: String,
    #[serde(default)]
    pub children: Vec<Branch>,
}

/// A link between two flowchart steps, by step index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowLink {
    pub from: usize,
    pub to: usize,
}

/// Structure derived from a diagram's source text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DiagramPayload {
    Branch { roots: Vec<Branch> },
    Flowchart { steps: Vec<String>, links: Vec<FlowLink> },
}

/// A diagram snapshot generated from a canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagram {
    pub id: String,
    pub canvas_id: String,
    pub name: String,
    pub kind: DiagramKind,
    pub source: String,
    pub payload: DiagramPayload,
    #[serde(default = "default_now")]
    pub created_at: DateTime<Utc>,
}

/// A timed task on a calendar day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    /// Zero-padded 24-hour `HH:MM`
    pub time: String,
    pub task: String,
}

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One turn of a project chat
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Graph linking projects to one another
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProjectMap {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

/// Reference to a canvas that no longer exists
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DanglingReference {
    /// A merged canvas lists a deleted constituent
    MergedCanvas { merged_id: String, missing_id: String },
    /// A node links to a deleted sub-canvas
    SubCanvasLink {
        canvas_id: String,
        node_id: String,
        missing_id: String,
    },
}

/// Persisted form of the whole workspace
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceSnapshot {
    #[serde(default)]
    pub canvases: BTreeMap<String, Canvas>,
    #[serde(default)]
    pub folders: BTreeMap<String, Folder>,
    #[serde(default)]
    pub timelines: BTreeMap<String, Timeline>,
    #[serde(default)]
    pub diagrams: BTreeMap<String, Diagram>,
    #[serde(default)]
    pub calendar_events: BTreeMap<String, Vec<CalendarEvent>>,
    #[serde(default)]
    pub chat_history: BTreeMap<String, Vec<ChatMessage>>,
    #[serde(default)]
    pub active_folder_id: Option<String>,
    #[serde(default)]
    pub is_authenticated: bool,
    #[serde(default)]
    pub project_map: ProjectMap,
}
