//! Workspace module
//!
//! The in-memory workspace and its domain records:
//! - Models for canvases, folders, timelines, diagrams, calendar and chat
//! - Graph change application for the canvas editor
//! - The store and its per-entity operations

pub mod calendar;
pub mod canvases;
pub mod chat;
pub mod diagrams;
pub mod folders;
pub mod graph;
pub mod models;
pub mod project_map;
pub mod store;
pub mod timelines;

pub use graph::{Connection, EdgeChange, NodeChange};
pub use models::*;
pub use store::WorkspaceStore;
