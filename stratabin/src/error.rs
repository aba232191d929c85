//! Error types for Stratabin
//!
//! All errors use thiserror for structured error handling.
//! Store operations report missing entities through the `*NotFound`
//! variants instead of silently producing partial records.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Canvas not found: {0}")]
    CanvasNotFound(String),

    #[error("Folder not found: {0}")]
    FolderNotFound(String),

    #[error("Timeline not found: {0}")]
    TimelineNotFound(String),

    #[error("Timeline lane not found: {0}")]
    LaneNotFound(String),

    #[error("Timeline item not found: {0}")]
    TimelineItemNotFound(String),

    #[error("Diagram not found: {0}")]
    DiagramNotFound(String),

    #[error("Calendar event not found: {0}")]
    CalendarEventNotFound(String),

    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Todo not found: {0}")]
    TodoNotFound(String),

    #[error("Comment not found: {0}")]
    CommentNotFound(String),

    #[error("Image not found: {0}")]
    ImageNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Chat relay error ({status}): {message}")]
    Relay { status: u16, message: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Restore error: {0}")]
    Restore(String),

    #[error("{0}")]
    Generic(String),
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
