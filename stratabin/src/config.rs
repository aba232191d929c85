//! Application configuration constants
//!
//! Central location for all configuration constants, resource limits,
//! and validation boundaries used throughout the application.

// ===== Persistence =====

/// Storage key under which the whole workspace is serialized
pub const STORAGE_KEY: &str = "stratabin-storage";

/// File name of the SQLite database inside the data directory
pub const DATABASE_FILE: &str = "db.sqlite";

/// File name of the settings document inside the data directory
pub const SETTINGS_FILE: &str = "settings.json";

/// Minimum autosave delay in milliseconds.
/// Values below this reserialize the workspace on nearly every keystroke.
pub const MIN_AUTO_SAVE_DELAY_MS: u32 = 100;

/// Maximum autosave delay in milliseconds (5 minutes).
/// Values above this risk data loss on unexpected shutdown.
pub const MAX_AUTO_SAVE_DELAY_MS: u32 = 300_000;

/// Default autosave debounce in milliseconds
pub const DEFAULT_AUTO_SAVE_DELAY_MS: u32 = 750;

/// Valid storage backend names
pub const VALID_STORAGE_BACKENDS: &[&str] = &["sqlite", "file", "memory"];

// ===== Chat Relay =====

/// Default relay endpoint used when settings do not override it
pub const DEFAULT_CHAT_ENDPOINT: &str = "http://localhost:3001/api/chat";

/// Default request timeout for the chat relay in seconds
pub const DEFAULT_CHAT_TIMEOUT_SECS: u64 = 60;

/// Maximum request timeout for the chat relay in seconds
pub const MAX_CHAT_TIMEOUT_SECS: u64 = 600;

/// Assistant reply recorded when the relay call fails
pub const CHAT_FALLBACK_MESSAGE: &str =
    "Sorry, I couldn't reach the assistant right now. Please try again in a moment.";

// ===== Canvas Defaults =====

/// Display name for canvases with a blank or missing title
pub const UNTITLED_CANVAS: &str = "Untitled";

/// Node type used for merged-project placeholders
pub const SUB_PROJECT_NODE_TYPE: &str = "subProject";

/// Id prefix for merged-project placeholder nodes
pub const SUB_PROJECT_NODE_PREFIX: &str = "subproject-";

/// Placeholders are laid out on a grid this many columns wide
pub const PLACEHOLDER_COLUMNS: usize = 3;

/// Horizontal spacing of placeholder nodes
pub const PLACEHOLDER_SPACING_X: f64 = 280.0;

/// Vertical spacing of placeholder nodes
pub const PLACEHOLDER_SPACING_Y: f64 = 180.0;

// ===== Backups =====

/// Number of backup archives kept when settings do not override it
pub const DEFAULT_BACKUP_RETENTION_COUNT: usize = 10;

/// Maximum number of backup archives kept
pub const MAX_BACKUP_RETENTION_COUNT: usize = 100;
