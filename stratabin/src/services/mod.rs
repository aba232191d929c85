//! Services module
//!
//! Services that coordinate the store with the outside world: the chat
//! relay, backup archives and the settings file.

pub mod backup;
pub mod chat;
pub mod settings;

pub use backup::{BackupInfo, BackupService};
pub use chat::{ChatRelayClient, ChatService, ProjectContext};
pub use settings::{AppSettings, SettingsService};
