//! Storage module
//!
//! Key-value backends, whole-workspace persistence and debounced autosave.

pub mod autosave;
pub mod backend;
pub mod persistence;

pub use autosave::Autosave;
pub use backend::StorageBackend;
pub use persistence::PersistenceAdapter;
