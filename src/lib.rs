// TaskManager - Single-user task list persisted in a key-value preference store

pub mod config;
pub mod filter;
pub mod jsonl;
pub mod models;
pub mod prefs;
pub mod sqlite;
pub mod store;

// Re-export main types for convenience
pub use config::{Backend, Config};
pub use filter::{CategoryFilter, Progress, category_counts, empty_message};
pub use jsonl::JsonlPreferences;
pub use models::{Task, TaskCategory, ThemeMode, now_ms};
pub use prefs::{MemoryPreferences, PrefValue, Preferences};
pub use sqlite::SqlitePreferences;
pub use store::TaskStore;
