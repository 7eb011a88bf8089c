// ABOUTME: Persistence layer for inkpost posts and comments.
// ABOUTME: Provides the SQLite-backed store, a mutex-guarded in-memory store, and database backups.

pub mod backup;
pub mod memory;
pub mod sqlite;


pub use backup::{backup_file_name, backup_into_dir};
pub use memory::MemoryStore;
pub use sqlite::{SqliteError, SqliteStore};
