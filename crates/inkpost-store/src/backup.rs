// ABOUTME: Timestamped database backups for the maintenance CLI.
// ABOUTME: Names snapshot files by UTC time and writes them into a backup directory.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::sqlite::{SqliteError, SqliteStore};

/// File name for a backup taken at `taken_at`.
pub fn backup_file_name(taken_at: DateTime<Utc>) -> String {
    format!("inkpost-backup-{}.db", taken_at.format("%Y%m%d-%H%M%S"))
}

/// Snapshot `store` into `dir`, creating the directory if needed.
/// Returns the path of the written file.
pub fn backup_into_dir(
    store: &SqliteStore,
    dir: &Path,
    taken_at: DateTime<Utc>,
) -> Result<PathBuf, SqliteError> {
    std::fs::create_dir_all(dir)?;
    let dest = dir.join(backup_file_name(taken_at));
    store.backup_to(&dest)?;
    Ok(dest)
}
