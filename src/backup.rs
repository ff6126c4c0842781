//! Backup management for workbook snapshots taken during sync operations.

use crate::{utils, Config, Result};
use chrono::Local;
use std::path::PathBuf;

/// Takes timestamped copies of the workbook before a sync touches anything.
///
/// The `Backup` struct is immutable and owns copies of the paths it needs. Create a new
/// instance via `Config::backup()` or `Backup::new()`. Snapshots are never rotated or
/// pruned; every sync leaves one behind.
#[derive(Debug, Clone)]
pub struct Backup {
    backups_dir: PathBuf,
    workbook_path: PathBuf,
}

impl Backup {
    /// Creates a new `Backup` instance from a `Config`.
    pub fn new(config: &Config) -> Self {
        Self {
            backups_dir: config.backups().to_path_buf(),
            workbook_path: config.workbook_path(),
        }
    }

    /// Copies the workbook to `backup_<YYYYMMDD_HHMMSS>.xlsx` in the backups directory.
    ///
    /// Returns the snapshot path, or `None` when the workbook does not exist yet: a sync
    /// against a missing workbook fails later for its own reasons, and there is nothing
    /// for a backup to protect. An existing snapshot with the same timestamp is left in
    /// place rather than overwritten, and its path is returned.
    pub async fn snapshot(&self) -> Result<Option<PathBuf>> {
        if !self.workbook_path.is_file() {
            return Ok(None);
        }
        utils::make_dir(&self.backups_dir).await?;
        let path = self.backups_dir.join(snapshot_filename(&timestamp()));
        if !path.exists() {
            utils::copy(&self.workbook_path, &path).await?;
        }
        Ok(Some(path))
    }
}

/// Returns the current local time in YYYYMMDD_HHMMSS format.
fn timestamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Builds the snapshot filename for a timestamp.
fn snapshot_filename(timestamp: &str) -> String {
    format!("backup_{timestamp}.xlsx")
}
