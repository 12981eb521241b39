//! Rotating session backups
//!
//! Backups are plain session JSON written as
//! `auto_backup_<YYYYmmdd-HHMMSS>.bak` with a UTC timestamp. UTC never steps
//! back, so name order equals age order and the oldest backup sorts first.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};

use crate::consts::{BACKUP_EXTENSION, BACKUP_PREFIX, BACKUP_TIMESTAMP_FORMAT};
use crate::core::SessionRecord;
use crate::error::StoreError;

use super::json::write_pretty;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BackupOutcome {
    pub(crate) path: PathBuf,
    pub(crate) removed: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
pub(crate) struct BackupManager {
    dir: PathBuf,
    max_backups: usize,
}

impl BackupManager {
    pub(crate) fn new(dir: PathBuf, max_backups: usize) -> Self {
        Self {
            dir,
            max_backups: max_backups.max(1),
        }
    }

    pub(crate) fn file_name(at: DateTime<Utc>) -> String {
        format!(
            "{BACKUP_PREFIX}{}.{BACKUP_EXTENSION}",
            at.format(BACKUP_TIMESTAMP_FORMAT)
        )
    }

    fn is_backup(path: &Path) -> bool {
        path.is_file()
            && path.file_name().and_then(|n| n.to_str()).is_some_and(|name| {
                name.starts_with(BACKUP_PREFIX)
                    && name.ends_with(&format!(".{BACKUP_EXTENSION}"))
            })
    }

    /// Existing backups, oldest first
    pub(crate) fn list(&self) -> Result<Vec<PathBuf>, StoreError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&self.dir).map_err(|source| StoreError::ListBackups {
            path: self.dir.clone(),
            source,
        })?;
        let mut backups: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| Self::is_backup(path))
            .collect();
        backups.sort();
        Ok(backups)
    }

    /// Modification time of the newest backup
    pub(crate) fn last_backup_time(&self) -> Result<Option<SystemTime>, StoreError> {
        let backups = self.list()?;
        Ok(backups
            .last()
            .and_then(|path| fs::metadata(path).ok())
            .and_then(|meta| meta.modified().ok()))
    }

    /// Write a backup of `record`, removing the oldest backups first so that
    /// no more than `max_backups` remain afterwards.
    pub(crate) fn backup(
        &self,
        record: &SessionRecord,
        at: DateTime<Utc>,
    ) -> Result<BackupOutcome, StoreError> {
        fs::create_dir_all(&self.dir).map_err(|source| StoreError::Write {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.dir.join(Self::file_name(at));
        // A backup from the same second is overwritten rather than counted
        let mut existing: Vec<PathBuf> = self.list()?.into_iter().filter(|p| *p != path).collect();

        let mut removed = Vec::new();
        while existing.len() >= self.max_backups {
            let oldest = existing.remove(0);
            fs::remove_file(&oldest).map_err(|source| StoreError::Prune {
                path: oldest.clone(),
                source,
            })?;
            tracing::debug!("Removed old backup {}", oldest.display());
            removed.push(oldest);
        }

        write_pretty(&path, record)?;
        tracing::info!("Backed up session to {}", path.display());
        Ok(BackupOutcome { path, removed })
    }
}

/// Decides when the next automatic backup is due
#[derive(Debug, Clone, Copy)]
pub(crate) struct BackupSchedule {
    interval: Duration,
}

impl BackupSchedule {
    pub(crate) fn every_minutes(minutes: u64) -> Self {
        Self {
            interval: Duration::from_secs(minutes.saturating_mul(60)),
        }
    }

    pub(crate) fn interval(&self) -> Duration {
        self.interval
    }

    /// Due when there is no previous backup or the last one is at least one
    /// interval old. A last backup in the future counts as fresh.
    pub(crate) fn is_due(&self, last_backup: Option<SystemTime>, now: SystemTime) -> bool {
        let Some(last) = last_backup else {
            return true;
        };
        match now.duration_since(last) {
            Ok(elapsed) => elapsed >= self.interval,
            Err(_) => false,
        }
    }
}
