//! Session persistence: JSON documents and rotating backups

pub(crate) mod backup;
pub(crate) mod json;

pub(crate) use backup::{BackupManager, BackupSchedule};
pub(crate) use json::{load_session, save_session, write_pretty, write_text};
