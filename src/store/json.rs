use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::core::SessionRecord;
use crate::error::StoreError;

pub(crate) fn load_session(path: &Path) -> Result<SessionRecord, StoreError> {
    let file = File::open(path).map_err(|source| StoreError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn save_session(path: &Path, record: &SessionRecord) -> Result<(), StoreError> {
    write_pretty(path, record)
}

fn create_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

/// Write `value` as JSON with 2-space indentation, creating parent
/// directories as needed.
pub(crate) fn write_pretty<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let write_err = |source: std::io::Error| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };
    create_parent(path).map_err(write_err)?;
    let file = File::create(path).map_err(write_err)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n").map_err(write_err)?;
    writer.flush().map_err(write_err)?;
    tracing::debug!("Wrote {}", path.display());
    Ok(())
}

/// Write plain text such as a CSV export, creating parent directories as
/// needed.
pub(crate) fn write_text(path: &Path, text: &str) -> Result<(), StoreError> {
    let write_err = |source: std::io::Error| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };
    create_parent(path).map_err(write_err)?;
    fs::write(path, text).map_err(write_err)?;
    tracing::debug!("Wrote {}", path.display());
    Ok(())
}
