//! Atomic file writes for cache files and persisted local state.
//!
//! Content lands in a uniquely named sibling first and is then renamed over
//! the target, so readers only ever see the previous file or the complete new
//! one. Two writers racing on the same target both produce complete files;
//! the last rename wins.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::trace;
use uuid::Uuid;

fn temp_sibling(target: &Path) -> PathBuf {
    let file_name = target
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "file".to_string());
    target.with_file_name(format!(".{file_name}.{}.tmp", Uuid::new_v4().simple()))
}

/// Write `contents` to `target`, creating parent directories as needed
pub async fn write_atomic(target: &Path, contents: &[u8]) -> io::Result<()> {
    if let Some(parent) = target.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).await?;
    }

    let temp = temp_sibling(target);
    if let Err(e) = fs::write(&temp, contents).await {
        let _ = fs::remove_file(&temp).await;
        return Err(e);
    }
    if let Err(e) = fs::rename(&temp, target).await {
        let _ = fs::remove_file(&temp).await;
        return Err(e);
    }

    trace!("Wrote {} bytes to {}", contents.len(), target.display());
    Ok(())
}

/// Read a JSON document, `Ok(None)` if the file does not exist
pub async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, JsonFileError> {
    match fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Serialize `value` as pretty JSON and write it atomically
pub async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), JsonFileError> {
    let contents = serde_json::to_vec_pretty(value)?;
    write_atomic(path, &contents).await?;
    Ok(())
}

/// Remove a file, treating "already gone" as success
pub async fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JsonFileError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<JsonFileError> for crate::errors::AppError {
    fn from(err: JsonFileError) -> Self {
        match err {
            JsonFileError::Io(e) => Self::Io(e),
            JsonFileError::Json(e) => Self::Serialization(e),
        }
    }
}
