//! Whole-file JSON collections shared by the catalog and the ledger.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{ Path, PathBuf };
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON error in '{}': {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Cannot place an order with no items")]
    EmptyOrder,
    #[error("Unsupported ledger store type: {0}")]
    UnsupportedType(String),
}

/// Reads a JSON array. A missing file is an empty collection, not an error.
pub async fn read_json_collection<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StoreError> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Ok(Vec::new());
        }
        Err(source) => {
            return Err(StoreError::Io { path: path.to_path_buf(), source });
        }
    };
    serde_json::from_str(&raw).map_err(|source| StoreError::Json { path: path.to_path_buf(), source })
}

/// Writes a JSON array with 4-space indentation, replacing the target via rename.
pub async fn write_json_collection<T: Serialize>(path: &Path, items: &[T]) -> Result<(), StoreError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    items
        .serialize(&mut ser)
        .map_err(|source| StoreError::Json { path: path.to_path_buf(), source })?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs
            ::create_dir_all(parent).await
            .map_err(|source| StoreError::Io { path: parent.to_path_buf(), source })?;
    }

    let tmp = tmp_path(path);
    tokio::fs
        ::write(&tmp, &buf).await
        .map_err(|source| StoreError::Io { path: tmp.clone(), source })?;
    tokio::fs
        ::rename(&tmp, path).await
        .map_err(|source| StoreError::Io { path: path.to_path_buf(), source })
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
