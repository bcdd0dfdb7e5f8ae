//! Fallback list loading from disk.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use crate::fallback::record::ServerRecord;

/// Error type for fallback list loading. Always fatal to the run.
#[derive(Debug, Error)]
pub enum FallbackError {
    #[error("please specify a fallbacks file")]
    MissingPath,

    #[error("unable to read fallbacks file at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to unmarshal json from {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("fallback #{index} in {path} has an empty address")]
    EmptyAddress { path: PathBuf, index: usize },
}

/// Load the fallback list and flatten its groups in file order.
pub fn load_fallbacks(path: &Path) -> Result<Vec<ServerRecord>, FallbackError> {
    if path.as_os_str().is_empty() {
        return Err(FallbackError::MissingPath);
    }

    let content = fs::read(path).map_err(|source| FallbackError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let groups: Vec<Vec<ServerRecord>> =
        serde_json::from_slice(&content).map_err(|source| FallbackError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    let records: Vec<ServerRecord> = groups.into_iter().flatten().collect();
    if let Some(index) = records.iter().position(|r| r.address.trim().is_empty()) {
        return Err(FallbackError::EmptyAddress {
            path: path.to_path_buf(),
            index,
        });
    }

    tracing::debug!(path = %path.display(), count = records.len(), "Fallbacks loaded");
    Ok(records)
}
