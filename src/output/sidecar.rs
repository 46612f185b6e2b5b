//! JSON metadata written next to an artifact.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ErrorCode, Result, SynthError};
use crate::types::ArtifactRecord;

/// Returns `<output>.json`, keeping the artifact's own extension.
pub fn sidecar_path(output: &Path) -> PathBuf {
    let mut name = output.as_os_str().to_os_string();
    name.push(".json");
    PathBuf::from(name)
}

/// Serializes the record as pretty JSON next to its artifact.
pub fn write_sidecar(record: &ArtifactRecord) -> Result<PathBuf> {
    let path = sidecar_path(&record.path);
    let json = serde_json::to_string_pretty(record).map_err(|e| {
        SynthError::with_source(ErrorCode::FilesystemError, "Failed to serialize artifact record", e)
    })?;
    fs::write(&path, json).map_err(|e| SynthError::write_failed(&path, e))?;

    tracing::debug!(path = %path.display(), fingerprint = %record.fingerprint, "sidecar written");
    Ok(path)
}
