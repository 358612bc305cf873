use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::models::error::RecorderError;
use crate::models::recording_result::RecordingMetadata;

/// Path of the JSON sidecar for `recording_path`.
pub fn metadata_path(recording_path: &Path) -> PathBuf {
    recording_path.with_extension("metadata.json")
}

/// Write recording metadata as a JSON sidecar file.
///
/// Creates `{recording}.metadata.json` alongside the recording.
pub fn write_metadata(metadata: &RecordingMetadata, recording_path: &Path) -> Result<(), RecorderError> {
    let json = serde_json::to_string_pretty(metadata)
        .map_err(|e| RecorderError::Io(format!("failed to serialize metadata: {}", e)))?;
    fs::write(metadata_path(recording_path), json)
        .map_err(|e| RecorderError::io("failed to write metadata", e))?;
    Ok(())
}

/// Read recording metadata from a JSON sidecar file.
pub fn read_metadata(recording_path: &Path) -> Result<RecordingMetadata, RecorderError> {
    let json = fs::read_to_string(metadata_path(recording_path))
        .map_err(|e| RecorderError::io("failed to read metadata", e))?;
    serde_json::from_str(&json)
        .map_err(|e| RecorderError::Io(format!("failed to parse metadata: {}", e)))
}

/// Compute SHA-256 hex digest of a file, streaming it through the hasher.
pub fn sha256_file(path: &Path) -> Result<String, RecorderError> {
    let mut file = File::open(path).map_err(|e| RecorderError::io("failed to open file for checksum", e))?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher).map_err(|e| RecorderError::io("failed to read file for checksum", e))?;
    Ok(hex_encode(&hasher.finalize()))
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
