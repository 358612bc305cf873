use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::models::config::{mono_byte_rate, CHANNELS};

/// Outcome of a finished capture session, produced by the capture worker
/// after the header backpatch.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingResult {
    pub file_path: PathBuf,
    pub data_bytes: u64,
    pub duration_secs: f64,
    /// Hex SHA-256 of the finalized file, empty when checksums are disabled.
    pub checksum: String,
    /// False when the backpatch failed and the header still carries stale sizes.
    pub finalized: bool,
    pub metadata: RecordingMetadata,
}

/// Metadata stored alongside a recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingMetadata {
    pub id: String,
    pub created_at: String,
    pub file_path: String,
    pub sample_rate: u32,
    pub bit_depth: u16,
    pub channels: u16,
    pub data_bytes: u64,
    pub duration_secs: f64,
    pub checksum: String,
}

impl RecordingMetadata {
    /// Creates metadata for a mono PCM recording.
    pub fn new_mono(
        file_path: &str,
        sample_rate: u32,
        bit_depth: u16,
        data_bytes: u64,
        checksum: &str,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            file_path: file_path.to_string(),
            sample_rate,
            bit_depth,
            channels: CHANNELS,
            data_bytes,
            duration_secs: duration_secs(data_bytes, sample_rate, bit_depth),
            checksum: checksum.to_string(),
        }
    }
}

/// Playback length of `data_bytes` of mono PCM.
pub fn duration_secs(data_bytes: u64, sample_rate: u32, bit_depth: u16) -> f64 {
    let byte_rate = mono_byte_rate(sample_rate, bit_depth);
    if byte_rate == 0 {
        return 0.0;
    }
    data_bytes as f64 / byte_rate as f64
}
