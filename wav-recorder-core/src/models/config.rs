use std::time::Duration;

/// Number of channels written by the recorder. The engine is mono-only.
pub const CHANNELS: u16 = 1;

/// Bit depths accepted for PCM output.
pub const SUPPORTED_BIT_DEPTHS: [u16; 4] = [8, 16, 24, 32];

/// Configuration for a recorder.
#[derive(Debug, Clone, PartialEq)]
pub struct RecorderConfig {
    /// Sample rate in Hz (default: 16000).
    pub sample_rate: u32,

    /// Bit depth for PCM output (default: 16). Valid values: 8, 16, 24, 32.
    pub bit_depth: u16,

    /// Size of the worker's scratch buffer in bytes (default: 1024).
    pub chunk_size: usize,

    /// Upper bound on a single audio source read (default: 100 ms).
    pub read_timeout: Duration,

    /// How long `stop()` waits for the worker before returning (default: 200 ms).
    pub stop_grace: Duration,

    /// Write a `.metadata.json` sidecar next to the recording (default: false).
    pub write_metadata: bool,

    /// Compute a SHA-256 checksum of the finalized file (default: true).
    pub compute_checksum: bool,
}

impl RecorderConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.sample_rate == 0 {
            return Err("sample rate must be positive".into());
        }
        if !SUPPORTED_BIT_DEPTHS.contains(&self.bit_depth) {
            return Err(format!("unsupported bit depth: {}", self.bit_depth));
        }
        if self.byte_rate() > u32::MAX as u64 {
            return Err(format!(
                "sample rate {} Hz at {}-bit exceeds the WAV byte rate limit",
                self.sample_rate, self.bit_depth
            ));
        }
        if self.chunk_size == 0 {
            return Err("chunk size must be positive".into());
        }
        if self.read_timeout.is_zero() {
            return Err("read timeout must be positive".into());
        }
        Ok(())
    }

    /// Bytes of PCM produced per second of mono audio.
    ///
    /// Widened so an out-of-range rate can be detected instead of wrapping.
    pub fn byte_rate(&self) -> u64 {
        mono_byte_rate(self.sample_rate, self.bit_depth)
    }
}

pub fn mono_byte_rate(sample_rate: u32, bit_depth: u16) -> u64 {
    sample_rate as u64 * CHANNELS as u64 * (bit_depth / 8) as u64
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            bit_depth: 16,
            chunk_size: 1024,
            read_timeout: Duration::from_millis(100),
            stop_grace: Duration::from_millis(200),
            write_metadata: false,
            compute_checksum: true,
        }
    }
}
