use std::time::Duration;

use crate::models::error::RecorderError;

/// A source of raw PCM bytes from an input device.
///
/// Implemented by:
/// - `CpalInputSource` (wav-recorder-cpal)
/// - test fakes that replay scripted chunks
///
/// Bytes arrive in FIFO order of the underlying stream; nothing else is
/// guaranteed about chunk boundaries.
pub trait AudioSource: Send + 'static {
    /// Prepare the device for the given sample rate and bit depth.
    ///
    /// Must succeed before any `read`. Calling it again with the same
    /// parameters is harmless.
    fn configure(&mut self, sample_rate: u32, bit_depth: u16) -> Result<(), RecorderError>;

    /// Read up to `buf.len()` bytes, blocking for at most `timeout`.
    ///
    /// Returns `Ok(0)` when nothing arrived in time; that is not an error.
    /// `Err` is reserved for genuine driver faults.
    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, RecorderError>;

    /// Give the device back. Called once when the owning recorder is dropped.
    fn release(&mut self) {}
}
