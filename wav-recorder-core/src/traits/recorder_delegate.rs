use crate::models::error::RecorderError;
use crate::models::recording_result::RecordingResult;
use crate::models::state::CaptureState;

/// Event delegate for recorder notifications.
///
/// `Recording` and `Stopping` are reported on the thread that called
/// `start`/`stop`. The closing `Idle` and any `on_error` or
/// `on_recording_finished` call fire on the capture worker thread.
/// Implementations should marshal to a UI thread if needed.
pub trait RecorderDelegate: Send + Sync {
    /// Called when the recorder state changes.
    fn on_state_changed(&self, state: &CaptureState);

    /// Called when a capture or finalization fault occurs.
    fn on_error(&self, error: &RecorderError);

    /// Called once the file is closed, whether or not the backpatch succeeded.
    fn on_recording_finished(&self, result: &RecordingResult);
}
