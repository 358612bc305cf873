use thiserror::Error;

/// Errors that can occur while configuring, running, or finalizing a recording.
///
/// Payloads are plain strings so errors can be cloned into results and
/// compared in tests.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecorderError {
    #[error("recording is already in progress")]
    AlreadyRecording,

    #[error("not currently recording")]
    NotRecording,

    #[error("audio source has not been configured")]
    NotConfigured,

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),

    #[error("audio device not available")]
    DeviceNotAvailable,

    #[error("audio source fault: {0}")]
    SourceFault(String),

    #[error("i/o error: {0}")]
    Io(String),

    #[error("invalid container header: {0}")]
    InvalidHeader(String),

    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),
}

impl RecorderError {
    pub(crate) fn io(context: &str, err: std::io::Error) -> Self {
        Self::Io(format!("{}: {}", context, err))
    }
}
