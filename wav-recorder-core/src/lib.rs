//! # wav-recorder-core
//!
//! Hardware-agnostic engine that records a continuous mono PCM stream into
//! a RIFF/WAVE file.
//!
//! A caller configures an injected [`AudioSource`] once, then issues
//! `start(path)` / `stop()` on a [`Recorder`]. `start` writes a placeholder
//! header and spawns a capture worker thread that appends audio until it is
//! signaled; the worker then backpatches the header sizes and closes the file.
//!
//! ## Architecture
//!
//! ```text
//! wav-recorder-core (this crate)
//! ├── traits/       ← AudioSource, RecorderDelegate
//! ├── models/       ← RecorderError, CaptureState, RecorderConfig, RecordingResult
//! ├── processing/   ← WAV header encode/decode and size backpatching
//! ├── session/      ← Recorder (state machine) and its capture worker
//! └── storage/      ← metadata sidecar, checksums
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::config::RecorderConfig;
pub use models::error::RecorderError;
pub use models::recording_result::{RecordingMetadata, RecordingResult};
pub use models::state::CaptureState;
pub use processing::wav_format::{WavHeader, WAV_HEADER_SIZE};
pub use session::recorder::Recorder;
pub use traits::audio_source::AudioSource;
pub use traits::recorder_delegate::RecorderDelegate;
