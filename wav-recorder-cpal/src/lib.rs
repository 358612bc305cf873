//! # wav-recorder-cpal
//!
//! cpal backend for wav-recorder-core.
//!
//! Provides:
//! - `CpalInputSource`: `AudioSource` over a host input device
//! - `list_input_devices`: input device enumeration on the default host
//! - `ByteFifo` / `convert`: the callback-to-reader plumbing, usable without hardware
//!
//! ## Usage
//! ```ignore
//! use wav_recorder_core::Recorder;
//! use wav_recorder_cpal::CpalInputSource;
//!
//! let mut recorder = Recorder::new(CpalInputSource::default_device());
//! recorder.configure(16000, 16)?;
//! recorder.start("/sdcard/a.wav")?;
//! ```

pub mod byte_fifo;
pub mod convert;
pub mod cpal_input;
pub mod devices;

pub use byte_fifo::ByteFifo;
pub use cpal_input::CpalInputSource;
pub use devices::{list_input_devices, InputDevice};
