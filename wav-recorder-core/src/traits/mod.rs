pub mod audio_source;
pub mod recorder_delegate;
