use std::io::{self, Read, Seek, Write};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use crate::models::config::{RecorderConfig, CHANNELS};
use crate::models::error::RecorderError;
use crate::models::recording_result::{duration_secs, RecordingMetadata, RecordingResult};
use crate::models::state::CaptureState;
use crate::processing::wav_format;
use crate::session::shared::SessionShared;
use crate::storage::metadata;
use crate::traits::audio_source::AudioSource;
use crate::traits::recorder_delegate::RecorderDelegate;

/// Background unit that drains the audio source into the open file.
///
/// Owns the file exclusively from spawn until exit. Talks back to the
/// recorder only through the shared session: byte counter, liveness flag,
/// finished flag and result slot.
pub(crate) struct CaptureWorker<S: AudioSource, F> {
    source: Arc<Mutex<S>>,
    session: Arc<SessionShared>,
    file: F,
    config: RecorderConfig,
    delegate: Option<Arc<dyn RecorderDelegate>>,
}

/// Marks the session finished when the worker leaves scope, panics included.
struct FinishGuard {
    session: Arc<SessionShared>,
    delegate: Option<Arc<dyn RecorderDelegate>>,
}

impl Drop for FinishGuard {
    fn drop(&mut self) {
        self.session.clear_live();
        self.session.mark_finished();
        if let Some(ref delegate) = self.delegate {
            delegate.on_state_changed(&CaptureState::Idle);
        }
    }
}

impl<S, F> CaptureWorker<S, F>
where
    S: AudioSource,
    F: Read + Write + Seek + Send + 'static,
{
    pub(crate) fn new(
        source: Arc<Mutex<S>>,
        session: Arc<SessionShared>,
        file: F,
        config: RecorderConfig,
        delegate: Option<Arc<dyn RecorderDelegate>>,
    ) -> Self {
        Self {
            source,
            session,
            file,
            config,
            delegate,
        }
    }

    pub(crate) fn spawn(self) -> io::Result<thread::JoinHandle<()>> {
        thread::Builder::new()
            .name("wav-capture".into())
            .spawn(move || self.run())
    }

    fn run(mut self) {
        let _guard = FinishGuard {
            session: Arc::clone(&self.session),
            delegate: self.delegate.clone(),
        };

        match allocate_scratch(self.config.chunk_size) {
            Ok(mut scratch) => {
                self.capture_loop(&mut scratch);
            }
            Err(e) => {
                log::error!("Failed to allocate capture buffer: {}", e);
                self.session.clear_live();
                self.report(&e);
            }
        }

        self.finalize();
    }

    fn capture_loop(&mut self, scratch: &mut [u8]) {
        while self.session.is_live() {
            let read = self.source.lock().read(scratch, self.config.read_timeout);
            match read {
                Ok(0) => log::debug!("Audio source read timed out"),
                Ok(n) => {
                    let n = n.min(scratch.len());
                    self.append(&scratch[..n]);
                }
                Err(e) => {
                    log::warn!("Audio source read failed: {}", e);
                    self.report(&e);
                    // back off so a persistent fault doesn't spin
                    thread::sleep(self.config.read_timeout);
                }
            }
        }
    }

    /// Write `chunk`, counting only bytes that actually landed in the file.
    fn append(&mut self, chunk: &[u8]) {
        let mut written = 0;
        while written < chunk.len() {
            match self.file.write(&chunk[written..]) {
                Ok(0) => {
                    log::warn!("File write accepted no bytes, dropping {} bytes", chunk.len() - written);
                    break;
                }
                Ok(n) => written += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    log::warn!("Failed to write audio data: {}", e);
                    self.report(&RecorderError::io("failed to write audio data", e));
                    break;
                }
            }
        }
        self.session.add_bytes(written as u64);
    }

    fn finalize(self) {
        let Self {
            session,
            mut file,
            config,
            delegate,
            ..
        } = self;

        let data_bytes = session.bytes_written();
        let finalized = match wav_format::backpatch_sizes(&mut file, data_bytes) {
            Ok(_) => true,
            Err(e) => {
                log::error!(
                    "Failed to finalize header of {}: {}",
                    session.path().display(),
                    e
                );
                if let Some(ref d) = delegate {
                    d.on_error(&e);
                }
                false
            }
        };
        drop(file);

        let path = session.path().to_path_buf();
        let checksum = if config.compute_checksum {
            metadata::sha256_file(&path).unwrap_or_else(|e| {
                log::warn!("Checksum skipped: {}", e);
                String::new()
            })
        } else {
            String::new()
        };

        let recording_metadata = RecordingMetadata::new_mono(
            &path.to_string_lossy(),
            config.sample_rate,
            config.bit_depth,
            data_bytes,
            &checksum,
        );
        if config.write_metadata {
            if let Err(e) = metadata::write_metadata(&recording_metadata, &path) {
                log::warn!("Failed to write metadata sidecar: {}", e);
            }
        }

        let result = RecordingResult {
            file_path: path,
            data_bytes,
            duration_secs: duration_secs(data_bytes, config.sample_rate, config.bit_depth),
            checksum,
            finalized,
            metadata: recording_metadata,
        };
        session.set_result(result.clone());

        if let Some(ref d) = delegate {
            d.on_recording_finished(&result);
        }

        log::info!(
            "File saved: {} ({} data bytes, {} channel)",
            result.file_path.display(),
            data_bytes,
            CHANNELS
        );
    }

    fn report(&self, error: &RecorderError) {
        if let Some(ref delegate) = self.delegate {
            delegate.on_error(error);
        }
    }
}

fn allocate_scratch(size: usize) -> Result<Vec<u8>, RecorderError> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(size)
        .map_err(|e| RecorderError::ResourceExhausted(format!("{} byte capture buffer: {}", size, e)))?;
    buffer.resize(size, 0);
    Ok(buffer)
}
