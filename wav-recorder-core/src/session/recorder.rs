use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::models::config::{RecorderConfig, CHANNELS};
use crate::models::error::RecorderError;
use crate::models::recording_result::RecordingResult;
use crate::models::state::CaptureState;
use crate::processing::wav_format;
use crate::session::shared::SessionShared;
use crate::session::worker::CaptureWorker;
use crate::traits::audio_source::AudioSource;
use crate::traits::recorder_delegate::RecorderDelegate;

const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Records one mono PCM stream at a time into a WAV file.
///
/// The audio source is injected and owned for the recorder's whole lifetime.
/// `start` opens the file, writes a placeholder header and spawns the
/// capture worker; `stop` signals the worker and waits a bounded grace
/// period. The worker backpatches the header and closes the file on its own.
///
/// ```text
/// [AudioSource] → read(100ms) → [CaptureWorker] → append → [file.wav]
///                                      ↑ liveness flag
/// start()/stop() ──────────────────────┘
/// ```
pub struct Recorder<S: AudioSource> {
    source: Arc<Mutex<S>>,
    config: RecorderConfig,
    configured: bool,
    session: Option<Arc<SessionShared>>,
    worker_handle: Option<thread::JoinHandle<()>>,
    delegate: Option<Arc<dyn RecorderDelegate>>,
}

impl<S: AudioSource> Recorder<S> {
    pub fn new(source: S) -> Self {
        Self::with_config(source, RecorderConfig::default())
    }

    /// Sample rate and bit depth in `config` are replaced by `configure`.
    pub fn with_config(source: S, config: RecorderConfig) -> Self {
        Self {
            source: Arc::new(Mutex::new(source)),
            config,
            configured: false,
            session: None,
            worker_handle: None,
            delegate: None,
        }
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn RecorderDelegate>) {
        self.delegate = Some(delegate);
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    /// Set up the audio source for `sample_rate` / `bit_depth`.
    ///
    /// Must succeed once before `start`. Rejected while a session exists so
    /// the source is never reconfigured under a running worker.
    pub fn configure(&mut self, sample_rate: u32, bit_depth: u16) -> Result<(), RecorderError> {
        if self.state().has_session() {
            return Err(RecorderError::AlreadyRecording);
        }

        let config = RecorderConfig {
            sample_rate,
            bit_depth,
            ..self.config.clone()
        };
        config.validate().map_err(RecorderError::ConfigurationFailed)?;

        if let Err(e) = self.source.lock().configure(sample_rate, bit_depth) {
            log::error!("Audio source install failed: {}", e);
            return Err(e);
        }

        self.config = config;
        self.configured = true;
        log::info!("Audio source configured: {} Hz, {}-bit mono", sample_rate, bit_depth);
        Ok(())
    }

    pub fn state(&self) -> CaptureState {
        match &self.session {
            None => CaptureState::Idle,
            Some(session) if session.is_finished() => CaptureState::Idle,
            Some(session) if session.is_live() => CaptureState::Recording,
            Some(_) => CaptureState::Stopping,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.state().is_recording()
    }

    /// PCM bytes written by the current (or last) session.
    pub fn bytes_written(&self) -> u64 {
        self.session.as_ref().map(|s| s.bytes_written()).unwrap_or(0)
    }

    /// Target path of the current (or last) session.
    pub fn current_path(&self) -> Option<&Path> {
        self.session.as_ref().map(|s| s.path())
    }

    /// Result of the last session, once its worker has finalized the file.
    pub fn last_result(&self) -> Option<RecordingResult> {
        self.session.as_ref().and_then(|s| s.result())
    }

    /// Begin recording to `path`. Transitions: idle → recording.
    pub fn start(&mut self, path: impl AsRef<Path>) -> Result<(), RecorderError> {
        if !self.configured {
            log::error!("Audio source must be configured before recording");
            return Err(RecorderError::NotConfigured);
        }
        if self.state().has_session() {
            log::error!("Recording is already in progress");
            return Err(RecorderError::AlreadyRecording);
        }
        self.reap_worker();

        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .map_err(|e| {
                log::error!("Failed to open file for writing: {}: {}", path.display(), e);
                RecorderError::io(&format!("failed to open {}", path.display()), e)
            })?;

        if let Err(e) =
            wav_format::write_placeholder_header(&mut file, self.config.sample_rate, self.config.bit_depth, CHANNELS)
        {
            drop(file);
            discard_partial_file(&path);
            return Err(e);
        }

        let session = Arc::new(SessionShared::new(path.clone()));
        let worker = CaptureWorker::new(
            Arc::clone(&self.source),
            Arc::clone(&session),
            file,
            self.config.clone(),
            self.delegate.clone(),
        );

        let handle = match worker.spawn() {
            Ok(handle) => handle,
            Err(e) => {
                log::error!("Failed to create recording thread: {}", e);
                discard_partial_file(&path);
                return Err(RecorderError::ResourceExhausted(format!(
                    "failed to spawn capture worker: {}",
                    e
                )));
            }
        };

        self.session = Some(session);
        self.worker_handle = Some(handle);
        self.notify(CaptureState::Recording);
        log::info!("Recording started, saving to {}", path.display());
        Ok(())
    }

    /// Signal the worker to stop. Transitions: recording → stopping.
    ///
    /// Waits at most `stop_grace` for the worker to finish its last read,
    /// backpatch and close. This is not a join: on return the worker has been
    /// signaled but may still be finalizing, in which case `state()` reports
    /// `Stopping` until it is done. Use [`Recorder::wait_for_idle`] before
    /// reopening or deleting the file.
    pub fn stop(&mut self) -> Result<(), RecorderError> {
        let state = self.state();
        let session = match &self.session {
            Some(session) if state.is_recording() => Arc::clone(session),
            _ if state.is_stopping() => {
                log::warn!("Stop already requested, capture worker is still finalizing");
                return Err(RecorderError::NotRecording);
            }
            _ => {
                log::error!("Not currently recording");
                return Err(RecorderError::NotRecording);
            }
        };

        log::info!("Stopping recording...");
        self.notify(CaptureState::Stopping);
        session.clear_live();

        if !session.is_finished() {
            thread::sleep(self.config.stop_grace);
        }
        if session.is_finished() {
            self.reap_worker();
        }

        log::info!(
            "Recording stopped. Total data bytes written: {}",
            session.bytes_written()
        );
        Ok(())
    }

    /// Block until the worker has closed the file or `timeout` elapses.
    ///
    /// Returns true when the recorder is idle.
    pub fn wait_for_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.state().has_session() {
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(IDLE_POLL_INTERVAL);
        }
        self.reap_worker();
        true
    }

    // --- Boolean facade ---

    pub fn configure_source(&mut self, sample_rate: u32, bit_depth: u16) -> bool {
        self.configure(sample_rate, bit_depth).is_ok()
    }

    pub fn start_recording(&mut self, path: impl AsRef<Path>) -> bool {
        self.start(path).is_ok()
    }

    pub fn stop_recording(&mut self) -> bool {
        self.stop().is_ok()
    }

    // --- Internal helpers ---

    fn notify(&self, state: CaptureState) {
        if let Some(ref delegate) = self.delegate {
            delegate.on_state_changed(&state);
        }
    }

    /// Join the worker thread if it has already finished.
    fn reap_worker(&mut self) {
        let finished = self.session.as_ref().map(|s| s.is_finished()).unwrap_or(true);
        if !finished {
            return;
        }
        if let Some(handle) = self.worker_handle.take() {
            if handle.join().is_err() {
                log::error!("Capture worker panicked");
            }
        }
    }
}

impl<S: AudioSource> Drop for Recorder<S> {
    fn drop(&mut self) {
        if self.is_recording() {
            let _ = self.stop();
        }
        self.source.lock().release();
    }
}

fn discard_partial_file(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        log::warn!("Failed to remove partial file {}: {}", path.display(), e);
    }
}
