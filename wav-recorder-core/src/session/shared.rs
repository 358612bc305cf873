use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::models::recording_result::RecordingResult;

/// State of one recording, shared between the recorder and its capture worker.
///
/// The worker is the only writer of the byte counter, the finished flag and
/// the result slot. The recorder only ever clears the liveness flag.
pub(crate) struct SessionShared {
    path: PathBuf,
    live: AtomicBool,
    finished: AtomicBool,
    bytes_written: AtomicU64,
    result: Mutex<Option<RecordingResult>>,
}

impl SessionShared {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self {
            path,
            live: AtomicBool::new(true),
            finished: AtomicBool::new(false),
            bytes_written: AtomicU64::new(0),
            result: Mutex::new(None),
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    /// Clear the liveness flag. Returns whether it was set.
    pub(crate) fn clear_live(&self) -> bool {
        self.live.swap(false, Ordering::SeqCst)
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }

    pub(crate) fn mark_finished(&self) {
        self.finished.store(true, Ordering::SeqCst);
    }

    pub(crate) fn bytes_written(&self) -> u64 {
        self.bytes_written.load(Ordering::SeqCst)
    }

    pub(crate) fn add_bytes(&self, count: u64) {
        self.bytes_written.fetch_add(count, Ordering::SeqCst);
    }

    pub(crate) fn result(&self) -> Option<RecordingResult> {
        self.result.lock().clone()
    }

    pub(crate) fn set_result(&self, result: RecordingResult) {
        *self.result.lock() = Some(result);
    }
}
