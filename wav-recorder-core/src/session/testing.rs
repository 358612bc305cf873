//! Scripted audio source used in place of hardware.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use crate::models::error::RecorderError;
use crate::traits::audio_source::AudioSource;

/// One scripted response to `read`.
#[derive(Debug, Clone)]
pub(crate) enum Step {
    /// Deliver these bytes (split across reads if larger than the buffer).
    Data(Vec<u8>),
    /// Wait out the full timeout and return nothing.
    Timeout,
    /// Return zero bytes immediately.
    Empty,
    /// Report a driver fault.
    Fault(&'static str),
    /// Block for this long regardless of the timeout, then return nothing.
    Stall(Duration),
}

/// What to do once the script runs out.
#[derive(Debug, Clone)]
pub(crate) enum Tail {
    Silence,
    Repeat(Vec<u8>),
}

/// Fake `AudioSource` that replays a script. Clones share state, so a test
/// can keep a probe after handing the source to a recorder.
#[derive(Clone)]
pub(crate) struct ScriptedSource {
    steps: Arc<Mutex<VecDeque<Step>>>,
    tail: Tail,
    fail_install: bool,
    configured: Arc<Mutex<Option<(u32, u16)>>>,
    released: Arc<AtomicBool>,
    reads: Arc<AtomicUsize>,
}

impl ScriptedSource {
    pub(crate) fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Arc::new(Mutex::new(steps.into())),
            tail: Tail::Silence,
            fail_install: false,
            configured: Arc::new(Mutex::new(None)),
            released: Arc::new(AtomicBool::new(false)),
            reads: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Source that produces `chunk` on every read, forever.
    pub(crate) fn endless(chunk: Vec<u8>) -> Self {
        Self {
            tail: Tail::Repeat(chunk),
            ..Self::new(Vec::new())
        }
    }

    pub(crate) fn failing_install() -> Self {
        Self {
            fail_install: true,
            ..Self::new(Vec::new())
        }
    }

    pub(crate) fn configured(&self) -> Option<(u32, u16)> {
        *self.configured.lock()
    }

    pub(crate) fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    pub(crate) fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub(crate) fn remaining_steps(&self) -> usize {
        self.steps.lock().len()
    }
}

impl AudioSource for ScriptedSource {
    fn configure(&mut self, sample_rate: u32, bit_depth: u16) -> Result<(), RecorderError> {
        if self.fail_install {
            return Err(RecorderError::ConfigurationFailed("driver install failed".into()));
        }
        *self.configured.lock() = Some((sample_rate, bit_depth));
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, RecorderError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let step = self.steps.lock().pop_front();

        match step {
            Some(Step::Data(bytes)) => {
                let n = bytes.len().min(buf.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                if n < bytes.len() {
                    self.steps.lock().push_front(Step::Data(bytes[n..].to_vec()));
                }
                Ok(n)
            }
            Some(Step::Timeout) => {
                thread::sleep(timeout);
                Ok(0)
            }
            Some(Step::Empty) => Ok(0),
            Some(Step::Fault(msg)) => Err(RecorderError::SourceFault(msg.into())),
            Some(Step::Stall(duration)) => {
                thread::sleep(duration);
                Ok(0)
            }
            None => match &self.tail {
                Tail::Silence => {
                    thread::sleep(timeout);
                    Ok(0)
                }
                Tail::Repeat(chunk) => {
                    thread::sleep(Duration::from_millis(2));
                    let n = chunk.len().min(buf.len());
                    buf[..n].copy_from_slice(&chunk[..n]);
                    Ok(n)
                }
            },
        }
    }

    fn release(&mut self) {
        self.released.store(true, Ordering::SeqCst);
    }
}
