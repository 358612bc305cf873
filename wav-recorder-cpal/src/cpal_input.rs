//! cpal-backed audio source.
//!
//! Opens an input stream on a dedicated thread (cpal streams are not `Send`
//! on every host), converts each callback buffer to mono PCM at the
//! configured rate and depth, and queues it in a [`ByteFifo`] that
//! `read` drains with a bounded wait.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SampleRate, SizedSample, StreamConfig, SupportedStreamConfig};
use parking_lot::Mutex;

use wav_recorder_core::{AudioSource, RecorderError};

use crate::byte_fifo::ByteFifo;
use crate::convert::{self, PcmEncoding};
use crate::devices;

/// Seconds of audio the FIFO holds before dropping the oldest bytes.
const FIFO_SECONDS: usize = 5;

const STREAM_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Microphone capture through cpal.
pub struct CpalInputSource {
    device_name: Option<String>,
    fifo: Arc<ByteFifo>,
    fault: Arc<Mutex<Option<String>>>,
    running: Arc<AtomicBool>,
    stream_handle: Option<thread::JoinHandle<()>>,
    active: Option<(u32, u16)>,
}

/// Where the stream callback delivers converted audio.
#[derive(Clone)]
struct PcmSink {
    fifo: Arc<ByteFifo>,
    fault: Arc<Mutex<Option<String>>>,
    encoding: PcmEncoding,
    device_rate: u32,
    target_rate: u32,
    channels: usize,
}

impl PcmSink {
    fn deliver(&self, samples: &[f32]) {
        let mono = convert::downmix_to_mono(samples, self.channels);
        let resampled = convert::resample(&mono, self.device_rate, self.target_rate);
        self.fifo.push(&self.encoding.encode(&resampled));
    }

    fn report(&self, message: String) {
        *self.fault.lock() = Some(message);
        self.fifo.wake();
    }
}

impl CpalInputSource {
    /// Capture from the host's default input device.
    pub fn default_device() -> Self {
        Self::new(None)
    }

    /// Capture from the input device with this exact name.
    pub fn with_device_name(name: impl Into<String>) -> Self {
        Self::new(Some(name.into()))
    }

    fn new(device_name: Option<String>) -> Self {
        Self {
            device_name,
            fifo: Arc::new(ByteFifo::new(1, 1)),
            fault: Arc::new(Mutex::new(None)),
            running: Arc::new(AtomicBool::new(false)),
            stream_handle: None,
            active: None,
        }
    }

    /// Bytes discarded because the recorder did not keep up with the device.
    pub fn dropped_bytes(&self) -> u64 {
        self.fifo.dropped_bytes()
    }

    fn stop_stream(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.stream_handle.take() {
            if handle.join().is_err() {
                log::error!("Input stream thread panicked");
            }
        }
        self.active = None;
    }
}

impl AudioSource for CpalInputSource {
    fn configure(&mut self, sample_rate: u32, bit_depth: u16) -> Result<(), RecorderError> {
        if self.active == Some((sample_rate, bit_depth)) && self.running.load(Ordering::SeqCst) {
            return Ok(());
        }
        self.stop_stream();

        let encoding = PcmEncoding::for_bit_depth(bit_depth)?;
        let frame_size = encoding.bytes_per_sample();
        self.fifo = Arc::new(ByteFifo::new(
            sample_rate as usize * frame_size * FIFO_SECONDS,
            frame_size,
        ));
        *self.fault.lock() = None;

        self.running.store(true, Ordering::SeqCst);
        let running = Arc::clone(&self.running);
        let device_name = self.device_name.clone();
        let fifo = Arc::clone(&self.fifo);
        let fault = Arc::clone(&self.fault);
        let (ready_tx, ready_rx) = mpsc::channel();

        let handle = thread::Builder::new()
            .name("cpal-input".into())
            .spawn(move || {
                let opened = open_stream(device_name.as_deref(), sample_rate, encoding, fifo, fault);
                let stream = match opened {
                    Ok(stream) => stream,
                    Err(e) => {
                        running.store(false, Ordering::SeqCst);
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(()));

                while running.load(Ordering::SeqCst) {
                    thread::sleep(STREAM_POLL_INTERVAL);
                }
                drop(stream);
            })
            .map_err(|e| {
                self.running.store(false, Ordering::SeqCst);
                RecorderError::ResourceExhausted(format!("failed to spawn input stream thread: {}", e))
            })?;
        self.stream_handle = Some(handle);

        let opened = ready_rx
            .recv()
            .unwrap_or(Err(RecorderError::DeviceNotAvailable));
        if let Err(e) = opened {
            self.stop_stream();
            return Err(e);
        }

        self.active = Some((sample_rate, bit_depth));
        log::info!("Input stream running at {} Hz, {}-bit", sample_rate, bit_depth);
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, RecorderError> {
        if let Some(message) = self.fault.lock().take() {
            return Err(RecorderError::SourceFault(message));
        }
        if !self.running.load(Ordering::SeqCst) {
            return Err(RecorderError::SourceFault("input stream is not running".into()));
        }
        Ok(self.fifo.pop_into(buf, timeout))
    }

    fn release(&mut self) {
        self.stop_stream();
        self.fifo.clear();
        log::info!("Input stream released");
    }
}

impl Drop for CpalInputSource {
    fn drop(&mut self) {
        self.stop_stream();
    }
}

/// Open and start an input stream delivering into `fifo`.
fn open_stream(
    device_name: Option<&str>,
    sample_rate: u32,
    encoding: PcmEncoding,
    fifo: Arc<ByteFifo>,
    fault: Arc<Mutex<Option<String>>>,
) -> Result<cpal::Stream, RecorderError> {
    let device = devices::find_input_device(device_name)?;
    let supported = choose_config(&device, sample_rate)?;
    let config: StreamConfig = supported.config();

    if config.sample_rate.0 != sample_rate {
        log::warn!(
            "Device does not support {} Hz, resampling from {} Hz",
            sample_rate,
            config.sample_rate.0
        );
    }

    let sink = PcmSink {
        fifo,
        fault,
        encoding,
        device_rate: config.sample_rate.0,
        target_rate: sample_rate,
        channels: config.channels as usize,
    };

    let stream = match supported.sample_format() {
        SampleFormat::F32 => build_stream::<f32>(&device, &config, sink),
        SampleFormat::I16 => build_stream::<i16>(&device, &config, sink),
        SampleFormat::I32 => build_stream::<i32>(&device, &config, sink),
        SampleFormat::U16 => build_stream::<u16>(&device, &config, sink),
        other => Err(RecorderError::ConfigurationFailed(format!(
            "unsupported sample format: {:?}",
            other
        ))),
    }?;

    stream
        .play()
        .map_err(|e| RecorderError::ConfigurationFailed(format!("failed to start input stream: {}", e)))?;
    Ok(stream)
}

/// Prefer a config that runs natively at `sample_rate` with the fewest
/// channels; fall back to the device default and resample.
fn choose_config(device: &cpal::Device, sample_rate: u32) -> Result<SupportedStreamConfig, RecorderError> {
    let native = device
        .supported_input_configs()
        .map_err(|e| RecorderError::ConfigurationFailed(format!("failed to query input configs: {}", e)))?
        .filter(|range| is_supported_format(range.sample_format()))
        .filter(|range| range.min_sample_rate().0 <= sample_rate && sample_rate <= range.max_sample_rate().0)
        .min_by_key(|range| range.channels());

    if let Some(range) = native {
        return Ok(range.with_sample_rate(SampleRate(sample_rate)));
    }

    device
        .default_input_config()
        .map_err(|e| RecorderError::ConfigurationFailed(format!("no default input config: {}", e)))
}

fn is_supported_format(format: SampleFormat) -> bool {
    matches!(
        format,
        SampleFormat::F32 | SampleFormat::I16 | SampleFormat::I32 | SampleFormat::U16
    )
}

fn build_stream<T>(device: &cpal::Device, config: &StreamConfig, sink: PcmSink) -> Result<cpal::Stream, RecorderError>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let error_sink = sink.clone();
    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                let samples: Vec<f32> = data.iter().map(|&s| f32::from_sample(s)).collect();
                sink.deliver(&samples);
            },
            move |err| {
                log::error!("Input stream error: {}", err);
                error_sink.report(err.to_string());
            },
            None,
        )
        .map_err(|e| RecorderError::ConfigurationFailed(format!("failed to build input stream: {}", e)))
}
