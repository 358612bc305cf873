use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// Bounded circular FIFO of PCM bytes between the cpal callback thread and
/// the capture worker's blocking `read`.
///
/// Overflow behavior: drops the oldest bytes. Reads and drops always move in
/// whole frames (`frame_size` bytes) so the byte stream never loses sample
/// alignment.
#[derive(Debug)]
pub struct ByteFifo {
    state: Mutex<Ring>,
    data_ready: Condvar,
}

#[derive(Debug)]
struct Ring {
    buffer: Vec<u8>,
    write_index: usize,
    read_index: usize,
    available: usize,
    capacity: usize,
    frame_size: usize,
    dropped: u64,
}

impl ByteFifo {
    /// `capacity` is rounded down to a whole number of frames (minimum one).
    pub fn new(capacity: usize, frame_size: usize) -> Self {
        let frame_size = frame_size.max(1);
        let capacity = (capacity / frame_size).max(1) * frame_size;
        Self {
            state: Mutex::new(Ring {
                buffer: vec![0; capacity],
                write_index: 0,
                read_index: 0,
                available: 0,
                capacity,
                frame_size,
                dropped: 0,
            }),
            data_ready: Condvar::new(),
        }
    }

    /// Append whole frames and wake a waiting reader.
    ///
    /// If `bytes` is larger than the capacity only the tail is kept.
    pub fn push(&self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        {
            let mut ring = self.state.lock();

            let bytes = if bytes.len() > ring.capacity {
                let skipped = bytes.len() - ring.capacity;
                ring.dropped += skipped as u64;
                &bytes[skipped..]
            } else {
                bytes
            };

            let overflow = (ring.available + bytes.len()).saturating_sub(ring.capacity);
            if overflow > 0 {
                ring.read_index = (ring.read_index + overflow) % ring.capacity;
                ring.available -= overflow;
                ring.dropped += overflow as u64;
            }

            for &byte in bytes {
                let index = ring.write_index;
                ring.buffer[index] = byte;
                ring.write_index = (index + 1) % ring.capacity;
            }
            ring.available += bytes.len();
        }
        self.data_ready.notify_one();
    }

    /// Move up to `out.len()` bytes (rounded down to whole frames) into `out`,
    /// waiting at most `timeout` for data. Returns 0 on timeout.
    pub fn pop_into(&self, out: &mut [u8], timeout: Duration) -> usize {
        let deadline = Instant::now() + timeout;
        let mut ring = self.state.lock();

        while ring.available == 0 {
            let now = Instant::now();
            if now >= deadline {
                return 0;
            }
            self.data_ready.wait_for(&mut ring, deadline - now);
        }

        let wanted = out.len() - out.len() % ring.frame_size;
        let to_read = wanted.min(ring.available);
        for (i, slot) in out.iter_mut().take(to_read).enumerate() {
            *slot = ring.buffer[(ring.read_index + i) % ring.capacity];
        }
        ring.read_index = (ring.read_index + to_read) % ring.capacity;
        ring.available -= to_read;
        to_read
    }

    /// Wake any reader without adding data, e.g. after a stream fault.
    pub fn wake(&self) {
        self.data_ready.notify_all();
    }

    /// Number of bytes currently available for reading.
    pub fn len(&self) -> usize {
        self.state.lock().available
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total bytes discarded because the reader fell behind.
    pub fn dropped_bytes(&self) -> u64 {
        self.state.lock().dropped
    }

    /// Reset to the empty state.
    pub fn clear(&self) {
        let mut ring = self.state.lock();
        ring.write_index = 0;
        ring.read_index = 0;
        ring.available = 0;
    }

    pub fn capacity(&self) -> usize {
        self.state.lock().capacity
    }
}
