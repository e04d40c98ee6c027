//! Battery level sample history
//!
//! A fixed-capacity ring of timestamped battery readings kept in RAM so the
//! device never touches persistent storage for telemetry. The periodic
//! sampler writes, report requests read; one mutex keeps the two apart.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// One battery reading
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatterySample {
    /// Device uptime at the time of the reading, in seconds
    pub timestamp_seconds: u32,
    /// State of charge, 0-100
    pub level_percent: u8,
}

#[derive(Debug)]
struct RingState {
    samples: Vec<BatterySample>,
    head: usize,
    count: usize,
}

/// Fixed-capacity circular buffer of battery samples.
///
/// Once full, each push overwrites the oldest entry. Writes are strictly
/// periodic and ordered (single producer), so plain ring overwrite is the
/// whole eviction story.
#[derive(Debug)]
pub struct SampleRingBuffer {
    inner: Mutex<RingState>,
}

impl SampleRingBuffer {
    /// Create a buffer holding at most `capacity` samples.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(RingState {
                samples: vec![BatterySample::default(); capacity],
                head: 0,
                count: 0,
            }),
        }
    }

    /// Store a sample, overwriting the oldest one once the buffer is full.
    pub fn push(&self, sample: BatterySample) {
        let mut ring = self.inner.lock().unwrap();
        let capacity = ring.samples.len();
        if capacity == 0 {
            return;
        }
        let head = ring.head;
        ring.samples[head] = sample;
        ring.head = (head + 1) % capacity;
        if ring.count < capacity {
            ring.count += 1;
        }
    }

    /// The most recent `max_entries` samples, oldest first.
    ///
    /// `max_entries == 0`, or any value beyond what is stored, is clamped
    /// to the full current content.
    pub fn read(&self, max_entries: usize) -> Vec<BatterySample> {
        let ring = self.inner.lock().unwrap();
        let capacity = ring.samples.len();
        if capacity == 0 {
            return Vec::new();
        }

        let available = if max_entries == 0 {
            ring.count
        } else {
            max_entries.min(ring.count)
        };

        // Walk forward from the oldest of the requested window
        let start = (ring.head + capacity - available) % capacity;
        (0..available)
            .map(|i| ring.samples[(start + i) % capacity])
            .collect()
    }

    /// Number of samples currently stored
    pub fn total_entries(&self) -> usize {
        self.inner.lock().unwrap().count
    }

    /// Fixed capacity of the buffer
    pub fn capacity(&self) -> usize {
        self.inner.lock().unwrap().samples.len()
    }

    /// Forget all stored samples.
    ///
    /// Resets head and count only; the sample memory itself is benign
    /// telemetry and is left in place to be overwritten.
    pub fn clear(&self) {
        let mut ring = self.inner.lock().unwrap();
        ring.head = 0;
        ring.count = 0;
    }
}
