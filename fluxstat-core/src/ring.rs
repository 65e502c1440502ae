//! Bounded measurement history
//!
//! Fixed-capacity circular buffer that overwrites its oldest slot once full.

use parking_lot::Mutex;

#[derive(Debug)]
struct Slots {
    buffer: Vec<f64>,
    head: usize,
    len: usize,
}

/// Thread-safe ring buffer of recent samples
#[derive(Debug)]
pub struct RingBuffer {
    capacity: usize,
    slots: Mutex<Slots>,
}

impl RingBuffer {
    /// Create a buffer holding at most `capacity` samples
    ///
    /// A zero capacity is bumped to 1; engine configuration rejects it earlier.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            slots: Mutex::new(Slots {
                buffer: vec![0.0; capacity],
                head: 0,
                len: 0,
            }),
        }
    }

    /// Append a sample, overwriting the oldest one when full
    pub fn append(&self, value: f64) {
        let mut slots = self.slots.lock();
        let head = slots.head;
        slots.buffer[head] = value;
        slots.head = (head + 1) % self.capacity;
        if slots.len < self.capacity {
            slots.len += 1;
        }
    }

    /// Snapshot of the retained samples, oldest first
    pub fn get_data(&self) -> Vec<f64> {
        let slots = self.slots.lock();
        if slots.len < self.capacity {
            return slots.buffer[..slots.len].to_vec();
        }
        // Full: the write cursor points at the oldest sample.
        let mut data = Vec::with_capacity(self.capacity);
        data.extend_from_slice(&slots.buffer[slots.head..]);
        data.extend_from_slice(&slots.buffer[..slots.head]);
        data
    }

    /// Number of retained samples
    pub fn len(&self) -> usize {
        self.slots.lock().len
    }

    /// Whether nothing has been appended yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of retained samples
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
