//! Bounded CAN egress queue.
//!
//! Producers never block: a full queue drops the new frame with a warning.
//! The TX task waits on the condition variable with a timeout so it can
//! notice shutdown.

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tanwa_common::mission::can::CanFrame;
use tracing::warn;

pub struct CanTxQueue {
    frames: Mutex<VecDeque<CanFrame>>,
    ready: Condvar,
    capacity: usize,
    dropped: AtomicU64,
}

impl CanTxQueue {
    /// Bounded queue holding at most `capacity` frames.
    pub fn new(capacity: usize) -> Self {
        Self {
            frames: Mutex::new(VecDeque::with_capacity(capacity)),
            ready: Condvar::new(),
            capacity,
            dropped: AtomicU64::new(0),
        }
    }

    /// Enqueue `frame`. `false` if the queue was full.
    pub fn push(&self, frame: CanFrame) -> bool {
        let mut frames = self.frames.lock();
        if frames.len() >= self.capacity {
            drop(frames);
            let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
            warn!(id = frame.id, dropped, "CAN transmit queue full, frame dropped");
            return false;
        }
        frames.push_back(frame);
        drop(frames);
        self.ready.notify_one();
        true
    }

    /// Oldest frame, waiting up to `timeout` for one to arrive.
    pub fn pop_timeout(&self, timeout: Duration) -> Option<CanFrame> {
        let mut frames = self.frames.lock();
        if frames.is_empty() && !timeout.is_zero() {
            let _ = self.ready.wait_for(&mut frames, timeout);
        }
        frames.pop_front()
    }

    /// Frames waiting to be sent.
    pub fn len(&self) -> usize {
        self.frames.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.lock().is_empty()
    }

    /// Maximum number of queued frames.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Frames dropped on a full queue so far.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Discard everything queued.
    pub fn clear(&self) {
        self.frames.lock().clear();
    }
}
