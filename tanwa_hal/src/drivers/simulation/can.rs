//! Simulated CAN controller.
//!
//! Transmitted frames are logged for inspection; received frames come from
//! a queue filled by [`SimCanBus::inject`].

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tanwa_common::hal::driver::{CanBus, HalError};
use tanwa_common::mission::can::CanFrame;

/// CAN bus with a transmit log and an injectable receive queue.
#[derive(Default)]
pub struct SimCanBus {
    transmitted: Mutex<Vec<CanFrame>>,
    rx_queue: Mutex<VecDeque<CanFrame>>,
    rx_ready: Condvar,
    tx_faulty: AtomicBool,
}

impl SimCanBus {
    /// Idle bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver a frame to the next `receive` call.
    pub fn inject(&self, frame: CanFrame) {
        self.rx_queue.lock().push_back(frame);
        self.rx_ready.notify_one();
    }

    /// Copy of every frame transmitted so far.
    pub fn transmitted(&self) -> Vec<CanFrame> {
        self.transmitted.lock().clone()
    }

    /// Drain the transmit log.
    pub fn take_transmitted(&self) -> Vec<CanFrame> {
        std::mem::take(&mut *self.transmitted.lock())
    }

    /// Make transmissions fail with a bus error.
    pub fn set_tx_faulty(&self, faulty: bool) {
        self.tx_faulty.store(faulty, Ordering::Relaxed);
    }
}

impl CanBus for SimCanBus {
    fn transmit(&self, frame: &CanFrame, _timeout: Duration) -> Result<(), HalError> {
        if self.tx_faulty.load(Ordering::Relaxed) {
            return Err(HalError::Can("bus-off".to_string()));
        }
        self.transmitted.lock().push(*frame);
        Ok(())
    }

    fn receive(&self, timeout: Duration) -> Result<Option<CanFrame>, HalError> {
        let mut queue = self.rx_queue.lock();
        if queue.is_empty() {
            let _ = self.rx_ready.wait_for(&mut queue, timeout);
        }
        Ok(queue.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receive_times_out_empty() {
        let bus = SimCanBus::new();
        assert_eq!(bus.receive(Duration::from_millis(5)).unwrap(), None);
    }

    #[test]
    fn injected_frames_arrive_in_order() {
        let bus = SimCanBus::new();
        bus.inject(CanFrame::new(0x0A8, 3));
        bus.inject(CanFrame::new(0x0A9, 8));
        assert_eq!(bus.receive(Duration::ZERO).unwrap().map(|f| f.id), Some(0x0A8));
        assert_eq!(bus.receive(Duration::ZERO).unwrap().map(|f| f.id), Some(0x0A9));
    }

    #[test]
    fn faulty_transmit_is_not_logged() {
        let bus = SimCanBus::new();
        bus.set_tx_faulty(true);
        assert!(bus.transmit(&CanFrame::new(0x0A1, 0), Duration::ZERO).is_err());
        assert!(bus.transmitted().is_empty());
    }
}
