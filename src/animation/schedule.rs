//! Per-frame callback capability injected into the animation driver.
//!
//! A scheduler hands out a [`FrameHandle`] for each requested tick. When the host's frame
//! arrives it delivers that handle back to the owner (see `ArcLayer::on_tick`), which plays the
//! role of the callback. Handles are only ever used for cancellation and stale-tick detection.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::foundation::error::{TrafficError, TrafficResult};

/// Opaque token identifying one requested tick.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameHandle(pub u64);

/// Host capability for one-shot per-frame callbacks.
pub trait FrameScheduler {
    /// Ask for one callback on the next frame.
    fn request_tick(&mut self) -> TrafficResult<FrameHandle>;

    /// Withdraw a pending request. Unknown or already-fired handles are ignored.
    fn cancel_tick(&mut self, handle: FrameHandle);
}

impl<S: FrameScheduler + ?Sized> FrameScheduler for Box<S> {
    fn request_tick(&mut self) -> TrafficResult<FrameHandle> {
        (**self).request_tick()
    }

    fn cancel_tick(&mut self, handle: FrameHandle) {
        (**self).cancel_tick(handle);
    }
}

/// Host without any frame facility; every request fails.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnavailableScheduler;

impl FrameScheduler for UnavailableScheduler {
    fn request_tick(&mut self) -> TrafficResult<FrameHandle> {
        Err(TrafficError::SchedulingUnavailable)
    }

    fn cancel_tick(&mut self, _handle: FrameHandle) {}
}

#[derive(Debug, Default)]
struct ManualState {
    next_handle: u64,
    pending: VecDeque<FrameHandle>,
    requested: u64,
    cancelled: u64,
    fired: u64,
}

/// Synthetic-clock scheduler driven explicitly by the host or a test.
///
/// Clones share state, so a test can keep one clone to fire frames while the layer owns another.
/// Requests made while a frame is being delivered land in the following frame, matching how
/// display-refresh callbacks behave.
#[derive(Clone, Debug, Default)]
pub struct ManualScheduler {
    state: Rc<RefCell<ManualState>>,
}

impl ManualScheduler {
    /// Scheduler with an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain every handle due on this frame, in request order.
    pub fn take_due(&self) -> Vec<FrameHandle> {
        let mut st = self.state.borrow_mut();
        let due: Vec<FrameHandle> = st.pending.drain(..).collect();
        st.fired += due.len() as u64;
        due
    }

    /// Handles still waiting for a frame, in request order.
    pub fn pending(&self) -> Vec<FrameHandle> {
        self.state.borrow().pending.iter().copied().collect()
    }

    /// Number of pending handles.
    pub fn pending_len(&self) -> usize {
        self.state.borrow().pending.len()
    }

    /// Total requests since creation.
    pub fn requested_count(&self) -> u64 {
        self.state.borrow().requested
    }

    /// Requests withdrawn before firing.
    pub fn cancelled_count(&self) -> u64 {
        self.state.borrow().cancelled
    }

    /// Handles handed out by [`ManualScheduler::take_due`].
    pub fn fired_count(&self) -> u64 {
        self.state.borrow().fired
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_tick(&mut self) -> TrafficResult<FrameHandle> {
        let mut st = self.state.borrow_mut();
        st.next_handle += 1;
        let handle = FrameHandle(st.next_handle);
        st.pending.push_back(handle);
        st.requested += 1;
        Ok(handle)
    }

    fn cancel_tick(&mut self, handle: FrameHandle) {
        let mut st = self.state.borrow_mut();
        if let Some(pos) = st.pending.iter().position(|h| *h == handle) {
            st.pending.remove(pos);
            st.cancelled += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_unique_and_fire_in_order() {
        let mut sched = ManualScheduler::new();
        let a = sched.request_tick().unwrap();
        let b = sched.request_tick().unwrap();
        assert_ne!(a, b);
        assert_eq!(sched.take_due(), vec![a, b]);
        assert!(sched.take_due().is_empty());
        assert_eq!(sched.fired_count(), 2);
    }

    #[test]
    fn cancel_removes_only_pending_handles() {
        let mut sched = ManualScheduler::new();
        let a = sched.request_tick().unwrap();
        let b = sched.request_tick().unwrap();
        sched.cancel_tick(a);
        sched.cancel_tick(a);
        assert_eq!(sched.pending(), vec![b]);
        assert_eq!(sched.cancelled_count(), 1);
    }

    #[test]
    fn clones_share_the_queue() {
        let mut owned = ManualScheduler::new();
        let observer = owned.clone();
        let h = owned.request_tick().unwrap();
        assert_eq!(observer.pending(), vec![h]);
    }

    #[test]
    fn unavailable_scheduler_refuses() {
        let mut sched = UnavailableScheduler;
        assert!(matches!(
            sched.request_tick(),
            Err(TrafficError::SchedulingUnavailable)
        ));
    }
}
