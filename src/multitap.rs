use log::debug;
use std::time::Duration;

use crate::host::{Scheduler, TimerKind, TimerToken};

/// A burst of taps on one target, delivered after the quiet period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultiTapEvent<T> {
    pub target: T,
    pub count: u32,
    /// Monotonic time of the burst's first tap.
    pub first_tap_ms: u64,
}

/// Coalesces rapid taps on the same target into one counted event.
///
/// Each tap reschedules a single flush timer; a tap on a different target
/// restarts the count.
#[derive(Debug, Clone)]
pub struct MultiTap<T> {
    threshold: Duration,
    target: Option<T>,
    count: u32,
    first_tap_ms: u64,
    pending: Option<TimerToken>,
}

impl<T: Copy + Eq + std::fmt::Debug> MultiTap<T> {
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            target: None,
            count: 0,
            first_tap_ms: 0,
            pending: None,
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn on_tap<S: Scheduler + ?Sized>(&mut self, target: T, now_ms: u64, scheduler: &mut S) {
        if self.target == Some(target) {
            self.count += 1;
        } else {
            self.target = Some(target);
            self.count = 1;
            self.first_tap_ms = now_ms;
        }
        if let Some(token) = self.pending.take() {
            scheduler.cancel(token);
        }
        self.pending = Some(scheduler.schedule_after(self.threshold, TimerKind::MultiTap));
        debug!("tap {} on {target:?}", self.count);
    }

    /// Consumes the burst if `token` is the pending flush timer.
    pub fn fire(&mut self, token: TimerToken) -> Option<MultiTapEvent<T>> {
        if self.pending != Some(token) {
            return None;
        }
        self.pending = None;
        let target = self.target.take()?;
        let event = MultiTapEvent {
            target,
            count: std::mem::take(&mut self.count),
            first_tap_ms: self.first_tap_ms,
        };
        debug!("flushing {event:?}");
        Some(event)
    }

    /// Drops the burst in progress without delivering it.
    pub fn cancel<S: Scheduler + ?Sized>(&mut self, scheduler: &mut S) {
        if let Some(token) = self.pending.take() {
            scheduler.cancel(token);
        }
        self.target = None;
        self.count = 0;
    }
}
