//! Services the face borrows from whatever runs it: clocks, timers, the
//! wake lock and the battery gauge.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use log::{debug, error};
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    Unsupported,
    Denied(String),
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostError::Unsupported => write!(f, "not supported by this host"),
            HostError::Denied(reason) => write!(f, "denied: {reason}"),
        }
    }
}

impl std::error::Error for HostError {}

/// What a scheduled callback is for; handed back to the face when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    Tick,
    MultiTap,
    AmbientRefresh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerToken(pub u64);

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
    /// Milliseconds on a clock that never jumps backwards.
    fn monotonic_ms(&self) -> u64;
    /// The host's current zone, re-read whenever the face becomes visible.
    /// `None` keeps whatever zone the face already has.
    fn time_zone(&self) -> Option<Tz> {
        None
    }
}

/// One-shot timers run on the same thread as every other face callback, so
/// a callback never overlaps another.
pub trait Scheduler {
    fn schedule_after(&mut self, delay: Duration, kind: TimerKind) -> TimerToken;
    /// Cancelling an unknown or already-fired token is a no-op.
    fn cancel(&mut self, token: TimerToken);
}

pub trait WakeLock {
    fn acquire(&mut self, timeout: Duration) -> Result<(), HostError>;
    fn release(&mut self);
}

pub trait BatteryMonitor {
    /// Percentage in `0..=100`, or `None` when unknown.
    fn battery_percent(&self) -> Option<f64>;
}

pub trait HostServices: Clock + Scheduler + WakeLock + BatteryMonitor {
    fn request_redraw(&mut self);
}

// ============================================================================
// IDLE GUARD
// ============================================================================

/// Keeps the screen awake for a while after each interaction.
///
/// The first refusal from the host disables the guard for the rest of the
/// session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdleGuard {
    timeout: Duration,
    denied: bool,
    held: bool,
}

impl IdleGuard {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            denied: false,
            held: false,
        }
    }

    pub fn is_denied(&self) -> bool {
        self.denied
    }

    pub fn is_held(&self) -> bool {
        self.held
    }

    pub fn clear_idle<W: WakeLock + ?Sized>(&mut self, lock: &mut W) {
        if self.timeout.is_zero() || self.denied {
            return;
        }
        match lock.acquire(self.timeout) {
            Ok(()) => {
                self.held = true;
                debug!("wake lock held for {:?}", self.timeout);
            }
            Err(err) => {
                self.denied = true;
                self.held = false;
                error!("wake lock unavailable, keeping default idle timeout: {err}");
            }
        }
    }

    pub fn release<W: WakeLock + ?Sized>(&mut self, lock: &mut W) {
        if self.held {
            lock.release();
            self.held = false;
        }
    }
}
