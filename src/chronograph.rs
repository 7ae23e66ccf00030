use log::{debug, warn};

pub const MAX_LAPS: usize = 99;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChronographState {
    #[default]
    Stopped,
    Running {
        started_at_ms: u64,
    },
    Paused,
}

/// The two pushers of a mechanical chronograph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChronographButton {
    /// Start, or pause while running.
    Primary,
    /// Reset; ignored while running.
    Secondary,
}

/// Stopwatch over a monotonic millisecond clock.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chronograph {
    state: ChronographState,
    accumulated_ms: u64,
    laps: Vec<u64>,
}

impl Chronograph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ChronographState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, ChronographState::Running { .. })
    }

    pub fn laps(&self) -> &[u64] {
        &self.laps
    }

    /// Starts from stopped or resumes from paused, keeping time already
    /// accumulated. Returns `false` if already running.
    pub fn start(&mut self, now_ms: u64) -> bool {
        if self.is_running() {
            return false;
        }
        self.state = ChronographState::Running {
            started_at_ms: now_ms,
        };
        debug!("chronograph started at {now_ms} ms ({} ms accumulated)", self.accumulated_ms);
        true
    }

    pub fn pause(&mut self, now_ms: u64) -> bool {
        let ChronographState::Running { started_at_ms } = self.state else {
            return false;
        };
        self.accumulated_ms += now_ms.saturating_sub(started_at_ms);
        self.state = ChronographState::Paused;
        debug!("chronograph paused at {} ms", self.accumulated_ms);
        true
    }

    /// Zeroes the elapsed time and laps. Rejected while running.
    pub fn reset(&mut self) -> bool {
        if self.is_running() {
            warn!("chronograph reset ignored while running");
            return false;
        }
        self.state = ChronographState::Stopped;
        self.accumulated_ms = 0;
        self.laps.clear();
        debug!("chronograph reset");
        true
    }

    pub fn toggle(&mut self, now_ms: u64) -> bool {
        if self.is_running() {
            self.pause(now_ms)
        } else {
            self.start(now_ms)
        }
    }

    pub fn press(&mut self, button: ChronographButton, now_ms: u64) -> bool {
        match button {
            ChronographButton::Primary => self.toggle(now_ms),
            ChronographButton::Secondary => self.reset(),
        }
    }

    /// Records the current elapsed time as a lap while running.
    pub fn lap(&mut self, now_ms: u64) -> Option<u64> {
        if !self.is_running() || self.laps.len() >= MAX_LAPS {
            return None;
        }
        let elapsed = self.elapsed_ms(now_ms);
        self.laps.push(elapsed);
        debug!("lap {} at {elapsed} ms", self.laps.len());
        Some(elapsed)
    }

    pub fn elapsed_ms(&self, now_ms: u64) -> u64 {
        match self.state {
            ChronographState::Running { started_at_ms } => {
                self.accumulated_ms + now_ms.saturating_sub(started_at_ms)
            }
            _ => self.accumulated_ms,
        }
    }
}
