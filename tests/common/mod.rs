#![allow(dead_code)]

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use pilot_watch::{
    ApproximateMetrics, BatteryMonitor, Clock, FaceSettings, HostError, HostServices,
    PilotWatchFace, Scheduler, TimerKind, TimerToken, WakeLock,
};
use std::time::Duration;

/// Host with a hand-driven clock. Timers fire only from [`MockHost::advance`].
pub struct MockHost {
    pub now: DateTime<Utc>,
    pub mono: u64,
    pub timers: Vec<(u64, TimerToken, TimerKind)>,
    next_token: u64,
    pub redraws: usize,
    pub battery: Option<f64>,
    pub wake_denied: bool,
    pub wake_attempts: usize,
    pub wake_releases: usize,
    pub zone: Option<Tz>,
}

impl MockHost {
    /// Starts at 2024-03-15 08:30:00 UTC, on a whole second.
    pub fn new() -> Self {
        Self {
            now: Utc.with_ymd_and_hms(2024, 3, 15, 8, 30, 0).unwrap(),
            mono: 1_000,
            timers: Vec::new(),
            next_token: 0,
            redraws: 0,
            battery: Some(75.0),
            wake_denied: false,
            wake_attempts: 0,
            wake_releases: 0,
            zone: None,
        }
    }

    pub fn pending_kinds(&self) -> Vec<TimerKind> {
        let mut timers = self.timers.clone();
        timers.sort_by_key(|(due, token, _)| (*due, *token));
        timers.into_iter().map(|(_, _, kind)| kind).collect()
    }

    pub fn has_pending(&self, kind: TimerKind) -> bool {
        self.timers.iter().any(|(_, _, k)| *k == kind)
    }

    /// Moves both clocks forward by `ms`, firing every timer that falls due
    /// on the way in order.
    pub fn advance(&mut self, face: &mut PilotWatchFace, ms: u64) {
        let end = self.mono + ms;
        loop {
            let next = self
                .timers
                .iter()
                .filter(|(due, _, _)| *due <= end)
                .min_by_key(|(due, token, _)| (*due, *token))
                .copied();
            let Some((due, token, _)) = next else { break };
            self.timers.retain(|(_, t, _)| *t != token);
            self.set_mono(due.max(self.mono));
            face.on_timer(token, self);
        }
        self.set_mono(end);
    }

    fn set_mono(&mut self, mono: u64) {
        let delta = mono - self.mono;
        self.now += TimeDelta::milliseconds(delta as i64);
        self.mono = mono;
    }
}

impl Clock for MockHost {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }

    fn monotonic_ms(&self) -> u64 {
        self.mono
    }

    fn time_zone(&self) -> Option<Tz> {
        self.zone
    }
}

impl Scheduler for MockHost {
    fn schedule_after(&mut self, delay: Duration, kind: TimerKind) -> TimerToken {
        self.next_token += 1;
        let token = TimerToken(self.next_token);
        self.timers.push((self.mono + delay.as_millis() as u64, token, kind));
        token
    }

    fn cancel(&mut self, token: TimerToken) {
        self.timers.retain(|(_, t, _)| *t != token);
    }
}

impl WakeLock for MockHost {
    fn acquire(&mut self, _timeout: Duration) -> Result<(), HostError> {
        self.wake_attempts += 1;
        if self.wake_denied {
            Err(HostError::Denied("permission missing".into()))
        } else {
            Ok(())
        }
    }

    fn release(&mut self) {
        self.wake_releases += 1;
    }
}

impl BatteryMonitor for MockHost {
    fn battery_percent(&self) -> Option<f64> {
        self.battery
    }
}

impl HostServices for MockHost {
    fn request_redraw(&mut self) {
        self.redraws += 1;
    }
}

/// A created, sized and visible face on a `size` x `size` surface.
pub fn running_face(settings: FaceSettings, size: u32, host: &mut MockHost) -> PilotWatchFace {
    let mut face = PilotWatchFace::new(settings, Box::new(ApproximateMetrics)).unwrap();
    face.on_create(host);
    face.on_surface_changed(size, size, host);
    face.on_visibility_changed(true, host);
    face
}
