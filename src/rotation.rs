//! Pure mappings from clock readings to hand rotation fractions.

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use std::time::Duration;

use crate::geometry::clamp;

/// Sub-dial 3 in demo mode: 10:10:32.650 on the chronograph.
pub const DEMO_CHRONOGRAPH_MS: u64 = 650 + 1000 * (32 + 60 * (10 + 60 * 10));

/// Battery readings outside 0–100 park the hand just off either end of the scale.
pub const BATTERY_LOW_SENTINEL: f64 = -10.0;
pub const BATTERY_HIGH_SENTINEL: f64 = 110.0;

/// Wall-clock second hand resolution when it shares the main dial with the
/// hour and minute hands.
pub const WALL_SECONDS_QUANTUM_MS: u32 = 200;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallClockRotations {
    pub hours: f64,
    pub minutes: f64,
    pub seconds: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChronographRotations {
    /// Fraction of the current second.
    pub tenths: f64,
    pub seconds: f64,
    pub minutes: f64,
    /// Wraps every twelve hours.
    pub hours: f64,
}

/// Rotations for a time of day, with the sub-second part rounded down to a
/// multiple of `quantum_ms` (1000 keeps whole seconds only).
pub fn wall_clock_rotations<T: Timelike>(time: &T, quantum_ms: u32) -> WallClockRotations {
    let quantum = quantum_ms.max(1);
    let millis = (time.nanosecond() / 1_000_000).min(999);
    let millis = millis / quantum * quantum;

    let seconds = f64::from(time.second()) + f64::from(millis) / 1000.0;
    let minutes = f64::from(time.minute()) + seconds / 60.0;
    let hours = f64::from(time.hour() % 12) + minutes / 60.0;
    WallClockRotations {
        hours: hours / 12.0,
        minutes: minutes / 60.0,
        seconds: seconds / 60.0,
    }
}

pub fn chronograph_rotations(elapsed_ms: u64) -> ChronographRotations {
    let fraction = |period: u64| (elapsed_ms % period) as f64 / period as f64;
    ChronographRotations {
        tenths: fraction(1_000),
        seconds: fraction(60_000),
        minutes: fraction(3_600_000),
        hours: fraction(43_200_000),
    }
}

/// `None` means the host could not report a level.
pub fn battery_rotation(percent: Option<f64>) -> f64 {
    let percent = match percent {
        Some(p) if p.is_finite() => p,
        _ => BATTERY_LOW_SENTINEL,
    };
    let percent = if percent < 0.0 {
        BATTERY_LOW_SENTINEL
    } else if percent > 100.0 {
        BATTERY_HIGH_SENTINEL
    } else {
        percent
    };
    clamp(percent, BATTERY_LOW_SENTINEL, BATTERY_HIGH_SENTINEL) / 100.0
}

/// Period of the interactive redraw tick.
pub fn refresh_interval(chronograph_seconds_on_sub_dial: bool, chronograph_running: bool) -> Duration {
    let millis = match (chronograph_running, chronograph_seconds_on_sub_dial) {
        (true, _) => 50,
        // wall seconds sweep on the main dial in 200 ms steps
        (false, true) => 200,
        (false, false) => 1000,
    };
    Duration::from_millis(millis)
}

/// Delay until the next multiple of `interval` on the wall clock.
pub fn aligned_delay(now_ms: u64, interval: Duration) -> Duration {
    let interval_ms = (interval.as_millis() as u64).max(1);
    Duration::from_millis(interval_ms - now_ms % interval_ms)
}

/// Demo wall time: 2019-06-30 10:10:32, keeping the live sub-second part so
/// the second hand still moves.
pub fn demo_time(subsec_nanos: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2019, 6, 30)
        .and_then(|date| date.and_hms_nano_opt(10, 10, 32, subsec_nanos.min(999_999_999)))
        .unwrap_or_default()
}
