mod common;

use chrono::{NaiveDate, Timelike};
use chrono_tz::Tz;
use pilot_watch::face::{
    BATTERY_DIAL, CHRONOGRAPH_HOURS_DIAL, CHRONOGRAPH_SECONDS_DIAL, CHRONOGRAPH_TENTHS_DIAL,
};
use pilot_watch::{
    BackgroundKind, BezelType, ChronographState, DialId, DrawCommand, FaceSettings, PilotWatchFace,
    Point, Raster, Scene, TapKind, TimerKind,
};
use pretty_assertions::assert_eq;
use std::time::Duration;

use common::{running_face, MockHost};

const QUIET_MS: u64 = 600;

fn dial_center(face: &PilotWatchFace, id: DialId) -> Point {
    face.dial(id).unwrap().geometry().center
}

fn tap(face: &mut PilotWatchFace, host: &mut MockHost, id: DialId) {
    let point = dial_center(face, id);
    face.on_tap(TapKind::Tap, point, host);
}

fn rotations(scene: &Scene) -> Vec<f64> {
    scene
        .commands()
        .iter()
        .filter_map(|command| match command {
            DrawCommand::Rotate { degrees, .. } => Some(*degrees),
            _ => None,
        })
        .collect()
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

#[test]
fn taps_take_effect_only_after_the_quiet_period() {
    let mut host = MockHost::new();
    let mut face = running_face(FaceSettings::default(), 400, &mut host);

    tap(&mut face, &mut host, CHRONOGRAPH_TENTHS_DIAL);
    host.advance(&mut face, 499);
    assert_eq!(face.chronograph().state(), ChronographState::Stopped);
    host.advance(&mut face, 1);
    assert!(face.chronograph().is_running());

    // started from the first tap, not from when the burst was delivered
    assert_eq!(face.chronograph().elapsed_ms(host.mono), 500);
}

#[test]
fn double_tap_records_a_lap() {
    let mut host = MockHost::new();
    let mut face = running_face(FaceSettings::default(), 400, &mut host);

    tap(&mut face, &mut host, CHRONOGRAPH_TENTHS_DIAL);
    host.advance(&mut face, QUIET_MS);
    tap(&mut face, &mut host, CHRONOGRAPH_TENTHS_DIAL);
    host.advance(&mut face, 100);
    tap(&mut face, &mut host, CHRONOGRAPH_TENTHS_DIAL);
    host.advance(&mut face, QUIET_MS);

    assert_eq!(face.chronograph().laps(), [QUIET_MS]);
    assert!(face.chronograph().is_running());
}

#[test]
fn reset_waits_for_the_chronograph_to_stop() {
    let mut host = MockHost::new();
    let mut face = running_face(FaceSettings::default(), 400, &mut host);

    tap(&mut face, &mut host, CHRONOGRAPH_TENTHS_DIAL);
    host.advance(&mut face, QUIET_MS);
    tap(&mut face, &mut host, CHRONOGRAPH_HOURS_DIAL);
    host.advance(&mut face, QUIET_MS);
    assert!(face.chronograph().is_running());

    tap(&mut face, &mut host, CHRONOGRAPH_TENTHS_DIAL);
    host.advance(&mut face, QUIET_MS);
    assert_eq!(face.chronograph().state(), ChronographState::Paused);
    assert_eq!(face.chronograph().elapsed_ms(host.mono), 2 * QUIET_MS);

    tap(&mut face, &mut host, CHRONOGRAPH_HOURS_DIAL);
    host.advance(&mut face, QUIET_MS);
    assert_eq!(face.chronograph().state(), ChronographState::Stopped);
    assert_eq!(face.chronograph().elapsed_ms(host.mono), 0);
}

#[test]
fn switching_dials_mid_burst_restarts_the_count() {
    let mut host = MockHost::new();
    let mut face = running_face(FaceSettings::default(), 400, &mut host);

    tap(&mut face, &mut host, CHRONOGRAPH_SECONDS_DIAL);
    tap(&mut face, &mut host, CHRONOGRAPH_SECONDS_DIAL);
    tap(&mut face, &mut host, CHRONOGRAPH_TENTHS_DIAL);
    host.advance(&mut face, QUIET_MS);

    assert!(face.chronograph().is_running());
    assert!(!face.is_demo_mode());
}

#[test]
fn triple_tap_on_the_seconds_dial_toggles_demo_mode() {
    let mut host = MockHost::new();
    let mut face = running_face(FaceSettings::default(), 400, &mut host);

    for _ in 0..3 {
        tap(&mut face, &mut host, CHRONOGRAPH_SECONDS_DIAL);
        host.advance(&mut face, 100);
    }
    host.advance(&mut face, QUIET_MS);
    assert!(face.is_demo_mode());

    let time = face.display_time(&host);
    assert_eq!(
        time.date(),
        NaiveDate::from_ymd_opt(2019, 6, 30).unwrap()
    );
    assert_eq!((time.hour(), time.minute(), time.second()), (10, 10, 32));
}

#[test]
fn demo_toggle_can_be_disabled() {
    let mut host = MockHost::new();
    let settings = FaceSettings::builder().allow_demo_toggle(false).build();
    let mut face = running_face(settings, 400, &mut host);

    for _ in 0..3 {
        tap(&mut face, &mut host, CHRONOGRAPH_SECONDS_DIAL);
    }
    host.advance(&mut face, QUIET_MS);
    assert!(!face.is_demo_mode());
}

#[test]
fn battery_tap_zooms_and_any_tap_returns() {
    let mut host = MockHost::new();
    let mut face = running_face(FaceSettings::default(), 400, &mut host);

    face.on_tap(TapKind::Tap, Point::new(330.0, 200.0), &mut host);
    host.advance(&mut face, QUIET_MS);
    assert!(face.is_zoomed());

    let frame = face.render_frame(&host);
    assert_eq!(frame.background, BackgroundKind::Zoomed);
    let commands = frame.foreground.commands();
    assert_eq!(commands.first(), Some(&DrawCommand::Save));
    assert_eq!(commands.last(), Some(&DrawCommand::Restore));

    face.on_tap(TapKind::Tap, Point::new(5.0, 5.0), &mut host);
    assert!(!face.is_zoomed());
    assert!(!host.has_pending(TimerKind::MultiTap));
}

#[test]
fn touch_phases_other_than_tap_are_ignored() {
    let mut host = MockHost::new();
    let mut face = running_face(FaceSettings::default(), 400, &mut host);
    let point = dial_center(&face, CHRONOGRAPH_TENTHS_DIAL);

    face.on_tap(TapKind::Touch, point, &mut host);
    face.on_tap(TapKind::TouchCancel, point, &mut host);
    assert!(!host.has_pending(TimerKind::MultiTap));
}

#[test]
fn ambient_mode_swaps_the_tick_for_the_slow_refresh() {
    let mut host = MockHost::new();
    let mut face = running_face(FaceSettings::default(), 400, &mut host);
    assert_eq!(host.pending_kinds(), [TimerKind::Tick]);

    face.on_ambient_mode_changed(true, &mut host);
    assert_eq!(host.pending_kinds(), [TimerKind::AmbientRefresh]);
    assert_eq!(face.background_kind(), BackgroundKind::Ambient);

    let before = host.redraws;
    host.advance(&mut face, 10_000);
    assert_eq!(host.redraws, before + 1);
    assert_eq!(host.pending_kinds(), [TimerKind::AmbientRefresh]);

    face.on_ambient_mode_changed(false, &mut host);
    assert_eq!(host.pending_kinds(), [TimerKind::Tick]);
}

#[test]
fn entering_ambient_drops_zoom_and_pending_taps() {
    let mut host = MockHost::new();
    let mut face = running_face(FaceSettings::default(), 400, &mut host);
    face.on_tap(TapKind::Tap, Point::new(330.0, 200.0), &mut host);
    host.advance(&mut face, QUIET_MS);
    assert!(face.is_zoomed());
    face.on_ambient_mode_changed(true, &mut host);
    assert!(!face.is_zoomed());
    face.on_ambient_mode_changed(false, &mut host);

    tap(&mut face, &mut host, CHRONOGRAPH_TENTHS_DIAL);
    assert!(host.has_pending(TimerKind::MultiTap));
    face.on_ambient_mode_changed(true, &mut host);
    assert!(!host.has_pending(TimerKind::MultiTap));
    host.advance(&mut face, QUIET_MS);
    assert_eq!(face.chronograph().state(), ChronographState::Stopped);
}

#[test]
fn hidden_face_schedules_nothing() {
    let mut host = MockHost::new();
    let mut face = running_face(FaceSettings::default(), 400, &mut host);
    face.on_visibility_changed(false, &mut host);
    assert!(host.timers.is_empty());

    face.on_ambient_mode_changed(true, &mut host);
    assert!(host.timers.is_empty());
}

#[test]
fn tick_rate_follows_the_chronograph() {
    let mut host = MockHost::new();
    let mut face = running_face(FaceSettings::default(), 400, &mut host);
    assert_eq!(face.update_rate(), Duration::from_millis(200));
    // host clock sits on a whole second
    assert_eq!(host.timers[0].0, host.mono + 200);

    tap(&mut face, &mut host, CHRONOGRAPH_TENTHS_DIAL);
    host.advance(&mut face, QUIET_MS);
    assert_eq!(face.update_rate(), Duration::from_millis(50));

    let settings = FaceSettings::builder()
        .chronograph_seconds_on_sub_dial(false)
        .build();
    let face = running_face(settings, 400, &mut MockHost::new());
    assert_eq!(face.update_rate(), Duration::from_secs(1));
}

#[test]
fn dial_bounds_stay_on_the_surface() {
    for bezel in [BezelType::None, BezelType::SlideRule, BezelType::Tachymeter] {
        for (width, height) in [(400, 400), (454, 454), (320, 480), (480, 320)] {
            let mut host = MockHost::new();
            let settings = FaceSettings::builder().bezel(bezel).build();
            let mut face = running_face(settings, 400, &mut host);
            face.on_surface_changed(width, height, &mut host);
            for dial in face.dials() {
                let bounds = dial.geometry().bounds;
                assert!(bounds.left >= 0.0 && bounds.top >= 0.0, "{bezel:?} {width}x{height}");
                assert!(
                    bounds.right <= f64::from(width) && bounds.bottom <= f64::from(height),
                    "{bezel:?} {width}x{height}"
                );
            }
        }
    }
}

#[test]
fn surface_change_rebuilds_backgrounds_and_unzooms() {
    let mut host = MockHost::new();
    let mut face = running_face(FaceSettings::default(), 400, &mut host);
    let generation = face.background_generation();
    face.on_tap(TapKind::Tap, Point::new(330.0, 200.0), &mut host);
    host.advance(&mut face, QUIET_MS);
    assert!(face.is_zoomed());

    face.on_surface_changed(454, 454, &mut host);
    assert!(!face.is_zoomed());
    assert!(face.background_generation() > generation);
    assert!(!face.background_scene(BackgroundKind::Interactive).is_empty());

    face.on_properties_changed(true, true, &mut host);
    assert!(face.mode().low_bit && face.mode().burn_in);
    assert!(face.background_generation() > generation + 1);
}

#[test]
fn demo_frame_shows_ten_past_ten() {
    let mut host = MockHost::new();
    let settings = FaceSettings::builder().demo_mode(true).build();
    let face = running_face(settings, 400, &mut host);

    let frame = face.render_frame(&host);
    assert_eq!(frame.background, BackgroundKind::Interactive);
    let angles = rotations(&frame.foreground);
    // chronograph hour, minute, second, tenths, battery, then hour, minute, second
    assert_eq!(angles.len(), 8);
    let hour = 30.0 * (10.0 + (10.0 + 32.0 / 60.0) / 60.0);
    let minute = 6.0 * (10.0 + 32.0 / 60.0);
    assert!(close(angles[5], hour), "{}", angles[5]);
    assert!(close(angles[6], minute), "{}", angles[6]);
    assert!(close(angles[7], 192.0), "{}", angles[7]);
}

#[test]
fn ambient_frame_keeps_only_the_time_and_battery_hands() {
    let mut host = MockHost::new();
    let mut face = running_face(FaceSettings::default(), 400, &mut host);
    face.on_ambient_mode_changed(true, &mut host);

    let frame = face.render_frame(&host);
    assert_eq!(frame.background, BackgroundKind::Ambient);
    assert_eq!(rotations(&frame.foreground).len(), 3);
}

#[test]
fn time_zone_change_moves_the_hour() {
    let mut host = MockHost::new();
    let mut face = running_face(FaceSettings::default(), 400, &mut host);
    assert_eq!(face.display_time(&host).hour(), 8);

    face.on_time_zone_changed(Tz::Asia__Tokyo, &mut host);
    assert_eq!(face.time_zone(), Tz::Asia__Tokyo);
    assert_eq!(face.display_time(&host).hour(), 17);
}

#[test]
fn becoming_visible_picks_up_the_host_time_zone() {
    let mut host = MockHost::new();
    let mut face = running_face(FaceSettings::default(), 400, &mut host);
    face.on_visibility_changed(false, &mut host);
    host.zone = Some(Tz::Asia__Tokyo);
    assert_eq!(face.time_zone(), Tz::UTC);

    face.on_visibility_changed(true, &mut host);
    assert_eq!(face.time_zone(), Tz::Asia__Tokyo);
    assert_eq!(face.display_time(&host).hour(), 17);

    host.zone = None;
    face.on_visibility_changed(false, &mut host);
    face.on_visibility_changed(true, &mut host);
    assert_eq!(face.time_zone(), Tz::Asia__Tokyo);
}

#[test]
fn composed_frame_rasterizes_without_fonts() {
    let mut host = MockHost::new();
    let face = running_face(FaceSettings::default(), 120, &mut host);
    let frame = face.render_frame(&host);
    let scene = face.compose(&frame);

    let mut pixels = vec![0u8; 120 * 120 * 4];
    let mut raster = Raster::new(&mut pixels, 120, 120, None);
    raster.render(&scene);

    let plate = face.settings().palette.background;
    assert_eq!(raster.pixel(2, 2), Some([plate.r, plate.g, plate.b, 0xff]));
    let drawn = (0..120)
        .flat_map(|y| (0..120).map(move |x| (x, y)))
        .filter(|&(x, y)| raster.pixel(x, y) != Some([plate.r, plate.g, plate.b, 0xff]))
        .count();
    assert!(drawn > 500, "only {drawn} pixels differ from the plate");
}

#[test]
fn destroy_cancels_everything() {
    let mut host = MockHost::new();
    let mut face = running_face(FaceSettings::default(), 400, &mut host);
    tap(&mut face, &mut host, CHRONOGRAPH_TENTHS_DIAL);
    assert!(!host.timers.is_empty());

    face.on_destroy(&mut host);
    assert!(host.timers.is_empty());
    assert_eq!(host.wake_releases, 1);
}

#[test]
fn refused_wake_lock_is_not_retried() {
    let mut host = MockHost::new();
    host.wake_denied = true;
    let mut face = running_face(FaceSettings::default(), 400, &mut host);
    for _ in 0..3 {
        tap(&mut face, &mut host, BATTERY_DIAL);
    }
    face.on_ambient_mode_changed(false, &mut host);
    assert_eq!(host.wake_attempts, 1);
}
