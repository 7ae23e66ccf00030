use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use chrono_tz::Tz;
use log::{debug, info};
use std::time::Duration;

use crate::bezel::Bezel;
use crate::chronograph::{Chronograph, ChronographButton};
use crate::config::{
    BezelType, Color, ConfigError, FaceSettings, Palette, TextDirection, ZoomTarget,
    DEFAULT_TEXT_SIZE_VMIN,
};
use crate::dial::{zoom_transform, DialId, DialLabel, FaceLayout, WatchDial, Zoom};
use crate::geometry::{Bounds, Path, Point, Shape};
use crate::hand::{Visibility, WatchHand};
use crate::host::{HostServices, IdleGuard, TimerKind, TimerToken};
use crate::multitap::{MultiTap, MultiTapEvent};
use crate::rotation::{
    aligned_delay, battery_rotation, chronograph_rotations, demo_time, refresh_interval,
    wall_clock_rotations, DEMO_CHRONOGRAPH_MS, WALL_SECONDS_QUANTUM_MS,
};
use crate::scene::{DisplayMode, DrawCommand, Paint, Scene, Shadow, TextAlign, Typeface};
use crate::text::TextMeasure;
use crate::tick::TickSet;

pub const MAIN_DIAL: DialId = DialId(0);
/// Sub-dial 1, top: chronograph tenths of a second.
pub const CHRONOGRAPH_TENTHS_DIAL: DialId = DialId(1);
/// Sub-dial 2, left: chronograph minutes and hours.
pub const CHRONOGRAPH_HOURS_DIAL: DialId = DialId(2);
/// Sub-dial 3, bottom: chronograph seconds.
pub const CHRONOGRAPH_SECONDS_DIAL: DialId = DialId(3);
/// Sub-dial 4, right: battery gauge.
pub const BATTERY_DIAL: DialId = DialId(4);

const SUB_DIAL_DIAMETER: f64 = 0.35;
const SUB_DIAL_OFFSET: f64 = 0.26;
const SUB_DIAL_DARK_OPACITY: f64 = 0.2;
const CIRCLE_STROKE_VMIN: f64 = 0.0025;

const DAY_DATE_TEXT_SIZE_VMIN: f64 = 0.07;
const DAY_DATE_OUTER: f64 = 0.88;
const NAME_TEXT_SIZE_VMIN: f64 = 0.04;
const NAME_OFFSET: f64 = 0.26;
const BACKGROUND_SHADOW_RADIUS: f64 = 2.0;

// ============================================================================
// PUBLIC TYPES
// ============================================================================

/// Dials that react to taps, in hit-test order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TapTarget {
    ChronographTenths,
    ChronographHours,
    ChronographSeconds,
    Battery,
}

impl TapTarget {
    const ALL: [TapTarget; 4] = [
        TapTarget::ChronographTenths,
        TapTarget::ChronographHours,
        TapTarget::ChronographSeconds,
        TapTarget::Battery,
    ];

    pub fn dial(self) -> DialId {
        match self {
            TapTarget::ChronographTenths => CHRONOGRAPH_TENTHS_DIAL,
            TapTarget::ChronographHours => CHRONOGRAPH_HOURS_DIAL,
            TapTarget::ChronographSeconds => CHRONOGRAPH_SECONDS_DIAL,
            TapTarget::Battery => BATTERY_DIAL,
        }
    }
}

/// Phase of a touch as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapKind {
    Touch,
    TouchCancel,
    Tap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackgroundKind {
    Interactive,
    Zoomed,
    Ambient,
}

/// One redraw: a cached background plus the hands and date drawn over it.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub background: BackgroundKind,
    pub foreground: Scene,
}

/// Day-of-week and day-of-month windows cut out of the dial plate.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DayDateWindow {
    pub day: Bounds,
    pub date: Bounds,
    pub text_size: f64,
}

impl DayDateWindow {
    /// Windows sized for the widest weekday abbreviation and the widest day
    /// of the month.
    pub fn new(layout: &FaceLayout, metrics: &dyn TextMeasure) -> Self {
        let text_size = layout.vmin * DAY_DATE_TEXT_SIZE_VMIN;
        let max_day = WEEKDAYS
            .iter()
            .map(|day| metrics.measure(&weekday_label(*day), text_size, Typeface::Condensed).width)
            .fold(0.0, f64::max);
        let max_date = (1..=31)
            .map(|date: u32| metrics.measure(&date.to_string(), text_size, Typeface::Regular).width)
            .fold(0.0, f64::max);

        let diameter = layout.clock_dial_diameter;
        let date_right = layout.center.x + layout.clock_radius() * DAY_DATE_OUTER;
        let date_left = date_right - max_date - diameter * 0.02;
        let day_right = date_left - diameter * 0.01;
        let day_left = day_right - max_day - diameter * 0.02;
        let top = layout.center.y - text_size * 0.5;
        let bottom = layout.center.y + text_size * 0.5;
        Self {
            day: Bounds::new(day_left, top, day_right, bottom),
            date: Bounds::new(date_left, top, date_right, bottom),
            text_size,
        }
    }

    /// Both windows together, padded and kept on the surface.
    pub fn bounds(&self, layout: &FaceLayout) -> Bounds {
        let mut bounds = self.day;
        bounds.include(Point::new(self.date.right, self.date.bottom));
        bounds.include(Point::new(self.date.left, self.date.top));
        bounds.padded_within(layout.padding(), layout.width, layout.height)
    }
}

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

fn weekday_label(day: Weekday) -> String {
    day.to_string().to_uppercase()
}

// ============================================================================
// STANDARD DIALS AND HANDS
// ============================================================================

fn tick_set(count: u32, outer: f64, inner: f64, stroke: f64, exclude: &[u32]) -> Result<TickSet, ConfigError> {
    TickSet::builder()
        .count(count)
        .outer_diameter(outer)
        .inner_diameter(inner)
        .stroke_width(stroke)
        .exclude_counts(exclude.to_vec())
        .build()
}

fn chronograph_sub_dial(
    center_offset: (f64, f64),
    labels: &[(f64, &str)],
    coarse: u32,
    fine: u32,
    direction: TextDirection,
) -> Result<WatchDial, ConfigError> {
    WatchDial::builder()
        .diameter(SUB_DIAL_DIAMETER)
        .center_offset(center_offset)
        .circles(vec![1.0, 0.9])
        .circle_stroke_width(CIRCLE_STROKE_VMIN)
        .dark_opacity(SUB_DIAL_DARK_OPACITY)
        .labels(labels.iter().map(|(r, text)| DialLabel::new(*r, *text)).collect())
        .text_direction(direction)
        .tick_sets(vec![
            tick_set(coarse, 1.0, 0.8, 0.005, &[])?,
            tick_set(fine, 1.0, 0.9, 0.0025, &[coarse])?,
        ])
        .build()
}

/// Main dial followed by sub-dials 1 to 4, indexed by the `*_DIAL` ids.
fn standard_dials(direction: TextDirection) -> Result<Vec<WatchDial>, ConfigError> {
    let main = WatchDial::builder()
        .diameter(1.0)
        .circles(vec![1.0, 0.97])
        .circle_stroke_width(CIRCLE_STROKE_VMIN)
        .text_direction(direction)
        .tick_sets(vec![
            tick_set(12, 0.97, 0.91, 0.02, &[])?,
            tick_set(60, 1.0, 0.94, 0.005, &[])?,
            tick_set(300, 1.0, 0.97, 0.0025, &[60])?,
        ])
        .build()?;

    let tenths = chronograph_sub_dial(
        (0.0, -SUB_DIAL_OFFSET),
        &[(0.0, "0"), (0.2, "2"), (0.4, "4"), (0.6, "6"), (0.8, "8")],
        10,
        50,
        direction,
    )?;
    let hours = chronograph_sub_dial(
        (-SUB_DIAL_OFFSET, 0.0),
        &[(0.0, "12"), (0.25, "3"), (0.5, "6"), (0.75, "9")],
        12,
        60,
        direction,
    )?;
    let seconds = chronograph_sub_dial(
        (0.0, SUB_DIAL_OFFSET),
        &[(0.0, "60"), (0.25, "15"), (0.5, "30"), (0.75, "45")],
        12,
        60,
        direction,
    )?;

    let battery = WatchDial::builder()
        .diameter(0.6)
        .center_offset((0.125, 0.0))
        .start_angle(150.0)
        .end_angle(30.0)
        .exclude((0.4, 0.6))
        .circles(vec![1.0, 0.92])
        .circle_stroke_width(CIRCLE_STROKE_VMIN)
        .labels(vec![DialLabel::new(0.0, "0%"), DialLabel::new(1.0, "100%")])
        .text_size(0.8 * DEFAULT_TEXT_SIZE_VMIN)
        .text_direction(direction)
        .tick_sets(vec![
            tick_set(2, 1.0, 0.8, 0.01, &[])?,
            tick_set(10, 1.0, 0.86, 0.005, &[2])?,
            tick_set(20, 1.0, 0.92, 0.0025, &[2, 10])?,
        ])
        .build()?;

    Ok(vec![main, tenths, hours, seconds, battery])
}

#[derive(Debug, Clone)]
struct Hands {
    hour: WatchHand,
    minute: WatchHand,
    second: WatchHand,
    battery: WatchHand,
    chronograph_hour: WatchHand,
    chronograph_minute: WatchHand,
    chronograph_second: WatchHand,
    chronograph_tenths: WatchHand,
}

impl Hands {
    fn standard(palette: &Palette) -> Result<Self, ConfigError> {
        let chronograph_seconds = |dial: DialId| {
            WatchHand::builder()
                .dial(dial)
                .color(palette.second_hand)
                .length(0.9)
                .length_behind(0.225)
                .width(0.01)
                .shadow_radius(2.0)
                .visibility(Visibility::NonAmbientOnly)
                .build()
        };
        Ok(Self {
            hour: WatchHand::builder()
                .dial(MAIN_DIAL)
                .color(palette.hour_hand)
                .arrow_head(true)
                .length(0.9 * 0.6)
                .width(0.02)
                .shadow_radius(4.0)
                .build()?,
            minute: WatchHand::builder()
                .dial(MAIN_DIAL)
                .color(palette.minute_hand)
                .arrow_head(true)
                .length(0.9)
                .width(0.02)
                .shadow_radius(5.0)
                .build()?,
            second: WatchHand::builder()
                .dial(MAIN_DIAL)
                .color(palette.second_hand)
                .length(0.95)
                .length_behind(0.25)
                .width(0.01)
                .shadow_radius(6.0)
                .visibility(Visibility::NonAmbientOnly)
                .build()?,
            battery: WatchHand::builder()
                .dial(BATTERY_DIAL)
                .color(palette.second_hand)
                .arrow_head(true)
                .length(0.9)
                .length_behind(0.225)
                .width(0.01)
                .shadow_radius(2.0)
                .build()?,
            chronograph_hour: WatchHand::builder()
                .dial(CHRONOGRAPH_HOURS_DIAL)
                .color(palette.hour_hand)
                .arrow_head(true)
                .length(0.8 * 0.6)
                .width(0.01)
                .shadow_radius(2.0)
                .visibility(Visibility::NonAmbientOnly)
                .build()?,
            chronograph_minute: WatchHand::builder()
                .dial(CHRONOGRAPH_HOURS_DIAL)
                .color(palette.minute_hand)
                .arrow_head(true)
                .length(0.8)
                .width(0.01)
                .shadow_radius(3.0)
                .visibility(Visibility::NonAmbientOnly)
                .build()?,
            chronograph_second: chronograph_seconds(CHRONOGRAPH_SECONDS_DIAL)?,
            chronograph_tenths: chronograph_seconds(CHRONOGRAPH_TENTHS_DIAL)?,
        })
    }

    fn iter_mut(&mut self) -> impl Iterator<Item = &mut WatchHand> {
        [
            &mut self.hour,
            &mut self.minute,
            &mut self.second,
            &mut self.battery,
            &mut self.chronograph_hour,
            &mut self.chronograph_minute,
            &mut self.chronograph_second,
            &mut self.chronograph_tenths,
        ]
        .into_iter()
    }
}

#[derive(Debug, Clone, Default)]
struct Backgrounds {
    interactive: Scene,
    zoomed: Scene,
    ambient: Scene,
}

// ============================================================================
// WATCH FACE
// ============================================================================

/// The complete face: dials, hands, chronograph, and the host callbacks that
/// drive them.
pub struct PilotWatchFace {
    settings: FaceSettings,
    metrics: Box<dyn TextMeasure>,
    dials: Vec<WatchDial>,
    hands: Hands,
    bezel: Bezel,
    layout: FaceLayout,
    window: DayDateWindow,
    mode: DisplayMode,
    visible: bool,
    zoomed: bool,
    demo_mode: bool,
    time_zone: Tz,
    chronograph: Chronograph,
    multi_tap: MultiTap<TapTarget>,
    idle: IdleGuard,
    tick_timer: Option<TimerToken>,
    ambient_timer: Option<TimerToken>,
    backgrounds: Backgrounds,
    generation: u64,
}

impl PilotWatchFace {
    pub fn new(settings: FaceSettings, metrics: Box<dyn TextMeasure>) -> Result<Self, ConfigError> {
        let dials = standard_dials(settings.text_direction)?;
        let hands = Hands::standard(&settings.palette)?;
        Ok(Self {
            dials,
            hands,
            bezel: Bezel::new(settings.bezel),
            layout: FaceLayout::default(),
            window: DayDateWindow::default(),
            mode: DisplayMode::INTERACTIVE,
            visible: false,
            zoomed: false,
            demo_mode: settings.demo_mode,
            time_zone: settings.time_zone,
            chronograph: Chronograph::new(),
            multi_tap: MultiTap::new(settings.multi_tap_threshold),
            idle: IdleGuard::new(settings.custom_timeout),
            tick_timer: None,
            ambient_timer: None,
            backgrounds: Backgrounds::default(),
            generation: 0,
            metrics,
            settings,
        })
    }

    // ------------------------------------------------------------------------
    // accessors
    // ------------------------------------------------------------------------

    pub fn settings(&self) -> &FaceSettings {
        &self.settings
    }

    pub fn layout(&self) -> &FaceLayout {
        &self.layout
    }

    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    pub fn dials(&self) -> &[WatchDial] {
        &self.dials
    }

    pub fn dial(&self, id: DialId) -> Option<&WatchDial> {
        self.dials.get(id.0)
    }

    pub fn day_date_window(&self) -> &DayDateWindow {
        &self.window
    }

    pub fn chronograph(&self) -> &Chronograph {
        &self.chronograph
    }

    pub fn is_zoomed(&self) -> bool {
        self.zoomed
    }

    pub fn is_demo_mode(&self) -> bool {
        self.demo_mode
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn time_zone(&self) -> Tz {
        self.time_zone
    }

    /// Bumped whenever the background scenes are re-recorded.
    pub fn background_generation(&self) -> u64 {
        self.generation
    }

    pub fn update_rate(&self) -> Duration {
        refresh_interval(
            self.settings.chronograph_seconds_on_sub_dial,
            self.chronograph.is_running(),
        )
    }

    /// Transform applied to the whole face while zoomed in.
    pub fn zoom(&self) -> Option<Zoom> {
        match self.settings.zoom_target {
            ZoomTarget::DayDateWindow => zoom_transform(&self.window.bounds(&self.layout), &self.layout),
            ZoomTarget::BatteryDial => self.dial(BATTERY_DIAL).and_then(|d| d.zoom(&self.layout)),
        }
    }

    /// First sub-dial under `point`, checked top, left, bottom, then right.
    pub fn hit_test(&self, point: Point) -> Option<TapTarget> {
        TapTarget::ALL
            .into_iter()
            .find(|target| self.dial(target.dial()).is_some_and(|d| d.contains(point)))
    }

    // ------------------------------------------------------------------------
    // lifecycle
    // ------------------------------------------------------------------------

    pub fn on_create<H: HostServices + ?Sized>(&mut self, host: &mut H) {
        info!(
            "pilot watch face created (bezel {:?}, demo {})",
            self.settings.bezel, self.demo_mode
        );
        self.idle.clear_idle(host);
    }

    pub fn on_surface_changed<H: HostServices + ?Sized>(&mut self, width: u32, height: u32, host: &mut H) {
        self.zoomed = false;
        self.layout = FaceLayout::new(width, height, self.settings.bezel != BezelType::None);
        self.update_geometry();
        self.window = DayDateWindow::new(&self.layout, self.metrics.as_ref());
        self.rebuild_backgrounds();
        debug!(
            "surface {width}x{height}: clock dial {:.1} px, day/date window {:?}",
            self.layout.clock_dial_diameter, self.window
        );
        if !self.mode.ambient {
            self.idle.clear_idle(host);
        }
        host.request_redraw();
    }

    pub fn on_ambient_mode_changed<H: HostServices + ?Sized>(&mut self, ambient: bool, host: &mut H) {
        info!("ambient mode {}", if ambient { "on" } else { "off" });
        self.mode.ambient = ambient;
        if ambient {
            self.zoomed = false;
            self.multi_tap.cancel(host);
        }
        self.update_geometry();
        self.update_timer(host);
        if !ambient {
            self.idle.clear_idle(host);
        }
    }

    pub fn on_properties_changed<H: HostServices + ?Sized>(&mut self, low_bit: bool, burn_in: bool, host: &mut H) {
        debug!("display properties: low-bit {low_bit}, burn-in protection {burn_in}");
        self.mode.low_bit = low_bit;
        self.mode.burn_in = burn_in;
        self.multi_tap.cancel(host);
        self.rebuild_backgrounds();
        host.request_redraw();
    }

    pub fn on_visibility_changed<H: HostServices + ?Sized>(&mut self, visible: bool, host: &mut H) {
        info!("face {}", if visible { "visible" } else { "hidden" });
        self.visible = visible;
        if visible {
            if let Some(time_zone) = host.time_zone().filter(|tz| *tz != self.time_zone) {
                info!("time zone changed to {time_zone}");
                self.time_zone = time_zone;
            }
        } else {
            self.multi_tap.cancel(host);
        }
        self.update_timer(host);
    }

    pub fn on_time_zone_changed<H: HostServices + ?Sized>(&mut self, time_zone: Tz, host: &mut H) {
        info!("time zone changed to {time_zone}");
        self.time_zone = time_zone;
        host.request_redraw();
    }

    pub fn on_tap<H: HostServices + ?Sized>(&mut self, kind: TapKind, point: Point, host: &mut H) {
        if kind != TapKind::Tap {
            return;
        }
        if self.zoomed {
            debug!("tap at ({:.0}, {:.0}) leaves zoom", point.x, point.y);
            self.zoomed = false;
            self.multi_tap.cancel(host);
        } else if let Some(target) = self.hit_test(point) {
            self.multi_tap.on_tap(target, host.monotonic_ms(), host);
        }
        host.request_redraw();
        if !self.mode.ambient {
            self.idle.clear_idle(host);
        }
    }

    /// Dispatches a fired timer. Tokens the face no longer tracks are ignored.
    pub fn on_timer<H: HostServices + ?Sized>(&mut self, token: TimerToken, host: &mut H) {
        if self.tick_timer == Some(token) {
            self.tick_timer = None;
            host.request_redraw();
            if self.should_tick() {
                self.schedule_tick(host);
            }
        } else if self.ambient_timer == Some(token) {
            self.ambient_timer = None;
            host.request_redraw();
            self.schedule_ambient_refresh(host);
        } else if let Some(event) = self.multi_tap.fire(token) {
            self.apply_taps(event);
            host.request_redraw();
            self.update_timer(host);
        }
    }

    pub fn on_destroy<H: HostServices + ?Sized>(&mut self, host: &mut H) {
        for token in [self.tick_timer.take(), self.ambient_timer.take()].into_iter().flatten() {
            host.cancel(token);
        }
        self.multi_tap.cancel(host);
        self.idle.release(host);
        info!("pilot watch face destroyed");
    }

    // ------------------------------------------------------------------------
    // commands
    // ------------------------------------------------------------------------

    fn apply_taps(&mut self, event: MultiTapEvent<TapTarget>) {
        let now = event.first_tap_ms;
        match (event.target, event.count) {
            (TapTarget::ChronographTenths, 1) => {
                self.chronograph.press(ChronographButton::Primary, now);
            }
            (TapTarget::ChronographTenths, _) => {
                if self.chronograph.lap(now).is_none() {
                    debug!("lap ignored: chronograph not running or lap list full");
                }
            }
            (TapTarget::ChronographHours, _) => {
                self.chronograph.press(ChronographButton::Secondary, now);
            }
            (TapTarget::ChronographSeconds, count) => {
                if count >= 3 && self.settings.allow_demo_toggle {
                    self.demo_mode = !self.demo_mode;
                    info!("demo mode {}", if self.demo_mode { "on" } else { "off" });
                }
            }
            (TapTarget::Battery, _) => {
                self.zoomed = !self.mode.ambient && self.zoom().is_some();
            }
        }
    }

    fn should_tick(&self) -> bool {
        self.visible && !self.mode.ambient
    }

    /// Restarts the interactive tick, or the ambient refresh, for the
    /// current state.
    fn update_timer<H: HostServices + ?Sized>(&mut self, host: &mut H) {
        if let Some(token) = self.tick_timer.take() {
            host.cancel(token);
        }
        if let Some(token) = self.ambient_timer.take() {
            host.cancel(token);
        }
        if self.should_tick() {
            host.request_redraw();
            self.schedule_tick(host);
        } else if self.visible && self.mode.ambient {
            host.request_redraw();
            self.schedule_ambient_refresh(host);
        }
    }

    fn schedule_tick<H: HostServices + ?Sized>(&mut self, host: &mut H) {
        let now_ms = u64::try_from(host.now().timestamp_millis()).unwrap_or(0);
        let delay = aligned_delay(now_ms, self.update_rate());
        self.tick_timer = Some(host.schedule_after(delay, TimerKind::Tick));
    }

    fn schedule_ambient_refresh<H: HostServices + ?Sized>(&mut self, host: &mut H) {
        if !(self.visible && self.mode.ambient) {
            return;
        }
        if let Some(period) = self.settings.ambient_refresh {
            self.ambient_timer = Some(host.schedule_after(period, TimerKind::AmbientRefresh));
        }
    }

    fn update_geometry(&mut self) {
        for dial in &mut self.dials {
            dial.update(&self.layout);
        }
        for hand in self.hands.iter_mut() {
            if let Some(dial) = self.dials.get(hand.dial().0) {
                hand.update(dial, &self.layout);
            }
        }
    }

    // ------------------------------------------------------------------------
    // rendering
    // ------------------------------------------------------------------------

    fn rebuild_backgrounds(&mut self) {
        let interactive = DisplayMode {
            ambient: false,
            ..self.mode
        };
        let ambient = DisplayMode {
            ambient: true,
            ..self.mode
        };
        self.backgrounds = Backgrounds {
            interactive: self.record_background(interactive, None),
            zoomed: self.record_background(interactive, self.zoom()),
            ambient: self.record_background(ambient, None),
        };
        self.generation += 1;
    }

    pub fn background_scene(&self, kind: BackgroundKind) -> &Scene {
        match kind {
            BackgroundKind::Interactive => &self.backgrounds.interactive,
            BackgroundKind::Zoomed => &self.backgrounds.zoomed,
            BackgroundKind::Ambient => &self.backgrounds.ambient,
        }
    }

    pub fn background_kind(&self) -> BackgroundKind {
        if self.mode.ambient {
            BackgroundKind::Ambient
        } else if self.zoomed {
            BackgroundKind::Zoomed
        } else {
            BackgroundKind::Interactive
        }
    }

    /// Background and foreground in a single scene.
    pub fn compose(&self, frame: &Frame) -> Scene {
        let mut scene = self.background_scene(frame.background).clone();
        scene.extend(&frame.foreground);
        scene
    }

    fn record_background(&self, mode: DisplayMode, zoom: Option<Zoom>) -> Scene {
        let mut scene = Scene::new();
        // the day and date windows show through the plate
        scene.add_command(DrawCommand::Clear(Color::WHITE));
        if let Some(zoom) = zoom {
            scene.add_command(DrawCommand::Save);
            zoom.apply_to(&mut scene);
        }
        self.draw_clock_dial(&mut scene, mode);
        for dial in &self.dials {
            dial.draw(&mut scene, mode, &self.settings.palette);
        }
        self.bezel.draw(&mut scene, &self.layout, mode, &self.settings.palette);
        if zoom.is_some() {
            scene.add_command(DrawCommand::Restore);
        }
        scene
    }

    fn draw_clock_dial(&self, scene: &mut Scene, mode: DisplayMode) {
        let palette = &self.settings.palette;
        let plate = Path::new()
            .union(Shape::Rect(self.layout.surface()))
            .difference(Shape::Rect(self.window.day))
            .difference(Shape::Rect(self.window.date));
        let paint = if mode.ambient {
            Paint::fill(Color::BLACK).anti_aliased(mode.anti_alias())
        } else {
            Paint::fill(palette.background).with_shadow(Shadow {
                radius: BACKGROUND_SHADOW_RADIUS,
                dx: 0.0,
                dy: 0.0,
                color: palette.shadow,
            })
        };
        scene.add_command(DrawCommand::Path { path: plate, paint });

        if mode.burn_in {
            return;
        }
        if !mode.ambient {
            self.draw_name(scene, mode, 1.0, palette.shadow);
        }
        self.draw_name(scene, mode, 0.0, palette.tick);
    }

    fn draw_name(&self, scene: &mut Scene, mode: DisplayMode, dy: f64, color: Color) {
        let size = NAME_TEXT_SIZE_VMIN * self.layout.vmin;
        let offset = NAME_OFFSET * self.layout.clock_dial_diameter;
        let x = self.layout.center.x - offset;
        let top = self.layout.center.y - offset - 0.5 * size;
        for (i, line) in self.settings.name_lines.iter().enumerate() {
            scene.add_command(DrawCommand::Text {
                text: line.clone(),
                anchor: Point::new(x, top + i as f64 * size + dy),
                size,
                align: TextAlign::Center,
                typeface: Typeface::Regular,
                paint: mode.fill(color),
            });
        }
    }

    /// Wall time to display: live in the face's time zone, or the pinned
    /// demo reading.
    pub fn display_time<H: HostServices + ?Sized>(&self, host: &H) -> NaiveDateTime {
        let local = host.now().with_timezone(&self.time_zone).naive_local();
        if self.demo_mode {
            demo_time(local.nanosecond())
        } else {
            local
        }
    }

    pub fn render_frame<H: HostServices + ?Sized>(&self, host: &H) -> Frame {
        let time = self.display_time(host);
        let elapsed = if self.demo_mode {
            DEMO_CHRONOGRAPH_MS
        } else {
            self.chronograph.elapsed_ms(host.monotonic_ms())
        };
        let seconds_on_sub_dial = self.settings.chronograph_seconds_on_sub_dial;
        let quantum = if seconds_on_sub_dial {
            WALL_SECONDS_QUANTUM_MS
        } else {
            1000
        };
        let wall = wall_clock_rotations(&time, quantum);
        let chrono = chronograph_rotations(elapsed);
        let (main_seconds, sub_dial_seconds) = if seconds_on_sub_dial {
            (wall.seconds, chrono.seconds)
        } else {
            (chrono.seconds, wall.seconds)
        };

        let mut scene = Scene::new();
        let zoom = if self.zoomed && !self.mode.ambient {
            self.zoom()
        } else {
            None
        };
        if let Some(zoom) = zoom {
            scene.add_command(DrawCommand::Save);
            zoom.apply_to(&mut scene);
        }

        self.draw_date(&mut scene, &time);
        if !self.mode.ambient {
            self.draw_hand(&mut scene, &self.hands.chronograph_hour, chrono.hours);
            self.draw_hand(&mut scene, &self.hands.chronograph_minute, chrono.minutes);
            self.draw_hand(&mut scene, &self.hands.chronograph_second, sub_dial_seconds);
            self.draw_hand(&mut scene, &self.hands.chronograph_tenths, chrono.tenths);
        }
        self.draw_hand(&mut scene, &self.hands.battery, battery_rotation(host.battery_percent()));
        self.draw_hand(&mut scene, &self.hands.hour, wall.hours);
        self.draw_hand(&mut scene, &self.hands.minute, wall.minutes);
        self.draw_hand(&mut scene, &self.hands.second, main_seconds);

        if zoom.is_some() {
            scene.add_command(DrawCommand::Restore);
        }
        Frame {
            background: self.background_kind(),
            foreground: scene,
        }
    }

    fn draw_hand(&self, scene: &mut Scene, hand: &WatchHand, rotation: f64) {
        if let Some(dial) = self.dial(hand.dial()) {
            hand.draw(scene, dial, rotation, self.mode, self.settings.palette.shadow);
        }
    }

    fn draw_date(&self, scene: &mut Scene, time: &NaiveDateTime) {
        let paint = Paint::fill(self.settings.palette.window_text).anti_aliased(self.mode.anti_alias());
        let entries = [
            (weekday_label(time.weekday()), self.window.day, Typeface::Condensed),
            (time.day().to_string(), self.window.date, Typeface::Regular),
        ];
        for (text, window, typeface) in entries {
            scene.add_command(DrawCommand::Text {
                text,
                anchor: window.center(),
                size: self.window.text_size,
                align: TextAlign::Center,
                typeface,
                paint,
            });
        }
    }
}
