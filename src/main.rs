use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use log::{debug, info, warn};
use pixels::{Pixels, SurfaceTexture};
use rand::Rng;
use std::env;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use winit::dpi::LogicalSize;
use winit::event::{ElementState, Event, MouseButton, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::Key;
use winit::window::WindowBuilder;

use pilot_watch::{
    ApproximateMetrics, BackgroundCache, BackgroundKind, BatteryMonitor, BezelType, Clock,
    FaceSettings, FontFace, HostError, HostServices, PilotWatchFace, Point, Raster, Scheduler,
    TapKind, TextDirection, TextMeasure, TimerKind, TimerToken, WakeLock,
};

const DEFAULT_SIZE: u32 = 454;
const DEFAULT_FONT: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf";
const DEFAULT_CONDENSED_FONT: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSansCondensed.ttf";

// ============================================================================
// COMMAND LINE
// ============================================================================

struct Options {
    width: u32,
    height: u32,
    font: PathBuf,
    condensed_font: Option<PathBuf>,
    settings: FaceSettings,
    /// Set by `--tz`; otherwise the zone follows `TZ` on every show.
    pinned_zone: bool,
}

fn parse_args() -> anyhow::Result<Options> {
    let mut options = Options {
        width: DEFAULT_SIZE,
        height: DEFAULT_SIZE,
        font: PathBuf::from(DEFAULT_FONT),
        condensed_font: Some(PathBuf::from(DEFAULT_CONDENSED_FONT)),
        settings: FaceSettings::default(),
        pinned_zone: false,
    };
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        let mut value = || args.next().with_context(|| format!("{arg} needs a value"));
        match arg.as_str() {
            "--width" => options.width = value()?.parse().context("--width")?,
            "--height" => options.height = value()?.parse().context("--height")?,
            "--font" => {
                options.font = PathBuf::from(value()?);
                options.condensed_font = None;
            }
            "--condensed-font" => options.condensed_font = Some(PathBuf::from(value()?)),
            "--demo" => options.settings.demo_mode = true,
            "--chrono-seconds-on-main" => options.settings.chronograph_seconds_on_sub_dial = false,
            "--bezel" => {
                options.settings.bezel = match value()?.as_str() {
                    "none" => BezelType::None,
                    "slide-rule" => BezelType::SlideRule,
                    "tachymeter" => BezelType::Tachymeter,
                    other => bail!("unknown bezel {other:?}"),
                }
            }
            "--text" => {
                options.settings.text_direction = match value()?.as_str() {
                    "horizontal" => TextDirection::Horizontal,
                    "tangential" => TextDirection::Tangential,
                    "radial" => TextDirection::Radial,
                    other => bail!("unknown text direction {other:?}"),
                }
            }
            "--tz" => {
                let name = value()?;
                options.settings.time_zone = name
                    .parse::<Tz>()
                    .map_err(|err| anyhow::anyhow!("time zone {name:?}: {err}"))?;
                options.pinned_zone = true;
            }
            other => bail!("unknown argument {other:?}"),
        }
    }
    if options.width == 0 || options.height == 0 {
        bail!("window size must be non-zero");
    }
    Ok(options)
}

// ============================================================================
// DESKTOP HOST
// ============================================================================

/// Host services for a desktop window: timers polled from the event loop, a
/// simulated battery, and no wake lock.
struct DesktopHost {
    pinned_zone: bool,
    start: Instant,
    next_token: u64,
    timers: Vec<(Instant, TimerToken, TimerKind)>,
    redraw: bool,
    battery: f64,
}

impl DesktopHost {
    fn new(pinned_zone: bool) -> Self {
        Self {
            pinned_zone,
            start: Instant::now(),
            next_token: 0,
            timers: Vec::new(),
            redraw: true,
            battery: rand::rng().random_range(40.0..100.0),
        }
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.timers.iter().map(|(due, _, _)| *due).min()
    }

    /// Removes and returns the timers that are due, earliest first.
    fn take_due(&mut self, now: Instant) -> Vec<TimerToken> {
        let (mut due, pending): (Vec<_>, Vec<_>) = self.timers.drain(..).partition(|(at, _, _)| *at <= now);
        self.timers = pending;
        due.sort_by_key(|(at, _, _)| *at);
        due.into_iter()
            .map(|(_, token, kind)| {
                debug!("timer {token:?} ({kind:?}) fired");
                token
            })
            .collect()
    }

    fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.redraw)
    }

    fn drain_battery(&mut self) {
        let mut rng = rand::rng();
        self.battery = (self.battery - rng.random_range(0.0..0.002)).clamp(0.0, 100.0);
    }
}

impl Clock for DesktopHost {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn monotonic_ms(&self) -> u64 {
        u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    fn time_zone(&self) -> Option<Tz> {
        if self.pinned_zone {
            return None;
        }
        let name = env::var("TZ").ok()?;
        match name.trim_start_matches(':').parse() {
            Ok(zone) => Some(zone),
            Err(err) => {
                warn!("ignoring TZ={name:?}: {err}");
                None
            }
        }
    }
}

impl Scheduler for DesktopHost {
    fn schedule_after(&mut self, delay: Duration, kind: TimerKind) -> TimerToken {
        self.next_token += 1;
        let token = TimerToken(self.next_token);
        self.timers.push((Instant::now() + delay, token, kind));
        token
    }

    fn cancel(&mut self, token: TimerToken) {
        self.timers.retain(|(_, t, _)| *t != token);
    }
}

impl WakeLock for DesktopHost {
    fn acquire(&mut self, _timeout: Duration) -> Result<(), HostError> {
        Err(HostError::Unsupported)
    }

    fn release(&mut self) {}
}

impl BatteryMonitor for DesktopHost {
    fn battery_percent(&self) -> Option<f64> {
        Some(self.battery)
    }
}

impl HostServices for DesktopHost {
    fn request_redraw(&mut self) {
        self.redraw = true;
    }
}

// ============================================================================
// MAIN
// ============================================================================

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let options = parse_args()?;

    let fonts = match FontFace::load(&options.font, options.condensed_font.as_deref())
        .or_else(|_| FontFace::load(&options.font, None))
    {
        Ok(fonts) => Some(fonts),
        Err(err) => {
            warn!("{err}; drawing without text");
            None
        }
    };
    let metrics: Box<dyn TextMeasure> = match &fonts {
        Some(fonts) => Box::new(fonts.clone()),
        None => Box::new(ApproximateMetrics),
    };
    let mut face = PilotWatchFace::new(options.settings, metrics)?;
    let mut host = DesktopHost::new(options.pinned_zone);

    let event_loop = EventLoop::new()?;
    let window = WindowBuilder::new()
        .with_title("Pilot Watch")
        .with_inner_size(LogicalSize::new(f64::from(options.width), f64::from(options.height)))
        .build(&event_loop)?;
    let window = std::sync::Arc::new(window);
    let window_clone = window.clone();

    let size = window.inner_size();
    let mut fb_width = size.width;
    let mut fb_height = size.height;
    let mut pixels = {
        let surface_texture = SurfaceTexture::new(size.width, size.height, &window);
        Pixels::new(size.width, size.height, surface_texture)
            .map_err(|err| anyhow::anyhow!("creating the pixel surface: {err}"))?
    };
    let mut backgrounds: BackgroundCache<BackgroundKind> = BackgroundCache::new();
    let mut cursor = Point::ORIGIN;
    let mut ambient = false;
    let mut low_bit = false;
    let mut burn_in = false;

    face.on_create(&mut host);
    face.on_surface_changed(fb_width, fb_height, &mut host);
    face.on_visibility_changed(true, &mut host);
    info!("keys: a = ambient, l = low-bit, b = burn-in protection");

    event_loop.run(move |event, target| match event {
        Event::WindowEvent { event, .. } => match event {
            WindowEvent::CloseRequested => {
                face.on_destroy(&mut host);
                target.exit();
            }
            WindowEvent::Resized(new_size) => {
                if new_size.width == 0 || new_size.height == 0 {
                    face.on_visibility_changed(false, &mut host);
                    return;
                }
                fb_width = new_size.width;
                fb_height = new_size.height;
                if let Err(err) = pixels
                    .resize_surface(fb_width, fb_height)
                    .and_then(|()| pixels.resize_buffer(fb_width, fb_height))
                {
                    warn!("resize to {fb_width}x{fb_height} failed: {err}");
                    return;
                }
                face.on_surface_changed(fb_width, fb_height, &mut host);
                if !face.is_visible() {
                    face.on_visibility_changed(true, &mut host);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                cursor = Point::new(position.x, position.y);
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => face.on_tap(TapKind::Tap, cursor, &mut host),
            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                if let Key::Character(c) = &event.logical_key {
                    match c.as_str() {
                        "a" => {
                            ambient = !ambient;
                            face.on_ambient_mode_changed(ambient, &mut host);
                        }
                        "l" => {
                            low_bit = !low_bit;
                            face.on_properties_changed(low_bit, burn_in, &mut host);
                        }
                        "b" => {
                            burn_in = !burn_in;
                            face.on_properties_changed(low_bit, burn_in, &mut host);
                        }
                        _ => {}
                    }
                }
            }
            WindowEvent::RedrawRequested => {
                let frame = face.render_frame(&host);
                let (width, height) = (fb_width as usize, fb_height as usize);
                let background = backgrounds.frame(
                    frame.background,
                    face.background_generation(),
                    width,
                    height,
                    fonts.as_ref(),
                    || face.background_scene(frame.background).clone(),
                );
                let mut raster = Raster::new(pixels.frame_mut(), width, height, fonts.as_ref());
                raster.blit(background);
                raster.render(&frame.foreground);
                if let Err(err) = pixels.render() {
                    warn!("render failed: {err}");
                    target.exit();
                }
            }
            _ => {}
        },
        Event::AboutToWait => {
            host.drain_battery();
            for token in host.take_due(Instant::now()) {
                face.on_timer(token, &mut host);
            }
            if host.take_redraw() {
                window_clone.request_redraw();
            }
            target.set_control_flow(match host.next_deadline() {
                Some(deadline) => ControlFlow::WaitUntil(deadline),
                None => ControlFlow::Wait,
            });
        }
        _ => {}
    })?;
    Ok(())
}
