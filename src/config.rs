use bon::Builder;
use chrono_tz::Tz;
use std::fmt;
use std::time::Duration;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Strokes thinner than this vanish on a real display, so every stroke is floored to it.
pub const MINIMUM_STROKE_WIDTH_PX: f64 = 1.0;

/// Default dial label size, as a fraction of the shorter surface side.
pub const DEFAULT_TEXT_SIZE_VMIN: f64 = 0.05;

/// Bounding boxes (dials, day/date window) grow by this fraction of the clock dial diameter.
pub const BOUNDS_PADDING_FRACTION: f64 = 0.02;

/// Clock dial diameter relative to the whole face when a bezel ring is drawn.
pub const BEZEL_CLOCK_DIAL_FRACTION: f64 = 0.82;

// ============================================================================
// COLORS
// ============================================================================

/// RGBA color used by every paint in a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0x00, 0x00, 0x00);
    pub const WHITE: Color = Color::new(0xff, 0xff, 0xff);
    pub const TRANSPARENT: Color = Color::new(0x00, 0x00, 0x00).with_alpha(0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xff }
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Alpha from an opacity in `[0, 1]`; out-of-range input is clamped.
    pub fn with_opacity(self, opacity: f64) -> Self {
        self.with_alpha((255.0 * opacity.clamp(0.0, 1.0)).round() as u8)
    }

    pub const fn as_tuple(self) -> (u8, u8, u8) {
        (self.r, self.g, self.b)
    }
}

#[derive(Debug, Clone, Builder)]
pub struct Palette {
    #[builder(default = Color::new(0x1c, 0x1f, 0x24))]
    pub background: Color,
    #[builder(default = Color::new(0xf4, 0xf4, 0xf0))]
    pub hour_hand: Color,
    #[builder(default = Color::new(0xf4, 0xf4, 0xf0))]
    pub minute_hand: Color,
    #[builder(default = Color::new(0xff, 0x80, 0x00))]
    pub second_hand: Color,
    #[builder(default = Color::new(0xe8, 0xe8, 0xe0))]
    pub tick: Color,
    #[builder(default = Color::new(0xe8, 0xe8, 0xe0))]
    pub text: Color,
    #[builder(default = Color::BLACK)]
    pub shadow: Color,
    #[builder(default = Color::BLACK)]
    pub window_text: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self::builder().build()
    }
}

// ============================================================================
// FACE SETTINGS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BezelType {
    #[default]
    None,
    SlideRule,
    Tachymeter,
}

/// How dial labels are oriented relative to their angular position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextDirection {
    /// Always upright.
    #[default]
    Horizontal,
    /// Along the tick circle.
    Tangential,
    /// Along the radius.
    Radial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZoomTarget {
    #[default]
    DayDateWindow,
    BatteryDial,
}

#[derive(Debug, Clone, Builder)]
pub struct FaceSettings {
    /// Pin the wall clock and chronograph to a fixed, photogenic reading.
    #[builder(default = false)]
    pub demo_mode: bool,
    /// Wall-clock seconds on the main dial, chronograph seconds on the bottom
    /// sub-dial. `false` swaps them.
    #[builder(default = true)]
    pub chronograph_seconds_on_sub_dial: bool,
    #[builder(default)]
    pub bezel: BezelType,
    #[builder(default)]
    pub text_direction: TextDirection,
    /// Wake-lock duration after user interaction; zero disables the wake lock.
    #[builder(default = Duration::from_secs(15))]
    pub custom_timeout: Duration,
    /// Self-scheduled redraw period in ambient mode.
    #[builder(required, default = Some(Duration::from_secs(10)))]
    pub ambient_refresh: Option<Duration>,
    #[builder(default = Duration::from_millis(500))]
    pub multi_tap_threshold: Duration,
    #[builder(default)]
    pub zoom_target: ZoomTarget,
    #[builder(default = true)]
    pub allow_demo_toggle: bool,
    #[builder(default = vec!["PILOT".to_string(), "WATCH".to_string(), "3000".to_string()])]
    pub name_lines: Vec<String>,
    #[builder(default = Tz::UTC)]
    pub time_zone: Tz,
    #[builder(default)]
    pub palette: Palette,
}

impl Default for FaceSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

// ============================================================================
// ERRORS
// ============================================================================

/// Rejected dial, tick-set or hand configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    ZeroTickCount,
    InvalidFraction { field: &'static str, value: f64 },
    InvalidExcludeRange { from: f64, to: f64 },
    TooManyCircles(usize),
    NonFiniteAngle { field: &'static str, value: f64 },
    ArrowAngleOutOfRange(f64),
    SweepTooWide { start: f64, end: f64 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroTickCount => write!(f, "tick set must have at least one tick"),
            ConfigError::InvalidFraction { field, value } => {
                write!(f, "{field} must be a finite, non-negative fraction (got {value})")
            }
            ConfigError::InvalidExcludeRange { from, to } => write!(
                f,
                "exclude range must satisfy 0 <= from <= to <= 1 (got {from}..{to})"
            ),
            ConfigError::TooManyCircles(n) => {
                write!(f, "a dial has at most two boundary circles (got {n})")
            }
            ConfigError::NonFiniteAngle { field, value } => {
                write!(f, "{field} must be a finite angle (got {value})")
            }
            ConfigError::ArrowAngleOutOfRange(angle) => {
                write!(f, "arrow angle must lie strictly between 0 and 180 degrees (got {angle})")
            }
            ConfigError::SweepTooWide { start, end } => {
                write!(f, "a dial sweeps at most 360 degrees (got {start}..{end})")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

pub(crate) fn check_fraction(field: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidFraction { field, value })
    }
}

pub(crate) fn check_angle(field: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::NonFiniteAngle { field, value })
    }
}
