//! Pilot Watch: an analog chronograph watch face.
//!
//! Dials, tick sets and hands are configured once through builders, sized
//! for the surface on every resize, and recorded into retained-mode
//! [`Scene`]s that a [`Raster`] replays into an RGBA frame. The face itself
//! is driven through [`PilotWatchFace`]'s lifecycle callbacks by whatever
//! implements [`HostServices`].

// ============================================================================
// MODULES
// ============================================================================

pub mod bezel;
pub mod chronograph;
pub mod config;
pub mod dial;
pub mod face;
pub mod geometry;
pub mod hand;
pub mod host;
pub mod multitap;
pub mod raster;
pub mod rotation;
pub mod scene;
pub mod text;
pub mod tick;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use bezel::Bezel;
pub use chronograph::{Chronograph, ChronographButton, ChronographState};
pub use config::{BezelType, Color, ConfigError, FaceSettings, Palette, TextDirection, ZoomTarget};
pub use dial::{BorderStyle, DialId, DialLabel, FaceLayout, WatchDial, Zoom};
pub use face::{BackgroundKind, DayDateWindow, Frame, PilotWatchFace, TapKind, TapTarget};
pub use geometry::{Bounds, Point};
pub use hand::{Visibility, WatchHand};
pub use host::{BatteryMonitor, Clock, HostError, HostServices, Scheduler, TimerKind, TimerToken, WakeLock};
pub use multitap::{MultiTap, MultiTapEvent};
pub use raster::{BackgroundCache, Raster};
pub use scene::{DisplayMode, DrawCommand, Scene};
pub use text::{ApproximateMetrics, FontFace, TextMeasure};
pub use tick::{Tick, TickSet};
