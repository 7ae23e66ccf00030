use bon::bon;

use crate::config::{
    check_angle, check_fraction, Color, ConfigError, Palette, TextDirection,
    BEZEL_CLOCK_DIAL_FRACTION, BOUNDS_PADDING_FRACTION, DEFAULT_TEXT_SIZE_VMIN,
    MINIMUM_STROKE_WIDTH_PX,
};
use crate::geometry::{modulo, polar, Affine, Bounds, Point};
use crate::scene::{DisplayMode, DrawCommand, Scene, TextAlign, Typeface};
use crate::tick::TickSet;

/// Labels within this many degrees of 3 or 9 o'clock are not flipped.
pub const FLIP_FUDGE_DEGREES: f64 = 1.0;

const EDGE_EPSILON: f64 = 1e-9;

// ============================================================================
// FACE LAYOUT
// ============================================================================

/// Surface-level measurements every dial and hand is sized from.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FaceLayout {
    pub width: f64,
    pub height: f64,
    pub center: Point,
    /// Shorter surface side.
    pub vmin: f64,
    /// Whole face, bezel included.
    pub dial_diameter: f64,
    /// The time-of-day dial; smaller than the face when a bezel is drawn.
    pub clock_dial_diameter: f64,
}

impl FaceLayout {
    pub fn new(width: u32, height: u32, with_bezel: bool) -> Self {
        let (width, height) = (f64::from(width), f64::from(height));
        let vmin = width.min(height);
        let dial_diameter = (vmin - MINIMUM_STROKE_WIDTH_PX).max(0.0);
        let clock_dial_diameter = if with_bezel {
            dial_diameter * BEZEL_CLOCK_DIAL_FRACTION
        } else {
            dial_diameter
        };
        Self {
            width,
            height,
            center: Point::new(width / 2.0, height / 2.0),
            vmin,
            dial_diameter,
            clock_dial_diameter,
        }
    }

    pub fn dial_radius(&self) -> f64 {
        self.dial_diameter / 2.0
    }

    pub fn clock_radius(&self) -> f64 {
        self.clock_dial_diameter / 2.0
    }

    /// Outward padding applied once to every computed bounding box.
    pub fn padding(&self) -> f64 {
        self.clock_dial_diameter * BOUNDS_PADDING_FRACTION
    }

    pub fn surface(&self) -> Bounds {
        Bounds::new(0.0, 0.0, self.width, self.height)
    }
}

// ============================================================================
// ANGULAR SPAN
// ============================================================================

/// Angular span of a dial plus its optional tick-free window, both of which
/// are addressed by rotation fraction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sweep {
    pub start_angle: f64,
    pub end_angle: f64,
    pub exclude: Option<(f64, f64)>,
}

impl Sweep {
    pub fn new(start_angle: f64, end_angle: f64, exclude: Option<(f64, f64)>) -> Self {
        Self {
            start_angle,
            end_angle,
            exclude,
        }
    }

    /// Canvas rotation for a rotation fraction: linear, `0 -> start`, `1 -> end`.
    pub fn angle(&self, rotation: f64) -> f64 {
        self.start_angle + (self.end_angle - self.start_angle) * rotation
    }

    pub fn is_full_circle(&self) -> bool {
        (self.end_angle - self.start_angle).abs() >= 360.0
    }

    /// Strictly inside the exclude window.
    pub fn is_excluded(&self, rotation: f64) -> bool {
        self.exclude
            .is_some_and(|(from, to)| rotation > from && rotation < to)
    }

    pub fn is_exclude_edge(&self, rotation: f64) -> bool {
        self.exclude.is_some_and(|(from, to)| {
            (rotation - from).abs() < EDGE_EPSILON || (rotation - to).abs() < EDGE_EPSILON
        })
    }

    /// Arcs covering the span minus the exclude window, as
    /// `(start_deg, sweep_deg)` with non-negative sweeps.
    pub fn arc_segments(&self) -> Vec<(f64, f64)> {
        let ranges = match self.exclude {
            Some((from, to)) => vec![(0.0, from), (to, 1.0)],
            None => vec![(0.0, 1.0)],
        };
        ranges
            .into_iter()
            .map(|(r0, r1)| {
                let (a0, a1) = (self.angle(r0), self.angle(r1));
                (a0.min(a1), (a1 - a0).abs())
            })
            .filter(|&(_, sweep)| sweep > 0.0)
            .collect()
    }

    /// Whether a dial angle (degrees from 12 o'clock) falls on the arc.
    pub fn contains_angle(&self, angle: f64) -> bool {
        if self.is_full_circle() {
            return true;
        }
        let min = self.start_angle.min(self.end_angle);
        let max = self.start_angle.max(self.end_angle);
        min + modulo(angle - min, 360.0) <= max
    }

    /// Tight box around the arc of `radius` about `center`, centre included.
    ///
    /// Extremes of a circular arc occur only at its endpoints or where it
    /// crosses an axis, so only those angles are sampled. An arc shorter than
    /// a full turn crosses at most four axes.
    pub fn bounds(&self, center: Point, radius: f64) -> Bounds {
        if self.is_full_circle() {
            return Bounds::around(center, radius);
        }
        let span = (self.end_angle - self.start_angle).abs();
        let min = modulo(self.start_angle.min(self.end_angle), 360.0);
        let max = min + span;
        let mut bounds = Bounds::at(center);
        bounds.include(polar(center, radius, min));
        bounds.include(polar(center, radius, max));
        let first_axis = (min / 90.0).floor() + 1.0;
        for quadrant in 0..4 {
            let axis = (first_axis + f64::from(quadrant)) * 90.0;
            if axis >= max {
                break;
            }
            bounds.include(polar(center, radius, axis));
        }
        bounds
    }
}

// ============================================================================
// DIAL CONFIGURATION
// ============================================================================

/// Index of a dial inside the face's dial arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DialId(pub usize);

#[derive(Debug, Clone, PartialEq)]
pub struct DialLabel {
    pub rotation: f64,
    pub text: String,
}

impl DialLabel {
    pub fn new(rotation: f64, text: impl Into<String>) -> Self {
        Self {
            rotation,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BorderStyle {
    #[default]
    None,
    Solid,
    /// Upper-left rim dark, lower-right rim light.
    Inset,
    Outset,
}

/// Pixel measurements derived by [`WatchDial::update`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DialGeometry {
    pub center: Point,
    pub radius: f64,
    /// Padded and clipped to the surface.
    pub bounds: Bounds,
    pub vmin: f64,
    pub circle_stroke_px: f64,
}

/// Where and how a label is drawn: rotate the canvas by `rotation` about
/// `anchor`, then draw centred text at `anchor`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelPlacement {
    pub anchor: Point,
    pub rotation: f64,
    pub flipped: bool,
}

/// A circular or arc-bounded scale with its ticks, boundary circles and labels.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchDial {
    diameter: f64,
    center_offset: (f64, f64),
    sweep: Sweep,
    circles: Vec<f64>,
    circle_stroke_width: f64,
    labels: Vec<DialLabel>,
    text_size: f64,
    text_radius: f64,
    text_direction: TextDirection,
    dark_opacity: f64,
    border: BorderStyle,
    tick_sets: Vec<TickSet>,
    non_ambient_only: bool,
    shadow_offset: (f64, f64),
    geometry: DialGeometry,
}

#[bon]
impl WatchDial {
    /// `diameter` is a fraction of the clock dial radius and `center_offset`
    /// a fraction of the clock dial diameter. Tick sets are drawn coarsest
    /// first regardless of the order given.
    #[builder]
    pub fn new(
        #[builder(default = 0.5)] diameter: f64,
        #[builder(default = (0.0, 0.0))] center_offset: (f64, f64),
        #[builder(default = 0.0)] start_angle: f64,
        #[builder(default = 360.0)] end_angle: f64,
        exclude: Option<(f64, f64)>,
        #[builder(default)] circles: Vec<f64>,
        #[builder(default = 0.0)] circle_stroke_width: f64,
        #[builder(default)] labels: Vec<DialLabel>,
        #[builder(default = DEFAULT_TEXT_SIZE_VMIN)] text_size: f64,
        #[builder(default = 0.6)] text_radius: f64,
        #[builder(default)] text_direction: TextDirection,
        #[builder(default = 0.0)] dark_opacity: f64,
        #[builder(default)] border: BorderStyle,
        #[builder(default)] tick_sets: Vec<TickSet>,
        #[builder(default)] non_ambient_only: bool,
        #[builder(default = (0.0, 1.0))] shadow_offset: (f64, f64),
    ) -> Result<Self, ConfigError> {
        check_fraction("diameter", diameter)?;
        check_angle("center_offset.x", center_offset.0)?;
        check_angle("center_offset.y", center_offset.1)?;
        check_angle("start_angle", start_angle)?;
        check_angle("end_angle", end_angle)?;
        if (end_angle - start_angle).abs() > 360.0 {
            return Err(ConfigError::SweepTooWide {
                start: start_angle,
                end: end_angle,
            });
        }
        if let Some((from, to)) = exclude {
            if !(0.0..=1.0).contains(&from) || !(0.0..=1.0).contains(&to) || from > to {
                return Err(ConfigError::InvalidExcludeRange { from, to });
            }
        }
        if circles.len() > 2 {
            return Err(ConfigError::TooManyCircles(circles.len()));
        }
        for &circle in &circles {
            check_fraction("circles", circle)?;
        }
        check_fraction("circle_stroke_width", circle_stroke_width)?;
        check_fraction("text_size", text_size)?;
        check_fraction("text_radius", text_radius)?;
        check_fraction("dark_opacity", dark_opacity)?;
        let mut tick_sets = tick_sets;
        tick_sets.sort_by_key(TickSet::count);

        Ok(Self {
            diameter,
            center_offset,
            sweep: Sweep::new(start_angle, end_angle, exclude),
            circles,
            circle_stroke_width,
            labels,
            text_size,
            text_radius,
            text_direction,
            dark_opacity,
            border,
            tick_sets,
            non_ambient_only,
            shadow_offset,
            geometry: DialGeometry::default(),
        })
    }
}

impl WatchDial {
    pub fn sweep(&self) -> &Sweep {
        &self.sweep
    }

    pub fn geometry(&self) -> &DialGeometry {
        &self.geometry
    }

    pub fn tick_sets(&self) -> &[TickSet] {
        &self.tick_sets
    }

    pub fn labels(&self) -> &[DialLabel] {
        &self.labels
    }

    pub fn is_non_ambient_only(&self) -> bool {
        self.non_ambient_only
    }

    pub fn is_excluded(&self, rotation: f64) -> bool {
        self.sweep.is_excluded(rotation)
    }

    pub fn canvas_angle(&self, rotation: f64) -> f64 {
        self.sweep.angle(rotation)
    }

    /// Recomputes pixel centre, radius and bounds for a new surface.
    pub fn update(&mut self, layout: &FaceLayout) -> &DialGeometry {
        let radius = self.diameter * layout.clock_radius();
        let center = layout.center.offset(
            self.center_offset.0 * layout.clock_dial_diameter,
            self.center_offset.1 * layout.clock_dial_diameter,
        );
        let bounds = self
            .sweep
            .bounds(center, radius)
            .padded_within(layout.padding(), layout.width, layout.height);
        self.geometry = DialGeometry {
            center,
            radius,
            bounds,
            vmin: layout.vmin,
            circle_stroke_px: self.circle_stroke_px(layout.vmin),
        };
        &self.geometry
    }

    // Falls back to the first tick set with a stroke when no circle stroke is set.
    fn circle_stroke_px(&self, vmin: f64) -> f64 {
        let width = if self.circle_stroke_width != 0.0 {
            self.circle_stroke_width
        } else {
            match self.tick_sets.iter().find(|t| t.stroke_width() != 0.0) {
                Some(set) => set.stroke_width(),
                None => return 0.0,
            }
        };
        (width * vmin).max(MINIMUM_STROKE_WIDTH_PX)
    }

    /// Hit test in surface pixels. The centre always hits; arc dials also
    /// require the point's angle to fall on the arc.
    pub fn contains(&self, point: Point) -> bool {
        let DialGeometry { center, radius, .. } = self.geometry;
        let (dx, dy) = (point.x - center.x, point.y - center.y);
        if dx == 0.0 && dy == 0.0 {
            return true;
        }
        if !self.sweep.is_full_circle() {
            let angle = dx.atan2(-dy).to_degrees();
            if !self.sweep.contains_angle(angle) {
                return false;
            }
        }
        dx * dx + dy * dy <= radius * radius
    }

    pub fn label_placement(&self, rotation: f64, center: Point) -> LabelPlacement {
        let angle = self.canvas_angle(rotation);
        let anchor = polar(center, self.geometry.radius * self.text_radius, angle);
        let normalized = modulo(angle, 360.0);
        let flips = normalized >= 90.0 + FLIP_FUDGE_DEGREES
            && normalized <= 270.0 - FLIP_FUDGE_DEGREES;
        let (rotation, flipped) = match self.text_direction {
            TextDirection::Horizontal => (0.0, false),
            TextDirection::Tangential => (angle, flips),
            TextDirection::Radial => (angle - 90.0, flips),
        };
        LabelPlacement {
            anchor,
            rotation: if flipped { rotation + 180.0 } else { rotation },
            flipped,
        }
    }

    /// Scale and translation that magnify this dial's bounds onto the surface.
    pub fn zoom(&self, layout: &FaceLayout) -> Option<Zoom> {
        zoom_transform(&self.geometry.bounds, layout)
    }

    // ------------------------------------------------------------------------
    // drawing
    // ------------------------------------------------------------------------

    pub fn draw(&self, scene: &mut Scene, mode: DisplayMode, palette: &Palette) {
        if mode.ambient && self.non_ambient_only {
            return;
        }
        if !mode.ambient && self.dark_opacity > 0.0 {
            scene.add_command(DrawCommand::Circle {
                center: self.geometry.center,
                radius: self.geometry.radius,
                paint: mode.fill(Color::BLACK.with_opacity(self.dark_opacity)),
            });
        }
        self.draw_border(scene, mode, palette);

        let (dx, dy) = self.shadow_offset;
        if !mode.ambient && (dx != 0.0 || dy != 0.0) {
            let center = self.geometry.center.offset(dx, dy);
            self.draw_ticks(scene, mode, center, palette.shadow);
            self.draw_circles(scene, mode, center, palette.shadow);
            self.draw_labels(scene, mode, center, palette.shadow);
        }
        let center = self.geometry.center;
        self.draw_ticks(scene, mode, center, palette.tick);
        self.draw_circles(scene, mode, center, palette.tick);
        self.draw_labels(scene, mode, center, palette.text);
    }

    fn draw_ticks(&self, scene: &mut Scene, mode: DisplayMode, center: Point, color: Color) {
        let radius = self.geometry.radius;
        let extend = self.geometry.circle_stroke_px / 2.0;
        for set in &self.tick_sets {
            let (outer, inner) = set.diameters(mode.ambient);
            let paint = mode.stroke(color, set.stroke_px(mode.ambient, self.geometry.vmin));
            for tick in set.ticks(&self.sweep, mode.ambient) {
                let extra = if tick.extended { extend } else { 0.0 };
                scene.add_command(DrawCommand::Line {
                    from: polar(center, outer * radius + extra, tick.angle),
                    to: polar(center, inner * radius - extra, tick.angle),
                    paint,
                });
            }
        }
    }

    fn draw_circles(&self, scene: &mut Scene, mode: DisplayMode, center: Point, color: Color) {
        let stroke = self.geometry.circle_stroke_px;
        if stroke == 0.0 {
            return;
        }
        let paint = mode.stroke(color, stroke);
        for &diameter in &self.circles {
            if diameter == 0.0 {
                continue;
            }
            for (start_deg, sweep_deg) in self.sweep.arc_segments() {
                scene.add_command(DrawCommand::Arc {
                    center,
                    radius: diameter * self.geometry.radius,
                    start_deg,
                    sweep_deg,
                    paint,
                });
            }
        }
    }

    fn draw_labels(&self, scene: &mut Scene, mode: DisplayMode, center: Point, color: Color) {
        let size = self.text_size * self.geometry.vmin;
        let paint = mode.fill(color);
        for label in self.labels.iter().filter(|l| !self.is_excluded(l.rotation)) {
            let placement = self.label_placement(label.rotation, center);
            let rotated = placement.rotation != 0.0;
            if rotated {
                scene.add_command(DrawCommand::Save);
                scene.add_command(DrawCommand::Rotate {
                    degrees: placement.rotation,
                    pivot: placement.anchor,
                });
            }
            scene.add_command(DrawCommand::Text {
                text: label.text.clone(),
                anchor: placement.anchor,
                size,
                align: TextAlign::Center,
                typeface: Typeface::Regular,
                paint,
            });
            if rotated {
                scene.add_command(DrawCommand::Restore);
            }
        }
    }

    fn draw_border(&self, scene: &mut Scene, mode: DisplayMode, palette: &Palette) {
        let width = (2.0 * self.geometry.circle_stroke_px).max(MINIMUM_STROKE_WIDTH_PX);
        let dark = Color::BLACK.with_opacity(0.6);
        let light = Color::WHITE.with_opacity(0.6);
        let halves = match self.border {
            BorderStyle::None => return,
            BorderStyle::Solid => {
                scene.add_command(DrawCommand::Arc {
                    center: self.geometry.center,
                    radius: self.geometry.radius,
                    start_deg: 0.0,
                    sweep_deg: 360.0,
                    paint: mode.stroke(palette.tick, width),
                });
                return;
            }
            BorderStyle::Inset => [(225.0, dark), (45.0, light)],
            BorderStyle::Outset => [(225.0, light), (45.0, dark)],
        };
        for (start_deg, color) in halves {
            scene.add_command(DrawCommand::Arc {
                center: self.geometry.center,
                radius: self.geometry.radius,
                start_deg,
                sweep_deg: 180.0,
                paint: mode.stroke(color, width),
            });
        }
    }
}

// ============================================================================
// ZOOM
// ============================================================================

/// Canvas operations that magnify a region: scale by `factor` about the
/// surface centre, then translate by `(dx, dy)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Zoom {
    pub factor: f64,
    pub pivot: Point,
    pub dx: f64,
    pub dy: f64,
}

impl Zoom {
    pub fn affine(&self) -> Affine {
        Affine::scale_about(self.factor, self.pivot).then_local(&Affine::translate(self.dx, self.dy))
    }

    pub fn apply_to(&self, scene: &mut Scene) {
        scene.add_command(DrawCommand::Scale {
            factor: self.factor,
            pivot: self.pivot,
        });
        scene.add_command(DrawCommand::Translate {
            dx: self.dx,
            dy: self.dy,
        });
    }
}

/// Zoom that fits `bounds` (already padded) to the surface with its centre
/// on the surface centre. `None` for an empty box.
pub fn zoom_transform(bounds: &Bounds, layout: &FaceLayout) -> Option<Zoom> {
    if bounds.width() <= 0.0 || bounds.height() <= 0.0 {
        return None;
    }
    let factor = (layout.width / bounds.width()).min(layout.height / bounds.height());
    let target = bounds.center();
    Some(Zoom {
        factor,
        pivot: layout.center,
        dx: -(target.x - layout.center.x),
        dy: -(target.y - layout.center.y),
    })
}
