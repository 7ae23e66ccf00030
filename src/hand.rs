use bon::bon;

use crate::config::{check_angle, check_fraction, Color, ConfigError};
use crate::dial::{DialId, FaceLayout, WatchDial};
use crate::geometry::{Path, Point, Shape};
use crate::scene::{DisplayMode, DrawCommand, Paint, Scene, Shadow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Always,
    NonAmbientOnly,
    AmbientOnly,
}

impl Visibility {
    fn shows(self, ambient: bool) -> bool {
        match self {
            Visibility::Always => true,
            Visibility::NonAmbientOnly => !ambient,
            Visibility::AmbientOnly => ambient,
        }
    }
}

/// A pointer anchored at the centre of one dial.
///
/// The outline is built once per resize in dial-local pixels (origin at the
/// dial centre, pointing at 12 o'clock) and only rotated per frame.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchHand {
    dial: DialId,
    color: Color,
    length: f64,
    length_behind: f64,
    width: f64,
    arrow_head: bool,
    arrow_angle: f64,
    arrow_size: f64,
    shroud_radius: f64,
    hole_radius: f64,
    shadow_radius: f64,
    visibility: Visibility,
    path: Path,
}

#[bon]
impl WatchHand {
    /// `length` and `length_behind` are fractions of the dial radius, `width`
    /// a fraction of the clock dial diameter, and the hub and hole radii
    /// fractions of the clock dial radius. `shadow_radius` is in pixels.
    #[builder]
    pub fn new(
        dial: DialId,
        color: Color,
        #[builder(default = 1.0)] length: f64,
        #[builder(default = 0.0)] length_behind: f64,
        #[builder(default = 0.005)] width: f64,
        #[builder(default)] arrow_head: bool,
        #[builder(default = 45.0)] arrow_angle: f64,
        #[builder(default = 3.0)] arrow_size: f64,
        #[builder(default = 0.03)] shroud_radius: f64,
        #[builder(default = 0.01)] hole_radius: f64,
        #[builder(default = 0.0)] shadow_radius: f64,
        #[builder(default)] visibility: Visibility,
    ) -> Result<Self, ConfigError> {
        check_fraction("length", length)?;
        check_fraction("length_behind", length_behind)?;
        check_fraction("width", width)?;
        check_angle("arrow_angle", arrow_angle)?;
        if arrow_angle <= 0.0 || arrow_angle >= 180.0 {
            return Err(ConfigError::ArrowAngleOutOfRange(arrow_angle));
        }
        check_fraction("arrow_size", arrow_size)?;
        check_fraction("shroud_radius", shroud_radius)?;
        check_fraction("hole_radius", hole_radius)?;
        check_fraction("shadow_radius", shadow_radius)?;
        Ok(Self {
            dial,
            color,
            length,
            length_behind,
            width,
            arrow_head,
            arrow_angle,
            arrow_size,
            shroud_radius,
            hole_radius,
            shadow_radius,
            visibility,
            path: Path::new(),
        })
    }
}

impl WatchHand {
    pub fn dial(&self) -> DialId {
        self.dial
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rebuilds the outline for the dial's current geometry.
    pub fn update(&mut self, dial: &WatchDial, layout: &FaceLayout) {
        let radius = dial.geometry().radius;
        let length = self.length * radius;
        let behind = self.length_behind * radius;
        let width = self.width * layout.clock_dial_diameter;
        let hub = (self.shroud_radius * layout.clock_radius()).max(width);
        let hole = self.hole_radius * layout.clock_radius();

        let (left, right) = (-width / 2.0, width / 2.0);
        let (top, bottom) = (-length, behind);
        let half_tan = (self.arrow_angle.to_radians() / 2.0).tan();

        let outline = if self.arrow_head {
            let half_head = width * self.arrow_size / 2.0;
            let base = top + half_head / half_tan;
            vec![
                Point::new(left, bottom),
                Point::new(left, base),
                Point::new(-half_head, base),
                Point::new(0.0, top),
                Point::new(half_head, base),
                Point::new(right, base),
                Point::new(right, bottom),
            ]
        } else {
            let tip = width / 2.0 / half_tan;
            vec![
                Point::new(left, bottom),
                Point::new(left, top + tip),
                Point::new(0.0, top),
                Point::new(right, top + tip),
                Point::new(right, bottom),
            ]
        };

        self.path = Path::new()
            .union(Shape::Polygon(outline))
            .union(Shape::Circle {
                center: Point::ORIGIN,
                radius: hub,
            })
            .difference(Shape::Circle {
                center: Point::ORIGIN,
                radius: hole,
            });
    }

    pub fn is_visible(&self, dial: &WatchDial, mode: DisplayMode) -> bool {
        if mode.ambient && dial.is_non_ambient_only() {
            return false;
        }
        self.visibility.shows(mode.ambient)
    }

    fn paint(&self, mode: DisplayMode, shadow: Color) -> Paint {
        let paint = mode.fill(self.color);
        if mode.ambient || self.shadow_radius == 0.0 {
            paint
        } else {
            paint.with_shadow(Shadow {
                radius: self.shadow_radius,
                dx: 0.0,
                dy: 0.0,
                color: shadow,
            })
        }
    }

    /// Stencils the outline rotated to `rotation` along the dial's sweep.
    pub fn draw(
        &self,
        scene: &mut Scene,
        dial: &WatchDial,
        rotation: f64,
        mode: DisplayMode,
        shadow: Color,
    ) {
        if !self.is_visible(dial, mode) {
            return;
        }
        let center = dial.geometry().center;
        scene.add_command(DrawCommand::Save);
        scene.add_command(DrawCommand::Translate {
            dx: center.x,
            dy: center.y,
        });
        scene.add_command(DrawCommand::Rotate {
            degrees: dial.canvas_angle(rotation),
            pivot: Point::ORIGIN,
        });
        scene.add_command(DrawCommand::Path {
            path: self.path.clone(),
            paint: self.paint(mode, shadow),
        });
        scene.add_command(DrawCommand::Restore);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Bounds;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    fn main_dial(layout: &FaceLayout) -> WatchDial {
        let mut dial = WatchDial::builder().diameter(1.0).build().unwrap();
        dial.update(layout);
        dial
    }

    #[test]
    fn pointed_hand_outline() {
        let layout = FaceLayout::new(401, 401, false);
        let dial = main_dial(&layout);
        let mut hand = WatchHand::builder()
            .dial(DialId(0))
            .color(Color::WHITE)
            .length(0.95)
            .length_behind(0.25)
            .width(0.01)
            .build()
            .unwrap();
        hand.update(&dial, &layout);

        // radius 200, width 4 px, hub max(6, 4), hole 2
        let bounds = hand.path().bounds().unwrap();
        assert!(close(bounds.top, -190.0));
        assert!(close(bounds.bottom, 50.0));
        assert!(close(bounds.left, -6.0) && close(bounds.right, 6.0));
        assert!(!hand.path().contains(Point::ORIGIN));
        assert!(hand.path().contains(Point::new(0.0, 4.0)));
        assert!(hand.path().contains(Point::new(0.0, -189.0)));
        assert!(!hand.path().contains(Point::new(1.9, -189.5)));
    }

    #[test]
    fn arrow_head_is_wider_than_the_shaft() {
        let layout = FaceLayout::new(401, 401, false);
        let dial = main_dial(&layout);
        let mut hand = WatchHand::builder()
            .dial(DialId(0))
            .color(Color::WHITE)
            .length(0.9)
            .width(0.02)
            .arrow_head(true)
            .build()
            .unwrap();
        hand.update(&dial, &layout);

        // width 8 px, head half-width 12 px, apex at -180
        let half_tan = (22.5f64).to_radians().tan();
        let base = -180.0 + 12.0 / half_tan;
        assert!(hand.path().contains(Point::new(10.0, base - 0.5)));
        assert!(!hand.path().contains(Point::new(10.0, base + 0.5)));
        assert!(hand.path().contains(Point::new(3.5, -60.0)));
        assert!(!hand.path().contains(Point::new(10.0, -60.0)));
        let Bounds { left, right, .. } = hand.path().bounds().unwrap();
        assert!(close(left, -12.0) && close(right, 12.0));
    }

    #[test]
    fn non_ambient_hands_and_dials_hide_in_ambient() {
        let layout = FaceLayout::new(200, 200, false);
        let dial = main_dial(&layout);
        let hand = WatchHand::builder()
            .dial(DialId(0))
            .color(Color::WHITE)
            .visibility(Visibility::NonAmbientOnly)
            .build()
            .unwrap();
        let ambient = DisplayMode {
            ambient: true,
            ..DisplayMode::INTERACTIVE
        };
        assert!(hand.is_visible(&dial, DisplayMode::INTERACTIVE));
        assert!(!hand.is_visible(&dial, ambient));

        let mut scene = Scene::new();
        hand.draw(&mut scene, &dial, 0.5, ambient, Color::BLACK);
        assert!(scene.is_empty());
        hand.draw(&mut scene, &dial, 0.5, DisplayMode::INTERACTIVE, Color::BLACK);
        assert_eq!(scene.len(), 5);
    }
}
