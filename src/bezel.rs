use crate::config::{BezelType, Palette, MINIMUM_STROKE_WIDTH_PX};
use crate::dial::{FaceLayout, FLIP_FUDGE_DEGREES};
use crate::geometry::{modulo, polar};
use crate::scene::{DisplayMode, DrawCommand, Scene};

/// Inner edge of the bezel ring as a fraction of the face radius.
pub const BEZEL_INNER_FRACTION: f64 = 0.84;

const COARSE_TICK_LENGTH: f64 = 0.05;
const FINE_TICK_LENGTH: f64 = 0.025;
const LABEL_RADIUS: f64 = 0.895;
const LABEL_SIZE_VMIN: f64 = 0.04;
const COARSE_STROKE_VMIN: f64 = 0.005;
const FINE_STROKE_VMIN: f64 = 0.0025;

const SLIDE_RULE_LABELS: [u32; 11] = [10, 15, 20, 25, 30, 40, 50, 60, 70, 80, 90];
const TACHYMETER_LABELS: [u32; 17] = [
    60, 65, 70, 75, 80, 90, 100, 110, 120, 140, 160, 180, 200, 250, 300, 400, 500,
];

/// Logarithmic scale wrapping once per decade.
pub fn slide_rule_angle(x: f64) -> f64 {
    modulo(x.log10(), 1.0) * 360.0
}

/// Reciprocal scale: speed over a measured distance, with one revolution
/// taking a minute. `None` for non-positive speeds.
pub fn tachymeter_angle(speed: f64) -> Option<f64> {
    (speed > 0.0).then(|| modulo(60.0 / speed, 1.0) * 360.0)
}

/// Tick angles and labels of one bezel scale, in degrees from 12 o'clock.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BezelMarks {
    pub coarse: Vec<f64>,
    pub fine: Vec<f64>,
    pub labels: Vec<(f64, String)>,
}

impl BezelMarks {
    pub fn for_type(kind: BezelType) -> Self {
        match kind {
            BezelType::None => Self::default(),
            BezelType::SlideRule => Self::slide_rule(),
            BezelType::Tachymeter => Self::tachymeter(),
        }
    }

    fn slide_rule() -> Self {
        let coarse = (1u32..=9).map(|x| slide_rule_angle(f64::from(x))).collect();
        let fine = (10u32..100)
            .filter(|tenths| tenths % 10 != 0)
            .map(|tenths| slide_rule_angle(f64::from(tenths) / 10.0))
            .collect();
        let labels = SLIDE_RULE_LABELS
            .iter()
            .map(|&x| (slide_rule_angle(f64::from(x)), x.to_string()))
            .collect();
        Self {
            coarse,
            fine,
            labels,
        }
    }

    fn tachymeter() -> Self {
        let coarse = TACHYMETER_LABELS
            .iter()
            .filter_map(|&x| tachymeter_angle(f64::from(x)))
            .collect();
        let fine = (61u32..100)
            .chain((100..=200).step_by(5))
            .chain((200..=500).step_by(10))
            .filter(|x| !TACHYMETER_LABELS.contains(x))
            .filter_map(|x| tachymeter_angle(f64::from(x)))
            .collect();
        let labels = TACHYMETER_LABELS
            .iter()
            .filter_map(|&x| tachymeter_angle(f64::from(x)).map(|a| (a, x.to_string())))
            .collect();
        Self {
            coarse,
            fine,
            labels,
        }
    }
}

/// Scale ring drawn around a shrunken clock dial.
#[derive(Debug, Clone, PartialEq)]
pub struct Bezel {
    kind: BezelType,
    marks: BezelMarks,
}

impl Bezel {
    pub fn new(kind: BezelType) -> Self {
        Self {
            kind,
            marks: BezelMarks::for_type(kind),
        }
    }

    pub fn kind(&self) -> BezelType {
        self.kind
    }

    pub fn marks(&self) -> &BezelMarks {
        &self.marks
    }

    pub fn draw(&self, scene: &mut Scene, layout: &FaceLayout, mode: DisplayMode, palette: &Palette) {
        if self.kind == BezelType::None {
            return;
        }
        let center = layout.center;
        let radius = layout.dial_radius();
        let stroke = |vmin_fraction: f64| (vmin_fraction * layout.vmin).max(MINIMUM_STROKE_WIDTH_PX);

        let ring = mode.stroke(palette.tick, stroke(FINE_STROKE_VMIN));
        for edge in [1.0, BEZEL_INNER_FRACTION] {
            scene.add_command(DrawCommand::Arc {
                center,
                radius: edge * radius,
                start_deg: 0.0,
                sweep_deg: 360.0,
                paint: ring,
            });
        }

        let mut ticks = vec![(&self.marks.coarse, COARSE_TICK_LENGTH, COARSE_STROKE_VMIN)];
        if !mode.ambient {
            ticks.push((&self.marks.fine, FINE_TICK_LENGTH, FINE_STROKE_VMIN));
        }
        for (angles, length, width) in ticks {
            let paint = mode.stroke(palette.tick, stroke(width));
            for &angle in angles {
                scene.add_command(DrawCommand::Line {
                    from: polar(center, radius, angle),
                    to: polar(center, (1.0 - length) * radius, angle),
                    paint,
                });
            }
        }

        if mode.ambient {
            return;
        }
        let paint = mode.fill(palette.text);
        for (angle, text) in &self.marks.labels {
            let normalized = modulo(*angle, 360.0);
            let flipped = normalized >= 90.0 + FLIP_FUDGE_DEGREES
                && normalized <= 270.0 - FLIP_FUDGE_DEGREES;
            scene.add_command(DrawCommand::CurvedText {
                center,
                radius: LABEL_RADIUS * radius,
                center_deg: *angle,
                text: text.clone(),
                size: LABEL_SIZE_VMIN * layout.vmin,
                flipped,
                paint,
            });
        }
    }
}
