use crate::config::Color;
use crate::geometry::{Affine, Path, Point};

// ============================================================================
// PAINTS
// ============================================================================

/// Blurred drop shadow drawn underneath a filled shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shadow {
    pub radius: f64,
    pub dx: f64,
    pub dy: f64,
    pub color: Color,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paint {
    pub color: Color,
    /// Stroke width in local units; ignored by fills.
    pub stroke_width: f64,
    pub anti_alias: bool,
    pub shadow: Option<Shadow>,
}

impl Paint {
    pub fn fill(color: Color) -> Self {
        Self {
            color,
            stroke_width: 0.0,
            anti_alias: true,
            shadow: None,
        }
    }

    pub fn stroke(color: Color, width: f64) -> Self {
        Self {
            stroke_width: width,
            ..Self::fill(color)
        }
    }

    pub fn with_shadow(self, shadow: Shadow) -> Self {
        Self {
            shadow: Some(shadow),
            ..self
        }
    }

    pub fn anti_aliased(self, anti_alias: bool) -> Self {
        Self { anti_alias, ..self }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Typeface {
    #[default]
    Regular,
    Condensed,
}

/// Display state every draw routine consults when choosing paints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisplayMode {
    pub ambient: bool,
    pub low_bit: bool,
    pub burn_in: bool,
}

impl DisplayMode {
    pub const INTERACTIVE: DisplayMode = DisplayMode {
        ambient: false,
        low_bit: false,
        burn_in: false,
    };

    /// Ambient mode paints everything white on black.
    pub fn color(&self, color: Color) -> Color {
        if self.ambient {
            Color::WHITE
        } else {
            color
        }
    }

    pub fn anti_alias(&self) -> bool {
        !(self.ambient && self.low_bit)
    }

    pub fn fill(&self, color: Color) -> Paint {
        Paint::fill(self.color(color)).anti_aliased(self.anti_alias())
    }

    pub fn stroke(&self, color: Color, width: f64) -> Paint {
        Paint::stroke(self.color(color), width).anti_aliased(self.anti_alias())
    }
}

// ============================================================================
// RETAINED MODE ABSTRACTIONS
// ============================================================================

/// One recorded canvas operation. Angles use dial convention: 0° is
/// 12 o'clock and positive sweeps run clockwise.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear(Color),
    Save,
    Restore,
    Rotate {
        degrees: f64,
        pivot: Point,
    },
    Scale {
        factor: f64,
        pivot: Point,
    },
    Translate {
        dx: f64,
        dy: f64,
    },
    Line {
        from: Point,
        to: Point,
        paint: Paint,
    },
    /// Stroked arc of a circle, butt-capped.
    Arc {
        center: Point,
        radius: f64,
        start_deg: f64,
        sweep_deg: f64,
        paint: Paint,
    },
    /// Filled disc.
    Circle {
        center: Point,
        radius: f64,
        paint: Paint,
    },
    Path {
        path: Path,
        paint: Paint,
    },
    /// Single line of text whose ink is vertically centred on `anchor.y`.
    Text {
        text: String,
        anchor: Point,
        size: f64,
        align: TextAlign,
        typeface: Typeface,
        paint: Paint,
    },
    /// Text laid along a circle, centred on `center_deg`. Flipped text runs
    /// counter-clockwise so it reads upright at the bottom of the dial.
    CurvedText {
        center: Point,
        radius: f64,
        center_deg: f64,
        text: String,
        size: f64,
        flipped: bool,
        paint: Paint,
    },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scene {
    commands: Vec<DrawCommand>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_command(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    pub fn extend(&mut self, other: &Scene) {
        self.commands.extend(other.commands.iter().cloned());
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Current transform after replaying every save/restore and transform
    /// command; unbalanced restores are ignored.
    pub fn final_transform(&self) -> Affine {
        let mut current = Affine::IDENTITY;
        let mut stack = Vec::new();
        for command in &self.commands {
            match command {
                DrawCommand::Save => stack.push(current),
                DrawCommand::Restore => {
                    if let Some(saved) = stack.pop() {
                        current = saved;
                    }
                }
                other => {
                    if let Some(local) = local_transform(other) {
                        current = current.then_local(&local);
                    }
                }
            }
        }
        current
    }
}

/// Matrix a transform command concatenates onto the current canvas matrix.
pub fn local_transform(command: &DrawCommand) -> Option<Affine> {
    match *command {
        DrawCommand::Rotate { degrees, pivot } => Some(Affine::rotate_about(degrees, pivot)),
        DrawCommand::Scale { factor, pivot } => Some(Affine::scale_about(factor, pivot)),
        DrawCommand::Translate { dx, dy } => Some(Affine::translate(dx, dy)),
        _ => None,
    }
}
