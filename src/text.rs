use rusttype::{point, Font, PositionedGlyph, Scale};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::scene::Typeface;

/// Ink box of a laid-out string, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextBounds {
    pub width: f64,
    pub height: f64,
}

pub trait TextMeasure {
    fn measure(&self, text: &str, size: f64, typeface: Typeface) -> TextBounds;
}

/// Font-free metrics: fixed advance per character, cap height for every line.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproximateMetrics;

impl TextMeasure for ApproximateMetrics {
    fn measure(&self, text: &str, size: f64, typeface: Typeface) -> TextBounds {
        let advance = match typeface {
            Typeface::Regular => 0.6,
            Typeface::Condensed => 0.5,
        };
        let chars = text.chars().count() as f64;
        TextBounds {
            width: chars * advance * size,
            height: if chars > 0.0 { 0.7 * size } else { 0.0 },
        }
    }
}

#[derive(Debug)]
pub enum FontError {
    Io { path: PathBuf, source: std::io::Error },
    Unparseable(PathBuf),
}

impl fmt::Display for FontError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontError::Io { path, source } => write!(f, "cannot read {}: {source}", path.display()),
            FontError::Unparseable(path) => write!(f, "{} is not a usable font", path.display()),
        }
    }
}

impl std::error::Error for FontError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FontError::Io { source, .. } => Some(source),
            FontError::Unparseable(_) => None,
        }
    }
}

/// TrueType/OpenType faces for the two typefaces a scene may ask for. The
/// condensed face falls back to the regular one.
#[derive(Clone)]
pub struct FontFace {
    regular: Font<'static>,
    condensed: Option<Font<'static>>,
}

impl FontFace {
    pub fn new(regular: Font<'static>, condensed: Option<Font<'static>>) -> Self {
        Self { regular, condensed }
    }

    pub fn load(regular: &Path, condensed: Option<&Path>) -> Result<Self, FontError> {
        let condensed = condensed.map(load_font).transpose()?;
        Ok(Self::new(load_font(regular)?, condensed))
    }

    pub fn font(&self, typeface: Typeface) -> &Font<'static> {
        match typeface {
            Typeface::Condensed => self.condensed.as_ref().unwrap_or(&self.regular),
            Typeface::Regular => &self.regular,
        }
    }
}

fn load_font(path: &Path) -> Result<Font<'static>, FontError> {
    let bytes = std::fs::read(path).map_err(|source| FontError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Font::try_from_vec(bytes).ok_or_else(|| FontError::Unparseable(path.to_path_buf()))
}

/// Glyphs laid out on a baseline at `y = ascent`, so the string's top sits near `y = 0`.
pub fn layout_glyphs(font: &Font<'static>, text: &str, size: f64) -> Vec<PositionedGlyph<'static>> {
    let scale = Scale::uniform(size as f32);
    let ascent = font.v_metrics(scale).ascent;
    font.layout(text, scale, point(0.0, ascent)).collect()
}

/// `(min_x, min_y, max_x, max_y)` over every glyph's pixel box.
pub fn ink_box(glyphs: &[PositionedGlyph<'_>]) -> Option<(i32, i32, i32, i32)> {
    glyphs
        .iter()
        .filter_map(|g| g.pixel_bounding_box())
        .map(|bb| (bb.min.x, bb.min.y, bb.max.x, bb.max.y))
        .reduce(|(x0, y0, x1, y1), (a0, b0, a1, b1)| (x0.min(a0), y0.min(b0), x1.max(a1), y1.max(b1)))
}

impl TextMeasure for FontFace {
    fn measure(&self, text: &str, size: f64, typeface: Typeface) -> TextBounds {
        let glyphs = layout_glyphs(self.font(typeface), text, size);
        match ink_box(&glyphs) {
            Some((min_x, min_y, max_x, max_y)) => TextBounds {
                width: f64::from(max_x - min_x),
                height: f64::from(max_y - min_y),
            },
            None => TextBounds::default(),
        }
    }
}
