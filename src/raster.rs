use rusttype::PositionedGlyph;
use std::collections::HashMap;
use std::f64::consts::FRAC_PI_2;
use std::hash::Hash;

use crate::config::Color;
use crate::geometry::{modulo, Affine, Bounds, Path, Point};
use crate::scene::{local_transform, DrawCommand, Paint, Scene, Shadow, TextAlign, Typeface};
use crate::text::{ink_box, layout_glyphs, FontFace};

const SUPERSAMPLES: [(f64, f64); 4] = [(0.25, 0.25), (0.75, 0.25), (0.25, 0.75), (0.75, 0.75)];
const CENTER_SAMPLE: [(f64, f64); 1] = [(0.5, 0.5)];
const SHADOW_OPACITY: f64 = 0.5;

// ============================================================================
// RASTER
// ============================================================================

/// Software canvas replaying scenes into an RGBA8 frame.
pub struct Raster<'a> {
    frame: &'a mut [u8],
    width: usize,
    height: usize,
    transform: Affine,
    stack: Vec<Affine>,
    fonts: Option<&'a FontFace>,
}

impl<'a> Raster<'a> {
    /// Text commands are skipped when no fonts are supplied.
    pub fn new(frame: &'a mut [u8], width: usize, height: usize, fonts: Option<&'a FontFace>) -> Self {
        Self {
            frame,
            width,
            height,
            transform: Affine::IDENTITY,
            stack: Vec::new(),
            fonts,
        }
    }

    pub fn clear(&mut self, color: Color) {
        for chunk in self.frame.chunks_exact_mut(4) {
            chunk.copy_from_slice(&[color.r, color.g, color.b, 0xff]);
        }
    }

    /// Copies a previously rendered frame of the same size.
    pub fn blit(&mut self, pixels: &[u8]) {
        if pixels.len() == self.frame.len() {
            self.frame.copy_from_slice(pixels);
        }
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y * self.width + x) * 4;
        let px = self.frame.get(idx..idx + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    pub fn render(&mut self, scene: &Scene) {
        for command in scene.commands() {
            match command {
                DrawCommand::Clear(color) => self.clear(*color),
                DrawCommand::Save => self.stack.push(self.transform),
                DrawCommand::Restore => {
                    if let Some(saved) = self.stack.pop() {
                        self.transform = saved;
                    }
                }
                DrawCommand::Rotate { .. } | DrawCommand::Scale { .. } | DrawCommand::Translate { .. } => {
                    if let Some(local) = local_transform(command) {
                        self.transform = self.transform.then_local(&local);
                    }
                }
                DrawCommand::Line { from, to, paint } => {
                    let scale = self.transform.scale_factor();
                    let (from, to) = (self.transform.apply(*from), self.transform.apply(*to));
                    self.stroke_line(from, to, paint.stroke_width * scale, paint);
                }
                DrawCommand::Arc {
                    center,
                    radius,
                    start_deg,
                    sweep_deg,
                    paint,
                } => {
                    let scale = self.transform.scale_factor();
                    let start = start_deg + self.transform.rotation_degrees();
                    self.stroke_arc(
                        self.transform.apply(*center),
                        radius * scale,
                        start,
                        *sweep_deg,
                        paint.stroke_width * scale,
                        paint,
                    );
                }
                DrawCommand::Circle {
                    center,
                    radius,
                    paint,
                } => {
                    let scale = self.transform.scale_factor();
                    self.fill_circle(self.transform.apply(*center), radius * scale, paint);
                }
                DrawCommand::Path { path, paint } => self.fill_path(path, paint),
                DrawCommand::Text {
                    text,
                    anchor,
                    size,
                    align,
                    typeface,
                    paint,
                } => self.draw_text(text, *anchor, *size, *align, *typeface, paint),
                DrawCommand::CurvedText {
                    center,
                    radius,
                    center_deg,
                    text,
                    size,
                    flipped,
                    paint,
                } => self.draw_curved_text(*center, *radius, *center_deg, text, *size, *flipped, paint),
            }
        }
    }

    // ------------------------------------------------------------------------
    // pixels
    // ------------------------------------------------------------------------

    fn set_pixel(&mut self, x: i64, y: i64, color: Color, coverage: f64) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let idx = (y as usize * self.width + x as usize) * 4;
        let Some(dst) = self.frame.get_mut(idx..idx + 4) else {
            return;
        };
        let a = (coverage * f64::from(color.a) / 255.0).clamp(0.0, 1.0);
        let src = [color.r, color.g, color.b];
        for (d, s) in dst.iter_mut().zip(src) {
            *d = (f64::from(s) * a + f64::from(*d) * (1.0 - a)).round() as u8;
        }
        dst[3] = 0xff;
    }

    /// Splats a sample at a sub-pixel position across its four neighbours.
    fn draw_antialiased_pixel(&mut self, x: f64, y: f64, color: Color, coverage: f64) {
        let (x_floor, y_floor) = (x.floor(), y.floor());
        let (x_frac, y_frac) = (x - x_floor, y - y_floor);
        let (xi, yi) = (x_floor as i64, y_floor as i64);
        let samples = [
            (xi, yi, (1.0 - x_frac) * (1.0 - y_frac)),
            (xi + 1, yi, x_frac * (1.0 - y_frac)),
            (xi, yi + 1, (1.0 - x_frac) * y_frac),
            (xi + 1, yi + 1, x_frac * y_frac),
        ];
        for (px, py, weight) in samples {
            let alpha = coverage * weight;
            if alpha > 0.001 {
                self.set_pixel(px, py, color, alpha);
            }
        }
    }

    // Inclusive pixel range covering `bounds`, clipped to the frame.
    fn pixel_span(&self, bounds: &Bounds) -> Option<(i64, i64, i64, i64)> {
        let min_x = (bounds.left.floor() as i64).max(0);
        let min_y = (bounds.top.floor() as i64).max(0);
        let max_x = (bounds.right.ceil() as i64).min(self.width as i64 - 1);
        let max_y = (bounds.bottom.ceil() as i64).min(self.height as i64 - 1);
        (min_x <= max_x && min_y <= max_y).then_some((min_x, min_y, max_x, max_y))
    }

    // ------------------------------------------------------------------------
    // primitives
    // ------------------------------------------------------------------------

    /// Butt-capped line of `thickness` device pixels.
    fn stroke_line(&mut self, p0: Point, p1: Point, thickness: f64, paint: &Paint) {
        let (dx, dy) = (p1.x - p0.x, p1.y - p0.y);
        let len = (dx * dx + dy * dy).sqrt();
        if len < f64::EPSILON {
            return;
        }
        let (ux, uy) = (dx / len, dy / len);
        let half = thickness / 2.0;
        let mut bounds = Bounds::at(p0);
        bounds.include(p1);
        let pad = half + 1.0;
        let bounds = Bounds::new(bounds.left - pad, bounds.top - pad, bounds.right + pad, bounds.bottom + pad);
        let Some((min_x, min_y, max_x, max_y)) = self.pixel_span(&bounds) else {
            return;
        };
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f64 + 0.5 - p0.x;
                let py = y as f64 + 0.5 - p0.y;
                let along = px * ux + py * uy;
                let across = (px * uy - py * ux).abs();
                let a = (along.min(len - along) + 0.5).clamp(0.0, 1.0);
                let b = (half - across + 0.5).clamp(0.0, 1.0);
                let coverage = edge(a * b, paint.anti_alias);
                if coverage > 0.01 {
                    self.set_pixel(x, y, paint.color, coverage);
                }
            }
        }
    }

    fn fill_circle(&mut self, center: Point, radius: f64, paint: &Paint) {
        let Some((min_x, min_y, max_x, max_y)) = self.pixel_span(&Bounds::around(center, radius + 1.0)) else {
            return;
        };
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let dist = Point::new(x as f64 + 0.5, y as f64 + 0.5)
                    .distance_squared(center)
                    .sqrt();
                let coverage = edge((radius - dist + 0.5).clamp(0.0, 1.0), paint.anti_alias);
                if coverage > 0.0 {
                    self.set_pixel(x, y, paint.color, coverage);
                }
            }
        }
    }

    /// Ring band `radius ± thickness / 2` limited to a clockwise sweep from
    /// `start_deg` (dial convention).
    fn stroke_arc(
        &mut self,
        center: Point,
        radius: f64,
        start_deg: f64,
        sweep_deg: f64,
        thickness: f64,
        paint: &Paint,
    ) {
        let half = thickness / 2.0;
        let Some((min_x, min_y, max_x, max_y)) = self.pixel_span(&Bounds::around(center, radius + half + 1.0)) else {
            return;
        };
        let full = sweep_deg.abs() >= 360.0;
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let dx = x as f64 + 0.5 - center.x;
                let dy = y as f64 + 0.5 - center.y;
                let dist = (dx * dx + dy * dy).sqrt();
                let coverage = edge((half - (dist - radius).abs() + 0.5).clamp(0.0, 1.0), paint.anti_alias);
                if coverage <= 0.0 {
                    continue;
                }
                if !full {
                    let angle = dx.atan2(-dy).to_degrees();
                    if modulo(angle - start_deg, 360.0) > sweep_deg {
                        continue;
                    }
                }
                self.set_pixel(x, y, paint.color, coverage);
            }
        }
    }

    fn fill_path(&mut self, path: &Path, paint: &Paint) {
        let Some(local) = path.bounds() else {
            return;
        };
        let Some(inverse) = self.transform.inverse() else {
            return;
        };
        let device = transform_bounds(&self.transform, &local);
        if let Some(shadow) = paint.shadow {
            self.fill_path_shadow(path, &inverse, &device, &shadow);
        }
        let samples: &[(f64, f64)] = if paint.anti_alias {
            &SUPERSAMPLES
        } else {
            &CENTER_SAMPLE
        };
        let Some((min_x, min_y, max_x, max_y)) = self.pixel_span(&device) else {
            return;
        };
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let hits = samples
                    .iter()
                    .filter(|(sx, sy)| path.contains(inverse.apply(Point::new(x as f64 + sx, y as f64 + sy))))
                    .count();
                if hits > 0 {
                    self.set_pixel(x, y, paint.color, hits as f64 / samples.len() as f64);
                }
            }
        }
    }

    // Soft halo: coverage is the share of nine samples spread over the blur radius.
    fn fill_path_shadow(&mut self, path: &Path, inverse: &Affine, device: &Bounds, shadow: &Shadow) {
        let scale = self.transform.scale_factor();
        let blur = shadow.radius * scale;
        let offset = Point::new(shadow.dx * scale, shadow.dy * scale);
        let grow = blur + offset.x.abs().max(offset.y.abs()) + 1.0;
        let area = Bounds::new(device.left - grow, device.top - grow, device.right + grow, device.bottom + grow);
        let Some((min_x, min_y, max_x, max_y)) = self.pixel_span(&area) else {
            return;
        };
        let ring: Vec<(f64, f64)> = std::iter::once((0.0, 0.0))
            .chain((0..8).map(|i| {
                let (sin, cos) = (f64::from(i) * 45f64.to_radians()).sin_cos();
                (blur * cos, blur * sin)
            }))
            .collect();
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let base = Point::new(x as f64 + 0.5 - offset.x, y as f64 + 0.5 - offset.y);
                let hits = ring
                    .iter()
                    .filter(|(rx, ry)| path.contains(inverse.apply(base.offset(*rx, *ry))))
                    .count();
                if hits > 0 {
                    let coverage = SHADOW_OPACITY * hits as f64 / ring.len() as f64;
                    self.set_pixel(x, y, shadow.color, coverage);
                }
            }
        }
    }

    // ------------------------------------------------------------------------
    // text
    // ------------------------------------------------------------------------

    fn draw_text(&mut self, text: &str, anchor: Point, size: f64, align: TextAlign, typeface: Typeface, paint: &Paint) {
        let Some(fonts) = self.fonts else {
            return;
        };
        let device_size = size * self.transform.scale_factor();
        if device_size < 1.0 {
            return;
        }
        let glyphs = layout_glyphs(fonts.font(typeface), text, device_size);
        let Some((min_x, min_y, max_x, max_y)) = ink_box(&glyphs) else {
            return;
        };
        let width = f64::from(max_x - min_x);
        let left = match align {
            TextAlign::Left => 0.0,
            TextAlign::Center => -width / 2.0,
            TextAlign::Right => -width,
        };
        let top = -f64::from(max_y - min_y) / 2.0;
        let origin = self.transform.apply(anchor);
        let (sin, cos) = self.transform.rotation_degrees().to_radians().sin_cos();

        for glyph in &glyphs {
            let Some(bb) = glyph.pixel_bounding_box() else {
                continue;
            };
            glyph.draw(|gx, gy, v| {
                let lx = left + f64::from(gx as i32 + bb.min.x - min_x);
                let ly = top + f64::from(gy as i32 + bb.min.y - min_y);
                let x = origin.x + lx * cos - ly * sin;
                let y = origin.y + lx * sin + ly * cos;
                self.draw_glyph_pixel(x, y, paint, f64::from(v));
            });
        }
    }

    /// Lays glyphs along a circle, each one rotated to the tangent.
    #[allow(clippy::too_many_arguments)]
    fn draw_curved_text(
        &mut self,
        center: Point,
        radius: f64,
        center_deg: f64,
        text: &str,
        size: f64,
        flipped: bool,
        paint: &Paint,
    ) {
        let Some(fonts) = self.fonts else {
            return;
        };
        let scale = self.transform.scale_factor();
        let (c, r, device_size) = (self.transform.apply(center), radius * scale, size * scale);
        if r <= 0.0 || device_size < 1.0 {
            return;
        }
        let glyphs = layout_glyphs(fonts.font(Typeface::Regular), text, device_size);
        let (Some(first), Some(last)) = (glyphs.first(), glyphs.last()) else {
            return;
        };
        let total_width = f64::from(
            last.position().x - first.position().x + last.unpositioned().h_metrics().advance_width,
        );
        if total_width <= 0.0 {
            return;
        }

        let direction = if flipped { -1.0 } else { 1.0 };
        let middle = (center_deg + self.transform.rotation_degrees() - 90.0).to_radians();
        let start = middle - direction * total_width / r / 2.0;
        let first_x = f64::from(first.position().x);
        for glyph in &glyphs {
            if glyph.pixel_bounding_box().is_none() {
                continue;
            }
            let advance = f64::from(glyph.unpositioned().h_metrics().advance_width);
            let along = f64::from(glyph.position().x) - first_x + advance / 2.0;
            let angle = start + direction * along / r;
            let position = Point::new(c.x + angle.cos() * r, c.y + angle.sin() * r);
            self.draw_rotated_glyph(glyph, position, angle + direction * FRAC_PI_2, paint);
        }
    }

    fn draw_rotated_glyph(&mut self, glyph: &PositionedGlyph<'_>, center: Point, rotation: f64, paint: &Paint) {
        let Some(bb) = glyph.pixel_bounding_box() else {
            return;
        };
        let (sin_r, cos_r) = rotation.sin_cos();
        let glyph_center_x = f64::from(bb.min.x + bb.max.x) / 2.0;
        let glyph_center_y = f64::from(bb.min.y + bb.max.y) / 2.0;
        glyph.draw(|gx, gy, v| {
            if v > 0.001 {
                let local_x = f64::from(gx as i32 + bb.min.x) - glyph_center_x;
                let local_y = f64::from(gy as i32 + bb.min.y) - glyph_center_y;
                let x = center.x + local_x * cos_r - local_y * sin_r;
                let y = center.y + local_x * sin_r + local_y * cos_r;
                self.draw_glyph_pixel(x, y, paint, f64::from(v));
            }
        });
    }

    /// Glyph coverage is splatted across neighbours when antialiased and
    /// thresholded onto the nearest pixel otherwise.
    fn draw_glyph_pixel(&mut self, x: f64, y: f64, paint: &Paint, coverage: f64) {
        if paint.anti_alias {
            self.draw_antialiased_pixel(x, y, paint.color, coverage);
        } else if edge(coverage, false) > 0.0 {
            self.set_pixel(x.round() as i64, y.round() as i64, paint.color, 1.0);
        }
    }
}

fn edge(coverage: f64, anti_alias: bool) -> f64 {
    if anti_alias {
        coverage
    } else if coverage >= 0.5 {
        1.0
    } else {
        0.0
    }
}

fn transform_bounds(transform: &Affine, bounds: &Bounds) -> Bounds {
    let corners = [
        Point::new(bounds.left, bounds.top),
        Point::new(bounds.right, bounds.top),
        Point::new(bounds.left, bounds.bottom),
        Point::new(bounds.right, bounds.bottom),
    ];
    let mut out = Bounds::at(transform.apply(corners[0]));
    for corner in &corners[1..] {
        out.include(transform.apply(*corner));
    }
    out
}

// ============================================================================
// BACKGROUND CACHE
// ============================================================================

/// Rendered backgrounds keyed by kind, dropped whenever the surface size or
/// the scene generation changes.
#[derive(Debug, Default)]
pub struct BackgroundCache<K> {
    width: usize,
    height: usize,
    generation: u64,
    frames: HashMap<K, Vec<u8>>,
}

impl<K: Eq + Hash + Copy> BackgroundCache<K> {
    pub fn new() -> Self {
        Self {
            width: 0,
            height: 0,
            generation: 0,
            frames: HashMap::new(),
        }
    }

    pub fn invalidate(&mut self) {
        self.frames.clear();
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Pixels for `kind`, rasterizing `scene()` on a miss.
    pub fn frame(
        &mut self,
        kind: K,
        generation: u64,
        width: usize,
        height: usize,
        fonts: Option<&FontFace>,
        scene: impl FnOnce() -> Scene,
    ) -> &[u8] {
        if (width, height, generation) != (self.width, self.height, self.generation) {
            self.frames.clear();
            self.width = width;
            self.height = height;
            self.generation = generation;
        }
        self.frames.entry(kind).or_insert_with(|| {
            let mut pixels = vec![0u8; width * height * 4];
            Raster::new(&mut pixels, width, height, fonts).render(&scene());
            pixels
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Shape;

    fn frame(size: usize) -> Vec<u8> {
        vec![0u8; size * size * 4]
    }

    #[test]
    fn circle_and_line_cover_their_pixels() {
        let mut pixels = frame(40);
        let mut raster = Raster::new(&mut pixels, 40, 40, None);
        let mut scene = Scene::new();
        scene.add_command(DrawCommand::Clear(Color::BLACK));
        scene.add_command(DrawCommand::Circle {
            center: Point::new(10.0, 10.0),
            radius: 5.0,
            paint: Paint::fill(Color::WHITE),
        });
        scene.add_command(DrawCommand::Line {
            from: Point::new(20.0, 30.5),
            to: Point::new(38.0, 30.5),
            paint: Paint::stroke(Color::new(255, 0, 0), 3.0),
        });
        raster.render(&scene);
        assert_eq!(raster.pixel(10, 10), Some([255, 255, 255, 255]));
        assert_eq!(raster.pixel(2, 2), Some([0, 0, 0, 255]));
        assert_eq!(raster.pixel(30, 30), Some([255, 0, 0, 255]));
        assert_eq!(raster.pixel(30, 34), Some([0, 0, 0, 255]));
    }

    #[test]
    fn glyph_coverage_is_thresholded_without_antialiasing() {
        let mut pixels = frame(20);
        let mut raster = Raster::new(&mut pixels, 20, 20, None);
        raster.clear(Color::BLACK);
        let crisp = Paint::fill(Color::WHITE).anti_aliased(false);
        raster.draw_glyph_pixel(5.3, 5.6, &crisp, 0.7);
        raster.draw_glyph_pixel(12.0, 12.0, &crisp, 0.3);
        assert_eq!(raster.pixel(5, 6), Some([255, 255, 255, 255]));
        assert_eq!(raster.pixel(6, 6), Some([0, 0, 0, 255]));
        assert_eq!(raster.pixel(5, 5), Some([0, 0, 0, 255]));
        assert_eq!(raster.pixel(12, 12), Some([0, 0, 0, 255]));

        let smooth = Paint::fill(Color::WHITE);
        raster.draw_glyph_pixel(15.5, 15.0, &smooth, 0.7);
        let [r, _, _, _] = raster.pixel(15, 15).unwrap();
        assert!(r > 0 && r < 255);
    }

    #[test]
    fn paths_follow_the_transform_stack() {
        let mut pixels = frame(40);
        let mut raster = Raster::new(&mut pixels, 40, 40, None);
        let bar = Path::new().union(Shape::Rect(Bounds::new(-1.0, -15.0, 1.0, 0.0)));
        let mut scene = Scene::new();
        scene.add_command(DrawCommand::Clear(Color::BLACK));
        scene.add_command(DrawCommand::Save);
        scene.add_command(DrawCommand::Translate { dx: 20.0, dy: 20.0 });
        scene.add_command(DrawCommand::Rotate {
            degrees: 90.0,
            pivot: Point::ORIGIN,
        });
        scene.add_command(DrawCommand::Path {
            path: bar,
            paint: Paint::fill(Color::WHITE),
        });
        scene.add_command(DrawCommand::Restore);
        raster.render(&scene);
        // pointing at 3 o'clock after the rotation
        assert_eq!(raster.pixel(30, 20), Some([255, 255, 255, 255]));
        assert_eq!(raster.pixel(20, 10), Some([0, 0, 0, 255]));
    }

    #[test]
    fn arcs_respect_their_sweep() {
        let mut pixels = frame(40);
        let mut raster = Raster::new(&mut pixels, 40, 40, None);
        let mut scene = Scene::new();
        scene.add_command(DrawCommand::Clear(Color::BLACK));
        scene.add_command(DrawCommand::Arc {
            center: Point::new(20.0, 20.0),
            radius: 10.0,
            start_deg: 0.0,
            sweep_deg: 180.0,
            paint: Paint::stroke(Color::WHITE, 2.0),
        });
        raster.render(&scene);
        assert_eq!(raster.pixel(29, 19), Some([255, 255, 255, 255]));
        assert_eq!(raster.pixel(9, 20), Some([0, 0, 0, 255]));
    }

    #[test]
    fn text_without_fonts_is_skipped() {
        let mut pixels = frame(20);
        let mut raster = Raster::new(&mut pixels, 20, 20, None);
        let mut scene = Scene::new();
        scene.add_command(DrawCommand::Clear(Color::BLACK));
        scene.add_command(DrawCommand::Text {
            text: "12".into(),
            anchor: Point::new(10.0, 10.0),
            size: 8.0,
            align: TextAlign::Center,
            typeface: Typeface::Regular,
            paint: Paint::fill(Color::WHITE),
        });
        raster.render(&scene);
        assert!(pixels.chunks_exact(4).all(|px| px == [0, 0, 0, 255]));
    }

    #[test]
    fn cache_rerenders_after_generation_change() {
        let mut cache: BackgroundCache<u8> = BackgroundCache::new();
        let clear = |color| {
            let mut scene = Scene::new();
            scene.add_command(DrawCommand::Clear(color));
            scene
        };
        let first = cache.frame(0, 1, 4, 4, None, || clear(Color::WHITE))[0];
        assert_eq!(first, 255);
        let cached = cache.frame(0, 1, 4, 4, None, || clear(Color::BLACK))[0];
        assert_eq!(cached, 255);
        let fresh = cache.frame(0, 2, 4, 4, None, || clear(Color::BLACK))[0];
        assert_eq!(fresh, 0);
        assert_eq!(cache.len(), 1);
    }
}
