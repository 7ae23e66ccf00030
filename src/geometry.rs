// ============================================================================
// SCALAR HELPERS
// ============================================================================

/// Floored modulo: the result always has the sign of `y`.
///
/// `modulo(-30.0, 360.0) == 330.0`, unlike the `%` operator.
pub fn modulo(x: f64, y: f64) -> f64 {
    x - (x / y).floor() * y
}

/// Clamps `x` into `[min, max]`, applying the upper bound first.
///
/// Never panics, even when `min > max` (the lower bound wins).
pub fn clamp(x: f64, min: f64, max: f64) -> f64 {
    x.min(max).max(min)
}

// ============================================================================
// POINTS AND BOXES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn distance_squared(self, other: Point) -> f64 {
        let (dx, dy) = (self.x - other.x, self.y - other.y);
        dx * dx + dy * dy
    }

    /// Rotates clockwise (screen coordinates, y down) about `pivot`.
    pub fn rotate_about(self, pivot: Point, degrees: f64) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        let (dx, dy) = (self.x - pivot.x, self.y - pivot.y);
        Self::new(pivot.x + dx * cos - dy * sin, pivot.y + dx * sin + dy * cos)
    }

    pub fn rounded(self) -> (i64, i64) {
        (self.x.round() as i64, self.y.round() as i64)
    }
}

/// Point at `radius` from `center` along a dial angle: 0° is 12 o'clock,
/// angles grow clockwise.
pub fn polar(center: Point, radius: f64, degrees: f64) -> Point {
    let (sin, cos) = degrees.to_radians().sin_cos();
    Point::new(center.x + radius * sin, center.y - radius * cos)
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Bounds {
    pub const fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn around(center: Point, radius: f64) -> Self {
        Self::new(
            center.x - radius,
            center.y - radius,
            center.x + radius,
            center.y + radius,
        )
    }

    /// Degenerate box holding a single point, to be grown with [`Bounds::include`].
    pub fn at(point: Point) -> Self {
        Self::new(point.x, point.y, point.x, point.y)
    }

    pub fn include(&mut self, point: Point) {
        self.left = self.left.min(point.x);
        self.right = self.right.max(point.x);
        self.top = self.top.min(point.y);
        self.bottom = self.bottom.max(point.y);
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.left + self.right) / 2.0,
            (self.top + self.bottom) / 2.0,
        )
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left && point.x <= self.right && point.y >= self.top && point.y <= self.bottom
    }

    /// Grows the box by `pad` on every side, then clips it to `[0, width] x [0, height]`.
    pub fn padded_within(&self, pad: f64, width: f64, height: f64) -> Self {
        Self::new(
            (self.left - pad).max(0.0),
            (self.top - pad).max(0.0),
            (self.right + pad).min(width),
            (self.bottom + pad).min(height),
        )
    }
}

// ============================================================================
// TRANSFORMS
// ============================================================================

/// 2x3 affine matrix mapping `(x, y)` to `(a*x + c*y + e, b*x + d*y + f)`.
///
/// Only similarity transforms (rotation, uniform scale, translation) are ever
/// built, so a single scale factor and rotation angle describe the linear part.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Affine {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine {
    pub const IDENTITY: Affine = Affine {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn translate(dx: f64, dy: f64) -> Self {
        Self {
            e: dx,
            f: dy,
            ..Self::IDENTITY
        }
    }

    pub fn scale_about(factor: f64, pivot: Point) -> Self {
        Self {
            a: factor,
            d: factor,
            e: pivot.x * (1.0 - factor),
            f: pivot.y * (1.0 - factor),
            ..Self::IDENTITY
        }
    }

    /// Clockwise rotation in screen space, matching [`Point::rotate_about`].
    pub fn rotate_about(degrees: f64, pivot: Point) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            e: pivot.x - pivot.x * cos + pivot.y * sin,
            f: pivot.y - pivot.x * sin - pivot.y * cos,
        }
    }

    /// `self ∘ local`: points go through `local` first. This is how canvas
    /// operations accumulate onto the current matrix.
    pub fn then_local(&self, local: &Affine) -> Affine {
        Affine {
            a: self.a * local.a + self.c * local.b,
            b: self.b * local.a + self.d * local.b,
            c: self.a * local.c + self.c * local.d,
            d: self.b * local.c + self.d * local.d,
            e: self.a * local.e + self.c * local.f + self.e,
            f: self.b * local.e + self.d * local.f + self.f,
        }
    }

    pub fn apply(&self, p: Point) -> Point {
        Point::new(
            self.a * p.x + self.c * p.y + self.e,
            self.b * p.x + self.d * p.y + self.f,
        )
    }

    pub fn inverse(&self) -> Option<Affine> {
        let det = self.a * self.d - self.b * self.c;
        if det.abs() < f64::EPSILON {
            return None;
        }
        Some(Affine {
            a: self.d / det,
            b: -self.b / det,
            c: -self.c / det,
            d: self.a / det,
            e: (self.c * self.f - self.d * self.e) / det,
            f: (self.b * self.e - self.a * self.f) / det,
        })
    }

    pub fn scale_factor(&self) -> f64 {
        (self.a * self.a + self.b * self.b).sqrt()
    }

    pub fn rotation_degrees(&self) -> f64 {
        self.b.atan2(self.a).to_degrees()
    }
}

// ============================================================================
// PATHS
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Polygon(Vec<Point>),
    Circle { center: Point, radius: f64 },
    Rect(Bounds),
}

impl Shape {
    pub fn contains(&self, p: Point) -> bool {
        match self {
            Shape::Polygon(points) => polygon_contains(points, p),
            Shape::Circle { center, radius } => p.distance_squared(*center) <= radius * radius,
            Shape::Rect(bounds) => bounds.contains(p),
        }
    }

    pub fn bounds(&self) -> Bounds {
        match self {
            Shape::Polygon(points) => {
                let mut iter = points.iter();
                let Some(first) = iter.next() else {
                    return Bounds::default();
                };
                let mut bounds = Bounds::at(*first);
                for p in iter {
                    bounds.include(*p);
                }
                bounds
            }
            Shape::Circle { center, radius } => Bounds::around(*center, *radius),
            Shape::Rect(bounds) => *bounds,
        }
    }
}

// Even-odd ray casting.
fn polygon_contains(points: &[Point], p: Point) -> bool {
    if points.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = points.len() - 1;
    for i in 0..points.len() {
        let (pi, pj) = (points[i], points[j]);
        if (pi.y > p.y) != (pj.y > p.y) {
            let x_cross = pj.x + (p.y - pj.y) * (pi.x - pj.x) / (pi.y - pj.y);
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathOp {
    Union,
    Difference,
}

/// A filled region built from an ordered list of boolean operations.
///
/// Membership is evaluated by replaying the operations in order, so a hole
/// punched before a later union is filled again by that union.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Path {
    ops: Vec<(PathOp, Shape)>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn union(mut self, shape: Shape) -> Self {
        self.ops.push((PathOp::Union, shape));
        self
    }

    pub fn difference(mut self, shape: Shape) -> Self {
        self.ops.push((PathOp::Difference, shape));
        self
    }

    pub fn ops(&self) -> &[(PathOp, Shape)] {
        &self.ops
    }

    pub fn contains(&self, p: Point) -> bool {
        self.ops.iter().fold(false, |inside, (op, shape)| match op {
            PathOp::Union => inside || shape.contains(p),
            PathOp::Difference => inside && !shape.contains(p),
        })
    }

    /// Box around every unioned shape; holes never grow it.
    pub fn bounds(&self) -> Option<Bounds> {
        self.ops
            .iter()
            .filter(|(op, _)| *op == PathOp::Union)
            .map(|(_, shape)| shape.bounds())
            .reduce(|mut acc, b| {
                acc.include(Point::new(b.left, b.top));
                acc.include(Point::new(b.right, b.bottom));
                acc
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn modulo_wraps_negative_values() {
        assert!(close(modulo(-30.0, 360.0), 330.0));
        assert!(close(modulo(390.0, 360.0), 30.0));
        assert!(close(modulo(1.30103, 1.0), 0.30103));
    }

    #[test]
    fn clamp_handles_inverted_bounds() {
        assert_eq!(clamp(150.0, -10.0, 110.0), 110.0);
        assert_eq!(clamp(-5.0, -10.0, 110.0), -5.0);
        assert_eq!(clamp(5.0, 10.0, 0.0), 10.0);
    }

    #[test]
    fn polar_zero_points_up_and_ninety_points_right() {
        let c = Point::new(100.0, 100.0);
        let top = polar(c, 10.0, 0.0);
        let right = polar(c, 10.0, 90.0);
        assert!(close(top.x, 100.0) && close(top.y, 90.0));
        assert!(close(right.x, 110.0) && close(right.y, 100.0));
    }

    #[test]
    fn rotation_agrees_between_point_and_affine() {
        let pivot = Point::new(50.0, 40.0);
        let p = Point::new(50.0, 10.0);
        let by_point = p.rotate_about(pivot, 72.0);
        let by_matrix = Affine::rotate_about(72.0, pivot).apply(p);
        assert!(close(by_point.x, by_matrix.x) && close(by_point.y, by_matrix.y));
        assert!(same(by_point, polar(pivot, 30.0, 72.0)));

        fn same(a: Point, b: Point) -> bool {
            (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
        }
    }

    #[test]
    fn composed_transform_inverts() {
        let m = Affine::IDENTITY
            .then_local(&Affine::scale_about(2.5, Point::new(10.0, 20.0)))
            .then_local(&Affine::translate(-3.0, 7.0))
            .then_local(&Affine::rotate_about(33.0, Point::new(1.0, 2.0)));
        let inv = m.inverse().expect("similarity is invertible");
        let p = Point::new(12.5, -4.0);
        let back = inv.apply(m.apply(p));
        assert!(close(back.x, p.x) && close(back.y, p.y));
        assert!(close(m.scale_factor(), 2.5));
        assert!(close(m.rotation_degrees(), 33.0));
    }

    #[test]
    fn padded_box_stays_on_surface() {
        let b = Bounds::new(-5.0, 3.0, 390.0, 410.0).padded_within(8.0, 400.0, 400.0);
        assert_eq!(b, Bounds::new(0.0, 0.0, 398.0, 400.0));
    }

    #[test]
    fn path_replays_union_and_difference_in_order() {
        let c = Point::new(0.0, 0.0);
        let path = Path::new()
            .union(Shape::Rect(Bounds::new(-1.0, -10.0, 1.0, 2.0)))
            .union(Shape::Circle { center: c, radius: 3.0 })
            .difference(Shape::Circle { center: c, radius: 1.0 });
        assert!(!path.contains(c));
        assert!(path.contains(Point::new(2.0, 0.0)));
        assert!(path.contains(Point::new(0.0, -8.0)));
        assert!(!path.contains(Point::new(2.5, -8.0)));
        assert_eq!(path.bounds(), Some(Bounds::new(-3.0, -10.0, 3.0, 3.0)));
    }

    #[test]
    fn polygon_membership() {
        let tri = Shape::Polygon(vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(0.0, 10.0),
        ]);
        assert!(tri.contains(Point::new(2.0, 2.0)));
        assert!(!tri.contains(Point::new(8.0, 8.0)));
    }
}
