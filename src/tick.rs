use bon::bon;

use crate::config::{check_fraction, ConfigError, MINIMUM_STROKE_WIDTH_PX};
use crate::dial::Sweep;

/// One family of evenly spaced graduation marks on a dial.
#[derive(Debug, Clone, PartialEq)]
pub struct TickSet {
    count: u32,
    outer_diameter: f64,
    inner_diameter: f64,
    stroke_width: f64,
    ambient_outer_diameter: Option<f64>,
    ambient_inner_diameter: Option<f64>,
    ambient_stroke_width: Option<f64>,
    non_ambient_only: bool,
    exclude_counts: Vec<u32>,
}

/// A tick position produced by [`TickSet::ticks`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    pub index: u32,
    pub rotation: f64,
    pub angle: f64,
    /// Sits on an end of the dial's arc or on an edge of its exclude window,
    /// and is lengthened to meet the boundary circles.
    pub extended: bool,
}

#[bon]
impl TickSet {
    /// Diameters are fractions of the dial radius; stroke widths are
    /// fractions of the shorter surface side. `exclude_counts` lists the
    /// counts of coarser sets on the same dial whose positions this set skips.
    #[builder]
    pub fn new(
        count: u32,
        #[builder(default = 1.0)] outer_diameter: f64,
        #[builder(default = 0.9)] inner_diameter: f64,
        #[builder(default = 0.01)] stroke_width: f64,
        ambient_outer_diameter: Option<f64>,
        ambient_inner_diameter: Option<f64>,
        ambient_stroke_width: Option<f64>,
        #[builder(default)] non_ambient_only: bool,
        #[builder(default)] exclude_counts: Vec<u32>,
    ) -> Result<Self, ConfigError> {
        if count == 0 {
            return Err(ConfigError::ZeroTickCount);
        }
        check_fraction("outer_diameter", outer_diameter)?;
        check_fraction("inner_diameter", inner_diameter)?;
        check_fraction("stroke_width", stroke_width)?;
        for (field, value) in [
            ("ambient_outer_diameter", ambient_outer_diameter),
            ("ambient_inner_diameter", ambient_inner_diameter),
            ("ambient_stroke_width", ambient_stroke_width),
        ] {
            if let Some(value) = value {
                check_fraction(field, value)?;
            }
        }
        Ok(Self {
            count,
            outer_diameter,
            inner_diameter,
            stroke_width,
            ambient_outer_diameter,
            ambient_inner_diameter,
            ambient_stroke_width,
            non_ambient_only,
            exclude_counts,
        })
    }
}

impl TickSet {
    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn stroke_width(&self) -> f64 {
        self.stroke_width
    }

    /// `(outer, inner)` diameters as fractions of the dial radius.
    pub fn diameters(&self, ambient: bool) -> (f64, f64) {
        if ambient {
            (
                self.ambient_outer_diameter.unwrap_or(self.outer_diameter),
                self.ambient_inner_diameter.unwrap_or(self.inner_diameter),
            )
        } else {
            (self.outer_diameter, self.inner_diameter)
        }
    }

    /// Stroke width in device pixels, never thinner than one pixel.
    pub fn stroke_px(&self, ambient: bool, vmin_px: f64) -> f64 {
        let width = if ambient {
            self.ambient_stroke_width.unwrap_or(self.stroke_width)
        } else {
            self.stroke_width
        };
        (width * vmin_px).max(MINIMUM_STROKE_WIDTH_PX)
    }

    fn skips(&self, index: u32) -> bool {
        let count = u64::from(self.count);
        self.exclude_counts
            .iter()
            .any(|&n| (u64::from(index) * u64::from(n)) % count == 0)
    }

    /// Every drawn tick, `index` running from 0 through `count` inclusive.
    /// On a full circle the first and last tick land on the same angle.
    pub fn ticks(&self, sweep: &Sweep, ambient: bool) -> Vec<Tick> {
        if ambient && self.non_ambient_only {
            return Vec::new();
        }
        let extendable = !sweep.is_full_circle();
        (0..=self.count)
            .filter(|&i| !self.skips(i))
            .filter_map(|index| {
                let rotation = f64::from(index) / f64::from(self.count);
                if sweep.is_excluded(rotation) {
                    return None;
                }
                let arc_end = extendable && (index == 0 || index == self.count);
                Some(Tick {
                    index,
                    rotation,
                    angle: sweep.angle(rotation),
                    extended: arc_end || sweep.is_exclude_edge(rotation),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{polar, Point};

    fn full_circle() -> Sweep {
        Sweep::new(0.0, 360.0, None)
    }

    #[test]
    fn zero_count_is_rejected() {
        assert_eq!(
            TickSet::builder().count(0).build(),
            Err(ConfigError::ZeroTickCount)
        );
    }

    #[test]
    fn finer_set_skips_positions_of_coarser_set() {
        let fine = TickSet::builder()
            .count(300)
            .exclude_counts(vec![60])
            .build()
            .unwrap();
        let ticks = fine.ticks(&full_circle(), false);
        assert_eq!(ticks.len(), 240);
        assert!(ticks.iter().all(|t| t.index % 5 != 0));
    }

    #[test]
    fn first_and_last_ticks_coincide_on_a_full_circle() {
        let hours = TickSet::builder().count(12).build().unwrap();
        let ticks = hours.ticks(&full_circle(), false);
        assert_eq!(ticks.len(), 13);
        let (first, last) = (ticks[0], ticks[12]);
        assert_eq!(first.angle, 0.0);
        assert_eq!(crate::geometry::modulo(last.angle, 360.0), first.angle);
        assert!(ticks.iter().all(|t| !t.extended));

        let center = Point::new(227.0, 227.0);
        let a = polar(center, 180.0, first.angle);
        let b = polar(center, 180.0, last.angle);
        assert!((a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9);
    }

    #[test]
    fn full_circle_ticks_extend_at_exclude_edges_only() {
        let window = Sweep::new(0.0, 360.0, Some((0.4, 0.6)));
        let tenths = TickSet::builder().count(10).build().unwrap();
        let ticks = tenths.ticks(&window, false);
        let indices: Vec<u32> = ticks.iter().map(|t| t.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 6, 7, 8, 9, 10]);
        let extended: Vec<u32> = ticks.iter().filter(|t| t.extended).map(|t| t.index).collect();
        assert_eq!(extended, vec![4, 6]);
    }

    #[test]
    fn arc_ticks_extend_at_ends_and_exclude_edges() {
        let battery = Sweep::new(150.0, 30.0, Some((0.4, 0.6)));
        let tenths = TickSet::builder()
            .count(10)
            .exclude_counts(vec![2])
            .build()
            .unwrap();
        let ticks = tenths.ticks(&battery, false);
        let indices: Vec<u32> = ticks.iter().map(|t| t.index).collect();
        assert_eq!(indices, vec![1, 2, 3, 4, 6, 7, 8, 9]);
        let extended: Vec<u32> = ticks.iter().filter(|t| t.extended).map(|t| t.index).collect();
        assert_eq!(extended, vec![4, 6]);

        let ends = TickSet::builder().count(2).build().unwrap().ticks(&battery, false);
        assert_eq!(ends.len(), 2);
        assert!(ends.iter().all(|t| t.extended));
        assert_eq!(ends[0].angle, 150.0);
        assert_eq!(ends[1].angle, 30.0);
    }

    #[test]
    fn ambient_geometry_falls_back_and_strokes_floor_at_one_pixel() {
        let set = TickSet::builder()
            .count(60)
            .outer_diameter(1.0)
            .inner_diameter(0.94)
            .stroke_width(0.0025)
            .ambient_stroke_width(0.01)
            .build()
            .unwrap();
        assert_eq!(set.diameters(true), (1.0, 0.94));
        assert_eq!(set.stroke_px(false, 200.0), 1.0);
        assert_eq!(set.stroke_px(true, 200.0), 2.0);

        let hidden = TickSet::builder()
            .count(60)
            .non_ambient_only(true)
            .build()
            .unwrap();
        assert!(hidden.ticks(&full_circle(), true).is_empty());
        assert_eq!(hidden.ticks(&full_circle(), false).len(), 61);
    }
}
