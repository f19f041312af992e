//! Motion along quadratic guide paths.
//!
//! A path is split into leaves by recursive bisection until each leaf is flat within the
//! tolerance (or the per-segment leaf cap is reached). The leaves form an arc-length table;
//! per-frame samples are then placed at equal arc-length steps, so the object moves at
//! constant speed regardless of how the control points are spaced.

use kurbo::{ParamCurve, ParamCurveArclen, ParamCurveDeriv, QuadBez};

use crate::foundation::error::{FlitterError, FlitterResult};
use crate::foundation::math::{RAD_TO_DEG, normalize_turn};
use crate::geom::Point;

const ARCLEN_ACCURACY: f64 = 1e-6;

/// How an object on a guide path is rotated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Rotation is not touched.
    #[default]
    None,
    /// Rotation follows the raw tangent angle.
    Fixed,
    /// Tangent angle, unwrapped through the shortest turn between samples.
    Auto,
    /// Like `Auto`, but the overall turn is clockwise (positive).
    Cw,
    /// Like `Auto`, but the overall turn is counter-clockwise (negative).
    Ccw,
}

/// A chain of quadratic segments: `[p0, c0, p1, c1, p2, ...]`.
#[derive(Clone, Debug, PartialEq)]
pub struct GuidePath {
    points: Vec<Point>,
    start: f64,
    end: f64,
    orientation: Orientation,
}

impl GuidePath {
    pub fn new(points: Vec<Point>) -> FlitterResult<Self> {
        if points.len() < 3 || points.len() % 2 == 0 {
            return Err(FlitterError::animation(format!(
                "guide path needs 2n+1 points (n >= 1), got {}",
                points.len()
            )));
        }
        Ok(Self {
            points,
            start: 0.0,
            end: 1.0,
            orientation: Orientation::None,
        })
    }

    /// Travel from fraction `start` to fraction `end` of the path length. `end < start`
    /// runs backwards.
    pub fn with_range(mut self, start: f64, end: f64) -> Self {
        self.start = start.clamp(0.0, 1.0);
        self.end = end.clamp(0.0, 1.0);
        self
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn segment_count(&self) -> usize {
        self.points.len() / 2
    }

    pub fn segment(&self, index: usize) -> QuadBez {
        let i = index * 2;
        QuadBez::new(self.points[i], self.points[i + 1], self.points[i + 2])
    }

    pub fn start_point(&self) -> Point {
        self.points[0]
    }

    pub fn end_point(&self) -> Point {
        self.points[self.points.len() - 1]
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct ArcLeaf {
    segment: usize,
    t0: f64,
    t1: f64,
    /// Path length before this leaf.
    offset: f64,
    length: f64,
}

/// Cumulative arc-length table over a guide path.
#[derive(Clone, Debug, PartialEq)]
pub struct ArcTable {
    leaves: Vec<ArcLeaf>,
    total: f64,
}

impl ArcTable {
    /// Bisect every segment until each leaf's control polygon exceeds its chord by at most
    /// `tolerance`, with at most `max_leaves` leaves per segment.
    pub fn build(path: &GuidePath, tolerance: f64, max_leaves: u32) -> Self {
        let depth = max_leaves.max(1).ilog2();
        let mut leaves = Vec::new();
        for segment in 0..path.segment_count() {
            bisect(path.segment(segment), segment, 0.0, 1.0, depth, tolerance, &mut leaves);
        }
        let mut total = 0.0;
        for leaf in &mut leaves {
            leaf.offset = total;
            total += leaf.length;
        }
        Self { leaves, total }
    }

    pub fn total_length(&self) -> f64 {
        self.total
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    /// Map a distance along the path to `(segment, t)`.
    ///
    /// `cursor` is the leaf index of the previous lookup; the search walks from there, so
    /// monotonic sequences of lookups cost amortized O(1) each.
    fn locate(&self, path: &GuidePath, distance: f64, cursor: &mut usize) -> (usize, f64) {
        if self.leaves.is_empty() {
            return (0, 0.0);
        }
        let distance = distance.clamp(0.0, self.total);
        let mut i = (*cursor).min(self.leaves.len() - 1);
        while i + 1 < self.leaves.len() && distance > self.leaves[i].offset + self.leaves[i].length
        {
            i += 1;
        }
        while i > 0 && distance < self.leaves[i].offset {
            i -= 1;
        }
        *cursor = i;

        let leaf = self.leaves[i];
        let within = (distance - leaf.offset).clamp(0.0, leaf.length);
        let u = if leaf.length > 0.0 {
            path.segment(leaf.segment)
                .subsegment(leaf.t0..leaf.t1)
                .inv_arclen(within, ARCLEN_ACCURACY)
        } else {
            0.0
        };
        (leaf.segment, leaf.t0 + (leaf.t1 - leaf.t0) * u)
    }
}

fn bisect(
    q: QuadBez,
    segment: usize,
    t0: f64,
    t1: f64,
    depth: u32,
    tolerance: f64,
    out: &mut Vec<ArcLeaf>,
) {
    let chord = q.p0.distance(q.p2);
    let polygon = q.p0.distance(q.p1) + q.p1.distance(q.p2);
    if depth == 0 || polygon - chord <= tolerance {
        out.push(ArcLeaf {
            segment,
            t0,
            t1,
            offset: 0.0,
            length: q.arclen(ARCLEN_ACCURACY),
        });
        return;
    }
    let (a, b) = q.subdivide();
    let tm = (t0 + t1) * 0.5;
    bisect(a, segment, t0, tm, depth - 1, tolerance, out);
    bisect(b, segment, tm, t1, depth - 1, tolerance, out);
}

/// One precomputed position on a guide path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GuideSample {
    pub point: Point,
    /// Orientation angle in degrees (0 when the path is not oriented).
    pub angle: f64,
}

/// Evenly spaced (by arc length) samples of a guide path for one motion.
#[derive(Clone, Debug, PartialEq)]
pub struct GuideSamples {
    samples: Vec<GuideSample>,
    orientation: Orientation,
}

impl GuideSamples {
    /// Precompute `count` samples (at least 2) from the path's start to its end fraction.
    pub fn build(path: &GuidePath, table: &ArcTable, count: usize) -> Self {
        let count = count.max(2);
        let mut samples = Vec::with_capacity(count);
        let mut cursor = 0;
        let mut prev_raw: Option<f64> = None;
        let mut angle = 0.0;
        for i in 0..count {
            let f = i as f64 / (count - 1) as f64;
            let fraction = path.start + (path.end - path.start) * f;
            let (segment, t) = table.locate(path, fraction * table.total, &mut cursor);
            let q = path.segment(segment);
            let point = q.eval(t);

            let tangent = q.deriv().eval(t).to_vec2();
            let raw = if tangent.hypot2() > 0.0 {
                tangent.y.atan2(tangent.x) * RAD_TO_DEG
            } else {
                prev_raw.unwrap_or(0.0)
            };
            angle = match (path.orientation, prev_raw) {
                (Orientation::None, _) => 0.0,
                (Orientation::Fixed, _) | (_, None) => raw,
                (_, Some(p)) => angle + normalize_turn(raw - p),
            };
            prev_raw = Some(raw);
            samples.push(GuideSample { point, angle });
        }

        // Cw/Ccw: when the unwrapped turn runs the other way, go the long way round,
        // spreading the extra revolution evenly over the samples.
        let turn = samples[count - 1].angle - samples[0].angle;
        let correction = match path.orientation {
            Orientation::Cw if turn < 0.0 => 360.0,
            Orientation::Ccw if turn > 0.0 => -360.0,
            _ => 0.0,
        };
        if correction != 0.0 {
            for (i, s) in samples.iter_mut().enumerate() {
                s.angle += correction * i as f64 / (count - 1) as f64;
            }
        }
        Self {
            samples,
            orientation: path.orientation,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[GuideSample] {
        &self.samples
    }

    pub fn oriented(&self) -> bool {
        self.orientation != Orientation::None
    }

    /// Position and angle at `ratio` in `[0, 1]`, interpolated between neighboring samples.
    pub fn sample(&self, ratio: f64) -> GuideSample {
        let n = self.samples.len();
        let f = ratio.clamp(0.0, 1.0) * (n - 1) as f64;
        let i = (f.floor() as usize).min(n - 2);
        let k = f - i as f64;
        let (a, b) = (self.samples[i], self.samples[i + 1]);
        let delta = match self.orientation {
            Orientation::Fixed => normalize_turn(b.angle - a.angle),
            _ => b.angle - a.angle,
        };
        GuideSample {
            point: a.point.lerp(b.point, k),
            angle: a.angle + delta * k,
        }
    }

    pub fn last(&self) -> GuideSample {
        self.samples[self.samples.len() - 1]
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/guide.rs"]
mod tests;
