//! # Dash
//!
//! Evaluation of stroke dash entries and application of the resulting
//! pattern to a path.

use crate::animatable::Animated;
use crate::bezier::Bezier;
use crate::contour::{contours, Contour};
use crate::renderer::DashPattern;
use kurbo::{BezPath, Point};

/// Length differences below this are treated as equal when cutting dashes.
const LENGTH_EPSILON: f32 = 1e-3;

/// Evaluates the dash entries of a stroke at `frame`.
///
/// An odd number of entries is evaluated as is. For an even number every
/// entry but the last is evaluated, the last evaluated value is repeated and
/// the final entry is appended, so `[4, 2]` becomes `[4, 4, 2]`.
pub fn dash_info(entries: &[Animated<f32>], frame: f32) -> Vec<f32> {
    if entries.is_empty() {
        return Vec::new();
    }
    if entries.len() % 2 == 1 {
        return entries.iter().map(|e| e.value(frame)).collect();
    }

    let (last, head) = match entries.split_last() {
        Some(split) => split,
        None => return Vec::new(),
    };
    let mut result: Vec<f32> = head.iter().map(|e| e.value(frame)).collect();
    let repeated = result.last().copied().unwrap_or_default();
    result.push(repeated);
    result.push(last.value(frame));
    result
}

/// Splits `path` into dashes. The pattern restarts at each subpath.
pub fn apply_dash(path: &BezPath, pattern: &DashPattern) -> BezPath {
    if pattern.is_solid() || pattern.intervals().iter().any(|v| *v < 0.0) {
        return path.clone();
    }
    let mut out = BezPath::new();
    for contour in contours(path) {
        let mut dasher = Dasher::new(pattern.intervals(), pattern.offset());
        dasher.dash_contour(&contour, &mut out);
    }
    out
}

struct Dasher<'a> {
    intervals: &'a [f32],
    index: usize,
    /// Length left in the current interval.
    remaining: f32,
    pen_down: bool,
}

impl<'a> Dasher<'a> {
    fn new(intervals: &'a [f32], offset: f32) -> Self {
        let total: f32 = intervals.iter().sum();
        let mut dasher = Self {
            intervals,
            index: 0,
            remaining: intervals[0],
            pen_down: false,
        };
        let mut offset = offset.rem_euclid(total);
        while offset > 0.0 {
            if offset >= dasher.remaining {
                offset -= dasher.remaining;
                dasher.advance();
            } else {
                dasher.remaining -= offset;
                offset = 0.0;
            }
        }
        dasher
    }

    fn is_dash(&self) -> bool {
        self.index % 2 == 0
    }

    fn advance(&mut self) {
        self.index = (self.index + 1) % self.intervals.len();
        self.remaining = self.intervals[self.index];
        self.pen_down = false;
    }

    fn dash_contour(&mut self, contour: &Contour, out: &mut BezPath) {
        for segment in &contour.segments {
            self.dash_segment(*segment, out);
        }
    }

    fn dash_segment(&mut self, mut segment: Bezier, out: &mut BezPath) {
        let mut len = segment.length();
        loop {
            if self.remaining <= 0.0 {
                self.advance();
                continue;
            }
            if len <= self.remaining + LENGTH_EPSILON {
                if self.is_dash() {
                    self.emit(&segment, out);
                }
                self.remaining -= len;
                return;
            }
            let t = segment.t_at_length_with_total(self.remaining, len);
            let (left, right) = segment.split_at(t);
            if self.is_dash() {
                self.emit(&left, out);
            }
            len -= self.remaining;
            segment = right;
            self.advance();
        }
    }

    fn emit(&mut self, segment: &Bezier, out: &mut BezPath) {
        let p = |v: glam::Vec2| Point::new(v.x as f64, v.y as f64);
        if !self.pen_down {
            out.move_to(p(segment.p1));
            self.pen_down = true;
        }
        out.curve_to(p(segment.p2), p(segment.p3), p(segment.p4));
    }
}
