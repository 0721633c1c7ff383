//! Conversion between `kurbo` paths and runs of [`Bezier`] segments.

use crate::bezier::Bezier;
use glam::Vec2;
use kurbo::{BezPath, PathEl, Point};

/// One subpath as cubic segments.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Contour {
    pub segments: Vec<Bezier>,
    pub closed: bool,
}

impl Contour {
    pub fn length(&self) -> f32 {
        self.segments.iter().map(Bezier::length).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

fn vec2(p: Point) -> Vec2 {
    Vec2::new(p.x as f32, p.y as f32)
}

fn point(v: Vec2) -> Point {
    Point::new(v.x as f64, v.y as f64)
}

/// Splits `path` into contours. Quadratics are elevated to cubics and a
/// closed contour gets an explicit closing segment when its end does not
/// meet its start.
pub fn contours(path: &BezPath) -> Vec<Contour> {
    let mut result = Vec::new();
    let mut current = Contour::default();
    let mut start = Vec2::ZERO;
    let mut last = Vec2::ZERO;

    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => {
                if !current.is_empty() {
                    result.push(std::mem::take(&mut current));
                }
                current.closed = false;
                start = vec2(p);
                last = start;
            }
            PathEl::LineTo(p) => {
                let p = vec2(p);
                current.segments.push(Bezier::line(last, p));
                last = p;
            }
            PathEl::QuadTo(c, p) => {
                let (c, p) = (vec2(c), vec2(p));
                let c1 = last + (c - last) * (2.0 / 3.0);
                let c2 = p + (c - p) * (2.0 / 3.0);
                current.segments.push(Bezier::from_points(last, c1, c2, p));
                last = p;
            }
            PathEl::CurveTo(c1, c2, p) => {
                let p = vec2(p);
                current
                    .segments
                    .push(Bezier::from_points(last, vec2(c1), vec2(c2), p));
                last = p;
            }
            PathEl::ClosePath => {
                if last != start {
                    current.segments.push(Bezier::line(last, start));
                }
                current.closed = true;
                last = start;
                result.push(std::mem::take(&mut current));
            }
        }
    }
    if !current.is_empty() {
        result.push(current);
    }
    result
}

/// Appends `segments` as one connected run starting with a move.
pub fn append_segments(out: &mut BezPath, segments: &[Bezier], close: bool) {
    let Some(first) = segments.first() else {
        return;
    };
    out.move_to(point(first.p1));
    for seg in segments {
        out.curve_to(point(seg.p2), point(seg.p3), point(seg.p4));
    }
    if close {
        out.close_path();
    }
}

pub fn to_bez_path(contours: &[Contour]) -> BezPath {
    let mut out = BezPath::new();
    for contour in contours {
        append_segments(&mut out, &contour.segments, contour.closed);
    }
    out
}
