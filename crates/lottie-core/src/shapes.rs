//! # Shapes
//!
//! Geometry sources of the shape tree: free-form Bezier paths and the
//! parametric rectangle, ellipse and polystar primitives.

use crate::animatable::Interpolatable;
use glam::Vec2;
use kurbo::{BezPath, Point};
use lottie_data::model as data;
use std::f64::consts::PI;

/// Ellipse control-point factor for a quarter arc.
const KAPPA: f64 = 0.552_284_75;
const POLYSTAR_ROUNDNESS: f64 = 0.47829 / 0.28;

/// Vertex form of a path as stored in the document; tangents are relative
/// to their vertex.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PathData {
    pub vertices: Vec<Vec2>,
    pub in_tangents: Vec<Vec2>,
    pub out_tangents: Vec<Vec2>,
    pub closed: bool,
}

impl From<&data::BezierPath> for PathData {
    fn from(p: &data::BezierPath) -> Self {
        let conv = |v: &Vec<data::Vec2>| -> Vec<Vec2> { v.iter().map(|p| Vec2::from(*p)).collect() };
        PathData {
            vertices: conv(&p.v),
            in_tangents: conv(&p.i),
            out_tangents: conv(&p.o),
            closed: p.c,
        }
    }
}

impl Interpolatable for PathData {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        let compatible = self.vertices.len() == other.vertices.len()
            && self.in_tangents.len() == other.in_tangents.len()
            && self.out_tangents.len() == other.out_tangents.len();
        if !compatible {
            return if t < 1.0 { self.clone() } else { other.clone() };
        }
        let mix = |a: &[Vec2], b: &[Vec2]| -> Vec<Vec2> {
            a.iter().zip(b).map(|(a, b)| a.lerp(b, t)).collect()
        };
        PathData {
            vertices: mix(&self.vertices, &other.vertices),
            in_tangents: mix(&self.in_tangents, &other.in_tangents),
            out_tangents: mix(&self.out_tangents, &other.out_tangents),
            closed: self.closed,
        }
    }
}

impl PathData {
    pub fn to_bez_path(&self) -> BezPath {
        let mut bp = BezPath::new();
        let count = self.vertices.len();
        if count == 0 {
            return bp;
        }
        let pt = |v: Vec2| Point::new(v.x as f64, v.y as f64);
        let out_at = |i: usize| self.out_tangents.get(i).copied().unwrap_or(Vec2::ZERO);
        let in_at = |i: usize| self.in_tangents.get(i).copied().unwrap_or(Vec2::ZERO);

        bp.move_to(pt(self.vertices[0]));
        for i in 0..count {
            let next = (i + 1) % count;
            if next == 0 && !self.closed {
                break;
            }
            let p0 = self.vertices[i];
            let p1 = self.vertices[next];
            bp.curve_to(pt(p0 + out_at(i)), pt(p1 + in_at(next)), pt(p1));
        }
        if self.closed {
            bp.close_path();
        }
        bp
    }
}

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

/// Axis-aligned rectangle centered at `center`, starting at the top-right
/// corner. `roundness` is clamped to half the shorter side.
pub fn rect_path(center: Vec2, size: Vec2, roundness: f32, clockwise: bool) -> BezPath {
    let mut path = BezPath::new();
    let (w, h) = (size.x.abs() as f64, size.y.abs() as f64);
    let x = center.x as f64 - w / 2.0;
    let y = center.y as f64 - h / 2.0;
    let r = (roundness.max(0.0) as f64).min(w / 2.0).min(h / 2.0);

    if r <= 0.0 {
        path.move_to(pt(x + w, y));
        if clockwise {
            path.line_to(pt(x + w, y + h));
            path.line_to(pt(x, y + h));
            path.line_to(pt(x, y));
        } else {
            path.line_to(pt(x, y));
            path.line_to(pt(x, y + h));
            path.line_to(pt(x + w, y + h));
        }
        path.close_path();
        return path;
    }

    let c = r * (1.0 - KAPPA);
    path.move_to(pt(x + w, y + r));
    if clockwise {
        path.line_to(pt(x + w, y + h - r));
        path.curve_to(pt(x + w, y + h - c), pt(x + w - c, y + h), pt(x + w - r, y + h));
        path.line_to(pt(x + r, y + h));
        path.curve_to(pt(x + c, y + h), pt(x, y + h - c), pt(x, y + h - r));
        path.line_to(pt(x, y + r));
        path.curve_to(pt(x, y + c), pt(x + c, y), pt(x + r, y));
        path.line_to(pt(x + w - r, y));
        path.curve_to(pt(x + w - c, y), pt(x + w, y + c), pt(x + w, y + r));
    } else {
        path.curve_to(pt(x + w, y + c), pt(x + w - c, y), pt(x + w - r, y));
        path.line_to(pt(x + r, y));
        path.curve_to(pt(x + c, y), pt(x, y + c), pt(x, y + r));
        path.line_to(pt(x, y + h - r));
        path.curve_to(pt(x, y + h - c), pt(x + c, y + h), pt(x + r, y + h));
        path.line_to(pt(x + w - r, y + h));
        path.curve_to(pt(x + w - c, y + h), pt(x + w, y + h - c), pt(x + w, y + h - r));
    }
    path.close_path();
    path
}

/// Ellipse inscribed in `size`, starting at the top.
pub fn ellipse_path(center: Vec2, size: Vec2, clockwise: bool) -> BezPath {
    let mut path = BezPath::new();
    let (cx, cy) = (center.x as f64, center.y as f64);
    let (rx, ry) = (size.x.abs() as f64 / 2.0, size.y.abs() as f64 / 2.0);
    let (kx, ky) = (rx * KAPPA, ry * KAPPA);

    path.move_to(pt(cx, cy - ry));
    if clockwise {
        path.curve_to(pt(cx + kx, cy - ry), pt(cx + rx, cy - ky), pt(cx + rx, cy));
        path.curve_to(pt(cx + rx, cy + ky), pt(cx + kx, cy + ry), pt(cx, cy + ry));
        path.curve_to(pt(cx - kx, cy + ry), pt(cx - rx, cy + ky), pt(cx - rx, cy));
        path.curve_to(pt(cx - rx, cy - ky), pt(cx - kx, cy - ry), pt(cx, cy - ry));
    } else {
        path.curve_to(pt(cx - kx, cy - ry), pt(cx - rx, cy - ky), pt(cx - rx, cy));
        path.curve_to(pt(cx - rx, cy + ky), pt(cx - kx, cy + ry), pt(cx, cy + ry));
        path.curve_to(pt(cx + kx, cy + ry), pt(cx + rx, cy + ky), pt(cx + rx, cy));
        path.curve_to(pt(cx + rx, cy - ky), pt(cx + kx, cy - ry), pt(cx, cy - ry));
    }
    path.close_path();
    path
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PolystarKind {
    Star,
    Polygon,
}

#[derive(Clone, Copy, Debug)]
pub struct PolystarParams {
    pub kind: PolystarKind,
    pub center: Vec2,
    pub points: f32,
    pub rotation: f32,
    pub outer_radius: f32,
    pub outer_roundness: f32,
    pub inner_radius: f32,
    pub inner_roundness: f32,
}

pub fn polystar_path(params: &PolystarParams, clockwise: bool) -> BezPath {
    let mut path = BezPath::new();
    let num_points = params.points.round();
    // Fewer than three points encloses no area.
    if num_points < 3.0 {
        return path;
    }

    let is_star = params.kind == PolystarKind::Star;
    let total_points = if is_star { num_points * 2.0 } else { num_points } as usize;
    let direction = if clockwise { 1.0 } else { -1.0 };
    let start_angle = (params.rotation as f64 - 90.0).to_radians();
    let angle_step = direction * 2.0 * PI / total_points as f64;

    // (vertex, in control point, out control point)
    let mut elements = Vec::with_capacity(total_points);
    for i in 0..total_points {
        let outer = !is_star || i % 2 == 0;
        let (r, roundness) = if outer {
            (params.outer_radius, params.outer_roundness)
        } else {
            (params.inner_radius, params.inner_roundness)
        };

        let angle = start_angle + angle_step * i as f64;
        let (sin_a, cos_a) = angle.sin_cos();
        let vertex = Point::new(
            params.center.x as f64 + r as f64 * cos_a,
            params.center.y as f64 + r as f64 * sin_a,
        );

        let tangent = kurbo::Vec2::new(-sin_a, cos_a) * direction;
        let cp_d = r as f64 * (roundness as f64 / 100.0) * POLYSTAR_ROUNDNESS
            / total_points as f64;
        elements.push((vertex, vertex - tangent * cp_d, vertex + tangent * cp_d));
    }

    let has_roundness = params.outer_roundness.abs() > 0.01
        || (is_star && params.inner_roundness.abs() > 0.01);

    path.move_to(elements[0].0);
    let len = elements.len();
    for i in 0..len {
        let next = &elements[(i + 1) % len];
        if has_roundness {
            path.curve_to(elements[i].2, next.1, next.0);
        } else {
            path.line_to(next.0);
        }
    }
    path.close_path();
    path
}
