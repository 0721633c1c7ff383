//! Paint sources for compositing: a solid color or a gradient ramp with pad
//! spread. Colors are premultiplied RGBA in `[0, 1]`.

use glam::{Mat3, Vec2, Vec4};
use lottie_core::{Gradient, GradientKind, GradientStop, Paint};

const LUT_SIZE: usize = 256;
const DEGENERATE_EPSILON: f32 = 1e-6;

#[derive(Clone, Debug)]
pub enum Brush {
    Solid(Vec4),
    Gradient(Box<GradientShader>),
}

impl Default for Brush {
    fn default() -> Self {
        Brush::Solid(Vec4::ZERO)
    }
}

impl Brush {
    /// Builds a brush for `paint` drawn at `opacity`.
    pub fn from_paint(paint: &Paint, opacity: f32) -> Self {
        let opacity = opacity.clamp(0.0, 1.0);
        match paint {
            Paint::Solid(color) => Brush::Solid(premultiply(*color) * opacity),
            Paint::Gradient(gradient) => match GradientShader::new(gradient, opacity) {
                Some(shader) => Brush::Gradient(Box::new(shader)),
                None => Brush::Solid(last_stop(&gradient.stops) * opacity),
            },
        }
    }

    /// Premultiplied color at the center of pixel `(x, y)`.
    pub fn color_at(&self, x: i32, y: i32) -> Vec4 {
        match self {
            Brush::Solid(color) => *color,
            Brush::Gradient(shader) => shader.color_at(x, y),
        }
    }

    pub fn is_transparent(&self) -> bool {
        match self {
            Brush::Solid(color) => color.w <= 0.0,
            Brush::Gradient(shader) => shader.lut.iter().all(|c| c.w <= 0.0),
        }
    }
}

fn premultiply(c: Vec4) -> Vec4 {
    let a = c.w.clamp(0.0, 1.0);
    Vec4::new(c.x * a, c.y * a, c.z * a, a)
}

fn last_stop(stops: &[GradientStop]) -> Vec4 {
    stops.last().map_or(Vec4::ZERO, |s| s.color)
}

#[derive(Clone, Debug)]
pub struct GradientShader {
    kind: GradientKind,
    /// Device space to gradient space.
    inverse: Mat3,
    start: Vec2,
    end: Vec2,
    focal: Vec2,
    radius: f32,
    lut: Vec<Vec4>,
}

impl GradientShader {
    /// `None` when the gradient has no extent; it then paints its last stop.
    pub fn new(gradient: &Gradient, opacity: f32) -> Option<Self> {
        if gradient.stops.is_empty() {
            return None;
        }
        if gradient.transform.determinant().abs() < DEGENERATE_EPSILON {
            return None;
        }
        let degenerate = match gradient.kind {
            GradientKind::Linear => gradient.start.distance_squared(gradient.end),
            GradientKind::Radial => gradient.radius(),
        } < DEGENERATE_EPSILON;
        if degenerate {
            return None;
        }

        Some(Self {
            kind: gradient.kind,
            inverse: gradient.transform.inverse(),
            start: gradient.start,
            end: gradient.end,
            focal: gradient.focal,
            radius: gradient.radius(),
            lut: build_lut(&gradient.stops, opacity),
        })
    }

    fn color_at(&self, x: i32, y: i32) -> Vec4 {
        let p = self
            .inverse
            .transform_point2(Vec2::new(x as f32 + 0.5, y as f32 + 0.5));
        match self.offset(p) {
            Some(t) => {
                let i = (t.clamp(0.0, 1.0) * (LUT_SIZE - 1) as f32).round() as usize;
                self.lut[i]
            }
            None => Vec4::ZERO,
        }
    }

    fn offset(&self, p: Vec2) -> Option<f32> {
        match self.kind {
            GradientKind::Linear => {
                let d = self.end - self.start;
                Some((p - self.start).dot(d) / d.length_squared())
            }
            GradientKind::Radial => {
                // Circles centered on focal + t * (center - focal), radius t * r.
                let cd = self.start - self.focal;
                let pd = p - self.focal;
                let a = cd.length_squared() - self.radius * self.radius;
                let b = pd.dot(cd);
                let c = pd.length_squared();
                if a.abs() < DEGENERATE_EPSILON {
                    return (b.abs() > DEGENERATE_EPSILON).then(|| c / (2.0 * b));
                }
                let disc = b * b - a * c;
                if disc < 0.0 {
                    return None;
                }
                let s = disc.sqrt();
                let t = ((b + s) / a).max((b - s) / a);
                (t >= 0.0).then_some(t)
            }
        }
    }
}

fn build_lut(stops: &[GradientStop], opacity: f32) -> Vec<Vec4> {
    (0..LUT_SIZE)
        .map(|i| ramp(stops, i as f32 / (LUT_SIZE - 1) as f32) * opacity)
        .collect()
}

/// Color of the stop ramp at `t`; pads with the end stops.
fn ramp(stops: &[GradientStop], t: f32) -> Vec4 {
    let Some(first) = stops.first() else {
        return Vec4::ZERO;
    };
    if t <= first.offset {
        return first.color;
    }
    for pair in stops.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if t <= b.offset {
            let span = b.offset - a.offset;
            if span <= 0.0 {
                return b.color;
            }
            return a.color.lerp(b.color, (t - a.offset) / span);
        }
    }
    last_stop(stops)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stops() -> Vec<GradientStop> {
        vec![
            GradientStop {
                offset: 0.0,
                color: Vec4::new(1.0, 0.0, 0.0, 1.0),
            },
            GradientStop {
                offset: 1.0,
                color: Vec4::new(0.0, 0.0, 1.0, 1.0),
            },
        ]
    }

    fn gradient(kind: GradientKind, start: Vec2, end: Vec2) -> Gradient {
        Gradient {
            kind,
            stops: stops(),
            start,
            end,
            focal: start,
            focal_radius: 0.0,
            transform: Mat3::IDENTITY,
        }
    }

    fn close(a: Vec4, b: Vec4) -> bool {
        (a - b).abs().max_element() < 0.01
    }

    #[test]
    fn test_solid_is_premultiplied() {
        let brush = Brush::from_paint(&Paint::Solid(Vec4::new(1.0, 0.5, 0.0, 0.5)), 0.5);
        assert!(close(brush.color_at(3, 3), Vec4::new(0.25, 0.125, 0.0, 0.25)));
    }

    #[test]
    fn test_linear_ramp_pads() {
        let g = gradient(GradientKind::Linear, Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0));
        let brush = Brush::from_paint(&Paint::Gradient(g), 1.0);
        assert!(close(brush.color_at(-20, 0), Vec4::new(1.0, 0.0, 0.0, 1.0)));
        assert!(close(brush.color_at(40, 0), Vec4::new(0.0, 0.0, 1.0, 1.0)));
        // Pixel 4 is sampled at x = 4.5.
        assert!(close(brush.color_at(4, 0), Vec4::new(0.55, 0.0, 0.45, 1.0)));
    }

    #[test]
    fn test_radial_distance_from_center() {
        let g = gradient(GradientKind::Radial, Vec2::new(10.5, 10.5), Vec2::new(20.5, 10.5));
        let brush = Brush::from_paint(&Paint::Gradient(g), 1.0);
        assert!(close(brush.color_at(10, 10), Vec4::new(1.0, 0.0, 0.0, 1.0)));
        assert!(close(brush.color_at(10, 15), Vec4::new(0.5, 0.0, 0.5, 1.0)));
        assert!(close(brush.color_at(30, 10), Vec4::new(0.0, 0.0, 1.0, 1.0)));
    }

    #[test]
    fn test_degenerate_gradients_paint_last_stop() {
        let p = Vec2::new(5.0, 5.0);
        for kind in [GradientKind::Linear, GradientKind::Radial] {
            let brush = Brush::from_paint(&Paint::Gradient(gradient(kind, p, p)), 1.0);
            assert!(matches!(brush, Brush::Solid(_)));
            assert!(close(brush.color_at(0, 0), Vec4::new(0.0, 0.0, 1.0, 1.0)));
        }
    }

    #[test]
    fn test_gradient_transform_is_inverted() {
        let mut g = gradient(GradientKind::Linear, Vec2::ZERO, Vec2::new(10.0, 0.0));
        g.transform = Mat3::from_translation(Vec2::new(100.0, 0.0));
        let brush = Brush::from_paint(&Paint::Gradient(g), 1.0);
        assert!(close(brush.color_at(99, 0), Vec4::new(1.0, 0.0, 0.0, 1.0)));
        assert!(close(brush.color_at(110, 0), Vec4::new(0.0, 0.0, 1.0, 1.0)));
    }
}
