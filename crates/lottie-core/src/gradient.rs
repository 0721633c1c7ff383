//! # Gradient
//!
//! Per-frame evaluation of gradient paints: merges the flat color/opacity
//! buffer into premultiplied stops and derives the geometry of linear and
//! radial gradients.

use crate::animatable::Animated;
use crate::renderer::{Gradient, GradientKind, GradientStop};
use glam::{Mat3, Vec2, Vec4};

/// Highlight progress that would put the focal point on the circle.
const FOCAL_EDGE_CLAMP: f32 = 0.99;

#[derive(Clone, Debug)]
pub struct GradientNode {
    pub kind: GradientKind,
    pub start: Animated<Vec2>,
    pub end: Animated<Vec2>,
    /// Percent of the radius.
    pub highlight_length: Animated<f32>,
    /// Degrees.
    pub highlight_angle: Animated<f32>,
    pub buffer: Animated<Vec<f32>>,
    /// Declared number of color stops; `-1` lets the buffer length decide.
    pub color_points: i32,
    /// Stops of a static color buffer, merged once at load.
    pub cached_stops: Option<Vec<GradientStop>>,
}

impl GradientNode {
    pub fn is_static(&self) -> bool {
        self.start.is_static()
            && self.end.is_static()
            && self.highlight_length.is_static()
            && self.highlight_angle.is_static()
            && self.buffer.is_static()
    }

    pub fn cache_stops(&mut self) {
        self.cached_stops = self
            .buffer
            .is_static()
            .then(|| merge_stops(&self.buffer.value(0.0), self.color_points));
    }

    pub fn populate(&self, frame: f32) -> Vec<GradientStop> {
        match &self.cached_stops {
            Some(stops) => stops.clone(),
            None => merge_stops(&self.buffer.value(frame), self.color_points),
        }
    }

    /// Gradient geometry at `frame`; `transform` maps gradient space to
    /// device space.
    pub fn evaluate(&self, frame: f32, transform: Mat3) -> Gradient {
        let start = self.start.value(frame);
        let end = self.end.value(frame);
        let (focal, focal_radius) = match self.kind {
            GradientKind::Linear => (start, 0.0),
            GradientKind::Radial => (
                focal_point(
                    start,
                    end,
                    self.highlight_length.value(frame),
                    self.highlight_angle.value(frame),
                ),
                0.0,
            ),
        };
        Gradient {
            kind: self.kind,
            stops: self.populate(frame),
            start,
            end,
            focal,
            focal_radius,
            transform,
        }
    }
}

/// Focal point of a radial gradient centered at `start` whose radius reaches
/// `end`, offset by the highlight length (percent) along the start→end
/// direction rotated by the highlight angle (degrees).
pub fn focal_point(start: Vec2, end: Vec2, highlight_length: f32, highlight_angle: f32) -> Vec2 {
    let radius = start.distance(end);
    let mut progress = highlight_length / 100.0;
    if (progress - 1.0).abs() <= f32::EPSILON {
        progress = FOCAL_EDGE_CLAMP;
    }
    let d = end - start;
    let line_angle = d.y.atan2(d.x).to_degrees();
    let angle = (line_angle + highlight_angle).to_radians();
    let (sin, cos) = angle.sin_cos();
    start + Vec2::new(cos, sin) * progress * radius
}

fn premultiplied(r: f32, g: f32, b: f32, a: f32) -> Vec4 {
    let a = a.clamp(0.0, 1.0);
    Vec4::new(r * a, g * a, b * a, a)
}

/// Merges `color_points` `(pos, r, g, b)` quadruples with the trailing
/// `(pos, alpha)` pairs into premultiplied stops, in color-stop order.
///
/// An opacity stop positioned before the next color stop adds a stop at its
/// own position using that color stop's color.
pub fn merge_stops(buffer: &[f32], color_points: i32) -> Vec<GradientStop> {
    let color_points = if color_points < 0 {
        buffer.len() / 4
    } else {
        (color_points as usize).min(buffer.len() / 4)
    };
    let (colors, opacity) = buffer.split_at(color_points * 4);
    // Ignore a dangling half pair.
    let opacity = &opacity[..opacity.len() - opacity.len() % 2];

    let mut stops = Vec::with_capacity(color_points + opacity.len() / 2);
    let mut j = 0;
    for color in colors.chunks_exact(4) {
        let (pos, r, g, b) = (color[0], color[1], color[2], color[3]);

        if opacity.is_empty() {
            stops.push(GradientStop {
                offset: pos,
                color: premultiplied(r, g, b, 1.0),
            });
            continue;
        }

        if j == opacity.len() {
            // Past the last opacity interval.
            let n = opacity.len();
            let (stop2, op2) = (opacity[n - 2], opacity[n - 1]);
            let alpha = if pos > stop2 || n < 4 {
                op2
            } else {
                let (stop1, op1) = (opacity[n - 4], opacity[n - 3]);
                interpolate(pos, stop1, op1, stop2, op2)
            };
            stops.push(GradientStop {
                offset: pos,
                color: premultiplied(r, g, b, alpha),
            });
            continue;
        }

        let mut placed = false;
        while j < opacity.len() {
            let (opacity_stop, alpha) = (opacity[j], opacity[j + 1]);
            if opacity_stop < pos {
                stops.push(GradientStop {
                    offset: opacity_stop,
                    color: premultiplied(r, g, b, alpha),
                });
                j += 2;
                continue;
            }
            let alpha = if j == 0 {
                alpha
            } else {
                interpolate(pos, opacity[j - 2], opacity[j - 1], opacity_stop, alpha)
            };
            stops.push(GradientStop {
                offset: pos,
                color: premultiplied(r, g, b, alpha),
            });
            j += 2;
            placed = true;
            break;
        }
        if !placed {
            // Every opacity stop lies before this color stop.
            let alpha = opacity[opacity.len() - 1];
            stops.push(GradientStop {
                offset: pos,
                color: premultiplied(r, g, b, alpha),
            });
        }
    }
    stops
}

fn interpolate(pos: f32, stop1: f32, op1: f32, stop2: f32, op2: f32) -> f32 {
    let span = stop2 - stop1;
    if span.abs() <= f32::EPSILON {
        return op2;
    }
    let progress = (pos - stop1) / span;
    op1 + progress * (op2 - op1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lottie_data::model::{Keyframe, Property};

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn test_opacity_interpolated_at_color_stop() {
        // One red stop at 0.5, opacity ramps 1 -> 0.
        let buffer = [0.5, 1.0, 0.0, 0.0, 0.0, 1.0, 1.0, 0.0];
        let stops = merge_stops(&buffer, 1);
        let last = stops.last().unwrap();
        assert!(approx(last.offset, 0.5));
        assert!(approx(last.color.w, 0.5));
        // Premultiplied red.
        assert!(approx(last.color.x, 0.5));
    }

    #[test]
    fn test_colors_without_opacity_are_opaque() {
        let buffer = [0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0];
        let stops = merge_stops(&buffer, 2);
        assert_eq!(stops.len(), 2);
        assert_eq!(stops[0].color, Vec4::new(1.0, 0.0, 0.0, 1.0));
        assert_eq!(stops[1].offset, 1.0);
        assert_eq!(stops[1].color, Vec4::new(0.0, 0.0, 1.0, 1.0));
    }

    #[test]
    fn test_legacy_color_count_inferred() {
        let buffer = [0.0, 1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0];
        let stops = merge_stops(&buffer, -1);
        assert_eq!(stops.len(), 2);
        assert_eq!(stops[1].color, Vec4::new(0.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn test_color_stop_order_is_kept() {
        let buffer = [
            0.0, 1.0, 0.0, 0.0, //
            1.0, 0.0, 1.0, 0.0, //
            0.0, 1.0, 1.0, 0.2,
        ];
        let stops = merge_stops(&buffer, 2);
        assert_eq!(stops.len(), 2);
        assert!(approx(stops[0].color.w, 1.0));
        assert!(approx(stops[1].color.w, 0.2));
        assert!(stops[0].offset <= stops[1].offset);
    }

    #[test]
    fn test_clamp_past_last_opacity_stop() {
        let buffer = [
            0.0, 1.0, 1.0, 1.0, //
            1.0, 1.0, 1.0, 1.0, //
            0.0, 1.0, 0.5, 0.4,
        ];
        let stops = merge_stops(&buffer, 2);
        // The opacity stop at 0.5 is emitted before the color stop at 1.0,
        // which keeps the last opacity.
        assert_eq!(stops.len(), 3);
        assert!(approx(stops[1].offset, 0.5));
        assert!(approx(stops[2].offset, 1.0));
        assert!(approx(stops[2].color.w, 0.4));
    }

    #[test]
    fn test_focal_point() {
        let start = Vec2::ZERO;
        let end = Vec2::new(10.0, 0.0);
        assert_eq!(focal_point(start, end, 0.0, 0.0), start);
        let f = focal_point(start, end, 50.0, 90.0);
        assert!(approx(f.x, 0.0) && approx(f.y, 5.0));
        // 100% is pulled just inside the circle.
        let edge = focal_point(start, end, 100.0, 0.0);
        assert!(approx(edge.x, 9.9));
    }

    #[test]
    fn test_evaluate_radial() {
        let node = GradientNode {
            kind: GradientKind::Radial,
            start: Animated::constant(Vec2::new(5.0, 5.0)),
            end: Animated::constant(Vec2::new(5.0, 15.0)),
            highlight_length: Animated::constant(0.0),
            highlight_angle: Animated::constant(0.0),
            buffer: Animated::constant(vec![0.0, 1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0]),
            color_points: 2,
            cached_stops: None,
        };
        assert!(node.is_static());
        let g = node.evaluate(0.0, Mat3::IDENTITY);
        assert!(approx(g.radius(), 10.0));
        assert_eq!(g.focal, Vec2::new(5.0, 5.0));
        assert_eq!(g.focal_radius, 0.0);
        assert_eq!(g.stops.len(), 2);
    }

    #[test]
    fn test_static_stops_are_merged_once() {
        let mut node = GradientNode {
            kind: GradientKind::Linear,
            start: Animated::constant(Vec2::ZERO),
            end: Animated::constant(Vec2::new(10.0, 0.0)),
            highlight_length: Animated::constant(0.0),
            highlight_angle: Animated::constant(0.0),
            buffer: Animated::constant(vec![0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0]),
            color_points: 2,
            cached_stops: None,
        };
        node.cache_stops();
        let cached = node.cached_stops.clone().unwrap();
        assert_eq!(cached.len(), 2);
        assert_eq!(node.populate(12.0), cached);

        // Later frames read the cache, not the buffer.
        let marker = vec![GradientStop {
            offset: 0.25,
            color: Vec4::new(0.0, 1.0, 0.0, 1.0),
        }];
        node.cached_stops = Some(marker.clone());
        assert_eq!(node.evaluate(12.0, Mat3::IDENTITY).stops, marker);
    }

    #[test]
    fn test_animated_stops_are_not_cached() {
        let mut node = GradientNode {
            kind: GradientKind::Linear,
            start: Animated::constant(Vec2::ZERO),
            end: Animated::constant(Vec2::new(10.0, 0.0)),
            highlight_length: Animated::constant(0.0),
            highlight_angle: Animated::constant(0.0),
            buffer: Animated::from_property(
                &Property::animated(vec![
                    Keyframe::new(0.0, vec![0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0]),
                    Keyframe::new(10.0, vec![0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 1.0]),
                ]),
                Vec::new(),
                |v: &Vec<f32>| v.clone(),
            ),
            color_points: 2,
            cached_stops: None,
        };
        node.cache_stops();
        assert!(node.cached_stops.is_none());
        assert!(approx(node.populate(0.0)[0].color.x, 1.0));
        assert!(approx(node.populate(10.0)[0].color.y, 1.0));
    }
}
