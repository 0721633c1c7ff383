//! # Bezier Kernel
//!
//! Cubic Bezier segment math shared by path evaluation, trimming, dashing and
//! spatial keyframes.
//!
//! ## Key Functions
//! - `point_at`: nested-lerp evaluation, stable near the end points.
//! - `split` / `split_at` / `parameter_split_left`: de Casteljau subdivision.
//! - `length` / `t_at_length` / `split_at_length`: arc-length parameterization.
//! - `angle_at`: tangent direction in degrees.

use glam::Vec2;

/// Flatness tolerance used by [`Bezier::length`].
const LENGTH_TOLERANCE: f32 = 0.01;
/// Accepted error when searching for a parameter by arc length.
const T_AT_LENGTH_ERROR: f32 = 0.01;
const T_AT_LENGTH_MAX_ITERATIONS: usize = 64;
const MAX_SUBDIVISION_DEPTH: u32 = 16;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Bezier {
    pub p1: Vec2,
    pub p2: Vec2,
    pub p3: Vec2,
    pub p4: Vec2,
}

impl Bezier {
    pub fn from_points(p1: Vec2, p2: Vec2, p3: Vec2, p4: Vec2) -> Self {
        Self { p1, p2, p3, p4 }
    }

    /// A straight segment expressed as a cubic.
    pub fn line(from: Vec2, to: Vec2) -> Self {
        Self::from_points(from, from.lerp(to, 1.0 / 3.0), from.lerp(to, 2.0 / 3.0), to)
    }

    /// Bernstein weights `(a, b, c, d)` of the four control points at `t`.
    pub fn coefficients(t: f32) -> (f32, f32, f32, f32) {
        let m_t = 1.0 - t;
        let mut b = m_t * m_t;
        let mut c = t * t;
        let d = c * t;
        let a = b * m_t;
        b *= 3.0 * t;
        c *= 3.0 * m_t;
        (a, b, c, d)
    }

    pub fn point_at(&self, t: f32) -> Vec2 {
        let m_t = 1.0 - t;
        let mut a = self.p1 * m_t + self.p2 * t;
        let mut b = self.p2 * m_t + self.p3 * t;
        let c = self.p3 * m_t + self.p4 * t;
        a = a * m_t + b * t;
        b = b * m_t + c * t;
        a * m_t + b * t
    }

    pub fn derivative(&self, t: f32) -> Vec2 {
        let m_t = 1.0 - t;
        let a = m_t * m_t;
        let b = 2.0 * m_t * t;
        let c = t * t;
        ((self.p2 - self.p1) * a + (self.p3 - self.p2) * b + (self.p4 - self.p3) * c) * 3.0
    }

    /// Tangent direction at `t`, in degrees. Zero outside `[0, 1]`.
    pub fn angle_at(&self, t: f32) -> f32 {
        if !(0.0..=1.0).contains(&t) {
            return 0.0;
        }
        let d = self.derivative(t);
        d.y.atan2(d.x).to_degrees()
    }

    /// Splits at `t = 0.5`.
    pub fn split(&self) -> (Bezier, Bezier) {
        let c = (self.p2 + self.p3) * 0.5;
        let l2 = (self.p1 + self.p2) * 0.5;
        let r3 = (self.p3 + self.p4) * 0.5;
        let l3 = (l2 + c) * 0.5;
        let r2 = (r3 + c) * 0.5;
        let mid = (l3 + r2) * 0.5;
        (
            Bezier::from_points(self.p1, l2, l3, mid),
            Bezier::from_points(mid, r2, r3, self.p4),
        )
    }

    /// General de Casteljau split at `t`.
    pub fn split_at(&self, t: f32) -> (Bezier, Bezier) {
        let mut right = *self;
        let left = right.parameter_split_left(t);
        (left, right)
    }

    /// Returns the `[0, t]` part and keeps the `[t, 1]` part in `self`.
    pub fn parameter_split_left(&mut self, t: f32) -> Bezier {
        let l1 = self.p1;
        let l2 = self.p1 + (self.p2 - self.p1) * t;
        let tmp = self.p2 + (self.p3 - self.p2) * t;

        self.p3 += (self.p4 - self.p3) * t;
        self.p2 = tmp + (self.p3 - tmp) * t;
        let l3 = l2 + (tmp - l2) * t;
        let l4 = l3 + (self.p2 - l3) * t;
        self.p1 = l4;

        Bezier::from_points(l1, l2, l3, l4)
    }

    /// The sub-curve covering `[t0, t1]`.
    pub fn on_interval(&self, t0: f32, t1: f32) -> Bezier {
        if t0 == 0.0 && t1 == 1.0 {
            return *self;
        }
        let mut result = *self;
        if t0 > 0.0 {
            result.parameter_split_left(t0);
        }
        if t1 < 1.0 {
            let remaining = 1.0 - t0;
            if remaining > f32::EPSILON {
                result = result.parameter_split_left((t1 - t0) / remaining);
            }
        }
        result
    }

    pub fn length(&self) -> f32 {
        self.length_with_depth(0)
    }

    fn length_with_depth(&self, depth: u32) -> f32 {
        let polygon =
            self.p1.distance(self.p2) + self.p2.distance(self.p3) + self.p3.distance(self.p4);
        let chord = self.p1.distance(self.p4);
        if polygon - chord > LENGTH_TOLERANCE && depth < MAX_SUBDIVISION_DEPTH {
            let (left, right) = self.split();
            return left.length_with_depth(depth + 1) + right.length_with_depth(depth + 1);
        }
        polygon
    }

    /// Parameter at which the arc length from the start equals `len`,
    /// found by bisection.
    pub fn t_at_length(&self, len: f32) -> f32 {
        self.t_at_length_with_total(len, self.length())
    }

    pub fn t_at_length_with_total(&self, len: f32, total: f32) -> f32 {
        if len <= 0.0 {
            return 0.0;
        }
        if len >= total {
            return 1.0;
        }

        let mut t = 0.5;
        let mut last_bigger = 1.0;
        let mut last_smaller = 0.0;
        for _ in 0..T_AT_LENGTH_MAX_ITERATIONS {
            let left = self.on_interval(0.0, t);
            let left_len = left.length();
            if (left_len - len).abs() < T_AT_LENGTH_ERROR {
                break;
            }
            if left_len < len {
                last_smaller = t;
                t += (last_bigger - t) * 0.5;
            } else {
                last_bigger = t;
                t -= (t - last_smaller) * 0.5;
            }
        }
        t
    }

    /// Splits so that the left part has arc length `len`.
    pub fn split_at_length(&self, len: f32) -> (Bezier, Bezier) {
        let t = self.t_at_length(len);
        self.split_at(t)
    }

    pub fn is_degenerate(&self) -> bool {
        self.p1 == self.p2 && self.p2 == self.p3 && self.p3 == self.p4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Bezier {
        Bezier::from_points(
            Vec2::new(0.0, 0.0),
            Vec2::new(30.0, 80.0),
            Vec2::new(70.0, -40.0),
            Vec2::new(100.0, 20.0),
        )
    }

    fn close(a: Vec2, b: Vec2, eps: f32) -> bool {
        a.distance(b) < eps
    }

    #[test]
    fn test_coefficients_sum_to_one() {
        for i in 0..=10 {
            let (a, b, c, d) = Bezier::coefficients(i as f32 / 10.0);
            assert!((a + b + c + d - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_point_at_matches_coefficients() {
        let b = sample();
        for i in 0..=8 {
            let t = i as f32 / 8.0;
            let (ca, cb, cc, cd) = Bezier::coefficients(t);
            let expected = b.p1 * ca + b.p2 * cb + b.p3 * cc + b.p4 * cd;
            assert!(close(b.point_at(t), expected, 1e-3));
        }
        assert_eq!(b.point_at(0.0), b.p1);
        assert_eq!(b.point_at(1.0), b.p4);
    }

    #[test]
    fn test_split_at_reproduces_curve() {
        let b = sample();
        for &t in &[0.1f32, 0.37, 0.5, 0.8] {
            let (left, right) = b.split_at(t);
            assert_eq!(left.p4, right.p1);
            assert!(close(left.p4, b.point_at(t), 1e-4));
            for i in 0..=10 {
                let s = i as f32 / 10.0;
                assert!(close(left.point_at(s), b.point_at(s * t), 1e-3));
                assert!(close(right.point_at(s), b.point_at(t + s * (1.0 - t)), 1e-3));
            }
        }
    }

    #[test]
    fn test_midpoint_split_agrees_with_general_split() {
        let b = sample();
        let (l1, r1) = b.split();
        let (l2, r2) = b.split_at(0.5);
        assert!(close(l1.p4, l2.p4, 1e-4));
        assert!(close(l1.p2, l2.p2, 1e-4));
        assert!(close(r1.p3, r2.p3, 1e-4));
    }

    #[test]
    fn test_length_of_straight_segment() {
        let line = Bezier::line(Vec2::ZERO, Vec2::new(30.0, 40.0));
        assert!((line.length() - 50.0).abs() < 1e-3);
    }

    #[test]
    fn test_t_at_length_round_trip() {
        let b = sample();
        let total = b.length();
        for &fraction in &[0.1f32, 0.25, 0.5, 0.9] {
            let target = total * fraction;
            let t = b.t_at_length(target);
            let (left, _) = b.split_at(t);
            assert!((left.length() - target).abs() < 0.1, "fraction {fraction}");
        }
        assert_eq!(b.t_at_length(-1.0), 0.0);
        assert_eq!(b.t_at_length(total + 1.0), 1.0);
    }

    #[test]
    fn test_split_at_length_preserves_total() {
        let b = sample();
        let total = b.length();
        let (left, right) = b.split_at_length(total * 0.3);
        assert!((left.length() + right.length() - total).abs() < 0.5);
    }

    #[test]
    fn test_on_interval() {
        let b = sample();
        let part = b.on_interval(0.25, 0.75);
        assert!(close(part.p1, b.point_at(0.25), 1e-3));
        assert!(close(part.p4, b.point_at(0.75), 1e-3));
        assert!(close(part.point_at(0.5), b.point_at(0.5), 1e-3));
    }

    #[test]
    fn test_angle_at() {
        let horizontal = Bezier::line(Vec2::ZERO, Vec2::new(10.0, 0.0));
        assert!(horizontal.angle_at(0.5).abs() < 1e-4);
        let down = Bezier::line(Vec2::ZERO, Vec2::new(0.0, 10.0));
        assert!((down.angle_at(0.5) - 90.0).abs() < 1e-3);
        assert_eq!(down.angle_at(1.5), 0.0);
    }
}
