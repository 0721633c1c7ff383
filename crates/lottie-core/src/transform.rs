//! # Transform
//!
//! Keyframed transform properties and the matrices derived from them.
//!
//! ## Responsibilities
//! - **Layer/group matrix**: `T(position) · R(rotation) · R(auto-orient) ·
//!   [R(z) · R(y) · R(x)] · S(scale) · T(-anchor)`, column-vector convention.
//! - **Repeater matrix**: per-copy offset scaled by a copy multiplier.
//! - **Static cache**: transforms with no animated channel keep their frame-0
//!   matrix and never re-evaluate.

use crate::animatable::Animated;
use glam::{Mat3, Vec2, Vec3};
use kurbo::{BezPath, PathEl, Point};
use lottie_data::model as data;

/// Inverse distance from the eye to the projection plane used by the X/Y
/// rotations of 3-D layers.
const INV_DIST_TO_PLANE: f32 = 1.0 / 1024.0;

#[derive(Clone, Debug)]
pub enum Position {
    Unified(Animated<Vec2>),
    Split { x: Animated<f32>, y: Animated<f32> },
}

impl Position {
    pub fn value(&self, frame: f32) -> Vec2 {
        match self {
            Position::Unified(p) => p.value(frame),
            Position::Split { x, y } => Vec2::new(x.value(frame), y.value(frame)),
        }
    }

    /// Motion-path heading in degrees; separate channels carry no path.
    pub fn angle(&self, frame: f32) -> f32 {
        match self {
            Position::Unified(p) => p.angle(frame),
            Position::Split { .. } => 0.0,
        }
    }

    pub fn is_static(&self) -> bool {
        match self {
            Position::Unified(p) => p.is_static(),
            Position::Split { x, y } => x.is_static() && y.is_static(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Rotation3d {
    pub rx: Animated<f32>,
    pub ry: Animated<f32>,
    pub rz: Animated<f32>,
}

#[derive(Clone, Debug)]
pub struct TransformNode {
    pub anchor: Animated<Vec2>,
    pub position: Position,
    /// Percent.
    pub scale: Animated<Vec2>,
    /// Degrees.
    pub rotation: Animated<f32>,
    /// Percent.
    pub opacity: Animated<f32>,
    pub rotation_3d: Option<Rotation3d>,
    cached: Option<Mat3>,
}

impl Default for TransformNode {
    fn default() -> Self {
        Self {
            anchor: Animated::constant(Vec2::ZERO),
            position: Position::Unified(Animated::constant(Vec2::ZERO)),
            scale: Animated::constant(Vec2::splat(100.0)),
            rotation: Animated::constant(0.0),
            opacity: Animated::constant(100.0),
            rotation_3d: None,
            cached: None,
        }
    }
}

impl TransformNode {
    pub fn from_data(ks: &data::Transform, is_3d: bool) -> Self {
        let anchor = Animated::from_spatial_property(&ks.a, Vec2::ZERO, |v| Vec2::new(v.0[0], v.0[1]));
        let position = match &ks.p {
            data::PositionProperty::Unified(p) => Position::Unified(Animated::from_spatial_property(
                p,
                Vec2::ZERO,
                |v| Vec2::new(v.0[0], v.0[1]),
            )),
            data::PositionProperty::Split { x, y, .. } => Position::Split {
                x: Animated::from_property(x, 0.0, |v| *v),
                y: Animated::from_property(y, 0.0, |v| *v),
            },
        };
        let scale = Animated::from_property(&ks.s, Vec2::splat(100.0), |v| Vec2::new(v.0[0], v.0[1]));
        let opacity = Animated::from_property(&ks.o, 100.0, |v| *v);

        // 2-D documents sometimes store the rotation under `rz`.
        let rz_as_rotation = !is_3d && matches!(ks.r.k, data::Value::Default);
        let rotation = match (&ks.rz, rz_as_rotation) {
            (Some(rz), true) => Animated::from_property(rz, 0.0, |v| *v),
            _ => Animated::from_property(&ks.r, 0.0, |v| *v),
        };

        let rotation_3d = is_3d.then(|| {
            let axis = |p: &Option<data::Property<f32>>| match p {
                Some(p) => Animated::from_property(p, 0.0, |v| *v),
                None => Animated::constant(0.0),
            };
            Rotation3d {
                rx: axis(&ks.rx),
                ry: axis(&ks.ry),
                rz: axis(&ks.rz),
            }
        });

        Self {
            anchor,
            position,
            scale,
            rotation,
            opacity,
            rotation_3d,
            cached: None,
        }
    }

    pub fn is_static(&self) -> bool {
        let rotation_3d_static = self
            .rotation_3d
            .as_ref()
            .map(|r| r.rx.is_static() && r.ry.is_static() && r.rz.is_static())
            .unwrap_or(true);
        self.anchor.is_static()
            && self.position.is_static()
            && self.scale.is_static()
            && self.rotation.is_static()
            && self.opacity.is_static()
            && rotation_3d_static
    }

    /// Stores the frame-0 matrix when nothing is animated.
    pub fn cache_matrix(&mut self) {
        self.cached = if self.is_static() {
            Some(self.compute_matrix(0.0, false))
        } else {
            None
        };
    }

    pub fn cached_matrix(&self) -> Option<Mat3> {
        self.cached
    }

    pub fn matrix(&self, frame: f32, auto_orient: bool) -> Mat3 {
        match self.cached {
            Some(m) => m,
            None => self.compute_matrix(frame, auto_orient),
        }
    }

    pub fn compute_matrix(&self, frame: f32, auto_orient: bool) -> Mat3 {
        let position = self.position.value(frame);
        let angle = if auto_orient {
            self.position.angle(frame)
        } else {
            0.0
        };

        let mut m = Mat3::from_translation(position)
            * rotate_z(self.rotation.value(frame))
            * rotate_z(angle);
        if let Some(r3) = &self.rotation_3d {
            m = m
                * rotate_z(r3.rz.value(frame))
                * rotate_y(r3.ry.value(frame))
                * rotate_x(r3.rx.value(frame));
        }
        m * Mat3::from_scale(self.scale.value(frame) / 100.0)
            * Mat3::from_translation(-self.anchor.value(frame))
    }

    /// Matrix of one repeater copy: position and rotation are multiplied by
    /// `multiplier`, scale is raised to its power and the anchor is applied
    /// as a positive, unscaled offset.
    pub fn matrix_for_repeater(&self, frame: f32, multiplier: f32) -> Mat3 {
        let scale = self.scale.value(frame) / 100.0;
        let scale = Vec2::new(scale.x.powf(multiplier), scale.y.powf(multiplier));
        Mat3::from_translation(self.position.value(frame) * multiplier)
            * rotate_z(self.rotation.value(frame) * multiplier)
            * Mat3::from_scale(scale)
            * Mat3::from_translation(self.anchor.value(frame))
    }

    /// Opacity in `[0, 1]`.
    pub fn opacity(&self, frame: f32) -> f32 {
        (self.opacity.value(frame) / 100.0).clamp(0.0, 1.0)
    }
}

pub fn rotate_z(degrees: f32) -> Mat3 {
    if degrees == 0.0 {
        return Mat3::IDENTITY;
    }
    Mat3::from_angle(degrees.to_radians())
}

/// Rotation about the Y axis projected onto the XY plane.
pub fn rotate_y(degrees: f32) -> Mat3 {
    if degrees == 0.0 {
        return Mat3::IDENTITY;
    }
    let (sin, cos) = degrees.to_radians().sin_cos();
    Mat3::from_cols(
        Vec3::new(cos, 0.0, -sin * INV_DIST_TO_PLANE),
        Vec3::Y,
        Vec3::Z,
    )
}

/// Rotation about the X axis projected onto the XY plane.
pub fn rotate_x(degrees: f32) -> Mat3 {
    if degrees == 0.0 {
        return Mat3::IDENTITY;
    }
    let (sin, cos) = degrees.to_radians().sin_cos();
    Mat3::from_cols(
        Vec3::X,
        Vec3::new(0.0, cos, -sin * INV_DIST_TO_PLANE),
        Vec3::Z,
    )
}

/// Maps a point, dividing by `w` when the matrix is projective.
pub fn map_point(m: &Mat3, p: Vec2) -> Vec2 {
    let v = *m * Vec3::new(p.x, p.y, 1.0);
    if v.z != 1.0 && v.z.abs() > f32::EPSILON {
        Vec2::new(v.x / v.z, v.y / v.z)
    } else {
        Vec2::new(v.x, v.y)
    }
}

/// Uniform scale a matrix applies to lengths, measured on a unit diagonal.
pub fn scale_factor(m: &Mat3) -> f32 {
    let h = std::f32::consts::FRAC_1_SQRT_2;
    let p1 = map_point(m, Vec2::ZERO);
    let p2 = map_point(m, Vec2::new(h, h));
    p1.distance(p2)
}

pub fn transform_path(path: &BezPath, m: &Mat3) -> BezPath {
    if *m == Mat3::IDENTITY {
        return path.clone();
    }
    let map = |p: Point| {
        let q = map_point(m, Vec2::new(p.x as f32, p.y as f32));
        Point::new(q.x as f64, q.y as f64)
    };
    path.elements()
        .iter()
        .map(|el| match *el {
            PathEl::MoveTo(p) => PathEl::MoveTo(map(p)),
            PathEl::LineTo(p) => PathEl::LineTo(map(p)),
            PathEl::QuadTo(p1, p2) => PathEl::QuadTo(map(p1), map(p2)),
            PathEl::CurveTo(p1, p2, p3) => PathEl::CurveTo(map(p1), map(p2), map(p3)),
            PathEl::ClosePath => PathEl::ClosePath,
        })
        .collect()
}
