use crate::bezier::Bezier;
use glam::{Vec2, Vec4};
use lottie_data::model::{self as data, BezierTangent, Property, Value};

pub trait Interpolatable: Sized + Clone + Default {
    fn lerp(&self, other: &Self, t: f32) -> Self;

    fn lerp_spatial(&self, other: &Self, t: f32, _path: Option<&SpatialPath>) -> Self {
        self.lerp(other, t)
    }
}

impl Interpolatable for f32 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

impl Interpolatable for Vec2 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Vec2::lerp(*self, *other, t)
    }

    fn lerp_spatial(&self, other: &Self, t: f32, path: Option<&SpatialPath>) -> Self {
        match path {
            Some(path) => path.point_at_progress(t),
            None => self.lerp(other, t),
        }
    }
}

impl Interpolatable for Vec4 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Vec4::lerp(*self, *other, t)
    }
}

// For gradient buffers (Vec<f32>)
impl Interpolatable for Vec<f32> {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        if self.len() != other.len() {
            return if t < 1.0 { self.clone() } else { other.clone() };
        }
        self.iter()
            .zip(other.iter())
            .map(|(a, b)| a + (b - a) * t)
            .collect()
    }
}

// Cubic Bezier Easing
pub fn solve_cubic_bezier(p1: Vec2, p2: Vec2, x: f32) -> f32 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    // Newton-Raphson
    let mut t = x;
    for _ in 0..8 {
        let one_minus_t = 1.0 - t;
        let x_est = 3.0 * one_minus_t * one_minus_t * t * p1.x
            + 3.0 * one_minus_t * t * t * p2.x
            + t * t * t;

        let err = x_est - x;
        if err.abs() < 1e-4 {
            break;
        }

        let dx_dt = 3.0 * one_minus_t * one_minus_t * p1.x
            + 6.0 * one_minus_t * t * (p2.x - p1.x)
            + 3.0 * t * t * (1.0 - p2.x);

        if dx_dt.abs() < 1e-6 {
            break;
        }
        t -= err / dx_dt;
    }

    let one_minus_t = 1.0 - t;
    3.0 * one_minus_t * one_minus_t * t * p1.y + 3.0 * one_minus_t * t * t * p2.y + t * t * t
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Easing {
    pub out_tangent: Vec2,
    pub in_tangent: Vec2,
}

impl Easing {
    pub fn apply(&self, progress: f32) -> f32 {
        solve_cubic_bezier(self.out_tangent, self.in_tangent, progress)
    }
}

/// Motion path of a position keyframe, traversed at constant speed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpatialPath {
    pub curve: Bezier,
    pub length: f32,
}

impl SpatialPath {
    pub fn new(curve: Bezier) -> Self {
        Self {
            curve,
            length: curve.length(),
        }
    }

    fn t_at_progress(&self, progress: f32) -> f32 {
        self.curve
            .t_at_length_with_total(progress * self.length, self.length)
    }

    pub fn point_at_progress(&self, progress: f32) -> Vec2 {
        self.curve.point_at(self.t_at_progress(progress))
    }

    pub fn angle_at_progress(&self, progress: f32) -> f32 {
        self.curve.angle_at(self.t_at_progress(progress))
    }
}

#[derive(Clone, Debug)]
pub struct Keyframe<T> {
    pub start_frame: f32,
    pub end_frame: f32,
    pub start: T,
    pub end: T,
    pub easing: Option<Easing>,
    pub hold: bool,
    pub path: Option<SpatialPath>,
}

impl<T: Interpolatable> Keyframe<T> {
    fn progress(&self, frame: f32) -> f32 {
        let duration = self.end_frame - self.start_frame;
        if duration <= 0.0 {
            return 1.0;
        }
        let progress = ((frame - self.start_frame) / duration).clamp(0.0, 1.0);
        match &self.easing {
            Some(easing) => easing.apply(progress),
            None => progress,
        }
    }

    pub fn value(&self, frame: f32) -> T {
        if self.hold {
            return self.start.clone();
        }
        let t = self.progress(frame);
        self.start.lerp_spatial(&self.end, t, self.path.as_ref())
    }

    pub fn angle(&self, frame: f32) -> f32 {
        match &self.path {
            Some(path) if !self.hold => path.angle_at_progress(self.progress(frame)),
            _ => 0.0,
        }
    }
}

/// A keyframed property compiled from the document.
#[derive(Clone, Debug)]
pub enum Animated<T> {
    Static(T),
    Keyframed(Vec<Keyframe<T>>),
}

impl<T: Interpolatable> Animated<T> {
    pub fn from_property<D>(prop: &Property<D>, default: T, convert: impl Fn(&D) -> T) -> Self {
        Self::compile(prop, default, convert, |_, _, _| None)
    }

    fn compile<D>(
        prop: &Property<D>,
        default: T,
        convert: impl Fn(&D) -> T,
        spatial: impl Fn(&data::Keyframe<D>, &T, &T) -> Option<SpatialPath>,
    ) -> Self {
        let keyframes = match &prop.k {
            Value::Default => return Animated::Static(default),
            Value::Static(v) => return Animated::Static(convert(v)),
            Value::Animated(keyframes) => keyframes,
        };

        match keyframes.len() {
            0 => return Animated::Static(default),
            1 => {
                let value = keyframes[0].s.as_ref().map(&convert).unwrap_or(default);
                return Animated::Static(value);
            }
            _ => {}
        }

        let mut compiled: Vec<Keyframe<T>> = Vec::with_capacity(keyframes.len() - 1);
        for pair in keyframes.windows(2) {
            let (kf, next) = (&pair[0], &pair[1]);
            let start = kf
                .s
                .as_ref()
                .map(&convert)
                .or_else(|| compiled.last().map(|prev| prev.end.clone()))
                .unwrap_or_else(|| default.clone());
            let end = kf
                .e
                .as_ref()
                .or(next.s.as_ref())
                .map(&convert)
                .unwrap_or_else(|| start.clone());
            let easing = easing_of(kf.o, kf.i);
            let path = spatial(kf, &start, &end);
            compiled.push(Keyframe {
                start_frame: kf.t,
                end_frame: next.t,
                start,
                end,
                easing,
                hold: kf.h == Some(1),
                path,
            });
        }

        Animated::Keyframed(compiled)
    }

    pub fn is_static(&self) -> bool {
        matches!(self, Animated::Static(_))
    }

    fn keyframe_at(keyframes: &[Keyframe<T>], frame: f32) -> Option<&Keyframe<T>> {
        let first = keyframes.first()?;
        let last = keyframes.last()?;
        if frame <= first.start_frame || frame >= last.end_frame {
            return None;
        }
        // First keyframe whose segment ends after `frame`.
        let idx = keyframes.partition_point(|kf| kf.end_frame <= frame);
        keyframes.get(idx)
    }

    pub fn value(&self, frame: f32) -> T {
        match self {
            Animated::Static(v) => v.clone(),
            Animated::Keyframed(keyframes) => {
                if let Some(kf) = Self::keyframe_at(keyframes, frame) {
                    return kf.value(frame);
                }
                match (keyframes.first(), keyframes.last()) {
                    (Some(first), _) if frame <= first.start_frame => first.start.clone(),
                    (_, Some(last)) => last.end.clone(),
                    _ => T::default(),
                }
            }
        }
    }

    /// Tangent angle of a motion path at `frame`, in degrees.
    pub fn angle(&self, frame: f32) -> f32 {
        match self {
            Animated::Static(_) => 0.0,
            Animated::Keyframed(keyframes) => Self::keyframe_at(keyframes, frame)
                .map(|kf| kf.angle(frame))
                .unwrap_or(0.0),
        }
    }
}

impl Animated<Vec2> {
    /// Like [`Animated::from_property`], but keyframes carrying `to`/`ti`
    /// tangents move along their motion path.
    pub fn from_spatial_property<D>(
        prop: &Property<D>,
        default: Vec2,
        convert: impl Fn(&D) -> Vec2,
    ) -> Self {
        Self::compile(prop, default, convert, |kf, start, end| {
            let out_tangent = tangent(kf.to.as_deref());
            let in_tangent = tangent(kf.ti.as_deref());
            if out_tangent == Vec2::ZERO && in_tangent == Vec2::ZERO {
                return None;
            }
            if start == end {
                return None;
            }
            let curve = Bezier::from_points(*start, *start + out_tangent, *end + in_tangent, *end);
            Some(SpatialPath::new(curve))
        })
    }
}

impl<T> Animated<T> {
    pub fn constant(value: T) -> Self {
        Animated::Static(value)
    }
}

fn tangent(values: Option<&[f32]>) -> Vec2 {
    match values {
        Some([x, y, ..]) => Vec2::new(*x, *y),
        _ => Vec2::ZERO,
    }
}

fn easing_of(out_tangent: Option<BezierTangent>, in_tangent: Option<BezierTangent>) -> Option<Easing> {
    if out_tangent.is_none() && in_tangent.is_none() {
        return None;
    }
    let out_tangent = out_tangent.map(|o| Vec2::new(o.x, o.y)).unwrap_or(Vec2::ZERO);
    let in_tangent = in_tangent.map(|i| Vec2::new(i.x, i.y)).unwrap_or(Vec2::ONE);
    Some(Easing {
        out_tangent,
        in_tangent,
    })
}
