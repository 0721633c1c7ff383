//! # Drawable
//!
//! One paint operation ready for rasterization: a device-space path, an
//! optional stroke, a dash pattern and a brush.
//!
//! Setters only record the new state and mark it dirty. [`Drawable::preprocess`]
//! applies the dash, then launches stroke expansion and coverage fill
//! on the rayon pool. [`Drawable::rle`] joins that work once and caches the
//! coverage until the next `preprocess`.
//!
//! There is no cancellation: changing a drawable after `preprocess` leaves
//! the previous coverage in place until `preprocess` runs again.

use crate::brush::Brush;
use crate::rasterizer::DEFAULT_TOLERANCE;
use crate::rle::Rle;
use crate::stroker::StrokeInfo;
use crate::task::{RasterJob, RleTask};
use kurbo::BezPath;
use lottie_core::dash::apply_dash;
use lottie_core::{DashPattern, FillRule};
use std::ops::{BitOr, BitOrAssign};
use tiny_skia::IntRect;
use tracing::debug;

static EMPTY_RLE: Rle = Rle::new();

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DirtyFlags(u8);

impl DirtyFlags {
    pub const NONE: Self = Self(0);
    pub const PATH: Self = Self(1);
    pub const STROKE: Self = Self(1 << 1);
    pub const BRUSH: Self = Self(1 << 2);
    pub const ALL: Self = Self(Self::PATH.0 | Self::STROKE.0 | Self::BRUSH.0);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for DirtyFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for DirtyFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

#[derive(Debug, Default)]
enum RleState {
    #[default]
    Idle,
    Pending(RleTask),
    Ready(Rle),
}

#[derive(Debug)]
pub struct Drawable {
    flags: DirtyFlags,
    path: BezPath,
    brush: Brush,
    stroke: Option<StrokeInfo>,
    dash: Option<DashPattern>,
    fill_rule: FillRule,
    tolerance: f32,
    clip: Option<IntRect>,
    state: RleState,
}

impl Default for Drawable {
    fn default() -> Self {
        Self::new()
    }
}

impl Drawable {
    pub fn new() -> Self {
        Self {
            flags: DirtyFlags::ALL,
            path: BezPath::new(),
            brush: Brush::default(),
            stroke: None,
            dash: None,
            fill_rule: FillRule::NonZero,
            tolerance: DEFAULT_TOLERANCE,
            clip: None,
            state: RleState::Idle,
        }
    }

    pub fn with_tolerance(mut self, tolerance: f32) -> Self {
        self.tolerance = tolerance;
        self.flags |= DirtyFlags::PATH;
        self
    }

    pub fn flags(&self) -> DirtyFlags {
        self.flags
    }

    pub fn brush(&self) -> &Brush {
        &self.brush
    }

    pub fn set_path(&mut self, path: BezPath) {
        self.path = path;
        self.flags |= DirtyFlags::PATH;
    }

    pub fn set_brush(&mut self, brush: Brush) {
        self.brush = brush;
        self.flags |= DirtyFlags::BRUSH;
    }

    /// Turns the drawable into a stroke; `None` fills the path.
    pub fn set_stroke_info(&mut self, stroke: Option<StrokeInfo>) {
        self.stroke = stroke;
        self.flags |= DirtyFlags::STROKE;
    }

    /// Only applied to strokes. Solid patterns are dropped.
    pub fn set_dash_info(&mut self, dash: Option<DashPattern>) {
        self.dash = dash.filter(|d| !d.is_solid());
        self.flags |= DirtyFlags::STROKE;
    }

    pub fn set_fill_rule(&mut self, rule: FillRule) {
        self.fill_rule = rule;
        self.flags |= DirtyFlags::PATH;
    }

    fn job(&self, clip: IntRect) -> RasterJob {
        let path = match (&self.stroke, &self.dash) {
            (Some(_), Some(dash)) => apply_dash(&self.path, dash),
            _ => self.path.clone(),
        };
        RasterJob {
            path,
            stroke: self.stroke,
            fill_rule: self.fill_rule,
            clip,
            tolerance: self.tolerance,
        }
    }

    /// Starts rasterization of the current state within `clip`. A brush
    /// change alone keeps the existing coverage; a new clip does not.
    pub fn preprocess(&mut self, clip: IntRect) {
        if self.clip.replace(clip) != Some(clip) {
            self.flags |= DirtyFlags::PATH;
        }
        let geometry_dirty = self.flags.intersects(DirtyFlags::PATH | DirtyFlags::STROKE);
        let has_coverage = !matches!(self.state, RleState::Idle);
        if has_coverage && !geometry_dirty {
            self.flags = DirtyFlags::NONE;
            return;
        }
        self.state = RleState::Pending(RleTask::spawn(self.job(clip)));
        self.flags = DirtyFlags::NONE;
    }

    /// Rasterizes synchronously on the calling thread.
    pub fn preprocess_blocking(&mut self, clip: IntRect) {
        self.clip = Some(clip);
        self.state = RleState::Ready(self.job(clip).run());
        self.flags = DirtyFlags::NONE;
    }

    fn resolve(&mut self) {
        if matches!(self.state, RleState::Pending(_)) {
            if let RleState::Pending(task) = std::mem::take(&mut self.state) {
                self.state = RleState::Ready(task.join());
            }
        }
    }

    /// Coverage from the last `preprocess`, waiting for it if needed.
    pub fn rle(&mut self) -> &Rle {
        self.resolve();
        match &self.state {
            RleState::Ready(rle) => rle,
            _ => {
                debug!("rle requested before preprocess");
                &EMPTY_RLE
            }
        }
    }

    /// Joins the coverage and paints it onto `surface` with the brush.
    pub fn draw(&mut self, surface: &mut crate::surface::Surface) {
        self.resolve();
        match &self.state {
            RleState::Ready(rle) => surface.fill_rle(rle, &self.brush),
            _ => debug!("draw requested before preprocess"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::{Rect, Shape};

    fn clip() -> IntRect {
        IntRect::from_xywh(0, 0, 32, 32).unwrap()
    }

    #[test]
    fn test_setters_only_mark_dirty() {
        let mut d = Drawable::new();
        assert_eq!(d.flags(), DirtyFlags::ALL);
        d.preprocess(clip());
        assert!(d.flags().is_empty());

        d.set_brush(Brush::default());
        assert_eq!(d.flags(), DirtyFlags::BRUSH);
        d.set_fill_rule(FillRule::EvenOdd);
        assert!(d.flags().contains(DirtyFlags::BRUSH | DirtyFlags::PATH));
        assert!(!d.flags().contains(DirtyFlags::STROKE));
    }

    #[test]
    fn test_rle_before_preprocess_is_empty() {
        let mut d = Drawable::new();
        d.set_path(Rect::new(0.0, 0.0, 4.0, 4.0).to_path(0.1));
        assert!(d.rle().is_empty());
    }

    #[test]
    fn test_rle_is_cached_until_next_preprocess() {
        let mut d = Drawable::new();
        d.set_path(Rect::new(0.0, 0.0, 4.0, 4.0).to_path(0.1));
        d.preprocess(clip());
        assert!((d.rle().area() - 16.0).abs() < 1e-3);

        // Stale until preprocessed again.
        d.set_path(Rect::new(0.0, 0.0, 8.0, 8.0).to_path(0.1));
        assert!((d.rle().area() - 16.0).abs() < 1e-3);
        d.preprocess(clip());
        assert!((d.rle().area() - 64.0).abs() < 1e-3);
    }

    #[test]
    fn test_new_clip_recomputes_coverage() {
        let mut d = Drawable::new();
        d.set_path(Rect::new(0.0, 0.0, 8.0, 8.0).to_path(0.1));
        d.preprocess(clip());
        assert!((d.rle().area() - 64.0).abs() < 1e-3);

        // Same clip, nothing dirty: coverage is kept.
        d.preprocess(clip());
        assert!(d.flags().is_empty());
        assert!((d.rle().area() - 64.0).abs() < 1e-3);

        let small = IntRect::from_xywh(0, 0, 2, 3).unwrap();
        d.preprocess(small);
        assert_eq!(d.rle().bounds(), Some(small));
        assert!((d.rle().area() - 6.0).abs() < 1e-3);
    }

    #[test]
    fn test_dash_applies_to_strokes_only() {
        let mut line = BezPath::new();
        line.move_to((0.0, 10.0));
        line.line_to((20.0, 10.0));

        let stroke = StrokeInfo {
            width: 2.0,
            cap: lottie_core::LineCap::Butt,
            ..Default::default()
        };
        let mut solid = Drawable::new();
        solid.set_path(line.clone());
        solid.set_stroke_info(Some(stroke));
        solid.preprocess(clip());

        let mut dashed = Drawable::new();
        dashed.set_path(line);
        dashed.set_stroke_info(Some(stroke));
        dashed.set_dash_info(Some(DashPattern {
            array: vec![5.0, 5.0],
        }));
        dashed.preprocess(clip());

        assert!((solid.rle().area() - 40.0).abs() < 0.5);
        assert!((dashed.rle().area() - 20.0).abs() < 0.5);
    }

    #[test]
    fn test_async_matches_blocking() {
        let path = kurbo::Circle::new((15.5, 12.25), 9.0).to_path(0.01);
        let mut a = Drawable::new();
        a.set_path(path.clone());
        a.preprocess(clip());

        let mut b = Drawable::new();
        b.set_path(path);
        b.preprocess_blocking(clip());

        assert_eq!(a.rle(), b.rle());
    }
}
