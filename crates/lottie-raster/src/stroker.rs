//! Stroke expansion through `tiny-skia`'s path stroker.
//!
//! The outline it produces is filled with the non-zero rule.

use kurbo::{BezPath, PathEl};
use lottie_core::{LineCap, LineJoin};
use tiny_skia::{PathBuilder, PathSegment};
use tracing::trace;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrokeInfo {
    pub width: f32,
    pub cap: LineCap,
    pub join: LineJoin,
    pub miter_limit: f32,
}

impl Default for StrokeInfo {
    fn default() -> Self {
        Self {
            width: 1.0,
            cap: LineCap::default(),
            join: LineJoin::default(),
            miter_limit: 4.0,
        }
    }
}

fn to_skia_path(path: &BezPath) -> Option<tiny_skia::Path> {
    let mut pb = PathBuilder::new();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => pb.move_to(p.x as f32, p.y as f32),
            PathEl::LineTo(p) => pb.line_to(p.x as f32, p.y as f32),
            PathEl::QuadTo(p1, p) => pb.quad_to(p1.x as f32, p1.y as f32, p.x as f32, p.y as f32),
            PathEl::CurveTo(p1, p2, p) => pb.cubic_to(
                p1.x as f32,
                p1.y as f32,
                p2.x as f32,
                p2.y as f32,
                p.x as f32,
                p.y as f32,
            ),
            PathEl::ClosePath => pb.close(),
        }
    }
    pb.finish()
}

fn from_skia_path(path: &tiny_skia::Path) -> BezPath {
    let pt = |p: tiny_skia::Point| (f64::from(p.x), f64::from(p.y));
    let mut out = BezPath::new();
    for segment in path.segments() {
        match segment {
            PathSegment::MoveTo(p) => out.move_to(pt(p)),
            PathSegment::LineTo(p) => out.line_to(pt(p)),
            PathSegment::QuadTo(p1, p) => out.quad_to(pt(p1), pt(p)),
            PathSegment::CubicTo(p1, p2, p) => out.curve_to(pt(p1), pt(p2), pt(p)),
            PathSegment::Close => out.close_path(),
        }
    }
    out
}

/// Expands `path` into the outline of its stroke. Returns an empty path when
/// there is nothing to draw.
pub fn stroke_outline(path: &BezPath, info: &StrokeInfo) -> BezPath {
    if info.width.is_nan() || info.width <= 0.0 {
        return BezPath::new();
    }
    let Some(skia_path) = to_skia_path(path) else {
        trace!("stroke skipped: path has no drawable segments");
        return BezPath::new();
    };

    let stroke = tiny_skia::Stroke {
        width: info.width,
        miter_limit: info.miter_limit,
        line_cap: match info.cap {
            LineCap::Butt => tiny_skia::LineCap::Butt,
            LineCap::Round => tiny_skia::LineCap::Round,
            LineCap::Square => tiny_skia::LineCap::Square,
        },
        line_join: match info.join {
            LineJoin::Miter => tiny_skia::LineJoin::Miter,
            LineJoin::Round => tiny_skia::LineJoin::Round,
            LineJoin::Bevel => tiny_skia::LineJoin::Bevel,
        },
        ..Default::default()
    };

    skia_path
        .stroke(&stroke, 1.0)
        .map(|outline| from_skia_path(&outline))
        .unwrap_or_default()
}
