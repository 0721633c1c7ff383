//! Path fill into run-length coverage.
//!
//! Curves are flattened with `kurbo`, the polygon is filled into an
//! anti-aliased `tiny_skia::Mask` covering the part of the clip the path
//! touches, and the mask rows are run-length encoded into an [`Rle`].

use crate::rle::{Rle, Span};
use kurbo::{BezPath, PathEl};
use lottie_core::FillRule;
use tiny_skia::{IntRect, Mask, PathBuilder, Transform};
use tracing::trace;

/// Default flattening tolerance, in device pixels.
pub const DEFAULT_TOLERANCE: f32 = 0.25;

/// Flattens `path` into a `tiny-skia` polygon. Open subpaths are left open;
/// the fill closes them.
fn flattened(path: &BezPath, tolerance: f64) -> Option<tiny_skia::Path> {
    let mut pb = PathBuilder::new();
    path.flatten(tolerance, |el| match el {
        PathEl::MoveTo(p) => pb.move_to(p.x as f32, p.y as f32),
        PathEl::LineTo(p) | PathEl::QuadTo(_, p) | PathEl::CurveTo(_, _, p) => {
            pb.line_to(p.x as f32, p.y as f32)
        }
        PathEl::ClosePath => pb.close(),
    });
    pb.finish()
}

/// Part of `clip` the path bounds can touch, or `None` when they miss it.
fn crop(bounds: tiny_skia::Rect, clip: IntRect) -> Option<IntRect> {
    let left = (bounds.left().floor() as i64).max(i64::from(clip.left()));
    let top = (bounds.top().floor() as i64).max(i64::from(clip.top()));
    let right = (bounds.right().ceil() as i64).min(i64::from(clip.right()));
    let bottom = (bounds.bottom().ceil() as i64).min(i64::from(clip.bottom()));
    if right <= left || bottom <= top {
        return None;
    }
    IntRect::from_xywh(
        left as i32,
        top as i32,
        (right - left) as u32,
        (bottom - top) as u32,
    )
}

/// Rasterizes `path` within `clip`.
pub fn rasterize(path: &BezPath, rule: FillRule, clip: IntRect, tolerance: f32) -> Rle {
    let mut rle = Rle::new();
    let tolerance = f64::from(tolerance.max(1e-3));
    let Some(polygon) = flattened(path, tolerance) else {
        return rle;
    };
    let Some(area) = crop(polygon.bounds(), clip) else {
        trace!("fill skipped: path lies outside the clip");
        return rle;
    };
    let Some(mut mask) = Mask::new(area.width(), area.height()) else {
        return rle;
    };

    let fill_rule = match rule {
        FillRule::NonZero => tiny_skia::FillRule::Winding,
        FillRule::EvenOdd => tiny_skia::FillRule::EvenOdd,
    };
    let origin = Transform::from_translate(-area.x() as f32, -area.y() as f32);
    mask.fill_path(&polygon, fill_rule, true, origin);

    let stride = area.width() as usize;
    for (row, coverage) in mask.data().chunks_exact(stride).enumerate() {
        encode_row(&mut rle, coverage, area.x(), area.y() + row as i32);
    }
    rle
}

/// Appends one mask row as runs of equal coverage.
fn encode_row(rle: &mut Rle, row: &[u8], origin_x: i32, y: i32) {
    let mut start = 0;
    while start < row.len() {
        let coverage = row[start];
        let len = row[start..].iter().take_while(|&&c| c == coverage).count();
        rle.push(Span {
            x: origin_x + start as i32,
            y,
            len: len as u32,
            coverage,
        });
        start += len;
    }
}
