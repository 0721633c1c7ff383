//! # Trim Paths
//!
//! Cuts paths to a window of their arc length. The window comes from the
//! start/end percentages shifted by the offset (degrees, one turn = the whole
//! path) and may wrap past the end back to the start.

use crate::contour::{contours, to_bez_path, Contour};
use kurbo::BezPath;

/// Normalized window over a path's length. `start > end` wraps.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrimSegment {
    pub start: f32,
    pub end: f32,
}

impl TrimSegment {
    pub const FULL: TrimSegment = TrimSegment {
        start: 0.0,
        end: 1.0,
    };

    /// Resolves the window from start %, end % and offset degrees. `None`
    /// means nothing is left of the path.
    pub fn resolve(start: f32, end: f32, offset: f32) -> Option<TrimSegment> {
        let mut start = (start / 100.0).clamp(0.0, 1.0);
        let mut end = (end / 100.0).clamp(0.0, 1.0);
        let offset = (offset % 360.0) / 360.0;

        let diff = (start - end).abs();
        if diff <= f32::EPSILON {
            return None;
        }
        if (diff - 1.0).abs() <= f32::EPSILON {
            return Some(Self::FULL);
        }

        start += offset;
        end += offset;
        let (a, b) = if offset > 0.0 {
            if start <= 1.0 && end <= 1.0 {
                return Some(Self::ordered(start, end));
            } else if start > 1.0 && end > 1.0 {
                return Some(Self::ordered(start - 1.0, end - 1.0));
            } else if start > 1.0 {
                (start - 1.0, end)
            } else {
                (start, end - 1.0)
            }
        } else if start >= 0.0 && end >= 0.0 {
            return Some(Self::ordered(start, end));
        } else if start < 0.0 && end < 0.0 {
            return Some(Self::ordered(1.0 + start, 1.0 + end));
        } else if start < 0.0 {
            (1.0 + start, end)
        } else {
            (start, 1.0 + end)
        };
        Some(Self::wrapped(a, b))
    }

    fn ordered(a: f32, b: f32) -> Self {
        TrimSegment {
            start: a.min(b),
            end: a.max(b),
        }
    }

    fn wrapped(a: f32, b: f32) -> Self {
        TrimSegment {
            start: a.max(b),
            end: a.min(b),
        }
    }

    pub fn is_full(&self) -> bool {
        self.start <= 0.0 && self.end >= 1.0
    }

    /// Length ranges covered on a path of length `total`, in path order.
    fn ranges(&self, total: f32) -> Vec<(f32, f32)> {
        if self.start <= self.end {
            vec![(self.start * total, self.end * total)]
        } else {
            vec![(self.start * total, total), (0.0, self.end * total)]
        }
    }
}

/// Trims a single path as a whole.
pub fn trim_path(path: &BezPath, segment: TrimSegment) -> BezPath {
    if segment.is_full() {
        return path.clone();
    }
    let cs = contours(path);
    let total: f32 = cs.iter().map(Contour::length).sum();
    let mut out = Vec::new();
    for (from, to) in segment.ranges(total) {
        out.extend(extract(&cs, from, to));
    }
    to_bez_path(&out)
}

/// Trims `paths` as if they were one path laid end to end.
pub fn trim_individually(paths: &mut [BezPath], segment: TrimSegment) {
    if segment.is_full() {
        return;
    }
    let all: Vec<Vec<Contour>> = paths.iter().map(contours).collect();
    let lengths: Vec<f32> = all
        .iter()
        .map(|cs| cs.iter().map(Contour::length).sum())
        .collect();
    let total: f32 = lengths.iter().sum();
    let ranges = segment.ranges(total);

    let mut base = 0.0;
    for ((path, cs), len) in paths.iter_mut().zip(&all).zip(&lengths) {
        let mut out = Vec::new();
        for (from, to) in &ranges {
            let local_from = (from - base).max(0.0);
            let local_to = (to - base).min(*len);
            if local_to > local_from {
                out.extend(extract(cs, local_from, local_to));
            }
        }
        *path = to_bez_path(&out);
        base += len;
    }
}

/// The part of `cs` between arc lengths `from` and `to`, one open contour
/// per touched input contour.
fn extract(cs: &[Contour], from: f32, to: f32) -> Vec<Contour> {
    let mut result = Vec::new();
    let mut pos = 0.0;
    for contour in cs {
        let mut piece = Contour::default();
        for segment in &contour.segments {
            let len = segment.length();
            let (seg_start, seg_end) = (pos, pos + len);
            pos = seg_end;
            if seg_end <= from || seg_start >= to || len <= 0.0 {
                continue;
            }
            let t0 = if from > seg_start {
                segment.t_at_length_with_total(from - seg_start, len)
            } else {
                0.0
            };
            let t1 = if to < seg_end {
                segment.t_at_length_with_total(to - seg_start, len)
            } else {
                1.0
            };
            piece.segments.push(segment.on_interval(t0, t1));
        }
        if !piece.is_empty() {
            result.push(piece);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(len: f64) -> BezPath {
        let mut path = BezPath::new();
        path.move_to((0.0, 0.0));
        path.line_to((len, 0.0));
        path
    }

    fn length(path: &BezPath) -> f32 {
        contours(path).iter().map(Contour::length).sum()
    }

    #[test]
    fn test_resolve_segment() {
        assert_eq!(TrimSegment::resolve(50.0, 50.0, 0.0), None);
        assert_eq!(TrimSegment::resolve(0.0, 100.0, 45.0), Some(TrimSegment::FULL));
        let s = TrimSegment::resolve(60.0, 20.0, 0.0).unwrap();
        assert_eq!((s.start, s.end), (0.2, 0.6));
        // 270 degrees shifts by three quarters and wraps.
        let w = TrimSegment::resolve(0.0, 50.0, 270.0).unwrap();
        assert!((w.start - 0.75).abs() < 1e-6 && (w.end - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_trim_path_keeps_window() {
        let trimmed = trim_path(&line(100.0), TrimSegment { start: 0.25, end: 0.75 });
        assert!((length(&trimmed) - 50.0).abs() < 0.1);
    }

    #[test]
    fn test_wrapped_trim_has_two_pieces() {
        let trimmed = trim_path(&line(100.0), TrimSegment { start: 0.75, end: 0.25 });
        assert_eq!(contours(&trimmed).len(), 2);
        assert!((length(&trimmed) - 50.0).abs() < 0.1);
    }

    #[test]
    fn test_individual_trim_spans_paths() {
        let mut paths = vec![line(100.0), line(100.0)];
        trim_individually(&mut paths, TrimSegment { start: 0.0, end: 0.25 });
        assert!((length(&paths[0]) - 50.0).abs() < 0.1);
        assert!(paths[1].elements().is_empty());
    }
}
