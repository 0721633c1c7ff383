//! Run-length encoded coverage.
//!
//! An [`Rle`] is the output of rasterizing one drawable: horizontal runs of
//! pixels sharing one anti-aliasing coverage value. Spans are ordered by
//! `(y, x)` and never overlap, so compositing is a single forward pass.

use tiny_skia::IntRect;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span {
    pub x: i32,
    pub y: i32,
    pub len: u32,
    /// 0 = uncovered, 255 = fully covered.
    pub coverage: u8,
}

impl Span {
    pub fn end(&self) -> i32 {
        self.x + self.len as i32
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Rle {
    spans: Vec<Span>,
}

impl Rle {
    pub const fn new() -> Self {
        Self { spans: Vec::new() }
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// Appends a span. Spans must arrive in `(y, x)` order; a span that
    /// continues the previous one with the same coverage is merged into it.
    pub fn push(&mut self, span: Span) {
        if span.len == 0 || span.coverage == 0 {
            return;
        }
        if let Some(last) = self.spans.last_mut() {
            debug_assert!(
                (last.y, last.end()) <= (span.y, span.x),
                "span out of order: {last:?} then {span:?}"
            );
            if last.y == span.y && last.end() == span.x && last.coverage == span.coverage {
                last.len += span.len;
                return;
            }
        }
        self.spans.push(span);
    }

    /// Sum of coverage over all pixels, in units of fully covered pixels.
    pub fn area(&self) -> f32 {
        self.spans
            .iter()
            .map(|s| s.len as f32 * s.coverage as f32 / 255.0)
            .sum()
    }

    pub fn bounds(&self) -> Option<IntRect> {
        let first = self.spans.first()?;
        let last = self.spans.last()?;
        let left = self.spans.iter().map(|s| s.x).min()?;
        let right = self.spans.iter().map(Span::end).max()?;
        IntRect::from_xywh(
            left,
            first.y,
            (right - left) as u32,
            (last.y + 1 - first.y) as u32,
        )
    }

    /// Coverage of a single pixel.
    pub fn coverage_at(&self, x: i32, y: i32) -> u8 {
        let row_start = self.spans.partition_point(|s| s.y < y);
        self.spans[row_start..]
            .iter()
            .take_while(|s| s.y == y)
            .find(|s| s.x <= x && x < s.end())
            .map_or(0, |s| s.coverage)
    }
}
