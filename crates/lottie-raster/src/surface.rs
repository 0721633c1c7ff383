//! Pixel buffers frames are rendered into.

use crate::brush::Brush;
use crate::errors::SurfaceError;
use crate::rle::{Rle, Span};
use glam::Vec4;

const BYTES_PER_PIXEL: usize = 4;

/// Memory layout of one pixel. Both formats are premultiplied.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PixelFormat {
    /// A native-endian `u32` per pixel, `0xAARRGGBB`.
    #[default]
    Argb32Premultiplied,
    /// Bytes in `R, G, B, A` order.
    Rgba8888Premultiplied,
}

impl PixelFormat {
    fn encode(self, c: [u8; 4]) -> [u8; 4] {
        match self {
            PixelFormat::Argb32Premultiplied => {
                let [r, g, b, a] = c.map(u32::from);
                ((a << 24) | (r << 16) | (g << 8) | b).to_ne_bytes()
            }
            PixelFormat::Rgba8888Premultiplied => c,
        }
    }

    fn decode(self, bytes: [u8; 4]) -> [u8; 4] {
        match self {
            PixelFormat::Argb32Premultiplied => {
                let v = u32::from_ne_bytes(bytes);
                [(v >> 16) as u8, (v >> 8) as u8, v as u8, (v >> 24) as u8]
            }
            PixelFormat::Rgba8888Premultiplied => bytes,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Surface {
    data: Vec<u8>,
    width: usize,
    height: usize,
    bytes_per_line: usize,
    format: PixelFormat,
}

impl Surface {
    /// Allocates a transparent surface. `bytes_per_line` defaults to a
    /// tightly packed row.
    pub fn new(
        width: usize,
        height: usize,
        bytes_per_line: Option<usize>,
        format: PixelFormat,
    ) -> Result<Self, SurfaceError> {
        let bytes_per_line = validate(width, height, bytes_per_line)?;
        let len = bytes_per_line
            .checked_mul(height)
            .ok_or(SurfaceError::Overflow)?;
        Ok(Self {
            data: vec![0; len],
            width,
            height,
            bytes_per_line,
            format,
        })
    }

    /// Wraps an existing buffer.
    pub fn from_buffer(
        data: Vec<u8>,
        width: usize,
        height: usize,
        bytes_per_line: usize,
        format: PixelFormat,
    ) -> Result<Self, SurfaceError> {
        let bytes_per_line = validate(width, height, Some(bytes_per_line))?;
        let required = bytes_per_line
            .checked_mul(height)
            .ok_or(SurfaceError::Overflow)?;
        if data.len() < required {
            return Err(SurfaceError::BufferTooSmall {
                len: data.len(),
                required,
            });
        }
        Ok(Self {
            data,
            width,
            height,
            bytes_per_line,
            format,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn bytes_per_line(&self) -> usize {
        self.bytes_per_line
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    fn offset(&self, x: usize, y: usize) -> usize {
        y * self.bytes_per_line + x * BYTES_PER_PIXEL
    }

    /// Premultiplied RGBA at `(x, y)`, or `None` outside the surface.
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = self.offset(x, y);
        let bytes: [u8; 4] = self.data[i..i + BYTES_PER_PIXEL].try_into().ok()?;
        Some(self.format.decode(bytes))
    }

    fn write(&mut self, x: usize, y: usize, rgba: [u8; 4]) {
        let i = self.offset(x, y);
        let encoded = self.format.encode(rgba);
        self.data[i..i + BYTES_PER_PIXEL].copy_from_slice(&encoded);
    }

    /// Fills every pixel with a premultiplied color.
    pub fn clear(&mut self, color: Vec4) {
        let rgba = to_bytes(color);
        for y in 0..self.height {
            for x in 0..self.width {
                self.write(x, y, rgba);
            }
        }
    }

    /// Source-over composites `brush` through `rle`.
    pub fn fill_rle(&mut self, rle: &Rle, brush: &Brush) {
        if brush.is_transparent() {
            return;
        }
        for span in rle.spans() {
            self.blend_span(span, brush);
        }
    }

    pub fn blend_span(&mut self, span: &Span, brush: &Brush) {
        let Ok(y) = usize::try_from(span.y) else {
            return;
        };
        if y >= self.height {
            return;
        }
        let coverage = f32::from(span.coverage) / 255.0;
        let x0 = span.x.max(0);
        let x1 = span.end().min(self.width as i32);
        for x in x0..x1 {
            let src = brush.color_at(x, span.y) * coverage;
            let x = x as usize;
            let Some(dst) = self.pixel(x, y) else {
                continue;
            };
            let dst = Vec4::from_array(dst.map(|v| f32::from(v) / 255.0));
            self.write(x, y, to_bytes(src + dst * (1.0 - src.w)));
        }
    }

    /// Tightly packed, straight-alpha RGBA rows, as image encoders expect.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.width * self.height * BYTES_PER_PIXEL);
        for y in 0..self.height {
            for x in 0..self.width {
                let [r, g, b, a] = self.pixel(x, y).unwrap_or_default();
                let unpremultiply = |c: u8| match a {
                    0 => 0,
                    255 => c,
                    _ => ((u32::from(c) * 255 + u32::from(a) / 2) / u32::from(a)).min(255) as u8,
                };
                out.extend_from_slice(&[unpremultiply(r), unpremultiply(g), unpremultiply(b), a]);
            }
        }
        out
    }
}

fn validate(width: usize, height: usize, bytes_per_line: Option<usize>) -> Result<usize, SurfaceError> {
    if width == 0 || height == 0 {
        return Err(SurfaceError::EmptySize { width, height });
    }
    let minimum = width
        .checked_mul(BYTES_PER_PIXEL)
        .ok_or(SurfaceError::Overflow)?;
    let bytes_per_line = bytes_per_line.unwrap_or(minimum);
    if bytes_per_line < minimum {
        return Err(SurfaceError::Stride {
            bytes_per_line,
            minimum,
        });
    }
    Ok(bytes_per_line)
}

fn to_bytes(c: Vec4) -> [u8; 4] {
    c.to_array().map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
}
