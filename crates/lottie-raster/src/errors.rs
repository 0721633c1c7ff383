use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    #[error("Surface size must be non-zero, got {width}x{height}")]
    EmptySize { width: usize, height: usize },
    #[error("Bytes per line {bytes_per_line} is less than the {minimum} a row needs")]
    Stride {
        bytes_per_line: usize,
        minimum: usize,
    },
    #[error("Buffer of {len} bytes is smaller than the {required} the surface needs")]
    BufferTooSmall { len: usize, required: usize },
    #[error("Surface size overflows addressable memory")]
    Overflow,
}
