use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Malformed document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Frame rate must be positive, got {0}")]
    FrameRate(f32),
    #[error("Out point {op} must be after in point {ip}")]
    FrameRange { ip: f32, op: f32 },
    #[error("Composition size must be non-zero, got {width}x{height}")]
    EmptySize { width: u32, height: u32 },
}
