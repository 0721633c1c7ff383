use lottie_core::LoadError;
use lottie_raster::SurfaceError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Surface(#[from] SurfaceError),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error("Render task ended without returning its surface")]
    TaskLost,
}
