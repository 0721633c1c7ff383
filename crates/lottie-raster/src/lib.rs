pub mod brush;
pub mod drawable;
pub mod errors;
pub mod rasterizer;
pub mod renderer;
pub mod rle;
pub mod stroker;
pub mod surface;
pub mod task;

pub use brush::Brush;
pub use drawable::{DirtyFlags, Drawable};
pub use errors::SurfaceError;
pub use renderer::RasterRenderer;
pub use rle::{Rle, Span};
pub use stroker::StrokeInfo;
pub use surface::{PixelFormat, Surface};
pub use tiny_skia::IntRect;
