use glam::Vec4;
use lottie_raster::rasterizer::DEFAULT_TOLERANCE;
use lottie_raster::PixelFormat;

/// Rendering knobs shared by every frame of an [`crate::Animation`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderConfig {
    /// Maximum distance, in pixels, between a curve and its flattened polyline.
    pub flatness_tolerance: f32,
    /// Premultiplied RGBA the surface is cleared to before each frame.
    pub background: Vec4,
    /// Layout of surfaces created by [`crate::Animation::surface`].
    pub pixel_format: PixelFormat,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            flatness_tolerance: DEFAULT_TOLERANCE,
            background: Vec4::ZERO,
            pixel_format: PixelFormat::default(),
        }
    }
}
