//! Frame compositor: turns an evaluated [`RenderTree`] into pixels.

use crate::brush::Brush;
use crate::drawable::Drawable;
use crate::rasterizer::DEFAULT_TOLERANCE;
use crate::stroker::StrokeInfo;
use crate::surface::Surface;
use lottie_core::{RenderTree, ShapeStyle};
use tiny_skia::IntRect;
use tracing::{debug, instrument};

#[derive(Clone, Copy, Debug)]
pub struct RasterRenderer {
    tolerance: f32,
}

impl Default for RasterRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_TOLERANCE)
    }
}

impl RasterRenderer {
    pub fn new(tolerance: f32) -> Self {
        Self { tolerance }
    }

    /// One drawable per visible shape, in painting order.
    pub fn drawables(&self, tree: &RenderTree) -> Vec<Drawable> {
        let mut drawables = Vec::new();
        tree.visit_shapes(|shape, alpha| {
            let opacity = alpha * shape.style.opacity();
            if opacity <= 0.0 || shape.geometry.elements().is_empty() {
                return;
            }
            let mut drawable = Drawable::new().with_tolerance(self.tolerance);
            drawable.set_path(shape.geometry.clone());
            drawable.set_brush(Brush::from_paint(shape.style.paint(), opacity));
            match &shape.style {
                ShapeStyle::Fill(fill) => drawable.set_fill_rule(fill.rule),
                ShapeStyle::Stroke(stroke) => {
                    drawable.set_stroke_info(Some(StrokeInfo {
                        width: stroke.width,
                        cap: stroke.cap,
                        join: stroke.join,
                        miter_limit: stroke.miter_limit,
                    }));
                    drawable.set_dash_info(stroke.dash.clone());
                }
            }
            if !drawable.brush().is_transparent() {
                drawables.push(drawable);
            }
        });
        drawables
    }

    /// Rasterizes every shape concurrently, then composites back to front.
    /// The surface is not cleared.
    #[instrument(skip_all, fields(frame = tree.frame))]
    pub fn render(&self, tree: &RenderTree, surface: &mut Surface) {
        let Some(clip) = IntRect::from_xywh(0, 0, surface.width() as u32, surface.height() as u32)
        else {
            return;
        };
        let mut drawables = self.drawables(tree);
        for drawable in &mut drawables {
            drawable.preprocess(clip);
        }
        for drawable in &mut drawables {
            drawable.draw(surface);
        }
        debug!(drawables = drawables.len(), "frame rasterized");
    }
}
