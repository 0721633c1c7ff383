use crate::config::RenderConfig;
use crate::errors::RenderError;
use crossbeam_channel::{bounded, Receiver};
use lottie_core::{Composition, RenderTree};
use lottie_data::model::LottieJson;
use lottie_raster::{RasterRenderer, Surface, SurfaceError};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// A loaded animation. Cheap to clone; clones share the composition.
#[derive(Clone, Debug)]
pub struct Animation {
    composition: Arc<Composition>,
    config: RenderConfig,
}

impl Animation {
    pub fn from_json_str(json: &str) -> Result<Self, RenderError> {
        Ok(Self::new(Composition::from_json_str(json)?))
    }

    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RenderError> {
        let bytes = std::fs::read(path.as_ref())?;
        Ok(Self::new(Composition::from_slice(&bytes)?))
    }

    pub fn from_model(model: LottieJson) -> Result<Self, RenderError> {
        Ok(Self::new(Composition::load(&model)?))
    }

    fn new(composition: Composition) -> Self {
        Self {
            composition: Arc::new(composition),
            config: RenderConfig::default(),
        }
    }

    pub fn with_config(mut self, config: RenderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn composition(&self) -> &Composition {
        &self.composition
    }

    pub fn frame_rate(&self) -> f64 {
        f64::from(self.composition.frame_rate())
    }

    pub fn total_frame(&self) -> usize {
        self.composition.total_frame()
    }

    /// Width and height of the composition.
    pub fn size(&self) -> (usize, usize) {
        let (w, h) = self.composition.size();
        (w as usize, h as usize)
    }

    /// Seconds.
    pub fn duration(&self) -> f64 {
        self.composition.duration()
    }

    pub fn frame_at_pos(&self, pos: f64) -> usize {
        self.composition.frame_at_pos(pos)
    }

    /// A cleared surface at the composition's size in the configured format.
    pub fn surface(&self) -> Result<Surface, RenderError> {
        let (w, h) = self.size();
        let mut surface = Surface::new(w, h, None, self.config.pixel_format)?;
        surface.clear(self.config.background);
        Ok(surface)
    }

    pub fn render_tree(&self, frame: usize, width: u32, height: u32) -> RenderTree {
        self.composition.render_tree(frame, width, height)
    }

    /// Renders `frame` into `surface` on the calling thread.
    ///
    /// Rasterization runs on the rayon pool and this call waits for it, so
    /// calling it from a rayon worker can starve the pool; use
    /// [`Animation::render_async`] there.
    pub fn render_sync(&self, frame: usize, surface: &mut Surface) -> Result<(), RenderError> {
        render_frame(&self.composition, &self.config, frame, surface)
    }

    /// Renders `frame` on a dedicated thread, handing `surface` back through
    /// the returned task. If no thread can be started the frame is rendered
    /// on the calling thread instead.
    pub fn render_async(&self, frame: usize, surface: Surface) -> RenderTask {
        let (sender, receiver) = bounded(1);
        // The surface waits in `pending` until a thread claims it, so a failed
        // spawn can still take it back.
        let (handoff, pending) = bounded(1);
        let _ = handoff.send(surface);

        let worker = self.clone();
        let worker_pending = pending.clone();
        let worker_sender = sender.clone();
        let spawned = std::thread::Builder::new()
            .name(format!("lottie-frame-{frame}"))
            .spawn(move || {
                if let Ok(surface) = worker_pending.try_recv() {
                    let _ = worker_sender.send(worker.render_owned(frame, surface));
                }
            });
        if let Err(e) = spawned {
            let _ = sender.send(self.render_inline(frame, &pending, e));
        }

        RenderTask { frame, receiver }
    }

    fn render_owned(&self, frame: usize, mut surface: Surface) -> Result<Surface, RenderError> {
        render_frame(&self.composition, &self.config, frame, &mut surface).map(|_| surface)
    }

    fn render_inline(
        &self,
        frame: usize,
        pending: &Receiver<Surface>,
        spawn_error: std::io::Error,
    ) -> Result<Surface, RenderError> {
        warn!(frame, error = %spawn_error, "render thread unavailable, rendering inline");
        match pending.try_recv() {
            Ok(surface) => self.render_owned(frame, surface),
            Err(_) => Err(RenderError::IoError(spawn_error)),
        }
    }
}

#[instrument(skip(composition, config, surface))]
fn render_frame(
    composition: &Composition,
    config: &RenderConfig,
    frame: usize,
    surface: &mut Surface,
) -> Result<(), RenderError> {
    let width = u32::try_from(surface.width()).map_err(|_| SurfaceError::Overflow)?;
    let height = u32::try_from(surface.height()).map_err(|_| SurfaceError::Overflow)?;
    let tree = composition.render_tree(frame, width, height);
    surface.clear(config.background);
    RasterRenderer::new(config.flatness_tolerance).render(&tree, surface);
    debug!(frame = tree.frame, "frame rendered");
    Ok(())
}

/// A frame rendering on its own thread.
#[derive(Debug)]
pub struct RenderTask {
    frame: usize,
    receiver: Receiver<Result<Surface, RenderError>>,
}

impl RenderTask {
    pub fn frame(&self) -> usize {
        self.frame
    }

    pub fn is_finished(&self) -> bool {
        !self.receiver.is_empty()
    }

    /// Waits for the frame and returns the surface it was drawn into.
    pub fn join(self) -> Result<Surface, RenderError> {
        self.receiver.recv().map_err(|_| RenderError::TaskLost)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn square() -> Animation {
        let doc = json!({
            "ip": 0, "op": 10, "fr": 10, "w": 16, "h": 16,
            "layers": [{
                "ty": 4, "ind": 1, "ip": 0, "op": 10, "ks": {},
                "shapes": [
                    {"ty": "rc", "p": {"a": 0, "k": [8, 8]}, "s": {"a": 0, "k": [8, 8]}},
                    {"ty": "fl", "c": {"a": 0, "k": [0, 1, 0, 1]}, "o": {"a": 0, "k": 100}}
                ]
            }]
        });
        Animation::from_json_str(&doc.to_string()).unwrap()
    }

    #[test]
    fn test_failed_spawn_renders_inline_into_the_same_surface() {
        let animation = square();
        let (handoff, pending) = bounded(1);
        handoff.send(animation.surface().unwrap()).unwrap();

        let spawn_error = std::io::Error::other("no threads left");
        let surface = animation.render_inline(3, &pending, spawn_error).unwrap();
        assert_eq!((surface.width(), surface.height()), (16, 16));
        assert_eq!(surface.pixel(8, 8), Some([0, 255, 0, 255]));
        assert!(pending.is_empty());
    }

    #[test]
    fn test_claimed_surface_reports_the_spawn_error() {
        let animation = square();
        let (_handoff, pending) = bounded::<Surface>(1);
        let spawn_error = std::io::Error::other("no threads left");
        assert!(matches!(
            animation.render_inline(0, &pending, spawn_error),
            Err(RenderError::IoError(_))
        ));
    }
}
