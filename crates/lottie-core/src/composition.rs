//! # Composition
//!
//! A loaded, normalized document: the scene arena plus the timing and size
//! the player needs. Immutable after [`Composition::load`], so one instance
//! can serve concurrent frame requests.

use crate::error::LoadError;
use crate::evaluator::Evaluator;
use crate::import::import_scene;
use crate::renderer::RenderTree;
use crate::repeater::normalize_repeaters;
use crate::scene::{NodeId, Scene};
use glam::Vec2;
use lottie_data::model::LottieJson;
use tracing::{debug, instrument};

#[derive(Clone, Debug)]
pub struct Composition {
    scene: Scene,
    root: NodeId,
    width: u32,
    height: u32,
    frame_rate: f32,
    start_frame: f32,
    end_frame: f32,
}

impl Composition {
    #[instrument(skip_all, fields(layers = model.layers.len()))]
    pub fn load(model: &LottieJson) -> Result<Self, LoadError> {
        if model.fr.is_nan() || model.fr <= 0.0 {
            return Err(LoadError::FrameRate(model.fr));
        }
        if model.op.is_nan() || model.ip.is_nan() || model.op <= model.ip {
            return Err(LoadError::FrameRange {
                ip: model.ip,
                op: model.op,
            });
        }
        if model.w == 0 || model.h == 0 {
            return Err(LoadError::EmptySize {
                width: model.w,
                height: model.h,
            });
        }

        let (mut scene, root) = import_scene(model);
        normalize_repeaters(&mut scene, root);
        scene.cache_static_matrices();
        debug!(nodes = scene.len(), "composition loaded");

        Ok(Self {
            scene,
            root,
            width: model.w,
            height: model.h,
            frame_rate: model.fr,
            start_frame: model.ip,
            end_frame: model.op,
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self, LoadError> {
        let model: LottieJson = serde_json::from_str(json)?;
        Self::load(&model)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, LoadError> {
        let model: LottieJson = serde_json::from_slice(bytes)?;
        Self::load(&model)
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn frame_rate(&self) -> f32 {
        self.frame_rate
    }

    pub fn start_frame(&self) -> f32 {
        self.start_frame
    }

    pub fn end_frame(&self) -> f32 {
        self.end_frame
    }

    pub fn total_frame(&self) -> usize {
        (self.end_frame - self.start_frame).max(0.0) as usize
    }

    /// Seconds.
    pub fn duration(&self) -> f64 {
        self.total_frame() as f64 / self.frame_rate as f64
    }

    /// Frame number at normalized position `pos`, clamped to `[0, 1]`.
    pub fn frame_at_pos(&self, pos: f64) -> usize {
        let pos = if pos.is_nan() { 0.0 } else { pos.clamp(0.0, 1.0) };
        let first = self.start_frame as f64;
        let last = self.end_frame as f64;
        (first + pos * (last - first)).round().max(0.0) as usize
    }

    /// Clamps `frame` to the last renderable frame.
    pub fn clamp_frame(&self, frame: usize) -> f32 {
        let first = self.start_frame;
        let last = (first + self.total_frame() as f32 - 1.0).max(first);
        (frame as f32).clamp(first, last)
    }

    /// Evaluates `frame` into a render tree scaled to `width` x `height`.
    #[instrument(skip(self))]
    pub fn render_tree(&self, frame: usize, width: u32, height: u32) -> RenderTree {
        let frame = self.clamp_frame(frame);
        let comp_size = Vec2::new(self.width as f32, self.height as f32);
        Evaluator::new(&self.scene).evaluate(
            self.root,
            frame,
            comp_size,
            width as f32,
            height as f32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(ip: f32, op: f32, fr: f32, w: u32) -> String {
        json!({"ip": ip, "op": op, "fr": fr, "w": w, "h": 100, "layers": []}).to_string()
    }

    #[test]
    fn test_load_validation() {
        assert!(matches!(
            Composition::from_json_str(&doc(0.0, 60.0, 0.0, 100)),
            Err(LoadError::FrameRate(_))
        ));
        assert!(matches!(
            Composition::from_json_str(&doc(10.0, 10.0, 30.0, 100)),
            Err(LoadError::FrameRange { .. })
        ));
        assert!(matches!(
            Composition::from_json_str(&doc(0.0, 60.0, 30.0, 0)),
            Err(LoadError::EmptySize { .. })
        ));
        assert!(matches!(
            Composition::from_json_str("{ not json"),
            Err(LoadError::Json(_))
        ));
    }

    #[test]
    fn test_frame_at_pos() {
        let comp = Composition::from_json_str(&doc(10.0, 70.0, 30.0, 100)).unwrap();
        assert_eq!(comp.total_frame(), 60);
        assert_eq!(comp.frame_at_pos(0.0), 10);
        assert_eq!(comp.frame_at_pos(1.0), 70);
        assert_eq!(comp.frame_at_pos(-3.0), 10);
        assert_eq!(comp.frame_at_pos(2.0), 70);
        let mut last = 0;
        for i in 0..=100 {
            let f = comp.frame_at_pos(i as f64 / 100.0);
            assert!(f >= last);
            last = f;
        }
        assert!((comp.duration() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_frame_clamping() {
        let comp = Composition::from_json_str(&doc(10.0, 70.0, 30.0, 100)).unwrap();
        assert_eq!(comp.clamp_frame(0), 10.0);
        assert_eq!(comp.clamp_frame(500), 69.0);
        assert_eq!(comp.render_tree(500, 10, 10).frame, 69.0);
    }
}
