use crate::rasterizer::rasterize;
use crate::rle::Rle;
use crate::stroker::{stroke_outline, StrokeInfo};
use crossbeam_channel::{bounded, Receiver};
use kurbo::BezPath;
use lottie_core::FillRule;
use tiny_skia::IntRect;
use tracing::warn;

/// Everything needed to turn one drawable into coverage. Owns its inputs so
/// it can run on any thread.
#[derive(Clone, Debug)]
pub struct RasterJob {
    pub path: BezPath,
    pub stroke: Option<StrokeInfo>,
    pub fill_rule: FillRule,
    pub clip: IntRect,
    pub tolerance: f32,
}

impl RasterJob {
    pub fn run(&self) -> Rle {
        match &self.stroke {
            Some(info) => {
                let outline = stroke_outline(&self.path, info);
                rasterize(&outline, FillRule::NonZero, self.clip, self.tolerance)
            }
            None => rasterize(&self.path, self.fill_rule, self.clip, self.tolerance),
        }
    }
}

/// Handle to a rasterization running on the rayon pool.
#[derive(Debug)]
pub struct RleTask {
    receiver: Receiver<Rle>,
}

impl RleTask {
    pub fn spawn(job: RasterJob) -> Self {
        let (sender, receiver) = bounded(1);
        rayon::spawn(move || {
            // The receiver may already be gone if the drawable was dropped.
            let _ = sender.send(job.run());
        });
        Self { receiver }
    }

    /// Blocks until the coverage is ready.
    pub fn join(self) -> Rle {
        self.receiver.recv().unwrap_or_else(|_| {
            warn!("rasterization task ended without a result");
            Rle::new()
        })
    }
}
