//! # Frame Evaluator
//!
//! Walks the immutable scene arena for one frame and produces a fresh
//! [`RenderTree`] with every path already in device space.
//!
//! ## Paint scoping
//! Path items are collected into a list shared by a container and its nested
//! groups. A fill or stroke paints every path collected since the start of
//! its own container, which includes paths of nested groups declared before
//! it. Trim and merge items rewrite the same range. Items declared first are
//! drawn on top, so each container's output is reversed into painting order.

use crate::dash::dash_info;
use crate::renderer::{DashPattern, Fill, Paint, RenderNode, RenderTree, Shape, ShapeStyle, Stroke};
use crate::scene::{
    FillNode, LayerContent, LayerNode, NodeId, NodeKind, PaintSource, RepeaterNode,
    RepeaterOrder, Scene, StrokeNode, TrimMode, TrimNode,
};
use crate::transform::{scale_factor, transform_path};
use crate::trim::{trim_individually, trim_path, TrimSegment};
use glam::{Mat3, Vec2, Vec4};
use kurbo::BezPath;
use tracing::{trace, warn};

/// Longest parent chain followed before assuming a cycle.
const MAX_PARENT_DEPTH: usize = 64;

/// A path collected in a container scope, in the local space of `transform`.
#[derive(Clone, Debug)]
struct PendingGeometry {
    path: BezPath,
    transform: Mat3,
}

impl PendingGeometry {
    fn device_path(&self) -> BezPath {
        transform_path(&self.path, &self.transform)
    }
}

pub struct Evaluator<'a> {
    scene: &'a Scene,
}

impl<'a> Evaluator<'a> {
    pub fn new(scene: &'a Scene) -> Self {
        Self { scene }
    }

    /// Evaluates the composition rooted at `root` at `frame`, scaled so that
    /// a `comp_size` composition fills `width` x `height`.
    pub fn evaluate(
        &self,
        root: NodeId,
        frame: f32,
        comp_size: Vec2,
        width: f32,
        height: f32,
    ) -> RenderTree {
        let sx = if comp_size.x > 0.0 { width / comp_size.x } else { 1.0 };
        let sy = if comp_size.y > 0.0 { height / comp_size.y } else { 1.0 };
        let viewport = Mat3::from_scale(Vec2::new(sx, sy));

        let content = match self.scene.get(root).map(|n| &n.kind) {
            Some(NodeKind::Layer(layer)) => self.eval_layer(root, layer, frame, viewport),
            _ => None,
        };
        let root = content.unwrap_or_else(|| RenderNode::group(None, 1.0, Vec::new()));
        RenderTree {
            width,
            height,
            frame,
            root,
        }
    }

    fn layer(&self, id: NodeId) -> Option<&'a LayerNode> {
        match self.scene.get(id).map(|n| &n.kind) {
            Some(NodeKind::Layer(l)) => Some(l),
            _ => None,
        }
    }

    /// Own matrix of a layer at the container frame `frame`.
    fn layer_local_matrix(&self, layer: &LayerNode, frame: f32) -> Mat3 {
        self.scene
            .transform(layer.transform)
            .map(|t| t.matrix(layer.local_frame(frame), layer.auto_orient))
            .unwrap_or(Mat3::IDENTITY)
    }

    /// Layer matrix including its parent chain, relative to its container.
    fn layer_matrix(&self, layer: &LayerNode, frame: f32) -> Mat3 {
        let mut m = self.layer_local_matrix(layer, frame);
        let mut parent = layer.parent;
        let mut depth = 0;
        while let Some(id) = parent {
            let Some(p) = self.layer(id) else {
                break;
            };
            depth += 1;
            if depth > MAX_PARENT_DEPTH {
                warn!(layer = id, "layer parent chain too deep, truncating");
                break;
            }
            m = self.layer_local_matrix(p, frame) * m;
            parent = p.parent;
        }
        m
    }

    /// `frame` is the frame of the composition containing the layer.
    fn eval_layer(
        &self,
        id: NodeId,
        layer: &LayerNode,
        frame: f32,
        container: Mat3,
    ) -> Option<RenderNode> {
        let node = self.scene.get(id)?;
        if node.hidden || !layer.is_visible(frame) {
            return None;
        }

        let local = layer.local_frame(frame);
        let alpha = self
            .scene
            .transform(layer.transform)
            .map(|t| t.opacity(local))
            .unwrap_or(1.0);
        if alpha <= 0.0 {
            return None;
        }
        let matrix = container * self.layer_matrix(layer, frame);

        let children = match &layer.content {
            LayerContent::Null => return None,
            LayerContent::Solid {
                color,
                width,
                height,
            } => {
                let mut rect = BezPath::new();
                let (w, h) = (*width as f64, *height as f64);
                rect.move_to((0.0, 0.0));
                rect.line_to((w, 0.0));
                rect.line_to((w, h));
                rect.line_to((0.0, h));
                rect.close_path();
                vec![RenderNode::shape(Shape {
                    geometry: transform_path(&rect, &matrix),
                    style: ShapeStyle::Fill(Fill {
                        paint: Paint::Solid(*color),
                        opacity: 1.0,
                        rule: Default::default(),
                    }),
                })]
            }
            LayerContent::Precomp { .. } => {
                // First layer is on top.
                layer
                    .children
                    .iter()
                    .rev()
                    .filter_map(|&child| {
                        let child_layer = self.layer(child)?;
                        self.eval_layer(child, child_layer, local, matrix)
                    })
                    .collect()
            }
            LayerContent::Shape => {
                let mut paths = Vec::new();
                let mut out = Vec::new();
                self.eval_items(&layer.children, local, matrix, &mut paths, &mut out);
                out
            }
        };
        Some(RenderNode::group(node.name.clone(), alpha, children))
    }

    /// Evaluates the items of one container scope, appending painting-order
    /// output to `out`.
    fn eval_items(
        &self,
        items: &[NodeId],
        frame: f32,
        matrix: Mat3,
        paths: &mut Vec<PendingGeometry>,
        out: &mut Vec<RenderNode>,
    ) {
        let scope = paths.len();
        let mut nodes = Vec::new();

        for &id in items {
            let Some(node) = self.scene.get(id) else {
                continue;
            };
            if node.hidden {
                continue;
            }
            match &node.kind {
                NodeKind::Shape(shape) => paths.push(PendingGeometry {
                    path: shape.path(frame),
                    transform: matrix,
                }),
                NodeKind::Group(group) => {
                    let transform = group.transform.and_then(|t| self.scene.transform(t));
                    let (group_matrix, alpha) = match transform {
                        Some(t) => (matrix * t.matrix(frame, false), t.opacity(frame)),
                        None => (matrix, 1.0),
                    };
                    let mut children = Vec::new();
                    self.eval_items(&group.children, frame, group_matrix, paths, &mut children);
                    if !children.is_empty() {
                        nodes.push(RenderNode::group(node.name.clone(), alpha, children));
                    }
                }
                NodeKind::Fill(fill) => {
                    if let Some(shape) = self.fill(fill, frame, matrix, &paths[scope..]) {
                        nodes.push(RenderNode::shape(shape));
                    }
                }
                NodeKind::Stroke(stroke) => {
                    if let Some(shape) = self.stroke(stroke, frame, matrix, &paths[scope..]) {
                        nodes.push(RenderNode::shape(shape));
                    }
                }
                NodeKind::Trim(trim) => apply_trim(trim, frame, &mut paths[scope..]),
                NodeKind::Merge(merge) => {
                    if merge.mode != 1 {
                        trace!(mode = merge.mode, "merge mode approximated by concatenation");
                    }
                    merge_paths(paths, scope);
                }
                NodeKind::Repeater(repeater) => {
                    let copies = self.repeat(repeater, frame, matrix, paths);
                    if !copies.is_empty() {
                        nodes.push(RenderNode::group(node.name.clone(), 1.0, copies));
                    }
                }
                NodeKind::Layer(_) | NodeKind::Transform(_) | NodeKind::Gradient(_) => {}
            }
        }

        nodes.reverse();
        out.extend(nodes);
    }

    /// Evaluates each copy of the repeater's group, returned in painting order.
    fn repeat(
        &self,
        repeater: &RepeaterNode,
        frame: f32,
        matrix: Mat3,
        paths: &mut Vec<PendingGeometry>,
    ) -> Vec<RenderNode> {
        let Some(transform) = self.scene.transform(repeater.transform) else {
            return Vec::new();
        };
        let copies = repeater.copies.value(frame).ceil();
        if copies <= 0.0 {
            return Vec::new();
        }
        let count = copies as usize;
        let offset = repeater.offset.value(frame);
        let start_opacity = repeater.start_opacity.value(frame) / 100.0;
        let end_opacity = repeater.end_opacity.value(frame) / 100.0;

        let mut result = Vec::with_capacity(count);
        for i in 0..count {
            let t = if count > 1 {
                i as f32 / (count - 1) as f32
            } else {
                0.0
            };
            let alpha = (start_opacity + (end_opacity - start_opacity) * t).clamp(0.0, 1.0);
            let copy_matrix = matrix * transform.matrix_for_repeater(frame, i as f32 + offset);

            let mut copy = Vec::new();
            for &child in &repeater.children {
                let Some(NodeKind::Group(group)) = self.scene.get(child).map(|n| &n.kind) else {
                    continue;
                };
                self.eval_items(&group.children, frame, copy_matrix, paths, &mut copy);
            }
            result.push(RenderNode::group(None, alpha, copy));
        }
        if repeater.order == RepeaterOrder::Below {
            result.reverse();
        }
        result
    }

    fn paint(&self, source: &PaintSource, frame: f32, matrix: Mat3) -> Paint {
        match source {
            PaintSource::Color(color) => Paint::Solid(color.value(frame)),
            PaintSource::Gradient(id) => match self.scene.gradient(*id) {
                Some(gradient) => Paint::Gradient(gradient.evaluate(frame, matrix)),
                None => Paint::Solid(Vec4::ZERO),
            },
        }
    }

    fn fill(
        &self,
        fill: &FillNode,
        frame: f32,
        matrix: Mat3,
        paths: &[PendingGeometry],
    ) -> Option<Shape> {
        let geometry = combined_path(paths)?;
        Some(Shape {
            geometry,
            style: ShapeStyle::Fill(Fill {
                paint: self.paint(&fill.paint, frame, matrix),
                opacity: (fill.opacity.value(frame) / 100.0).clamp(0.0, 1.0),
                rule: fill.rule,
            }),
        })
    }

    fn stroke(
        &self,
        stroke: &StrokeNode,
        frame: f32,
        matrix: Mat3,
        paths: &[PendingGeometry],
    ) -> Option<Shape> {
        let geometry = combined_path(paths)?;
        let scale = scale_factor(&matrix);
        let dash = dash_info(&stroke.dash, frame);
        let dash = (!dash.is_empty())
            .then(|| DashPattern {
                array: dash.iter().map(|v| v * scale).collect(),
            })
            .filter(|d| !d.is_solid());
        Some(Shape {
            geometry,
            style: ShapeStyle::Stroke(Stroke {
                paint: self.paint(&stroke.paint, frame, matrix),
                width: stroke.width.value(frame) * scale,
                opacity: (stroke.opacity.value(frame) / 100.0).clamp(0.0, 1.0),
                cap: stroke.cap,
                join: stroke.join,
                miter_limit: stroke.miter_limit,
                dash,
            }),
        })
    }
}

/// All pending paths joined in device space; `None` when there is nothing to
/// paint.
fn combined_path(paths: &[PendingGeometry]) -> Option<BezPath> {
    let mut geometry = BezPath::new();
    for pending in paths {
        for el in pending.device_path().elements() {
            geometry.push(*el);
        }
    }
    (!geometry.elements().is_empty()).then_some(geometry)
}

fn apply_trim(trim: &TrimNode, frame: f32, paths: &mut [PendingGeometry]) {
    let segment = TrimSegment::resolve(
        trim.start.value(frame),
        trim.end.value(frame),
        trim.offset.value(frame),
    );
    let Some(segment) = segment else {
        for pending in paths.iter_mut() {
            pending.path = BezPath::new();
        }
        return;
    };
    match trim.mode {
        TrimMode::Simultaneous => {
            for pending in paths.iter_mut() {
                pending.path = trim_path(&pending.path, segment);
            }
        }
        TrimMode::Individual => {
            let mut local: Vec<BezPath> = paths.iter().map(|p| p.path.clone()).collect();
            trim_individually(&mut local, segment);
            for (pending, path) in paths.iter_mut().zip(local) {
                pending.path = path;
            }
        }
    }
}

/// Replaces the paths from `scope` on with their concatenation.
fn merge_paths(paths: &mut Vec<PendingGeometry>, scope: usize) {
    if paths.len() <= scope + 1 {
        return;
    }
    let merged = combined_path(&paths[scope..]).unwrap_or_default();
    paths.truncate(scope);
    paths.push(PendingGeometry {
        path: merged,
        transform: Mat3::IDENTITY,
    });
}
