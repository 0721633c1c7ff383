//! # Scene Graph
//!
//! Arena of evaluated-on-demand nodes built once per composition.
//!
//! Every node lives in [`Scene::nodes`] and is addressed by a [`NodeId`].
//! Layers, groups and repeaters own ordered child lists; paints refer to
//! their gradient by id. After loading, the arena is immutable and shared
//! between concurrent frame requests.

use crate::animatable::Animated;
use crate::gradient::GradientNode;
use crate::shapes::{
    ellipse_path, polystar_path, rect_path, PathData, PolystarKind, PolystarParams,
};
use crate::transform::TransformNode;
use crate::renderer::{FillRule, LineCap, LineJoin};
use glam::{Vec2, Vec4};
use kurbo::BezPath;

pub type NodeId = usize;

#[derive(Clone, Debug, Default)]
pub struct Scene {
    nodes: Vec<SceneNode>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, node: SceneNode) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(node);
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id)
    }

    pub fn nodes(&self) -> &[SceneNode] {
        &self.nodes
    }

    /// Ordered children of a container node; empty for leaves.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match self.nodes.get(id).map(|n| &n.kind) {
            Some(NodeKind::Layer(l)) => &l.children,
            Some(NodeKind::Group(g)) => &g.children,
            Some(NodeKind::Repeater(r)) => &r.children,
            _ => &[],
        }
    }

    pub fn children_mut(&mut self, id: NodeId) -> Option<&mut Vec<NodeId>> {
        match self.nodes.get_mut(id).map(|n| &mut n.kind) {
            Some(NodeKind::Layer(l)) => Some(&mut l.children),
            Some(NodeKind::Group(g)) => Some(&mut g.children),
            Some(NodeKind::Repeater(r)) => Some(&mut r.children),
            _ => None,
        }
    }

    pub fn transform(&self, id: NodeId) -> Option<&TransformNode> {
        match self.nodes.get(id).map(|n| &n.kind) {
            Some(NodeKind::Transform(t)) => Some(t),
            _ => None,
        }
    }

    pub fn gradient(&self, id: NodeId) -> Option<&GradientNode> {
        match self.nodes.get(id).map(|n| &n.kind) {
            Some(NodeKind::Gradient(g)) => Some(g),
            _ => None,
        }
    }

    /// Caches the matrix of every static transform node.
    pub fn cache_static_matrices(&mut self) {
        for node in &mut self.nodes {
            if let NodeKind::Transform(t) = &mut node.kind {
                t.cache_matrix();
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct SceneNode {
    pub name: Option<String>,
    pub is_static: bool,
    pub hidden: bool,
    pub kind: NodeKind,
}

impl SceneNode {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            name: None,
            is_static: false,
            hidden: false,
            kind,
        }
    }

    pub fn named(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }
}

#[derive(Clone, Debug)]
pub enum NodeKind {
    Layer(LayerNode),
    Group(GroupNode),
    Shape(ShapeNode),
    Transform(TransformNode),
    Fill(FillNode),
    Stroke(StrokeNode),
    Gradient(GradientNode),
    Repeater(RepeaterNode),
    Trim(TrimNode),
    Merge(MergeNode),
}

impl NodeKind {
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            NodeKind::Layer(_) | NodeKind::Group(_) | NodeKind::Repeater(_)
        )
    }
}

#[derive(Clone, Debug)]
pub enum LayerContent {
    Shape,
    Precomp { width: f32, height: f32 },
    Solid { color: Vec4, width: f32, height: f32 },
    Null,
}

#[derive(Clone, Debug)]
pub struct LayerNode {
    pub content: LayerContent,
    pub children: Vec<NodeId>,
    pub transform: NodeId,
    pub in_frame: f32,
    pub out_frame: f32,
    pub start_time: f32,
    pub time_stretch: f32,
    pub is_3d: bool,
    pub auto_orient: bool,
    pub index: Option<u32>,
    /// Resolved parent layer among the siblings of this layer.
    pub parent: Option<NodeId>,
}

impl LayerNode {
    pub fn is_visible(&self, frame: f32) -> bool {
        frame >= self.in_frame && frame < self.out_frame
    }

    /// Maps a frame of the enclosing composition to this layer's local time.
    pub fn local_frame(&self, frame: f32) -> f32 {
        let stretch = if self.time_stretch == 0.0 {
            1.0
        } else {
            self.time_stretch
        };
        (frame - self.start_time) / stretch
    }
}

#[derive(Clone, Debug, Default)]
pub struct GroupNode {
    pub children: Vec<NodeId>,
    pub transform: Option<NodeId>,
}

#[derive(Clone, Debug)]
pub enum ShapeGeometry {
    Path {
        data: Animated<PathData>,
    },
    Rect {
        position: Animated<Vec2>,
        size: Animated<Vec2>,
        roundness: Animated<f32>,
    },
    Ellipse {
        position: Animated<Vec2>,
        size: Animated<Vec2>,
    },
    Polystar {
        kind: PolystarKind,
        position: Animated<Vec2>,
        points: Animated<f32>,
        rotation: Animated<f32>,
        outer_radius: Animated<f32>,
        outer_roundness: Animated<f32>,
        inner_radius: Animated<f32>,
        inner_roundness: Animated<f32>,
    },
}

impl ShapeGeometry {
    /// Builds the outline at `frame`. Free-form paths keep their own
    /// direction; `clockwise` only applies to the primitives.
    pub fn path(&self, frame: f32, clockwise: bool) -> BezPath {
        match self {
            ShapeGeometry::Path { data } => data.value(frame).to_bez_path(),
            ShapeGeometry::Rect {
                position,
                size,
                roundness,
            } => rect_path(
                position.value(frame),
                size.value(frame),
                roundness.value(frame),
                clockwise,
            ),
            ShapeGeometry::Ellipse { position, size } => {
                ellipse_path(position.value(frame), size.value(frame), clockwise)
            }
            ShapeGeometry::Polystar {
                kind,
                position,
                points,
                rotation,
                outer_radius,
                outer_roundness,
                inner_radius,
                inner_roundness,
            } => polystar_path(
                &PolystarParams {
                    kind: *kind,
                    center: position.value(frame),
                    points: points.value(frame),
                    rotation: rotation.value(frame),
                    outer_radius: outer_radius.value(frame),
                    outer_roundness: outer_roundness.value(frame),
                    inner_radius: inner_radius.value(frame),
                    inner_roundness: inner_roundness.value(frame),
                },
                clockwise,
            ),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ShapeNode {
    pub geometry: ShapeGeometry,
    /// Document direction 3 draws the primitive counter-clockwise.
    pub reversed: bool,
    /// Outline of a static shape, built once at load.
    pub cached: Option<BezPath>,
}

impl ShapeNode {
    pub fn new(geometry: ShapeGeometry, reversed: bool) -> Self {
        Self {
            geometry,
            reversed,
            cached: None,
        }
    }

    /// Keeps the frame-0 outline of a geometry with no animated channel.
    pub fn cache_path(&mut self, is_static: bool) {
        self.cached = is_static.then(|| self.geometry.path(0.0, !self.reversed));
    }

    pub fn path(&self, frame: f32) -> BezPath {
        match &self.cached {
            Some(path) => path.clone(),
            None => self.geometry.path(frame, !self.reversed),
        }
    }
}

#[derive(Clone, Debug)]
pub enum PaintSource {
    Color(Animated<Vec4>),
    Gradient(NodeId),
}

#[derive(Clone, Debug)]
pub struct FillNode {
    pub paint: PaintSource,
    pub opacity: Animated<f32>,
    pub rule: FillRule,
}

#[derive(Clone, Debug)]
pub struct StrokeNode {
    pub paint: PaintSource,
    pub opacity: Animated<f32>,
    pub width: Animated<f32>,
    pub cap: LineCap,
    pub join: LineJoin,
    pub miter_limit: f32,
    pub dash: Vec<Animated<f32>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RepeaterOrder {
    Above,
    Below,
}

#[derive(Clone, Debug)]
pub struct RepeaterNode {
    pub copies: Animated<f32>,
    pub offset: Animated<f32>,
    pub transform: NodeId,
    pub start_opacity: Animated<f32>,
    pub end_opacity: Animated<f32>,
    pub order: RepeaterOrder,
    /// Exactly one shape group once repeaters are normalized.
    pub children: Vec<NodeId>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrimMode {
    Simultaneous,
    Individual,
}

#[derive(Clone, Debug)]
pub struct TrimNode {
    pub start: Animated<f32>,
    pub end: Animated<f32>,
    pub offset: Animated<f32>,
    pub mode: TrimMode,
}

#[derive(Clone, Debug)]
pub struct MergeNode {
    pub mode: u8,
}
