//! # Import
//!
//! Builds the scene arena from the parsed document. Every shape item becomes
//! one node; properties are compiled into [`Animated`] timelines once, here,
//! so frame evaluation never touches the JSON model again.
//!
//! The composition itself becomes a root precomp layer holding the top-level
//! layers, which lets the evaluator treat nested precomps and the root the
//! same way.

use crate::animatable::Animated;
use crate::gradient::GradientNode;
use crate::renderer::{FillRule, GradientKind, LineCap, LineJoin};
use crate::scene::{
    FillNode, GroupNode, LayerContent, LayerNode, MergeNode, NodeId, NodeKind, PaintSource,
    RepeaterNode, RepeaterOrder, Scene, SceneNode, ShapeGeometry, ShapeNode, StrokeNode, TrimMode,
    TrimNode,
};
use crate::shapes::{PathData, PolystarKind};
use crate::transform::TransformNode;
use glam::{Vec2, Vec4};
use lottie_data::model as data;
use std::collections::HashMap;
use tracing::{debug, warn};

const DEFAULT_MITER_LIMIT: f32 = 4.0;

fn vec2(v: &data::Vec2) -> Vec2 {
    Vec2::from_array(*v)
}

fn vec4(v: &data::Vec4) -> Vec4 {
    Vec4::from_array(*v)
}

fn scalar(v: &f32) -> f32 {
    *v
}

/// Parses `#rrggbb` into an opaque color.
pub fn parse_hex_color(s: &str) -> Option<Vec4> {
    let hex = s.trim().trim_start_matches('#');
    if hex.len() != 6 {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| -> Option<f32> {
        let part = hex.get(range)?;
        u8::from_str_radix(part, 16).ok().map(|c| c as f32 / 255.0)
    };
    Some(Vec4::new(channel(0..2)?, channel(2..4)?, channel(4..6)?, 1.0))
}

/// Imports the whole document. Returns the arena and the root layer.
pub fn import_scene(model: &data::LottieJson) -> (Scene, NodeId) {
    Importer::new(model).import(model)
}

struct Importer<'a> {
    scene: Scene,
    assets: HashMap<&'a str, &'a data::Asset>,
    /// Precomp assets being imported, to break reference cycles.
    asset_stack: Vec<&'a str>,
}

impl<'a> Importer<'a> {
    fn new(model: &'a data::LottieJson) -> Self {
        let assets = model.assets.iter().map(|a| (a.id.as_str(), a)).collect();
        Self {
            scene: Scene::new(),
            assets,
            asset_stack: Vec::new(),
        }
    }

    fn import(mut self, model: &'a data::LottieJson) -> (Scene, NodeId) {
        let children = self.import_layers(&model.layers);
        let transform = self.add_transform(TransformNode::default());
        let is_static = self.all_static(&children);
        let mut root = SceneNode::new(NodeKind::Layer(LayerNode {
            content: LayerContent::Precomp {
                width: model.w as f32,
                height: model.h as f32,
            },
            children,
            transform,
            in_frame: model.ip,
            out_frame: model.op,
            start_time: 0.0,
            time_stretch: 1.0,
            is_3d: false,
            auto_orient: false,
            index: None,
            parent: None,
        }))
        .named(model.nm.clone());
        root.is_static = is_static;
        let root = self.scene.add(root);
        debug!(nodes = self.scene.len(), "imported scene");
        (self.scene, root)
    }

    fn add(&mut self, node: SceneNode, is_static: bool) -> NodeId {
        let mut node = node;
        node.is_static = is_static;
        self.scene.add(node)
    }

    fn add_transform(&mut self, transform: TransformNode) -> NodeId {
        let is_static = transform.is_static();
        self.add(SceneNode::new(NodeKind::Transform(transform)), is_static)
    }

    fn is_static(&self, id: NodeId) -> bool {
        self.scene.get(id).map(|n| n.is_static).unwrap_or(true)
    }

    fn all_static(&self, ids: &[NodeId]) -> bool {
        ids.iter().all(|&id| self.is_static(id))
    }

    fn import_layers(&mut self, layers: &'a [data::Layer]) -> Vec<NodeId> {
        let ids: Vec<NodeId> = layers.iter().map(|l| self.import_layer(l)).collect();

        let by_index: HashMap<u32, NodeId> = layers
            .iter()
            .zip(&ids)
            .filter_map(|(l, &id)| l.ind.map(|ind| (ind, id)))
            .collect();
        for (layer, &id) in layers.iter().zip(&ids) {
            let Some(parent_index) = layer.parent else {
                continue;
            };
            let parent = by_index.get(&parent_index).copied();
            if parent.is_none() {
                warn!(
                    layer = layer.nm.as_deref().unwrap_or_default(),
                    parent = parent_index,
                    "layer parent not found, ignoring"
                );
            }
            if let Some(NodeKind::Layer(node)) = self.scene.get_mut(id).map(|n| &mut n.kind) {
                node.parent = parent.filter(|&p| p != id);
            }
        }
        ids
    }

    fn import_layer(&mut self, layer: &'a data::Layer) -> NodeId {
        let is_3d = layer.ddd == Some(1);
        let transform = self.add_transform(TransformNode::from_data(&layer.ks, is_3d));

        let (content, children) = match layer.ty {
            0 => self.import_precomp(layer),
            1 => {
                let color = layer
                    .color
                    .as_deref()
                    .and_then(parse_hex_color)
                    .unwrap_or_else(|| {
                        warn!(color = ?layer.color, "invalid solid color, using black");
                        Vec4::new(0.0, 0.0, 0.0, 1.0)
                    });
                let content = LayerContent::Solid {
                    color,
                    width: layer.sw.unwrap_or(0) as f32,
                    height: layer.sh.unwrap_or(0) as f32,
                };
                (content, Vec::new())
            }
            3 => (LayerContent::Null, Vec::new()),
            4 => {
                let shapes = layer.shapes.as_deref().unwrap_or_default();
                (LayerContent::Shape, self.import_shapes(shapes))
            }
            ty => {
                warn!(ty, "unsupported layer type, treating as null");
                (LayerContent::Null, Vec::new())
            }
        };

        let is_static = self.is_static(transform) && self.all_static(&children);
        let node = SceneNode::new(NodeKind::Layer(LayerNode {
            content,
            children,
            transform,
            in_frame: layer.ip,
            out_frame: layer.op,
            start_time: layer.st,
            time_stretch: layer.sr,
            is_3d,
            auto_orient: layer.ao == Some(1),
            index: layer.ind,
            parent: None,
        }))
        .named(layer.nm.clone())
        .hidden(layer.hd);
        self.add(node, is_static)
    }

    fn import_precomp(&mut self, layer: &'a data::Layer) -> (LayerContent, Vec<NodeId>) {
        let asset = layer
            .ref_id
            .as_deref()
            .and_then(|id| self.assets.get(id).copied());
        let Some(asset) = asset else {
            warn!(ref_id = ?layer.ref_id, "precomp asset not found");
            return (LayerContent::Null, Vec::new());
        };
        if self.asset_stack.contains(&asset.id.as_str()) {
            warn!(ref_id = %asset.id, "recursive precomp reference");
            return (LayerContent::Null, Vec::new());
        }

        self.asset_stack.push(asset.id.as_str());
        let layers = asset.layers.as_deref().unwrap_or_default();
        let children = self.import_layers(layers);
        self.asset_stack.pop();

        let content = LayerContent::Precomp {
            width: layer.w.or(asset.w).unwrap_or(0) as f32,
            height: layer.h.or(asset.h).unwrap_or(0) as f32,
        };
        (content, children)
    }

    fn import_shapes(&mut self, shapes: &'a [data::Shape]) -> Vec<NodeId> {
        shapes.iter().filter_map(|s| self.import_shape(s)).collect()
    }

    fn import_shape(&mut self, shape: &'a data::Shape) -> Option<NodeId> {
        let id = match shape {
            data::Shape::Group(g) => {
                let transform = g.it.iter().find_map(|item| match item {
                    data::Shape::Transform(t) => Some(&t.t),
                    _ => None,
                });
                let transform = transform.map(|t| self.add_transform(TransformNode::from_data(t, false)));
                let items: Vec<&'a data::Shape> = g
                    .it
                    .iter()
                    .filter(|item| !matches!(item, data::Shape::Transform(_)))
                    .collect();
                let children: Vec<NodeId> =
                    items.into_iter().filter_map(|s| self.import_shape(s)).collect();
                let is_static = transform.map(|t| self.is_static(t)).unwrap_or(true)
                    && self.all_static(&children);
                let node = SceneNode::new(NodeKind::Group(GroupNode {
                    children,
                    transform,
                }))
                .named(g.nm.clone())
                .hidden(g.hd);
                self.add(node, is_static)
            }
            data::Shape::Rect(r) => {
                let geometry = ShapeGeometry::Rect {
                    position: Animated::from_property(&r.p, Vec2::ZERO, vec2),
                    size: Animated::from_property(&r.s, Vec2::ZERO, vec2),
                    roundness: Animated::from_property(&r.r, 0.0, scalar),
                };
                self.add_shape(geometry, r.d, r.nm.clone(), r.hd)
            }
            data::Shape::Ellipse(e) => {
                let geometry = ShapeGeometry::Ellipse {
                    position: Animated::from_property(&e.p, Vec2::ZERO, vec2),
                    size: Animated::from_property(&e.s, Vec2::ZERO, vec2),
                };
                self.add_shape(geometry, e.d, e.nm.clone(), e.hd)
            }
            data::Shape::Path(p) => {
                let data = Animated::from_property(&p.ks, PathData::default(), |v: &data::BezierPath| {
                    PathData::from(v)
                });
                let geometry = ShapeGeometry::Path { data };
                self.add_shape(geometry, p.d, p.nm.clone(), p.hd)
            }
            data::Shape::Polystar(s) => {
                let optional = |p: &Option<data::Property<f32>>| match p {
                    Some(p) => Animated::from_property(p, 0.0, scalar),
                    None => Animated::constant(0.0),
                };
                let geometry = ShapeGeometry::Polystar {
                    kind: if s.sy == 2 {
                        PolystarKind::Polygon
                    } else {
                        PolystarKind::Star
                    },
                    position: Animated::from_property(&s.p, Vec2::ZERO, vec2),
                    points: Animated::from_property(&s.pt, 5.0, scalar),
                    rotation: Animated::from_property(&s.r, 0.0, scalar),
                    outer_radius: Animated::from_property(&s.or, 0.0, scalar),
                    outer_roundness: Animated::from_property(&s.os, 0.0, scalar),
                    inner_radius: optional(&s.ir),
                    inner_roundness: optional(&s.is),
                };
                self.add_shape(geometry, s.d, s.nm.clone(), s.hd)
            }
            data::Shape::Fill(f) => {
                let fill = FillNode {
                    paint: PaintSource::Color(Animated::from_property(&f.c, Vec4::ONE, vec4)),
                    opacity: Animated::from_property(&f.o, 100.0, scalar),
                    rule: fill_rule(f.r),
                };
                let is_static = paint_static(&fill.paint) && fill.opacity.is_static();
                let node = SceneNode::new(NodeKind::Fill(fill))
                    .named(f.nm.clone())
                    .hidden(f.hd);
                self.add(node, is_static)
            }
            data::Shape::Stroke(s) => {
                let stroke = StrokeNode {
                    paint: PaintSource::Color(Animated::from_property(&s.c, Vec4::ONE, vec4)),
                    opacity: Animated::from_property(&s.o, 100.0, scalar),
                    width: Animated::from_property(&s.w, 1.0, scalar),
                    cap: line_cap(s.lc),
                    join: line_join(s.lj),
                    miter_limit: s.ml.unwrap_or(DEFAULT_MITER_LIMIT),
                    dash: dash_entries(&s.d),
                };
                self.add_stroke(stroke, s.nm.clone(), s.hd)
            }
            data::Shape::GradientFill(g) => {
                let gradient = self.add_gradient(g.t, &g.s, &g.e, &g.h, &g.a, &g.g);
                let fill = FillNode {
                    paint: PaintSource::Gradient(gradient),
                    opacity: Animated::from_property(&g.o, 100.0, scalar),
                    rule: fill_rule(g.r),
                };
                let is_static = self.is_static(gradient) && fill.opacity.is_static();
                let node = SceneNode::new(NodeKind::Fill(fill))
                    .named(g.nm.clone())
                    .hidden(g.hd);
                self.add(node, is_static)
            }
            data::Shape::GradientStroke(g) => {
                let gradient = self.add_gradient(g.t, &g.s, &g.e, &g.h, &g.a, &g.g);
                let stroke = StrokeNode {
                    paint: PaintSource::Gradient(gradient),
                    opacity: Animated::from_property(&g.o, 100.0, scalar),
                    width: Animated::from_property(&g.w, 1.0, scalar),
                    cap: line_cap(g.lc),
                    join: line_join(g.lj),
                    miter_limit: g.ml.unwrap_or(DEFAULT_MITER_LIMIT),
                    dash: dash_entries(&g.d),
                };
                self.add_stroke(stroke, g.nm.clone(), g.hd)
            }
            data::Shape::Trim(t) => {
                let trim = TrimNode {
                    start: Animated::from_property(&t.s, 0.0, scalar),
                    end: Animated::from_property(&t.e, 100.0, scalar),
                    offset: Animated::from_property(&t.o, 0.0, scalar),
                    mode: if t.m == 2 {
                        TrimMode::Individual
                    } else {
                        TrimMode::Simultaneous
                    },
                };
                let is_static =
                    trim.start.is_static() && trim.end.is_static() && trim.offset.is_static();
                let node = SceneNode::new(NodeKind::Trim(trim))
                    .named(t.nm.clone())
                    .hidden(t.hd);
                self.add(node, is_static)
            }
            data::Shape::Repeater(r) => {
                let transform = self.add_transform(TransformNode::from_data(&r.tr.t, false));
                let repeater = RepeaterNode {
                    copies: Animated::from_property(&r.c, 0.0, scalar),
                    offset: Animated::from_property(&r.o, 0.0, scalar),
                    transform,
                    start_opacity: Animated::from_property(&r.tr.so, 100.0, scalar),
                    end_opacity: Animated::from_property(&r.tr.eo, 100.0, scalar),
                    order: if r.m == 2 {
                        RepeaterOrder::Below
                    } else {
                        RepeaterOrder::Above
                    },
                    children: Vec::new(),
                };
                let is_static = self.is_static(transform)
                    && repeater.copies.is_static()
                    && repeater.offset.is_static()
                    && repeater.start_opacity.is_static()
                    && repeater.end_opacity.is_static();
                let node = SceneNode::new(NodeKind::Repeater(repeater))
                    .named(r.nm.clone())
                    .hidden(r.hd);
                self.add(node, is_static)
            }
            data::Shape::MergePaths(m) => {
                let node = SceneNode::new(NodeKind::Merge(MergeNode { mode: m.mm }))
                    .named(m.nm.clone())
                    .hidden(m.hd);
                self.add(node, true)
            }
            data::Shape::Transform(_) => {
                debug!("transform item outside a group, ignoring");
                return None;
            }
            data::Shape::Unknown => {
                warn!("unknown shape item, skipping");
                return None;
            }
        };
        Some(id)
    }

    fn add_shape(
        &mut self,
        geometry: ShapeGeometry,
        direction: u8,
        name: Option<String>,
        hidden: bool,
    ) -> NodeId {
        let is_static = geometry_static(&geometry);
        let mut shape = ShapeNode::new(geometry, direction == 3);
        shape.cache_path(is_static);
        let node = SceneNode::new(NodeKind::Shape(shape))
            .named(name)
            .hidden(hidden);
        self.add(node, is_static)
    }

    fn add_stroke(&mut self, stroke: StrokeNode, name: Option<String>, hidden: bool) -> NodeId {
        let paint_static = match &stroke.paint {
            PaintSource::Gradient(id) => self.is_static(*id),
            paint => paint_static(paint),
        };
        let is_static = paint_static
            && stroke.opacity.is_static()
            && stroke.width.is_static()
            && stroke.dash.iter().all(Animated::is_static);
        let node = SceneNode::new(NodeKind::Stroke(stroke))
            .named(name)
            .hidden(hidden);
        self.add(node, is_static)
    }

    fn add_gradient(
        &mut self,
        ty: u8,
        start: &data::Property<data::Vec2>,
        end: &data::Property<data::Vec2>,
        highlight_length: &data::Property<f32>,
        highlight_angle: &data::Property<f32>,
        colors: &data::GradientColors,
    ) -> NodeId {
        let mut gradient = GradientNode {
            kind: if ty == 2 {
                GradientKind::Radial
            } else {
                GradientKind::Linear
            },
            start: Animated::from_property(start, Vec2::ZERO, vec2),
            end: Animated::from_property(end, Vec2::ZERO, vec2),
            highlight_length: Animated::from_property(highlight_length, 0.0, scalar),
            highlight_angle: Animated::from_property(highlight_angle, 0.0, scalar),
            buffer: Animated::from_property(&colors.k, Vec::new(), |v: &Vec<f32>| v.clone()),
            color_points: colors.p,
            cached_stops: None,
        };
        gradient.cache_stops();
        let is_static = gradient.is_static();
        self.add(SceneNode::new(NodeKind::Gradient(gradient)), is_static)
    }
}

fn fill_rule(r: Option<u8>) -> FillRule {
    match r {
        Some(2) => FillRule::EvenOdd,
        _ => FillRule::NonZero,
    }
}

fn line_cap(lc: u8) -> LineCap {
    match lc {
        1 => LineCap::Butt,
        3 => LineCap::Square,
        _ => LineCap::Round,
    }
}

fn line_join(lj: u8) -> LineJoin {
    match lj {
        1 => LineJoin::Miter,
        3 => LineJoin::Bevel,
        _ => LineJoin::Round,
    }
}

fn dash_entries(d: &[data::DashProperty]) -> Vec<Animated<f32>> {
    d.iter()
        .map(|entry| Animated::from_property(&entry.v, 0.0, scalar))
        .collect()
}

fn paint_static(paint: &PaintSource) -> bool {
    match paint {
        PaintSource::Color(c) => c.is_static(),
        // Resolved by the caller against the gradient node.
        PaintSource::Gradient(_) => true,
    }
}

fn geometry_static(geometry: &ShapeGeometry) -> bool {
    match geometry {
        ShapeGeometry::Path { data } => data.is_static(),
        ShapeGeometry::Rect {
            position,
            size,
            roundness,
        } => position.is_static() && size.is_static() && roundness.is_static(),
        ShapeGeometry::Ellipse { position, size } => position.is_static() && size.is_static(),
        ShapeGeometry::Polystar {
            position,
            points,
            rotation,
            outer_radius,
            outer_roundness,
            inner_radius,
            inner_roundness,
            ..
        } => {
            position.is_static()
                && points.is_static()
                && rotation.is_static()
                && outer_radius.is_static()
                && outer_roundness.is_static()
                && inner_radius.is_static()
                && inner_roundness.is_static()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn model(value: serde_json::Value) -> data::LottieJson {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#ff0000"), Some(Vec4::new(1.0, 0.0, 0.0, 1.0)));
        assert_eq!(parse_hex_color("00ff00"), Some(Vec4::new(0.0, 1.0, 0.0, 1.0)));
        assert_eq!(parse_hex_color("#fff"), None);
        assert_eq!(parse_hex_color("#zz0000"), None);
    }

    #[test]
    fn test_group_transform_is_extracted() {
        let doc = model(json!({
            "ip": 0, "op": 10, "fr": 30, "w": 100, "h": 100,
            "layers": [{
                "ty": 4, "ind": 1, "ip": 0, "op": 10, "ks": {},
                "shapes": [{
                    "ty": "gr",
                    "it": [
                        {"ty": "el", "p": {"a": 0, "k": [0, 0]}, "s": {"a": 0, "k": [10, 10]}},
                        {"ty": "fl", "c": {"a": 0, "k": [1, 0, 0, 1]}, "o": {"a": 0, "k": 100}},
                        {"ty": "tr", "p": {"a": 0, "k": [5, 5]}}
                    ]
                }]
            }]
        }));
        let (scene, root) = import_scene(&doc);
        let layer = scene.children(root)[0];
        let group = scene.children(layer)[0];
        let NodeKind::Group(g) = &scene.get(group).unwrap().kind else {
            panic!("expected group");
        };
        assert!(g.transform.is_some());
        assert_eq!(g.children.len(), 2);
        assert!(scene.get(root).unwrap().is_static);
    }

    #[test]
    fn test_parent_resolution() {
        let doc = model(json!({
            "ip": 0, "op": 10, "fr": 30, "w": 100, "h": 100,
            "layers": [
                {"ty": 3, "ind": 1, "ip": 0, "op": 10, "ks": {}},
                {"ty": 3, "ind": 2, "parent": 1, "ip": 0, "op": 10, "ks": {}},
                {"ty": 3, "ind": 3, "parent": 9, "ip": 0, "op": 10, "ks": {}}
            ]
        }));
        let (scene, root) = import_scene(&doc);
        let layers = scene.children(root).to_vec();
        let parent_of = |id: NodeId| match &scene.get(id).unwrap().kind {
            NodeKind::Layer(l) => l.parent,
            _ => None,
        };
        assert_eq!(parent_of(layers[1]), Some(layers[0]));
        assert_eq!(parent_of(layers[2]), None);
    }

    #[test]
    fn test_recursive_precomp_is_cut() {
        let doc = model(json!({
            "ip": 0, "op": 10, "fr": 30, "w": 100, "h": 100,
            "assets": [{"id": "a", "layers": [
                {"ty": 0, "refId": "a", "ip": 0, "op": 10, "ks": {}}
            ]}],
            "layers": [{"ty": 0, "refId": "a", "ip": 0, "op": 10, "ks": {}}]
        }));
        let (scene, root) = import_scene(&doc);
        let outer = scene.children(root)[0];
        let inner = scene.children(outer)[0];
        assert!(scene.children(inner).is_empty());
    }
}
