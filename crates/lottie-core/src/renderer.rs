use glam::{Mat3, Vec2, Vec4};
use kurbo::BezPath;

/// Evaluated state of one frame. Geometry is already in device space;
/// children of a group are listed in painting order (first = bottom).
#[derive(Clone, Debug)]
pub struct RenderTree {
    pub width: f32,
    pub height: f32,
    pub frame: f32,
    pub root: RenderNode,
}

impl RenderTree {
    /// Visits every shape in painting order with its accumulated opacity.
    pub fn visit_shapes<'a>(&'a self, mut f: impl FnMut(&'a Shape, f32)) {
        fn walk<'a>(node: &'a RenderNode, parent_alpha: f32, f: &mut impl FnMut(&'a Shape, f32)) {
            let alpha = parent_alpha * node.alpha;
            if alpha <= 0.0 {
                return;
            }
            match &node.content {
                NodeContent::Group(children) => {
                    for child in children {
                        walk(child, alpha, f);
                    }
                }
                NodeContent::Shape(shape) => f(shape, alpha),
            }
        }
        walk(&self.root, 1.0, &mut f);
    }

    pub fn shape_count(&self) -> usize {
        let mut count = 0;
        self.visit_shapes(|_, _| count += 1);
        count
    }
}

#[derive(Clone, Debug)]
pub struct RenderNode {
    pub name: Option<String>,
    pub alpha: f32,
    pub content: NodeContent,
}

impl RenderNode {
    pub fn group(name: Option<String>, alpha: f32, children: Vec<RenderNode>) -> Self {
        Self {
            name,
            alpha,
            content: NodeContent::Group(children),
        }
    }

    pub fn shape(shape: Shape) -> Self {
        Self {
            name: None,
            alpha: 1.0,
            content: NodeContent::Shape(shape),
        }
    }
}

#[derive(Clone, Debug)]
pub enum NodeContent {
    Group(Vec<RenderNode>),
    Shape(Shape),
}

/// One paint operation over the paths it applies to.
#[derive(Clone, Debug)]
pub struct Shape {
    pub geometry: BezPath,
    pub style: ShapeStyle,
}

#[derive(Clone, Debug)]
pub enum ShapeStyle {
    Fill(Fill),
    Stroke(Stroke),
}

impl ShapeStyle {
    pub fn paint(&self) -> &Paint {
        match self {
            ShapeStyle::Fill(f) => &f.paint,
            ShapeStyle::Stroke(s) => &s.paint,
        }
    }

    pub fn opacity(&self) -> f32 {
        match self {
            ShapeStyle::Fill(f) => f.opacity,
            ShapeStyle::Stroke(s) => s.opacity,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Fill {
    pub paint: Paint,
    pub opacity: f32,
    pub rule: FillRule,
}

#[derive(Clone, Debug)]
pub struct Stroke {
    pub paint: Paint,
    /// Device-space width.
    pub width: f32,
    pub opacity: f32,
    pub cap: LineCap,
    pub join: LineJoin,
    pub miter_limit: f32,
    pub dash: Option<DashPattern>,
}

#[derive(Clone, Debug)]
pub enum Paint {
    Solid(Vec4), // R, G, B, A
    Gradient(Gradient),
}

#[derive(Clone, Debug)]
pub struct Gradient {
    pub kind: GradientKind,
    /// Premultiplied stops in color-stop order.
    pub stops: Vec<GradientStop>,
    // Gradient-space geometry; `transform` maps it to device space.
    pub start: Vec2,
    pub end: Vec2,
    pub focal: Vec2,
    pub focal_radius: f32,
    pub transform: Mat3,
}

impl Gradient {
    pub fn radius(&self) -> f32 {
        self.start.distance(self.end)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GradientKind {
    Linear,
    Radial,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GradientStop {
    pub offset: f32,
    pub color: Vec4,
}

/// Dash lengths in device space: `(dash, gap)` pairs, followed by the dash
/// offset when the length is odd.
#[derive(Clone, Debug, PartialEq)]
pub struct DashPattern {
    pub array: Vec<f32>,
}

impl DashPattern {
    pub fn intervals(&self) -> &[f32] {
        let pairs = self.array.len() / 2;
        &self.array[..pairs * 2]
    }

    pub fn offset(&self) -> f32 {
        if self.array.len() % 2 == 1 {
            self.array[self.array.len() - 1]
        } else {
            0.0
        }
    }

    /// A pattern with no positive interval draws the stroke solid.
    pub fn is_solid(&self) -> bool {
        self.intervals().iter().sum::<f32>() <= 0.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FillRule {
    #[default]
    NonZero,
    EvenOdd,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LineCap {
    Butt,
    #[default]
    Round,
    Square,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LineJoin {
    Miter,
    #[default]
    Round,
    Bevel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dash_pattern_offset() {
        let even = DashPattern { array: vec![4.0, 2.0] };
        assert_eq!(even.intervals(), &[4.0, 2.0]);
        assert_eq!(even.offset(), 0.0);

        let odd = DashPattern { array: vec![4.0, 4.0, 2.0] };
        assert_eq!(odd.intervals(), &[4.0, 4.0]);
        assert_eq!(odd.offset(), 2.0);

        assert!(DashPattern { array: vec![0.0, 0.0, 3.0] }.is_solid());
    }

    #[test]
    fn test_visit_shapes_accumulates_alpha() {
        let shape = Shape {
            geometry: BezPath::new(),
            style: ShapeStyle::Fill(Fill {
                paint: Paint::Solid(Vec4::ONE),
                opacity: 1.0,
                rule: FillRule::NonZero,
            }),
        };
        let tree = RenderTree {
            width: 10.0,
            height: 10.0,
            frame: 0.0,
            root: RenderNode::group(
                None,
                0.5,
                vec![
                    RenderNode::group(None, 0.5, vec![RenderNode::shape(shape.clone())]),
                    RenderNode::group(None, 0.0, vec![RenderNode::shape(shape)]),
                ],
            ),
        };
        let mut alphas = Vec::new();
        tree.visit_shapes(|_, a| alphas.push(a));
        assert_eq!(alphas, vec![0.25]);
        assert_eq!(tree.shape_count(), 1);
    }
}
