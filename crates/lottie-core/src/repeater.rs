//! # Repeater Normalization
//!
//! A repeater repeats every item declared before it in its container. After
//! loading, those items are moved into a fresh group owned by the repeater so
//! that evaluation only has to walk the repeater's own children.
//!
//! Lists are scanned back to front. The first repeater found (the frontmost
//! one) takes everything before it, and the scan continues inside the new
//! group, so for `[A, B, R, C, D, R2]` the result is `[R2]` with
//! `R2 -> [R, C, D]` and `R -> [A, B]`.

use crate::scene::{GroupNode, NodeId, NodeKind, Scene, SceneNode};
use tracing::debug;

/// Rewrites the subtree under `root` in place. Must run exactly once, before
/// any frame is evaluated.
pub fn normalize_repeaters(scene: &mut Scene, root: NodeId) {
    let mut moved = 0;
    visit_children(scene, root, &mut moved);
    if moved > 0 {
        debug!(repeaters = moved, "normalized repeaters");
    }
}

fn visit(scene: &mut Scene, id: NodeId, moved: &mut usize) {
    let is_container = scene
        .get(id)
        .map(|n| n.kind.is_container())
        .unwrap_or(false);
    if is_container {
        visit_children(scene, id, moved);
    }
}

fn visit_children(scene: &mut Scene, id: NodeId, moved: &mut usize) {
    let children = scene.children(id).to_vec();
    for (pos, &child) in children.iter().enumerate().rev() {
        let is_repeater = matches!(
            scene.get(child).map(|n| &n.kind),
            Some(NodeKind::Repeater(_))
        );
        if !is_repeater {
            visit(scene, child, moved);
            continue;
        }

        let items = children[..pos].to_vec();
        let is_static = items
            .iter()
            .all(|&i| scene.get(i).map(|n| n.is_static).unwrap_or(true));
        let mut group = SceneNode::new(NodeKind::Group(GroupNode {
            children: items,
            transform: None,
        }));
        group.is_static = is_static;
        let group = scene.add(group);

        if let Some(list) = scene.children_mut(id) {
            list.drain(..pos);
        }
        if let Some(NodeKind::Repeater(repeater)) = scene.get_mut(child).map(|n| &mut n.kind) {
            repeater.children.push(group);
        }
        *moved += 1;

        visit_children(scene, group, moved);
        break;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animatable::Animated;
    use crate::scene::{RepeaterNode, RepeaterOrder};
    use crate::transform::TransformNode;

    fn leaf(scene: &mut Scene, name: &str) -> NodeId {
        scene.add(
            SceneNode::new(NodeKind::Transform(TransformNode::default()))
                .named(Some(name.to_string())),
        )
    }

    fn repeater(scene: &mut Scene, name: &str) -> NodeId {
        let transform = scene.add(SceneNode::new(NodeKind::Transform(TransformNode::default())));
        scene.add(
            SceneNode::new(NodeKind::Repeater(RepeaterNode {
                copies: Animated::constant(3.0),
                offset: Animated::constant(0.0),
                transform,
                start_opacity: Animated::constant(100.0),
                end_opacity: Animated::constant(100.0),
                order: RepeaterOrder::Above,
                children: Vec::new(),
            }))
            .named(Some(name.to_string())),
        )
    }

    fn names(scene: &Scene, ids: &[NodeId]) -> Vec<String> {
        ids.iter()
            .map(|&id| scene.get(id).and_then(|n| n.name.clone()).unwrap_or_default())
            .collect()
    }

    fn group(scene: &mut Scene, children: Vec<NodeId>) -> NodeId {
        scene.add(SceneNode::new(NodeKind::Group(GroupNode {
            children,
            transform: None,
        })))
    }

    #[test]
    fn test_no_repeater_is_untouched() {
        let mut scene = Scene::new();
        let a = leaf(&mut scene, "A");
        let b = leaf(&mut scene, "B");
        let root = group(&mut scene, vec![a, b]);
        let before = scene.len();
        normalize_repeaters(&mut scene, root);
        assert_eq!(scene.children(root), &[a, b]);
        assert_eq!(scene.len(), before);
    }

    #[test]
    fn test_single_repeater_owns_preceding_items() {
        let mut scene = Scene::new();
        let a = leaf(&mut scene, "A");
        let r = repeater(&mut scene, "R");
        let c = leaf(&mut scene, "C");
        let root = group(&mut scene, vec![a, r, c]);
        normalize_repeaters(&mut scene, root);

        assert_eq!(names(&scene, scene.children(root)), vec!["R", "C"]);
        let owned = scene.children(r)[0];
        assert_eq!(scene.children(r).len(), 1);
        assert_eq!(names(&scene, scene.children(owned)), vec!["A"]);
    }

    #[test]
    fn test_two_repeaters_nest() {
        let mut scene = Scene::new();
        let ids: Vec<NodeId> = vec![
            leaf(&mut scene, "A"),
            leaf(&mut scene, "B"),
            repeater(&mut scene, "R"),
            leaf(&mut scene, "C"),
            leaf(&mut scene, "D"),
            repeater(&mut scene, "R2"),
        ];
        let (r, r2) = (ids[2], ids[5]);
        let root = group(&mut scene, ids);
        normalize_repeaters(&mut scene, root);

        assert_eq!(names(&scene, scene.children(root)), vec!["R2"]);
        let outer = scene.children(r2)[0];
        assert_eq!(names(&scene, scene.children(outer)), vec!["R", "C", "D"]);
        let inner = scene.children(r)[0];
        assert_eq!(names(&scene, scene.children(inner)), vec!["A", "B"]);
    }

    #[test]
    fn test_frontmost_repeater_gets_empty_group() {
        let mut scene = Scene::new();
        let r = repeater(&mut scene, "R");
        let a = leaf(&mut scene, "A");
        let root = group(&mut scene, vec![r, a]);
        normalize_repeaters(&mut scene, root);
        assert_eq!(scene.children(root), &[r, a]);
        let owned = scene.children(r)[0];
        assert!(scene.children(owned).is_empty());
    }

    #[test]
    fn test_nested_groups_are_visited() {
        let mut scene = Scene::new();
        let a = leaf(&mut scene, "A");
        let r = repeater(&mut scene, "R");
        let inner = group(&mut scene, vec![a, r]);
        let root = group(&mut scene, vec![inner]);
        normalize_repeaters(&mut scene, root);
        assert_eq!(names(&scene, scene.children(inner)), vec!["R"]);
    }
}
