use lottie_core::scene::NodeKind;
use lottie_core::Composition;
use serde_json::{json, Value};

fn named_rect(name: &str) -> Value {
    json!({"ty": "rc", "nm": name, "p": {"a": 0, "k": [0, 0]}, "s": {"a": 0, "k": [4, 4]}})
}

fn repeater(name: &str, copies: f32) -> Value {
    json!({
        "ty": "rp", "nm": name, "c": {"a": 0, "k": copies}, "o": {"a": 0, "k": 0}, "m": 1,
        "tr": {"p": {"a": 0, "k": [10, 0]}, "so": {"a": 0, "k": 100}, "eo": {"a": 0, "k": 100}}
    })
}

fn doc(shapes: Value) -> String {
    json!({
        "ip": 0, "op": 10, "fr": 10, "w": 100, "h": 100,
        "layers": [{"ty": 4, "ind": 1, "ip": 0, "op": 10, "ks": {}, "shapes": shapes}]
    })
    .to_string()
}

fn names(comp: &Composition, ids: &[usize]) -> Vec<String> {
    ids.iter()
        .map(|&id| {
            comp.scene()
                .get(id)
                .and_then(|n| n.name.clone())
                .unwrap_or_default()
        })
        .collect()
}

#[test]
fn test_load_normalizes_repeaters() {
    let shapes = json!([
        named_rect("A"),
        named_rect("B"),
        repeater("R", 2.0),
        named_rect("C"),
        named_rect("D"),
        repeater("R2", 2.0)
    ]);
    let comp = Composition::from_json_str(&doc(shapes)).unwrap();
    let scene = comp.scene();
    let layer = scene.children(comp.root())[0];

    let top = scene.children(layer);
    assert_eq!(names(&comp, top), vec!["R2"]);

    let outer = scene.children(top[0]);
    assert_eq!(outer.len(), 1);
    let outer_items = scene.children(outer[0]);
    assert_eq!(names(&comp, outer_items), vec!["R", "C", "D"]);

    let inner = scene.children(outer_items[0]);
    assert_eq!(names(&comp, scene.children(inner[0])), vec!["A", "B"]);

    for &id in top.iter().chain(outer_items) {
        if let Some(NodeKind::Repeater(r)) = scene.get(id).map(|n| &n.kind) {
            assert_eq!(r.children.len(), 1);
        }
    }
}

#[test]
fn test_nested_repeaters_multiply_copies() {
    let shapes = json!([
        named_rect("A"),
        {"ty": "fl", "c": {"a": 0, "k": [1, 0, 0, 1]}, "o": {"a": 0, "k": 100}},
        repeater("R", 3.0),
        repeater("R2", 2.0)
    ]);
    let comp = Composition::from_json_str(&doc(shapes)).unwrap();
    assert_eq!(comp.render_tree(0, 100, 100).shape_count(), 6);
}

#[test]
fn test_fractional_copies_round_up() {
    let shapes = json!([
        named_rect("A"),
        {"ty": "fl", "c": {"a": 0, "k": [1, 0, 0, 1]}, "o": {"a": 0, "k": 100}},
        repeater("R", 2.2)
    ]);
    let comp = Composition::from_json_str(&doc(shapes)).unwrap();
    assert_eq!(comp.render_tree(0, 100, 100).shape_count(), 3);
}
