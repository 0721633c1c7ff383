use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use lottie_core::animatable::Animated;
use lottie_core::Composition;
use lottie_data::model::{Keyframe, Property};
use serde_json::json;

fn bench_animated_value(c: &mut Criterion) {
    let mut group = c.benchmark_group("Animated::value");

    // 10,000 keyframes
    let count = 10_000;
    let keyframes = (0..count)
        .map(|i| Keyframe::new(i as f32, i as f32))
        .collect();
    let property: Property<f32> = Property::animated(keyframes);
    let animated = Animated::from_property(&property, 0.0, |v| *v);

    // Early, middle and late frames
    for &frame in &[100.0f32, 5000.0, 9990.5] {
        group.bench_with_input(BenchmarkId::new("value_at", frame), &frame, |b, &f| {
            b.iter(|| animated.value(f))
        });
    }

    group.finish();
}

fn bench_render_tree(c: &mut Criterion) {
    let doc = json!({
        "ip": 0, "op": 60, "fr": 60, "w": 256, "h": 256,
        "layers": [{
            "ty": 4, "ind": 1, "ip": 0, "op": 60,
            "ks": {"r": {"a": 1, "k": [{"t": 0, "s": [0]}, {"t": 60, "s": [360]}]}},
            "shapes": [
                {"ty": "el", "p": {"a": 0, "k": [20, 0]}, "s": {"a": 0, "k": [12, 12]}},
                {"ty": "fl", "c": {"a": 0, "k": [0.2, 0.4, 0.9, 1]}, "o": {"a": 0, "k": 100}},
                {"ty": "rp", "c": {"a": 0, "k": 24}, "o": {"a": 0, "k": 0}, "m": 1,
                 "tr": {"r": {"a": 0, "k": 15}, "so": {"a": 0, "k": 100}, "eo": {"a": 0, "k": 20}}}
            ]
        }]
    })
    .to_string();
    let comp = Composition::from_json_str(&doc).unwrap();

    c.bench_function("Composition::render_tree", |b| {
        b.iter(|| comp.render_tree(30, 256, 256))
    });
}

criterion_group!(benches, bench_animated_value, bench_render_tree);
criterion_main!(benches);
