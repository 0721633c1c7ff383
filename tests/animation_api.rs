use glam::Vec4;
use lottie_player::{Animation, LoadError, PixelFormat, RenderConfig, RenderError, Surface};
use serde_json::json;

fn spinner() -> String {
    json!({
        "ip": 0, "op": 30, "fr": 30, "w": 64, "h": 32,
        "layers": [{
            "ty": 4, "ind": 1, "ip": 0, "op": 30,
            "ks": {"p": {"a": 1, "k": [{"t": 0, "s": [8, 16]}, {"t": 29, "s": [56, 16]}]}},
            "shapes": [
                {"ty": "rc", "p": {"a": 0, "k": [0, 0]}, "s": {"a": 0, "k": [8, 8]}},
                {"ty": "fl", "c": {"a": 0, "k": [1, 0, 0, 1]}, "o": {"a": 0, "k": 100}}
            ]
        }]
    })
    .to_string()
}

#[test]
fn test_metadata() {
    let animation = Animation::from_json_str(&spinner()).unwrap();
    assert_eq!(animation.frame_rate(), 30.0);
    assert_eq!(animation.total_frame(), 30);
    assert_eq!(animation.size(), (64, 32));
    assert!((animation.duration() - 1.0).abs() < 1e-9);
    assert_eq!(animation.frame_at_pos(0.0), 0);
    assert_eq!(animation.frame_at_pos(1.0), 30);
}

#[test]
fn test_invalid_documents_are_rejected() {
    let zero_fps = json!({"ip": 0, "op": 30, "fr": 0, "w": 64, "h": 32, "layers": []});
    assert!(matches!(
        Animation::from_json_str(&zero_fps.to_string()),
        Err(RenderError::Load(LoadError::FrameRate(_)))
    ));
    assert!(matches!(
        Animation::from_file("does/not/exist.json"),
        Err(RenderError::IoError(_))
    ));
}

#[test]
fn test_render_sync_moves_square() {
    let animation = Animation::from_json_str(&spinner()).unwrap();
    let mut surface = animation.surface().unwrap();

    animation.render_sync(0, &mut surface).unwrap();
    assert_eq!(surface.pixel(8, 16), Some([255, 0, 0, 255]));
    assert_eq!(surface.pixel(55, 16), Some([0, 0, 0, 0]));

    // Frames past the end clamp to the last one.
    animation.render_sync(500, &mut surface).unwrap();
    assert_eq!(surface.pixel(8, 16), Some([0, 0, 0, 0]));
    assert_eq!(surface.pixel(55, 16), Some([255, 0, 0, 255]));
}

#[test]
fn test_render_async_matches_sync() {
    let animation = Animation::from_json_str(&spinner()).unwrap();
    let mut expected = animation.surface().unwrap();
    animation.render_sync(12, &mut expected).unwrap();

    let tasks: Vec<_> = (0..4)
        .map(|_| animation.render_async(12, animation.surface().unwrap()))
        .collect();
    for task in tasks {
        assert_eq!(task.frame(), 12);
        assert_eq!(task.join().unwrap(), expected);
    }
}

#[test]
fn test_config_background_and_format() {
    let config = RenderConfig {
        background: Vec4::new(0.0, 0.0, 1.0, 1.0),
        pixel_format: PixelFormat::Rgba8888Premultiplied,
        ..RenderConfig::default()
    };
    let animation = Animation::from_json_str(&spinner()).unwrap().with_config(config);
    let mut surface = animation.surface().unwrap();
    assert_eq!(surface.format(), PixelFormat::Rgba8888Premultiplied);

    animation.render_sync(0, &mut surface).unwrap();
    assert_eq!(surface.pixel(40, 2), Some([0, 0, 255, 255]));
    assert_eq!(&surface.data()[..4], &[0, 0, 255, 255]);
}

#[test]
fn test_render_scales_to_surface_size() {
    let animation = Animation::from_json_str(&spinner()).unwrap();
    let mut surface = Surface::new(128, 64, None, PixelFormat::default()).unwrap();
    animation.render_sync(0, &mut surface).unwrap();
    // The 8x8 square at (8, 16) doubles.
    assert_eq!(surface.pixel(16, 32), Some([255, 0, 0, 255]));
    assert_eq!(surface.pixel(23, 39), Some([255, 0, 0, 255]));
    assert_eq!(surface.pixel(25, 32), Some([0, 0, 0, 0]));
}

#[test]
fn test_render_tree_without_raster() {
    let animation = Animation::from_json_str(&spinner()).unwrap();
    let tree = animation.render_tree(0, 64, 32);
    assert_eq!(tree.shape_count(), 1);
}
