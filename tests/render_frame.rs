//! End-to-end frame rendering through the CPU target: scene JSON in,
//! pixels out.

use glowform::{
    BlendMode, Canvas, Compositor, CpuTarget, Layer, LayerType, MovementStyle, OrbitPoint,
    OrbitRegistry, Scene, scene_from_json,
};

fn pixel(target: &CpuTarget, x: u32, y: u32) -> [u8; 4] {
    let frame = target.readback();
    let i = ((y * frame.width + x) * 4) as usize;
    [
        frame.data[i],
        frame.data[i + 1],
        frame.data[i + 2],
        frame.data[i + 3],
    ]
}

fn small_canvas() -> Canvas {
    Canvas {
        width: 64,
        height: 64,
    }
}

fn shape_scene(layer: Layer) -> Scene {
    let mut scene = Scene {
        canvas: small_canvas(),
        background_color: "#000000".to_string(),
        layers: vec![layer],
    };
    scene.sanitize();
    scene
}

#[test]
fn empty_scene_renders_the_background() {
    let scene = Scene {
        canvas: small_canvas(),
        background_color: "#204060".to_string(),
        layers: Vec::new(),
    };
    let mut target = CpuTarget::new(scene.canvas).unwrap();
    Compositor::new()
        .render_frame(&scene, &OrbitRegistry::default(), 0.0, &mut target)
        .unwrap();
    assert_eq!(pixel(&target, 0, 0), [0x20, 0x40, 0x60, 255]);
    assert_eq!(pixel(&target, 63, 63), [0x20, 0x40, 0x60, 255]);
}

#[test]
fn centered_shape_covers_the_canvas_center() {
    let layer = Layer {
        num_sides: 6,
        curviness: 0.0,
        width: 64.0,
        height: 64.0,
        colors: vec!["#ff0000".to_string()],
        ..Layer::default()
    };
    let scene = shape_scene(layer);
    let mut target = CpuTarget::new(scene.canvas).unwrap();
    Compositor::new()
        .render_frame(&scene, &OrbitRegistry::default(), 0.0, &mut target)
        .unwrap();

    assert_eq!(pixel(&target, 32, 32), [255, 0, 0, 255]);
    // Corners stay background.
    assert_eq!(pixel(&target, 0, 0), [0, 0, 0, 255]);
}

#[test]
fn still_layers_render_identically_at_any_time() {
    let layer = Layer {
        movement_style: MovementStyle::Still,
        scale_speed: 0.0,
        wobble: 0.0,
        ..Layer::default()
    };
    let scene = shape_scene(layer);

    let mut a = CpuTarget::new(scene.canvas).unwrap();
    let mut b = CpuTarget::new(scene.canvas).unwrap();
    let mut compositor = Compositor::new();
    compositor
        .render_frame(&scene, &OrbitRegistry::default(), 0.0, &mut a)
        .unwrap();
    compositor
        .render_frame(&scene, &OrbitRegistry::default(), 12.5, &mut b)
        .unwrap();
    assert_eq!(a.readback().data, b.readback().data);
}

#[test]
fn orbiting_layer_moves_between_frames() {
    let layer = Layer {
        movement_style: MovementStyle::Orbit,
        orbit_radius_x: 0.4,
        orbit_radius_y: 0.4,
        movement_speed: 1.0,
        width: 20.0,
        height: 20.0,
        colors: vec!["#ffffff".to_string()],
        ..Layer::default()
    };
    let scene = shape_scene(layer);

    let mut a = CpuTarget::new(scene.canvas).unwrap();
    let mut b = CpuTarget::new(scene.canvas).unwrap();
    let mut compositor = Compositor::new();
    compositor
        .render_frame(&scene, &OrbitRegistry::default(), 0.0, &mut a)
        .unwrap();
    compositor
        .render_frame(&scene, &OrbitRegistry::default(), 1.7, &mut b)
        .unwrap();
    assert_ne!(a.readback().data, b.readback().data);
}

#[test]
fn shared_orbit_anchor_recentters_the_layer() {
    let layer = Layer {
        movement_style: MovementStyle::Orbit,
        orbit_point_index: 0,
        orbit_radius_x: 0.0,
        orbit_radius_y: 0.0,
        width: 16.0,
        height: 16.0,
        colors: vec!["#ffffff".to_string()],
        ..Layer::default()
    };
    let scene = shape_scene(layer);
    let registry = OrbitRegistry::new(vec![OrbitPoint {
        id: 1,
        x: 0.25,
        y: 0.25,
        enabled: true,
        ..OrbitPoint::default()
    }]);

    let mut target = CpuTarget::new(scene.canvas).unwrap();
    Compositor::new()
        .render_frame(&scene, &registry, 0.0, &mut target)
        .unwrap();
    // Zero-radius orbit sits on the anchor: quarter of a 64px canvas.
    assert_eq!(pixel(&target, 16, 16), [255, 255, 255, 255]);
    assert_eq!(pixel(&target, 48, 48), [0, 0, 0, 255]);
}

#[test]
fn missing_image_source_skips_the_layer_not_the_frame() {
    let bad = Layer {
        id: "img".to_string(),
        layer_type: LayerType::Image,
        image_source: Some("never-registered".to_string()),
        ..Layer::default()
    };
    let good = Layer {
        id: "shape".to_string(),
        width: 64.0,
        height: 64.0,
        colors: vec!["#00ff00".to_string()],
        ..Layer::default()
    };
    let mut scene = shape_scene(bad);
    scene.layers.push(good);
    scene.sanitize();

    let mut target = CpuTarget::new(scene.canvas).unwrap();
    Compositor::new()
        .render_frame(&scene, &OrbitRegistry::default(), 0.0, &mut target)
        .unwrap();
    assert_eq!(pixel(&target, 32, 32), [0, 255, 0, 255]);
}

#[test]
fn failing_layer_logs_a_warning_with_its_id() {
    use std::io::Write;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone, Default)]
    struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

    impl Write for CaptureWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CaptureWriter {
        type Writer = CaptureWriter;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    let capture = CaptureWriter::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(capture.clone())
        .with_ansi(false)
        .finish();

    let bad = Layer {
        id: "broken-image".to_string(),
        layer_type: LayerType::Image,
        image_source: Some("never-registered".to_string()),
        ..Layer::default()
    };
    let scene = shape_scene(bad);
    let mut target = CpuTarget::new(scene.canvas).unwrap();

    tracing::subscriber::with_default(subscriber, || {
        Compositor::new()
            .render_frame(&scene, &OrbitRegistry::default(), 0.0, &mut target)
            .unwrap();
    });

    let logs = String::from_utf8(capture.0.lock().unwrap().clone()).unwrap();
    assert!(logs.contains("layer render failed"), "logs: {logs}");
    assert!(logs.contains("broken-image"), "logs: {logs}");
}

#[test]
fn multiply_blend_darkens_the_stack() {
    let base = Layer {
        id: "base".to_string(),
        width: 64.0,
        height: 64.0,
        curviness: 0.0,
        colors: vec!["#ffffff".to_string()],
        ..Layer::default()
    };
    let tint = Layer {
        id: "tint".to_string(),
        width: 64.0,
        height: 64.0,
        curviness: 0.0,
        blend_mode: BlendMode::Multiply,
        colors: vec!["#808080".to_string()],
        ..Layer::default()
    };
    let mut scene = shape_scene(base);
    scene.layers.push(tint);
    scene.sanitize();

    let mut target = CpuTarget::new(scene.canvas).unwrap();
    Compositor::new()
        .render_frame(&scene, &OrbitRegistry::default(), 0.0, &mut target)
        .unwrap();
    let center = pixel(&target, 32, 32);
    assert_eq!(center[3], 255);
    // white * 0x80 multiply lands on the tint gray.
    assert!((0x7e..=0x82).contains(&center[0]));
    assert_eq!(center[0], center[1]);
    assert_eq!(center[1], center[2]);
}

#[test]
fn registered_image_layer_renders_pixels() {
    let layer = Layer {
        layer_type: LayerType::Image,
        image_source: Some("swatch".to_string()),
        width: 64.0,
        height: 64.0,
        ..Layer::default()
    };
    let scene = shape_scene(layer);

    let mut target = CpuTarget::new(scene.canvas).unwrap();
    let swatch = [0u8, 0, 255, 255].repeat(64 * 64);
    target.register_image("swatch", &swatch, 64, 64).unwrap();
    Compositor::new()
        .render_frame(&scene, &OrbitRegistry::default(), 0.0, &mut target)
        .unwrap();
    assert_eq!(pixel(&target, 32, 32), [0, 0, 255, 255]);
}

#[test]
fn json_document_renders_without_preprocessing() {
    let scene = scene_from_json(
        r##"{
            "canvas": {"width": 32, "height": 32},
            "backgroundColor": "#ffffff",
            "layers": [
                {"id": "a", "numSides": 4, "width": 32, "height": 32,
                 "colors": ["#000000"], "numColors": 1}
            ]
        }"##,
    )
    .unwrap();

    let mut target = CpuTarget::new(scene.canvas).unwrap();
    Compositor::new()
        .render_frame(&scene, &OrbitRegistry::default(), 0.0, &mut target)
        .unwrap();
    assert_eq!(pixel(&target, 16, 16), [0, 0, 0, 255]);
    assert_eq!(pixel(&target, 0, 0), [255, 255, 255, 255]);
}

#[test]
fn invalid_scene_is_an_error_not_a_panic() {
    let mut scene = Scene {
        canvas: small_canvas(),
        ..Scene::default()
    };
    scene.layers.push(Layer::default());
    scene.layers.push(Layer::default()); // duplicate id

    let mut target = CpuTarget::new(scene.canvas).unwrap();
    assert!(
        Compositor::new()
            .render_frame(&scene, &OrbitRegistry::default(), 0.0, &mut target)
            .is_err()
    );
}

#[test]
fn echo_stack_paints_more_area_than_a_single_outline() {
    let base = Layer {
        echo_count: 1,
        variation_position: 1.0,
        width: 24.0,
        height: 24.0,
        colors: vec!["#ffffff".to_string()],
        ..Layer::default()
    };
    let echoed = Layer {
        echo_count: 5,
        ..base.clone()
    };

    let count_lit = |layer: Layer| -> usize {
        let scene = shape_scene(layer);
        let mut target = CpuTarget::new(scene.canvas).unwrap();
        Compositor::new()
            .render_frame(&scene, &OrbitRegistry::default(), 0.0, &mut target)
            .unwrap();
        target
            .readback()
            .data
            .chunks_exact(4)
            .filter(|px| px[0] > 0)
            .count()
    };

    assert!(count_lit(echoed) > count_lit(base));
}
