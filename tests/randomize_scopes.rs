//! Scope and toggle behavior of the randomization passes, driven by a
//! seeded RNG so every scenario is reproducible.

use glowform::{
    Layer, RandomizationEngine, RandomizeToggles, Scene, Strategy,
    randomize::{PALETTE_SHUFFLE_WEIGHT, PALETTE_SWAP_WEIGHT},
};
use rand::SeedableRng;
use rand_pcg::Pcg32;

fn rng(seed: u64) -> Pcg32 {
    Pcg32::seed_from_u64(seed)
}

fn scene_with_layers(n: usize) -> Scene {
    let mut scene = Scene::default();
    for i in 0..n {
        scene.layers.push(Layer {
            id: format!("layer-{i}"),
            ..Layer::default()
        });
    }
    scene.sanitize();
    scene
}

#[test]
fn disabled_toggles_leave_their_categories_untouched() {
    let engine = RandomizationEngine::new(Strategy::Classic);
    let scene = scene_with_layers(3);
    let toggles = RandomizeToggles {
        background_color: false,
        layers_count: false,
        palette: false,
        shape: false,
        ..RandomizeToggles::default()
    };

    let next = engine.randomize_scene(&scene, &toggles, &mut rng(1));
    assert_eq!(next.background_color, scene.background_color);
    assert_eq!(next.layers.len(), scene.layers.len());
    for (a, b) in next.layers.iter().zip(&scene.layers) {
        assert_eq!(a.colors, b.colors);
        assert_eq!(a.num_sides, b.num_sides);
        assert_eq!(a.curviness, b.curviness);
    }
}

#[test]
fn classic_scene_pass_rerolls_everything_enabled() {
    let engine = RandomizationEngine::new(Strategy::Classic);
    let scene = scene_with_layers(2);
    let next = engine.randomize_scene(&scene, &RandomizeToggles::default(), &mut rng(2));

    // Every resulting layer is in-range and internally consistent.
    for layer in &next.layers {
        assert!((3..=24).contains(&layer.num_sides));
        assert!((0.0..=1.0).contains(&layer.opacity));
        assert_eq!(layer.num_colors, layer.colors.len());
        assert!(!layer.colors.is_empty());
    }
    assert!(next.background_color.starts_with('#'));
}

#[test]
fn modern_weight_zero_layers_survive_a_scene_pass_unchanged() {
    let engine = RandomizationEngine::new(Strategy::Modern);
    let mut scene = scene_with_layers(2);
    for layer in &mut scene.layers {
        layer.variation = 0.0;
    }
    let toggles = RandomizeToggles {
        background_color: false,
        layers_count: false,
        blend_mode: false,
        ..RandomizeToggles::default()
    };

    let next = engine.randomize_scene(&scene, &toggles, &mut rng(3));
    for (a, b) in next.layers.iter().zip(&scene.layers) {
        assert_eq!(a.num_sides, b.num_sides);
        assert_eq!(a.curviness, b.curviness);
        assert_eq!(a.movement_speed, b.movement_speed);
        assert_eq!(a.position, b.position);
        // Weight 0 is below the shuffle tier; colors keep their order.
        assert_eq!(a.colors, b.colors);
    }
}

#[test]
fn modern_blends_toward_samples_as_variation_grows() {
    let engine = RandomizationEngine::new(Strategy::Modern);
    let timid = Layer {
        variation: 0.3,
        curviness: 0.5,
        ..Layer::default()
    };
    let bold = Layer {
        variation: 3.0,
        curviness: 0.5,
        ..Layer::default()
    };

    // Average drift from the previous value over many passes.
    let drift = |layer: &Layer, seed: u64| -> f64 {
        let mut r = rng(seed);
        let mut total = 0.0;
        for _ in 0..400 {
            let next = engine.randomize_layer(layer, &mut r);
            total += (next.curviness - layer.curviness).abs();
        }
        total / 400.0
    };

    assert!(drift(&bold, 5) > drift(&timid, 5) * 2.0);
}

#[test]
fn palette_tier_thresholds_bound_the_color_behavior() {
    let engine = RandomizationEngine::new(Strategy::Modern);
    let colors = vec![
        "#101010".to_string(),
        "#202020".to_string(),
        "#303030".to_string(),
    ];

    // Just below the shuffle tier: order preserved.
    let low = Layer {
        variation: (PALETTE_SHUFFLE_WEIGHT - 0.05) * 3.0,
        colors: colors.clone(),
        num_colors: 3,
        ..Layer::default()
    };
    let next = engine.randomize_colors(&low, &mut rng(7));
    assert_eq!(next.colors, colors);

    // At the swap tier: palette regenerated, members may be entirely new.
    let high = Layer {
        variation: PALETTE_SWAP_WEIGHT * 3.0,
        colors: colors.clone(),
        num_colors: 3,
        ..Layer::default()
    };
    let mut saw_new_color = false;
    let mut r = rng(8);
    for _ in 0..20 {
        let next = engine.randomize_colors(&high, &mut r);
        saw_new_color |= next.colors.iter().any(|c| !colors.contains(c));
    }
    assert!(saw_new_color);
}

#[test]
fn animation_scope_is_disjoint_from_shape_and_color() {
    for strategy in [Strategy::Classic, Strategy::Modern] {
        let engine = RandomizationEngine::new(strategy);
        let layer = Layer {
            variation: 3.0,
            ..Layer::default()
        };
        let next = engine.randomize_animation(&layer, &mut rng(11));
        assert_eq!(next.num_sides, layer.num_sides);
        assert_eq!(next.curviness, layer.curviness);
        assert_eq!(next.colors, layer.colors);
        assert_eq!(next.blend_mode, layer.blend_mode);
        assert_eq!(next.position.x, layer.position.x);
    }
}

#[test]
fn layer_count_reroll_produces_valid_scenes() {
    let engine = RandomizationEngine::new(Strategy::Classic);
    let scene = scene_with_layers(4);
    let mut r = rng(13);
    for _ in 0..50 {
        let next = engine.randomize_scene(&scene, &RandomizeToggles::default(), &mut r);
        assert!((1..=6).contains(&next.layers.len()));
        assert!(next.validate().is_ok());
    }
}

#[test]
fn identical_seeds_give_identical_documents() {
    for strategy in [Strategy::Classic, Strategy::Modern] {
        let engine = RandomizationEngine::new(strategy);
        let scene = scene_with_layers(3);
        let a = engine.randomize_scene(&scene, &RandomizeToggles::default(), &mut rng(17));
        let b = engine.randomize_scene(&scene, &RandomizeToggles::default(), &mut rng(17));
        assert_eq!(serde_json::to_string(&a).unwrap(), serde_json::to_string(&b).unwrap());
    }
}
