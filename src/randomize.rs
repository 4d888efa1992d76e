//! Parameter resampling across single-layer, animation-only, color-only and
//! whole-scene scopes, in two strategies: the classic full re-roll and the
//! modern variation-weighted blend. All sampling goes through an injected
//! [`rand::Rng`], so a seeded `Pcg32` makes every scenario reproducible.

use rand::Rng;

use crate::model::{BlendMode, Layer, MovementStyle, Scene};

/// Floor of the probability gate for categorical changes (movement style,
/// blend mode) in the modern strategy.
pub const STYLE_GATE_FLOOR: f64 = 0.3;
/// Modern color tiers: full palette swap at/above this weight...
pub const PALETTE_SWAP_WEIGHT: f64 = 0.75;
/// ...partial shuffle at/above this one, untouched below.
pub const PALETTE_SHUFFLE_WEIGHT: f64 = 0.4;
/// Layer-count range a whole-scene pass may roll.
pub const RANDOM_LAYER_COUNT: std::ops::RangeInclusive<u32> = 1..=6;
/// Palette size range a pass may roll when `num_colors` is included.
pub const RANDOM_PALETTE_SIZE: std::ops::RangeInclusive<usize> = 1..=5;

/// Parameter descriptor the engine dispatches on. Sliders carry a separate
/// randomization range so "legal" and "tasteful" bounds can differ.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Parameter {
    Slider {
        min: f64,
        max: f64,
        step: f64,
        random_min: f64,
        random_max: f64,
    },
    Dropdown {
        options: usize, // number of choices; the caller maps the index
    },
    Color,
    Number {
        min: f64,
        max: f64,
        step: f64,
    },
}

impl Parameter {
    pub const fn slider(min: f64, max: f64, step: f64) -> Self {
        Self::Slider {
            min,
            max,
            step,
            random_min: min,
            random_max: max,
        }
    }

    pub const fn slider_ranged(
        min: f64,
        max: f64,
        step: f64,
        random_min: f64,
        random_max: f64,
    ) -> Self {
        Self::Slider {
            min,
            max,
            step,
            random_min,
            random_max,
        }
    }

    /// Uniform draw from the randomization range. Dropdowns yield an index;
    /// colors have no scalar sample and return 0.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match *self {
            Self::Slider {
                random_min,
                random_max,
                ..
            } => rng.random_range(random_min..=random_max),
            Self::Number { min, max, .. } => rng.random_range(min..=max),
            Self::Dropdown { options } => rng.random_range(0..options.max(1)) as f64,
            Self::Color => 0.0,
        }
    }

    /// Clamps into the legal range and rounds to the step granularity
    /// (integer steps give integers, fractional steps fractional values).
    pub fn quantize(&self, value: f64) -> f64 {
        match *self {
            Self::Slider { min, max, step, .. } | Self::Number { min, max, step } => {
                let clamped = value.clamp(min, max);
                if step > 0.0 {
                    ((clamped / step).round() * step).clamp(min, max)
                } else {
                    clamped
                }
            }
            Self::Dropdown { options } => value.clamp(0.0, options.saturating_sub(1) as f64).round(),
            Self::Color => value,
        }
    }
}

/// Every slider-type layer parameter the engine can touch, with accessors so
/// both strategies share one table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LayerParam {
    NumSides,
    Curviness,
    NoiseAmount,
    Wobble,
    MovementSpeed,
    MovementAngle,
    ScaleSpeed,
    ScaleMin,
    ScaleMax,
    Opacity,
    EchoCount,
    VariationShape,
    VariationPosition,
    OrbitRadiusX,
    OrbitRadiusY,
    PositionX,
    PositionY,
}

impl LayerParam {
    const SHAPE: &'static [Self] = &[
        Self::NumSides,
        Self::Curviness,
        Self::NoiseAmount,
        Self::Wobble,
        Self::EchoCount,
        Self::VariationShape,
        Self::VariationPosition,
        Self::PositionX,
        Self::PositionY,
        Self::OrbitRadiusX,
        Self::OrbitRadiusY,
        Self::Opacity,
    ];

    const ANIMATION: &'static [Self] = &[Self::MovementSpeed, Self::MovementAngle, Self::ScaleSpeed];

    fn descriptor(self) -> Parameter {
        match self {
            Self::NumSides => Parameter::slider_ranged(3.0, 24.0, 1.0, 3.0, 12.0),
            Self::Curviness => Parameter::slider(0.0, 1.0, 0.01),
            Self::NoiseAmount => Parameter::slider(0.0, 0.5, 0.01),
            Self::Wobble => Parameter::slider(0.0, 1.0, 0.01),
            Self::MovementSpeed => Parameter::slider(0.0, 2.0, 0.01),
            Self::MovementAngle => Parameter::slider(0.0, 360.0, 1.0),
            Self::ScaleSpeed => Parameter::slider(0.0, 2.0, 0.01),
            Self::ScaleMin => Parameter::slider_ranged(0.05, 4.0, 0.01, 0.5, 1.0),
            Self::ScaleMax => Parameter::slider_ranged(0.05, 4.0, 0.01, 1.0, 2.0),
            Self::Opacity => Parameter::slider_ranged(0.0, 1.0, 0.01, 0.3, 1.0),
            Self::EchoCount => Parameter::slider(1.0, 6.0, 1.0),
            Self::VariationShape => Parameter::slider(0.0, 1.0, 0.01),
            Self::VariationPosition => Parameter::slider(0.0, 1.0, 0.01),
            Self::OrbitRadiusX => Parameter::slider(0.0, 1.0, 0.01),
            Self::OrbitRadiusY => Parameter::slider(0.0, 1.0, 0.01),
            Self::PositionX => Parameter::slider(0.0, 1.0, 0.01),
            Self::PositionY => Parameter::slider(0.0, 1.0, 0.01),
        }
    }

    fn get(self, layer: &Layer) -> f64 {
        match self {
            Self::NumSides => f64::from(layer.num_sides),
            Self::Curviness => layer.curviness,
            Self::NoiseAmount => layer.noise_amount,
            Self::Wobble => layer.wobble,
            Self::MovementSpeed => layer.movement_speed,
            Self::MovementAngle => layer.movement_angle_deg,
            Self::ScaleSpeed => layer.scale_speed,
            Self::ScaleMin => layer.scale_min,
            Self::ScaleMax => layer.scale_max,
            Self::Opacity => layer.opacity,
            Self::EchoCount => f64::from(layer.echo_count),
            Self::VariationShape => layer.variation_shape,
            Self::VariationPosition => layer.variation_position,
            Self::OrbitRadiusX => layer.orbit_radius_x,
            Self::OrbitRadiusY => layer.orbit_radius_y,
            Self::PositionX => layer.position.x,
            Self::PositionY => layer.position.y,
        }
    }

    fn set(self, layer: &mut Layer, value: f64) {
        match self {
            Self::NumSides => layer.num_sides = value.round() as u32,
            Self::Curviness => layer.curviness = value,
            Self::NoiseAmount => layer.noise_amount = value,
            Self::Wobble => layer.wobble = value,
            Self::MovementSpeed => layer.movement_speed = value,
            Self::MovementAngle => layer.movement_angle_deg = value,
            Self::ScaleSpeed => layer.scale_speed = value,
            Self::ScaleMin => layer.scale_min = value,
            Self::ScaleMax => layer.scale_max = value,
            Self::Opacity => layer.opacity = value,
            Self::EchoCount => layer.echo_count = value.round() as u32,
            Self::VariationShape => layer.variation_shape = value,
            Self::VariationPosition => layer.variation_position = value,
            Self::OrbitRadiusX => layer.orbit_radius_x = value,
            Self::OrbitRadiusY => layer.orbit_radius_y = value,
            Self::PositionX => layer.position.x = value,
            Self::PositionY => layer.position.y = value,
        }
    }
}

/// Which global categories the next whole-scene pass may touch. Persisted
/// across passes; mutated only by explicit user toggles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RandomizeToggles {
    pub background_color: bool,
    pub layers_count: bool,
    pub palette: bool,
    pub num_colors: bool,
    pub blend_mode: bool,
    pub movement: bool,
    pub shape: bool,
}

impl Default for RandomizeToggles {
    fn default() -> Self {
        Self {
            background_color: true,
            layers_count: true,
            palette: true,
            num_colors: true,
            blend_mode: true,
            movement: true,
            shape: true,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Full uniform re-roll of everything in scope.
    Classic,
    /// Variation-weighted blend between previous and sampled values.
    #[default]
    Modern,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct RandomizationEngine {
    pub strategy: Strategy,
}

impl RandomizationEngine {
    pub fn new(strategy: Strategy) -> Self {
        Self { strategy }
    }

    /// Variation weight for the modern strategy.
    fn weight(layer: &Layer) -> f64 {
        (layer.variation / 3.0).clamp(0.0, 1.0)
    }

    fn blend_param<R: Rng + ?Sized>(
        &self,
        param: Parameter,
        prev: f64,
        w: f64,
        rng: &mut R,
    ) -> f64 {
        match self.strategy {
            Strategy::Classic => param.quantize(param.sample(rng)),
            Strategy::Modern => {
                if w <= 0.0 {
                    return prev;
                }
                let sample = param.sample(rng);
                param.quantize(prev * (1.0 - w) + sample * w)
            }
        }
    }

    /// Categorical values cannot be blended; the modern strategy swaps them
    /// whole with probability `max(STYLE_GATE_FLOOR, w)`.
    fn category_gate<R: Rng + ?Sized>(&self, w: f64, rng: &mut R) -> bool {
        match self.strategy {
            Strategy::Classic => true,
            Strategy::Modern => rng.random::<f64>() < STYLE_GATE_FLOOR.max(w),
        }
    }

    /// Randomizes one layer across every category. Returns a new layer; the
    /// input is never touched.
    pub fn randomize_layer<R: Rng + ?Sized>(&self, layer: &Layer, rng: &mut R) -> Layer {
        self.randomize_layer_scoped(layer, &RandomizeToggles::default(), rng)
    }

    fn randomize_layer_scoped<R: Rng + ?Sized>(
        &self,
        layer: &Layer,
        toggles: &RandomizeToggles,
        rng: &mut R,
    ) -> Layer {
        let mut next = layer.clone();
        let w = Self::weight(layer);

        if toggles.shape {
            for &param in LayerParam::SHAPE {
                let value = self.blend_param(param.descriptor(), param.get(layer), w, rng);
                param.set(&mut next, value);
            }
        }
        if toggles.movement {
            for &param in LayerParam::ANIMATION {
                let value = self.blend_param(param.descriptor(), param.get(layer), w, rng);
                param.set(&mut next, value);
            }
            if self.category_gate(w, rng) {
                next.movement_style = *pick(&MovementStyle::ALL, rng);
            }
        }
        if toggles.blend_mode && self.category_gate(w, rng) {
            next.blend_mode = *pick(&BlendMode::ALL, rng);
        }
        if toggles.palette {
            next.colors = self.randomize_palette(&next.colors, toggles.num_colors, w, rng);
        }

        next.sanitize();
        next
    }

    /// Animation-only scope: movement speed/angle and the scale cycle speed.
    pub fn randomize_animation<R: Rng + ?Sized>(&self, layer: &Layer, rng: &mut R) -> Layer {
        let mut next = layer.clone();
        let w = Self::weight(layer);
        for &param in LayerParam::ANIMATION {
            let value = self.blend_param(param.descriptor(), param.get(layer), w, rng);
            param.set(&mut next, value);
        }
        next.sanitize();
        next
    }

    /// Colors-only scope.
    pub fn randomize_colors<R: Rng + ?Sized>(&self, layer: &Layer, rng: &mut R) -> Layer {
        let mut next = layer.clone();
        let w = Self::weight(layer);
        next.colors = self.randomize_palette(&next.colors, true, w, rng);
        next.sanitize();
        next
    }

    /// Color changes escalate in three tiers by weight: full palette swap,
    /// partial Fisher-Yates shuffle, unchanged order.
    fn randomize_palette<R: Rng + ?Sized>(
        &self,
        colors: &[String],
        may_resize: bool,
        w: f64,
        rng: &mut R,
    ) -> Vec<String> {
        match self.strategy {
            Strategy::Classic => {
                let count = if may_resize {
                    rng.random_range(RANDOM_PALETTE_SIZE)
                } else {
                    colors.len().max(1)
                };
                (0..count).map(|_| random_hex_color(rng)).collect()
            }
            Strategy::Modern => {
                if w >= PALETTE_SWAP_WEIGHT {
                    let count = if may_resize {
                        rng.random_range(RANDOM_PALETTE_SIZE)
                    } else {
                        colors.len().max(1)
                    };
                    (0..count).map(|_| random_hex_color(rng)).collect()
                } else if w >= PALETTE_SHUFFLE_WEIGHT {
                    let mut out = colors.to_vec();
                    // Fisher-Yates, but each swap only fires with
                    // probability w: a partial reshuffle.
                    for i in (1..out.len()).rev() {
                        if rng.random::<f64>() < w {
                            let j = rng.random_range(0..=i);
                            out.swap(i, j);
                        }
                    }
                    out
                } else {
                    colors.to_vec()
                }
            }
        }
    }

    /// Whole-scene pass. Only categories enabled in `toggles` are touched;
    /// everything else is carried over byte-for-byte.
    pub fn randomize_scene<R: Rng + ?Sized>(
        &self,
        scene: &Scene,
        toggles: &RandomizeToggles,
        rng: &mut R,
    ) -> Scene {
        let mut next = scene.clone();

        if toggles.background_color {
            next.background_color = random_hex_color(rng);
        }

        if toggles.layers_count {
            let target = rng.random_range(RANDOM_LAYER_COUNT) as usize;
            if target < next.layers.len() {
                next.layers.truncate(target);
            } else {
                while next.layers.len() < target {
                    let mut fresh = Layer {
                        id: format!("layer-{}", next.layers.len()),
                        ..Layer::default()
                    };
                    fresh.variation = 3.0; // new layers start fully random
                    fresh = self.randomize_layer(&fresh, rng);
                    next.layers.push(fresh);
                }
            }
        }

        next.layers = next
            .layers
            .iter()
            .map(|layer| self.randomize_layer_scoped(layer, toggles, rng))
            .collect();
        next
    }
}

fn pick<'a, T, R: Rng + ?Sized>(options: &'a [T], rng: &mut R) -> &'a T {
    &options[rng.random_range(0..options.len())]
}

fn random_hex_color<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!(
        "#{:02x}{:02x}{:02x}",
        rng.random_range(0..=255u32),
        rng.random_range(0..=255u32),
        rng.random_range(0..=255u32)
    )
}
