//! Per-layer, per-frame geometry derivation: the base shape outline, the
//! 1..6 "echo" copies fanned out from it, and the animated placement. The
//! only state is [`BaseShapeCache`]; everything else is pure.

use std::collections::HashMap;

use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::{
    core::Node,
    geometry,
    model::{Layer, MovementStyle, OrbitRegistry},
};

// Tunables inherited from the original editor. The specific numbers have no
// documented rationale; they are kept verbatim so existing documents animate
// identically.
/// Radians between the offset directions of successive echo copies.
pub const ECHO_FAN_ANGLE_STEP: f64 = 2.2;
/// Echo offset magnitude per unit of position variation, in pixels at the
/// reference artboard size.
pub const POSITION_SHIFT_SCALE: f64 = 32.0;
pub const REFERENCE_ARTBOARD_PX: f64 = 1000.0;
/// Shape influence gained per echo index per unit of shape variation.
pub const SHAPE_INFLUENCE_STEP: f64 = 0.12;
/// Scale of the oscillatory per-node angle wobble.
pub const WOBBLE_ANGLE_GAIN: f64 = 0.5;
/// Scale of the cosine radial stretch.
pub const RADIAL_STRETCH_GAIN: f64 = 0.35;
/// Whole-shape growth per unit of shape influence.
pub const ECHO_SCALE_GAIN: f64 = 0.7;
/// Maps `movement_speed` to angular orbit velocity (rad/s).
pub const ORBIT_SPEED_FACTOR: f64 = 0.9;
/// Maps `movement_speed` to normalized drift/bounce velocity (units/s).
pub const TRAVEL_SPEED_FACTOR: f64 = 0.25;
/// Spatial frequency of the static wobble applied to the base outline.
pub const BASE_WOBBLE_FREQ: f64 = 2.7;
pub const BASE_WOBBLE_GAIN: f64 = 0.25;

/// Base outline radius in shape-local space before variation or noise.
const BASE_RADIUS: f64 = 0.9;

/// Memoized base outlines, keyed on the tuple of layer inputs that affect
/// the base polygon. Any key change produces a fresh entry, so stale
/// geometry can never leak across parameter edits.
#[derive(Debug, Default)]
pub struct BaseShapeCache {
    entries: HashMap<BaseShapeKey, Vec<Node>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct BaseShapeKey {
    num_sides: u32,
    seed: u64,
    noise_seed: u64,
    noise_bits: u64,
    wobble_bits: u64,
}

impl BaseShapeKey {
    fn of(layer: &Layer) -> Self {
        Self {
            num_sides: layer.num_sides,
            seed: layer.seed,
            noise_seed: layer.noise_seed,
            noise_bits: layer.noise_amount.to_bits(),
            wobble_bits: layer.wobble.to_bits(),
        }
    }
}

impl BaseShapeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The undistorted base outline for `layer`, computed once per distinct
    /// parameter tuple. Deterministic: noise draws come from a `Pcg32`
    /// seeded by the layer's own seeds.
    pub fn base_nodes(&mut self, layer: &Layer) -> Vec<Node> {
        self.entries
            .entry(BaseShapeKey::of(layer))
            .or_insert_with(|| compute_base_nodes(layer))
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

fn compute_base_nodes(layer: &Layer) -> Vec<Node> {
    let mut nodes = geometry::regular_polygon(f64::from(layer.num_sides), BASE_RADIUS);

    if layer.wobble > 0.0 {
        for (i, node) in nodes.iter_mut().enumerate() {
            let stretch = 1.0 + (i as f64 * BASE_WOBBLE_FREQ).sin() * layer.wobble * BASE_WOBBLE_GAIN;
            node.x *= stretch;
            node.y *= stretch;
        }
    }

    if layer.noise_amount > 0.0 {
        let mut rng = Pcg32::seed_from_u64(layer.seed ^ layer.noise_seed.rotate_left(17));
        nodes = geometry::jitter_polygon(&nodes, layer.noise_amount, &mut rng);
    }

    nodes
}

/// Produces the node set for one echo copy of the base outline.
///
/// Echo 0 is the untouched base by construction, regardless of the variation
/// parameters. Higher indices gain shape influence linearly and fan out
/// along `index * ECHO_FAN_ANGLE_STEP`, so successive copies spread
/// predictably rather than randomly.
pub fn echo_nodes(
    base: &[Node],
    echo_index: u32,
    variation_shape: f64,
    variation_position: f64,
) -> Vec<Node> {
    if echo_index == 0 {
        return base.to_vec();
    }

    let idx = f64::from(echo_index);
    let influence = variation_shape.clamp(0.0, 1.0) * idx * SHAPE_INFLUENCE_STEP;
    let grow = 1.0 + influence * ECHO_SCALE_GAIN;

    let offset_dir = idx * ECHO_FAN_ANGLE_STEP;
    // Normalized [-1,1] space spans REFERENCE_ARTBOARD_PX/2 per unit.
    let offset_mag = variation_position.clamp(0.0, 1.0) * idx * POSITION_SHIFT_SCALE
        / (REFERENCE_ARTBOARD_PX / 2.0);
    let (off_x, off_y) = (offset_dir.cos() * offset_mag, offset_dir.sin() * offset_mag);

    base.iter()
        .enumerate()
        .map(|(i, node)| {
            let ni = i as f64;
            let angle = node.y.atan2(node.x)
                + (ni * 3.1 + idx * 1.7).sin() * influence * WOBBLE_ANGLE_GAIN;
            let mag = node.x.hypot(node.y)
                * (1.0 + (ni * 2.0 + idx).cos() * influence * RADIAL_STRETCH_GAIN)
                * grow;
            Node::new(
                node.id.clone(),
                mag * angle.cos() + off_x,
                mag * angle.sin() + off_y,
            )
        })
        .collect()
}

/// Derives the full echo set for one layer at one frame, ready to feed into
/// [`geometry::smooth_closed_path`]. Index 0 is always first.
pub fn derive_echo_set(cache: &mut BaseShapeCache, layer: &Layer) -> Vec<Vec<Node>> {
    let base = cache.base_nodes(layer);
    (0..layer.echo_count.max(1))
        .map(|i| echo_nodes(&base, i, layer.variation_shape, layer.variation_position))
        .collect()
}

/// Resolves the orbit center a layer rotates around: the bound anchor when
/// the binding exists and is enabled, otherwise the layer's own custom
/// center. A dangling binding is not an error.
pub fn resolve_orbit_center(layer: &Layer, registry: &OrbitRegistry) -> (f64, f64) {
    match registry.lookup(layer.orbit_point_index) {
        Some(point) => (point.x, point.y),
        None => (layer.orbit_center_x, layer.orbit_center_y),
    }
}

fn wrap01(v: f64) -> f64 {
    let r = v.rem_euclid(1.0);
    if r.is_finite() { r } else { 0.0 }
}

fn reflect01(v: f64) -> f64 {
    if !v.is_finite() {
        return 0.0;
    }
    let r = v.rem_euclid(2.0);
    if r > 1.0 { 2.0 - r } else { r }
}

/// The layer's animated center at `time` seconds, in artboard [0,1] space.
/// Orbit positions may exceed [0,1] (the shape swings partially offscreen);
/// bounce and drift stay inside by reflection and wrapping respectively.
pub fn layer_position_at(layer: &Layer, registry: &OrbitRegistry, time: f64) -> (f64, f64) {
    let t = if time.is_finite() { time } else { 0.0 };
    match layer.movement_style {
        MovementStyle::Still => (layer.position.x, layer.position.y),
        MovementStyle::Drift => (
            wrap01(layer.position.x + layer.vx * t * TRAVEL_SPEED_FACTOR),
            wrap01(layer.position.y + layer.vy * t * TRAVEL_SPEED_FACTOR),
        ),
        MovementStyle::Bounce => (
            reflect01(layer.position.x + layer.vx * t * TRAVEL_SPEED_FACTOR),
            reflect01(layer.position.y + layer.vy * t * TRAVEL_SPEED_FACTOR),
        ),
        MovementStyle::Orbit => {
            let (cx, cy) = resolve_orbit_center(layer, registry);
            let angle = layer.orbit_angle + t * layer.movement_speed * ORBIT_SPEED_FACTOR;
            (
                cx + angle.cos() * layer.orbit_radius_x,
                cy + angle.sin() * layer.orbit_radius_y,
            )
        }
    }
}

/// Ping-pong scale cycle between `scale_min` and `scale_max`. With
/// `scale_speed` 0 the static placement scale applies unchanged.
pub fn layer_scale_at(layer: &Layer, time: f64) -> f64 {
    if layer.scale_speed <= 0.0 || !time.is_finite() {
        return layer.position.scale;
    }
    let span = (layer.scale_max - layer.scale_min).max(0.0);
    let mut tri = reflect01(time * layer.scale_speed);
    if layer.position.scale_direction < 0.0 {
        tri = 1.0 - tri;
    }
    layer.scale_min + span * tri
}
