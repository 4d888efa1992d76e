//! Scene and layer data model, serde-compatible with persisted editor
//! documents. Ingestion never errors on out-of-range values; [`Layer::sanitize`]
//! clamps them and legacy documents are migrated once by [`scene_from_json`].

use crate::{
    core::{Canvas, Rgba8},
    error::{GlowformError, GlowformResult},
};

pub const MAX_ORBIT_POINTS: usize = 8;
pub const MAX_ECHO_LAYERS: u32 = 6;
pub const MIN_SIDES: u32 = 3;
pub const MAX_SIDES: u32 = 24;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerType {
    Shape,
    Image,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementStyle {
    Bounce,
    Drift,
    Still,
    Orbit,
}

impl MovementStyle {
    pub const ALL: [Self; 4] = [Self::Bounce, Self::Drift, Self::Still, Self::Orbit];
}

/// Raster compositing operator applied when a layer is drawn over the
/// accumulated frame. Serialized under the CSS blend-mode names the editor
/// documents use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlendMode {
    Normal,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
}

impl BlendMode {
    pub const ALL: [Self; 12] = [
        Self::Normal,
        Self::Multiply,
        Self::Screen,
        Self::Overlay,
        Self::Darken,
        Self::Lighten,
        Self::ColorDodge,
        Self::ColorBurn,
        Self::HardLight,
        Self::SoftLight,
        Self::Difference,
        Self::Exclusion,
    ];
}

/// Normalized placement of a layer on the artboard. `x`/`y` are in [0, 1];
/// `scale_direction` is the current ping-pong direction of the scale cycle.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    pub scale: f64,
    pub scale_direction: f64,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            x: 0.5,
            y: 0.5,
            scale: 1.0,
            scale_direction: 1.0,
        }
    }
}

/// A shared, globally addressable rotation center. Up to
/// [`MAX_ORBIT_POINTS`] of these exist; any layer may bind to one by index.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OrbitPoint {
    pub id: u8, // 1..=8
    pub x: f64, // [0,1]
    pub y: f64, // [0,1]
    pub label: String,
    pub color: String,
    pub enabled: bool,
}

impl Default for OrbitPoint {
    fn default() -> Self {
        Self {
            id: 1,
            x: 0.5,
            y: 0.5,
            label: String::new(),
            color: "#ffffff".to_string(),
            enabled: false,
        }
    }
}

/// Read-only snapshot of the orbit anchors for the duration of one frame.
/// The core never owns or persists this list; the host passes it in.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OrbitRegistry {
    points: Vec<OrbitPoint>,
}

impl OrbitRegistry {
    /// Anything past [`MAX_ORBIT_POINTS`] entries is dropped.
    pub fn new(mut points: Vec<OrbitPoint>) -> Self {
        points.truncate(MAX_ORBIT_POINTS);
        Self { points }
    }

    /// Looks up the anchor a layer is bound to. Returns `None` for custom
    /// centers (index < 0), out-of-range indices, and disabled anchors, so
    /// callers uniformly fall back to the layer's own center.
    pub fn lookup(&self, orbit_point_index: i32) -> Option<&OrbitPoint> {
        let idx = usize::try_from(orbit_point_index).ok()?;
        self.points.get(idx).filter(|p| p.enabled)
    }

    pub fn points(&self) -> &[OrbitPoint] {
        &self.points
    }
}

/// The unit of composition: one drawable entry in the scene's layer stack.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Layer {
    // Identity
    pub id: String,
    pub name: String,
    pub layer_type: LayerType,
    pub visible: bool,
    /// Asset key resolved by the render target; only meaningful for
    /// `LayerType::Image`.
    pub image_source: Option<String>,

    // Shape
    pub num_sides: u32,
    pub curviness: f64,    // [0,1]
    pub noise_amount: f64, // [0,0.5]
    pub wobble: f64,       // [0,1]
    pub width: f64,        // guide box, px
    pub height: f64,       // guide box, px
    pub seed: u64,
    pub noise_seed: u64,

    // Placement
    pub position: Placement,
    pub orbit_center_x: f64, // [0,1]
    pub orbit_center_y: f64, // [0,1]
    pub orbit_radius_x: f64, // [0,1]
    pub orbit_radius_y: f64, // [0,1]
    pub orbit_angle: f64,    // radians
    /// -1 = custom center, 0..=7 = bound to a shared orbit anchor.
    pub orbit_point_index: i32,

    // Motion
    pub movement_style: MovementStyle,
    pub movement_speed: f64,     // [0,2]
    pub movement_angle_deg: f64, // [0,360]
    pub vx: f64,                 // derived from speed + angle
    pub vy: f64,
    pub scale_speed: f64, // [0,2]
    pub scale_min: f64,
    pub scale_max: f64,

    // Echo outline effect
    pub echo_count: u32,         // [1, MAX_ECHO_LAYERS]
    pub variation_shape: f64,    // [0,1]
    pub variation_position: f64, // [0,1]

    // Appearance
    pub colors: Vec<String>, // hex strings, ordered
    pub num_colors: usize,
    pub selected_color: usize,
    pub opacity: f64, // [0,1]
    pub blend_mode: BlendMode,

    /// Randomization strength for the "modern" strategy, [0,3].
    pub variation: f64,
}

impl Default for Layer {
    fn default() -> Self {
        Self {
            id: "layer-0".to_string(),
            name: "Layer".to_string(),
            layer_type: LayerType::Shape,
            visible: true,
            image_source: None,
            num_sides: 6,
            curviness: 0.8,
            noise_amount: 0.0,
            wobble: 0.0,
            width: 400.0,
            height: 400.0,
            seed: 1,
            noise_seed: 1,
            position: Placement::default(),
            orbit_center_x: 0.5,
            orbit_center_y: 0.5,
            orbit_radius_x: 0.2,
            orbit_radius_y: 0.2,
            orbit_angle: 0.0,
            orbit_point_index: -1,
            movement_style: MovementStyle::Still,
            movement_speed: 0.2,
            movement_angle_deg: 0.0,
            vx: 0.0,
            vy: 0.0,
            scale_speed: 0.0,
            scale_min: 0.8,
            scale_max: 1.2,
            echo_count: 1,
            variation_shape: 0.0,
            variation_position: 0.0,
            colors: vec!["#e0e0e0".to_string()],
            num_colors: 1,
            selected_color: 0,
            opacity: 1.0,
            blend_mode: BlendMode::Normal,
            variation: 1.0,
        }
    }
}

impl Layer {
    /// Clamps every field into its legal range and re-establishes the model
    /// invariants (`num_colors == colors.len()`, colors never empty while
    /// visible, velocity consistent with speed/angle). Total: garbage in a
    /// persisted document becomes the documented default, never an error.
    pub fn sanitize(&mut self) {
        fn clamp_finite(v: &mut f64, min: f64, max: f64, fallback: f64) {
            *v = if v.is_finite() { v.clamp(min, max) } else { fallback };
        }

        self.num_sides = self.num_sides.clamp(MIN_SIDES, MAX_SIDES);
        clamp_finite(&mut self.curviness, 0.0, 1.0, 0.8);
        clamp_finite(&mut self.noise_amount, 0.0, 0.5, 0.0);
        clamp_finite(&mut self.wobble, 0.0, 1.0, 0.0);
        clamp_finite(&mut self.width, 1.0, 4096.0, 400.0);
        clamp_finite(&mut self.height, 1.0, 4096.0, 400.0);

        clamp_finite(&mut self.position.x, 0.0, 1.0, 0.5);
        clamp_finite(&mut self.position.y, 0.0, 1.0, 0.5);
        clamp_finite(&mut self.position.scale, 0.05, 4.0, 1.0);
        self.position.scale_direction = if self.position.scale_direction < 0.0 {
            -1.0
        } else {
            1.0
        };

        clamp_finite(&mut self.orbit_center_x, 0.0, 1.0, 0.5);
        clamp_finite(&mut self.orbit_center_y, 0.0, 1.0, 0.5);
        clamp_finite(&mut self.orbit_radius_x, 0.0, 1.0, 0.2);
        clamp_finite(&mut self.orbit_radius_y, 0.0, 1.0, 0.2);
        if !self.orbit_angle.is_finite() {
            self.orbit_angle = 0.0;
        }
        if self.orbit_point_index >= MAX_ORBIT_POINTS as i32 {
            self.orbit_point_index = -1;
        }
        self.orbit_point_index = self.orbit_point_index.max(-1);

        clamp_finite(&mut self.movement_speed, 0.0, 2.0, 0.2);
        clamp_finite(&mut self.movement_angle_deg, 0.0, 360.0, 0.0);
        clamp_finite(&mut self.scale_speed, 0.0, 2.0, 0.0);
        clamp_finite(&mut self.scale_min, 0.05, 4.0, 0.8);
        clamp_finite(&mut self.scale_max, 0.05, 4.0, 1.2);
        if self.scale_min > self.scale_max {
            std::mem::swap(&mut self.scale_min, &mut self.scale_max);
        }
        let angle = self.movement_angle_deg.to_radians();
        self.vx = self.movement_speed * angle.cos();
        self.vy = self.movement_speed * angle.sin();

        self.echo_count = self.echo_count.clamp(1, MAX_ECHO_LAYERS);
        clamp_finite(&mut self.variation_shape, 0.0, 1.0, 0.0);
        clamp_finite(&mut self.variation_position, 0.0, 1.0, 0.0);
        clamp_finite(&mut self.variation, 0.0, 3.0, 1.0);

        if self.colors.is_empty() && self.visible {
            self.colors.push("#e0e0e0".to_string());
        }
        self.num_colors = self.colors.len();
        if self.selected_color >= self.colors.len() {
            self.selected_color = self.colors.len().saturating_sub(1);
        }
        clamp_finite(&mut self.opacity, 0.0, 1.0, 1.0);
    }
}

/// A complete editor document: background plus the ordered layer stack.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Scene {
    pub canvas: Canvas,
    /// Hex string, preserved byte-for-byte so a skipped randomization pass
    /// is observable as "unchanged".
    pub background_color: String,
    pub layers: Vec<Layer>,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            canvas: Canvas {
                width: 1000,
                height: 1000,
            },
            background_color: "#101014".to_string(),
            layers: Vec::new(),
        }
    }
}

impl Scene {
    pub fn background(&self) -> Rgba8 {
        Rgba8::from_hex(&self.background_color)
    }

    pub fn validate(&self) -> GlowformResult<()> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(GlowformError::validation(
                "canvas width/height must be > 0",
            ));
        }
        let mut ids: Vec<&str> = self.layers.iter().map(|l| l.id.as_str()).collect();
        ids.sort_unstable();
        for pair in ids.windows(2) {
            if pair[0] == pair[1] {
                return Err(GlowformError::validation(format!(
                    "duplicate layer id '{}'",
                    pair[0]
                )));
            }
        }
        for layer in &self.layers {
            if layer.visible && layer.colors.is_empty() {
                return Err(GlowformError::validation(format!(
                    "visible layer '{}' has no colors",
                    layer.id
                )));
            }
            if layer.num_colors != layer.colors.len() {
                return Err(GlowformError::validation(format!(
                    "layer '{}' numColors disagrees with colors length",
                    layer.id
                )));
            }
        }
        Ok(())
    }

    pub fn sanitize(&mut self) {
        for layer in &mut self.layers {
            layer.sanitize();
        }
    }
}

/// Pre-rewrite documents stored per-layer oscillator frequencies instead of
/// explicit shape/placement fields. Recognized once at ingestion and
/// migrated; never consulted again per frame.
#[derive(Clone, Debug, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct LegacyLayer {
    id: String,
    freq1: f64,
    freq2: f64,
    freq3: f64,
    amp: f64,
    color: String,
    visible: bool,
}

impl Default for LegacyLayer {
    fn default() -> Self {
        Self {
            id: "layer-0".to_string(),
            freq1: 6.0,
            freq2: 0.2,
            freq3: 0.0,
            amp: 0.0,
            color: "#e0e0e0".to_string(),
            visible: true,
        }
    }
}

#[derive(Clone, Debug, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct LegacyScene {
    background_color: String,
    layers: Vec<LegacyLayer>,
}

impl Default for LegacyScene {
    fn default() -> Self {
        Self {
            background_color: Scene::default().background_color,
            layers: Vec::new(),
        }
    }
}

fn migrate_legacy(legacy: LegacyScene) -> Scene {
    let layers = legacy
        .layers
        .into_iter()
        .map(|l| Layer {
            id: l.id,
            visible: l.visible,
            num_sides: l.freq1.round().max(0.0) as u32,
            movement_speed: l.freq2,
            movement_angle_deg: l.freq3.to_degrees(),
            wobble: l.amp,
            colors: vec![l.color],
            ..Layer::default()
        })
        .collect();
    Scene {
        background_color: legacy.background_color,
        layers,
        ..Scene::default()
    }
}

/// Parses a persisted document, migrating the legacy `freq1/freq2/...`
/// format when detected, and sanitizes the result. The format probe is a
/// one-shot ingestion step: downstream code only ever sees current-format
/// [`Scene`] values.
pub fn scene_from_json(json: &str) -> GlowformResult<Scene> {
    let value: serde_json::Value = serde_json::from_str(json)
        .map_err(|e| GlowformError::validation(format!("scene is not valid JSON: {e}")))?;

    let is_legacy = value
        .get("layers")
        .and_then(|l| l.as_array())
        .is_some_and(|layers| layers.iter().any(|l| l.get("freq1").is_some()));

    let mut scene = if is_legacy {
        let legacy: LegacyScene = serde_json::from_value(value)
            .map_err(|e| GlowformError::validation(format!("legacy scene rejected: {e}")))?;
        migrate_legacy(legacy)
    } else {
        serde_json::from_value(value)
            .map_err(|e| GlowformError::validation(format!("scene rejected: {e}")))?
    };

    scene.sanitize();
    scene.validate()?;
    Ok(scene)
}
