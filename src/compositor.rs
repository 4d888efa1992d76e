//! Draws one frame: derives per-layer geometry and composites every visible
//! layer onto the render target in stack order. A failing layer is logged
//! and skipped so the loop keeps producing frames.

use crate::{
    core::{Affine, Rgba8},
    derive::{self, BaseShapeCache},
    error::{GlowformError, GlowformResult},
    geometry,
    model::{Layer, LayerType, OrbitRegistry, Scene},
    surface::RenderTarget,
};

#[derive(Debug, Default)]
pub struct Compositor {
    cache: BaseShapeCache,
}

impl Compositor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invalidate derived geometry, e.g. after loading a new document.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Renders `scene` at `time` seconds onto `target`.
    ///
    /// The background is painted first with a plain clear and is never
    /// affected by any layer's blend mode. A layer that fails to render is
    /// skipped with a warning; only caller misuse (an invalid scene) is an
    /// error.
    #[tracing::instrument(skip_all, fields(time, layers = scene.layers.len()))]
    pub fn render_frame(
        &mut self,
        scene: &Scene,
        orbit: &OrbitRegistry,
        time: f64,
        target: &mut dyn RenderTarget,
    ) -> GlowformResult<()> {
        scene.validate()?;
        target.clear(scene.background());

        for layer in &scene.layers {
            if !layer.visible {
                continue;
            }
            if let Err(error) = self.render_layer(layer, orbit, time, target) {
                tracing::warn!(layer = %layer.id, %error, "layer render failed; skipping");
            }
        }
        Ok(())
    }

    fn render_layer(
        &mut self,
        layer: &Layer,
        orbit: &OrbitRegistry,
        time: f64,
        target: &mut dyn RenderTarget,
    ) -> GlowformResult<()> {
        let canvas = target.canvas();
        let (nx, ny) = derive::layer_position_at(layer, orbit, time);
        let center_x = nx * f64::from(canvas.width);
        let center_y = ny * f64::from(canvas.height);
        let scale = derive::layer_scale_at(layer, time);

        match layer.layer_type {
            LayerType::Image => {
                let source = layer.image_source.as_deref().ok_or_else(|| {
                    GlowformError::render(format!("image layer '{}' has no source", layer.id))
                })?;
                // Shape parameters are ignored for image layers; only
                // placement, opacity and blend apply.
                let transform = Affine::translate((center_x, center_y))
                    * Affine::scale(scale)
                    * Affine::translate((-layer.width / 2.0, -layer.height / 2.0));
                target.draw_image(source, transform, layer.opacity, layer.blend_mode)
            }
            LayerType::Shape => {
                if layer.colors.is_empty() {
                    return Err(GlowformError::render(format!(
                        "shape layer '{}' has no colors",
                        layer.id
                    )));
                }
                let colors: Vec<Rgba8> =
                    layer.colors.iter().map(|hex| Rgba8::from_hex(hex)).collect();

                // Shape-local [-1,1] to pixel space, guide box scaled by the
                // animated scale cycle.
                let to_px = Affine::translate((center_x, center_y))
                    * Affine::scale_non_uniform(
                        layer.width / 2.0 * scale,
                        layer.height / 2.0 * scale,
                    );

                let echoes = derive::derive_echo_set(&mut self.cache, layer);
                // Outermost echo first so the undistorted base lands on top.
                for (index, nodes) in echoes.iter().enumerate().rev() {
                    let points: Vec<kurbo::Point> =
                        nodes.iter().map(crate::core::Node::point).collect();
                    let path = to_px * geometry::smooth_closed_path(&points, layer.curviness);
                    let color = colors[index % colors.len()];
                    target.fill_path(&path, color, layer.opacity, layer.blend_mode)?;
                }
                Ok(())
            }
        }
    }
}
