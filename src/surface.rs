//! The abstract 2D drawable surface the compositor paints onto. The core
//! only issues primitives (clear, path fill, image draw); readback lives on
//! the concrete implementation, outside the render path.

use crate::{
    core::{Affine, BezPath, Canvas, Rgba8},
    error::{GlowformError, GlowformResult},
    model::BlendMode,
};

/// One rendered frame, straight out of a surface readback.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub premultiplied: bool,
}

pub trait RenderTarget {
    fn canvas(&self) -> Canvas;

    /// Paints the whole surface with `color`, ignoring blend modes. The
    /// compositor uses this exactly once per frame for the background.
    fn clear(&mut self, color: Rgba8);

    /// Fills a closed path (already in pixel space) and composites it over
    /// the accumulated frame with the given opacity and blend mode.
    fn fill_path(
        &mut self,
        path: &BezPath,
        color: Rgba8,
        opacity: f64,
        blend: BlendMode,
    ) -> GlowformResult<()>;

    /// Draws an externally registered drawable. `source` is an asset key
    /// the surface resolves; an unknown key is a render error the
    /// compositor turns into a skipped layer.
    fn draw_image(
        &mut self,
        source: &str,
        transform: Affine,
        opacity: f64,
        blend: BlendMode,
    ) -> GlowformResult<()>;
}

/// Host-side factory for a render surface that may not be ready yet (e.g. a
/// drawing context that materializes a few frames after mount).
pub trait SurfaceProvider {
    type Target: RenderTarget;

    /// One readiness probe. `Ok(None)` means "not ready yet, ask again";
    /// errors are terminal.
    fn poll(&mut self) -> GlowformResult<Option<Self::Target>>;
}

/// Polls the provider up to `max_attempts` times. Not-ready outcomes are
/// silent (the host scheduler paces the retries); only exhausting every
/// attempt surfaces a hard error. The animation clock must not be started
/// until this returns a target.
pub fn acquire_surface<P: SurfaceProvider>(
    provider: &mut P,
    max_attempts: u32,
) -> GlowformResult<P::Target> {
    for attempt in 0..max_attempts {
        if let Some(target) = provider.poll()? {
            return Ok(target);
        }
        tracing::debug!(attempt, "render surface not ready yet");
    }
    Err(GlowformError::surface(format!(
        "render surface unavailable after {max_attempts} attempts"
    )))
}
