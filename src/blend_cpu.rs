//! Per-pixel compositing of premultiplied RGBA8 buffers: the separable W3C
//! blend modes on top of source-over alpha,
//! `Co = as*(1-ab)*Cs + ab*(1-as)*Cb + as*ab*B(Cb, Cs)`.

use crate::{error::GlowformResult, model::BlendMode};

pub type PremulRgba8 = [u8; 4];

/// Composites one source pixel over one destination pixel with the given
/// blend mode, scaling source alpha by `opacity` first.
pub fn blend_pixel(dst: PremulRgba8, src: PremulRgba8, opacity: f32, mode: BlendMode) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let ab = f32::from(dst[3]) / 255.0;
    let asrc = f32::from(src[3]) / 255.0 * opacity;
    if asrc <= 0.0 {
        return dst;
    }

    // Unpremultiply into straight color for the blend function.
    let un = |premul: u8, alpha: f32| -> f32 {
        if alpha > 0.0 {
            (f32::from(premul) / 255.0 / alpha).min(1.0)
        } else {
            0.0
        }
    };

    let ao = asrc + ab - asrc * ab;
    let mut out = [0u8; 4];
    out[3] = (ao * 255.0).round().clamp(0.0, 255.0) as u8;

    for i in 0..3 {
        let cb = un(dst[i], ab);
        let cs = un(src[i], f32::from(src[3]) / 255.0);
        let blended = apply(mode, cb, cs);
        // Result is already premultiplied by construction.
        let co = asrc * (1.0 - ab) * cs + ab * (1.0 - asrc) * cb + asrc * ab * blended;
        out[i] = (co * 255.0).round().clamp(0.0, 255.0) as u8;
    }
    out
}

/// Blends `src` into `dst` pixel by pixel. Both must be equal-length RGBA8
/// buffers.
pub fn blend_in_place(
    dst: &mut [u8],
    src: &[u8],
    opacity: f32,
    mode: BlendMode,
) -> GlowformResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(crate::GlowformError::render(
            "blend_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let out = blend_pixel(
            [d[0], d[1], d[2], d[3]],
            [s[0], s[1], s[2], s[3]],
            opacity,
            mode,
        );
        d.copy_from_slice(&out);
    }
    Ok(())
}

/// The separable blend function B(Cb, Cs) per channel, straight color in
/// [0,1]. Formulas follow the CSS compositing spec.
fn apply(mode: BlendMode, cb: f32, cs: f32) -> f32 {
    match mode {
        BlendMode::Normal => cs,
        BlendMode::Multiply => cb * cs,
        BlendMode::Screen => cb + cs - cb * cs,
        BlendMode::Overlay => apply(BlendMode::HardLight, cs, cb),
        BlendMode::Darken => cb.min(cs),
        BlendMode::Lighten => cb.max(cs),
        BlendMode::ColorDodge => {
            if cb <= 0.0 {
                0.0
            } else if cs >= 1.0 {
                1.0
            } else {
                (cb / (1.0 - cs)).min(1.0)
            }
        }
        BlendMode::ColorBurn => {
            if cb >= 1.0 {
                1.0
            } else if cs <= 0.0 {
                0.0
            } else {
                1.0 - ((1.0 - cb) / cs).min(1.0)
            }
        }
        BlendMode::HardLight => {
            if cs <= 0.5 {
                cb * (2.0 * cs)
            } else {
                let s = 2.0 * cs - 1.0;
                cb + s - cb * s
            }
        }
        BlendMode::SoftLight => {
            if cs <= 0.5 {
                cb - (1.0 - 2.0 * cs) * cb * (1.0 - cb)
            } else {
                let d = if cb <= 0.25 {
                    ((16.0 * cb - 12.0) * cb + 4.0) * cb
                } else {
                    cb.sqrt()
                };
                cb + (2.0 * cs - 1.0) * (d - cb)
            }
        }
        BlendMode::Difference => (cb - cs).abs(),
        BlendMode::Exclusion => cb + cs - 2.0 * cb * cs,
    }
}
