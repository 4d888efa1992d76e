//! CPU render target backed by `vello_cpu`. Each primitive renders into a
//! transparent scratch pixmap, then composites into the accumulated frame
//! with [`crate::blend_cpu`], which is what makes every [`BlendMode`] work
//! on a plain pixmap.

use std::collections::HashMap;

use crate::{
    blend_cpu,
    core::{Affine, BezPath, Canvas, Rgba8},
    error::{GlowformError, GlowformResult},
    model::BlendMode,
    surface::{FrameRGBA, RenderTarget},
};

pub struct CpuTarget {
    width: u16,
    height: u16,
    frame: vello_cpu::Pixmap,
    scratch: vello_cpu::Pixmap,
    images: HashMap<String, vello_cpu::Image>,
}

impl CpuTarget {
    pub fn new(canvas: Canvas) -> GlowformResult<Self> {
        let width: u16 = canvas
            .width
            .try_into()
            .map_err(|_| GlowformError::validation("surface width exceeds u16"))?;
        let height: u16 = canvas
            .height
            .try_into()
            .map_err(|_| GlowformError::validation("surface height exceeds u16"))?;
        if width == 0 || height == 0 {
            return Err(GlowformError::validation("surface must be non-empty"));
        }
        Ok(Self {
            width,
            height,
            frame: vello_cpu::Pixmap::new(width, height),
            scratch: vello_cpu::Pixmap::new(width, height),
            images: HashMap::new(),
        })
    }

    /// Registers an external drawable under `key` for `draw_image`. Pixel
    /// data is premultiplied RGBA8, row-major.
    pub fn register_image(
        &mut self,
        key: impl Into<String>,
        rgba8_premul: &[u8],
        width: u32,
        height: u32,
    ) -> GlowformResult<()> {
        let pixmap = premul_bytes_to_pixmap(rgba8_premul, width, height)?;
        self.images.insert(
            key.into(),
            vello_cpu::Image {
                image: vello_cpu::ImageSource::Pixmap(std::sync::Arc::new(pixmap)),
                sampler: vello_cpu::peniko::ImageSampler::default(),
            },
        );
        Ok(())
    }

    pub fn readback(&self) -> FrameRGBA {
        FrameRGBA {
            width: u32::from(self.width),
            height: u32::from(self.height),
            data: self.frame.data_as_u8_slice().to_vec(),
            premultiplied: true,
        }
    }

    fn composite_scratch(&mut self, opacity: f64, blend: BlendMode) -> GlowformResult<()> {
        blend_cpu::blend_in_place(
            self.frame.data_as_u8_slice_mut(),
            self.scratch.data_as_u8_slice(),
            opacity.clamp(0.0, 1.0) as f32,
            blend,
        )
    }

    fn scratch_context(&mut self) -> vello_cpu::RenderContext {
        clear_pixmap(&mut self.scratch, [0, 0, 0, 0]);
        let mut ctx = vello_cpu::RenderContext::new(self.width, self.height);
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx
    }
}

impl RenderTarget for CpuTarget {
    fn canvas(&self) -> Canvas {
        Canvas {
            width: u32::from(self.width),
            height: u32::from(self.height),
        }
    }

    fn clear(&mut self, color: Rgba8) {
        let premul = premul_rgba8(color.r, color.g, color.b, color.a);
        clear_pixmap(&mut self.frame, premul);
    }

    fn fill_path(
        &mut self,
        path: &BezPath,
        color: Rgba8,
        opacity: f64,
        blend: BlendMode,
    ) -> GlowformResult<()> {
        let mut ctx = self.scratch_context();
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
            color.r, color.g, color.b, color.a,
        ));
        ctx.fill_path(&bezpath_to_cpu(path));
        ctx.flush();
        ctx.render_to_pixmap(&mut self.scratch);
        self.composite_scratch(opacity, blend)
    }

    fn draw_image(
        &mut self,
        source: &str,
        transform: Affine,
        opacity: f64,
        blend: BlendMode,
    ) -> GlowformResult<()> {
        let image = self
            .images
            .get(source)
            .cloned()
            .ok_or_else(|| GlowformError::render(format!("unknown image source '{source}'")))?;
        let (w, h) = image_size(&image)?;

        let mut ctx = self.scratch_context();
        ctx.set_transform(affine_to_cpu(transform));
        ctx.set_paint(image);
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, w, h));
        ctx.flush();
        ctx.render_to_pixmap(&mut self.scratch);
        self.composite_scratch(opacity, blend)
    }
}

fn premul_rgba8(r: u8, g: u8, b: u8, a: u8) -> [u8; 4] {
    let af = u16::from(a) + 1;
    let premul = |c: u8| -> u8 { ((u16::from(c) * af) >> 8) as u8 };
    [premul(r), premul(g), premul(b), a]
}

fn clear_pixmap(pixmap: &mut vello_cpu::Pixmap, rgba: [u8; 4]) {
    for px in pixmap.data_as_u8_slice_mut().chunks_exact_mut(4) {
        px.copy_from_slice(&rgba);
    }
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn point_to_cpu(p: kurbo::Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

fn premul_bytes_to_pixmap(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> GlowformResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| GlowformError::validation("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| GlowformError::validation("image height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(GlowformError::validation("image byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for px in rgba8_premul.chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

fn image_size(image: &vello_cpu::Image) -> GlowformResult<(f64, f64)> {
    match &image.image {
        vello_cpu::ImageSource::Pixmap(p) => Ok((f64::from(p.width()), f64::from(p.height()))),
        vello_cpu::ImageSource::OpaqueId(_) => Err(GlowformError::render(
            "cpu target does not support opaque image ids",
        )),
    }
}
