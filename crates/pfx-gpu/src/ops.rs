//! GPU versions of the per-pixel colour filters.
//!
//! Same preconditions and colour space bookkeeping as the CPU filters in
//! `pfx_ops`; only the pixel loop runs on the device.

use bytemuck::{Pod, Zeroable};
use pfx_core::error::ensure_colorspace;
use pfx_core::{ColorSpace, Image};
use pfx_ops::ColorMatrix;
use tracing::trace;

use crate::shaders::{APPLY_MAT, HSV2RGB, RGB2HSV, RGB2YCBCR};
use crate::{ComputeContext, GpuResult};

/// Matrix uniform: three padded rows and the offset vector.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct MatUniform {
    rows: [[f32; 4]; 3],
    offset: [f32; 4],
}

impl From<&ColorMatrix> for MatUniform {
    fn from(mat: &ColorMatrix) -> Self {
        let row = |r: [f32; 3]| [r[0], r[1], r[2], 0.0];
        Self {
            rows: [row(mat.m[0]), row(mat.m[1]), row(mat.m[2])],
            offset: row(mat.v),
        }
    }
}

/// Forward and inverse YCbCr matrices for the `rgb2ycbcr` kernel.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct YccUniform {
    forward: MatUniform,
    inverse: MatUniform,
}

/// Applies `mat` to every pixel, whatever the colour space tag.
pub fn apply_mat(ctx: &ComputeContext, img: &mut Image, mat: &ColorMatrix) -> GpuResult<()> {
    let uniform = MatUniform::from(mat);
    ctx.run(APPLY_MAT, img, Some(bytemuck::bytes_of(&uniform)))
}

/// Grayscale by luminosity. Requires RGB.
pub fn grayscale(ctx: &ComputeContext, img: &mut Image) -> GpuResult<()> {
    ensure_colorspace("grayscale", img.colorspace(), ColorSpace::Rgb)?;
    apply_mat(ctx, img, &ColorMatrix::grayscale())
}

/// Sepia tone. Requires RGB.
pub fn sepia(ctx: &ComputeContext, img: &mut Image) -> GpuResult<()> {
    ensure_colorspace("sepia", img.colorspace(), ColorSpace::Rgb)?;
    apply_mat(ctx, img, &ColorMatrix::sepia())
}

/// Hue rotation by `degrees`. Requires RGB.
pub fn hue_rotate(ctx: &ComputeContext, img: &mut Image, degrees: f32) -> GpuResult<()> {
    ensure_colorspace("hue_rotate", img.colorspace(), ColorSpace::Rgb)?;
    apply_mat(ctx, img, &ColorMatrix::hue_rotate(degrees))
}

/// RGB → HSV. Requires RGB.
pub fn rgb_to_hsv(ctx: &ComputeContext, img: &mut Image) -> GpuResult<()> {
    ensure_colorspace("rgb_to_hsv", img.colorspace(), ColorSpace::Rgb)?;
    ctx.run(RGB2HSV, img, None)?;
    img.set_colorspace(ColorSpace::Hsv);
    Ok(())
}

/// HSV → RGB. Requires HSV.
pub fn hsv_to_rgb(ctx: &ComputeContext, img: &mut Image) -> GpuResult<()> {
    ensure_colorspace("hsv_to_rgb", img.colorspace(), ColorSpace::Hsv)?;
    ctx.run(HSV2RGB, img, None)?;
    img.set_colorspace(ColorSpace::Rgb);
    Ok(())
}

/// Converts `img` in place to `target`, routing through RGB where no direct
/// edge exists.
pub fn convert(ctx: &ComputeContext, img: &mut Image, target: ColorSpace) -> GpuResult<()> {
    let source = img.colorspace();
    if source == target {
        return Ok(());
    }
    trace!(%source, %target, "gpu convert colorspace");
    match (source, target) {
        (ColorSpace::Rgb, ColorSpace::Hsv) => rgb_to_hsv(ctx, img),
        (ColorSpace::Hsv, ColorSpace::Rgb) => hsv_to_rgb(ctx, img),
        (ColorSpace::Rgb, ycc) => {
            if let (Some(forward), Some(inverse)) =
                (ColorMatrix::rgb_to_ycbcr(ycc), ColorMatrix::ycbcr_to_rgb(ycc))
            {
                let uniform = YccUniform {
                    forward: MatUniform::from(&forward),
                    inverse: MatUniform::from(&inverse),
                };
                ctx.run(RGB2YCBCR, img, Some(bytemuck::bytes_of(&uniform)))?;
                img.set_colorspace(ycc);
            }
            Ok(())
        }
        (ycc, ColorSpace::Rgb) => {
            if let Some(mat) = ColorMatrix::ycbcr_to_rgb(ycc) {
                apply_mat(ctx, img, &mat)?;
                img.set_colorspace(ColorSpace::Rgb);
            }
            Ok(())
        }
        _ => {
            convert(ctx, img, ColorSpace::Rgb)?;
            convert(ctx, img, target)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mat_uniform_layout() {
        assert_eq!(std::mem::size_of::<MatUniform>(), 64);
        let u = MatUniform::from(&ColorMatrix::rgb_to_ycbcr(ColorSpace::YCbCrJpeg).unwrap());
        assert_eq!(u.rows[0], [0.299, 0.587, 0.114, 0.0]);
        assert_eq!(u.offset, [0.0, 128.0, 128.0, 0.0]);
        assert_eq!(std::mem::size_of::<YccUniform>(), 128);
    }
}
