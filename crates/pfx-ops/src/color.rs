//! Per-pixel colour filters.
//!
//! Most filters here are an affine colour matrix, `out = clamp(M·[r,g,b] + v)`,
//! applied by [`apply_mat`]. Alpha is never touched by a matrix.
//!
//! - [`grayscale`] - Rec.709 luminosity
//! - [`sepia`] - Classic sepia tone
//! - [`hue_rotate`] - Luminance-preserving hue rotation
//! - [`invert`] - `255 - c`, with an alpha mode
//! - [`saturation`] - Scales S of an HSV image
//!
//! ```rust
//! use pfx_core::Image;
//! use pfx_ops::color::{apply_mat, ColorMatrix};
//!
//! let mut img = Image::filled(2, 2, [10, 20, 30, 40]);
//! apply_mat(&mut img, &ColorMatrix::IDENTITY).unwrap();
//! assert_eq!(img.pixel(1, 1), [10, 20, 30, 40]);
//! ```

use crate::OpsResult;
use pfx_core::error::ensure_colorspace;
use pfx_core::pixel::{clamp_u8, REC709_LUMA};
use pfx_core::{ColorSpace, Image, Pixel, RowPartitioner, ALPHA};
use tracing::{debug, trace};

/// 3×3 colour matrix plus offset vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorMatrix {
    /// Row-major 3×3 matrix.
    pub m: [[f32; 3]; 3],
    /// Offset added after the multiplication.
    pub v: [f32; 3],
}

impl ColorMatrix {
    /// Identity transform.
    pub const IDENTITY: ColorMatrix = ColorMatrix {
        m: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        v: [0.0; 3],
    };

    /// Creates a matrix from rows and an offset.
    pub const fn new(m: [[f32; 3]; 3], v: [f32; 3]) -> Self {
        Self { m, v }
    }

    /// Grayscale by luminosity: every output channel is the Rec.709 luma.
    pub const fn grayscale() -> Self {
        Self::new([REC709_LUMA; 3], [0.0; 3])
    }

    /// Sepia tone.
    pub const fn sepia() -> Self {
        Self::new(
            [
                [0.393, 0.769, 0.189],
                [0.349, 0.686, 0.168],
                [0.272, 0.534, 0.131],
            ],
            [0.0; 3],
        )
    }

    /// Hue rotation by `degrees`, preserving luminance.
    pub fn hue_rotate(degrees: f32) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self::new(
            [
                [
                    0.213 + cos * 0.787 - sin * 0.213,
                    0.715 - cos * 0.715 - sin * 0.715,
                    0.072 - cos * 0.072 + sin * 0.928,
                ],
                [
                    0.213 - cos * 0.213 + sin * 0.143,
                    0.715 + cos * 0.285 + sin * 0.140,
                    0.072 - cos * 0.072 - sin * 0.283,
                ],
                [
                    0.213 - cos * 0.213 - sin * 0.787,
                    0.715 - cos * 0.715 + sin * 0.715,
                    0.072 + cos * 0.928 + sin * 0.072,
                ],
            ],
            [0.0; 3],
        )
    }

    /// RGB → YCbCr for either YCbCr variant; `None` for other targets.
    pub fn rgb_to_ycbcr(target: ColorSpace) -> Option<Self> {
        match target {
            ColorSpace::YCbCrJpeg => Some(Self::new(
                [
                    [0.299, 0.587, 0.114],
                    [-0.168736, -0.331264, 0.5],
                    [0.5, -0.418688, -0.081312],
                ],
                [0.0, 128.0, 128.0],
            )),
            ColorSpace::YCbCrBt601 => Some(Self::new(
                [
                    [65.481 / 255.0, 128.553 / 255.0, 24.966 / 255.0],
                    [-37.797 / 255.0, -74.203 / 255.0, 112.0 / 255.0],
                    [112.0 / 255.0, -93.786 / 255.0, -18.214 / 255.0],
                ],
                [16.0, 128.0, 128.0],
            )),
            _ => None,
        }
    }

    /// YCbCr → RGB for either YCbCr variant; `None` for other sources.
    pub fn ycbcr_to_rgb(source: ColorSpace) -> Option<Self> {
        match source {
            ColorSpace::YCbCrJpeg => Some(Self::new(
                [[1.0, 0.0, 1.402], [1.0, -0.344136, -0.714136], [1.0, 1.772, 0.0]],
                [-179.456, 135.458816, -226.816],
            )),
            ColorSpace::YCbCrBt601 => Some(Self::new(
                [
                    [1.164383, 0.0, 1.596027],
                    [1.164383, -0.391762, -0.812968],
                    [1.164383, 2.017232, 0.0],
                ],
                [-222.921584, 135.575312, -276.835824],
            )),
            _ => None,
        }
    }

    /// Applies the transform to one pixel, keeping alpha.
    #[inline]
    pub fn apply(&self, px: Pixel) -> Pixel {
        let (r, g, b) = (px[0] as f32, px[1] as f32, px[2] as f32);
        let row = |i: usize| self.m[i][0] * r + self.m[i][1] * g + self.m[i][2] * b + self.v[i];
        [clamp_u8(row(0)), clamp_u8(row(1)), clamp_u8(row(2)), px[ALPHA]]
    }
}

impl Default for ColorMatrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Applies `mat` to every pixel, whatever the colour space tag.
pub fn apply_mat(img: &mut Image, mat: &ColorMatrix) -> OpsResult<()> {
    trace!(width = img.width(), height = img.height(), "apply_mat");
    let width = img.width() as usize;
    RowPartitioner::new().for_each_pixel(img.pixels_mut(), width, |_, _, px| {
        *px = mat.apply(*px);
    });
    Ok(())
}

/// Grayscale by luminosity. Requires an RGB image.
pub fn grayscale(img: &mut Image) -> OpsResult<()> {
    ensure_colorspace("grayscale", img.colorspace(), ColorSpace::Rgb)?;
    apply_mat(img, &ColorMatrix::grayscale())
}

/// Sepia tone. Requires an RGB image.
pub fn sepia(img: &mut Image) -> OpsResult<()> {
    ensure_colorspace("sepia", img.colorspace(), ColorSpace::Rgb)?;
    apply_mat(img, &ColorMatrix::sepia())
}

/// Rotates hue by `degrees`. Requires an RGB image.
pub fn hue_rotate(img: &mut Image, degrees: f32) -> OpsResult<()> {
    ensure_colorspace("hue_rotate", img.colorspace(), ColorSpace::Rgb)?;
    apply_mat(img, &ColorMatrix::hue_rotate(degrees))
}

/// What [`invert`] does with the alpha channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlphaMode {
    /// Invert colour channels, leave alpha.
    #[default]
    Preserve,
    /// Invert colour channels and alpha.
    Invert,
    /// Invert alpha only.
    Only,
}

/// Inverts channels: `c = 255 - c`.
pub fn invert(img: &mut Image, mode: AlphaMode) -> OpsResult<()> {
    trace!(width = img.width(), height = img.height(), ?mode, "invert");
    let width = img.width() as usize;
    RowPartitioner::new().for_each_pixel(img.pixels_mut(), width, |_, _, px| {
        if mode != AlphaMode::Only {
            for c in &mut px[..ALPHA] {
                *c = 255 - *c;
            }
        }
        if mode != AlphaMode::Preserve {
            px[ALPHA] = 255 - px[ALPHA];
        }
    });
    Ok(())
}

/// Scales the S channel of an HSV image by `multiplier`, clamped to `[0, 100]`.
///
/// Negative or non-finite multipliers leave the image unchanged.
///
/// # Errors
///
/// Returns a colour space mismatch if the image is not tagged HSV.
pub fn saturation(img: &mut Image, multiplier: f32) -> OpsResult<()> {
    ensure_colorspace("saturation", img.colorspace(), ColorSpace::Hsv)?;
    if !multiplier.is_finite() || multiplier < 0.0 {
        debug!(multiplier, "negative or non-finite saturation multiplier, skipping");
        return Ok(());
    }
    trace!(width = img.width(), height = img.height(), multiplier, "saturation");
    let width = img.width() as usize;
    RowPartitioner::new().for_each_pixel(img.pixels_mut(), width, |_, _, px| {
        px[1] = (px[1] as f32 * multiplier).clamp(0.0, 100.0).round() as u8;
    });
    Ok(())
}
