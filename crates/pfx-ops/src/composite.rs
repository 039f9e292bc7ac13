//! Opacity-weighted blending of two images.
//!
//! Each input is weighted by its own opacity times its per-pixel alpha:
//!
//! ```text
//! wa  = opacity_a * alpha_a / 255
//! wb  = opacity_b * alpha_b / 255
//! rgb = a.rgb * wa + b.rgb * wb
//! a   = 255 * (wa + wb)
//! ```
//!
//! All channels are clamped to `[0, 255]`. The result lands in the first
//! image.
//!
//! ```rust
//! use pfx_core::Image;
//! use pfx_ops::composite::blend;
//!
//! let mut a = Image::filled(4, 4, [200, 0, 0, 255]);
//! let b = Image::filled(4, 4, [0, 100, 0, 255]);
//! blend(&mut a, &b, 0.5, 0.5).unwrap();
//! assert_eq!(a.pixel(0, 0), [100, 50, 0, 255]);
//! ```

use crate::OpsResult;
use pfx_core::pixel::clamp_u8;
use pfx_core::{Image, Pixel, RowPartitioner, ALPHA};
use tracing::{debug, trace};

/// Blends `b` into `a` with opacities `opacity_a` and `opacity_b`.
///
/// Images of different size leave `a` unchanged.
pub fn blend(a: &mut Image, b: &Image, opacity_a: f32, opacity_b: f32) -> OpsResult<()> {
    if a.dimensions() != b.dimensions() {
        debug!(a = ?a.dimensions(), b = ?b.dimensions(), "blend size mismatch, image left unchanged");
        return Ok(());
    }
    trace!(width = a.width(), height = a.height(), opacity_a, opacity_b, "blend");

    let width = a.width() as usize;
    let other = b.pixels();
    RowPartitioner::new().for_each_pixel(a.pixels_mut(), width, |x, y, px| {
        *px = blend_pixel(*px, other[y * width + x], opacity_a, opacity_b);
    });
    Ok(())
}

/// Blends a single pixel pair.
#[inline]
pub fn blend_pixel(a: Pixel, b: Pixel, opacity_a: f32, opacity_b: f32) -> Pixel {
    let wa = opacity_a * a[ALPHA] as f32 / 255.0;
    let wb = opacity_b * b[ALPHA] as f32 / 255.0;
    [
        clamp_u8(a[0] as f32 * wa + b[0] as f32 * wb),
        clamp_u8(a[1] as f32 * wa + b[1] as f32 * wb),
        clamp_u8(a[2] as f32 * wa + b[2] as f32 * wb),
        clamp_u8(255.0 * (wa + wb)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blend_equal_weights() {
        let mut a = Image::filled(3, 3, [100, 200, 50, 255]);
        let b = Image::filled(3, 3, [50, 0, 150, 255]);
        blend(&mut a, &b, 0.5, 0.5).unwrap();
        assert!(a.pixels().iter().all(|p| *p == [75, 100, 100, 255]));
    }

    #[test]
    fn test_blend_respects_alpha() {
        let out = blend_pixel([200, 200, 200, 0], [100, 50, 0, 255], 1.0, 1.0);
        assert_eq!(out, [100, 50, 0, 255]);
        let out = blend_pixel([200, 200, 200, 255], [100, 50, 0, 255], 1.0, 1.0);
        assert_eq!(out, [255, 250, 200, 255]);
    }

    #[test]
    fn test_blend_alpha_sum() {
        let out = blend_pixel([0, 0, 0, 102], [0, 0, 0, 51], 1.0, 1.0);
        assert_eq!(out[ALPHA], 153);
    }

    #[test]
    fn test_blend_size_mismatch_is_noop() {
        let mut a = Image::filled(3, 3, [1, 2, 3, 4]);
        let before = a.clone();
        blend(&mut a, &Image::new(2, 3), 1.0, 1.0).unwrap();
        assert_eq!(a, before);
    }
}
