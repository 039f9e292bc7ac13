//! Colour space conversion.
//!
//! Conversion is a small state machine over [`ColorSpace`] tags:
//!
//! ```text
//!            +---- HSV
//!            |
//!   RGB -----+---- YCbCr (JPEG)
//!            |
//!            +---- YCbCr (BT.601)
//! ```
//!
//! Only edges touching RGB exist. Any other pair goes through RGB as an
//! intermediate. Converting to the current tag is a no-op. The tag is updated
//! after each pixel transform completes.
//!
//! HSV bytes hold `H/2` (`0..=179`), `S` and `V` in percent (`0..=100`).
//!
//! RGB → YCbCr encodes with the forward matrix, then nudges the rounded
//! triple by ±1 per channel when needed so that decoding it returns every
//! channel within 1 of the source. Plain rounding misses by 2 on some
//! studio-range (BT.601) inputs.

use crate::OpsResult;
use crate::color::{apply_mat, ColorMatrix};
use pfx_core::error::ensure_colorspace;
use pfx_core::pixel::clamp_u8;
use pfx_core::{ColorSpace, Image, Pixel, RowPartitioner, ALPHA};
use tracing::trace;

/// Converts `img` in place to `target`.
pub fn convert(img: &mut Image, target: ColorSpace) -> OpsResult<()> {
    let source = img.colorspace();
    if source == target {
        return Ok(());
    }
    trace!(%source, %target, "convert colorspace");
    match (source, target) {
        (ColorSpace::Rgb, ColorSpace::Hsv) => rgb_to_hsv(img),
        (ColorSpace::Hsv, ColorSpace::Rgb) => hsv_to_rgb(img),
        (ColorSpace::Rgb, ycc) => rgb_to_ycbcr(img, ycc),
        (ycc, ColorSpace::Rgb) => ycbcr_to_rgb(img, ycc),
        _ => {
            convert(img, ColorSpace::Rgb)?;
            convert(img, target)
        }
    }
}

/// Returns a converted copy of `src`, leaving `src` untouched.
pub fn converted(src: &Image, target: ColorSpace) -> OpsResult<Image> {
    let mut dst = src.clone();
    convert(&mut dst, target)?;
    Ok(dst)
}

/// RGB → HSV. Requires an RGB image.
pub fn rgb_to_hsv(img: &mut Image) -> OpsResult<()> {
    ensure_colorspace("rgb_to_hsv", img.colorspace(), ColorSpace::Rgb)?;
    let width = img.width() as usize;
    RowPartitioner::new().for_each_pixel(img.pixels_mut(), width, |_, _, px| {
        *px = rgb_to_hsv_pixel(*px);
    });
    img.set_colorspace(ColorSpace::Hsv);
    Ok(())
}

/// HSV → RGB. Requires an HSV image.
pub fn hsv_to_rgb(img: &mut Image) -> OpsResult<()> {
    ensure_colorspace("hsv_to_rgb", img.colorspace(), ColorSpace::Hsv)?;
    let width = img.width() as usize;
    RowPartitioner::new().for_each_pixel(img.pixels_mut(), width, |_, _, px| {
        *px = hsv_to_rgb_pixel(*px);
    });
    img.set_colorspace(ColorSpace::Rgb);
    Ok(())
}

fn rgb_to_ycbcr(img: &mut Image, target: ColorSpace) -> OpsResult<()> {
    ensure_colorspace("rgb_to_ycbcr", img.colorspace(), ColorSpace::Rgb)?;
    let (Some(forward), Some(inverse)) =
        (ColorMatrix::rgb_to_ycbcr(target), ColorMatrix::ycbcr_to_rgb(target))
    else {
        return Ok(());
    };
    let width = img.width() as usize;
    RowPartitioner::new().for_each_pixel(img.pixels_mut(), width, |_, _, px| {
        *px = rgb_to_ycbcr_pixel(*px, &forward, &inverse);
    });
    img.set_colorspace(target);
    Ok(())
}

fn ycbcr_to_rgb(img: &mut Image, source: ColorSpace) -> OpsResult<()> {
    if let Some(mat) = ColorMatrix::ycbcr_to_rgb(source) {
        apply_mat(img, &mat)?;
        img.set_colorspace(ColorSpace::Rgb);
    }
    Ok(())
}

/// Encodes one RGB pixel with `forward` so that `inverse` decodes it back
/// within 1 per channel.
///
/// The rounded triple is kept when it already decodes within 1. Otherwise
/// its ±1 neighbours are tried in a fixed order and the first one with the
/// smallest round-trip error wins.
pub fn rgb_to_ycbcr_pixel(px: Pixel, forward: &ColorMatrix, inverse: &ColorMatrix) -> Pixel {
    let encoded = forward.apply(px);
    let mut best = (round_trip_error(px, encoded, inverse), encoded);
    if best.0 <= 1 {
        return encoded;
    }
    for d0 in -1i16..=1 {
        for d1 in -1i16..=1 {
            for d2 in -1i16..=1 {
                let Some(candidate) = nudge(encoded, [d0, d1, d2]) else {
                    continue;
                };
                let err = round_trip_error(px, candidate, inverse);
                if err < best.0 {
                    best = (err, candidate);
                    if err <= 1 {
                        return candidate;
                    }
                }
            }
        }
    }
    best.1
}

fn nudge(px: Pixel, delta: [i16; 3]) -> Option<Pixel> {
    let mut out = px;
    for (c, d) in out[..ALPHA].iter_mut().zip(delta) {
        *c = u8::try_from(*c as i16 + d).ok()?;
    }
    Some(out)
}

fn round_trip_error(src: Pixel, encoded: Pixel, inverse: &ColorMatrix) -> u8 {
    let decoded = inverse.apply(encoded);
    (0..ALPHA).map(|c| src[c].abs_diff(decoded[c])).max().unwrap_or(0)
}

/// Converts one RGB pixel to the HSV byte encoding.
///
/// Gray pixels (max == min) get saturation 0 and hue 0.
pub fn rgb_to_hsv_pixel(px: Pixel) -> Pixel {
    let r = px[0] as f32 / 255.0;
    let g = px[1] as f32 / 255.0;
    let b = px[2] as f32 / 255.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let (hue, sat) = if delta <= f32::EPSILON {
        (0.0, 0.0)
    } else {
        let sector = if max == r {
            ((g - b) / delta).rem_euclid(6.0)
        } else if max == g {
            (b - r) / delta + 2.0
        } else {
            (r - g) / delta + 4.0
        };
        (sector * 60.0, delta / max)
    };

    let h = ((hue / 2.0).round() as u32 % 180) as u8;
    [h, clamp_u8(sat * 100.0), clamp_u8(max * 100.0), px[ALPHA]]
}

/// Converts one HSV-encoded pixel back to RGB.
pub fn hsv_to_rgb_pixel(px: Pixel) -> Pixel {
    let hue = (px[0] as f32 * 2.0) % 360.0;
    let sat = px[1].min(100) as f32 / 100.0;
    let val = px[2].min(100) as f32 / 100.0;

    let c = val * sat;
    let h = hue / 60.0;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let m = val - c;
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    [
        clamp_u8((r + m) * 255.0),
        clamp_u8((g + m) * 255.0),
        clamp_u8((b + m) * 255.0),
        px[ALPHA],
    ]
}
