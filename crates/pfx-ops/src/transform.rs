//! Geometric transformation operations.
//!
//! # Operations
//!
//! - [`rotate`] - Rotation by a multiple of 90°, clockwise
//! - [`flip_h`] - Horizontal flip (mirror)
//! - [`flip_v`] - Vertical flip
//! - [`crop`] - Extract region of interest
//!
//! Rotations by 90° and 270° swap width and height and write into a freshly
//! sized buffer. The other operations keep their geometry except for crop.
//!
//! # Example
//!
//! ```rust
//! use pfx_core::Image;
//! use pfx_ops::transform::{crop, rotate, Rotation};
//!
//! let mut img = Image::new(64, 32);
//! rotate(&mut img, Rotation::Deg90).unwrap();
//! assert_eq!(img.dimensions(), (32, 64));
//!
//! crop(&mut img, 8, 8, 16, 16).unwrap();
//! assert_eq!(img.dimensions(), (16, 16));
//! ```

use crate::OpsResult;
use pfx_core::{Error, Image, Rect, RowPartitioner};
use std::str::FromStr;
use tracing::trace;

/// Clockwise rotation angle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rotation {
    /// 90° clockwise.
    Deg90,
    /// 180°.
    Deg180,
    /// 270° clockwise (90° counter-clockwise).
    Deg270,
}

impl Rotation {
    /// Angle in degrees.
    pub fn degrees(self) -> u32 {
        match self {
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }
}

impl FromStr for Rotation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "90" => Ok(Self::Deg90),
            "180" => Ok(Self::Deg180),
            "270" | "-90" => Ok(Self::Deg270),
            other => Err(format!("unsupported rotation '{other}' (expected 90, 180 or 270)")),
        }
    }
}

/// Rotates `img` clockwise by `rotation`.
pub fn rotate(img: &mut Image, rotation: Rotation) -> OpsResult<()> {
    match rotation {
        Rotation::Deg90 => rotate_90(img),
        Rotation::Deg180 => rotate_180(img),
        Rotation::Deg270 => rotate_270(img),
    }
}

/// Rotates 90° clockwise. Output is `height × width`.
pub fn rotate_90(img: &mut Image) -> OpsResult<()> {
    let (w, h) = (img.width() as usize, img.height() as usize);
    trace!(width = w, height = h, "rotate_90");
    let src = img.pixels();
    let mut dst = vec![[0u8; 4]; w * h];
    // dst is h wide: dst(x', y') = src(y', h - 1 - x')
    RowPartitioner::new().for_each_pixel(&mut dst, h, |x, y, px| {
        *px = src[(h - 1 - x) * w + y];
    });
    img.replace_data(h as u32, w as u32, dst)?;
    Ok(())
}

/// Rotates 180° by reversing the pixel buffer.
pub fn rotate_180(img: &mut Image) -> OpsResult<()> {
    trace!(width = img.width(), height = img.height(), "rotate_180");
    img.pixels_mut().reverse();
    Ok(())
}

/// Rotates 270° clockwise. Output is `height × width`.
pub fn rotate_270(img: &mut Image) -> OpsResult<()> {
    let (w, h) = (img.width() as usize, img.height() as usize);
    trace!(width = w, height = h, "rotate_270");
    let src = img.pixels();
    let mut dst = vec![[0u8; 4]; w * h];
    // dst(x', y') = src(w - 1 - y', x')
    RowPartitioner::new().for_each_pixel(&mut dst, h, |x, y, px| {
        *px = src[x * w + (w - 1 - y)];
    });
    img.replace_data(h as u32, w as u32, dst)?;
    Ok(())
}

/// Mirrors left-right by reversing every row.
pub fn flip_h(img: &mut Image) -> OpsResult<()> {
    let width = img.width() as usize;
    trace!(width, height = img.height(), "flip_h");
    RowPartitioner::new().for_each_rows(img.pixels_mut(), width, |_, chunk| {
        for row in chunk.chunks_exact_mut(width) {
            row.reverse();
        }
    });
    Ok(())
}

/// Mirrors top-bottom by swapping rows `y` and `h - 1 - y`.
pub fn flip_v(img: &mut Image) -> OpsResult<()> {
    let width = img.width() as usize;
    let height = img.height() as usize;
    trace!(width, height, "flip_v");
    if width == 0 {
        return Ok(());
    }
    let data = img.pixels_mut();
    let (top, bottom) = data.split_at_mut(height / 2 * width);
    let bottom_len = bottom.len();
    // skip the middle row of odd heights
    let bottom = &mut bottom[bottom_len - top.len()..];
    for (a, b) in top
        .chunks_exact_mut(width)
        .zip(bottom.chunks_exact_mut(width).rev())
    {
        a.swap_with_slice(b);
    }
    Ok(())
}

/// Crops `img` to the `w × h` rectangle at `(x, y)`.
///
/// # Errors
///
/// [`Error::InvalidRegion`] if the rectangle exceeds the image.
pub fn crop(img: &mut Image, x: u32, y: u32, w: u32, h: u32) -> OpsResult<()> {
    let region = Rect::new(x, y, w, h);
    if !region.fits_within(img.width(), img.height()) {
        return Err(Error::invalid_region(x, y, w, h, img.width(), img.height()).into());
    }
    if region == img.bounds() {
        return Ok(());
    }
    trace!(x, y, w, h, "crop");

    let stride = img.width() as usize;
    let (x, w) = (x as usize, w as usize);
    let src = img.pixels();
    let mut dst = Vec::with_capacity(w * h as usize);
    for row in y as usize..(y + h) as usize {
        let start = row * stride + x;
        dst.extend_from_slice(&src[start..start + w]);
    }
    img.replace_data(w as u32, h, dst)?;
    Ok(())
}
