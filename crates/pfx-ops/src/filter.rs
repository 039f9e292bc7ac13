//! Windowed filters: sliding-window box blur and kernel convolution.
//!
//! # Box blur
//!
//! Two separable passes (horizontal then vertical), repeated per iteration.
//! Each pass keeps a running window sum: the pixel entering the window is
//! added and the one leaving is subtracted, so the cost per pass does not
//! depend on the window size. Near an edge the window only covers pixels that
//! exist and is averaged over that smaller count.
//!
//! # Convolution
//!
//! Square kernels only; anything else leaves the image unchanged. The
//! positive and negative weights are normalized separately by their own
//! magnitude sums, then the kernel is flipped 180° so the result is a true
//! convolution. Neighbours outside the image are fetched at
//! `abs(coord) % dimension`, which mirrors at the near edge and wraps at the
//! far one. Alpha is passed through.
//!
//! ```rust
//! use pfx_core::Image;
//! use pfx_ops::filter::{convolve, Kernel};
//!
//! let mut img = Image::filled(8, 8, [100, 50, 25, 255]);
//! convolve(&mut img, &Kernel::box_blur(3)).unwrap();
//! assert_eq!(img.pixel(4, 4), [100, 50, 25, 255]);
//! ```

use crate::{OpsError, OpsResult};
use pfx_core::pixel::clamp_u8;
use pfx_core::{Image, Pixel, RowPartitioner, ALPHA};
use tracing::{debug, trace};

/// Convolution kernel, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    /// Kernel weights.
    pub data: Vec<f32>,
    /// Kernel width.
    pub width: usize,
    /// Kernel height.
    pub height: usize,
}

impl Kernel {
    /// Creates a kernel from row-major weights.
    ///
    /// Non-square kernels are accepted here; [`convolve`] ignores them.
    pub fn new(data: Vec<f32>, width: usize, height: usize) -> OpsResult<Self> {
        if data.len() != width * height {
            return Err(OpsError::InvalidParameter(format!(
                "kernel data size {} doesn't match {}x{}",
                data.len(),
                width,
                height
            )));
        }
        Ok(Self { data, width, height })
    }

    /// Creates a kernel from rows of equal length.
    pub fn from_rows<R: AsRef<[f32]>>(rows: &[R]) -> OpsResult<Self> {
        let width = rows.first().map_or(0, |r| r.as_ref().len());
        if rows.iter().any(|r| r.as_ref().len() != width) {
            return Err(OpsError::InvalidParameter("kernel rows differ in length".into()));
        }
        let data = rows.iter().flat_map(|r| r.as_ref().iter().copied()).collect();
        Self::new(data, width, rows.len())
    }

    /// 1×1 identity kernel.
    pub fn identity() -> Self {
        Self {
            data: vec![1.0],
            width: 1,
            height: 1,
        }
    }

    /// Uniform `size × size` average (size made odd).
    pub fn box_blur(size: usize) -> Self {
        let size = if size % 2 == 0 { size + 1 } else { size };
        Self {
            data: vec![1.0; size * size],
            width: size,
            height: size,
        }
    }

    /// 3×3 sharpening kernel.
    pub fn sharpen() -> Self {
        Self {
            data: vec![0.0, -1.0, 0.0, -1.0, 5.0, -1.0, 0.0, -1.0, 0.0],
            width: 3,
            height: 3,
        }
    }

    /// 3×3 Laplacian edge detector.
    pub fn edge_detect() -> Self {
        Self {
            data: vec![-1.0, -1.0, -1.0, -1.0, 8.0, -1.0, -1.0, -1.0, -1.0],
            width: 3,
            height: 3,
        }
    }

    /// 3×3 emboss kernel.
    pub fn emboss() -> Self {
        Self {
            data: vec![-2.0, -1.0, 0.0, -1.0, 1.0, 1.0, 0.0, 1.0, 2.0],
            width: 3,
            height: 3,
        }
    }

    /// Returns `true` for N×N kernels with N > 0.
    #[inline]
    pub fn is_square(&self) -> bool {
        self.width == self.height && self.width > 0
    }

    /// Weights after per-part normalization and a 180° flip.
    ///
    /// Positive weights are divided by the positive sum, negative weights by
    /// the magnitude of the negative sum.
    pub fn normalized_flipped(&self) -> Vec<f32> {
        let pos: f32 = self.data.iter().filter(|w| **w > 0.0).sum();
        let neg: f32 = self.data.iter().filter(|w| **w < 0.0).map(|w| -w).sum();
        self.data
            .iter()
            .rev()
            .map(|&w| {
                if w > 0.0 {
                    w / pos
                } else if w < 0.0 {
                    w / neg
                } else {
                    0.0
                }
            })
            .collect()
    }
}

/// Convolves `img` with a square `kernel`.
///
/// Non-square kernels are a silent no-op.
pub fn convolve(img: &mut Image, kernel: &Kernel) -> OpsResult<()> {
    if !kernel.is_square() {
        debug!(kw = kernel.width, kh = kernel.height, "non-square kernel, image left unchanged");
        return Ok(());
    }
    if img.is_empty() {
        return Ok(());
    }
    trace!(width = img.width(), height = img.height(), size = kernel.width, "convolve");

    let weights = kernel.normalized_flipped();
    let size = kernel.width;
    let half = (size / 2) as isize;
    let width = img.width() as usize;
    let height = img.height() as usize;
    let src = img.pixels().to_vec();

    RowPartitioner::new().for_each_pixel(img.pixels_mut(), width, |x, y, px| {
        let mut acc = [0.0f32; 3];
        for ky in 0..size {
            let sy = (y as isize + ky as isize - half).unsigned_abs() % height;
            let src_row = &src[sy * width..(sy + 1) * width];
            for kx in 0..size {
                let w = weights[ky * size + kx];
                if w == 0.0 {
                    continue;
                }
                let sx = (x as isize + kx as isize - half).unsigned_abs() % width;
                let s = src_row[sx];
                acc[0] += s[0] as f32 * w;
                acc[1] += s[1] as f32 * w;
                acc[2] += s[2] as f32 * w;
            }
        }
        *px = [clamp_u8(acc[0]), clamp_u8(acc[1]), clamp_u8(acc[2]), src[y * width + x][ALPHA]];
    });
    Ok(())
}

/// Box blur with window radius `level`, repeated `iterations` times.
///
/// `level == 0` or `iterations == 0` is the identity. Alpha is preserved.
pub fn box_blur(img: &mut Image, level: u32, iterations: u32) -> OpsResult<()> {
    if level == 0 || iterations == 0 || img.is_empty() {
        return Ok(());
    }
    trace!(width = img.width(), height = img.height(), level, iterations, "box_blur");

    let width = img.width() as usize;
    let radius = level as usize;
    let partitioner = RowPartitioner::new();
    for _ in 0..iterations {
        let src = img.pixels().to_vec();
        partitioner.for_each_rows(img.pixels_mut(), width, |rows, chunk| {
            blur_rows_horizontal(&src, chunk, rows.start, width, radius);
        });
        let src = img.pixels().to_vec();
        partitioner.for_each_rows(img.pixels_mut(), width, |rows, chunk| {
            blur_rows_vertical(&src, chunk, rows, width, radius);
        });
    }
    Ok(())
}

/// Horizontal pass over the rows held in `dst`, starting at row `first`.
fn blur_rows_horizontal(src: &[Pixel], dst: &mut [Pixel], first: usize, width: usize, radius: usize) {
    for (i, out) in dst.chunks_exact_mut(width).enumerate() {
        let row = &src[(first + i) * width..(first + i + 1) * width];
        let mut sum = [0u32; 3];
        for px in &row[..=radius.min(width - 1)] {
            add(&mut sum, px);
        }
        for x in 0..width {
            let lo = x.saturating_sub(radius);
            let hi = (x + radius).min(width - 1);
            let count = (hi - lo + 1) as u32;
            let a = out[x][ALPHA];
            out[x] = [
                (sum[0] / count) as u8,
                (sum[1] / count) as u8,
                (sum[2] / count) as u8,
                a,
            ];
            if x + radius + 1 < width {
                add(&mut sum, &row[x + radius + 1]);
            }
            if x >= radius {
                sub(&mut sum, &row[x - radius]);
            }
        }
    }
}

/// Vertical pass over rows `rows`; reads any row of `src`.
fn blur_rows_vertical(
    src: &[Pixel],
    dst: &mut [Pixel],
    rows: std::ops::Range<usize>,
    width: usize,
    radius: usize,
) {
    let height = src.len() / width;
    let mut sums = vec![[0u32; 3]; width];
    let window_start = rows.start.saturating_sub(radius);
    let window_end = (rows.start + radius).min(height - 1);
    for y in window_start..=window_end {
        for (sum, px) in sums.iter_mut().zip(&src[y * width..(y + 1) * width]) {
            add(sum, px);
        }
    }

    for (i, out) in dst.chunks_exact_mut(width).enumerate() {
        let y = rows.start + i;
        let lo = y.saturating_sub(radius);
        let hi = (y + radius).min(height - 1);
        let count = (hi - lo + 1) as u32;
        for (px, sum) in out.iter_mut().zip(&sums) {
            px[0] = (sum[0] / count) as u8;
            px[1] = (sum[1] / count) as u8;
            px[2] = (sum[2] / count) as u8;
        }
        if y + radius + 1 < height {
            let entering = &src[(y + radius + 1) * width..(y + radius + 2) * width];
            for (sum, px) in sums.iter_mut().zip(entering) {
                add(sum, px);
            }
        }
        if y >= radius {
            let leaving = &src[(y - radius) * width..(y - radius + 1) * width];
            for (sum, px) in sums.iter_mut().zip(leaving) {
                sub(sum, px);
            }
        }
    }
}

#[inline]
fn add(sum: &mut [u32; 3], px: &Pixel) {
    sum[0] += px[0] as u32;
    sum[1] += px[1] as u32;
    sum[2] += px[2] as u32;
}

#[inline]
fn sub(sum: &mut [u32; 3], px: &Pixel) {
    sum[0] -= px[0] as u32;
    sum[1] -= px[1] as u32;
    sum[2] -= px[2] as u32;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(w: u32, h: u32) -> Image {
        let data = (0..h)
            .flat_map(|y| (0..w).map(move |x| [(x * 10) as u8, (y * 10) as u8, 7, 200]))
            .collect();
        Image::from_data(w, h, data).unwrap()
    }

    #[test]
    fn test_normalization() {
        let k = Kernel::sharpen();
        let n = k.normalized_flipped();
        assert_eq!(n[4], 1.0);
        assert_eq!(n[1], -0.25);
        let sum: f32 = n.iter().sum();
        assert!(sum.abs() < 1e-6);
    }

    #[test]
    fn test_flip() {
        let k = Kernel::new(vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 3.0], 3, 3).unwrap();
        let n = k.normalized_flipped();
        assert_eq!(n[0], 0.75);
        assert_eq!(n[8], 0.25);
    }

    #[test]
    fn test_from_rows() {
        let k = Kernel::from_rows(&[[1.0f32]]).unwrap();
        assert_eq!(k, Kernel::identity());
        assert!(Kernel::from_rows(&[vec![1.0f32, 2.0], vec![3.0]]).is_err());
        assert!(Kernel::new(vec![1.0; 5], 2, 2).is_err());
    }

    #[test]
    fn test_identity_kernel() {
        let mut img = ramp(7, 5);
        let before = img.clone();
        convolve(&mut img, &Kernel::identity()).unwrap();
        assert_eq!(img.pixels(), before.pixels());
    }

    #[test]
    fn test_non_square_is_noop() {
        let mut img = ramp(6, 6);
        let before = img.clone();
        let k = Kernel::new(vec![1.0; 6], 3, 2).unwrap();
        convolve(&mut img, &k).unwrap();
        assert_eq!(img, before);
    }

    #[test]
    fn test_convolution_is_flipped() {
        // Weight at top-left after flip samples the bottom-right neighbour.
        let k = Kernel::new(vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0], 3, 3).unwrap();
        let mut img = ramp(5, 5);
        convolve(&mut img, &k).unwrap();
        // out(2,2) = src(1,1)
        assert_eq!(img.pixel(2, 2), [10, 10, 7, 200]);
    }

    #[test]
    fn test_edge_index_policy() {
        // Sample the left neighbour: at x = 0 it mirrors to x = 1.
        let k = Kernel::new(vec![0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0], 3, 3).unwrap();
        let mut img = ramp(4, 1);
        convolve(&mut img, &k).unwrap();
        assert_eq!(img.pixel(0, 0)[0], 10);
        assert_eq!(img.pixel(3, 0)[0], 20);

        // Sample the right neighbour: at x = w-1 it wraps to x = 0.
        let k = Kernel::new(vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0], 3, 3).unwrap();
        let mut img = ramp(4, 1);
        convolve(&mut img, &k).unwrap();
        assert_eq!(img.pixel(3, 0)[0], 0);
        assert_eq!(img.pixel(0, 0)[0], 10);
    }

    #[test]
    fn test_blur_level_zero_is_identity() {
        let mut img = ramp(9, 4);
        let before = img.clone();
        box_blur(&mut img, 0, 3).unwrap();
        assert_eq!(img, before);
    }

    #[test]
    fn test_blur_constant_field() {
        let mut img = Image::filled(13, 9, [31, 62, 93, 120]);
        box_blur(&mut img, 1, 1).unwrap();
        assert!(img.pixels().iter().all(|p| *p == [31, 62, 93, 120]));
        box_blur(&mut img, 4, 3).unwrap();
        assert!(img.pixels().iter().all(|p| *p == [31, 62, 93, 120]));
    }

    #[test]
    fn test_blur_asymmetric_edges() {
        let data = vec![[0, 0, 0, 255], [30, 0, 0, 255], [60, 0, 0, 255], [90, 0, 0, 255]];
        let mut img = Image::from_data(4, 1, data).unwrap();
        box_blur(&mut img, 1, 1).unwrap();
        let reds: Vec<u8> = img.pixels().iter().map(|p| p[0]).collect();
        // edges average 2 pixels, interior 3
        assert_eq!(reds, vec![15, 30, 60, 75]);
    }

    #[test]
    fn test_blur_matches_naive_window() {
        let mut img = ramp(11, 13);
        let src = img.clone();
        box_blur(&mut img, 2, 1).unwrap();

        let (w, h) = (11usize, 13usize);
        let mut tmp = vec![[0u8; 4]; w * h];
        for y in 0..h {
            for x in 0..w {
                let (lo, hi) = (x.saturating_sub(2), (x + 2).min(w - 1));
                let s: u32 = (lo..=hi).map(|i| src.pixels()[y * w + i][0] as u32).sum();
                tmp[y * w + x][0] = (s / (hi - lo + 1) as u32) as u8;
            }
        }
        for y in 0..h {
            for x in 0..w {
                let (lo, hi) = (y.saturating_sub(2), (y + 2).min(h - 1));
                let s: u32 = (lo..=hi).map(|j| tmp[j * w + x][0] as u32).sum();
                assert_eq!(img.pixel(x as u32, y as u32)[0], (s / (hi - lo + 1) as u32) as u8);
            }
        }
        assert!(img.pixels().iter().all(|p| p[ALPHA] == 200));
    }
}
