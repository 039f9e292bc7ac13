//! Whole-image properties of the CPU filters.

use approx::assert_relative_eq;
use pfx_core::{ColorSpace, Image, RowPartitioner, partition_rows};
use pfx_ops::color::{self, AlphaMode, ColorMatrix};
use pfx_ops::colorspace::convert;
use pfx_ops::filter::{box_blur, convolve};
use pfx_ops::transform::crop;
use pfx_ops::{FilterChain, Kernel};

/// Every RGB triple on a grid with spacing `step`, fully opaque.
fn rgb_grid(step: usize) -> Image {
    let levels: Vec<u8> = (0..=255).step_by(step).map(|v| v as u8).collect();
    let n = levels.len();
    let mut data = Vec::with_capacity(n * n * n);
    for &r in &levels {
        for &g in &levels {
            for &b in &levels {
                data.push([r, g, b, 255]);
            }
        }
    }
    Image::from_data((n * n) as u32, n as u32, data).unwrap()
}

fn noise(w: u32, h: u32) -> Image {
    let mut state = 0x2545_f491u32;
    let data = (0..w * h)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state.to_le_bytes()
        })
        .collect();
    Image::from_data(w, h, data).unwrap()
}

fn max_channel_error(a: &Image, b: &Image) -> u8 {
    a.pixels()
        .iter()
        .zip(b.pixels())
        .flat_map(|(p, q)| (0..4).map(move |c| p[c].abs_diff(q[c])))
        .max()
        .unwrap_or(0)
}

#[test]
fn test_red_square_inverts_to_cyan() {
    let mut img = Image::filled(4, 4, [255, 0, 0, 255]);
    color::invert(&mut img, AlphaMode::Preserve).unwrap();
    assert!(img.pixels().iter().all(|p| *p == [0, 255, 255, 255]));
}

#[test]
fn test_invert_twice_is_identity() {
    for mode in [AlphaMode::Preserve, AlphaMode::Invert, AlphaMode::Only] {
        let original = noise(37, 23);
        let mut img = original.clone();
        color::invert(&mut img, mode).unwrap();
        color::invert(&mut img, mode).unwrap();
        assert_eq!(img, original);
    }
}

#[test]
fn test_ycbcr_jpeg_round_trip() {
    let original = rgb_grid(1);
    let mut img = original.clone();
    convert(&mut img, ColorSpace::YCbCrJpeg).unwrap();
    convert(&mut img, ColorSpace::Rgb).unwrap();
    assert!(max_channel_error(&img, &original) <= 1);
}

#[test]
fn test_ycbcr_bt601_round_trip() {
    // every RGB triple, including the ones plain rounding misses by 2
    let original = rgb_grid(1);
    let mut img = original.clone();
    convert(&mut img, ColorSpace::YCbCrBt601).unwrap();
    assert_eq!(img.colorspace(), ColorSpace::YCbCrBt601);
    convert(&mut img, ColorSpace::Rgb).unwrap();
    assert!(max_channel_error(&img, &original) <= 1);
}

#[test]
fn test_apply_mat_identity() {
    let original = noise(19, 31);
    let mut img = original.clone();
    color::apply_mat(&mut img, &ColorMatrix::IDENTITY).unwrap();
    assert_eq!(img, original);
}

#[test]
fn test_hue_rotate_full_turn() {
    let zero = ColorMatrix::hue_rotate(0.0);
    let full = ColorMatrix::hue_rotate(360.0);
    for i in 0..3 {
        for j in 0..3 {
            let expected = if i == j { 1.0 } else { 0.0 };
            assert_relative_eq!(zero.m[i][j], expected, epsilon = 1e-6);
            assert_relative_eq!(full.m[i][j], expected, epsilon = 1e-4);
        }
    }
}

#[test]
fn test_grayscale_weights_sum_to_one() {
    let gray = ColorMatrix::grayscale();
    for row in gray.m {
        assert_relative_eq!(row.iter().sum::<f32>(), 1.0, epsilon = 1e-6);
    }
    let mut img = Image::filled(3, 3, [90, 90, 90, 17]);
    color::grayscale(&mut img).unwrap();
    assert_eq!(img.pixel(2, 2), [90, 90, 90, 17]);
}

#[test]
fn test_box_blur_level_zero_is_identity() {
    let original = noise(16, 9);
    let mut img = original.clone();
    box_blur(&mut img, 0, 5).unwrap();
    assert_eq!(img, original);
}

#[test]
fn test_box_blur_constant_field() {
    let mut img = Image::filled(40, 25, [12, 34, 56, 78]);
    box_blur(&mut img, 7, 2).unwrap();
    assert!(img.pixels().iter().all(|p| *p == [12, 34, 56, 78]));
}

#[test]
fn test_box_blur_independent_of_partitioning() {
    let original = noise(33, 47);
    let mut a = original.clone();
    let mut b = original.clone();
    pfx_core::config::set_concurrency(1);
    box_blur(&mut a, 3, 2).unwrap();
    pfx_core::config::set_concurrency(7);
    box_blur(&mut b, 3, 2).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_unit_kernel_is_identity() {
    let original = noise(21, 14);
    let mut img = original.clone();
    let kernel = Kernel::from_rows(&[[1.0f32]]).unwrap();
    convolve(&mut img, &kernel).unwrap();
    assert_eq!(img, original);
}

#[test]
fn test_full_crop_is_identity() {
    let original = noise(12, 8);
    let mut img = original.clone();
    crop(&mut img, 0, 0, 12, 8).unwrap();
    assert_eq!(img, original);
}

#[test]
fn test_partitions_cover_every_row() {
    for height in [0usize, 1, 5, 480, 1081] {
        for concurrency in 1..=9 {
            let ranges = partition_rows(height, concurrency);
            assert_eq!(ranges.last().map(|r| r.end), Some(height));
            assert_eq!(ranges.iter().map(|r| r.len()).sum::<usize>(), height);
            assert!(ranges.windows(2).all(|w| w[0].end == w[1].start));
        }
    }
    assert_eq!(RowPartitioner::with_concurrency(0).concurrency(), 1);
}

#[test]
fn test_chain_over_frames() {
    let frames: Vec<Image> = (0..5u8).map(|i| Image::filled(6, 4, [i, 0, 0, 255])).collect();
    let mut out = vec![Image::new(1, 1); 5];

    let mut chain = FilterChain::new();
    chain
        .add(|img| color::invert(img, AlphaMode::Preserve))
        .add(|img| convert(img, ColorSpace::Hsv));
    chain.eval_frames(&frames, &mut out, 2, 4).unwrap();

    assert_eq!(out[1].dimensions(), (1, 1));
    assert_eq!(out[4].dimensions(), (1, 1));
    assert_eq!(out[2].colorspace(), ColorSpace::Hsv);
    assert_eq!(out[3].colorspace(), ColorSpace::Hsv);
}

#[test]
fn test_colorspace_preconditions() {
    let mut img = Image::new(2, 2).with_colorspace(ColorSpace::Hsv);
    assert!(color::sepia(&mut img).is_err());
    assert!(color::saturation(&mut img, 1.5).is_ok());

    let mut rgb = Image::new(2, 2);
    assert!(color::saturation(&mut rgb, 1.5).is_err());
}
