//! Info command

use crate::InfoArgs;
use anyhow::Result;
use pfx_core::{Image, Pixel};
use rayon::prelude::*;
use tracing::trace;

pub fn run(args: InfoArgs, verbose: u8) -> Result<()> {
    for path in &args.inputs {
        trace!(input = %path.display(), "info::run");
        let format = super::resolve_format(path, args.format)?;
        let image = super::load_image(path, Some(format))?;
        let [r, g, b, a] = mean_rgba(&image);

        println!("{}", path.display());
        println!("  format:     {format}");
        println!("  size:       {}x{}", image.width(), image.height());
        println!("  pixels:     {}", image.pixel_count());
        println!("  mean rgba:  {r:.2} {g:.2} {b:.2} {a:.2}");
        if verbose > 0 {
            let bytes = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
            println!("  file bytes: {bytes}");
        }
    }
    Ok(())
}

/// Mean of each channel; zeros for an empty image.
pub fn mean_rgba(image: &Image) -> [f64; 4] {
    let count = image.pixel_count();
    if count == 0 {
        return [0.0; 4];
    }
    let sums = image
        .pixels()
        .par_chunks(4096)
        .map(|chunk| chunk.iter().fold([0u64; 4], add))
        .reduce(|| [0u64; 4], |a, b| [a[0] + b[0], a[1] + b[1], a[2] + b[2], a[3] + b[3]]);
    sums.map(|s| s as f64 / count as f64)
}

fn add(mut acc: [u64; 4], px: &Pixel) -> [u64; 4] {
    for (a, &c) in acc.iter_mut().zip(px) {
        *a += u64::from(c);
    }
    acc
}
