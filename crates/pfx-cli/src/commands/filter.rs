//! Filter command
//!
//! Parses `--op` specs into a [`FilterChain`] and evaluates it once over the
//! input. With `--gpu` the colour filters (grayscale, sepia, hue, colour
//! space conversion) run on the selected adapter; everything else stays on
//! the CPU.

use crate::FilterArgs;
use anyhow::{Context, Result};
use pfx_core::{ColorSpace, Image};
use pfx_gpu::{ComputeContext, ContextOptions};
use pfx_ops::color::{self, AlphaMode};
use pfx_ops::{colorspace, filter, transform, FilterChain, Kernel, Rotation};
use std::str::FromStr;
use tracing::{info, trace};

/// One parsed `--op` value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OpSpec {
    Invert(AlphaMode),
    Grayscale,
    Sepia,
    Hue(f32),
    Saturate(f32),
    Blur { level: u32, iterations: u32 },
    Sharpen,
    Edge,
    Emboss,
    Rotate(Rotation),
    FlipH,
    FlipV,
    Crop { x: u32, y: u32, w: u32, h: u32 },
    Convert(ColorSpace),
}

impl FromStr for OpSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, value) = match s.split_once('=') {
            Some((n, v)) => (n.trim(), Some(v.trim())),
            None => (s.trim(), None),
        };

        let op = match name.to_ascii_lowercase().as_str() {
            "invert" => Self::Invert(AlphaMode::Preserve),
            "invert-alpha" => Self::Invert(AlphaMode::Invert),
            "only-alpha" => Self::Invert(AlphaMode::Only),
            "grayscale" | "gray" => Self::Grayscale,
            "sepia" => Self::Sepia,
            "hue" => Self::Hue(number(name, need(name, value)?)?),
            "saturate" => Self::Saturate(number(name, need(name, value)?)?),
            "blur" => {
                let v = need(name, value)?;
                let (level, iterations) = v.split_once('x').unwrap_or((v, "1"));
                let int = |t: &str| t.parse::<u32>().map_err(|_| format!("blur: bad value '{v}'"));
                Self::Blur {
                    level: int(level)?,
                    iterations: int(iterations)?,
                }
            }
            "sharpen" => Self::Sharpen,
            "edge" => Self::Edge,
            "emboss" => Self::Emboss,
            "rot90" => Self::Rotate(Rotation::Deg90),
            "rot180" => Self::Rotate(Rotation::Deg180),
            "rot270" => Self::Rotate(Rotation::Deg270),
            "rotate" => Self::Rotate(need(name, value)?.parse()?),
            "flip-h" => Self::FlipH,
            "flip-v" => Self::FlipV,
            "crop" => {
                let v = need(name, value)?;
                let parts = v
                    .split(',')
                    .map(|t| t.trim().parse::<u32>())
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|_| format!("crop: bad value '{v}'"))?;
                let [x, y, w, h] = parts[..] else {
                    return Err(format!("crop needs x,y,w,h, got '{v}'"));
                };
                Self::Crop { x, y, w, h }
            }
            "colorspace" | "cs" => Self::Convert(need(name, value)?.parse()?),
            other => return Err(format!("unknown op '{other}'")),
        };
        Ok(op)
    }
}

fn need<'v>(name: &str, value: Option<&'v str>) -> Result<&'v str, String> {
    value.ok_or_else(|| format!("'{name}' needs a value ({name}=...)"))
}

fn number(name: &str, value: &str) -> Result<f32, String> {
    value
        .parse::<f32>()
        .map_err(|_| format!("'{name}': bad number '{value}'"))
}

/// Appends `op` to `chain`, on the GPU when `gpu` is set and the op has a kernel.
pub fn add_op<'a>(chain: &mut FilterChain<'a, anyhow::Error>, op: OpSpec, gpu: Option<&'a ComputeContext>) {
    use pfx_gpu::ops as gpu_ops;

    match (op, gpu) {
        (OpSpec::Grayscale, Some(ctx)) => chain.add(move |img| Ok(gpu_ops::grayscale(ctx, img)?)),
        (OpSpec::Sepia, Some(ctx)) => chain.add(move |img| Ok(gpu_ops::sepia(ctx, img)?)),
        (OpSpec::Hue(deg), Some(ctx)) => chain.add(move |img| Ok(gpu_ops::hue_rotate(ctx, img, deg)?)),
        (OpSpec::Convert(cs), Some(ctx)) => chain.add(move |img| Ok(gpu_ops::convert(ctx, img, cs)?)),
        (OpSpec::Invert(mode), _) => chain.add(move |img| Ok(color::invert(img, mode)?)),
        (OpSpec::Grayscale, None) => chain.add(|img| Ok(color::grayscale(img)?)),
        (OpSpec::Sepia, None) => chain.add(|img| Ok(color::sepia(img)?)),
        (OpSpec::Hue(deg), None) => chain.add(move |img| Ok(color::hue_rotate(img, deg)?)),
        (OpSpec::Saturate(mul), _) => chain.add(move |img| Ok(color::saturation(img, mul)?)),
        (OpSpec::Blur { level, iterations }, _) => {
            chain.add(move |img| Ok(filter::box_blur(img, level, iterations)?))
        }
        (OpSpec::Sharpen, _) => chain.add(|img| Ok(filter::convolve(img, &Kernel::sharpen())?)),
        (OpSpec::Edge, _) => chain.add(|img| Ok(filter::convolve(img, &Kernel::edge_detect())?)),
        (OpSpec::Emboss, _) => chain.add(|img| Ok(filter::convolve(img, &Kernel::emboss())?)),
        (OpSpec::Rotate(r), _) => chain.add(move |img| Ok(transform::rotate(img, r)?)),
        (OpSpec::FlipH, _) => chain.add(|img| Ok(transform::flip_h(img)?)),
        (OpSpec::FlipV, _) => chain.add(|img| Ok(transform::flip_v(img)?)),
        (OpSpec::Crop { x, y, w, h }, _) => chain.add(move |img| Ok(transform::crop(img, x, y, w, h)?)),
        (OpSpec::Convert(cs), None) => chain.add(move |img| Ok(colorspace::convert(img, cs)?)),
    };
}

pub fn run(args: FilterArgs, verbose: u8) -> Result<()> {
    trace!(input = %args.input.display(), ops = args.ops.len(), gpu = args.gpu, "filter::run");

    let src = super::load_image(&args.input, args.from)?;

    let ctx = if args.gpu {
        let mut options = ContextOptions::default();
        if let Some(index) = args.adapter {
            options = options.with_adapter(index);
        }
        let ctx = ComputeContext::with_options(options).context("Failed to set up GPU")?;
        info!(adapter = %ctx.adapter_info().name, "Using GPU");
        Some(ctx)
    } else {
        None
    };

    let mut chain = FilterChain::new();
    for &op in &args.ops {
        add_op(&mut chain, op, ctx.as_ref());
    }

    if verbose > 0 {
        println!(
            "Applying {} filter(s) to {} ({}x{})",
            chain.len(),
            args.input.display(),
            src.width(),
            src.height()
        );
    }

    let mut dst = Image::new(0, 0);
    chain.eval(&src, &mut dst).context("Filter chain failed")?;

    super::save_image(&args.output, &dst, args.to)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_ops() {
        assert_eq!("invert".parse::<OpSpec>(), Ok(OpSpec::Invert(AlphaMode::Preserve)));
        assert_eq!("only-alpha".parse::<OpSpec>(), Ok(OpSpec::Invert(AlphaMode::Only)));
        assert_eq!("rot270".parse::<OpSpec>(), Ok(OpSpec::Rotate(Rotation::Deg270)));
        assert_eq!("rotate=90".parse::<OpSpec>(), Ok(OpSpec::Rotate(Rotation::Deg90)));
        assert_eq!("flip-v".parse::<OpSpec>(), Ok(OpSpec::FlipV));
    }

    #[test]
    fn test_parse_values() {
        assert_eq!("hue=45".parse::<OpSpec>(), Ok(OpSpec::Hue(45.0)));
        assert_eq!("saturate=1.5".parse::<OpSpec>(), Ok(OpSpec::Saturate(1.5)));
        assert_eq!("blur=3".parse::<OpSpec>(), Ok(OpSpec::Blur { level: 3, iterations: 1 }));
        assert_eq!("blur=2x4".parse::<OpSpec>(), Ok(OpSpec::Blur { level: 2, iterations: 4 }));
        assert_eq!(
            "crop=1, 2, 30, 40".parse::<OpSpec>(),
            Ok(OpSpec::Crop { x: 1, y: 2, w: 30, h: 40 })
        );
        assert_eq!(
            "colorspace=ycbcr-bt601".parse::<OpSpec>(),
            Ok(OpSpec::Convert(ColorSpace::YCbCrBt601))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!("hue".parse::<OpSpec>().is_err());
        assert!("blur=ax2".parse::<OpSpec>().is_err());
        assert!("crop=1,2,3".parse::<OpSpec>().is_err());
        assert!("colorspace=cmyk".parse::<OpSpec>().is_err());
        assert!("explode".parse::<OpSpec>().is_err());
    }

    #[test]
    fn test_cpu_chain_from_specs() {
        let mut chain = FilterChain::new();
        for spec in ["invert", "colorspace=hsv", "saturate=0", "colorspace=rgb", "rot90"] {
            add_op(&mut chain, spec.parse().unwrap(), None);
        }
        assert_eq!(chain.len(), 5);

        let src = Image::filled(3, 2, [255, 0, 0, 255]);
        let mut dst = Image::new(0, 0);
        chain.eval(&src, &mut dst).unwrap();
        // cyan with saturation removed is white
        assert_eq!(dst.dimensions(), (2, 3));
        assert_eq!(dst.pixel(0, 0), [255, 255, 255, 255]);
        assert_eq!(dst.colorspace(), ColorSpace::Rgb);
    }

    #[test]
    fn test_saturate_needs_hsv() {
        let mut chain = FilterChain::new();
        add_op(&mut chain, "saturate=2".parse().unwrap(), None);
        let mut img = Image::new(2, 2);
        assert!(chain.eval_in_place(&mut img).is_err());
    }
}
