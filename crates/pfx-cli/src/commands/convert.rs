//! Convert command

use crate::ConvertArgs;
use anyhow::Result;
use tracing::{info, trace};

pub fn run(args: ConvertArgs, verbose: u8) -> Result<()> {
    trace!(input = %args.input.display(), output = %args.output.display(), "convert::run");

    let from = super::resolve_format(&args.input, args.from)?;
    let to = super::resolve_format(&args.output, args.to)?;
    let image = super::load_image(&args.input, Some(from))?;

    info!(%from, %to, w = image.width(), h = image.height(), "Converting");
    if verbose > 0 {
        println!("Converting {} ({from}) -> {} ({to})", args.input.display(), args.output.display());
    }

    super::save_image(&args.output, &image, Some(to))?;
    Ok(())
}
