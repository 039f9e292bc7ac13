//! pfx - filter pipeline CLI for raw image dumps
//!
//! Reads and writes the farbfeld and irdump formats and runs ordered chains
//! of CPU or GPU filters over them.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "pfx")]
#[command(author, version, about = "Image filter pipeline for raw RGBA dumps")]
#[command(long_about = "
Runs ordered chains of image filters over farbfeld and irdump files.

Examples:
  pfx info image.ff                          # Size and mean colour
  pfx convert image.ff -o image.irdump       # Change dump format
  pfx filter in.ff -o out.ff --op invert --op blur=3x2
  pfx filter in.ff -o out.ff --op colorspace=hsv --op saturate=1.5 --op colorspace=rgb
  pfx filter in.ff -o out.ff --gpu --op sepia --op rot90
  pfx adapters                               # List GPU adapters
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Number of worker threads (0 = auto)
    #[arg(short = 'j', long, global = true, default_value = "0")]
    threads: usize,
}

#[derive(Subcommand)]
enum Commands {
    /// Show dimensions and mean colour
    #[command(visible_alias = "i")]
    Info(InfoArgs),

    /// Convert between dump formats
    #[command(visible_alias = "c")]
    Convert(ConvertArgs),

    /// Apply a chain of filters
    #[command(visible_alias = "f")]
    Filter(FilterArgs),

    /// List GPU adapters
    Adapters,
}

#[derive(Args)]
struct InfoArgs {
    /// Input files
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Input format (default: from extension)
    #[arg(short, long)]
    format: Option<pfx_io::Format>,
}

#[derive(Args)]
struct ConvertArgs {
    /// Input file
    input: PathBuf,

    /// Output file
    #[arg(short, long)]
    output: PathBuf,

    /// Input format (default: from extension)
    #[arg(long)]
    from: Option<pfx_io::Format>,

    /// Output format (default: from extension)
    #[arg(long)]
    to: Option<pfx_io::Format>,
}

#[derive(Args)]
struct FilterArgs {
    /// Input file
    input: PathBuf,

    /// Output file
    #[arg(short, long)]
    output: PathBuf,

    /// Filter to apply, in order. One of: invert, invert-alpha, only-alpha,
    /// grayscale, sepia, hue=<deg>, saturate=<mul>, blur=<level>[x<iter>],
    /// sharpen, edge, emboss, rot90, rot180, rot270, flip-h, flip-v,
    /// crop=x,y,w,h, colorspace=<rgb|hsv|ycbcr-jpeg|ycbcr-bt601>
    #[arg(long = "op", required = true)]
    ops: Vec<commands::filter::OpSpec>,

    /// Run colour filters on the GPU
    #[arg(long)]
    gpu: bool,

    /// GPU adapter index (default: PFX_GPU_ADAPTER or 0)
    #[arg(long, requires = "gpu")]
    adapter: Option<usize>,

    /// Input format (default: from extension)
    #[arg(long)]
    from: Option<pfx_io::Format>,

    /// Output format (default: from extension)
    #[arg(long)]
    to: Option<pfx_io::Format>,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Configure thread pool and row partitioning
    if cli.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(cli.threads)
            .build_global()
            .context("Failed to configure thread pool")?;
        pfx_core::config::set_concurrency(cli.threads);
    }

    match cli.command {
        Commands::Info(args) => commands::info::run(args, cli.verbose),
        Commands::Convert(args) => commands::convert::run(args, cli.verbose),
        Commands::Filter(args) => commands::filter::run(args, cli.verbose),
        Commands::Adapters => commands::adapters::run(),
    }
}
