//! CLI command implementations

pub mod adapters;
pub mod convert;
pub mod filter;
pub mod info;

use anyhow::{Context, Result};
use pfx_core::Image;
use pfx_io::Format;
use std::path::Path;

/// Explicit format, else the one named by the file extension.
pub fn resolve_format(path: &Path, explicit: Option<Format>) -> Result<Format> {
    explicit.or_else(|| Format::from_path(path)).with_context(|| {
        format!(
            "Cannot tell the format of {} (use .ff/.irdump or pass the format explicitly)",
            path.display()
        )
    })
}

/// Load image from path
pub fn load_image(path: &Path, format: Option<Format>) -> Result<Image> {
    let format = resolve_format(path, format)?;
    format
        .read(path)
        .with_context(|| format!("Failed to load: {}", path.display()))
}

/// Save image to path
pub fn save_image(path: &Path, image: &Image, format: Option<Format>) -> Result<()> {
    let format = resolve_format(path, format)?;
    format
        .write(path, image)
        .with_context(|| format!("Failed to save: {}", path.display()))
}
