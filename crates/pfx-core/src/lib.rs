//! # pfx-core
//!
//! Core types for in-memory pixel processing.
//!
//! This crate provides the foundational types used by every other pixfx crate:
//!
//! - [`Image`] - Reference-counted RGBA8 buffer tagged with a [`ColorSpace`]
//! - [`ImageView`], [`ImageViewMut`] - Borrowed rectangular windows onto a buffer
//! - [`Rect`] - Region type used by views and crops
//! - [`RowPartitioner`] - Splits `[0, height)` into per-worker row ranges and
//!   runs a kernel over them fork-join style
//! - [`config`] - Environment driven runtime settings
//!
//! ## Crate Structure
//!
//! ```text
//! pfx-core (this crate)
//!    ^
//!    |
//!    +-- pfx-ops (CPU filter kernels, FilterChain)
//!    |      ^
//!    |      +-- pfx-gpu (compute context, GPU filters)
//!    +-- pfx-io (farbfeld / irdump dumps)
//! ```
//!
//! ## Pixel Layout
//!
//! Every pixel is four bytes. The first three are interpreted according to the
//! owning image's colour space tag (R,G,B / H,S,V / Y,Cb,Cr); the fourth is
//! always alpha.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod colorspace;
pub mod config;
pub mod error;
pub mod image;
pub mod partition;
pub mod pixel;
pub mod rect;

// Re-exports for convenience
pub use colorspace::ColorSpace;
pub use error::{Error, Result};
pub use image::{Image, ImageView, ImageViewMut};
pub use partition::{partition_rows, RowPartitioner};
pub use pixel::{Pixel, ALPHA};
pub use rect::Rect;

/// Prelude module for convenient imports.
///
/// ```
/// use pfx_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::colorspace::ColorSpace;
    pub use crate::error::{Error, Result};
    pub use crate::image::{Image, ImageView, ImageViewMut};
    pub use crate::partition::RowPartitioner;
    pub use crate::pixel::{Pixel, ALPHA};
    pub use crate::rect::Rect;
}
