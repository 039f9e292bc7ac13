//! # pfx-ops
//!
//! CPU filter kernels for RGBA8 images.
//!
//! Every filter runs fork-join over the image rows: the rows are split by a
//! [`RowPartitioner`](pfx_core::RowPartitioner), one task runs per range and
//! the call returns once all of them are done.
//!
//! # Modules
//!
//! - [`color`] - Colour matrices (grayscale, sepia, hue rotation), invert, saturation
//! - [`colorspace`] - RGB / HSV / YCbCr conversion state machine
//! - [`filter`] - Sliding-window box blur and kernel convolution
//! - [`transform`] - Rotation, mirroring, crop
//! - [`composite`] - Opacity-weighted blend of two images
//! - [`chain`] - Ordered, lazily evaluated filter lists
//!
//! # Example
//!
//! ```rust
//! use pfx_core::Image;
//! use pfx_ops::{FilterChain, color::{self, AlphaMode}, filter};
//!
//! let src = Image::filled(16, 16, [200, 40, 40, 255]);
//! let mut dst = Image::new(1, 1);
//!
//! let mut chain = FilterChain::new();
//! chain.add(|img| color::invert(img, AlphaMode::Preserve));
//! chain.add(|img| filter::box_blur(img, 2, 1));
//! chain.eval(&src, &mut dst).unwrap();
//!
//! assert_eq!(dst.pixel(0, 0), [55, 215, 215, 255]);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
pub mod chain;
pub mod color;
pub mod colorspace;
pub mod composite;
pub mod filter;
pub mod transform;

pub use chain::FilterChain;
pub use color::{AlphaMode, ColorMatrix};
pub use error::{OpsError, OpsResult};
pub use filter::Kernel;
pub use transform::Rotation;
