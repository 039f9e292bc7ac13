//! GPU colour filters for pixfx.
//!
//! Runs the per-pixel colour kernels of `pfx-ops` as wgpu compute shaders.
//! Results match the CPU filters up to one level of rounding per channel.
//!
//! # Architecture
//!
//! ```text
//! ComputeContext (adapter, device, queue, pipeline cache)
//!     └── ops::{apply_mat, grayscale, sepia, hue_rotate, rgb_to_hsv, hsv_to_rgb, convert}
//!             └── stage -> bind -> dispatch -> wait -> read back
//! ```
//!
//! There is no global context. Create one [`ComputeContext`] and pass it to
//! every filter call; each call blocks until its result is back in the
//! [`Image`](pfx_core::Image).
//!
//! # Example
//!
//! ```ignore
//! use pfx_core::Image;
//! use pfx_gpu::{ComputeContext, ops};
//!
//! let ctx = ComputeContext::new()?;
//! let mut img = Image::filled(640, 480, [200, 100, 50, 255]);
//! ops::sepia(&ctx, &mut img)?;
//! ```

pub mod context;
pub mod ops;
mod shaders;

pub use context::{adapters, ComputeContext, ContextOptions};

use thiserror::Error;

/// GPU operation errors
#[derive(Error, Debug)]
pub enum GpuError {
    /// No adapter on the selected backends.
    #[error("No GPU adapter found")]
    NoAdapter,

    /// Adapter index out of range, or no GPU-class adapter at all.
    #[error("GPU device {index} not available ({available} GPU adapters found)")]
    NoDevice {
        /// Requested adapter index.
        index: usize,
        /// Number of GPU adapters found.
        available: usize,
    },

    /// Device or queue request failed.
    #[error("Failed to create device: {0}")]
    DeviceCreation(String),

    /// Kernel source failed validation; holds the compiler log.
    #[error("Failed to compile shader:\n{0}")]
    ShaderCompilation(String),

    /// No pipeline registered under this name.
    #[error("Unknown kernel: {0}")]
    UnknownKernel(String),

    /// Reading the result buffer back failed.
    #[error("Buffer map failed: {0}")]
    BufferMap(String),

    /// Image model error (colour space precondition and the like).
    #[error(transparent)]
    Core(#[from] pfx_core::Error),
}

/// Result type for GPU operations.
pub type GpuResult<T> = Result<T, GpuError>;
