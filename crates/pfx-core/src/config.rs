//! Runtime configuration.
//!
//! Settings come from environment variables, with programmatic overrides for
//! front ends such as the CLI.
//!
//! # Environment Variables
//!
//! - `PFX_THREADS` - Number of row partitions per filter call (hardware concurrency)
//! - `PFX_GPU_ADAPTER` - Default GPU adapter index for `ComputeContext`
//! - `PFX_GPU_BACKEND` - Restrict GPU backends (`vulkan`, `metal`, `dx12`, `gl`)

use std::env;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Cache for detected hardware concurrency.
static HARDWARE_CONCURRENCY: OnceLock<usize> = OnceLock::new();

/// `PFX_THREADS`, read once.
static ENV_THREADS: OnceLock<Option<usize>> = OnceLock::new();

/// Programmatic concurrency override (0 = unset).
static CONCURRENCY_OVERRIDE: AtomicUsize = AtomicUsize::new(0);

/// Detected hardware concurrency, minimum 1.
pub fn hardware_concurrency() -> usize {
    *HARDWARE_CONCURRENCY.get_or_init(|| {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    })
}

/// Effective partition count.
///
/// Priority:
/// 1. [`set_concurrency`] override
/// 2. `PFX_THREADS`
/// 3. [`hardware_concurrency`]
pub fn concurrency() -> usize {
    let forced = CONCURRENCY_OVERRIDE.load(Ordering::Relaxed);
    if forced > 0 {
        return forced;
    }
    let env_threads = *ENV_THREADS.get_or_init(|| parse_threads(env::var("PFX_THREADS").ok().as_deref()));
    env_threads.unwrap_or_else(hardware_concurrency).max(1)
}

/// Overrides the partition count for the rest of the process. `0` clears it.
pub fn set_concurrency(n: usize) {
    CONCURRENCY_OVERRIDE.store(n, Ordering::Relaxed);
}

/// GPU adapter index from `PFX_GPU_ADAPTER`, default 0.
pub fn gpu_adapter() -> usize {
    env::var("PFX_GPU_ADAPTER")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

/// GPU backend restriction from `PFX_GPU_BACKEND`.
pub fn gpu_backend() -> Option<String> {
    env::var("PFX_GPU_BACKEND")
        .ok()
        .map(|v| v.trim().to_ascii_lowercase())
        .filter(|v| !v.is_empty())
}

fn parse_threads(value: Option<&str>) -> Option<usize> {
    value
        .and_then(|v| v.trim().parse().ok())
        .filter(|&n: &usize| n > 0)
}
