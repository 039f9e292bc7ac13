//! Row partitioning and fork-join dispatch.
//!
//! Every CPU filter splits its output rows into disjoint contiguous ranges,
//! one per worker, runs the kernel on each range concurrently and returns
//! only once all of them have finished. Kernels write only the rows of their
//! own range, so no locking is needed.
//!
//! ```rust
//! use pfx_core::partition_rows;
//!
//! let parts = partition_rows(10, 3);
//! assert_eq!(parts, vec![0..3, 3..6, 6..10]);
//! ```

use crate::{Pixel, config};
use std::ops::Range;
use tracing::trace;

/// Splits `[0, height)` into `concurrency` contiguous ranges.
///
/// Each range holds `height / concurrency` rows; the last one also absorbs
/// the remainder. Ranges may be empty when `height < concurrency`.
/// A `concurrency` of 0 is treated as 1.
pub fn partition_rows(height: usize, concurrency: usize) -> Vec<Range<usize>> {
    let parts = concurrency.max(1);
    let rows_per_thread = height / parts;
    (0..parts)
        .map(|i| {
            let start = i * rows_per_thread;
            let end = if i + 1 == parts {
                height
            } else {
                start + rows_per_thread
            };
            start..end
        })
        .collect()
}

/// Splits images into row ranges and runs kernels over them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowPartitioner {
    concurrency: usize,
}

impl Default for RowPartitioner {
    fn default() -> Self {
        Self::new()
    }
}

impl RowPartitioner {
    /// Partitioner using the configured concurrency (see [`config::concurrency`]).
    pub fn new() -> Self {
        Self::with_concurrency(config::concurrency())
    }

    /// Partitioner with a fixed worker count (minimum 1).
    pub fn with_concurrency(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
        }
    }

    /// Worker count.
    #[inline]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Row ranges for an image of `height` rows.
    pub fn ranges(&self, height: usize) -> Vec<Range<usize>> {
        partition_rows(height, self.concurrency)
    }

    /// Runs `kernel` once per non-empty row range.
    ///
    /// `dst` is a row-major buffer of `width` pixels per row. Each call gets
    /// its row range and the matching disjoint slice of `dst`. Blocks until
    /// every call has returned.
    pub fn for_each_rows<F>(&self, dst: &mut [Pixel], width: usize, kernel: F)
    where
        F: Fn(Range<usize>, &mut [Pixel]) + Sync,
    {
        if width == 0 || dst.is_empty() {
            return;
        }
        let height = dst.len() / width;
        let ranges = self.ranges(height);
        trace!(height, width, parts = ranges.len(), "dispatch rows");

        let kernel = &kernel;
        rayon::scope(|scope| {
            let mut rest = dst;
            for range in ranges {
                let (chunk, tail) = std::mem::take(&mut rest).split_at_mut(range.len() * width);
                rest = tail;
                if range.is_empty() {
                    continue;
                }
                scope.spawn(move |_| kernel(range, chunk));
            }
        });
    }

    /// Runs `kernel` on every pixel of `dst`, passing (x, y) and the pixel.
    pub fn for_each_pixel<F>(&self, dst: &mut [Pixel], width: usize, kernel: F)
    where
        F: Fn(usize, usize, &mut Pixel) + Sync,
    {
        self.for_each_rows(dst, width, |rows, chunk| {
            for (i, row) in chunk.chunks_exact_mut(width).enumerate() {
                let y = rows.start + i;
                for (x, px) in row.iter_mut().enumerate() {
                    kernel(x, y, px);
                }
            }
        });
    }
}
