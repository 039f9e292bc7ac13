//! Ordered filter lists.
//!
//! A [`FilterChain`] stores filter calls with their parameters already bound
//! and runs them in insertion order when evaluated. Nothing runs at
//! [`add`](FilterChain::add) time.
//!
//! Each filter reads and writes the same buffer. A filter that changes the
//! image size (rotation by 90°, crop) passes the new size on to the next one;
//! the chain does not check geometry between steps.
//!
//! ```rust
//! use pfx_core::Image;
//! use pfx_ops::{color, FilterChain};
//!
//! let frames = vec![Image::filled(2, 2, [0, 0, 0, 255]); 3];
//! let mut out = vec![Image::new(1, 1); 3];
//!
//! let mut chain = FilterChain::new();
//! chain.add(|img| color::invert(img, color::AlphaMode::Preserve));
//! chain.eval_frames(&frames, &mut out, 1, 0).unwrap();
//!
//! assert_eq!(out[0].dimensions(), (1, 1));
//! assert_eq!(out[2].pixel(0, 0), [255, 255, 255, 255]);
//! ```

use crate::OpsError;
use pfx_core::Image;
use tracing::trace;

type Filter<'a, E> = Box<dyn Fn(&mut Image) -> Result<(), E> + 'a>;

/// Lazily evaluated, ordered list of filters.
///
/// `E` is the error type the filters return; the CLI chains CPU and GPU
/// filters with `anyhow::Error`.
pub struct FilterChain<'a, E = OpsError> {
    filters: Vec<Filter<'a, E>>,
}

impl<E> Default for FilterChain<'_, E> {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
        }
    }
}

impl<E> std::fmt::Debug for FilterChain<'_, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterChain")
            .field("len", &self.filters.len())
            .finish()
    }
}

impl<'a, E> FilterChain<'a, E> {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a filter.
    pub fn add<F>(&mut self, filter: F) -> &mut Self
    where
        F: Fn(&mut Image) -> Result<(), E> + 'a,
    {
        self.filters.push(Box::new(filter));
        self
    }

    /// Removes the most recently added filter. Returns `false` if empty.
    pub fn pop(&mut self) -> bool {
        self.filters.pop().is_some()
    }

    /// Number of filters.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Returns `true` if no filters were added.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Copies `src` into `dst`, then applies every filter to `dst`.
    ///
    /// An empty chain is a plain copy.
    pub fn eval(&self, src: &Image, dst: &mut Image) -> Result<(), E> {
        dst.copy_from(src);
        self.eval_in_place(dst)
    }

    /// Applies every filter directly to `img`.
    pub fn eval_in_place(&self, img: &mut Image) -> Result<(), E> {
        trace!(filters = self.filters.len(), width = img.width(), height = img.height(), "eval chain");
        for filter in &self.filters {
            filter(img)?;
        }
        Ok(())
    }

    /// Runs [`eval`](Self::eval) on frames `[start, end)`.
    ///
    /// `end == 0` means through the last frame. `end` is clamped to the
    /// shorter of the two sequences; `end <= start` does nothing.
    pub fn eval_frames(&self, src: &[Image], dst: &mut [Image], start: usize, end: usize) -> Result<(), E> {
        let end = frame_end(end, src.len().min(dst.len()));
        if end <= start {
            return Ok(());
        }
        for (s, d) in src[start..end].iter().zip(&mut dst[start..end]) {
            self.eval(s, d)?;
        }
        Ok(())
    }

    /// Runs [`eval_in_place`](Self::eval_in_place) on frames `[start, end)`.
    pub fn eval_frames_in_place(&self, frames: &mut [Image], start: usize, end: usize) -> Result<(), E> {
        let end = frame_end(end, frames.len());
        if end <= start {
            return Ok(());
        }
        for frame in &mut frames[start..end] {
            self.eval_in_place(frame)?;
        }
        Ok(())
    }
}

fn frame_end(end: usize, len: usize) -> usize {
    if end == 0 { len } else { end.min(len) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{self, AlphaMode};
    use crate::transform;
    use std::cell::Cell;

    #[test]
    fn test_empty_chain_copies() {
        let src = Image::filled(3, 2, [9, 8, 7, 6]);
        let mut dst = Image::new(1, 1);
        let chain: FilterChain = FilterChain::new();
        assert!(chain.is_empty());
        chain.eval(&src, &mut dst).unwrap();
        assert_eq!(dst, src);
    }

    #[test]
    fn test_filters_run_in_order() {
        let mut chain = FilterChain::new();
        chain
            .add(|img| {
                img.fill([10, 0, 0, 255]);
                Ok::<_, OpsError>(())
            })
            .add(|img| color::invert(img, AlphaMode::Preserve));
        assert_eq!(chain.len(), 2);

        let mut img = Image::new(2, 2);
        chain.eval_in_place(&mut img).unwrap();
        assert_eq!(img.pixel(1, 1), [245, 255, 255, 255]);
    }

    #[test]
    fn test_pop_removes_last() {
        let mut chain = FilterChain::new();
        chain.add(|img| color::invert(img, AlphaMode::Preserve));
        chain.add(transform::rotate_180);
        assert!(chain.pop());
        assert!(chain.pop());
        assert!(!chain.pop());
        assert!(chain.is_empty());
    }

    #[test]
    fn test_lazy_until_eval() {
        let calls = Cell::new(0);
        let mut chain = FilterChain::new();
        chain.add(|_img| {
            calls.set(calls.get() + 1);
            Ok::<_, OpsError>(())
        });
        assert_eq!(calls.get(), 0);
        let mut frames = vec![Image::new(1, 1); 4];
        chain.eval_frames_in_place(&mut frames, 0, 0).unwrap();
        assert_eq!(calls.get(), 4);
        chain.eval_frames_in_place(&mut frames, 1, 3).unwrap();
        assert_eq!(calls.get(), 6);
        chain.eval_frames_in_place(&mut frames, 3, 2).unwrap();
        assert_eq!(calls.get(), 6);
        chain.eval_frames_in_place(&mut frames, 2, 100).unwrap();
        assert_eq!(calls.get(), 8);
    }

    #[test]
    fn test_error_stops_chain() {
        let mut chain = FilterChain::new();
        chain
            .add(|img| transform::crop(img, 0, 0, 10, 10))
            .add(|img| {
                img.fill([1, 1, 1, 1]);
                Ok(())
            });
        let mut img = Image::new(4, 4);
        assert!(chain.eval_in_place(&mut img).is_err());
        assert_eq!(img.pixel(0, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn test_geometry_flows_through() {
        let mut chain = FilterChain::new();
        chain
            .add(|img| transform::crop(img, 0, 0, 4, 2))
            .add(transform::rotate_90);
        let src = Image::new(8, 8);
        let mut dst = Image::new(1, 1);
        chain.eval(&src, &mut dst).unwrap();
        assert_eq!(dst.dimensions(), (2, 4));
    }
}
