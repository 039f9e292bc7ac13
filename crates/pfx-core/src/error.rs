//! Error types for pfx-core operations.
//!
//! Covers the caller-visible failures of the image model:
//! - Bounds checks on pixel, row and view access
//! - Dimension validation when wrapping external pixel data
//! - Colour space preconditions of filters that need a specific tag
//!
//! Allocation failure is not represented here: it aborts the process.

use crate::ColorSpace;
use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the image model.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Pixel coordinates are outside image bounds.
    #[error("pixel ({x}, {y}) out of bounds for image {width}x{height}")]
    OutOfBounds {
        /// X coordinate that was out of bounds
        x: u32,
        /// Y coordinate that was out of bounds
        y: u32,
        /// Image width
        width: u32,
        /// Image height
        height: u32,
    },

    /// Row index is outside image bounds.
    #[error("row {y} out of bounds for image height {height}")]
    RowOutOfBounds {
        /// Requested row
        y: u32,
        /// Image height
        height: u32,
    },

    /// Region extends beyond image bounds.
    #[error("region ({rx}, {ry}, {rw}x{rh}) exceeds image bounds {width}x{height}")]
    InvalidRegion {
        /// Region X origin
        rx: u32,
        /// Region Y origin
        ry: u32,
        /// Region width
        rw: u32,
        /// Region height
        rh: u32,
        /// Image width
        width: u32,
        /// Image height
        height: u32,
    },

    /// Invalid image dimensions or buffer length.
    #[error("invalid dimensions: {width}x{height} ({reason})")]
    InvalidDimensions {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
        /// Reason why dimensions are invalid
        reason: String,
    },

    /// Image dimensions don't match for the operation.
    #[error("dimension mismatch: {a_width}x{a_height} vs {b_width}x{b_height}")]
    DimensionMismatch {
        /// First image width
        a_width: u32,
        /// First image height
        a_height: u32,
        /// Second image width
        b_width: u32,
        /// Second image height
        b_height: u32,
    },

    /// A filter was applied to a buffer with the wrong colour space tag.
    #[error("{op} requires {expected} input, image is {actual}")]
    ColorSpaceMismatch {
        /// Operation name
        op: &'static str,
        /// Required colour space
        expected: ColorSpace,
        /// Tag found on the image
        actual: ColorSpace,
    },
}

impl Error {
    /// Creates an [`Error::OutOfBounds`] error.
    #[inline]
    pub fn out_of_bounds(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self::OutOfBounds {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates an [`Error::InvalidRegion`] error.
    #[inline]
    pub fn invalid_region(rx: u32, ry: u32, rw: u32, rh: u32, width: u32, height: u32) -> Self {
        Self::InvalidRegion {
            rx,
            ry,
            rw,
            rh,
            width,
            height,
        }
    }

    /// Creates an [`Error::InvalidDimensions`] error.
    #[inline]
    pub fn invalid_dimensions(width: u32, height: u32, reason: impl Into<String>) -> Self {
        Self::InvalidDimensions {
            width,
            height,
            reason: reason.into(),
        }
    }

    /// Creates an [`Error::DimensionMismatch`] error.
    #[inline]
    pub fn dimension_mismatch(a: (u32, u32), b: (u32, u32)) -> Self {
        Self::DimensionMismatch {
            a_width: a.0,
            a_height: a.1,
            b_width: b.0,
            b_height: b.1,
        }
    }

    /// Creates an [`Error::ColorSpaceMismatch`] error.
    #[inline]
    pub fn colorspace_mismatch(op: &'static str, expected: ColorSpace, actual: ColorSpace) -> Self {
        Self::ColorSpaceMismatch {
            op,
            expected,
            actual,
        }
    }

    /// Returns `true` if this is a bounds-related error.
    #[inline]
    pub fn is_bounds_error(&self) -> bool {
        matches!(
            self,
            Self::OutOfBounds { .. } | Self::RowOutOfBounds { .. } | Self::InvalidRegion { .. }
        )
    }
}

/// Checks that `image` carries the colour space tag `expected`.
///
/// Used by filters whose kernels only make sense for one interpretation of
/// the pixel bytes.
#[inline]
pub fn ensure_colorspace(op: &'static str, actual: ColorSpace, expected: ColorSpace) -> Result<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(Error::colorspace_mismatch(op, expected, actual))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_bounds() {
        let err = Error::out_of_bounds(100, 50, 80, 60);
        let msg = err.to_string();
        assert!(msg.contains("100"));
        assert!(msg.contains("80x60"));
        assert!(err.is_bounds_error());
    }

    #[test]
    fn test_colorspace_mismatch() {
        let err = ensure_colorspace("saturation", ColorSpace::Rgb, ColorSpace::Hsv).unwrap_err();
        assert_eq!(err.to_string(), "saturation requires hsv input, image is rgb");
        assert!(!err.is_bounds_error());
        assert!(ensure_colorspace("saturation", ColorSpace::Hsv, ColorSpace::Hsv).is_ok());
    }

    #[test]
    fn test_dimension_mismatch() {
        let err = Error::dimension_mismatch((100, 100), (200, 200));
        let msg = err.to_string();
        assert!(msg.contains("100x100"));
        assert!(msg.contains("200x200"));
    }
}
