//! Error types for dump I/O.

use std::io;
use thiserror::Error;

/// I/O operation error.
#[derive(Debug, Error)]
pub enum IoError {
    /// File I/O error, including truncated payloads.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid or corrupted file.
    #[error("invalid file: {0}")]
    InvalidFile(String),

    /// Header dimensions that cannot describe a buffer on this machine.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions {
        /// Width from the header.
        width: u32,
        /// Height from the header.
        height: u32,
    },

    /// Image model error.
    #[error(transparent)]
    Core(#[from] pfx_core::Error),
}

impl IoError {
    /// Returns `true` when the input ended before the payload did.
    pub fn is_truncated(&self) -> bool {
        matches!(self, Self::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof)
    }
}

/// Result type for I/O operations.
pub type IoResult<T> = Result<T, IoError>;
