//! # pfx-io
//!
//! The two raw dump formats pixfx reads and writes directly.
//!
//! | Format | Module | Header | Pixels |
//! |--------|--------|--------|--------|
//! | farbfeld | [`farbfeld`] | `"farbfeld"`, u32 BE width, height | 4 x u16 BE |
//! | irdump | [`irdump`] | u32 BE width, height | 4 x u8 |
//!
//! Every decoded image is tagged RGB. Formats are always chosen explicitly,
//! either by name or by file extension; content is never sniffed.
//!
//! ```rust
//! use pfx_core::Image;
//! use pfx_io::Format;
//!
//! let img = Image::filled(3, 2, [10, 20, 30, 255]);
//! let bytes = Format::Farbfeld.encode_to_memory(&img).unwrap();
//! let back = Format::Farbfeld.decode_from_memory(&bytes).unwrap();
//! assert_eq!(back, img);
//! ```

#![warn(missing_docs)]

mod error;
pub mod farbfeld;
pub mod irdump;

pub use error::{IoError, IoResult};

use std::fmt;
use std::io::{Read, Write};
use std::path::Path;
use std::str::FromStr;

use pfx_core::Image;

/// Pixels decoded per read call.
pub(crate) const CHUNK_PIXELS: usize = 4096;

/// Payload length in bytes for `width * height` pixels.
///
/// Fails with [`IoError::InvalidDimensions`] when it does not fit in `usize`.
pub(crate) fn checked_len(width: u32, height: u32, bytes_per_pixel: usize) -> IoResult<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(bytes_per_pixel))
        .ok_or(IoError::InvalidDimensions { width, height })
}

/// Supported dump format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// Farbfeld-compatible, 16 bits per channel.
    Farbfeld,
    /// Headered raw RGBA8.
    Irdump,
}

impl Format {
    /// All formats.
    pub const ALL: [Format; 2] = [Format::Farbfeld, Format::Irdump];

    /// Canonical lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Farbfeld => "farbfeld",
            Self::Irdump => "irdump",
        }
    }

    /// Format for a file extension (`ff`, `farbfeld`, `irdump`, `raw`).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "ff" | "farbfeld" => Some(Self::Farbfeld),
            "irdump" | "raw" => Some(Self::Irdump),
            _ => None,
        }
    }

    /// Format from the extension of `path`.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        path.as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Decodes from a reader.
    pub fn decode<R: Read>(self, reader: &mut R) -> IoResult<Image> {
        match self {
            Self::Farbfeld => farbfeld::decode(reader),
            Self::Irdump => irdump::decode(reader),
        }
    }

    /// Encodes to a writer.
    pub fn encode<W: Write>(self, image: &Image, writer: &mut W) -> IoResult<()> {
        match self {
            Self::Farbfeld => farbfeld::encode(image, writer),
            Self::Irdump => irdump::encode(image, writer),
        }
    }

    /// Reads a file.
    pub fn read<P: AsRef<Path>>(self, path: P) -> IoResult<Image> {
        match self {
            Self::Farbfeld => farbfeld::read(path),
            Self::Irdump => irdump::read(path),
        }
    }

    /// Writes a file.
    pub fn write<P: AsRef<Path>>(self, path: P, image: &Image) -> IoResult<()> {
        match self {
            Self::Farbfeld => farbfeld::write(path, image),
            Self::Irdump => irdump::write(path, image),
        }
    }

    /// Decodes from a byte slice.
    pub fn decode_from_memory(self, data: &[u8]) -> IoResult<Image> {
        self.decode(&mut &data[..])
    }

    /// Encodes to a byte vector.
    pub fn encode_to_memory(self, image: &Image) -> IoResult<Vec<u8>> {
        match self {
            Self::Farbfeld => farbfeld::encode_to_memory(image),
            Self::Irdump => irdump::encode_to_memory(image),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "farbfeld" | "ff" => Ok(Self::Farbfeld),
            "irdump" | "raw" => Ok(Self::Irdump),
            other => Err(format!("unknown format '{other}' (expected farbfeld or irdump)")),
        }
    }
}
