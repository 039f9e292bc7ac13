//! Farbfeld-compatible dump.
//!
//! ```text
//! offset  size  field
//! 0       8     "farbfeld"
//! 8       4     width   (u32 BE)
//! 12      4     height  (u32 BE)
//! 16      8*n   pixels, 4 x u16 BE per pixel (R, G, B, A)
//! ```
//!
//! 8-bit channels are widened by byte duplication (`v << 8 | v`) and
//! narrowed by dropping the low byte, so a write/read cycle is exact.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use pfx_core::{Image, Pixel};
use tracing::debug;

use crate::{checked_len, IoError, IoResult, CHUNK_PIXELS};

/// File signature.
pub const MAGIC: &[u8; 8] = b"farbfeld";

/// Decodes a farbfeld stream.
pub fn decode<R: Read>(reader: &mut R) -> IoResult<Image> {
    let mut magic = [0u8; 8];
    reader.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(IoError::InvalidFile("not a farbfeld file (bad magic)".into()));
    }
    let width = reader.read_u32::<BigEndian>()?;
    let height = reader.read_u32::<BigEndian>()?;
    let count = checked_len(width, height, 8)? / 8;
    debug!(width, height, "decode farbfeld");

    // allocation follows the bytes actually read
    let mut data: Vec<Pixel> = Vec::new();
    let mut chunk = [0u16; CHUNK_PIXELS * 4];
    let mut remaining = count;
    while remaining > 0 {
        let n = remaining.min(CHUNK_PIXELS);
        let buf = &mut chunk[..n * 4];
        reader.read_u16_into::<BigEndian>(buf)?;
        data.extend(
            buf.chunks_exact(4)
                .map(|c| [(c[0] >> 8) as u8, (c[1] >> 8) as u8, (c[2] >> 8) as u8, (c[3] >> 8) as u8]),
        );
        remaining -= n;
    }
    Ok(Image::from_data(width, height, data)?)
}

/// Encodes `image` as farbfeld.
pub fn encode<W: Write>(image: &Image, writer: &mut W) -> IoResult<()> {
    debug!(width = image.width(), height = image.height(), "encode farbfeld");
    writer.write_all(MAGIC)?;
    writer.write_u32::<BigEndian>(image.width())?;
    writer.write_u32::<BigEndian>(image.height())?;
    for px in image.pixels() {
        for &c in px {
            writer.write_u16::<BigEndian>((u16::from(c) << 8) | u16::from(c))?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Reads a farbfeld file.
pub fn read<P: AsRef<Path>>(path: P) -> IoResult<Image> {
    let mut reader = BufReader::new(File::open(path)?);
    decode(&mut reader)
}

/// Writes a farbfeld file.
pub fn write<P: AsRef<Path>>(path: P, image: &Image) -> IoResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    encode(image, &mut writer)
}

/// Decodes farbfeld bytes.
pub fn decode_from_memory(data: &[u8]) -> IoResult<Image> {
    decode(&mut &data[..])
}

/// Encodes `image` to farbfeld bytes.
pub fn encode_to_memory(image: &Image) -> IoResult<Vec<u8>> {
    let mut out = Vec::with_capacity(16 + image.pixel_count() * 8);
    encode(image, &mut out)?;
    Ok(out)
}
