//! Internal raw dump.
//!
//! ```text
//! offset  size  field
//! 0       4     width   (u32 BE)
//! 4       4     height  (u32 BE)
//! 8       4*n   pixels, R G B A bytes, row-major
//! ```
//!
//! There is no signature, so the format can't be detected from content;
//! callers pick it explicitly.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use pfx_core::{Image, Pixel};
use tracing::debug;

use crate::{checked_len, IoResult, CHUNK_PIXELS};

/// Size of the header in bytes.
pub const HEADER_SIZE: usize = 8;

/// Decodes an irdump stream.
pub fn decode<R: Read>(reader: &mut R) -> IoResult<Image> {
    let width = reader.read_u32::<BigEndian>()?;
    let height = reader.read_u32::<BigEndian>()?;
    let count = checked_len(width, height, 4)? / 4;
    debug!(width, height, "decode irdump");

    let mut data: Vec<Pixel> = Vec::new();
    let mut chunk = [0u8; CHUNK_PIXELS * 4];
    let mut remaining = count;
    while remaining > 0 {
        let n = remaining.min(CHUNK_PIXELS);
        let buf = &mut chunk[..n * 4];
        reader.read_exact(buf)?;
        data.extend(buf.chunks_exact(4).map(|c| [c[0], c[1], c[2], c[3]]));
        remaining -= n;
    }
    Ok(Image::from_data(width, height, data)?)
}

/// Encodes `image` as irdump.
pub fn encode<W: Write>(image: &Image, writer: &mut W) -> IoResult<()> {
    debug!(width = image.width(), height = image.height(), "encode irdump");
    writer.write_u32::<BigEndian>(image.width())?;
    writer.write_u32::<BigEndian>(image.height())?;
    writer.write_all(image.as_bytes())?;
    writer.flush()?;
    Ok(())
}

/// Reads an irdump file.
pub fn read<P: AsRef<Path>>(path: P) -> IoResult<Image> {
    let mut reader = BufReader::new(File::open(path)?);
    decode(&mut reader)
}

/// Writes an irdump file.
pub fn write<P: AsRef<Path>>(path: P, image: &Image) -> IoResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    encode(image, &mut writer)
}

/// Decodes irdump bytes.
pub fn decode_from_memory(data: &[u8]) -> IoResult<Image> {
    decode(&mut &data[..])
}

/// Encodes `image` to irdump bytes.
pub fn encode_to_memory(image: &Image) -> IoResult<Vec<u8>> {
    let mut out = Vec::with_capacity(HEADER_SIZE + image.pixel_count() * 4);
    encode(image, &mut out)?;
    Ok(out)
}
