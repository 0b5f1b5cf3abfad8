//! LZMA-alone framing (`.lzma` files).
//!
//! A framed stream is a 13-byte header followed by the raw range-coded data:
//!
//! ```text
//! +-------+------------------+------------------------------+---------
//! | props | dictionary size  | uncompressed size            | stream
//! | 1 B   | 4 B, LE          | 8 B, LE (u64::MAX = unknown) | ...
//! +-------+------------------+------------------------------+---------
//! ```
//!
//! When the size is unknown the stream must end with an end marker.

use crate::config::EncoderConfig;
use crate::decoder::LzmaDecoder;
use crate::encoder::LzmaEncoder;
use crate::model::{PROPERTIES_SIZE, Properties};
use log::debug;
use oxilzma_core::error::{LzmaError, Result};
use std::io::{self, Cursor, Read, Write};

/// Size of the framed header in bytes.
pub const HEADER_SIZE: usize = PROPERTIES_SIZE + 8;

/// Uncompressed size value meaning "unknown, read to the end marker".
pub const UNKNOWN_SIZE: u64 = u64::MAX;

/// Parsed LZMA-alone header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramedHeader {
    /// Stream properties.
    pub properties: Properties,
    /// Uncompressed size, `None` when the stream is terminated by an end marker.
    pub uncompressed_size: Option<u64>,
}

impl FramedHeader {
    /// Parse the header at the start of `data`.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(LzmaError::data_error(
                data.len() as u64,
                format!("header needs {HEADER_SIZE} bytes, got {}", data.len()),
            ));
        }

        let properties = Properties::from_bytes(&data[..PROPERTIES_SIZE])?;
        let mut size = [0u8; 8];
        size.copy_from_slice(&data[PROPERTIES_SIZE..HEADER_SIZE]);
        let size = u64::from_le_bytes(size);

        Ok(Self {
            properties,
            uncompressed_size: (size != UNKNOWN_SIZE).then_some(size),
        })
    }

    /// Read a header from `reader`.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut buf = [0u8; HEADER_SIZE];
        reader.read_exact(&mut buf).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => LzmaError::data_error(0, "truncated header"),
            _ => LzmaError::Io(e),
        })?;
        Self::parse(&buf)
    }

    /// Serialize the header.
    pub fn to_bytes(&self) -> Result<[u8; HEADER_SIZE]> {
        let mut buf = [0u8; HEADER_SIZE];
        buf[..PROPERTIES_SIZE].copy_from_slice(&self.properties.to_bytes()?);
        let size = self.uncompressed_size.unwrap_or(UNKNOWN_SIZE);
        buf[PROPERTIES_SIZE..].copy_from_slice(&size.to_le_bytes());
        Ok(buf)
    }
}

/// Compress `data` into a framed stream.
///
/// The header always records the input length; `config.end_marker` adds an
/// end marker on top.
pub fn compress_framed(config: &EncoderConfig, data: &[u8]) -> Result<Vec<u8>> {
    let header = FramedHeader {
        properties: config.properties,
        uncompressed_size: Some(data.len() as u64),
    };

    let mut output = Vec::with_capacity(HEADER_SIZE + data.len() / 2 + 16);
    output.extend_from_slice(&header.to_bytes()?);

    let mut encoder = LzmaEncoder::new(*config)?;
    encoder.encode(data, &mut output)?;

    debug!(
        "framed {} bytes into {} bytes",
        data.len(),
        output.len()
    );
    Ok(output)
}

/// Compress `data` into a framed stream with an unknown size and an end
/// marker, writing to `writer`.
pub fn compress_framed_to<W: Write>(
    config: &EncoderConfig,
    data: &[u8],
    writer: &mut W,
) -> Result<u64> {
    let header = FramedHeader {
        properties: config.properties,
        uncompressed_size: None,
    };
    writer.write_all(&header.to_bytes()?)?;

    let mut encoder = LzmaEncoder::new(config.with_end_marker(true))?;
    let written = encoder.encode(data, writer)?;
    Ok(written + HEADER_SIZE as u64)
}

/// Decompress a framed stream.
pub fn decompress_framed(data: &[u8]) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    decompress_framed_to(data, &mut output)?;
    Ok(output)
}

/// Decompress a framed stream into `writer`, returning the bytes produced.
pub fn decompress_framed_to<W: Write>(data: &[u8], writer: &mut W) -> Result<u64> {
    let header = FramedHeader::parse(data)?;
    debug!(
        "framed header: {:?}, uncompressed size {:?}",
        header.properties, header.uncompressed_size
    );

    let mut decoder = LzmaDecoder::new(header.properties)?;
    decoder.decode(
        Cursor::new(&data[HEADER_SIZE..]),
        writer,
        header.uncompressed_size,
    )
}
