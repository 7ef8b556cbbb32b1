//! Per-chunk blob compression and decompression handling.

use std::io::{Read, Write};

use flate2::{
    read::{GzDecoder, ZlibDecoder},
    write::{GzEncoder, ZlibEncoder},
    Compression,
};
use tracing::instrument;

use crate::error::{Error, Result};

/// Identifies how a single chunk blob is stored inside the archive.
///
/// Archives written by this library use Zlib; the reader accepts all three.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum CompressionScheme {
    /// A gzip stream
    Gzip = 1,

    /// A raw zlib stream
    #[default]
    Zlib = 2,

    /// Stored as it is
    None = 3,
}

impl CompressionScheme {
    /// The on-disk code, as stored in the chunk header.
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for CompressionScheme {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(CompressionScheme::Gzip),
            2 => Ok(CompressionScheme::Zlib),
            3 => Ok(CompressionScheme::None),
            other => Err(Error::InvalidCompression(other)),
        }
    }
}

/// Compress a serialized chunk for storage.
#[instrument(skip(bytes), fields(len = bytes.len()), err)]
pub fn compress_blob(scheme: CompressionScheme, bytes: &[u8]) -> Result<Vec<u8>> {
    Ok(match scheme {
        CompressionScheme::Gzip => {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(bytes)?;
            encoder.finish()?
        }
        CompressionScheme::Zlib => {
            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(bytes)?;
            encoder.finish()?
        }
        CompressionScheme::None => bytes.to_vec(),
    })
}

/// Expand a stored chunk payload.
#[instrument(skip(bytes), fields(len = bytes.len()), err)]
pub fn decompress_blob(scheme: CompressionScheme, bytes: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    match scheme {
        CompressionScheme::Gzip => {
            GzDecoder::new(bytes).read_to_end(&mut out)?;
        }
        CompressionScheme::Zlib => {
            ZlibDecoder::new(bytes).read_to_end(&mut out)?;
        }
        CompressionScheme::None => out.extend_from_slice(bytes),
    }
    Ok(out)
}
