//! Base types for the structure of a region archive file.

use binrw::{BinRead, BinWrite};

use crate::compression::CompressionScheme;
use crate::error::{Error, Result};

/// Allocation unit of the file.
pub const SECTOR_SIZE: usize = 4096;

/// Chunk slots per archive (32 × 32).
pub const SLOT_COUNT: usize = 1024;

/// Chunks per axis.
pub const REGION_EDGE: i32 = 32;

/// Sector offsets are stored in 24 bits.
pub const MAX_SECTOR_OFFSET: u32 = 0x00FF_FFFF;

/// Normalize coordinates into the region with a non-negative modulus, so
/// `get_chunk(-1, 33)` addresses `(31, 1)`.
pub fn wrap_coords(x: i32, z: i32) -> (u8, u8) {
    (
        x.rem_euclid(REGION_EDGE) as u8,
        z.rem_euclid(REGION_EDGE) as u8,
    )
}

/// Table index of a (wrapped) coordinate pair: `z * 32 + x`.
pub fn slot_index(x: i32, z: i32) -> usize {
    let (x, z) = wrap_coords(x, z);
    z as usize * REGION_EDGE as usize + x as usize
}

/// Inverse of [`slot_index`].
pub fn slot_coords(index: usize) -> (u8, u8) {
    (
        (index % REGION_EDGE as usize) as u8,
        (index / REGION_EDGE as usize) as u8,
    )
}

/// Sectors a chunk blob occupies: five header bytes plus the compressed
/// payload, rounded up to whole sectors.
pub fn sectors_for(compressed_len: usize) -> u32 {
    ((compressed_len + 5).div_ceil(SECTOR_SIZE)) as u32
}

/// One entry of the location table: a 24-bit sector offset and an 8-bit
/// sector count packed into a big-endian `u32`. The zero entry marks an
/// empty slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LocationEntry {
    /// First sector of the blob, counted from the start of the file.
    pub offset: u32,
    /// Whole sectors the blob occupies.
    pub count: u8,
}

impl LocationEntry {
    pub fn from_raw(raw: u32) -> Self {
        LocationEntry {
            offset: raw >> 8,
            count: (raw & 0xFF) as u8,
        }
    }

    pub fn to_raw(self) -> u32 {
        (self.offset << 8) | self.count as u32
    }

    pub fn is_empty(self) -> bool {
        self.offset == 0 && self.count == 0
    }

    pub fn byte_offset(self) -> u64 {
        self.offset as u64 * SECTOR_SIZE as u64
    }

    pub fn byte_len(self) -> u64 {
        self.count as u64 * SECTOR_SIZE as u64
    }
}

/// The five-byte header leading every chunk blob.
///
/// `payload_len` counts the compression byte plus the compressed payload,
/// so the payload itself occupies `payload_len - 1` bytes.
#[derive(BinRead, BinWrite, Debug, Clone, Copy, PartialEq, Eq)]
#[brw(big)]
pub struct ChunkHeader {
    pub payload_len: u32,
    pub scheme: u8,
}

impl ChunkHeader {
    pub fn new(compressed_len: usize, scheme: CompressionScheme) -> Result<Self> {
        let payload_len = u32::try_from(compressed_len + 1).map_err(|_| {
            Error::SectorOutOfRange(format!("chunk payload of {compressed_len} bytes"))
        })?;
        Ok(ChunkHeader {
            payload_len,
            scheme: scheme.code(),
        })
    }

    /// The validated compression scheme.
    pub fn compression(&self) -> Result<CompressionScheme> {
        CompressionScheme::try_from(self.scheme)
    }

    /// Bytes of compressed payload following the header.
    pub fn compressed_len(&self) -> usize {
        self.payload_len.saturating_sub(1) as usize
    }
}
