//! Types for writing region archives
//!

use std::io::{Seek, SeekFrom, Write};

use binrw::BinWrite;
use byteorder::{BigEndian, WriteBytesExt};
use tracing::{debug, instrument};

use crate::{
    compression::{compress_blob, CompressionScheme},
    error::{Error, Result},
    read::{now_secs, RegionArchive},
    types::{sectors_for, slot_coords, ChunkHeader, LocationEntry, MAX_SECTOR_OFFSET, SECTOR_SIZE, SLOT_COUNT},
};

impl RegionArchive {
    /// Write the archive: location table, timestamp table, then one
    /// zlib-compressed blob per chunk, each zero-padded to a sector
    /// boundary.
    ///
    /// Sectors are assigned contiguously from sector 2 in chunk iteration
    /// order, so the file layout follows the order chunks were inserted
    /// (or, for a loaded archive, their order in the source file). Stored
    /// timestamps are preserved; a slot that never got one is stamped with
    /// the current time.
    ///
    /// Writing is strict: any failure aborts before the first byte reaches
    /// `writer`, except for I/O errors from `writer` itself.
    #[instrument(skip(self, writer), fields(chunks = self.chunk_count()), err)]
    pub fn save<W: Write + Seek>(&self, mut writer: W) -> Result<W> {
        let mut locations = vec![LocationEntry::default(); SLOT_COUNT];
        let mut timestamps = vec![0u32; SLOT_COUNT];
        let mut blobs = Vec::with_capacity(self.chunk_count());

        let mut next_sector: u32 = 2;
        for (&slot, chunk) in self.chunks() {
            let raw = vox_tbf::write_document(chunk)?;
            let compressed = compress_blob(CompressionScheme::Zlib, &raw)?;
            let count = sectors_for(compressed.len());

            let (x, z) = slot_coords(slot);
            if count > u8::MAX as u32 {
                return Err(Error::SectorOutOfRange(format!(
                    "chunk ({x}, {z}) needs {count} sectors, more than a location entry can hold"
                )));
            }
            if next_sector + count > MAX_SECTOR_OFFSET {
                return Err(Error::SectorOutOfRange(format!(
                    "chunk ({x}, {z}) starts past the 24-bit sector horizon"
                )));
            }

            locations[slot] = LocationEntry {
                offset: next_sector,
                count: count as u8,
            };
            timestamps[slot] = match self.timestamps()[slot] {
                0 => now_secs(),
                stamped => stamped,
            };
            debug!(x, z, sector = next_sector, count, "chunk placed");

            blobs.push(compressed);
            next_sector += count;
        }

        writer.seek(SeekFrom::Start(0))?;
        for entry in &locations {
            writer.write_u32::<BigEndian>(entry.to_raw())?;
        }
        for stamp in &timestamps {
            writer.write_u32::<BigEndian>(*stamp)?;
        }

        for compressed in &blobs {
            ChunkHeader::new(compressed.len(), CompressionScheme::Zlib)?.write(&mut writer)?;
            writer.write_all(compressed)?;

            let written = compressed.len() + 5;
            let pad = (SECTOR_SIZE - written % SECTOR_SIZE) % SECTOR_SIZE;
            writer.write_all(&vec![0u8; pad])?;
        }

        writer.flush()?;
        Ok(writer)
    }
}
