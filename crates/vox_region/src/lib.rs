//! This library handles reading from and creating **region archive** files,
//! the sector-addressed container packaging up to 1024 independently
//! compressed TBF documents (world chunks).
//!
//! # Region Archive Format Documentation
//!
//! A region archive is a sequence of 4096-byte **sectors**. There is no
//! magic number; identification is structural.
//!
//! | Sector | Content                                                        |
//! |--------|----------------------------------------------------------------|
//! | 0      | Location table: 1024 × big-endian `u32`, `offset:u24 \| count:u8` |
//! | 1      | Timestamp table: 1024 × big-endian `u32` Unix seconds          |
//! | 2..    | Chunk blobs, zero-padded to sector boundaries                  |
//!
//! ## Location Table
//!
//! Slot `i = z * 32 + x` for chunk `(x, z)` in `[0, 32)²`. Each entry packs
//! the blob's first sector (24 bits, counted from the start of the file)
//! with the number of sectors it occupies (8 bits). The all-zero entry
//! marks an empty slot.
//!
//! ## Chunk Blobs
//!
//! Every blob leads with a five-byte header:
//!
//! | Offset (bytes) | Field        | Description                           |
//! |----------------|--------------|---------------------------------------|
//! | 0x0000         | Payload size | 4 bytes: compression byte + payload   |
//! | 0x0004         | Compression  | 1 byte: 1 gzip, 2 zlib, 3 none        |
//!
//! The compressed payload occupies `payload_size − 1` bytes and expands to
//! a raw TBF document. A blob spans `ceil((payload_size + 4) / 4096)`
//! sectors.
//!
//! ## Additional Information
//!
//! - **File Extension**: `.mca`-equivalent
//! - **Endianness**: Big-endian for all multi-byte integers
//! - **Compression Methods**: gzip (1), zlib (2, written by default),
//!   none (3)
//!

pub mod bulk;
pub mod compression;
pub mod error;
pub mod read;
pub mod types;
pub mod write;

pub use bulk::{load_many, process_directory, save_many, BulkOptions, FileOutcome};
pub use compression::CompressionScheme;
pub use error::{ChunkFailure, Error, Result};
pub use read::{LazyRegionArchive, LoadOptions, RegionArchive};
pub use types::{slot_coords, slot_index, wrap_coords};
