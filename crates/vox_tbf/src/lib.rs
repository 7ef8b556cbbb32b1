//! This library handles reading, writing and editing **TBF** documents, the
//! tagged binary format used for voxel world data.
//!
//! # TBF Format Documentation
//!
//! A TBF document is a single named tag: a one-byte variant id, a
//! `u16`-length-prefixed UTF-8 name, and the variant's payload. All
//! multi-byte integers are big-endian. Files are typically stored raw
//! (`.nbt`) or as a gzip stream whose decompressed content is raw TBF
//! (`.dat`).
//!
//! ## Variants
//!
//! | Id   | Variant   | Payload                                                 |
//! |------|-----------|---------------------------------------------------------|
//! | 0x00 | End       | none; terminates a Compound payload                     |
//! | 0x01 | Byte      | 1 byte, signed                                          |
//! | 0x02 | Short     | 2 bytes, signed                                         |
//! | 0x03 | Int       | 4 bytes, signed                                         |
//! | 0x04 | Long      | 8 bytes, signed                                         |
//! | 0x05 | Float     | 4 bytes, IEEE-754 binary32                              |
//! | 0x06 | Double    | 8 bytes, IEEE-754 binary64                              |
//! | 0x07 | ByteArray | `i32` length, then raw octets                           |
//! | 0x08 | String    | `u16` length, then UTF-8 bytes                          |
//! | 0x09 | List      | element id (1 byte), `i32` length, then bare payloads   |
//! | 0x0A | Compound  | named tags until a lone End byte                        |
//! | 0x0B | IntArray  | `i32` length, then 4-byte signed elements               |
//! | 0x0C | LongArray | `i32` length, then 8-byte signed elements               |
//!
//! An empty List is written with element id End and read back as an empty
//! list of Byte.
//!
//! ## Additional Information
//!
//! - **Endianness**: Big-endian for all multi-byte values
//! - **Strings**: UTF-8, at most 65 535 bytes
//! - **Compression**: optional gzip wrapper, see [`compression`]
//!

pub mod compression;
pub mod error;
pub mod path;
pub mod read;
pub mod types;
pub mod validate;
pub mod write;

pub use compression::{read_compressed_bytes, read_gzip, write_compressed_bytes, write_gzip};
pub use error::{Error, Result};
pub use path::{create_compound, create_list};
pub use read::{read_bytes, read_document};
pub use types::{CompoundTag, Document, ListTag, Tag, TagId};
pub use validate::{validate, Diagnostic};
pub use write::{write_bytes, write_document};
