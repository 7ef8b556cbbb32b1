//! Error types that can be emitted from this library

use miette::Diagnostic;
use thiserror::Error;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Transparent wrapper for [`std::io::Error`]
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// Transparent wrapper for [`binrw::Error`]
    #[error(transparent)]
    BinRWError(#[from] binrw::Error),

    /// File is too short to hold the location and timestamp tables
    #[error("file is not a region archive: {0}")]
    InvalidArchive(&'static str),

    /// Compression code other than 1 (gzip), 2 (zlib) or 3 (none)
    #[error("unknown compression scheme {0}")]
    InvalidCompression(u8),

    /// A blob lies outside the file, or a chunk exceeds the sector budget
    #[error("{0}")]
    SectorOutOfRange(String),

    /// Transparent wrapper for [`vox_tbf::Error`]
    #[error(transparent)]
    Document(#[from] vox_tbf::Error),

    /// Transparent wrapper for [`vox_stf::Error`]
    #[error(transparent)]
    Text(#[from] vox_stf::Error),

    /// Worker pool could not be built
    #[error(transparent)]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// A chunk that could not be read from an archive.
///
/// The eager reader collects these instead of aborting; see
/// [`crate::read::RegionArchive::failures`].
#[derive(Error, Debug)]
#[error("chunk ({x}, {z}): {cause}")]
pub struct ChunkFailure {
    pub x: u8,
    pub z: u8,
    #[source]
    pub cause: Error,
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
