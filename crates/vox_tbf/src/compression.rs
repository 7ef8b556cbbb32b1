//! Gzip wrappers around the raw codec.
//!
//! A compressed document is a plain gzip stream whose decompressed content
//! is TBF raw; no extra framing is added.

use std::io::{Read, Write};

use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use tracing::instrument;

use crate::{
    error::Result,
    read::read_bytes,
    types::Document,
    write::write_document,
};

/// Read a gzip-compressed document from a stream.
#[instrument(skip(reader), err)]
pub fn read_gzip<R: Read>(reader: R) -> Result<Document> {
    let mut decoder = GzDecoder::new(reader);
    let mut buf = Vec::new();
    decoder.read_to_end(&mut buf)?;
    read_bytes(&buf)
}

/// Write a document as a gzip stream, returning the inner writer.
#[instrument(skip(doc, writer), err)]
pub fn write_gzip<W: Write>(doc: &Document, writer: W) -> Result<W> {
    let bytes = write_document(doc)?;
    let mut encoder = GzEncoder::new(writer, Compression::default());
    encoder.write_all(&bytes)?;
    Ok(encoder.finish()?)
}

/// Decompress and parse a gzip buffer.
pub fn read_compressed_bytes(buf: &[u8]) -> Result<Document> {
    read_gzip(buf)
}

/// Encode and gzip a document into a fresh buffer.
pub fn write_compressed_bytes(doc: &Document) -> Result<Vec<u8>> {
    write_gzip(doc, Vec::new())
}
