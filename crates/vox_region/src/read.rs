//! Types for reading region archives
//!

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use binrw::BinRead;
use bon::Builder;
use byteorder::{BigEndian, ByteOrder};
use indexmap::IndexMap;
use rayon::prelude::*;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::{
    compression::decompress_blob,
    error::{ChunkFailure, Error, Result},
    types::{slot_coords, slot_index, ChunkHeader, LocationEntry, SECTOR_SIZE, SLOT_COUNT},
};
use vox_tbf::Document;

/// Default bound on chunks decompressed and parsed in flight.
pub const DEFAULT_CHUNK_CONCURRENCY: usize = 10;

/// Options for how an archive should be read
#[derive(Debug, Clone, Copy, Builder)]
pub struct LoadOptions {
    /// Upper bound on per-chunk work in flight; 1 reads serially
    #[builder(default = DEFAULT_CHUNK_CONCURRENCY)]
    pub max_concurrency: usize,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            max_concurrency: DEFAULT_CHUNK_CONCURRENCY,
        }
    }
}

/// Wall-clock seconds since the Unix epoch, saturating at zero.
pub(crate) fn now_secs() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0)
}

/// Both header tables, parsed from the first two sectors.
fn read_tables<R: Read>(reader: &mut R) -> Result<(Vec<LocationEntry>, Vec<u32>)> {
    let mut header = vec![0u8; SECTOR_SIZE * 2];
    reader.read_exact(&mut header).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::InvalidArchive("shorter than the two header sectors")
        } else {
            Error::IOError(e)
        }
    })?;

    let locations = (0..SLOT_COUNT)
        .map(|i| LocationEntry::from_raw(BigEndian::read_u32(&header[i * 4..])))
        .collect();
    let timestamps = (0..SLOT_COUNT)
        .map(|i| BigEndian::read_u32(&header[SECTOR_SIZE + i * 4..]))
        .collect();
    Ok((locations, timestamps))
}

/// The raw compression code and compressed payload of one blob.
fn read_blob<R: Read + Seek>(
    reader: &mut R,
    file_len: u64,
    entry: LocationEntry,
) -> Result<(u8, Vec<u8>)> {
    if entry.offset < 2 {
        return Err(Error::SectorOutOfRange(format!(
            "blob at sector {} overlaps the header tables",
            entry.offset
        )));
    }
    if entry.byte_offset() + entry.byte_len() > file_len {
        return Err(Error::SectorOutOfRange(format!(
            "blob at sector {} runs past the end of the file",
            entry.offset
        )));
    }

    reader.seek(SeekFrom::Start(entry.byte_offset()))?;
    let header = ChunkHeader::read(reader)?;
    if header.payload_len == 0 {
        return Err(Error::SectorOutOfRange(format!(
            "blob at sector {} declares an empty payload",
            entry.offset
        )));
    }
    if header.compressed_len() as u64 + 5 > entry.byte_len() {
        return Err(Error::SectorOutOfRange(format!(
            "blob at sector {} overflows its {} allocated sectors",
            entry.offset, entry.count
        )));
    }

    let mut compressed = vec![0u8; header.compressed_len()];
    reader.read_exact(&mut compressed)?;
    Ok((header.scheme, compressed))
}

/// Expand and parse one stored chunk.
fn decode_chunk(scheme: u8, compressed: &[u8]) -> Result<Document> {
    let scheme = crate::compression::CompressionScheme::try_from(scheme)?;
    let raw = decompress_blob(scheme, compressed)?;
    Ok(vox_tbf::read_bytes(&raw)?)
}

/// An in-memory region archive: up to 1024 chunk documents addressed by
/// `(x, z)` in `[0, 32)²`, with per-slot modification timestamps.
///
/// Chunk iteration order is insertion order and is the order `save` lays
/// blobs out on disk; a freshly loaded archive iterates in file order.
///
/// ```no_run
/// use std::fs::File;
///
/// fn chunk_names(path: &str) -> vox_region::error::Result<()> {
///     let archive = vox_region::RegionArchive::load(File::open(path)?)?;
///
///     for ((x, z), chunk) in archive.all_chunks() {
///         println!("({x}, {z}): {}", chunk.name);
///     }
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct RegionArchive {
    chunks: IndexMap<usize, Document>,
    timestamps: Vec<u32>,
    failures: Vec<ChunkFailure>,
}

impl Default for RegionArchive {
    fn default() -> Self {
        RegionArchive {
            chunks: IndexMap::new(),
            timestamps: vec![0; SLOT_COUNT],
            failures: Vec::new(),
        }
    }
}

impl RegionArchive {
    /// An empty archive with no chunks and zeroed timestamps.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read an archive eagerly with default options.
    pub fn load<R: Read + Seek>(reader: R) -> Result<Self> {
        Self::load_with(reader, LoadOptions::default())
    }

    /// Read an archive eagerly, materializing every stored chunk.
    ///
    /// Chunks that cannot be read are collected as [`ChunkFailure`]
    /// diagnostics rather than aborting the load; see
    /// [`RegionArchive::failures`].
    #[instrument(skip(reader, options), fields(max_concurrency = options.max_concurrency))]
    pub fn load_with<R: Read + Seek>(mut reader: R, options: LoadOptions) -> Result<Self> {
        let file_len = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(0))?;
        let (locations, timestamps) = read_tables(&mut reader)?;

        // Populated slots are visited in file order, so a reloaded
        // archive iterates (and re-saves) in the layout of its source.
        let mut populated: Vec<(usize, LocationEntry)> = locations
            .iter()
            .enumerate()
            .filter(|(_, entry)| !entry.is_empty())
            .map(|(slot, entry)| (slot, *entry))
            .collect();
        populated.sort_by_key(|(_, entry)| entry.offset);

        // Blob bytes come off the reader serially; decompression and
        // parsing fan out below.
        let mut failures = Vec::new();
        let mut work = Vec::new();
        for (slot, entry) in populated {
            match read_blob(&mut reader, file_len, entry) {
                Ok((scheme, compressed)) => work.push((slot, scheme, compressed)),
                Err(cause) => {
                    let (x, z) = slot_coords(slot);
                    failures.push(ChunkFailure { x, z, cause });
                }
            }
        }

        let decoded: Vec<(usize, Result<Document>)> =
            if options.max_concurrency > 1 && work.len() > 1 {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(options.max_concurrency.min(work.len()))
                    .build()?;
                pool.install(|| {
                    work.par_iter()
                        .map(|(slot, scheme, compressed)| {
                            (*slot, decode_chunk(*scheme, compressed))
                        })
                        .collect()
                })
            } else {
                work.iter()
                    .map(|(slot, scheme, compressed)| (*slot, decode_chunk(*scheme, compressed)))
                    .collect()
            };

        // Results install only after the join; nothing observes a
        // half-populated map.
        let mut chunks = IndexMap::with_capacity(decoded.len());
        for (slot, result) in decoded {
            match result {
                Ok(doc) => {
                    chunks.insert(slot, doc);
                }
                Err(cause) => {
                    let (x, z) = slot_coords(slot);
                    failures.push(ChunkFailure { x, z, cause });
                }
            }
        }

        debug!(
            chunks = chunks.len(),
            failures = failures.len(),
            "archive loaded"
        );
        Ok(RegionArchive {
            chunks,
            timestamps,
            failures,
        })
    }

    /// The chunk at `(x, z)`, if populated. Coordinates wrap modulo 32.
    pub fn get_chunk(&self, x: i32, z: i32) -> Option<&Document> {
        self.chunks.get(&slot_index(x, z))
    }

    /// Mutable access to the chunk at `(x, z)`.
    pub fn get_chunk_mut(&mut self, x: i32, z: i32) -> Option<&mut Document> {
        self.chunks.get_mut(&slot_index(x, z))
    }

    /// Store a chunk, stamping its slot with the current wall-clock time.
    /// Returns the previous occupant.
    pub fn set_chunk(&mut self, x: i32, z: i32, chunk: Document) -> Option<Document> {
        let slot = slot_index(x, z);
        self.timestamps[slot] = now_secs();
        self.chunks.insert(slot, chunk)
    }

    /// Remove and return the chunk at `(x, z)`, clearing its timestamp.
    pub fn remove_chunk(&mut self, x: i32, z: i32) -> Option<Document> {
        let slot = slot_index(x, z);
        self.timestamps[slot] = 0;
        self.chunks.shift_remove(&slot)
    }

    /// All stored chunks with their coordinates, in insertion order.
    pub fn all_chunks(&self) -> impl Iterator<Item = ((u8, u8), &Document)> {
        self.chunks
            .iter()
            .map(|(slot, doc)| (slot_coords(*slot), doc))
    }

    /// Number of stored chunks.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Whether this archive stores no chunks
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// The bounding box `((min_x, min_z), (max_x, max_z))` of populated
    /// slots, or `None` for an empty archive.
    pub fn region_bounds(&self) -> Option<((u8, u8), (u8, u8))> {
        let mut coords = self.chunks.keys().map(|slot| slot_coords(*slot));
        let (x0, z0) = coords.next()?;
        let (mut min, mut max) = ((x0, z0), (x0, z0));
        for (x, z) in coords {
            min = (min.0.min(x), min.1.min(z));
            max = (max.0.max(x), max.1.max(z));
        }
        Some((min, max))
    }

    /// Last-modified Unix seconds of `(x, z)`; zero when never written.
    pub fn timestamp(&self, x: i32, z: i32) -> u32 {
        self.timestamps[slot_index(x, z)]
    }

    /// Override the timestamp of `(x, z)`.
    pub fn set_timestamp(&mut self, x: i32, z: i32, seconds: u32) {
        self.timestamps[slot_index(x, z)] = seconds;
    }

    pub(crate) fn timestamps(&self) -> &[u32] {
        &self.timestamps
    }

    pub(crate) fn chunks(&self) -> &IndexMap<usize, Document> {
        &self.chunks
    }

    /// Chunks that failed to read during the eager load.
    pub fn failures(&self) -> &[ChunkFailure] {
        &self.failures
    }

    /// Write every chunk into `dir` as `chunk.<x>.<z>.dat`, a gzip stream
    /// of the raw document.
    #[instrument(skip(self), err)]
    pub fn extract(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)?;
        for ((x, z), chunk) in self.all_chunks() {
            let path = dir.join(format!("chunk.{x}.{z}.dat"));
            debug!("writing {}", path.display());
            vox_tbf::write_gzip(chunk, File::create(&path)?)?;
        }
        Ok(())
    }

    /// JSON view of the whole archive: an object keyed `"x,z"` whose
    /// values are each chunk's document view.
    pub fn to_json(&self) -> Value {
        let entries = self
            .all_chunks()
            .map(|((x, z), chunk)| (format!("{x},{z}"), vox_stf::to_json(chunk)))
            .collect::<serde_json::Map<_, _>>();
        Value::Object(entries)
    }

    /// Rebuild an archive from its JSON view. Timestamps are not part of
    /// the view; every slot is stamped with the current time.
    pub fn from_json(value: &Value) -> Result<Self> {
        let entries = value.as_object().ok_or_else(|| {
            Error::Text(vox_stf::Error::Json {
                path: "$".into(),
                message: "expected an object keyed \"x,z\"".into(),
            })
        })?;

        let mut archive = RegionArchive::new();
        for (key, chunk) in entries {
            let coords: Option<(i32, i32)> = key.split_once(',').and_then(|(x, z)| {
                Some((x.trim().parse().ok()?, z.trim().parse().ok()?))
            });
            let Some((x, z)) = coords else {
                return Err(Error::Text(vox_stf::Error::Json {
                    path: format!("$.{key}"),
                    message: "key is not an \"x,z\" coordinate pair".into(),
                }));
            };
            archive.set_chunk(x, z, vox_stf::from_json(chunk)?);
        }
        Ok(archive)
    }
}

/// A region archive that keeps its byte source and materializes chunks on
/// first access.
///
/// Materialized chunks are cached as [`Arc`]s: repeated reads of a slot
/// return the same tree until [`LazyRegionArchive::clear_cache`]. Reads of
/// distinct coordinates are safe from multiple threads.
pub struct LazyRegionArchive<R> {
    source: Mutex<R>,
    file_len: u64,
    locations: Vec<LocationEntry>,
    timestamps: Vec<u32>,
    cache: Mutex<HashMap<usize, Arc<Document>>>,
}

impl<R: Read + Seek> LazyRegionArchive<R> {
    /// Parse the header tables and retain `reader` for on-demand chunk
    /// reads.
    #[instrument(skip(reader))]
    pub fn load_lazy(mut reader: R) -> Result<Self> {
        let file_len = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(0))?;
        let (locations, timestamps) = read_tables(&mut reader)?;
        Ok(LazyRegionArchive {
            source: Mutex::new(reader),
            file_len,
            locations,
            timestamps,
            cache: Mutex::new(HashMap::new()),
        })
    }

    /// The chunk at `(x, z)`, reading and caching it on first access.
    /// Coordinates wrap modulo 32.
    pub fn get_chunk(&self, x: i32, z: i32) -> Result<Option<Arc<Document>>> {
        let slot = slot_index(x, z);
        let entry = self.locations[slot];
        if entry.is_empty() {
            return Ok(None);
        }

        if let Some(chunk) = self.cache.lock().expect("cache mutex poisoned").get(&slot) {
            return Ok(Some(Arc::clone(chunk)));
        }

        let (scheme, compressed) = {
            let mut source = self.source.lock().expect("source mutex poisoned");
            read_blob(&mut *source, self.file_len, entry)?
        };
        let chunk = Arc::new(decode_chunk(scheme, &compressed)?);

        // Two racing readers may decode the same slot; the first insert
        // wins so both see one instance afterwards.
        let mut cache = self.cache.lock().expect("cache mutex poisoned");
        let chunk = cache.entry(slot).or_insert(chunk);
        Ok(Some(Arc::clone(chunk)))
    }

    /// Drop every materialized chunk. The byte source stays open and
    /// chunks re-materialize on demand.
    pub fn clear_cache(&self) {
        self.cache.lock().expect("cache mutex poisoned").clear();
    }

    /// Number of populated slots, cached or not.
    pub fn chunk_count(&self) -> usize {
        self.locations.iter().filter(|e| !e.is_empty()).count()
    }

    /// Last-modified Unix seconds of `(x, z)`; zero when never written.
    pub fn timestamp(&self, x: i32, z: i32) -> u32 {
        self.timestamps[slot_index(x, z)]
    }

    /// Unwrap and return the inner reader object
    ///
    /// The position of the reader is undefined.
    pub fn into_inner(self) -> R {
        self.source.into_inner().expect("source mutex poisoned")
    }

    /// Materialize every populated slot into an eager [`RegionArchive`],
    /// consuming the source.
    pub fn into_eager(self, options: LoadOptions) -> Result<RegionArchive> {
        let mut source = self.source.into_inner().expect("source mutex poisoned");
        source.seek(SeekFrom::Start(0))?;
        RegionArchive::load_with(source, options)
    }
}
