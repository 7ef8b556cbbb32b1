//! Bounded-parallel operations over many archive files.
//!
//! Each operation fans out over a worker pool capped at
//! [`BulkOptions::max_concurrency`] files in flight and collects one
//! outcome per input, in input order. A failed file becomes an error
//! record; the batch always runs to completion. There is no cancellation:
//! dropping the caller's interest does not interrupt in-flight work.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use bon::Builder;
use rayon::prelude::*;
use tracing::{info, instrument};
use walkdir::WalkDir;

use crate::{
    error::{Error, Result},
    read::{LoadOptions, RegionArchive},
};

/// Default bound on files processed in flight.
pub const DEFAULT_FILE_CONCURRENCY: usize = 5;

/// Options for bulk file operations
#[derive(Debug, Clone, Copy, Builder)]
pub struct BulkOptions {
    /// Upper bound on files in flight; 1 processes serially
    #[builder(default = DEFAULT_FILE_CONCURRENCY)]
    pub max_concurrency: usize,
}

impl Default for BulkOptions {
    fn default() -> Self {
        BulkOptions {
            max_concurrency: DEFAULT_FILE_CONCURRENCY,
        }
    }
}

/// The per-file result of a bulk operation.
#[derive(Debug)]
pub struct FileOutcome<T> {
    pub path: PathBuf,
    pub result: Result<T>,
}

impl<T> FileOutcome<T> {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

fn bounded_pool(max_concurrency: usize, jobs: usize) -> Result<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(max_concurrency.clamp(1, jobs.max(1)))
        .build()
        .map_err(Error::from)
}

/// File-level parallelism is the bound here; each file's chunks decode
/// serially inside its worker.
fn load_one(path: &Path) -> Result<RegionArchive> {
    let file = File::open(path)?;
    RegionArchive::load_with(
        BufReader::new(file),
        LoadOptions::builder().max_concurrency(1).build(),
    )
}

/// Load many archives, one outcome per path, in input order.
#[instrument(skip(paths, options), fields(files = paths.len()))]
pub fn load_many(paths: &[PathBuf], options: BulkOptions) -> Result<Vec<FileOutcome<RegionArchive>>> {
    let pool = bounded_pool(options.max_concurrency, paths.len())?;
    let outcomes = pool.install(|| {
        paths
            .par_iter()
            .map(|path| FileOutcome {
                path: path.clone(),
                result: load_one(path),
            })
            .collect::<Vec<_>>()
    });
    info!(
        ok = outcomes.iter().filter(|o| o.is_ok()).count(),
        failed = outcomes.iter().filter(|o| !o.is_ok()).count(),
        "bulk load finished"
    );
    Ok(outcomes)
}

/// Save many archives, one outcome per entry, in input order.
#[instrument(skip(archives, options), fields(files = archives.len()))]
pub fn save_many(
    archives: &[(PathBuf, RegionArchive)],
    options: BulkOptions,
) -> Result<Vec<FileOutcome<()>>> {
    let pool = bounded_pool(options.max_concurrency, archives.len())?;
    let outcomes = pool.install(|| {
        archives
            .par_iter()
            .map(|(path, archive)| {
                let result = File::create(path)
                    .map_err(Error::from)
                    .and_then(|file| archive.save(BufWriter::new(file)))
                    .map(drop);
                FileOutcome {
                    path: path.clone(),
                    result,
                }
            })
            .collect::<Vec<_>>()
    });
    info!(
        ok = outcomes.iter().filter(|o| o.is_ok()).count(),
        failed = outcomes.iter().filter(|o| !o.is_ok()).count(),
        "bulk save finished"
    );
    Ok(outcomes)
}

/// Load every regular file under `dir` as an archive and apply `op`,
/// collecting one outcome per file in path order.
///
/// `op` receives the file's path and its loaded archive; whatever it
/// returns becomes the outcome value. Files that fail to load reach the
/// outcome list as errors without touching `op`.
#[instrument(skip(options, op))]
pub fn process_directory<T, F>(
    dir: &Path,
    options: BulkOptions,
    op: F,
) -> Result<Vec<FileOutcome<T>>>
where
    T: Send,
    F: Fn(&Path, RegionArchive) -> Result<T> + Sync,
{
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect();
    files.sort();

    let pool = bounded_pool(options.max_concurrency, files.len())?;
    Ok(pool.install(|| {
        files
            .par_iter()
            .map(|path| {
                let result = load_one(path).and_then(|archive| op(path, archive));
                FileOutcome {
                    path: path.clone(),
                    result,
                }
            })
            .collect()
    }))
}
