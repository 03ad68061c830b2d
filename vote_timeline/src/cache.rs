//! On-disk cache of parsed revisions.
//!
//! One JSON file per revision, at `<directory>/<id[..2]>/<id[2..]>.json`,
//! holding the schema version and the serialized records. Revision ids are
//! content hashes, so an entry never goes stale for its revision: only a
//! schema version change invalidates it.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use snafu::{OptionExt, ResultExt};
use tempfile::NamedTempFile;

use crate::config::*;

// Number of leading characters of a revision id used as the shard directory.
const SHARD_LEN: usize = 2;

// Only the version is decoded first: rows of another schema may not decode at all.
#[derive(Debug, Deserialize)]
struct CacheHeader {
    version: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct CacheEntry {
    rows: Vec<Record>,
}

#[derive(Debug, Serialize)]
struct CacheEntryRef<'a> {
    version: u32,
    rows: &'a [Record],
}

#[derive(Debug, Clone)]
pub struct SnapshotCache {
    config: CacheConfig,
}

impl SnapshotCache {
    pub fn new(config: CacheConfig) -> SnapshotCache {
        SnapshotCache { config }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// The location of the entry of a revision, if the id can be sharded.
    pub fn entry_path(&self, revision_id: &str) -> Option<PathBuf> {
        self.entry_location(revision_id)
            .map(|(dir, file_name)| dir.join(file_name))
    }

    fn entry_location(&self, revision_id: &str) -> Option<(PathBuf, String)> {
        if revision_id.len() <= SHARD_LEN
            || !revision_id.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return None;
        }
        let (shard, rest) = revision_id.split_at(SHARD_LEN);
        Some((self.config.directory.join(shard), format!("{}.json", rest)))
    }

    /// Returns the records stored for the revision.
    ///
    /// Missing, unreadable and corrupt entries, as well as entries written
    /// under another schema version, are all reported as a miss.
    pub fn get(&self, revision_id: &str) -> Option<Vec<Record>> {
        let path = match self.entry_path(revision_id) {
            Some(p) => p,
            None => {
                warn!(
                    "get: revision id {:?} cannot be sharded, treating as a miss",
                    revision_id
                );
                return None;
            }
        };
        let contents = match fs::read(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("get: no entry for {}", revision_id);
                return None;
            }
            Err(e) => {
                warn!("get: could not read {}: {}", path.display(), e);
                return None;
            }
        };
        let header: CacheHeader = match serde_json::from_slice(&contents) {
            Ok(h) => h,
            Err(e) => {
                warn!("get: corrupt entry {}: {}", path.display(), e);
                return None;
            }
        };
        if header.version != Some(self.config.schema_version) {
            debug!(
                "get: entry for {} has version {:?}, expected {}",
                revision_id, header.version, self.config.schema_version
            );
            return None;
        }
        match serde_json::from_slice::<CacheEntry>(&contents) {
            Ok(entry) => Some(entry.rows),
            Err(e) => {
                warn!("get: corrupt rows in {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Stores the records of a revision under the current schema version.
    ///
    /// The entry is written to a temporary file first and renamed into place,
    /// so that concurrent readers see either the previous state or the full entry.
    pub fn put(&self, revision_id: &str, records: &[Record]) -> Result<PathBuf, TimelineError> {
        let (dir, file_name) = self
            .entry_location(revision_id)
            .context(InvalidRevisionIdSnafu { revision_id })?;
        let entry = CacheEntryRef {
            version: self.config.schema_version,
            rows: records,
        };
        let bytes = serde_json::to_vec(&entry).context(CacheEncodeSnafu { revision_id })?;
        // create_dir_all already copes with another process creating the directory.
        fs::create_dir_all(&dir).context(CacheIoSnafu { path: dir.clone() })?;
        let target = dir.join(&file_name);
        write_atomic(&dir, &target, &bytes)?;
        debug!(
            "put: wrote {} records for {} to {}",
            records.len(),
            revision_id,
            target.display()
        );
        Ok(target)
    }
}

// The temporary file gets a unique name, so concurrent writers never share it.
fn write_atomic(dir: &Path, target: &Path, bytes: &[u8]) -> Result<(), TimelineError> {
    let mut tmp = NamedTempFile::new_in(dir).context(CacheIoSnafu {
        path: dir.to_path_buf(),
    })?;
    tmp.write_all(bytes).context(CacheIoSnafu {
        path: tmp.path().to_path_buf(),
    })?;
    // A failed persist drops the temporary file, which removes it.
    tmp.persist(target)
        .map_err(|e| e.error)
        .context(CacheIoSnafu {
            path: target.to_path_buf(),
        })?;
    Ok(())
}
