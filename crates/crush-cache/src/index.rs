//! Per-directory cache index.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{CacheError, INDEX_FILE};

/// What a compiled output was built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord {
    /// Imports inlined into the output. A leading `/` marks a path relative
    /// to the document root; others are relative to the host file directory.
    pub imports: Vec<String>,
    /// Fingerprint of the options the output was compiled with.
    pub options: serde_json::Value,
    /// Sum of host and import modification times, in seconds.
    pub datem_sum: u64,
}

/// Records for the compiled outputs of one directory, keyed by file name.
#[derive(Debug)]
pub struct CacheIndex {
    dir: PathBuf,
    records: BTreeMap<String, CacheRecord>,
}

impl CacheIndex {
    /// Load the index of `dir`.
    ///
    /// A missing index starts empty. An unreadable or corrupt one is logged
    /// and also starts empty; it is overwritten on the next [`save`](Self::save).
    #[must_use]
    pub fn open(dir: &Path) -> Self {
        let path = dir.join(INDEX_FILE);
        let records = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                tracing::warn!("discarding corrupt cache index {}: {e}", path.display());
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("no cache index in {}", dir.display());
                BTreeMap::new()
            }
            Err(e) => {
                tracing::warn!("failed to read cache index {}: {e}", path.display());
                BTreeMap::new()
            }
        };
        Self {
            dir: dir.to_owned(),
            records,
        }
    }

    /// Directory the index describes.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn get(&self, output_name: &str) -> Option<&CacheRecord> {
        self.records.get(output_name)
    }

    pub fn insert(&mut self, output_name: impl Into<String>, record: CacheRecord) {
        self.records.insert(output_name.into(), record);
    }

    pub fn remove(&mut self, output_name: &str) -> Option<CacheRecord> {
        self.records.remove(output_name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Write the index back to its directory.
    pub fn save(&self) -> Result<(), CacheError> {
        let json = serde_json::to_string_pretty(&self.records)?;
        fs::write(self.dir.join(INDEX_FILE), json)?;
        Ok(())
    }
}
