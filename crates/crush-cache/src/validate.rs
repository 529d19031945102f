//! Reuse decision for a compiled output.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use crate::{CacheError, CacheIndex};

/// Outcome of [`validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// The existing output is current. `checksum` is the recorded mtime sum.
    Reusable { checksum: u64 },
    /// The output must be compiled; any previous one has been removed.
    Stale,
}

/// Decide whether the compiled output `output_name` beside `host_file` can
/// be reused.
///
/// Reuse needs a record for the output, every recorded import still on disk,
/// an equal option fingerprint and an equal mtime checksum. Otherwise the
/// existing output is deleted and its record dropped; the index itself is
/// not saved here. A reusable lookup performs no filesystem writes.
pub fn validate(
    index: &mut CacheIndex,
    host_file: &Path,
    output_name: &str,
    doc_root: &Path,
    options: &serde_json::Value,
) -> CacheState {
    let output = index.dir().join(output_name);
    if !output.is_file() {
        tracing::debug!("no cached {output_name}");
        return CacheState::Stale;
    }

    let Some(record) = index.get(output_name) else {
        tracing::info!("{output_name} has no cache record, removing it");
        discard(index, &output, output_name);
        return CacheState::Stale;
    };

    let current = match checksum(host_file, &record.imports, doc_root) {
        Ok(sum) => sum,
        Err(e) => {
            tracing::info!("{output_name} is stale ({e}), removing it");
            discard(index, &output, output_name);
            return CacheState::Stale;
        }
    };

    if record.options == *options && record.datem_sum == current {
        tracing::debug!("reusing cached {output_name}");
        return CacheState::Reusable { checksum: current };
    }

    tracing::info!("{output_name} is out of date, removing it");
    discard(index, &output, output_name);
    CacheState::Stale
}

/// Sum of the modification times (whole seconds) of the host file and every
/// import.
///
/// Imports starting with `/` resolve against `doc_root`, others against the
/// host file directory.
pub fn checksum(host_file: &Path, imports: &[String], doc_root: &Path) -> Result<u64, CacheError> {
    let host_dir = host_file.parent().unwrap_or(Path::new(""));
    let mut sum = mtime_secs(host_file)?;
    for import in imports {
        let path = resolve_import(import, host_dir, doc_root);
        if !path.is_file() {
            return Err(CacheError::ImportMissing(path));
        }
        sum += mtime_secs(&path)?;
    }
    Ok(sum)
}

/// Filesystem location of a recorded import path.
///
/// A leading `/` marks a path relative to `doc_root`; any other path is
/// relative to `host_dir`.
pub fn resolve_import(import: &str, host_dir: &Path, doc_root: &Path) -> PathBuf {
    match import.strip_prefix('/') {
        Some(rooted) => doc_root.join(rooted),
        None => host_dir.join(import),
    }
}

fn mtime_secs(path: &Path) -> Result<u64, CacheError> {
    let modified = fs::metadata(path)?.modified()?;
    Ok(modified
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs()))
}

fn discard(index: &mut CacheIndex, output: &Path, output_name: &str) {
    if let Err(e) = fs::remove_file(output) {
        tracing::warn!("failed to remove {}: {e}", output.display());
    }
    index.remove(output_name);
}
