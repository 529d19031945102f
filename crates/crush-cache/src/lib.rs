//! Compiled output cache for crush.
//!
//! Every output directory carries one [`CacheIndex`], a JSON file mapping each
//! compiled file name to the [`CacheRecord`] it was produced from: the import
//! list, the option fingerprint and the modification-time checksum.
//!
//! [`validate`] decides whether an existing output can be served again. Any
//! inconsistency (missing record, moved import, changed options or mtimes)
//! deletes the output and reports [`CacheState::Stale`], so a crash between
//! writing an output and saving the index heals on the next lookup.

mod index;
mod validate;

use std::fs;
use std::path::{Path, PathBuf};

pub use index::{CacheIndex, CacheRecord};
pub use validate::{CacheState, checksum, resolve_import, validate};

/// Name of the per-directory index file.
pub const INDEX_FILE: &str = ".crush-cache.json";

/// Suffix of compiled output files.
pub const OUTPUT_SUFFIX: &str = ".crush.css";

/// Cache errors.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// I/O error on the index or an output file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Index could not be serialized.
    #[error("invalid cache index: {0}")]
    Json(#[from] serde_json::Error),
    /// A recorded import no longer exists.
    #[error("import not found: {}", .0.display())]
    ImportMissing(PathBuf),
}

/// Remove the cache index and every compiled output in `dir`.
///
/// Returns the number of compiled outputs removed. A missing directory is
/// not an error.
pub fn clear_cache(dir: &Path) -> Result<usize, CacheError> {
    if !dir.is_dir() {
        tracing::debug!("nothing to clear in {}", dir.display());
        return Ok(0);
    }

    let index = dir.join(INDEX_FILE);
    if index.exists() {
        fs::remove_file(&index)?;
    }

    let mut removed = 0;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let is_output = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.ends_with(OUTPUT_SUFFIX));
        if is_output && entry.file_type()?.is_file() {
            fs::remove_file(entry.path())?;
            removed += 1;
        }
    }

    tracing::info!(removed, "cleared cache in {}", dir.display());
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_clear_cache() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(INDEX_FILE), "{}").unwrap();
        fs::write(tmp.path().join("main.crush.css"), "a{}").unwrap();
        fs::write(tmp.path().join("print.crush.css"), "b{}").unwrap();
        fs::write(tmp.path().join("main.css"), "a {}").unwrap();

        assert_eq!(clear_cache(tmp.path()).unwrap(), 2);
        assert!(!tmp.path().join(INDEX_FILE).exists());
        assert!(!tmp.path().join("main.crush.css").exists());
        assert!(tmp.path().join("main.css").exists());
    }

    #[test]
    fn test_clear_cache_missing_dir() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(clear_cache(&tmp.path().join("nope")).unwrap(), 0);
    }
}
