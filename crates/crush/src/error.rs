//! Engine errors.

use std::path::PathBuf;

/// Problem preparing a file compile.
///
/// [`Crush::compile_file`](crate::Crush::compile_file) logs these and
/// returns `Ok(None)` instead of failing.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    /// The host file's directory does not exist.
    #[error("directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),
    /// Compiled output cannot be written to the host file's directory.
    #[error("directory is not writable: {}", .0.display())]
    DirectoryUnwritable(PathBuf),
    /// The host file does not exist.
    #[error("host file not found: {}", .0.display())]
    HostFileNotFound(PathBuf),
    /// I/O error while reading sources or writing output.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Global variables file is not valid TOML.
    #[error("invalid variables file: {0}")]
    Vars(#[from] toml::de::Error),
}
