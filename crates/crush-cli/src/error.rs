//! CLI error types.

use crush::CompileError;
use crush_cache::CacheError;
use crush_config::ConfigError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Compile(#[from] CompileError),

    #[error("{0}")]
    Cache(#[from] CacheError),

    #[error("{0}")]
    Validation(String),
}
