//! Error types for the compilation pipeline.

use std::path::PathBuf;

use crate::hooks::{HookError, HookPoint};

/// Failure of the balanced-delimiter scanner.
///
/// Never fatal to a compile: the step that hit it is skipped, the region is
/// left as literal text and a warning is recorded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScanError {
    /// Opener and closer counts differ across the scanned text.
    #[error("unmatched delimiter near '{sample}'")]
    UnbalancedDelimiters {
        /// Leading excerpt of the scanned text.
        sample: String,
    },
    /// The scan did not settle within the step limit.
    #[error("reached scan limit of {0} steps")]
    ScanLimitExceeded(usize),
}

/// Failure to load alias definitions.
///
/// Callers degrade to an empty alias table (no vendor expansion).
#[derive(Debug, thiserror::Error)]
pub enum AliasError {
    /// Definition file does not exist.
    #[error("alias definitions not found: {}", .0.display())]
    Missing(PathBuf),
    /// I/O error while reading definitions.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Definitions are not valid TOML or have the wrong shape.
    #[error("alias definitions could not be parsed: {0}")]
    Unparsable(#[from] toml::de::Error),
}

/// Fatal compile error.
///
/// Structural problems in the stylesheet never produce one of these; only
/// plugin hooks can abort a compile.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// A registered hook returned an error.
    #[error("{point} hook failed: {source}")]
    Hook {
        /// Extension point the failing hook was registered on.
        point: HookPoint,
        /// Error returned by the hook.
        source: HookError,
    },
}

/// Unrecognised `vendor_target` value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid vendor target: {0:?}")]
pub struct InvalidVendorTarget(pub String);
