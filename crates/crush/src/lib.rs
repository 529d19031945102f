//! CSS preprocessor.
//!
//! [`Crush`] compiles stylesheets with vendor aliasing, variables and
//! plugin hooks, and caches compiled files beside their sources:
//!
//! ```no_run
//! use std::path::Path;
//!
//! use crush::{CompileOptions, Crush};
//!
//! let mut crush = Crush::new("/srv/www");
//! crush.global_vars([("brand", "#c00")]);
//!
//! // "/css/main.crush.css?1718000000"
//! let reference = crush
//!     .compile_file(Path::new("/css/main.css"), &CompileOptions::default())
//!     .unwrap();
//! ```
//!
//! The pipeline itself lives in [`crush_core`]; output caching in
//! [`crush_cache`].

mod boilerplate;
mod engine;
mod error;
mod import;

pub use crush_core::{
    AliasTable, CompileError, CompileOptions, Compiled, Declaration, Environment, HookRegistry,
    Rule, VendorTarget,
};
pub use engine::Crush;
pub use error::SetupError;
pub use import::{Collated, FsImporter, ImportCollator};
