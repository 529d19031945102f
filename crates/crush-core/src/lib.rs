//! CSS preprocessing pipeline.
//!
//! Compiles a stylesheet in a fixed sequence of passes:
//!
//! 1. Comments, strings and `@define` blocks are replaced by labels.
//! 2. Variables are merged (global, document, runtime), resolved and placed.
//! 3. Whitespace is normalised and every rule block is parsed into a
//!    [`Rule`], running plugin hooks and vendor alias expansion.
//! 4. Aliased at-rules (e.g. `@keyframes`) are copied once per vendor.
//! 5. Labels are rendered back, minified or pretty-printed.
//!
//! # Example
//!
//! ```
//! use crush_core::{AliasTable, CompileOptions, Environment};
//!
//! let aliases = AliasTable::from_toml_str(r#"
//! [properties]
//! border-radius = ["-webkit-border-radius"]
//! "#).unwrap();
//! let env = Environment::new().with_aliases(aliases);
//!
//! let compiled = env
//!     .compile(".a { border-radius: 4px }", &CompileOptions::default())
//!     .unwrap();
//! assert_eq!(compiled.css, ".a{-webkit-border-radius:4px;border-radius:4px}");
//! ```

mod aliases;
mod at_rule;
pub mod bracket;
mod compiler;
mod error;
mod extract;
mod functions;
mod hooks;
mod options;
pub mod plugins;
mod render;
mod rule;
mod tokens;
mod variables;

pub use aliases::{AliasMap, AliasTable};
pub use compiler::{Compiled, Environment};
pub use error::{AliasError, CompileError, InvalidVendorTarget, ScanError};
pub use functions::{BuiltinFunctions, FunctionEvaluator, NoFunctions};
pub use hooks::{HookError, HookPoint, HookRegistry, HookResult};
pub use options::{CompileOptions, VendorTarget};
pub use rule::{Declaration, RawRule, Rule, vendor_of};
pub use tokens::{LABEL_CLOSE, LABEL_OPEN, TokenKind, TokenStore, is_flagged_comment};
pub use variables::Variables;
