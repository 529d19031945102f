//! CLI command implementations.

pub(crate) mod clear_cache;
pub(crate) mod compile;
mod settings;
pub(crate) mod string;

pub(crate) use clear_cache::ClearCacheArgs;
pub(crate) use compile::CompileFileArgs;
pub(crate) use string::StringArgs;
