//! Arguments shared by the compiling commands.

use std::path::PathBuf;

use clap::Args;
use crush::{CompileOptions, Crush, VendorTarget};
use crush_config::{CliSettings, Config};

use crate::error::CliError;

/// Configuration and compile option overrides.
#[derive(Args, Debug)]
pub(crate) struct CompileArgs {
    /// Path to configuration file (default: auto-discover crush.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Document root public references are relative to (overrides config).
    #[arg(long)]
    doc_root: Option<PathBuf>,

    /// Alias definitions file (overrides config).
    #[arg(long)]
    aliases: Option<PathBuf>,

    /// Vendor prefixes to generate: "all", "none" or a vendor name.
    #[arg(long)]
    vendor_target: Option<VendorTarget>,

    /// Pretty-print and keep comments instead of minifying.
    #[arg(short, long)]
    debug: bool,

    /// Disable the checksum suffix on output references.
    #[arg(long)]
    no_versioning: bool,

    /// Disable the boilerplate banner.
    #[arg(long)]
    no_boilerplate: bool,

    /// Disable output caching.
    #[arg(long)]
    no_cache: bool,

    /// Runtime variable, overriding global and in-document values.
    #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_var)]
    vars: Vec<(String, String)>,
}

impl CompileArgs {
    /// Load configuration and build the preprocessor and compile options.
    pub(crate) fn load(self) -> Result<(Crush, CompileOptions), CliError> {
        let settings = CliSettings {
            doc_root: self.doc_root,
            aliases: self.aliases,
            debug: self.debug.then_some(true),
            versioning: self.no_versioning.then_some(false),
            boilerplate: self.no_boilerplate.then_some(false),
            cache: self.no_cache.then_some(false),
            vendor_target: self.vendor_target,
        };
        let config = Config::load(self.config.as_deref(), Some(&settings))?;
        if let Some(path) = &config.config_path {
            tracing::info!("using configuration {}", path.display());
        }

        let crush = Crush::from_config(&config);
        let mut options = config.compile_resolved;
        options.vars.extend(self.vars);
        Ok((crush, options))
    }
}

/// Parse a `NAME=VALUE` pair.
fn parse_var(arg: &str) -> Result<(String, String), String> {
    let (name, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got {arg:?}"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing variable name in {arg:?}"));
    }
    Ok((name.to_owned(), value.trim().to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_var() {
        assert_eq!(
            parse_var("brand=#c00").unwrap(),
            ("brand".to_owned(), "#c00".to_owned())
        );
        assert_eq!(
            parse_var(" gap = 4px ").unwrap(),
            ("gap".to_owned(), "4px".to_owned())
        );
        assert_eq!(
            parse_var("font=a=b").unwrap(),
            ("font".to_owned(), "a=b".to_owned())
        );
        assert!(parse_var("brand").is_err());
        assert!(parse_var("=red").is_err());
    }
}
