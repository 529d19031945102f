//! Configuration management for crush.
//!
//! Parses `crush.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! ```toml
//! plugins = ["property-sorter"]
//!
//! [paths]
//! doc_root = "${CRUSH_DOC_ROOT:-public}"
//! aliases = "aliases.toml"
//!
//! [compile]
//! debug = false
//! vendor_target = "all"
//!
//! [vars]
//! brand = "#c00"
//!
//! [property-sorter]
//! order = ["display", "position", "color"]
//! ```
//!
//! Relative paths resolve against the directory of the config file. CLI
//! settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! The `[paths]` values support `${VAR}` and `${VAR:-default}`.

mod expand;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crush_core::{CompileOptions, VendorTarget, plugins};
use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override the document root.
    pub doc_root: Option<PathBuf>,
    /// Override the alias definitions file.
    pub aliases: Option<PathBuf>,
    /// Override `compile.debug`.
    pub debug: Option<bool>,
    /// Override `compile.versioning`.
    pub versioning: Option<bool>,
    /// Override `compile.boilerplate`.
    pub boilerplate: Option<bool>,
    /// Override `compile.cache`.
    pub cache: Option<bool>,
    /// Override `compile.vendor_target`.
    pub vendor_target: Option<VendorTarget>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "crush.toml";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Filesystem locations (relative strings from TOML).
    paths: PathsConfigRaw,
    /// Compile option defaults as written in TOML.
    compile: CompileConfigRaw,
    /// Global variables, lowest in precedence.
    pub vars: BTreeMap<String, String>,
    /// Bundled plugins to enable, by name.
    pub plugins: Vec<String>,
    /// Settings of the `property-sorter` plugin.
    #[serde(rename = "property-sorter")]
    pub property_sorter: PropertySorterConfig,

    /// Resolved paths (set after loading).
    #[serde(skip)]
    pub paths_resolved: PathsConfig,
    /// Resolved compile option defaults (set after loading).
    #[serde(skip)]
    pub compile_resolved: CompileOptions,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct PathsConfigRaw {
    doc_root: Option<String>,
    aliases: Option<String>,
    boilerplate: Option<String>,
}

/// Resolved filesystem locations.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PathsConfig {
    /// Directory public output references are relative to.
    pub doc_root: PathBuf,
    /// Alias definitions; the bundled table is used when unset.
    pub aliases: Option<PathBuf>,
    /// Boilerplate template prepended to compiled files.
    pub boilerplate: Option<PathBuf>,
}

/// `[property-sorter]` settings.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PropertySorterConfig {
    /// Custom sort table replacing the built-in one. An empty list sorts
    /// alphabetically.
    pub order: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct CompileConfigRaw {
    debug: Option<bool>,
    versioning: Option<bool>,
    boilerplate: Option<bool>,
    cache: Option<bool>,
    vendor_target: Option<String>,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`paths.doc_root`").
        field: String,
        /// Error message (e.g., "${`CRUSH_DOC_ROOT`} not set").
        message: String,
    },
}

fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `crush.toml` in current directory and parents,
    /// falling back to defaults rooted at the current directory.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails
    /// or a value is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(doc_root) = &settings.doc_root {
            self.paths_resolved.doc_root.clone_from(doc_root);
        }
        if let Some(aliases) = &settings.aliases {
            self.paths_resolved.aliases = Some(aliases.clone());
        }
        let options = &mut self.compile_resolved;
        if let Some(debug) = settings.debug {
            options.debug = debug;
        }
        if let Some(versioning) = settings.versioning {
            options.versioning = versioning;
        }
        if let Some(boilerplate) = settings.boilerplate {
            options.boilerplate = boilerplate;
        }
        if let Some(cache) = settings.cache {
            options.cache = cache;
        }
        if let Some(target) = &settings.vendor_target {
            options.vendor_target = target.clone();
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Default config with the document root at `base`.
    fn default_with_base(base: &Path) -> Self {
        Self {
            paths: PathsConfigRaw::default(),
            compile: CompileConfigRaw::default(),
            vars: BTreeMap::new(),
            plugins: Vec::new(),
            property_sorter: PropertySorterConfig::default(),
            paths_resolved: PathsConfig {
                doc_root: base.to_path_buf(),
                aliases: None,
                boilerplate: None,
            },
            compile_resolved: CompileOptions::default(),
            config_path: None,
        }
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve(config_dir)?;
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(
            &self.paths_resolved.doc_root.to_string_lossy(),
            "paths.doc_root",
        )?;
        for name in &self.plugins {
            if !plugins::BUNDLED.contains(&name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "unknown plugin {name:?} (available: {})",
                    plugins::BUNDLED.join(", ")
                )));
            }
        }
        Ok(())
    }

    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        let paths = &mut self.paths;
        if let Some(doc_root) = &paths.doc_root {
            paths.doc_root = Some(expand::expand_env(doc_root, "paths.doc_root")?);
        }
        if let Some(aliases) = &paths.aliases {
            paths.aliases = Some(expand::expand_env(aliases, "paths.aliases")?);
        }
        if let Some(boilerplate) = &paths.boilerplate {
            paths.boilerplate = Some(expand::expand_env(boilerplate, "paths.boilerplate")?);
        }
        Ok(())
    }

    /// Resolve relative paths against `config_dir` and parse compile defaults.
    fn resolve(&mut self, config_dir: &Path) -> Result<(), ConfigError> {
        if self.paths.doc_root.as_deref() == Some("") {
            return Err(ConfigError::Validation(
                "paths.doc_root cannot be empty".to_owned(),
            ));
        }
        self.paths_resolved = PathsConfig {
            doc_root: self
                .paths
                .doc_root
                .as_ref()
                .map_or_else(|| config_dir.to_path_buf(), |p| config_dir.join(p)),
            aliases: self.paths.aliases.as_ref().map(|p| config_dir.join(p)),
            boilerplate: self.paths.boilerplate.as_ref().map(|p| config_dir.join(p)),
        };

        let defaults = CompileOptions::default();
        let raw = &self.compile;
        let vendor_target = match raw.vendor_target.as_deref() {
            Some(value) => value
                .parse()
                .map_err(|e| ConfigError::Validation(format!("compile.vendor_target: {e}")))?,
            None => VendorTarget::default(),
        };
        self.compile_resolved = CompileOptions {
            debug: raw.debug.unwrap_or(defaults.debug),
            versioning: raw.versioning.unwrap_or(defaults.versioning),
            boilerplate: raw.boilerplate.unwrap_or(defaults.boilerplate),
            cache: raw.cache.unwrap_or(defaults.cache),
            vendor_target,
            ..defaults
        };

        Ok(())
    }
}
