//! Compile-and-cache engine.

use std::fs;
use std::path::{Component, Path, PathBuf};

use crush_cache::{CacheIndex, CacheRecord, CacheState, OUTPUT_SUFFIX};
use crush_config::Config;
use crush_core::{
    AliasTable, CompileError, CompileOptions, Compiled, Environment, HookRegistry, Variables,
    plugins::{self, PropertySorter},
};

use crate::boilerplate;
use crate::error::SetupError;
use crate::import::{FsImporter, ImportCollator};

/// Alias definitions used when none are configured.
const BUNDLED_ALIASES: &str = include_str!("../assets/aliases.toml");

/// A preprocessor instance.
///
/// Owns everything shared between compiles: global variables, the alias
/// table, plugin hooks, the function evaluator and the import collator.
/// Every compile gets its own working state, so one instance can serve
/// compiles from several threads.
pub struct Crush {
    env: Environment,
    doc_root: PathBuf,
    boilerplate: Option<String>,
    importer: Box<dyn ImportCollator>,
}

/// Why a file compile stopped.
enum Failure {
    Setup(SetupError),
    Compile(CompileError),
}

impl From<SetupError> for Failure {
    fn from(e: SetupError) -> Self {
        Self::Setup(e)
    }
}

impl From<std::io::Error> for Failure {
    fn from(e: std::io::Error) -> Self {
        Self::Setup(e.into())
    }
}

impl From<CompileError> for Failure {
    fn from(e: CompileError) -> Self {
        Self::Compile(e)
    }
}

/// A compiled file.
struct Output {
    dir: PathBuf,
    name: String,
}

impl Crush {
    /// Instance with the bundled alias table and no boilerplate.
    #[must_use]
    pub fn new(doc_root: impl Into<PathBuf>) -> Self {
        Self {
            env: Environment::new().with_aliases(bundled_aliases()),
            doc_root: doc_root.into(),
            boilerplate: None,
            importer: Box::new(FsImporter),
        }
    }

    /// Instance set up from a loaded configuration.
    ///
    /// An unreadable alias file or boilerplate template is logged and
    /// skipped.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let paths = &config.paths_resolved;
        let mut crush = Self::new(&paths.doc_root);

        if let Some(path) = &paths.aliases {
            crush.env.set_aliases(AliasTable::load_or_empty(path));
        }
        if let Some(path) = &paths.boilerplate {
            match fs::read_to_string(path) {
                Ok(text) => crush.boilerplate = Some(text),
                Err(e) => tracing::warn!("boilerplate {} not loaded: {e}", path.display()),
            }
        }
        for name in &config.plugins {
            let hooks = crush.env.hooks_mut();
            match (name.as_str(), &config.property_sorter.order) {
                ("property-sorter", Some(order)) => {
                    PropertySorter::with_order(order).register(hooks);
                }
                _ => {
                    if !plugins::register_by_name(name, hooks) {
                        tracing::warn!("unknown plugin {name}");
                    }
                }
            }
        }
        crush.global_vars(config.vars.clone());
        crush
    }

    #[must_use]
    pub fn with_aliases(mut self, aliases: AliasTable) -> Self {
        self.env.set_aliases(aliases);
        self
    }

    /// Set the boilerplate template (see [`CompileOptions::boilerplate`]).
    #[must_use]
    pub fn with_boilerplate(mut self, template: impl Into<String>) -> Self {
        self.boilerplate = Some(template.into());
        self
    }

    #[must_use]
    pub fn with_importer(mut self, importer: impl ImportCollator + 'static) -> Self {
        self.importer = Box::new(importer);
        self
    }

    #[must_use]
    pub fn doc_root(&self) -> &Path {
        &self.doc_root
    }

    #[must_use]
    pub fn environment(&self) -> &Environment {
        &self.env
    }

    /// Environment for installing a custom function evaluator or aliases.
    pub fn environment_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    /// Registry to add plugin hooks to.
    pub fn hooks_mut(&mut self) -> &mut HookRegistry {
        self.env.hooks_mut()
    }

    /// Compile a host file to `<stem>.crush.css` in its directory.
    ///
    /// Returns the document-root-relative reference to the compiled file,
    /// with `?<checksum>` appended when versioning is on. When caching is on
    /// and the previous output is still valid, nothing is compiled or
    /// written.
    ///
    /// `file` is either a filesystem path inside the document root, a
    /// `/`-prefixed path relative to the document root or a relative path.
    /// Setup failures (missing directory or host file, unwritable directory,
    /// I/O errors) are logged and yield `Ok(None)`; only plugin hook
    /// failures are returned as errors.
    pub fn compile_file(
        &self,
        file: &Path,
        options: &CompileOptions,
    ) -> Result<Option<String>, CompileError> {
        match self.try_compile_file(file, options) {
            Ok(reference) => Ok(Some(reference)),
            Err(Failure::Compile(e)) => Err(e),
            Err(Failure::Setup(e)) => {
                tracing::warn!("{} not compiled: {e}", file.display());
                Ok(None)
            }
        }
    }

    fn try_compile_file(&self, file: &Path, options: &CompileOptions) -> Result<String, Failure> {
        let doc_root = fs::canonicalize(&self.doc_root).unwrap_or_else(|_| self.doc_root.clone());
        let host = self.host_path(file, &doc_root);
        let dir = host.parent().map(Path::to_path_buf).unwrap_or_default();
        let dir = check_dir(&dir)?;
        let Some(name) = host.file_name() else {
            return Err(SetupError::HostFileNotFound(host).into());
        };
        let host = dir.join(name);
        if !host.is_file() {
            return Err(SetupError::HostFileNotFound(host).into());
        }

        let output = Output {
            name: output_name(&host, options),
            dir,
        };
        let fingerprint = self.fingerprint(options);
        let mut index = CacheIndex::open(&output.dir);

        if options.cache {
            let state =
                crush_cache::validate(&mut index, &host, &output.name, &doc_root, &fingerprint);
            if let CacheState::Reusable { checksum } = state {
                return Ok(output.reference(&doc_root, options.versioning, checksum));
            }
        }

        let collated = self.importer.collate(&host, &doc_root)?;
        let mut css = self.env.compile(&collated.css, options)?.css;
        if options.boilerplate
            && let Some(template) = &self.boilerplate
        {
            css = format!("{}\n{css}", boilerplate::render(template));
        }
        fs::write(output.dir.join(&output.name), css)?;
        tracing::info!("compiled {} to {}", host.display(), output.name);

        let checksum = match crush_cache::checksum(&host, &collated.imports, &doc_root) {
            Ok(sum) => sum,
            Err(e) => {
                tracing::warn!("{} not cached: {e}", output.name);
                return Ok(output.reference(&doc_root, options.versioning, 0));
            }
        };
        index.insert(
            output.name.clone(),
            CacheRecord {
                imports: collated.imports,
                options: fingerprint,
                datem_sum: checksum,
            },
        );
        if let Err(e) = index.save() {
            tracing::warn!("cache index for {} not saved: {e}", output.dir.display());
        }

        Ok(output.reference(&doc_root, options.versioning, checksum))
    }

    /// Compile stylesheet text. No files are read or written.
    pub fn compile_string(
        &self,
        css: &str,
        options: &CompileOptions,
    ) -> Result<Compiled, CompileError> {
        self.env.compile(css, options)
    }

    /// Merge variables into the global set, replacing existing names.
    pub fn global_vars<I, K, V>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let globals = self.env.global_vars_mut();
        for (name, value) in vars {
            globals.insert(name.into(), value.into());
        }
    }

    /// Merge the top-level keys of a TOML file into the global set.
    ///
    /// Scalar values are converted to text; nested tables are skipped.
    pub fn set_global_vars_from_file(&mut self, path: &Path) -> Result<(), SetupError> {
        let content = fs::read_to_string(path)?;
        let table: toml::Table = content.parse()?;
        let mut vars = Variables::new();
        for (name, value) in table {
            let text = match value {
                toml::Value::String(s) => s,
                toml::Value::Table(_) | toml::Value::Array(_) => {
                    tracing::debug!("skipping non-scalar variable {name}");
                    continue;
                }
                other => other.to_string(),
            };
            vars.insert(name, text);
        }
        self.global_vars(vars);
        Ok(())
    }

    /// Remove every global variable.
    pub fn clear_global_vars(&mut self) {
        self.env.global_vars_mut().clear();
    }

    /// Remove the cache index and compiled files of `dir`.
    pub fn clear_cache(&self, dir: &Path) -> Result<usize, crush_cache::CacheError> {
        crush_cache::clear_cache(dir)
    }

    /// Locate the host file named by `file`.
    fn host_path(&self, file: &Path, doc_root: &Path) -> PathBuf {
        if file.starts_with(doc_root) || file.starts_with(&self.doc_root) {
            return file.to_path_buf();
        }
        if file.has_root() {
            let relative: PathBuf = file
                .components()
                .filter(|c| matches!(c, Component::Normal(_) | Component::ParentDir))
                .collect();
            return doc_root.join(relative);
        }
        file.to_path_buf()
    }

    /// What a cached output must have been compiled with to be reused.
    fn fingerprint(&self, options: &CompileOptions) -> serde_json::Value {
        serde_json::json!({
            "options": options,
            "global_vars": self.env.global_vars(),
        })
    }
}

impl Default for Crush {
    fn default() -> Self {
        Self::new(".")
    }
}

impl std::fmt::Debug for Crush {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Crush")
            .field("env", &self.env)
            .field("doc_root", &self.doc_root)
            .field("boilerplate", &self.boilerplate.is_some())
            .finish_non_exhaustive()
    }
}

impl Output {
    /// Public reference: the output path relative to the document root.
    fn reference(&self, doc_root: &Path, versioning: bool, checksum: u64) -> String {
        let mut url = match self.dir.strip_prefix(doc_root) {
            Ok(relative) => {
                let mut url = String::new();
                for part in relative.components() {
                    url.push('/');
                    url.push_str(&part.as_os_str().to_string_lossy());
                }
                url
            }
            Err(_) => self.dir.to_string_lossy().into_owned(),
        };
        url.push('/');
        url.push_str(&self.name);
        if versioning {
            url.push('?');
            url.push_str(&checksum.to_string());
        }
        url
    }
}

fn bundled_aliases() -> AliasTable {
    AliasTable::from_toml_str(BUNDLED_ALIASES).unwrap_or_else(|e| {
        tracing::warn!("bundled aliases unusable: {e}");
        AliasTable::default()
    })
}

/// Canonical form of the output directory, if it exists and is writable.
fn check_dir(dir: &Path) -> Result<PathBuf, SetupError> {
    let dir = if dir.as_os_str().is_empty() {
        Path::new(".")
    } else {
        dir
    };
    let Ok(canonical) = fs::canonicalize(dir) else {
        return Err(SetupError::DirectoryNotFound(dir.to_path_buf()));
    };
    let metadata = fs::metadata(&canonical)?;
    if !metadata.is_dir() {
        return Err(SetupError::DirectoryNotFound(canonical));
    }
    if metadata.permissions().readonly() {
        return Err(SetupError::DirectoryUnwritable(canonical));
    }
    Ok(canonical)
}

/// `<stem>.crush.css`, from `output_file` when set or the host file name.
fn output_name(host: &Path, options: &CompileOptions) -> String {
    let base = options
        .output_file
        .as_deref()
        .and_then(|f| Path::new(f).file_name())
        .or_else(|| host.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = base.strip_suffix(".css").unwrap_or(&base);
    format!("{stem}{OUTPUT_SUFFIX}")
}
