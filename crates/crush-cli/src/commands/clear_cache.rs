//! `crush clear-cache` command implementation.

use std::path::PathBuf;

use clap::Args;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the clear-cache command.
#[derive(Args, Debug)]
pub(crate) struct ClearCacheArgs {
    /// Directory holding compiled files.
    #[arg(default_value = ".")]
    dir: PathBuf,
}

impl ClearCacheArgs {
    /// Remove the cache index and compiled files of the directory.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        if !self.dir.is_dir() {
            return Err(CliError::Validation(format!(
                "{} is not a directory",
                self.dir.display()
            )));
        }
        let removed = crush_cache::clear_cache(&self.dir)?;
        output.info(&format!(
            "Removed {removed} compiled file(s) from {}",
            self.dir.display()
        ));
        Ok(())
    }
}
