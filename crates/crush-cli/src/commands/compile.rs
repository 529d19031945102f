//! `crush compile` command implementation.

use std::path::PathBuf;

use clap::Args;

use super::settings::CompileArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the compile command.
#[derive(Args, Debug)]
pub(crate) struct CompileFileArgs {
    /// Host stylesheet: a filesystem path, or a `/`-prefixed path under the
    /// document root.
    file: PathBuf,

    /// Name of the compiled file instead of the host file name.
    #[arg(short, long)]
    output_file: Option<String>,

    #[command(flatten)]
    compile: CompileArgs,
}

impl CompileFileArgs {
    /// Compile the host file and print its public reference.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let (crush, mut options) = self.compile.load()?;
        options.output_file = self.output_file;

        let Some(reference) = crush.compile_file(&self.file, &options)? else {
            return Err(CliError::Validation(format!(
                "{} could not be compiled (run with --verbose for details)",
                self.file.display()
            )));
        };
        output.success(&format!("Compiled {}", self.file.display()));
        output.result(&reference);
        Ok(())
    }
}
