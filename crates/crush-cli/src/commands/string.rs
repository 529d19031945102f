//! `crush string` command implementation.

use std::io::Read;
use std::path::PathBuf;

use clap::Args;

use super::settings::CompileArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the string command.
#[derive(Args, Debug)]
pub(crate) struct StringArgs {
    /// Stylesheet to read; stdin when omitted or `-`.
    input: Option<PathBuf>,

    #[command(flatten)]
    compile: CompileArgs,
}

impl StringArgs {
    /// Compile stylesheet text and print the result. Nothing is written or
    /// cached.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let css = match &self.input {
            Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(path)?,
            _ => {
                let mut text = String::new();
                std::io::stdin().read_to_string(&mut text)?;
                text
            }
        };

        let (crush, options) = self.compile.load()?;
        let compiled = crush.compile_string(&css, &options)?;
        for warning in &compiled.warnings {
            output.warning(&format!("warning: {warning}"));
        }
        output.result(&compiled.css);
        Ok(())
    }
}
