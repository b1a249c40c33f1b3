//! CLI logic for the kstructural document tool.
//!
//! This module contains the core CLI logic: loading configuration, then
//! checking or converting the input document through [`Compiler`].

pub mod error_adapter;

mod args;
mod config;

pub use args::{Args, Command};

use std::path::Path;

use log::info;

use kstructural::{Compiler, KStructuralError};

use config::Overrides;

/// Run the kstructural CLI application
///
/// # Errors
///
/// Returns `KStructuralError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Parse and evaluation errors, carrying every diagnostic
/// - Export errors
pub fn run(args: &Args) -> Result<(), KStructuralError> {
    let loaded = config::load_config(args.config.as_ref())?;

    match &args.command {
        Command::Check { input } => {
            info!(input_path = input; "Checking document");
            let overrides = Overrides {
                base_directory: args.base_directory.as_deref(),
                ..Overrides::default()
            };
            let compiler = Compiler::new(config::apply_overrides(loaded, &overrides)?);

            let compiled = compiler.compile(Path::new(input))?;
            info!(
                input_path = input,
                blocks = compiled.evaluated.context.numbered_blocks().count();
                "Document is valid"
            );
        }
        Command::Convert {
            input,
            output,
            format,
            keep_imports,
        } => {
            let overrides = Overrides {
                format: format.as_deref(),
                base_directory: args.base_directory.as_deref(),
                keep_imports: *keep_imports,
            };
            let compiler = Compiler::new(config::apply_overrides(loaded, &overrides)?);
            let format = compiler.config().export().format();
            info!(input_path = input, output_path = output, format:% = format; "Converting document");

            let written = compiler.convert(Path::new(input), Path::new(output), format)?;
            for path in &written {
                info!(output_file = path.display().to_string(); "Wrote file");
            }
        }
    }

    Ok(())
}
