//! kstructural - a toolchain for structured documents.
//!
//! Documents are written in one of three interchangeable syntaxes
//! (canonical s-expressions, the imperative command stream, or XML),
//! parsed with imports and includes resolved, evaluated into a numbered and
//! cross-referenced tree, and exported to any of the three syntaxes.

pub mod config;
pub mod export;

mod error;

pub use kstructural_core::{annotation, block, evaluation, identifier, inline, number, span};
pub use kstructural_parser::{Diagnostic, ErrorCode, Evaluated, ParseError, Syntax};

pub use error::KStructuralError;

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{debug, info, trace};

use kstructural_core::{annotation::Parse, block::Document};
use kstructural_parser::ParseSession;

use config::AppConfig;
use export::{ExportedFile, OutputFormat};

/// An evaluated document together with the base directory it was read
/// against.
#[derive(Debug)]
pub struct Compiled {
    pub evaluated: Evaluated,
    pub base: PathBuf,
}

/// Entry point for parsing, evaluating and converting documents.
///
/// # Examples
///
/// ```rust,no_run
/// use kstructural::{Compiler, config::AppConfig, export::OutputFormat};
///
/// let compiler = Compiler::new(AppConfig::default());
///
/// // Parse and evaluate, reporting any diagnostics
/// let compiled = compiler.compile("docs/manual.sd".as_ref())
///     .expect("Failed to compile");
///
/// // Export to XML in memory
/// let files = compiler.export(&compiled, OutputFormat::Xml)
///     .expect("Failed to export");
/// println!("{}", files[0].content);
/// ```
#[derive(Debug, Default)]
pub struct Compiler {
    config: AppConfig,
}

impl Compiler {
    /// Create a compiler with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Parse a document file, resolving its imports and includes.
    ///
    /// # Errors
    ///
    /// Returns [`KStructuralError::Io`] if a file cannot be read and
    /// [`KStructuralError::Parse`] with every diagnostic of the first
    /// failing file otherwise.
    pub fn parse(&self, input: &Path) -> Result<Document<Parse>, KStructuralError> {
        let mut session = self.session(input)?;
        info!(path = input.display().to_string(); "Parsing document");
        let document = kstructural_parser::parse_document(&mut session, input)?;
        debug!("Document parsed successfully");
        Ok(document)
    }

    /// Parse a document held in memory. Imports resolve against the
    /// configured base directory, or the working directory.
    pub fn parse_str(
        &self,
        source: &str,
        syntax: Syntax,
    ) -> Result<Document<Parse>, KStructuralError> {
        let base = self.source_base()?;
        let mut session =
            ParseSession::new(&base).map_err(|err| KStructuralError::io(base, err))?;
        info!(syntax:% = syntax; "Parsing document source");
        Ok(kstructural_parser::parse_document_str(
            &mut session,
            source,
            None,
            syntax,
        )?)
    }

    /// Parse and evaluate a document held in memory.
    pub fn compile_str(&self, source: &str, syntax: Syntax) -> Result<Compiled, KStructuralError> {
        let document = self.parse_str(source, syntax)?;
        let evaluated = kstructural_parser::evaluate(&document)?;
        Ok(Compiled {
            evaluated,
            base: self.source_base()?,
        })
    }

    /// Parse and evaluate a document file.
    ///
    /// # Errors
    ///
    /// As [`Compiler::parse`], plus [`KStructuralError::Parse`] with every
    /// evaluation diagnostic.
    pub fn compile(&self, input: &Path) -> Result<Compiled, KStructuralError> {
        let document = self.parse(input)?;
        let evaluated = kstructural_parser::evaluate(&document)?;
        info!(
            nodes = evaluated.context.node_count(),
            imports = evaluated.context.imports().count();
            "Document evaluated"
        );
        Ok(Compiled {
            evaluated,
            base: self.base_for(input)?,
        })
    }

    /// Render a compiled document in `format`, using the configured layout
    /// and import handling.
    pub fn export(
        &self,
        compiled: &Compiled,
        format: OutputFormat,
    ) -> Result<Vec<ExportedFile>, KStructuralError> {
        let settings = self.config.export();
        let exporter = export::exporter(format, settings.layout());
        info!(format:% = format, keep_imports = settings.keep_imports(); "Exporting document");
        Ok(export::export_files(
            exporter.as_ref(),
            &compiled.evaluated,
            &compiled.base,
            settings.keep_imports(),
        )?)
    }

    /// Compile `input` and write it, converted to `format`, into
    /// `output_dir`. Returns the paths written.
    pub fn convert(
        &self,
        input: &Path,
        output_dir: &Path,
        format: OutputFormat,
    ) -> Result<Vec<PathBuf>, KStructuralError> {
        let compiled = self.compile(input)?;
        let files = self.export(&compiled, format)?;

        let mut written = Vec::with_capacity(files.len());
        for file in files {
            let path = output_dir.join(&file.path);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|err| KStructuralError::io(parent, err))?;
            }
            trace!(path = path.display().to_string(); "Writing output file");
            fs::write(&path, file.content).map_err(|err| KStructuralError::io(&path, err))?;
            written.push(path);
        }
        info!(files = written.len(); "Conversion complete");
        Ok(written)
    }

    fn session(&self, input: &Path) -> Result<ParseSession, KStructuralError> {
        let base = self.base_for(input)?;
        ParseSession::new(&base).map_err(|err| KStructuralError::io(base, err))
    }

    /// The configured base directory, or the directory holding `input`.
    fn base_for(&self, input: &Path) -> Result<PathBuf, KStructuralError> {
        let base = match self.config.parse().base_directory() {
            Some(base) => base,
            None => input
                .parent()
                .filter(|parent| !parent.as_os_str().is_empty())
                .unwrap_or(Path::new(".")),
        };
        std::path::absolute(base).map_err(|err| KStructuralError::io(base, err))
    }

    /// The base directory for sources held in memory.
    fn source_base(&self) -> Result<PathBuf, KStructuralError> {
        let base = self
            .config
            .parse()
            .base_directory()
            .unwrap_or(Path::new("."));
        std::path::absolute(base).map_err(|err| KStructuralError::io(base, err))
    }
}
