//! Error adapter for converting KStructuralError to miette diagnostics.
//!
//! This module provides the bridge between the library's error types and
//! miette's rich diagnostic formatting used in the CLI.
//!
//! # Multi-Error Support
//!
//! A [`ParseError`](kstructural_parser::ParseError) holds every diagnostic
//! of a failed pass, and those diagnostics may point into different files
//! (an importing document and the files it imports). Each diagnostic is
//! rendered independently against the source of the file it points at.

use std::{fmt, fs, path::Path};

use log::debug;
use miette::{Diagnostic as MietteDiagnostic, LabeledSpan, NamedSource, SourceSpan};

use kstructural::KStructuralError;
use kstructural_parser::Diagnostic;

/// Adapter for a single kstructural diagnostic.
pub struct DiagnosticAdapter<'a> {
    diag: &'a Diagnostic,
    /// Source of the file the diagnostic points at, when it can be read.
    src: Option<NamedSource<String>>,
    /// Help text, extended with the locations of labels in other files.
    help: Option<String>,
}

impl<'a> DiagnosticAdapter<'a> {
    /// Create an adapter, reading the source of the diagnostic's file.
    pub fn new(diag: &'a Diagnostic) -> Self {
        let file = diag.position().and_then(|position| position.file());
        let src = file.and_then(|file| match fs::read_to_string(file) {
            Ok(source) => Some(NamedSource::new(file.display().to_string(), source)),
            Err(err) => {
                debug!(path = file.display().to_string(), err:%; "Source unavailable for diagnostic");
                None
            }
        });
        Self::with_source(diag, file, src)
    }

    /// Create an adapter with the source given directly.
    pub fn with_source(
        diag: &'a Diagnostic,
        file: Option<&Path>,
        src: Option<NamedSource<String>>,
    ) -> Self {
        let elsewhere: Vec<String> = diag
            .labels()
            .iter()
            .filter(|label| src.is_none() || label.position().file() != file)
            .filter(|label| label.position().is_known())
            .map(|label| {
                let position = label.position();
                let path = position
                    .file()
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| "<input>".to_string());
                format!(
                    "{}: {path}:{}:{}",
                    label.message(),
                    position.line(),
                    position.column()
                )
            })
            .collect();

        let help = match (diag.help(), elsewhere.is_empty()) {
            (help, true) => help.map(str::to_string),
            (None, false) => Some(elsewhere.join("\n")),
            (Some(help), false) => Some(format!("{help}\n{}", elsewhere.join("\n"))),
        };

        Self { diag, src, help }
    }

    fn file(&self) -> Option<&Path> {
        self.diag.position().and_then(|position| position.file())
    }
}

impl fmt::Debug for DiagnosticAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagnosticAdapter")
            .field("diag", &self.diag)
            .finish()
    }
}

impl fmt::Display for DiagnosticAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.diag.message())
    }
}

impl std::error::Error for DiagnosticAdapter<'_> {}

impl MietteDiagnostic for DiagnosticAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.diag
            .code()
            .map(|c| Box::new(c) as Box<dyn fmt::Display>)
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn fmt::Display>)
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        self.src.as_ref().map(|src| src as &dyn miette::SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        self.src.as_ref()?;
        let file = self.file();
        let labels: Vec<_> = self
            .diag
            .labels()
            .iter()
            .filter(|label| label.position().file() == file)
            .collect();
        if labels.is_empty() {
            return None;
        }

        Some(Box::new(labels.into_iter().map(|label| {
            let span = label.position().span();
            let span = SourceSpan::new(span.start().into(), span.len());
            let message = Some(label.message().to_string());
            if label.is_primary() {
                LabeledSpan::new_primary_with_span(message, span)
            } else {
                LabeledSpan::new_with_span(message, span)
            }
        })))
    }
}

/// Adapter for non-diagnostic [`KStructuralError`] variants.
pub struct ErrorAdapter<'a>(pub &'a KStructuralError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(self.0)
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match &self.0 {
            KStructuralError::Io { .. } => "kstructural::io",
            KStructuralError::Parse(_) => return None,
            KStructuralError::Export(_) => "kstructural::export",
            KStructuralError::Config(_) => "kstructural::config",
        };
        Some(Box::new(code))
    }
}

/// A reportable error that can be rendered by miette.
#[derive(Debug)]
pub enum Reportable<'a> {
    /// A rich diagnostic with source location information.
    Diagnostic(DiagnosticAdapter<'a>),
    /// A simple error without source location.
    Error(ErrorAdapter<'a>),
}

impl fmt::Display for Reportable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reportable::Diagnostic(d) => fmt::Display::fmt(d, f),
            Reportable::Error(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl std::error::Error for Reportable<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Reportable::Diagnostic(_) => None,
            Reportable::Error(e) => std::error::Error::source(e),
        }
    }
}

impl MietteDiagnostic for Reportable<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Diagnostic(d) => d.code(),
            Reportable::Error(e) => e.code(),
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Diagnostic(d) => d.help(),
            Reportable::Error(e) => e.help(),
        }
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        match self {
            Reportable::Diagnostic(d) => d.source_code(),
            Reportable::Error(e) => e.source_code(),
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        match self {
            Reportable::Diagnostic(d) => d.labels(),
            Reportable::Error(e) => e.labels(),
        }
    }
}

/// Convert a [`KStructuralError`] into a list of reportable errors.
///
/// For [`KStructuralError::Parse`], this returns one [`Reportable`] for
/// each diagnostic in the error. For other error variants, this returns a
/// single [`Reportable`].
pub fn to_reportables(err: &KStructuralError) -> Vec<Reportable<'_>> {
    match err {
        KStructuralError::Parse(parse_err) => parse_err
            .diagnostics()
            .iter()
            .map(|d| Reportable::Diagnostic(DiagnosticAdapter::new(d)))
            .collect(),
        _ => vec![Reportable::Error(ErrorAdapter(err))],
    }
}

#[cfg(test)]
mod tests {
    use std::{path::PathBuf, sync::Arc};

    use kstructural::span::{Position, Span};
    use kstructural_parser::{ErrorCode, ParseError};

    use super::*;

    fn at(file: &str, line: usize, range: std::ops::Range<usize>) -> Position {
        let file: Arc<Path> = Arc::from(PathBuf::from(file).as_path());
        Position::new(Some(file), line, 1, Span::new(range))
    }

    #[test]
    fn test_one_reportable_per_diagnostic() {
        let diags = vec![
            Diagnostic::error("first error")
                .with_code(ErrorCode::E101)
                .with_label(at("/nonexistent/a.sd", 1, 0..5), "first"),
            Diagnostic::error("second error")
                .with_code(ErrorCode::E104)
                .with_label(at("/nonexistent/b.sd", 2, 10..15), "second")
                .with_help("help for second"),
        ];
        let err = KStructuralError::Parse(ParseError::from(diags));

        let reportables = to_reportables(&err);
        assert_eq!(reportables.len(), 2);
        assert_eq!(reportables[0].to_string(), "first error");
        assert_eq!(reportables[1].to_string(), "second error");
    }

    #[test]
    fn test_non_parse_error() {
        let err = KStructuralError::Config("bad".to_string());
        let reportables = to_reportables(&err);

        assert_eq!(reportables.len(), 1);
        match &reportables[0] {
            Reportable::Error(e) => {
                assert_eq!(e.to_string(), "Configuration error: bad");
                assert_eq!(e.code().unwrap().to_string(), "kstructural::config");
            }
            Reportable::Diagnostic(_) => panic!("Expected Error"),
        }
    }

    #[test]
    fn test_labels_in_the_same_file_are_shown() {
        let diag = Diagnostic::error("Duplicate ID.")
            .with_label(at("/docs/a.sd", 1, 0..5), "duplicate")
            .with_secondary_label(at("/docs/a.sd", 2, 10..15), "first declared here");
        let src = NamedSource::new("/docs/a.sd", "0123456789abcdefghij".to_string());

        let file = Path::new("/docs/a.sd");
        let adapter = DiagnosticAdapter::with_source(&diag, Some(file), Some(src));

        let labels: Vec<_> = adapter.labels().unwrap().collect();
        assert_eq!(labels.len(), 2);
        assert!(labels[0].primary());
        assert!(!labels[1].primary());
        assert!(adapter.help().is_none());
    }

    #[test]
    fn test_labels_in_other_files_move_to_help() {
        let diag = Diagnostic::error("Duplicate ID.")
            .with_label(at("/docs/b.sd", 1, 0..5), "duplicate")
            .with_secondary_label(at("/docs/a.sd", 3, 10..15), "first declared here");
        let src = NamedSource::new("/docs/b.sd", "0123456789".to_string());

        let file = Path::new("/docs/b.sd");
        let adapter = DiagnosticAdapter::with_source(&diag, Some(file), Some(src));

        let labels: Vec<_> = adapter.labels().unwrap().collect();
        assert_eq!(labels.len(), 1);
        assert_eq!(
            adapter.help().unwrap().to_string(),
            "first declared here: /docs/a.sd:3:1"
        );
    }

    #[test]
    fn test_unreadable_source_keeps_positions_in_help() {
        let diag = Diagnostic::error("Unexpected EOF.")
            .with_label(at("/nonexistent/c.sd", 4, 0..0), "here");

        let adapter = DiagnosticAdapter::new(&diag);

        assert!(adapter.source_code().is_none());
        assert!(adapter.labels().is_none());
        assert_eq!(
            adapter.help().unwrap().to_string(),
            "here: /nonexistent/c.sd:4:1"
        );
    }
}
