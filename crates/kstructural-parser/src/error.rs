//! Error and diagnostic system for kstructural parsing and evaluation.
//!
//! Every problem found while reading, parsing, resolving or evaluating a
//! document is reported as a [`Diagnostic`]: a message with an optional
//! [`ErrorCode`], labeled source [`Position`]s and help text. Phases collect
//! diagnostics with a [`DiagnosticCollector`] so that one pass reports every
//! independent problem, and return them together as a [`ParseError`].
//!
//! Failures to read a file are a separate class. They are never accumulated
//! and surface as [`DriverError::Io`] straight away.
//!
//! # Example
//!
//! ```
//! # use kstructural_parser::error::{Diagnostic, ErrorCode};
//! # use kstructural_core::span::Position;
//!
//! let diag = Diagnostic::error("Duplicate ID.")
//!     .with_code(ErrorCode::E200)
//!     .with_label(Position::unknown(), "duplicate declared here")
//!     .with_secondary_label(Position::unknown(), "first declared here");
//! ```
//!
//! [`Position`]: kstructural_core::span::Position

mod collector;
mod diagnostic;
mod error_code;
mod label;
mod parse_error;

use std::{io, path::PathBuf};

use thiserror::Error;

pub(crate) use collector::DiagnosticCollector;

pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use label::Label;
pub use parse_error::ParseError;

/// Failure of a parse or evaluation driven from a file.
#[derive(Debug, Error)]
pub enum DriverError {
    /// A file could not be read. Not accumulated.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// One or more diagnostics.
    #[error("{0}")]
    Parse(#[from] ParseError),
}

impl DriverError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<Diagnostic> for DriverError {
    fn from(diagnostic: Diagnostic) -> Self {
        Self::Parse(diagnostic.into())
    }
}
