//! The core diagnostic type.
//!
//! A [`Diagnostic`] represents a single error with an optional
//! error code, labeled source positions and help text.

use std::fmt;

use kstructural_core::span::Position;

use crate::error::{error_code::ErrorCode, label::Label};

/// A diagnostic message with source location information.
///
/// # Example
///
/// ```text
/// error[E200]: Duplicate ID.
///   --> intro.sd:10:3
///    |
/// 10 |   (paragraph [id overview] ...)
///    |   ^^^^^^^^^^^^^^^^^^^^^^^^^^^^ duplicate declared here
///    |
///   --> overview.sd:2:1
///    |
///  2 | (section [title "Overview"] [id overview] ...)
///    | ---------------------------------------------- first declared here
///    |
///    = help: identifiers must be unique across the document and its imports
/// ```
#[derive(Debug, Clone)]
pub struct Diagnostic {
    code: Option<ErrorCode>,
    message: String,
    labels: Vec<Label>,
    help: Option<String>,
}

impl Diagnostic {
    /// Create an error diagnostic.
    ///
    /// # Example
    ///
    /// ```
    /// # use kstructural_parser::error::{Diagnostic, ErrorCode};
    /// # use kstructural_core::span::Position;
    ///
    /// let diag = Diagnostic::error("Reference to nonexistent ID.")
    ///     .with_code(ErrorCode::E201)
    ///     .with_label(Position::unknown(), "no block declares `missing`")
    ///     .with_help("declare the identifier with [id missing]");
    /// ```
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            labels: Vec::new(),
            help: None,
        }
    }

    pub fn code(&self) -> Option<ErrorCode> {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// The position of the first primary label, if any.
    pub fn position(&self) -> Option<&Position> {
        self.labels
            .iter()
            .find(|label| label.is_primary())
            .map(Label::position)
    }

    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Add a primary label.
    pub fn with_label(mut self, position: Position, message: impl Into<String>) -> Self {
        self.labels.push(Label::primary(position, message));
        self
    }

    /// Add a secondary label.
    pub fn with_secondary_label(mut self, position: Position, message: impl Into<String>) -> Self {
        self.labels.push(Label::secondary(position, message));
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // "error[E001]: message" or "error: message"
        f.write_str("error")?;
        if let Some(code) = self.code {
            write!(f, "[{}]", code)?;
        }
        write!(f, ": {}", self.message)
    }
}

impl std::error::Error for Diagnostic {}
