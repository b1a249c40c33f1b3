//! Error codes for the kstructural diagnostic system.
//!
//! Error codes are organized by phase:
//! - `E0xx` - Expression reader (lexical) errors
//! - `E1xx` - Parse errors
//! - `E2xx` - Evaluation errors

use std::fmt;

/// Error codes for categorizing diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Reader Errors (E0xx)
    // =========================================================================
    /// Unterminated string literal.
    ///
    /// A string was opened with a quote but never closed.
    E001,

    /// Unexpected character.
    E002,

    /// Invalid escape sequence.
    ///
    /// Only `\"` and `\\` may be escaped inside a string.
    E003,

    /// Unmatched closing bracket.
    ///
    /// A `)` or `]` appeared with no open list.
    E004,

    /// Mismatched closing bracket.
    ///
    /// A list opened with `(` was closed with `]`, or the reverse.
    E005,

    /// Unterminated list.
    ///
    /// The input ended while a list was still open.
    E006,

    // =========================================================================
    // Parse Errors (E1xx)
    // =========================================================================
    /// Input did not match the expected form.
    E100,

    /// Unknown command keyword.
    E101,

    /// Invalid identifier.
    E102,

    /// Block not allowed here.
    ///
    /// The block violates the document hierarchy at this point.
    E103,

    /// Inline content not allowed here.
    E104,

    /// The input did not yield exactly one block.
    E105,

    /// Refusing to access a file outside of the base directory.
    E106,

    /// Cyclic import.
    E107,

    /// Root block is not a document.
    E108,

    /// Malformed or unrecognized XML.
    E109,

    /// Invalid attribute value.
    ///
    /// Covers URIs, image sizes and other attribute values.
    E110,

    /// Invalid link content.
    ///
    /// Links may only contain text and images.
    E111,

    /// A document or section has no content.
    E112,

    // =========================================================================
    // Evaluation Errors (E2xx)
    // =========================================================================
    /// Duplicate identifier.
    E200,

    /// Reference to a nonexistent identifier.
    E201,

    /// Footnote reference to something other than a footnote.
    E202,

    /// Invalid type name.
    E203,

    /// Nested table.
    E204,

    /// Row cell count does not match the declared columns.
    E205,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            // Reader errors
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E003 => "E003",
            ErrorCode::E004 => "E004",
            ErrorCode::E005 => "E005",
            ErrorCode::E006 => "E006",
            // Parse errors
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E102 => "E102",
            ErrorCode::E103 => "E103",
            ErrorCode::E104 => "E104",
            ErrorCode::E105 => "E105",
            ErrorCode::E106 => "E106",
            ErrorCode::E107 => "E107",
            ErrorCode::E108 => "E108",
            ErrorCode::E109 => "E109",
            ErrorCode::E110 => "E110",
            ErrorCode::E111 => "E111",
            ErrorCode::E112 => "E112",
            // Evaluation errors
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
            ErrorCode::E202 => "E202",
            ErrorCode::E203 => "E203",
            ErrorCode::E204 => "E204",
            ErrorCode::E205 => "E205",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "unterminated string literal",
            ErrorCode::E002 => "unexpected character",
            ErrorCode::E003 => "invalid escape sequence",
            ErrorCode::E004 => "unmatched closing bracket",
            ErrorCode::E005 => "mismatched closing bracket",
            ErrorCode::E006 => "unterminated list",
            ErrorCode::E100 => "unexpected form",
            ErrorCode::E101 => "unknown keyword",
            ErrorCode::E102 => "invalid identifier",
            ErrorCode::E103 => "unexpected block",
            ErrorCode::E104 => "unexpected inline content",
            ErrorCode::E105 => "no single block",
            ErrorCode::E106 => "outside base directory",
            ErrorCode::E107 => "cyclic import",
            ErrorCode::E108 => "not a document",
            ErrorCode::E109 => "invalid XML",
            ErrorCode::E110 => "invalid attribute value",
            ErrorCode::E111 => "invalid link content",
            ErrorCode::E112 => "empty container",
            ErrorCode::E200 => "duplicate identifier",
            ErrorCode::E201 => "nonexistent identifier",
            ErrorCode::E202 => "not a footnote",
            ErrorCode::E203 => "invalid type name",
            ErrorCode::E204 => "nested table",
            ErrorCode::E205 => "cell count mismatch",
        }
    }

    /// Returns `true` for codes raised by the evaluator.
    pub fn is_evaluation(&self) -> bool {
        self.as_str().starts_with("E2")
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
