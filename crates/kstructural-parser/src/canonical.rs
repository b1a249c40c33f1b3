//! The canonical syntax: one nested s-expression per file.
//!
//! ```text
//! (document [title Example]
//!   (section [title Introduction] [id intro]
//!     (paragraph Hello (term [type name] world))))
//! ```

mod block;
mod inline;

use std::path::Path;

use log::debug;

use kstructural_core::{annotation::Parse, block::Block};

use crate::{
    error::{Diagnostic, DriverError, ErrorCode},
    expression::Reader,
    resolver::ParseSession,
};

pub(crate) use block::{
    DOCUMENT, FOOTNOTE, FORMAL_ITEM, PARAGRAPH, PART, SECTION, SUBSECTION, parse_import,
};
pub(crate) use inline::parse_inline;

/// Parse a canonical source text holding exactly one block.
pub(crate) fn parse(
    session: &mut ParseSession,
    source: &str,
    file: Option<&Path>,
) -> Result<Block<Parse>, DriverError> {
    let mut reader = Reader::new(source, file);

    let expression = match reader.next() {
        Some(result) => result?,
        None => {
            return Err(Diagnostic::error("Unexpected EOF.")
                .with_code(ErrorCode::E105)
                .with_label(reader.end_position(), "expected a block")
                .into());
        }
    };

    if let Some(trailing) = reader.next() {
        let diagnostic = match trailing {
            Ok(extra) => Diagnostic::error("Unexpected trailing content.")
                .with_code(ErrorCode::E105)
                .with_label(extra.position().clone(), "after the root block")
                .with_help("a canonical file holds exactly one block"),
            Err(err) => return Err(err.into()),
        };
        return Err(diagnostic.into());
    }

    debug!(head = expression.head_symbol().unwrap_or_default(); "Parsing canonical block");
    block::parse_block(session, &expression)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;

    fn diagnostics(source: &str) -> ParseError {
        let mut session = ParseSession::new("/nonexistent-base").unwrap();
        match parse(&mut session, source, None).unwrap_err() {
            DriverError::Parse(err) => err,
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_single_block() {
        let mut session = ParseSession::new("/nonexistent-base").unwrap();
        let block = parse(&mut session, "(paragraph Hello)", None).unwrap();
        assert!(matches!(block, Block::Paragraph(_)));
    }

    #[test]
    fn test_empty_input() {
        let err = diagnostics("  ");
        assert_eq!(err.diagnostics()[0].message(), "Unexpected EOF.");
    }

    #[test]
    fn test_trailing_expression() {
        let err = diagnostics("(paragraph a) (paragraph b)");
        assert_eq!(err.diagnostics()[0].message(), "Unexpected trailing content.");
    }

    #[test]
    fn test_lexical_errors_reported() {
        let err = diagnostics("(paragraph \"\\q\")");
        assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::E003));
    }
}
