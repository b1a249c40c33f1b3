//! The imperative syntax: a flat stream of block commands and inline content.
//!
//! ```text
//! (document [title Example])
//! (section [title Introduction] [id intro])
//! (paragraph)
//! Hello (term [type name] world)
//! ```
//!
//! Unlike the canonical parser, the imperative parser keeps going after an
//! error and reports every problem in the file. After a rejected block
//! command the inline content that follows it is dropped, since it has
//! nowhere sensible to go.

mod builder;
mod command;

use std::path::Path;

use log::{debug, trace};

use kstructural_core::{annotation::Parse, block::Block};

use crate::{
    error::{Diagnostic, DiagnosticCollector, DriverError, ErrorCode},
    expression::{Expression, Reader},
    resolver::ParseSession,
};

use builder::Builder;
use command::Statement;

/// The state threaded through the statements of one file.
struct Progress {
    builder: Builder,
    block_failed: bool,
    errors: DiagnosticCollector,
}

impl Progress {
    fn new() -> Self {
        Self {
            builder: Builder::new(),
            block_failed: false,
            errors: DiagnosticCollector::new(),
        }
    }

    fn step(
        &mut self,
        session: &mut ParseSession,
        expression: &Expression,
    ) -> Result<(), DriverError> {
        let statement = match command::parse_statement(session, expression) {
            Ok(statement) => statement,
            Err(DriverError::Parse(err)) => {
                self.errors.extend(err.into_diagnostics());
                return Ok(());
            }
            Err(err) => return Err(err),
        };

        match statement {
            Statement::Open(block) => {
                let result = self.builder.open(block);
                self.submit(result);
            }
            Statement::Imported(block) => {
                let result = self.builder.attach(block);
                self.submit(result);
            }
            Statement::Inline(inline) => {
                if self.block_failed {
                    trace!(position:% = inline.meta().position(); "Dropping inline content after failed block command");
                } else if let Err(diagnostic) = self.builder.inline(inline) {
                    self.errors.emit(diagnostic);
                }
            }
        }
        Ok(())
    }

    fn submit(&mut self, result: Result<(), Diagnostic>) {
        match result {
            Ok(()) => self.block_failed = false,
            Err(diagnostic) => {
                debug!(message = diagnostic.message(); "Block command rejected");
                self.errors.emit(diagnostic);
                self.block_failed = true;
            }
        }
    }

    fn finish(mut self, end: &Reader<'_>) -> Result<Block<Parse>, DriverError> {
        let block = match self.builder.finish() {
            Ok(block) => block,
            Err(diagnostic) => {
                self.errors.emit(diagnostic);
                None
            }
        };
        self.errors.finish()?;

        block.ok_or_else(|| {
            Diagnostic::error("Parsed file did not yield a single block")
                .with_code(ErrorCode::E105)
                .with_label(end.end_position(), "end of input")
                .into()
        })
    }
}

/// Parse an imperative source text into its root block.
pub(crate) fn parse(
    session: &mut ParseSession,
    source: &str,
    file: Option<&Path>,
) -> Result<Block<Parse>, DriverError> {
    let mut reader = Reader::new(source, file);
    let mut progress = Progress::new();

    for result in reader.by_ref() {
        match result {
            Ok(expression) => progress.step(session, &expression)?,
            Err(err) => progress.errors.extend(err.into_diagnostics()),
        }
    }

    progress.finish(&reader)
}

#[cfg(test)]
mod tests {
    use kstructural_core::block::{DocumentContent, SectionContent};

    use super::*;
    use crate::error::ParseError;

    fn run(source: &str) -> Result<Block<Parse>, DriverError> {
        let mut session = ParseSession::new("/nonexistent-base").unwrap();
        parse(&mut session, source, None)
    }

    fn errors(source: &str) -> ParseError {
        match run(source).unwrap_err() {
            DriverError::Parse(err) => err,
            other => panic!("unexpected error: {other}"),
        }
    }

    fn messages(err: &ParseError) -> Vec<&str> {
        err.diagnostics().iter().map(Diagnostic::message).collect()
    }

    #[test]
    fn test_simple_document() {
        let block = run(
            "(document [title T])
             (section [title S])
             (paragraph)
             Hello \"there\" (term world)",
        )
        .unwrap();

        let Block::Document(document) = block else {
            panic!("expected document");
        };
        let DocumentContent::Sections(sections) = document.content else {
            panic!("expected sections");
        };
        let SectionContent::Content(content) = &sections[0].content else {
            panic!("expected content");
        };
        assert_eq!(content.len(), 1);
    }

    #[test]
    fn test_independent_errors_accumulate() {
        let err = errors(
            "(document [title T])
             (section [title S])
             (paragraph)
             x
             (part [title P])
             dropped
             (paragraph)
             y
             (subsection [title U])
             (bogus z)",
        );
        assert_eq!(
            messages(&err),
            [
                "Unexpected part.",
                "Unexpected subsection.",
                "Expected an inline element."
            ]
        );
    }

    #[test]
    fn test_inline_after_failed_command_is_dropped() {
        // Without the drop, `dropped` would be reported as unexpected inline
        // content as well.
        let err = errors(
            "(document [title T])
             (part [title P])
             (paragraph)
             dropped",
        );
        assert_eq!(messages(&err), ["Unexpected paragraph."]);
    }

    #[test]
    fn test_successful_command_resets_failure() {
        let err = errors(
            "(document [title T])
             (subsection [title X])
             (section [title S])
             x",
        );
        assert_eq!(
            messages(&err),
            [
                "Unexpected subsection.",
                "Unexpected inline content.",
                "Sections cannot be empty"
            ]
        );
    }

    #[test]
    fn test_statement_errors_do_not_set_block_failed() {
        let err = errors(
            "(section [title S])
             (paragraph)
             (term [type])
             kept",
        );
        assert_eq!(
            messages(&err),
            ["Expected text, but received an inline command."]
        );
    }

    #[test]
    fn test_empty_file() {
        let err = errors("");
        assert_eq!(
            messages(&err),
            ["Parsed file did not yield a single block"]
        );
    }

    #[test]
    fn test_final_failure_reported_with_earlier_errors() {
        let err = errors(
            "(document [title T])
             stray
             (section [title S])",
        );
        assert_eq!(
            messages(&err),
            ["Unexpected inline content.", "Sections cannot be empty"]
        );
    }

    #[test]
    fn test_lexical_errors_accumulate() {
        let err = errors("(section [title S]) (paragraph) \"\\q\" ) ok");
        let codes: Vec<_> = err.diagnostics().iter().filter_map(Diagnostic::code).collect();
        assert_eq!(codes, [ErrorCode::E003, ErrorCode::E004]);
    }
}
