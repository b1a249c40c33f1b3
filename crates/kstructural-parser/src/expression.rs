//! S-expression trees and the lazy [`Reader`] that produces them.
//!
//! An [`Expression`] is a bare symbol, a quoted string, or a list written
//! with `(...)` or `[...]`. Every expression remembers the position it was
//! read from and which bracket kind it used.

use std::{fmt, path::Path};

use log::trace;

use kstructural_core::span::{LineIndex, Position, Span};

use crate::{
    error::{Diagnostic, ErrorCode, ParseError},
    lexer::{Bracket, LexFailure, Lexer, Token},
};

/// One node of an s-expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Symbol {
        text: String,
        position: Position,
    },
    Quoted {
        text: String,
        position: Position,
    },
    List {
        square: bool,
        elements: Vec<Expression>,
        position: Position,
    },
}

impl Expression {
    pub fn position(&self) -> &Position {
        match self {
            Expression::Symbol { position, .. }
            | Expression::Quoted { position, .. }
            | Expression::List { position, .. } => position,
        }
    }

    /// The text of a symbol or quoted string.
    pub fn text(&self) -> Option<&str> {
        match self {
            Expression::Symbol { text, .. } | Expression::Quoted { text, .. } => Some(text),
            Expression::List { .. } => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Expression::Symbol { text, .. } => Some(text),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Expression]> {
        match self {
            Expression::List { elements, .. } => Some(elements),
            _ => None,
        }
    }

    pub fn is_square(&self) -> bool {
        matches!(self, Expression::List { square: true, .. })
    }

    /// The leading symbol of a list, e.g. `section` in `(section ...)`.
    pub fn head_symbol(&self) -> Option<&str> {
        self.as_list()?.first()?.as_symbol()
    }
}

/// Strings are written back with `\"` and `\\` escaped.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Symbol { text, .. } => f.write_str(text),
            Expression::Quoted { text, .. } => f.write_str(&escape(text)),
            Expression::List {
                square, elements, ..
            } => {
                let (open, close) = if *square { ('[', ']') } else { ('(', ')') };
                write!(f, "{open}")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{element}")?;
                }
                write!(f, "{close}")
            }
        }
    }
}

/// An open list on the reader's stack.
struct Frame {
    bracket: Bracket,
    start: Span,
    elements: Vec<Expression>,
}

/// Reads top-level expressions from one source text, one at a time.
///
/// Each item is either a complete expression or every lexical error found
/// while reading it. The reader recovers after errors, so iteration can
/// continue and later expressions are still produced.
///
/// ```
/// use kstructural_parser::expression::Reader;
///
/// let mut reader = Reader::new("(a b) [c]", None);
/// assert_eq!(reader.next().unwrap().unwrap().to_string(), "(a b)");
/// assert_eq!(reader.next().unwrap().unwrap().to_string(), "[c]");
/// assert!(reader.next().is_none());
/// ```
pub struct Reader<'a> {
    lexer: Lexer<'a>,
    index: LineIndex,
}

impl<'a> Reader<'a> {
    pub fn new(source: &'a str, file: Option<&Path>) -> Self {
        Self {
            lexer: Lexer::new(source),
            index: LineIndex::new(source, file),
        }
    }

    /// Position of the end of the input, for end-of-file diagnostics.
    pub fn end_position(&self) -> Position {
        let end = self.lexer.offset();
        self.index.position(Span::new(end..end))
    }

    fn lex_error(&self, failure: LexFailure) -> Diagnostic {
        failure.into_diagnostic(&self.index)
    }

    fn read_expression(&mut self) -> Option<Result<Expression, ParseError>> {
        let mut stack: Vec<Frame> = Vec::new();
        let mut errors: Vec<Diagnostic> = Vec::new();

        loop {
            let token = match self.lexer.next_token() {
                Some(Ok(token)) => token,
                Some(Err(failure)) => {
                    errors.push(self.lex_error(failure));
                    if stack.is_empty() {
                        return Some(Err(errors.into()));
                    }
                    continue;
                }
                None => {
                    if let Some(frame) = stack.pop() {
                        errors.push(
                            Diagnostic::error("Unterminated list.")
                                .with_code(ErrorCode::E006)
                                .with_label(self.index.position(frame.start), "list opened here")
                                .with_help(format!(
                                    "add a closing `{}`",
                                    frame.bracket.close_char()
                                )),
                        );
                        return Some(Err(errors.into()));
                    }
                    // Errors are only pending while a list is open.
                    return None;
                }
            };

            let completed = match token.token {
                Token::Open(bracket) => {
                    stack.push(Frame {
                        bracket,
                        start: token.span,
                        elements: Vec::new(),
                    });
                    None
                }
                Token::Close(bracket) => match stack.pop() {
                    None => {
                        errors.push(
                            Diagnostic::error("Unmatched closing bracket.")
                                .with_code(ErrorCode::E004)
                                .with_label(self.index.position(token.span), "nothing to close"),
                        );
                        return Some(Err(errors.into()));
                    }
                    Some(frame) => {
                        if frame.bracket != bracket {
                            errors.push(
                                Diagnostic::error("Mismatched closing bracket.")
                                    .with_code(ErrorCode::E005)
                                    .with_label(
                                        self.index.position(token.span),
                                        format!("expected `{}`", frame.bracket.close_char()),
                                    )
                                    .with_secondary_label(
                                        self.index.position(frame.start),
                                        "list opened here",
                                    ),
                            );
                        }
                        let position = self.index.position(frame.start.union(token.span));
                        Some(Expression::List {
                            square: frame.bracket == Bracket::Square,
                            elements: frame.elements,
                            position,
                        })
                    }
                },
                Token::Symbol(text) => Some(Expression::Symbol {
                    text: text.to_string(),
                    position: self.index.position(token.span),
                }),
                Token::Quoted(text) => Some(Expression::Quoted {
                    text,
                    position: self.index.position(token.span),
                }),
                Token::Whitespace => None,
            };

            if let Some(expression) = completed {
                match stack.last_mut() {
                    Some(parent) => parent.elements.push(expression),
                    None if errors.is_empty() => {
                        trace!(expression:% = expression; "Read expression");
                        return Some(Ok(expression));
                    }
                    None => return Some(Err(errors.into())),
                }
            }
        }
    }
}

impl Iterator for Reader<'_> {
    type Item = Result<Expression, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_expression()
    }
}

/// Read every top-level expression, accumulating all lexical errors.
pub fn read_all(source: &str, file: Option<&Path>) -> Result<Vec<Expression>, ParseError> {
    let mut expressions = Vec::new();
    let mut errors = Vec::new();
    for result in Reader::new(source, file) {
        match result {
            Ok(expression) => expressions.push(expression),
            Err(err) => errors.extend(err.into_diagnostics()),
        }
    }
    if errors.is_empty() {
        Ok(expressions)
    } else {
        Err(errors.into())
    }
}
