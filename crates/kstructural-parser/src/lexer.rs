//! Lexical analyzer for s-expression source text.
//!
//! The lexer splits source text into brackets, bare symbols, quoted strings
//! and whitespace. It is driven one token at a time by the
//! [`Reader`](crate::expression::Reader) and recovers after errors, so a
//! single pass reports every lexical problem in the input.

use winnow::{
    Parser as _,
    combinator::{alt, cut_err, repeat, terminated},
    error::{AddContext, ContextError, ErrMode, ModalResult},
    stream::{LocatingSlice, Location, Stream},
    token::{none_of, one_of, take_while},
};

use kstructural_core::span::{LineIndex, Span};

use crate::error::{Diagnostic, ErrorCode};

/// Rich diagnostic information for lexer errors.
///
/// Attached to winnow errors via `.context()`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LexerDiagnostic {
    code: ErrorCode,
    message: &'static str,
    help: Option<&'static str>,
    /// The error span covers from `start` to the error position.
    start: usize,
}

type Input<'a> = LocatingSlice<&'a str>;
type IResult<O> = ModalResult<O, ContextError<LexerDiagnostic>>;

/// Which kind of bracket opened or closed a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Bracket {
    Round,
    Square,
}

impl Bracket {
    pub(crate) fn close_char(&self) -> char {
        match self {
            Bracket::Round => ')',
            Bracket::Square => ']',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token<'a> {
    Open(Bracket),
    Close(Bracket),
    Symbol(&'a str),
    Quoted(String),
    Whitespace,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PositionedToken<'a> {
    pub(crate) token: Token<'a>,
    pub(crate) span: Span,
}

fn is_symbol_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '(' | ')' | '[' | ']' | '"')
}

/// Parse an escape sequence after the backslash. Only `\"` and `\\` exist.
fn string_escape(input: &mut Input<'_>) -> IResult<char> {
    let escape_start = input.current_token_start();

    let backslash: IResult<char> = '\\'.parse_next(input);
    backslash?;

    let escaped: IResult<char> = one_of(['"', '\\']).parse_next(input);
    escaped.map_err(|_| {
        ErrMode::Cut(ContextError::new().add_context(
            input,
            &input.checkpoint(),
            LexerDiagnostic {
                code: ErrorCode::E003,
                message: "invalid escape sequence",
                help: Some("only `\\\"` and `\\\\` may be escaped"),
                start: escape_start,
            },
        ))
    })
}

/// Parse a quoted string. Strings may span lines.
fn quoted<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    let string_content = repeat(0.., alt((string_escape, none_of(['"', '\\'])))).fold(
        String::new,
        |mut acc, ch| {
            acc.push(ch);
            acc
        },
    );

    let start_pos = input.current_token_start();

    let opening: IResult<char> = '"'.parse_next(input);
    opening?;

    cut_err(terminated(string_content, '"'))
        .context(LexerDiagnostic {
            code: ErrorCode::E001,
            message: "unterminated string literal",
            help: Some("add closing `\"`"),
            start: start_pos,
        })
        .parse_next(input)
        .map(Token::Quoted)
}

fn symbol<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    take_while(1.., is_symbol_char)
        .map(Token::Symbol)
        .parse_next(input)
}

fn bracket<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    one_of(['(', '[', ')', ']'])
        .map(|c| match c {
            '(' => Token::Open(Bracket::Round),
            '[' => Token::Open(Bracket::Square),
            ')' => Token::Close(Bracket::Round),
            _ => Token::Close(Bracket::Square),
        })
        .parse_next(input)
}

fn whitespace<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    take_while(1.., char::is_whitespace)
        .value(Token::Whitespace)
        .parse_next(input)
}

fn positioned_token<'a>(input: &mut Input<'a>) -> IResult<PositionedToken<'a>> {
    let start_pos = input.current_token_start();

    let token = alt((
        quoted, // Must come before symbol
        bracket,
        whitespace,
        symbol,
    ))
    .parse_next(input)?;

    let end_pos = input.current_token_start();

    Ok(PositionedToken {
        token,
        span: Span::new(start_pos..end_pos),
    })
}

/// Pull-based lexer over one source text.
pub(crate) struct Lexer<'a> {
    input: Input<'a>,
}

impl<'a> Lexer<'a> {
    pub(crate) fn new(source: &'a str) -> Self {
        Self {
            input: LocatingSlice::new(source),
        }
    }

    /// The next significant token, skipping whitespace.
    ///
    /// Returns `None` at end of input. After a lexical error the lexer has
    /// already recovered and may be called again.
    pub(crate) fn next_token(&mut self) -> Option<Result<PositionedToken<'a>, LexFailure>> {
        while !self.input.is_empty() {
            match positioned_token(&mut self.input) {
                Ok(PositionedToken {
                    token: Token::Whitespace,
                    ..
                }) => continue,
                Ok(token) => return Some(Ok(token)),
                Err(e) => {
                    let error_pos = self.input.current_token_start();
                    let failure = convert_err_mode(e, error_pos);
                    if failure.code == ErrorCode::E003 {
                        self.skip_rest_of_string();
                    } else if !self.input.is_empty() {
                        self.input.next_token();
                    }
                    return Some(Err(failure));
                }
            }
        }
        None
    }

    /// Skip past the closing quote of a string containing a bad escape, so
    /// the remainder is not misread as a new unterminated string.
    fn skip_rest_of_string(&mut self) {
        while let Some(c) = self.input.next_token() {
            match c {
                '"' => return,
                '\\' => {
                    self.input.next_token();
                }
                _ => {}
            }
        }
    }

    /// Byte offset of the next unread character.
    pub(crate) fn offset(&self) -> usize {
        self.input.current_token_start()
    }
}

/// A lexical error, located by byte span only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LexFailure {
    pub(crate) code: ErrorCode,
    pub(crate) message: &'static str,
    pub(crate) help: Option<&'static str>,
    pub(crate) span: Span,
}

impl LexFailure {
    pub(crate) fn into_diagnostic(self, index: &LineIndex) -> Diagnostic {
        let diag = Diagnostic::error(self.message)
            .with_code(self.code)
            .with_label(index.position(self.span), self.code.description());
        match self.help {
            Some(help) => diag.with_help(help),
            None => diag,
        }
    }
}

/// Convert an `ErrMode` and error position to a [`LexFailure`].
///
/// Falls back to E002 (unexpected character) when no context is attached.
fn convert_err_mode(err: ErrMode<ContextError<LexerDiagnostic>>, error_pos: usize) -> LexFailure {
    let context_error = match err {
        ErrMode::Backtrack(ctx) | ErrMode::Cut(ctx) => ctx,
        ErrMode::Incomplete(_) => ContextError::new(),
    };

    match context_error.context().next() {
        Some(LexerDiagnostic {
            code,
            message,
            help,
            start,
        }) => LexFailure {
            code: *code,
            message: *message,
            help: *help,
            span: Span::new(*start..error_pos),
        },
        None => LexFailure {
            code: ErrorCode::E002,
            message: "unexpected character",
            help: None,
            span: Span::new(error_pos..error_pos.saturating_add(1)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(source: &str) -> Vec<Result<Token<'_>, ErrorCode>> {
        let mut lexer = Lexer::new(source);
        let mut out = Vec::new();
        while let Some(result) = lexer.next_token() {
            out.push(result.map(|t| t.token).map_err(|f| f.code));
        }
        out
    }

    #[test]
    fn test_brackets_and_symbols() {
        assert_eq!(
            tokens("(section [id s1])"),
            vec![
                Ok(Token::Open(Bracket::Round)),
                Ok(Token::Symbol("section")),
                Ok(Token::Open(Bracket::Square)),
                Ok(Token::Symbol("id")),
                Ok(Token::Symbol("s1")),
                Ok(Token::Close(Bracket::Square)),
                Ok(Token::Close(Bracket::Round)),
            ]
        );
    }

    #[test]
    fn test_quoted_strings() {
        assert_eq!(
            tokens(r#""a \"quoted\" \\ word""#),
            vec![Ok(Token::Quoted(r#"a "quoted" \ word"#.to_string()))]
        );
        assert_eq!(
            tokens("\"two\nlines\""),
            vec![Ok(Token::Quoted("two\nlines".to_string()))]
        );
        assert_eq!(tokens(r#""""#), vec![Ok(Token::Quoted(String::new()))]);
    }

    #[test]
    fn test_symbol_stops_at_quote() {
        assert_eq!(
            tokens(r#"abc"d""#),
            vec![
                Ok(Token::Symbol("abc")),
                Ok(Token::Quoted("d".to_string()))
            ]
        );
    }

    #[test]
    fn test_spans() {
        let mut lexer = Lexer::new("  (ab \"c\")");
        let open = lexer.next_token().unwrap().unwrap();
        let ab = lexer.next_token().unwrap().unwrap();
        let c = lexer.next_token().unwrap().unwrap();

        assert_eq!(open.span, Span::new(2..3));
        assert_eq!(ab.span, Span::new(3..5));
        assert_eq!(c.span, Span::new(6..9));
    }

    #[test]
    fn test_unterminated_string() {
        let mut lexer = Lexer::new("(a \"open");
        lexer.next_token();
        lexer.next_token();
        let err = lexer.next_token().unwrap().unwrap_err();

        assert_eq!(err.code, ErrorCode::E001);
        assert_eq!(err.span, Span::new(3..8));
        assert!(lexer.next_token().is_none());
    }

    #[test]
    fn test_invalid_escape_recovers_after_string() {
        assert_eq!(
            tokens(r#""bad \q escape" next"#),
            vec![Err(ErrorCode::E003), Ok(Token::Symbol("next"))]
        );
    }

    #[test]
    fn test_multiple_errors_reported() {
        let results = tokens(r#""\x" ok "\y""#);
        let errors: Vec<_> = results.iter().filter(|r| r.is_err()).collect();
        assert_eq!(errors.len(), 2);
        assert!(results.contains(&Ok(Token::Symbol("ok"))));
    }
}
