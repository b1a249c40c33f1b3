//! Attribute lists shared by the canonical and imperative parsers.
//!
//! Blocks and a few inline elements open with bracketed attributes:
//! `[title ...]` first where the form has a title, then `[id x]` and
//! `[type t]` in either order.

use kstructural_core::{
    annotation::{Meta, Parse},
    identifier::{Id, TypeName},
    inline::Text,
    span::Position,
};

use crate::{
    error::{Diagnostic, ErrorCode},
    expression::Expression,
    matcher::{Matcher, all_of_list, any_string, exact_symbol, prefix_of_list},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Presence {
    Absent,
    Optional,
    Required,
}

/// Which attributes a form accepts.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Shape {
    pub(crate) keyword: &'static str,
    pub(crate) title: bool,
    pub(crate) id: Presence,
    pub(crate) type_name: bool,
}

impl Shape {
    pub(crate) const fn titled(keyword: &'static str) -> Self {
        Self {
            keyword,
            title: true,
            id: Presence::Optional,
            type_name: true,
        }
    }

    pub(crate) const fn untitled(keyword: &'static str, id: Presence) -> Self {
        Self {
            keyword,
            title: false,
            id,
            type_name: true,
        }
    }

    /// The accepted forms, for "Expected one of:" help. `closed` forms take
    /// nothing after their attributes.
    pub(crate) fn forms(&self, closed: bool) -> Vec<Matcher> {
        let id = || all_of_list([exact_symbol("id"), any_string()]);
        let ty = || all_of_list([exact_symbol("type"), any_string()]);

        let orders: Vec<Vec<Matcher>> = match (self.id, self.type_name) {
            (Presence::Absent, false) => vec![vec![]],
            (Presence::Absent, true) => vec![vec![], vec![ty()]],
            (Presence::Optional, false) => vec![vec![], vec![id()]],
            (Presence::Optional, true) => vec![
                vec![],
                vec![id()],
                vec![id(), ty()],
                vec![ty()],
                vec![ty(), id()],
            ],
            (Presence::Required, false) => vec![vec![id()]],
            (Presence::Required, true) => vec![vec![id()], vec![id(), ty()], vec![ty(), id()]],
        };

        orders
            .into_iter()
            .map(|order| {
                let mut elements = vec![exact_symbol(self.keyword)];
                if self.title {
                    elements.push(prefix_of_list([exact_symbol("title")]));
                }
                elements.extend(order);
                if closed {
                    all_of_list(elements)
                } else {
                    prefix_of_list(elements)
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Attributes {
    pub(crate) title: Vec<Text<Parse>>,
    pub(crate) id: Option<Id>,
    pub(crate) type_name: Option<TypeName>,
}

/// Parse the attributes of `form`, a list starting with `shape.keyword`.
///
/// Returns the attributes and the elements following them.
pub(crate) fn parse_attributes<'e>(
    form: &'e Expression,
    shape: &Shape,
    closed: bool,
) -> Result<(Attributes, &'e [Expression]), Diagnostic> {
    let mismatch = || crate::matcher::form_error(&shape.forms(closed), form);

    let elements = form.as_list().ok_or_else(mismatch)?;
    let mut rest = elements.get(1..).ok_or_else(mismatch)?;
    let mut attributes = Attributes::default();

    if shape.title {
        let (first, tail) = rest.split_first().ok_or_else(mismatch)?;
        if first.head_symbol() != Some("title") {
            return Err(mismatch());
        }
        attributes.title = parse_texts(first.as_list().map_or(&[][..], |l| &l[1..]))?;
        rest = tail;
    }

    let id_matcher = all_of_list([exact_symbol("id"), any_string()]);
    let type_matcher = all_of_list([exact_symbol("type"), any_string()]);
    while let Some((first, tail)) = rest.split_first() {
        if shape.id != Presence::Absent && attributes.id.is_none() && id_matcher.matches(first) {
            if let Some(value) = argument(first) {
                attributes.id = Some(parse_id(value)?);
            }
        } else if shape.type_name
            && attributes.type_name.is_none()
            && type_matcher.matches(first)
        {
            attributes.type_name = argument(first)
                .and_then(Expression::text)
                .map(TypeName::new);
        } else {
            break;
        }
        rest = tail;
    }

    if shape.id == Presence::Required && attributes.id.is_none() {
        return Err(mismatch());
    }
    if closed && !rest.is_empty() {
        return Err(mismatch());
    }
    Ok((attributes, rest))
}

/// Node metadata for a node read from `expression`.
pub(crate) fn meta(expression: &Expression) -> Meta<Parse> {
    Meta::new(
        expression.position().clone(),
        expression.is_square(),
        Parse::source(),
    )
}

/// A bare symbol or quoted string as text.
pub(crate) fn parse_text(expression: &Expression) -> Result<Text<Parse>, Diagnostic> {
    match expression {
        Expression::Symbol { text, .. } => Ok(Text {
            meta: meta(expression),
            text: text.clone(),
            quoted: false,
        }),
        Expression::Quoted { text, .. } => Ok(Text {
            meta: meta(expression),
            text: text.clone(),
            quoted: true,
        }),
        Expression::List { .. } => Err(Diagnostic::error(
            "Expected text, but received an inline command.",
        )
        .with_code(ErrorCode::E100)
        .with_label(expression.position().clone(), "expected a symbol or string")
        .with_help(format!("Received:\n  {expression}"))),
    }
}

pub(crate) fn parse_texts(expressions: &[Expression]) -> Result<Vec<Text<Parse>>, Diagnostic> {
    expressions.iter().map(parse_text).collect()
}

pub(crate) fn parse_id(expression: &Expression) -> Result<Id, Diagnostic> {
    let text = expression.text().unwrap_or_default();
    Id::parse(text).map_err(|err| {
        Diagnostic::error(err.to_string())
            .with_code(ErrorCode::E102)
            .with_label(expression.position().clone(), "invalid identifier")
            .with_help("identifiers consist of letters, digits, `_`, `-` and `.`")
    })
}

/// The argument of a two-element attribute such as `[target x]`.
pub(crate) fn argument(attribute: &Expression) -> Option<&Expression> {
    attribute.as_list()?.get(1)
}

/// Check a URI value. Anything non-empty without whitespace or control
/// characters is accepted.
pub(crate) fn validate_uri(text: &str, position: &Position) -> Result<String, Diagnostic> {
    let reason = if text.is_empty() {
        Some("URI is empty")
    } else if text.chars().any(char::is_whitespace) {
        Some("URI contains whitespace")
    } else if text.chars().any(char::is_control) {
        Some("URI contains control characters")
    } else {
        None
    };

    match reason {
        None => Ok(text.to_string()),
        Some(reason) => Err(Diagnostic::error(format!("Invalid URI: {reason}"))
            .with_code(ErrorCode::E110)
            .with_label(position.clone(), "invalid URI")
            .with_help(format!("Received:\n  {text:?}"))),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Dimension {
    Width,
    Height,
}

/// Parse an image width or height.
pub(crate) fn parse_dimension(
    text: &str,
    position: &Position,
    dimension: Dimension,
) -> Result<u64, Diagnostic> {
    let value: i64 = text.parse().map_err(|err| {
        Diagnostic::error(format!("Invalid width or height: {err}"))
            .with_code(ErrorCode::E110)
            .with_label(position.clone(), "expected an integer")
    })?;

    u64::try_from(value).map_err(|_| {
        let message = match dimension {
            Dimension::Width => "Width is negative",
            Dimension::Height => "Height is negative",
        };
        Diagnostic::error(message)
            .with_code(ErrorCode::E110)
            .with_label(position.clone(), "must not be negative")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::read_all;

    fn expr(source: &str) -> Expression {
        read_all(source, None).unwrap().remove(0)
    }

    const SECTION: Shape = Shape::titled("section");
    const FOOTNOTE: Shape = Shape::untitled("footnote", Presence::Required);

    #[test]
    fn test_title_then_id_and_type_in_any_order() {
        let form = expr("(section [title A \"b c\"] [type t] [id s1] (paragraph x))");
        let (attributes, rest) = parse_attributes(&form, &SECTION, false).unwrap();

        let title: Vec<_> = attributes.title.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(title, ["A", "b c"]);
        assert!(!attributes.title[0].quoted);
        assert!(attributes.title[1].quoted);
        assert_eq!(attributes.id.unwrap(), "s1");
        assert_eq!(attributes.type_name.unwrap(), "t");
        assert_eq!(rest.len(), 1);
    }

    #[test]
    fn test_missing_title_is_form_error() {
        let form = expr("(section [id s1])");
        let err = parse_attributes(&form, &SECTION, false).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::E100));
        assert!(err.help().unwrap().contains("(section (title ...) (id <string>) ...)"));
    }

    #[test]
    fn test_required_id() {
        let form = expr("(footnote [type t] x)");
        assert!(parse_attributes(&form, &FOOTNOTE, false).is_err());

        let form = expr("(footnote [id \"f1\"] x)");
        let (attributes, rest) = parse_attributes(&form, &FOOTNOTE, false).unwrap();
        assert_eq!(attributes.id.unwrap(), "f1");
        assert_eq!(rest.len(), 1);
    }

    #[test]
    fn test_invalid_id() {
        let form = expr("(section [title T] [id \"not valid\"])");
        let err = parse_attributes(&form, &SECTION, false).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::E102));
    }

    #[test]
    fn test_closed_form_rejects_content() {
        let form = expr("(section [title T] extra)");
        assert!(parse_attributes(&form, &SECTION, true).is_err());
        let form = expr("(section [title T] [id s])");
        assert!(parse_attributes(&form, &SECTION, true).is_ok());
    }

    #[test]
    fn test_repeated_attribute_is_left_as_content() {
        let form = expr("(section [title T] [id a] [id b])");
        let (attributes, rest) = parse_attributes(&form, &SECTION, false).unwrap();
        assert_eq!(attributes.id.unwrap(), "a");
        assert_eq!(rest.len(), 1);
    }

    #[test]
    fn test_uri_validation() {
        let position = Position::unknown();
        assert_eq!(
            validate_uri("http://example.com/a.png", &position).unwrap(),
            "http://example.com/a.png"
        );
        assert!(validate_uri("", &position).is_err());
        let err = validate_uri("a b", &position).unwrap_err();
        assert_eq!(err.message(), "Invalid URI: URI contains whitespace");
    }

    #[test]
    fn test_dimensions() {
        let position = Position::unknown();
        assert_eq!(parse_dimension("640", &position, Dimension::Width).unwrap(), 640);

        let err = parse_dimension("-1", &position, Dimension::Height).unwrap_err();
        assert_eq!(err.message(), "Height is negative");

        let err = parse_dimension("wide", &position, Dimension::Width).unwrap_err();
        assert!(err.message().starts_with("Invalid width or height: "));
    }

    #[test]
    fn test_text_rejects_lists() {
        let err = parse_text(&expr("(term x)")).unwrap_err();
        assert_eq!(err.message(), "Expected text, but received an inline command.");
    }
}
