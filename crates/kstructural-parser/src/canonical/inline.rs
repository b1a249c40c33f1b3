//! Inline forms of the canonical syntax.

use log::trace;

use kstructural_core::{
    annotation::Parse,
    identifier::TypeName,
    inline::{
        FootnoteReference, Image, ImageSize, Inline, Link, LinkContent, LinkTarget, List,
        ListItem, Table, TableBody, TableCell, TableColumnName, TableHead, TableRow, Term, Text,
        Verbatim,
    },
};

use crate::{
    attributes::{
        Dimension, Presence, Shape, argument, meta, parse_attributes, parse_dimension, parse_id,
        parse_text, parse_texts, validate_uri,
    },
    error::{Diagnostic, DriverError, ErrorCode},
    expression::Expression,
    matcher::{
        Matcher, all_of_list, any_string, any_symbol, exact_symbol, form_error, one_of,
        prefix_of_list,
    },
    resolver::ParseSession,
};

pub(crate) const INLINE_KEYWORDS: &[&str] = &[
    "term",
    "verbatim",
    "link",
    "link-ext",
    "footnote-ref",
    "image",
    "include",
    "list-ordered",
    "list-unordered",
    "table",
];

const TERM: Shape = Shape::untitled("term", Presence::Absent);
const VERBATIM: Shape = Shape::untitled("verbatim", Presence::Absent);

fn type_attribute() -> Matcher {
    all_of_list([exact_symbol("type"), any_string()])
}

fn include_form() -> Matcher {
    all_of_list([exact_symbol("include"), any_string()])
}

/// Parse one inline element: a text atom or an inline form.
pub(crate) fn parse_inline(
    session: &mut ParseSession,
    expression: &Expression,
) -> Result<Inline<Parse>, DriverError> {
    if expression.as_list().is_none() {
        return Ok(Inline::Text(parse_text(expression)?));
    }

    let inline = match expression.head_symbol() {
        Some("term") => Inline::Term(term(expression)?),
        Some("verbatim") => Inline::Verbatim(verbatim(session, expression)?),
        Some("link") => Inline::Link(link(session, expression, false)?),
        Some("link-ext") => Inline::Link(link(session, expression, true)?),
        Some("footnote-ref") => Inline::FootnoteReference(footnote_reference(expression)?),
        Some("image") => Inline::Image(image(expression)?),
        Some("include") => Inline::Text(include(session, expression)?),
        Some("list-ordered") => Inline::ListOrdered(list(session, expression)?),
        Some("list-unordered") => Inline::ListUnordered(list(session, expression)?),
        Some("table") => Inline::Table(table(session, expression)?),
        _ => return Err(unknown_inline(expression).into()),
    };
    Ok(inline)
}

fn unknown_inline(expression: &Expression) -> Diagnostic {
    Diagnostic::error("Expected an inline element.")
        .with_code(ErrorCode::E101)
        .with_label(expression.position().clone(), "unknown inline element")
        .with_help(format!(
            "Expected one of: {}\nReceived:\n  {expression}",
            INLINE_KEYWORDS.join(", ")
        ))
}

fn term(expression: &Expression) -> Result<Term<Parse>, Diagnostic> {
    let (attributes, rest) = parse_attributes(expression, &TERM, false)?;
    Ok(Term {
        meta: meta(expression),
        type_name: attributes.type_name,
        content: parse_texts(rest)?,
    })
}

fn verbatim(
    session: &mut ParseSession,
    expression: &Expression,
) -> Result<Verbatim<Parse>, DriverError> {
    let (attributes, rest) = parse_attributes(expression, &VERBATIM, false)?;
    let text = match rest {
        [single] if single.as_list().is_none() => parse_text(single)?,
        [single] if single.head_symbol() == Some("include") => include(session, single)?,
        _ => {
            let keyword = || exact_symbol("verbatim");
            let text = || one_of([any_string(), include_form()]);
            let forms = [
                all_of_list([keyword(), text()]),
                all_of_list([keyword(), type_attribute(), text()]),
            ];
            return Err(form_error(&forms, expression).into());
        }
    };

    Ok(Verbatim {
        meta: meta(expression),
        type_name: attributes.type_name,
        text,
    })
}

/// `(include "file")`, materialized as quoted text.
fn include(
    session: &mut ParseSession,
    expression: &Expression,
) -> Result<Text<Parse>, DriverError> {
    let form = include_form();
    let file = match expression.as_list() {
        Some([_, file]) if form.matches(expression) => file.text().unwrap_or_default(),
        _ => return Err(form_error(&[form], expression).into()),
    };
    session.include(expression.position(), file)
}

fn link(
    session: &mut ParseSession,
    expression: &Expression,
    external: bool,
) -> Result<Link<Parse>, DriverError> {
    let keyword = if external { "link-ext" } else { "link" };
    let target_attribute = all_of_list([exact_symbol("target"), any_string()]);

    let (target, rest) = match expression.as_list() {
        Some([_, target, rest @ ..]) if target_attribute.matches(target) => (target, rest),
        _ => {
            let form = prefix_of_list([exact_symbol(keyword), target_attribute]);
            return Err(form_error(&[form], expression).into());
        }
    };

    let value = argument(target).unwrap_or(target);
    let target = if external {
        LinkTarget::External(validate_uri(
            value.text().unwrap_or_default(),
            value.position(),
        )?)
    } else {
        LinkTarget::Internal(parse_id(value)?)
    };

    let content = rest
        .iter()
        .map(|child| link_content(session, child))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Link {
        meta: meta(expression),
        target,
        content,
    })
}

fn link_content(
    session: &mut ParseSession,
    expression: &Expression,
) -> Result<LinkContent<Parse>, DriverError> {
    let message = match parse_inline(session, expression)? {
        Inline::Text(text) => return Ok(LinkContent::Text(text)),
        Inline::Image(image) => return Ok(LinkContent::Image(image)),
        Inline::Link(_) => "Link elements cannot appear inside link elements",
        Inline::Verbatim(_) => "Verbatim elements cannot appear inside link elements",
        Inline::Term(_) => "Term elements cannot appear inside link elements",
        Inline::ListOrdered(_) | Inline::ListUnordered(_) => {
            "List elements cannot appear inside link elements"
        }
        Inline::Table(_) => "Table elements cannot appear inside link elements",
        Inline::FootnoteReference(_) => {
            "Footnote references cannot appear inside link elements"
        }
    };

    Err(Diagnostic::error(message)
        .with_code(ErrorCode::E111)
        .with_label(expression.position().clone(), "not allowed in a link")
        .with_help("links may only contain text and images")
        .into())
}

fn footnote_reference(expression: &Expression) -> Result<FootnoteReference<Parse>, Diagnostic> {
    let form = all_of_list([exact_symbol("footnote-ref"), any_string()]);
    match expression.as_list() {
        Some([_, target]) if form.matches(expression) => Ok(FootnoteReference {
            meta: meta(expression),
            target: parse_id(target)?,
        }),
        _ => Err(form_error(&[form], expression)),
    }
}

fn image(expression: &Expression) -> Result<Image<Parse>, Diagnostic> {
    let target_attribute = all_of_list([exact_symbol("target"), any_string()]);
    let size_attribute = all_of_list([exact_symbol("size"), any_symbol(), any_symbol()]);

    let (target, mut rest) = match expression.as_list() {
        Some([_, target, rest @ ..]) if target_attribute.matches(target) => (target, rest),
        _ => {
            let keyword = || exact_symbol("image");
            let target = || all_of_list([exact_symbol("target"), any_string()]);
            let size = || all_of_list([exact_symbol("size"), any_symbol(), any_symbol()]);
            let forms = [
                prefix_of_list([keyword(), target()]),
                prefix_of_list([keyword(), target(), type_attribute()]),
                prefix_of_list([keyword(), target(), size()]),
                prefix_of_list([keyword(), target(), type_attribute(), size()]),
            ];
            return Err(form_error(&forms, expression));
        }
    };

    let value = argument(target).unwrap_or(target);
    let target = validate_uri(value.text().unwrap_or_default(), value.position())?;

    let mut type_name = None;
    if let Some((first, tail)) = rest.split_first() {
        if type_attribute().matches(first) {
            type_name = argument(first)
                .and_then(Expression::text)
                .map(TypeName::new);
            rest = tail;
        }
    }

    let mut size = None;
    if let Some((first, tail)) = rest.split_first() {
        if let Some([_, width, height]) = first.as_list().filter(|_| size_attribute.matches(first))
        {
            size = Some(ImageSize {
                width: parse_dimension(
                    width.text().unwrap_or_default(),
                    width.position(),
                    Dimension::Width,
                )?,
                height: parse_dimension(
                    height.text().unwrap_or_default(),
                    height.position(),
                    Dimension::Height,
                )?,
            });
            rest = tail;
        }
    }

    Ok(Image {
        meta: meta(expression),
        type_name,
        target,
        size,
        content: parse_texts(rest)?,
    })
}

fn list(session: &mut ParseSession, expression: &Expression) -> Result<List<Parse>, DriverError> {
    let elements = expression.as_list().unwrap_or_default();
    let item_form = prefix_of_list([exact_symbol("item")]);

    let mut items = Vec::with_capacity(elements.len().saturating_sub(1));
    for child in elements.iter().skip(1) {
        if !item_form.matches(child) {
            return Err(form_error(&[item_form], child).into());
        }
        items.push(ListItem {
            meta: meta(child),
            content: inlines(session, &child.as_list().unwrap_or_default()[1..])?,
        });
    }

    Ok(List {
        meta: meta(expression),
        items,
    })
}

fn inlines(
    session: &mut ParseSession,
    expressions: &[Expression],
) -> Result<Vec<Inline<Parse>>, DriverError> {
    expressions
        .iter()
        .map(|expression| parse_inline(session, expression))
        .collect()
}

fn table_forms() -> Vec<Matcher> {
    let keyword = || exact_symbol("table");
    let summary = || prefix_of_list([exact_symbol("summary")]);
    let head = || prefix_of_list([exact_symbol("head")]);
    let body = || prefix_of_list([exact_symbol("body")]);
    vec![
        all_of_list([keyword(), summary(), body()]),
        all_of_list([keyword(), summary(), head(), body()]),
        all_of_list([keyword(), summary(), type_attribute(), body()]),
        all_of_list([keyword(), summary(), type_attribute(), head(), body()]),
    ]
}

fn table(session: &mut ParseSession, expression: &Expression) -> Result<Table<Parse>, DriverError> {
    let mismatch = || DriverError::from(form_error(&table_forms(), expression));

    let (summary, rest) = match expression.as_list() {
        Some([_, summary, rest @ ..]) if summary.head_symbol() == Some("summary") => {
            (summary, rest)
        }
        _ => return Err(mismatch()),
    };

    let (type_name, rest) = match rest.split_first() {
        Some((first, tail)) if type_attribute().matches(first) => (
            argument(first)
                .and_then(Expression::text)
                .map(TypeName::new),
            tail,
        ),
        _ => (None, rest),
    };

    let (head, body) = match rest {
        [head, body] if head.head_symbol() == Some("head") => (Some(head), body),
        [body] => (None, body),
        _ => return Err(mismatch()),
    };
    if body.head_symbol() != Some("body") {
        return Err(mismatch());
    }

    let head = head.map(table_head).transpose()?;
    let body = table_body(session, body)?;
    trace!(rows = body.rows.len(); "Parsed table");

    Ok(Table {
        meta: meta(expression),
        type_name,
        summary: parse_texts(summary.as_list().map_or(&[][..], |l| &l[1..]))?,
        head,
        body,
    })
}

fn table_head(expression: &Expression) -> Result<TableHead<Parse>, Diagnostic> {
    let name_form = prefix_of_list([exact_symbol("name")]);
    let names = expression
        .as_list()
        .unwrap_or_default()
        .iter()
        .skip(1)
        .map(|name| {
            if !name_form.matches(name) {
                return Err(form_error(std::slice::from_ref(&name_form), name));
            }
            Ok(TableColumnName {
                meta: meta(name),
                content: parse_texts(&name.as_list().unwrap_or_default()[1..])?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(TableHead {
        meta: meta(expression),
        names,
    })
}

fn table_body(
    session: &mut ParseSession,
    expression: &Expression,
) -> Result<TableBody<Parse>, DriverError> {
    let row_form = prefix_of_list([exact_symbol("row")]);
    let cell_form = prefix_of_list([exact_symbol("cell")]);

    let mut rows = Vec::new();
    for row in expression.as_list().unwrap_or_default().iter().skip(1) {
        if !row_form.matches(row) {
            return Err(form_error(&[row_form], row).into());
        }
        let mut cells = Vec::new();
        for cell in row.as_list().unwrap_or_default().iter().skip(1) {
            if !cell_form.matches(cell) {
                return Err(form_error(&[cell_form], cell).into());
            }
            cells.push(TableCell {
                meta: meta(cell),
                content: inlines(session, &cell.as_list().unwrap_or_default()[1..])?,
            });
        }
        rows.push(TableRow {
            meta: meta(row),
            cells,
        });
    }

    Ok(TableBody {
        meta: meta(expression),
        rows,
    })
}

#[cfg(test)]
mod tests {
    use kstructural_core::annotation::Origin;

    use super::*;
    use crate::expression::read_all;

    fn parse(source: &str) -> Result<Inline<Parse>, DriverError> {
        let mut session = ParseSession::new("/nonexistent-base").unwrap();
        let expression = read_all(source, None).unwrap().remove(0);
        parse_inline(&mut session, &expression)
    }

    fn message(result: Result<Inline<Parse>, DriverError>) -> String {
        match result.unwrap_err() {
            DriverError::Parse(err) => err.diagnostics()[0].message().to_string(),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_text_atoms() {
        let Inline::Text(text) = parse("word").unwrap() else {
            panic!("expected text");
        };
        assert_eq!(text.text, "word");
        assert!(!text.quoted);
        assert_eq!(*text.meta.data().origin(), Origin::Source);
    }

    #[test]
    fn test_term_with_type() {
        let Inline::Term(term) = parse("(term [type keyword] a \"b\")").unwrap() else {
            panic!("expected term");
        };
        assert_eq!(term.type_name.unwrap(), "keyword");
        assert_eq!(term.content.len(), 2);
    }

    #[test]
    fn test_verbatim() {
        let Inline::Verbatim(verbatim) = parse("(verbatim \"  x  \")").unwrap() else {
            panic!("expected verbatim");
        };
        assert_eq!(verbatim.text.text, "  x  ");

        let Err(DriverError::Parse(err)) = parse("(verbatim a b)") else {
            panic!("expected a form error");
        };
        let diag = &err.diagnostics()[0];
        assert_eq!(diag.message(), "Input did not match expected form.");
        assert_eq!(
            diag.help(),
            Some(
                "Expected one of:\n  \
                 (verbatim <string> | (include <string>))\n  \
                 (verbatim (type <string>) <string> | (include <string>))\n\
                 Received:\n  (verbatim a b)"
            )
        );
    }

    #[test]
    fn test_links() {
        let Inline::Link(link) = parse("(link [target intro] see (image [target \"a.png\"] x))")
            .unwrap()
        else {
            panic!("expected link");
        };
        assert!(matches!(link.target, LinkTarget::Internal(id) if id == "intro"));
        assert_eq!(link.content.len(), 2);

        let Inline::Link(link) = parse("(link-ext [target \"http://io7m.com\"] home)").unwrap()
        else {
            panic!("expected link");
        };
        assert_eq!(link.target, LinkTarget::External("http://io7m.com".to_string()));
    }

    #[test]
    fn test_link_content_restrictions() {
        assert_eq!(
            message(parse("(link [target a] (link [target b] x))")),
            "Link elements cannot appear inside link elements"
        );
        assert_eq!(
            message(parse("(link [target a] (term x))")),
            "Term elements cannot appear inside link elements"
        );
    }

    #[test]
    fn test_image_size() {
        let Inline::Image(image) = parse("(image [target \"a.png\"] [type fig] [size 64 32] A)")
            .unwrap()
        else {
            panic!("expected image");
        };
        assert_eq!(image.type_name.unwrap(), "fig");
        assert_eq!(
            image.size,
            Some(ImageSize {
                width: 64,
                height: 32
            })
        );
        assert_eq!(image.content.len(), 1);

        assert_eq!(
            message(parse("(image [target \"a.png\"] [size -1 32] A)")),
            "Width is negative"
        );
    }

    #[test]
    fn test_lists() {
        let Inline::ListOrdered(list) = parse("(list-ordered (item a) (item (term b)))").unwrap()
        else {
            panic!("expected list");
        };
        assert_eq!(list.items.len(), 2);

        assert_eq!(
            message(parse("(list-unordered (thing a))")),
            "Input did not match expected form."
        );
    }

    #[test]
    fn test_table() {
        let source = "(table [summary S] (head (name A) (name B)) (body (row (cell 1) (cell 2))))";
        let Inline::Table(table) = parse(source).unwrap() else {
            panic!("expected table");
        };
        assert_eq!(table.summary[0].text, "S");
        assert_eq!(table.head.unwrap().names.len(), 2);
        assert_eq!(table.body.rows[0].cells.len(), 2);

        assert_eq!(
            message(parse("(table [summary S] (head (name A)))")),
            "Input did not match expected form."
        );
    }

    #[test]
    fn test_unknown_inline() {
        assert_eq!(message(parse("(bold x)")), "Expected an inline element.");
    }
}
