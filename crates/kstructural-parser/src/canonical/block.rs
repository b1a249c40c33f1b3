//! Block forms of the canonical syntax.

use kstructural_core::{
    annotation::Parse,
    block::{Block, Document, Footnote, FormalItem, Import, Paragraph, Part, Section, Subsection},
    inline::Inline,
};

use super::inline::parse_inline;
use crate::{
    attributes::{Presence, Shape, meta, parse_attributes, parse_text},
    error::{Diagnostic, DriverError, ErrorCode},
    expression::Expression,
    matcher::{all_of_list, any_string, exact_symbol, form_error},
    nesting,
    resolver::ParseSession,
};

pub(crate) const BLOCK_KEYWORDS: &[&str] = &[
    "document",
    "part",
    "section",
    "subsection",
    "paragraph",
    "formal-item",
    "footnote",
    "import",
];

pub(crate) const DOCUMENT: Shape = Shape::titled("document");
pub(crate) const PART: Shape = Shape::titled("part");
pub(crate) const SECTION: Shape = Shape::titled("section");
pub(crate) const SUBSECTION: Shape = Shape::titled("subsection");
pub(crate) const PARAGRAPH: Shape = Shape::untitled("paragraph", Presence::Optional);
pub(crate) const FORMAL_ITEM: Shape = Shape::titled("formal-item");
pub(crate) const FOOTNOTE: Shape = Shape::untitled("footnote", Presence::Required);

/// Parse one block form. `import` directives are resolved on the spot, so the
/// result is never [`Block::Import`].
pub(crate) fn parse_block(
    session: &mut ParseSession,
    expression: &Expression,
) -> Result<Block<Parse>, DriverError> {
    let block = match expression.head_symbol() {
        Some("document") => Block::Document(document(session, expression)?),
        Some("part") => Block::Part(part(session, expression)?),
        Some("section") => Block::Section(section(session, expression)?),
        Some("subsection") => Block::Subsection(subsection(session, expression)?),
        Some("paragraph") => Block::Paragraph(paragraph(session, expression)?),
        Some("formal-item") => Block::FormalItem(formal_item(session, expression)?),
        Some("footnote") => Block::Footnote(footnote(session, expression)?),
        Some("import") => session.import(parse_import(expression)?)?,
        _ => return Err(unknown_block(expression).into()),
    };
    Ok(block)
}

pub(crate) fn unknown_block(expression: &Expression) -> Diagnostic {
    Diagnostic::error("Expected a block command.")
        .with_code(ErrorCode::E101)
        .with_label(expression.position().clone(), "unknown block command")
        .with_help(format!(
            "Expected one of: {}\nReceived:\n  {expression}",
            BLOCK_KEYWORDS.join(", ")
        ))
}

/// `(import "file")`, unresolved.
pub(crate) fn parse_import(expression: &Expression) -> Result<Import<Parse>, Diagnostic> {
    let form = all_of_list([exact_symbol("import"), any_string()]);
    match expression.as_list() {
        Some([_, file]) if form.matches(expression) => Ok(Import {
            meta: meta(expression),
            file: parse_text(file)?,
        }),
        _ => Err(form_error(&[form], expression)),
    }
}

fn blocks(
    session: &mut ParseSession,
    expressions: &[Expression],
) -> Result<Vec<Block<Parse>>, DriverError> {
    expressions
        .iter()
        .map(|expression| parse_block(session, expression))
        .collect()
}

fn document(
    session: &mut ParseSession,
    expression: &Expression,
) -> Result<Document<Parse>, DriverError> {
    let (attributes, rest) = parse_attributes(expression, &DOCUMENT, false)?;
    let children = blocks(session, rest)?;
    Ok(Document {
        meta: meta(expression),
        id: attributes.id,
        type_name: attributes.type_name,
        title: attributes.title,
        content: nesting::document_content(children, expression.position())?,
    })
}

fn part(session: &mut ParseSession, expression: &Expression) -> Result<Part<Parse>, DriverError> {
    let (attributes, rest) = parse_attributes(expression, &PART, false)?;
    let children = blocks(session, rest)?;
    Ok(Part {
        meta: meta(expression),
        id: attributes.id,
        type_name: attributes.type_name,
        title: attributes.title,
        sections: nesting::part_sections(children)?,
    })
}

fn section(
    session: &mut ParseSession,
    expression: &Expression,
) -> Result<Section<Parse>, DriverError> {
    let (attributes, rest) = parse_attributes(expression, &SECTION, false)?;
    let children = blocks(session, rest)?;
    Ok(Section {
        meta: meta(expression),
        id: attributes.id,
        type_name: attributes.type_name,
        title: attributes.title,
        content: nesting::section_content(children, expression.position())?,
    })
}

fn subsection(
    session: &mut ParseSession,
    expression: &Expression,
) -> Result<Subsection<Parse>, DriverError> {
    let (attributes, rest) = parse_attributes(expression, &SUBSECTION, false)?;
    let children = blocks(session, rest)?;
    Ok(Subsection {
        meta: meta(expression),
        id: attributes.id,
        type_name: attributes.type_name,
        title: attributes.title,
        content: nesting::subsection_content(children)?,
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

fn paragraph(
    session: &mut ParseSession,
    expression: &Expression,
) -> Result<Paragraph<Parse>, DriverError> {
    let (attributes, rest) = parse_attributes(expression, &PARAGRAPH, false)?;
    Ok(Paragraph {
        meta: meta(expression),
        id: attributes.id,
        type_name: attributes.type_name,
        content: inlines(session, rest)?,
    })
}

fn formal_item(
    session: &mut ParseSession,
    expression: &Expression,
) -> Result<FormalItem<Parse>, DriverError> {
    let (attributes, rest) = parse_attributes(expression, &FORMAL_ITEM, false)?;
    Ok(FormalItem {
        meta: meta(expression),
        id: attributes.id,
        type_name: attributes.type_name,
        title: attributes.title,
        content: inlines(session, rest)?,
    })
}

fn footnote(
    session: &mut ParseSession,
    expression: &Expression,
) -> Result<Footnote<Parse>, DriverError> {
    let (attributes, rest) = parse_attributes(expression, &FOOTNOTE, false)?;
    let content = inlines(session, rest)?;
    match attributes.id {
        Some(id) => Ok(Footnote {
            meta: meta(expression),
            id,
            type_name: attributes.type_name,
            content,
        }),
        None => Err(form_error(&FOOTNOTE.forms(false), expression).into()),
    }
}

#[cfg(test)]
mod tests {
    use kstructural_core::block::{DocumentContent, SectionContent};

    use super::*;
    use crate::expression::read_all;

    fn parse(source: &str) -> Result<Block<Parse>, DriverError> {
        let mut session = ParseSession::new("/nonexistent-base").unwrap();
        let expression = read_all(source, None).unwrap().remove(0);
        parse_block(&mut session, &expression)
    }

    fn first_message(result: Result<Block<Parse>, DriverError>) -> String {
        match result.unwrap_err() {
            DriverError::Parse(err) => err.diagnostics()[0].message().to_string(),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_document_with_sections() {
        let block = parse(
            "(document [title T] [id doc]
               (section [title A] (paragraph x))
               (section [title B] (subsection [title C] (formal-item [title F] y))))",
        )
        .unwrap();

        let Block::Document(document) = block else {
            panic!("expected document");
        };
        assert_eq!(document.id.unwrap(), "doc");
        let DocumentContent::Sections(sections) = &document.content else {
            panic!("expected sections");
        };
        assert_eq!(sections.len(), 2);
        assert!(matches!(sections[0].content, SectionContent::Content(_)));
        assert!(matches!(sections[1].content, SectionContent::Subsections(_)));
    }

    #[test]
    fn test_square_brackets_recorded() {
        let Block::Paragraph(paragraph) = parse("[paragraph [id p] x]").unwrap() else {
            panic!("expected paragraph");
        };
        assert!(paragraph.meta.square());
    }

    #[test]
    fn test_mixed_document_content() {
        let result = parse(
            "(document [title T]
               (part [title P] (section [title S] (paragraph x)))
               (section [title S] (paragraph y)))",
        );
        assert_eq!(first_message(result), "Unexpected section.");
    }

    #[test]
    fn test_mixed_section_content() {
        let result = parse(
            "(section [title S]
               (subsection [title A] (paragraph x))
               (paragraph y))",
        );
        assert_eq!(first_message(result), "Unexpected paragraph.");
    }

    #[test]
    fn test_empty_containers() {
        assert_eq!(
            first_message(parse("(document [title T])")),
            "Documents cannot be empty"
        );
        assert_eq!(
            first_message(parse("(section [title S])")),
            "Sections cannot be empty"
        );
    }

    #[test]
    fn test_footnote_requires_id() {
        assert_eq!(
            first_message(parse("(footnote x)")),
            "Input did not match expected form."
        );
        let Block::Footnote(footnote) = parse("(footnote [id n1] x)").unwrap() else {
            panic!("expected footnote");
        };
        assert_eq!(footnote.id, "n1");
    }

    #[test]
    fn test_unknown_block() {
        assert_eq!(first_message(parse("(chapter x)")), "Expected a block command.");
    }

    #[test]
    fn test_import_form() {
        assert_eq!(
            first_message(parse("(import a b)")),
            "Input did not match expected form."
        );
    }
}
