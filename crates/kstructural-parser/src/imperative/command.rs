//! Classification of top-level imperative expressions.

use kstructural_core::{
    annotation::Parse,
    block::{
        Block, Document, DocumentContent, Footnote, FormalItem, Paragraph, Part, Section,
        SectionContent, Subsection,
    },
    inline::Inline,
};

use crate::{
    attributes::{Attributes, Shape, meta, parse_attributes},
    canonical::{
        DOCUMENT, FOOTNOTE, FORMAL_ITEM, PARAGRAPH, PART, SECTION, SUBSECTION, parse_import,
        parse_inline,
    },
    error::DriverError,
    expression::Expression,
    matcher::form_error,
    resolver::ParseSession,
};

/// One top-level expression of an imperative file.
#[derive(Debug)]
pub(crate) enum Statement {
    /// A block command: the block to open, still without content.
    Open(Block<Parse>),
    /// The root block of a file named by an `import` command.
    Imported(Block<Parse>),
    Inline(Inline<Parse>),
}

pub(crate) fn parse_statement(
    session: &mut ParseSession,
    expression: &Expression,
) -> Result<Statement, DriverError> {
    let command = |shape: &Shape| -> Result<Attributes, DriverError> {
        Ok(parse_attributes(expression, shape, true)?.0)
    };

    let block = match expression.head_symbol() {
        Some("document") => {
            let attributes = command(&DOCUMENT)?;
            Block::Document(Document {
                meta: meta(expression),
                id: attributes.id,
                type_name: attributes.type_name,
                title: attributes.title,
                content: DocumentContent::Sections(Vec::new()),
            })
        }
        Some("part") => {
            let attributes = command(&PART)?;
            Block::Part(Part {
                meta: meta(expression),
                id: attributes.id,
                type_name: attributes.type_name,
                title: attributes.title,
                sections: Vec::new(),
            })
        }
        Some("section") => {
            let attributes = command(&SECTION)?;
            Block::Section(Section {
                meta: meta(expression),
                id: attributes.id,
                type_name: attributes.type_name,
                title: attributes.title,
                content: SectionContent::Subsections(Vec::new()),
            })
        }
        Some("subsection") => {
            let attributes = command(&SUBSECTION)?;
            Block::Subsection(Subsection {
                meta: meta(expression),
                id: attributes.id,
                type_name: attributes.type_name,
                title: attributes.title,
                content: Vec::new(),
            })
        }
        Some("paragraph") => {
            let attributes = command(&PARAGRAPH)?;
            Block::Paragraph(Paragraph {
                meta: meta(expression),
                id: attributes.id,
                type_name: attributes.type_name,
                content: Vec::new(),
            })
        }
        Some("formal-item") => {
            let attributes = command(&FORMAL_ITEM)?;
            Block::FormalItem(FormalItem {
                meta: meta(expression),
                id: attributes.id,
                type_name: attributes.type_name,
                title: attributes.title,
                content: Vec::new(),
            })
        }
        Some("footnote") => {
            let attributes = command(&FOOTNOTE)?;
            let Some(id) = attributes.id else {
                return Err(form_error(&FOOTNOTE.forms(true), expression).into());
            };
            Block::Footnote(Footnote {
                meta: meta(expression),
                id,
                type_name: attributes.type_name,
                content: Vec::new(),
            })
        }
        Some("import") => {
            let directive = parse_import(expression)?;
            return Ok(Statement::Imported(session.import(directive)?));
        }
        _ => return Ok(Statement::Inline(parse_inline(session, expression)?)),
    };

    Ok(Statement::Open(block))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::read_all;

    fn statement(source: &str) -> Result<Statement, DriverError> {
        let mut session = ParseSession::new("/nonexistent-base").unwrap();
        let expression = read_all(source, None).unwrap().remove(0);
        parse_statement(&mut session, &expression)
    }

    #[test]
    fn test_block_commands_take_only_attributes() {
        let Statement::Open(Block::Section(section)) =
            statement("(section [title S] [id s1])").unwrap()
        else {
            panic!("expected section command");
        };
        assert_eq!(section.id.unwrap(), "s1");
        assert_eq!(section.content, SectionContent::Subsections(Vec::new()));

        assert!(statement("(section [title S] (paragraph x))").is_err());
    }

    #[test]
    fn test_other_forms_are_inline() {
        assert!(matches!(
            statement("(term x)").unwrap(),
            Statement::Inline(Inline::Term(_))
        ));
        assert!(matches!(
            statement("word").unwrap(),
            Statement::Inline(Inline::Text(_))
        ));
        assert!(statement("(chapter x)").is_err());
    }
}
