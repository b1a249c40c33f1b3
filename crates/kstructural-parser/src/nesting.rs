//! The block hierarchy rules, shared by every syntax.
//!
//! Each parser collects the child blocks of a container and hands them here
//! to be narrowed to the content type the container accepts.

use kstructural_core::{
    annotation::{Origin, Parse},
    block::{
        Block, BlockKind, DocumentContent, Part, Section, SectionContent, Subsection,
        SubsectionContent,
    },
    span::Position,
};

use crate::error::{Diagnostic, ErrorCode};

/// A block that may not appear where it was found.
pub(crate) fn unexpected(block: &Block<Parse>, expected: &str) -> Diagnostic {
    let kind = block.kind();
    let diagnostic = match block.meta().data().origin() {
        Origin::Imported(link) => Diagnostic::error("Unexpected imported block.").with_label(
            link.directive().meta.position().clone(),
            format!("imports a {kind}"),
        ),
        _ => Diagnostic::error(format!("Unexpected {kind}."))
            .with_label(block.meta().position().clone(), format!("{kind} not allowed here")),
    };
    diagnostic
        .with_code(ErrorCode::E103)
        .with_help(format!("Expected {expected}"))
}

/// A document or section without content.
pub(crate) fn empty(kind: BlockKind, position: &Position) -> Diagnostic {
    let (message, label) = match kind {
        BlockKind::Document => ("Documents cannot be empty", "add a part or section"),
        _ => ("Sections cannot be empty", "add a subsection or content"),
    };
    Diagnostic::error(message)
        .with_code(ErrorCode::E112)
        .with_label(position.clone(), label)
}

fn narrow<T>(
    blocks: Vec<Block<Parse>>,
    expected: &str,
    f: impl Fn(Block<Parse>) -> Result<T, Block<Parse>>,
) -> Result<Vec<T>, Diagnostic> {
    blocks
        .into_iter()
        .map(|block| f(block).map_err(|block| unexpected(&block, expected)))
        .collect()
}

fn part(block: Block<Parse>) -> Result<Part<Parse>, Block<Parse>> {
    match block {
        Block::Part(part) => Ok(part),
        other => Err(other),
    }
}

fn section(block: Block<Parse>) -> Result<Section<Parse>, Block<Parse>> {
    match block {
        Block::Section(section) => Ok(section),
        other => Err(other),
    }
}

fn subsection(block: Block<Parse>) -> Result<Subsection<Parse>, Block<Parse>> {
    match block {
        Block::Subsection(subsection) => Ok(subsection),
        other => Err(other),
    }
}

/// Either all parts or all sections, decided by the first child.
pub(crate) fn document_content(
    blocks: Vec<Block<Parse>>,
    position: &Position,
) -> Result<DocumentContent<Parse>, Diagnostic> {
    match blocks.first().map(Block::kind) {
        None => Err(empty(BlockKind::Document, position)),
        Some(BlockKind::Part) => narrow(blocks, "a part", part).map(DocumentContent::Parts),
        Some(BlockKind::Section) => {
            narrow(blocks, "a section", section).map(DocumentContent::Sections)
        }
        Some(_) => Err(unexpected(&blocks[0], "a part or section")),
    }
}

pub(crate) fn part_sections(blocks: Vec<Block<Parse>>) -> Result<Vec<Section<Parse>>, Diagnostic> {
    narrow(blocks, "a section", section)
}

/// Either all subsections or all subsection content, decided by the first
/// child.
pub(crate) fn section_content(
    blocks: Vec<Block<Parse>>,
    position: &Position,
) -> Result<SectionContent<Parse>, Diagnostic> {
    match blocks.first().map(Block::kind) {
        None => Err(empty(BlockKind::Section, position)),
        Some(BlockKind::Subsection) => {
            narrow(blocks, "a subsection", subsection).map(SectionContent::Subsections)
        }
        Some(BlockKind::Paragraph | BlockKind::FormalItem | BlockKind::Footnote) => narrow(
            blocks,
            "a paragraph, formal item or footnote",
            Block::into_content,
        )
        .map(SectionContent::Content),
        Some(_) => Err(unexpected(&blocks[0], "a subsection or subsection content")),
    }
}

pub(crate) fn subsection_content(
    blocks: Vec<Block<Parse>>,
) -> Result<Vec<SubsectionContent<Parse>>, Diagnostic> {
    narrow(
        blocks,
        "a paragraph, formal item or footnote",
        Block::into_content,
    )
}
