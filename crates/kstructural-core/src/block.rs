//! Block elements: the structural skeleton of a document.
//!
//! The hierarchy is strict: a [`Document`] holds either parts or sections, a
//! [`Part`] holds sections, a [`Section`] holds either subsections or
//! subsection content directly, and a [`Subsection`] holds content
//! (paragraphs, formal items and footnotes).

use std::fmt;

use crate::{
    annotation::Meta,
    identifier::{Id, TypeName},
    inline::{Inline, Text},
};

/// Any block element.
///
/// `Import` only appears between parsing an `import` directive and resolving
/// it; resolved trees contain the imported block in its place.
#[derive(Debug, Clone, PartialEq)]
pub enum Block<A> {
    Document(Document<A>),
    Part(Part<A>),
    Section(Section<A>),
    Subsection(Subsection<A>),
    Paragraph(Paragraph<A>),
    FormalItem(FormalItem<A>),
    Footnote(Footnote<A>),
    Import(Import<A>),
}

impl<A> Block<A> {
    pub fn kind(&self) -> BlockKind {
        match self {
            Block::Document(_) => BlockKind::Document,
            Block::Part(_) => BlockKind::Part,
            Block::Section(_) => BlockKind::Section,
            Block::Subsection(_) => BlockKind::Subsection,
            Block::Paragraph(_) => BlockKind::Paragraph,
            Block::FormalItem(_) => BlockKind::FormalItem,
            Block::Footnote(_) => BlockKind::Footnote,
            Block::Import(_) => BlockKind::Import,
        }
    }

    pub fn meta(&self) -> &Meta<A> {
        match self {
            Block::Document(b) => &b.meta,
            Block::Part(b) => &b.meta,
            Block::Section(b) => &b.meta,
            Block::Subsection(b) => &b.meta,
            Block::Paragraph(b) => &b.meta,
            Block::FormalItem(b) => &b.meta,
            Block::Footnote(b) => &b.meta,
            Block::Import(b) => &b.meta,
        }
    }

    pub fn meta_mut(&mut self) -> &mut Meta<A> {
        match self {
            Block::Document(b) => &mut b.meta,
            Block::Part(b) => &mut b.meta,
            Block::Section(b) => &mut b.meta,
            Block::Subsection(b) => &mut b.meta,
            Block::Paragraph(b) => &mut b.meta,
            Block::FormalItem(b) => &mut b.meta,
            Block::Footnote(b) => &mut b.meta,
            Block::Import(b) => &mut b.meta,
        }
    }

    /// Narrow to subsection content, if this block is a content block.
    pub fn into_content(self) -> Result<SubsectionContent<A>, Self> {
        match self {
            Block::Paragraph(p) => Ok(SubsectionContent::Paragraph(p)),
            Block::FormalItem(f) => Ok(SubsectionContent::FormalItem(f)),
            Block::Footnote(f) => Ok(SubsectionContent::Footnote(f)),
            other => Err(other),
        }
    }
}

/// The kind of a block, without its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Document,
    Part,
    Section,
    Subsection,
    Paragraph,
    FormalItem,
    Footnote,
    Import,
}

impl BlockKind {
    /// The keyword naming this kind in every concrete syntax.
    pub fn keyword(&self) -> &'static str {
        match self {
            BlockKind::Document => "document",
            BlockKind::Part => "part",
            BlockKind::Section => "section",
            BlockKind::Subsection => "subsection",
            BlockKind::Paragraph => "paragraph",
            BlockKind::FormalItem => "formal-item",
            BlockKind::Footnote => "footnote",
            BlockKind::Import => "import",
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document<A> {
    pub meta: Meta<A>,
    pub id: Option<Id>,
    pub type_name: Option<TypeName>,
    pub title: Vec<Text<A>>,
    pub content: DocumentContent<A>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DocumentContent<A> {
    Parts(Vec<Part<A>>),
    Sections(Vec<Section<A>>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Part<A> {
    pub meta: Meta<A>,
    pub id: Option<Id>,
    pub type_name: Option<TypeName>,
    pub title: Vec<Text<A>>,
    pub sections: Vec<Section<A>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section<A> {
    pub meta: Meta<A>,
    pub id: Option<Id>,
    pub type_name: Option<TypeName>,
    pub title: Vec<Text<A>>,
    pub content: SectionContent<A>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SectionContent<A> {
    Subsections(Vec<Subsection<A>>),
    Content(Vec<SubsectionContent<A>>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Subsection<A> {
    pub meta: Meta<A>,
    pub id: Option<Id>,
    pub type_name: Option<TypeName>,
    pub title: Vec<Text<A>>,
    pub content: Vec<SubsectionContent<A>>,
}

/// Blocks that may appear inside a subsection (or directly in a section).
#[derive(Debug, Clone, PartialEq)]
pub enum SubsectionContent<A> {
    Paragraph(Paragraph<A>),
    FormalItem(FormalItem<A>),
    Footnote(Footnote<A>),
}

impl<A> SubsectionContent<A> {
    pub fn meta(&self) -> &Meta<A> {
        match self {
            SubsectionContent::Paragraph(p) => &p.meta,
            SubsectionContent::FormalItem(f) => &f.meta,
            SubsectionContent::Footnote(f) => &f.meta,
        }
    }

    pub fn into_block(self) -> Block<A> {
        match self {
            SubsectionContent::Paragraph(p) => Block::Paragraph(p),
            SubsectionContent::FormalItem(f) => Block::FormalItem(f),
            SubsectionContent::Footnote(f) => Block::Footnote(f),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph<A> {
    pub meta: Meta<A>,
    pub id: Option<Id>,
    pub type_name: Option<TypeName>,
    pub content: Vec<Inline<A>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormalItem<A> {
    pub meta: Meta<A>,
    pub id: Option<Id>,
    pub type_name: Option<TypeName>,
    pub title: Vec<Text<A>>,
    pub content: Vec<Inline<A>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Footnote<A> {
    pub meta: Meta<A>,
    pub id: Id,
    pub type_name: Option<TypeName>,
    pub content: Vec<Inline<A>>,
}

/// An `import` directive naming another file.
#[derive(Debug, Clone, PartialEq)]
pub struct Import<A> {
    pub meta: Meta<A>,
    pub file: Text<A>,
}
