//! Inline elements: the content of paragraphs, formal items and footnotes.

use crate::{
    annotation::Meta,
    identifier::{Id, TypeName},
};

/// An inline element.
#[derive(Debug, Clone, PartialEq)]
pub enum Inline<A> {
    Text(Text<A>),
    Term(Term<A>),
    Verbatim(Verbatim<A>),
    FootnoteReference(FootnoteReference<A>),
    Image(Image<A>),
    Link(Link<A>),
    ListOrdered(List<A>),
    ListUnordered(List<A>),
    Table(Table<A>),
}

impl<A> Inline<A> {
    pub fn meta(&self) -> &Meta<A> {
        match self {
            Inline::Text(n) => &n.meta,
            Inline::Term(n) => &n.meta,
            Inline::Verbatim(n) => &n.meta,
            Inline::FootnoteReference(n) => &n.meta,
            Inline::Image(n) => &n.meta,
            Inline::Link(n) => &n.meta,
            Inline::ListOrdered(n) | Inline::ListUnordered(n) => &n.meta,
            Inline::Table(n) => &n.meta,
        }
    }
}

/// A run of text. `quoted` records whether it was written as a string
/// literal rather than a bare symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct Text<A> {
    pub meta: Meta<A>,
    pub text: String,
    pub quoted: bool,
}

/// A term, optionally typed. Serves as the typed emphasis construct.
#[derive(Debug, Clone, PartialEq)]
pub struct Term<A> {
    pub meta: Meta<A>,
    pub type_name: Option<TypeName>,
    pub content: Vec<Text<A>>,
}

/// Preformatted text, reproduced exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct Verbatim<A> {
    pub meta: Meta<A>,
    pub type_name: Option<TypeName>,
    pub text: Text<A>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FootnoteReference<A> {
    pub meta: Meta<A>,
    pub target: Id,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u64,
    pub height: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Image<A> {
    pub meta: Meta<A>,
    pub type_name: Option<TypeName>,
    pub target: String,
    pub size: Option<ImageSize>,
    pub content: Vec<Text<A>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LinkTarget {
    /// A block in the same document, by identifier.
    Internal(Id),
    /// An external URI.
    External(String),
}

/// Things that may appear inside a link.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkContent<A> {
    Text(Text<A>),
    Image(Image<A>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Link<A> {
    pub meta: Meta<A>,
    pub target: LinkTarget,
    pub content: Vec<LinkContent<A>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct List<A> {
    pub meta: Meta<A>,
    pub items: Vec<ListItem<A>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListItem<A> {
    pub meta: Meta<A>,
    pub content: Vec<Inline<A>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table<A> {
    pub meta: Meta<A>,
    pub type_name: Option<TypeName>,
    pub summary: Vec<Text<A>>,
    pub head: Option<TableHead<A>>,
    pub body: TableBody<A>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableHead<A> {
    pub meta: Meta<A>,
    pub names: Vec<TableColumnName<A>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableColumnName<A> {
    pub meta: Meta<A>,
    pub content: Vec<Text<A>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableBody<A> {
    pub meta: Meta<A>,
    pub rows: Vec<TableRow<A>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableRow<A> {
    pub meta: Meta<A>,
    pub cells: Vec<TableCell<A>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableCell<A> {
    pub meta: Meta<A>,
    pub content: Vec<Inline<A>>,
}
