//! Per-node metadata shared by every element of the document model.
//!
//! Each node carries a [`Meta`] holding its source [`Position`], the bracket
//! kind it was written with, and an annotation value `A`. The parsers produce
//! trees annotated with [`Parse`]; the evaluator produces trees annotated with
//! [`Evaluation`](crate::evaluation::Evaluation).

use std::path::{Path, PathBuf};

use crate::{block::Import, span::Position};

/// Metadata common to every node.
#[derive(Debug, Clone, PartialEq)]
pub struct Meta<A> {
    position: Position,
    square: bool,
    data: A,
}

impl<A> Meta<A> {
    pub fn new(position: Position, square: bool, data: A) -> Self {
        Self {
            position,
            square,
            data,
        }
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    /// `true` when the node was written with `[` rather than `(`.
    pub fn square(&self) -> bool {
        self.square
    }

    pub fn data(&self) -> &A {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut A {
        &mut self.data
    }

    /// Replace the annotation, keeping position and bracket kind.
    pub fn with_data<B>(&self, data: B) -> Meta<B> {
        Meta {
            position: self.position.clone(),
            square: self.square,
            data,
        }
    }
}

/// Parse-time annotation: where a node came from.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Parse {
    origin: Origin,
}

impl Parse {
    pub fn source() -> Self {
        Self::default()
    }

    pub fn imported(link: ImportLink) -> Self {
        Self {
            origin: Origin::Imported(Box::new(link)),
        }
    }

    pub fn included(include: Include) -> Self {
        Self {
            origin: Origin::Included(include),
        }
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }
}

/// Provenance of a parsed node.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Origin {
    /// Written directly in the file being parsed.
    #[default]
    Source,
    /// Root block of a file pulled in by an `import` directive.
    Imported(Box<ImportLink>),
    /// Text materialized from an `include` directive.
    Included(Include),
}

/// The `import` directive that produced a block, and the file edge it crossed.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportLink {
    directive: Import<Parse>,
    edge: ImportEdge,
}

impl ImportLink {
    pub fn new(directive: Import<Parse>, edge: ImportEdge) -> Self {
        Self { directive, edge }
    }

    pub fn directive(&self) -> &Import<Parse> {
        &self.directive
    }

    pub fn edge(&self) -> &ImportEdge {
        &self.edge
    }
}

/// An importer → imported file edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImportEdge {
    from: PathBuf,
    to: PathBuf,
}

impl ImportEdge {
    pub fn new(from: impl Into<PathBuf>, to: impl Into<PathBuf>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn from(&self) -> &Path {
        &self.from
    }

    pub fn to(&self) -> &Path {
        &self.to
    }
}

/// An `include` directive whose file content became a text node.
#[derive(Debug, Clone, PartialEq)]
pub struct Include {
    position: Position,
    file: String,
    resolved: PathBuf,
}

impl Include {
    pub fn new(position: Position, file: impl Into<String>, resolved: impl Into<PathBuf>) -> Self {
        Self {
            position,
            file: file.into(),
            resolved: resolved.into(),
        }
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    /// The file name as written in the directive.
    pub fn file(&self) -> &str {
        &self.file
    }

    /// The absolute path that was read.
    pub fn resolved(&self) -> &Path {
        &self.resolved
    }
}
