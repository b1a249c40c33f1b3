//! File-level parsing: syntax selection and the top-level entry points.

use std::{fmt, fs, path::Path};

use log::{debug, info};

use kstructural_core::{
    annotation::Parse,
    block::{Block, Document},
    span::Position,
};

use crate::{
    canonical,
    error::{Diagnostic, DriverError, ErrorCode},
    imperative,
    resolver::ParseSession,
    xml,
};

/// A concrete document syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Syntax {
    Canonical,
    Imperative,
    Xml,
}

impl Syntax {
    /// Pick a syntax by file suffix: `.sdi` is imperative, `.xml` is XML and
    /// anything else is canonical.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("sdi") => Syntax::Imperative,
            Some("xml") => Syntax::Xml,
            _ => Syntax::Canonical,
        }
    }

    /// The file suffix files in this syntax are written with.
    pub fn suffix(&self) -> &'static str {
        match self {
            Syntax::Canonical => "sd",
            Syntax::Imperative => "sdi",
            Syntax::Xml => "xml",
        }
    }
}

impl fmt::Display for Syntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Syntax::Canonical => "canonical",
            Syntax::Imperative => "imperative",
            Syntax::Xml => "xml",
        })
    }
}

/// Parse source text in the given syntax into its root block.
///
/// `file` names the file the text came from, for positions and for
/// resolving relative references.
pub fn parse_block_str(
    session: &mut ParseSession,
    source: &str,
    file: Option<&Path>,
    syntax: Syntax,
) -> Result<Block<Parse>, DriverError> {
    debug!(syntax = syntax.to_string(); "Parsing block");
    match syntax {
        Syntax::Canonical => canonical::parse(session, source, file),
        Syntax::Imperative => imperative::parse(session, source, file),
        Syntax::Xml => xml::parse(source, file),
    }
}

/// Parse the file at `path` into its root block.
pub fn parse_block_file(
    session: &mut ParseSession,
    path: &Path,
) -> Result<Block<Parse>, DriverError> {
    let path = std::path::absolute(path).map_err(|err| DriverError::io(path, err))?;
    let path = session.admit(&path)?;
    parse_block_file_at(session, &path, &Position::unknown())
}

/// Parse the file at the absolute `path`, referenced from `position`.
///
/// The file is marked as in progress for the duration of the parse so that
/// an import leading back to it is reported as a cycle.
pub(crate) fn parse_block_file_at(
    session: &mut ParseSession,
    path: &Path,
    position: &Position,
) -> Result<Block<Parse>, DriverError> {
    session.enter(path, position)?;
    let result = fs::read_to_string(path)
        .map_err(|err| DriverError::io(path, err))
        .and_then(|source| {
            parse_block_str(session, &source, Some(path), Syntax::from_path(path))
        });
    session.leave();
    result
}

/// Parse the file at `path`, which must hold a document.
pub fn parse_document(
    session: &mut ParseSession,
    path: &Path,
) -> Result<Document<Parse>, DriverError> {
    info!(file = path.display().to_string(); "Parsing document");
    into_document(parse_block_file(session, path)?)
}

/// Parse source text, which must hold a document.
pub fn parse_document_str(
    session: &mut ParseSession,
    source: &str,
    file: Option<&Path>,
    syntax: Syntax,
) -> Result<Document<Parse>, DriverError> {
    into_document(parse_block_str(session, source, file, syntax)?)
}

fn into_document(block: Block<Parse>) -> Result<Document<Parse>, DriverError> {
    match block {
        Block::Document(document) => Ok(document),
        other => Err(Diagnostic::error("Only documents may be compiled.")
            .with_code(ErrorCode::E108)
            .with_label(
                other.meta().position().clone(),
                format!("the root block is a {}", other.kind()),
            )
            .into()),
    }
}
