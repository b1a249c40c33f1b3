//! Export of evaluated documents.
//!
//! This module provides the [`Exporter`] trait implemented by each output
//! backend, and [`export_files`], which drives an exporter over a document
//! and every file split out of it.
//!
//! # Available Backends
//!
//! - [`canonical`]: nested s-expressions (`.sd`)
//! - [`imperative`]: the flat command stream (`.sdi`)
//! - [`xml`]: XML in the structural namespace (`.xml`)
//!
//! # Imports
//!
//! By default imported blocks are written in place, producing a single
//! file. When imports are kept, the s-expression backends write an `import`
//! directive instead and the imported block becomes a file of its own,
//! placed at the same path relative to the base directory as its source
//! (with the suffix of the output format). Included text is handled the same
//! way. XML output always inlines.

pub mod canonical;
pub mod imperative;
mod sexp;
pub mod xml;

use std::{
    collections::VecDeque,
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

use indexmap::IndexMap;
use log::{debug, trace};
use serde::Deserialize;

use kstructural_core::{
    block::{Document, Part, Section, Subsection, SubsectionContent},
    evaluation::{Context, Evaluation, NodeId},
    inline::Text,
};
use kstructural_parser::{Evaluated, Syntax};

/// An output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Canonical,
    Imperative,
    Xml,
}

impl OutputFormat {
    /// The suffix of files written in this format.
    pub fn suffix(&self) -> &'static str {
        self.syntax().suffix()
    }

    /// The syntax the output is written in.
    pub fn syntax(&self) -> Syntax {
        match self {
            OutputFormat::Canonical => Syntax::Canonical,
            OutputFormat::Imperative => Syntax::Imperative,
            OutputFormat::Xml => Syntax::Xml,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.syntax(), f)
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "canonical" | "sd" => Ok(OutputFormat::Canonical),
            "imperative" | "sdi" => Ok(OutputFormat::Imperative),
            "xml" => Ok(OutputFormat::Xml),
            other => Err(format!(
                "Unknown output format `{other}` (expected canonical, imperative or xml)"
            )),
        }
    }
}

/// Layout settings shared by the text backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    indent: usize,
    width: usize,
}

impl Layout {
    pub fn new(indent: usize, width: usize) -> Self {
        Self { indent, width }
    }

    pub fn indent(&self) -> usize {
        self.indent
    }

    pub fn width(&self) -> usize {
        self.width
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::new(2, 80)
    }
}

/// A block that is written as the root of an output file.
#[derive(Debug, Clone, Copy)]
pub enum Root<'d> {
    Document(&'d Document<Evaluation>),
    Part(&'d Part<Evaluation>),
    Section(&'d Section<Evaluation>),
    Subsection(&'d Subsection<Evaluation>),
    Content(&'d SubsectionContent<Evaluation>),
}

impl Root<'_> {
    pub fn node(&self) -> NodeId {
        match self {
            Root::Document(document) => document.meta.data().node(),
            Root::Part(part) => part.meta.data().node(),
            Root::Section(section) => section.meta.data().node(),
            Root::Subsection(subsection) => subsection.meta.data().node(),
            Root::Content(content) => content.meta().data().node(),
        }
    }
}

/// The text of one output file, plus whatever was split out of it.
#[derive(Debug)]
pub struct Rendered<'d> {
    pub text: String,
    /// Imported blocks replaced by an `import` directive.
    pub imports: Vec<Root<'d>>,
    /// Included texts replaced by an `include` directive.
    pub includes: Vec<&'d Text<Evaluation>>,
}

impl Rendered<'_> {
    pub fn new(text: String) -> Self {
        Self {
            text,
            imports: Vec::new(),
            includes: Vec::new(),
        }
    }
}

/// Abstraction for export backends.
pub trait Exporter {
    fn format(&self) -> OutputFormat;

    /// Render one root block.
    ///
    /// With `keep_imports` set, backends that can express imports leave
    /// imported blocks and included texts out of the result and list them
    /// in [`Rendered`] instead.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Render`] if the content cannot be expressed in the
    /// output format.
    fn render<'d>(
        &self,
        root: Root<'d>,
        context: &Context,
        keep_imports: bool,
    ) -> Result<Rendered<'d>, Error>;
}

/// Create the exporter for a format.
pub fn exporter(format: OutputFormat, layout: Layout) -> Box<dyn Exporter> {
    match format {
        OutputFormat::Canonical => Box::new(canonical::Canonical::new(layout)),
        OutputFormat::Imperative => Box::new(imperative::Imperative::new(layout)),
        OutputFormat::Xml => Box::new(xml::Xml::new(layout)),
    }
}

/// One output file, with a path relative to the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub path: PathBuf,
    pub content: String,
}

/// Export a document and, when imports are kept, every imported or included
/// file it references.
///
/// The document itself comes first. Files reached more than once are
/// written once.
pub fn export_files(
    exporter: &dyn Exporter,
    evaluated: &Evaluated,
    base: &Path,
    keep_imports: bool,
) -> Result<Vec<ExportedFile>, Error> {
    let suffix = exporter.format().suffix();
    let context = &evaluated.context;

    let main = evaluated
        .document
        .meta
        .position()
        .file()
        .map(|file| relative_to(file, base).with_extension(suffix))
        .unwrap_or_else(|| PathBuf::from(format!("document.{suffix}")));

    let mut files: IndexMap<PathBuf, String> = IndexMap::new();
    let mut queue = VecDeque::from([(Root::Document(&evaluated.document), main)]);

    while let Some((root, path)) = queue.pop_front() {
        if files.contains_key(&path) {
            continue;
        }
        debug!(path = path.display().to_string(); "Rendering output file");
        let Rendered {
            text,
            imports,
            includes,
        } = exporter.render(root, context, keep_imports)?;
        files.insert(path, text);

        for import in imports {
            if let Some(record) = context.import_of(import.node()) {
                let target = relative_to(record.edge().to(), base).with_extension(suffix);
                trace!(
                    file = record.file(),
                    target = target.display().to_string();
                    "Splitting imported block"
                );
                queue.push_back((import, target));
            }
        }
        for text in includes {
            if let Some(include) = context.include_of(text.meta.data().node()) {
                let target = relative_to(include.resolved(), base);
                files.entry(target).or_insert_with(|| text.text.clone());
            }
        }
    }

    Ok(files
        .into_iter()
        .map(|(path, content)| ExportedFile { path, content })
        .collect())
}

/// `path` relative to `base`, or just its file name when it lies elsewhere.
fn relative_to(path: &Path, base: &Path) -> PathBuf {
    path.strip_prefix(base)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.file_name().map(PathBuf::from).unwrap_or_default())
}

/// The file name an `import` directive uses for a split file.
pub(crate) fn import_reference(file: &str, format: OutputFormat) -> String {
    Path::new(file)
        .with_extension(format.suffix())
        .to_string_lossy()
        .into_owned()
}

/// Errors that can occur during export.
///
/// This type is converted into [`KStructuralError::Export`] at the crate
/// boundary.
///
/// [`KStructuralError::Export`]: crate::KStructuralError::Export
#[derive(Debug)]
pub enum Error {
    /// Content the output format cannot express.
    Render(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Render(msg) => write!(f, "Render error: {msg}"),
        }
    }
}

impl std::error::Error for Error {}
