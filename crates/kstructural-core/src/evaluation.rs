//! Evaluation-time annotation and the evaluation [`Context`].
//!
//! After evaluation every node carries an [`Evaluation`] annotation: a stable
//! [`NodeId`] plus the [`Number`] assigned to it, if any. Everything that
//! relates nodes to each other (identifiers, numbers, import and include
//! provenance, footnotes, navigation) lives in the [`Context`], keyed by
//! `NodeId`. Nodes never point back into the context or at each other.

use std::{collections::HashMap, fmt};

use indexmap::IndexMap;
use log::trace;

use crate::{
    annotation::{ImportEdge, Include},
    block::BlockKind,
    identifier::Id,
    number::Number,
    span::Position,
};

/// A serial number identifying one node of an evaluated tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn new(serial: usize) -> Self {
        Self(serial)
    }

    pub fn serial(&self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Evaluation-time annotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    node: NodeId,
    number: Option<Number>,
}

impl Evaluation {
    pub fn new(node: NodeId, number: Option<Number>) -> Self {
        Self { node, number }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn number(&self) -> Option<Number> {
        self.number
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InlineKind {
    Text,
    Term,
    Verbatim,
    FootnoteReference,
    Image,
    Link,
    ListOrdered,
    ListUnordered,
    ListItem,
    Table,
    TableHead,
    TableColumnName,
    TableBody,
    TableRow,
    TableCell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Block(BlockKind),
    Inline(InlineKind),
}

/// A summary of one evaluated node.
#[derive(Debug, Clone)]
pub struct NodeInfo {
    kind: NodeKind,
    position: Position,
    id: Option<Id>,
    number: Option<Number>,
    parent: Option<NodeId>,
}

impl NodeInfo {
    pub fn new(kind: NodeKind, position: Position, parent: Option<NodeId>) -> Self {
        Self {
            kind,
            position,
            id: None,
            number: None,
            parent,
        }
    }

    pub fn with_id(mut self, id: Option<Id>) -> Self {
        self.id = id;
        self
    }

    pub fn with_number(mut self, number: Option<Number>) -> Self {
        self.number = number;
        self
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn id(&self) -> Option<Id> {
        self.id
    }

    pub fn number(&self) -> Option<Number> {
        self.number
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}

/// How a block came to be part of the document through an `import`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRecord {
    import: NodeId,
    file: String,
    edge: ImportEdge,
}

impl ImportRecord {
    pub fn new(import: NodeId, file: impl Into<String>, edge: ImportEdge) -> Self {
        Self {
            import,
            file: file.into(),
            edge,
        }
    }

    /// The node standing for the `import` directive itself.
    pub fn import(&self) -> NodeId {
        self.import
    }

    /// The file name as written in the directive.
    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn edge(&self) -> &ImportEdge {
        &self.edge
    }
}

/// Everything the evaluator learned about a document.
#[derive(Debug, Default)]
pub struct Context {
    nodes: IndexMap<NodeId, NodeInfo>,
    blocks_by_id: HashMap<Id, NodeId>,
    blocks_by_number: IndexMap<Number, NodeId>,
    imports: HashMap<NodeId, ImportRecord>,
    import_paths: HashMap<NodeId, ImportEdge>,
    includes_by_text: HashMap<NodeId, Include>,
    footnotes_by_section: IndexMap<NodeId, Vec<NodeId>>,
    footnote_indices: HashMap<NodeId, usize>,
    footnote_references: IndexMap<NodeId, Vec<NodeId>>,
    segments: Vec<NodeId>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    // Recording, used by the evaluator.

    pub fn record_node(&mut self, node: NodeId, info: NodeInfo) {
        if let Some(number) = info.number() {
            self.blocks_by_number.insert(number, node);
        }
        self.nodes.insert(node, info);
    }

    /// Register `id` as naming `node`. Returns the node that already holds
    /// the identifier, leaving the existing registration in place.
    pub fn record_id(&mut self, id: Id, node: NodeId) -> Result<(), NodeId> {
        match self.blocks_by_id.get(&id) {
            Some(existing) => Err(*existing),
            None => {
                trace!(id = id.to_string(), node = node.serial(); "Registered identifier");
                self.blocks_by_id.insert(id, node);
                Ok(())
            }
        }
    }

    pub fn record_import(&mut self, block: NodeId, record: ImportRecord) {
        self.import_paths.insert(record.import(), record.edge().clone());
        self.imports.insert(block, record);
    }

    pub fn record_include(&mut self, text: NodeId, include: Include) {
        self.includes_by_text.insert(text, include);
    }

    /// Register a footnote under its section and return its 1-based index.
    pub fn record_footnote(&mut self, section: NodeId, footnote: NodeId) -> usize {
        let footnotes = self.footnotes_by_section.entry(section).or_default();
        footnotes.push(footnote);
        let index = footnotes.len();
        self.footnote_indices.insert(footnote, index);
        index
    }

    pub fn record_footnote_reference(&mut self, footnote: NodeId, reference: NodeId) {
        self.footnote_references
            .entry(footnote)
            .or_default()
            .push(reference);
    }

    pub fn record_segment(&mut self, segment: NodeId) {
        self.segments.push(segment);
    }

    // Queries.

    pub fn node(&self, node: NodeId) -> Option<&NodeInfo> {
        self.nodes.get(&node)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn block_by_id(&self, id: Id) -> Option<NodeId> {
        self.blocks_by_id.get(&id).copied()
    }

    pub fn block_by_number(&self, number: Number) -> Option<NodeId> {
        self.blocks_by_number.get(&number).copied()
    }

    pub fn number_of(&self, node: NodeId) -> Option<Number> {
        self.nodes.get(&node).and_then(NodeInfo::number)
    }

    /// All numbered blocks in document order.
    pub fn numbered_blocks(&self) -> impl Iterator<Item = (Number, NodeId)> + '_ {
        self.blocks_by_number.iter().map(|(n, id)| (*n, *id))
    }

    /// The import that pulled `block` into the document, if any.
    pub fn import_of(&self, block: NodeId) -> Option<&ImportRecord> {
        self.imports.get(&block)
    }

    pub fn imports(&self) -> impl Iterator<Item = (NodeId, &ImportRecord)> + '_ {
        self.imports.iter().map(|(block, record)| (*block, record))
    }

    /// The file edge crossed by the `import` directive node `import`.
    pub fn import_path(&self, import: NodeId) -> Option<&ImportEdge> {
        self.import_paths.get(&import)
    }

    pub fn include_of(&self, text: NodeId) -> Option<&Include> {
        self.includes_by_text.get(&text)
    }

    pub fn footnotes_in(&self, section: NodeId) -> &[NodeId] {
        self.footnotes_by_section
            .get(&section)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn footnote_index(&self, footnote: NodeId) -> Option<usize> {
        self.footnote_indices.get(&footnote).copied()
    }

    pub fn footnote_references(&self, footnote: NodeId) -> &[NodeId] {
        self.footnote_references
            .get(&footnote)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// The segment (part or section) before `segment` in document order.
    pub fn segment_previous(&self, segment: NodeId) -> Option<NodeId> {
        let index = self.segment_index(segment)?;
        index.checked_sub(1).map(|i| self.segments[i])
    }

    /// The segment after `segment` in document order.
    pub fn segment_next(&self, segment: NodeId) -> Option<NodeId> {
        let index = self.segment_index(segment)?;
        self.segments.get(index + 1).copied()
    }

    /// The enclosing part, or the document, of a segment.
    pub fn segment_up(&self, segment: NodeId) -> Option<NodeId> {
        self.segment_index(segment)?;
        self.nodes.get(&segment).and_then(NodeInfo::parent)
    }

    fn segment_index(&self, segment: NodeId) -> Option<usize> {
        self.segments.iter().position(|s| *s == segment)
    }
}
