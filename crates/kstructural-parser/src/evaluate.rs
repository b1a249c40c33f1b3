//! Semantic evaluation of a parsed document.
//!
//! A single pre-order pass assigns every node a [`NodeId`], numbers the
//! numbered blocks, registers identifiers and records import and include
//! provenance in a [`Context`]. Link and footnote reference targets are
//! collected during the pass and checked once every identifier is known.
//! All problems are collected and reported together.

use log::{debug, info, trace};

use kstructural_core::{
    annotation::{Meta, Origin, Parse},
    block::{
        BlockKind, Document, DocumentContent, Footnote, FormalItem, Paragraph, Part, Section,
        SectionContent, Subsection, SubsectionContent,
    },
    evaluation::{Context, Evaluation, ImportRecord, InlineKind, NodeId, NodeInfo, NodeKind},
    identifier::{Id, TypeName},
    inline::{
        FootnoteReference, Image, Inline, Link, LinkContent, LinkTarget, List, ListItem, Table,
        TableBody, TableCell, TableColumnName, TableHead, TableRow, Term, Text, Verbatim,
    },
    number::Number,
    span::Position,
};

use crate::error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError};

/// An evaluated document and everything learned about it.
#[derive(Debug)]
pub struct Evaluated {
    pub document: Document<Evaluation>,
    pub context: Context,
}

/// Evaluate a parsed document.
pub fn evaluate(document: &Document<Parse>) -> Result<Evaluated, ParseError> {
    let mut evaluator = Evaluator::new();
    let document = evaluator.document(document);
    evaluator.finish(document)
}

/// The block a paragraph or formal item is numbered within.
#[derive(Debug, Clone, Copy)]
enum Container {
    Section { part: Option<u32>, section: u32 },
    Subsection { part: Option<u32>, section: u32, subsection: u32 },
}

impl Container {
    fn content(self, content: u32) -> Number {
        match self {
            Container::Section { part: Some(p), section } => {
                Number::PartSectionContent(p, section, content)
            }
            Container::Section { part: None, section } => Number::SectionContent(section, content),
            Container::Subsection {
                part: Some(p),
                section,
                subsection,
            } => Number::PartSectionSubsectionContent(p, section, subsection, content),
            Container::Subsection {
                part: None,
                section,
                subsection,
            } => Number::SectionSubsectionContent(section, subsection, content),
        }
    }
}

struct PendingLink {
    target: Id,
    position: Position,
}

struct PendingFootnoteReference {
    target: Id,
    node: NodeId,
    position: Position,
}

struct Evaluator {
    next: usize,
    context: Context,
    errors: DiagnosticCollector,
    links: Vec<PendingLink>,
    footnote_references: Vec<PendingFootnoteReference>,
    section: Option<NodeId>,
    table_depth: usize,
}

impl Evaluator {
    fn new() -> Self {
        Self {
            next: 0,
            context: Context::new(),
            errors: DiagnosticCollector::new(),
            links: Vec::new(),
            footnote_references: Vec::new(),
            section: None,
            table_depth: 0,
        }
    }

    fn allocate(&mut self) -> NodeId {
        let node = NodeId::new(self.next);
        self.next += 1;
        node
    }

    /// Register one node and build its evaluated metadata.
    fn node(
        &mut self,
        kind: NodeKind,
        meta: &Meta<Parse>,
        parent: Option<NodeId>,
        id: Option<Id>,
        number: Option<Number>,
    ) -> (NodeId, Meta<Evaluation>) {
        let import = match meta.data().origin() {
            Origin::Imported(link) => {
                let import = self.allocate();
                let directive = link.directive();
                self.context.record_node(
                    import,
                    NodeInfo::new(
                        NodeKind::Block(BlockKind::Import),
                        directive.meta.position().clone(),
                        parent,
                    ),
                );
                Some((
                    import,
                    ImportRecord::new(import, directive.file.text.clone(), link.edge().clone()),
                ))
            }
            _ => None,
        };

        let node = self.allocate();
        if let Some((_, record)) = import {
            trace!(node = node.serial(), file = record.file(); "Recorded import");
            self.context.record_import(node, record);
        }
        if let Origin::Included(include) = meta.data().origin() {
            self.context.record_include(node, include.clone());
        }
        if let Some(id) = id {
            self.declare(id, node, meta.position());
        }

        self.context.record_node(
            node,
            NodeInfo::new(kind, meta.position().clone(), parent)
                .with_id(id)
                .with_number(number),
        );
        (node, meta.with_data(Evaluation::new(node, number)))
    }

    fn declare(&mut self, id: Id, node: NodeId, position: &Position) {
        if let Err(existing) = self.context.record_id(id, node) {
            debug!(id = id.to_string(), position:% = position; "Duplicate identifier");
            let mut diagnostic = Diagnostic::error("Duplicate ID.")
                .with_code(ErrorCode::E200)
                .with_label(position.clone(), format!("`{id}` declared again here"));
            if let Some(first) = self.context.node(existing) {
                diagnostic = diagnostic
                    .with_secondary_label(first.position().clone(), "first declared here");
            }
            self.errors.emit(diagnostic);
        }
    }

    fn check_type(&mut self, type_name: Option<TypeName>, position: &Position) {
        if let Some(type_name) = type_name {
            if !type_name.is_valid() {
                self.errors.emit(
                    Diagnostic::error("Invalid type name.")
                        .with_code(ErrorCode::E203)
                        .with_label(position.clone(), format!("`{type_name}` is not a type name"))
                        .with_help("Type names consist of one or more letters, digits or `_`"),
                );
            }
        }
    }

    fn block(
        &mut self,
        kind: BlockKind,
        meta: &Meta<Parse>,
        parent: NodeId,
        id: Option<Id>,
        type_name: Option<TypeName>,
        number: Option<Number>,
    ) -> (NodeId, Meta<Evaluation>) {
        self.check_type(type_name, meta.position());
        self.node(NodeKind::Block(kind), meta, Some(parent), id, number)
    }

    fn document(&mut self, document: &Document<Parse>) -> Document<Evaluation> {
        self.check_type(document.type_name, document.meta.position());
        let (node, meta) = self.node(
            NodeKind::Block(BlockKind::Document),
            &document.meta,
            None,
            document.id,
            None,
        );
        let title = self.texts(&document.title, node);

        let content = match &document.content {
            DocumentContent::Parts(parts) => DocumentContent::Parts(
                parts
                    .iter()
                    .zip(1..)
                    .map(|(part, p)| self.part(part, p, node))
                    .collect(),
            ),
            DocumentContent::Sections(sections) => DocumentContent::Sections(
                sections
                    .iter()
                    .zip(1..)
                    .map(|(section, s)| self.section(section, None, s, node))
                    .collect(),
            ),
        };

        Document {
            meta,
            id: document.id,
            type_name: document.type_name,
            title,
            content,
        }
    }

    fn part(&mut self, part: &Part<Parse>, p: u32, parent: NodeId) -> Part<Evaluation> {
        let (node, meta) = self.block(
            BlockKind::Part,
            &part.meta,
            parent,
            part.id,
            part.type_name,
            Some(Number::Part(p)),
        );
        self.context.record_segment(node);
        let title = self.texts(&part.title, node);
        let sections = part
            .sections
            .iter()
            .zip(1..)
            .map(|(section, s)| self.section(section, Some(p), s, node))
            .collect();

        Part {
            meta,
            id: part.id,
            type_name: part.type_name,
            title,
            sections,
        }
    }

    fn section(
        &mut self,
        section: &Section<Parse>,
        part: Option<u32>,
        s: u32,
        parent: NodeId,
    ) -> Section<Evaluation> {
        let number = match part {
            Some(p) => Number::PartSection(p, s),
            None => Number::Section(s),
        };
        let (node, meta) = self.block(
            BlockKind::Section,
            &section.meta,
            parent,
            section.id,
            section.type_name,
            Some(number),
        );
        self.context.record_segment(node);
        self.section = Some(node);
        let title = self.texts(&section.title, node);

        let content = match &section.content {
            SectionContent::Subsections(subsections) => SectionContent::Subsections(
                subsections
                    .iter()
                    .zip(1..)
                    .map(|(subsection, ss)| self.subsection(subsection, part, s, ss, node))
                    .collect(),
            ),
            SectionContent::Content(content) => SectionContent::Content(self.content(
                content,
                Container::Section { part, section: s },
                node,
            )),
        };

        Section {
            meta,
            id: section.id,
            type_name: section.type_name,
            title,
            content,
        }
    }

    fn subsection(
        &mut self,
        subsection: &Subsection<Parse>,
        part: Option<u32>,
        s: u32,
        ss: u32,
        parent: NodeId,
    ) -> Subsection<Evaluation> {
        let number = match part {
            Some(p) => Number::PartSectionSubsection(p, s, ss),
            None => Number::SectionSubsection(s, ss),
        };
        let (node, meta) = self.block(
            BlockKind::Subsection,
            &subsection.meta,
            parent,
            subsection.id,
            subsection.type_name,
            Some(number),
        );
        let title = self.texts(&subsection.title, node);
        let content = self.content(
            &subsection.content,
            Container::Subsection {
                part,
                section: s,
                subsection: ss,
            },
            node,
        );

        Subsection {
            meta,
            id: subsection.id,
            type_name: subsection.type_name,
            title,
            content,
        }
    }

    fn content(
        &mut self,
        content: &[SubsectionContent<Parse>],
        container: Container,
        parent: NodeId,
    ) -> Vec<SubsectionContent<Evaluation>> {
        let mut counter = 0;
        let mut next_number = || {
            counter += 1;
            Some(container.content(counter))
        };

        content
            .iter()
            .map(|item| match item {
                SubsectionContent::Paragraph(paragraph) => {
                    let (node, meta) = self.block(
                        BlockKind::Paragraph,
                        &paragraph.meta,
                        parent,
                        paragraph.id,
                        paragraph.type_name,
                        next_number(),
                    );
                    SubsectionContent::Paragraph(Paragraph {
                        meta,
                        id: paragraph.id,
                        type_name: paragraph.type_name,
                        content: self.inlines(&paragraph.content, node),
                    })
                }
                SubsectionContent::FormalItem(formal) => {
                    let (node, meta) = self.block(
                        BlockKind::FormalItem,
                        &formal.meta,
                        parent,
                        formal.id,
                        formal.type_name,
                        next_number(),
                    );
                    SubsectionContent::FormalItem(FormalItem {
                        meta,
                        id: formal.id,
                        type_name: formal.type_name,
                        title: self.texts(&formal.title, node),
                        content: self.inlines(&formal.content, node),
                    })
                }
                SubsectionContent::Footnote(footnote) => {
                    let (node, meta) = self.block(
                        BlockKind::Footnote,
                        &footnote.meta,
                        parent,
                        Some(footnote.id),
                        footnote.type_name,
                        None,
                    );
                    if let Some(section) = self.section {
                        let index = self.context.record_footnote(section, node);
                        trace!(id = footnote.id.to_string(), index = index; "Recorded footnote");
                    }
                    SubsectionContent::Footnote(Footnote {
                        meta,
                        id: footnote.id,
                        type_name: footnote.type_name,
                        content: self.inlines(&footnote.content, node),
                    })
                }
            })
            .collect()
    }

    fn inline_node(
        &mut self,
        kind: InlineKind,
        meta: &Meta<Parse>,
        parent: NodeId,
    ) -> (NodeId, Meta<Evaluation>) {
        self.node(NodeKind::Inline(kind), meta, Some(parent), None, None)
    }

    fn text(&mut self, text: &Text<Parse>, parent: NodeId) -> Text<Evaluation> {
        let (_, meta) = self.inline_node(InlineKind::Text, &text.meta, parent);
        Text {
            meta,
            text: text.text.clone(),
            quoted: text.quoted,
        }
    }

    fn texts(&mut self, texts: &[Text<Parse>], parent: NodeId) -> Vec<Text<Evaluation>> {
        texts.iter().map(|text| self.text(text, parent)).collect()
    }

    fn inlines(&mut self, inlines: &[Inline<Parse>], parent: NodeId) -> Vec<Inline<Evaluation>> {
        inlines
            .iter()
            .map(|inline| self.inline(inline, parent))
            .collect()
    }

    fn inline(&mut self, inline: &Inline<Parse>, parent: NodeId) -> Inline<Evaluation> {
        match inline {
            Inline::Text(text) => Inline::Text(self.text(text, parent)),
            Inline::Term(term) => {
                self.check_type(term.type_name, term.meta.position());
                let (node, meta) = self.inline_node(InlineKind::Term, &term.meta, parent);
                Inline::Term(Term {
                    meta,
                    type_name: term.type_name,
                    content: self.texts(&term.content, node),
                })
            }
            Inline::Verbatim(verbatim) => {
                self.check_type(verbatim.type_name, verbatim.meta.position());
                let (node, meta) = self.inline_node(InlineKind::Verbatim, &verbatim.meta, parent);
                Inline::Verbatim(Verbatim {
                    meta,
                    type_name: verbatim.type_name,
                    text: self.text(&verbatim.text, node),
                })
            }
            Inline::FootnoteReference(reference) => {
                let (node, meta) =
                    self.inline_node(InlineKind::FootnoteReference, &reference.meta, parent);
                self.footnote_references.push(PendingFootnoteReference {
                    target: reference.target,
                    node,
                    position: reference.meta.position().clone(),
                });
                Inline::FootnoteReference(FootnoteReference {
                    meta,
                    target: reference.target,
                })
            }
            Inline::Image(image) => Inline::Image(self.image(image, parent)),
            Inline::Link(link) => {
                let (node, meta) = self.inline_node(InlineKind::Link, &link.meta, parent);
                if let LinkTarget::Internal(target) = &link.target {
                    self.links.push(PendingLink {
                        target: *target,
                        position: link.meta.position().clone(),
                    });
                }
                let content = link
                    .content
                    .iter()
                    .map(|content| match content {
                        LinkContent::Text(text) => LinkContent::Text(self.text(text, node)),
                        LinkContent::Image(image) => LinkContent::Image(self.image(image, node)),
                    })
                    .collect();
                Inline::Link(Link {
                    meta,
                    target: link.target.clone(),
                    content,
                })
            }
            Inline::ListOrdered(list) => {
                Inline::ListOrdered(self.list(InlineKind::ListOrdered, list, parent))
            }
            Inline::ListUnordered(list) => {
                Inline::ListUnordered(self.list(InlineKind::ListUnordered, list, parent))
            }
            Inline::Table(table) => Inline::Table(self.table(table, parent)),
        }
    }

    fn image(&mut self, image: &Image<Parse>, parent: NodeId) -> Image<Evaluation> {
        self.check_type(image.type_name, image.meta.position());
        let (node, meta) = self.inline_node(InlineKind::Image, &image.meta, parent);
        Image {
            meta,
            type_name: image.type_name,
            target: image.target.clone(),
            size: image.size,
            content: self.texts(&image.content, node),
        }
    }

    fn list(&mut self, kind: InlineKind, list: &List<Parse>, parent: NodeId) -> List<Evaluation> {
        let (node, meta) = self.inline_node(kind, &list.meta, parent);
        let items = list
            .items
            .iter()
            .map(|item| {
                let (item_node, item_meta) =
                    self.inline_node(InlineKind::ListItem, &item.meta, node);
                ListItem {
                    meta: item_meta,
                    content: self.inlines(&item.content, item_node),
                }
            })
            .collect();
        List { meta, items }
    }

    fn table(&mut self, table: &Table<Parse>, parent: NodeId) -> Table<Evaluation> {
        self.check_type(table.type_name, table.meta.position());
        if self.table_depth > 0 {
            self.errors.emit(
                Diagnostic::error("Tables cannot be nested.")
                    .with_code(ErrorCode::E204)
                    .with_label(table.meta.position().clone(), "nested table"),
            );
        }

        let (node, meta) = self.inline_node(InlineKind::Table, &table.meta, parent);
        let summary = self.texts(&table.summary, node);

        let head = table.head.as_ref().map(|head| {
            let (head_node, head_meta) = self.inline_node(InlineKind::TableHead, &head.meta, node);
            let names = head
                .names
                .iter()
                .map(|name| {
                    let (name_node, name_meta) =
                        self.inline_node(InlineKind::TableColumnName, &name.meta, head_node);
                    TableColumnName {
                        meta: name_meta,
                        content: self.texts(&name.content, name_node),
                    }
                })
                .collect();
            TableHead {
                meta: head_meta,
                names,
            }
        });
        let columns = table.head.as_ref().map(|head| head.names.len());

        let (body_node, body_meta) =
            self.inline_node(InlineKind::TableBody, &table.body.meta, node);
        self.table_depth += 1;
        let rows = table
            .body
            .rows
            .iter()
            .map(|row| self.row(row, columns, body_node))
            .collect();
        self.table_depth -= 1;

        Table {
            meta,
            type_name: table.type_name,
            summary,
            head,
            body: TableBody {
                meta: body_meta,
                rows,
            },
        }
    }

    fn row(
        &mut self,
        row: &TableRow<Parse>,
        columns: Option<usize>,
        parent: NodeId,
    ) -> TableRow<Evaluation> {
        if let Some(columns) = columns {
            if row.cells.len() != columns {
                self.errors.emit(
                    Diagnostic::error(
                        "Row cell count does not match the number of declared columns.",
                    )
                    .with_code(ErrorCode::E205)
                    .with_label(
                        row.meta.position().clone(),
                        format!("row has {} cells", row.cells.len()),
                    )
                    .with_help(format!("The table head declares {columns} columns")),
                );
            }
        }

        let (node, meta) = self.inline_node(InlineKind::TableRow, &row.meta, parent);
        let cells = row
            .cells
            .iter()
            .map(|cell| {
                let (cell_node, cell_meta) =
                    self.inline_node(InlineKind::TableCell, &cell.meta, node);
                TableCell {
                    meta: cell_meta,
                    content: self.inlines(&cell.content, cell_node),
                }
            })
            .collect();
        TableRow { meta, cells }
    }

    /// Check collected references and produce the final result.
    fn finish(mut self, document: Document<Evaluation>) -> Result<Evaluated, ParseError> {
        for link in std::mem::take(&mut self.links) {
            if self.context.block_by_id(link.target).is_none() {
                debug!(target = link.target.to_string(); "Unresolved link target");
                self.errors.emit(nonexistent(link.target, &link.position));
            }
        }

        for reference in std::mem::take(&mut self.footnote_references) {
            let Some(target) = self.context.block_by_id(reference.target) else {
                debug!(target = reference.target.to_string(); "Unresolved footnote reference");
                self.errors
                    .emit(nonexistent(reference.target, &reference.position));
                continue;
            };

            let is_footnote = self
                .context
                .node(target)
                .is_some_and(|info| info.kind() == NodeKind::Block(BlockKind::Footnote));
            if is_footnote {
                self.context
                    .record_footnote_reference(target, reference.node);
            } else {
                let mut diagnostic = Diagnostic::error("Footnote reference to non-footnote.")
                    .with_code(ErrorCode::E202)
                    .with_label(
                        reference.position.clone(),
                        format!("`{}` is not a footnote", reference.target),
                    );
                if let Some(info) = self.context.node(target) {
                    diagnostic =
                        diagnostic.with_secondary_label(info.position().clone(), "declared here");
                }
                self.errors.emit(diagnostic);
            }
        }

        self.errors.finish()?;
        info!(nodes = self.context.node_count(); "Evaluated document");
        Ok(Evaluated {
            document,
            context: self.context,
        })
    }
}

fn nonexistent(target: Id, position: &Position) -> Diagnostic {
    Diagnostic::error("Reference to nonexistent ID.")
        .with_code(ErrorCode::E201)
        .with_label(position.clone(), format!("no element has the identifier `{target}`"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        driver::{Syntax, parse_document_str},
        resolver::ParseSession,
    };

    fn parse(source: &str) -> Document<Parse> {
        let mut session = ParseSession::new("/nonexistent-base").unwrap();
        parse_document_str(&mut session, source, None, Syntax::Canonical).unwrap()
    }

    fn errors(source: &str) -> ParseError {
        evaluate(&parse(source)).unwrap_err()
    }

    fn codes(err: &ParseError) -> Vec<ErrorCode> {
        err.diagnostics().iter().filter_map(Diagnostic::code).collect()
    }

    fn numbers(evaluated: &Evaluated) -> Vec<String> {
        evaluated
            .context
            .numbered_blocks()
            .map(|(number, _)| number.to_string())
            .collect()
    }

    #[test]
    fn test_section_numbers() {
        let evaluated = evaluate(&parse(
            "(document [title T]
               (section [title A] (paragraph a) (formal-item [title F] f) (paragraph b))
               (section [title B] (formal-item [title G] g))
               (section [title C] (subsection [title D] (paragraph c))))",
        ))
        .unwrap();

        assert_eq!(
            numbers(&evaluated),
            ["1", "1.1", "1.2", "1.3", "2", "2.1", "3", "3.1", "3.1.1"]
        );
    }

    #[test]
    fn test_part_numbers() {
        let evaluated = evaluate(&parse(
            "(document [title T]
               (part [title P] (section [title A] (paragraph a)))
               (part [title Q] (section [title B] (subsection [title S] (paragraph b)))))",
        ))
        .unwrap();

        assert_eq!(
            numbers(&evaluated),
            ["1", "1.1", "1.1.1", "2", "2.1", "2.1.1", "2.1.1.1"]
        );
    }

    #[test]
    fn test_duplicate_id_has_both_positions() {
        let err = errors(
            "(document [title T]
               (section [title A] [id x] (paragraph a))
               (section [title B] [id x] (paragraph b)))",
        );
        assert_eq!(codes(&err), [ErrorCode::E200]);

        let labels = err.diagnostics()[0].labels();
        assert_eq!(labels.len(), 2);
        assert!(labels[0].is_primary());
        assert_eq!(labels[0].position().line(), 3);
        assert!(labels[1].is_secondary());
        assert_eq!(labels[1].position().line(), 2);
    }

    #[test]
    fn test_unresolved_link() {
        let err = errors(
            "(document [title T]
               (section [title A] (paragraph (link [target missing] here))))",
        );
        assert_eq!(codes(&err), [ErrorCode::E201]);
        assert_eq!(err.diagnostics()[0].message(), "Reference to nonexistent ID.");
    }

    #[test]
    fn test_forward_link_resolves() {
        let evaluated = evaluate(&parse(
            "(document [title T]
               (section [title A] (paragraph (link [target later] see)))
               (section [title B] [id later] (paragraph b)))",
        ));
        assert!(evaluated.is_ok());
    }

    #[test]
    fn test_footnotes() {
        let evaluated = evaluate(&parse(
            "(document [title T]
               (section [title A] [id a]
                 (paragraph x (footnote-ref n1) (footnote-ref n2))
                 (footnote [id n1] one)
                 (footnote [id n2] two))
               (section [title B]
                 (paragraph (footnote-ref n3))
                 (footnote [id n3] three)))",
        ))
        .unwrap();

        let context = &evaluated.context;
        let n1 = context.block_by_id(Id::parse("n1").unwrap()).unwrap();
        let n2 = context.block_by_id(Id::parse("n2").unwrap()).unwrap();
        let n3 = context.block_by_id(Id::parse("n3").unwrap()).unwrap();
        assert_eq!(context.footnote_index(n1), Some(1));
        assert_eq!(context.footnote_index(n2), Some(2));
        assert_eq!(context.footnote_index(n3), Some(1));
        assert_eq!(context.footnote_references(n1).len(), 1);

        let a = context.block_by_id(Id::parse("a").unwrap()).unwrap();
        assert_eq!(context.footnotes_in(a), &[n1, n2]);
        // Footnotes are not content-numbered.
        assert_eq!(context.number_of(n1), None);
    }

    #[test]
    fn test_footnote_reference_to_non_footnote() {
        let err = errors(
            "(document [title T]
               (section [title A] (paragraph [id p] (footnote-ref p))))",
        );
        assert_eq!(codes(&err), [ErrorCode::E202]);
    }

    #[test]
    fn test_invalid_type_name() {
        let err = errors(
            "(document [title T]
               (section [title A] [type has-dash] (paragraph (term [type \"a b\"] x))))",
        );
        assert_eq!(codes(&err), [ErrorCode::E203, ErrorCode::E203]);
    }

    #[test]
    fn test_table_checks() {
        let err = errors(
            "(document [title T]
               (section [title A]
                 (paragraph
                   (table [summary S]
                     (head (name A) (name B))
                     (body
                       (row (cell a) (cell b))
                       (row (cell c))
                       (row (cell (table [summary N] (body (row (cell x))))) (cell d)))))))",
        );
        assert_eq!(codes(&err), [ErrorCode::E205, ErrorCode::E204]);
    }

    #[test]
    fn test_errors_accumulate() {
        let err = errors(
            "(document [title T]
               (section [title A] [id x] (paragraph (link [target nowhere] l)))
               (section [title B] [id x] [type \"-\"] (paragraph b)))",
        );
        assert_eq!(
            codes(&err),
            [ErrorCode::E203, ErrorCode::E200, ErrorCode::E201]
        );
    }

    #[test]
    fn test_segments() {
        let evaluated = evaluate(&parse(
            "(document [title T]
               (part [title P] [id p] (section [title A] [id a] (paragraph a)))
               (part [title Q] [id q] (section [title B] [id b] (paragraph b))))",
        ))
        .unwrap();

        let context = &evaluated.context;
        let node = |id: &str| context.block_by_id(Id::parse(id).unwrap()).unwrap();
        assert_eq!(context.segment_next(node("p")), Some(node("a")));
        assert_eq!(context.segment_next(node("a")), Some(node("q")));
        assert_eq!(context.segment_previous(node("b")), Some(node("q")));
        assert_eq!(context.segment_up(node("b")), Some(node("q")));
        assert_eq!(context.segment_next(node("b")), None);
    }

    #[test]
    fn test_node_ids_are_preorder() {
        let evaluated = evaluate(&parse(
            "(document [title T] (section [title S] (paragraph Hello)))",
        ))
        .unwrap();

        let document = &evaluated.document;
        assert_eq!(document.meta.data().node(), NodeId::new(0));
        let DocumentContent::Sections(sections) = &document.content else {
            panic!("expected sections");
        };
        // Document, its title text, then the section.
        assert_eq!(sections[0].meta.data().node(), NodeId::new(2));
        assert_eq!(sections[0].meta.data().number(), Some(Number::Section(1)));
    }
}
