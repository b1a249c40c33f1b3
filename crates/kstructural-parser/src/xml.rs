//! The XML syntax.
//!
//! Elements in the `http://schemas.io7m.com/structural/3.0.0` namespace map
//! one to one onto the document model. Character data is split into words,
//! one text node per word, except inside `verbatim` where it is kept intact.
//! Schema validation and XInclude processing are left to external tools.

use std::path::Path;

use log::debug;
use roxmltree::{Document as XmlDocument, Node};

use kstructural_core::{
    annotation::{Meta, Parse},
    block::{Block, Document, Footnote, FormalItem, Paragraph, Part, Section, Subsection},
    identifier::{Id, TypeName},
    inline::{
        FootnoteReference, Image, ImageSize, Inline, Link, LinkContent, LinkTarget, List,
        ListItem, Table, TableBody, TableCell, TableColumnName, TableHead, TableRow, Term, Text,
        Verbatim,
    },
    span::{LineIndex, Position, Span},
};

use crate::{
    attributes::{Dimension, parse_dimension, validate_uri},
    error::{Diagnostic, DriverError, ErrorCode},
    nesting,
};

pub const NAMESPACE: &str = "http://schemas.io7m.com/structural/3.0.0";
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Parse an XML source text into its root block.
pub(crate) fn parse(source: &str, file: Option<&Path>) -> Result<Block<Parse>, DriverError> {
    let index = LineIndex::new(source, file);
    let document = XmlDocument::parse(source).map_err(|err| {
        let pos = err.pos();
        let offset = offset_of(source, pos.row as usize, pos.col as usize);
        Diagnostic::error(format!("Malformed XML: {err}"))
            .with_code(ErrorCode::E109)
            .with_label(index.position(Span::new(offset..offset)), "here")
    })?;

    let mapper = Mapper { index: &index };
    let root = document.root_element();
    debug!(element = root.tag_name().name(); "Mapping XML root element");
    Ok(mapper.block(root)?)
}

/// Byte offset of a 1-based row and column.
fn offset_of(source: &str, row: usize, col: usize) -> usize {
    let line_start: usize = source
        .split_inclusive('\n')
        .take(row.saturating_sub(1))
        .map(str::len)
        .sum();
    let column: usize = source[line_start..]
        .chars()
        .take(col.saturating_sub(1))
        .map(char::len_utf8)
        .sum();
    line_start + column
}

struct Mapper<'i> {
    index: &'i LineIndex,
}

impl Mapper<'_> {
    fn position(&self, node: Node<'_, '_>) -> Position {
        self.index.position(Span::new(node.range()))
    }

    fn meta(&self, node: Node<'_, '_>) -> Meta<Parse> {
        Meta::new(self.position(node), false, Parse::source())
    }

    /// The local name of a structural element, or an error for anything
    /// outside the namespace.
    fn name<'a>(&self, node: Node<'a, '_>) -> Result<&'a str, Diagnostic> {
        let tag = node.tag_name();
        if tag.namespace() == Some(NAMESPACE) {
            Ok(tag.name())
        } else {
            Err(self.unrecognized(node))
        }
    }

    fn unrecognized(&self, node: Node<'_, '_>) -> Diagnostic {
        let tag = node.tag_name();
        let name = match tag.namespace() {
            Some(namespace) => format!("{{{namespace}}}{}", tag.name()),
            None => tag.name().to_string(),
        };
        Diagnostic::error(format!("Unrecognized element: {name}"))
            .with_code(ErrorCode::E109)
            .with_label(self.position(node), "unrecognized element")
    }

    fn attribute<'a>(&self, node: Node<'a, '_>, name: &str) -> Option<&'a str> {
        node.attribute((NAMESPACE, name))
    }

    fn required<'a>(&self, node: Node<'a, '_>, name: &str) -> Result<&'a str, Diagnostic> {
        self.attribute(node, name).ok_or_else(|| {
            Diagnostic::error(format!("Missing required attribute s:{name}."))
                .with_code(ErrorCode::E109)
                .with_label(self.position(node), "attribute missing")
        })
    }

    fn id(&self, node: Node<'_, '_>, text: &str) -> Result<Id, Diagnostic> {
        Id::parse(text).map_err(|err| {
            Diagnostic::error(err.to_string())
                .with_code(ErrorCode::E102)
                .with_label(self.position(node), "invalid identifier")
        })
    }

    fn xml_id(&self, node: Node<'_, '_>) -> Result<Option<Id>, Diagnostic> {
        node.attribute((XML_NAMESPACE, "id"))
            .map(|text| self.id(node, text))
            .transpose()
    }

    fn type_name(&self, node: Node<'_, '_>) -> Option<TypeName> {
        self.attribute(node, "type").map(TypeName::new)
    }

    fn words(&self, node: Node<'_, '_>, text: &str) -> Vec<Text<Parse>> {
        text.split_whitespace()
            .map(|word| Text {
                meta: self.meta(node),
                text: word.to_string(),
                quoted: false,
            })
            .collect()
    }

    fn title(&self, node: Node<'_, '_>) -> Result<Vec<Text<Parse>>, Diagnostic> {
        Ok(self.words(node, self.required(node, "title")?))
    }

    /// Element children, rejecting non-blank character data.
    fn elements<'a, 'input>(
        &self,
        node: Node<'a, 'input>,
    ) -> Result<Vec<Node<'a, 'input>>, Diagnostic> {
        let mut elements = Vec::new();
        for child in node.children() {
            if child.is_element() {
                elements.push(child);
            } else if child.is_text() && !child.text().unwrap_or_default().trim().is_empty() {
                return Err(Diagnostic::error("Unexpected inline content.")
                    .with_code(ErrorCode::E104)
                    .with_label(self.position(child), "text is not allowed here"));
            }
        }
        Ok(elements)
    }

    fn blocks(&self, node: Node<'_, '_>) -> Result<Vec<Block<Parse>>, Diagnostic> {
        self.elements(node)?
            .into_iter()
            .map(|child| self.block(child))
            .collect()
    }

    fn block(&self, node: Node<'_, '_>) -> Result<Block<Parse>, Diagnostic> {
        let block = match self.name(node)? {
            "document" => Block::Document(Document {
                meta: self.meta(node),
                id: self.xml_id(node)?,
                type_name: self.type_name(node),
                title: self.title(node)?,
                content: nesting::document_content(self.blocks(node)?, &self.position(node))?,
            }),
            "part" => Block::Part(Part {
                meta: self.meta(node),
                id: self.xml_id(node)?,
                type_name: self.type_name(node),
                title: self.title(node)?,
                sections: nesting::part_sections(self.blocks(node)?)?,
            }),
            "section" => Block::Section(Section {
                meta: self.meta(node),
                id: self.xml_id(node)?,
                type_name: self.type_name(node),
                title: self.title(node)?,
                content: nesting::section_content(self.blocks(node)?, &self.position(node))?,
            }),
            "subsection" => Block::Subsection(Subsection {
                meta: self.meta(node),
                id: self.xml_id(node)?,
                type_name: self.type_name(node),
                title: self.title(node)?,
                content: nesting::subsection_content(self.blocks(node)?)?,
            }),
            "paragraph" => Block::Paragraph(Paragraph {
                meta: self.meta(node),
                id: self.xml_id(node)?,
                type_name: self.type_name(node),
                content: self.inlines(node)?,
            }),
            "formal-item" => Block::FormalItem(FormalItem {
                meta: self.meta(node),
                id: self.xml_id(node)?,
                type_name: self.type_name(node),
                title: self.title(node)?,
                content: self.inlines(node)?,
            }),
            "footnote" => {
                let id = match self.xml_id(node)? {
                    Some(id) => id,
                    None => {
                        return Err(Diagnostic::error("Missing required attribute xml:id.")
                            .with_code(ErrorCode::E109)
                            .with_label(self.position(node), "footnotes need an identifier"));
                    }
                };
                Block::Footnote(Footnote {
                    meta: self.meta(node),
                    id,
                    type_name: self.type_name(node),
                    content: self.inlines(node)?,
                })
            }
            _ => return Err(self.unrecognized(node)),
        };
        Ok(block)
    }

    /// Mixed content: words and inline elements.
    fn inlines(&self, node: Node<'_, '_>) -> Result<Vec<Inline<Parse>>, Diagnostic> {
        let mut content = Vec::new();
        for child in node.children() {
            if child.is_text() {
                let words = self.words(child, child.text().unwrap_or_default());
                content.extend(words.into_iter().map(Inline::Text));
            } else if child.is_element() {
                content.push(self.inline(child)?);
            }
        }
        Ok(content)
    }

    /// Words only; any element child is an error.
    fn texts(&self, node: Node<'_, '_>) -> Result<Vec<Text<Parse>>, Diagnostic> {
        let mut content = Vec::new();
        for child in node.children() {
            if child.is_text() {
                content.extend(self.words(child, child.text().unwrap_or_default()));
            } else if child.is_element() {
                return Err(Diagnostic::error("Expected text, but received an inline command.")
                    .with_code(ErrorCode::E100)
                    .with_label(self.position(child), "expected text"));
            }
        }
        Ok(content)
    }

    fn inline(&self, node: Node<'_, '_>) -> Result<Inline<Parse>, Diagnostic> {
        let inline = match self.name(node)? {
            "term" => Inline::Term(Term {
                meta: self.meta(node),
                type_name: self.type_name(node),
                content: self.texts(node)?,
            }),
            "verbatim" => {
                let text: String = node
                    .children()
                    .filter(|child| child.is_text())
                    .filter_map(|child| child.text())
                    .collect();
                Inline::Verbatim(Verbatim {
                    meta: self.meta(node),
                    type_name: self.type_name(node),
                    text: Text {
                        meta: self.meta(node),
                        text,
                        quoted: true,
                    },
                })
            }
            "link" => {
                let target = self.required(node, "target")?;
                Inline::Link(Link {
                    meta: self.meta(node),
                    target: LinkTarget::Internal(self.id(node, target)?),
                    content: self.link_content(node)?,
                })
            }
            "link-external" => {
                let target = self.required(node, "target")?;
                Inline::Link(Link {
                    meta: self.meta(node),
                    target: LinkTarget::External(validate_uri(target, &self.position(node))?),
                    content: self.link_content(node)?,
                })
            }
            "footnote-ref" => {
                let target = self.required(node, "target")?;
                Inline::FootnoteReference(FootnoteReference {
                    meta: self.meta(node),
                    target: self.id(node, target)?,
                })
            }
            "image" => Inline::Image(self.image(node)?),
            "list-ordered" => Inline::ListOrdered(self.list(node)?),
            "list-unordered" => Inline::ListUnordered(self.list(node)?),
            "table" => Inline::Table(self.table(node)?),
            _ => return Err(self.unrecognized(node)),
        };
        Ok(inline)
    }

    fn link_content(&self, node: Node<'_, '_>) -> Result<Vec<LinkContent<Parse>>, Diagnostic> {
        let mut content = Vec::new();
        for child in node.children() {
            if child.is_text() {
                let words = self.words(child, child.text().unwrap_or_default());
                content.extend(words.into_iter().map(LinkContent::Text));
            } else if child.is_element() {
                let message = match self.name(child)? {
                    "image" => {
                        content.push(LinkContent::Image(self.image(child)?));
                        continue;
                    }
                    "link" | "link-external" => "Link elements cannot appear inside link elements",
                    "verbatim" => "Verbatim elements cannot appear inside link elements",
                    "term" => "Term elements cannot appear inside link elements",
                    "list-ordered" | "list-unordered" => {
                        "List elements cannot appear inside link elements"
                    }
                    "table" => "Table elements cannot appear inside link elements",
                    "footnote-ref" => "Footnote references cannot appear inside link elements",
                    _ => return Err(self.unrecognized(child)),
                };
                return Err(Diagnostic::error(message)
                    .with_code(ErrorCode::E111)
                    .with_label(self.position(child), "not allowed in a link"));
            }
        }
        Ok(content)
    }

    fn image(&self, node: Node<'_, '_>) -> Result<Image<Parse>, Diagnostic> {
        let position = self.position(node);
        let target = validate_uri(self.required(node, "target")?, &position)?;
        let size = match (self.attribute(node, "width"), self.attribute(node, "height")) {
            (Some(width), Some(height)) => Some(ImageSize {
                width: parse_dimension(width, &position, Dimension::Width)?,
                height: parse_dimension(height, &position, Dimension::Height)?,
            }),
            (None, None) => None,
            _ => {
                return Err(Diagnostic::error(
                    "Images need both s:width and s:height, or neither.",
                )
                .with_code(ErrorCode::E110)
                .with_label(position, "incomplete size"));
            }
        };

        Ok(Image {
            meta: self.meta(node),
            type_name: self.type_name(node),
            target,
            size,
            content: self.texts(node)?,
        })
    }

    /// Children that must all be the structural element `expected`.
    fn children_named<'a, 'input>(
        &self,
        node: Node<'a, 'input>,
        expected: &str,
    ) -> Result<Vec<Node<'a, 'input>>, Diagnostic> {
        let children = self.elements(node)?;
        for child in &children {
            if self.name(*child)? != expected {
                return Err(self.unrecognized(*child)
                    .with_help(format!("Expected a {expected} element")));
            }
        }
        Ok(children)
    }

    fn list(&self, node: Node<'_, '_>) -> Result<List<Parse>, Diagnostic> {
        let items = self
            .children_named(node, "item")?
            .into_iter()
            .map(|item| {
                Ok(ListItem {
                    meta: self.meta(item),
                    content: self.inlines(item)?,
                })
            })
            .collect::<Result<Vec<_>, Diagnostic>>()?;

        Ok(List {
            meta: self.meta(node),
            items,
        })
    }

    fn table(&self, node: Node<'_, '_>) -> Result<Table<Parse>, Diagnostic> {
        let summary = self.words(node, self.required(node, "summary")?);

        let (head, body) = match self.elements(node)?.as_slice() {
            [head, body] if self.name(*head)? == "head" => (Some(*head), *body),
            [body] => (None, *body),
            _ => {
                return Err(Diagnostic::error("No table body provided")
                    .with_code(ErrorCode::E109)
                    .with_label(self.position(node), "expected an optional head and a body"));
            }
        };
        if self.name(body)? != "body" {
            return Err(Diagnostic::error("No table body provided")
                .with_code(ErrorCode::E109)
                .with_label(self.position(body), "expected a body element"));
        }

        let head = head
            .map(|head| -> Result<TableHead<Parse>, Diagnostic> {
                let names = self
                    .children_named(head, "name")?
                    .into_iter()
                    .map(|name| {
                        Ok(TableColumnName {
                            meta: self.meta(name),
                            content: self.texts(name)?,
                        })
                    })
                    .collect::<Result<Vec<_>, Diagnostic>>()?;
                Ok(TableHead {
                    meta: self.meta(head),
                    names,
                })
            })
            .transpose()?;

        let mut rows = Vec::new();
        for row in self.children_named(body, "row")? {
            let cells = self
                .children_named(row, "cell")?
                .into_iter()
                .map(|cell| {
                    Ok(TableCell {
                        meta: self.meta(cell),
                        content: self.inlines(cell)?,
                    })
                })
                .collect::<Result<Vec<_>, Diagnostic>>()?;
            rows.push(TableRow {
                meta: self.meta(row),
                cells,
            });
        }

        Ok(Table {
            meta: self.meta(node),
            type_name: self.type_name(node),
            summary,
            head,
            body: TableBody {
                meta: self.meta(body),
                rows,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use kstructural_core::block::{DocumentContent, SectionContent, SubsectionContent};

    use super::*;

    fn wrap(body: &str) -> String {
        format!(
            r#"<s:document xmlns:s="{NAMESPACE}" s:title="The Title">{body}</s:document>"#
        )
    }

    fn message(result: Result<Block<Parse>, DriverError>) -> String {
        match result.unwrap_err() {
            DriverError::Parse(err) => err.diagnostics()[0].message().to_string(),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_document() {
        let source = wrap(
            r#"<s:section s:title="One" xml:id="s1">
                 <s:paragraph>Hello <s:term s:type="name">big world</s:term></s:paragraph>
               </s:section>"#,
        );
        let Block::Document(document) = parse(&source, None).unwrap() else {
            panic!("expected document");
        };
        let title: Vec<_> = document.title.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(title, ["The", "Title"]);

        let DocumentContent::Sections(sections) = &document.content else {
            panic!("expected sections");
        };
        assert_eq!(sections[0].id.unwrap(), "s1");
        let SectionContent::Content(content) = &sections[0].content else {
            panic!("expected content");
        };
        let SubsectionContent::Paragraph(paragraph) = &content[0] else {
            panic!("expected paragraph");
        };
        assert_eq!(paragraph.content.len(), 2);
        let Inline::Term(term) = &paragraph.content[1] else {
            panic!("expected term");
        };
        assert_eq!(term.content.len(), 2);
        assert_eq!(term.type_name.unwrap(), "name");
    }

    #[test]
    fn test_positions_point_at_elements() {
        let source = wrap("\n<s:section s:title=\"x\"><s:paragraph>a</s:paragraph></s:section>");
        let Block::Document(document) = parse(&source, Some(Path::new("d.xml"))).unwrap() else {
            panic!("expected document");
        };
        let DocumentContent::Sections(sections) = &document.content else {
            panic!("expected sections");
        };
        let position = sections[0].meta.position();
        assert_eq!((position.line(), position.column()), (2, 1));
        assert_eq!(position.file(), Some(Path::new("d.xml")));
    }

    #[test]
    fn test_verbatim_keeps_whitespace() {
        let source = wrap(
            r#"<s:section s:title="x"><s:paragraph><s:verbatim>  a
  b</s:verbatim></s:paragraph></s:section>"#,
        );
        let Block::Document(document) = parse(&source, None).unwrap() else {
            panic!("expected document");
        };
        let DocumentContent::Sections(sections) = document.content else {
            panic!("expected sections");
        };
        let SectionContent::Content(content) = &sections[0].content else {
            panic!("expected content");
        };
        let SubsectionContent::Paragraph(paragraph) = &content[0] else {
            panic!("expected paragraph");
        };
        let Inline::Verbatim(verbatim) = &paragraph.content[0] else {
            panic!("expected verbatim");
        };
        assert_eq!(verbatim.text.text, "  a\n  b");
    }

    #[test]
    fn test_unknown_element() {
        let source = wrap(r#"<s:chapter s:title="x"/>"#);
        assert_eq!(
            message(parse(&source, None)),
            format!("Unrecognized element: {{{NAMESPACE}}}chapter")
        );
    }

    #[test]
    fn test_foreign_namespace() {
        let source = r#"<document xmlns="urn:other"/>"#;
        assert_eq!(
            message(parse(source, None)),
            "Unrecognized element: {urn:other}document"
        );
    }

    #[test]
    fn test_table_without_body() {
        let source = wrap(
            r#"<s:section s:title="x"><s:paragraph><s:table s:summary="S">
                 <s:head><s:name>A</s:name></s:head>
               </s:table></s:paragraph></s:section>"#,
        );
        assert_eq!(message(parse(&source, None)), "No table body provided");
    }

    #[test]
    fn test_link_content_restrictions() {
        let source = wrap(
            r#"<s:section s:title="x"><s:paragraph>
                 <s:link s:target="s1"><s:term>t</s:term></s:link>
               </s:paragraph></s:section>"#,
        );
        assert_eq!(
            message(parse(&source, None)),
            "Term elements cannot appear inside link elements"
        );
    }

    #[test]
    fn test_malformed_xml() {
        let err = parse("<s:document", Some(Path::new("bad.xml"))).unwrap_err();
        let DriverError::Parse(err) = err else {
            panic!("expected parse error");
        };
        assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::E109));
        assert!(err.diagnostics()[0].message().starts_with("Malformed XML: "));
    }
}
