//! XML output in the structural namespace.
//!
//! Block elements are indented one per line; the inline content of a block
//! is filled to the configured width. Imports are always written in place,
//! since the format has no import element of its own.

use log::debug;

use kstructural_core::{
    block::{
        DocumentContent, Footnote, FormalItem, Paragraph, SectionContent, SubsectionContent,
    },
    evaluation::{Context, Evaluation},
    identifier::{Id, TypeName},
    inline::{Image, Inline, LinkContent, LinkTarget, List, Table, Text},
};
use kstructural_parser::NAMESPACE;

use super::{Error, Exporter, Layout, OutputFormat, Rendered, Root};

/// The XML backend.
#[derive(Debug, Clone, Default)]
pub struct Xml {
    layout: Layout,
}

impl Xml {
    pub fn new(layout: Layout) -> Self {
        Self { layout }
    }
}

impl Exporter for Xml {
    fn format(&self) -> OutputFormat {
        OutputFormat::Xml
    }

    fn render<'d>(
        &self,
        root: Root<'d>,
        _context: &Context,
        keep_imports: bool,
    ) -> Result<Rendered<'d>, Error> {
        if keep_imports {
            debug!("XML output writes imported content in place");
        }
        let mut writer = Writer {
            layout: self.layout,
            out: String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n"),
            root: true,
        };
        writer.block(root, 0)?;

        debug!(bytes = writer.out.len(); "Rendered XML output");
        Ok(Rendered::new(writer.out))
    }
}

/// Attributes of one element, in writing order.
#[derive(Default)]
struct Attributes(Vec<(&'static str, String)>);

impl Attributes {
    fn common(
        title: Option<&[Text<Evaluation>]>,
        id: Option<Id>,
        type_name: Option<TypeName>,
    ) -> Self {
        let mut attributes = Self::default();
        if let Some(title) = title {
            attributes.push("s:title", words(title));
        }
        if let Some(id) = id {
            attributes.push("xml:id", id.to_string());
        }
        attributes.type_name(type_name);
        attributes
    }

    fn push(&mut self, name: &'static str, value: impl Into<String>) {
        self.0.push((name, value.into()));
    }

    fn type_name(&mut self, type_name: Option<TypeName>) {
        if let Some(type_name) = type_name {
            self.push("s:type", type_name.to_string());
        }
    }
}

struct Writer {
    layout: Layout,
    out: String,
    /// Whether the next element opened is the root, which declares the
    /// namespace.
    root: bool,
}

impl Writer {
    fn block(&mut self, root: Root<'_>, depth: usize) -> Result<(), Error> {
        match root {
            Root::Document(document) => {
                let attributes = Attributes::common(
                    Some(document.title.as_slice()),
                    document.id,
                    document.type_name,
                );
                self.open_line("document", attributes, depth)?;
                match &document.content {
                    DocumentContent::Parts(parts) => {
                        for part in parts {
                            self.block(Root::Part(part), depth + 1)?;
                        }
                    }
                    DocumentContent::Sections(sections) => {
                        for section in sections {
                            self.block(Root::Section(section), depth + 1)?;
                        }
                    }
                }
                self.close_line("document", depth);
            }
            Root::Part(part) => {
                let attributes =
                    Attributes::common(Some(part.title.as_slice()), part.id, part.type_name);
                self.open_line("part", attributes, depth)?;
                for section in &part.sections {
                    self.block(Root::Section(section), depth + 1)?;
                }
                self.close_line("part", depth);
            }
            Root::Section(section) => {
                let attributes = Attributes::common(
                    Some(section.title.as_slice()),
                    section.id,
                    section.type_name,
                );
                self.open_line("section", attributes, depth)?;
                match &section.content {
                    SectionContent::Subsections(subsections) => {
                        for subsection in subsections {
                            self.block(Root::Subsection(subsection), depth + 1)?;
                        }
                    }
                    SectionContent::Content(content) => {
                        for content in content {
                            self.block(Root::Content(content), depth + 1)?;
                        }
                    }
                }
                self.close_line("section", depth);
            }
            Root::Subsection(subsection) => {
                let attributes = Attributes::common(
                    Some(subsection.title.as_slice()),
                    subsection.id,
                    subsection.type_name,
                );
                self.open_line("subsection", attributes, depth)?;
                for content in &subsection.content {
                    self.block(Root::Content(content), depth + 1)?;
                }
                self.close_line("subsection", depth);
            }
            Root::Content(content) => self.content(content, depth)?,
        }
        Ok(())
    }

    fn content(
        &mut self,
        content: &SubsectionContent<Evaluation>,
        depth: usize,
    ) -> Result<(), Error> {
        let (name, attributes, inlines) = match content {
            SubsectionContent::Paragraph(Paragraph {
                id,
                type_name,
                content,
                ..
            }) => ("paragraph", Attributes::common(None, *id, *type_name), content),
            SubsectionContent::FormalItem(FormalItem {
                id,
                type_name,
                title,
                content,
                ..
            }) => (
                "formal-item",
                Attributes::common(Some(title.as_slice()), *id, *type_name),
                content,
            ),
            SubsectionContent::Footnote(Footnote {
                id,
                type_name,
                content,
                ..
            }) => (
                "footnote",
                Attributes::common(None, Some(*id), *type_name),
                content,
            ),
        };

        self.indent(depth);
        let start = self.start_tag(name, attributes)?;
        self.out.push_str(&start);
        let mut column = self.column();
        let child_indent = (depth + 1) * self.layout.indent();
        for (i, inline) in inlines.iter().enumerate() {
            let text = self.inline(inline)?;
            let width = text.chars().count();
            if i > 0 {
                if column + 1 + width > self.layout.width() && !text.contains('\n') {
                    self.out.push('\n');
                    self.out.extend(std::iter::repeat_n(' ', child_indent));
                } else {
                    self.out.push(' ');
                }
            }
            self.out.push_str(&text);
            column = self.column();
        }
        self.out.push_str(&format!("</s:{name}>\n"));
        Ok(())
    }

    /// One inline element, written flat.
    fn inline(&mut self, inline: &Inline<Evaluation>) -> Result<String, Error> {
        let mut out = String::new();
        match inline {
            Inline::Text(text) => out.push_str(&escape_text(&text.text)?),
            Inline::Term(term) => {
                let mut attributes = Attributes::default();
                attributes.type_name(term.type_name);
                let body = escape_text(&words(&term.content))?;
                self.element(&mut out, "term", attributes, &body)?;
            }
            Inline::Verbatim(verbatim) => {
                let mut attributes = Attributes::default();
                attributes.type_name(verbatim.type_name);
                let body = escape_text(&verbatim.text.text)?;
                self.element(&mut out, "verbatim", attributes, &body)?;
            }
            Inline::FootnoteReference(reference) => {
                let mut attributes = Attributes::default();
                attributes.push("s:target", reference.target.to_string());
                self.element(&mut out, "footnote-ref", attributes, "")?;
            }
            Inline::Image(image) => out.push_str(&self.image(image)?),
            Inline::Link(link) => {
                let (name, target) = match &link.target {
                    LinkTarget::Internal(id) => ("link", id.to_string()),
                    LinkTarget::External(uri) => ("link-external", uri.clone()),
                };
                let mut attributes = Attributes::default();
                attributes.push("s:target", target);
                let mut body = Vec::new();
                for content in &link.content {
                    body.push(match content {
                        LinkContent::Text(text) => escape_text(&text.text)?,
                        LinkContent::Image(image) => self.image(image)?,
                    });
                }
                self.element(&mut out, name, attributes, &body.join(" "))?;
            }
            Inline::ListOrdered(list) => out.push_str(&self.list("list-ordered", list)?),
            Inline::ListUnordered(list) => out.push_str(&self.list("list-unordered", list)?),
            Inline::Table(table) => out.push_str(&self.table(table)?),
        }
        Ok(out)
    }

    fn inlines(&mut self, inlines: &[Inline<Evaluation>]) -> Result<String, Error> {
        let parts = inlines
            .iter()
            .map(|inline| self.inline(inline))
            .collect::<Result<Vec<_>, Error>>()?;
        Ok(parts.join(" "))
    }

    fn image(&mut self, image: &Image<Evaluation>) -> Result<String, Error> {
        let mut attributes = Attributes::default();
        attributes.push("s:target", image.target.clone());
        attributes.type_name(image.type_name);
        if let Some(size) = image.size {
            attributes.push("s:width", size.width.to_string());
            attributes.push("s:height", size.height.to_string());
        }
        let mut out = String::new();
        let body = escape_text(&words(&image.content))?;
        self.element(&mut out, "image", attributes, &body)?;
        Ok(out)
    }

    fn list(&mut self, name: &str, list: &List<Evaluation>) -> Result<String, Error> {
        let mut body = String::new();
        for item in &list.items {
            let content = self.inlines(&item.content)?;
            self.element(&mut body, "item", Attributes::default(), &content)?;
        }
        let mut out = String::new();
        self.element(&mut out, name, Attributes::default(), &body)?;
        Ok(out)
    }

    fn table(&mut self, table: &Table<Evaluation>) -> Result<String, Error> {
        let mut attributes = Attributes::default();
        attributes.push("s:summary", words(&table.summary));
        attributes.type_name(table.type_name);

        let mut content = String::new();
        if let Some(head) = &table.head {
            let mut names = String::new();
            for name in &head.names {
                let text = escape_text(&words(&name.content))?;
                self.element(&mut names, "name", Attributes::default(), &text)?;
            }
            self.element(&mut content, "head", Attributes::default(), &names)?;
        }

        let mut rows = String::new();
        for row in &table.body.rows {
            let mut cells = String::new();
            for cell in &row.cells {
                let text = self.inlines(&cell.content)?;
                self.element(&mut cells, "cell", Attributes::default(), &text)?;
            }
            self.element(&mut rows, "row", Attributes::default(), &cells)?;
        }
        self.element(&mut content, "body", Attributes::default(), &rows)?;

        let mut out = String::new();
        self.element(&mut out, "table", attributes, &content)?;
        Ok(out)
    }

    /// `<s:name ...>body</s:name>`, or an empty element tag when there is
    /// no body.
    fn element(
        &mut self,
        out: &mut String,
        name: &str,
        attributes: Attributes,
        body: &str,
    ) -> Result<(), Error> {
        let start = self.start_tag(name, attributes)?;
        if body.is_empty() {
            out.push_str(&start[..start.len() - 1]);
            out.push_str("/>");
        } else {
            out.push_str(&start);
            out.push_str(body);
            out.push_str(&format!("</s:{name}>"));
        }
        Ok(())
    }

    fn start_tag(&mut self, name: &str, attributes: Attributes) -> Result<String, Error> {
        let mut tag = format!("<s:{name}");
        if std::mem::take(&mut self.root) {
            tag.push_str(&format!(" xmlns:s=\"{NAMESPACE}\""));
        }
        for (name, value) in attributes.0 {
            tag.push_str(&format!(" {name}=\"{}\"", escape_attribute(&value)?));
        }
        tag.push('>');
        Ok(tag)
    }

    fn open_line(&mut self, name: &str, attributes: Attributes, depth: usize) -> Result<(), Error> {
        self.indent(depth);
        let start = self.start_tag(name, attributes)?;
        self.out.push_str(&start);
        self.out.push('\n');
        Ok(())
    }

    fn close_line(&mut self, name: &str, depth: usize) {
        self.indent(depth);
        self.out.push_str(&format!("</s:{name}>\n"));
    }

    fn indent(&mut self, depth: usize) {
        self.out
            .extend(std::iter::repeat_n(' ', depth * self.layout.indent()));
    }

    fn column(&self) -> usize {
        let line_start = self.out.rfind('\n').map_or(0, |i| i + 1);
        self.out[line_start..].chars().count()
    }
}

fn words(texts: &[Text<Evaluation>]) -> String {
    texts
        .iter()
        .map(|text| text.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Characters XML 1.0 cannot represent at all.
fn check_char(c: char) -> Result<(), Error> {
    let allowed = matches!(
        c,
        '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..
    );
    if allowed {
        Ok(())
    } else {
        Err(Error::Render(format!(
            "The character U+{:04X} cannot be written as XML",
            c as u32
        )))
    }
}

fn escape_text(text: &str) -> Result<String, Error> {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        check_char(c)?;
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#13;"),
            c => out.push(c),
        }
    }
    Ok(out)
}

fn escape_attribute(value: &str) -> Result<String, Error> {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        check_char(c)?;
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            '\t' => out.push_str("&#9;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            c => out.push(c),
        }
    }
    Ok(out)
}
