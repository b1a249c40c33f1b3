//! Imperative output: one block command per line, each followed by the
//! inline content of the block, filled to the configured width.

use log::debug;

use kstructural_core::{
    block::{DocumentContent, SectionContent, SubsectionContent},
    evaluation::{Context, Evaluation},
    inline::Inline,
};

use super::{
    Error, Exporter, Layout, OutputFormat, Rendered, Root,
    sexp::{Forms, Sexp, attributes},
};

/// The imperative backend.
#[derive(Debug, Clone, Default)]
pub struct Imperative {
    layout: Layout,
}

impl Imperative {
    pub fn new(layout: Layout) -> Self {
        Self { layout }
    }
}

impl Exporter for Imperative {
    fn format(&self) -> OutputFormat {
        OutputFormat::Imperative
    }

    fn render<'d>(
        &self,
        root: Root<'d>,
        context: &Context,
        keep_imports: bool,
    ) -> Result<Rendered<'d>, Error> {
        let mut writer = Writer {
            layout: self.layout,
            forms: Forms::new(context, OutputFormat::Imperative, keep_imports),
            out: String::new(),
        };
        writer.root(root);

        debug!(bytes = writer.out.len(); "Rendered imperative output");
        Ok(Rendered {
            text: writer.out,
            imports: writer.forms.imports,
            includes: writer.forms.includes,
        })
    }
}

struct Writer<'c, 'd> {
    layout: Layout,
    forms: Forms<'c, 'd>,
    out: String,
}

impl<'d> Writer<'_, 'd> {
    fn root(&mut self, root: Root<'d>) {
        match root {
            Root::Document(document) => {
                self.command(
                    "document",
                    attributes(
                        Some(document.title.as_slice()),
                        document.id,
                        document.type_name,
                    ),
                );
                match &document.content {
                    DocumentContent::Parts(parts) => {
                        for part in parts {
                            self.child(Root::Part(part));
                        }
                    }
                    DocumentContent::Sections(sections) => {
                        for section in sections {
                            self.child(Root::Section(section));
                        }
                    }
                }
            }
            Root::Part(part) => {
                self.command(
                    "part",
                    attributes(Some(part.title.as_slice()), part.id, part.type_name),
                );
                for section in &part.sections {
                    self.child(Root::Section(section));
                }
            }
            Root::Section(section) => {
                self.command(
                    "section",
                    attributes(
                        Some(section.title.as_slice()),
                        section.id,
                        section.type_name,
                    ),
                );
                match &section.content {
                    SectionContent::Subsections(subsections) => {
                        for subsection in subsections {
                            self.child(Root::Subsection(subsection));
                        }
                    }
                    SectionContent::Content(content) => {
                        for content in content {
                            self.child(Root::Content(content));
                        }
                    }
                }
            }
            Root::Subsection(subsection) => {
                self.command(
                    "subsection",
                    attributes(
                        Some(subsection.title.as_slice()),
                        subsection.id,
                        subsection.type_name,
                    ),
                );
                for content in &subsection.content {
                    self.child(Root::Content(content));
                }
            }
            Root::Content(content) => {
                let command = self.forms.content_block(content, false);
                self.line(&command);
                self.fill(content_inlines(content));
            }
        }
    }

    fn child(&mut self, root: Root<'d>) {
        match self.forms.split(root) {
            Some(import) => self.line(&import),
            None => self.root(root),
        }
    }

    /// A structural block command, set off from what precedes it.
    fn command(&mut self, keyword: &str, attributes: Vec<Sexp>) {
        if !self.out.is_empty() {
            self.out.push('\n');
        }
        let mut items = vec![Sexp::symbol(keyword)];
        items.extend(attributes);
        self.line(&Sexp::list(false, items));
    }

    fn line(&mut self, sexp: &Sexp) {
        sexp.render(&self.layout, 0, &mut self.out);
        self.out.push('\n');
    }

    /// Inline content, packed onto lines no wider than the layout allows.
    fn fill(&mut self, inlines: &'d [Inline<Evaluation>]) {
        let mut column = 0;
        for sexp in self.forms.inlines(inlines) {
            let flat = sexp.to_string();
            let width = flat.chars().count();

            if column > 0 && column + 1 + width <= self.layout.width() {
                self.out.push(' ');
                self.out.push_str(&flat);
                column += 1 + width;
                continue;
            }
            if column > 0 {
                self.out.push('\n');
            }
            sexp.render(&self.layout, 0, &mut self.out);
            let line_start = self.out.rfind('\n').map_or(0, |i| i + 1);
            column = self.out[line_start..].chars().count();
        }
        if column > 0 {
            self.out.push('\n');
        }
    }
}

fn content_inlines(content: &SubsectionContent<Evaluation>) -> &[Inline<Evaluation>] {
    match content {
        SubsectionContent::Paragraph(paragraph) => &paragraph.content,
        SubsectionContent::FormalItem(item) => &item.content,
        SubsectionContent::Footnote(footnote) => &footnote.content,
    }
}
