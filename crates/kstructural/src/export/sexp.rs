//! S-expression forms shared by the canonical and imperative backends.

use std::fmt;

use kstructural_core::{
    block::{Footnote, FormalItem, Paragraph, SubsectionContent},
    evaluation::{Context, Evaluation},
    identifier::{Id, TypeName},
    inline::{Image, Inline, Link, LinkContent, LinkTarget, List, Table, Text},
};
use kstructural_parser::escape;

use super::{Layout, OutputFormat, Root, import_reference};

/// A printable s-expression.
#[derive(Debug, Clone, PartialEq)]
pub(super) enum Sexp {
    Atom(String),
    List {
        square: bool,
        /// Block forms always start on a line of their own.
        block: bool,
        items: Vec<Sexp>,
    },
}

impl Sexp {
    pub(super) fn symbol(text: impl Into<String>) -> Self {
        Sexp::Atom(text.into())
    }

    pub(super) fn quoted(text: &str) -> Self {
        Sexp::Atom(escape(text))
    }

    pub(super) fn list(square: bool, items: Vec<Sexp>) -> Self {
        Sexp::List {
            square,
            block: false,
            items,
        }
    }

    pub(super) fn block(square: bool, items: Vec<Sexp>) -> Self {
        Sexp::List {
            square,
            block: true,
            items,
        }
    }

    /// A `[name args...]` attribute.
    pub(super) fn attribute(name: &str, mut args: Vec<Sexp>) -> Self {
        args.insert(0, Sexp::symbol(name));
        Sexp::list(true, args)
    }

    /// A text node: a bare symbol where the reader would read it back as
    /// the same unquoted text, a quoted string otherwise.
    pub(super) fn text(text: &Text<Evaluation>) -> Self {
        if !text.quoted && is_symbol(&text.text) {
            Sexp::symbol(text.text.clone())
        } else {
            Sexp::quoted(&text.text)
        }
    }

    fn is_block(&self) -> bool {
        matches!(self, Sexp::List { block: true, .. })
    }

    fn is_attribute(&self) -> bool {
        matches!(self, Sexp::List { square: true, block: false, .. })
    }

    /// Write with line breaks and indentation, starting at `column`.
    pub(super) fn render(&self, layout: &Layout, column: usize, out: &mut String) {
        let flat = self.to_string();
        let (square, items) = match self {
            Sexp::List { square, items, .. }
                if !items.is_empty() && column + flat.chars().count() > layout.width() =>
            {
                (*square, items)
            }
            _ => {
                out.push_str(&flat);
                return;
            }
        };

        let (open, close) = brackets(square);
        out.push(open);
        let mut items = items.iter();
        if let Some(head) = items.next() {
            head.render(layout, column + 1, out);
        }

        let child_column = column + layout.indent();
        let mut in_head = true;
        for item in items {
            let flat = item.to_string();
            let fits = current_column(out) + 1 + flat.chars().count() < layout.width();
            in_head &= item.is_attribute();

            if fits && !item.is_block() && (in_head || !flat.contains('\n')) {
                out.push(' ');
                out.push_str(&flat);
            } else {
                out.push('\n');
                out.extend(std::iter::repeat_n(' ', child_column));
                item.render(layout, child_column, out);
            }
        }
        out.push(close);
    }
}

impl fmt::Display for Sexp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sexp::Atom(text) => f.write_str(text),
            Sexp::List { square, items, .. } => {
                let (open, close) = brackets(*square);
                write!(f, "{open}")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "{close}")
            }
        }
    }
}

fn brackets(square: bool) -> (char, char) {
    if square { ('[', ']') } else { ('(', ')') }
}

fn current_column(out: &str) -> usize {
    let line_start = out.rfind('\n').map_or(0, |i| i + 1);
    out[line_start..].chars().count()
}

/// Text the reader accepts as a single bare symbol.
fn is_symbol(text: &str) -> bool {
    !text.is_empty()
        && text
            .chars()
            .all(|c| !c.is_whitespace() && !matches!(c, '(' | ')' | '[' | ']' | '"'))
}

/// Builds s-expression forms for document nodes, splitting out imported
/// blocks and included texts when asked to.
pub(super) struct Forms<'c, 'd> {
    context: &'c Context,
    format: OutputFormat,
    keep_imports: bool,
    pub(super) imports: Vec<Root<'d>>,
    pub(super) includes: Vec<&'d Text<Evaluation>>,
}

impl<'c, 'd> Forms<'c, 'd> {
    pub(super) fn new(context: &'c Context, format: OutputFormat, keep_imports: bool) -> Self {
        Self {
            context,
            format,
            keep_imports,
            imports: Vec::new(),
            includes: Vec::new(),
        }
    }

    /// The `import` directive standing for `root`, if it was imported and
    /// imports are kept.
    pub(super) fn split(&mut self, root: Root<'d>) -> Option<Sexp> {
        if !self.keep_imports {
            return None;
        }
        let record = self.context.import_of(root.node())?;
        let reference = import_reference(record.file(), self.format);
        self.imports.push(root);
        Some(Sexp::block(
            false,
            vec![Sexp::symbol("import"), Sexp::quoted(&reference)],
        ))
    }

    /// A content block. `children` is false for the imperative command
    /// form, which carries attributes only.
    pub(super) fn content_block(
        &mut self,
        content: &'d SubsectionContent<Evaluation>,
        children: bool,
    ) -> Sexp {
        let (keyword, meta, mut items, inlines) = match content {
            SubsectionContent::Paragraph(Paragraph {
                meta,
                id,
                type_name,
                content,
            }) => (
                "paragraph",
                meta,
                attributes(None, *id, *type_name),
                content.as_slice(),
            ),
            SubsectionContent::FormalItem(FormalItem {
                meta,
                id,
                type_name,
                title,
                content,
            }) => (
                "formal-item",
                meta,
                attributes(Some(title.as_slice()), *id, *type_name),
                content.as_slice(),
            ),
            SubsectionContent::Footnote(Footnote {
                meta,
                id,
                type_name,
                content,
            }) => (
                "footnote",
                meta,
                attributes(None, Some(*id), *type_name),
                content.as_slice(),
            ),
        };

        items.insert(0, Sexp::symbol(keyword));
        if children {
            items.extend(self.inlines(inlines));
        }
        Sexp::block(meta.square(), items)
    }

    pub(super) fn inlines(&mut self, inlines: &'d [Inline<Evaluation>]) -> Vec<Sexp> {
        inlines.iter().map(|inline| self.inline(inline)).collect()
    }

    /// A text node, or the `include` directive it was read from.
    fn text(&mut self, text: &'d Text<Evaluation>) -> Sexp {
        if self.keep_imports {
            if let Some(include) = self.context.include_of(text.meta.data().node()) {
                self.includes.push(text);
                return Sexp::list(
                    text.meta.square(),
                    vec![Sexp::symbol("include"), Sexp::quoted(include.file())],
                );
            }
        }
        Sexp::text(text)
    }

    pub(super) fn inline(&mut self, inline: &'d Inline<Evaluation>) -> Sexp {
        match inline {
            Inline::Text(text) => self.text(text),
            Inline::Term(term) => {
                let mut items = vec![Sexp::symbol("term")];
                items.extend(type_attribute(term.type_name));
                items.extend(term.content.iter().map(Sexp::text));
                Sexp::list(term.meta.square(), items)
            }
            Inline::Verbatim(verbatim) => {
                let mut items = vec![Sexp::symbol("verbatim")];
                items.extend(type_attribute(verbatim.type_name));
                items.push(self.text(&verbatim.text));
                Sexp::list(verbatim.meta.square(), items)
            }
            Inline::FootnoteReference(reference) => Sexp::list(
                reference.meta.square(),
                vec![
                    Sexp::symbol("footnote-ref"),
                    Sexp::symbol(reference.target.to_string()),
                ],
            ),
            Inline::Image(image) => self.image(image),
            Inline::Link(link) => self.link(link),
            Inline::ListOrdered(list) => self.list("list-ordered", list),
            Inline::ListUnordered(list) => self.list("list-unordered", list),
            Inline::Table(table) => self.table(table),
        }
    }

    fn image(&mut self, image: &'d Image<Evaluation>) -> Sexp {
        let mut items = vec![
            Sexp::symbol("image"),
            Sexp::attribute("target", vec![Sexp::quoted(&image.target)]),
        ];
        items.extend(type_attribute(image.type_name));
        if let Some(size) = image.size {
            items.push(Sexp::attribute(
                "size",
                vec![
                    Sexp::symbol(size.width.to_string()),
                    Sexp::symbol(size.height.to_string()),
                ],
            ));
        }
        items.extend(image.content.iter().map(Sexp::text));
        Sexp::list(image.meta.square(), items)
    }

    fn link(&mut self, link: &'d Link<Evaluation>) -> Sexp {
        let (keyword, target) = match &link.target {
            LinkTarget::Internal(id) => ("link", Sexp::symbol(id.to_string())),
            LinkTarget::External(uri) => ("link-ext", Sexp::quoted(uri)),
        };
        let mut items = vec![Sexp::symbol(keyword), Sexp::attribute("target", vec![target])];
        for content in &link.content {
            items.push(match content {
                LinkContent::Text(text) => Sexp::text(text),
                LinkContent::Image(image) => self.image(image),
            });
        }
        Sexp::list(link.meta.square(), items)
    }

    fn list(&mut self, keyword: &str, list: &'d List<Evaluation>) -> Sexp {
        let mut items = vec![Sexp::symbol(keyword)];
        for item in &list.items {
            let mut form = vec![Sexp::symbol("item")];
            form.extend(self.inlines(&item.content));
            items.push(Sexp::list(item.meta.square(), form));
        }
        Sexp::list(list.meta.square(), items)
    }

    fn table(&mut self, table: &'d Table<Evaluation>) -> Sexp {
        let mut items = vec![
            Sexp::symbol("table"),
            Sexp::attribute("summary", table.summary.iter().map(Sexp::text).collect()),
        ];
        items.extend(type_attribute(table.type_name));

        if let Some(head) = &table.head {
            let mut form = vec![Sexp::symbol("head")];
            for name in &head.names {
                let mut name_form = vec![Sexp::symbol("name")];
                name_form.extend(name.content.iter().map(Sexp::text));
                form.push(Sexp::list(name.meta.square(), name_form));
            }
            items.push(Sexp::list(head.meta.square(), form));
        }

        let mut body = vec![Sexp::symbol("body")];
        for row in &table.body.rows {
            let mut row_form = vec![Sexp::symbol("row")];
            for cell in &row.cells {
                let mut cell_form = vec![Sexp::symbol("cell")];
                cell_form.extend(self.inlines(&cell.content));
                row_form.push(Sexp::list(cell.meta.square(), cell_form));
            }
            body.push(Sexp::list(row.meta.square(), row_form));
        }
        items.push(Sexp::list(table.body.meta.square(), body));

        Sexp::list(table.meta.square(), items)
    }
}

/// `[title ...] [id x] [type t]`, leaving out what is absent.
pub(super) fn attributes(
    title: Option<&[Text<Evaluation>]>,
    id: Option<Id>,
    type_name: Option<TypeName>,
) -> Vec<Sexp> {
    let mut attributes = Vec::new();
    if let Some(title) = title {
        attributes.push(Sexp::attribute("title", title.iter().map(Sexp::text).collect()));
    }
    if let Some(id) = id {
        attributes.push(Sexp::attribute("id", vec![Sexp::symbol(id.to_string())]));
    }
    attributes.extend(type_attribute(type_name));
    attributes
}

fn type_attribute(type_name: Option<TypeName>) -> Option<Sexp> {
    type_name.map(|type_name| Sexp::attribute("type", vec![Sexp::symbol(type_name.to_string())]))
}
