//! Canonical s-expression output.
//!
//! Writes one nested expression per file, breaking lines and indenting to
//! fit the configured width.

use log::debug;

use kstructural_core::{
    block::{DocumentContent, Part, Section, SectionContent, Subsection, SubsectionContent},
    evaluation::{Context, Evaluation},
};

use super::{
    Error, Exporter, Layout, OutputFormat, Rendered, Root,
    sexp::{Forms, Sexp, attributes},
};

/// The canonical backend.
#[derive(Debug, Clone, Default)]
pub struct Canonical {
    layout: Layout,
}

impl Canonical {
    pub fn new(layout: Layout) -> Self {
        Self { layout }
    }
}

impl Exporter for Canonical {
    fn format(&self) -> OutputFormat {
        OutputFormat::Canonical
    }

    fn render<'d>(
        &self,
        root: Root<'d>,
        context: &Context,
        keep_imports: bool,
    ) -> Result<Rendered<'d>, Error> {
        let mut forms = Forms::new(context, OutputFormat::Canonical, keep_imports);
        let sexp = root_form(&mut forms, root);

        let mut text = String::new();
        sexp.render(&self.layout, 0, &mut text);
        text.push('\n');

        debug!(
            bytes = text.len(),
            imports = forms.imports.len(),
            includes = forms.includes.len();
            "Rendered canonical output"
        );
        Ok(Rendered {
            text,
            imports: forms.imports,
            includes: forms.includes,
        })
    }
}

fn root_form<'d>(forms: &mut Forms<'_, 'd>, root: Root<'d>) -> Sexp {
    match root {
        Root::Document(document) => {
            let mut items = vec![Sexp::symbol("document")];
            items.extend(attributes(
                Some(document.title.as_slice()),
                document.id,
                document.type_name,
            ));
            match &document.content {
                DocumentContent::Parts(parts) => {
                    items.extend(parts.iter().map(|part| child(forms, Root::Part(part))));
                }
                DocumentContent::Sections(sections) => {
                    items.extend(
                        sections
                            .iter()
                            .map(|section| child(forms, Root::Section(section))),
                    );
                }
            }
            Sexp::block(document.meta.square(), items)
        }
        Root::Part(part) => part_form(forms, part),
        Root::Section(section) => section_form(forms, section),
        Root::Subsection(subsection) => subsection_form(forms, subsection),
        Root::Content(content) => forms.content_block(content, true),
    }
}

/// A nested block, or the `import` directive it came from.
fn child<'d>(forms: &mut Forms<'_, 'd>, root: Root<'d>) -> Sexp {
    match forms.split(root) {
        Some(import) => import,
        None => root_form(forms, root),
    }
}

fn part_form<'d>(forms: &mut Forms<'_, 'd>, part: &'d Part<Evaluation>) -> Sexp {
    let mut items = vec![Sexp::symbol("part")];
    items.extend(attributes(Some(part.title.as_slice()), part.id, part.type_name));
    items.extend(
        part.sections
            .iter()
            .map(|section| child(forms, Root::Section(section))),
    );
    Sexp::block(part.meta.square(), items)
}

fn section_form<'d>(forms: &mut Forms<'_, 'd>, section: &'d Section<Evaluation>) -> Sexp {
    let mut items = vec![Sexp::symbol("section")];
    items.extend(attributes(
        Some(section.title.as_slice()),
        section.id,
        section.type_name,
    ));
    match &section.content {
        SectionContent::Subsections(subsections) => items.extend(
            subsections
                .iter()
                .map(|subsection| child(forms, Root::Subsection(subsection))),
        ),
        SectionContent::Content(content) => items.extend(contents(forms, content)),
    }
    Sexp::block(section.meta.square(), items)
}

fn subsection_form<'d>(forms: &mut Forms<'_, 'd>, subsection: &'d Subsection<Evaluation>) -> Sexp {
    let mut items = vec![Sexp::symbol("subsection")];
    items.extend(attributes(
        Some(subsection.title.as_slice()),
        subsection.id,
        subsection.type_name,
    ));
    items.extend(contents(forms, &subsection.content));
    Sexp::block(subsection.meta.square(), items)
}

fn contents<'d>(
    forms: &mut Forms<'_, 'd>,
    content: &'d [SubsectionContent<Evaluation>],
) -> Vec<Sexp> {
    content
        .iter()
        .map(|content| child(forms, Root::Content(content)))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use kstructural_parser::{ParseSession, Syntax, evaluate, parse_document_str};

    use super::*;

    fn render(source: &str, layout: Layout) -> String {
        let mut session = ParseSession::new("/nonexistent-base").unwrap();
        let document = parse_document_str(
            &mut session,
            source,
            Some(Path::new("/nonexistent-base/d.sd")),
            Syntax::Canonical,
        )
        .unwrap();
        let evaluated = evaluate(&document).unwrap();
        Canonical::new(layout)
            .render(
                Root::Document(&evaluated.document),
                &evaluated.context,
                false,
            )
            .unwrap()
            .text
    }

    #[test]
    fn test_small_document_on_one_line() {
        let text = render(
            r#"(document [title "T"] (section [title "S"] (paragraph "Hello")))"#,
            Layout::new(2, 200),
        );
        assert_eq!(
            text,
            "(document [title \"T\"] (section [title \"S\"] (paragraph \"Hello\")))\n"
        );
    }

    #[test]
    fn test_nested_blocks_indent() {
        let text = render(
            "(document [title Example] [id doc]
               (section [title One] (paragraph Hello world))
               (section [title Two] [type aside] (paragraph Goodbye)))",
            Layout::new(2, 40),
        );
        assert_eq!(
            text,
            "(document [title Example] [id doc]\n\
             \x20 (section [title One]\n\
             \x20   (paragraph Hello world))\n\
             \x20 (section [title Two] [type aside]\n\
             \x20   (paragraph Goodbye)))\n"
        );
    }

    #[test]
    fn test_inline_forms() {
        let text = render(
            r#"(document [title T]
               (section [title S]
                 (paragraph
                   (term [type name] x)
                   (verbatim "a\\b")
                   (link-ext [target "http://example.com"] (image [target "i.png"] [size 1 2] pic))
                   (footnote-ref n))
                 (footnote [id n] note)))"#,
            Layout::new(2, 500),
        );
        assert!(text.contains("(term [type name] x)"));
        assert!(text.contains(r#"(verbatim "a\\b")"#));
        assert!(text.contains(
            r#"(link-ext [target "http://example.com"] (image [target "i.png"] [size 1 2] pic))"#
        ));
        assert!(text.contains("(footnote-ref n)"));
        assert!(text.contains("(footnote [id n] note)"));
    }
}
