//! The frame stack that turns a flat command stream into a block tree.
//!
//! At most one block of each level is open at a time: a document, a part, a
//! section, a subsection and one content block (paragraph, formal item or
//! footnote). Opening a block closes every open block at the same or a
//! deeper level, attaching each to its parent. The first block opened is the
//! root; it is completed by [`Builder::finish`].
//!
//! Every operation validates before it mutates, so a rejected command
//! leaves the frames exactly as they were.

use log::trace;

use kstructural_core::{
    annotation::Parse,
    block::{
        Block, BlockKind, Document, DocumentContent, Part, Section, SectionContent, Subsection,
        SubsectionContent,
    },
    inline::Inline,
};

use crate::{
    error::{Diagnostic, ErrorCode},
    nesting,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Level {
    Document,
    Part,
    Section,
    Subsection,
    Content,
}

impl Level {
    fn of(kind: BlockKind) -> Option<Self> {
        match kind {
            BlockKind::Document => Some(Level::Document),
            BlockKind::Part => Some(Level::Part),
            BlockKind::Section => Some(Level::Section),
            BlockKind::Subsection => Some(Level::Subsection),
            BlockKind::Paragraph | BlockKind::FormalItem | BlockKind::Footnote => {
                Some(Level::Content)
            }
            BlockKind::Import => None,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct Builder {
    root: Option<Level>,
    document: Option<Document<Parse>>,
    part: Option<Part<Parse>>,
    section: Option<Section<Parse>>,
    subsection: Option<Subsection<Parse>>,
    content: Option<SubsectionContent<Parse>>,
    completed: Option<Block<Parse>>,
}

impl Builder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Open `block`, which has no content yet.
    pub(crate) fn open(&mut self, block: Block<Parse>) -> Result<(), Diagnostic> {
        let level = self.check_placement(&block)?;
        trace!(kind = block.kind().keyword(); "Opening block");

        if self.root.is_none() {
            self.root = Some(level);
        } else {
            self.close_from(level);
        }

        match block {
            Block::Document(document) => self.document = Some(document),
            Block::Part(part) => self.part = Some(part),
            Block::Section(section) => self.section = Some(section),
            Block::Subsection(subsection) => self.subsection = Some(subsection),
            other => self.content = other.into_content().ok(),
        }
        Ok(())
    }

    /// Attach a complete block, the root of an imported file.
    pub(crate) fn attach(&mut self, block: Block<Parse>) -> Result<(), Diagnostic> {
        let level = self.check_placement(&block)?;
        trace!(kind = block.kind().keyword(); "Attaching imported block");

        if self.root.is_none() {
            self.root = Some(level);
            self.completed = Some(block);
            return Ok(());
        }

        self.close_from(level);
        match block {
            Block::Part(part) => self.attach_part(part),
            Block::Section(section) => self.attach_section(section),
            Block::Subsection(subsection) => self.attach_subsection(subsection),
            other => {
                if let Ok(content) = other.into_content() {
                    self.attach_content(content);
                }
            }
        }
        Ok(())
    }

    /// Append inline content to the open content block.
    pub(crate) fn inline(&mut self, inline: Inline<Parse>) -> Result<(), Diagnostic> {
        let Some(content) = &mut self.content else {
            return Err(Diagnostic::error("Unexpected inline content.")
                .with_code(ErrorCode::E104)
                .with_label(inline.meta().position().clone(), "no paragraph is open")
                .with_help("Expected: a block command"));
        };
        match content {
            SubsectionContent::Paragraph(paragraph) => paragraph.content.push(inline),
            SubsectionContent::FormalItem(item) => item.content.push(inline),
            SubsectionContent::Footnote(footnote) => footnote.content.push(inline),
        }
        Ok(())
    }

    /// Close every open block. Returns the root, or `None` if nothing was
    /// ever opened.
    pub(crate) fn finish(mut self) -> Result<Option<Block<Parse>>, Diagnostic> {
        if self.root.is_none() || self.completed.is_some() {
            return Ok(self.completed);
        }

        if let Some(section) = self.section.as_ref().filter(|_| self.section_is_empty()) {
            return Err(nesting::empty(BlockKind::Section, section.meta.position()));
        }
        if let Some(document) = &self.document {
            let empty = self.part.is_none()
                && self.section.is_none()
                && match &document.content {
                    DocumentContent::Parts(parts) => parts.is_empty(),
                    DocumentContent::Sections(sections) => sections.is_empty(),
                };
            if empty {
                return Err(nesting::empty(BlockKind::Document, document.meta.position()));
            }
        }

        self.close_from(Level::Document);
        trace!("Completed root block");
        Ok(self.completed)
    }

    /// Check that `block` may be placed now, and return its level.
    fn check_placement(&self, block: &Block<Parse>) -> Result<Level, Diagnostic> {
        let Some(level) = Level::of(block.kind()) else {
            return Err(nesting::unexpected(block, "a block"));
        };
        if self.completed.is_some() {
            return Err(nesting::unexpected(block, "nothing after the root block"));
        }
        let Some(root) = self.root else {
            return Ok(level);
        };
        if level <= root {
            return Err(nesting::unexpected(
                block,
                &format!("content of the root {}", root_kind(root)),
            ));
        }

        match level {
            Level::Document => return Err(nesting::unexpected(block, "a single document")),
            Level::Part => {
                if self.document_has_sections() {
                    return Err(nesting::unexpected(block, "a section"));
                }
            }
            Level::Section => {
                if self.part.is_none() && self.document_has_parts() {
                    return Err(nesting::unexpected(block, "a part"));
                }
            }
            Level::Subsection => {
                if self.section.is_none() {
                    return Err(nesting::unexpected(block, "a section"));
                }
                if self.section_has_content() {
                    return Err(nesting::unexpected(block, "subsection content"));
                }
            }
            Level::Content => {
                if self.subsection.is_none() {
                    if self.section.is_none() {
                        return Err(nesting::unexpected(block, "a section or subsection"));
                    }
                    if self.section_has_subsections() {
                        return Err(nesting::unexpected(block, "a subsection"));
                    }
                }
            }
        }

        if level <= Level::Section && self.section_is_empty() {
            if let Some(section) = &self.section {
                return Err(nesting::empty(BlockKind::Section, section.meta.position()));
            }
        }
        Ok(level)
    }

    fn document_has_sections(&self) -> bool {
        let closed = self.document.as_ref().is_some_and(|document| {
            matches!(&document.content, DocumentContent::Sections(s) if !s.is_empty())
        });
        closed || (self.part.is_none() && self.section.is_some())
    }

    fn document_has_parts(&self) -> bool {
        let closed = self.document.as_ref().is_some_and(|document| {
            matches!(&document.content, DocumentContent::Parts(p) if !p.is_empty())
        });
        closed || self.part.is_some()
    }

    fn section_has_content(&self) -> bool {
        let closed = self.section.as_ref().is_some_and(|section| {
            matches!(&section.content, SectionContent::Content(c) if !c.is_empty())
        });
        closed || (self.subsection.is_none() && self.content.is_some())
    }

    fn section_has_subsections(&self) -> bool {
        let closed = self.section.as_ref().is_some_and(|section| {
            matches!(&section.content, SectionContent::Subsections(s) if !s.is_empty())
        });
        closed || self.subsection.is_some()
    }

    fn section_is_empty(&self) -> bool {
        self.section.is_some() && !self.section_has_content() && !self.section_has_subsections()
    }

    /// Close all open blocks at `level` or deeper, innermost first.
    fn close_from(&mut self, level: Level) {
        if let Some(content) = self.content.take() {
            self.attach_content(content);
        }
        if level <= Level::Subsection {
            if let Some(subsection) = self.subsection.take() {
                self.attach_subsection(subsection);
            }
        }
        if level <= Level::Section {
            if let Some(section) = self.section.take() {
                self.attach_section(section);
            }
        }
        if level <= Level::Part {
            if let Some(part) = self.part.take() {
                self.attach_part(part);
            }
        }
        if level <= Level::Document {
            if let Some(document) = self.document.take() {
                self.completed = Some(Block::Document(document));
            }
        }
    }

    fn attach_content(&mut self, content: SubsectionContent<Parse>) {
        if let Some(subsection) = &mut self.subsection {
            subsection.content.push(content);
        } else if let Some(section) = &mut self.section {
            match &mut section.content {
                SectionContent::Content(existing) => existing.push(content),
                other => *other = SectionContent::Content(vec![content]),
            }
        } else {
            self.completed = Some(content.into_block());
        }
    }

    fn attach_subsection(&mut self, subsection: Subsection<Parse>) {
        if let Some(section) = &mut self.section {
            match &mut section.content {
                SectionContent::Subsections(existing) => existing.push(subsection),
                other => *other = SectionContent::Subsections(vec![subsection]),
            }
        } else {
            self.completed = Some(Block::Subsection(subsection));
        }
    }

    fn attach_section(&mut self, section: Section<Parse>) {
        if let Some(part) = &mut self.part {
            part.sections.push(section);
        } else if let Some(document) = &mut self.document {
            match &mut document.content {
                DocumentContent::Sections(existing) => existing.push(section),
                other => *other = DocumentContent::Sections(vec![section]),
            }
        } else {
            self.completed = Some(Block::Section(section));
        }
    }

    fn attach_part(&mut self, part: Part<Parse>) {
        if let Some(document) = &mut self.document {
            match &mut document.content {
                DocumentContent::Parts(existing) => existing.push(part),
                other => *other = DocumentContent::Parts(vec![part]),
            }
        } else {
            self.completed = Some(Block::Part(part));
        }
    }
}

fn root_kind(level: Level) -> &'static str {
    match level {
        Level::Document => "document",
        Level::Part => "part",
        Level::Section => "section",
        Level::Subsection => "subsection",
        Level::Content => "content block",
    }
}
