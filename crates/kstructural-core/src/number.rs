//! Hierarchical block numbers.

use std::fmt;

/// The number assigned to a block by the evaluator.
///
/// Documents with parts number everything under the part; documents with
/// top-level sections start at the section. Paragraphs and formal items share
/// the content counter of their enclosing section or subsection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Number {
    Part(u32),
    PartSection(u32, u32),
    PartSectionContent(u32, u32, u32),
    PartSectionSubsection(u32, u32, u32),
    PartSectionSubsectionContent(u32, u32, u32, u32),
    Section(u32),
    SectionContent(u32, u32),
    SectionSubsection(u32, u32),
    SectionSubsectionContent(u32, u32, u32),
}

impl Number {
    /// The components from outermost to innermost.
    pub fn components(&self) -> Vec<u32> {
        match *self {
            Number::Part(p) | Number::Section(p) => vec![p],
            Number::PartSection(a, b)
            | Number::SectionContent(a, b)
            | Number::SectionSubsection(a, b) => vec![a, b],
            Number::PartSectionContent(a, b, c)
            | Number::PartSectionSubsection(a, b, c)
            | Number::SectionSubsectionContent(a, b, c) => vec![a, b, c],
            Number::PartSectionSubsectionContent(a, b, c, d) => vec![a, b, c, d],
        }
    }

    /// The innermost component.
    pub fn least_significant(&self) -> u32 {
        self.components().last().copied().unwrap_or_default()
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, component) in self.components().iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{component}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Number::Section(3).to_string(), "3");
        assert_eq!(Number::SectionContent(1, 2).to_string(), "1.2");
        assert_eq!(
            Number::PartSectionSubsectionContent(1, 2, 3, 4).to_string(),
            "1.2.3.4"
        );
    }

    #[test]
    fn test_least_significant() {
        assert_eq!(Number::PartSectionContent(2, 5, 7).least_significant(), 7);
        assert_eq!(Number::Part(9).least_significant(), 9);
    }
}
