//! Labeled source positions for diagnostic messages.

use kstructural_core::span::Position;

/// A message attached to a position in some source file.
///
/// A diagnostic normally has one primary label marking where the problem is,
/// and may have secondary labels for related locations such as
/// "first declared here". Labels of one diagnostic may point into different
/// files, since imports let a document span several.
#[derive(Debug, Clone)]
pub struct Label {
    position: Position,
    message: String,
    is_primary: bool,
}

impl Label {
    pub fn primary(position: Position, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
            is_primary: true,
        }
    }

    pub fn secondary(position: Position, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
            is_primary: false,
        }
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_primary(&self) -> bool {
        self.is_primary
    }

    pub fn is_secondary(&self) -> bool {
        !self.is_primary
    }
}

#[cfg(test)]
mod tests {
    use kstructural_core::span::Span;

    use super::*;

    #[test]
    fn test_primary_label() {
        let position = Position::new(None, 2, 5, Span::new(10..20));
        let label = Label::primary(position, "error here");

        assert_eq!(label.position().span(), Span::new(10..20));
        assert_eq!(label.position().line(), 2);
        assert_eq!(label.message(), "error here");
        assert!(label.is_primary());
        assert!(!label.is_secondary());
    }

    #[test]
    fn test_secondary_label() {
        let label = Label::secondary(Position::unknown(), "first declared here");

        assert_eq!(label.message(), "first declared here");
        assert!(label.is_secondary());
    }
}
