//! Interned identifiers and type names.
//!
//! Block identifiers ([`Id`]) and type tags ([`TypeName`]) are compared and
//! hashed constantly during evaluation, so both are interned in a process-wide
//! string interner and stored as small copyable symbols.

use std::{
    fmt,
    sync::{Mutex, MutexGuard, OnceLock, PoisonError},
};

use string_interner::{DefaultStringInterner, DefaultSymbol};
use thiserror::Error;

static INTERNER: OnceLock<Mutex<DefaultStringInterner>> = OnceLock::new();

fn interner() -> MutexGuard<'static, DefaultStringInterner> {
    INTERNER
        .get_or_init(|| Mutex::new(DefaultStringInterner::new()))
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

fn intern(text: &str) -> DefaultSymbol {
    interner().get_or_intern(text)
}

fn with_resolved<R>(symbol: DefaultSymbol, f: impl FnOnce(&str) -> R) -> R {
    let interner = interner();
    f(interner.resolve(symbol).unwrap_or_default())
}

/// An identifier was rejected by [`Id::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Not a valid identifier: {text:?}")]
pub struct InvalidIdentifier {
    text: String,
}

impl InvalidIdentifier {
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// A block identifier, unique across an evaluated document.
///
/// Identifiers consist of one or more letters, digits, `_`, `-` or `.`.
///
/// ```
/// use kstructural_core::identifier::Id;
///
/// let id = Id::parse("intro.overview").unwrap();
/// assert_eq!(id, "intro.overview");
/// assert!(Id::parse("has space").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Id(DefaultSymbol);

impl Id {
    /// Validate and intern an identifier.
    pub fn parse(text: &str) -> Result<Self, InvalidIdentifier> {
        if Self::is_valid(text) {
            Ok(Self(intern(text)))
        } else {
            Err(InvalidIdentifier {
                text: text.to_string(),
            })
        }
    }

    /// Returns `true` if `text` is a syntactically valid identifier.
    pub fn is_valid(text: &str) -> bool {
        !text.is_empty()
            && text
                .chars()
                .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        with_resolved(self.0, |text| f.write_str(text))
    }
}

impl PartialEq<str> for Id {
    fn eq(&self, other: &str) -> bool {
        with_resolved(self.0, |text| text == other)
    }
}

impl PartialEq<&str> for Id {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

/// A type tag attached to a block or inline element.
///
/// Type names are stored as written by the parsers and checked by the
/// evaluator, which reports malformed tags as evaluation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeName(DefaultSymbol);

impl TypeName {
    /// Intern a type name without validating it.
    pub fn new(text: &str) -> Self {
        Self(intern(text))
    }

    /// Returns `true` if the name is one or more letters, digits or `_`.
    pub fn is_valid(&self) -> bool {
        with_resolved(self.0, |text| {
            !text.is_empty() && text.chars().all(|c| c.is_alphanumeric() || c == '_')
        })
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        with_resolved(self.0, |text| f.write_str(text))
    }
}

impl PartialEq<&str> for TypeName {
    fn eq(&self, other: &&str) -> bool {
        with_resolved(self.0, |text| text == *other)
    }
}
