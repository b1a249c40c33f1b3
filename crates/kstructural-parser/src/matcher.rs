//! A small combinator language for checking the shape of expressions.
//!
//! Both s-expression parsers describe the forms they accept with
//! [`Matcher`]s. A matcher both tests an [`Expression`] and renders itself,
//! so "Expected one of:" messages list exactly the forms that were tried.

use std::fmt;

use crate::{
    error::{Diagnostic, ErrorCode},
    expression::Expression,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    ExactSymbol(&'static str),
    AnySymbol,
    /// A bare symbol or a quoted string.
    AnyString,
    OneOf(Vec<Matcher>),
    /// A list whose elements match these matchers exactly.
    AllOfList(Vec<Matcher>),
    /// A list whose first elements match these matchers.
    PrefixOfList(Vec<Matcher>),
}

pub fn exact_symbol(symbol: &'static str) -> Matcher {
    Matcher::ExactSymbol(symbol)
}

pub fn any_symbol() -> Matcher {
    Matcher::AnySymbol
}

pub fn any_string() -> Matcher {
    Matcher::AnyString
}

pub fn one_of(matchers: impl Into<Vec<Matcher>>) -> Matcher {
    Matcher::OneOf(matchers.into())
}

pub fn all_of_list(matchers: impl Into<Vec<Matcher>>) -> Matcher {
    Matcher::AllOfList(matchers.into())
}

pub fn prefix_of_list(matchers: impl Into<Vec<Matcher>>) -> Matcher {
    Matcher::PrefixOfList(matchers.into())
}

impl Matcher {
    pub fn matches(&self, expression: &Expression) -> bool {
        match self {
            Matcher::ExactSymbol(symbol) => expression.as_symbol() == Some(*symbol),
            Matcher::AnySymbol => expression.as_symbol().is_some(),
            Matcher::AnyString => expression.text().is_some(),
            Matcher::OneOf(matchers) => matchers.iter().any(|m| m.matches(expression)),
            Matcher::AllOfList(matchers) => expression.as_list().is_some_and(|elements| {
                elements.len() == matchers.len()
                    && matchers.iter().zip(elements).all(|(m, e)| m.matches(e))
            }),
            Matcher::PrefixOfList(matchers) => expression.as_list().is_some_and(|elements| {
                elements.len() >= matchers.len()
                    && matchers.iter().zip(elements).all(|(m, e)| m.matches(e))
            }),
        }
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn elements(f: &mut fmt::Formatter<'_>, matchers: &[Matcher]) -> fmt::Result {
            for (i, m) in matchers.iter().enumerate() {
                if i > 0 {
                    f.write_str(" ")?;
                }
                write!(f, "{m}")?;
            }
            Ok(())
        }

        match self {
            Matcher::ExactSymbol(symbol) => f.write_str(symbol),
            Matcher::AnySymbol => f.write_str("<symbol>"),
            Matcher::AnyString => f.write_str("<string>"),
            Matcher::OneOf(matchers) => {
                for (i, m) in matchers.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{m}")?;
                }
                Ok(())
            }
            Matcher::AllOfList(matchers) => {
                f.write_str("(")?;
                elements(f, matchers)?;
                f.write_str(")")
            }
            Matcher::PrefixOfList(matchers) => {
                f.write_str("(")?;
                elements(f, matchers)?;
                f.write_str(" ...)")
            }
        }
    }
}

/// The diagnostic for an expression that fit none of the expected forms.
pub fn form_error(expected: &[Matcher], received: &Expression) -> Diagnostic {
    let mut help = String::from("Expected one of:");
    for matcher in expected {
        help.push_str("\n  ");
        help.push_str(&matcher.to_string());
    }
    help.push_str("\nReceived:\n  ");
    help.push_str(&received.to_string());

    Diagnostic::error("Input did not match expected form.")
        .with_code(ErrorCode::E100)
        .with_label(received.position().clone(), "unexpected form")
        .with_help(help)
}
