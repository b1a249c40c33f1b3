//! Core types for kstructural documents.
//!
//! This crate holds the document model shared by the parsers, the evaluator
//! and the exporters:
//!
//! - [`block`] and [`inline`]: the element tree, generic over an annotation
//! - [`annotation`]: per-node metadata and parse-time provenance
//! - [`evaluation`]: evaluation-time annotation and the evaluation context
//! - [`identifier`]: interned identifiers and type names
//! - [`number`]: hierarchical block numbers
//! - [`span`]: source positions

pub mod annotation;
pub mod block;
pub mod evaluation;
pub mod identifier;
pub mod inline;
pub mod number;
pub mod span;
