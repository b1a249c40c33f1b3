//! # kstructural Parser
//!
//! Parsers, import resolution and evaluation for kstructural documents.
//!
//! Documents may be written in three syntaxes, selected by file suffix:
//!
//! - canonical s-expressions (`.sd`, and any unknown suffix)
//! - the imperative command stream (`.sdi`)
//! - XML (`.xml`)
//!
//! All three produce the same [`Document`](kstructural_core::block::Document)
//! tree. Imports may cross syntaxes.
//!
//! ## Usage
//!
//! ```
//! # use kstructural_parser::{ParseSession, Syntax, evaluate, parse_document_str};
//!
//! let mut session = ParseSession::new(".").unwrap();
//! let document = parse_document_str(
//!     &mut session,
//!     r#"(document [title "T"] (section [title "S"] (paragraph "Hello")))"#,
//!     None,
//!     Syntax::Canonical,
//! )
//! .unwrap();
//!
//! let evaluated = evaluate(&document).unwrap();
//! assert_eq!(evaluated.context.numbered_blocks().count(), 2);
//! ```

mod attributes;
mod canonical;
mod driver;
pub mod error;
mod evaluate;
pub mod expression;
mod imperative;
mod lexer;
mod matcher;
mod nesting;
mod resolver;
mod xml;

pub use driver::{Syntax, parse_block_file, parse_block_str, parse_document, parse_document_str};
pub use error::{Diagnostic, DriverError, ErrorCode, ParseError};
pub use evaluate::{Evaluated, evaluate};
pub use expression::{Expression, escape, read_all};
pub use resolver::ParseSession;
pub use xml::{NAMESPACE, XML_NAMESPACE};
