//! Parsing, canonicalization and signature verification (C3).

pub mod canon;
pub mod signature;
pub mod tree;

pub use tree::{parse_document, Attribute, Element, Node, QualifiedName};
