//! Weft Content — frontmatter, markup parsing, and metadata extraction.
//!
//! This crate covers the synchronous stages of the pipeline:
//!
//! - [`frontmatter`]: metadata block splitting
//! - [`ast`]: arena-backed abstract syntax tree
//! - [`parser`]: markup text → AST
//! - [`transform`]: AST → generic element tree
//! - [`extract`]: static metadata extraction from structured source text
//!
//! # Example
//!
//! ```
//! use weft_content::{frontmatter::split_frontmatter, parser::parse, transform::to_element_tree};
//!
//! let doc = split_frontmatter("---\ntitle: \"Hi\"\n---\n# Heading\n\nBody text.");
//! let ast = parse(&doc.body);
//! let tree = to_element_tree(&ast);
//! assert_eq!(tree.tag, "document");
//! ```

#![doc = include_str!("../README.md")]

pub mod ast;
pub mod extract;
pub mod frontmatter;
pub mod parser;
pub mod transform;

// Re-export key types at crate root for convenience
pub use ast::{Ast, AstNode, NodeId, NodeKind};
pub use extract::{extract_static_meta, MetaDate, StaticMeta};
pub use frontmatter::{split_frontmatter, Document};
pub use parser::parse;
pub use transform::{to_element_tree, Element};
