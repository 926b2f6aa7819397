//! md-parser: Lexer and parser for the Markdown subset understood by md2tex
//!
//! This crate provides:
//! - Markdown lexer (one token per construct, typed payloads)
//! - Single-pass parser grouping list items into list nodes
//! - Markdown AST types
//!
//! # Example
//!
//! ```
//! use md_parser::{parse_source, Node};
//!
//! let doc = parse_source("# Title\n- one\n- two\n").unwrap();
//! assert_eq!(doc.children.len(), 2);
//! assert!(matches!(doc.children[0], Node::Header { level: 1, .. }));
//! ```

pub mod ast;
pub mod lexer;
pub mod parser;

// Re-export main types for convenient access
pub use ast::{Document, Image, Link, List, Node};
pub use lexer::{Lexer, Token, lex};
pub use parser::{ParseError, ParseResult, Parser, parse, parse_source};
