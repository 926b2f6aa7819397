//! md2tex-core: Core library for converting Markdown to LaTeX
//!
//! This crate provides:
//! - The Markdown to LaTeX pipeline (lex, parse, generate)
//! - The LaTeX writer and its options
//! - JSON entry points for token streams and documents produced elsewhere

pub mod convert;
pub mod writer;

pub use convert::{
    ConvertError, ConvertResult, document_from_json, markdown_to_latex,
    markdown_to_latex_with_options, tokens_from_json, tokens_to_latex,
};
pub use md_parser::{Document, Node, ParseError, Token, lex, parse, parse_source};
pub use writer::{
    FigureOptions, Preamble, WriteError, WriteResult, WriterOptions, document_to_latex,
    escape_latex, generate,
};
