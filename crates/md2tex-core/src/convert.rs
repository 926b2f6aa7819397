//! Markdown to LaTeX conversion pipeline
//!
//! Chains the lexer, the parser and the writer. Each stage can also be
//! entered from its JSON form, so token streams and documents produced by
//! other tools go through the same rules.

use crate::writer::{WriteError, WriterOptions, document_to_latex};
use md_parser::{Document, ParseError, Parser, Token};
use thiserror::Error;

/// Conversion errors
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("Write error: {0}")]
    Write(#[from] WriteError),
    #[error("Invalid JSON input: {0}")]
    Json(#[from] serde_json::Error),
}

/// Conversion result type
pub type ConvertResult<T> = Result<T, ConvertError>;

/// Convert Markdown source to a LaTeX fragment
pub fn markdown_to_latex(source: &str) -> ConvertResult<String> {
    markdown_to_latex_with_options(source, &WriterOptions::default())
}

/// Convert Markdown source to LaTeX with writer options
pub fn markdown_to_latex_with_options(
    source: &str,
    options: &WriterOptions,
) -> ConvertResult<String> {
    let doc = Parser::from_source(source).parse()?;
    Ok(document_to_latex(&doc, options)?)
}

/// Convert an existing token stream to LaTeX
pub fn tokens_to_latex(tokens: Vec<Token>, options: &WriterOptions) -> ConvertResult<String> {
    let doc = Parser::new(tokens).parse()?;
    Ok(document_to_latex(&doc, options)?)
}

/// Read a token stream from its JSON form
///
/// Tokens of unknown kinds are accepted here and rejected by the parser.
pub fn tokens_from_json(json: &str) -> ConvertResult<Vec<Token>> {
    Ok(serde_json::from_str(json)?)
}

/// Read a document from its JSON form
pub fn document_from_json(json: &str) -> ConvertResult<Document> {
    Ok(serde_json::from_str(json)?)
}
