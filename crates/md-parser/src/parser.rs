//! Markdown parser
//!
//! Single-pass parser with one token of lookahead that turns the lexer's
//! flat token stream into document nodes, grouping list items under their
//! list.

use crate::ast::{Document, Node};
use crate::lexer::{Lexer, Token};
use thiserror::Error;

/// Parser errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Unknown token kind `{kind}` at token {index}")]
    UnknownTokenKind { kind: String, index: usize },
}

/// Parse result type
pub type ParseResult<T> = Result<T, ParseError>;

/// Markdown token parser
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    /// Create a parser over an existing token stream
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    /// Create a parser from Markdown source text
    pub fn from_source(source: &str) -> Self {
        Self::new(Lexer::tokenize(source))
    }

    /// Index of the next token to be consumed
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Parse the entire token stream
    ///
    /// Fails on the first token without a rule; nothing parsed before it is
    /// returned.
    pub fn parse(&mut self) -> ParseResult<Document> {
        let mut children = Vec::new();
        while let Some(token) = self.advance() {
            children.push(self.parse_token(token)?);
        }
        Ok(Document::new(children))
    }

    /// Build the node for a token that has just been consumed
    fn parse_token(&mut self, token: Token) -> ParseResult<Node> {
        let node = match token {
            Token::Header { level, content } => Node::Header { level, content },
            Token::Paragraph { content } => Node::Paragraph { content },
            Token::Text { content } => Node::Text { content },
            Token::Bold { content } => Node::Bold { content },
            Token::Italic { content } => Node::Italic { content },
            Token::Code { content } => Node::Code { content },
            Token::CodeBlock { language, code } => Node::CodeBlock { language, code },
            Token::Link { text, url } => Node::link(text, url),
            Token::Image { alt, src } => Node::image(alt, src),
            Token::Blockquote { content } => Node::Blockquote { content },
            Token::Table { rows } => Node::Table { rows },
            Token::InlineMath { content } => Node::InlineMath { content },
            Token::BlockMath { content } => Node::BlockMath { content },
            Token::LineBreak => Node::LineBreak,
            Token::UnorderedList => self.parse_list(false, Vec::new()),
            Token::OrderedList => self.parse_list(true, Vec::new()),
            Token::ListItem { content } => self.parse_leading_item(Node::list_item(content)),
            Token::TodoItem { checked, content } => {
                self.parse_leading_item(Node::todo_item(checked, content))
            }
            Token::Unrecognized { kind, .. } => {
                return Err(ParseError::UnknownTokenKind {
                    kind,
                    index: self.pos - 1,
                });
            }
        };
        Ok(node)
    }

    /// Collect the items that follow a list marker
    fn parse_list(&mut self, ordered: bool, mut children: Vec<Node>) -> Node {
        loop {
            let item = match self.peek() {
                Some(Token::ListItem { content }) => Node::list_item(content.clone()),
                Some(Token::TodoItem { checked, content }) => {
                    Node::todo_item(*checked, content.clone())
                }
                _ => break,
            };
            self.pos += 1;
            children.push(item);
        }

        if children.iter().any(|c| matches!(c, Node::TodoItem { .. })) {
            Node::task_list(children)
        } else if ordered {
            Node::ordered_list(children)
        } else {
            Node::unordered_list(children)
        }
    }

    /// An item seen before any list marker
    ///
    /// If a marker follows, the item opens that list. Otherwise it starts a
    /// bullet list of its own, together with any items right after it.
    fn parse_leading_item(&mut self, first: Node) -> Node {
        let ordered = match self.peek() {
            Some(Token::OrderedList) => {
                self.pos += 1;
                true
            }
            Some(Token::UnorderedList) => {
                self.pos += 1;
                false
            }
            _ => false,
        };
        self.parse_list(ordered, vec![first])
    }

    // Helper methods

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned()?;
        self.pos += 1;
        Some(token)
    }
}

/// Parse a token stream into a document
pub fn parse(tokens: Vec<Token>) -> ParseResult<Document> {
    Parser::new(tokens).parse()
}

/// Convenience function to lex and parse Markdown source
pub fn parse_source(source: &str) -> ParseResult<Document> {
    Parser::from_source(source).parse()
}
