//! Markdown lexer
//!
//! Segments Markdown source into a flat stream of typed tokens, one
//! construct at a time, for the parser to consume.

use serde::{Deserialize, Deserializer, Serialize, de};
use std::collections::VecDeque;

/// JSON names of every token kind the lexer produces
pub const TOKEN_KINDS: &[&str] = &[
    "header",
    "paragraph",
    "text",
    "bold",
    "italic",
    "code",
    "codeBlock",
    "link",
    "image",
    "blockquote",
    "unorderedList",
    "orderedList",
    "listItem",
    "todoItem",
    "table",
    "inlineMath",
    "blockMath",
    "lineBreak",
];

/// A token in a Markdown document
///
/// Each kind carries its own typed fields. Tokens serialize to JSON as
/// `{"kind": "header", "level": 1, "content": "Title"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Token {
    /// ATX heading (`## Title`)
    Header { level: usize, content: String },
    /// Text run that reached the end of its line (or of the input)
    Paragraph { content: String },
    /// Text run cut short by the start of an inline construct
    Text { content: String },
    /// Strong emphasis (`**bold**` or `__bold__`)
    Bold { content: String },
    /// Emphasis (`*italic*` or `_italic_`)
    Italic { content: String },
    /// Inline code span
    Code { content: String },
    /// Fenced code block
    CodeBlock { language: String, code: String },
    /// Inline link (`[text](url)`)
    Link { text: String, url: String },
    /// Image (`![alt](src)`)
    Image { alt: String, src: String },
    /// Consecutive `>` lines, stripped and newline-joined
    Blockquote { content: String },
    /// Start of a bullet list
    UnorderedList,
    /// Start of a numbered list
    OrderedList,
    /// List item
    ListItem { content: String },
    /// Task list item (`- [ ]` / `- [x]`)
    TodoItem { checked: bool, content: String },
    /// Consecutive `|` lines, each trimmed
    Table { rows: Vec<String> },
    /// Inline math (`$...$`)
    InlineMath { content: String },
    /// Display math (`$$...$$`)
    BlockMath { content: String },
    /// Bare newline
    LineBreak,
    /// Token of a kind this crate has no rules for.
    ///
    /// Never produced by [`Lexer`]; appears in token streams built by hand
    /// or deserialized from another tool.
    #[serde(untagged)]
    Unrecognized {
        #[serde(deserialize_with = "unknown_token_kind")]
        kind: String,
        #[serde(default)]
        value: String,
    },
}

impl Token {
    /// Kind name, as used in the JSON representation
    pub fn kind(&self) -> &str {
        match self {
            Token::Header { .. } => "header",
            Token::Paragraph { .. } => "paragraph",
            Token::Text { .. } => "text",
            Token::Bold { .. } => "bold",
            Token::Italic { .. } => "italic",
            Token::Code { .. } => "code",
            Token::CodeBlock { .. } => "codeBlock",
            Token::Link { .. } => "link",
            Token::Image { .. } => "image",
            Token::Blockquote { .. } => "blockquote",
            Token::UnorderedList => "unorderedList",
            Token::OrderedList => "orderedList",
            Token::ListItem { .. } => "listItem",
            Token::TodoItem { .. } => "todoItem",
            Token::Table { .. } => "table",
            Token::InlineMath { .. } => "inlineMath",
            Token::BlockMath { .. } => "blockMath",
            Token::LineBreak => "lineBreak",
            Token::Unrecognized { kind, .. } => kind,
        }
    }

    /// Whether this is a `ListItem` or `TodoItem`
    pub fn is_list_item(&self) -> bool {
        matches!(self, Token::ListItem { .. } | Token::TodoItem { .. })
    }

    /// Whether this is an `UnorderedList` or `OrderedList` marker
    pub fn is_list_marker(&self) -> bool {
        matches!(self, Token::UnorderedList | Token::OrderedList)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Unordered,
    Ordered,
}

impl ListKind {
    fn marker(self) -> Token {
        match self {
            ListKind::Unordered => Token::UnorderedList,
            ListKind::Ordered => Token::OrderedList,
        }
    }
}

/// Lexer for Markdown source
///
/// The cursor only moves forward. A single construct may produce more than
/// one token (a list marker and its first item), so tokens are buffered
/// until the iterator hands them out.
pub struct Lexer<'a> {
    input: &'a str,
    /// Current byte position
    pos: usize,
    pending: VecDeque<Token>,
    /// Kind of the list whose items were emitted last, if the previous
    /// token was a list item
    open_list: Option<ListKind>,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given input
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            pending: VecDeque::new(),
            open_list: None,
        }
    }

    /// Tokenize the entire input
    pub fn tokenize(input: &str) -> Vec<Token> {
        Lexer::new(input).collect()
    }

    /// Current byte offset into the input
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Whether the whole input has been consumed
    pub fn is_at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Scan one construct starting at the cursor
    fn scan(&mut self) {
        let Some(ch) = self.peek() else {
            return;
        };
        let line_start = self.at_line_start();
        let rest = self.rest();

        match ch {
            '#' if line_start => self.lex_header(),
            '*' if line_start && rest.starts_with("* ") => {
                self.lex_list_item(ListKind::Unordered, 1)
            }
            '*' | '_' => self.lex_emphasis(ch),
            '`' => self.lex_code(),
            '[' => self.lex_link(),
            '!' if rest.starts_with("![") => self.lex_image(),
            '>' if line_start => self.lex_blockquote(),
            '-' | '+' if line_start && rest[1..].starts_with(' ') => {
                self.lex_list_item(ListKind::Unordered, 1)
            }
            '|' if line_start => self.lex_table(),
            '$' => self.lex_math(),
            '\n' => {
                self.pos += 1;
                self.emit(Token::LineBreak);
            }
            '\r' if rest.starts_with("\r\n") => {
                self.pos += 2;
                self.emit(Token::LineBreak);
            }
            _ => match ordered_marker_len(rest) {
                Some(len) if line_start => self.lex_list_item(ListKind::Ordered, len),
                _ => self.lex_text(),
            },
        }
    }

    fn lex_header(&mut self) {
        let level = self.rest().bytes().take_while(|&b| b == b'#').count();
        self.pos += level;
        let content = self.read_until("\n").trim().to_string();
        self.emit(Token::Header { level, content });
    }

    fn lex_emphasis(&mut self, marker: char) {
        let doubled = if marker == '*' { "**" } else { "__" };
        if self.rest().starts_with(doubled) {
            self.pos += 2;
            let content = self.read_until(doubled).to_string();
            self.emit(Token::Bold { content });
        } else {
            self.pos += 1;
            let content = self.read_until(&doubled[..1]).to_string();
            self.emit(Token::Italic { content });
        }
    }

    fn lex_code(&mut self) {
        if self.rest().starts_with("```") {
            self.pos += 3;
            let language = self.read_until("\n").trim().to_string();
            let code = strip_line_ending(self.read_until("```")).to_string();
            self.skip_line_ending();
            self.emit(Token::CodeBlock { language, code });
        } else {
            self.pos += 1;
            let content = self.read_until("`").to_string();
            self.emit(Token::Code { content });
        }
    }

    fn lex_link(&mut self) {
        self.pos += 1;
        let text = self.read_until("]");
        match self.read_target() {
            Some(url) => self.emit(Token::Link {
                text: text.to_string(),
                url: url.to_string(),
            }),
            None => {
                let content = format!("[{}{}", text, self.closing_bracket());
                self.emit(Token::Text { content });
            }
        }
    }

    fn lex_image(&mut self) {
        self.pos += 2;
        let alt = self.read_until("]");
        match self.read_target() {
            Some(src) => self.emit(Token::Image {
                alt: alt.to_string(),
                src: src.to_string(),
            }),
            None => {
                let content = format!("![{}{}", alt, self.closing_bracket());
                self.emit(Token::Text { content });
            }
        }
    }

    /// Read the `(target)` part of a link or image, right after its `]`
    fn read_target(&mut self) -> Option<&'a str> {
        if !self.input[..self.pos].ends_with(']') || !self.rest().starts_with('(') {
            return None;
        }
        self.pos += 1;
        Some(self.read_until(")"))
    }

    fn closing_bracket(&self) -> &'static str {
        if self.input[..self.pos].ends_with(']') {
            "]"
        } else {
            ""
        }
    }

    fn lex_blockquote(&mut self) {
        let mut lines = Vec::new();
        while self.rest().starts_with('>') {
            self.pos += 1;
            lines.push(self.read_until("\n").trim());
        }
        self.emit(Token::Blockquote {
            content: lines.join("\n"),
        });
    }

    /// Lex one list item; `marker_len` excludes the space after the marker
    fn lex_list_item(&mut self, kind: ListKind, marker_len: usize) {
        self.pos += marker_len + 1;
        if self.open_list != Some(kind) {
            self.emit(kind.marker());
        }

        let rest = self.rest();
        let checked = if rest.starts_with("[ ]") {
            Some(false)
        } else if rest.starts_with("[x]") || rest.starts_with("[X]") {
            Some(true)
        } else {
            None
        };
        if checked.is_some() {
            self.pos += 3;
        }

        let content = self.read_until("\n").trim().to_string();
        match checked {
            Some(checked) => self.emit(Token::TodoItem { checked, content }),
            None => self.emit(Token::ListItem { content }),
        }
        self.open_list = Some(kind);
    }

    fn lex_table(&mut self) {
        let mut rows = Vec::new();
        while self.rest().starts_with('|') {
            rows.push(self.read_until("\n").trim().to_string());
        }
        self.emit(Token::Table { rows });
    }

    fn lex_math(&mut self) {
        if self.rest().starts_with("$$") {
            self.pos += 2;
            let content = self.read_until("$$").trim().to_string();
            self.skip_line_ending();
            self.emit(Token::BlockMath { content });
        } else {
            self.pos += 1;
            let content = self.read_until("$").to_string();
            self.emit(Token::InlineMath { content });
        }
    }

    /// Consume a run of plain text up to the end of the line or the start
    /// of the next inline construct
    fn lex_text(&mut self) {
        let rest = self.rest();
        let mut end = rest.len();
        let mut at_newline = false;
        let mut prev = None;

        for (i, ch) in rest.char_indices() {
            if ch == '\n' {
                end = i;
                at_newline = true;
                break;
            }
            // The first character always belongs to the run
            if i > 0 && starts_inline(&rest[i..], prev) {
                end = i;
                break;
            }
            prev = Some(ch);
        }

        let content = &rest[..end];
        if at_newline {
            self.pos += end + 1;
        } else {
            self.pos += end;
        }

        if at_newline || self.is_at_end() {
            self.emit(Token::Paragraph {
                content: strip_line_ending(content).to_string(),
            });
        } else {
            self.emit(Token::Text {
                content: content.to_string(),
            });
        }
    }

    /// Read until `delimiter`, returning the text before it and moving the
    /// cursor past it. Without a match, everything up to the end of input is
    /// returned and the cursor moves to the end.
    fn read_until(&mut self, delimiter: &str) -> &'a str {
        let input = self.input;
        let rest = &input[self.pos..];
        match rest.find(delimiter) {
            Some(i) => {
                self.pos += i + delimiter.len();
                &rest[..i]
            }
            None => {
                self.pos = input.len();
                rest
            }
        }
    }

    /// Block constructs own the newline after their closing fence
    fn skip_line_ending(&mut self) {
        let rest = self.rest();
        if rest.starts_with('\n') {
            self.pos += 1;
        } else if rest.starts_with("\r\n") {
            self.pos += 2;
        }
    }

    fn emit(&mut self, token: Token) {
        if !token.is_list_item() && !token.is_list_marker() {
            self.open_list = None;
        }
        self.pending.push_back(token);
    }

    fn rest(&self) -> &'a str {
        let input = self.input;
        &input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn at_line_start(&self) -> bool {
        self.pos == 0 || self.input[..self.pos].ends_with('\n')
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        while self.pending.is_empty() && !self.is_at_end() {
            self.scan();
        }
        self.pending.pop_front()
    }
}

/// A known kind with malformed fields must not pass as an unknown one
fn unknown_token_kind<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let kind = String::deserialize(deserializer)?;
    if TOKEN_KINDS.contains(&kind.as_str()) {
        return Err(de::Error::custom(format!("malformed `{kind}` token")));
    }
    Ok(kind)
}

/// Convenience function to tokenize Markdown source
pub fn lex(input: &str) -> Vec<Token> {
    Lexer::tokenize(input)
}

/// Whether an inline construct starts at the beginning of `rest`
fn starts_inline(rest: &str, prev: Option<char>) -> bool {
    match rest.chars().next() {
        Some('`' | '*' | '$' | '[') => true,
        Some('!') => rest[1..].starts_with('['),
        // Intraword underscores (snake_case) stay text
        Some('_') => prev.is_some_and(char::is_whitespace),
        _ => false,
    }
}

/// Length of an ordered list marker (`12.`) followed by a space
fn ordered_marker_len(rest: &str) -> Option<usize> {
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if (1..=9).contains(&digits) && rest[digits..].starts_with(". ") {
        Some(digits + 1)
    } else {
        None
    }
}

fn strip_line_ending(s: &str) -> &str {
    let s = s.strip_suffix('\n').unwrap_or(s);
    s.strip_suffix('\r').unwrap_or(s)
}
