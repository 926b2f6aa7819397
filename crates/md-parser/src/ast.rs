//! Markdown AST types
//!
//! The tree is deliberately flat: a document is a sequence of nodes, and
//! only list nodes own children (their items). There are no nested lists
//! and no nested block quotes.

use serde::{Deserialize, Deserializer, Serialize, de};

/// JSON names of every node kind the writer has a rule for
pub const NODE_KINDS: &[&str] = &[
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
    "taskList",
    "listItem",
    "todoItem",
    "table",
    "inlineMath",
    "blockMath",
    "lineBreak",
];

/// A parsed Markdown document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    /// Top-level nodes in document order
    pub children: Vec<Node>,
}

impl Document {
    pub fn new(children: Vec<Node>) -> Self {
        Self { children }
    }
}

/// A node in the Markdown AST
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Node {
    /// Section heading
    Header { level: usize, content: String },

    /// Text that ends its line
    Paragraph { content: String },

    /// Text followed by an inline construct on the same line
    Text { content: String },

    /// Strong emphasis
    Bold { content: String },

    /// Emphasis
    Italic { content: String },

    /// Inline code span
    Code { content: String },

    /// Fenced code block (body is verbatim)
    CodeBlock { language: String, code: String },

    /// Hyperlink
    Link(Link),

    /// Image
    Image(Image),

    /// Block quote
    Blockquote { content: String },

    /// Bullet list
    UnorderedList(List),

    /// Numbered list
    OrderedList(List),

    /// List containing at least one task item
    TaskList(List),

    /// List item
    ListItem { content: String },

    /// Task list item
    TodoItem { checked: bool, content: String },

    /// Table rows as written in the source, one string per line
    Table { rows: Vec<String> },

    /// Inline math (verbatim)
    InlineMath { content: String },

    /// Display math (verbatim)
    BlockMath { content: String },

    /// Forced line break
    LineBreak,

    /// Node of a kind the writer has no rule for.
    ///
    /// The parser never builds one; it only appears in documents
    /// deserialized from another tool.
    #[serde(untagged)]
    Unrecognized {
        #[serde(rename = "type", deserialize_with = "unknown_node_kind")]
        kind: String,
    },
}

/// Link target and text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub text: String,
    pub url: String,
}

/// Image source and alternate text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub alt: String,
    pub src: String,
}

/// Items of a list node
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct List {
    /// `ListItem` and `TodoItem` nodes
    pub children: Vec<Node>,
}

impl Node {
    pub fn header(level: usize, content: impl Into<String>) -> Self {
        Node::Header {
            level,
            content: content.into(),
        }
    }

    pub fn paragraph(content: impl Into<String>) -> Self {
        Node::Paragraph {
            content: content.into(),
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        Node::Text {
            content: content.into(),
        }
    }

    pub fn bold(content: impl Into<String>) -> Self {
        Node::Bold {
            content: content.into(),
        }
    }

    pub fn italic(content: impl Into<String>) -> Self {
        Node::Italic {
            content: content.into(),
        }
    }

    pub fn code(content: impl Into<String>) -> Self {
        Node::Code {
            content: content.into(),
        }
    }

    pub fn code_block(language: impl Into<String>, code: impl Into<String>) -> Self {
        Node::CodeBlock {
            language: language.into(),
            code: code.into(),
        }
    }

    pub fn link(text: impl Into<String>, url: impl Into<String>) -> Self {
        Node::Link(Link {
            text: text.into(),
            url: url.into(),
        })
    }

    pub fn image(alt: impl Into<String>, src: impl Into<String>) -> Self {
        Node::Image(Image {
            alt: alt.into(),
            src: src.into(),
        })
    }

    pub fn blockquote(content: impl Into<String>) -> Self {
        Node::Blockquote {
            content: content.into(),
        }
    }

    pub fn unordered_list(children: Vec<Node>) -> Self {
        Node::UnorderedList(List { children })
    }

    pub fn ordered_list(children: Vec<Node>) -> Self {
        Node::OrderedList(List { children })
    }

    pub fn task_list(children: Vec<Node>) -> Self {
        Node::TaskList(List { children })
    }

    pub fn list_item(content: impl Into<String>) -> Self {
        Node::ListItem {
            content: content.into(),
        }
    }

    pub fn todo_item(checked: bool, content: impl Into<String>) -> Self {
        Node::TodoItem {
            checked,
            content: content.into(),
        }
    }

    pub fn table(rows: Vec<String>) -> Self {
        Node::Table { rows }
    }

    pub fn inline_math(content: impl Into<String>) -> Self {
        Node::InlineMath {
            content: content.into(),
        }
    }

    pub fn block_math(content: impl Into<String>) -> Self {
        Node::BlockMath {
            content: content.into(),
        }
    }

    /// Kind name, as used in the JSON representation
    pub fn kind(&self) -> &str {
        match self {
            Node::Header { .. } => "header",
            Node::Paragraph { .. } => "paragraph",
            Node::Text { .. } => "text",
            Node::Bold { .. } => "bold",
            Node::Italic { .. } => "italic",
            Node::Code { .. } => "code",
            Node::CodeBlock { .. } => "codeBlock",
            Node::Link(_) => "link",
            Node::Image(_) => "image",
            Node::Blockquote { .. } => "blockquote",
            Node::UnorderedList(_) => "unorderedList",
            Node::OrderedList(_) => "orderedList",
            Node::TaskList(_) => "taskList",
            Node::ListItem { .. } => "listItem",
            Node::TodoItem { .. } => "todoItem",
            Node::Table { .. } => "table",
            Node::InlineMath { .. } => "inlineMath",
            Node::BlockMath { .. } => "blockMath",
            Node::LineBreak => "lineBreak",
            Node::Unrecognized { kind } => kind,
        }
    }
}

fn unknown_node_kind<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let kind = String::deserialize(deserializer)?;
    if NODE_KINDS.contains(&kind.as_str()) {
        return Err(de::Error::custom(format!("malformed `{kind}` node")));
    }
    Ok(kind)
}
