//! Markdown AST to LaTeX writer
//!
//! Renders each top-level node on its own, joining the pieces with single
//! newlines. Optionally wraps the result in a complete LaTeX document.

use md_parser::{Document, Image, Link, Node};
use thiserror::Error;

/// Packages the generated markup relies on
pub const DEFAULT_PACKAGES: &[&str] = &["hyperref", "graphicx", "listings", "amssymb"];

/// Sectioning commands for heading levels 1 to 5
const SECTIONING: [&str; 5] = [
    "section",
    "subsection",
    "subsubsection",
    "paragraph",
    "subparagraph",
];

/// Writer errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WriteError {
    #[error("No LaTeX rule for node kind `{kind}`")]
    UnknownNodeKind { kind: String },
}

/// Write result type
pub type WriteResult<T> = Result<T, WriteError>;

/// Options for the LaTeX writer
#[derive(Debug, Clone, Default)]
pub struct WriterOptions {
    /// Wrap the output in `\documentclass ... \end{document}`
    pub standalone: Option<Preamble>,
    /// Figure environment settings for images
    pub figure: FigureOptions,
    /// Fail on nodes without a LaTeX rule instead of rendering them empty
    pub strict: bool,
}

/// Document preamble for standalone output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preamble {
    pub document_class: String,
    /// Loaded with `\usepackage`, in order
    pub packages: Vec<String>,
}

impl Default for Preamble {
    fn default() -> Self {
        Self {
            document_class: "article".to_string(),
            packages: DEFAULT_PACKAGES.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// Figure environment settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FigureOptions {
    /// Value of the `width` key of `\includegraphics`
    pub width: String,
    /// Float placement specifier (`h`, `t`, `htbp`, ...)
    pub placement: String,
}

impl Default for FigureOptions {
    fn default() -> Self {
        Self {
            width: "0.8\\textwidth".to_string(),
            placement: "h".to_string(),
        }
    }
}

/// Render a document as a LaTeX fragment with default options
///
/// Nodes without a LaTeX rule render as empty strings.
pub fn generate(doc: &Document) -> String {
    let options = WriterOptions::default();
    let mut writer = Writer::new(&options);
    writer.write_nodes(&doc.children);
    writer.output
}

/// Render a document as LaTeX
pub fn document_to_latex(doc: &Document, options: &WriterOptions) -> WriteResult<String> {
    let mut writer = Writer::new(options);
    writer.write_document(doc)?;
    Ok(writer.output)
}

/// Escape LaTeX special characters in plain text
///
/// Each of `& % $ # _ { } ~ ^` gets a backslash in front of it. Backslashes
/// themselves are left alone.
pub fn escape_latex(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '&' | '%' | '$' | '#' | '_' | '{' | '}' | '~' | '^') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// LaTeX writer state
struct Writer<'a> {
    options: &'a WriterOptions,
    output: String,
    /// Kinds of nodes that were rendered empty, in document order
    skipped: Vec<String>,
}

impl<'a> Writer<'a> {
    fn new(options: &'a WriterOptions) -> Self {
        Self {
            options,
            output: String::new(),
            skipped: Vec::new(),
        }
    }

    fn write_document(&mut self, doc: &Document) -> WriteResult<()> {
        if let Some(preamble) = &self.options.standalone {
            self.write_preamble(preamble);
        }

        self.write_nodes(&doc.children);

        if self.options.strict
            && let Some(kind) = self.skipped.first()
        {
            return Err(WriteError::UnknownNodeKind { kind: kind.clone() });
        }

        if self.options.standalone.is_some() {
            self.output.push_str("\n\\end{document}\n");
        }
        Ok(())
    }

    fn write_preamble(&mut self, preamble: &Preamble) {
        self.output
            .push_str(&format!("\\documentclass{{{}}}\n", preamble.document_class));
        for package in &preamble.packages {
            self.output
                .push_str(&format!("\\usepackage{{{}}}\n", package));
        }
        self.output.push_str("\n\\begin{document}\n");
    }

    fn write_nodes(&mut self, nodes: &[Node]) {
        for (i, node) in nodes.iter().enumerate() {
            if i > 0 {
                self.output.push('\n');
            }
            self.write_node(node);
        }
    }

    fn write_node(&mut self, node: &Node) {
        match node {
            Node::Header { level, content } => self.write_header(*level, content),
            Node::Paragraph { content } => {
                self.output.push_str(&escape_latex(content));
                self.output.push_str("\n\n");
            }
            Node::Text { content } => self.output.push_str(&escape_latex(content)),
            Node::Bold { content } => self.write_command("textbf", content),
            Node::Italic { content } => self.write_command("textit", content),
            Node::Code { content } => self.write_command("texttt", content),
            Node::CodeBlock { language, code } => self.write_code_block(language, code),
            Node::Link(link) => self.write_link(link),
            Node::Image(image) => self.write_image(image),
            Node::Blockquote { content } => {
                self.output.push_str("\\begin{quote}\n");
                self.output.push_str(&escape_latex(content));
                self.output.push_str("\n\\end{quote}");
            }
            Node::UnorderedList(list) | Node::TaskList(list) => {
                self.write_list("itemize", &list.children)
            }
            Node::OrderedList(list) => self.write_list("enumerate", &list.children),
            // A bare item renders as a list of one
            Node::ListItem { .. } | Node::TodoItem { .. } => {
                self.write_list("itemize", std::slice::from_ref(node))
            }
            Node::Table { rows } => self.write_table(rows),
            Node::InlineMath { content } => {
                self.output.push('$');
                self.output.push_str(content);
                self.output.push('$');
            }
            Node::BlockMath { content } => {
                self.output.push_str("\\[\n");
                self.output.push_str(content);
                self.output.push_str("\n\\]");
            }
            Node::LineBreak => self.output.push_str("\\\\"),
            Node::Unrecognized { kind } => self.skipped.push(kind.clone()),
        }
    }

    fn write_header(&mut self, level: usize, content: &str) {
        let command = level
            .checked_sub(1)
            .and_then(|i| SECTIONING.get(i))
            .copied()
            .unwrap_or("section");
        self.write_command(command, content);
    }

    fn write_command(&mut self, command: &str, content: &str) {
        self.output
            .push_str(&format!("\\{}{{{}}}", command, escape_latex(content)));
    }

    fn write_code_block(&mut self, language: &str, code: &str) {
        self.output.push_str("\\begin{lstlisting}");
        if !language.is_empty() {
            self.output.push_str(&format!("[language={}]", language));
        }
        self.output.push('\n');
        self.output.push_str(code);
        self.output.push_str("\n\\end{lstlisting}");
    }

    fn write_link(&mut self, link: &Link) {
        self.output.push_str(&format!(
            "\\href{{{}}}{{{}}}",
            link.url,
            escape_latex(&link.text)
        ));
    }

    fn write_image(&mut self, image: &Image) {
        let figure = &self.options.figure;
        self.output
            .push_str(&format!("\\begin{{figure}}[{}]\n", figure.placement));
        self.output.push_str("\\centering\n");
        self.output.push_str(&format!(
            "\\includegraphics[width={}]{{{}}}\n",
            figure.width, image.src
        ));
        self.output
            .push_str(&format!("\\caption{{{}}}\n", escape_latex(&image.alt)));
        self.output.push_str("\\end{figure}");
    }

    fn write_list(&mut self, environment: &str, items: &[Node]) {
        self.output
            .push_str(&format!("\\begin{{{}}}\n", environment));
        for item in items {
            match item {
                Node::ListItem { content } => {
                    self.output
                        .push_str(&format!("\\item {}\n", escape_latex(content)));
                }
                Node::TodoItem { checked, content } => {
                    let mark = if *checked { "$\\boxtimes$" } else { "$\\square$" };
                    self.output
                        .push_str(&format!("\\item[{}] {}\n", mark, escape_latex(content)));
                }
                // Lists only hold items
                other => self.skipped.push(other.kind().to_string()),
            }
        }
        self.output.push_str(&format!("\\end{{{}}}", environment));
    }

    fn write_table(&mut self, rows: &[String]) {
        let columns = rows.first().map_or(0, |row| split_cells(row).len());
        self.output
            .push_str(&format!("\\begin{{tabular}}{{{}}}\n", "c".repeat(columns)));
        self.output.push_str("\\hline\n");
        for row in rows {
            let cells = split_cells(row);
            if is_delimiter_row(&cells) {
                self.output.push_str("\\hline\n");
                continue;
            }
            let cells: Vec<String> = cells.iter().map(|cell| escape_latex(cell)).collect();
            self.output.push_str(&cells.join(" & "));
            self.output.push_str(" \\\\\n");
        }
        self.output.push_str("\\hline\n\\end{tabular}");
    }
}

/// Split a table row into trimmed cells, ignoring the outer pipes
fn split_cells(row: &str) -> Vec<&str> {
    let row = row.trim();
    let row = row.strip_prefix('|').unwrap_or(row);
    let row = row.strip_suffix('|').unwrap_or(row);
    row.split('|').map(str::trim).collect()
}

/// Header separator such as `|---|:--:|`
fn is_delimiter_row(cells: &[&str]) -> bool {
    cells.iter().all(|cell| {
        cell.contains('-') && cell.chars().all(|c| matches!(c, '-' | ':'))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(nodes: Vec<Node>) -> String {
        generate(&Document::new(nodes))
    }

    #[test]
    fn test_escape_latex() {
        assert_eq!(escape_latex("a & b"), "a \\& b");
        assert_eq!(escape_latex("100%"), "100\\%");
        assert_eq!(escape_latex("$5 #1"), "\\$5 \\#1");
        assert_eq!(escape_latex("snake_case"), "snake\\_case");
        assert_eq!(escape_latex("{x}"), "\\{x\\}");
        assert_eq!(escape_latex("plain text"), "plain text");
        assert_eq!(escape_latex(""), "");
    }

    #[test]
    fn test_escape_tilde_caret_known_deviation() {
        // \~ and \^ are accent commands, not valid text-mode escapes
        assert_eq!(escape_latex("~^"), "\\~\\^");
        assert_eq!(escape_latex("a~b^c"), "a\\~b\\^c");
    }

    #[test]
    fn test_escape_latex_leaves_backslash() {
        assert_eq!(escape_latex("C:\\dir"), "C:\\dir");
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(render(Vec::new()), "");
    }

    // ========================================================================
    // Headings and text
    // ========================================================================

    #[test]
    fn test_header_levels() {
        assert_eq!(render(vec![Node::header(1, "A")]), "\\section{A}");
        assert_eq!(render(vec![Node::header(2, "A")]), "\\subsection{A}");
        assert_eq!(render(vec![Node::header(3, "A")]), "\\subsubsection{A}");
        assert_eq!(render(vec![Node::header(4, "A")]), "\\paragraph{A}");
        assert_eq!(render(vec![Node::header(5, "A")]), "\\subparagraph{A}");
    }

    #[test]
    fn test_header_level_out_of_range() {
        assert_eq!(render(vec![Node::header(6, "Deep")]), "\\section{Deep}");
        assert_eq!(render(vec![Node::header(0, "None")]), "\\section{None}");
    }

    #[test]
    fn test_header_is_escaped() {
        assert_eq!(
            render(vec![Node::header(1, "Q&A")]),
            "\\section{Q\\&A}"
        );
    }

    #[test]
    fn test_paragraph_ends_with_blank_line() {
        assert_eq!(render(vec![Node::paragraph("Hello")]), "Hello\n\n");
    }

    #[test]
    fn test_text_has_no_trailing_blank_line() {
        assert_eq!(render(vec![Node::text("50% off")]), "50\\% off");
    }

    #[test]
    fn test_inline_styles() {
        assert_eq!(render(vec![Node::bold("b")]), "\\textbf{b}");
        assert_eq!(render(vec![Node::italic("i")]), "\\textit{i}");
        assert_eq!(render(vec![Node::code("x_1")]), "\\texttt{x\\_1}");
    }

    #[test]
    fn test_nodes_joined_with_newline() {
        let latex = render(vec![
            Node::header(1, "Title"),
            Node::LineBreak,
            Node::paragraph("Body"),
        ]);
        assert_eq!(latex, "\\section{Title}\n\\\\\nBody\n\n");
    }

    // ========================================================================
    // Code, links and figures
    // ========================================================================

    #[test]
    fn test_code_block_with_language() {
        assert_eq!(
            render(vec![Node::code_block("rust", "let x = 1;")]),
            "\\begin{lstlisting}[language=rust]\nlet x = 1;\n\\end{lstlisting}"
        );
    }

    #[test]
    fn test_code_block_without_language() {
        assert_eq!(
            render(vec![Node::code_block("", "a_b & c")]),
            "\\begin{lstlisting}\na_b & c\n\\end{lstlisting}"
        );
    }

    #[test]
    fn test_link() {
        assert_eq!(
            render(vec![Node::link("docs_page", "http://x/a_b")]),
            "\\href{http://x/a_b}{docs\\_page}"
        );
    }

    #[test]
    fn test_image_figure() {
        assert_eq!(
            render(vec![Node::image("A & B", "img/plot.png")]),
            "\\begin{figure}[h]\n\\centering\n\\includegraphics[width=0.8\\textwidth]{img/plot.png}\n\\caption{A \\& B}\n\\end{figure}"
        );
    }

    #[test]
    fn test_image_figure_options() {
        let options = WriterOptions {
            figure: FigureOptions {
                width: "5cm".to_string(),
                placement: "htbp".to_string(),
            },
            ..Default::default()
        };
        let doc = Document::new(vec![Node::image("alt", "a.png")]);
        let latex = document_to_latex(&doc, &options).unwrap();
        assert!(latex.starts_with("\\begin{figure}[htbp]\n"));
        assert!(latex.contains("\\includegraphics[width=5cm]{a.png}"));
    }

    #[test]
    fn test_blockquote() {
        assert_eq!(
            render(vec![Node::blockquote("line one\nline #2")]),
            "\\begin{quote}\nline one\nline \\#2\n\\end{quote}"
        );
    }

    // ========================================================================
    // Lists
    // ========================================================================

    #[test]
    fn test_unordered_list() {
        let list = Node::unordered_list(vec![Node::list_item("a"), Node::list_item("b_c")]);
        assert_eq!(
            render(vec![list]),
            "\\begin{itemize}\n\\item a\n\\item b\\_c\n\\end{itemize}"
        );
    }

    #[test]
    fn test_ordered_list() {
        let list = Node::ordered_list(vec![Node::list_item("first")]);
        assert_eq!(
            render(vec![list]),
            "\\begin{enumerate}\n\\item first\n\\end{enumerate}"
        );
    }

    #[test]
    fn test_task_list_markers() {
        let list = Node::task_list(vec![
            Node::todo_item(false, "todo"),
            Node::todo_item(true, "done"),
            Node::list_item("plain"),
        ]);
        assert_eq!(
            render(vec![list]),
            "\\begin{itemize}\n\\item[$\\square$] todo\n\\item[$\\boxtimes$] done\n\\item plain\n\\end{itemize}"
        );
    }

    #[test]
    fn test_empty_list() {
        assert_eq!(
            render(vec![Node::unordered_list(Vec::new())]),
            "\\begin{itemize}\n\\end{itemize}"
        );
    }

    #[test]
    fn test_bare_item_renders_as_list() {
        assert_eq!(
            render(vec![Node::todo_item(true, "x")]),
            "\\begin{itemize}\n\\item[$\\boxtimes$] x\n\\end{itemize}"
        );
    }

    // ========================================================================
    // Tables
    // ========================================================================

    #[test]
    fn test_table_column_count_from_first_row() {
        let table = Node::table(vec!["|A|B|C|".to_string(), "|1|2|3|".to_string()]);
        assert_eq!(
            render(vec![table]),
            "\\begin{tabular}{ccc}\n\\hline\nA & B & C \\\\\n1 & 2 & 3 \\\\\n\\hline\n\\end{tabular}"
        );
    }

    #[test]
    fn test_table_delimiter_row_becomes_rule() {
        let table = Node::table(vec![
            "| Name | Cost |".to_string(),
            "|------|:----:|".to_string(),
            "| tea  | $3   |".to_string(),
        ]);
        assert_eq!(
            render(vec![table]),
            "\\begin{tabular}{cc}\n\\hline\nName & Cost \\\\\n\\hline\ntea & \\$3 \\\\\n\\hline\n\\end{tabular}"
        );
    }

    #[test]
    fn test_split_cells() {
        assert_eq!(split_cells("|A|B|C|"), vec!["A", "B", "C"]);
        assert_eq!(split_cells("A | B"), vec!["A", "B"]);
        assert_eq!(split_cells("| a |"), vec!["a"]);
    }

    #[test]
    fn test_is_delimiter_row() {
        assert!(is_delimiter_row(&["---", ":-:", "--:"]));
        assert!(!is_delimiter_row(&["---", "x"]));
        assert!(!is_delimiter_row(&[""]));
        assert!(!is_delimiter_row(&[":"]));
    }

    // ========================================================================
    // Math
    // ========================================================================

    #[test]
    fn test_math_is_verbatim() {
        assert_eq!(render(vec![Node::inline_math("a_1^2")]), "$a_1^2$");
        assert_eq!(
            render(vec![Node::block_math("\\sum_i x_i")]),
            "\\[\n\\sum_i x_i\n\\]"
        );
    }

    // ========================================================================
    // Unknown nodes and options
    // ========================================================================

    #[test]
    fn test_unknown_node_renders_empty() {
        let latex = render(vec![
            Node::paragraph("a"),
            Node::Unrecognized {
                kind: "footnote".to_string(),
            },
            Node::paragraph("b"),
        ]);
        assert_eq!(latex, "a\n\n\n\nb\n\n");
    }

    #[test]
    fn test_strict_rejects_unknown_node() {
        let doc = Document::new(vec![Node::Unrecognized {
            kind: "footnote".to_string(),
        }]);
        let options = WriterOptions {
            strict: true,
            ..Default::default()
        };
        let err = document_to_latex(&doc, &options).unwrap_err();
        assert_eq!(
            err,
            WriteError::UnknownNodeKind {
                kind: "footnote".to_string()
            }
        );
        assert_eq!(err.to_string(), "No LaTeX rule for node kind `footnote`");
    }

    #[test]
    fn test_strict_rejects_non_item_in_list() {
        let doc = Document::new(vec![Node::unordered_list(vec![Node::paragraph("p")])]);
        let options = WriterOptions {
            strict: true,
            ..Default::default()
        };
        assert!(document_to_latex(&doc, &options).is_err());
        assert_eq!(generate(&doc), "\\begin{itemize}\n\\end{itemize}");
    }

    #[test]
    fn test_standalone_document() {
        let doc = Document::new(vec![Node::paragraph("Hi")]);
        let options = WriterOptions {
            standalone: Some(Preamble::default()),
            ..Default::default()
        };
        let latex = document_to_latex(&doc, &options).unwrap();
        insta::assert_snapshot!(latex.trim_end(), @r"
        \documentclass{article}
        \usepackage{hyperref}
        \usepackage{graphicx}
        \usepackage{listings}
        \usepackage{amssymb}

        \begin{document}
        Hi


        \end{document}
        ");
    }

    #[test]
    fn test_standalone_custom_preamble() {
        let doc = Document::new(vec![Node::header(1, "T")]);
        let options = WriterOptions {
            standalone: Some(Preamble {
                document_class: "report".to_string(),
                packages: vec!["hyperref".to_string()],
            }),
            ..Default::default()
        };
        let latex = document_to_latex(&doc, &options).unwrap();
        assert_eq!(
            latex,
            "\\documentclass{report}\n\\usepackage{hyperref}\n\n\\begin{document}\n\\section{T}\n\\end{document}\n"
        );
    }
}
