//! Snapshot tests for the Markdown lexer and parser
//!
//! These tests lex and parse fixture documents and snapshot the resulting
//! tokens and AST to detect unintended changes in behavior.

use std::fs;
use std::path::PathBuf;

use md_parser::{Lexer, parse_source};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn read_fixture(name: &str) -> String {
    let path = fixtures_dir().join(format!("{}.md", name));
    fs::read_to_string(&path).expect("Failed to read fixture file")
}

fn parse_fixture(name: &str) -> String {
    let doc = parse_source(&read_fixture(name)).expect("Failed to parse fixture");
    serde_json::to_string_pretty(&doc).expect("Failed to serialize AST")
}

#[test]
fn inline_tokens() {
    let tokens = Lexer::tokenize(&read_fixture("inline"));
    insta::assert_debug_snapshot!(tokens, @r#"
    [
        Text {
            content: "Some ",
        },
        Bold {
            content: "bold",
        },
        Text {
            content: ", ",
        },
        Italic {
            content: "italic",
        },
        Text {
            content: " and ",
        },
        Code {
            content: "code",
        },
        Text {
            content: " with ",
        },
        InlineMath {
            content: "x^2",
        },
        Paragraph {
            content: ".",
        },
    ]
    "#);
}

#[test]
fn lists() {
    let ast_json = parse_fixture("lists");
    insta::assert_snapshot!(ast_json, @r#"
    {
      "children": [
        {
          "type": "taskList",
          "children": [
            {
              "type": "todoItem",
              "checked": false,
              "content": "write lexer"
            },
            {
              "type": "todoItem",
              "checked": true,
              "content": "write parser"
            }
          ]
        },
        {
          "type": "orderedList",
          "children": [
            {
              "type": "listItem",
              "content": "first"
            },
            {
              "type": "listItem",
              "content": "second"
            }
          ]
        }
      ]
    }
    "#);
}

#[test]
fn blocks() {
    let ast_json = parse_fixture("blocks");
    insta::assert_snapshot!(ast_json, @r#"
    {
      "children": [
        {
          "type": "header",
          "level": 1,
          "content": "Report"
        },
        {
          "type": "lineBreak"
        },
        {
          "type": "blockquote",
          "content": "Quoted\ntwice"
        },
        {
          "type": "lineBreak"
        },
        {
          "type": "table",
          "rows": [
            "|A|B|",
            "|1|2|"
          ]
        }
      ]
    }
    "#);
}
