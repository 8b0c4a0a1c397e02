use serde_json::{Value, json};
use shellguide_core::{
    Element, Node, ParseOptions, ParserPipeline, ShellBlockError, ShellguideError, parse_document,
};
use shellguide_highlight::SyntectHighlighter;

const GUIDE: &str = r#"---
title: Inspect a repository
level: beginner
---
# Inspect a repository

<!-- reviewed 2024-05 -->

> [!NOTE]
> Every command below is read-only.

```console
# Show the current branch
git branch --show-current
# main

# Count tracked files
git ls-files | wc -l
# 42
```

```toml
[package]
name = "demo"
```
"#;

fn command_text(section: &Value) -> String {
    section["lines"]
        .as_array()
        .map(|spans| {
            spans
                .iter()
                .filter_map(|span| span["text"].as_str())
                .collect::<String>()
        })
        .unwrap_or_default()
}

#[test]
fn parses_a_full_guide() {
    let highlighter = SyntectHighlighter::new();
    let nodes = parse_document(GUIDE, &ParseOptions::default(), &highlighter).unwrap();
    let kinds: Vec<_> = nodes.iter().map(Node::kind).collect();
    assert_eq!(
        kinds,
        vec![
            Some("frontmatter"),
            Some("heading"),
            Some("comment"),
            Some("alert"),
            Some("code"),
            Some("code"),
        ]
    );

    let value = serde_json::to_value(&nodes).unwrap();
    assert_eq!(
        value[0]["data"],
        json!({ "level": "beginner", "title": "Inspect a repository" })
    );
    assert_eq!(value[2]["subnodes"], json!(["reviewed 2024-05"]));
    assert_eq!(value[3]["severity"], "note");

    let transcript = &value[4];
    assert_eq!(transcript["language"], "console");
    let sections = transcript["subnodes"].as_array().unwrap();
    let section_kinds: Vec<_> = sections.iter().map(|s| s["kind"].as_str()).collect();
    assert_eq!(
        section_kinds,
        vec![
            Some("description"),
            Some("command"),
            Some("output"),
            Some("description"),
            Some("command"),
            Some("output"),
        ]
    );
    assert_eq!(command_text(&sections[1]), "git branch --show-current");
    assert_eq!(command_text(&sections[4]), "git ls-files | wc -l");
    assert_eq!(sections[5]["lines"], json!(["42"]));

    let toml = &value[5];
    assert_eq!(toml["language"], "toml");
    let text: String = toml["subnodes"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|span| span["text"].as_str())
        .collect();
    assert_eq!(text, "[package]\nname = \"demo\"");
}

#[test]
fn pipeline_owns_its_highlighter() {
    let pipeline = ParserPipeline::new(ParseOptions::default(), SyntectHighlighter::new());
    let nodes = pipeline.parse("```sh\n# hi\necho hi\n# hi\n```\n").unwrap();
    match nodes.first().and_then(Node::as_element) {
        Some(Element::Code { language, .. }) => assert_eq!(language, "sh"),
        other => panic!("expected code node, got {other:?}"),
    }
}

#[test]
fn malformed_transcript_aborts_the_document() {
    let highlighter = SyntectHighlighter::new();
    let input = "# Title\n\n```zsh\nls\n# out\n```\n";
    let err = parse_document(input, &ParseOptions::default(), &highlighter).unwrap_err();
    assert!(
        matches!(
            err,
            ShellguideError::MalformedShellBlock {
                source: ShellBlockError::MissingLeadingComment,
                ..
            }
        ),
        "{err:?}"
    );
}
