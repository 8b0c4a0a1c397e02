//! Typed document tree handed to renderers.
//!
//! The tree serializes to plain JSON: text is a bare string and every other
//! node is an object tagged with `kind`.

use crate::highlight::HighlightSpan;
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use std::fmt;

/// A node of the document tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Node {
    /// Plain text, never wrapped in an object.
    Text(String),
    /// Structured node carrying a `kind`.
    Element(Element),
}

impl Node {
    /// Create a text node.
    pub fn text(value: impl Into<String>) -> Self {
        Node::Text(value.into())
    }

    /// Returns the text when this is a text node.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Node::Text(text) => Some(text),
            Node::Element(_) => None,
        }
    }

    /// Returns the element when this is a structured node.
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Text(_) => None,
            Node::Element(element) => Some(element),
        }
    }

    /// `kind` tag of the node; `None` for text.
    pub fn kind(&self) -> Option<&'static str> {
        self.as_element().map(Element::kind)
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

impl From<&str> for Node {
    fn from(text: &str) -> Self {
        Node::Text(text.to_string())
    }
}

impl From<String> for Node {
    fn from(text: String) -> Self {
        Node::Text(text)
    }
}

/// Structured nodes, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Element {
    /// Leading document metadata.
    Frontmatter {
        /// Front-matter attributes.
        data: Map<String, JsonValue>,
    },
    /// `#` heading.
    Heading {
        /// Level from 1 to 6.
        depth: u8,
        /// Inline content.
        subnodes: Vec<Node>,
    },
    /// Paragraph.
    Paragraph {
        /// Inline content.
        subnodes: Vec<Node>,
    },
    /// Blockquote without an alert marker.
    Blockquote {
        /// Block content.
        subnodes: Vec<Node>,
    },
    /// Blockquote introduced by `[!SEVERITY]`.
    Alert {
        /// Alert severity.
        severity: Severity,
        /// Block content with the marker removed.
        subnodes: Vec<Node>,
    },
    /// Ordered or bullet list.
    List {
        /// Whether the list is numbered.
        ordered: bool,
        /// First number of an ordered list, when it is not 1.
        #[serde(skip_serializing_if = "Option::is_none")]
        start: Option<u32>,
        /// `list_item` nodes.
        subnodes: Vec<Node>,
    },
    /// Item of a list.
    ListItem {
        /// Task list state (`[x]` / `[ ]`), when the item is a task.
        #[serde(skip_serializing_if = "Option::is_none")]
        checked: Option<bool>,
        /// Block content.
        subnodes: Vec<Node>,
    },
    /// Fenced or indented code block.
    Code {
        /// Fence language, `plaintext` when absent.
        language: String,
        /// Highlighted content.
        subnodes: CodeBody,
    },
    /// Inline code.
    Codespan {
        /// The code as a single text node.
        subnodes: Vec<Node>,
    },
    /// GFM table.
    Table {
        /// Per-column alignment; `null` for unaligned columns.
        align: Vec<Option<Align>>,
        /// One `table_header` followed by `table_row` nodes.
        subnodes: Vec<Node>,
    },
    /// Header row of a table.
    TableHeader {
        /// `table_cell` nodes.
        subnodes: Vec<Node>,
    },
    /// Body row of a table.
    TableRow {
        /// `table_cell` nodes.
        subnodes: Vec<Node>,
    },
    /// Table cell.
    TableCell {
        /// Inline content.
        subnodes: Vec<Node>,
    },
    /// Hyperlink.
    Link {
        /// Destination.
        href: String,
        /// Optional title.
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        /// Link text.
        subnodes: Vec<Node>,
    },
    /// Image.
    Image {
        /// Source.
        href: String,
        /// Optional title.
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        /// Alt text as a single text node, empty when there is none.
        subnodes: Vec<Node>,
    },
    /// Raw HTML other than a comment.
    Html {
        /// Flow-level (`true`) or inline (`false`) HTML.
        block: bool,
        /// For block HTML: whether it opens a `pre`, `script` or `style` element.
        #[serde(skip_serializing_if = "Option::is_none")]
        pre: Option<bool>,
        /// The raw HTML as a single text node.
        subnodes: Vec<Node>,
    },
    /// HTML comment.
    Comment {
        /// Comment body, trimmed, as a single text node.
        subnodes: Vec<Node>,
    },
    /// Hard line break.
    Br {},
    /// Thematic break.
    Hr {},
    /// Emphasis.
    Em {
        /// Inline content.
        subnodes: Vec<Node>,
    },
    /// Strong emphasis.
    Strong {
        /// Inline content.
        subnodes: Vec<Node>,
    },
    /// Strikethrough.
    Del {
        /// Inline content.
        subnodes: Vec<Node>,
    },
}

impl Element {
    /// Serialized `kind` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Element::Frontmatter { .. } => "frontmatter",
            Element::Heading { .. } => "heading",
            Element::Paragraph { .. } => "paragraph",
            Element::Blockquote { .. } => "blockquote",
            Element::Alert { .. } => "alert",
            Element::List { .. } => "list",
            Element::ListItem { .. } => "list_item",
            Element::Code { .. } => "code",
            Element::Codespan { .. } => "codespan",
            Element::Table { .. } => "table",
            Element::TableHeader { .. } => "table_header",
            Element::TableRow { .. } => "table_row",
            Element::TableCell { .. } => "table_cell",
            Element::Link { .. } => "link",
            Element::Image { .. } => "image",
            Element::Html { .. } => "html",
            Element::Comment { .. } => "comment",
            Element::Br {} => "br",
            Element::Hr {} => "hr",
            Element::Em { .. } => "em",
            Element::Strong { .. } => "strong",
            Element::Del { .. } => "del",
        }
    }

    /// Child nodes, for every kind that holds a node list.
    pub fn subnodes(&self) -> Option<&[Node]> {
        match self {
            Element::Heading { subnodes, .. }
            | Element::Paragraph { subnodes }
            | Element::Blockquote { subnodes }
            | Element::Alert { subnodes, .. }
            | Element::List { subnodes, .. }
            | Element::ListItem { subnodes, .. }
            | Element::Codespan { subnodes }
            | Element::Table { subnodes, .. }
            | Element::TableHeader { subnodes }
            | Element::TableRow { subnodes }
            | Element::TableCell { subnodes }
            | Element::Link { subnodes, .. }
            | Element::Image { subnodes, .. }
            | Element::Html { subnodes, .. }
            | Element::Comment { subnodes }
            | Element::Em { subnodes }
            | Element::Strong { subnodes }
            | Element::Del { subnodes } => Some(subnodes),
            Element::Frontmatter { .. }
            | Element::Code { .. }
            | Element::Br {}
            | Element::Hr {} => None,
        }
    }
}

/// Contents of a `code` node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CodeBody {
    /// Spans of a non-shell block.
    Highlighted(Vec<HighlightSpan>),
    /// Sections of a shell transcript.
    Transcript(Vec<ShellSection>),
}

/// A transcript section with its command lines highlighted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ShellSection {
    /// Commentary lines.
    Description {
        /// Lines without their `# ` prefix.
        lines: Vec<String>,
    },
    /// Highlighted command text.
    Command {
        /// Spans of the command lines joined with `\n`.
        lines: Vec<HighlightSpan>,
    },
    /// Captured output lines.
    Output {
        /// Lines without their `# ` prefix.
        lines: Vec<String>,
    },
}

/// Alert severities recognised after `[!` in a blockquote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// `[!CAUTION]`
    Caution,
    /// `[!IMPORTANT]`
    Important,
    /// `[!NOTE]`
    Note,
    /// `[!TIP]`
    Tip,
    /// `[!WARNING]`
    Warning,
}

impl Severity {
    /// Every severity, in label order.
    pub const ALL: [Severity; 5] = [
        Severity::Caution,
        Severity::Important,
        Severity::Note,
        Severity::Tip,
        Severity::Warning,
    ];

    /// Marker label as written in markdown.
    pub fn label(self) -> &'static str {
        match self {
            Severity::Caution => "CAUTION",
            Severity::Important => "IMPORTANT",
            Severity::Note => "NOTE",
            Severity::Tip => "TIP",
            Severity::Warning => "WARNING",
        }
    }

    /// Match a marker label. Only the uppercase spelling is accepted unless
    /// `case_insensitive` is set.
    pub fn from_label(label: &str, case_insensitive: bool) -> Option<Severity> {
        Self::ALL.into_iter().find(|severity| {
            if case_insensitive {
                severity.label().eq_ignore_ascii_case(label)
            } else {
                severity.label() == label
            }
        })
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label().to_ascii_lowercase())
    }
}

/// Table column alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    /// `:--`
    Left,
    /// `:-:`
    Center,
    /// `--:`
    Right,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_serializes_as_bare_string() {
        let node = Node::from(Element::Paragraph {
            subnodes: vec!["hello".into()],
        });
        assert_eq!(
            serde_json::to_value(node).unwrap(),
            json!({ "kind": "paragraph", "subnodes": ["hello"] })
        );
    }

    #[test]
    fn empty_kinds_serialize_with_tag_only() {
        let nodes: Vec<Node> = vec![Element::Br {}.into(), Element::Hr {}.into()];
        assert_eq!(
            serde_json::to_value(nodes).unwrap(),
            json!([{ "kind": "br" }, { "kind": "hr" }])
        );
    }

    #[test]
    fn optional_fields_are_omitted() {
        let link = Element::Link {
            href: "https://example.com".into(),
            title: None,
            subnodes: vec!["site".into()],
        };
        assert_eq!(
            serde_json::to_value(link).unwrap(),
            json!({ "kind": "link", "href": "https://example.com", "subnodes": ["site"] })
        );

        let html = Element::Html {
            block: false,
            pre: None,
            subnodes: vec!["<b>".into()],
        };
        assert_eq!(
            serde_json::to_value(html).unwrap(),
            json!({ "kind": "html", "block": false, "subnodes": ["<b>"] })
        );
    }

    #[test]
    fn table_alignment_uses_null_for_unaligned() {
        let table = Element::Table {
            align: vec![Some(Align::Left), None, Some(Align::Center)],
            subnodes: Vec::new(),
        };
        assert_eq!(
            serde_json::to_value(table).unwrap(),
            json!({ "kind": "table", "align": ["left", null, "center"], "subnodes": [] })
        );
    }

    #[test]
    fn transcript_code_serializes_sections() {
        let code = Element::Code {
            language: "bash".into(),
            subnodes: CodeBody::Transcript(vec![
                ShellSection::Description {
                    lines: vec!["List".into()],
                },
                ShellSection::Command {
                    lines: vec![HighlightSpan::plain("ls")],
                },
                ShellSection::Output {
                    lines: vec!["README.md".into()],
                },
            ]),
        };
        assert_eq!(
            serde_json::to_value(code).unwrap(),
            json!({
                "kind": "code",
                "language": "bash",
                "subnodes": [
                    { "kind": "description", "lines": ["List"] },
                    { "kind": "command", "lines": [{ "text": "ls" }] },
                    { "kind": "output", "lines": ["README.md"] },
                ]
            })
        );
    }

    #[test]
    fn severity_labels() {
        assert_eq!(Severity::from_label("NOTE", false), Some(Severity::Note));
        assert_eq!(Severity::from_label("note", false), None);
        assert_eq!(Severity::from_label("note", true), Some(Severity::Note));
        assert_eq!(Severity::from_label("Warning", true), Some(Severity::Warning));
        assert_eq!(Severity::from_label("DANGER", true), None);
        assert_eq!(Severity::Important.to_string(), "important");
    }

    #[test]
    fn element_kind_matches_serialized_tag() {
        let element = Element::ListItem {
            checked: Some(true),
            subnodes: Vec::new(),
        };
        let value = serde_json::to_value(&element).unwrap();
        assert_eq!(value["kind"], element.kind());
        assert_eq!(value["checked"], true);
        assert_eq!(Node::from("x").kind(), None);
    }

    #[test]
    fn accessors_walk_the_tree() {
        let quote = Node::from(Element::Blockquote {
            subnodes: vec![
                Element::Paragraph {
                    subnodes: vec!["hi".into()],
                }
                .into(),
            ],
        });
        let paragraph = quote
            .as_element()
            .and_then(Element::subnodes)
            .and_then(<[Node]>::first)
            .and_then(Node::as_element)
            .unwrap();
        let text = paragraph.subnodes().unwrap()[0].as_text();
        assert_eq!(text, Some("hi"));
        assert_eq!(quote.as_text(), None);
        assert_eq!(Element::Hr {}.subnodes(), None);
    }
}
