//! Recursive mdast to [`Node`] transformer.
//!
//! Every mdast node maps to zero or one [`Node`]. Containers transform
//! their children first and then wrap them. Shell-language code blocks go
//! through the transcript tokenizer, blockquotes are checked for a
//! `[!SEVERITY]` alert marker, and HTML comments become `comment` nodes.

use crate::error::{ShellguideError, SourceLocation};
use crate::highlight::Highlighter;
use crate::node::{Align, CodeBody, Element, Node, Severity, ShellSection};
use crate::parse::ParseOptions;
use crate::shell::{ShellToken, ShellTokenKind, is_shell_language, parse_shell_code_block};
use markdown::mdast;
use std::collections::HashMap;

/// Language given to code blocks without an info string.
pub const DEFAULT_LANGUAGE: &str = "plaintext";

/// Elements whose block HTML is flagged `pre`.
const RAW_TEXT_ELEMENTS: [&str; 3] = ["pre", "script", "style"];

/// Converts an mdast tree into document nodes.
pub struct Transformer<'a> {
    options: &'a ParseOptions,
    highlighter: &'a dyn Highlighter,
}

struct Target {
    href: String,
    title: Option<String>,
}

type Definitions = HashMap<String, Target>;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Flow {
    Block,
    Inline,
}

/// Per-call traversal state, passed by value down the recursion.
#[derive(Clone, Copy)]
struct Cx<'d> {
    definitions: &'d Definitions,
    flow: Flow,
    depth: usize,
}

impl<'d> Cx<'d> {
    fn target(&self, identifier: &str) -> Result<&'d Target, ShellguideError> {
        self.definitions
            .get(identifier)
            .ok_or_else(|| ShellguideError::UnresolvedReference(identifier.to_string()))
    }
}

impl<'a> Transformer<'a> {
    /// Create a transformer.
    pub fn new(options: &'a ParseOptions, highlighter: &'a dyn Highlighter) -> Self {
        Self {
            options,
            highlighter,
        }
    }

    /// Transform a lexed document. A `Root` yields its children; any other
    /// node is transformed on its own.
    pub fn transform(&self, root: &mdast::Node) -> Result<Vec<Node>, ShellguideError> {
        let mut definitions = Definitions::new();
        collect_definitions(root, &mut definitions);

        let cx = Cx {
            definitions: &definitions,
            flow: Flow::Block,
            depth: 0,
        };
        match root {
            mdast::Node::Root(root) => self.children(&root.children, cx),
            other => Ok(self.node(other, cx)?.into_iter().collect()),
        }
    }

    fn node(&self, node: &mdast::Node, cx: Cx<'_>) -> Result<Option<Node>, ShellguideError> {
        use mdast::Node as Md;

        let element = match node {
            Md::Text(text) => return Ok(Some(Node::text(&text.value))),
            Md::Definition(_) => return Ok(None),
            Md::Paragraph(paragraph) => Element::Paragraph {
                subnodes: self.inline(&paragraph.children, cx)?,
            },
            Md::Heading(heading) => Element::Heading {
                depth: heading.depth,
                subnodes: self.inline(&heading.children, cx)?,
            },
            Md::Blockquote(quote) => self.blockquote(self.block(&quote.children, cx)?)?,
            Md::List(list) => Element::List {
                ordered: list.ordered,
                start: list.start.filter(|start| list.ordered && *start != 1),
                subnodes: self.block(&list.children, cx)?,
            },
            Md::ListItem(item) => Element::ListItem {
                checked: item.checked,
                subnodes: self.block(&item.children, cx)?,
            },
            Md::Code(code) => self.code(code)?,
            Md::InlineCode(code) => Element::Codespan {
                subnodes: vec![Node::text(&code.value)],
            },
            Md::Table(table) => self.table(table, cx)?,
            Md::TableRow(row) => Element::TableRow {
                subnodes: self.inline(&row.children, cx)?,
            },
            Md::TableCell(cell) => Element::TableCell {
                subnodes: self.inline(&cell.children, cx)?,
            },
            Md::Link(link) => Element::Link {
                href: link.url.clone(),
                title: link.title.clone(),
                subnodes: self.inline(&link.children, cx)?,
            },
            Md::LinkReference(reference) => {
                let target = cx.target(&reference.identifier)?;
                Element::Link {
                    href: target.href.clone(),
                    title: target.title.clone(),
                    subnodes: self.inline(&reference.children, cx)?,
                }
            }
            Md::Image(image) => Element::Image {
                href: image.url.clone(),
                title: image.title.clone(),
                subnodes: alt_text(&image.alt),
            },
            Md::ImageReference(reference) => {
                let target = cx.target(&reference.identifier)?;
                Element::Image {
                    href: target.href.clone(),
                    title: target.title.clone(),
                    subnodes: alt_text(&reference.alt),
                }
            }
            Md::Html(html) => html_element(&html.value, cx.flow),
            Md::Emphasis(emphasis) => Element::Em {
                subnodes: self.inline(&emphasis.children, cx)?,
            },
            Md::Strong(strong) => Element::Strong {
                subnodes: self.inline(&strong.children, cx)?,
            },
            Md::Delete(delete) => Element::Del {
                subnodes: self.inline(&delete.children, cx)?,
            },
            Md::Break(_) => Element::Br {},
            Md::ThematicBreak(_) => Element::Hr {},
            Md::Root(_)
            | Md::FootnoteDefinition(_)
            | Md::FootnoteReference(_)
            | Md::MdxJsxFlowElement(_)
            | Md::MdxJsxTextElement(_)
            | Md::MdxjsEsm(_)
            | Md::MdxFlowExpression(_)
            | Md::MdxTextExpression(_)
            | Md::Toml(_)
            | Md::Yaml(_)
            | Md::Math(_)
            | Md::InlineMath(_) => {
                return Err(ShellguideError::unsupported_token(token_kind(node)));
            }
        };

        Ok(Some(element.into()))
    }

    /// Transform a child list, merging adjacent text.
    fn children(&self, children: &[mdast::Node], cx: Cx<'_>) -> Result<Vec<Node>, ShellguideError> {
        let mut nodes: Vec<Node> = Vec::with_capacity(children.len());
        for child in children {
            match self.node(child, cx)? {
                Some(Node::Text(text)) => {
                    if let Some(Node::Text(last)) = nodes.last_mut() {
                        last.push_str(&text);
                    } else {
                        nodes.push(Node::Text(text));
                    }
                }
                Some(node) => nodes.push(node),
                None => {}
            }
        }
        Ok(nodes)
    }

    fn block(&self, children: &[mdast::Node], cx: Cx<'_>) -> Result<Vec<Node>, ShellguideError> {
        self.children(children, self.enter(cx, Flow::Block)?)
    }

    fn inline(&self, children: &[mdast::Node], cx: Cx<'_>) -> Result<Vec<Node>, ShellguideError> {
        self.children(children, self.enter(cx, Flow::Inline)?)
    }

    fn enter<'d>(&self, cx: Cx<'d>, flow: Flow) -> Result<Cx<'d>, ShellguideError> {
        let depth = cx.depth + 1;
        if let Some(limit) = self.options.max_depth
            && depth > limit
        {
            return Err(ShellguideError::NestingTooDeep { limit });
        }
        Ok(Cx { depth, flow, ..cx })
    }

    fn code(&self, code: &mdast::Code) -> Result<Element, ShellguideError> {
        let language = code
            .lang
            .clone()
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

        let subnodes = if is_shell_language(&language) {
            let tokens = parse_shell_code_block(&code.value).map_err(|source| {
                ShellguideError::malformed_shell_block(
                    source,
                    SourceLocation::of(code.position.as_ref()),
                )
            })?;
            let sections = tokens
                .into_iter()
                .map(|token| self.section(token, &language))
                .collect::<Result<Vec<_>, _>>()?;
            CodeBody::Transcript(sections)
        } else {
            CodeBody::Highlighted(self.highlighter.highlight(&code.value, &language)?)
        };

        Ok(Element::Code { language, subnodes })
    }

    /// Only command lines are highlighted; commentary and output stay text.
    fn section(&self, token: ShellToken, language: &str) -> Result<ShellSection, ShellguideError> {
        Ok(match token.kind {
            ShellTokenKind::Description => ShellSection::Description { lines: token.lines },
            ShellTokenKind::Command => ShellSection::Command {
                lines: self
                    .highlighter
                    .highlight(&token.lines.join("\n"), language)?,
            },
            ShellTokenKind::Output => ShellSection::Output { lines: token.lines },
        })
    }

    fn table(&self, table: &mdast::Table, cx: Cx<'_>) -> Result<Element, ShellguideError> {
        let cx = self.enter(cx, Flow::Inline)?;
        let mut rows = table.children.iter();
        let mut subnodes = Vec::with_capacity(table.children.len());

        if let Some(header) = rows.next() {
            subnodes.push(
                Element::TableHeader {
                    subnodes: self.cells(header, cx)?,
                }
                .into(),
            );
        }
        for row in rows {
            subnodes.push(
                Element::TableRow {
                    subnodes: self.cells(row, cx)?,
                }
                .into(),
            );
        }

        Ok(Element::Table {
            align: table.align.iter().map(align).collect(),
            subnodes,
        })
    }

    fn cells(&self, row: &mdast::Node, cx: Cx<'_>) -> Result<Vec<Node>, ShellguideError> {
        match row {
            mdast::Node::TableRow(row) => self.inline(&row.children, cx),
            other => Err(ShellguideError::unsupported_token(token_kind(other))),
        }
    }

    fn blockquote(&self, mut subnodes: Vec<Node>) -> Result<Element, ShellguideError> {
        match self.strip_alert_marker(&mut subnodes)? {
            Some(severity) => Ok(Element::Alert { severity, subnodes }),
            None => Ok(Element::Blockquote { subnodes }),
        }
    }

    /// Remove a leading `[!LABEL]` from the first paragraph of a blockquote
    /// and return its severity.
    ///
    /// A line break right after the marker goes with it, and the paragraph
    /// is dropped when the marker was all it held.
    fn strip_alert_marker(&self, subnodes: &mut Vec<Node>) -> Result<Option<Severity>, ShellguideError> {
        let Some(Node::Element(Element::Paragraph {
            subnodes: paragraph,
        })) = subnodes.first_mut()
        else {
            return Ok(None);
        };
        let Some(Node::Text(lead)) = paragraph.first() else {
            return Ok(None);
        };
        let Some(marked) = lead.strip_prefix("[!") else {
            return Ok(None);
        };
        let Some(end) = marked.find(']') else {
            return Ok(None);
        };

        let label = &marked[..end];
        let severity = Severity::from_label(label, self.options.alert_case_insensitive)
            .ok_or_else(|| ShellguideError::InvalidAlertSeverity(label.to_string()))?;

        let after = &marked[end + 1..];
        let after = after.strip_prefix([' ', '\t']).unwrap_or(after);
        let (rest, dropped_break) = match after
            .strip_prefix("\r\n")
            .or_else(|| after.strip_prefix('\n'))
        {
            Some(rest) => (rest.to_string(), true),
            None => (after.to_string(), false),
        };

        if rest.is_empty() {
            paragraph.remove(0);
            if !dropped_break && matches!(paragraph.first(), Some(Node::Element(Element::Br {}))) {
                paragraph.remove(0);
            }
        } else {
            paragraph[0] = Node::Text(rest);
        }
        if paragraph.is_empty() {
            subnodes.remove(0);
        }

        Ok(Some(severity))
    }
}

fn collect_definitions(node: &mdast::Node, definitions: &mut Definitions) {
    if let mdast::Node::Definition(definition) = node {
        // First definition of an identifier wins.
        definitions
            .entry(definition.identifier.clone())
            .or_insert_with(|| Target {
                href: definition.url.clone(),
                title: definition.title.clone(),
            });
    }
    if let Some(children) = node.children() {
        for child in children {
            collect_definitions(child, definitions);
        }
    }
}

fn alt_text(alt: &str) -> Vec<Node> {
    if alt.is_empty() {
        Vec::new()
    } else {
        vec![Node::text(alt)]
    }
}

fn align(kind: &mdast::AlignKind) -> Option<Align> {
    match kind {
        mdast::AlignKind::Left => Some(Align::Left),
        mdast::AlignKind::Center => Some(Align::Center),
        mdast::AlignKind::Right => Some(Align::Right),
        mdast::AlignKind::None => None,
    }
}

fn html_element(raw: &str, flow: Flow) -> Element {
    let trimmed = raw.trim();
    if let Some(inner) = trimmed
        .strip_prefix("<!--")
        .and_then(|rest| rest.strip_suffix("-->"))
    {
        return Element::Comment {
            subnodes: vec![Node::text(inner.trim())],
        };
    }

    let block = flow == Flow::Block;
    Element::Html {
        block,
        pre: block.then(|| opens_raw_text_element(trimmed)),
        subnodes: vec![Node::text(raw)],
    }
}

fn opens_raw_text_element(html: &str) -> bool {
    let Some(rest) = html.strip_prefix('<') else {
        return false;
    };
    let name: String = rest
        .chars()
        .take_while(char::is_ascii_alphanumeric)
        .collect::<String>()
        .to_ascii_lowercase();
    RAW_TEXT_ELEMENTS.contains(&name.as_str())
}

/// snake_case name of an mdast node kind, as reported in errors.
pub fn token_kind(node: &mdast::Node) -> &'static str {
    use mdast::Node as Md;

    match node {
        Md::Root(_) => "root",
        Md::Blockquote(_) => "blockquote",
        Md::FootnoteDefinition(_) => "footnote_definition",
        Md::MdxJsxFlowElement(_) => "mdx_jsx_flow_element",
        Md::List(_) => "list",
        Md::MdxjsEsm(_) => "mdxjs_esm",
        Md::Toml(_) => "toml",
        Md::Yaml(_) => "yaml",
        Md::Break(_) => "break",
        Md::InlineCode(_) => "inline_code",
        Md::InlineMath(_) => "inline_math",
        Md::Delete(_) => "delete",
        Md::Emphasis(_) => "emphasis",
        Md::MdxTextExpression(_) => "mdx_text_expression",
        Md::FootnoteReference(_) => "footnote_reference",
        Md::Html(_) => "html",
        Md::Image(_) => "image",
        Md::ImageReference(_) => "image_reference",
        Md::MdxJsxTextElement(_) => "mdx_jsx_text_element",
        Md::Link(_) => "link",
        Md::LinkReference(_) => "link_reference",
        Md::Strong(_) => "strong",
        Md::Text(_) => "text",
        Md::Code(_) => "code",
        Md::Math(_) => "math",
        Md::MdxFlowExpression(_) => "mdx_flow_expression",
        Md::Heading(_) => "heading",
        Md::Table(_) => "table",
        Md::ThematicBreak(_) => "thematic_break",
        Md::TableRow(_) => "table_row",
        Md::TableCell(_) => "table_cell",
        Md::ListItem(_) => "list_item",
        Md::Definition(_) => "definition",
        Md::Paragraph(_) => "paragraph",
    }
}
