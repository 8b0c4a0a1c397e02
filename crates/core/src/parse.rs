//! Parsing pipeline: front-matter split, markdown lexing, node transform.

use crate::frontmatter::split_frontmatter;
use crate::highlight::Highlighter;
use crate::node::{Element, Node};
use crate::transform::Transformer;
use crate::{ShellguideError, SourceLocation};
use markdown::mdast;
use markdown::message::{Message, Place};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::borrow::Cow;

/// Parser options.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Enable GitHub Flavored Markdown constructs (tables, strikethrough,
    /// autolink literals, task list items).
    pub gfm: bool,
    /// Split a leading `---` YAML block off the document.
    pub frontmatter: bool,
    /// Accept alert markers in any letter case (`[!note]`).
    pub alert_case_insensitive: bool,
    /// Reject documents nested deeper than this many levels.
    pub max_depth: Option<usize>,
}

impl ParseOptions {
    /// Convert to markdown-rs `ParseOptions`.
    ///
    /// Front-matter is split before lexing, so the YAML construct stays off.
    pub fn to_markdown(&self) -> markdown::ParseOptions {
        let mut constructs = markdown::Constructs {
            frontmatter: false,
            code_indented: true,
            html_flow: true,
            html_text: true,
            ..Default::default()
        };

        if self.gfm {
            constructs.gfm_autolink_literal = true;
            constructs.gfm_strikethrough = true;
            constructs.gfm_table = true;
            constructs.gfm_task_list_item = true;
        }

        markdown::ParseOptions {
            constructs,
            ..markdown::ParseOptions::default()
        }
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            gfm: true,
            frontmatter: true,
            alert_case_insensitive: false,
            max_depth: None,
        }
    }
}

/// A parsed document with its front-matter kept apart from the body nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Front-matter attributes; empty when absent.
    pub frontmatter: Map<String, JsonValue>,
    /// Body nodes.
    pub nodes: Vec<Node>,
}

impl Document {
    /// Flatten into the node list handed to renderers: a leading
    /// `frontmatter` node when attributes exist, then the body.
    pub fn into_nodes(self) -> Vec<Node> {
        if self.frontmatter.is_empty() {
            return self.nodes;
        }
        let mut nodes = Vec::with_capacity(self.nodes.len() + 1);
        nodes.push(Element::Frontmatter {
            data: self.frontmatter,
        }
        .into());
        nodes.extend(self.nodes);
        nodes
    }
}

/// Trait for preprocessing the markdown body before lexing.
pub trait TextTransform {
    /// Transform the body, returning an owned or borrowed string.
    fn transform<'a>(&self, input: &'a str) -> Cow<'a, str>;
}

impl<F> TextTransform for F
where
    F: for<'a> Fn(&'a str) -> Cow<'a, str>,
{
    fn transform<'a>(&self, input: &'a str) -> Cow<'a, str> {
        (self)(input)
    }
}

/// Trait for rewriting the lexed mdast before it is transformed into nodes.
pub trait AstTransform {
    /// Mutate the mdast root in place.
    fn transform(&self, root: &mut mdast::Node);
}

impl<F> AstTransform for F
where
    F: Fn(&mut mdast::Node),
{
    fn transform(&self, root: &mut mdast::Node) {
        (self)(root)
    }
}

/// Configurable pipeline owning its highlighter and optional transforms.
pub struct ParserPipeline<H> {
    options: ParseOptions,
    highlighter: H,
    text_transforms: Vec<Box<dyn TextTransform>>,
    ast_transforms: Vec<Box<dyn AstTransform>>,
}

impl<H: Highlighter> ParserPipeline<H> {
    /// Create a pipeline.
    pub fn new(options: ParseOptions, highlighter: H) -> Self {
        Self {
            options,
            highlighter,
            text_transforms: Vec::new(),
            ast_transforms: Vec::new(),
        }
    }

    /// Options in use.
    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Add a body preprocessor, run after front-matter is split off.
    pub fn add_text_transform<T: TextTransform + 'static>(&mut self, transform: T) {
        self.text_transforms.push(Box::new(transform));
    }

    /// Add an mdast rewrite, run before node transformation.
    pub fn add_ast_transform<T: AstTransform + 'static>(&mut self, transform: T) {
        self.ast_transforms.push(Box::new(transform));
    }

    /// Parse a document, keeping front-matter apart from the body.
    pub fn parse_parts(&self, input: &str) -> Result<Document, ShellguideError> {
        run(
            input,
            &self.options,
            &self.highlighter,
            &self.text_transforms,
            &self.ast_transforms,
        )
    }

    /// Parse a document into the renderer node list.
    pub fn parse(&self, input: &str) -> Result<Vec<Node>, ShellguideError> {
        self.parse_parts(input).map(Document::into_nodes)
    }
}

/// Parse raw document text into the renderer node list.
pub fn parse_document(
    input: &str,
    options: &ParseOptions,
    highlighter: &dyn Highlighter,
) -> Result<Vec<Node>, ShellguideError> {
    parse_document_parts(input, options, highlighter).map(Document::into_nodes)
}

/// Parse raw document text, keeping front-matter apart from the body.
pub fn parse_document_parts(
    input: &str,
    options: &ParseOptions,
    highlighter: &dyn Highlighter,
) -> Result<Document, ShellguideError> {
    run(input, options, highlighter, &[], &[])
}

fn run(
    input: &str,
    options: &ParseOptions,
    highlighter: &dyn Highlighter,
    text_transforms: &[Box<dyn TextTransform>],
    ast_transforms: &[Box<dyn AstTransform>],
) -> Result<Document, ShellguideError> {
    let (frontmatter, body) = if options.frontmatter {
        let split = split_frontmatter(input)?;
        if !split.attributes.is_empty() {
            log::debug!(
                "frontmatter with {} keys, body starts on line {}",
                split.attributes.len(),
                split.body_line
            );
        }
        (split.attributes, split.body)
    } else {
        (Map::new(), input)
    };

    let mut current = Cow::Borrowed(body);
    for transform in text_transforms {
        let next = transform.transform(current.as_ref());
        current = Cow::Owned(next.into_owned());
    }

    let mut root = lex(&current, options)?;
    for transform in ast_transforms {
        transform.transform(&mut root);
    }

    let nodes = Transformer::new(options, highlighter).transform(&root)?;
    Ok(Document { frontmatter, nodes })
}

/// Lex a markdown body into an mdast tree.
pub fn lex(body: &str, options: &ParseOptions) -> Result<mdast::Node, ShellguideError> {
    markdown::to_mdast(body, &options.to_markdown()).map_err(|err| {
        ShellguideError::MarkdownAdapter {
            message: err.to_string(),
            location: message_location(&err),
        }
    })
}

fn message_location(message: &Message) -> SourceLocation {
    match message.place.as_deref() {
        Some(Place::Point(point)) => SourceLocation::new(point.line, point.column),
        Some(Place::Position(position)) => {
            SourceLocation::new(position.start.line, position.start.column)
        }
        None => SourceLocation::new(1, 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::PlainHighlighter;
    use serde_json::json;

    fn parse(input: &str) -> Vec<Node> {
        parse_document(input, &ParseOptions::default(), &PlainHighlighter)
            .expect("document should parse")
    }

    #[test]
    fn frontmatter_node_leads_the_tree() {
        let nodes = parse("---\ntitle: Setup\n---\n# Setup\n");
        assert_eq!(nodes.len(), 2);
        assert_eq!(
            serde_json::to_value(&nodes[0]).unwrap(),
            json!({ "kind": "frontmatter", "data": { "title": "Setup" } })
        );
        assert_eq!(nodes[1].kind(), Some("heading"));
    }

    #[test]
    fn empty_frontmatter_contributes_nothing() {
        let nodes = parse("---\n---\nHello\n");
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].kind(), Some("paragraph"));
    }

    #[test]
    fn frontmatter_splitting_can_be_disabled() {
        let options = ParseOptions {
            frontmatter: false,
            ..Default::default()
        };
        let nodes = parse_document("---\n\ntext\n", &options, &PlainHighlighter).unwrap();
        assert_eq!(nodes[0].kind(), Some("hr"));
    }

    #[test]
    fn invalid_frontmatter_yaml_aborts() {
        let err = parse_document(
            "---\ntitle: [x\n---\nBody\n",
            &ParseOptions::default(),
            &PlainHighlighter,
        )
        .unwrap_err();
        assert!(matches!(err, ShellguideError::Frontmatter(_)), "{err:?}");
    }

    #[test]
    fn leading_thematic_break_is_not_frontmatter() {
        let nodes = parse("---\n\ntext\n");
        assert_eq!(
            serde_json::to_value(&nodes).unwrap(),
            json!([{ "kind": "hr" }, { "kind": "paragraph", "subnodes": ["text"] }])
        );
    }

    #[test]
    fn dashed_prose_is_not_frontmatter() {
        let nodes = parse("---\nIntro paragraph\n---\n");
        assert_eq!(
            serde_json::to_value(&nodes).unwrap(),
            json!([
                { "kind": "hr" },
                { "kind": "heading", "depth": 2, "subnodes": ["Intro paragraph"] }
            ])
        );
    }

    #[test]
    fn parts_keep_frontmatter_separate() {
        let document = parse_document_parts(
            "---\ndraft: true\n---\ntext\n",
            &ParseOptions::default(),
            &PlainHighlighter,
        )
        .unwrap();
        assert_eq!(document.frontmatter["draft"], true);
        assert_eq!(document.nodes.len(), 1);
    }

    fn expand_version(input: &str) -> Cow<'_, str> {
        Cow::Owned(input.replace("{{version}}", "1.2.3"))
    }

    #[test]
    fn pipeline_runs_text_and_ast_transforms() {
        let mut pipeline = ParserPipeline::new(ParseOptions::default(), PlainHighlighter);
        assert_eq!(pipeline.options(), &ParseOptions::default());
        pipeline.add_text_transform(expand_version);
        pipeline.add_ast_transform(|root: &mut mdast::Node| {
            if let Some(children) = root.children_mut() {
                children.retain(|child| !matches!(child, mdast::Node::ThematicBreak(_)));
            }
        });

        let nodes = pipeline.parse("Install {{version}}\n\n***\n").unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(
            serde_json::to_value(&nodes[0]).unwrap(),
            json!({ "kind": "paragraph", "subnodes": ["Install 1.2.3"] })
        );
    }

    #[test]
    fn gfm_can_be_disabled() {
        let options = ParseOptions {
            gfm: false,
            ..Default::default()
        };
        let nodes = parse_document("~~gone~~\n", &options, &PlainHighlighter).unwrap();
        assert_eq!(
            serde_json::to_value(&nodes[0]).unwrap(),
            json!({ "kind": "paragraph", "subnodes": ["~~gone~~"] })
        );
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let options: ParseOptions =
            serde_json::from_value(json!({ "alert_case_insensitive": true })).unwrap();
        assert!(options.gfm);
        assert!(options.frontmatter);
        assert!(options.alert_case_insensitive);
        assert_eq!(options.max_depth, None);
    }
}
