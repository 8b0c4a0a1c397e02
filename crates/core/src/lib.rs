#![deny(missing_docs)]
//! shellguide core: turns command-line guide markdown into a typed node tree.
//!
//! Raw text goes through the front-matter splitter, markdown-rs lexing and
//! the node transformer. Shell-language code blocks are parsed as
//! description/command/output transcripts along the way.

/// Error types for the parsing pipeline.
pub mod error;
/// YAML front-matter splitting.
pub mod frontmatter;
/// Highlight adapter seam.
pub mod highlight;
/// Typed document tree.
pub mod node;
/// Parse options and pipeline.
pub mod parse;
/// Shell transcript tokenizer.
pub mod shell;
/// mdast to node transformer.
pub mod transform;

pub use error::{ShellguideError, SourceLocation};
pub use frontmatter::{FrontmatterError, FrontmatterSplit, split_frontmatter};
pub use highlight::{HighlightError, HighlightSpan, Highlighter, PlainHighlighter, push_span};
pub use node::{Align, CodeBody, Element, Node, Severity, ShellSection};
pub use parse::{
    AstTransform, Document, ParseOptions, ParserPipeline, TextTransform, lex, parse_document,
    parse_document_parts,
};
pub use shell::{
    EmptyLinePosition, SHELL_LANGUAGES, ShellBlockError, ShellToken, ShellTokenKind,
    is_shell_language, parse_shell_code_block,
};
pub use transform::{DEFAULT_LANGUAGE, Transformer, token_kind};
