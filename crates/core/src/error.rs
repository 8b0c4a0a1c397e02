use crate::frontmatter::FrontmatterError;
use crate::highlight::HighlightError;
use crate::shell::{ShellBlockError, ShellTokenKind};
use thiserror::Error;

/// Source location information for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
}

impl SourceLocation {
    /// Create a new source location
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Start of an mdast node, or the document start when the lexer
    /// did not record a position.
    pub fn of(position: Option<&markdown::unist::Position>) -> Self {
        match position {
            Some(position) => Self::new(position.start.line, position.start.column),
            None => Self::new(1, 1),
        }
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Errors that abort parsing of a document.
///
/// Every variant is fatal for the current document: no partial tree is
/// ever returned alongside one of these.
#[derive(Debug, Error)]
pub enum ShellguideError {
    /// A shell-language code block violated the transcript grammar.
    #[error("Malformed shell block at {location}: {source}")]
    MalformedShellBlock {
        /// The grammar rule that failed.
        #[source]
        source: ShellBlockError,
        /// Start of the fenced code block.
        location: SourceLocation,
    },
    /// The lexer produced a token kind the transformer does not handle.
    #[error("Unsupported token: {0}")]
    UnsupportedToken(String),
    /// A blockquote starts with `[!LABEL]` where LABEL is not a known severity.
    #[error("Invalid alert severity: {0}")]
    InvalidAlertSeverity(String),
    /// A reference link or image points at a missing definition.
    #[error("Unresolved reference: {0}")]
    UnresolvedReference(String),
    /// Nesting exceeded the configured `max_depth`.
    #[error("Nesting deeper than {limit} levels")]
    NestingTooDeep {
        /// Configured limit.
        limit: usize,
    },
    /// The highlight adapter failed on a code block.
    #[error(transparent)]
    Highlight(#[from] HighlightError),
    /// The front-matter block could not be split or parsed.
    #[error(transparent)]
    Frontmatter(#[from] FrontmatterError),
    /// markdown-rs parser error surfaced through the adapter.
    #[error("Parse error at {location}: {message}")]
    MarkdownAdapter {
        /// Error message
        message: String,
        /// Source location
        location: SourceLocation,
    },
}

impl ShellguideError {
    /// Wrap a tokenizer failure with the location of its code block.
    pub fn malformed_shell_block(source: ShellBlockError, location: SourceLocation) -> Self {
        Self::MalformedShellBlock { source, location }
    }

    /// Create an unsupported token error for the given lexer token kind.
    pub fn unsupported_token(kind: impl Into<String>) -> Self {
        Self::UnsupportedToken(kind.into())
    }

    /// Kind of the transcript token involved, when this is a shell block error
    /// that names one.
    pub fn shell_token_kind(&self) -> Option<ShellTokenKind> {
        match self {
            Self::MalformedShellBlock { source, .. } => source.token_kind(),
            _ => None,
        }
    }
}
