//! Tokenizer for shell transcript code blocks.
//!
//! A transcript documents a terminal session as repeating
//! description → command → output sections:
//!
//! ```text
//! # List current folder
//! ls
//! # LICENSE         node_modules
//! # package.json    README.md
//!
//! # Show disk usage
//! du -sh .
//! # 42M    .
//! ```
//!
//! Commented lines (`#` alone, or `# ` followed by text) are descriptions
//! until the first uncommented line, which starts the command. The next
//! commented line starts the output. A single blank line after an output
//! starts the next description. Anything else is rejected.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Code fence languages treated as shell transcripts.
pub const SHELL_LANGUAGES: [&str; 6] = ["bash", "console", "fish", "shell", "sh", "zsh"];

/// Returns true when a fence language should be tokenized as a transcript.
pub fn is_shell_language(language: &str) -> bool {
    SHELL_LANGUAGES.contains(&language)
}

/// Section kind of a transcript token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShellTokenKind {
    /// Human-readable commentary preceding a command.
    Description,
    /// The command(s) actually run.
    Command,
    /// Captured output of the command.
    Output,
}

impl ShellTokenKind {
    /// Lowercase name used in error messages and serialized output.
    pub fn as_str(self) -> &'static str {
        match self {
            ShellTokenKind::Description => "description",
            ShellTokenKind::Command => "command",
            ShellTokenKind::Output => "output",
        }
    }
}

impl fmt::Display for ShellTokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One section of a transcript with its lines.
///
/// Description and output lines have the `# ` prefix removed and are
/// trimmed on both sides. Command lines keep their leading whitespace so
/// continuation lines of multi-line commands stay indented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShellToken {
    /// Section kind.
    pub kind: ShellTokenKind,
    /// Lines in source order.
    pub lines: Vec<String>,
}

impl ShellToken {
    /// Create a token holding a single line.
    pub fn new(kind: ShellTokenKind, line: impl Into<String>) -> Self {
        Self {
            kind,
            lines: vec![line.into()],
        }
    }

    fn empty(kind: ShellTokenKind) -> Self {
        Self {
            kind,
            lines: Vec::new(),
        }
    }
}

/// Where an unexpected blank line sits relative to the current token's
/// first line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyLinePosition {
    /// The current token has no lines yet.
    Before,
    /// The current token already holds at least one line.
    After,
}

impl fmt::Display for EmptyLinePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmptyLinePosition::Before => f.write_str("before"),
            EmptyLinePosition::After => f.write_str("after"),
        }
    }
}

/// Grammar violations in a transcript block.
///
/// `line` fields are 1-based and count every line of the block as written,
/// including leading blank lines that the tokenizer skips.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShellBlockError {
    /// The first non-blank line is not `#` or `# ...`.
    #[error("missing leading comment")]
    MissingLeadingComment,
    /// A line starts with `#` directly followed by text.
    #[error("ambiguous comment line (line {line})")]
    AmbiguousCommentLine {
        /// Offending line.
        line: usize,
    },
    /// A blank line outside of an output section.
    #[error("unexpected empty line {position} {kind} (line {line})")]
    UnexpectedEmptyLine {
        /// Position relative to the current token's first line.
        position: EmptyLinePosition,
        /// Kind of the token being accumulated.
        kind: ShellTokenKind,
        /// Offending line.
        line: usize,
    },
    /// An uncommented line inside an output section.
    #[error("unexpected uncommented line in {kind} (line {line})")]
    UnexpectedUncommentedLine {
        /// Kind of the token being accumulated.
        kind: ShellTokenKind,
        /// Offending line.
        line: usize,
    },
    /// The block ends on something other than an output section.
    #[error("trailing token is {kind}, expected output")]
    TrailingToken {
        /// Kind of the last token.
        kind: ShellTokenKind,
    },
}

impl ShellBlockError {
    /// Token kind named by the error, if any.
    pub fn token_kind(&self) -> Option<ShellTokenKind> {
        match self {
            ShellBlockError::UnexpectedEmptyLine { kind, .. }
            | ShellBlockError::UnexpectedUncommentedLine { kind, .. }
            | ShellBlockError::TrailingToken { kind } => Some(*kind),
            ShellBlockError::MissingLeadingComment
            | ShellBlockError::AmbiguousCommentLine { .. } => None,
        }
    }
}

enum Line<'a> {
    Comment(&'a str),
    AmbiguousComment,
    Blank,
    Plain(&'a str),
}

fn classify(line: &str) -> Line<'_> {
    if line.is_empty() {
        Line::Blank
    } else if line == "#" {
        Line::Comment("")
    } else if let Some(text) = line.strip_prefix("# ") {
        Line::Comment(text.trim())
    } else if line.starts_with('#') {
        Line::AmbiguousComment
    } else {
        Line::Plain(line)
    }
}

/// Split a transcript block into description, command and output tokens.
///
/// Returns an empty list for blank input. Otherwise the result starts with
/// a description and ends with an output.
pub fn parse_shell_code_block(text: &str) -> Result<Vec<ShellToken>, ShellBlockError> {
    // `split('\n')` plus `trim_end` handles both `\n` and `\r\n` endings.
    let numbered: Vec<(usize, &str)> = text
        .split('\n')
        .map(str::trim_end)
        .enumerate()
        .map(|(index, line)| (index + 1, line))
        .collect();

    let Some(start) = numbered.iter().position(|(_, line)| !line.is_empty()) else {
        return Ok(Vec::new());
    };
    let end = numbered
        .iter()
        .rposition(|(_, line)| !line.is_empty())
        .map_or(numbered.len(), |last| last + 1);
    let lines = &numbered[start..end];

    let Line::Comment(first) = classify(lines[0].1) else {
        return Err(ShellBlockError::MissingLeadingComment);
    };

    let mut tokens = Vec::new();
    let mut current = ShellToken::new(ShellTokenKind::Description, first);

    for &(number, line) in &lines[1..] {
        match classify(line) {
            Line::Comment(text) => {
                if current.kind == ShellTokenKind::Command {
                    let output = ShellToken::new(ShellTokenKind::Output, text);
                    tokens.push(std::mem::replace(&mut current, output));
                } else {
                    current.lines.push(text.to_string());
                }
            }
            Line::AmbiguousComment => {
                return Err(ShellBlockError::AmbiguousCommentLine { line: number });
            }
            Line::Blank => {
                if current.kind != ShellTokenKind::Output {
                    let position = if current.lines.is_empty() {
                        EmptyLinePosition::Before
                    } else {
                        EmptyLinePosition::After
                    };
                    return Err(ShellBlockError::UnexpectedEmptyLine {
                        position,
                        kind: current.kind,
                        line: number,
                    });
                }
                let description = ShellToken::empty(ShellTokenKind::Description);
                tokens.push(std::mem::replace(&mut current, description));
            }
            Line::Plain(text) => match current.kind {
                ShellTokenKind::Description => {
                    let command = ShellToken::new(ShellTokenKind::Command, text);
                    tokens.push(std::mem::replace(&mut current, command));
                }
                ShellTokenKind::Command => current.lines.push(text.to_string()),
                ShellTokenKind::Output => {
                    return Err(ShellBlockError::UnexpectedUncommentedLine {
                        kind: current.kind,
                        line: number,
                    });
                }
            },
        }
    }

    if current.kind != ShellTokenKind::Output {
        return Err(ShellBlockError::TrailingToken { kind: current.kind });
    }
    tokens.push(current);

    Ok(tokens)
}
