#![deny(missing_docs)]
//! syntect-backed [`Highlighter`] for shellguide.
//!
//! The highlighter owns its syntax definitions. Nothing is registered
//! globally, so independent highlighters can run side by side.

use shellguide_core::{HighlightError, HighlightSpan, Highlighter, push_span};
use syntect::easy::ScopeRangeIterator;
use syntect::parsing::{ParseState, ScopeStack, SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

/// Languages highlighted as bash when syntect has no syntax of that name.
const BASH_ALIASES: [&str; 4] = ["console", "shell", "sh", "zsh"];

/// Languages that are never tokenized.
const PLAIN_LANGUAGES: [&str; 3] = ["plaintext", "text", "txt"];

/// Highlights code with syntect scope names.
pub struct SyntectHighlighter {
    syntaxes: SyntaxSet,
}

impl SyntectHighlighter {
    /// Create a highlighter with syntect's bundled syntaxes.
    pub fn new() -> Self {
        Self::with_syntax_set(SyntaxSet::load_defaults_newlines())
    }

    /// Create a highlighter from a caller-provided syntax set.
    ///
    /// The set must be built for lines that keep their newlines.
    pub fn with_syntax_set(syntaxes: SyntaxSet) -> Self {
        Self { syntaxes }
    }

    fn find_syntax(&self, language: &str) -> Option<&SyntaxReference> {
        if PLAIN_LANGUAGES.contains(&language) {
            return None;
        }
        self.syntaxes.find_syntax_by_token(language).or_else(|| {
            BASH_ALIASES
                .contains(&language)
                .then(|| self.syntaxes.find_syntax_by_token("bash"))
                .flatten()
        })
    }
}

impl Default for SyntectHighlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SyntectHighlighter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyntectHighlighter")
            .field("syntaxes", &self.syntaxes.syntaxes().len())
            .finish()
    }
}

impl Highlighter for SyntectHighlighter {
    fn highlight(&self, code: &str, language: &str) -> Result<Vec<HighlightSpan>, HighlightError> {
        let mut spans = Vec::new();
        let Some(syntax) = self.find_syntax(language) else {
            log::debug!("no syntax for language {language:?}, emitting plain text");
            push_span(&mut spans, code, None);
            return Ok(spans);
        };

        let mut state = ParseState::new(syntax);
        let mut stack = ScopeStack::new();
        for line in LinesWithEndings::from(code) {
            let ops = state
                .parse_line(line, &self.syntaxes)
                .map_err(|err| HighlightError::new(language, err.to_string()))?;
            for (range, op) in ScopeRangeIterator::new(&ops, line) {
                stack
                    .apply(op)
                    .map_err(|err| HighlightError::new(language, err.to_string()))?;
                if range.is_empty() {
                    continue;
                }
                let scope = stack.as_slice().last().map(|scope| scope.build_string());
                push_span(&mut spans, &line[range], scope.as_deref());
            }
        }

        Ok(spans)
    }
}
