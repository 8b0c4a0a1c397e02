//! Highlight adapter seam.
//!
//! The transformer never reaches for a shared highlighter. Callers hand in
//! a [`Highlighter`] value and every code block is highlighted through a
//! plain method call on it.

use serde::Serialize;
use thiserror::Error;

/// A run of source text with an optional scope name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HighlightSpan {
    /// Source text covered by the span, newlines included.
    pub text: String,
    /// Innermost scope (e.g. `keyword.control.shell`), `None` for plain text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl HighlightSpan {
    /// Create an unscoped span.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            scope: None,
        }
    }

    /// Create a span tagged with a scope.
    pub fn scoped(text: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            scope: Some(scope.into()),
        }
    }
}

/// Failure reported by a highlight adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Highlight error ({language}): {message}")]
pub struct HighlightError {
    /// Language the adapter was asked to highlight.
    pub language: String,
    /// Adapter-specific message.
    pub message: String,
}

impl HighlightError {
    /// Create a highlight error.
    pub fn new(language: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            message: message.into(),
        }
    }
}

/// Turns code text into highlight spans.
pub trait Highlighter {
    /// Highlight `code` written in `language`.
    ///
    /// Concatenating the returned spans' text must reproduce `code`.
    fn highlight(&self, code: &str, language: &str) -> Result<Vec<HighlightSpan>, HighlightError>;
}

impl<F> Highlighter for F
where
    F: Fn(&str, &str) -> Result<Vec<HighlightSpan>, HighlightError>,
{
    fn highlight(&self, code: &str, language: &str) -> Result<Vec<HighlightSpan>, HighlightError> {
        (self)(code, language)
    }
}

/// Highlighter that performs no tokenization.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainHighlighter;

impl Highlighter for PlainHighlighter {
    fn highlight(&self, code: &str, _language: &str) -> Result<Vec<HighlightSpan>, HighlightError> {
        if code.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![HighlightSpan::plain(code)])
    }
}

/// Append `text` to `spans`, extending the last span when its scope matches.
pub fn push_span(spans: &mut Vec<HighlightSpan>, text: &str, scope: Option<&str>) {
    if text.is_empty() {
        return;
    }
    if let Some(last) = spans.last_mut()
        && last.scope.as_deref() == scope
    {
        last.text.push_str(text);
        return;
    }
    spans.push(HighlightSpan {
        text: text.to_string(),
        scope: scope.map(str::to_string),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_highlighter_returns_single_span() {
        let spans = PlainHighlighter.highlight("fn main() {}", "rust").unwrap();
        assert_eq!(spans, vec![HighlightSpan::plain("fn main() {}")]);
        assert!(PlainHighlighter.highlight("", "rust").unwrap().is_empty());
    }

    #[test]
    fn closures_are_highlighters() {
        let upper = |code: &str, _: &str| -> Result<Vec<HighlightSpan>, HighlightError> {
            Ok(vec![HighlightSpan::scoped(code, "upper")])
        };
        let spans = upper.highlight("ls", "bash").unwrap();
        assert_eq!(spans[0].scope.as_deref(), Some("upper"));
    }

    #[test]
    fn push_span_merges_equal_scopes() {
        let mut spans = Vec::new();
        push_span(&mut spans, "echo", Some("support.function"));
        push_span(&mut spans, " ", None);
        push_span(&mut spans, "", Some("ignored"));
        push_span(&mut spans, "hi", None);
        push_span(&mut spans, "!", Some("keyword"));
        assert_eq!(
            spans,
            vec![
                HighlightSpan::scoped("echo", "support.function"),
                HighlightSpan::plain(" hi"),
                HighlightSpan::scoped("!", "keyword"),
            ]
        );
    }

    #[test]
    fn unscoped_spans_omit_scope_field() {
        let value = serde_json::to_value(HighlightSpan::plain("x")).unwrap();
        assert_eq!(value, serde_json::json!({ "text": "x" }));
    }
}
