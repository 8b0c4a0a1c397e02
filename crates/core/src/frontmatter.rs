use serde_json::{Map, Value as JsonValue};
use thiserror::Error;

/// Attributes and body of a document after splitting off front-matter.
#[derive(Debug, Clone, PartialEq)]
pub struct FrontmatterSplit<'a> {
    /// Front-matter mapping; empty when the document has none.
    pub attributes: Map<String, JsonValue>,
    /// Markdown after the closing fence (the whole input when there is no block).
    pub body: &'a str,
    /// 1-based line of the input on which `body` starts.
    pub body_line: usize,
}

/// Errors emitted while parsing front-matter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrontmatterError {
    /// YAML between two fences failed to parse.
    #[error("Frontmatter parse error: {0}")]
    Parse(String),
}

/// Split a leading `---` delimited YAML block from `input`.
///
/// A byte-order mark and blank lines before the opening fence are skipped.
/// Any other first line means the document has no front-matter. So does an
/// opening fence that is never closed, or a closed block whose YAML is not a
/// mapping: both are ordinary markdown (thematic breaks, setext headings).
pub fn split_frontmatter(input: &str) -> Result<FrontmatterSplit<'_>, FrontmatterError> {
    let text = input.strip_prefix('\u{feff}').unwrap_or(input);
    let mut lines = Lines::new(text);

    let opening = loop {
        match lines.next() {
            Some(line) if line.text.trim().is_empty() => continue,
            Some(line) if is_fence(line.text) => break line,
            _ => return Ok(no_frontmatter(text)),
        }
    };

    let block_start = opening.end;
    for line in lines.by_ref() {
        if is_fence(line.text) {
            let Some(attributes) = parse_attributes(&text[block_start..line.start])? else {
                break;
            };
            return Ok(FrontmatterSplit {
                attributes,
                body: &text[line.end..],
                body_line: line.number + 1,
            });
        }
    }

    Ok(no_frontmatter(text))
}

fn no_frontmatter(text: &str) -> FrontmatterSplit<'_> {
    FrontmatterSplit {
        attributes: Map::new(),
        body: text,
        body_line: 1,
    }
}

/// `None` when the block is valid YAML but not a mapping.
fn parse_attributes(block: &str) -> Result<Option<Map<String, JsonValue>>, FrontmatterError> {
    if block.trim().is_empty() {
        return Ok(Some(Map::new()));
    }

    let yaml: serde_yaml::Value =
        serde_yaml::from_str(block).map_err(|err| FrontmatterError::Parse(err.to_string()))?;
    let json =
        serde_json::to_value(yaml).map_err(|err| FrontmatterError::Parse(err.to_string()))?;

    match json {
        JsonValue::Null => Ok(Some(Map::new())),
        JsonValue::Object(map) => Ok(Some(map)),
        _ => Ok(None),
    }
}

fn is_fence(line: &str) -> bool {
    line.trim_end_matches('\r') == "---"
}

struct Line<'a> {
    text: &'a str,
    number: usize,
    start: usize,
    end: usize,
}

/// Line iterator that remembers byte offsets, newline excluded from `text`.
struct Lines<'a> {
    input: &'a str,
    cursor: usize,
    number: usize,
}

impl<'a> Lines<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            cursor: 0,
            number: 0,
        }
    }
}

impl<'a> Iterator for Lines<'a> {
    type Item = Line<'a>;

    fn next(&mut self) -> Option<Line<'a>> {
        if self.cursor >= self.input.len() {
            return None;
        }
        let start = self.cursor;
        let rest = &self.input[start..];
        let (text, end) = match rest.find('\n') {
            Some(pos) => (&rest[..pos], start + pos + 1),
            None => (rest, self.input.len()),
        };
        self.cursor = end;
        self.number += 1;
        Some(Line {
            text,
            number: self.number,
            start,
            end,
        })
    }
}
