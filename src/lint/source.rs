//! Positional outline of block-style YAML source.
//!
//! `serde_yaml` reports whether a document is valid YAML and what its values
//! are, but it discards the formatting the style rules care about: where a
//! key sits, how its value was quoted, how many spaces follow the colon and
//! how many blank lines precede a block. This module re-reads the raw text of
//! a document that is already known to be valid and records that metadata as
//! a tree of [`RawNode`]s.

use super::types::Position;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Quoting style observed for a scalar in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuoteStyle {
    /// Plain, unquoted scalar.
    Unquoted,
    /// `"double quoted"` scalar.
    Double,
    /// `'single quoted'` scalar.
    Single,
    /// `>` folded block scalar.
    Folded,
    /// `|` literal block scalar.
    Literal,
    /// Inline `{ ... }` or `[ ... ]` flow collection kept as raw text.
    Flow,
}

impl QuoteStyle {
    /// Whether the scalar is wrapped in quote characters.
    pub fn is_quoted(&self) -> bool {
        matches!(self, QuoteStyle::Double | QuoteStyle::Single)
    }
}

impl std::fmt::Display for QuoteStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuoteStyle::Unquoted => write!(f, "unquoted"),
            QuoteStyle::Double => write!(f, "double"),
            QuoteStyle::Single => write!(f, "single"),
            QuoteStyle::Folded => write!(f, "folded-scalar"),
            QuoteStyle::Literal => write!(f, "literal-scalar"),
            QuoteStyle::Flow => write!(f, "flow"),
        }
    }
}

/// Whitespace observed around the colon of a `key: value` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KeySpacing {
    /// Spaces between the key and the colon.
    pub before_colon: usize,
    /// Spaces between the colon and a value on the same line.
    /// `None` when the value starts on a following line.
    pub after_colon: Option<usize>,
    /// Whitespace after the colon includes something other than spaces.
    pub tab_after_colon: bool,
}

/// A scalar token as written in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawScalar {
    /// Token text including quotes or block header.
    pub raw: String,
    /// Decoded content.
    pub text: String,
    /// Observed quoting style.
    pub style: QuoteStyle,
    /// Position of the first character of the token.
    pub position: Position,
    /// Last line occupied by the token.
    pub end_line: usize,
    /// Explicit tag such as `!vault`.
    pub tag: Option<String>,
}

/// One `key: value` pair of a block mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub key: String,
    pub position: Position,
    pub spacing: KeySpacing,
    pub value: RawNode,
    pub end_line: usize,
}

/// One `- item` of a block sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawItem {
    /// Position of the dash.
    pub position: Position,
    pub node: RawNode,
    pub end_line: usize,
}

/// Node of the positional outline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawNode {
    Mapping {
        position: Position,
        entries: Vec<RawEntry>,
    },
    Sequence {
        position: Position,
        items: Vec<RawItem>,
    },
    Scalar(RawScalar),
    Empty,
}

impl RawNode {
    /// Entries of a block mapping.
    pub fn entries(&self) -> Option<&[RawEntry]> {
        match self {
            RawNode::Mapping { entries, .. } => Some(entries),
            _ => None,
        }
    }

    /// Scalar payload, if any.
    pub fn as_scalar(&self) -> Option<&RawScalar> {
        match self {
            RawNode::Scalar(s) => Some(s),
            _ => None,
        }
    }
}

/// Line-level view of the source text.
#[derive(Debug, Clone, Default)]
pub struct SourceMap {
    lines: Vec<String>,
}

impl SourceMap {
    /// Index the raw source.
    pub fn new(source: &str) -> Self {
        Self {
            lines: source
                .lines()
                .map(|l| l.trim_end_matches('\r').to_string())
                .collect(),
        }
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the source has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Get a line by number (1-indexed).
    pub fn line(&self, number: usize) -> Option<&str> {
        if number == 0 {
            return None;
        }
        self.lines.get(number - 1).map(String::as_str)
    }

    /// Iterate over `(line number, text)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.lines
            .iter()
            .enumerate()
            .map(|(i, l)| (i + 1, l.as_str()))
    }

    /// Count blank lines between `line` and the previous content line.
    ///
    /// Comment lines in between are skipped without ending the count.
    pub fn blank_lines_before(&self, line: usize) -> usize {
        let mut count = 0;
        let mut n = line.saturating_sub(1);
        while let Some(text) = self.line(n) {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                count += 1;
            } else if !trimmed.starts_with('#') {
                break;
            }
            n -= 1;
        }
        count
    }
}

/// Result of scanning a document.
#[derive(Debug, Clone)]
pub struct Outline {
    pub root: RawNode,
    /// Continuation lines of block scalars, multi-line quoted scalars and
    /// flow collections, whose indentation is not structural.
    pub verbatim: Vec<RangeInclusive<usize>>,
}

#[derive(Debug, Clone)]
struct LogicalLine {
    number: usize,
    indent: usize,
    text: String,
}

#[derive(Debug)]
struct KeySplit {
    key: String,
    colon: usize,
    before_colon: usize,
}

/// Scanner producing an [`Outline`] from block-style YAML.
pub struct OutlineScanner {
    lines: Vec<LogicalLine>,
    idx: usize,
    last_line: usize,
    verbatim: Vec<RangeInclusive<usize>>,
}

impl OutlineScanner {
    /// Scan a document that has already been validated as YAML.
    pub fn scan(source: &str) -> Outline {
        let mut scanner = Self::new(source);
        let root = scanner.parse_node();
        Outline {
            root,
            verbatim: scanner.verbatim,
        }
    }

    fn new(source: &str) -> Self {
        let mut lines = Vec::new();
        for (i, line) in source.lines().enumerate() {
            let line = line.trim_end();
            let trimmed = line.trim_start();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let indent = line.len() - line.trim_start_matches(' ').len();
            if indent == 0 && is_document_marker(trimmed) {
                continue;
            }
            lines.push(LogicalLine {
                number: i + 1,
                indent,
                text: line[indent..].to_string(),
            });
        }

        Self {
            lines,
            idx: 0,
            last_line: 0,
            verbatim: Vec::new(),
        }
    }

    fn peek(&self) -> Option<&LogicalLine> {
        self.lines.get(self.idx)
    }

    fn advance(&mut self) {
        if let Some(line) = self.lines.get(self.idx) {
            self.last_line = line.number;
        }
        self.idx += 1;
    }

    fn mark_verbatim(&mut self, start: usize, end: usize) {
        if end > start {
            self.verbatim.push((start + 1)..=end);
        }
    }

    fn parse_node(&mut self) -> RawNode {
        let Some(line) = self.peek() else {
            return RawNode::Empty;
        };
        let indent = line.indent;

        if is_sequence_item(&line.text) {
            self.parse_sequence(indent)
        } else if split_key(&line.text).is_some() {
            self.parse_mapping(indent)
        } else {
            let number = line.number;
            let text = line.text.clone();
            self.advance();
            self.parse_value(&text, number, indent + 1, indent.saturating_sub(1))
        }
    }

    fn parse_sequence(&mut self, indent: usize) -> RawNode {
        let position = match self.peek() {
            Some(line) => Position::new(line.number, indent + 1),
            None => return RawNode::Empty,
        };
        let mut items = Vec::new();

        while let Some(line) = self.peek() {
            if line.indent != indent || !is_sequence_item(&line.text) {
                break;
            }
            let number = line.number;
            let rest = line.text[1..].to_string();
            let spaces = rest.len() - rest.trim_start().len();
            let content = rest.trim_start().to_string();
            let content_indent = indent + 1 + spaces;

            let node = if content.is_empty() || content.starts_with('#') {
                self.advance();
                match self.peek() {
                    Some(next) if next.indent > indent => self.parse_node(),
                    _ => RawNode::Empty,
                }
            } else if is_sequence_item(&content) || split_key(&content).is_some() {
                // Re-read the remainder of the line as if it started at its own column.
                self.lines[self.idx] = LogicalLine {
                    number,
                    indent: content_indent,
                    text: content,
                };
                self.parse_node()
            } else {
                self.advance();
                self.parse_value(&content, number, content_indent + 1, indent)
            };

            items.push(RawItem {
                position: Position::new(number, indent + 1),
                node,
                end_line: self.last_line,
            });
        }

        RawNode::Sequence { position, items }
    }

    fn parse_mapping(&mut self, indent: usize) -> RawNode {
        let position = match self.peek() {
            Some(line) => Position::new(line.number, indent + 1),
            None => return RawNode::Empty,
        };
        let mut entries = Vec::new();

        while let Some(line) = self.peek() {
            if line.indent != indent {
                break;
            }
            let Some(split) = split_key(&line.text) else {
                break;
            };
            let number = line.number;
            let text = line.text.clone();
            self.advance();

            let rest = &text[split.colon + 1..];
            let value_text = rest.trim_start();
            let gap = &rest[..rest.len() - value_text.len()];
            let after = gap.len();

            let (value, after_colon) = if value_text.is_empty() || value_text.starts_with('#') {
                let value = match self.peek() {
                    Some(next) if next.indent > indent => self.parse_node(),
                    Some(next) if next.indent == indent && is_sequence_item(&next.text) => {
                        self.parse_sequence(indent)
                    }
                    _ => RawNode::Empty,
                };
                (value, None)
            } else {
                let column = indent + split.colon + after + 2;
                (
                    self.parse_value(value_text, number, column, indent),
                    Some(after),
                )
            };

            entries.push(RawEntry {
                key: split.key,
                position: Position::new(number, indent + 1),
                spacing: KeySpacing {
                    before_colon: split.before_colon,
                    after_colon,
                    tab_after_colon: after_colon.is_some() && gap.chars().any(|c| c != ' '),
                },
                value,
                end_line: self.last_line,
            });
        }

        RawNode::Mapping { position, entries }
    }

    /// Parse a value that starts on `line` at `column`; continuation lines
    /// must be indented deeper than `parent_indent`.
    fn parse_value(&mut self, text: &str, line: usize, column: usize, parent_indent: usize) -> RawNode {
        let mut text = text;
        let mut column = column;
        let mut tag = None;

        while text.starts_with('!') || text.starts_with('&') {
            let end = text.find(char::is_whitespace).unwrap_or(text.len());
            if text.starts_with('!') {
                tag = Some(text[..end].to_string());
            }
            let rest = text[end..].trim_start();
            column += text.len() - rest.len();
            text = rest;
        }

        if text.is_empty() || text.starts_with('#') {
            return match self.peek() {
                Some(next) if next.indent > parent_indent => self.parse_node(),
                _ => RawNode::Empty,
            };
        }

        let position = Position::new(line, column);
        let scalar = match text.as_bytes()[0] {
            b'|' | b'>' => self.block_scalar(text, position, parent_indent),
            b'"' | b'\'' => self.quoted_scalar(text, position),
            b'{' | b'[' => self.flow_collection(text, position),
            _ => self.plain_scalar(text, position, parent_indent),
        };

        RawNode::Scalar(RawScalar { tag, ..scalar })
    }

    fn block_scalar(&mut self, header: &str, position: Position, parent_indent: usize) -> RawScalar {
        let style = if header.starts_with('|') {
            QuoteStyle::Literal
        } else {
            QuoteStyle::Folded
        };
        let mut body = Vec::new();
        while let Some(next) = self.peek() {
            if next.indent <= parent_indent {
                break;
            }
            body.push(next.text.clone());
            self.advance();
        }
        let end_line = self.last_line.max(position.line);
        self.mark_verbatim(position.line, end_line);

        let separator = if style == QuoteStyle::Literal { "\n" } else { " " };
        RawScalar {
            raw: strip_comment(header).to_string(),
            text: body.join(separator),
            style,
            position,
            end_line,
            tag: None,
        }
    }

    fn quoted_scalar(&mut self, text: &str, position: Position) -> RawScalar {
        let quote = text.as_bytes()[0];
        let mut buf = text.to_string();
        let close = loop {
            if let Some(close) = find_closing_quote(&buf, quote) {
                break Some(close);
            }
            let Some(next) = self.peek() else {
                break None;
            };
            buf.push(' ');
            buf.push_str(next.text.trim());
            self.advance();
        };
        let end_line = self.last_line.max(position.line);
        self.mark_verbatim(position.line, end_line);

        // Unterminated quotes keep the whole remaining text.
        let raw = match close {
            Some(close) => buf[..=close].to_string(),
            None => buf,
        };
        let inner = raw
            .get(1..)
            .map(|rest| rest.strip_suffix(quote as char).unwrap_or(rest))
            .unwrap_or("");
        let (text, style) = if quote == b'"' {
            (unescape_double(inner), QuoteStyle::Double)
        } else {
            (inner.replace("''", "'"), QuoteStyle::Single)
        };

        RawScalar {
            raw,
            text,
            style,
            position,
            end_line,
            tag: None,
        }
    }

    fn flow_collection(&mut self, text: &str, position: Position) -> RawScalar {
        let mut buf = text.to_string();
        while flow_depth(&buf) > 0 {
            let Some(next) = self.peek() else {
                break;
            };
            buf.push(' ');
            buf.push_str(next.text.trim());
            self.advance();
        }
        let end_line = self.last_line.max(position.line);
        self.mark_verbatim(position.line, end_line);

        let raw = strip_comment(&buf).to_string();
        RawScalar {
            text: raw.clone(),
            raw,
            style: QuoteStyle::Flow,
            position,
            end_line,
            tag: None,
        }
    }

    fn plain_scalar(&mut self, text: &str, position: Position, parent_indent: usize) -> RawScalar {
        let mut value = strip_comment(text).to_string();
        while let Some(next) = self.peek() {
            if next.indent <= parent_indent {
                break;
            }
            value.push(' ');
            value.push_str(strip_comment(next.text.trim()));
            self.advance();
        }
        let end_line = self.last_line.max(position.line);
        self.mark_verbatim(position.line, end_line);

        RawScalar {
            raw: value.clone(),
            text: value,
            style: QuoteStyle::Unquoted,
            position,
            end_line,
            tag: None,
        }
    }
}

fn is_document_marker(text: &str) -> bool {
    text == "---"
        || text == "..."
        || text.starts_with("--- ")
        || text.starts_with("%YAML")
        || text.starts_with("%TAG")
}

fn is_sequence_item(text: &str) -> bool {
    text == "-" || text.starts_with("- ")
}

/// Split `key: ...` into its key and colon offset.
fn split_key(text: &str) -> Option<KeySplit> {
    let first = *text.as_bytes().first()?;
    match first {
        b'"' | b'\'' => {
            let close = find_closing_quote(text, first)?;
            let after = &text[close + 1..];
            let trimmed = after.trim_start_matches(' ');
            if !trimmed.starts_with(':') {
                return None;
            }
            let colon = close + 1 + (after.len() - trimmed.len());
            if !colon_ends_key(text, colon) {
                return None;
            }
            Some(KeySplit {
                key: text[1..close].to_string(),
                colon,
                before_colon: colon - close - 1,
            })
        }
        b'{' | b'[' | b'#' | b'|' | b'>' | b'!' | b'&' | b'*' | b'?' | b'%' | b'@' | b'`' => None,
        _ => {
            let bytes = text.as_bytes();
            for (i, &b) in bytes.iter().enumerate() {
                if b == b'#' && i > 0 && bytes[i - 1] == b' ' {
                    return None;
                }
                if b == b':' && colon_ends_key(text, i) {
                    let key = text[..i].trim_end();
                    if key.is_empty() {
                        return None;
                    }
                    return Some(KeySplit {
                        key: key.to_string(),
                        colon: i,
                        before_colon: i - key.len(),
                    });
                }
            }
            None
        }
    }
}

fn colon_ends_key(text: &str, colon: usize) -> bool {
    matches!(text.as_bytes().get(colon + 1), None | Some(b' ') | Some(b'\t'))
}

/// Byte offset of the quote closing the scalar that opens at offset 0.
fn find_closing_quote(text: &str, quote: u8) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut i = 1;
    while i < bytes.len() {
        let b = bytes[i];
        if quote == b'"' && b == b'\\' {
            i += 2;
            continue;
        }
        if b == quote {
            if quote == b'\'' && bytes.get(i + 1) == Some(&b'\'') {
                i += 2;
                continue;
            }
            return Some(i);
        }
        i += 1;
    }
    None
}

/// Nesting depth of flow brackets left open at the end of `text`.
fn flow_depth(text: &str) -> i32 {
    let mut depth = 0;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for c in text.chars() {
        match quote {
            Some(q) => {
                if escaped {
                    escaped = false;
                } else if c == '\\' && q == '"' {
                    escaped = true;
                } else if c == q {
                    quote = None;
                }
            }
            None => match c {
                '"' | '\'' => quote = Some(c),
                '{' | '[' => depth += 1,
                '}' | ']' => depth -= 1,
                _ => {}
            },
        }
    }
    depth
}

/// Drop a trailing ` # comment` from unquoted text.
fn strip_comment(text: &str) -> &str {
    if text.starts_with('#') {
        return "";
    }
    match text.find(" #") {
        Some(i) => text[..i].trim_end(),
        None => text.trim_end(),
    }
}

fn unescape_double(inner: &str) -> String {
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('/') => out.push('/'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(source: &str) -> RawNode {
        OutlineScanner::scan(source).root
    }

    fn entry<'a>(node: &'a RawNode, key: &str) -> Option<&'a RawEntry> {
        node.entries()?.iter().find(|e| e.key == key)
    }

    #[test]
    fn test_split_key() {
        let split = split_key("name: value").unwrap();
        assert_eq!(split.key, "name");
        assert_eq!(split.colon, 4);
        assert_eq!(split.before_colon, 0);

        let split = split_key("name : value").unwrap();
        assert_eq!(split.key, "name");
        assert_eq!(split.before_colon, 1);

        assert!(split_key("url: http://example.com").is_some());
        assert!(split_key("http://example.com").is_none());
        assert!(split_key("{ role: web }").is_none());
        assert!(split_key("\"quoted key\": 1").is_some());
    }

    #[test]
    fn test_scan_play_positions() {
        let root = scan("---\n- hosts: web\n  tasks:\n    - name: \"ping\"\n      ping:\n");
        let RawNode::Sequence { items, .. } = &root else {
            panic!("expected sequence");
        };
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].position, Position::new(2, 1));

        let hosts = entry(&items[0].node, "hosts").unwrap();
        assert_eq!(hosts.position, Position::new(2, 3));
        let scalar = hosts.value.as_scalar().unwrap();
        assert_eq!(scalar.text, "web");
        assert_eq!(scalar.position, Position::new(2, 10));

        let tasks = entry(&items[0].node, "tasks").unwrap();
        let RawNode::Sequence { items: tasks, .. } = &tasks.value else {
            panic!("expected task list");
        };
        let name = entry(&tasks[0].node, "name").unwrap().value.as_scalar().unwrap();
        assert_eq!(name.style, QuoteStyle::Double);
        assert_eq!(name.text, "ping");
        assert_eq!(entry(&tasks[0].node, "ping").unwrap().value, RawNode::Empty);
    }

    #[test]
    fn test_scan_quote_styles_and_spacing() {
        let root = scan("a: plain\nb:  \"double\"\nc: 'single'\nd: >\n  folded\n  text\ne: [1, 2]\n");
        let entries = root.entries().unwrap();
        let styles: Vec<_> = entries
            .iter()
            .map(|e| e.value.as_scalar().unwrap().style)
            .collect();
        assert_eq!(
            styles,
            vec![
                QuoteStyle::Unquoted,
                QuoteStyle::Double,
                QuoteStyle::Single,
                QuoteStyle::Folded,
                QuoteStyle::Flow
            ]
        );
        assert_eq!(entries[1].spacing.after_colon, Some(2));
        assert!(!entries[1].spacing.tab_after_colon);
        assert!(scan("a:\t1\n").entries().unwrap()[0].spacing.tab_after_colon);
        assert_eq!(entries[3].value.as_scalar().unwrap().text, "folded text");
        assert_eq!(entries[4].key, "e");
    }

    #[test]
    fn test_scan_sequence_at_key_indent() {
        let root = scan("tasks:\n- name: one\n- name: two\nafter: x\n");
        let entries = root.entries().unwrap();
        assert_eq!(entries.len(), 2);
        let RawNode::Sequence { items, .. } = &entries[0].value else {
            panic!("expected sequence");
        };
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_verbatim_block_scalar_lines() {
        let outline = OutlineScanner::scan("msg: |\n   odd\n     indent\nnext: 1\n");
        let verbatim = |line: usize| outline.verbatim.iter().any(|r| r.contains(&line));
        assert!(verbatim(2));
        assert!(verbatim(3));
        assert!(!verbatim(4));
    }

    #[test]
    fn test_comment_and_tag_handling() {
        let root = scan("secret: !vault |\n  $ANSIBLE_VAULT;1.1;AES256\n  6162\nplain: value # trailing\n");
        let entries = root.entries().unwrap();
        let secret = entries[0].value.as_scalar().unwrap();
        assert_eq!(secret.tag.as_deref(), Some("!vault"));
        assert_eq!(secret.style, QuoteStyle::Literal);
        assert_eq!(entries[1].value.as_scalar().unwrap().text, "value");
    }

    #[test]
    fn test_blank_lines_before() {
        let map = SourceMap::new("- a: 1\n\n# note\n- b: 2\n- c: 3\n");
        assert_eq!(map.blank_lines_before(4), 1);
        assert_eq!(map.blank_lines_before(5), 0);
    }
}
