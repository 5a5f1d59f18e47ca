//! Raw-text index of YAML structure.
//!
//! Parsed `serde_yaml` values carry no source positions, so both line
//! attribution and the in-place rewrite work from the raw text. The index
//! follows block-style structure by indentation: a sequence is the run of
//! `- ` items at one column, an item's keys sit at the column of its first
//! key, and a key's value extends until the indentation drops back.
//! Flow-style mappings (`- {name: x, copy: ...}`) are scanned token by
//! token: quoted scalars are skipped and only keys at the mapping's own
//! brace depth count.

/// Stride of the line estimate used when a key cannot be found in the text.
pub const FALLBACK_LINE_STRIDE: usize = 4;

/// Approximate 1-based line for the `position_index`-th task.
///
/// Only used when neither the structural lookup nor the textual search
/// finds the key; it is an estimate, not a position.
pub fn estimate_line(position_index: usize) -> usize {
    position_index * FALLBACK_LINE_STRIDE + 1
}

/// Half-open range of 0-based line indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, line: usize) -> bool {
        line >= self.start && line < self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// Text extent of one sequence item (or one block mapping).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemSpan {
    /// Lines belonging to the item.
    pub lines: Span,
    /// Line holding the first key.
    pub key_line: usize,
    /// Column of the item's keys; `None` when the item is not a block mapping.
    pub key_col: Option<usize>,
    /// Item is a flow mapping (`{...}`).
    pub flow: bool,
    /// Item is an alias (`*name`).
    pub alias: bool,
}

/// Position of a key (or scalar token) in the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyLocation {
    /// 0-based line index.
    pub line: usize,
    /// Byte column of the bare token (inside quotes, if quoted).
    pub column: usize,
    /// Byte length of the bare token.
    pub len: usize,
    /// Byte column just past the token's `:` (or past the token for scalars).
    pub value_start: usize,
}

impl KeyLocation {
    /// 1-based line number.
    pub fn line_number(&self) -> usize {
        self.line + 1
    }

    /// 1-based column number.
    pub fn column_number(&self) -> usize {
        self.column + 1
    }
}

#[derive(Debug, Clone, Copy)]
struct KeyToken<'a> {
    text: &'a str,
    column: usize,
    len: usize,
    colon: usize,
}

impl KeyToken<'_> {
    fn location(&self, line: usize) -> KeyLocation {
        KeyLocation {
            line,
            column: self.column,
            len: self.len,
            value_start: self.colon + 1,
        }
    }
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

fn tail(line: &str, col: usize) -> &str {
    line.get(col..).unwrap_or("")
}

fn is_content(line: &str) -> bool {
    let t = line.trim();
    !t.is_empty() && !t.starts_with('#')
}

fn is_dash_item(content: &str) -> bool {
    content == "-" || content.starts_with("- ") || content.starts_with("-\t")
}

fn is_document_marker(line: &str) -> bool {
    line == "---"
        || line.starts_with("--- ")
        || line.starts_with("---\t")
        || line == "..."
        || line.starts_with("... ")
}

/// Document content that parses to null (`~`, `null`).
fn is_null_scalar(line: &str) -> bool {
    let text = match line.find(" #") {
        Some(pos) => &line[..pos],
        None => line,
    };
    matches!(text.trim(), "~" | "null" | "Null" | "NULL")
}

/// Byte index of the quote closing the scalar opened at `open`, if it
/// closes on the same line.
fn closing_quote(bytes: &[u8], open: usize) -> Option<usize> {
    let quote = bytes[open];
    let mut i = open + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if quote == b'"' => i += 1,
            b if b == quote => {
                if quote == b'\'' && bytes.get(i + 1) == Some(&b'\'') {
                    i += 1;
                } else {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Reads a key of a flow mapping starting exactly at `col`.
///
/// Plain keys end at `:` followed by a blank or a flow indicator; a `,`
/// or a bracket first means the scalar is not a key.
fn flow_key_at(line: &str, col: usize) -> Option<KeyToken<'_>> {
    let bytes = line.as_bytes();
    let first = *bytes.get(col)?;

    if first == b'"' || first == b'\'' {
        let close = closing_quote(bytes, col)?;
        let after = tail(line, close + 1);
        let gap = after.len() - after.trim_start().len();
        if !after[gap..].starts_with(':') {
            return None;
        }
        return Some(KeyToken {
            text: &line[col + 1..close],
            column: col + 1,
            len: close - col - 1,
            colon: close + 1 + gap,
        });
    }

    for j in col..bytes.len() {
        match bytes[j] {
            b':' if matches!(
                bytes.get(j + 1),
                None | Some(b' ' | b'\t' | b',' | b'{' | b'}' | b'[' | b']')
            ) =>
            {
                let text = line[col..j].trim_end();
                if text.is_empty() {
                    return None;
                }
                return Some(KeyToken {
                    text,
                    column: col,
                    len: text.len(),
                    colon: j,
                });
            }
            b',' | b'{' | b'}' | b'[' | b']' => return None,
            b'#' if j > col && matches!(bytes[j - 1], b' ' | b'\t') => return None,
            _ => {}
        }
    }
    None
}

/// Reads a mapping key starting exactly at `col`.
fn key_at(line: &str, col: usize) -> Option<KeyToken<'_>> {
    let rest = line.get(col..)?;
    let first = rest.chars().next()?;

    if first == '"' || first == '\'' {
        let close = rest[1..].find(first)? + 1;
        if !rest[close + 1..].starts_with(':') {
            return None;
        }
        return Some(KeyToken {
            text: &rest[1..close],
            column: col + 1,
            len: close - 1,
            colon: col + close + 1,
        });
    }

    if matches!(first, '-' | '#' | '{' | '[' | '&' | '*' | '!' | '?' | '|' | '>') {
        return None;
    }

    let bytes = rest.as_bytes();
    for i in 0..bytes.len() {
        match bytes[i] {
            b':' if i + 1 == bytes.len() || bytes[i + 1] == b' ' || bytes[i + 1] == b'\t' => {
                let text = rest[..i].trim_end();
                if text.is_empty() {
                    return None;
                }
                return Some(KeyToken {
                    text,
                    column: col,
                    len: text.len(),
                    colon: col + i,
                });
            }
            b'#' if i > 0 && bytes[i - 1] == b' ' => return None,
            _ => {}
        }
    }
    None
}

/// Line-oriented view of a YAML document stream.
#[derive(Debug, Clone)]
pub struct SourceMap<'a> {
    lines: Vec<&'a str>,
}

impl<'a> SourceMap<'a> {
    pub fn new(content: &'a str) -> Self {
        Self {
            lines: content.lines().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line(&self, idx: usize) -> Option<&'a str> {
        self.lines.get(idx).copied()
    }

    /// Whole-text span.
    pub fn full(&self) -> Span {
        Span::new(0, self.lines.len())
    }

    fn first_content(&self, window: Span) -> Option<usize> {
        (window.start..window.end.min(self.lines.len())).find(|&i| is_content(self.lines[i]))
    }

    /// Spans of the non-null documents, in order.
    pub fn documents(&self) -> Vec<Span> {
        let mut spans = Vec::new();
        let mut start = 0;
        for (idx, line) in self.lines.iter().enumerate() {
            if is_document_marker(line) {
                self.push_document(&mut spans, start, idx);
                start = idx + 1;
            }
        }
        self.push_document(&mut spans, start, self.lines.len());
        spans
    }

    /// Keeps segments whose content parses to something other than null,
    /// mirroring the documents the walker pairs them with.
    fn push_document(&self, spans: &mut Vec<Span>, start: usize, end: usize) {
        let content: Vec<&str> = (start..end)
            .map(|i| self.lines[i])
            .filter(|line| is_content(line) && !line.starts_with('%'))
            .collect();
        let null = content.is_empty() || (content.len() == 1 && is_null_scalar(content[0]));
        if !null {
            spans.push(Span::new(start, end));
        }
    }

    /// Items of the block sequence that starts at the first content line of `window`.
    ///
    /// Returns an empty list when the window does not open with a `- ` item.
    pub fn sequence_items(&self, window: Span) -> Vec<ItemSpan> {
        let mut items = Vec::new();
        let Some(first) = self.first_content(window) else {
            return items;
        };
        let dash_col = indent_of(self.lines[first]);
        if !is_dash_item(tail(self.lines[first], dash_col)) {
            return items;
        }

        let mut starts = Vec::new();
        let mut end = window.end.min(self.lines.len());
        for idx in first..end {
            let line = self.lines[idx];
            if !is_content(line) {
                continue;
            }
            let indent = indent_of(line);
            if indent < dash_col || (indent == dash_col && !is_dash_item(tail(line, indent))) {
                end = idx;
                break;
            }
            if indent == dash_col {
                starts.push(idx);
            }
        }

        for (i, &start) in starts.iter().enumerate() {
            let stop = starts.get(i + 1).copied().unwrap_or(end);
            items.push(self.item_at(start, dash_col, Span::new(start, stop)));
        }
        items
    }

    fn item_at(&self, start: usize, dash_col: usize, lines: Span) -> ItemSpan {
        let line = self.lines[start];
        let mut item = ItemSpan {
            lines,
            key_line: start,
            key_col: None,
            flow: false,
            alias: false,
        };

        let mut col = dash_col + 1;
        loop {
            let rest = tail(line, col);
            col += rest.len() - rest.trim_start_matches(' ').len();
            let rest = tail(line, col);
            if rest.starts_with('&') || rest.starts_with('!') {
                col += rest.find(' ').unwrap_or(rest.len());
                continue;
            }
            break;
        }

        let rest = tail(line, col).trim_end();
        if rest.is_empty() || rest.starts_with('#') {
            if let Some(next) = self.first_content(Span::new(start + 1, lines.end)) {
                item.key_line = next;
                item.key_col = Some(indent_of(self.lines[next]));
            }
        } else if rest.starts_with('*') {
            item.alias = true;
        } else if rest.starts_with('{') {
            item.flow = true;
        } else if !is_dash_item(rest) {
            item.key_col = Some(col);
        }
        item
    }

    /// The block mapping opening at the first content line of `window`.
    pub fn mapping_block(&self, window: Span) -> Option<ItemSpan> {
        let first = self.first_content(window)?;
        let line = self.lines[first];
        let col = indent_of(line);
        let rest = tail(line, col);
        if is_dash_item(rest) {
            return None;
        }
        Some(ItemSpan {
            lines: Span::new(first, window.end),
            key_line: first,
            key_col: if rest.starts_with('{') { None } else { Some(col) },
            flow: rest.starts_with('{'),
            alias: rest.starts_with('*'),
        })
    }

    /// Finds `key` among the direct keys of `item`.
    pub fn find_key(&self, item: &ItemSpan, key: &str) -> Option<KeyLocation> {
        if item.flow {
            return self.find_flow_key(item.lines, key);
        }
        let key_col = item.key_col?;
        let end = item.lines.end.min(self.lines.len());
        for idx in item.key_line..end {
            let line = self.lines[idx];
            if idx != item.key_line && (!is_content(line) || indent_of(line) != key_col) {
                continue;
            }
            if let Some(tok) = key_at(line, key_col) {
                if tok.text == key {
                    return Some(tok.location(idx));
                }
            }
        }
        None
    }

    fn find_flow_key(&self, span: Span, key: &str) -> Option<KeyLocation> {
        let line = self.lines.get(span.start)?;
        let open = line.find('{')?;
        self.flow_mapping_key(span.start, open, span.end, key)
    }

    /// Finds `key` among the direct keys of the flow mapping whose `{` sits
    /// at (`line`, `open`). The mapping may continue up to line `end`.
    pub fn flow_mapping_key(
        &self,
        line: usize,
        open: usize,
        end: usize,
        key: &str,
    ) -> Option<KeyLocation> {
        let mut depth = 0usize;
        let mut expect_key = false;
        let mut quote: Option<u8> = None;
        // last significant byte outside quotes
        let mut prev = b' ';

        for idx in line..end.min(self.lines.len()) {
            let text = self.lines[idx];
            let bytes = text.as_bytes();
            let mut i = if idx == line { open } else { 0 };

            while i < bytes.len() {
                let b = bytes[i];
                if let Some(q) = quote {
                    if q == b'"' && b == b'\\' {
                        i += 2;
                        continue;
                    }
                    if b == q {
                        if q == b'\'' && bytes.get(i + 1) == Some(&b'\'') {
                            i += 2;
                            continue;
                        }
                        quote = None;
                        prev = b;
                    }
                    i += 1;
                    continue;
                }

                match b {
                    b' ' | b'\t' => {}
                    b'#' if i == 0 || matches!(bytes[i - 1], b' ' | b'\t') => break,
                    b'{' | b'[' => {
                        depth += 1;
                        expect_key = b == b'{' && depth == 1;
                        prev = b;
                    }
                    b'}' | b']' => {
                        depth = depth.checked_sub(1)?;
                        if depth == 0 {
                            return None;
                        }
                        prev = b;
                    }
                    b',' => {
                        expect_key = depth == 1;
                        prev = b;
                    }
                    _ if depth == 1 && expect_key => {
                        expect_key = false;
                        if let Some(tok) = flow_key_at(text, i) {
                            if tok.text == key {
                                return Some(tok.location(idx));
                            }
                            i = tok.colon + 1;
                            prev = b':';
                            continue;
                        }
                        if b == b'"' || b == b'\'' {
                            quote = Some(b);
                        }
                        prev = b;
                    }
                    b'"' | b'\'' if matches!(prev, b'{' | b'[' | b',' | b':') => quote = Some(b),
                    _ => prev = b,
                }
                i += 1;
            }
        }
        None
    }

    /// Column of the `{` opening a flow mapping value of `key`, if the value
    /// starts on the key's line.
    pub fn flow_value_open(&self, key: &KeyLocation) -> Option<usize> {
        let line = self.lines.get(key.line)?;
        let rest = tail(line, key.value_start);
        let trimmed = rest.trim_start();
        trimmed
            .starts_with('{')
            .then(|| key.value_start + (rest.len() - trimmed.len()))
    }

    /// Lines holding the block value of a key whose mapping sits at `mapping_col`.
    pub fn value_window(&self, key: &KeyLocation, mapping_col: usize, within: Span) -> Span {
        let start = key.line + 1;
        let limit = within.end.min(self.lines.len());
        let mut end = limit;
        for idx in start..limit {
            let line = self.lines[idx];
            if !is_content(line) {
                continue;
            }
            let indent = indent_of(line);
            if indent < mapping_col || (indent == mapping_col && !is_dash_item(tail(line, indent))) {
                end = idx;
                break;
            }
        }
        Span::new(start.min(end), end)
    }

    /// Locates the inline scalar `expected` right after `key`'s colon.
    pub fn inline_value(&self, key: &KeyLocation, expected: &str) -> Option<KeyLocation> {
        let line = self.lines.get(key.line)?;
        let rest = tail(line, key.value_start);
        let mut col = key.value_start + (rest.len() - rest.trim_start().len());
        let mut rest = tail(line, col);
        if rest.starts_with('"') || rest.starts_with('\'') {
            col += 1;
            rest = tail(line, col);
        }
        if expected.is_empty() || !rest.starts_with(expected) {
            return None;
        }
        match rest[expected.len()..].chars().next() {
            None | Some(' ' | '\t' | '"' | '\'' | ',' | '}') => Some(KeyLocation {
                line: key.line,
                column: col,
                len: expected.len(),
                value_start: col + expected.len(),
            }),
            _ => None,
        }
    }

    /// First line at or after `from` that reads `<key>:` once indentation and
    /// any leading `- ` markers are stripped.
    pub fn search_key(&self, key: &str, from: usize) -> Option<KeyLocation> {
        for idx in from..self.lines.len() {
            let line = self.lines[idx];
            let mut col = indent_of(line);
            while is_dash_item(tail(line, col)) {
                col += 1;
                let rest = tail(line, col);
                col += rest.len() - rest.trim_start_matches(' ').len();
            }
            if let Some(tok) = key_at(line, col) {
                if tok.text == key {
                    return Some(tok.location(idx));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TASKS: &str = "\
---
# header comment
- name: first
  user:
    name: bob
    group: admin
- name: second
  group:
    name: admin
";

    #[test]
    fn test_key_at_plain_and_quoted() {
        let tok = key_at("  copy: {}", 2).unwrap();
        assert_eq!(tok.text, "copy");
        assert_eq!(tok.column, 2);
        let tok = key_at("  \"copy\": {}", 2).unwrap();
        assert_eq!(tok.text, "copy");
        assert_eq!(tok.column, 3);
        assert!(key_at("  - copy: {}", 2).is_none());
        assert!(key_at("  url: http://x", 2).map(|t| t.text) == Some("url"));
    }

    #[test]
    fn test_documents_skip_empty_segments() {
        let map = SourceMap::new("%YAML 1.2\n---\n- a\n---\n# only comment\n---\n- b\n");
        let docs = map.documents();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0], Span::new(2, 3));
        assert_eq!(docs[1], Span::new(6, 7));
    }

    #[test]
    fn test_documents_skip_null_scalars() {
        let map = SourceMap::new("---\n~\n---\nnull # none\n---\n- a\n");
        assert_eq!(map.documents(), vec![Span::new(5, 6)]);
    }

    #[test]
    fn test_sequence_items_and_keys() {
        let map = SourceMap::new(TASKS);
        let items = map.sequence_items(map.documents()[0]);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].lines, Span::new(2, 6));
        assert_eq!(items[0].key_col, Some(2));

        let user = map.find_key(&items[0], "user").unwrap();
        assert_eq!(user.line_number(), 4);
        // `group` inside the user parameters is not a key of the first task
        assert!(map.find_key(&items[0], "group").is_none());

        let group = map.find_key(&items[1], "group").unwrap();
        assert_eq!(group.line_number(), 8);
        assert_eq!(group.column_number(), 3);
    }

    #[test]
    fn test_compact_sequence_under_key() {
        let text = "tasks:\n- name: a\n  copy: {}\n- name: b\n  shell: ls\nother: 1\n";
        let map = SourceMap::new(text);
        let root = map.mapping_block(map.full()).unwrap();
        let tasks = map.find_key(&root, "tasks").unwrap();
        let window = map.value_window(&tasks, 0, map.full());
        assert_eq!(window, Span::new(1, 5));
        let items = map.sequence_items(window);
        assert_eq!(items.len(), 2);
        assert_eq!(map.find_key(&items[1], "shell").unwrap().line_number(), 5);
    }

    #[test]
    fn test_anchor_alias_and_flow_items() {
        let text = "- &t\n  name: a\n  copy: {}\n- *t\n- {name: c, shell: ls}\n";
        let map = SourceMap::new(text);
        let items = map.sequence_items(map.full());
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].key_line, 1);
        assert_eq!(map.find_key(&items[0], "copy").unwrap().line_number(), 3);
        assert!(items[1].alias);
        assert!(map.find_key(&items[1], "copy").is_none());
        assert!(items[2].flow);
        let shell = map.find_key(&items[2], "shell").unwrap();
        assert_eq!(&text.lines().nth(4).unwrap()[shell.column..shell.column + 5], "shell");
    }

    #[test]
    fn test_flow_key_skips_quoted_and_nested() {
        let text = "- {name: \"run copy: now\", args: {copy: 1}, 'tags': [copy], copy: {src: a}}\n";
        let map = SourceMap::new(text);
        let items = map.sequence_items(map.full());
        let copy = map.find_key(&items[0], "copy").unwrap();
        assert_eq!(copy.column, text.rfind("copy:").unwrap());
        assert_eq!(map.find_key(&items[0], "tags").unwrap().column, text.find("tags").unwrap());
        assert!(map.find_key(&items[0], "src").is_none());
    }

    #[test]
    fn test_flow_key_across_lines() {
        let text = "- {name: 'it''s copy: x',\n   # copy: no\n   copy: {src: a}}\n- name: b\n";
        let map = SourceMap::new(text);
        let items = map.sequence_items(map.full());
        assert_eq!(items.len(), 2);
        let copy = map.find_key(&items[0], "copy").unwrap();
        assert_eq!((copy.line_number(), copy.column), (3, 3));
    }

    #[test]
    fn test_flow_value_of_action() {
        let map = SourceMap::new("- action: {src: \"module: x\", module: copy}\n");
        let items = map.sequence_items(map.full());
        let action = map.find_key(&items[0], "action").unwrap();
        let open = map.flow_value_open(&action).unwrap();
        assert_eq!(open, 10);
        let module = map.flow_mapping_key(action.line, open, 1, "module").unwrap();
        assert_eq!(map.inline_value(&module, "copy").unwrap().column, 37);
    }

    #[test]
    fn test_inline_value() {
        let map = SourceMap::new("- action: copy src=a dest=b\n- action: \"shell echo\"\n");
        let items = map.sequence_items(map.full());
        let action = map.find_key(&items[0], "action").unwrap();
        let value = map.inline_value(&action, "copy").unwrap();
        assert_eq!(value.column, 10);
        assert!(map.inline_value(&action, "cop").is_none());
        let action = map.find_key(&items[1], "action").unwrap();
        assert_eq!(map.inline_value(&action, "shell").unwrap().column, 11);
    }

    #[test]
    fn test_search_key_textual() {
        let map = SourceMap::new(TASKS);
        assert_eq!(map.search_key("group", 0).unwrap().line_number(), 6);
        assert_eq!(map.search_key("group", 6).unwrap().line_number(), 8);
        assert!(map.search_key("missing", 0).is_none());
    }

    #[test]
    fn test_estimate_line_is_linear() {
        assert_eq!(estimate_line(0), 1);
        assert_eq!(estimate_line(3), 3 * FALLBACK_LINE_STRIDE + 1);
    }
}
