//! Parser utility functions - logical line splitting, bracket and string tracking

/// One logical line: physical lines joined across open brackets,
/// backslash continuations and triple-quoted strings, comments removed.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalLine {
    /// 1-based first physical line
    pub line: usize,
    /// 1-based last physical line
    pub end_line: usize,
    /// Leading whitespace width of the first physical line
    pub indent: usize,
    pub text: String,
}

/// Split source into logical lines, dropping blank and comment-only lines
pub fn logical_lines(source: &str) -> Vec<LogicalLine> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut start_line = 0;
    let mut indent = 0;
    let mut depth: i32 = 0;
    let mut open_triple: Option<char> = None;

    for (idx, raw) in source.lines().enumerate() {
        let line_no = idx + 1;
        let continuing = depth > 0 || open_triple.is_some() || current.ends_with('\\');

        if !continuing {
            if raw.trim().is_empty() {
                continue;
            }
            start_line = line_no;
            indent = raw.len() - raw.trim_start().len();
            current.clear();
        } else if open_triple.is_some() {
            current.push('\n');
        } else {
            if current.ends_with('\\') {
                current.pop();
            }
            current.push(' ');
        }

        let segment = if open_triple.is_some() { raw } else if continuing { raw.trim() } else { raw.trim_start() };
        scan_segment(segment, &mut current, &mut depth, &mut open_triple);

        let still_open = depth > 0 || open_triple.is_some() || current.ends_with('\\');
        if !still_open {
            let text = current.trim_end().to_string();
            if !text.is_empty() {
                out.push(LogicalLine {
                    line: start_line,
                    end_line: line_no,
                    indent,
                    text,
                });
            }
            current.clear();
            depth = 0;
        }
    }

    let text = current.trim_end().to_string();
    if !text.is_empty() {
        out.push(LogicalLine {
            line: start_line,
            end_line: source.lines().count(),
            indent,
            text,
        });
    }

    out
}

/// Append `segment` to `out`, stripping a trailing comment and tracking
/// bracket depth and triple-quoted strings across lines
fn scan_segment(segment: &str, out: &mut String, depth: &mut i32, open_triple: &mut Option<char>) {
    let chars: Vec<char> = segment.chars().collect();
    let mut in_string: Option<char> = None;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if let Some(q) = *open_triple {
            if c == '\\' {
                out.push(c);
                if let Some(&next) = chars.get(i + 1) {
                    out.push(next);
                }
                i += 2;
                continue;
            }
            if chars[i..].starts_with(&[q, q, q]) {
                out.push_str(&q.to_string().repeat(3));
                *open_triple = None;
                i += 3;
                continue;
            }
            out.push(c);
            i += 1;
            continue;
        }

        if let Some(q) = in_string {
            out.push(c);
            if c == '\\' {
                if let Some(&next) = chars.get(i + 1) {
                    out.push(next);
                }
                i += 2;
                continue;
            }
            if c == q {
                in_string = None;
            }
            i += 1;
            continue;
        }

        match c {
            '#' => break,
            '"' | '\'' => {
                if chars[i..].starts_with(&[c, c, c]) {
                    out.push_str(&c.to_string().repeat(3));
                    *open_triple = Some(c);
                    i += 3;
                    continue;
                }
                in_string = Some(c);
            }
            '(' | '[' | '{' => *depth += 1,
            ')' | ']' | '}' => {
                if *depth > 0 {
                    *depth -= 1
                }
            }
            _ => {}
        }
        out.push(c);
        i += 1;
    }
}

/// Byte position of the colon ending a block header (`if x: ...`), skipping
/// colons nested in brackets, strings, and the walrus operator
pub fn find_header_colon(s: &str) -> Option<usize> {
    let mut depth_paren = 0;
    let mut depth_bracket = 0;
    let mut depth_brace = 0;
    let mut in_string = false;
    let mut string_quote = '\0';
    let mut escaped = false;
    let bytes = s.as_bytes();

    for (i, c) in s.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == string_quote {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' | '\'' => {
                in_string = true;
                string_quote = c;
            }
            '(' => depth_paren += 1,
            ')' => {
                if depth_paren > 0 {
                    depth_paren -= 1
                }
            }
            '[' => depth_bracket += 1,
            ']' => {
                if depth_bracket > 0 {
                    depth_bracket -= 1
                }
            }
            '{' => depth_brace += 1,
            '}' => {
                if depth_brace > 0 {
                    depth_brace -= 1
                }
            }
            ':' if depth_paren == 0 && depth_bracket == 0 && depth_brace == 0 => {
                if bytes.get(i + 1) != Some(&b'=') {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Leading keyword or identifier of a statement
pub fn first_word(s: &str) -> &str {
    let end = s
        .char_indices()
        .find(|(_, c)| !(c.is_alphanumeric() || *c == '_'))
        .map_or(s.len(), |(i, _)| i);
    &s[..end]
}

/// Leading-whitespace width of a line
pub fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}
