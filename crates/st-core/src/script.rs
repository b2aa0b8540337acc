//! Script helpers: statement splitting and error context rendering.

/// One statement of a script and where it starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Statement<'a> {
    /// Statement text without the trailing `;`, trimmed
    pub sql: &'a str,
    /// Byte offset of the first character of `sql` in the script
    pub offset: usize,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Lex {
    Code,
    SingleQuote,
    DoubleQuote,
    LineComment,
    BlockComment,
}

/// Split a SQL script on top-level `;`.
///
/// Semicolons inside quotes, dollar-quoted bodies (`$$...$$`,
/// `$tag$...$tag$`) and comments are ignored. Segments that hold
/// nothing but whitespace and comments are dropped.
pub fn split_statements(script: &str) -> Vec<Statement<'_>> {
    let mut statements = Vec::new();
    let mut state = Lex::Code;
    let mut start = 0;
    let mut has_code = false;
    let bytes = script.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        let next = bytes.get(i + 1).copied();
        match state {
            Lex::Code => match b {
                b'\'' => {
                    state = Lex::SingleQuote;
                    has_code = true;
                }
                b'"' => {
                    state = Lex::DoubleQuote;
                    has_code = true;
                }
                b'-' if next == Some(b'-') => {
                    state = Lex::LineComment;
                    i += 1;
                }
                b'/' if next == Some(b'*') => {
                    state = Lex::BlockComment;
                    i += 1;
                }
                b'$' if !follows_identifier(bytes, i) => {
                    has_code = true;
                    if let Some(tag_end) = dollar_tag_end(bytes, i) {
                        let tag = &script[i..=tag_end];
                        let body = tag_end + 1;
                        // An unterminated body runs to the end of the script.
                        i = match script[body..].find(tag) {
                            Some(pos) => body + pos + tag.len() - 1,
                            None => bytes.len() - 1,
                        };
                    }
                }
                b';' => {
                    if has_code {
                        push_segment(script, start, i, &mut statements);
                    }
                    start = i + 1;
                    has_code = false;
                }
                b if !b.is_ascii_whitespace() => has_code = true,
                _ => {}
            },
            Lex::SingleQuote if b == b'\'' => state = Lex::Code,
            Lex::DoubleQuote if b == b'"' => state = Lex::Code,
            Lex::LineComment if b == b'\n' => state = Lex::Code,
            Lex::BlockComment if b == b'*' && next == Some(b'/') => {
                state = Lex::Code;
                i += 1;
            }
            _ => {}
        }
        i += 1;
    }
    if has_code {
        push_segment(script, start, bytes.len(), &mut statements);
    }
    statements
}

fn follows_identifier(bytes: &[u8], i: usize) -> bool {
    i > 0 && matches!(bytes[i - 1], b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_' | b'$')
}

/// Index of the closing `$` of a dollar-quote tag opening at `start`.
/// `$1`-style parameters are not tags.
fn dollar_tag_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut j = start + 1;
    if let Some(first) = bytes.get(j) {
        if first.is_ascii_alphabetic() || *first == b'_' {
            while bytes
                .get(j)
                .is_some_and(|b| b.is_ascii_alphanumeric() || *b == b'_')
            {
                j += 1;
            }
        }
    }
    (bytes.get(j) == Some(&b'$')).then_some(j)
}

fn push_segment<'a>(script: &'a str, from: usize, to: usize, out: &mut Vec<Statement<'a>>) {
    let segment = &script[from..to];
    let lead = segment.len() - segment.trim_start().len();
    out.push(Statement {
        sql: segment.trim(),
        offset: from + lead,
    });
}

/// 1-based line and column of a byte offset. Offsets past the end clamp to
/// the end of the content.
pub fn line_column_from_offset(content: &str, offset: usize) -> (usize, usize) {
    let mut offset = offset.min(content.len());
    while !content.is_char_boundary(offset) {
        offset -= 1;
    }
    let before = &content[..offset];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map(|idx| idx + 1).unwrap_or(0);
    let column = content[line_start..offset].chars().count() + 1;
    (line, column)
}

/// Render the lines around `line` (1-based): `before` lines above and
/// `after` lines below. Line numbers are right-aligned when requested.
pub fn lines_before_and_after(
    content: &str,
    line: usize,
    before: usize,
    after: usize,
    line_numbers: bool,
) -> String {
    let lines: Vec<&str> = content.lines().collect();
    if lines.is_empty() {
        return String::new();
    }
    let line = line.clamp(1, lines.len());
    let first = line.saturating_sub(before).max(1);
    let last = (line + after).min(lines.len());
    let width = last.to_string().len();

    (first..=last)
        .map(|n| {
            let text = lines[n - 1];
            if line_numbers {
                format!("{n:>width$}: {text}")
            } else {
                text.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
