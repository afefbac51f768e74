//! Re-indenting formatter for pure-text declaration signatures.
//!
//! Whitespace runs collapse to one space; every `{ ... }` body is broken onto
//! its own indented lines, one member per `;` or `,`. String literals are
//! copied verbatim. Delimiters must balance.

use crate::error::FormatError;

const INDENT: &str = "    ";

/// Format a declaration signature.
///
/// ```
/// use apidoc_render::format::format_signature;
///
/// let formatted = format_signature("interface A { a: string; b: number; }").unwrap();
/// assert_eq!(formatted, "interface A {\n    a: string;\n    b: number;\n}");
/// ```
pub fn format_signature(source: &str) -> Result<String, FormatError> {
    let chars: Vec<(usize, char)> = source.char_indices().collect();
    let mut out = Formatter::default();
    let mut stack: Vec<(char, usize)> = Vec::new();

    let next_significant = |from: usize| {
        chars[from..]
            .iter()
            .position(|(_, c)| !c.is_whitespace())
            .map(|offset| (from + offset, chars[from + offset].1))
    };

    let mut i = 0;
    while i < chars.len() {
        let (pos, c) = chars[i];
        match c {
            '"' | '\'' | '`' => {
                let end = closing_quote(&chars, i).ok_or(FormatError::UnterminatedString(pos))?;
                let end_byte = chars[end].0 + chars[end].1.len_utf8();
                out.push_str(&source[pos..end_byte]);
                i = end + 1;
                continue;
            }
            '(' | '[' => {
                stack.push((c, pos));
                out.push(c);
            }
            ')' | ']' => {
                let open = if c == ')' { '(' } else { '[' };
                match stack.pop() {
                    Some((top, _)) if top == open => out.push(c),
                    _ => return Err(FormatError::Unbalanced(c, pos)),
                }
            }
            '{' => {
                if let Some((close, '}')) = next_significant(i + 1) {
                    out.push_str("{}");
                    i = close + 1;
                    continue;
                }
                stack.push((c, pos));
                out.push(c);
                out.indent += 1;
                out.newline();
            }
            '}' => {
                match stack.pop() {
                    Some(('{', _)) => {}
                    _ => return Err(FormatError::Unbalanced(c, pos)),
                }
                out.indent = out.indent.saturating_sub(1);
                out.ensure_newline();
                out.push(c);
            }
            ';' | ',' if matches!(stack.last(), Some(('{', _))) => {
                out.push(c);
                if !matches!(next_significant(i + 1), Some((_, '}')) | None) {
                    out.newline();
                }
            }
            c if c.is_whitespace() => out.space(),
            _ => out.push(c),
        }
        i += 1;
    }

    if let Some((c, pos)) = stack.pop() {
        return Err(FormatError::Unbalanced(c, pos));
    }
    Ok(out.finish())
}

/// Index of the quote closing the literal opened at `start`, honoring
/// backslash escapes.
fn closing_quote(chars: &[(usize, char)], start: usize) -> Option<usize> {
    let quote = chars[start].1;
    let mut escaped = false;
    for (i, &(_, c)) in chars.iter().enumerate().skip(start + 1) {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == quote {
            return Some(i);
        }
    }
    None
}

#[derive(Debug)]
struct Formatter {
    out: String,
    indent: usize,
    at_line_start: bool,
    pending_space: bool,
}

impl Default for Formatter {
    fn default() -> Self {
        Self {
            out: String::new(),
            indent: 0,
            at_line_start: true,
            pending_space: false,
        }
    }
}

impl Formatter {
    fn push(&mut self, c: char) {
        self.before_content();
        self.out.push(c);
    }

    fn push_str(&mut self, s: &str) {
        self.before_content();
        self.out.push_str(s);
    }

    fn before_content(&mut self) {
        if self.at_line_start {
            self.out.push_str(&INDENT.repeat(self.indent));
            self.at_line_start = false;
        } else if self.pending_space {
            self.out.push(' ');
        }
        self.pending_space = false;
    }

    fn space(&mut self) {
        if !self.at_line_start {
            self.pending_space = true;
        }
    }

    fn newline(&mut self) {
        self.out.push('\n');
        self.at_line_start = true;
        self.pending_space = false;
    }

    fn ensure_newline(&mut self) {
        if !self.at_line_start {
            self.newline();
        }
    }

    fn finish(self) -> String {
        self.out.trim_end().to_string()
    }
}
