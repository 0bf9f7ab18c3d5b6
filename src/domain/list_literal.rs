//! Strict parser for serialized string lists.
//!
//! Medication and diet cells are stored as list literals such as
//! `['Antifungal Cream', 'Fluconazole']`. Only that shape is accepted:
//! brackets, single- or double-quoted strings, commas, whitespace, and an
//! optional trailing comma. Nothing is evaluated.

use thiserror::Error;

/// Errors produced while parsing a list literal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListLiteralError {
    #[error("expected '[' at offset {0}")]
    ExpectedOpen(usize),

    #[error("expected quoted string at offset {0}")]
    ExpectedString(usize),

    #[error("expected ',' or ']' at offset {0}")]
    ExpectedSeparator(usize),

    #[error("unterminated string starting at offset {0}")]
    UnterminatedString(usize),

    #[error("unsupported escape sequence at offset {0}")]
    BadEscape(usize),

    #[error("unexpected trailing input at offset {0}")]
    TrailingInput(usize),
}

/// Parse a list literal into its strings, preserving order.
///
/// # Errors
/// Returns a `ListLiteralError` describing the first offending offset.
pub fn parse(input: &str) -> Result<Vec<String>, ListLiteralError> {
    let chars: Vec<(usize, char)> = input.char_indices().collect();
    let mut pos = skip_ws(&chars, 0);
    let offset = |p: usize| chars.get(p).map_or(input.len(), |(o, _)| *o);

    match chars.get(pos) {
        Some((_, '[')) => pos += 1,
        _ => return Err(ListLiteralError::ExpectedOpen(offset(pos))),
    }

    let mut items = Vec::new();
    loop {
        pos = skip_ws(&chars, pos);
        match chars.get(pos) {
            Some((_, ']')) => {
                pos += 1;
                break;
            }
            Some((_, q)) if *q == '\'' || *q == '"' => {
                let (item, next) = read_string(&chars, pos)?;
                items.push(item);
                pos = skip_ws(&chars, next);
                match chars.get(pos) {
                    Some((_, ',')) => pos += 1,
                    Some((_, ']')) => {
                        pos += 1;
                        break;
                    }
                    _ => return Err(ListLiteralError::ExpectedSeparator(offset(pos))),
                }
            }
            _ => return Err(ListLiteralError::ExpectedString(offset(pos))),
        }
    }

    pos = skip_ws(&chars, pos);
    if pos < chars.len() {
        return Err(ListLiteralError::TrailingInput(offset(pos)));
    }
    Ok(items)
}

fn skip_ws(chars: &[(usize, char)], mut pos: usize) -> usize {
    while chars.get(pos).is_some_and(|(_, c)| c.is_whitespace()) {
        pos += 1;
    }
    pos
}

fn read_string(chars: &[(usize, char)], start: usize) -> Result<(String, usize), ListLiteralError> {
    let (start_offset, quote) = chars[start];
    let mut out = String::new();
    let mut pos = start + 1;

    while let Some(&(off, c)) = chars.get(pos) {
        match c {
            '\\' => {
                let escaped = match chars.get(pos + 1).map(|(_, e)| *e) {
                    Some('\\') => '\\',
                    Some('\'') => '\'',
                    Some('"') => '"',
                    Some('n') => '\n',
                    Some('t') => '\t',
                    Some(_) => return Err(ListLiteralError::BadEscape(off)),
                    None => return Err(ListLiteralError::UnterminatedString(start_offset)),
                };
                out.push(escaped);
                pos += 2;
            }
            c if c == quote => return Ok((out, pos + 1)),
            c => {
                out.push(c);
                pos += 1;
            }
        }
    }

    Err(ListLiteralError::UnterminatedString(start_offset))
}
