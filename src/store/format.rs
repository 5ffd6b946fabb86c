//! Text form of a property store.
//!
//! Lines are `key=value`, `key:value` or `key value`. Lines starting with `#`
//! or `!` are comments, a line ending in an odd number of backslashes
//! continues on the next line, and `\t \n \r \f \uXXXX` escapes are decoded.
//! Any other escaped character stands for itself.

use std::fmt::Write as _;

use thiserror::Error;

use super::Properties;

#[derive(Debug, Error)]
#[error("line {line}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

/// Parses property text into a store. Later duplicates of a key win.
pub fn parse(text: &str) -> Result<Properties, ParseError> {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut props = Properties::new();
    let mut lines = text.split('\n').enumerate();

    while let Some((index, line)) = lines.next() {
        let start = index + 1;
        let trimmed = line.trim_start_matches(is_blank);
        if trimmed.is_empty() || trimmed.starts_with(['#', '!']) {
            continue;
        }

        let mut logical = String::from(trimmed);
        while ends_in_continuation(&logical) {
            logical.pop();
            match lines.next() {
                Some((_, next)) => logical.push_str(next.trim_start_matches(is_blank)),
                None => break,
            }
        }

        let (key, value) = split_entry(&logical);
        let key = unescape(key).map_err(|message| ParseError { line: start, message })?;
        let value = unescape(value).map_err(|message| ParseError { line: start, message })?;
        props.insert(key, value);
    }

    Ok(props)
}

/// Renders a store as property text, one entry per line in key order.
pub fn write(props: &Properties) -> String {
    let mut out = String::new();
    for (key, value) in props {
        escape_into(&mut out, key, true);
        out.push('=');
        escape_into(&mut out, value, false);
        out.push('\n');
    }
    out
}

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\x0c')
}

fn ends_in_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

/// Splits a logical line at the first unescaped separator.
fn split_entry(line: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut end = line.len();

    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '=' || c == ':' || is_blank(c) {
            end = i;
            break;
        }
    }

    let key = &line[..end];
    let mut rest = line[end..].trim_start_matches(is_blank);
    if let Some(stripped) = rest.strip_prefix(['=', ':']) {
        rest = stripped.trim_start_matches(is_blank);
    }
    (key, rest)
}

fn unescape(raw: &str) -> Result<String, String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\x0c'),
            Some('u') => {
                let unit = read_unit(&mut chars)?;
                out.push(decode_unit(unit, &mut chars)?);
            }
            Some(other) => out.push(other),
            None => {}
        }
    }

    Ok(out)
}

fn read_unit(chars: &mut std::str::Chars<'_>) -> Result<u16, String> {
    let digits: String = chars.by_ref().take(4).collect();
    if digits.len() != 4 {
        return Err(format!("malformed \\u escape: \\u{digits}"));
    }
    u16::from_str_radix(&digits, 16).map_err(|_| format!("malformed \\u escape: \\u{digits}"))
}

/// Decodes a UTF-16 unit, consuming a following `\uXXXX` low surrogate if needed.
fn decode_unit(unit: u16, chars: &mut std::str::Chars<'_>) -> Result<char, String> {
    if !(0xD800..0xDC00).contains(&unit) {
        return char::from_u32(u32::from(unit))
            .ok_or_else(|| format!("unpaired surrogate \\u{unit:04X}"));
    }

    let rest = chars.as_str();
    if !rest.starts_with("\\u") {
        return Err(format!("unpaired surrogate \\u{unit:04X}"));
    }
    chars.nth(1);
    let low = read_unit(chars)?;
    char::decode_utf16([unit, low])
        .next()
        .and_then(Result::ok)
        .ok_or_else(|| format!("unpaired surrogate \\u{unit:04X}"))
}

fn escape_into(out: &mut String, text: &str, is_key: bool) {
    for (i, c) in text.chars().enumerate() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\x0c' => out.push_str("\\f"),
            '=' | ':' | '#' | '!' => {
                out.push('\\');
                out.push(c);
            }
            ' ' if is_key || i == 0 => out.push_str("\\ "),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04X}", u32::from(c));
            }
            c => out.push(c),
        }
    }
}
