//! Literal escaping for values embedded directly in SQL text.
//!
//! There is no driver-side parameter binding in this crate, so these functions are the only thing
//! standing between caller data and the statement text. Every byte that can terminate or corrupt
//! a literal is substituted; everything else is copied verbatim.
//!
//! The backslash sequences (`\0`, `\\`, `\r`, `\n`) are only decoded by servers that treat
//! backslash as an escape character. `SQLite` and Postgres with `standard_conforming_strings` store
//! them as written; the doubled quote is understood everywhere.

use crate::error::SqlPassthroughError;

const QUOTE: u8 = b'\'';

fn substitution(b: u8) -> Option<&'static [u8]> {
    match b {
        b'\'' => Some(b"''"),
        b'\0' => Some(b"\\0"),
        b'\\' => Some(b"\\\\"),
        b'\r' => Some(b"\\r"),
        b'\n' => Some(b"\\n"),
        _ => None,
    }
}

/// Escape raw bytes into a single-quoted SQL literal.
///
/// ```rust
/// use sql_passthrough::escape::escape_bytes;
///
/// assert_eq!(escape_bytes(b"O'Brien"), b"'O''Brien'".to_vec());
/// ```
#[must_use]
pub fn escape_bytes(buf: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(buf.len() + 2);
    out.push(QUOTE);
    for &b in buf {
        match substitution(b) {
            Some(rep) => out.extend_from_slice(rep),
            None => out.push(b),
        }
    }
    out.push(QUOTE);
    out
}

/// Escape a string into a single-quoted SQL literal.
///
/// Same rules as [`escape_bytes`] over the UTF-8 bytes of `s`. Only ASCII bytes are ever
/// substituted, so multi-byte characters are copied whole.
#[must_use]
pub fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for ch in s.chars() {
        let rep = u8::try_from(ch).ok().and_then(substitution);
        match rep {
            // substitutions are ASCII
            Some(rep) => rep.iter().for_each(|&b| out.push(char::from(b))),
            None => out.push(ch),
        }
    }
    out.push('\'');
    out
}

/// Reverse [`escape_bytes`]: strip the surrounding quotes and undo the five substitutions.
///
/// # Errors
///
/// Returns `SqlPassthroughError::MalformedLiteral` if the input is not quoted, contains a lone
/// quote, or ends in a dangling or unknown backslash escape.
pub fn unescape_bytes(literal: &[u8]) -> Result<Vec<u8>, SqlPassthroughError> {
    let inner = match literal {
        [QUOTE, inner @ .., QUOTE] => inner,
        _ => {
            return Err(SqlPassthroughError::MalformedLiteral(
                "literal must start and end with a single quote".to_string(),
            ));
        }
    };

    let mut out = Vec::with_capacity(inner.len());
    let mut idx = 0;
    while idx < inner.len() {
        let b = inner[idx];
        match b {
            b'\'' => {
                if inner.get(idx + 1) != Some(&b'\'') {
                    return Err(SqlPassthroughError::MalformedLiteral(format!(
                        "unescaped quote at offset {}",
                        idx + 1
                    )));
                }
                out.push(b'\'');
                idx += 1;
            }
            b'\\' => {
                let decoded = match inner.get(idx + 1) {
                    Some(b'0') => b'\0',
                    Some(b'\\') => b'\\',
                    Some(b'r') => b'\r',
                    Some(b'n') => b'\n',
                    Some(other) => {
                        return Err(SqlPassthroughError::MalformedLiteral(format!(
                            "unknown escape \\{} at offset {}",
                            char::from(*other),
                            idx + 1
                        )));
                    }
                    None => {
                        return Err(SqlPassthroughError::MalformedLiteral(
                            "dangling backslash".to_string(),
                        ));
                    }
                };
                out.push(decoded);
                idx += 1;
            }
            _ => out.push(b),
        }
        idx += 1;
    }
    Ok(out)
}
