use std::borrow::Cow;

mod scanner;

use scanner::{State, is_escaped_quote};

/// Identifier quote used by the source dialect.
pub const SOURCE_IDENTIFIER_QUOTE: u8 = b'`';
/// Identifier quote used by the target dialect.
pub const TARGET_IDENTIFIER_QUOTE: char = '"';

/// How to resolve translation for a call relative to the connection default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationMode {
    /// Follow the connection's configured setting.
    ConnectionDefault,
    /// Force translation on, regardless of the connection setting.
    ForceOn,
    /// Force translation off, regardless of the connection setting.
    ForceOff,
}

impl TranslationMode {
    #[must_use]
    pub fn resolve(self, connection_default: bool) -> bool {
        match self {
            TranslationMode::ConnectionDefault => connection_default,
            TranslationMode::ForceOn => true,
            TranslationMode::ForceOff => false,
        }
    }
}

/// Rewrite backtick-quoted identifiers into double-quoted identifiers.
///
/// The scanner only tracks whether it is inside a single-quoted literal. Backticks inside a
/// literal are data and pass through; a doubled quote (`''`) inside a literal is an escaped quote
/// and keeps the scanner in the literal. Nothing else about the SQL is interpreted, and the output
/// always has the same length as the input.
///
/// ```rust
/// use sql_passthrough::translation::translate_identifiers;
///
/// let sql = "SELECT `a` FROM t WHERE x = 'back`tick'";
/// assert_eq!(translate_identifiers(sql), "SELECT \"a\" FROM t WHERE x = 'back`tick'");
/// ```
///
/// Returns a borrowed `Cow` when no changes are needed.
#[must_use]
pub fn translate_identifiers(sql: &str) -> Cow<'_, str> {
    let bytes = sql.as_bytes();
    let mut out: Option<String> = None;
    let mut copied = 0;
    let mut state = State::Normal;
    let mut idx = 0;

    while idx < bytes.len() {
        match (state, bytes[idx]) {
            (State::Normal, b'\'') => state = State::SingleQuoted,
            (State::Normal, SOURCE_IDENTIFIER_QUOTE) => {
                let buf = out.get_or_insert_with(|| String::with_capacity(sql.len()));
                buf.push_str(&sql[copied..idx]);
                buf.push(TARGET_IDENTIFIER_QUOTE);
                copied = idx + 1;
            }
            (State::SingleQuoted, b'\'') => {
                if is_escaped_quote(bytes, idx) {
                    idx += 1; // skip escaped quote
                } else {
                    state = State::Normal;
                }
            }
            _ => {}
        }
        idx += 1;
    }

    match out {
        Some(mut buf) => {
            buf.push_str(&sql[copied..]);
            Cow::Owned(buf)
        }
        None => Cow::Borrowed(sql),
    }
}

/// Apply [`translate_identifiers`] only when `enabled`.
#[must_use]
pub fn translate_if(sql: &str, enabled: bool) -> Cow<'_, str> {
    if enabled {
        translate_identifiers(sql)
    } else {
        Cow::Borrowed(sql)
    }
}
