#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum State {
    Normal,
    SingleQuoted,
}

/// A quote inside a literal followed by another quote is an escaped quote, not a terminator.
/// Running off the end counts as "no following byte".
pub(super) fn is_escaped_quote(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'\'') && bytes.get(idx + 1) == Some(&b'\'')
}
