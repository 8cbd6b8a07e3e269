//! Canonical Molang names.
//!
//! Molang allows single-letter namespace shorthands. Both the parser and the
//! context run names through [`normalize`] so that `v.size` and
//! `variable.size` always address the same slot.

use std::borrow::Cow;

/// Shorthand prefix and the namespace it expands to.
const SHORTHANDS: [(&str, &str); 4] = [
    ("v.", "variable."),
    ("q.", "query."),
    ("t.", "temp."),
    ("c.", "context."),
];

/// Expands a leading namespace shorthand.
///
/// Names that already use the long form, or that carry no recognised prefix,
/// are returned borrowed.
pub fn normalize(name: &str) -> Cow<'_, str> {
    for (short, long) in SHORTHANDS {
        if let Some(rest) = name.strip_prefix(short) {
            return Cow::Owned(format!("{long}{rest}"));
        }
    }
    Cow::Borrowed(name)
}

/// Returns true when `c` may start an identifier.
pub fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

/// Returns true when `c` may continue an identifier.
pub fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}
