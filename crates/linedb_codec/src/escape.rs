//! Reversible escaping of the record delimiters.
//!
//! Record lines use `:` `;` and line breaks as structure, so every text-like
//! token is escaped before it is written. The table is part of the file
//! format and must not change:
//!
//! | raw  | token  |
//! |------|--------|
//! | `#`  | `XaFS` |
//! | `:`  | `#x#`  |
//! | `;`  | `#y#`  |
//! | `\n` | `#n#`  |
//! | `\t` | `#t#`  |
//! | `<`  | `#1#`  |
//! | `>`  | `#2#`  |
//! | `&`  | `#l#`  |
//!
//! `#` is rewritten first so that every `#` in escaped output starts one of
//! the three-character tokens. Text that already contains the literal
//! `XaFS` does not survive a round trip; it comes back as `#`.

/// Escaped form of a literal `#`.
pub const HASH_TOKEN: &str = "XaFS";

/// Delimiter tokens, in encode order.
pub const DELIMITER_TOKENS: [(char, &str); 7] = [
    (':', "#x#"),
    (';', "#y#"),
    ('\n', "#n#"),
    ('\t', "#t#"),
    ('<', "#1#"),
    ('>', "#2#"),
    ('&', "#l#"),
];

/// Escapes `text` for use inside a record.
///
/// ```
/// use linedb_codec::escape;
///
/// assert_eq!(escape("a:b"), "a#x#b");
/// assert_eq!(escape("#1"), "XaFS1");
/// ```
#[must_use]
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '#' {
            out.push_str(HASH_TOKEN);
        } else if let Some((_, token)) = DELIMITER_TOKENS.iter().find(|(raw, _)| *raw == c) {
            out.push_str(token);
        } else {
            out.push(c);
        }
    }
    out
}

/// Reverses [`escape`].
///
/// The input is scanned left to right and each token is replaced where it
/// starts, so a token is never matched across the boundary of two adjacent
/// tokens. A `#` that does not start a known token is kept as is.
#[must_use]
pub fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while !rest.is_empty() {
        if let Some(tail) = rest.strip_prefix(HASH_TOKEN) {
            out.push('#');
            rest = tail;
            continue;
        }
        let delimiter = DELIMITER_TOKENS
            .iter()
            .find_map(|(raw, token)| rest.strip_prefix(token).map(|tail| (*raw, tail)));
        if let Some((raw, tail)) = delimiter {
            out.push(raw);
            rest = tail;
            continue;
        }
        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            out.push(c);
        }
        rest = chars.as_str();
    }
    out
}
