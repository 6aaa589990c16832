//! Identifier handling.
//!
//! Table, column and join identifiers are interpolated into SQL text, so they
//! go through [`sanitize`] first. This is structural escaping of markup
//! characters, not SQL quoting: values never travel this path, they are always
//! bound (see [`crate::bindings`]).

use std::borrow::Cow;

/// Escape `&`, `<`, `>`, `"` and `'` in an identifier.
///
/// Plain identifiers such as `users`, `orders.user_id` or `COUNT(*)` are
/// returned unchanged without allocating.
pub fn sanitize(ident: &str) -> Cow<'_, str> {
    if !ident.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(ident);
    }

    let mut out = String::with_capacity(ident.len() + 8);
    for c in ident.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Reduce a column name to a placeholder-safe stem: `[A-Za-z_][A-Za-z0-9_]*`.
///
/// `users.id` becomes `users_id`; an empty result falls back to `param`.
pub fn binding_stem(column: &str) -> String {
    let mut stem: String = column
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();

    if stem.is_empty() {
        return "param".to_string();
    }
    if stem.starts_with(|c: char| c.is_ascii_digit()) {
        stem.insert(0, '_');
    }
    stem
}

/// Whether `c` may start a placeholder name.
pub(crate) fn is_key_start(c: char) -> bool {
    c == '_' || c.is_ascii_alphabetic()
}

/// Whether `c` may continue a placeholder name.
pub(crate) fn is_key_char(c: char) -> bool {
    c == '_' || c.is_ascii_alphanumeric()
}
