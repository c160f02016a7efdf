//! Escaping for Ninja target names and shell command bodies.

use std::borrow::Cow;

/// Escape a target name for use in a `build` stanza.
///
/// Ninja gives `$`, `:` and space special meaning in target positions;
/// each is prefixed with `$`. Names without them are returned unchanged.
pub fn escape_target(name: &str) -> Cow<'_, str> {
    if !name.bytes().any(|b| matches!(b, b'$' | b':' | b' ')) {
        return Cow::Borrowed(name);
    }
    let mut out = String::with_capacity(name.len() + 2);
    for c in name.chars() {
        if matches!(c, '$' | ':' | ' ') {
            out.push('$');
        }
        out.push(c);
    }
    Cow::Owned(out)
}

/// Escape a command for embedding between the double quotes of
/// `sh -c "..."`.
///
/// Backquote, double quote, `!` and backslash each get a backslash.
/// Only the first `$` of a `$$` run is escaped, so the `$$` pairs
/// written by the command translator survive as a single Ninja escape.
pub fn escape_shell(s: &str) -> Cow<'_, str> {
    if !s.bytes().any(|b| matches!(b, b'$' | b'`' | b'!' | b'\\' | b'"')) {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len() + 8);
    let mut last_dollar = false;
    for c in s.chars() {
        match c {
            '$' if last_dollar => {
                out.push(c);
                last_dollar = false;
            }
            '$' => {
                out.push('\\');
                out.push(c);
                last_dollar = true;
            }
            '`' | '"' | '!' | '\\' => {
                out.push('\\');
                out.push(c);
                last_dollar = false;
            }
            _ => {
                out.push(c);
                last_dollar = false;
            }
        }
    }
    Cow::Owned(out)
}
