// src/diagnostic/ansi.rs

//! Removal of SGR colour sequences (`ESC [ <digits> m`) from tool output.

use std::borrow::Cow;

const ESC: char = '\x1b';

/// Strip every `ESC [ <digits> m` sequence from `line`.
///
/// Anything that only looks like the start of a sequence (an `ESC` not
/// followed by `[`, digits and `m`) is left untouched.
pub fn strip_ansi(line: &str) -> Cow<'_, str> {
    if !line.contains(ESC) {
        return Cow::Borrowed(line);
    }

    let mut out = String::with_capacity(line.len());
    let mut rest = line;

    while let Some(pos) = rest.find(ESC) {
        out.push_str(&rest[..pos]);
        let after_esc = &rest[pos + ESC.len_utf8()..];
        match sgr_len(after_esc) {
            Some(len) => rest = &after_esc[len..],
            None => {
                out.push(ESC);
                rest = after_esc;
            }
        }
    }
    out.push_str(rest);

    Cow::Owned(out)
}

/// Length of `[<digits>m` at the start of `s`, if present.
fn sgr_len(s: &str) -> Option<usize> {
    let body = s.strip_prefix('[')?;
    let digits = body.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 || body.as_bytes().get(digits) != Some(&b'm') {
        return None;
    }
    Some(1 + digits + 1)
}
