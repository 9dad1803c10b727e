//! JavaScript string-literal escape handling.

use std::borrow::Cow;

const REPLACEMENT: char = char::REPLACEMENT_CHARACTER;

/// Parse exactly `len` hex digits at the start of `s`.
fn take_hex(s: &str, len: usize) -> Option<u32> {
    s.get(..len)
        .filter(|digits| digits.bytes().all(|b| b.is_ascii_hexdigit()))
        .and_then(|digits| u32::from_str_radix(digits, 16).ok())
}

/// Parse the payload of a `\u` escape: `XXXX` or `{X..}`.
///
/// Returns the code point (or UTF-16 unit) and the bytes consumed.
fn take_unicode(s: &str) -> Option<(u32, usize)> {
    if let Some(braced) = s.strip_prefix('{') {
        let close = braced.find('}')?;
        let digits = &braced[..close];
        if digits.is_empty() || digits.len() > 6 {
            return None;
        }
        return take_hex(digits, digits.len()).map(|cp| (cp, close + 2));
    }
    take_hex(s, 4).map(|unit| (unit, 4))
}

/// Resolve JavaScript escape sequences in the body of a string literal.
///
/// Handles the single-character escapes, `\xHH`, `\uHHHH` (combining
/// surrogate pairs), `\u{...}` and line continuations. Unknown escapes
/// resolve to the escaped character, and malformed hex escapes keep the
/// letter, as browsers do for non-strict legacy code. Lone surrogates become
/// U+FFFD.
pub fn unescape(raw: &str) -> Cow<'_, str> {
    if !raw.contains('\\') {
        return Cow::Borrowed(raw);
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(pos) = rest.find('\\') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos + 1..];

        let Some(esc) = rest.chars().next() else {
            out.push('\\');
            break;
        };
        rest = &rest[esc.len_utf8()..];

        match esc {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '0' => out.push('\0'),
            '\r' => rest = rest.strip_prefix('\n').unwrap_or(rest),
            '\n' | '\u{2028}' | '\u{2029}' => {}
            'x' => match take_hex(rest, 2) {
                Some(cp) => {
                    out.push(char::from_u32(cp).unwrap_or(REPLACEMENT));
                    rest = &rest[2..];
                }
                None => out.push('x'),
            },
            'u' => match take_unicode(rest) {
                Some((unit, used)) => {
                    rest = &rest[used..];
                    if (0xD800..0xDC00).contains(&unit) {
                        let low = rest
                            .strip_prefix("\\u")
                            .and_then(|tail| take_hex(tail, 4))
                            .filter(|low| (0xDC00..0xE000).contains(low));
                        match low {
                            Some(low) => {
                                rest = &rest[6..];
                                let cp = 0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00);
                                out.push(char::from_u32(cp).unwrap_or(REPLACEMENT));
                            }
                            None => out.push(REPLACEMENT),
                        }
                    } else {
                        out.push(char::from_u32(unit).unwrap_or(REPLACEMENT));
                    }
                }
                None => out.push('u'),
            },
            other => out.push(other),
        }
    }

    out.push_str(rest);
    Cow::Owned(out)
}
