use crate::error::{RdfError, Result};

/// Escape a string value for a double-quoted N-Triples/Turtle literal.
///
/// Escapes: `\t`, `\n`, `\r`, `\"`, `\\`.
/// Other control characters are escaped as `\uXXXX`.
pub fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            c if c < '\u{0020}' || c == '\u{007F}' => {
                let cp = c as u32;
                out.push_str(&format!("\\u{cp:04X}"));
            }
            c => out.push(c),
        }
    }
    out
}

/// Unescape a quoted string body.
///
/// Handles: `\t`, `\n`, `\r`, `\b`, `\f`, `\"`, `\'`, `\\`, `\uXXXX` (with
/// surrogate pairs) and `\UXXXXXXXX`. Unknown escape letters fail.
pub fn unescape_string(s: &str) -> Result<String> {
    unescape_string_with(s, false)
}

/// Unescape a quoted string body; `lenient` lets unknown escape letters
/// through as the letter itself.
pub fn unescape_string_with(s: &str, lenient: bool) -> Result<String> {
    if !s.contains('\\') {
        return Ok(s.to_string());
    }
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('b') => out.push('\u{0008}'),
            Some('f') => out.push('\u{000C}'),
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            Some('\\') => out.push('\\'),
            Some('u') => out.push(unescape_utf16(&mut chars)?),
            Some('U') => {
                let cp = read_hex(&mut chars, 8)?;
                let c = char::from_u32(cp).ok_or_else(|| {
                    RdfError::invalid_literal(format!("invalid unicode codepoint: \\U{cp:08X}"))
                })?;
                out.push(c);
            }
            Some(other) if lenient => {
                tracing::warn!(escape = %other, "accepting unknown string escape");
                out.push(other);
            }
            Some(other) => {
                return Err(RdfError::invalid_literal(format!(
                    "unknown escape sequence: \\{other}"
                )));
            }
            None => return Err(RdfError::invalid_literal("trailing backslash")),
        }
    }
    Ok(out)
}

/// Unescape the `\u`/`\U` escapes allowed inside an IRI reference.
pub fn unescape_iri(s: &str) -> Result<String> {
    if !s.contains('\\') {
        return Ok(s.to_string());
    }
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('u') => out.push(unescape_utf16(&mut chars)?),
            Some('U') => {
                let cp = read_hex(&mut chars, 8)?;
                let c = char::from_u32(cp).ok_or_else(|| {
                    RdfError::invalid_iri(format!("invalid unicode codepoint: \\U{cp:08X}"))
                })?;
                out.push(c);
            }
            Some(other) => {
                return Err(RdfError::invalid_iri(format!(
                    "escape \\{other} is not allowed in an IRI"
                )));
            }
            None => return Err(RdfError::invalid_iri("trailing backslash")),
        }
    }
    Ok(out)
}

/// Decode the hex digits after `\u`, combining a following low surrogate.
fn unescape_utf16(chars: &mut std::str::Chars<'_>) -> Result<char> {
    let cp = read_hex(chars, 4)?;
    if (0xDC00..=0xDFFF).contains(&cp) {
        return Err(RdfError::invalid_literal(format!(
            "unpaired low surrogate: \\u{cp:04X}"
        )));
    }
    if !(0xD800..=0xDBFF).contains(&cp) {
        return char::from_u32(cp).ok_or_else(|| {
            RdfError::invalid_literal(format!("invalid unicode codepoint: \\u{cp:04X}"))
        });
    }
    match (chars.next(), chars.next()) {
        (Some('\\'), Some('u')) => {}
        _ => {
            return Err(RdfError::invalid_literal(format!(
                "unpaired high surrogate: \\u{cp:04X}"
            )));
        }
    }
    let low = read_hex(chars, 4)?;
    if !(0xDC00..=0xDFFF).contains(&low) {
        return Err(RdfError::invalid_literal(format!(
            "invalid low surrogate: \\u{low:04X}"
        )));
    }
    let combined = 0x10000 + ((cp - 0xD800) << 10) + (low - 0xDC00);
    char::from_u32(combined).ok_or_else(|| {
        RdfError::invalid_literal(format!("invalid surrogate pair: \\u{cp:04X}\\u{low:04X}"))
    })
}

fn read_hex(chars: &mut std::str::Chars<'_>, len: usize) -> Result<u32> {
    let hex: String = chars.by_ref().take(len).collect();
    if hex.len() != len || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(RdfError::invalid_literal(format!(
            "incomplete unicode escape: {hex}"
        )));
    }
    u32::from_str_radix(&hex, 16)
        .map_err(|_| RdfError::invalid_literal(format!("invalid unicode escape: {hex}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn escape_basic() {
        assert_eq!(
            escape_string("hello\tworld\n\"test\"\\end"),
            "hello\\tworld\\n\\\"test\\\"\\\\end"
        );
    }

    #[test]
    fn escape_control_characters() {
        assert_eq!(escape_string("\u{0001}"), "\\u0001");
    }

    #[test]
    fn unescape_basic() {
        assert_eq!(
            unescape_string("hello\\tworld\\n\\\"test\\\"\\\\end").unwrap(),
            "hello\tworld\n\"test\"\\end"
        );
    }

    #[test]
    fn unescape_turtle_escapes() {
        assert_eq!(unescape_string("\\b\\f\\'").unwrap(), "\u{0008}\u{000C}'");
    }

    #[test]
    fn unescape_unicode_bmp() {
        assert_eq!(unescape_string("\\u00E9").unwrap(), "é");
    }

    #[test]
    fn unescape_unicode_supplementary() {
        assert_eq!(unescape_string("\\U0001F600").unwrap(), "\u{1F600}");
    }

    #[test]
    fn unescape_surrogate_pair() {
        assert_eq!(unescape_string("\\uD83D\\uDE00").unwrap(), "\u{1F600}");
    }

    #[test]
    fn unpaired_surrogates_fail() {
        let err = unescape_string("\\uD83D").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidLiteral);
        let err = unescape_string("\\uDE00x").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidLiteral);
    }

    #[test]
    fn out_of_range_codepoint_fails() {
        let err = unescape_string("\\U00110000").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidLiteral);
    }

    #[test]
    fn roundtrip() {
        let original = "line1\nline2\ttab\"quoted\"\\backslash\u{0007}";
        let escaped = escape_string(original);
        let unescaped = unescape_string(&escaped).unwrap();
        assert_eq!(original, unescaped);
    }

    #[test]
    fn unescape_error_trailing_backslash() {
        assert!(unescape_string("test\\").is_err());
    }

    #[test]
    fn unknown_escape_strict_and_lenient() {
        assert!(unescape_string("\\x").is_err());
        assert_eq!(unescape_string_with("\\x", true).unwrap(), "x");
    }

    #[test]
    fn iri_escapes() {
        assert_eq!(unescape_iri("http://a/\\u00E9").unwrap(), "http://a/é");
        assert_eq!(
            unescape_iri("http://a/\\n").unwrap_err().kind(),
            ErrorKind::InvalidIri
        );
    }
}
