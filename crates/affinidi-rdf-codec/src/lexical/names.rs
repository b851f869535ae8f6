/// Turtle `PN_CHARS_BASE`.
pub fn is_pn_chars_base(c: char) -> bool {
    matches!(c,
        'A'..='Z'
        | 'a'..='z'
        | '\u{00C0}'..='\u{00D6}'
        | '\u{00D8}'..='\u{00F6}'
        | '\u{00F8}'..='\u{02FF}'
        | '\u{0370}'..='\u{037D}'
        | '\u{037F}'..='\u{1FFF}'
        | '\u{200C}'..='\u{200D}'
        | '\u{2070}'..='\u{218F}'
        | '\u{2C00}'..='\u{2FEF}'
        | '\u{3001}'..='\u{D7FF}'
        | '\u{F900}'..='\u{FDCF}'
        | '\u{FDF0}'..='\u{FFFD}'
        | '\u{10000}'..='\u{EFFFF}')
}

/// Turtle `PN_CHARS_U`.
pub fn is_pn_chars_u(c: char) -> bool {
    c == '_' || is_pn_chars_base(c)
}

/// Turtle `PN_CHARS`.
pub fn is_pn_chars(c: char) -> bool {
    is_pn_chars_u(c)
        || c.is_ascii_digit()
        || matches!(c, '-' | '\u{00B7}' | '\u{0300}'..='\u{036F}' | '\u{203F}'..='\u{2040}')
}

/// Characters that may be backslash-escaped in a prefixed name's local part.
pub fn is_local_escape(c: char) -> bool {
    matches!(
        c,
        '_' | '~' | '.' | '-' | '!' | '$' | '&' | '\'' | '(' | ')' | '*' | '+' | ',' | ';' | '='
            | '/' | '?' | '#' | '@' | '%'
    )
}

/// Validate a BCP-47-like language tag with an optional `--ltr`/`--rtl`
/// direction suffix.
pub fn is_valid_lang_tag(tag: &str) -> bool {
    let (base, direction) = match tag.split_once("--") {
        Some((base, direction)) => (base, Some(direction)),
        None => (tag, None),
    };
    if let Some(direction) = direction
        && !direction.eq_ignore_ascii_case("ltr")
        && !direction.eq_ignore_ascii_case("rtl")
    {
        return false;
    }
    let mut subtags = base.split('-');
    let Some(primary) = subtags.next() else {
        return false;
    };
    if primary.is_empty() || primary.len() > 8 || !primary.chars().all(|c| c.is_ascii_alphabetic())
    {
        return false;
    }
    subtags.all(|sub| !sub.is_empty() && sub.chars().all(|c| c.is_ascii_alphanumeric()))
}

/// Validate a prefix label (the part before `:` in a prefixed name). The
/// empty label is the default prefix.
pub fn is_valid_prefix_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return true;
    };
    if !is_pn_chars_u(first) {
        return false;
    }
    if name.ends_with('.') {
        return false;
    }
    chars.all(|c| is_pn_chars(c) || c == '.')
}

/// True when `local` can be written after `prefix:` without any escaping.
pub fn is_valid_local_name(local: &str) -> bool {
    let mut chars = local.chars();
    let Some(first) = chars.next() else {
        return true;
    };
    if !(is_pn_chars_u(first) || first == ':' || first.is_ascii_digit()) {
        return false;
    }
    if local.ends_with('.') {
        return false;
    }
    chars.all(|c| is_pn_chars(c) || c == '.' || c == ':')
}

/// True when `label` is a valid blank node label (without the `_:`).
pub fn is_valid_blank_label(label: &str) -> bool {
    let mut chars = label.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(is_pn_chars_u(first) || first.is_ascii_digit()) {
        return false;
    }
    if label.ends_with('.') {
        return false;
    }
    chars.all(|c| is_pn_chars(c) || c == '.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lang_tags() {
        assert!(is_valid_lang_tag("en"));
        assert!(is_valid_lang_tag("en-US"));
        assert!(is_valid_lang_tag("zh-Hant-TW"));
        assert!(is_valid_lang_tag("de-1996"));
        assert!(is_valid_lang_tag("ar--rtl"));
        assert!(is_valid_lang_tag("en-GB--ltr"));
        assert!(!is_valid_lang_tag(""));
        assert!(!is_valid_lang_tag("toolongprimary"));
        assert!(!is_valid_lang_tag("1en"));
        assert!(!is_valid_lang_tag("en-"));
        assert!(!is_valid_lang_tag("en--up"));
        assert!(!is_valid_lang_tag("en--ltr--rtl"));
    }

    #[test]
    fn prefix_names() {
        assert!(is_valid_prefix_name(""));
        assert!(is_valid_prefix_name("ex"));
        assert!(is_valid_prefix_name("_ex"));
        assert!(is_valid_prefix_name("ex.a-1"));
        assert!(is_valid_prefix_name("épée"));
        assert!(!is_valid_prefix_name("ex."));
        assert!(!is_valid_prefix_name("1ex"));
        assert!(!is_valid_prefix_name("-ex"));
    }

    #[test]
    fn local_names() {
        assert!(is_valid_local_name("abc"));
        assert!(is_valid_local_name("123"));
        assert!(is_valid_local_name("a.b:c"));
        assert!(!is_valid_local_name("a."));
        assert!(!is_valid_local_name("a/b"));
        assert!(!is_valid_local_name("-a"));
    }

    #[test]
    fn blank_labels() {
        assert!(is_valid_blank_label("b0"));
        assert!(is_valid_blank_label("0"));
        assert!(!is_valid_blank_label(""));
        assert!(!is_valid_blank_label("a."));
    }
}
