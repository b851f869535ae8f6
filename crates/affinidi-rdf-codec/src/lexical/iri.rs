use crate::error::{RdfError, Result};

/// Check if a string is an absolute IRI: a valid scheme followed by `:`
/// appearing before any `/`, `?` or `#`.
pub fn is_absolute_iri(value: &str) -> bool {
    scheme_end(value).is_some()
}

/// Byte index of the `:` terminating the scheme, if the value has one.
fn scheme_end(value: &str) -> Option<usize> {
    let end = value.find([':', '/', '?', '#'])?;
    if value.as_bytes()[end] != b':' || end == 0 {
        return None;
    }
    let scheme = &value[..end];
    let mut chars = scheme.chars();
    let first = chars.next()?;
    if !first.is_ascii_alphabetic() {
        return None;
    }
    chars
        .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.')
        .then_some(end)
}

/// The five RFC 3986 components of an IRI reference.
#[derive(Debug, Default, PartialEq, Eq)]
struct IriParts<'a> {
    scheme: Option<&'a str>,
    authority: Option<&'a str>,
    path: &'a str,
    query: Option<&'a str>,
    fragment: Option<&'a str>,
}

impl<'a> IriParts<'a> {
    fn split(value: &'a str) -> Self {
        let mut parts = IriParts::default();
        let mut rest = value;
        if let Some(hash) = rest.find('#') {
            parts.fragment = Some(&rest[hash + 1..]);
            rest = &rest[..hash];
        }
        if let Some(question) = rest.find('?') {
            parts.query = Some(&rest[question + 1..]);
            rest = &rest[..question];
        }
        if let Some(end) = scheme_end(rest) {
            parts.scheme = Some(&rest[..end]);
            rest = &rest[end + 1..];
        }
        if let Some(after) = rest.strip_prefix("//") {
            let end = after.find('/').unwrap_or(after.len());
            parts.authority = Some(&after[..end]);
            rest = &after[end..];
        }
        parts.path = rest;
        parts
    }

    fn compose(&self, path: &str) -> String {
        let mut out = String::new();
        if let Some(scheme) = self.scheme {
            out.push_str(scheme);
            out.push(':');
        }
        if let Some(authority) = self.authority {
            out.push_str("//");
            out.push_str(authority);
        }
        out.push_str(path);
        if let Some(query) = self.query {
            out.push('?');
            out.push_str(query);
        }
        if let Some(fragment) = self.fragment {
            out.push('#');
            out.push_str(fragment);
        }
        out
    }
}

/// Resolve `relative` against `base` using RFC 3986 reference resolution.
///
/// Absolute references are returned unchanged, as is everything when `base`
/// is empty.
pub fn resolve_iri(base: &str, relative: &str) -> String {
    if base.is_empty() || is_absolute_iri(relative) {
        return relative.to_string();
    }
    let b = IriParts::split(base);
    let r = IriParts::split(relative);

    let mut target = IriParts {
        scheme: b.scheme,
        fragment: r.fragment,
        ..IriParts::default()
    };
    let path;
    if r.authority.is_some() {
        target.authority = r.authority;
        target.query = r.query;
        path = remove_dot_segments(r.path);
    } else if r.path.is_empty() {
        target.authority = b.authority;
        target.query = r.query.or(b.query);
        path = b.path.to_string();
    } else if r.path.starts_with('/') {
        target.authority = b.authority;
        target.query = r.query;
        path = remove_dot_segments(r.path);
    } else {
        target.authority = b.authority;
        target.query = r.query;
        let merged = if b.authority.is_some() && b.path.is_empty() {
            format!("/{}", r.path)
        } else {
            match b.path.rfind('/') {
                Some(slash) => format!("{}{}", &b.path[..=slash], r.path),
                None => r.path.to_string(),
            }
        };
        path = remove_dot_segments(&merged);
    }
    target.compose(&path)
}

/// RFC 3986 section 5.2.4.
fn remove_dot_segments(path: &str) -> String {
    let mut input = path;
    let mut output: Vec<&str> = Vec::new();
    let absolute = path.starts_with('/');
    while !input.is_empty() {
        if let Some(rest) = input.strip_prefix("../") {
            input = rest;
        } else if let Some(rest) = input.strip_prefix("./") {
            input = rest;
        } else if input.starts_with("/./") {
            input = &input[2..];
        } else if input == "/." {
            input = "/";
        } else if input.starts_with("/../") {
            input = &input[3..];
            output.pop();
        } else if input == "/.." {
            input = "/";
            output.pop();
        } else if input == "." || input == ".." {
            input = "";
        } else {
            let start = usize::from(input.starts_with('/'));
            let end = input[start..]
                .find('/')
                .map(|i| i + start)
                .unwrap_or(input.len());
            output.push(&input[..end]);
            input = &input[end..];
        }
    }
    let joined: String = output.concat();
    if absolute && !joined.starts_with('/') {
        format!("/{joined}")
    } else {
        joined
    }
}

/// Validate an IRI against the RFC 3987 character rules: absolute, no
/// forbidden characters, well-formed percent escapes.
pub fn validate_iri(iri: &str) -> Result<()> {
    if !is_absolute_iri(iri) {
        return Err(RdfError::invalid_iri(format!("<{iri}> is not absolute")));
    }
    let bytes = iri.as_bytes();
    for (i, ch) in iri.char_indices() {
        match ch {
            '\u{0000}'..='\u{0020}' | '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\' => {
                return Err(RdfError::invalid_iri(format!(
                    "<{iri}> contains forbidden character {ch:?}"
                )));
            }
            '%' => {
                let valid = bytes.get(i + 1).is_some_and(u8::is_ascii_hexdigit)
                    && bytes.get(i + 2).is_some_and(u8::is_ascii_hexdigit);
                if !valid {
                    return Err(RdfError::invalid_iri(format!(
                        "<{iri}> has a malformed percent escape"
                    )));
                }
            }
            _ => {}
        }
    }
    Ok(())
}

/// Resolve `value` against an optional base and, when `strict`, validate the
/// result.
pub fn resolve_checked(base: Option<&str>, value: &str, strict: bool) -> Result<String> {
    let resolved = match base {
        Some(base) if !is_absolute_iri(value) => resolve_iri(base, value),
        _ => value.to_string(),
    };
    if strict {
        validate_iri(&resolved)?;
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "http://a/b/c/d;p?q";

    #[test]
    fn absolute_detection() {
        assert!(is_absolute_iri("http://example.org/"));
        assert!(is_absolute_iri("urn:uuid:1234"));
        assert!(!is_absolute_iri("foo/bar:baz"));
        assert!(!is_absolute_iri("#frag"));
        assert!(!is_absolute_iri(":local"));
        assert!(!is_absolute_iri("1abc:def"));
    }

    #[test]
    fn rfc3986_normal_examples() {
        let cases = [
            ("g:h", "g:h"),
            ("g", "http://a/b/c/g"),
            ("./g", "http://a/b/c/g"),
            ("g/", "http://a/b/c/g/"),
            ("/g", "http://a/g"),
            ("//g", "http://g"),
            ("?y", "http://a/b/c/d;p?y"),
            ("g?y", "http://a/b/c/g?y"),
            ("#s", "http://a/b/c/d;p?q#s"),
            ("g#s", "http://a/b/c/g#s"),
            (";x", "http://a/b/c/;x"),
            ("", "http://a/b/c/d;p?q"),
            (".", "http://a/b/c/"),
            ("./", "http://a/b/c/"),
            ("..", "http://a/b/"),
            ("../", "http://a/b/"),
            ("../g", "http://a/b/g"),
            ("../..", "http://a/"),
            ("../../g", "http://a/g"),
        ];
        for (relative, expected) in cases {
            assert_eq!(resolve_iri(BASE, relative), expected, "resolving {relative}");
        }
    }

    #[test]
    fn rfc3986_abnormal_examples() {
        assert_eq!(resolve_iri(BASE, "../../../g"), "http://a/g");
        assert_eq!(resolve_iri(BASE, "/./g"), "http://a/g");
        assert_eq!(resolve_iri(BASE, "/../g"), "http://a/g");
        assert_eq!(resolve_iri(BASE, "g."), "http://a/b/c/g.");
        assert_eq!(resolve_iri(BASE, "./g/."), "http://a/b/c/g/");
        assert_eq!(resolve_iri(BASE, "g;x=1/../y"), "http://a/b/c/y");
    }

    #[test]
    fn empty_base_returns_relative() {
        assert_eq!(resolve_iri("", "foo"), "foo");
    }

    #[test]
    fn base_without_path() {
        assert_eq!(resolve_iri("http://example.org", "s"), "http://example.org/s");
    }

    #[test]
    fn resolution_is_idempotent() {
        let once = resolve_iri(BASE, "../x#y");
        assert_eq!(resolve_iri(BASE, &once), once);
    }

    #[test]
    fn validation() {
        assert!(validate_iri("http://example.org/a%20b").is_ok());
        assert!(validate_iri("http://example.org/a b").is_err());
        assert!(validate_iri("http://example.org/a%2").is_err());
        assert!(validate_iri("relative/path").is_err());
        assert!(validate_iri("http://example.org/{x}").is_err());
    }
}
