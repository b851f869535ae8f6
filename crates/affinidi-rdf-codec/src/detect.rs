/*!
 * Format detection from a leading sample of the input
 */

use std::io::{Chain, Cursor, Read};

use crate::error::{RdfError, Result};
use crate::format::Format;

/// Number of bytes inspected by [`detect_format`].
pub const SAMPLE_SIZE: usize = 512;

/// Guess the format of `reader` from its first [`SAMPLE_SIZE`] bytes.
///
/// Returns the format together with a reader that replays the sample before
/// the rest of the input, so the chosen parser sees every byte. Detection is
/// best effort: malformed JSON may still be classified as JSON-LD and fail
/// later in the parser.
///
/// Example:
/// ```
/// use affinidi_rdf_codec::{Format, detect_format};
/// use std::io::Read;
///
/// let input = "<http://example.org/s> <http://example.org/p> \"o\" .\n";
/// let (format, mut reader) = detect_format(input.as_bytes()).unwrap();
/// assert_eq!(format, Format::NTriples);
/// let mut replayed = String::new();
/// reader.read_to_string(&mut replayed).unwrap();
/// assert_eq!(replayed, input);
/// ```
pub fn detect_format<R: Read>(mut reader: R) -> Result<(Format, Chain<Cursor<Vec<u8>>, R>)> {
    let mut sample = vec![0u8; SAMPLE_SIZE];
    let mut filled = 0;
    while filled < SAMPLE_SIZE {
        match reader.read(&mut sample[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    sample.truncate(filled);
    let format = classify(&sample)?;
    tracing::debug!(format = %format, sample = filled, "detected RDF format");
    Ok((format, Cursor::new(sample).chain(reader)))
}

/// Classify a leading sample of a document.
pub fn classify(sample: &[u8]) -> Result<Format> {
    let decoded = String::from_utf8_lossy(sample);
    let text = skip_comments(decoded.trim_start_matches('\u{feff}'));
    if text.is_empty() {
        return Err(RdfError::unsupported("cannot detect the format of empty input"));
    }

    if text.starts_with('{') || text.starts_with('[') {
        let keyworded = ["\"@context\"", "\"@id\"", "\"@type\""]
            .iter()
            .any(|keyword| text.contains(keyword));
        if keyworded || is_json_prefix(text) {
            return Ok(Format::JsonLd);
        }
    }

    if text.starts_with("<?xml") || text.starts_with("<rdf:") || text.starts_with("<!DOCTYPE rdf") {
        return Ok(Format::RdfXml);
    }

    let skeleton = skeleton(text);
    if starts_with_directive(text) {
        return Ok(if has_graph_syntax(&skeleton) {
            Format::TriG
        } else {
            Format::Turtle
        });
    }

    if text.starts_with('<') || text.starts_with("_:") {
        if has_graph_syntax(&skeleton) {
            return Ok(Format::TriG);
        }
        if has_turtle_punctuation(&skeleton) {
            return Ok(Format::Turtle);
        }
        let line = skeleton
            .lines()
            .map(str::trim)
            .find(|line| line.ends_with('.'))
            .or_else(|| skeleton.lines().map(str::trim).find(|line| !line.is_empty()))
            .unwrap_or_default();
        return Ok(if count_terms(line) >= 4 {
            Format::NQuads
        } else {
            Format::NTriples
        });
    }

    if has_graph_syntax(&skeleton) && text.starts_with('{') {
        return Ok(Format::TriG);
    }
    if has_prefixed_name(&skeleton) {
        return Ok(Format::Turtle);
    }
    Err(RdfError::unsupported("cannot detect the RDF format of the input"))
}

/// Drop leading whitespace and `#` comment lines.
fn skip_comments(mut text: &str) -> &str {
    loop {
        text = text.trim_start();
        if !text.starts_with('#') {
            return text;
        }
        text = match text.find('\n') {
            Some(nl) => &text[nl + 1..],
            None => "",
        };
    }
}

fn starts_with_directive(text: &str) -> bool {
    let word: String = text
        .chars()
        .take_while(|c| !c.is_whitespace() && *c != '<')
        .collect();
    matches!(word.as_str(), "@prefix" | "@base" | "@version")
        || ["PREFIX", "BASE", "VERSION"]
            .iter()
            .any(|keyword| word.eq_ignore_ascii_case(keyword))
}

/// The text with string and IRI contents removed and comments dropped.
/// Strings become `""`, IRIs `<>`, and `<<` stays as is.
fn skeleton(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '<' if chars.get(i + 1) == Some(&'<') => {
                out.push_str("<<");
                i += 2;
            }
            '<' => {
                out.push_str("<>");
                i += 1;
                while i < chars.len() && chars[i] != '>' && chars[i] != '\n' {
                    i += 1;
                }
                i += 1;
            }
            quote @ ('"' | '\'') => {
                out.push_str("\"\"");
                let long = chars.get(i + 1) == Some(&quote) && chars.get(i + 2) == Some(&quote);
                i += if long { 3 } else { 1 };
                while i < chars.len() {
                    if chars[i] == '\\' {
                        i += 2;
                        continue;
                    }
                    if chars[i] == quote {
                        if !long {
                            i += 1;
                            break;
                        }
                        if chars.get(i + 1) == Some(&quote) && chars.get(i + 2) == Some(&quote) {
                            i += 3;
                            break;
                        }
                    }
                    if chars[i] == '\n' && !long {
                        break;
                    }
                    i += 1;
                }
            }
            '#' => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

fn has_graph_syntax(skeleton: &str) -> bool {
    let brace = skeleton
        .char_indices()
        .any(|(i, c)| c == '{' && !skeleton[i + 1..].starts_with('|'));
    brace
        || skeleton
            .split(|c: char| !c.is_ascii_alphabetic())
            .any(|word| word.eq_ignore_ascii_case("GRAPH"))
}

fn has_turtle_punctuation(skeleton: &str) -> bool {
    skeleton.contains(['[', '(', ';', ',']) || has_prefixed_name(skeleton)
}

/// A `:` that is not part of a `_:` blank node label.
fn has_prefixed_name(skeleton: &str) -> bool {
    let bytes = skeleton.as_bytes();
    bytes.iter().enumerate().any(|(i, &b)| {
        if b != b':' {
            return false;
        }
        let blank = i >= 1
            && bytes[i - 1] == b'_'
            && (i < 2 || !(bytes[i - 2].is_ascii_alphanumeric() || bytes[i - 2] == b'_'));
        !blank
    })
}

/// Number of top-level terms before the terminating `.` of a skeleton line.
/// A quoted triple `<< ... >>` and a literal with its tag or datatype each
/// count once.
fn count_terms(line: &str) -> usize {
    let chars: Vec<char> = line.chars().collect();
    let mut depth = 0usize;
    let mut count = 0;
    let mut i = 0;
    while i < chars.len() {
        let next = chars.get(i + 1).copied();
        match (chars[i], next) {
            ('<', Some('<')) => {
                if depth == 0 {
                    count += 1;
                }
                depth += 1;
                i += 2;
            }
            ('>', Some('>')) if depth > 0 => {
                depth -= 1;
                i += 2;
            }
            ('<', Some('>')) => {
                if depth == 0 {
                    count += 1;
                }
                i += 2;
            }
            ('"', Some('"')) => {
                if depth == 0 {
                    count += 1;
                }
                i += 2;
                if chars.get(i) == Some(&'@') {
                    while i < chars.len() && !chars[i].is_whitespace() && chars[i] != '.' {
                        i += 1;
                    }
                } else if chars.get(i) == Some(&'^') && chars.get(i + 1) == Some(&'^') {
                    // `^^<>` is consumed as part of the literal.
                    i += 4;
                }
            }
            ('_', Some(':')) => {
                if depth == 0 {
                    count += 1;
                }
                i += 2;
                while i < chars.len() && !chars[i].is_whitespace() && !matches!(chars[i], '<' | '"') {
                    if chars[i] == '.' && chars.get(i + 1).is_none_or(|c| c.is_whitespace()) {
                        break;
                    }
                    i += 1;
                }
            }
            ('.', _) if depth == 0 => break,
            _ => i += 1,
        }
    }
    count
}

/// Whether `text` is structurally a prefix of a JSON document: brackets
/// nest correctly and only JSON tokens appear outside strings.
fn is_json_prefix(text: &str) -> bool {
    let mut stack = Vec::new();
    let mut in_string = false;
    let mut escaped = false;
    for c in text.chars() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' | '[' => stack.push(c),
            '}' => {
                if stack.pop() != Some('{') {
                    return false;
                }
            }
            ']' => {
                if stack.pop() != Some('[') {
                    return false;
                }
            }
            ':' | ',' | '-' | '+' | '.' => {}
            c if c.is_whitespace() || c.is_ascii_digit() => {}
            // Letters of `true`, `false`, `null` and exponents.
            't' | 'r' | 'u' | 'e' | 'f' | 'a' | 'l' | 's' | 'n' | 'E' => {}
            _ => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(text: &str) -> Result<Format> {
        classify(text.as_bytes())
    }

    #[test]
    fn canonical_snippets() {
        assert_eq!(detect("@prefix ex: <http://example.org/> .\nex:s ex:p ex:o .").unwrap(), Format::Turtle);
        assert_eq!(detect("PREFIX ex: <http://example.org/>\nex:s ex:p ex:o .").unwrap(), Format::Turtle);
        assert_eq!(
            detect("@prefix ex: <http://example.org/> .\nGRAPH ex:g { ex:s ex:p ex:o . }").unwrap(),
            Format::TriG
        );
        assert_eq!(detect("<http://a/s> <http://a/p> <http://a/o> .\n").unwrap(), Format::NTriples);
        assert_eq!(
            detect("<http://a/s> <http://a/p> <http://a/o> <http://a/g> .\n").unwrap(),
            Format::NQuads
        );
        assert_eq!(detect("<?xml version=\"1.0\"?>\n<rdf:RDF/>").unwrap(), Format::RdfXml);
        assert_eq!(detect("<rdf:RDF xmlns:rdf=\"x\"/>").unwrap(), Format::RdfXml);
        assert_eq!(detect("{\"@context\": {}, \"@id\": \"x\"}").unwrap(), Format::JsonLd);
        assert_eq!(detect("[{\"http://a/p\": 1}]").unwrap(), Format::JsonLd);
        assert_eq!(detect("<http://a/g> { <http://a/s> <http://a/p> <http://a/o> . }").unwrap(), Format::TriG);
        assert_eq!(detect("{ <http://a/s> <http://a/p> <http://a/o> . }").unwrap(), Format::TriG);
        assert_eq!(detect("ex:s ex:p ex:o .").unwrap(), Format::Turtle);
    }

    #[test]
    fn literals_and_quoted_triples_count_once() {
        assert_eq!(
            detect("<http://a/s> <http://a/p> \"v\"@en .\n").unwrap(),
            Format::NTriples
        );
        assert_eq!(
            detect("<http://a/s> <http://a/p> \"1\"^^<http://www.w3.org/2001/XMLSchema#integer> .\n")
                .unwrap(),
            Format::NTriples
        );
        assert_eq!(
            detect("<< <http://a/s> <http://a/p> <http://a/o> >> <http://a/q> \"true\" .").unwrap(),
            Format::NTriples
        );
        assert_eq!(
            detect("_:b1 <http://a/p> \"x\" _:g .\n").unwrap(),
            Format::NQuads
        );
    }

    #[test]
    fn turtle_punctuation_with_iris() {
        assert_eq!(detect("<http://a/s> <http://a/p> ( 1 2 ) .").unwrap(), Format::Turtle);
        assert_eq!(detect("<http://a/s> <http://a/p> 1 ; <http://a/q> 2 .").unwrap(), Format::Turtle);
        // Braces inside strings and IRIs do not count.
        assert_eq!(detect("<http://a/s> <http://a/p> \"{x}\" .").unwrap(), Format::NTriples);
    }

    #[test]
    fn comments_and_bom_are_skipped() {
        assert_eq!(
            detect("\u{feff}# header\n# more\n<http://a/s> <http://a/p> <http://a/o> .").unwrap(),
            Format::NTriples
        );
    }

    #[test]
    fn empty_and_unknown_input() {
        assert_eq!(detect("").unwrap_err().kind(), crate::error::ErrorKind::UnsupportedFormat);
        assert_eq!(detect("   \n\t ").unwrap_err().kind(), crate::error::ErrorKind::UnsupportedFormat);
        assert!(detect("hello world").is_err());
    }

    #[test]
    fn json_prefix_check() {
        assert!(is_json_prefix("{\"a\": [1, 2.5e3, true, null], \"b\": {"));
        assert!(!is_json_prefix("[ <http://a/p> <http://a/o> ] ."));
        assert!(!is_json_prefix("{]"));
    }

    #[test]
    fn replays_the_sample() {
        let input = "<http://a/s> <http://a/p> <http://a/o> .\n".repeat(40);
        let (format, mut reader) = detect_format(input.as_bytes()).unwrap();
        assert_eq!(format, Format::NTriples);
        let mut replayed = String::new();
        reader.read_to_string(&mut replayed).unwrap();
        assert_eq!(replayed, input);
    }
}
