use std::io::BufRead;

use crate::decoder::StatementParser;
use crate::error::{Position, RdfError, Result};
use crate::lexical::names::{is_pn_chars, is_pn_chars_u};
use crate::lexical::{
    LineReader, is_valid_lang_tag, resolve_checked, unescape_iri, unescape_string_with,
};
use crate::limits::{DepthTracker, check_statement_len};
use crate::model::*;
use crate::options::DecoderOptions;

/// Line-oriented N-Triples / N-Quads parser. Every non-blank, non-comment
/// line holds exactly one statement.
pub struct NTriplesParser<R> {
    lines: LineReader<R>,
    quads: bool,
    options: DecoderOptions,
}

impl<R: BufRead> NTriplesParser<R> {
    pub fn new(reader: R, quads: bool, options: &DecoderOptions) -> Self {
        let format = if quads { "nquads" } else { "ntriples" };
        Self {
            lines: LineReader::new(reader, options.max_line_bytes, format)
                .with_cancellation(options.cancellation.clone()),
            quads,
            options: options.clone(),
        }
    }

    fn format_name(&self) -> &'static str {
        if self.quads { "nquads" } else { "ntriples" }
    }
}

impl<R: BufRead> StatementParser for NTriplesParser<R> {
    fn parse_step(&mut self, sink: &mut dyn FnMut(Statement) -> Result<()>) -> Result<bool> {
        while let Some(line) = self.lines.next_line()? {
            let trimmed = line.trim();
            // Skip empty lines and comments
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let line_number = self.lines.line_number();
            let line_offset = self.lines.line_offset() as i64;
            let located = |e: RdfError, pos: usize| {
                let column = line[..pos.min(line.len())].chars().count() as u64 + 1;
                e.with_position(
                    self.format_name(),
                    Position::new(line_number, column, line_offset + pos as i64),
                    &line,
                )
            };
            check_statement_len(line.len(), self.options.max_statement_bytes)
                .map_err(|e| located(e, 0))?;

            let mut cursor = Cursor::new(&line, self.quads, &self.options);
            let statement = cursor.statement().map_err(|e| located(e, cursor.pos))?;
            sink(statement)?;
            return Ok(true);
        }
        Ok(false)
    }
}

/// Parse a single N-Triples or N-Quads line.
pub fn parse_line(line: &str, quads: bool, options: &DecoderOptions) -> Result<Statement> {
    Cursor::new(line, quads, options).statement()
}

struct Cursor<'a> {
    input: &'a str,
    pos: usize,
    quads: bool,
    options: &'a DecoderOptions,
    depth: DepthTracker,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str, quads: bool, options: &'a DecoderOptions) -> Self {
        Self {
            input,
            pos: 0,
            quads,
            options,
            depth: DepthTracker::new(options.max_depth),
        }
    }

    fn statement(&mut self) -> Result<Statement> {
        self.skip_whitespace();
        let subject = self.parse_subject(true)?;
        self.skip_whitespace();
        let predicate = self.parse_iri()?;
        self.skip_whitespace();
        let object = self.parse_object(true)?;
        self.skip_whitespace();

        let graph = if self.peek() == Some('.') || self.peek().is_none() {
            GraphLabel::Default
        } else if self.quads {
            let g = self.parse_graph()?;
            self.skip_whitespace();
            g
        } else {
            return Err(RdfError::parse(
                "unexpected fourth term; N-Triples statements have no graph",
            ));
        };

        self.expect_char('.')?;
        // Allow trailing whitespace and a comment after the dot
        self.skip_whitespace();
        match self.peek() {
            None | Some('#') => {}
            Some(_) => return Err(RdfError::parse("unexpected content after '.'")),
        }

        Ok(Statement {
            subject,
            predicate,
            object,
            graph,
        })
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn starts_with(&self, s: &str) -> bool {
        self.remaining().starts_with(s)
    }

    fn advance(&mut self, n: usize) {
        self.pos += n;
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == ' ' || ch == '\t' {
                self.advance(ch.len_utf8());
            } else {
                break;
            }
        }
    }

    fn expect_char(&mut self, expected: char) -> Result<()> {
        match self.peek() {
            Some(ch) if ch == expected => {
                self.advance(ch.len_utf8());
                Ok(())
            }
            Some(ch) => Err(RdfError::parse(format!(
                "expected '{expected}', found '{ch}'"
            ))),
            None => Err(RdfError::parse(format!(
                "expected '{expected}', found end of line"
            ))),
        }
    }

    fn parse_iri(&mut self) -> Result<NamedNode> {
        self.expect_char('<')?;
        let start = self.pos;
        loop {
            match self.peek() {
                Some('>') => {
                    let raw = &self.input[start..self.pos];
                    self.advance(1); // skip '>'
                    let iri = unescape_iri(raw)?;
                    let iri = resolve_checked(
                        self.options.base_iri.as_deref(),
                        &iri,
                        self.options.strict_iri_validation,
                    )?;
                    return Ok(NamedNode::new(iri));
                }
                Some(ch @ ('\u{0000}'..='\u{0020}' | '<' | '"' | '{' | '}' | '|' | '^' | '`')) => {
                    return Err(RdfError::invalid_iri(format!(
                        "unexpected character {ch:?} in IRI"
                    )));
                }
                Some(ch) => self.advance(ch.len_utf8()),
                None => return Err(RdfError::parse("unterminated IRI")),
            }
        }
    }

    fn parse_blank_node(&mut self) -> Result<BlankNode> {
        // Expect "_:"
        self.expect_char('_')?;
        self.expect_char(':')?;
        let start = self.pos;
        match self.peek() {
            Some(ch) if is_pn_chars_u(ch) || ch.is_ascii_digit() => self.advance(ch.len_utf8()),
            _ => return Err(RdfError::parse("empty blank node label")),
        }
        while let Some(ch) = self.peek() {
            if is_pn_chars(ch) || ch == '.' {
                self.advance(ch.len_utf8());
            } else {
                break;
            }
        }
        // A trailing dot terminates the statement.
        while self.input[start..self.pos].ends_with('.') {
            self.pos -= 1;
        }
        Ok(BlankNode::new(&self.input[start..self.pos]))
    }

    fn parse_quoted_triple(&mut self) -> Result<Term> {
        self.advance(2); // skip "<<"
        self.depth.enter()?;
        self.skip_whitespace();
        let subject = self.parse_subject(false)?;
        self.skip_whitespace();
        let predicate = self.parse_iri()?;
        self.skip_whitespace();
        let object = self.parse_object(false)?;
        self.skip_whitespace();
        if !self.starts_with(">>") {
            return Err(RdfError::parse("expected '>>' to close quoted triple"));
        }
        self.advance(2);
        self.depth.exit();
        Ok(Term::QuotedTriple(Box::new(Triple {
            subject,
            predicate,
            object,
        })))
    }

    fn check_quoted_allowed(&self, outer: bool) -> Result<()> {
        if outer && !self.options.allow_quoted_triple_statement {
            return Err(RdfError::parse("quoted triples are not allowed here"));
        }
        Ok(())
    }

    fn parse_subject(&mut self, outer: bool) -> Result<Term> {
        match self.peek() {
            Some('<') if self.starts_with("<<") => {
                self.check_quoted_allowed(outer)?;
                self.parse_quoted_triple()
            }
            Some('<') => Ok(Term::Iri(self.parse_iri()?)),
            Some('_') => Ok(Term::BlankNode(self.parse_blank_node()?)),
            Some(ch) => Err(RdfError::parse(format!(
                "unexpected character '{ch}' in subject position"
            ))),
            None => Err(RdfError::parse("unexpected end of line in subject position")),
        }
    }

    fn parse_object(&mut self, outer: bool) -> Result<Term> {
        match self.peek() {
            Some('<') if self.starts_with("<<") => {
                self.check_quoted_allowed(outer)?;
                self.parse_quoted_triple()
            }
            Some('<') => Ok(Term::Iri(self.parse_iri()?)),
            Some('_') => Ok(Term::BlankNode(self.parse_blank_node()?)),
            Some('"') => Ok(Term::Literal(self.parse_literal()?)),
            Some(ch) => Err(RdfError::parse(format!(
                "unexpected character '{ch}' in object position"
            ))),
            None => Err(RdfError::parse("unexpected end of line in object position")),
        }
    }

    fn parse_graph(&mut self) -> Result<GraphLabel> {
        match self.peek() {
            Some('<') if self.starts_with("<<") => Err(RdfError::parse(
                "graph label must be an IRI or blank node",
            )),
            Some('<') => Ok(GraphLabel::Named(self.parse_iri()?)),
            Some('_') => Ok(GraphLabel::Blank(self.parse_blank_node()?)),
            Some(ch) => Err(RdfError::parse(format!(
                "unexpected character '{ch}' in graph position"
            ))),
            None => Ok(GraphLabel::Default),
        }
    }

    fn parse_literal(&mut self) -> Result<Literal> {
        self.expect_char('"')?;
        let start = self.pos;
        // Read until unescaped quote
        loop {
            match self.peek() {
                Some('\\') => {
                    self.advance(1);
                    match self.peek() {
                        Some(ch) => self.advance(ch.len_utf8()),
                        None => return Err(RdfError::parse("trailing backslash in literal")),
                    }
                }
                Some('"') => break,
                Some(ch) => self.advance(ch.len_utf8()),
                None => return Err(RdfError::parse("unterminated string literal")),
            }
        }
        let raw = &self.input[start..self.pos];
        self.advance(1);
        let value = unescape_string_with(raw, self.options.lenient_escapes)?;

        // Check for language tag or datatype
        match self.peek() {
            Some('@') => {
                self.advance(1);
                let start = self.pos;
                while let Some(ch) = self.peek() {
                    if ch.is_ascii_alphanumeric() || ch == '-' {
                        self.advance(1);
                    } else {
                        break;
                    }
                }
                let lang = &self.input[start..self.pos];
                if !is_valid_lang_tag(lang) {
                    return Err(RdfError::invalid_literal(format!(
                        "invalid language tag '{lang}'"
                    )));
                }
                Ok(Literal::lang(value, lang))
            }
            Some('^') => {
                self.advance(1);
                self.expect_char('^')?;
                let datatype = self.parse_iri()?;
                Ok(Literal::typed(value, datatype))
            }
            _ => Ok(Literal::new(value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::io::Cursor as IoCursor;

    fn parse(input: &str, quads: bool, options: &DecoderOptions) -> Result<Vec<Statement>> {
        let mut parser = NTriplesParser::new(IoCursor::new(input.as_bytes()), quads, options);
        let mut out = Vec::new();
        while parser.parse_step(&mut |st: Statement| {
            out.push(st);
            Ok(())
        })? {}
        Ok(out)
    }

    fn triples(input: &str) -> Result<Vec<Statement>> {
        parse(input, false, &DecoderOptions::default())
    }

    fn quads(input: &str) -> Result<Vec<Statement>> {
        parse(input, true, &DecoderOptions::default())
    }

    #[test]
    fn parse_simple_triple() {
        let input = "<http://example.org/s> <http://example.org/p> <http://example.org/o> .\n";
        let statements = triples(input).unwrap();
        assert_eq!(statements.len(), 1);
        let st = &statements[0];
        assert_eq!(st.subject, Term::iri("http://example.org/s"));
        assert_eq!(st.predicate, NamedNode::new("http://example.org/p"));
        assert_eq!(st.object, Term::iri("http://example.org/o"));
        assert!(st.is_triple());
    }

    #[test]
    fn parse_blank_nodes() {
        let statements = triples("_:b0 <http://example.org/p> _:b1.\n").unwrap();
        assert_eq!(statements[0].subject, Term::blank("b0"));
        assert_eq!(statements[0].object, Term::blank("b1"));
    }

    #[test]
    fn parse_typed_literal() {
        let input = "<http://example.org/s> <http://example.org/p> \"42\"^^<http://www.w3.org/2001/XMLSchema#integer> .\n";
        let statements = triples(input).unwrap();
        let lit = statements[0].object.as_literal().unwrap();
        assert_eq!(lit.value, "42");
        assert_eq!(lit.datatype_iri(), xsd::INTEGER);
        assert!(lit.language.is_none());
    }

    #[test]
    fn parse_lang_literal() {
        let statements =
            triples("<http://example.org/s> <http://example.org/p> \"bonjour\"@fr-CA .\n").unwrap();
        let lit = statements[0].object.as_literal().unwrap();
        assert_eq!(lit.value, "bonjour");
        assert_eq!(lit.language(), Some("fr-CA"));
    }

    #[test]
    fn invalid_lang_tag_is_rejected() {
        let err = triples("<s> <p> \"x\"@123 .\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidLiteral);
    }

    #[test]
    fn parse_named_graph() {
        let statements = quads("<s> <p> <o> <g> .\n").unwrap();
        assert_eq!(statements[0].graph, GraphLabel::Named(NamedNode::new("g")));
        assert!(statements[0].is_quad());
    }

    #[test]
    fn ntriples_rejects_fourth_term() {
        let err = triples("<s> <p> <o> <g> .\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParseError);
        let pos = err.position().unwrap();
        assert_eq!(pos.line, 1);
        assert_eq!(pos.column, 13);
    }

    #[test]
    fn parse_escaped_literal() {
        let input = r#"<http://example.org/s> <http://example.org/p> "line1\nline2\t\"quoted\" é" ."#;
        let statements = triples(input).unwrap();
        let lit = statements[0].object.as_literal().unwrap();
        assert_eq!(lit.value, "line1\nline2\t\"quoted\" é");
    }

    #[test]
    fn unknown_escape_is_strict_by_default() {
        let err = triples(r#"<s> <p> "a\qb" ."#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidLiteral);

        let lenient = DecoderOptions::builder().with_lenient_escapes(true).build();
        let statements = parse(r#"<s> <p> "a\qb" ."#, false, &lenient).unwrap();
        assert_eq!(statements[0].object.as_literal().unwrap().value, "aqb");
    }

    #[test]
    fn parse_skip_comments_and_empty() {
        let input = "# comment\n\n<http://example.org/s> <http://example.org/p> <http://example.org/o> . # done\n\n";
        assert_eq!(triples(input).unwrap().len(), 1);
    }

    #[test]
    fn parse_quoted_triple_subject() {
        let statements = triples("<< <s> <p> <o> >> <asserted> \"true\" .\n").unwrap();
        match &statements[0].subject {
            Term::QuotedTriple(t) => {
                assert_eq!(t.subject, Term::iri("s"));
                assert_eq!(t.object, Term::iri("o"));
            }
            other => panic!("expected quoted triple, got {other:?}"),
        }
    }

    #[test]
    fn quoted_triples_can_be_disabled() {
        let options = DecoderOptions::builder()
            .with_quoted_triple_statements(false)
            .build();
        let err = parse("<<<s> <p> <o>>> <q> <r> .\n", false, &options).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParseError);
    }

    #[test]
    fn nested_quoted_triples_respect_depth() {
        let options = DecoderOptions::builder().with_max_depth(1).build();
        let err = parse("<< << <a> <b> <c> >> <p> <o> >> <q> <r> .\n", false, &options).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DepthExceeded);
    }

    #[test]
    fn relative_iris_resolve_against_base() {
        let options = DecoderOptions::builder()
            .with_base_iri("http://example.org/dir/")
            .build();
        let statements = parse("<s> <p> <../o> .\n", false, &options).unwrap();
        assert_eq!(statements[0].subject, Term::iri("http://example.org/dir/s"));
        assert_eq!(statements[0].object, Term::iri("http://example.org/o"));
    }

    #[test]
    fn strict_validation_rejects_relative() {
        let options = DecoderOptions::builder()
            .with_strict_iri_validation(true)
            .build();
        let err = parse("<s> <p> <o> .\n", false, &options).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidIri);
    }

    #[test]
    fn parse_error_malformed() {
        assert!(triples("not valid ntriples\n").is_err());
        assert!(triples("<s> <p> <o> . extra\n").is_err());
        assert!(triples("<s> <p> \"open .\n").is_err());
    }

    #[test]
    fn long_line_is_skipped_after_error() {
        let options = DecoderOptions::builder().with_max_line_bytes(20).build();
        let input = "<s> <p> \"this line is far too long\" .\n<a> <b> <c> .\n";
        let mut parser = NTriplesParser::new(IoCursor::new(input.as_bytes()), false, &options);
        let mut sink = |_: Statement| -> Result<()> { Ok(()) };
        let err = parser.parse_step(&mut sink).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LineTooLong);
        assert!(parser.parse_step(&mut sink).unwrap());
    }

    #[test]
    fn parse_line_directly() {
        let st = parse_line("_:x <p> \"v\" _:g .", true, &DecoderOptions::default()).unwrap();
        assert_eq!(st.graph, GraphLabel::Blank(BlankNode::new("g")));
    }
}
