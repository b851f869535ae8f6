use std::collections::HashMap;
use std::io::BufRead;

use super::lexer::{Token, TokenKind, Tokenizer};
use crate::blank::BlankNodeIssuer;
use crate::decoder::StatementParser;
use crate::error::{Position, RdfError, Result};
use crate::lexical::{
    LineReader, is_valid_lang_tag, resolve_checked, unescape_iri, unescape_string_with,
    validate_iri,
};
use crate::limits::{DepthTracker, check_statement_len};
use crate::model::*;
use crate::options::DecoderOptions;
use crate::scanner::{StatementScanner, StatementUnit};

/// Per-parse state shared by every unit of one Turtle or TriG document.
struct TurtleState {
    trig: bool,
    prefixes: HashMap<String, String>,
    base: Option<String>,
    issuer: BlankNodeIssuer,
    depth: DepthTracker,
    /// Set once a version directive has been read.
    star: bool,
    /// `None` outside a graph block.
    graph: Option<GraphLabel>,
    allow_quoted: bool,
    strict_iri: bool,
    lenient_escapes: bool,
}

/// Streaming Turtle / TriG parser. Lines are fed through the statement
/// scanner; each complete unit is tokenized and parsed on its own.
pub struct TurtleParser<R> {
    lines: LineReader<R>,
    scanner: StatementScanner,
    state: TurtleState,
    max_statement_bytes: usize,
    exhausted: bool,
}

impl<R: BufRead> TurtleParser<R> {
    pub fn new(reader: R, trig: bool, options: &DecoderOptions) -> Self {
        let format = if trig { "trig" } else { "turtle" };
        Self {
            lines: LineReader::new(reader, options.max_line_bytes, format)
                .with_cancellation(options.cancellation.clone()),
            scanner: if trig {
                StatementScanner::trig()
            } else {
                StatementScanner::new()
            },
            state: TurtleState {
                trig,
                prefixes: HashMap::new(),
                base: options.base_iri.clone(),
                issuer: BlankNodeIssuer::default(),
                depth: DepthTracker::new(options.max_depth),
                star: false,
                graph: None,
                allow_quoted: options.allow_quoted_triple_statement,
                strict_iri: options.strict_iri_validation,
                lenient_escapes: options.lenient_escapes,
            },
            max_statement_bytes: options.max_statement_bytes,
            exhausted: false,
        }
    }

    fn format_name(&self) -> &'static str {
        if self.state.trig { "trig" } else { "turtle" }
    }

    /// Current prefix map, label to namespace.
    pub fn prefixes(&self) -> &HashMap<String, String> {
        &self.state.prefixes
    }

    /// Current base IRI.
    pub fn base_iri(&self) -> Option<&str> {
        self.state.base.as_deref()
    }

    fn parse_unit(&mut self, unit: &StatementUnit) -> Result<Vec<Statement>> {
        let format = self.format_name();
        let locate = |e: RdfError, offset: usize| {
            e.with_position(format, unit.position_at(offset), &unit.text)
        };
        check_statement_len(unit.text.len(), self.max_statement_bytes)
            .map_err(|e| locate(e, 0))?;

        let mut tokenizer = Tokenizer::new(&unit.text);
        let tokens = tokenizer
            .tokenize()
            .map_err(|e| locate(e, tokenizer.offset()))?;

        self.state.depth.reset();
        let mut parser = UnitParser {
            tokens: &tokens,
            pos: 0,
            state: &mut self.state,
            out: Vec::new(),
        };
        match parser.parse() {
            Ok(()) => Ok(parser.out),
            Err(e) => {
                let offset = parser.offset(unit.text.len());
                Err(locate(e, offset))
            }
        }
    }
}

impl<R: BufRead> StatementParser for TurtleParser<R> {
    fn parse_step(&mut self, sink: &mut dyn FnMut(Statement) -> Result<()>) -> Result<bool> {
        loop {
            let unit = match self.scanner.next_unit() {
                Some(unit) => Some(unit),
                None if self.exhausted => self.scanner.finish(),
                None => {
                    match self.lines.next_line()? {
                        Some(line) => {
                            let number = self.lines.line_number();
                            self.scanner
                                .push_line(&line, number, self.lines.line_offset());
                            check_statement_len(self.scanner.pending_len(), self.max_statement_bytes)
                                .map_err(|e| {
                                    e.with_position(self.format_name(), Position::line(number), &line)
                                })?;
                        }
                        None => self.exhausted = true,
                    }
                    continue;
                }
            };
            let Some(unit) = unit else {
                if self.state.graph.is_some() {
                    return Err(RdfError::parse("unterminated graph block").with_position(
                        self.format_name(),
                        Position::line(self.lines.line_number()),
                        "",
                    ));
                }
                return Ok(false);
            };
            for statement in self.parse_unit(&unit)? {
                sink(statement)?;
            }
            return Ok(true);
        }
    }
}

/// Recursive-descent parser over the tokens of one unit.
struct UnitParser<'a> {
    tokens: &'a [Token],
    pos: usize,
    state: &'a mut TurtleState,
    out: Vec<Statement>,
}

impl<'a> UnitParser<'a> {
    fn parse(&mut self) -> Result<()> {
        while let Some(kind) = self.peek() {
            match kind {
                TokenKind::Prefix { sparql } => {
                    let sparql = *sparql;
                    self.prefix_directive(sparql)?;
                }
                TokenKind::Base { sparql } => {
                    let sparql = *sparql;
                    self.base_directive(sparql)?;
                }
                TokenKind::Version { sparql } => {
                    let sparql = *sparql;
                    self.version_directive(sparql)?;
                }
                TokenKind::Graph => {
                    self.require_trig()?;
                    self.advance();
                    let label = self.graph_label()?;
                    self.expect(TokenKind::LBrace)?;
                    self.open_graph(label)?;
                }
                TokenKind::LBrace => {
                    self.require_trig()?;
                    self.advance();
                    self.open_graph(GraphLabel::Default)?;
                }
                TokenKind::RBrace => {
                    self.require_trig()?;
                    self.close_graph()?;
                    self.advance();
                }
                _ if self.state.trig && self.graph_label_follows() => {
                    let label = self.graph_label()?;
                    self.expect(TokenKind::LBrace)?;
                    self.open_graph(label)?;
                }
                _ => self.triples_statement()?,
            }
        }
        Ok(())
    }

    // ---- token helpers ----

    fn peek(&self) -> Option<&'a TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    fn peek_at(&self, n: usize) -> Option<&'a TokenKind> {
        self.tokens.get(self.pos + n).map(|t| &t.kind)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn next(&mut self) -> Option<TokenKind> {
        let kind = self.tokens.get(self.pos).map(|t| t.kind.clone());
        if kind.is_some() {
            self.pos += 1;
        }
        kind
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek() == Some(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<()> {
        if self.eat(&kind) {
            return Ok(());
        }
        Err(self.unexpected(&format!("expected {}", kind.describe())))
    }

    fn unexpected(&self, context: &str) -> RdfError {
        match self.peek() {
            Some(kind) => RdfError::parse(format!("{context}, found {}", kind.describe())),
            None => RdfError::parse(format!("{context}, found end of statement")),
        }
    }

    /// Byte offset of the current token, or `end` past the last token.
    fn offset(&self, end: usize) -> usize {
        self.tokens.get(self.pos).map_or(end, |t| t.offset)
    }

    fn graph(&self) -> GraphLabel {
        self.state.graph.clone().unwrap_or(GraphLabel::Default)
    }

    // ---- directives ----

    fn check_directive_allowed(&self) -> Result<()> {
        if self.state.graph.is_some() {
            return Err(RdfError::parse(
                "directives are not allowed inside a graph block",
            ));
        }
        Ok(())
    }

    fn prefix_directive(&mut self, sparql: bool) -> Result<()> {
        self.check_directive_allowed()?;
        self.advance();
        let label = match self.peek() {
            Some(TokenKind::PrefixedName { prefix, local }) if local.is_empty() => prefix.clone(),
            _ => return Err(self.unexpected("expected prefix label")),
        };
        self.advance();
        let namespace = match self.peek() {
            Some(TokenKind::IriRef(raw)) => self.resolve(raw)?,
            _ => return Err(self.unexpected("expected namespace IRI")),
        };
        self.advance();
        if !sparql {
            self.expect(TokenKind::Dot)?;
        }
        tracing::debug!(prefix = %label, namespace = %namespace, "prefix declared");
        self.state.prefixes.insert(label, namespace);
        Ok(())
    }

    fn base_directive(&mut self, sparql: bool) -> Result<()> {
        self.check_directive_allowed()?;
        self.advance();
        let base = match self.peek() {
            Some(TokenKind::IriRef(raw)) => self.resolve(raw)?,
            _ => return Err(self.unexpected("expected base IRI")),
        };
        self.advance();
        if !sparql {
            self.expect(TokenKind::Dot)?;
        }
        tracing::debug!(base = %base, "base IRI changed");
        self.state.base = Some(base);
        Ok(())
    }

    fn version_directive(&mut self, sparql: bool) -> Result<()> {
        self.check_directive_allowed()?;
        self.advance();
        let version = match self.peek() {
            Some(TokenKind::String(raw)) => unescape_string_with(raw, self.state.lenient_escapes)?,
            _ => return Err(self.unexpected("expected quoted version string")),
        };
        if version.is_empty() {
            return Err(RdfError::parse("version string must not be empty"));
        }
        self.advance();
        if !sparql {
            self.expect(TokenKind::Dot)?;
        }
        tracing::debug!(version = %version, "version declared; RDF-star syntax enabled");
        self.state.star = true;
        Ok(())
    }

    // ---- TriG graph blocks ----

    fn require_trig(&self) -> Result<()> {
        if !self.state.trig {
            return Err(self.unexpected("graph blocks are only allowed in TriG"));
        }
        Ok(())
    }

    fn graph_label_follows(&self) -> bool {
        match (self.peek(), self.peek_at(1)) {
            (
                Some(
                    TokenKind::IriRef(_)
                    | TokenKind::PrefixedName { .. }
                    | TokenKind::BlankNodeLabel(_),
                ),
                Some(TokenKind::LBrace),
            ) => true,
            (Some(TokenKind::LBracket), Some(TokenKind::RBracket)) => {
                self.peek_at(2) == Some(&TokenKind::LBrace)
            }
            _ => false,
        }
    }

    fn graph_label(&mut self) -> Result<GraphLabel> {
        match self.peek() {
            Some(TokenKind::IriRef(_) | TokenKind::PrefixedName { .. }) => {
                Ok(GraphLabel::Named(self.iri()?))
            }
            Some(TokenKind::BlankNodeLabel(label)) => {
                let node = self.state.issuer.labelled(label);
                self.advance();
                Ok(GraphLabel::Blank(node))
            }
            Some(TokenKind::LBracket) if self.peek_at(1) == Some(&TokenKind::RBracket) => {
                self.pos += 2;
                Ok(GraphLabel::Blank(self.state.issuer.fresh()))
            }
            _ => Err(self.unexpected("expected graph name")),
        }
    }

    fn open_graph(&mut self, label: GraphLabel) -> Result<()> {
        if self.state.graph.is_some() {
            return Err(RdfError::parse("graph blocks may not nest"));
        }
        tracing::debug!(graph = %label, "graph block opened");
        self.state.graph = Some(label);
        Ok(())
    }

    fn close_graph(&mut self) -> Result<()> {
        match self.state.graph.take() {
            Some(label) => {
                tracing::debug!(graph = %label, "graph block closed");
                Ok(())
            }
            None => Err(RdfError::parse("'}' outside a graph block")),
        }
    }

    // ---- triples ----

    fn triples_statement(&mut self) -> Result<()> {
        let property_list_subject = self.peek() == Some(&TokenKind::LBracket)
            && self.peek_at(1) != Some(&TokenKind::RBracket);
        let subject = self.subject()?;
        let bare = property_list_subject
            && matches!(self.peek(), Some(TokenKind::Dot | TokenKind::RBrace) | None);
        if !bare {
            self.predicate_object_list(&subject)?;
        }
        match self.peek() {
            Some(TokenKind::Dot) => {
                self.advance();
                Ok(())
            }
            // The last statement of a graph block may omit its dot.
            Some(TokenKind::RBrace) if self.state.graph.is_some() => Ok(()),
            _ => Err(self.unexpected("expected '.'")),
        }
    }

    fn check_star(&self) -> Result<()> {
        if self.state.allow_quoted || self.state.star {
            return Ok(());
        }
        Err(RdfError::parse(
            "quoted triples are not enabled; declare a version or allow quoted triple statements",
        ))
    }

    fn subject(&mut self) -> Result<Term> {
        match self.peek() {
            Some(TokenKind::IriRef(_) | TokenKind::PrefixedName { .. }) => Ok(Term::Iri(self.iri()?)),
            Some(TokenKind::BlankNodeLabel(label)) => {
                let node = self.state.issuer.labelled(label);
                self.advance();
                Ok(Term::BlankNode(node))
            }
            Some(TokenKind::LBracket) => self.blank_node_property_list(),
            Some(TokenKind::LParen) => self.collection(),
            Some(TokenKind::LDoubleAngle) => {
                self.check_star()?;
                self.quoted_triple()
            }
            _ => Err(self.unexpected("expected subject")),
        }
    }

    fn verb(&mut self) -> Result<NamedNode> {
        match self.peek() {
            Some(TokenKind::A) => {
                self.advance();
                Ok(NamedNode::new(rdf::TYPE))
            }
            Some(TokenKind::IriRef(_) | TokenKind::PrefixedName { .. }) => self.iri(),
            _ => Err(self.unexpected("expected predicate")),
        }
    }

    fn predicate_object_list(&mut self, subject: &Term) -> Result<()> {
        loop {
            let predicate = self.verb()?;
            self.object_list(subject, &predicate)?;
            if !self.eat(&TokenKind::Semicolon) {
                return Ok(());
            }
            while self.eat(&TokenKind::Semicolon) {}
            if !matches!(
                self.peek(),
                Some(TokenKind::A | TokenKind::IriRef(_) | TokenKind::PrefixedName { .. })
            ) {
                return Ok(());
            }
        }
    }

    fn object_list(&mut self, subject: &Term, predicate: &NamedNode) -> Result<()> {
        loop {
            let mark = self.out.len();
            let object = self.object()?;
            let nested = self.out.split_off(mark);
            self.out.push(Statement::new(
                subject.clone(),
                predicate.clone(),
                object.clone(),
                self.graph(),
            ));
            self.out.extend(nested);
            if self.peek() == Some(&TokenKind::AnnotationOpen) {
                self.annotation(subject, predicate, object)?;
            }
            if !self.eat(&TokenKind::Comma) {
                return Ok(());
            }
        }
    }

    fn object(&mut self) -> Result<Term> {
        match self.peek() {
            Some(TokenKind::IriRef(_) | TokenKind::PrefixedName { .. }) => Ok(Term::Iri(self.iri()?)),
            Some(TokenKind::BlankNodeLabel(label)) => {
                let node = self.state.issuer.labelled(label);
                self.advance();
                Ok(Term::BlankNode(node))
            }
            Some(TokenKind::LBracket) => self.blank_node_property_list(),
            Some(TokenKind::LParen) => self.collection(),
            Some(TokenKind::LDoubleAngle) => {
                self.check_star()?;
                self.quoted_triple()
            }
            Some(
                TokenKind::String(_)
                | TokenKind::LongString(_)
                | TokenKind::Integer(_)
                | TokenKind::Decimal(_)
                | TokenKind::Double(_)
                | TokenKind::Boolean(_),
            ) => Ok(Term::Literal(self.literal()?)),
            _ => Err(self.unexpected("expected object")),
        }
    }

    fn annotation(&mut self, subject: &Term, predicate: &NamedNode, object: Term) -> Result<()> {
        self.check_star()?;
        self.advance();
        self.state.depth.enter()?;
        let quoted = Term::QuotedTriple(Box::new(Triple {
            subject: subject.clone(),
            predicate: predicate.clone(),
            object,
        }));
        self.predicate_object_list(&quoted)?;
        self.expect(TokenKind::AnnotationClose)?;
        self.state.depth.exit();
        Ok(())
    }

    fn blank_node_property_list(&mut self) -> Result<Term> {
        self.advance();
        if self.eat(&TokenKind::RBracket) {
            return Ok(Term::BlankNode(self.state.issuer.fresh()));
        }
        self.state.depth.enter()?;
        let node = Term::BlankNode(self.state.issuer.fresh());
        self.predicate_object_list(&node)?;
        self.expect(TokenKind::RBracket)?;
        self.state.depth.exit();
        Ok(node)
    }

    fn collection(&mut self) -> Result<Term> {
        self.advance();
        self.state.depth.enter()?;
        let mut items = Vec::new();
        while !self.eat(&TokenKind::RParen) {
            if self.peek().is_none() {
                return Err(RdfError::parse("unterminated collection"));
            }
            let node = self.state.issuer.fresh();
            let mark = self.out.len();
            let item = self.object()?;
            let nested = self.out.split_off(mark);
            items.push((node, item, nested));
        }
        self.state.depth.exit();

        let Some(head) = items.first().map(|(node, _, _)| node.clone()) else {
            return Ok(Term::iri(rdf::NIL));
        };
        let graph = self.graph();
        let mut nodes = items.iter().map(|(node, _, _)| node.clone()).skip(1);
        for (node, item, nested) in items.iter().cloned() {
            self.out.push(Statement::new(
                node.clone(),
                NamedNode::new(rdf::FIRST),
                item,
                graph.clone(),
            ));
            self.out.extend(nested);
            let rest = match nodes.next() {
                Some(next) => Term::BlankNode(next),
                None => Term::iri(rdf::NIL),
            };
            self.out.push(Statement::new(
                node,
                NamedNode::new(rdf::REST),
                rest,
                graph.clone(),
            ));
        }
        Ok(Term::BlankNode(head))
    }

    fn quoted_triple(&mut self) -> Result<Term> {
        self.advance();
        self.state.depth.enter()?;
        let subject = match self.peek() {
            Some(TokenKind::LDoubleAngle) => self.quoted_triple()?,
            Some(TokenKind::LBracket | TokenKind::LParen) => self.anonymous_in_quoted()?,
            Some(TokenKind::IriRef(_) | TokenKind::PrefixedName { .. } | TokenKind::BlankNodeLabel(_)) => {
                self.subject()?
            }
            _ => return Err(self.unexpected("expected quoted triple subject")),
        };
        let predicate = self.verb()?;
        let object = match self.peek() {
            Some(TokenKind::LDoubleAngle) => self.quoted_triple()?,
            Some(TokenKind::LBracket | TokenKind::LParen) => self.anonymous_in_quoted()?,
            _ => self.object()?,
        };
        self.expect(TokenKind::RDoubleAngle)?;
        self.state.depth.exit();
        Ok(Term::QuotedTriple(Box::new(Triple {
            subject,
            predicate,
            object,
        })))
    }

    /// Only `[]` may appear inside a quoted triple; property lists and
    /// collections would assert triples.
    fn anonymous_in_quoted(&mut self) -> Result<Term> {
        if self.peek() == Some(&TokenKind::LBracket) && self.peek_at(1) == Some(&TokenKind::RBracket) {
            self.pos += 2;
            return Ok(Term::BlankNode(self.state.issuer.fresh()));
        }
        Err(self.unexpected("only '[]' is allowed inside a quoted triple"))
    }

    fn literal(&mut self) -> Result<Literal> {
        let Some(kind) = self.next() else {
            return Err(self.unexpected("expected literal"));
        };
        let value = match kind {
            TokenKind::String(raw) | TokenKind::LongString(raw) => {
                unescape_string_with(&raw, self.state.lenient_escapes)?
            }
            TokenKind::Integer(lexical) => {
                return Ok(Literal::typed(lexical, NamedNode::new(xsd::INTEGER)));
            }
            TokenKind::Decimal(lexical) => {
                return Ok(Literal::typed(lexical, NamedNode::new(xsd::DECIMAL)));
            }
            TokenKind::Double(lexical) => {
                return Ok(Literal::typed(lexical, NamedNode::new(xsd::DOUBLE)));
            }
            TokenKind::Boolean(b) => {
                return Ok(Literal::typed(b.to_string(), NamedNode::new(xsd::BOOLEAN)));
            }
            _ => {
                self.pos -= 1;
                return Err(self.unexpected("expected literal"));
            }
        };
        match self.peek() {
            Some(TokenKind::LangTag(tag)) => {
                if !is_valid_lang_tag(tag) {
                    return Err(RdfError::invalid_literal(format!(
                        "invalid language tag '{tag}'"
                    )));
                }
                let tag = tag.clone();
                self.advance();
                Ok(Literal::lang(value, tag))
            }
            Some(TokenKind::DatatypeMarker) => {
                self.advance();
                let datatype = match self.peek() {
                    Some(TokenKind::IriRef(_) | TokenKind::PrefixedName { .. }) => self.iri()?,
                    _ => return Err(self.unexpected("expected datatype IRI")),
                };
                Ok(Literal::typed(value, datatype))
            }
            _ => Ok(Literal::new(value)),
        }
    }

    // ---- IRIs ----

    fn resolve(&self, raw: &str) -> Result<String> {
        let iri = unescape_iri(raw)?;
        resolve_checked(self.state.base.as_deref(), &iri, self.state.strict_iri)
    }

    fn iri(&mut self) -> Result<NamedNode> {
        let iri = match self.peek() {
            Some(TokenKind::IriRef(raw)) => self.resolve(raw)?,
            Some(TokenKind::PrefixedName { prefix, local }) => {
                let Some(namespace) = self.state.prefixes.get(prefix) else {
                    return Err(RdfError::parse(format!("undefined prefix '{prefix}:'")));
                };
                let iri = format!("{namespace}{local}");
                if self.state.strict_iri {
                    validate_iri(&iri)?;
                }
                iri
            }
            _ => return Err(self.unexpected("expected IRI")),
        };
        self.advance();
        Ok(NamedNode::new(iri))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::io::Cursor;

    fn parse_with(input: &str, trig: bool, options: &DecoderOptions) -> Result<Vec<Statement>> {
        let mut parser = TurtleParser::new(Cursor::new(input.as_bytes()), trig, options);
        let mut out = Vec::new();
        while parser.parse_step(&mut |st: Statement| {
            out.push(st);
            Ok(())
        })? {}
        Ok(out)
    }

    fn turtle(input: &str) -> Result<Vec<Statement>> {
        parse_with(input, false, &DecoderOptions::default())
    }

    fn trig(input: &str) -> Result<Vec<Statement>> {
        parse_with(input, true, &DecoderOptions::default())
    }

    fn iri(s: &str) -> Term {
        Term::iri(s)
    }

    #[test]
    fn basic_prefixed_triple() {
        let statements =
            turtle("@prefix ex: <http://example.org/> .\nex:s ex:p ex:o .\n").unwrap();
        assert_eq!(
            statements,
            vec![Statement::triple(
                iri("http://example.org/s"),
                NamedNode::new("http://example.org/p"),
                iri("http://example.org/o"),
            )]
        );
    }

    #[test]
    fn sparql_style_directives() {
        let statements = turtle("PREFIX ex: <http://example.org/>\nBASE <http://base/>\nex:s ex:p <o> .").unwrap();
        assert_eq!(statements[0].object, iri("http://base/o"));
    }

    #[test]
    fn base_changes_are_not_retroactive() {
        let statements = turtle(
            "@base <http://a/> .\n<s> <p> <o> .\n@base <http://b/> .\n<s> <p> <o> .",
        )
        .unwrap();
        assert_eq!(statements[0].subject, iri("http://a/s"));
        assert_eq!(statements[1].subject, iri("http://b/s"));
    }

    #[test]
    fn predicate_and_object_lists() {
        let statements = turtle("<s> <p> <o1>, <o2> ; <q> <o3> ;; .").unwrap();
        assert_eq!(statements.len(), 3);
        assert_eq!(statements[1].object, iri("o2"));
        assert_eq!(statements[2].predicate, NamedNode::new("q"));
    }

    #[test]
    fn a_keyword_and_literals() {
        let statements = turtle(
            "@prefix xsd: <http://www.w3.org/2001/XMLSchema#> .\n<s> a <C> ; <p> 1, 2.5, 1e3, true, \"x\"@en, \"7\"^^xsd:integer, '''multi\nline''' .",
        )
        .unwrap();
        assert_eq!(statements[0].predicate.iri, rdf::TYPE);
        let datatypes: Vec<_> = statements[1..]
            .iter()
            .map(|s| s.object.as_literal().unwrap().datatype_iri().to_string())
            .collect();
        assert_eq!(
            datatypes,
            vec![
                xsd::INTEGER,
                xsd::DECIMAL,
                xsd::DOUBLE,
                xsd::BOOLEAN,
                rdf::LANG_STRING,
                xsd::INTEGER,
                xsd::STRING
            ]
        );
        assert_eq!(
            statements[7].object.as_literal().unwrap().value,
            "multi\nline"
        );
    }

    #[test]
    fn collection_order() {
        let statements = turtle("<a> <p> ( <o1> <o2> ) .").unwrap();
        let b1 = Term::blank("b1");
        let b2 = Term::blank("b2");
        assert_eq!(
            statements,
            vec![
                Statement::triple(iri("a"), NamedNode::new("p"), b1.clone()),
                Statement::triple(b1.clone(), NamedNode::new(rdf::FIRST), iri("o1")),
                Statement::triple(b1, NamedNode::new(rdf::REST), b2.clone()),
                Statement::triple(b2.clone(), NamedNode::new(rdf::FIRST), iri("o2")),
                Statement::triple(b2, NamedNode::new(rdf::REST), iri(rdf::NIL)),
            ]
        );
    }

    #[test]
    fn empty_collection_is_nil() {
        let statements = turtle("<a> <p> () .").unwrap();
        assert_eq!(statements, vec![Statement::triple(iri("a"), NamedNode::new("p"), iri(rdf::NIL))]);
    }

    #[test]
    fn blank_node_property_lists() {
        let statements = turtle("[ <p> <o> ] <q> [ <r> \"x\" ] .").unwrap();
        assert_eq!(statements.len(), 3);
        assert_eq!(statements[0].subject, Term::blank("b1"));
        assert_eq!(statements[1].subject, Term::blank("b1"));
        assert_eq!(statements[1].object, Term::blank("b2"));
        assert_eq!(statements[2].subject, Term::blank("b2"));

        let bare = turtle("[ <p> <o> ] .").unwrap();
        assert_eq!(bare.len(), 1);
    }

    #[test]
    fn generated_labels_avoid_input_labels() {
        let statements = turtle("_:b1 <p> [] .").unwrap();
        assert_eq!(statements[0].subject, Term::blank("b1"));
        assert_eq!(statements[0].object, Term::blank("b2"));
    }

    #[test]
    fn annotations_and_quoted_triples() {
        let statements = turtle("<s> <p> <o> {| <source> <web> |} .\n<< <s> <p> <o> >> <q> 1 .").unwrap();
        assert_eq!(statements.len(), 3);
        let quoted = Term::QuotedTriple(Box::new(Triple::new(
            NamedNode::new("s"),
            NamedNode::new("p"),
            NamedNode::new("o"),
        )));
        assert_eq!(statements[1].subject, quoted);
        assert_eq!(statements[1].predicate.iri, "source");
        assert_eq!(statements[2].subject, quoted);
    }

    #[test]
    fn quoted_triples_need_star_when_disabled() {
        let options = DecoderOptions::builder()
            .with_quoted_triple_statements(false)
            .build();
        let err = parse_with("<< <s> <p> <o> >> <q> 1 .", false, &options).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParseError);

        let ok = parse_with("VERSION \"1.2\"\n<< <s> <p> <o> >> <q> 1 .", false, &options).unwrap();
        assert_eq!(ok.len(), 1);
    }

    #[test]
    fn empty_version_is_rejected() {
        let err = turtle("@version \"\" .").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParseError);
    }

    #[test]
    fn depth_limit_applies_to_every_nesting() {
        let options = DecoderOptions::builder().with_max_depth(2).build();
        assert!(parse_with("<s> <p> ((1)) .", false, &options).is_ok());
        let err = parse_with("<s> <p> (((1))) .", false, &options).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DepthExceeded);
        let err = parse_with("<s> <p> [ <q> [ <r> [ <t> 1 ] ] ] .", false, &options).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DepthExceeded);
    }

    #[test]
    fn undefined_prefix_is_located() {
        let err = turtle("<s> <p> <o> .\n\n  ex:s <p> <o> .").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParseError);
        let pos = err.position().unwrap();
        assert_eq!((pos.line, pos.column), (3, 3));
        assert!(err.to_string().starts_with("turtle:3:3: undefined prefix"));
    }

    #[test]
    fn missing_terminator_at_end_of_input() {
        let err = turtle("<s> <p> <o>").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParseError);
    }

    #[test]
    fn statement_spanning_lines() {
        let statements = turtle("<s>\n  <p> \"\"\"a.\nb\"\"\" ;\n  <q> 3.14 .\n").unwrap();
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0].object.as_literal().unwrap().value, "a.\nb");
    }

    #[test]
    fn statement_byte_cap() {
        let options = DecoderOptions::builder().with_max_statement_bytes(16).build();
        let err = parse_with("<s>\n<p>\n\"a long literal value\" .", false, &options).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StatementTooLong);
    }

    #[test]
    fn graph_blocks() {
        let statements = trig("GRAPH <g> { <s> <p> <o> . }").unwrap();
        assert_eq!(
            statements,
            vec![Statement::new(
                NamedNode::new("s"),
                NamedNode::new("p"),
                NamedNode::new("o"),
                GraphLabel::Named(NamedNode::new("g")),
            )]
        );

        let statements = trig("@prefix ex: <http://e/> .\nex:g { ex:s ex:p ex:o ; ex:q ex:r }\n{ <a> <b> <c> }\n<x> <y> <z> .").unwrap();
        assert_eq!(statements.len(), 4);
        assert_eq!(statements[1].graph, GraphLabel::Named(NamedNode::new("http://e/g")));
        assert!(statements[2].graph.is_default());
        assert!(statements[3].graph.is_default());
    }

    #[test]
    fn graph_block_errors() {
        assert!(trig("<g> { <h> { <s> <p> <o> } }").is_err());
        assert!(trig("<s> <p> <o> . }").is_err());
        assert!(trig("<g> { @prefix ex: <http://e/> . }").is_err());
        assert!(trig("<g> { <s> <p> <o> .").is_err());
        assert!(turtle("<g> { <s> <p> <o> }").is_err());
    }
}
