use std::io::{self, BufRead, Read};

use quick_xml::NsReader;
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::{PrefixDeclaration, ResolveResult};

use crate::blank::BlankNodeIssuer;
use crate::decoder::StatementParser;
use crate::error::{Position, RdfError, Result};
use crate::lexical::{is_valid_lang_tag, resolve_checked, validate_iri};
use crate::limits::{DepthTracker, check_statement_len};
use crate::model::*;
use crate::options::DecoderOptions;

const RDF_ABOUT: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#about";
const RDF_ABOUT_EACH: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#aboutEach";
const RDF_ABOUT_EACH_PREFIX: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#aboutEachPrefix";
const RDF_BAG_ID: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#bagID";
const RDF_DATATYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#datatype";
const RDF_DESCRIPTION: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#Description";
const RDF_ID: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#ID";
const RDF_NODE_ID: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#nodeID";
const RDF_PARSE_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#parseType";
const RDF_RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#RDF";
const RDF_RESOURCE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#resource";

/// Names that may never appear as node or property element names.
const RESERVED_NAMES: [&str; 10] = [
    RDF_RDF,
    RDF_ID,
    RDF_ABOUT,
    RDF_BAG_ID,
    RDF_PARSE_TYPE,
    RDF_RESOURCE,
    RDF_NODE_ID,
    RDF_ABOUT_EACH,
    RDF_ABOUT_EACH_PREFIX,
    RDF_DATATYPE,
];

/// `BufRead` wrapper that counts lines as quick-xml consumes bytes and
/// enforces the line byte cap.
struct Tracked<R> {
    inner: R,
    max_line_bytes: usize,
    offset: u64,
    line: u64,
    line_start: u64,
    overflowed: bool,
}

impl<R: BufRead> Tracked<R> {
    fn new(inner: R, max_line_bytes: usize) -> Self {
        Self {
            inner,
            max_line_bytes,
            offset: 0,
            line: 1,
            line_start: 0,
            overflowed: false,
        }
    }

    fn position(&self) -> Position {
        Position::new(
            self.line,
            self.offset - self.line_start + 1,
            self.offset as i64,
        )
    }
}

impl<R: BufRead> Read for Tracked<R> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let available = self.fill_buf()?;
        let n = available.len().min(out.len());
        out[..n].copy_from_slice(&available[..n]);
        self.consume(n);
        Ok(n)
    }
}

impl<R: BufRead> BufRead for Tracked<R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        if self.overflowed {
            return Err(io::Error::other("line exceeds the byte limit"));
        }
        self.inner.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        if let Ok(buf) = self.inner.fill_buf() {
            for (i, &b) in buf[..amt.min(buf.len())].iter().enumerate() {
                if b == b'\n' {
                    self.line += 1;
                    self.line_start = self.offset + i as u64 + 1;
                }
            }
        }
        self.offset += amt as u64;
        if self.max_line_bytes > 0 && self.offset - self.line_start > self.max_line_bytes as u64 {
            self.overflowed = true;
        }
        self.inner.consume(amt);
    }
}

/// `xml:base` and `xml:lang` in effect for an element and its subtree.
#[derive(Clone, Debug, Default)]
struct Scope {
    base: Option<String>,
    lang: Option<String>,
}

/// One entry of the element stack.
enum Frame {
    Document(Scope),
    Root(Scope),
    Node {
        scope: Scope,
        subject: Term,
        li: u64,
    },
    Property {
        scope: Scope,
        subject: Term,
        predicate: NamedNode,
        object: Option<Term>,
        text: String,
        datatype: Option<NamedNode>,
        reify: Option<NamedNode>,
    },
    Collection {
        scope: Scope,
        subject: Term,
        predicate: NamedNode,
        items: Vec<Term>,
        reify: Option<NamedNode>,
    },
    XmlLiteral {
        scope: Scope,
        subject: Term,
        predicate: NamedNode,
        writer: Writer<Vec<u8>>,
        nesting: usize,
        reify: Option<NamedNode>,
    },
}

impl Frame {
    fn scope(&self) -> &Scope {
        match self {
            Frame::Document(scope) | Frame::Root(scope) => scope,
            Frame::Node { scope, .. }
            | Frame::Property { scope, .. }
            | Frame::Collection { scope, .. }
            | Frame::XmlLiteral { scope, .. } => scope,
        }
    }
}

/// Attributes of one element, sorted by meaning.
#[derive(Default)]
struct Attributes {
    base: Option<String>,
    lang: Option<String>,
    about: Option<String>,
    id: Option<String>,
    node_id: Option<String>,
    resource: Option<String>,
    datatype: Option<String>,
    parse_type: Option<String>,
    rdf_type: Option<String>,
    properties: Vec<(NamedNode, String)>,
}

/// Streaming RDF/XML parser built on quick-xml's namespace-aware reader.
pub struct RdfXmlParser<R> {
    reader: NsReader<Tracked<R>>,
    buf: Vec<u8>,
    frames: Vec<Frame>,
    issuer: BlankNodeIssuer,
    depth: DepthTracker,
    pending: Vec<Statement>,
    options: DecoderOptions,
    finished: bool,
}

impl<R: BufRead> RdfXmlParser<R> {
    pub fn new(reader: R, options: &DecoderOptions) -> Self {
        let mut reader = NsReader::from_reader(Tracked::new(reader, options.max_line_bytes));
        reader.config_mut().expand_empty_elements = true;
        Self {
            reader,
            buf: Vec::new(),
            frames: vec![Frame::Document(Scope {
                base: options.base_iri.clone(),
                lang: None,
            })],
            issuer: BlankNodeIssuer::default(),
            depth: DepthTracker::new(options.max_depth),
            pending: Vec::new(),
            options: options.clone(),
            finished: false,
        }
    }

    fn locate(&self, error: RdfError) -> RdfError {
        error.with_position("rdfxml", self.reader.get_ref().position(), "")
    }

    fn xml_error(&self, error: quick_xml::Error) -> RdfError {
        if self.reader.get_ref().overflowed {
            return self.locate(RdfError::LineTooLong {
                limit: self.options.max_line_bytes,
            });
        }
        self.locate(error.into())
    }

    fn handle_event(&mut self, event: Event<'_>) -> Result<()> {
        match event {
            Event::Start(start) => self.start_element(&start),
            Event::End(end) => self.end_element(&end),
            Event::Text(text) => {
                let text = text.unescape()?;
                self.text(&text)
            }
            Event::CData(data) => {
                let bytes = data.into_inner();
                let text = std::str::from_utf8(&bytes)
                    .map_err(|e| RdfError::parse(format!("invalid UTF-8 in CDATA: {e}")))?;
                self.text(text)
            }
            // Empty elements are expanded into Start and End by the reader.
            Event::Empty(_) => Err(RdfError::parse("unexpected empty element event")),
            Event::Decl(_) | Event::PI(_) | Event::Comment(_) | Event::DocType(_) | Event::Eof => {
                Ok(())
            }
        }
    }

    fn start_element(&mut self, start: &BytesStart<'_>) -> Result<()> {
        if let Some(Frame::XmlLiteral { .. }) = self.frames.last() {
            return self.literal_start(start);
        }
        self.depth.enter()?;

        let parent = self.frames.last().map(|f| f.scope().clone()).unwrap_or_default();
        let attributes = self.attributes(start, &parent)?;
        let scope = self.scope(&parent, &attributes)?;
        let name = self.element_iri(start)?;

        match self.frames.last() {
            Some(Frame::Document(_)) if name == RDF_RDF => {
                tracing::debug!("rdf:RDF root element");
                self.frames.push(Frame::Root(scope));
                Ok(())
            }
            Some(Frame::Node { subject, .. }) => {
                let subject = subject.clone();
                self.property_element(subject, name, attributes, scope)
            }
            Some(Frame::XmlLiteral { .. }) | None => {
                Err(RdfError::parse("element outside the RDF/XML element stack"))
            }
            Some(_) => {
                let node = self.node_element(name, attributes, scope)?;
                self.attach_node(node)
            }
        }
    }

    /// Hand a nested node to the enclosing property or collection.
    fn attach_node(&mut self, node: Term) -> Result<()> {
        // The node frame was just pushed; its container sits below it.
        let index = self.frames.len().saturating_sub(2);
        match self.frames.get_mut(index) {
            Some(Frame::Property { object, text, .. }) => {
                if object.is_some() || !text.trim().is_empty() {
                    return Err(RdfError::parse(
                        "a property element may contain only one node or text value",
                    ));
                }
                text.clear();
                *object = Some(node);
                Ok(())
            }
            Some(Frame::Collection { items, .. }) => {
                items.push(node);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn attributes(&self, start: &BytesStart<'_>, parent: &Scope) -> Result<Attributes> {
        let mut attributes = Attributes::default();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(quick_xml::Error::from)?;
            let key = attribute.key.as_ref();
            if key.starts_with(b"xmlns") {
                continue;
            }
            let value = attribute
                .decode_and_unescape_value(self.reader.decoder())?
                .into_owned();
            match key {
                b"xml:lang" => {
                    attributes.lang = Some(value);
                    continue;
                }
                b"xml:base" => {
                    attributes.base = Some(value);
                    continue;
                }
                _ if key.starts_with(b"xml") => continue,
                _ => {}
            }
            let (namespace, local) = self.reader.resolve_attribute(attribute.key);
            let namespace = match namespace {
                ResolveResult::Bound(ns) => utf8(ns.as_ref())?.to_string(),
                ResolveResult::Unbound => {
                    tracing::warn!(
                        attribute = %String::from_utf8_lossy(key),
                        "ignoring attribute without a namespace"
                    );
                    continue;
                }
                ResolveResult::Unknown(prefix) => {
                    return Err(RdfError::parse(format!(
                        "undefined namespace prefix '{}'",
                        String::from_utf8_lossy(&prefix)
                    )));
                }
            };
            let iri = format!("{namespace}{}", utf8(local.as_ref())?);
            match iri.as_str() {
                RDF_ABOUT => attributes.about = Some(value),
                RDF_ID => attributes.id = Some(value),
                RDF_NODE_ID => attributes.node_id = Some(value),
                RDF_RESOURCE => attributes.resource = Some(value),
                RDF_DATATYPE => attributes.datatype = Some(value),
                RDF_PARSE_TYPE => attributes.parse_type = Some(value),
                rdf::TYPE => attributes.rdf_type = Some(value),
                RDF_BAG_ID | RDF_ABOUT_EACH | RDF_ABOUT_EACH_PREFIX => {
                    return Err(RdfError::parse(format!(
                        "{iri} is no longer part of RDF/XML"
                    )));
                }
                rdf::LI | RDF_RDF | RDF_DESCRIPTION => {
                    return Err(RdfError::parse(format!("{iri} is not a valid attribute")));
                }
                _ => {
                    let predicate = self.named_node(iri)?;
                    attributes.properties.push((predicate, value));
                }
            }
        }
        // A relative xml:base resolves against the enclosing base.
        if let Some(base) = attributes.base.take() {
            attributes.base = Some(resolve_checked(
                parent.base.as_deref(),
                &base,
                self.options.strict_iri_validation,
            )?);
        }
        Ok(attributes)
    }

    fn scope(&self, parent: &Scope, attributes: &Attributes) -> Result<Scope> {
        let lang = match &attributes.lang {
            Some(lang) if lang.is_empty() => None,
            Some(lang) => {
                if !is_valid_lang_tag(lang) {
                    return Err(RdfError::invalid_literal(format!(
                        "invalid language tag '{lang}'"
                    )));
                }
                Some(lang.clone())
            }
            None => parent.lang.clone(),
        };
        Ok(Scope {
            base: attributes.base.clone().or_else(|| parent.base.clone()),
            lang,
        })
    }

    fn element_iri(&self, start: &BytesStart<'_>) -> Result<String> {
        let (namespace, local) = self.reader.resolve_element(start.name());
        match namespace {
            ResolveResult::Bound(ns) => Ok(format!(
                "{}{}",
                utf8(ns.as_ref())?,
                utf8(local.as_ref())?
            )),
            ResolveResult::Unbound => Err(RdfError::parse(format!(
                "element '{}' has no namespace",
                String::from_utf8_lossy(start.name().as_ref())
            ))),
            ResolveResult::Unknown(prefix) => Err(RdfError::parse(format!(
                "undefined namespace prefix '{}'",
                String::from_utf8_lossy(&prefix)
            ))),
        }
    }

    fn named_node(&self, iri: String) -> Result<NamedNode> {
        if self.options.strict_iri_validation {
            validate_iri(&iri)?;
        }
        Ok(NamedNode::new(iri))
    }

    fn resolve(&self, scope: &Scope, value: &str) -> Result<NamedNode> {
        Ok(NamedNode::new(resolve_checked(
            scope.base.as_deref(),
            value,
            self.options.strict_iri_validation,
        )?))
    }

    fn id_iri(&self, scope: &Scope, id: &str) -> Result<NamedNode> {
        if !is_nc_name(id) {
            return Err(RdfError::parse(format!("'{id}' is not a valid rdf:ID")));
        }
        self.resolve(scope, &format!("#{id}"))
    }

    fn blank(&mut self, node_id: &str) -> Result<Term> {
        if !is_nc_name(node_id) {
            return Err(RdfError::parse(format!("'{node_id}' is not a valid rdf:nodeID")));
        }
        Ok(Term::BlankNode(self.issuer.labelled(node_id)))
    }

    fn literal(&self, value: String, scope: &Scope, datatype: Option<NamedNode>) -> Literal {
        match (datatype, &scope.lang) {
            (Some(datatype), _) => Literal::typed(value, datatype),
            (None, Some(lang)) => Literal::lang(value, lang.clone()),
            (None, None) => Literal::new(value),
        }
    }

    fn emit(&mut self, subject: Term, predicate: NamedNode, object: impl Into<Term>) {
        self.pending.push(Statement::triple(subject, predicate, object));
    }

    fn emit_reified(&mut self, subject: Term, predicate: NamedNode, object: Term, reify: Option<NamedNode>) {
        self.emit(subject.clone(), predicate.clone(), object.clone());
        if let Some(id) = reify {
            let id = Term::Iri(id);
            self.emit(id.clone(), NamedNode::new(rdf::TYPE), NamedNode::new(rdf::STATEMENT));
            self.emit(id.clone(), NamedNode::new(rdf::SUBJECT), subject);
            self.emit(id.clone(), NamedNode::new(rdf::PREDICATE), predicate);
            self.emit(id, NamedNode::new(rdf::OBJECT), object);
        }
    }

    fn emit_attributes(&mut self, subject: &Term, attributes: &mut Attributes, scope: &Scope) -> Result<()> {
        if let Some(rdf_type) = attributes.rdf_type.take() {
            let class = self.resolve(scope, &rdf_type)?;
            self.emit(subject.clone(), NamedNode::new(rdf::TYPE), class);
        }
        for (predicate, value) in std::mem::take(&mut attributes.properties) {
            let literal = self.literal(value, scope, None);
            self.emit(subject.clone(), predicate, literal);
        }
        Ok(())
    }

    fn node_element(&mut self, name: String, mut attributes: Attributes, scope: Scope) -> Result<Term> {
        if RESERVED_NAMES.contains(&name.as_str()) || name == rdf::LI {
            return Err(RdfError::parse(format!("{name} cannot be a node element")));
        }
        let subject = match (&attributes.id, &attributes.node_id, &attributes.about) {
            (Some(id), None, None) => Term::Iri(self.id_iri(&scope, id)?),
            (None, Some(node_id), None) => self.blank(node_id)?,
            (None, None, Some(about)) => Term::Iri(self.resolve(&scope, about)?),
            (None, None, None) => Term::BlankNode(self.issuer.fresh()),
            _ => {
                return Err(RdfError::parse(
                    "rdf:ID, rdf:nodeID and rdf:about are mutually exclusive",
                ));
            }
        };
        if name != RDF_DESCRIPTION {
            let class = self.named_node(name)?;
            self.emit(subject.clone(), NamedNode::new(rdf::TYPE), class);
        }
        self.emit_attributes(&subject, &mut attributes, &scope)?;
        self.frames.push(Frame::Node {
            scope,
            subject: subject.clone(),
            li: 0,
        });
        Ok(subject)
    }

    fn property_element(
        &mut self,
        subject: Term,
        name: String,
        mut attributes: Attributes,
        scope: Scope,
    ) -> Result<()> {
        let predicate = if name == rdf::LI && self.options.expand_rdfxml_containers {
            let Some(Frame::Node { li, .. }) = self.frames.last_mut() else {
                return Err(RdfError::parse("rdf:li outside a node element"));
            };
            *li += 1;
            NamedNode::new(format!("{}_{li}", rdf::NAMESPACE))
        } else if RESERVED_NAMES.contains(&name.as_str()) || name == RDF_DESCRIPTION {
            return Err(RdfError::parse(format!("{name} cannot be a property element")));
        } else {
            self.named_node(name)?
        };
        let reify = match &attributes.id {
            Some(id) => Some(self.id_iri(&scope, id)?),
            None => None,
        };

        match attributes.parse_type.as_deref() {
            Some("Resource") => {
                let node = Term::BlankNode(self.issuer.fresh());
                self.emit_reified(subject, predicate, node.clone(), reify);
                self.frames.push(Frame::Node {
                    scope,
                    subject: node,
                    li: 0,
                });
            }
            Some("Collection") => self.frames.push(Frame::Collection {
                scope,
                subject,
                predicate,
                items: Vec::new(),
                reify,
            }),
            // Literal, and any unknown parse type, keep the content verbatim.
            Some(_) => self.frames.push(Frame::XmlLiteral {
                scope,
                subject,
                predicate,
                writer: Writer::new(Vec::new()),
                nesting: 0,
                reify,
            }),
            None => {
                let has_object = attributes.resource.is_some()
                    || attributes.node_id.is_some()
                    || attributes.rdf_type.is_some()
                    || !attributes.properties.is_empty();
                let object = if has_object {
                    let object = match (&attributes.resource, &attributes.node_id) {
                        (Some(resource), None) => Term::Iri(self.resolve(&scope, resource)?),
                        (None, Some(node_id)) => self.blank(node_id)?,
                        (None, None) => Term::BlankNode(self.issuer.fresh()),
                        (Some(_), Some(_)) => {
                            return Err(RdfError::parse(
                                "rdf:resource and rdf:nodeID are mutually exclusive",
                            ));
                        }
                    };
                    self.emit_attributes(&object, &mut attributes, &scope)?;
                    Some(object)
                } else {
                    None
                };
                let datatype = match &attributes.datatype {
                    Some(datatype) => Some(self.resolve(&scope, datatype)?),
                    None => None,
                };
                self.frames.push(Frame::Property {
                    scope,
                    subject,
                    predicate,
                    object,
                    text: String::new(),
                    datatype,
                    reify,
                });
            }
        }
        Ok(())
    }

    fn end_element(&mut self, end: &BytesEnd<'_>) -> Result<()> {
        if let Some(Frame::XmlLiteral { writer, nesting, .. }) = self.frames.last_mut() {
            if *nesting > 0 {
                let name = utf8(end.name().as_ref())?.to_string();
                writer.write_event(Event::End(BytesEnd::new(name)))?;
                *nesting -= 1;
                self.depth.exit();
                return Ok(());
            }
        }
        self.depth.exit();
        let Some(frame) = self.frames.pop() else {
            return Err(RdfError::parse("unbalanced end element"));
        };
        match frame {
            Frame::Property {
                scope,
                subject,
                predicate,
                object,
                text,
                datatype,
                reify,
            } => {
                let object = match object {
                    Some(object) => object,
                    None => Term::Literal(self.literal(text, &scope, datatype)),
                };
                self.emit_reified(subject, predicate, object, reify);
            }
            Frame::Collection {
                subject,
                predicate,
                items,
                reify,
                ..
            } => {
                let nodes: Vec<BlankNode> = items.iter().map(|_| self.issuer.fresh()).collect();
                let head = match nodes.first() {
                    Some(node) => Term::BlankNode(node.clone()),
                    None => Term::iri(rdf::NIL),
                };
                self.emit_reified(subject, predicate, head, reify);
                for (i, item) in items.into_iter().enumerate() {
                    let node = Term::BlankNode(nodes[i].clone());
                    let rest = match nodes.get(i + 1) {
                        Some(next) => Term::BlankNode(next.clone()),
                        None => Term::iri(rdf::NIL),
                    };
                    self.emit(node.clone(), NamedNode::new(rdf::FIRST), item);
                    self.emit(node, NamedNode::new(rdf::REST), rest);
                }
            }
            Frame::XmlLiteral {
                subject,
                predicate,
                writer,
                reify,
                ..
            } => {
                let value = String::from_utf8(writer.into_inner())
                    .map_err(|e| RdfError::parse(format!("invalid UTF-8 in XML literal: {e}")))?;
                let literal = Literal::typed(value, NamedNode::new(rdf::XML_LITERAL));
                self.emit_reified(subject, predicate, Term::Literal(literal), reify);
            }
            Frame::Node { .. } | Frame::Root(_) | Frame::Document(_) => {}
        }
        Ok(())
    }

    fn literal_start(&mut self, start: &BytesStart<'_>) -> Result<()> {
        self.depth.enter()?;
        let name = utf8(start.name().as_ref())?.to_string();
        let mut element = BytesStart::new(name);
        for attribute in start.attributes() {
            element.push_attribute(attribute.map_err(quick_xml::Error::from)?);
        }
        let top_level = matches!(self.frames.last(), Some(Frame::XmlLiteral { nesting: 0, .. }));
        if top_level {
            // Carry the in-scope namespaces onto the literal's outermost elements.
            for (prefix, namespace) in self.reader.prefixes() {
                match prefix {
                    PrefixDeclaration::Default => {
                        element.push_attribute((b"xmlns".as_slice(), namespace.into_inner()));
                    }
                    PrefixDeclaration::Named(name) => {
                        let key = [b"xmlns:".as_slice(), name].concat();
                        element.push_attribute((key.as_slice(), namespace.into_inner()));
                    }
                }
            }
        }
        let limit = self.options.max_statement_bytes;
        if let Some(Frame::XmlLiteral { writer, nesting, .. }) = self.frames.last_mut() {
            writer.write_event(Event::Start(element))?;
            *nesting += 1;
            check_statement_len(writer.get_ref().len(), limit)?;
        }
        Ok(())
    }

    fn text(&mut self, value: &str) -> Result<()> {
        let limit = self.options.max_statement_bytes;
        match self.frames.last_mut() {
            Some(Frame::XmlLiteral { writer, .. }) => {
                writer.write_event(Event::Text(BytesText::new(value)))?;
                check_statement_len(writer.get_ref().len(), limit)
            }
            Some(Frame::Property {
                object: None, text, ..
            }) => {
                text.push_str(value);
                check_statement_len(text.len(), limit)
            }
            _ if value.trim().is_empty() => Ok(()),
            _ => Err(RdfError::parse(format!(
                "unexpected text '{}'",
                value.trim()
            ))),
        }
    }
}

impl<R: BufRead> StatementParser for RdfXmlParser<R> {
    fn parse_step(&mut self, sink: &mut dyn FnMut(Statement) -> Result<()>) -> Result<bool> {
        if self.finished {
            return Ok(false);
        }
        loop {
            self.options.check_canceled()?;
            let mut buf = std::mem::take(&mut self.buf);
            buf.clear();
            let event = match self.reader.read_event_into(&mut buf) {
                Ok(event) => event,
                Err(e) => return Err(self.xml_error(e)),
            };
            let eof = matches!(event, Event::Eof);
            let handled = self.handle_event(event);
            self.buf = buf;
            handled.map_err(|e| self.locate(e))?;

            if !self.pending.is_empty() {
                for statement in self.pending.drain(..) {
                    sink(statement)?;
                }
                return Ok(true);
            }
            if eof {
                self.finished = true;
                if self.frames.len() > 1 {
                    return Err(self.locate(RdfError::parse("unexpected end of document")));
                }
                return Ok(false);
            }
        }
    }
}

fn utf8(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|e| RdfError::parse(format!("invalid UTF-8: {e}")))
}

/// XML NCName, as required for rdf:ID and rdf:nodeID values.
fn is_nc_name(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '\u{B7}'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::io::Cursor;

    const HEAD: &str = r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#" xmlns:ex="http://example.org/">"#;

    fn parse_with(body: &str, options: &DecoderOptions) -> Result<Vec<Statement>> {
        let doc = format!("<?xml version=\"1.0\"?>\n{HEAD}\n{body}\n</rdf:RDF>\n");
        let mut parser = RdfXmlParser::new(Cursor::new(doc.into_bytes()), options);
        let mut out = Vec::new();
        while parser.parse_step(&mut |st: Statement| {
            out.push(st);
            Ok(())
        })? {}
        Ok(out)
    }

    fn parse(body: &str) -> Result<Vec<Statement>> {
        parse_with(body, &DecoderOptions::default())
    }

    fn ex(local: &str) -> NamedNode {
        NamedNode::new(format!("http://example.org/{local}"))
    }

    #[test]
    fn description_with_resource_and_literal() {
        let statements = parse(
            r#"<rdf:Description rdf:about="http://example.org/s">
                 <ex:p rdf:resource="http://example.org/o"/>
                 <ex:name xml:lang="en">Alice</ex:name>
                 <ex:age rdf:datatype="http://www.w3.org/2001/XMLSchema#integer">42</ex:age>
               </rdf:Description>"#,
        )
        .unwrap();
        assert_eq!(
            statements,
            vec![
                Statement::triple(ex("s"), ex("p"), ex("o")),
                Statement::triple(ex("s"), ex("name"), Literal::lang("Alice", "en")),
                Statement::triple(
                    ex("s"),
                    ex("age"),
                    Literal::typed("42", NamedNode::new(xsd::INTEGER))
                ),
            ]
        );
    }

    #[test]
    fn typed_node_and_property_attributes() {
        let statements = parse(r#"<ex:Person rdf:about="http://example.org/bob" ex:name="Bob"/>"#).unwrap();
        assert_eq!(
            statements,
            vec![
                Statement::triple(ex("bob"), NamedNode::new(rdf::TYPE), ex("Person")),
                Statement::triple(ex("bob"), ex("name"), Literal::new("Bob")),
            ]
        );
    }

    #[test]
    fn nested_node_becomes_object() {
        let statements = parse(
            r#"<rdf:Description rdf:about="http://example.org/s">
                 <ex:knows><rdf:Description rdf:nodeID="x"><ex:name>X</ex:name></rdf:Description></ex:knows>
               </rdf:Description>"#,
        )
        .unwrap();
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0].subject, Term::blank("x"));
        assert_eq!(
            statements[1],
            Statement::triple(ex("s"), ex("knows"), Term::blank("x"))
        );
    }

    #[test]
    fn base_and_rdf_id() {
        let statements = parse(
            r#"<rdf:Description xml:base="http://example.org/dir/" rdf:ID="me">
                 <ex:page rdf:resource="page.html"/>
               </rdf:Description>"#,
        )
        .unwrap();
        assert_eq!(statements[0].subject, Term::iri("http://example.org/dir/#me"));
        assert_eq!(statements[0].object, Term::iri("http://example.org/dir/page.html"));
    }

    #[test]
    fn parse_type_resource_and_collection() {
        let statements = parse(
            r#"<rdf:Description rdf:about="http://example.org/s">
                 <ex:addr rdf:parseType="Resource"><ex:city>Paris</ex:city></ex:addr>
                 <ex:list rdf:parseType="Collection">
                   <rdf:Description rdf:about="http://example.org/a"/>
                   <rdf:Description rdf:about="http://example.org/b"/>
                 </ex:list>
               </rdf:Description>"#,
        )
        .unwrap();
        assert_eq!(statements[0], Statement::triple(ex("s"), ex("addr"), Term::blank("b1")));
        assert_eq!(statements[1], Statement::triple(Term::blank("b1"), ex("city"), Literal::new("Paris")));
        assert_eq!(statements[2], Statement::triple(ex("s"), ex("list"), Term::blank("b2")));
        assert_eq!(statements[3].object, Term::iri("http://example.org/a"));
        assert_eq!(statements[4].object, Term::blank("b3"));
        assert_eq!(statements[6].object, Term::iri(rdf::NIL));
    }

    #[test]
    fn parse_type_literal_keeps_markup() {
        let statements = parse(
            r#"<rdf:Description rdf:about="http://example.org/s"><ex:body rdf:parseType="Literal"><b>bold</b> text</ex:body></rdf:Description>"#,
        )
        .unwrap();
        let literal = statements[0].object.as_literal().unwrap();
        assert_eq!(literal.datatype_iri(), rdf::XML_LITERAL);
        assert!(literal.value.starts_with("<b "));
        assert!(literal.value.contains("xmlns:ex=\"http://example.org/\""));
        assert!(literal.value.ends_with(">bold</b> text"));
    }

    #[test]
    fn container_expansion() {
        let body = r#"<rdf:Bag rdf:about="http://example.org/bag"><rdf:li>a</rdf:li><rdf:li>b</rdf:li></rdf:Bag>"#;
        let plain = parse(body).unwrap();
        assert_eq!(plain[1].predicate.iri, rdf::LI);

        let options = DecoderOptions::builder().with_rdfxml_container_expansion(true).build();
        let expanded = parse_with(body, &options).unwrap();
        assert_eq!(expanded[1].predicate.iri, format!("{}_1", rdf::NAMESPACE));
        assert_eq!(expanded[2].predicate.iri, format!("{}_2", rdf::NAMESPACE));
    }

    #[test]
    fn property_id_reifies() {
        let statements = parse(
            r#"<rdf:Description rdf:about="http://example.org/s" xml:base="http://example.org/"><ex:p rdf:ID="st">v</ex:p></rdf:Description>"#,
        )
        .unwrap();
        assert_eq!(statements.len(), 5);
        assert_eq!(statements[1].object, Term::iri(rdf::STATEMENT));
    }

    #[test]
    fn lang_inherits_and_resets() {
        let statements = parse(
            r#"<rdf:Description rdf:about="http://example.org/s" xml:lang="fr"><ex:a>un</ex:a><ex:b xml:lang="">one</ex:b></rdf:Description>"#,
        )
        .unwrap();
        assert_eq!(statements[0].object, Term::Literal(Literal::lang("un", "fr")));
        assert_eq!(statements[1].object, Term::Literal(Literal::new("one")));
    }

    #[test]
    fn rejected_constructs() {
        assert!(parse(r#"<rdf:Description rdf:bagID="x"/>"#).is_err());
        assert!(parse(r#"<rdf:Description rdf:about="http://e/" rdf:nodeID="x"/>"#).is_err());
        assert!(parse(r#"<undeclared:Thing/>"#).is_err());
    }

    #[test]
    fn malformed_xml_is_parse_error() {
        let mut parser = RdfXmlParser::new(Cursor::new(b"<rdf:RDF xmlns:rdf=\"http://www.w3.org/1999/02/22-rdf-syntax-ns#\"><a></b>".to_vec()), &DecoderOptions::default());
        let err = loop {
            match parser.parse_step(&mut |_: Statement| -> Result<()> { Ok(()) }) {
                Ok(true) => continue,
                Ok(false) => panic!("expected an error"),
                Err(e) => break e,
            }
        };
        assert_eq!(err.kind(), ErrorKind::ParseError);
        assert!(err.position().is_some());
    }

    #[test]
    fn depth_limit() {
        let options = DecoderOptions::builder().with_max_depth(3).build();
        let err = parse_with(
            r#"<rdf:Description><ex:p><rdf:Description><ex:q>x</ex:q></rdf:Description></ex:p></rdf:Description>"#,
            &options,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DepthExceeded);
    }
}
