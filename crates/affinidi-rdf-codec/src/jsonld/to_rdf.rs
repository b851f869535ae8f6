use std::borrow::Cow;
use std::collections::VecDeque;
use std::io::Read;

use serde_json::{Map, Value};

use super::context::{Context, ContainerType, TermDefinition};
use super::loader::ContextCache;
use crate::blank::BlankNodeIssuer;
use crate::decoder::StatementParser;
use crate::error::{Position, RdfError, Result};
use crate::lexical::{is_absolute_iri, validate_iri};
use crate::limits::{DepthTracker, check_statement_len};
use crate::model::*;
use crate::options::{CancellationSignal, DecoderOptions};

const FORMAT: &str = "jsonld";

type Sink<'s> = &'s mut dyn FnMut(Statement) -> Result<()>;

/// JSON-LD to RDF conversion.
///
/// The document is read as a whole, then converted one top-level node
/// object per step. Statements of a node reach the sink as they are
/// produced; no expanded form of the document is ever built.
pub struct JsonLdParser<R> {
    reader: Option<R>,
    items: VecDeque<Value>,
    context: Context,
    converter: Converter,
    max_document_bytes: usize,
    cancellation: Option<CancellationSignal>,
}

impl<R: Read> JsonLdParser<R> {
    pub fn new(reader: R, options: &DecoderOptions) -> Self {
        Self {
            reader: Some(reader),
            items: VecDeque::new(),
            context: Context::new(options.base_iri.clone()),
            converter: Converter {
                cache: ContextCache::new(options.document_loader.clone()),
                issuer: BlankNodeIssuer::default(),
                depth: DepthTracker::new(options.max_depth),
                strict_iri: options.strict_iri_validation,
            },
            max_document_bytes: options.max_statement_bytes,
            cancellation: options.cancellation.clone(),
        }
    }

    fn check_canceled(&self) -> Result<()> {
        match &self.cancellation {
            Some(signal) => signal.check(),
            None => Ok(()),
        }
    }

    /// Read the document and queue its top-level node objects.
    fn load(&mut self, reader: R) -> Result<()> {
        let mut bytes = Vec::new();
        if self.max_document_bytes > 0 {
            reader
                .take(self.max_document_bytes as u64 + 1)
                .read_to_end(&mut bytes)?;
            check_statement_len(bytes.len(), self.max_document_bytes)?;
        } else {
            let mut reader = reader;
            reader.read_to_end(&mut bytes)?;
        }
        self.check_canceled()?;

        let document: Value = serde_json::from_slice(&bytes).map_err(|e| {
            let position = Position::new(e.line() as u64, e.column() as u64, -1);
            RdfError::from(e).with_position(FORMAT, position, "")
        })?;

        match document {
            Value::Array(items) => self.items.extend(items),
            Value::Object(mut object) => {
                if let Some(context) = object.remove("@context") {
                    self.context
                        .process(&context, &mut self.converter.cache)
                        .map_err(|e| e.with_position(FORMAT, Position::UNKNOWN, &context.to_string()))?;
                }
                let graph_only = object.len() == 1
                    && object
                        .keys()
                        .all(|key| self.context.keyword(key) == Some("@graph"));
                if graph_only {
                    if let Some((_, graph)) = object.into_iter().next() {
                        match graph {
                            Value::Array(items) => self.items.extend(items),
                            other => self.items.push_back(other),
                        }
                    }
                } else {
                    self.items.push_back(Value::Object(object));
                }
            }
            other => {
                return Err(RdfError::parse(format!(
                    "a JSON-LD document must be an object or an array, found {other}"
                ))
                .with_position(FORMAT, Position::line(1), ""));
            }
        }
        tracing::debug!(nodes = self.items.len(), "JSON-LD document loaded");
        Ok(())
    }
}

impl<R: Read> StatementParser for JsonLdParser<R> {
    fn parse_step(&mut self, sink: &mut dyn FnMut(Statement) -> Result<()>) -> Result<bool> {
        if let Some(reader) = self.reader.take() {
            self.check_canceled()?;
            self.load(reader)?;
        }
        let Some(item) = self.items.pop_front() else {
            return Ok(false);
        };
        self.check_canceled()?;
        // Free-floating values at the top level produce no statements.
        if let Value::Object(object) = &item {
            self.converter.depth.reset();
            self.converter
                .node(object, &self.context, &GraphLabel::Default, sink)
                .map_err(|e| e.with_position(FORMAT, Position::UNKNOWN, &item.to_string()))?;
        }
        Ok(true)
    }
}

/// Conversion state shared by every node of one document.
struct Converter {
    cache: ContextCache,
    issuer: BlankNodeIssuer,
    depth: DepthTracker,
    strict_iri: bool,
}

impl Converter {
    /// Emit the statements of a node object and return its subject.
    fn node(
        &mut self,
        object: &Map<String, Value>,
        ctx: &Context,
        graph: &GraphLabel,
        sink: Sink<'_>,
    ) -> Result<Term> {
        self.depth.enter()?;
        let result = self.node_inner(object, ctx, graph, sink);
        self.depth.exit();
        result
    }

    fn node_inner(
        &mut self,
        object: &Map<String, Value>,
        ctx: &Context,
        graph: &GraphLabel,
        sink: Sink<'_>,
    ) -> Result<Term> {
        let mut ctx = Cow::Borrowed(ctx);
        if let Some(scoped) = object.get("@context") {
            ctx = Cow::Owned(ctx.with_scoped_context(scoped, &mut self.cache)?);
        }

        let keyword_value = |ctx: &Context, name: &str| {
            object
                .iter()
                .find(|(key, _)| ctx.keyword(key) == Some(name))
                .map(|(_, value)| value)
        };
        let id = keyword_value(&*ctx, "@id");
        let graph_value = keyword_value(&*ctx, "@graph");
        let mut types: Vec<&str> = Vec::new();
        if let Some(value) = keyword_value(&*ctx, "@type") {
            for item in as_items(value) {
                types.push(
                    item.as_str()
                        .ok_or_else(|| RdfError::parse(format!("@type must be a string, found {item}")))?,
                );
            }
        }

        let subject = match id {
            Some(Value::String(id)) => self.reference(id, &ctx, false)?,
            Some(other) => {
                return Err(RdfError::parse(format!("@id must be a string, found {other}")));
            }
            None => Term::BlankNode(self.issuer.fresh()),
        };

        // Types are expanded before type-scoped contexts take effect.
        let mut type_terms = Vec::with_capacity(types.len());
        for name in &types {
            type_terms.push(self.reference(name, &ctx, true)?);
        }
        let mut scoped_types = types.clone();
        scoped_types.sort_unstable();
        for name in scoped_types {
            if let Some(scoped) = ctx.get_term(name).and_then(|def| def.context.clone()) {
                ctx = Cow::Owned(ctx.with_scoped_context(&scoped, &mut self.cache)?);
            }
        }

        for type_term in type_terms {
            emit(sink, subject.clone(), rdf::TYPE, type_term, graph)?;
        }

        for (key, value) in object {
            match ctx.keyword(key) {
                Some("@reverse") => self.reverse_map(value, &subject, &ctx, graph, sink)?,
                Some("@included") => {
                    for item in as_items(value) {
                        if let Value::Object(included) = item {
                            self.node(included, &ctx, graph, sink)?;
                        }
                    }
                }
                Some(_) => {}
                None => self.property(key, value, &subject, &ctx, graph, sink)?,
            }
        }

        if let Some(items) = graph_value {
            // A node without @id contributes its graph to the enclosing one.
            let inner = match (&subject, id.is_some()) {
                (Term::Iri(name), true) => GraphLabel::Named(name.clone()),
                (Term::BlankNode(name), true) => GraphLabel::Blank(name.clone()),
                _ => graph.clone(),
            };
            self.depth.enter()?;
            for item in as_items(items) {
                if let Value::Object(node) = item {
                    self.node(node, &ctx, &inner, sink)?;
                }
            }
            self.depth.exit();
        }

        Ok(subject)
    }

    fn property(
        &mut self,
        key: &str,
        value: &Value,
        subject: &Term,
        ctx: &Context,
        graph: &GraphLabel,
        sink: Sink<'_>,
    ) -> Result<()> {
        let Some(predicate) = ctx.expand_iri(key, true) else {
            tracing::debug!(key, "JSON-LD property has no IRI mapping; dropped");
            return Ok(());
        };
        if predicate.starts_with("_:") || !is_absolute_iri(&predicate) {
            tracing::debug!(key, %predicate, "JSON-LD property is not an absolute IRI; dropped");
            return Ok(());
        }
        let definition = ctx.get_term(key);

        let scoped;
        let value_ctx = match definition.and_then(|def| def.context.as_ref()) {
            Some(context) => {
                scoped = ctx.with_scoped_context(context, &mut self.cache)?;
                &scoped
            }
            None => ctx,
        };

        let objects = match definition {
            Some(def) if def.container == Some(ContainerType::List) && !is_list_object(value, ctx) => {
                vec![self.list(value, Some(def), value_ctx, graph, sink)?]
            }
            _ => self.values(value, definition, value_ctx, graph, sink)?,
        };

        let reverse = definition.is_some_and(|def| def.reverse);
        for object in objects {
            if reverse {
                if matches!(object, Term::Literal(_)) {
                    return Err(RdfError::parse(format!(
                        "reverse property '{key}' cannot have a literal value"
                    )));
                }
                emit(sink, object, &predicate, subject.clone(), graph)?;
            } else {
                emit(sink, subject.clone(), &predicate, object, graph)?;
            }
        }
        Ok(())
    }

    /// Properties under `@reverse` point from their values to the subject.
    fn reverse_map(
        &mut self,
        value: &Value,
        subject: &Term,
        ctx: &Context,
        graph: &GraphLabel,
        sink: Sink<'_>,
    ) -> Result<()> {
        let map = value
            .as_object()
            .ok_or_else(|| RdfError::parse("@reverse must be an object"))?;
        for (key, value) in map {
            let Some(predicate) = ctx.expand_iri(key, true).filter(|iri| is_absolute_iri(iri)) else {
                continue;
            };
            for object in self.values(value, ctx.get_term(key), ctx, graph, sink)? {
                if matches!(object, Term::Literal(_)) {
                    return Err(RdfError::parse("@reverse values must be node objects"));
                }
                emit(sink, object, &predicate, subject.clone(), graph)?;
            }
        }
        Ok(())
    }

    fn values(
        &mut self,
        value: &Value,
        definition: Option<&TermDefinition>,
        ctx: &Context,
        graph: &GraphLabel,
        sink: Sink<'_>,
    ) -> Result<Vec<Term>> {
        match value {
            Value::Null => Ok(Vec::new()),
            Value::Array(items) => {
                self.depth.enter()?;
                let mut terms = Vec::with_capacity(items.len());
                for item in items {
                    match self.values(item, definition, ctx, graph, sink) {
                        Ok(more) => terms.extend(more),
                        Err(e) => {
                            self.depth.exit();
                            return Err(e);
                        }
                    }
                }
                self.depth.exit();
                Ok(terms)
            }
            Value::Object(object) => self.object_value(object, definition, ctx, graph, sink),
            scalar => Ok(self.scalar(scalar, definition, ctx)?.into_iter().collect()),
        }
    }

    fn object_value(
        &mut self,
        object: &Map<String, Value>,
        definition: Option<&TermDefinition>,
        ctx: &Context,
        graph: &GraphLabel,
        sink: Sink<'_>,
    ) -> Result<Vec<Term>> {
        let keyword_value = |name: &str| {
            object
                .iter()
                .find(|(key, _)| ctx.keyword(key) == Some(name))
                .map(|(_, value)| value)
        };
        if let Some(value) = keyword_value("@value") {
            let literal = value_object(
                value,
                keyword_value("@type"),
                keyword_value("@language"),
                ctx,
            )?;
            return Ok(literal.map(Term::Literal).into_iter().collect());
        }
        if let Some(items) = keyword_value("@list") {
            return Ok(vec![self.list(items, definition, ctx, graph, sink)?]);
        }
        if let Some(items) = keyword_value("@set") {
            return self.values(items, definition, ctx, graph, sink);
        }
        Ok(vec![self.node(object, ctx, graph, sink)?])
    }

    /// A string, number or boolean, interpreted through the term definition.
    fn scalar(
        &mut self,
        value: &Value,
        definition: Option<&TermDefinition>,
        ctx: &Context,
    ) -> Result<Option<Term>> {
        let type_mapping = definition.and_then(|def| def.type_mapping.as_deref());
        let datatype = type_mapping.filter(|mapping| !mapping.starts_with('@'));
        match value {
            Value::String(text) => match type_mapping {
                Some("@id") => Ok(Some(self.reference(text, ctx, false)?)),
                Some("@vocab") => Ok(Some(self.reference(text, ctx, true)?)),
                _ => {
                    if let Some(datatype) = datatype {
                        return Ok(Some(Literal::typed(text.clone(), NamedNode::new(datatype)).into()));
                    }
                    let language = match definition.and_then(|def| def.language.clone()) {
                        Some(language) => language,
                        None => ctx.default_language.clone(),
                    };
                    Ok(Some(match language {
                        Some(language) => Literal::lang(text.clone(), language),
                        None => Literal::new(text.clone()),
                    }
                    .into()))
                }
            },
            Value::Bool(_) | Value::Number(_) => Ok(native_literal(value, datatype).map(Term::Literal)),
            _ => Ok(None),
        }
    }

    /// Expand `value` to an IRI or blank node term.
    fn reference(&mut self, value: &str, ctx: &Context, vocab: bool) -> Result<Term> {
        let expanded = ctx
            .expand_iri(value, vocab)
            .or_else(|| ctx.expand_iri(value, false))
            .ok_or_else(|| RdfError::invalid_iri(format!("'{value}' does not expand to an IRI")))?;
        if let Some(label) = expanded.strip_prefix("_:") {
            return Ok(Term::BlankNode(self.issuer.labelled(label)));
        }
        if !is_absolute_iri(&expanded) {
            return Err(RdfError::invalid_iri(format!(
                "'{value}' is relative and no base IRI is set"
            )));
        }
        if self.strict_iri {
            validate_iri(&expanded)?;
        }
        Ok(Term::Iri(NamedNode::new(expanded)))
    }

    /// Emit an RDF collection for a `@list` and return its head.
    fn list(
        &mut self,
        items: &Value,
        definition: Option<&TermDefinition>,
        ctx: &Context,
        graph: &GraphLabel,
        sink: Sink<'_>,
    ) -> Result<Term> {
        self.depth.enter()?;
        let mut terms = Vec::new();
        for item in as_items(items) {
            match self.values(item, definition, ctx, graph, sink) {
                Ok(more) => terms.extend(more),
                Err(e) => {
                    self.depth.exit();
                    return Err(e);
                }
            }
        }
        self.depth.exit();

        if terms.is_empty() {
            return Ok(Term::iri(rdf::NIL));
        }
        let head = Term::BlankNode(self.issuer.fresh());
        let mut current = head.clone();
        let count = terms.len();
        for (index, term) in terms.into_iter().enumerate() {
            emit(sink, current.clone(), rdf::FIRST, term, graph)?;
            let rest = if index + 1 == count {
                Term::iri(rdf::NIL)
            } else {
                Term::BlankNode(self.issuer.fresh())
            };
            emit(sink, current, rdf::REST, rest.clone(), graph)?;
            current = rest;
        }
        Ok(head)
    }
}

fn emit(sink: Sink<'_>, subject: Term, predicate: &str, object: Term, graph: &GraphLabel) -> Result<()> {
    sink(Statement::new(subject, NamedNode::new(predicate), object, graph.clone()))
}

fn as_items(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

fn is_list_object(value: &Value, ctx: &Context) -> bool {
    value
        .as_object()
        .is_some_and(|object| object.keys().any(|key| ctx.keyword(key) == Some("@list")))
}

/// Convert a `@value` object to a literal. `@direction` is ignored.
fn value_object(
    value: &Value,
    datatype: Option<&Value>,
    language: Option<&Value>,
    ctx: &Context,
) -> Result<Option<Literal>> {
    let datatype = match datatype {
        None | Some(Value::Null) => None,
        Some(Value::String(name)) if name == "@json" => {
            let canonical = serde_json_canonicalizer::to_string(value).map_err(|e| {
                RdfError::invalid_literal(format!("cannot canonicalize JSON literal: {e}"))
            })?;
            return Ok(Some(Literal::typed(canonical, NamedNode::new(rdf::JSON))));
        }
        Some(Value::String(name)) => Some(
            ctx.expand_iri(name, true)
                .filter(|iri| is_absolute_iri(iri))
                .ok_or_else(|| RdfError::invalid_iri(format!("invalid @type '{name}'")))?,
        ),
        Some(other) => {
            return Err(RdfError::parse(format!("@type of a value must be a string, found {other}")));
        }
    };
    match value {
        Value::Null => Ok(None),
        Value::String(text) => {
            if let Some(Value::String(language)) = language {
                return Ok(Some(Literal::lang(text.clone(), language.clone())));
            }
            Ok(Some(match datatype {
                Some(datatype) => Literal::typed(text.clone(), NamedNode::new(datatype)),
                None => Literal::new(text.clone()),
            }))
        }
        Value::Bool(_) | Value::Number(_) => Ok(native_literal(value, datatype.as_deref())),
        other => Err(RdfError::invalid_literal(format!("invalid @value {other}"))),
    }
}

/// Literal for a native JSON boolean or number. Integral numbers below
/// 10^21 become `xsd:integer`; every other number becomes an `xsd:double`
/// in canonical form.
fn native_literal(value: &Value, datatype: Option<&str>) -> Option<Literal> {
    let (lexical, natural) = match value {
        Value::Bool(flag) => (flag.to_string(), xsd::BOOLEAN),
        Value::Number(number) => {
            let integral = if let Some(n) = number.as_i64() {
                Some(n.to_string())
            } else if let Some(n) = number.as_u64() {
                Some(n.to_string())
            } else {
                number
                    .as_f64()
                    .filter(|f| f.fract() == 0.0 && f.abs() < 1e21)
                    .map(|f| format!("{f:.0}"))
            };
            match integral {
                Some(lexical) if datatype != Some(xsd::DOUBLE) => (lexical, xsd::INTEGER),
                _ => (canonical_double(number.as_f64()?), xsd::DOUBLE),
            }
        }
        _ => return None,
    };
    Some(Literal::typed(lexical, NamedNode::new(datatype.unwrap_or(natural))))
}

/// Canonical `xsd:double` lexical form: `1.5E0`, `1.0E-1`.
pub fn canonical_double(value: f64) -> String {
    let formatted = format!("{value:E}");
    match formatted.split_once('E') {
        Some((mantissa, exponent)) if !mantissa.contains('.') => format!("{mantissa}.0E{exponent}"),
        _ => formatted,
    }
}
