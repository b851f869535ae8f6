use std::fmt;

use crate::lexical::escape_string;

/// An IRI-identified RDF node.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamedNode {
    pub iri: String,
}

impl NamedNode {
    pub fn new(iri: impl Into<String>) -> Self {
        Self { iri: iri.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.iri
    }
}

impl fmt::Display for NamedNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.iri)
    }
}

/// A blank (anonymous) RDF node. The `id` field stores the label without the `_:` prefix.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlankNode {
    pub id: String,
}

impl BlankNode {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl fmt::Display for BlankNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_:{}", self.id)
    }
}

/// An RDF literal.
///
/// A literal read without an explicit datatype keeps `datatype` empty so it
/// writes back the way it was read; [`Literal::datatype_iri`] reports the
/// effective datatype (`xsd:string` or `rdf:langString`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Literal {
    pub value: String,
    pub language: Option<String>,
    pub datatype: Option<NamedNode>,
}

impl Literal {
    /// Create a plain string literal.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            language: None,
            datatype: None,
        }
    }

    /// Create a typed literal.
    pub fn typed(value: impl Into<String>, datatype: NamedNode) -> Self {
        Self {
            value: value.into(),
            language: None,
            datatype: Some(datatype),
        }
    }

    /// Create a language-tagged literal.
    pub fn lang(value: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            language: Some(language.into()),
            datatype: None,
        }
    }

    /// The language tag, if non-empty.
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref().filter(|l| !l.is_empty())
    }

    /// The effective datatype IRI.
    pub fn datatype_iri(&self) -> &str {
        if self.language().is_some() {
            return rdf::LANG_STRING;
        }
        match &self.datatype {
            Some(dt) if !dt.iri.is_empty() => &dt.iri,
            _ => xsd::STRING,
        }
    }

    /// True when the literal is a simple `xsd:string` literal.
    pub fn is_plain(&self) -> bool {
        self.language().is_none() && self.datatype_iri() == xsd::STRING
    }

    /// The same literal with implicit datatypes made explicit: a language tag
    /// drops any `rdf:langString` datatype and a missing datatype becomes
    /// `xsd:string`.
    pub fn normalized(&self) -> Literal {
        match self.language() {
            Some(lang) => Literal::lang(self.value.clone(), lang.to_ascii_lowercase()),
            None => Literal::typed(self.value.clone(), NamedNode::new(self.datatype_iri())),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", escape_string(&self.value))?;
        if let Some(lang) = self.language() {
            write!(f, "@{lang}")
        } else {
            match &self.datatype {
                Some(dt) if !dt.iri.is_empty() && dt.iri != xsd::STRING => write!(f, "^^{dt}"),
                _ => Ok(()),
            }
        }
    }
}

/// Discriminator for [`Term`] variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TermKind {
    Iri,
    BlankNode,
    Literal,
    QuotedTriple,
}

impl fmt::Display for TermKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Iri => "IRI",
            Self::BlankNode => "blank node",
            Self::Literal => "literal",
            Self::QuotedTriple => "quoted triple",
        })
    }
}

/// Any RDF term.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Term {
    Iri(NamedNode),
    BlankNode(BlankNode),
    Literal(Literal),
    QuotedTriple(Box<Triple>),
}

impl Term {
    pub fn iri(iri: impl Into<String>) -> Self {
        Self::Iri(NamedNode::new(iri))
    }

    pub fn blank(id: impl Into<String>) -> Self {
        Self::BlankNode(BlankNode::new(id))
    }

    pub fn kind(&self) -> TermKind {
        match self {
            Self::Iri(_) => TermKind::Iri,
            Self::BlankNode(_) => TermKind::BlankNode,
            Self::Literal(_) => TermKind::Literal,
            Self::QuotedTriple(_) => TermKind::QuotedTriple,
        }
    }

    pub fn as_named_node(&self) -> Option<&NamedNode> {
        match self {
            Self::Iri(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Self::Literal(l) => Some(l),
            _ => None,
        }
    }

    /// Structural equality after literal datatype defaults are made explicit.
    pub fn semantically_eq(&self, other: &Term) -> bool {
        match (self, other) {
            (Self::Literal(a), Self::Literal(b)) => a.normalized() == b.normalized(),
            (Self::QuotedTriple(a), Self::QuotedTriple(b)) => a.semantically_eq(b),
            (a, b) => a == b,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Iri(n) => n.fmt(f),
            Self::BlankNode(b) => b.fmt(f),
            Self::Literal(l) => l.fmt(f),
            Self::QuotedTriple(t) => write!(f, "<<{} {} {}>>", t.subject, t.predicate, t.object),
        }
    }
}

impl From<NamedNode> for Term {
    fn from(n: NamedNode) -> Self {
        Self::Iri(n)
    }
}

impl From<BlankNode> for Term {
    fn from(b: BlankNode) -> Self {
        Self::BlankNode(b)
    }
}

impl From<Literal> for Term {
    fn from(l: Literal) -> Self {
        Self::Literal(l)
    }
}

impl From<Triple> for Term {
    fn from(t: Triple) -> Self {
        Self::QuotedTriple(Box::new(t))
    }
}

/// A subject, predicate, object assertion; also the payload of a quoted triple.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Triple {
    pub subject: Term,
    pub predicate: NamedNode,
    pub object: Term,
}

impl Triple {
    pub fn new(subject: impl Into<Term>, predicate: NamedNode, object: impl Into<Term>) -> Self {
        Self {
            subject: subject.into(),
            predicate,
            object: object.into(),
        }
    }

    pub fn semantically_eq(&self, other: &Triple) -> bool {
        self.subject.semantically_eq(&other.subject)
            && self.predicate == other.predicate
            && self.object.semantically_eq(&other.object)
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} .", self.subject, self.predicate, self.object)
    }
}

/// The graph label of an RDF quad.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GraphLabel {
    Named(NamedNode),
    Blank(BlankNode),
    Default,
}

impl GraphLabel {
    pub fn is_default(&self) -> bool {
        matches!(self, Self::Default)
    }

    /// The label as a term, `None` for the default graph.
    pub fn to_term(&self) -> Option<Term> {
        match self {
            Self::Named(n) => Some(Term::Iri(n.clone())),
            Self::Blank(b) => Some(Term::BlankNode(b.clone())),
            Self::Default => None,
        }
    }
}

impl fmt::Display for GraphLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(n) => n.fmt(f),
            Self::Blank(b) => b.fmt(f),
            Self::Default => Ok(()),
        }
    }
}

impl From<NamedNode> for GraphLabel {
    fn from(n: NamedNode) -> Self {
        Self::Named(n)
    }
}

impl From<BlankNode> for GraphLabel {
    fn from(b: BlankNode) -> Self {
        Self::Blank(b)
    }
}

/// A statement: a triple, or a quad when the graph is not the default graph.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Statement {
    pub subject: Term,
    pub predicate: NamedNode,
    pub object: Term,
    pub graph: GraphLabel,
}

impl Statement {
    pub fn new(
        subject: impl Into<Term>,
        predicate: NamedNode,
        object: impl Into<Term>,
        graph: GraphLabel,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate,
            object: object.into(),
            graph,
        }
    }

    /// A statement in the default graph.
    pub fn triple(subject: impl Into<Term>, predicate: NamedNode, object: impl Into<Term>) -> Self {
        Self::new(subject, predicate, object, GraphLabel::Default)
    }

    pub fn is_triple(&self) -> bool {
        self.graph.is_default()
    }

    pub fn is_quad(&self) -> bool {
        !self.graph.is_default()
    }

    /// The statement without its graph.
    pub fn as_triple(&self) -> Triple {
        Triple {
            subject: self.subject.clone(),
            predicate: self.predicate.clone(),
            object: self.object.clone(),
        }
    }

    /// The statement as a quad; the default graph stays the default graph.
    pub fn as_quad(&self) -> Quad {
        Quad {
            subject: self.subject.clone(),
            predicate: self.predicate.clone(),
            object: self.object.clone(),
            graph: self.graph.clone(),
        }
    }

    pub fn semantically_eq(&self, other: &Statement) -> bool {
        self.graph == other.graph && self.as_triple().semantically_eq(&other.as_triple())
    }
}

impl From<Triple> for Statement {
    fn from(t: Triple) -> Self {
        Self::new(t.subject, t.predicate, t.object, GraphLabel::Default)
    }
}

impl From<Quad> for Statement {
    fn from(q: Quad) -> Self {
        Self::new(q.subject, q.predicate, q.object, q.graph)
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.subject, self.predicate, self.object)?;
        if !self.graph.is_default() {
            write!(f, " {}", self.graph)?;
        }
        f.write_str(" .")
    }
}

/// An RDF quad (subject, predicate, object, graph).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Quad {
    pub subject: Term,
    pub predicate: NamedNode,
    pub object: Term,
    pub graph: GraphLabel,
}

/// XSD namespace constants.
pub mod xsd {
    pub const NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema#";
    pub const STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
    pub const BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
    pub const INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
    pub const DECIMAL: &str = "http://www.w3.org/2001/XMLSchema#decimal";
    pub const DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";
    pub const DATE_TIME: &str = "http://www.w3.org/2001/XMLSchema#dateTime";
}

/// RDF namespace constants.
pub mod rdf {
    pub const NAMESPACE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
    pub const TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
    pub const FIRST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#first";
    pub const REST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#rest";
    pub const NIL: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#nil";
    pub const LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";
    pub const XML_LITERAL: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#XMLLiteral";
    pub const JSON: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#JSON";
    pub const STATEMENT: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#Statement";
    pub const SUBJECT: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#subject";
    pub const PREDICATE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#predicate";
    pub const OBJECT: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#object";
    pub const LI: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#li";
}
