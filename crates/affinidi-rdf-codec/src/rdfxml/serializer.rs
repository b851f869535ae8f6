use std::collections::HashMap;
use std::io::Write;

use quick_xml::escape::escape;

use crate::error::{RdfError, Result};
use crate::model::*;
use crate::options::EncoderOptions;

/// Streaming RDF/XML writer.
///
/// Consecutive statements about the same subject share one
/// `rdf:Description`. Predicates whose namespace has no configured prefix
/// declare an `nsN` prefix on the property element itself.
#[derive(Debug)]
pub struct RdfXmlWriter {
    prefixes: Vec<(String, String)>,
    base: Option<String>,
    generated: HashMap<String, String>,
    header_written: bool,
    open_subject: Option<Term>,
}

impl RdfXmlWriter {
    pub fn new(options: &EncoderOptions) -> Self {
        Self {
            prefixes: options
                .prefixes
                .iter()
                .filter(|(label, namespace)| !label.is_empty() && namespace != rdf::NAMESPACE)
                .cloned()
                .collect(),
            base: options.base_iri.clone(),
            generated: HashMap::new(),
            header_written: false,
            open_subject: None,
        }
    }

    fn write_header(&mut self, out: &mut dyn Write) -> Result<()> {
        if self.header_written {
            return Ok(());
        }
        self.header_written = true;
        writeln!(out, "<?xml version=\"1.0\" encoding=\"utf-8\"?>")?;
        write!(out, "<rdf:RDF xmlns:rdf=\"{}\"", rdf::NAMESPACE)?;
        for (label, namespace) in &self.prefixes {
            write!(out, "\n    xmlns:{label}=\"{}\"", escape(namespace.as_str()))?;
        }
        if let Some(base) = &self.base {
            write!(out, "\n    xml:base=\"{}\"", escape(base.as_str()))?;
        }
        writeln!(out, ">")?;
        Ok(())
    }

    pub fn write_statement(&mut self, out: &mut dyn Write, statement: &Statement) -> Result<()> {
        if !statement.graph.is_default() {
            return Err(RdfError::parse(
                "RDF/XML cannot express a statement in a named graph",
            ));
        }
        if matches!(statement.subject, Term::QuotedTriple(_))
            || matches!(statement.object, Term::QuotedTriple(_))
        {
            return Err(RdfError::parse("RDF/XML cannot express quoted triples"));
        }
        let (namespace, local) = split_iri(&statement.predicate.iri).ok_or_else(|| {
            RdfError::parse(format!(
                "predicate <{}> cannot be written as an XML element name",
                statement.predicate.iri
            ))
        })?;
        self.write_header(out)?;

        if self.open_subject.as_ref() != Some(&statement.subject) {
            self.close_subject(out)?;
            match &statement.subject {
                Term::Iri(node) => writeln!(
                    out,
                    "  <rdf:Description rdf:about=\"{}\">",
                    escape(node.iri.as_str())
                )?,
                Term::BlankNode(node) => writeln!(
                    out,
                    "  <rdf:Description rdf:nodeID=\"{}\">",
                    escape(node.id.as_str())
                )?,
                _ => return Err(RdfError::parse("a literal cannot be a subject")),
            }
            self.open_subject = Some(statement.subject.clone());
        }

        let (name, declaration) = self.qualified_name(namespace, local);
        write!(out, "    <{name}{declaration}")?;
        match &statement.object {
            Term::Iri(node) => writeln!(out, " rdf:resource=\"{}\"/>", escape(node.iri.as_str()))?,
            Term::BlankNode(node) => writeln!(out, " rdf:nodeID=\"{}\"/>", escape(node.id.as_str()))?,
            Term::Literal(literal) => {
                if let Some(language) = literal.language() {
                    write!(out, " xml:lang=\"{}\"", escape(language))?;
                } else if let Some(datatype) = &literal.datatype {
                    if datatype.iri != xsd::STRING {
                        write!(out, " rdf:datatype=\"{}\"", escape(datatype.iri.as_str()))?;
                    }
                }
                writeln!(out, ">{}</{name}>", escape(literal.value.as_str()))?;
            }
            Term::QuotedTriple(_) => {
                return Err(RdfError::parse("RDF/XML cannot express quoted triples"));
            }
        }
        Ok(())
    }

    fn close_subject(&mut self, out: &mut dyn Write) -> Result<()> {
        if self.open_subject.take().is_some() {
            writeln!(out, "  </rdf:Description>")?;
        }
        Ok(())
    }

    pub fn finish(&mut self, out: &mut dyn Write) -> Result<()> {
        self.write_header(out)?;
        self.close_subject(out)?;
        writeln!(out, "</rdf:RDF>")?;
        Ok(())
    }

    /// Element name for a predicate, plus a local namespace declaration
    /// when no prefix is configured for it.
    fn qualified_name(&mut self, namespace: &str, local: &str) -> (String, String) {
        if namespace == rdf::NAMESPACE {
            return (format!("rdf:{local}"), String::new());
        }
        if let Some((label, _)) = self.prefixes.iter().find(|(_, ns)| ns == namespace) {
            return (format!("{label}:{local}"), String::new());
        }
        let next = self.generated.len();
        let label = self
            .generated
            .entry(namespace.to_string())
            .or_insert_with(|| format!("ns{next}"))
            .clone();
        (
            format!("{label}:{local}"),
            format!(" xmlns:{label}=\"{}\"", escape(namespace)),
        )
    }
}

/// Split an IRI into namespace and an XML local name, at the longest
/// suffix that is a valid NCName.
fn split_iri(iri: &str) -> Option<(&str, &str)> {
    let start = iri
        .char_indices()
        .rev()
        .take_while(|&(_, c)| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
        .last()
        .map(|(i, _)| i)?;
    // The local name must start with a letter or underscore.
    let offset = iri[start..].find(|c: char| c.is_alphabetic() || c == '_')?;
    let split = start + offset;
    Some((&iri[..split], &iri[split..]))
}
