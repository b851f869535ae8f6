use std::io::Write;

use crate::error::{RdfError, Result};
use crate::lexical::{escape_string, is_valid_local_name};
use crate::model::*;
use crate::options::EncoderOptions;

/// Streaming Turtle / TriG writer.
///
/// Compact mode writes one statement per line. Pretty mode groups
/// consecutive statements with the same subject using `;` (Turtle) or
/// writes indented `graph { ... }` blocks (TriG).
#[derive(Debug)]
pub struct TurtleWriter {
    trig: bool,
    pretty: bool,
    prefixes: Vec<(String, String)>,
    base: Option<String>,
    header_written: bool,
    /// Subject of the open `;` group in pretty Turtle.
    open_subject: Option<Term>,
    /// Graph of the open block in pretty TriG.
    open_graph: Option<GraphLabel>,
}

impl TurtleWriter {
    pub fn new(trig: bool, options: &EncoderOptions) -> Self {
        Self {
            trig,
            pretty: options.pretty,
            prefixes: options.prefixes.clone(),
            base: options.base_iri.clone(),
            header_written: false,
            open_subject: None,
            open_graph: None,
        }
    }

    fn write_header(&mut self, out: &mut dyn Write) -> Result<()> {
        if self.header_written {
            return Ok(());
        }
        self.header_written = true;
        if let Some(base) = &self.base {
            writeln!(out, "@base <{base}> .")?;
        }
        for (label, namespace) in &self.prefixes {
            writeln!(out, "@prefix {label}: <{namespace}> .")?;
        }
        if self.base.is_some() || !self.prefixes.is_empty() {
            writeln!(out)?;
        }
        Ok(())
    }

    pub fn write_statement(&mut self, out: &mut dyn Write, statement: &Statement) -> Result<()> {
        if !self.trig && !statement.graph.is_default() {
            return Err(RdfError::parse(
                "Turtle cannot express a statement in a named graph",
            ));
        }
        self.write_header(out)?;

        let subject = self.term(&statement.subject);
        let predicate = self.predicate(&statement.predicate);
        let object = self.term(&statement.object);

        if !self.pretty {
            return match &statement.graph {
                GraphLabel::Default => Ok(writeln!(out, "{subject} {predicate} {object} .")?),
                graph => {
                    let graph = self.graph_name(graph);
                    Ok(writeln!(out, "{graph} {{ {subject} {predicate} {object} . }}")?)
                }
            };
        }

        if self.trig {
            if self.open_graph.as_ref() != Some(&statement.graph) {
                self.close_graph(out)?;
                match &statement.graph {
                    GraphLabel::Default => writeln!(out, "{{")?,
                    graph => writeln!(out, "{} {{", self.graph_name(graph))?,
                }
                self.open_graph = Some(statement.graph.clone());
            }
            writeln!(out, "    {subject} {predicate} {object} .")?;
            return Ok(());
        }

        if self.open_subject.as_ref() == Some(&statement.subject) {
            write!(out, " ;\n    {predicate} {object}")?;
        } else {
            self.close_subject(out)?;
            write!(out, "{subject} {predicate} {object}")?;
            self.open_subject = Some(statement.subject.clone());
        }
        Ok(())
    }

    fn close_subject(&mut self, out: &mut dyn Write) -> Result<()> {
        if self.open_subject.take().is_some() {
            writeln!(out, " .")?;
        }
        Ok(())
    }

    fn close_graph(&mut self, out: &mut dyn Write) -> Result<()> {
        if self.open_graph.take().is_some() {
            writeln!(out, "}}")?;
        }
        Ok(())
    }

    /// Close any open group or block. Writes the header if nothing else was
    /// written, so an empty document still carries its prefixes.
    pub fn finish(&mut self, out: &mut dyn Write) -> Result<()> {
        self.write_header(out)?;
        self.close_subject(out)?;
        self.close_graph(out)
    }

    fn graph_name(&self, graph: &GraphLabel) -> String {
        match graph {
            GraphLabel::Named(node) => self.iri(&node.iri),
            GraphLabel::Blank(node) => node.to_string(),
            // The unnamed block is the default graph.
            GraphLabel::Default => String::new(),
        }
    }

    fn predicate(&self, predicate: &NamedNode) -> String {
        if predicate.iri == rdf::TYPE {
            return "a".to_string();
        }
        self.iri(&predicate.iri)
    }

    fn term(&self, term: &Term) -> String {
        match term {
            Term::Iri(node) => self.iri(&node.iri),
            Term::BlankNode(node) => node.to_string(),
            Term::Literal(literal) => self.literal(literal),
            Term::QuotedTriple(triple) => format!(
                "<< {} {} {} >>",
                self.term(&triple.subject),
                self.iri(&triple.predicate.iri),
                self.term(&triple.object)
            ),
        }
    }

    fn iri(&self, iri: &str) -> String {
        match abbreviate(iri, &self.prefixes) {
            Some(name) => name,
            None => format!("<{iri}>"),
        }
    }

    fn literal(&self, literal: &Literal) -> String {
        let datatype = literal.datatype_iri();
        if literal.language.is_none() {
            if datatype == xsd::INTEGER && is_canonical_integer(&literal.value) {
                return literal.value.clone();
            }
            if datatype == xsd::BOOLEAN && matches!(literal.value.as_str(), "true" | "false") {
                return literal.value.clone();
            }
        }

        let mut out = if literal.value.contains('\n') {
            format!("\"\"\"{}\"\"\"", escape_long_string(&literal.value))
        } else {
            format!("\"{}\"", escape_string(&literal.value))
        };
        if let Some(language) = literal.language() {
            out.push('@');
            out.push_str(language);
        } else if datatype != xsd::STRING {
            out.push_str("^^");
            out.push_str(&self.iri(datatype));
        }
        out
    }
}

/// Write `iri` as a prefixed name when some namespace is a prefix of it and
/// the remainder is a valid local name. The longest namespace wins; on a tie
/// a named prefix beats the default one.
pub fn abbreviate(iri: &str, prefixes: &[(String, String)]) -> Option<String> {
    let mut best: Option<(&str, &str)> = None;
    for (label, namespace) in prefixes {
        if namespace.is_empty() || !iri.starts_with(namespace.as_str()) {
            continue;
        }
        let local = &iri[namespace.len()..];
        if !is_valid_local_name(local) {
            continue;
        }
        let better = match best {
            None => true,
            Some((best_label, best_namespace)) => {
                namespace.len() > best_namespace.len()
                    || (namespace.len() == best_namespace.len()
                        && best_label.is_empty()
                        && !label.is_empty())
            }
        };
        if better {
            best = Some((label, namespace));
        }
    }
    best.map(|(label, namespace)| format!("{label}:{}", &iri[namespace.len()..]))
}

fn is_canonical_integer(value: &str) -> bool {
    let digits = value.strip_prefix('-').unwrap_or(value);
    !digits.is_empty()
        && digits.bytes().all(|b| b.is_ascii_digit())
        && (digits == "0" || !digits.starts_with('0'))
        && value != "-0"
}

/// Escape the body of a `"""` string: newlines stay literal.
fn escape_long_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\n' => out.push('\n'),
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c < '\u{0020}' || c == '\u{007F}' => {
                out.push_str(&format!("\\u{:04X}", c as u32));
            }
            c => out.push(c),
        }
    }
    out
}
