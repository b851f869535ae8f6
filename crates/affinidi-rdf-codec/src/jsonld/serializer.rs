use std::collections::HashMap;
use std::io::Write;

use serde_json::{Map, Value};

use crate::error::{RdfError, Result};
use crate::model::*;
use crate::options::EncoderOptions;
use crate::turtle::abbreviate;

/// Buffered JSON-LD writer.
///
/// Statements are grouped by graph and then by subject into node objects;
/// the document is written in one piece by [`finish`](Self::finish).
#[derive(Debug)]
pub struct JsonLdWriter {
    prefixes: Vec<(String, String)>,
    pretty: bool,
    canonical: bool,
    graphs: Vec<GraphNodes>,
    graph_index: HashMap<GraphLabel, usize>,
}

/// Node objects of one graph, in first-seen subject order.
#[derive(Debug)]
struct GraphNodes {
    label: GraphLabel,
    nodes: Vec<Map<String, Value>>,
    index: HashMap<Term, usize>,
}

impl JsonLdWriter {
    pub fn new(options: &EncoderOptions) -> Self {
        Self {
            // JSON-LD has no empty prefix.
            prefixes: options
                .prefixes
                .iter()
                .filter(|(label, _)| !label.is_empty())
                .cloned()
                .collect(),
            pretty: options.pretty,
            canonical: options.canonicalize_json,
            graphs: Vec::new(),
            graph_index: HashMap::new(),
        }
    }

    pub fn write_statement(&mut self, _out: &mut dyn Write, statement: &Statement) -> Result<()> {
        let subject_id = self.node_id(&statement.subject)?;
        let predicate = &statement.predicate.iri;
        let object = &statement.object;

        let type_value = match object {
            Term::Iri(node) if predicate == rdf::TYPE => Some(Value::String(self.compact(&node.iri))),
            Term::BlankNode(node) if predicate == rdf::TYPE => Some(Value::String(format!("_:{}", node.id))),
            _ => None,
        };
        let (key, value) = match type_value {
            Some(value) => ("@type".to_string(), value),
            None => (self.compact(predicate), self.object_value(object)?),
        };

        let graph = self.graph(&statement.graph);
        let node = graph.node(&statement.subject, subject_id);
        match node.get_mut(&key) {
            Some(Value::Array(values)) => values.push(value),
            _ => {
                node.insert(key, Value::Array(vec![value]));
            }
        }
        Ok(())
    }

    pub fn finish(&mut self, out: &mut dyn Write) -> Result<()> {
        let graphs = std::mem::take(&mut self.graphs);
        let graph_count = graphs.len();
        self.graph_index.clear();

        let mut default_nodes = Vec::new();
        let mut named = Vec::new();
        for graph in graphs {
            let nodes: Vec<Value> = graph.nodes.into_iter().map(Value::Object).collect();
            match graph.label {
                GraphLabel::Default => default_nodes = nodes,
                label => {
                    let mut wrapper = Map::new();
                    let id = match &label {
                        GraphLabel::Named(node) => self.compact(&node.iri),
                        GraphLabel::Blank(node) => format!("_:{}", node.id),
                        GraphLabel::Default => String::new(),
                    };
                    wrapper.insert("@id".to_string(), Value::String(id));
                    wrapper.insert("@graph".to_string(), Value::Array(nodes));
                    named.push(Value::Object(wrapper));
                }
            }
        }

        let context = (!self.prefixes.is_empty()).then(|| {
            let mut context = Map::new();
            for (label, namespace) in &self.prefixes {
                context.insert(label.clone(), Value::String(namespace.clone()));
            }
            Value::Object(context)
        });

        let document = if named.is_empty() && context.is_none() {
            Value::Array(default_nodes)
        } else {
            let mut top = Map::new();
            if let Some(context) = context {
                top.insert("@context".to_string(), context);
            }
            default_nodes.extend(named);
            top.insert("@graph".to_string(), Value::Array(default_nodes));
            Value::Object(top)
        };

        if self.canonical {
            let text = serde_json_canonicalizer::to_string(&document)
                .map_err(|e| RdfError::parse(format!("cannot canonicalize JSON-LD output: {e}")))?;
            out.write_all(text.as_bytes())?;
        } else if self.pretty {
            serde_json::to_writer_pretty(&mut *out, &document)?;
        } else {
            serde_json::to_writer(&mut *out, &document)?;
        }
        writeln!(out)?;
        tracing::debug!(graphs = graph_count, "JSON-LD document written");
        Ok(())
    }

    fn graph(&mut self, label: &GraphLabel) -> &mut GraphNodes {
        let index = match self.graph_index.get(label) {
            Some(&index) => index,
            None => {
                self.graphs.push(GraphNodes {
                    label: label.clone(),
                    nodes: Vec::new(),
                    index: HashMap::new(),
                });
                let index = self.graphs.len() - 1;
                self.graph_index.insert(label.clone(), index);
                index
            }
        };
        &mut self.graphs[index]
    }

    fn node_id(&self, term: &Term) -> Result<String> {
        match term {
            Term::Iri(node) => Ok(self.compact(&node.iri)),
            Term::BlankNode(node) => Ok(format!("_:{}", node.id)),
            Term::Literal(_) => Err(RdfError::parse("a literal cannot be a subject")),
            Term::QuotedTriple(_) => Err(RdfError::parse("JSON-LD cannot express quoted triples")),
        }
    }

    fn object_value(&self, term: &Term) -> Result<Value> {
        let mut object = Map::new();
        match term {
            Term::Iri(_) | Term::BlankNode(_) => {
                object.insert("@id".to_string(), Value::String(self.node_id(term)?));
            }
            Term::Literal(literal) => {
                if let Some(value) = native_value(literal) {
                    return Ok(value);
                }
                object.insert("@value".to_string(), Value::String(literal.value.clone()));
                if let Some(language) = literal.language() {
                    object.insert("@language".to_string(), Value::String(language.to_string()));
                } else if literal.datatype_iri() != xsd::STRING {
                    object.insert(
                        "@type".to_string(),
                        Value::String(self.compact(literal.datatype_iri())),
                    );
                }
            }
            Term::QuotedTriple(_) => {
                return Err(RdfError::parse("JSON-LD cannot express quoted triples"));
            }
        }
        Ok(Value::Object(object))
    }

    fn compact(&self, iri: &str) -> String {
        abbreviate(iri, &self.prefixes).unwrap_or_else(|| iri.to_string())
    }
}

impl GraphNodes {
    fn node(&mut self, subject: &Term, id: String) -> &mut Map<String, Value> {
        let index = match self.index.get(subject) {
            Some(&index) => index,
            None => {
                let mut node = Map::new();
                node.insert("@id".to_string(), Value::String(id));
                self.nodes.push(node);
                let index = self.nodes.len() - 1;
                self.index.insert(subject.clone(), index);
                index
            }
        };
        &mut self.nodes[index]
    }
}

/// Plain strings, canonical integers and booleans are written as native
/// JSON values; they read back as the same literal.
fn native_value(literal: &Literal) -> Option<Value> {
    if literal.language().is_some() {
        return None;
    }
    match literal.datatype_iri() {
        xsd::STRING => Some(Value::String(literal.value.clone())),
        xsd::BOOLEAN => match literal.value.as_str() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        xsd::INTEGER => {
            let number: i64 = literal.value.parse().ok()?;
            (number.to_string() == literal.value).then(|| Value::from(number))
        }
        _ => None,
    }
}
