use std::io::Write;

use crate::error::{RdfError, Result};
use crate::model::{GraphLabel, Statement, Term};

/// Serialize a single statement to an N-Quads line (without trailing newline).
/// A statement in the default graph is written as a triple.
pub fn serialize_statement(statement: &Statement) -> String {
    let mut out = String::with_capacity(128);
    push_term(&mut out, &statement.subject);
    out.push(' ');
    out.push_str(&statement.predicate.to_string());
    out.push(' ');
    push_term(&mut out, &statement.object);
    out.push(' ');

    // Graph (optional)
    match &statement.graph {
        GraphLabel::Named(n) => {
            out.push_str(&n.to_string());
            out.push(' ');
        }
        GraphLabel::Blank(b) => {
            out.push_str(&b.to_string());
            out.push(' ');
        }
        GraphLabel::Default => {}
    }

    out.push('.');
    out
}

fn push_term(out: &mut String, term: &Term) {
    match term {
        Term::QuotedTriple(t) => {
            out.push_str("<< ");
            push_term(out, &t.subject);
            out.push(' ');
            out.push_str(&t.predicate.to_string());
            out.push(' ');
            push_term(out, &t.object);
            out.push_str(" >>");
        }
        other => out.push_str(&other.to_string()),
    }
}

/// Streaming N-Triples / N-Quads writer: one statement per line.
#[derive(Debug)]
pub struct LineWriter {
    quads: bool,
}

impl LineWriter {
    pub fn new(quads: bool) -> Self {
        Self { quads }
    }

    pub fn write_statement(&mut self, out: &mut dyn Write, statement: &Statement) -> Result<()> {
        if !self.quads && !statement.graph.is_default() {
            return Err(RdfError::parse(
                "N-Triples cannot express a statement in a named graph",
            ));
        }
        out.write_all(serialize_statement(statement).as_bytes())?;
        out.write_all(b"\n")?;
        Ok(())
    }
}
