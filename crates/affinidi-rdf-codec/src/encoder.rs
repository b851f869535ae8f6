/*!
 * Uniform encoder over every supported syntax
 */

use std::io::Write;

use crate::error::{RdfError, Result};
use crate::format::Format;
use crate::jsonld::JsonLdWriter;
use crate::model::Statement;
use crate::ntriples::LineWriter;
use crate::options::EncoderOptions;
use crate::rdfxml::RdfXmlWriter;
use crate::turtle::TurtleWriter;

#[derive(Debug)]
enum Writer {
    Lines(LineWriter),
    Turtle(TurtleWriter),
    RdfXml(RdfXmlWriter),
    JsonLd(JsonLdWriter),
}

impl Writer {
    fn write_statement(&mut self, out: &mut dyn Write, statement: &Statement) -> Result<()> {
        match self {
            Self::Lines(writer) => writer.write_statement(out, statement),
            Self::Turtle(writer) => writer.write_statement(out, statement),
            Self::RdfXml(writer) => writer.write_statement(out, statement),
            Self::JsonLd(writer) => writer.write_statement(out, statement),
        }
    }

    fn finish(&mut self, out: &mut dyn Write) -> Result<()> {
        match self {
            Self::Lines(_) => Ok(()),
            Self::Turtle(writer) => writer.finish(out),
            Self::RdfXml(writer) => writer.finish(out),
            Self::JsonLd(writer) => writer.finish(out),
        }
    }
}

/// Streaming RDF encoder.
///
/// Statements are written in the order they are given. [`flush`](Self::flush)
/// pushes buffered bytes to the output; [`close`](Self::close) writes any
/// trailer, flushes and seals the encoder.
///
/// Example:
/// ```
/// use affinidi_rdf_codec::{Encoder, EncoderOptions, Format, NamedNode, Statement};
///
/// let mut encoder = Encoder::new(Vec::new(), Format::NTriples, &EncoderOptions::default()).unwrap();
/// encoder
///     .write(&Statement::triple(
///         NamedNode::new("http://a/s"),
///         NamedNode::new("http://a/p"),
///         NamedNode::new("http://a/o"),
///     ))
///     .unwrap();
/// let bytes = encoder.into_inner().unwrap();
/// assert_eq!(bytes, b"<http://a/s> <http://a/p> <http://a/o> .\n");
/// ```
#[derive(Debug)]
pub struct Encoder<W: Write> {
    out: W,
    writer: Writer,
    format: Format,
    written: usize,
    closed: bool,
}

impl<W: Write> Encoder<W> {
    pub fn new(out: W, format: Format, options: &EncoderOptions) -> Result<Self> {
        let writer = match format {
            Format::NTriples => Writer::Lines(LineWriter::new(false)),
            Format::NQuads => Writer::Lines(LineWriter::new(true)),
            Format::Turtle => Writer::Turtle(TurtleWriter::new(false, options)),
            Format::TriG => Writer::Turtle(TurtleWriter::new(true, options)),
            Format::RdfXml => Writer::RdfXml(RdfXmlWriter::new(options)),
            Format::JsonLd => Writer::JsonLd(JsonLdWriter::new(options)),
            Format::Auto => {
                return Err(RdfError::unsupported("an encoder needs a concrete format"));
            }
        };
        Ok(Self {
            out,
            writer,
            format,
            written: 0,
            closed: false,
        })
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn write(&mut self, statement: &Statement) -> Result<()> {
        if self.closed {
            return Err(RdfError::EncoderClosed);
        }
        self.writer.write_statement(&mut self.out, statement)?;
        self.written += 1;
        Ok(())
    }

    pub fn write_all<'a, I>(&mut self, statements: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a Statement>,
    {
        for statement in statements {
            self.write(statement)?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        if self.closed {
            return Err(RdfError::EncoderClosed);
        }
        self.out.flush()?;
        tracing::debug!(format = %self.format, statements = self.written, "encoder flushed");
        Ok(())
    }

    /// Write any trailer and flush. Closing twice is a no-op.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.writer.finish(&mut self.out)?;
        self.out.flush()?;
        tracing::debug!(format = %self.format, statements = self.written, "encoder closed");
        Ok(())
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    /// Close the encoder and return the underlying output.
    pub fn into_inner(mut self) -> Result<W> {
        self.close()?;
        Ok(self.out)
    }
}

/// Encode statements into an in-memory buffer.
pub fn encode_all<'a, I>(statements: I, format: Format, options: &EncoderOptions) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = &'a Statement>,
{
    let mut encoder = Encoder::new(Vec::new(), format, options)?;
    encoder.write_all(statements)?;
    encoder.into_inner()
}
