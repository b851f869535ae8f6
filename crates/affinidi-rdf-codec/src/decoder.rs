/*!
 * Uniform decoder over every supported syntax
 *
 * Parsers are push-based: each step hands zero or more statements to a
 * sink. [`Decoder`] layers the statement cap and cancellation on top, and
 * adapts the push parser to a pull [`Iterator`] through a small queue.
 */

use std::collections::VecDeque;
use std::fmt;
use std::io::{BufReader, Chain, Cursor, Read};

use crate::detect::detect_format;
use crate::error::{RdfError, Result};
use crate::format::Format;
use crate::jsonld::JsonLdParser;
use crate::model::Statement;
use crate::ntriples::NTriplesParser;
use crate::options::DecoderOptions;
use crate::rdfxml::RdfXmlParser;
use crate::turtle::TurtleParser;

/// A push parser for one syntax.
pub trait StatementParser {
    /// Parse the next unit of input, handing every statement it yields to
    /// `sink`. Returns `Ok(false)` once the input is exhausted.
    fn parse_step(&mut self, sink: &mut dyn FnMut(Statement) -> Result<()>) -> Result<bool>;
}

type Input<R> = BufReader<Chain<Cursor<Vec<u8>>, R>>;

enum Parser<R: Read> {
    Lines(NTriplesParser<Input<R>>),
    Turtle(TurtleParser<Input<R>>),
    RdfXml(RdfXmlParser<Input<R>>),
    JsonLd(JsonLdParser<Input<R>>),
}

impl<R: Read> Parser<R> {
    fn new(input: Input<R>, format: Format, options: &DecoderOptions) -> Result<Self> {
        Ok(match format {
            Format::NTriples => Self::Lines(NTriplesParser::new(input, false, options)),
            Format::NQuads => Self::Lines(NTriplesParser::new(input, true, options)),
            Format::Turtle => Self::Turtle(TurtleParser::new(input, false, options)),
            Format::TriG => Self::Turtle(TurtleParser::new(input, true, options)),
            Format::RdfXml => Self::RdfXml(RdfXmlParser::new(input, options)),
            Format::JsonLd => Self::JsonLd(JsonLdParser::new(input, options)),
            Format::Auto => return Err(RdfError::unsupported("auto")),
        })
    }

    fn parse_step(&mut self, sink: &mut dyn FnMut(Statement) -> Result<()>) -> Result<bool> {
        match self {
            Self::Lines(parser) => parser.parse_step(sink),
            Self::Turtle(parser) => parser.parse_step(sink),
            Self::RdfXml(parser) => parser.parse_step(sink),
            Self::JsonLd(parser) => parser.parse_step(sink),
        }
    }
}

/// Streaming RDF decoder.
///
/// Use [`parse_with`](Self::parse_with) to push statements into a callback,
/// or iterate to pull them one at a time. A single terminal error ends the
/// sequence.
///
/// Example:
/// ```
/// use affinidi_rdf_codec::{Decoder, DecoderOptions, Format};
///
/// let input = "@prefix ex: <http://example.org/> .\nex:s ex:p ex:o .\n";
/// let decoder = Decoder::new(input.as_bytes(), Format::Turtle, DecoderOptions::default()).unwrap();
/// let statements: Vec<_> = decoder.collect::<Result<_, _>>().unwrap();
/// assert_eq!(statements.len(), 1);
/// ```
pub struct Decoder<R: Read> {
    parser: Parser<R>,
    format: Format,
    options: DecoderOptions,
    emitted: usize,
    queue: VecDeque<Statement>,
    pending_error: Option<RdfError>,
    finished: bool,
}

impl<R: Read> fmt::Debug for Decoder<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decoder")
            .field("format", &self.format)
            .field("options", &self.options)
            .field("emitted", &self.emitted)
            .field("queued", &self.queue.len())
            .field("pending_error", &self.pending_error)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl<R: Read> Decoder<R> {
    /// Create a decoder for `format`. [`Format::Auto`] inspects the first
    /// bytes of the input to choose one.
    pub fn new(reader: R, format: Format, options: DecoderOptions) -> Result<Self> {
        let (format, input) = match format {
            Format::Auto => detect_format(reader)?,
            format => (format, Cursor::new(Vec::new()).chain(reader)),
        };
        let parser = Parser::new(BufReader::new(input), format, &options)?;
        Ok(Self {
            parser,
            format,
            options,
            emitted: 0,
            queue: VecDeque::new(),
            pending_error: None,
            finished: false,
        })
    }

    /// The concrete format being decoded.
    pub fn format(&self) -> Format {
        self.format
    }

    /// Number of statements handed out so far.
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// Push every remaining statement into `f`. Stops at the first error,
    /// whether raised by the input or returned by `f`.
    pub fn parse_with<F>(&mut self, mut f: F) -> Result<()>
    where
        F: FnMut(Statement) -> Result<()>,
    {
        if self.finished {
            return Ok(());
        }
        while let Some(statement) = self.queue.pop_front() {
            f(statement)?;
        }
        loop {
            match self.step(&mut f) {
                Ok(true) => {}
                Ok(false) => {
                    self.finished = true;
                    return Ok(());
                }
                Err(e) => {
                    self.finished = true;
                    return Err(e);
                }
            }
        }
    }

    /// Run one parser step with the statement cap and cancellation applied
    /// to every statement on its way to `f`.
    fn step(&mut self, f: &mut dyn FnMut(Statement) -> Result<()>) -> Result<bool> {
        self.options.check_canceled()?;
        let max = self.options.max_statements;
        let cancellation = &self.options.cancellation;
        let emitted = &mut self.emitted;
        let mut guarded = |statement: Statement| -> Result<()> {
            if let Some(signal) = cancellation {
                signal.check()?;
            }
            if max > 0 && *emitted >= max {
                return Err(RdfError::TripleLimitExceeded { limit: max });
            }
            *emitted += 1;
            f(statement)
        };
        self.parser.parse_step(&mut guarded)
    }

    fn is_canceled(&self) -> bool {
        self.options
            .cancellation
            .as_ref()
            .is_some_and(|signal| signal.is_canceled())
    }
}

impl<R: Read> Iterator for Decoder<R> {
    type Item = Result<Statement>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.finished && self.queue.is_empty() && self.pending_error.is_none() {
                return None;
            }
            if self.is_canceled() {
                // Statements already parsed but not yet handed out are dropped.
                self.queue.clear();
                self.pending_error = None;
                self.finished = true;
                return Some(Err(RdfError::Canceled));
            }
            if let Some(statement) = self.queue.pop_front() {
                return Some(Ok(statement));
            }
            if let Some(error) = self.pending_error.take() {
                self.finished = true;
                return Some(Err(error));
            }

            let mut queue = std::mem::take(&mut self.queue);
            let result = self.step(&mut |statement: Statement| {
                queue.push_back(statement);
                Ok(())
            });
            self.queue = queue;
            match result {
                Ok(true) => {}
                Ok(false) => self.finished = true,
                Err(error) => self.pending_error = Some(error),
            }
        }
    }
}

/// Decode a complete in-memory document.
///
/// Example:
/// ```
/// use affinidi_rdf_codec::{DecoderOptions, Format, decode_all};
///
/// let statements = decode_all(b"<http://a/s> <http://a/p> <http://a/o> <http://a/g> .\n", Format::Auto, DecoderOptions::default()).unwrap();
/// assert!(statements[0].is_quad());
/// ```
pub fn decode_all(input: &[u8], format: Format, options: DecoderOptions) -> Result<Vec<Statement>> {
    let mut decoder = Decoder::new(input, format, options)?;
    let mut statements = Vec::new();
    decoder.parse_with(|statement| {
        statements.push(statement);
        Ok(())
    })?;
    Ok(statements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::model::*;
    use crate::options::CancellationSignal;

    const THREE: &str = "<http://a/s> <http://a/p> \"1\" .\n\
                         <http://a/s> <http://a/p> \"2\" .\n\
                         <http://a/s> <http://a/p> \"3\" .\n";

    #[test]
    fn iterator_yields_statements_in_order() {
        let decoder = Decoder::new(THREE.as_bytes(), Format::NTriples, DecoderOptions::default()).unwrap();
        let values: Vec<String> = decoder
            .map(|st| st.unwrap().object.as_literal().unwrap().value.clone())
            .collect();
        assert_eq!(values, vec!["1", "2", "3"]);
    }

    #[test]
    fn statement_cap_is_exact() {
        let options = DecoderOptions::builder().with_max_statements(2).build();
        let mut decoder = Decoder::new(THREE.as_bytes(), Format::NTriples, options).unwrap();
        assert!(decoder.next().unwrap().is_ok());
        assert!(decoder.next().unwrap().is_ok());
        let err = decoder.next().unwrap().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TripleLimitExceeded);
        assert!(decoder.next().is_none());
    }

    #[test]
    fn cap_applies_inside_one_step() {
        // One Turtle statement yields three triples.
        let options = DecoderOptions::builder().with_max_statements(2).build();
        let mut decoder = Decoder::new(
            "<http://a/s> <http://a/p> 1, 2, 3 .".as_bytes(),
            Format::Turtle,
            options,
        )
        .unwrap();
        assert!(decoder.next().unwrap().is_ok());
        assert!(decoder.next().unwrap().is_ok());
        assert_eq!(
            decoder.next().unwrap().unwrap_err().kind(),
            ErrorKind::TripleLimitExceeded
        );
    }

    #[test]
    fn auto_detection() {
        let decoder = Decoder::new(THREE.as_bytes(), Format::Auto, DecoderOptions::default()).unwrap();
        assert_eq!(decoder.format(), Format::NTriples);
        assert_eq!(decoder.count(), 3);

        let err = Decoder::new("".as_bytes(), Format::Auto, DecoderOptions::default())
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
    }

    #[test]
    fn cancellation_stops_iteration() {
        let signal = CancellationSignal::new();
        let options = DecoderOptions::builder()
            .with_cancellation(signal.clone())
            .build();
        let mut decoder = Decoder::new(THREE.as_bytes(), Format::NTriples, options).unwrap();
        assert!(decoder.next().unwrap().is_ok());
        signal.cancel();
        assert_eq!(
            decoder.next().unwrap().unwrap_err().kind(),
            ErrorKind::ContextCanceled
        );
        assert!(decoder.next().is_none());
    }

    #[test]
    fn sink_errors_stop_parse_with() {
        let mut decoder = Decoder::new(THREE.as_bytes(), Format::NTriples, DecoderOptions::default()).unwrap();
        let mut seen = 0;
        let err = decoder
            .parse_with(|_| {
                seen += 1;
                if seen == 2 {
                    return Err(RdfError::parse("stop"));
                }
                Ok(())
            })
            .unwrap_err();
        assert_eq!(err.to_string(), "stop");
        assert_eq!(seen, 2);
    }

    #[test]
    fn errors_follow_earlier_statements() {
        let input = "<http://a/s> <http://a/p> <http://a/o> .\n<http://a/s> <http://a/p> .\n";
        let results: Vec<_> = Decoder::new(input.as_bytes(), Format::NTriples, DecoderOptions::default())
            .unwrap()
            .collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        let err = results[1].as_ref().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParseError);
        assert_eq!(err.position().map(|p| p.line), Some(2));
    }

    #[test]
    fn decode_all_every_format() {
        let expected = Statement::triple(
            NamedNode::new("http://a/s"),
            NamedNode::new("http://a/p"),
            Literal::new("v"),
        );
        let inputs: [(Format, &str); 6] = [
            (Format::NTriples, "<http://a/s> <http://a/p> \"v\" .\n"),
            (Format::NQuads, "<http://a/s> <http://a/p> \"v\" .\n"),
            (Format::Turtle, "@prefix a: <http://a/> . a:s a:p \"v\" ."),
            (Format::TriG, "{ <http://a/s> <http://a/p> \"v\" . }"),
            (
                Format::RdfXml,
                "<rdf:RDF xmlns:rdf=\"http://www.w3.org/1999/02/22-rdf-syntax-ns#\" xmlns:a=\"http://a/\">\
                 <rdf:Description rdf:about=\"http://a/s\"><a:p>v</a:p></rdf:Description></rdf:RDF>",
            ),
            (Format::JsonLd, "{\"@id\": \"http://a/s\", \"http://a/p\": \"v\"}"),
        ];
        for (format, input) in inputs {
            let statements = decode_all(input.as_bytes(), format, DecoderOptions::default()).unwrap();
            assert_eq!(statements, vec![expected.clone()], "{format}");
        }
    }
}
