//! Streaming RDF decoders and encoders.
//!
//! Supported syntaxes are Turtle, TriG, N-Triples, N-Quads, RDF/XML and
//! JSON-LD, with RDF-star quoted triples in the Turtle and N-Triples
//! families. Decoders read from any [`std::io::Read`] and hand out
//! [`Statement`]s one at a time under configurable byte, depth and count
//! caps; encoders write statements to any [`std::io::Write`].
//!
//! ```
//! use affinidi_rdf_codec::{DecoderOptions, EncoderOptions, Format, decode_all, encode_all};
//!
//! let turtle = "@prefix ex: <http://example.org/> .\nex:s ex:p ( ex:a ex:b ) .\n";
//! let statements = decode_all(turtle.as_bytes(), Format::Auto, DecoderOptions::default()).unwrap();
//! assert_eq!(statements.len(), 5);
//!
//! let nquads = encode_all(&statements, Format::NQuads, &EncoderOptions::default()).unwrap();
//! assert_eq!(String::from_utf8(nquads).unwrap().lines().count(), 5);
//! ```

pub mod blank;
pub mod decoder;
pub mod detect;
pub mod encoder;
pub mod error;
pub mod format;
pub mod jsonld;
pub mod lexical;
pub mod limits;
pub mod model;
pub mod ntriples;
pub mod options;
pub mod rdfxml;
pub mod scanner;
pub mod turtle;

pub use blank::BlankNodeIssuer;
pub use decoder::{Decoder, StatementParser, decode_all};
pub use detect::{classify, detect_format};
pub use encoder::{Encoder, encode_all};
pub use error::{ErrorKind, LocatedError, Position, RdfError, Result};
pub use format::Format;
pub use jsonld::{DocumentLoader, StaticDocumentLoader};
pub use model::{
    BlankNode, GraphLabel, Literal, NamedNode, Quad, Statement, Term, TermKind, Triple, rdf, xsd,
};
pub use options::{
    CancellationSignal, DecoderOptions, DecoderOptionsBuilder, EncoderOptions, EncoderOptionsBuilder,
};
