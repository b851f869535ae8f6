//! RDF/XML: event-driven parser over quick-xml and a streaming writer.

pub mod parser;
pub mod serializer;

pub use parser::RdfXmlParser;
pub use serializer::RdfXmlWriter;
