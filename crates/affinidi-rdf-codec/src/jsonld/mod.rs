//! JSON-LD decoding and encoding.
//!
//! Decoding converts node objects straight to statements using the active
//! context; remote contexts are resolved only through a caller-supplied
//! [`DocumentLoader`].

pub mod context;
pub mod loader;
pub mod serializer;
pub mod to_rdf;

pub use context::{Context, ContainerType, TermDefinition};
pub use loader::{DocumentLoader, StaticDocumentLoader};
pub use serializer::JsonLdWriter;
pub use to_rdf::{JsonLdParser, canonical_double};
