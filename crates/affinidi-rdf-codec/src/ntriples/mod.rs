pub mod parser;
pub mod serializer;

pub use parser::{NTriplesParser, parse_line};
pub use serializer::{LineWriter, serialize_statement};
