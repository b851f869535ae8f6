//! Turtle and TriG: tokenizer, grammar parser and writer.

pub mod lexer;
pub mod parser;
pub mod serializer;

pub use lexer::{Token, TokenKind, Tokenizer, tokenize};
pub use parser::TurtleParser;
pub use serializer::{TurtleWriter, abbreviate};
