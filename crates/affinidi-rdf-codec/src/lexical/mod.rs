//! Lexical building blocks shared by every syntax: string escapes, IRI
//! resolution and validation, name validators and the line-bounded reader.

pub mod escape;
pub mod iri;
pub mod names;
pub mod reader;

pub use escape::{escape_string, unescape_iri, unescape_string, unescape_string_with};
pub use iri::{is_absolute_iri, resolve_checked, resolve_iri, validate_iri};
pub use names::{
    is_valid_blank_label, is_valid_lang_tag, is_valid_local_name, is_valid_prefix_name,
};
pub use reader::{LineReader, read_line_with_limit};
