//! Stream definitions: `source | processor | sink` pipelines.

pub mod ast;
pub mod parser;

pub use ast::*;
pub use parser::{is_valid_name, parse_named_stream, parse_stream, StreamParser};
