//! Task definitions: sequences, splits and transitions between batch apps.

pub mod ast;
pub mod graph;
pub mod parser;
pub mod validator;

pub use ast::*;
pub use graph::{Graph, GraphGenerator, Link, Node};
pub use parser::{parse_named_task, parse_task, TaskParser, MAX_NESTING_DEPTH};
pub use validator::TaskValidator;
