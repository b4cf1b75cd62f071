//! Lexer module for the stream/task DSL

pub mod scanner;
pub mod token;

pub use scanner::*;
pub use token::*;
