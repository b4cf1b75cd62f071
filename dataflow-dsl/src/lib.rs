//! Stream/task pipeline DSL - Lexer, Parsers, ASTs & Visitors
//!
//! Architecture:
//! ```text
//! DSL text
//!     ↓
//! Lexer (Token stream, ends in Eof)
//!     ↓
//! Tokens cursor (lookahead, adjacency, checkpoints)
//!     ↓
//! StreamParser / TaskParser (recursive descent)
//!     ↓
//! StreamNode / TaskNode  ──→  visitors (fan-out, collectors, task validator)
//!     ↓
//! Pretty printer (canonical DSL, for round-trip testing)
//! ```
//!
//! A failed parse yields a [`ParseError`] carrying a catalogued
//! [`DslMessage`], the byte offset of the problem and the offset of the last
//! complete element. The completion engine builds on both.

pub mod cursor;
pub mod error;
pub mod lexer;
pub mod message;
pub mod pretty_printer;
pub mod stream;
pub mod task;
pub mod visitor;

// Re-export key types for convenience
pub use error::{LabelClash, ParseError};
pub use lexer::{tokenize, Lexer, Span, Token, TokenKind};
pub use message::{DslMessage, MessageKind};
pub use stream::{parse_named_stream, parse_stream, StreamNode, StreamParser};
pub use task::{parse_named_task, parse_task, TaskNode, TaskParser};
pub use visitor::{walk_stream, walk_task, MaxFanOutVisitor, StreamVisitor, TaskVisitor};
