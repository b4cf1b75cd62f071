//! Lexer token types

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// LEXER TYPES
// ============================================================================

/// Token kinds shared by the stream and task grammars.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
    // Operators
    Pipe,
    DoublePipe,
    AndAnd,
    Colon,
    Dot,
    Gt,
    Lt,
    DoubleMinus,
    Arrow,
    Equals,
    LParen,
    RParen,
    Star,
    Slash,
    Hash,
    Semicolon,

    // Literals
    Identifier(String),
    Number(String),
    /// Quoted text with the quotes removed and doubled quotes collapsed.
    Literal(String),

    // Special
    Eof,
}

impl TokenKind {
    /// Source-like rendering used in error inserts.
    pub fn symbol(&self) -> &str {
        match self {
            TokenKind::Pipe => "|",
            TokenKind::DoublePipe => "||",
            TokenKind::AndAnd => "&&",
            TokenKind::Colon => ":",
            TokenKind::Dot => ".",
            TokenKind::Gt => ">",
            TokenKind::Lt => "<",
            TokenKind::DoubleMinus => "--",
            TokenKind::Arrow => "->",
            TokenKind::Equals => "=",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Hash => "#",
            TokenKind::Semicolon => ";",
            TokenKind::Identifier(s) | TokenKind::Number(s) | TokenKind::Literal(s) => s,
            TokenKind::Eof => "",
        }
    }

    /// Identifier-like tokens: identifiers and bare numbers.
    pub fn is_name(&self) -> bool {
        matches!(self, TokenKind::Identifier(_) | TokenKind::Number(_))
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Source location span. Offsets are byte offsets into the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl Default for Span {
    fn default() -> Self {
        Self {
            start: 0,
            end: 0,
            line: 1,
            column: 1,
        }
    }
}

/// A token with its kind and source location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn is(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.kind) == std::mem::discriminant(kind)
    }

    pub fn is_identifier(&self, text: &str) -> bool {
        matches!(&self.kind, TokenKind::Identifier(s) if s == text)
    }

    /// Payload of identifier, number and literal tokens.
    pub fn text(&self) -> &str {
        self.kind.symbol()
    }
}
