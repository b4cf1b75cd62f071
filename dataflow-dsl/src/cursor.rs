//! Token cursor shared by the stream and task parsers.

use crate::error::ParseError;
use crate::lexer::{Span, Token, TokenKind};
use crate::message::DslMessage;

/// Index-based cursor over a lexed token vector.
///
/// The vector always ends with an `Eof` token, so `peek` never runs off the
/// end. `checkpoint` records the last position where a complete element was
/// parsed; errors built through [`Tokens::error`] carry the source offset of
/// that position for recovery.
#[derive(Debug, Clone)]
pub struct Tokens {
    expression: String,
    tokens: Vec<Token>,
    pos: usize,
    last_good: usize,
}

impl Tokens {
    pub fn new(expression: &str, mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| t.kind != TokenKind::Eof).unwrap_or(true) {
            let end = expression.len();
            tokens.push(Token {
                kind: TokenKind::Eof,
                span: Span {
                    start: end,
                    end,
                    ..Span::default()
                },
            });
        }
        Self {
            expression: expression.to_string(),
            tokens,
            pos: 0,
            last_good: 0,
        }
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    // ========================================================================
    // Lookahead
    // ========================================================================

    pub fn peek(&self) -> &Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.pos.min(last)]
    }

    /// Token `distance` positions away (negative looks back), if any.
    pub fn peek_at(&self, distance: isize) -> Option<&Token> {
        let index = self.pos as isize + distance;
        if index < 0 {
            return None;
        }
        self.tokens.get(index as usize)
    }

    pub fn peek_is(&self, kind: &TokenKind) -> bool {
        self.peek().is(kind)
    }

    pub fn look_ahead(&self, distance: isize, kind: &TokenKind) -> bool {
        self.peek_at(distance).map(|t| t.is(kind)).unwrap_or(false)
    }

    pub fn has_next(&self) -> bool {
        self.peek().kind != TokenKind::Eof
    }

    /// True when the current token starts exactly where the previous one ended.
    pub fn is_next_adjacent(&self) -> bool {
        match (self.peek_at(-1), self.peek_at(0)) {
            (Some(prev), Some(next)) => prev.span.end == next.span.start,
            _ => false,
        }
    }

    // ========================================================================
    // Consumption
    // ========================================================================

    pub fn next(&mut self) -> Token {
        let token = self.peek().clone();
        if self.has_next() {
            self.pos += 1;
        }
        token
    }

    /// Consume the current token if it has the same kind.
    pub fn eat_if(&mut self, kind: &TokenKind) -> Option<Token> {
        if self.peek_is(kind) {
            Some(self.next())
        } else {
            None
        }
    }

    /// Consume a token of `kind` or fail with `NOT_EXPECTED_TOKEN` (`OOD` at end).
    pub fn eat(&mut self, kind: &TokenKind) -> Result<Token, ParseError> {
        if self.peek_is(kind) {
            return Ok(self.next());
        }
        Err(self.unexpected(kind.symbol()))
    }

    /// Error for a missing `expected` at the current token.
    pub fn unexpected(&self, expected: &str) -> ParseError {
        let found = self.peek();
        if found.kind == TokenKind::Eof {
            self.error(found.span.start, DslMessage::OOD, vec![])
        } else {
            self.error(
                found.span.start,
                DslMessage::NOT_EXPECTED_TOKEN,
                vec![expected.to_string(), found.text().to_string()],
            )
        }
    }

    // ========================================================================
    // Positions
    // ========================================================================

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn rewind_to(&mut self, position: usize) {
        self.pos = position.min(self.tokens.len().saturating_sub(1));
    }

    /// Mark the current position as the last known good one.
    pub fn checkpoint(&mut self) {
        self.last_good = self.pos;
    }

    /// Source offset where the checkpointed prefix ends.
    pub fn checkpoint_offset(&self) -> usize {
        if self.last_good == 0 {
            return 0;
        }
        self.tokens
            .get(self.last_good - 1)
            .map(|t| t.span.end)
            .unwrap_or(0)
    }

    /// Source text after the current token's start, for `MORE_INPUT` style inserts.
    pub fn remaining_text(&self) -> &str {
        let start = self.peek().span.start.min(self.expression.len());
        self.expression.get(start..).unwrap_or("")
    }

    pub fn error(&self, offset: usize, message: DslMessage, inserts: Vec<String>) -> ParseError {
        ParseError::new(&self.expression, offset, message, inserts).with_checkpoint(self.checkpoint_offset())
    }
}
