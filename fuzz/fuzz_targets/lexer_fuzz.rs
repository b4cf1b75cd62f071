//! Fuzz test for the DSL lexer
//!
//! Run with: cargo +nightly fuzz run lexer_fuzz -- -max_total_time=60

#![no_main]

use dataflow_dsl::{Lexer, TokenKind};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        match Lexer::new(input).tokenize() {
            Ok(tokens) => {
                // Exactly one Eof, and it comes last
                let eofs = tokens.iter().filter(|t| t.kind == TokenKind::Eof).count();
                assert_eq!(eofs, 1, "Token stream should hold one Eof");
                assert!(tokens.last().map(|t| t.kind == TokenKind::Eof).unwrap_or(false));

                for token in &tokens {
                    assert!(token.span.start <= token.span.end, "Span start should be <= end");
                    assert!(token.span.end <= input.len(), "Span should stay inside the source");
                    assert!(token.span.line >= 1, "Line numbers should be >= 1");
                    assert!(token.span.column >= 1, "Column numbers should be >= 1");
                }
            }
            Err(err) => {
                assert!(err.offset <= input.len(), "Error offset should stay inside the source");
                assert!(err.is_lexical(), "Lexer errors should carry lexical codes");
            }
        }
    }
});
