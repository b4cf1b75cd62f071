//! Lexer implementation

use super::token::*;
use crate::error::ParseError;
use crate::message::DslMessage;
use std::iter::Peekable;
use std::str::CharIndices;

// ============================================================================
// LEXER IMPLEMENTATION
// ============================================================================

/// Lexer for stream and task definitions.
///
/// Tokens are produced lazily through [`Iterator`]; the last item is always
/// an [`TokenKind::Eof`] token unless a lexical error stops the scan first.
/// To restart, build a new lexer over the same source.
pub struct Lexer<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
    line: usize,
    column: usize,
    pos: usize,
    /// Set after `=`; the next token is read as an argument value.
    arg_value_mode: bool,
    finished: bool,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            line: 1,
            column: 1,
            pos: 0,
            arg_value_mode: false,
            finished: false,
        }
    }

    /// Tokenize the entire source. Fails on the first lexical error.
    pub fn tokenize(&mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        for token in self.by_ref() {
            tokens.push(token?);
        }
        Ok(tokens)
    }

    /// Get the next token from the source.
    fn next_token(&mut self) -> Result<Token, ParseError> {
        if self.arg_value_mode {
            self.arg_value_mode = false;
            if let Some(c) = self.peek_char() {
                if !is_arg_value_terminator(c) {
                    let (start_pos, start_line, start_col) = (self.pos, self.line, self.column);
                    let kind = self.scan_arg_value()?;
                    return Ok(self.token(kind, start_pos, start_line, start_col));
                }
            }
        }

        self.skip_whitespace();

        let start_pos = self.pos;
        let start_line = self.line;
        let start_col = self.column;

        let kind = match self.peek_char() {
            None => TokenKind::Eof,
            Some(c) => match c {
                '|' => {
                    self.advance();
                    if self.peek_char() == Some('|') {
                        self.advance();
                        TokenKind::DoublePipe
                    } else {
                        TokenKind::Pipe
                    }
                }
                '&' => {
                    self.advance();
                    if self.peek_char() == Some('&') {
                        self.advance();
                        TokenKind::AndAnd
                    } else {
                        return Err(self.error(start_pos, DslMessage::TASK_DOUBLE_AND_REQUIRED, vec![]));
                    }
                }
                '-' => {
                    self.advance();
                    match self.peek_char() {
                        Some('-') => {
                            self.advance();
                            TokenKind::DoubleMinus
                        }
                        Some('>') => {
                            self.advance();
                            TokenKind::Arrow
                        }
                        _ => {
                            return Err(self.error(self.pos, DslMessage::MISSING_CHARACTER, vec!["-".to_string()]));
                        }
                    }
                }
                '=' => {
                    self.advance();
                    self.arg_value_mode = true;
                    TokenKind::Equals
                }
                ':' => self.single(TokenKind::Colon),
                '.' => self.single(TokenKind::Dot),
                '>' => self.single(TokenKind::Gt),
                '<' => self.single(TokenKind::Lt),
                '(' => self.single(TokenKind::LParen),
                ')' => self.single(TokenKind::RParen),
                '*' => self.single(TokenKind::Star),
                '/' => self.single(TokenKind::Slash),
                '#' => self.single(TokenKind::Hash),
                ';' => self.single(TokenKind::Semicolon),

                '\'' | '"' => TokenKind::Literal(self.scan_quoted(c)?),

                '\\' => {
                    return Err(self.error(start_pos, DslMessage::UNEXPECTED_ESCAPE_CHAR, vec![]));
                }

                c if is_identifier_start(c) => self.scan_identifier(),

                c => {
                    return Err(self.error(start_pos, DslMessage::UNEXPECTED_DATA, vec![c.to_string()]));
                }
            },
        };

        Ok(self.token(kind, start_pos, start_line, start_col))
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    fn token(&self, kind: TokenKind, start: usize, line: usize, column: usize) -> Token {
        Token {
            kind,
            span: Span {
                start,
                end: self.pos,
                line,
                column,
            },
        }
    }

    /// Scan an identifier or a number. A `-` directly before `>` is left for the arrow.
    fn scan_identifier(&mut self) -> TokenKind {
        let start = self.pos;

        while let Some(c) = self.peek_char() {
            if c.is_alphanumeric() || c == '_' || c == '$' {
                self.advance();
            } else if c == '-' && self.peek_next_char() != Some('>') {
                self.advance();
            } else {
                break;
            }
        }

        let text = &self.source[start..self.pos];
        if text.chars().all(|c| c.is_ascii_digit()) {
            TokenKind::Number(text.to_string())
        } else {
            TokenKind::Identifier(text.to_string())
        }
    }

    /// Scan a quoted string. A doubled quote inside is an escaped quote.
    fn scan_quoted(&mut self, quote: char) -> Result<String, ParseError> {
        let start = self.pos;
        self.advance(); // consume opening quote
        let mut value = String::new();

        loop {
            match self.peek_char() {
                None => {
                    let message = if quote == '"' {
                        DslMessage::NON_TERMINATING_DOUBLE_QUOTED_STRING
                    } else {
                        DslMessage::NON_TERMINATING_QUOTED_STRING
                    };
                    return Err(self.error(start, message, vec![]));
                }
                Some(c) if c == quote => {
                    self.advance();
                    if self.peek_char() == Some(quote) {
                        self.advance();
                        value.push(quote);
                    } else {
                        break;
                    }
                }
                Some(c) => {
                    self.advance();
                    value.push(c);
                }
            }
        }

        Ok(value)
    }

    /// Scan an argument value: everything up to an unquoted terminator.
    ///
    /// A value that is exactly one quoted string becomes a [`TokenKind::Literal`];
    /// anything else is kept verbatim as an identifier.
    fn scan_arg_value(&mut self) -> Result<TokenKind, ParseError> {
        let start = self.pos;
        let mut quoted_parts = 0;
        let mut last_literal = String::new();
        let mut bare_chars = false;

        while let Some(c) = self.peek_char() {
            if is_arg_value_terminator(c) {
                break;
            }
            if c == '\'' || c == '"' {
                last_literal = self.scan_quoted(c)?;
                quoted_parts += 1;
            } else {
                self.advance();
                bare_chars = true;
            }
        }

        if quoted_parts == 1 && !bare_chars {
            Ok(TokenKind::Literal(last_literal))
        } else {
            Ok(TokenKind::Identifier(self.source[start..self.pos].to_string()))
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek_char() {
            if c == '\n' {
                self.advance();
                self.line += 1;
                self.column = 1;
            } else if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn peek_next_char(&self) -> Option<char> {
        let mut iter = self.source[self.pos..].char_indices();
        iter.next();
        iter.next().map(|(_, c)| c)
    }

    fn advance(&mut self) -> Option<char> {
        if let Some((i, c)) = self.chars.next() {
            self.pos = i + c.len_utf8();
            self.column += 1;
            Some(c)
        } else {
            None
        }
    }

    fn error(&self, offset: usize, message: DslMessage, inserts: Vec<String>) -> ParseError {
        ParseError::new(self.source, offset, message, inserts)
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let result = self.next_token();
        match &result {
            Ok(token) if token.kind == TokenKind::Eof => self.finished = true,
            Err(_) => self.finished = true,
            Ok(_) => {}
        }
        Some(result)
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn is_arg_value_terminator(c: char) -> bool {
    c.is_whitespace() || c == '|' || c == ';' || c == '>'
}

/// Tokenize `source` in one call.
pub fn tokenize(source: &str) -> Result<Vec<Token>, ParseError> {
    Lexer::new(source).tokenize()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Result<Vec<TokenKind>, ParseError> {
        Ok(tokenize(source)?.into_iter().map(|t| t.kind).collect())
    }

    fn ident(s: &str) -> TokenKind {
        TokenKind::Identifier(s.to_string())
    }

    #[test]
    fn test_lexer_operators() -> Result<(), ParseError> {
        let tokens = kinds("| || && : . > < -- -> ( ) * / # ;")?;
        assert_eq!(
            tokens,
            vec![
                TokenKind::Pipe,
                TokenKind::DoublePipe,
                TokenKind::AndAnd,
                TokenKind::Colon,
                TokenKind::Dot,
                TokenKind::Gt,
                TokenKind::Lt,
                TokenKind::DoubleMinus,
                TokenKind::Arrow,
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::Star,
                TokenKind::Slash,
                TokenKind::Hash,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
        Ok(())
    }

    #[test]
    fn test_lexer_stream_definition() -> Result<(), ParseError> {
        let tokens = kinds("time | log")?;
        assert_eq!(tokens, vec![ident("time"), TokenKind::Pipe, ident("log"), TokenKind::Eof]);
        Ok(())
    }

    #[test]
    fn test_identifiers_with_hyphens_and_dollar() -> Result<(), ParseError> {
        let tokens = kinds("jdbc-source $END")?;
        assert_eq!(tokens, vec![ident("jdbc-source"), ident("$END"), TokenKind::Eof]);
        Ok(())
    }

    #[test]
    fn test_number_followed_by_arrow() -> Result<(), ParseError> {
        let tokens = kinds("0->b")?;
        assert_eq!(
            tokens,
            vec![TokenKind::Number("0".to_string()), TokenKind::Arrow, ident("b"), TokenKind::Eof]
        );
        Ok(())
    }

    #[test]
    fn test_quoted_literals_with_doubled_quotes() -> Result<(), ParseError> {
        let tokens = kinds(r#"'it''s' "say ""hi""""#)?;
        assert_eq!(
            tokens,
            vec![
                TokenKind::Literal("it's".to_string()),
                TokenKind::Literal("say \"hi\"".to_string()),
                TokenKind::Eof
            ]
        );
        Ok(())
    }

    #[test]
    fn test_argument_value_mode() -> Result<(), ParseError> {
        let tokens = kinds("http --url=http://x:80/y | log")?;
        assert_eq!(
            tokens,
            vec![
                ident("http"),
                TokenKind::DoubleMinus,
                ident("url"),
                TokenKind::Equals,
                ident("http://x:80/y"),
                TokenKind::Pipe,
                ident("log"),
                TokenKind::Eof
            ]
        );
        Ok(())
    }

    #[test]
    fn test_quoted_argument_value_is_literal() -> Result<(), ParseError> {
        let tokens = kinds("filter --expression='a b'")?;
        assert_eq!(tokens[4], TokenKind::Literal("a b".to_string()));
        let mixed = kinds("filter --expression=payload+'x y'")?;
        assert_eq!(mixed[4], ident("payload+'x y'"));
        Ok(())
    }

    #[test]
    fn test_spans_track_offsets_and_lines() -> Result<(), ParseError> {
        let tokens = tokenize("a &&\n  b")?;
        assert_eq!((tokens[0].span.start, tokens[0].span.end), (0, 1));
        assert_eq!((tokens[1].span.start, tokens[1].span.end), (2, 4));
        assert_eq!(tokens[2].span.line, 2);
        assert_eq!(tokens[2].span.column, 3);
        assert_eq!(tokens[2].span.start, 7);
        assert_eq!(tokens[3].span.start, 8);
        Ok(())
    }

    #[test]
    fn test_unterminated_quote_reports_opening_offset() {
        let err = tokenize("time --format='abc").unwrap_err();
        assert_eq!(err.message, DslMessage::NON_TERMINATING_QUOTED_STRING);
        assert_eq!(err.offset, 14);
        let err = tokenize("a \"xyz").unwrap_err();
        assert_eq!(err.message, DslMessage::NON_TERMINATING_DOUBLE_QUOTED_STRING);
        assert_eq!(err.offset, 2);
    }

    #[test]
    fn test_lexical_errors() {
        assert_eq!(tokenize("a & b").unwrap_err().message, DslMessage::TASK_DOUBLE_AND_REQUIRED);
        assert_eq!(tokenize("http -").unwrap_err().message, DslMessage::MISSING_CHARACTER);
        assert_eq!(tokenize("a \\ b").unwrap_err().message, DslMessage::UNEXPECTED_ESCAPE_CHAR);
        let err = tokenize("a % b").unwrap_err();
        assert_eq!(err.message, DslMessage::UNEXPECTED_DATA);
        assert_eq!(err.inserts, vec!["%".to_string()]);
        assert!(err.is_lexical());
    }

    #[test]
    fn test_lazy_iteration_stops_after_eof() {
        let mut lexer = Lexer::new("a");
        assert!(matches!(lexer.next(), Some(Ok(_))));
        assert!(matches!(lexer.next(), Some(Ok(Token { kind: TokenKind::Eof, .. }))));
        assert!(lexer.next().is_none());
    }

    #[test]
    fn test_lazy_iteration_stops_after_error() {
        let mut lexer = Lexer::new("a % b");
        assert!(matches!(lexer.next(), Some(Ok(_))));
        assert!(matches!(lexer.next(), Some(Err(_))));
        assert!(lexer.next().is_none());
    }
}
