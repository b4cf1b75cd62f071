//! Parse failure type shared by the lexer and both parsers.

use crate::message::{DslMessage, MessageKind};
use serde::{Deserialize, Serialize};

/// Two apps that resolved to the same label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelClash {
    pub label: String,
    pub first_app: String,
    pub first_offset: usize,
    pub second_app: String,
    pub second_offset: usize,
}

/// A located DSL failure.
///
/// Parsing is all-or-nothing, so one error is raised per attempt. The only
/// aggregate is `duplicates`, filled by the duplicate-label post-pass which
/// runs on a complete AST.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseError {
    /// The full source being parsed.
    pub expression: String,
    /// Byte offset into `expression` where the problem was found.
    pub offset: usize,
    pub message: DslMessage,
    pub inserts: Vec<String>,
    /// Source offset up to which the input was consumed without error.
    pub checkpoint: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub duplicates: Vec<LabelClash>,
}

impl ParseError {
    pub fn new(expression: &str, offset: usize, message: DslMessage, inserts: Vec<String>) -> Self {
        Self {
            expression: expression.to_string(),
            offset,
            message,
            inserts,
            checkpoint: None,
            duplicates: Vec::new(),
        }
    }

    pub fn with_checkpoint(mut self, checkpoint: usize) -> Self {
        self.checkpoint = Some(checkpoint);
        self
    }

    pub fn code(&self) -> u16 {
        self.message.code()
    }

    pub fn is_lexical(&self) -> bool {
        self.message.kind() == MessageKind::Lexical
    }

    /// `"{code}E:(pos {offset}): {text}"`
    pub fn formatted_message(&self) -> String {
        self.message.format_message(self.offset, &self.inserts)
    }

    /// 1-based line of `offset`.
    pub fn line(&self) -> usize {
        self.prefix().matches('\n').count() + 1
    }

    /// 1-based column of `offset` within its line.
    pub fn column(&self) -> usize {
        let prefix = self.prefix();
        match prefix.rfind('\n') {
            Some(nl) => prefix[nl + 1..].chars().count() + 1,
            None => prefix.chars().count() + 1,
        }
    }

    /// The offending source line followed by a caret under `offset`.
    pub fn excerpt(&self) -> String {
        let line_start = self.prefix().rfind('\n').map(|nl| nl + 1).unwrap_or(0);
        let line_end = self.expression[line_start..]
            .find('\n')
            .map(|nl| line_start + nl)
            .unwrap_or(self.expression.len());
        let line = &self.expression[line_start..line_end];
        format!("{}\n{}^", line, " ".repeat(self.column() - 1))
    }

    fn prefix(&self) -> &str {
        let end = self.offset.min(self.expression.len());
        match self.expression.get(..end) {
            Some(prefix) => prefix,
            None => &self.expression,
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}\n{}", self.formatted_message(), self.excerpt())
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_excerpt_and_caret() {
        let err = ParseError::new("time |", 6, DslMessage::EXPECTED_APPNAME, vec![String::new()]);
        let rendered = err.to_string();
        assert_eq!(rendered, "118E:(pos 6): Expected app name but found ''\ntime |\n      ^");
    }

    #[test]
    fn test_line_and_column_on_second_line() {
        let err = ParseError::new("a && b\nfoo: c d", 14, DslMessage::TASK_MORE_INPUT, vec!["d".to_string()]);
        assert_eq!(err.line(), 2);
        assert_eq!(err.column(), 8);
        assert_eq!(err.excerpt(), "foo: c d\n       ^");
    }

    #[test]
    fn test_offset_past_end_is_clamped() {
        let err = ParseError::new("ab", 10, DslMessage::OOD, vec![]);
        assert_eq!(err.column(), 3);
    }
}
