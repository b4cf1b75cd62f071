//! Task definition parser
//!
//! ```text
//! task        := sequence ((NEWLINE | ';') sequence)*
//! sequence    := element ('&&' element)*
//! element     := '(' sequence ')' | (label ':')? (split | taskApp)
//! split       := '<' sequence ('||' sequence)* '>'
//! taskApp     := name argument* transition*
//! transition  := condition '->' (':' label | (label ':')? name argument*)
//! condition   := NUMBER | '*' | QUOTED
//! ```

use super::ast::*;
use super::validator::TaskValidator;
use crate::cursor::Tokens;
use crate::error::ParseError;
use crate::lexer::{tokenize, Token, TokenKind};
use crate::message::DslMessage;
use crate::stream::parser::{eat_arguments, is_valid_name};
use crate::stream::LabelNode;

// ============================================================================
// PARSER
// ============================================================================

/// Deepest allowed nesting of splits and parenthesized groups.
pub const MAX_NESTING_DEPTH: usize = 256;

/// Parser for a task definition.
pub struct TaskParser {
    tokens: Tokens,
    name: Option<String>,
    app_mode: bool,
    validate: bool,
    depth: usize,
}

impl TaskParser {
    /// Lex `dsl` and prepare to parse it.
    pub fn new(dsl: &str) -> Result<Self, ParseError> {
        let tokens = tokenize(dsl)?;
        Ok(Self {
            tokens: Tokens::new(dsl, tokens),
            name: None,
            app_mode: true,
            validate: true,
            depth: 0,
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// When false, `--name=value` arguments on task apps are rejected.
    pub fn app_mode(mut self, app_mode: bool) -> Self {
        self.app_mode = app_mode;
        self
    }

    /// When false, the semantic checks after parsing are skipped.
    pub fn validate(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    /// Parse the whole definition. Fails without a partial result.
    pub fn parse(mut self) -> Result<TaskNode, ParseError> {
        tracing::trace!(dsl = self.tokens.expression(), "parsing task definition");
        if let Some(name) = &self.name {
            if !is_valid_name(name) {
                return Err(self.tokens.error(0, DslMessage::ILLEGAL_TASK_NAME, vec![name.clone()]));
            }
        }

        let mut sequences = vec![self.eat_sequence()?];
        self.tokens.checkpoint();
        while self.tokens.has_next() {
            if self.tokens.eat_if(&TokenKind::Semicolon).is_some() {
                if !self.tokens.has_next() {
                    break;
                }
            } else if !self.starts_new_line() {
                let offset = self.tokens.peek().span.start;
                let rest = self.tokens.remaining_text().to_string();
                return Err(self.tokens.error(offset, DslMessage::TASK_MORE_INPUT, vec![rest]));
            }
            sequences.push(self.eat_sequence()?);
            self.tokens.checkpoint();
        }

        let task = TaskNode {
            name: self.name.take(),
            dsl: self.tokens.expression().to_string(),
            sequences,
        };
        if self.validate {
            TaskValidator::validate(&task)?;
        }
        Ok(task)
    }

    fn starts_new_line(&self) -> bool {
        match (self.tokens.peek_at(-1), self.tokens.peek_at(0)) {
            (Some(prev), Some(next)) => next.span.line > prev.span.line,
            _ => false,
        }
    }

    // ========================================================================
    // Flows
    // ========================================================================

    /// Every split branch and parenthesized group opens a sequence, so the
    /// nesting limit is enforced here.
    fn eat_sequence(&mut self) -> Result<SequenceNode, ParseError> {
        if self.depth >= MAX_NESTING_DEPTH {
            let offset = self.tokens.peek().span.start;
            return Err(self.tokens.error(
                offset,
                DslMessage::TASK_NESTING_TOO_DEEP,
                vec![MAX_NESTING_DEPTH.to_string()],
            ));
        }
        self.depth += 1;
        let sequence = self.eat_sequence_elements();
        self.depth -= 1;
        sequence
    }

    fn eat_sequence_elements(&mut self) -> Result<SequenceNode, ParseError> {
        let start = self.tokens.peek().span.start;
        let mut elements = Vec::new();
        self.eat_element_into(&mut elements)?;
        while self.tokens.eat_if(&TokenKind::AndAnd).is_some() {
            self.eat_element_into(&mut elements)?;
        }
        Ok(SequenceNode {
            elements,
            start,
            end: self.previous_end(),
        })
    }

    /// Parenthesized groups are flattened into the enclosing sequence.
    fn eat_element_into(&mut self, elements: &mut Vec<FlowElement>) -> Result<(), ParseError> {
        if self.tokens.eat_if(&TokenKind::LParen).is_some() {
            let inner = self.eat_sequence()?;
            self.tokens.eat(&TokenKind::RParen)?;
            elements.extend(inner.elements);
            return Ok(());
        }

        let label = self.maybe_eat_label()?;
        if let Some(label) = &label {
            if let Some(second) = self.maybe_eat_label()? {
                return Err(self.tokens.error(second.start, DslMessage::NO_DOUBLE_LABELS, vec![]));
            }
            if self.tokens.peek_is(&TokenKind::LParen) {
                return Err(self
                    .tokens
                    .error(label.start, DslMessage::TASK_NO_LABELS_ON_PARENS, vec![]));
            }
        }

        let element = if self.tokens.peek_is(&TokenKind::Lt) {
            FlowElement::Split(self.eat_split(label)?)
        } else {
            FlowElement::App(self.eat_task_app(label, true)?)
        };
        elements.push(element);
        Ok(())
    }

    /// `name ':'` with the colon adjacent to the name.
    fn maybe_eat_label(&mut self) -> Result<Option<LabelNode>, ParseError> {
        let is_label = self.tokens.peek().kind.is_name()
            && self
                .tokens
                .peek_at(1)
                .map(|colon| colon.kind == TokenKind::Colon)
                .unwrap_or(false);
        if !is_label {
            return Ok(None);
        }
        let name = self.tokens.next();
        if !self.tokens.is_next_adjacent() {
            let offset = self.tokens.peek().span.start;
            return Err(self
                .tokens
                .error(offset, DslMessage::NO_WHITESPACE_BETWEEN_LABEL_NAME_AND_COLON, vec![]));
        }
        let colon = self.tokens.next();
        Ok(Some(LabelNode {
            label: name.text().to_string(),
            start: name.span.start,
            end: colon.span.end,
        }))
    }

    fn eat_split(&mut self, label: Option<LabelNode>) -> Result<SplitNode, ParseError> {
        let lt = self.tokens.eat(&TokenKind::Lt)?;
        let mut branches = vec![self.eat_sequence()?];
        loop {
            let token = self.tokens.peek().clone();
            match token.kind {
                TokenKind::DoublePipe => {
                    self.tokens.next();
                    branches.push(self.eat_sequence()?);
                }
                TokenKind::Gt => {
                    self.tokens.next();
                    break;
                }
                TokenKind::Pipe => {
                    return Err(self
                        .tokens
                        .error(token.span.start, DslMessage::TASK_DOUBLE_OR_REQUIRED, vec![]));
                }
                _ => {
                    return Err(self.tokens.error(
                        token.span.start,
                        DslMessage::TASK_UNTERMINATED_SPLIT,
                        vec![token.text().to_string()],
                    ));
                }
            }
        }
        Ok(SplitNode {
            start: label.as_ref().map(|l| l.start).unwrap_or(lt.span.start),
            label,
            branches,
            end: self.previous_end(),
        })
    }

    // ========================================================================
    // Apps and transitions
    // ========================================================================

    fn eat_task_app(&mut self, label: Option<LabelNode>, with_transitions: bool) -> Result<TaskAppNode, ParseError> {
        let name = self.expect_task_app_name()?;
        let mut app = TaskAppNode {
            start: label.as_ref().map(|l| l.start).unwrap_or(name.span.start),
            label,
            name: name.text().to_string(),
            arguments: Vec::new(),
            transitions: Vec::new(),
            end: name.span.end,
        };

        if self.tokens.peek_is(&TokenKind::DoubleMinus) {
            if !self.app_mode {
                let offset = self.tokens.peek().span.start;
                return Err(self.tokens.error(
                    offset,
                    DslMessage::TASK_ARGUMENTS_NOT_ALLOWED_UNLESS_IN_APP_MODE,
                    vec![],
                ));
            }
            app.arguments = eat_arguments(&mut self.tokens)?;
            app.end = self.previous_end();
        }

        if with_transitions {
            while let Some(transition) = self.maybe_eat_transition()? {
                app.end = transition.end;
                app.transitions.push(transition);
            }
        }
        Ok(app)
    }

    fn expect_task_app_name(&mut self) -> Result<Token, ParseError> {
        let token = self.tokens.peek();
        if token.kind.is_name() {
            return Ok(self.tokens.next());
        }
        let offset = token.span.start;
        if token.kind == TokenKind::Arrow {
            return Err(self
                .tokens
                .error(offset, DslMessage::TASK_ARROW_SHOULD_BE_PRECEDED_BY_CODE, vec![]));
        }
        let found = token.text().to_string();
        Err(self.tokens.error(offset, DslMessage::EXPECTED_APPNAME, vec![found]))
    }

    fn maybe_eat_transition(&mut self) -> Result<Option<TransitionNode>, ParseError> {
        let token = self.tokens.peek().clone();
        if token.kind == TokenKind::Arrow {
            return Err(self.tokens.error(
                token.span.start,
                DslMessage::TASK_ARROW_SHOULD_BE_PRECEDED_BY_CODE,
                vec![],
            ));
        }

        let followed_by_arrow = self.tokens.look_ahead(1, &TokenKind::Arrow);
        let condition = match &token.kind {
            TokenKind::Number(code) if followed_by_arrow => TransitionCondition::ExitCode(code.clone()),
            TokenKind::Star if followed_by_arrow => TransitionCondition::ExitCode("*".to_string()),
            TokenKind::Literal(status) if followed_by_arrow => TransitionCondition::ExitStatus(status.clone()),
            TokenKind::Identifier(text) if followed_by_arrow => {
                return Err(self.tokens.error(
                    token.span.start,
                    DslMessage::TASK_UNQUOTED_TRANSITION_CHECK_MUST_BE_NUMBER,
                    vec![text.clone()],
                ));
            }
            TokenKind::Literal(_) | TokenKind::Star => {
                let offset = self.tokens.peek_at(1).map(|t| t.span.start).unwrap_or(token.span.end);
                return Err(self
                    .tokens
                    .error(offset, DslMessage::TASK_MISSING_TRANSITION_ARROW, vec![]));
            }
            _ => return Ok(None),
        };
        self.tokens.next();
        self.tokens.next();

        let target = if self.tokens.eat_if(&TokenKind::Colon).is_some() {
            if !self.tokens.peek().kind.is_name() {
                return Err(self.tokens.unexpected("label"));
            }
            TransitionTarget::Label(self.tokens.next().text().to_string())
        } else {
            let label = self.maybe_eat_label()?;
            TransitionTarget::App(self.eat_task_app(label, false)?)
        };

        Ok(Some(TransitionNode {
            condition,
            target,
            start: token.span.start,
            end: self.previous_end(),
        }))
    }

    fn previous_end(&self) -> usize {
        self.tokens.peek_at(-1).map(|t| t.span.end).unwrap_or(0)
    }
}

// ============================================================================
// CONVENIENCE FUNCTIONS
// ============================================================================

/// Parse and validate a task definition.
pub fn parse_task(dsl: &str) -> Result<TaskNode, ParseError> {
    TaskParser::new(dsl)?.parse()
}

/// Parse and validate a task definition stored under `name`.
pub fn parse_named_task(name: &str, dsl: &str) -> Result<TaskNode, ParseError> {
    TaskParser::new(dsl)?.with_name(name).parse()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_error(dsl: &str) -> ParseError {
        match parse_task(dsl) {
            Ok(task) => panic!("expected {:?} to fail, parsed {:?}", dsl, task),
            Err(e) => e,
        }
    }

    fn app(element: &FlowElement) -> &TaskAppNode {
        match element {
            FlowElement::App(app) => app,
            FlowElement::Split(split) => panic!("expected app, found split {:?}", split),
        }
    }

    fn split(element: &FlowElement) -> &SplitNode {
        match element {
            FlowElement::Split(split) => split,
            FlowElement::App(app) => panic!("expected split, found app {:?}", app),
        }
    }

    #[test]
    fn test_single_app() -> Result<(), ParseError> {
        let task = parse_task("timestamp")?;
        assert!(task.is_single_app());
        assert_eq!(app(&task.sequences[0].elements[0]).name, "timestamp");
        Ok(())
    }

    #[test]
    fn test_sequence() -> Result<(), ParseError> {
        let task = parse_task("a && b && c")?;
        let names: Vec<_> = task.sequences[0].elements.iter().map(|e| app(e).name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert!(!task.is_single_app());
        Ok(())
    }

    #[test]
    fn test_split_requires_two_flows() -> Result<(), ParseError> {
        assert_eq!(parse_error("<a>").message, DslMessage::TASK_VALIDATION_SPLIT_WITH_ONE_FLOW);
        let task = parse_task("<a||b>")?;
        assert_eq!(split(&task.sequences[0].elements[0]).branches.len(), 2);
        Ok(())
    }

    #[test]
    fn test_unterminated_split() {
        let err = parse_error("<a||b");
        assert_eq!(err.message, DslMessage::TASK_UNTERMINATED_SPLIT);
        assert_eq!(err.offset, 5);
    }

    #[test]
    fn test_single_pipe_in_split() {
        assert_eq!(parse_error("<a | b>").message, DslMessage::TASK_DOUBLE_OR_REQUIRED);
    }

    #[test]
    fn test_split_then_sequence_precedence() -> Result<(), ParseError> {
        let task = parse_task("<a||b> && c")?;
        let elements = &task.sequences[0].elements;
        assert_eq!(elements.len(), 2);
        assert_eq!(split(&elements[0]).branches.len(), 2);
        assert_eq!(app(&elements[1]).name, "c");

        let inner = parse_task("<a && b || c>")?;
        let branches = &split(&inner.sequences[0].elements[0]).branches;
        assert_eq!(branches[0].elements.len(), 2);
        assert_eq!(branches[1].elements.len(), 1);
        Ok(())
    }

    #[test]
    fn test_nested_splits() -> Result<(), ParseError> {
        let task = parse_task("<a || <b || c> && d>")?;
        let outer = split(&task.sequences[0].elements[0]);
        let nested = split(&outer.branches[1].elements[0]);
        assert_eq!(nested.branches.len(), 2);
        Ok(())
    }

    #[test]
    fn test_transitions() -> Result<(), ParseError> {
        let task = parse_task("App1 0->App2 'abc'->App3 *->$END")?;
        let app1 = app(&task.sequences[0].elements[0]);
        assert_eq!(app1.transitions.len(), 3);
        assert_eq!(app1.transitions[0].condition, TransitionCondition::ExitCode("0".to_string()));
        assert_eq!(app1.transitions[1].condition, TransitionCondition::ExitStatus("abc".to_string()));
        assert!(app1.transitions[2].condition.is_wildcard());
        assert!(app1.transitions[2].is_end());
        assert_eq!(app1.transitions[0].target_app().map(|a| a.name.as_str()), Some("App2"));
        Ok(())
    }

    #[test]
    fn test_transition_to_label() -> Result<(), ParseError> {
        let task = parse_task("App1 'foo'->:something\nsomething: App2")?;
        let app1 = app(&task.sequences[0].elements[0]);
        assert_eq!(app1.transitions[0].target_label(), Some("something"));
        assert_eq!(task.sequences[1].label(), Some("something"));
        Ok(())
    }

    #[test]
    fn test_labels_arguments_and_labelled_target() -> Result<(), ParseError> {
        let task = parse_task("t1: timestamp --format=aabbcc 'FAILED'->t2: timestamp && t3: timestamp")?;
        let t1 = app(&task.sequences[0].elements[0]);
        assert_eq!(t1.label_name(), "t1");
        assert_eq!(t1.argument("format"), Some("aabbcc"));
        let target = t1.transitions[0].target_app().map(|a| a.label_name());
        assert_eq!(target, Some("t2"));
        Ok(())
    }

    #[test]
    fn test_fail_target() -> Result<(), ParseError> {
        let task = parse_task("foo 'oranges'->$FAIL")?;
        assert!(app(&task.sequences[0].elements[0]).transitions[0].is_fail());
        Ok(())
    }

    #[test]
    fn test_parens_are_flattened() -> Result<(), ParseError> {
        let task = parse_task("(a && b) && c")?;
        assert_eq!(task.sequences[0].elements.len(), 3);
        assert_eq!(parse_error("x: (a && b)").message, DslMessage::TASK_NO_LABELS_ON_PARENS);
        Ok(())
    }

    #[test]
    fn test_second_label_rejected() {
        let err = parse_error("a: b: c");
        assert_eq!(err.message, DslMessage::NO_DOUBLE_LABELS);
        assert_eq!(err.offset, 3);
        assert_eq!(parse_error("x: <a || b: c: d>").message, DslMessage::NO_DOUBLE_LABELS);
    }

    #[test]
    fn test_deep_parens_fail_cleanly() {
        let dsl = format!("{}a{}", "(".repeat(100_000), ")".repeat(100_000));
        let err = parse_error(&dsl);
        assert_eq!(err.message, DslMessage::TASK_NESTING_TOO_DEEP);
        assert_eq!(err.offset, MAX_NESTING_DEPTH);
        assert_eq!(err.inserts, vec![MAX_NESTING_DEPTH.to_string()]);
    }

    #[test]
    fn test_deep_splits_fail_cleanly() {
        let dsl = format!("{}a||b{}", "<".repeat(100_000), ">".repeat(100_000));
        assert_eq!(parse_error(&dsl).message, DslMessage::TASK_NESTING_TOO_DEEP);
    }

    #[test]
    fn test_nesting_up_to_the_limit_parses() -> Result<(), ParseError> {
        let depth = MAX_NESTING_DEPTH - 1;
        let task = parse_task(&format!("{}a{}", "(".repeat(depth), ")".repeat(depth)))?;
        assert_eq!(task.sequences[0].elements.len(), 1);
        Ok(())
    }

    #[test]
    fn test_multiple_sequences() -> Result<(), ParseError> {
        let task = parse_task("a 1->:b2\nb2: b && c; c3: c")?;
        assert_eq!(task.sequences.len(), 3);
        Ok(())
    }

    #[test]
    fn test_transition_errors() {
        assert_eq!(
            parse_error("a FAILED->b").message,
            DslMessage::TASK_UNQUOTED_TRANSITION_CHECK_MUST_BE_NUMBER
        );
        assert_eq!(parse_error("a ->b").message, DslMessage::TASK_ARROW_SHOULD_BE_PRECEDED_BY_CODE);
        assert_eq!(parse_error("->b").message, DslMessage::TASK_ARROW_SHOULD_BE_PRECEDED_BY_CODE);
        assert_eq!(parse_error("a 'x' b").message, DslMessage::TASK_MISSING_TRANSITION_ARROW);
    }

    #[test]
    fn test_lexical_errors_surface() {
        assert_eq!(parse_error("a & b").message, DslMessage::TASK_DOUBLE_AND_REQUIRED);
    }

    #[test]
    fn test_more_input_on_same_line() {
        assert_eq!(parse_error("a b").message, DslMessage::TASK_MORE_INPUT);
    }

    #[test]
    fn test_arguments_rejected_outside_app_mode() -> Result<(), ParseError> {
        let err = TaskParser::new("a --x=1")?.app_mode(false).parse().unwrap_err();
        assert_eq!(err.message, DslMessage::TASK_ARGUMENTS_NOT_ALLOWED_UNLESS_IN_APP_MODE);
        Ok(())
    }

    #[test]
    fn test_illegal_task_name() {
        let err = parse_named_task("no good", "a").unwrap_err();
        assert_eq!(err.message, DslMessage::ILLEGAL_TASK_NAME);
    }

    #[test]
    fn test_validation_can_be_skipped() -> Result<(), ParseError> {
        let task = TaskParser::new("<a>")?.validate(false).parse()?;
        assert_eq!(split(&task.sequences[0].elements[0]).branches.len(), 1);
        Ok(())
    }
}
