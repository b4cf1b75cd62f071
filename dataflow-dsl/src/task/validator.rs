//! Semantic checks run on a freshly parsed task.

use super::ast::*;
use crate::error::ParseError;
use crate::message::DslMessage;
use crate::visitor::{walk_task, TaskVisitor};
use std::collections::HashMap;

/// How a flow element is known inside the task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyKind {
    Label,
    AppName,
}

/// Collects the first semantic problem found while walking a task.
pub struct TaskValidator<'a> {
    dsl: &'a str,
    keys: HashMap<String, KeyKind>,
    label_targets: Vec<(String, usize)>,
    error: Option<ParseError>,
}

impl<'a> TaskValidator<'a> {
    /// Walk `task` and return the first problem as a `ParseError`.
    pub fn validate(task: &'a TaskNode) -> Result<(), ParseError> {
        let mut validator = TaskValidator {
            dsl: &task.dsl,
            keys: HashMap::new(),
            label_targets: Vec::new(),
            error: None,
        };
        walk_task(&mut validator, task);
        match validator.error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn fail(&mut self, offset: usize, message: DslMessage, inserts: Vec<String>) {
        if self.error.is_none() {
            self.error = Some(ParseError::new(self.dsl, offset, message, inserts));
        }
    }

    fn register(&mut self, key: &str, kind: KeyKind, offset: usize) {
        let clash = match (self.keys.get(key).copied(), kind) {
            (None, _) => None,
            (Some(KeyKind::Label), KeyKind::Label) => Some(DslMessage::TASK_VALIDATION_DUPLICATE_LABEL),
            (Some(KeyKind::AppName), KeyKind::AppName) => Some(DslMessage::TASK_VALIDATION_APP_NAME_ALREADY_IN_USE),
            (Some(KeyKind::AppName), KeyKind::Label) => Some(DslMessage::TASK_VALIDATION_LABEL_CLASHES_WITH_TASKAPP_NAME),
            (Some(KeyKind::Label), KeyKind::AppName) => Some(DslMessage::TASK_VALIDATION_APP_NAME_CLASHES_WITH_LABEL),
        };
        match clash {
            Some(message) => self.fail(offset, message, vec![key.to_string()]),
            None => {
                self.keys.insert(key.to_string(), kind);
            }
        }
    }
}

impl TaskVisitor for TaskValidator<'_> {
    fn visit_sequence(&mut self, sequence: &SequenceNode, index: Option<usize>) -> bool {
        if matches!(index, Some(i) if i > 0) && sequence.label().is_none() {
            self.fail(
                sequence.start,
                DslMessage::TASK_VALIDATION_SECONDARY_SEQUENCES_MUST_BE_NAMED,
                vec![],
            );
        }
        true
    }

    fn visit_split(&mut self, split: &SplitNode) -> bool {
        if split.branches.len() < 2 {
            self.fail(split.start, DslMessage::TASK_VALIDATION_SPLIT_WITH_ONE_FLOW, vec![]);
        }
        if let Some(label) = &split.label {
            self.register(&label.label, KeyKind::Label, label.start);
        }
        true
    }

    fn visit_app(&mut self, app: &TaskAppNode) -> bool {
        match &app.label {
            Some(label) => self.register(&label.label, KeyKind::Label, label.start),
            None => self.register(&app.name, KeyKind::AppName, app.start),
        }
        true
    }

    fn visit_transition(&mut self, transition: &TransitionNode) -> bool {
        if let Some(label) = transition.target_label() {
            self.label_targets.push((label.to_string(), transition.start));
        }
        true
    }

    fn post_visit_task(&mut self, _task: &TaskNode) {
        let undefined = self
            .label_targets
            .iter()
            .find(|(label, _)| self.keys.get(label) != Some(&KeyKind::Label))
            .cloned();
        if let Some((label, offset)) = undefined {
            self.fail(
                offset,
                DslMessage::TASK_VALIDATION_TRANSITION_TARGET_LABEL_UNDEFINED,
                vec![label],
            );
        }
    }
}
