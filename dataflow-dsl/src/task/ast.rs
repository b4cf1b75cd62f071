//! AST types for task definitions

use crate::stream::{ArgumentNode, LabelNode};
use serde::{Deserialize, Serialize};

pub const END_TARGET: &str = "$END";
pub const FAIL_TARGET: &str = "$FAIL";

/// Left side of `->`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionCondition {
    /// Unquoted number or `*`.
    ExitCode(String),
    /// Quoted free-form status, e.g. `'FAILED'`.
    ExitStatus(String),
}

impl TransitionCondition {
    pub fn is_wildcard(&self) -> bool {
        matches!(self, TransitionCondition::ExitCode(code) if code == "*")
    }

    pub fn text(&self) -> &str {
        match self {
            TransitionCondition::ExitCode(s) | TransitionCondition::ExitStatus(s) => s,
        }
    }
}

/// Right side of `->`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionTarget {
    /// `:label`, a jump to a labelled app or sequence.
    Label(String),
    /// An app to run, including the `$END` and `$FAIL` markers.
    App(TaskAppNode),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionNode {
    pub condition: TransitionCondition,
    pub target: TransitionTarget,
    pub start: usize,
    pub end: usize,
}

impl TransitionNode {
    pub fn is_end(&self) -> bool {
        matches!(&self.target, TransitionTarget::App(app) if app.name == END_TARGET)
    }

    pub fn is_fail(&self) -> bool {
        matches!(&self.target, TransitionTarget::App(app) if app.name == FAIL_TARGET)
    }

    pub fn target_label(&self) -> Option<&str> {
        match &self.target {
            TransitionTarget::Label(label) => Some(label),
            TransitionTarget::App(_) => None,
        }
    }

    pub fn target_app(&self) -> Option<&TaskAppNode> {
        match &self.target {
            TransitionTarget::App(app) => Some(app),
            TransitionTarget::Label(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskAppNode {
    pub label: Option<LabelNode>,
    pub name: String,
    pub arguments: Vec<ArgumentNode>,
    pub transitions: Vec<TransitionNode>,
    pub start: usize,
    pub end: usize,
}

impl TaskAppNode {
    pub fn label_name(&self) -> &str {
        match &self.label {
            Some(label) => &label.label,
            None => &self.name,
        }
    }

    pub fn argument(&self, name: &str) -> Option<&str> {
        self.arguments
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }
}

/// `<flow || flow ...>`; branches run in parallel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitNode {
    pub label: Option<LabelNode>,
    pub branches: Vec<SequenceNode>,
    pub start: usize,
    pub end: usize,
}

impl SplitNode {
    pub fn label_name(&self) -> Option<&str> {
        self.label.as_ref().map(|l| l.label.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowElement {
    App(TaskAppNode),
    Split(SplitNode),
}

impl FlowElement {
    pub fn label(&self) -> Option<&LabelNode> {
        match self {
            FlowElement::App(app) => app.label.as_ref(),
            FlowElement::Split(split) => split.label.as_ref(),
        }
    }

    pub fn start(&self) -> usize {
        match self {
            FlowElement::App(app) => app.start,
            FlowElement::Split(split) => split.start,
        }
    }
}

/// Elements joined by `&&`, run one after another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceNode {
    pub elements: Vec<FlowElement>,
    pub start: usize,
    pub end: usize,
}

impl SequenceNode {
    /// A sequence is named by the label of its first element.
    pub fn label(&self) -> Option<&str> {
        self.elements
            .first()
            .and_then(|e| e.label())
            .map(|l| l.label.as_str())
    }
}

/// Root of a task definition. The first sequence is the entry point; the
/// others are only reachable through transitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskNode {
    pub name: Option<String>,
    pub dsl: String,
    pub sequences: Vec<SequenceNode>,
}

impl TaskNode {
    /// True for a single app with no transitions: a plain task, not a composed one.
    pub fn is_single_app(&self) -> bool {
        match self.sequences.as_slice() {
            [only] => matches!(
                only.elements.as_slice(),
                [FlowElement::App(app)] if app.transitions.is_empty()
            ),
            _ => false,
        }
    }

    pub fn to_dsl(&self) -> String {
        crate::pretty_printer::print_task(self)
    }

    /// Copy with source text and every offset cleared.
    pub fn without_positions(&self) -> TaskNode {
        TaskNode {
            name: self.name.clone(),
            dsl: String::new(),
            sequences: self.sequences.iter().map(strip_sequence).collect(),
        }
    }

    /// Structural equality ignoring offsets and source text.
    pub fn same_shape(&self, other: &TaskNode) -> bool {
        self.without_positions() == other.without_positions()
    }
}

fn strip_label(label: &Option<LabelNode>) -> Option<LabelNode> {
    label.as_ref().map(|l| LabelNode {
        label: l.label.clone(),
        start: 0,
        end: 0,
    })
}

fn strip_sequence(sequence: &SequenceNode) -> SequenceNode {
    SequenceNode {
        elements: sequence
            .elements
            .iter()
            .map(|e| match e {
                FlowElement::App(app) => FlowElement::App(strip_app(app)),
                FlowElement::Split(split) => FlowElement::Split(SplitNode {
                    label: strip_label(&split.label),
                    branches: split.branches.iter().map(strip_sequence).collect(),
                    start: 0,
                    end: 0,
                }),
            })
            .collect(),
        start: 0,
        end: 0,
    }
}

fn strip_app(app: &TaskAppNode) -> TaskAppNode {
    TaskAppNode {
        label: strip_label(&app.label),
        name: app.name.clone(),
        arguments: app
            .arguments
            .iter()
            .map(|a| ArgumentNode {
                name: a.name.clone(),
                value: a.value.clone(),
                start: 0,
                end: 0,
            })
            .collect(),
        transitions: app
            .transitions
            .iter()
            .map(|t| TransitionNode {
                condition: t.condition.clone(),
                target: match &t.target {
                    TransitionTarget::Label(label) => TransitionTarget::Label(label.clone()),
                    TransitionTarget::App(target) => TransitionTarget::App(strip_app(target)),
                },
                start: 0,
                end: 0,
            })
            .collect(),
        start: 0,
        end: 0,
    }
}
