//! Read-only traversal over stream and task ASTs
//!
//! Implement [`StreamVisitor`] or [`TaskVisitor`] and override only the
//! callbacks you care about; every default does nothing and returns `true`.
//! A `visit_*` returning `false` skips that node's children, but the matching
//! `post_visit_*` still runs.
//!
//! ```ignore
//! let task = parse_task("<a||b||c> && <d||e>")?;
//! let mut fan_out = MaxFanOutVisitor::default();
//! walk_task(&mut fan_out, &task);
//! assert_eq!(fan_out.max_fan_out(), 3);
//! ```

pub mod collectors;
pub mod fan_out;

pub use collectors::{StreamAppsCollector, TaskAppsCollector};
pub use fan_out::{max_fan_out, MaxFanOutVisitor};

use crate::stream::{AppNode, ArgumentNode, SinkChannelNode, SourceChannelNode, StreamNode};
use crate::task::{FlowElement, SequenceNode, SplitNode, TaskAppNode, TaskNode, TransitionNode};

// ============================================================================
// STREAMS
// ============================================================================

pub trait StreamVisitor {
    fn visit_stream(&mut self, _stream: &StreamNode) -> bool {
        true
    }
    fn post_visit_stream(&mut self, _stream: &StreamNode) {}

    fn visit_source_channel(&mut self, _source: &SourceChannelNode) -> bool {
        true
    }
    fn post_visit_source_channel(&mut self, _source: &SourceChannelNode) {}

    fn visit_app(&mut self, _app: &AppNode) -> bool {
        true
    }
    fn post_visit_app(&mut self, _app: &AppNode) {}

    fn visit_argument(&mut self, _argument: &ArgumentNode) -> bool {
        true
    }
    fn post_visit_argument(&mut self, _argument: &ArgumentNode) {}

    fn visit_sink_channel(&mut self, _sink: &SinkChannelNode) -> bool {
        true
    }
    fn post_visit_sink_channel(&mut self, _sink: &SinkChannelNode) {}
}

/// Pre-order walk: source channel, apps (each with its arguments), sink channel.
pub fn walk_stream<V: StreamVisitor + ?Sized>(visitor: &mut V, stream: &StreamNode) {
    if visitor.visit_stream(stream) {
        if let Some(source) = &stream.source_channel {
            visitor.visit_source_channel(source);
            visitor.post_visit_source_channel(source);
        }
        for app in &stream.apps {
            if visitor.visit_app(app) {
                for argument in &app.arguments {
                    visitor.visit_argument(argument);
                    visitor.post_visit_argument(argument);
                }
            }
            visitor.post_visit_app(app);
        }
        if let Some(sink) = &stream.sink_channel {
            visitor.visit_sink_channel(sink);
            visitor.post_visit_sink_channel(sink);
        }
    }
    visitor.post_visit_stream(stream);
}

// ============================================================================
// TASKS
// ============================================================================

pub trait TaskVisitor {
    fn visit_task(&mut self, _task: &TaskNode) -> bool {
        true
    }
    fn post_visit_task(&mut self, _task: &TaskNode) {}

    /// `index` is the sequence's position among the task's top-level
    /// sequences; `None` for a split branch.
    fn visit_sequence(&mut self, _sequence: &SequenceNode, _index: Option<usize>) -> bool {
        true
    }
    fn post_visit_sequence(&mut self, _sequence: &SequenceNode, _index: Option<usize>) {}

    fn visit_split(&mut self, _split: &SplitNode) -> bool {
        true
    }
    fn post_visit_split(&mut self, _split: &SplitNode) {}

    /// Called for apps in flows only; transition target apps arrive through
    /// [`TaskVisitor::visit_transition`].
    fn visit_app(&mut self, _app: &TaskAppNode) -> bool {
        true
    }
    fn post_visit_app(&mut self, _app: &TaskAppNode) {}

    fn visit_transition(&mut self, _transition: &TransitionNode) -> bool {
        true
    }
    fn post_visit_transition(&mut self, _transition: &TransitionNode) {}
}

pub fn walk_task<V: TaskVisitor + ?Sized>(visitor: &mut V, task: &TaskNode) {
    if visitor.visit_task(task) {
        for (index, sequence) in task.sequences.iter().enumerate() {
            walk_sequence(visitor, sequence, Some(index));
        }
    }
    visitor.post_visit_task(task);
}

fn walk_sequence<V: TaskVisitor + ?Sized>(visitor: &mut V, sequence: &SequenceNode, index: Option<usize>) {
    if visitor.visit_sequence(sequence, index) {
        for element in &sequence.elements {
            match element {
                FlowElement::App(app) => walk_task_app(visitor, app),
                FlowElement::Split(split) => {
                    if visitor.visit_split(split) {
                        for branch in &split.branches {
                            walk_sequence(visitor, branch, None);
                        }
                    }
                    visitor.post_visit_split(split);
                }
            }
        }
    }
    visitor.post_visit_sequence(sequence, index);
}

fn walk_task_app<V: TaskVisitor + ?Sized>(visitor: &mut V, app: &TaskAppNode) {
    if visitor.visit_app(app) {
        for transition in &app.transitions {
            visitor.visit_transition(transition);
            visitor.post_visit_transition(transition);
        }
    }
    visitor.post_visit_app(app);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;
    use crate::stream::parse_stream;
    use crate::task::parse_task;

    #[derive(Default)]
    struct Trace(Vec<String>);

    impl StreamVisitor for Trace {
        fn visit_source_channel(&mut self, source: &SourceChannelNode) -> bool {
            self.0.push(format!("source {}", source.channel.reference.to_dsl()));
            true
        }
        fn visit_app(&mut self, app: &AppNode) -> bool {
            self.0.push(format!("app {}", app.name));
            app.name != "skip"
        }
        fn visit_argument(&mut self, argument: &ArgumentNode) -> bool {
            self.0.push(format!("arg {}", argument.name));
            true
        }
        fn post_visit_app(&mut self, app: &AppNode) {
            self.0.push(format!("/app {}", app.name));
        }
        fn visit_sink_channel(&mut self, sink: &SinkChannelNode) -> bool {
            self.0.push(format!("sink {}", sink.channel.reference.to_dsl()));
            true
        }
    }

    impl TaskVisitor for Trace {
        fn visit_sequence(&mut self, _sequence: &SequenceNode, index: Option<usize>) -> bool {
            self.0.push(format!("seq {:?}", index));
            true
        }
        fn visit_split(&mut self, split: &SplitNode) -> bool {
            self.0.push(format!("split {}", split.branches.len()));
            true
        }
        fn post_visit_split(&mut self, _split: &SplitNode) {
            self.0.push("/split".to_string());
        }
        fn visit_app(&mut self, app: &TaskAppNode) -> bool {
            self.0.push(format!("app {}", app.name));
            true
        }
        fn visit_transition(&mut self, transition: &TransitionNode) -> bool {
            self.0.push(format!("transition {}", transition.condition.text()));
            true
        }
    }

    #[test]
    fn test_stream_walk_order() -> Result<(), ParseError> {
        let stream = parse_stream(":in > filter --expression=x | skip --a=b > :out")?;
        let mut trace = Trace::default();
        walk_stream(&mut trace, &stream);
        assert_eq!(
            trace.0,
            vec![
                "source :in",
                "app filter",
                "arg expression",
                "/app filter",
                "app skip",
                "/app skip",
                "sink :out",
            ]
        );
        Ok(())
    }

    #[test]
    fn test_task_walk_order() -> Result<(), ParseError> {
        let task = parse_task("a 1->b && <c || d>")?;
        let mut trace = Trace::default();
        walk_task(&mut trace, &task);
        assert_eq!(
            trace.0,
            vec![
                "seq Some(0)",
                "app a",
                "transition 1",
                "split 2",
                "seq None",
                "app c",
                "seq None",
                "app d",
                "/split",
            ]
        );
        Ok(())
    }
}
