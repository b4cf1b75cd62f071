//! Canonical DSL text for stream and task ASTs
//!
//! The output re-parses to a node of the same shape: single spaces around
//! `|`, `>`, `&&` and `||`, labels as `label: app`, and argument values
//! quoted only when the lexer would otherwise split them.

use crate::stream::{AppNode, ArgumentNode, StreamNode};
use crate::task::{FlowElement, SequenceNode, TaskAppNode, TaskNode, TransitionCondition, TransitionTarget};
use std::fmt::{self, Write};

// ============================================================================
// STREAMS
// ============================================================================

pub fn print_stream(stream: &StreamNode) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_stream(&mut out, stream);
    out
}

fn write_stream(out: &mut impl Write, stream: &StreamNode) -> fmt::Result {
    if let Some(name) = &stream.name {
        write!(out, "{} = ", name)?;
    }
    if let (true, Some(source), Some(sink)) = (stream.is_bridge(), &stream.source_channel, &stream.sink_channel) {
        return write!(
            out,
            "{} > {}",
            source.channel.reference.to_dsl(),
            sink.channel.reference.to_dsl()
        );
    }
    if let Some(source) = &stream.source_channel {
        write!(out, "{} > ", source.channel.reference.to_dsl())?;
    }
    let separator = if stream.apps_unbound { " || " } else { " | " };
    for (i, app) in stream.apps.iter().enumerate() {
        if i > 0 {
            out.write_str(separator)?;
        }
        write_app(out, app)?;
    }
    if let Some(sink) = &stream.sink_channel {
        write!(out, " > {}", sink.channel.reference.to_dsl())?;
    }
    Ok(())
}

fn write_app(out: &mut impl Write, app: &AppNode) -> fmt::Result {
    if let Some(label) = &app.label {
        write!(out, "{}: ", label.label)?;
    }
    out.write_str(&app.name)?;
    write_arguments(out, &app.arguments)
}

fn write_arguments(out: &mut impl Write, arguments: &[ArgumentNode]) -> fmt::Result {
    for argument in arguments {
        write!(out, " --{}={}", argument.name, quote_value(&argument.value))?;
    }
    Ok(())
}

/// Left side of a transition arrow: codes bare, statuses quoted.
pub fn condition_dsl(condition: &TransitionCondition) -> String {
    match condition {
        TransitionCondition::ExitCode(code) => code.clone(),
        TransitionCondition::ExitStatus(status) => format!("'{}'", status.replace('\'', "''")),
    }
}

/// Quote `value` in single quotes when it would not survive lexing bare.
pub fn quote_value(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '\'' | '"' | '|' | ';' | '>'));
    if needs_quotes {
        format!("'{}'", value.replace('\'', "''"))
    } else {
        value.to_string()
    }
}

// ============================================================================
// TASKS
// ============================================================================

pub fn print_task(task: &TaskNode) -> String {
    let mut out = String::new();
    let _ = write_task(&mut out, task);
    out
}

fn write_task(out: &mut impl Write, task: &TaskNode) -> fmt::Result {
    for (i, sequence) in task.sequences.iter().enumerate() {
        if i > 0 {
            out.write_char('\n')?;
        }
        write_sequence(out, sequence)?;
    }
    Ok(())
}

fn write_sequence(out: &mut impl Write, sequence: &SequenceNode) -> fmt::Result {
    for (i, element) in sequence.elements.iter().enumerate() {
        if i > 0 {
            out.write_str(" && ")?;
        }
        match element {
            FlowElement::App(app) => write_task_app(out, app)?,
            FlowElement::Split(split) => {
                if let Some(label) = &split.label {
                    write!(out, "{}: ", label.label)?;
                }
                out.write_char('<')?;
                for (j, branch) in split.branches.iter().enumerate() {
                    if j > 0 {
                        out.write_str(" || ")?;
                    }
                    write_sequence(out, branch)?;
                }
                out.write_char('>')?;
            }
        }
    }
    Ok(())
}

fn write_task_app(out: &mut impl Write, app: &TaskAppNode) -> fmt::Result {
    if let Some(label) = &app.label {
        write!(out, "{}: ", label.label)?;
    }
    out.write_str(&app.name)?;
    write_arguments(out, &app.arguments)?;
    for transition in &app.transitions {
        write!(out, " {}->", condition_dsl(&transition.condition))?;
        match &transition.target {
            TransitionTarget::Label(label) => write!(out, ":{}", label)?,
            TransitionTarget::App(target) => write_task_app(out, target)?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;
    use crate::stream::{parse_named_stream, parse_stream};
    use crate::task::parse_task;

    fn reprint_stream(dsl: &str) -> Result<String, ParseError> {
        Ok(parse_stream(dsl)?.to_dsl())
    }

    #[test]
    fn test_stream_canonical_spacing() -> Result<(), ParseError> {
        assert_eq!(reprint_stream("time|log")?, "time | log");
        assert_eq!(reprint_stream("a  ||  b")?, "a || b");
        assert_eq!(reprint_stream("f1:   filter --expression=x")?, "f1: filter --expression=x");
        Ok(())
    }

    #[test]
    fn test_stream_channels_and_bridge() -> Result<(), ParseError> {
        assert_eq!(reprint_stream(":foo > log")?, ":foo > log");
        assert_eq!(reprint_stream(":ticktock.time > log")?, ":ticktock.time > log");
        assert_eq!(reprint_stream("tap:stream:ticktock > log")?, "tap:stream:ticktock > log");
        assert_eq!(reprint_stream("time > queue:out")?, "time > queue:out");
        assert_eq!(reprint_stream(":a > :b")?, ":a > :b");
        Ok(())
    }

    #[test]
    fn test_named_stream_prefix() -> Result<(), ParseError> {
        assert_eq!(parse_named_stream("ticktock", "time | log")?.to_dsl(), "ticktock = time | log");
        Ok(())
    }

    #[test]
    fn test_quoting() {
        assert_eq!(quote_value("plain"), "plain");
        assert_eq!(quote_value(""), "''");
        assert_eq!(quote_value("a b"), "'a b'");
        assert_eq!(quote_value("it's"), "'it''s'");
        assert_eq!(quote_value("x>y"), "'x>y'");
    }

    #[test]
    fn test_quoted_values_round_trip() -> Result<(), ParseError> {
        let stream = parse_stream("filter --expression='payload == ''a b'''")?;
        assert_eq!(stream.apps[0].argument("expression"), Some("payload == 'a b'"));
        let again = parse_stream(&stream.to_dsl())?;
        assert!(stream.same_shape(&again));
        Ok(())
    }

    #[test]
    fn test_task_printing() -> Result<(), ParseError> {
        let task = parse_task("a  0->b 'FAILED'->:fix&&<c||d: e --x=1>\nfix: f")?;
        assert_eq!(task.to_dsl(), "a 0->b 'FAILED'->:fix && <c || d: e --x=1>\nfix: f");
        assert!(task.same_shape(&parse_task(&task.to_dsl())?));
        Ok(())
    }
}
