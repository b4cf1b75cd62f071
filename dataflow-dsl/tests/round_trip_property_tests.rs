//! Property-Based Tests for DSL Round-Trip
//!
//! Property: For any valid stream or task AST, printing → parsing SHALL
//! produce an AST of the same shape (offsets and source text excluded).

use dataflow_dsl::stream::*;
use dataflow_dsl::task::*;
use dataflow_dsl::{parse_stream, parse_task, tokenize, TokenKind};
use proptest::prelude::*;
use std::collections::BTreeMap;

// ============================================================================
// ARBITRATORS
// ============================================================================

fn arb_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,7}".prop_filter("reserved channel prefixes", |s| {
        !matches!(s.as_str(), "tap" | "queue" | "topic" | "bridge")
    })
}

fn arb_value() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z0-9_.]{1,10}",
        "[0-9]{1,5}",
        "[a-z ']{0,10}",
        Just(String::new()),
        Just("a|b;c>d".to_string()),
    ]
}

fn arb_arguments() -> impl Strategy<Value = Vec<ArgumentNode>> {
    prop::collection::btree_map("[a-z][a-z0-9]{0,5}(\\.[a-z][a-z0-9]{0,5}){0,2}", arb_value(), 0..4).prop_map(
        |args: BTreeMap<String, String>| {
            args.into_iter()
                .map(|(name, value)| ArgumentNode {
                    name,
                    value,
                    start: 0,
                    end: 0,
                })
                .collect()
        },
    )
}

fn label(text: String) -> LabelNode {
    LabelNode {
        label: text,
        start: 0,
        end: 0,
    }
}

/// Apps with unique label names: each base name gets its index appended.
fn arb_apps() -> impl Strategy<Value = Vec<AppNode>> {
    prop::collection::vec((arb_name(), any::<bool>(), arb_arguments()), 1..5).prop_map(|apps| {
        apps.into_iter()
            .enumerate()
            .map(|(i, (base, labelled, arguments))| AppNode {
                label: labelled.then(|| label(format!("lbl{}", i))),
                name: format!("{}{}", base, i),
                arguments,
                start: 0,
                end: 0,
            })
            .collect()
    })
}

fn channel(reference: ChannelRef) -> ChannelNode {
    ChannelNode {
        reference,
        start: 0,
        end: 0,
    }
}

fn arb_source_ref() -> impl Strategy<Value = ChannelRef> {
    prop_oneof![
        arb_name().prop_map(|name| ChannelRef::Destination { name }),
        (arb_name(), arb_name()).prop_map(|(stream, label)| ChannelRef::Tap {
            stream,
            label: Some(label)
        }),
        arb_name().prop_map(|stream| ChannelRef::Tap { stream, label: None }),
        arb_name().prop_map(|name| ChannelRef::Named {
            kind: ChannelKind::Queue,
            name
        }),
    ]
}

fn arb_sink_ref() -> impl Strategy<Value = ChannelRef> {
    prop_oneof![
        "[a-z][a-z0-9]{0,5}(\\.[a-z][a-z0-9]{0,5}){0,2}".prop_map(|name| ChannelRef::Destination { name }),
        arb_name().prop_map(|name| ChannelRef::Named {
            kind: ChannelKind::Topic,
            name
        }),
    ]
}

fn arb_stream() -> impl Strategy<Value = StreamNode> {
    (
        prop::option::of(arb_name()),
        arb_apps(),
        prop::option::of(arb_source_ref()),
        prop::option::of(arb_sink_ref()),
        any::<bool>(),
    )
        .prop_map(|(name, apps, source, sink, unbound)| {
            let apps_unbound = unbound && apps.len() > 1;
            let (source, sink) = if apps_unbound { (None, None) } else { (source, sink) };
            StreamNode {
                name,
                dsl: String::new(),
                apps,
                source_channel: source.map(|r| SourceChannelNode {
                    channel: channel(r),
                    gt_offset: 0,
                }),
                sink_channel: sink.map(|r| SinkChannelNode {
                    channel: channel(r),
                    gt_offset: 0,
                }),
                apps_unbound,
            }
        })
}

fn task_app(name: String, label_text: Option<String>, arguments: Vec<ArgumentNode>) -> TaskAppNode {
    TaskAppNode {
        label: label_text.map(label),
        name,
        arguments,
        transitions: Vec::new(),
        start: 0,
        end: 0,
    }
}

fn sequence(elements: Vec<FlowElement>) -> SequenceNode {
    SequenceNode {
        elements,
        start: 0,
        end: 0,
    }
}

fn arb_task_leaf() -> impl Strategy<Value = Vec<(String, Vec<ArgumentNode>)>> {
    (arb_name(), arb_arguments()).prop_map(|(name, args)| vec![(name, args)])
}

/// A single sequence of apps and splits; every app name is made unique
/// through a running counter so validation always passes.
fn arb_task() -> impl Strategy<Value = TaskNode> {
    let shape = prop::collection::vec(
        prop_oneof![
            arb_task_leaf().prop_map(|apps| (false, vec![apps])),
            prop::collection::vec(arb_task_leaf(), 2..4).prop_map(|branches| (true, branches)),
        ],
        1..4,
    );
    (shape, prop::option::of(("[0-9]{1,3}", arb_name()))).prop_map(|(elements, transition)| {
        let mut counter = 0;
        let mut unique = |base: String| {
            counter += 1;
            format!("{}{}", base, counter)
        };
        let mut flow = Vec::new();
        for (is_split, groups) in elements {
            if is_split {
                let branches = groups
                    .into_iter()
                    .map(|apps| {
                        sequence(
                            apps.into_iter()
                                .map(|(name, args)| FlowElement::App(task_app(unique(name), None, args)))
                                .collect(),
                        )
                    })
                    .collect();
                flow.push(FlowElement::Split(SplitNode {
                    label: None,
                    branches,
                    start: 0,
                    end: 0,
                }));
            } else {
                for (name, args) in groups.into_iter().flatten() {
                    flow.push(FlowElement::App(task_app(unique(name), None, args)));
                }
            }
        }
        if let (Some((code, target)), Some(FlowElement::App(app))) = (transition, flow.first_mut()) {
            app.transitions.push(TransitionNode {
                condition: TransitionCondition::ExitCode(code),
                target: TransitionTarget::App(task_app(target, None, Vec::new())),
                start: 0,
                end: 0,
            });
        }
        TaskNode {
            name: None,
            dsl: String::new(),
            sequences: vec![sequence(flow)],
        }
    })
}

// ============================================================================
// PROPERTIES
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Printing then parsing a stream preserves its shape.
    #[test]
    fn prop_stream_round_trip(stream in arb_stream()) {
        let printed = stream.to_dsl();
        match parse_stream(&printed) {
            Ok(parsed) => prop_assert!(
                stream.same_shape(&parsed),
                "Round-trip changed the stream\nPrinted: {}\nBefore: {:?}\nAfter: {:?}",
                printed, stream.without_positions(), parsed.without_positions()
            ),
            Err(err) => prop_assert!(false, "Failed to parse printed stream: {}\nPrinted: {}", err, printed),
        }
    }

    /// Printing is idempotent once the text is canonical.
    #[test]
    fn prop_stream_printing_is_idempotent(stream in arb_stream()) {
        let printed = stream.to_dsl();
        let reparsed = parse_stream(&printed).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(printed, reparsed.to_dsl());
    }

    /// Printing then parsing a task preserves its shape.
    #[test]
    fn prop_task_round_trip(task in arb_task()) {
        let printed = task.to_dsl();
        match parse_task(&printed) {
            Ok(parsed) => prop_assert!(task.same_shape(&parsed), "Printed: {}", printed),
            Err(err) => prop_assert!(false, "Failed to parse printed task: {}\nPrinted: {}", err, printed),
        }
    }

    /// A task drawn as a graph renders back to a task of the same shape.
    #[test]
    fn prop_task_graph_round_trip(task in arb_task()) {
        let rendered = task.to_graph().to_dsl();
        match parse_task(&rendered) {
            Ok(parsed) => prop_assert!(task.same_shape(&parsed), "Rendered: {}", rendered),
            Err(err) => prop_assert!(false, "Failed to parse rendered graph: {}\nRendered: {}", err, rendered),
        }
    }

    /// The lexer either fails or ends with exactly one Eof.
    #[test]
    fn prop_lexer_ends_with_eof(source in ".{0,40}") {
        if let Ok(tokens) = tokenize(&source) {
            prop_assert!(matches!(tokens.last().map(|t| &t.kind), Some(TokenKind::Eof)));
            prop_assert_eq!(tokens.iter().filter(|t| t.kind == TokenKind::Eof).count(), 1);
        }
    }

    /// Every repeat of an unlabelled app is one clash, located at the second use.
    #[test]
    fn prop_duplicate_labels_all_reported(name in arb_name(), count in 2usize..5) {
        let dsl = vec![name.as_str(); count].join(" | ");
        let err = parse_stream(&dsl).expect_err("repeated app names must clash");
        prop_assert_eq!(err.message, dataflow_dsl::DslMessage::DUPLICATE_LABEL);
        prop_assert_eq!(err.duplicates.len(), count - 1);
        prop_assert_eq!(err.offset, name.len() + 3);
        prop_assert!(err.duplicates.iter().all(|c| c.first_offset == 0 && c.label == name));
    }

    /// Parsers never panic on arbitrary input.
    #[test]
    fn prop_parsers_never_panic(source in "[a-z:|&<>()=.' -]{0,30}") {
        let _ = parse_stream(&source);
        let _ = parse_task(&source);
    }

    /// Arbitrary printable unicode is rejected or accepted, never a panic.
    #[test]
    fn prop_parsers_never_panic_on_unicode(source in "\\PC{0,200}") {
        let _ = parse_stream(&source);
        let _ = parse_task(&source);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Deep `(` or `<` nesting ends in an error, never a stack overflow.
    #[test]
    fn prop_deep_nesting_is_an_error(depth in 1..50_000usize, splits in any::<bool>()) {
        let open = if splits { "<" } else { "(" };
        let source = format!("{}a", open.repeat(depth));
        let _ = parse_stream(&source);
        let result = parse_task(&source);
        if depth >= MAX_NESTING_DEPTH {
            let err = result.expect_err("nesting past the limit must fail");
            prop_assert_eq!(err.message, dataflow_dsl::DslMessage::TASK_NESTING_TOO_DEEP);
        } else {
            prop_assert!(result.is_err(), "unclosed nesting must fail");
        }
    }
}
