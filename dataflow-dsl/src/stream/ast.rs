//! AST types for stream definitions

use dataflow_core::AppType;
use serde::{Deserialize, Serialize};

// ============================================================================
// APPS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelNode {
    pub label: String,
    pub start: usize,
    pub end: usize,
}

/// One `--name=value` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgumentNode {
    pub name: String,
    pub value: String,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppNode {
    pub label: Option<LabelNode>,
    pub name: String,
    /// Arguments in declaration order; keys are unique.
    pub arguments: Vec<ArgumentNode>,
    pub start: usize,
    pub end: usize,
}

impl AppNode {
    /// The label if present, otherwise the app name.
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

    /// Arguments as ordered `(key, value)` pairs.
    pub fn properties(&self) -> Vec<(&str, &str)> {
        self.arguments
            .iter()
            .map(|a| (a.name.as_str(), a.value.as_str()))
            .collect()
    }

    /// Add an argument. A repeated key keeps its first position and takes the new value.
    pub(crate) fn push_argument(&mut self, argument: ArgumentNode) {
        match self.arguments.iter_mut().find(|a| a.name == argument.name) {
            Some(existing) => {
                existing.value = argument.value;
                existing.end = argument.end;
            }
            None => self.arguments.push(argument),
        }
    }
}

// ============================================================================
// CHANNELS
// ============================================================================

/// Legacy named channel prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Queue,
    Topic,
}

impl ChannelKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            ChannelKind::Queue => "queue",
            ChannelKind::Topic => "topic",
        }
    }

    pub fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "queue" => Some(ChannelKind::Queue),
            "topic" => Some(ChannelKind::Topic),
            _ => None,
        }
    }
}

/// What a source or sink channel points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelRef {
    /// `:name`
    Destination { name: String },
    /// `:stream.label` or `tap:stream:stream(.label)`. No label taps the stream's last app.
    Tap { stream: String, label: Option<String> },
    /// `queue:name` / `topic:name`
    Named { kind: ChannelKind, name: String },
}

impl ChannelRef {
    /// Canonical DSL text for this reference.
    pub fn to_dsl(&self) -> String {
        match self {
            ChannelRef::Destination { name } => format!(":{}", name),
            ChannelRef::Tap {
                stream,
                label: Some(label),
            } => format!(":{}.{}", stream, label),
            ChannelRef::Tap { stream, label: None } => format!("tap:stream:{}", stream),
            ChannelRef::Named { kind, name } => format!("{}:{}", kind.prefix(), name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelNode {
    pub reference: ChannelRef,
    pub start: usize,
    pub end: usize,
}

/// `channel >` at the start of a stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceChannelNode {
    pub channel: ChannelNode,
    pub gt_offset: usize,
}

/// `> channel` at the end of a stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkChannelNode {
    pub channel: ChannelNode,
    pub gt_offset: usize,
}

// ============================================================================
// BINDINGS
// ============================================================================

/// How one side of an app is connected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Binding {
    Unset,
    /// Implicit pipe to the adjacent app, named by its label.
    Pipe { peer: String },
    Channel(ChannelRef),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppBindings {
    pub input: Binding,
    pub output: Binding,
}

/// Identity of an app inside a stream: unique per `(group, label)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AppKey {
    pub group: String,
    pub label: String,
}

// ============================================================================
// STREAM
// ============================================================================

pub const BRIDGE_APP_NAME: &str = "bridge";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamNode {
    pub name: Option<String>,
    /// The source text this node was parsed from.
    pub dsl: String,
    pub apps: Vec<AppNode>,
    pub source_channel: Option<SourceChannelNode>,
    pub sink_channel: Option<SinkChannelNode>,
    /// Apps were joined with `||` and are not bound to each other.
    pub apps_unbound: bool,
}

impl StreamNode {
    pub fn app(&self, label: &str) -> Option<&AppNode> {
        self.apps.iter().find(|a| a.label_name() == label)
    }

    pub fn is_bridge(&self) -> bool {
        self.source_channel.is_some()
            && self.sink_channel.is_some()
            && self.apps.len() == 1
            && self.apps[0].name == BRIDGE_APP_NAME
            && self.apps[0].label.is_none()
            && self.apps[0].arguments.is_empty()
    }

    /// Resolved input/output binding per app, in pipeline order.
    pub fn bindings(&self) -> Vec<AppBindings> {
        let count = self.apps.len();
        self.apps
            .iter()
            .enumerate()
            .map(|(i, _)| {
                if self.apps_unbound {
                    return AppBindings {
                        input: Binding::Unset,
                        output: Binding::Unset,
                    };
                }
                let input = if i > 0 {
                    Binding::Pipe {
                        peer: self.apps[i - 1].label_name().to_string(),
                    }
                } else {
                    match &self.source_channel {
                        Some(source) => Binding::Channel(source.channel.reference.clone()),
                        None => Binding::Unset,
                    }
                };
                let output = if i + 1 < count {
                    Binding::Pipe {
                        peer: self.apps[i + 1].label_name().to_string(),
                    }
                } else {
                    match &self.sink_channel {
                        Some(sink) => Binding::Channel(sink.channel.reference.clone()),
                        None => Binding::Unset,
                    }
                };
                AppBindings { input, output }
            })
            .collect()
    }

    /// Role each app plays, inferred from its position and the channels.
    pub fn app_types(&self) -> Vec<AppType> {
        let count = self.apps.len();
        (0..count)
            .map(|i| {
                if self.apps_unbound {
                    return AppType::App;
                }
                let has_input = i > 0 || self.source_channel.is_some();
                let has_output = i + 1 < count || self.sink_channel.is_some();
                match (has_input, has_output) {
                    (false, _) => AppType::Source,
                    (true, true) => AppType::Processor,
                    (true, false) => AppType::Sink,
                }
            })
            .collect()
    }

    pub fn app_keys(&self) -> Vec<AppKey> {
        let group = self.name.clone().unwrap_or_default();
        self.apps
            .iter()
            .map(|a| AppKey {
                group: group.clone(),
                label: a.label_name().to_string(),
            })
            .collect()
    }

    /// Canonical DSL text; re-parsing it yields a node of the same shape.
    pub fn to_dsl(&self) -> String {
        crate::pretty_printer::print_stream(self)
    }

    /// Copy with source text and every offset cleared.
    pub fn without_positions(&self) -> StreamNode {
        let channel = |c: &ChannelNode| ChannelNode {
            reference: c.reference.clone(),
            start: 0,
            end: 0,
        };
        StreamNode {
            name: self.name.clone(),
            dsl: String::new(),
            apps: self
                .apps
                .iter()
                .map(|a| AppNode {
                    label: a.label.as_ref().map(|l| LabelNode {
                        label: l.label.clone(),
                        start: 0,
                        end: 0,
                    }),
                    name: a.name.clone(),
                    arguments: a
                        .arguments
                        .iter()
                        .map(|arg| ArgumentNode {
                            name: arg.name.clone(),
                            value: arg.value.clone(),
                            start: 0,
                            end: 0,
                        })
                        .collect(),
                    start: 0,
                    end: 0,
                })
                .collect(),
            source_channel: self.source_channel.as_ref().map(|s| SourceChannelNode {
                channel: channel(&s.channel),
                gt_offset: 0,
            }),
            sink_channel: self.sink_channel.as_ref().map(|s| SinkChannelNode {
                channel: channel(&s.channel),
                gt_offset: 0,
            }),
            apps_unbound: self.apps_unbound,
        }
    }

    /// Structural equality ignoring offsets and source text.
    pub fn same_shape(&self, other: &StreamNode) -> bool {
        self.without_positions() == other.without_positions()
    }
}
