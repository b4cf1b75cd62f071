//! Node/link view of a task, as drawn by flow editors
//!
//! The first sequence becomes a path from `START` to `END`. Apps are nodes,
//! `&&` is a plain link and every split gets a `SYNC` fork node with one
//! plain link per branch. Branch ends link to whatever follows the split.
//! Transitions become links carrying their condition. A transition target app
//! runs last in its flow, so it links onward like the flow's final element.
//! Secondary sequences are drawn only when a transition jumps to their label;
//! their ends link to `END`.
//!
//! [`Graph::to_dsl`] reverses the mapping: plain links rebuild `&&` chains
//! and splits, transition links rebuild `->` clauses.

use super::ast::{
    SequenceNode, SplitNode, TaskAppNode, TaskNode, TransitionCondition, TransitionNode, TransitionTarget,
    END_TARGET, FAIL_TARGET,
};
use crate::pretty_printer::{condition_dsl, quote_value};
use crate::visitor::{walk_task, TaskVisitor};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

pub const START_NODE: &str = "START";
pub const END_NODE: &str = "END";
pub const SYNC_NODE: &str = "SYNC";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: usize,
    /// App name, or one of `START`, `END`, `SYNC`, `$END`, `$FAIL`.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// App arguments in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<(String, String)>,
}

impl Node {
    pub fn is_sync(&self) -> bool {
        self.name == SYNC_NODE
    }

    fn is_marker(&self) -> bool {
        self.name == END_TARGET || self.name == FAIL_TARGET
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub from: usize,
    pub to: usize,
    /// Set on transition links. Plain links are `&&` order and split fan-out/fan-in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition: Option<TransitionCondition>,
}

impl Link {
    pub fn is_transition(&self) -> bool {
        self.transition.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
}

impl Graph {
    pub fn from_task(task: &TaskNode) -> Graph {
        GraphGenerator::generate(task)
    }

    pub fn node(&self, id: usize) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_named(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.name == name)
    }

    /// Targets of the plain links leaving `id`, in link order.
    pub fn successors(&self, id: usize) -> Vec<usize> {
        self.links
            .iter()
            .filter(|l| l.from == id && !l.is_transition())
            .map(|l| l.to)
            .collect()
    }

    fn predecessors(&self, id: usize) -> impl Iterator<Item = usize> + '_ {
        self.links
            .iter()
            .filter(move |l| l.to == id && !l.is_transition())
            .map(|l| l.from)
    }

    fn transitions_from(&self, id: usize) -> impl Iterator<Item = &Link> + '_ {
        self.links.iter().filter(move |l| l.from == id && l.is_transition())
    }

    /// Nodes reachable from `id` over plain links.
    fn reachable(&self, id: usize) -> HashSet<usize> {
        let mut seen = HashSet::new();
        let mut queue: VecDeque<usize> = self.successors(id).into();
        while let Some(next) = queue.pop_front() {
            if seen.insert(next) {
                queue.extend(self.successors(next));
            }
        }
        seen
    }

    /// First node every entry reaches: where the branches of a split meet again.
    fn join_of(&self, entries: &[usize]) -> Option<usize> {
        let reach: Vec<HashSet<usize>> = entries.iter().map(|&e| self.reachable(e)).collect();
        let (first, rest) = reach.split_first()?;
        let common: Vec<usize> = first
            .iter()
            .copied()
            .filter(|n| rest.iter().all(|r| r.contains(n)))
            .collect();
        common.iter().copied().find(|&candidate| {
            let onward = self.reachable(candidate);
            common.iter().all(|&other| other == candidate || onward.contains(&other))
        })
    }

    /// A labelled node with no plain predecessor that heads a chain of its
    /// own. Such a node was drawn from a secondary sequence.
    fn heads_sequence(&self, id: usize) -> bool {
        if self.predecessors(id).next().is_some() {
            return false;
        }
        self.successors(id)
            .into_iter()
            .any(|next| self.predecessors(next).all(|from| from == id))
    }

    /// Task DSL for this graph. Re-parsing it yields the task the graph was
    /// generated from, up to offsets.
    pub fn to_dsl(&self) -> String {
        let Some(start) = self.node_named(START_NODE) else {
            return String::new();
        };
        let mut renderer = Renderer {
            graph: self,
            visited: HashSet::new(),
            queued: Vec::new(),
        };
        let mut out = String::new();
        renderer.write_flow(&mut out, self.successors(start.id), None);
        let mut next = 0;
        while next < renderer.queued.len() {
            let head = renderer.queued[next];
            out.push('\n');
            renderer.write_flow(&mut out, vec![head], None);
            next += 1;
        }
        out
    }
}

impl TaskNode {
    pub fn to_graph(&self) -> Graph {
        Graph::from_task(self)
    }
}

// ============================================================================
// GENERATION
// ============================================================================

#[derive(Debug)]
enum Frame {
    /// `dangling` links on to the next element; `exits` are transition
    /// target apps, which link to wherever the flow ends.
    Flow { dangling: Vec<usize>, exits: Vec<usize> },
    Split { fork: usize, ends: Vec<usize> },
}

#[derive(Debug)]
struct Jump {
    from: usize,
    condition: TransitionCondition,
    label: String,
}

type AppKey = (Option<String>, String, Vec<(String, String)>);

/// Builds a [`Graph`] by walking a task.
#[derive(Debug, Default)]
pub struct GraphGenerator {
    graph: Graph,
    frames: Vec<Frame>,
    current_app: Option<usize>,
    end: Option<usize>,
    labels: HashMap<String, usize>,
    targets: HashMap<AppKey, usize>,
    jumps: VecDeque<Jump>,
    secondary: Vec<SequenceNode>,
    inlining: bool,
}

impl GraphGenerator {
    pub fn generate(task: &TaskNode) -> Graph {
        let mut generator = GraphGenerator::default();
        walk_task(&mut generator, task);
        generator.resolve_jumps();
        generator.graph
    }

    fn add_node(&mut self, name: &str, label: Option<String>, properties: Vec<(String, String)>) -> usize {
        let id = self.graph.nodes.len();
        self.graph.nodes.push(Node {
            id,
            name: name.to_string(),
            label,
            properties,
        });
        id
    }

    fn link(&mut self, from: usize, to: usize, transition: Option<TransitionCondition>) {
        self.graph.links.push(Link { from, to, transition });
    }

    fn end_node(&mut self) -> usize {
        if let Some(end) = self.end {
            return end;
        }
        let end = self.add_node(END_NODE, None, Vec::new());
        self.end = Some(end);
        end
    }

    fn marker_node(&mut self, name: &str) -> usize {
        match self.graph.node_named(name) {
            Some(node) => node.id,
            None => self.add_node(name, None, Vec::new()),
        }
    }

    /// Link the current flow's dangling ends to `node`, which becomes the only end.
    fn append(&mut self, node: usize) {
        let previous = match self.frames.last_mut() {
            Some(Frame::Flow { dangling, .. }) => std::mem::replace(dangling, vec![node]),
            _ => Vec::new(),
        };
        for from in previous {
            self.link(from, node, None);
        }
    }

    fn register_label(&mut self, label: Option<&str>, node: usize) {
        if let Some(label) = label {
            self.labels.entry(label.to_string()).or_insert(node);
        }
    }

    fn resolve_jumps(&mut self) {
        while let Some(jump) = self.jumps.pop_front() {
            if !self.labels.contains_key(&jump.label) {
                let sequence = self
                    .secondary
                    .iter()
                    .find(|s| s.label() == Some(jump.label.as_str()))
                    .cloned();
                if let Some(sequence) = sequence {
                    self.inline(sequence);
                }
            }
            match self.labels.get(&jump.label).copied() {
                Some(to) => self.link(jump.from, to, Some(jump.condition)),
                None => tracing::debug!(label = %jump.label, "transition to unknown label left out of graph"),
            }
        }
    }

    fn inline(&mut self, sequence: SequenceNode) {
        let task = TaskNode {
            name: None,
            dsl: String::new(),
            sequences: vec![sequence],
        };
        self.inlining = true;
        walk_task(self, &task);
        self.inlining = false;
    }
}

fn properties(app: &TaskAppNode) -> Vec<(String, String)> {
    app.arguments
        .iter()
        .map(|a| (a.name.clone(), a.value.clone()))
        .collect()
}

impl TaskVisitor for GraphGenerator {
    fn visit_sequence(&mut self, sequence: &SequenceNode, index: Option<usize>) -> bool {
        match index {
            Some(0) => {
                let dangling = if self.inlining {
                    Vec::new()
                } else {
                    vec![self.add_node(START_NODE, None, Vec::new())]
                };
                self.frames.push(Frame::Flow {
                    dangling,
                    exits: Vec::new(),
                });
                true
            }
            Some(_) => {
                self.secondary.push(sequence.clone());
                false
            }
            None => {
                let fork = match self.frames.last() {
                    Some(Frame::Split { fork, .. }) => vec![*fork],
                    _ => Vec::new(),
                };
                self.frames.push(Frame::Flow {
                    dangling: fork,
                    exits: Vec::new(),
                });
                true
            }
        }
    }

    fn post_visit_sequence(&mut self, _sequence: &SequenceNode, index: Option<usize>) {
        if matches!(index, Some(i) if i > 0) {
            return;
        }
        let Some(Frame::Flow { dangling, exits }) = self.frames.pop() else {
            return;
        };
        let ends: Vec<usize> = dangling.into_iter().chain(exits).collect();
        if index.is_none() {
            if let Some(Frame::Split { ends: split_ends, .. }) = self.frames.last_mut() {
                split_ends.extend(ends);
            }
            return;
        }
        let end = self.end_node();
        for from in ends {
            self.link(from, end, None);
        }
    }

    fn visit_split(&mut self, split: &SplitNode) -> bool {
        let label = split.label_name().map(str::to_string);
        let fork = self.add_node(SYNC_NODE, label, Vec::new());
        self.register_label(split.label_name(), fork);
        self.append(fork);
        self.frames.push(Frame::Split { fork, ends: Vec::new() });
        true
    }

    fn post_visit_split(&mut self, _split: &SplitNode) {
        if let Some(Frame::Split { ends, .. }) = self.frames.pop() {
            if let Some(Frame::Flow { dangling, .. }) = self.frames.last_mut() {
                *dangling = ends;
            }
        }
    }

    fn visit_app(&mut self, app: &TaskAppNode) -> bool {
        let label = app.label.as_ref().map(|l| l.label.clone());
        let id = self.add_node(&app.name, label.clone(), properties(app));
        self.register_label(label.as_deref(), id);
        self.append(id);
        self.current_app = Some(id);
        true
    }

    fn visit_transition(&mut self, transition: &TransitionNode) -> bool {
        let Some(from) = self.current_app else {
            return true;
        };
        let condition = transition.condition.clone();
        match &transition.target {
            TransitionTarget::Label(label) => self.jumps.push_back(Jump {
                from,
                condition,
                label: label.clone(),
            }),
            TransitionTarget::App(target) if target.name == END_TARGET || target.name == FAIL_TARGET => {
                let to = self.marker_node(&target.name);
                self.link(from, to, Some(condition));
            }
            TransitionTarget::App(target) => {
                let key = (
                    target.label.as_ref().map(|l| l.label.clone()),
                    target.name.clone(),
                    properties(target),
                );
                let to = match self.targets.get(&key) {
                    Some(&id) => id,
                    None => {
                        let id = self.add_node(&key.1, key.0.clone(), key.2.clone());
                        self.targets.insert(key, id);
                        if let Some(Frame::Flow { exits, .. }) = self.frames.last_mut() {
                            exits.push(id);
                        }
                        id
                    }
                };
                self.link(from, to, Some(condition));
            }
        }
        true
    }
}

// ============================================================================
// RENDERING
// ============================================================================

struct Renderer<'g> {
    graph: &'g Graph,
    /// Flow nodes already written; a revisit ends the flow.
    visited: HashSet<usize>,
    /// Sequence heads to write on their own lines.
    queued: Vec<usize>,
}

impl Renderer<'_> {
    /// Write the flow starting at `entries` up to (not including) `stop` or `END`.
    fn write_flow(&mut self, out: &mut String, mut entries: Vec<usize>, stop: Option<usize>) {
        let graph = self.graph;
        let mut first = true;
        loop {
            let id = match entries.as_slice() {
                [] => return,
                [id] => *id,
                _ => {
                    separate(out, &mut first);
                    entries = self.write_split(out, &entries).into_iter().collect();
                    continue;
                }
            };
            if Some(id) == stop {
                return;
            }
            let Some(node) = graph.node(id) else {
                return;
            };
            if node.name == END_NODE || !self.visited.insert(id) {
                return;
            }
            let successors = graph.successors(id);
            if node.is_sync() {
                if successors.len() > 1 {
                    separate(out, &mut first);
                    if let Some(label) = &node.label {
                        out.push_str(label);
                        out.push_str(": ");
                    }
                    entries = self.write_split(out, &successors).into_iter().collect();
                } else {
                    entries = successors;
                }
                continue;
            }
            separate(out, &mut first);
            self.write_app(out, node);
            entries = successors;
        }
    }

    /// Write `<branch || branch ...>` and return the node the branches join at.
    fn write_split(&mut self, out: &mut String, entries: &[usize]) -> Option<usize> {
        let join = self.graph.join_of(entries);
        out.push('<');
        for (i, &entry) in entries.iter().enumerate() {
            if i > 0 {
                out.push_str(" || ");
            }
            self.write_flow(out, vec![entry], join);
        }
        out.push('>');
        join
    }

    fn write_app(&mut self, out: &mut String, node: &Node) {
        write_plain_app(out, node);
        let graph = self.graph;
        for link in graph.transitions_from(node.id) {
            let Some(condition) = &link.transition else {
                continue;
            };
            let Some(target) = graph.node(link.to) else {
                continue;
            };
            out.push(' ');
            out.push_str(&condition_dsl(condition));
            out.push_str("->");
            self.write_target(out, target);
        }
    }

    fn write_target(&mut self, out: &mut String, target: &Node) {
        if target.is_marker() {
            out.push_str(&target.name);
            return;
        }
        let jump_label = match &target.label {
            Some(label) if self.graph.predecessors(target.id).next().is_some() => Some(label),
            Some(label) if self.graph.heads_sequence(target.id) => {
                if !self.queued.contains(&target.id) {
                    self.queued.push(target.id);
                }
                Some(label)
            }
            _ => None,
        };
        match jump_label {
            Some(label) => {
                out.push(':');
                out.push_str(label);
            }
            None => write_plain_app(out, target),
        }
    }
}

fn separate(out: &mut String, first: &mut bool) {
    if !*first {
        out.push_str(" && ");
    }
    *first = false;
}

fn write_plain_app(out: &mut String, node: &Node) {
    if let Some(label) = &node.label {
        out.push_str(label);
        out.push_str(": ");
    }
    out.push_str(&node.name);
    for (key, value) in &node.properties {
        out.push_str(" --");
        out.push_str(key);
        out.push('=');
        out.push_str(&quote_value(value));
    }
}
