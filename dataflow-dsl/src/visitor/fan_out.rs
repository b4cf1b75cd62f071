//! Maximum parallel fan-out of a task.

use super::TaskVisitor;
use crate::task::{SplitNode, TaskAppNode, TaskNode};

/// Largest number of apps started directly by any single split.
///
/// Each open split owns a counter; only apps at that split's immediate level
/// count towards it, so nested splits never inflate their parent. A task with
/// apps but no split has a fan-out of 1.
#[derive(Debug, Default)]
pub struct MaxFanOutVisitor {
    open_splits: Vec<usize>,
    max: usize,
}

impl MaxFanOutVisitor {
    pub fn max_fan_out(&self) -> usize {
        self.max
    }
}

impl TaskVisitor for MaxFanOutVisitor {
    fn visit_task(&mut self, _task: &TaskNode) -> bool {
        self.open_splits.clear();
        self.max = 0;
        true
    }

    fn visit_split(&mut self, _split: &SplitNode) -> bool {
        self.open_splits.push(0);
        true
    }

    fn post_visit_split(&mut self, _split: &SplitNode) {
        if let Some(count) = self.open_splits.pop() {
            self.max = self.max.max(count);
        }
    }

    fn visit_app(&mut self, _app: &TaskAppNode) -> bool {
        match self.open_splits.last_mut() {
            Some(count) => *count += 1,
            None => self.max = self.max.max(1),
        }
        true
    }
}

/// Convenience wrapper around [`MaxFanOutVisitor`].
pub fn max_fan_out(task: &TaskNode) -> usize {
    let mut visitor = MaxFanOutVisitor::default();
    super::walk_task(&mut visitor, task);
    visitor.max_fan_out()
}
