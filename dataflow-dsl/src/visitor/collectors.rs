//! Visitors that gather apps from a definition.

use super::{StreamVisitor, TaskVisitor};
use crate::stream::AppNode;
use crate::task::{TaskAppNode, TransitionNode, END_TARGET, FAIL_TARGET};

/// Every task app, in walk order, including apps named as transition
/// targets. The `$END` and `$FAIL` markers are not apps and are skipped.
#[derive(Debug, Default)]
pub struct TaskAppsCollector {
    apps: Vec<TaskAppNode>,
}

impl TaskAppsCollector {
    pub fn apps(&self) -> &[TaskAppNode] {
        &self.apps
    }

    pub fn into_apps(self) -> Vec<TaskAppNode> {
        self.apps
    }

    /// Distinct app names, first occurrence first.
    pub fn app_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for app in &self.apps {
            if !names.contains(&app.name.as_str()) {
                names.push(&app.name);
            }
        }
        names
    }
}

impl TaskVisitor for TaskAppsCollector {
    fn visit_app(&mut self, app: &TaskAppNode) -> bool {
        self.apps.push(app.clone());
        true
    }

    fn visit_transition(&mut self, transition: &TransitionNode) -> bool {
        if let Some(target) = transition.target_app() {
            if target.name != END_TARGET && target.name != FAIL_TARGET {
                self.apps.push(target.clone());
            }
        }
        true
    }
}

#[derive(Debug, Default)]
pub struct StreamAppsCollector {
    apps: Vec<AppNode>,
}

impl StreamAppsCollector {
    pub fn apps(&self) -> &[AppNode] {
        &self.apps
    }

    pub fn into_apps(self) -> Vec<AppNode> {
        self.apps
    }
}

impl StreamVisitor for StreamAppsCollector {
    fn visit_app(&mut self, app: &AppNode) -> bool {
        self.apps.push(app.clone());
        false
    }
}
