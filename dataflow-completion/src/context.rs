//! Per-call state shared by every strategy.

use crate::proposal::{explanation, Proposal};
use dataflow_core::{AppRegistration, AppRegistry, AppType, CompletionConfig, LookupError, StreamDefinitionLookup};
use dataflow_dsl::StreamNode;

/// Borrowed collaborators and settings for one `complete` call.
///
/// Nothing here is cached: every lookup goes back to the collaborators.
pub struct CompletionContext<'a> {
    pub lookup: &'a dyn StreamDefinitionLookup,
    pub registry: &'a dyn AppRegistry,
    pub config: &'a CompletionConfig,
    pub detail_level: u32,
}

impl CompletionContext<'_> {
    pub fn proposal(&self, text: impl Into<String>, description: &str) -> Proposal {
        Proposal::new(text).with_explanation(explanation(description, self.detail_level))
    }

    /// Registration for `name` in `role`, else any registration with that name.
    pub fn registration(&self, name: &str, role: AppType) -> Result<Option<AppRegistration>, LookupError> {
        if let Some(registration) = self.registry.find(name, role)? {
            return Ok(Some(registration));
        }
        Ok(self.registry.find_all()?.into_iter().find(|r| r.name == name))
    }

    /// `name`, or `name{n}: name` when `name` is already taken as a label.
    /// `None` when every suffix up to `u32::MAX` is taken.
    pub fn auto_label(&self, name: &str, used: &[String]) -> Option<String> {
        if !used.iter().any(|u| u == name) {
            return Some(name.to_string());
        }
        let mut suffix = self.config.label_suffix_start;
        loop {
            let label = format!("{}{}", name, suffix);
            if !used.contains(&label) {
                return Some(format!("{}: {}", label, name));
            }
            suffix = suffix.checked_add(1)?;
        }
    }
}

/// Label names already in use in `stream`.
pub(crate) fn used_labels(stream: &StreamNode) -> Vec<String> {
    stream.apps.iter().map(|a| a.label_name().to_string()).collect()
}

/// App types that may be appended where a new app name is expected.
pub(crate) fn roles_for_next_app(stream: &StreamNode) -> &'static [AppType] {
    if stream.apps_unbound {
        &[AppType::Source, AppType::Processor, AppType::Sink, AppType::App]
    } else {
        &[AppType::Processor, AppType::Sink]
    }
}

/// App types valid for the last app of `stream`, judged by its position.
pub(crate) fn roles_for_last_app(stream: &StreamNode) -> &'static [AppType] {
    if stream.apps_unbound {
        &[AppType::Source, AppType::Processor, AppType::Sink, AppType::App]
    } else if stream.apps.len() == 1 && stream.source_channel.is_none() {
        &[AppType::Source]
    } else {
        &[AppType::Processor, AppType::Sink]
    }
}

/// Whether `prefix` ends in whitespace, i.e. the last element is finished.
pub(crate) fn ends_with_whitespace(prefix: &str) -> bool {
    prefix.chars().last().map(char::is_whitespace).unwrap_or(false)
}
