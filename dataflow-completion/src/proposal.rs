//! Completion proposals and their final ordering.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One candidate continuation: the full text that would replace the prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl Proposal {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            explanation: None,
        }
    }

    pub fn with_explanation(mut self, explanation: Option<String>) -> Self {
        self.explanation = explanation;
        self
    }
}

/// Explanation text for `detail_level`: nothing at 0, the first sentence at
/// 1, the whole description from 2 up.
pub fn explanation(description: &str, detail_level: u32) -> Option<String> {
    let description = description.trim();
    if detail_level == 0 || description.is_empty() {
        return None;
    }
    if detail_level >= 2 {
        return Some(description.to_string());
    }
    let first = match description.find(". ") {
        Some(end) => &description[..=end],
        None => description,
    };
    Some(first.to_string())
}

/// Drop duplicates and echoes of `prefix`, order shortest first then
/// lexicographically, and keep at most `max`.
pub(crate) fn rank(prefix: &str, proposals: Vec<Proposal>, max: usize) -> Vec<Proposal> {
    let mut seen = HashSet::new();
    let mut ranked: Vec<Proposal> = proposals
        .into_iter()
        .filter(|p| p.text != prefix && seen.insert(p.text.clone()))
        .collect();
    ranked.sort_by(|a, b| a.text.len().cmp(&b.text.len()).then_with(|| a.text.cmp(&b.text)));
    ranked.truncate(max);
    ranked
}
