//! Task completion provider
//!
//! Task definitions are short and the task grammar has few positions where an
//! app may start, so this works on tokens rather than on parse errors.

use crate::error::CompletionError;
use crate::proposal::{explanation, rank, Proposal};
use crate::strategy_names;
use dataflow_core::{AppRegistration, AppRegistry, AppType, CompletionConfig};
use dataflow_dsl::{tokenize, Token, TokenKind};
use std::sync::Arc;

/// Proposes task app names where the task grammar expects one.
pub struct TaskCompletionProvider {
    registry: Arc<dyn AppRegistry>,
    config: CompletionConfig,
}

impl TaskCompletionProvider {
    pub fn new(registry: Arc<dyn AppRegistry>) -> Self {
        Self {
            registry,
            config: CompletionConfig::default(),
        }
    }

    /// Use `config` for ranking and proposal limits. The config type is
    /// shared with [`crate::StreamCompletionProvider`], so disabled strategy
    /// names are checked against the stream strategies too, but they have no
    /// effect on task completion.
    pub fn with_config(mut self, config: CompletionConfig) -> Result<Self, CompletionError> {
        config.validate()?;
        let known = strategy_names();
        if let Some(name) = config.disabled_strategies.iter().find(|n| !known.contains(&n.as_str())) {
            return Err(CompletionError::UnknownStrategy { name: name.clone() });
        }
        self.config = config;
        Ok(self)
    }

    pub fn complete(&self, prefix: &str, detail_level: u32) -> Vec<Proposal> {
        match self.proposals(prefix, detail_level) {
            Ok(proposals) => rank(prefix, proposals, self.config.max_proposals),
            Err(e) => {
                tracing::warn!(error = %e, "Task completion failed");
                Vec::new()
            }
        }
    }

    fn proposals(&self, prefix: &str, detail_level: u32) -> Result<Vec<Proposal>, CompletionError> {
        let tokens = match tokenize(prefix) {
            Ok(tokens) => tokens,
            Err(e) => {
                tracing::debug!(code = e.code(), offset = e.offset, "task prefix does not tokenize");
                return Ok(Vec::new());
            }
        };
        let tokens: Vec<&Token> = tokens.iter().filter(|t| !t.is(&TokenKind::Eof)).collect();
        let apps = self.registry.find_all_of(&[AppType::Task])?;

        let mut out = Vec::new();
        match tokens.split_last() {
            None => push_all(&apps, "", "", detail_level, &mut out),
            Some((last, before)) => {
                if let Some(separator) = separator_after(&last.kind) {
                    push_all(&apps, prefix.trim_end(), separator, detail_level, &mut out);
                } else if let TokenKind::Identifier(partial) = &last.kind {
                    if last.span.end == prefix.len() && starts_app(before) {
                        let lead = &prefix[..last.span.start];
                        for app in apps.iter().filter(|a| a.name.starts_with(partial.as_str())) {
                            out.push(proposal(format!("{}{}", lead, app.name), app, detail_level));
                        }
                    }
                }
            }
        }
        Ok(out)
    }
}

/// Text placed between the prefix and a proposed app after `kind`, when an
/// app may follow it.
fn separator_after(kind: &TokenKind) -> Option<&'static str> {
    match kind {
        TokenKind::AndAnd | TokenKind::DoublePipe => Some(" "),
        TokenKind::Lt | TokenKind::Arrow | TokenKind::LParen => Some(""),
        _ => None,
    }
}

/// Whether an identifier following `before` is an app name, not a label
/// reference (`->:label`) or an argument.
fn starts_app(before: &[&Token]) -> bool {
    match before.split_last() {
        None => true,
        Some((prev, rest)) => match prev.kind {
            TokenKind::Colon => !matches!(rest.last().map(|t| &t.kind), Some(TokenKind::Arrow)),
            ref kind => separator_after(kind).is_some(),
        },
    }
}

fn push_all(apps: &[AppRegistration], head: &str, separator: &str, detail_level: u32, out: &mut Vec<Proposal>) {
    for app in apps {
        out.push(proposal(format!("{}{}{}", head, separator, app.name), app, detail_level));
    }
}

fn proposal(text: String, app: &AppRegistration, detail_level: u32) -> Proposal {
    Proposal::new(text).with_explanation(explanation(&app.description, detail_level))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataflow_test_utils::fixtures::app_registry;

    fn complete(prefix: &str) -> Vec<String> {
        TaskCompletionProvider::new(Arc::new(app_registry()))
            .complete(prefix, 0)
            .into_iter()
            .map(|p| p.text)
            .collect()
    }

    #[test]
    fn test_stream_strategy_names_do_not_change_task_proposals() {
        let config = CompletionConfig {
            disabled_strategies: strategy_names().iter().map(|n| n.to_string()).collect(),
            ..CompletionConfig::default()
        };
        let provider = TaskCompletionProvider::new(Arc::new(app_registry()))
            .with_config(config)
            .unwrap();
        let texts: Vec<String> = provider.complete("a && ex", 0).into_iter().map(|p| p.text).collect();
        assert_eq!(texts, vec!["a && extract"]);
    }

    #[test]
    fn test_unknown_strategy_name_rejected() {
        let config = CompletionConfig {
            disabled_strategies: vec!["no-such-strategy".to_string()],
            ..CompletionConfig::default()
        };
        let result = TaskCompletionProvider::new(Arc::new(app_registry())).with_config(config);
        assert!(matches!(result, Err(CompletionError::UnknownStrategy { name }) if name == "no-such-strategy"));
    }

    #[test]
    fn test_empty_prefix_proposes_task_apps_only() {
        let proposals = complete("");
        assert!(proposals.contains(&"timestamp".to_string()));
        assert!(proposals.contains(&"extract".to_string()));
        assert!(!proposals.contains(&"http".to_string()));
    }

    #[test]
    fn test_after_operators() {
        assert!(complete("timestamp && ").contains(&"timestamp && extract".to_string()));
        assert!(complete("timestamp &&").contains(&"timestamp && extract".to_string()));
        assert!(complete("<a || ").contains(&"<a || load".to_string()));
        assert!(complete("<").contains(&"<load".to_string()));
        assert!(complete("a 'FAILED'->").contains(&"a 'FAILED'->load".to_string()));
    }

    #[test]
    fn test_unfinished_app_name() {
        assert_eq!(complete("ti"), vec!["timestamp", "timestamp-batch"]);
        assert_eq!(complete("a && ex"), vec!["a && extract"]);
        assert_eq!(complete("job: lo"), vec!["job: load"]);
    }

    #[test]
    fn test_no_proposals_where_no_app_fits() {
        assert!(complete("a ").is_empty());
        assert!(complete("a 0->:cl").is_empty());
        assert!(complete("a --lo").is_empty());
        assert!(complete("zzz").is_empty());
    }
}
