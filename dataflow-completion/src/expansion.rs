//! Expansion strategies: proposals for prefixes that already parse
//!
//! Every strategy looks at the last app of the parsed stream. Whether the
//! prefix ends in whitespace decides between finishing that app (name or
//! value still being typed) and starting the next element.

use crate::context::{ends_with_whitespace, roles_for_last_app, roles_for_next_app, used_labels, CompletionContext};
use crate::error::CompletionError;
use crate::proposal::Proposal;
use dataflow_core::AppType;
use dataflow_dsl::stream::AppNode;
use dataflow_dsl::StreamNode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpansionStrategy {
    /// `ht` → `http`
    UnfinishedAppName,
    /// `http` → `http --port=`
    AppOptions,
    /// `http ` → `http | log`
    PipeIntoOtherApps,
    /// `http --use.ssl=t` → `http --use.ssl=true`
    ValueHint,
}

impl ExpansionStrategy {
    pub const ALL: [ExpansionStrategy; 4] = [
        ExpansionStrategy::UnfinishedAppName,
        ExpansionStrategy::AppOptions,
        ExpansionStrategy::PipeIntoOtherApps,
        ExpansionStrategy::ValueHint,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ExpansionStrategy::UnfinishedAppName => "unfinished-app-name",
            ExpansionStrategy::AppOptions => "app-options",
            ExpansionStrategy::PipeIntoOtherApps => "pipe-into-other-apps",
            ExpansionStrategy::ValueHint => "value-hint",
        }
    }

    pub fn add_proposals(
        &self,
        prefix: &str,
        stream: &StreamNode,
        ctx: &CompletionContext<'_>,
        out: &mut Vec<Proposal>,
    ) -> Result<(), CompletionError> {
        let Some(last) = open_last_app(stream) else {
            return Ok(());
        };
        match self {
            ExpansionStrategy::UnfinishedAppName => unfinished_app_name(prefix, stream, last, ctx, out),
            ExpansionStrategy::AppOptions => app_options(prefix, stream, last, ctx, out),
            ExpansionStrategy::PipeIntoOtherApps => pipe_into_other_apps(prefix, stream, last, ctx, out),
            ExpansionStrategy::ValueHint => value_hint(prefix, stream, last, ctx, out),
        }
    }
}

/// The last app, unless a sink channel or a bridge already closes the stream.
fn open_last_app(stream: &StreamNode) -> Option<&AppNode> {
    if stream.sink_channel.is_some() || stream.is_bridge() {
        return None;
    }
    stream.apps.last()
}

fn last_app_role(stream: &StreamNode) -> AppType {
    roles_for_last_app(stream).first().copied().unwrap_or(AppType::App)
}

fn unfinished_app_name(
    prefix: &str,
    stream: &StreamNode,
    last: &AppNode,
    ctx: &CompletionContext<'_>,
    out: &mut Vec<Proposal>,
) -> Result<(), CompletionError> {
    if ends_with_whitespace(prefix) || !last.arguments.is_empty() || !prefix.ends_with(&last.name) {
        return Ok(());
    }
    let lead = &prefix[..prefix.len() - last.name.len()];
    for registration in ctx.registry.find_all_of(roles_for_last_app(stream))? {
        if registration.name.starts_with(&last.name) {
            out.push(ctx.proposal(format!("{}{}", lead, registration.name), &registration.description));
        }
    }
    Ok(())
}

fn app_options(
    prefix: &str,
    stream: &StreamNode,
    last: &AppNode,
    ctx: &CompletionContext<'_>,
    out: &mut Vec<Proposal>,
) -> Result<(), CompletionError> {
    let Some(registration) = ctx.registration(&last.name, last_app_role(stream))? else {
        return Ok(());
    };
    let head = prefix.trim_end();
    for option in &registration.options {
        if last.argument(&option.name).is_none() {
            out.push(ctx.proposal(format!("{} --{}=", head, option.name), &option.description));
        }
    }
    Ok(())
}

fn pipe_into_other_apps(
    prefix: &str,
    stream: &StreamNode,
    last: &AppNode,
    ctx: &CompletionContext<'_>,
    out: &mut Vec<Proposal>,
) -> Result<(), CompletionError> {
    if !ends_with_whitespace(prefix) || stream.apps_unbound {
        return Ok(());
    }
    let is_first_source = stream.apps.len() == 1 && stream.source_channel.is_none();
    let can_feed = ctx.registry.find(&last.name, AppType::Processor)?.is_some()
        || (is_first_source && ctx.registry.find(&last.name, AppType::Source)?.is_some());
    if !can_feed {
        return Ok(());
    }

    let used = used_labels(stream);
    let head = prefix.trim_end();
    for registration in ctx.registry.find_all_of(roles_for_next_app(stream))? {
        if let Some(app) = ctx.auto_label(&registration.name, &used) {
            out.push(ctx.proposal(format!("{} | {}", head, app), &registration.description));
        }
    }
    Ok(())
}

fn value_hint(
    prefix: &str,
    stream: &StreamNode,
    last: &AppNode,
    ctx: &CompletionContext<'_>,
    out: &mut Vec<Proposal>,
) -> Result<(), CompletionError> {
    if ends_with_whitespace(prefix) {
        return Ok(());
    }
    let Some(argument) = last.arguments.last() else {
        return Ok(());
    };
    if !prefix.ends_with(&format!("--{}={}", argument.name, argument.value)) {
        return Ok(());
    }
    let Some(registration) = ctx.registration(&last.name, last_app_role(stream))? else {
        return Ok(());
    };
    let Some(option) = registration.option(&argument.name) else {
        return Ok(());
    };
    let lead = &prefix[..prefix.len() - argument.value.len()];
    for hint in option.value_hints() {
        if hint.starts_with(&argument.value) {
            out.push(ctx.proposal(format!("{}{}", lead, hint), &option.description));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataflow_core::CompletionConfig;
    use dataflow_dsl::parse_stream;
    use dataflow_test_utils::fixtures::{app_registry, ticktock_streams};

    fn expand(strategy: ExpansionStrategy, prefix: &str) -> Vec<String> {
        let registry = app_registry();
        let streams = ticktock_streams();
        let config = CompletionConfig::default();
        let ctx = CompletionContext {
            lookup: &streams,
            registry: &registry,
            config: &config,
            detail_level: 0,
        };
        let stream = parse_stream(prefix).expect("prefix should parse");
        let mut out = Vec::new();
        strategy
            .add_proposals(prefix, &stream, &ctx, &mut out)
            .expect("strategy should succeed");
        out.into_iter().map(|p| p.text).collect()
    }

    #[test]
    fn test_unfinished_app_name_respects_position() {
        let proposals = expand(ExpansionStrategy::UnfinishedAppName, "h");
        assert!(proposals.contains(&"http".to_string()));
        assert!(proposals.contains(&"hdfs".to_string()));
        assert_eq!(expand(ExpansionStrategy::UnfinishedAppName, "ht"), vec!["http"]);
        let downstream = expand(ExpansionStrategy::UnfinishedAppName, "http | l");
        assert_eq!(downstream, vec!["http | log"]);
        assert!(expand(ExpansionStrategy::UnfinishedAppName, "http ").is_empty());
    }

    #[test]
    fn test_app_options_skip_set_options() {
        let proposals = expand(ExpansionStrategy::AppOptions, "http --port=80");
        assert_eq!(proposals, vec!["http --port=80 --use.ssl="]);
        assert!(expand(ExpansionStrategy::AppOptions, "http > :out").is_empty());
    }

    #[test]
    fn test_pipe_needs_trailing_whitespace() {
        assert!(expand(ExpansionStrategy::PipeIntoOtherApps, "http").is_empty());
        let proposals = expand(ExpansionStrategy::PipeIntoOtherApps, "http | filter ");
        assert!(proposals.contains(&"http | filter | log".to_string()));
        assert!(proposals.contains(&"http | filter | filter2: filter".to_string()));
        assert!(!proposals.iter().any(|p| p.ends_with("| http")));
    }

    #[test]
    fn test_sinks_do_not_pipe() {
        assert!(expand(ExpansionStrategy::PipeIntoOtherApps, "http | log ").is_empty());
    }

    #[test]
    fn test_value_hint_completes_partial_value() {
        assert_eq!(
            expand(ExpansionStrategy::ValueHint, "http --use.ssl=t"),
            vec!["http --use.ssl=true"]
        );
        assert!(expand(ExpansionStrategy::ValueHint, "http --use.ssl=x").is_empty());
    }
}
