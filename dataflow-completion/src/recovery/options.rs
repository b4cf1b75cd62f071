//! Option completion for prefixes cut off inside `--name=value`.

use crate::context::{roles_for_last_app, CompletionContext};
use crate::error::CompletionError;
use crate::proposal::Proposal;
use dataflow_core::{AppRegistration, AppType};
use dataflow_dsl::stream::AppNode;
use dataflow_dsl::{parse_stream, DslMessage, ParseError, StreamNode};
use once_cell::sync::Lazy;
use regex::Regex;

static UNFINISHED_OPTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<head>.*\S)\s+--?(?P<partial>[\w.-]*)$").expect("Invalid unfinished option regex")
});

static OPTION_WITHOUT_VALUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<head>.*\S)\s+--(?P<name>[\w.-]+)=$").expect("Invalid option value regex")
});

pub(crate) fn option_name_triggers(prefix: &str, error: &ParseError) -> bool {
    matches!(
        error.message,
        DslMessage::MISSING_CHARACTER | DslMessage::OOD | DslMessage::NOT_EXPECTED_TOKEN
    ) && UNFINISHED_OPTION.is_match(prefix)
}

pub(crate) fn option_value_triggers(prefix: &str, error: &ParseError) -> bool {
    error.message == DslMessage::EXPECTED_ARGUMENT_VALUE && OPTION_WITHOUT_VALUE.is_match(prefix)
}

/// Options of the last app not set yet, as `head --option=`.
pub(crate) fn add_option_name_proposals(
    prefix: &str,
    ctx: &CompletionContext<'_>,
    out: &mut Vec<Proposal>,
) -> Result<(), CompletionError> {
    let caps = match UNFINISHED_OPTION.captures(prefix) {
        Some(caps) => caps,
        None => return Ok(()),
    };
    let head = caps.name("head").map(|m| m.as_str()).unwrap_or("");
    let partial = caps.name("partial").map(|m| m.as_str()).unwrap_or("");
    let Some((app, registration)) = last_app_registration(head, ctx)? else {
        return Ok(());
    };
    for option in &registration.options {
        if option.name.starts_with(partial) && app.argument(&option.name).is_none() {
            out.push(ctx.proposal(format!("{} --{}=", head, option.name), &option.description));
        }
    }
    Ok(())
}

/// Value hints of the option being set, as `prefix{hint}`.
pub(crate) fn add_option_value_proposals(
    prefix: &str,
    error: &ParseError,
    ctx: &CompletionContext<'_>,
    out: &mut Vec<Proposal>,
) -> Result<(), CompletionError> {
    let caps = match OPTION_WITHOUT_VALUE.captures(prefix) {
        Some(caps) => caps,
        None => return Ok(()),
    };
    let head = caps.name("head").map(|m| m.as_str()).unwrap_or("");
    let name = caps.name("name").map(|m| m.as_str()).unwrap_or("");
    tracing::trace!(option = name, offset = error.offset, "completing option value");
    let Some((_, registration)) = last_app_registration(head, ctx)? else {
        return Ok(());
    };
    if let Some(option) = registration.option(name) {
        for hint in option.value_hints() {
            out.push(ctx.proposal(format!("{}{}", prefix, hint), &option.description));
        }
    }
    Ok(())
}

/// The last app of `head` (which must parse on its own) and its registration.
///
/// Nothing is returned when `head` ends in a sink channel: its last app is
/// already closed.
fn last_app_registration(
    head: &str,
    ctx: &CompletionContext<'_>,
) -> Result<Option<(AppNode, AppRegistration)>, CompletionError> {
    let stream: StreamNode = match parse_stream(head) {
        Ok(stream) => stream,
        Err(_) => return Ok(None),
    };
    if stream.sink_channel.is_some() || stream.is_bridge() {
        return Ok(None);
    }
    let Some(app) = stream.apps.last().cloned() else {
        return Ok(None);
    };
    let role = roles_for_last_app(&stream).first().copied().unwrap_or(AppType::App);
    Ok(ctx.registration(&app.name, role)?.map(|registration| (app, registration)))
}
