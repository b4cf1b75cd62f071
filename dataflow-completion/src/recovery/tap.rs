//! Tap completion: `:stream.label` destinations and legacy `tap:stream:` channels.

use crate::context::CompletionContext;
use crate::error::CompletionError;
use crate::proposal::Proposal;
use dataflow_dsl::{DslMessage, ParseError};
use once_cell::sync::Lazy;
use regex::Regex;

const LEGACY_TAP_PREFIX: &str = "tap:stream:";

static DESTINATION_TAP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^:(?P<stream>[\w$-]*)(?:\.(?P<label>[\w$-]*))?$").expect("Invalid destination tap regex")
});

static LEGACY_TAP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^tap:stream:(?P<stream>[\w$-]*)(?:\.(?P<label>[\w$-]*))?$").expect("Invalid legacy tap regex")
});

// ============================================================================
// TRIGGERS
// ============================================================================

pub(crate) fn destination_triggers(prefix: &str, error: &ParseError) -> bool {
    matches!(
        error.message,
        DslMessage::EXPECTED_STREAM_NAME_AFTER_LABEL_COLON | DslMessage::OOD
    ) && DESTINATION_TAP.is_match(prefix)
}

/// Matches the full legacy shape, or any unfinished spelling of
/// `tap:stream:` from `tap:` on.
pub(crate) fn stream_triggers(prefix: &str, error: &ParseError) -> bool {
    matches!(
        error.message,
        DslMessage::EXPECTED_WHITESPACE_AFTER_LABEL_COLON | DslMessage::EXPECTED_APPNAME
    ) && (LEGACY_TAP.is_match(prefix) || (prefix.len() >= 4 && LEGACY_TAP_PREFIX.starts_with(prefix)))
}

// ============================================================================
// PROPOSALS
// ============================================================================

pub(crate) fn add_destination_proposals(
    prefix: &str,
    ctx: &CompletionContext<'_>,
    out: &mut Vec<Proposal>,
) -> Result<(), CompletionError> {
    if let Some(caps) = DESTINATION_TAP.captures(prefix) {
        let stream = caps.name("stream").map(|m| m.as_str()).unwrap_or("");
        let label = caps.name("label").map(|m| m.as_str());
        add_tap_proposals(":", stream, label, ctx, out)?;
    }
    Ok(())
}

pub(crate) fn add_stream_proposals(
    prefix: &str,
    ctx: &CompletionContext<'_>,
    out: &mut Vec<Proposal>,
) -> Result<(), CompletionError> {
    match LEGACY_TAP.captures(prefix) {
        Some(caps) => {
            let stream = caps.name("stream").map(|m| m.as_str()).unwrap_or("");
            let label = caps.name("label").map(|m| m.as_str());
            add_tap_proposals(LEGACY_TAP_PREFIX, stream, label, ctx, out)
        }
        None => {
            out.push(ctx.proposal(LEGACY_TAP_PREFIX, "Tap into the output of an existing stream."));
            Ok(())
        }
    }
}

/// Stream names starting with `stream` (unless a label part was typed), plus
/// `stream.label` for each app when `stream` names an existing stream.
fn add_tap_proposals(
    lead: &str,
    stream: &str,
    label: Option<&str>,
    ctx: &CompletionContext<'_>,
    out: &mut Vec<Proposal>,
) -> Result<(), CompletionError> {
    if label.is_none() {
        for definition in ctx.lookup.find_all_stream_definitions()? {
            if definition.name.starts_with(stream) {
                let description = definition.description.clone().unwrap_or_else(|| definition.dsl.clone());
                out.push(ctx.proposal(format!("{}{}", lead, definition.name), &description));
            }
        }
    }

    if stream.is_empty() {
        return Ok(());
    }
    let definition = match ctx.lookup.find_stream_definition(stream)? {
        Some(definition) => definition,
        None => return Ok(()),
    };
    let typed_label = label.unwrap_or("");
    for app in ctx.lookup.find_app_definitions(&definition)? {
        if app.label.starts_with(typed_label) {
            out.push(ctx.proposal(
                format!("{}{}.{}", lead, definition.name, app.label),
                &format!("Tap the output of {} app '{}' in stream '{}'.", app.app_type, app.name, definition.name),
            ));
        }
    }
    Ok(())
}
