//! Generic proposals when no recovery strategy recognises the prefix.
//!
//! Only a missing app name at the very end of the input is handled: the text
//! before it tells which app types fit. Every other failure yields nothing.

use crate::context::{used_labels, CompletionContext};
use crate::error::CompletionError;
use crate::proposal::Proposal;
use dataflow_core::AppType;
use dataflow_dsl::{parse_stream, DslMessage, ParseError};

const SOURCES: &[AppType] = &[AppType::Source];
const DOWNSTREAM: &[AppType] = &[AppType::Processor, AppType::Sink];
const UNBOUND: &[AppType] = &[AppType::Source, AppType::Processor, AppType::Sink, AppType::App];

pub fn add_proposals(
    prefix: &str,
    error: &ParseError,
    ctx: &CompletionContext<'_>,
    out: &mut Vec<Proposal>,
) -> Result<(), CompletionError> {
    if error.message != DslMessage::EXPECTED_APPNAME || error.offset < prefix.len() {
        return Ok(());
    }

    let head = prefix.trim_end();
    let (roles, upstream) = if head.is_empty() {
        (SOURCES, "")
    } else if let Some(upstream) = head.strip_suffix("||") {
        (UNBOUND, upstream)
    } else if let Some(upstream) = head.strip_suffix('|') {
        (DOWNSTREAM, upstream)
    } else if let Some(upstream) = head.strip_suffix('>') {
        (DOWNSTREAM, upstream)
    } else {
        return Ok(());
    };

    let used = match parse_stream(upstream.trim_end()) {
        Ok(stream) => used_labels(&stream),
        Err(_) => Vec::new(),
    };
    for registration in ctx.registry.find_all_of(roles)? {
        let Some(app) = ctx.auto_label(&registration.name, &used) else {
            continue;
        };
        let text = if head.is_empty() { app } else { format!("{} {}", head, app) };
        out.push(ctx.proposal(text, &registration.description));
    }
    Ok(())
}
