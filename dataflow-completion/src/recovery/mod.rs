//! Recovery strategies: proposals for prefixes that fail to parse
//!
//! Each strategy recognises one prefix shape together with the message code
//! the parser raises for it. Shapes are disjoint, so at most one strategy
//! matches a given failure; the provider stops at the first match and falls
//! back to [`fallback::add_proposals`] when none does.

pub mod fallback;
pub mod options;
pub mod tap;

use crate::context::CompletionContext;
use crate::error::CompletionError;
use crate::proposal::Proposal;
use dataflow_dsl::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryStrategy {
    /// `:` / `:stream` / `:stream.label`
    TapOnDestination,
    /// `tap:stream:` / `tap:stream:name` / `tap:stream:name.label`
    TapOnStream,
    /// `... app -`, `... app --`, `... app --partial`
    UnfinishedOptionName,
    /// `... app --option=`
    OptionValueHint,
}

impl RecoveryStrategy {
    /// Every strategy, in the order they are tried.
    pub const ALL: [RecoveryStrategy; 4] = [
        RecoveryStrategy::TapOnDestination,
        RecoveryStrategy::TapOnStream,
        RecoveryStrategy::UnfinishedOptionName,
        RecoveryStrategy::OptionValueHint,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            RecoveryStrategy::TapOnDestination => "tap-on-destination",
            RecoveryStrategy::TapOnStream => "tap-on-stream",
            RecoveryStrategy::UnfinishedOptionName => "unfinished-option-name",
            RecoveryStrategy::OptionValueHint => "option-value-hint",
        }
    }

    pub fn should_trigger(&self, prefix: &str, error: &ParseError) -> bool {
        match self {
            RecoveryStrategy::TapOnDestination => tap::destination_triggers(prefix, error),
            RecoveryStrategy::TapOnStream => tap::stream_triggers(prefix, error),
            RecoveryStrategy::UnfinishedOptionName => options::option_name_triggers(prefix, error),
            RecoveryStrategy::OptionValueHint => options::option_value_triggers(prefix, error),
        }
    }

    pub fn add_proposals(
        &self,
        prefix: &str,
        error: &ParseError,
        ctx: &CompletionContext<'_>,
        out: &mut Vec<Proposal>,
    ) -> Result<(), CompletionError> {
        match self {
            RecoveryStrategy::TapOnDestination => tap::add_destination_proposals(prefix, ctx, out),
            RecoveryStrategy::TapOnStream => tap::add_stream_proposals(prefix, ctx, out),
            RecoveryStrategy::UnfinishedOptionName => options::add_option_name_proposals(prefix, ctx, out),
            RecoveryStrategy::OptionValueHint => options::add_option_value_proposals(prefix, error, ctx, out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataflow_dsl::parse_stream;

    fn triggered(prefix: &str) -> Vec<&'static str> {
        let error = match parse_stream(prefix) {
            Ok(_) => return Vec::new(),
            Err(e) => e,
        };
        RecoveryStrategy::ALL
            .iter()
            .filter(|s| s.should_trigger(prefix, &error))
            .map(|s| s.name())
            .collect()
    }

    #[test]
    fn test_triggers_are_mutually_exclusive() {
        let cases = [
            (":", vec!["tap-on-destination"]),
            (":foo", vec!["tap-on-destination"]),
            (":foo.", vec!["tap-on-destination"]),
            ("tap:", vec!["tap-on-stream"]),
            ("tap:stream:", vec!["tap-on-stream"]),
            ("tap:stream:foo.t", vec!["tap-on-stream"]),
            ("http -", vec!["unfinished-option-name"]),
            ("http --", vec!["unfinished-option-name"]),
            ("http | filter --exp", vec!["unfinished-option-name"]),
            ("http --port=", vec!["option-value-hint"]),
            ("http |", vec![]),
            ("", vec![]),
        ];
        for (prefix, expected) in cases {
            assert_eq!(triggered(prefix), expected, "prefix {:?}", prefix);
        }
    }

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<_> = RecoveryStrategy::ALL.iter().map(|s| s.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), RecoveryStrategy::ALL.len());
    }
}
