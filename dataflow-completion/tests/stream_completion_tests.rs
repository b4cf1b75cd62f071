//! End-to-end completion behaviour against the ticktock fixtures.

use dataflow_completion::{Proposal, StreamCompletionProvider};
use dataflow_test_utils::assertions::{assert_not_proposes, assert_proposes};
use dataflow_test_utils::fixtures::{app_registry, ticktock_streams};
use dataflow_test_utils::{FailingLookup, FailingRegistry};
use std::sync::Arc;

fn provider() -> StreamCompletionProvider {
    StreamCompletionProvider::new(Arc::new(ticktock_streams()), Arc::new(app_registry()))
}

fn complete(prefix: &str) -> Vec<String> {
    provider().complete(prefix, 0).into_iter().map(|p| p.text).collect()
}

// ============================================================================
// APP NAMES
// ============================================================================

#[test]
fn test_empty_prefix_proposes_sources() {
    let proposals = complete("");
    assert_proposes(&proposals, "http");
    assert_proposes(&proposals, "hdfs");
    assert_not_proposes(&proposals, "log");
    assert_not_proposes(&proposals, "filter");
}

#[test]
fn test_unfinished_source_name() {
    let proposals = complete("h");
    assert_proposes(&proposals, "http");
    assert_proposes(&proposals, "hdfs");
    assert_eq!(complete("ht"), vec!["http"]);
}

#[test]
fn test_finished_app_is_not_relabelled() {
    assert_not_proposes(&complete("http"), "http2: http");
}

#[test]
fn test_after_pipe_proposes_processors_and_sinks() {
    let proposals = complete("http |");
    assert_proposes(&proposals, "http | filter");
    assert_proposes(&proposals, "http | log");
    assert_not_proposes(&proposals, "http | http");
}

#[test]
fn test_repeated_app_gets_label() {
    let proposals = complete("http | filter |");
    assert_proposes(&proposals, "http | filter | log");
    assert_proposes(&proposals, "http | filter | filter2: filter");
}

#[test]
fn test_after_source_channel() {
    for prefix in ["queue:foo >", "tap:stream:foo >"] {
        let proposals = complete(prefix);
        assert_proposes(&proposals, &format!("{} filter", prefix));
        assert_proposes(&proposals, &format!("{} log", prefix));
        assert_not_proposes(&proposals, &format!("{} http", prefix));
    }
}

#[test]
fn test_processor_with_trailing_space() {
    let proposals = complete("http | filter ");
    assert_proposes(&proposals, "http | filter | log");
    assert_proposes(&proposals, "http | filter --expression=");
    assert_proposes(&proposals, "http | filter --expresso=");
    assert_not_proposes(&proposals, "http | filter | http");
}

// ============================================================================
// OPTIONS
// ============================================================================

#[test]
fn test_options_of_last_app() {
    for prefix in ["http | filter", "http | filter -", "http | filter --"] {
        let proposals = complete(prefix);
        assert_proposes(&proposals, "http | filter --expression=");
        assert_proposes(&proposals, "http | filter --expresso=");
    }
}

#[test]
fn test_partial_option_name() {
    assert_eq!(complete("http --p"), vec!["http --port="]);
}

#[test]
fn test_option_value_hints() {
    let proposals = complete("http --use.ssl=");
    assert_proposes(&proposals, "http --use.ssl=true");
    assert_proposes(&proposals, "http --use.ssl=false");

    let proposals = complete("http | filter --expresso=");
    assert_proposes(&proposals, "http | filter --expresso=SINGLE");
    assert_proposes(&proposals, "http | filter --expresso=DOUBLE");
}

#[test]
fn test_nothing_left_to_propose() {
    assert!(complete("http --port=1234 --use.ssl=true").is_empty());
    assert!(complete("http --port=").is_empty());
}

#[test]
fn test_unrecognized_input_yields_nothing() {
    for prefix in [
        "foo",
        "foo --",
        "http --notavalidoption",
        "http --notavalidoption=",
        "foo --some-option",
        "foo --some-option=",
        "foo --some-option=prefix",
        "http | filter --expression=something --expresso=not-a-valid-prefix",
    ] {
        assert!(complete(prefix).is_empty(), "prefix {:?}", prefix);
    }
}

// ============================================================================
// TAPS
// ============================================================================

#[test]
fn test_legacy_tap_proposes_streams() {
    let proposals = complete("tap:stream:");
    assert_proposes(&proposals, "tap:stream:ticktock");
    assert_proposes(&proposals, "tap:stream:foo");
}

#[test]
fn test_unfinished_tap_prefix() {
    assert_eq!(complete("tap:st"), vec!["tap:stream:"]);
}

#[test]
fn test_legacy_tap_proposes_labels() {
    let proposals = complete("tap:stream:ticktock");
    assert_proposes(&proposals, "tap:stream:ticktock.time");
    assert_proposes(&proposals, "tap:stream:ticktock.log");
}

#[test]
fn test_partial_stream_name_proposes_streams_only() {
    let proposals = complete("tap:stream:tick");
    assert_eq!(proposals, vec!["tap:stream:ticktock"]);
}

#[test]
fn test_destination_tap() {
    let proposals = complete(":");
    assert_proposes(&proposals, ":foo");
    assert_proposes(&proposals, ":bar");

    for prefix in [":foo", ":foo."] {
        let proposals = complete(prefix);
        assert_proposes(&proposals, ":foo.time");
        assert_proposes(&proposals, ":foo.transform");
    }
}

#[test]
fn test_destination_tap_label_prefix() {
    assert_eq!(complete(":foo.tr"), vec![":foo.transform"]);
}

// ============================================================================
// RANKING AND DETAIL
// ============================================================================

#[test]
fn test_results_ranked_and_unique() {
    let proposals = complete("http | filter ");
    let mut sorted = proposals.clone();
    sorted.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
    sorted.dedup();
    assert_eq!(proposals, sorted);
    assert_not_proposes(&proposals, "http | filter ");
}

#[test]
fn test_detail_level_controls_explanations() {
    let provider = provider();
    let find = |proposals: Vec<Proposal>| proposals.into_iter().find(|p| p.text == "http");

    let none = find(provider.complete("", 0)).expect("http proposal");
    assert_eq!(none.explanation, None);

    let short = find(provider.complete("", 1)).expect("http proposal");
    assert_eq!(short.explanation.as_deref(), Some("Receives HTTP requests."));

    let full = find(provider.complete("", 2)).expect("http proposal");
    assert_eq!(
        full.explanation.as_deref(),
        Some("Receives HTTP requests. Listens on the configured port.")
    );
}

// ============================================================================
// FAILING COLLABORATORS
// ============================================================================

#[test]
fn test_lookup_failure_degrades_to_no_proposals() {
    let provider = StreamCompletionProvider::new(Arc::new(FailingLookup), Arc::new(app_registry()));
    assert!(provider.complete("tap:stream:", 0).is_empty());
    assert!(provider.complete(":foo", 0).is_empty());
    assert_proposes(
        &provider.complete("http |", 0).into_iter().map(|p| p.text).collect::<Vec<_>>(),
        "http | log",
    );
}

#[test]
fn test_registry_failure_degrades_to_no_proposals() {
    let provider = StreamCompletionProvider::new(Arc::new(ticktock_streams()), Arc::new(FailingRegistry));
    assert!(provider.complete("", 0).is_empty());
    assert!(provider.complete("http | filter ", 0).is_empty());
    assert!(!provider.complete(":", 0).is_empty());
}
