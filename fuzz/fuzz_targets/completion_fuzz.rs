//! Fuzz test for stream and task completion
//!
//! Run with: cargo +nightly fuzz run completion_fuzz -- -max_total_time=60

#![no_main]

use dataflow_completion::{StreamCompletionProvider, TaskCompletionProvider};
use dataflow_test_utils::fixtures::{app_registry, ticktock_streams};
use libfuzzer_sys::fuzz_target;
use std::sync::Arc;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        let streams = StreamCompletionProvider::new(Arc::new(ticktock_streams()), Arc::new(app_registry()));
        for proposal in streams.complete(input, 2) {
            assert_ne!(proposal.text, input, "A proposal should never echo the prefix");
        }

        let tasks = TaskCompletionProvider::new(Arc::new(app_registry()));
        let _ = tasks.complete(input, 1);
    }
});
