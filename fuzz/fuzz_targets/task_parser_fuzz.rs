//! Fuzz test for the task parser and validator
//!
//! Run with: cargo +nightly fuzz run task_parser_fuzz -- -max_total_time=60

#![no_main]

use dataflow_dsl::{parse_task, pretty_printer, visitor};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        match parse_task(input) {
            Ok(task) => {
                assert!(visitor::max_fan_out(&task) >= 1, "A parsed task has at least one app");
                let printed = pretty_printer::print_task(&task);
                assert!(parse_task(&printed).is_ok(), "Printed task should parse: {:?}", printed);
            }
            Err(err) => {
                assert!(err.offset <= input.len(), "Error offset should stay inside the source");
                let _ = err.to_string();
            }
        }
    }
});
