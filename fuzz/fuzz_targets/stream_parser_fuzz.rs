//! Fuzz test for the stream parser and printer
//!
//! Run with: cargo +nightly fuzz run stream_parser_fuzz -- -max_total_time=60

#![no_main]

use dataflow_dsl::{parse_stream, pretty_printer};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        match parse_stream(input) {
            Ok(stream) => {
                // Anything that parses must print to text that parses back
                let printed = pretty_printer::print_stream(&stream);
                let reparsed = parse_stream(&printed).expect("printed stream should parse");
                assert!(stream.same_shape(&reparsed), "Round trip changed {:?}", printed);
            }
            Err(err) => {
                assert!(err.offset <= input.len(), "Error offset should stay inside the source");
                assert!(err.line() >= 1);
                let _ = err.to_string();
            }
        }
    }
});
