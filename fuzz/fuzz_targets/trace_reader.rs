#![no_main]

use libfuzzer_sys::fuzz_target;
use schedlens::analysis::TraceAnalysis;
use schedlens::config::AnalysisConfig;
use schedlens::trace_reader::parse_trace;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Parsing and analysis must reject bad traces with an error, never a panic
        if let Ok(events) = parse_trace(input) {
            let _ = TraceAnalysis::run(&events, &AnalysisConfig::default());
        }
    }
});
