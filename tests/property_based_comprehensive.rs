//! Property-based tests for the trace derivations
//!
//! Random traces are generated per process in time order, then merged and
//! stably sorted the way the reader sorts them. Properties checked:
//! 1. Intervals of a process never overlap
//! 2. Intervals cover a process's lifetime without gaps
//! 3. Rebuilding from the same stream is deterministic
//! 4. The memory curve never goes negative and never exceeds total allocations
//! 5. execution + waiting + blocked never exceeds turnaround
//! 6. Handoffs never exceed RUNNING entries

use proptest::prelude::*;
use schedlens::analysis::TraceAnalysis;
use schedlens::config::{AnalysisConfig, ContextSwitchPolicy};
use schedlens::context_switch::count_context_switches;
use schedlens::event::{sort_stream, Event, MemoryAction, ProcessState};
use schedlens::intervals::{trace_horizon, IntervalBuilder};
use schedlens::memory::reconstruct_memory_curve;

fn live_state() -> impl Strategy<Value = ProcessState> {
    prop::sample::select(vec![
        ProcessState::New,
        ProcessState::Ready,
        ProcessState::Running,
        ProcessState::Blocked,
    ])
}

/// Up to 4 processes, each with up to 12 state changes at non-decreasing
/// ticks, optionally ending in TERMINATED
fn state_trace() -> impl Strategy<Value = Vec<Event>> {
    prop::collection::vec(
        (
            prop::collection::vec((0u64..5, live_state()), 1..12),
            prop::option::of(0u64..5),
        ),
        1..4,
    )
    .prop_map(|processes| {
        let mut events = Vec::new();
        for (pid, (steps, terminate_after)) in processes.into_iter().enumerate() {
            let pid = pid as i64 + 1;
            let mut time = 0;
            for (gap, state) in steps {
                time += gap;
                events.push(Event::state_change(time, pid, state));
            }
            if let Some(gap) = terminate_after {
                events.push(Event::state_change(time + gap, pid, ProcessState::Terminated));
            }
        }
        sort_stream(&mut events);
        events
    })
}

fn memory_trace() -> impl Strategy<Value = Vec<Event>> {
    prop::collection::vec((0u64..50, any::<bool>(), 0u64..1_000), 0..30).prop_map(|raw| {
        let mut events: Vec<Event> = raw
            .into_iter()
            .map(|(time, is_alloc, bytes)| {
                let action = if is_alloc {
                    MemoryAction::Alloc
                } else {
                    MemoryAction::Free
                };
                Event::memory(time, 1, action, bytes)
            })
            .collect();
        sort_stream(&mut events);
        events
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_intervals_never_overlap(events in state_trace()) {
        let set = IntervalBuilder::new(trace_horizon(&events, 1)).build(&events).unwrap();
        for (_, run) in set.processes() {
            for pair in run.windows(2) {
                prop_assert!(pair[0].end <= pair[1].start);
            }
            for interval in run {
                prop_assert!(interval.start < interval.end);
            }
        }
    }

    #[test]
    fn prop_intervals_cover_lifetime(events in state_trace()) {
        let horizon = trace_horizon(&events, 1);
        let set = IntervalBuilder::new(horizon).build(&events).unwrap();

        for (pid, run) in set.processes() {
            let own: Vec<&Event> = events.iter().filter(|e| e.pid == pid).collect();
            let first = own.first().unwrap().time;
            let last = own.last().unwrap();
            let expected_end = if last.state() == Some(ProcessState::Terminated) {
                last.time
            } else {
                horizon
            };

            prop_assert_eq!(run.first().unwrap().start, first);
            prop_assert_eq!(run.last().unwrap().end, expected_end);
            for pair in run.windows(2) {
                prop_assert_eq!(pair[0].end, pair[1].start);
            }
        }
    }

    #[test]
    fn prop_rebuild_is_deterministic(events in state_trace()) {
        let builder = IntervalBuilder::new(trace_horizon(&events, 1));
        prop_assert_eq!(builder.build(&events).unwrap(), builder.build(&events).unwrap());

        let config = AnalysisConfig::default();
        prop_assert_eq!(
            TraceAnalysis::run(&events, &config).unwrap(),
            TraceAnalysis::run(&events, &config).unwrap()
        );
    }

    #[test]
    fn prop_memory_curve_bounded(events in memory_trace(), max_time in 0u64..60) {
        let curve = reconstruct_memory_curve(&events, max_time).unwrap();
        let allocated: u64 = events
            .iter()
            .filter(|e| e.memory_action() == Some(MemoryAction::Alloc))
            .map(Event::memory_size)
            .sum();

        prop_assert_eq!(curve.len() as u64, max_time + 1);
        prop_assert!(curve.as_slice().iter().all(|&bytes| bytes <= allocated));
    }

    #[test]
    fn prop_stats_fit_in_turnaround(events in state_trace()) {
        let analysis = TraceAnalysis::run(&events, &AnalysisConfig::default()).unwrap();
        for s in analysis.stats.iter() {
            prop_assert!(s.execution + s.waiting + s.blocked <= s.turnaround);
            prop_assert!(s.start <= s.end);
            if let Some(response) = s.response {
                prop_assert!(response <= s.turnaround);
            }
        }
    }

    #[test]
    fn prop_handoffs_bounded_by_entries(events in state_trace()) {
        let set = IntervalBuilder::new(trace_horizon(&events, 1)).build(&events).unwrap();
        let entries = count_context_switches(&set, ContextSwitchPolicy::RunningEntries);
        let handoffs = count_context_switches(&set, ContextSwitchPolicy::Handoffs);
        prop_assert!(handoffs <= entries);
    }
}
