//! State interval reconstruction
//!
//! The simulator only logs the instant a process changes state. This module
//! turns those point samples into closed-open spans `[start, end)` during
//! which a process held one state.
//!
//! # Algorithm
//!
//! ```text
//! PID 1:  READY@0      RUNNING@2          TERMINATED@5
//!         [READY 0,2)  [RUNNING 2,5)      (not extended)
//!
//! PID 2:  READY@1                      RUNNING@4 ........ horizon
//!         [READY 1,4)                  [RUNNING 4,horizon)
//! ```
//!
//! Each event is paired with the next event of the same PID. Same-tick pairs
//! have no observable duration and are dropped. The last event of a process
//! stays in effect until the horizon unless it is `TERMINATED`.

use crate::error::{Result, TraceError};
use crate::event::{Event, Pid, ProcessState, Tick};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A span during which one process held one scheduling state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub pid: Pid,
    pub state: ProcessState,
    pub start: Tick,
    pub end: Tick,
    /// Reason attached to the event that opened the span
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Interval {
    pub fn duration(&self) -> Tick {
        self.end - self.start
    }
}

/// Intervals of every process, each process owning its own ordered run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntervalSet {
    processes: BTreeMap<Pid, Vec<Interval>>,
    horizon: Tick,
}

impl IntervalSet {
    /// Tick at which still-open intervals were closed
    pub fn horizon(&self) -> Tick {
        self.horizon
    }

    /// Intervals of one process, ordered by start
    pub fn process(&self, pid: Pid) -> Option<&[Interval]> {
        self.processes.get(&pid).map(Vec::as_slice)
    }

    /// Processes in ascending PID order with their interval runs
    pub fn processes(&self) -> impl Iterator<Item = (Pid, &[Interval])> {
        self.processes
            .iter()
            .map(|(pid, intervals)| (*pid, intervals.as_slice()))
    }

    /// All intervals sorted by PID, then start
    pub fn iter(&self) -> impl Iterator<Item = &Interval> {
        self.processes.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.processes.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }
}

/// Horizon of a trace: last observed tick plus `padding`, or 0 when empty
pub fn trace_horizon(events: &[Event], padding: u64) -> Tick {
    events
        .iter()
        .map(|e| e.time)
        .max()
        .map_or(0, |last| last.saturating_add(padding))
}

/// Empty buffer with room for one sample per tick in `0..ticks`
///
/// Fails instead of aborting when the timeline cannot be addressed or
/// allocated.
pub(crate) fn tick_buffer<T>(ticks: Tick) -> Result<Vec<T>> {
    let len = usize::try_from(ticks).map_err(|_| {
        TraceError::malformed(format!("{} ticks exceed the addressable range", ticks))
    })?;
    let mut buffer = Vec::new();
    buffer.try_reserve_exact(len).map_err(|_| {
        TraceError::malformed(format!("cannot allocate a timeline of {} ticks", ticks))
    })?;
    Ok(buffer)
}

/// Builds an [`IntervalSet`] from the state events of a sorted stream
#[derive(Debug, Clone, Copy)]
pub struct IntervalBuilder {
    horizon: Tick,
    extend_to_horizon: bool,
}

impl IntervalBuilder {
    pub fn new(horizon: Tick) -> Self {
        Self {
            horizon,
            extend_to_horizon: true,
        }
    }

    /// Whether a live process's last state is extended to the horizon
    pub fn extend_to_horizon(mut self, extend: bool) -> Self {
        self.extend_to_horizon = extend;
        self
    }

    /// Reconstruct intervals from `events`
    ///
    /// Memory events are ignored. Events of one PID must be in time order;
    /// a step backwards is a `MalformedTrace`.
    pub fn build(&self, events: &[Event]) -> Result<IntervalSet> {
        let mut samples: BTreeMap<Pid, Vec<(Tick, ProcessState, Option<&str>)>> = BTreeMap::new();
        for event in events {
            if let Some(state) = event.state() {
                samples
                    .entry(event.pid)
                    .or_default()
                    .push((event.time, state, event.reason.as_deref()));
            }
        }

        let mut processes = BTreeMap::new();
        for (pid, samples) in samples {
            let intervals = self.build_process(pid, &samples)?;
            if !intervals.is_empty() {
                processes.insert(pid, intervals);
            }
        }

        let set = IntervalSet {
            processes,
            horizon: self.horizon,
        };
        tracing::debug!(
            processes = set.processes.len(),
            intervals = set.len(),
            horizon = self.horizon,
            "intervals built"
        );
        Ok(set)
    }

    fn build_process(
        &self,
        pid: Pid,
        samples: &[(Tick, ProcessState, Option<&str>)],
    ) -> Result<Vec<Interval>> {
        let mut intervals = Vec::with_capacity(samples.len());

        for pair in samples.windows(2) {
            let (start, state, reason) = pair[0];
            let (end, _, _) = pair[1];
            if end < start {
                return Err(TraceError::malformed(format!(
                    "PID {}: event at tick {} follows event at tick {}",
                    pid, end, start
                )));
            }
            if end > start {
                intervals.push(Interval {
                    pid,
                    state,
                    start,
                    end,
                    reason: reason.map(str::to_string),
                });
            }
        }

        if let Some(&(start, state, reason)) = samples.last() {
            if self.extend_to_horizon
                && state != ProcessState::Terminated
                && self.horizon > start
            {
                intervals.push(Interval {
                    pid,
                    state,
                    start,
                    end: self.horizon,
                    reason: reason.map(str::to_string),
                });
            }
        }

        Ok(intervals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::MemoryAction;

    fn state(time: Tick, pid: Pid, state: ProcessState) -> Event {
        Event::state_change(time, pid, state)
    }

    #[test]
    fn test_terminated_process_not_extended() {
        let events = vec![
            state(0, 1, ProcessState::Ready),
            state(2, 1, ProcessState::Running),
            state(5, 1, ProcessState::Terminated),
        ];
        let set = IntervalBuilder::new(trace_horizon(&events, 1))
            .build(&events)
            .unwrap();

        let p1 = set.process(1).unwrap();
        assert_eq!(p1.len(), 2);
        assert_eq!((p1[0].state, p1[0].start, p1[0].end), (ProcessState::Ready, 0, 2));
        assert_eq!(
            (p1[1].state, p1[1].start, p1[1].end),
            (ProcessState::Running, 2, 5)
        );
    }

    #[test]
    fn test_live_process_extends_to_horizon() {
        let events = vec![
            state(0, 1, ProcessState::Ready),
            state(3, 1, ProcessState::Running),
            state(9, 2, ProcessState::Ready),
        ];
        let set = IntervalBuilder::new(trace_horizon(&events, 1))
            .build(&events)
            .unwrap();

        assert_eq!(set.horizon(), 10);
        let p1 = set.process(1).unwrap();
        assert_eq!(p1.last().unwrap().end, 10);
        assert_eq!(p1.last().unwrap().duration(), 7);
    }

    #[test]
    fn test_single_event_gets_horizon_interval() {
        let events = vec![state(4, 7, ProcessState::Running)];
        let set = IntervalBuilder::new(5).build(&events).unwrap();
        let p7 = set.process(7).unwrap();
        assert_eq!(p7.len(), 1);
        assert_eq!((p7[0].start, p7[0].end), (4, 5));
    }

    #[test]
    fn test_single_terminated_event_yields_nothing() {
        let events = vec![state(4, 7, ProcessState::Terminated)];
        let set = IntervalBuilder::new(5).build(&events).unwrap();
        assert!(set.process(7).is_none());
        assert!(set.is_empty());
    }

    #[test]
    fn test_no_extension_when_disabled() {
        let events = vec![
            state(0, 1, ProcessState::Ready),
            state(3, 1, ProcessState::Running),
        ];
        let set = IntervalBuilder::new(10)
            .extend_to_horizon(false)
            .build(&events)
            .unwrap();
        let p1 = set.process(1).unwrap();
        assert_eq!(p1.len(), 1);
        assert_eq!(p1[0].end, 3);
    }

    #[test]
    fn test_zero_duration_dropped() {
        let events = vec![
            state(0, 1, ProcessState::New),
            state(0, 1, ProcessState::Ready),
            state(2, 1, ProcessState::Running),
            state(2, 1, ProcessState::Blocked),
            state(6, 1, ProcessState::Terminated),
        ];
        let set = IntervalBuilder::new(7).build(&events).unwrap();
        let states: Vec<_> = set.process(1).unwrap().iter().map(|i| i.state).collect();
        assert_eq!(states, vec![ProcessState::Ready, ProcessState::Blocked]);
    }

    #[test]
    fn test_reason_comes_from_opening_event() {
        let events = vec![
            state(0, 1, ProcessState::Blocked).with_reason("mutex"),
            state(4, 1, ProcessState::Ready).with_reason("unblocked"),
            state(5, 1, ProcessState::Terminated),
        ];
        let set = IntervalBuilder::new(6).build(&events).unwrap();
        let p1 = set.process(1).unwrap();
        assert_eq!(p1[0].reason.as_deref(), Some("mutex"));
        assert_eq!(p1[1].reason.as_deref(), Some("unblocked"));
    }

    #[test]
    fn test_backwards_time_is_malformed() {
        let events = vec![
            state(5, 1, ProcessState::Ready),
            state(3, 1, ProcessState::Running),
        ];
        let err = IntervalBuilder::new(6).build(&events).unwrap_err();
        assert!(matches!(err, TraceError::MalformedTrace(_)));
        assert!(err.to_string().contains("PID 1"));
    }

    #[test]
    fn test_memory_events_ignored() {
        let events = vec![
            state(0, 1, ProcessState::Ready),
            Event::memory(1, 1, MemoryAction::Alloc, 64),
            state(2, 1, ProcessState::Terminated),
        ];
        let set = IntervalBuilder::new(3).build(&events).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.process(1).unwrap()[0].end, 2);
    }

    #[test]
    fn test_iteration_sorted_by_pid_then_start() {
        let events = vec![
            state(0, 3, ProcessState::Ready),
            state(0, 1, ProcessState::Ready),
            state(1, 3, ProcessState::Running),
            state(2, 1, ProcessState::Running),
            state(4, 3, ProcessState::Terminated),
            state(4, 1, ProcessState::Terminated),
        ];
        let set = IntervalBuilder::new(5).build(&events).unwrap();
        let keys: Vec<(Pid, Tick)> = set.iter().map(|i| (i.pid, i.start)).collect();
        assert_eq!(keys, vec![(1, 0), (1, 2), (3, 0), (3, 1)]);
        let pids: Vec<Pid> = set.processes().map(|(pid, _)| pid).collect();
        assert_eq!(pids, vec![1, 3]);
    }

    #[test]
    fn test_empty_stream() {
        let set = IntervalBuilder::new(0).build(&[]).unwrap();
        assert!(set.is_empty());
        assert_eq!(set.len(), 0);
        assert_eq!(trace_horizon(&[], 1), 0);
    }

    #[test]
    fn test_horizon_saturates_at_last_tick() {
        let events = vec![state(u64::MAX, 1, ProcessState::Running)];
        assert_eq!(trace_horizon(&events, 1), u64::MAX);
    }

    #[test]
    fn test_tick_buffer_reserves_capacity() {
        let buffer: Vec<u64> = tick_buffer(16).unwrap();
        assert!(buffer.is_empty());
        assert!(buffer.capacity() >= 16);
    }

    #[test]
    fn test_tick_buffer_rejects_unallocatable_length() {
        let err = tick_buffer::<u64>(u64::MAX).unwrap_err();
        assert!(matches!(err, TraceError::MalformedTrace(_)));
    }

    #[test]
    fn test_rebuild_is_identical() {
        let events = vec![
            state(0, 1, ProcessState::Ready),
            state(1, 2, ProcessState::Ready),
            state(2, 1, ProcessState::Running),
            state(3, 2, ProcessState::Running),
        ];
        let builder = IntervalBuilder::new(trace_horizon(&events, 1));
        assert_eq!(builder.build(&events).unwrap(), builder.build(&events).unwrap());
    }
}
