//! Per-process scheduling metrics
//!
//! Derived from the interval set of each process:
//!
//! | metric     | definition                                         |
//! |------------|----------------------------------------------------|
//! | execution  | ticks spent RUNNING                                |
//! | waiting    | ticks spent READY                                  |
//! | blocked    | ticks spent BLOCKED                                |
//! | response   | first RUNNING start minus first READY start        |
//! | turnaround | end minus start (end = termination or trace end)   |
//!
//! Summary averages divide exact integer totals, so they stay exact for
//! lifetimes far beyond what an `f32` can hold.

use crate::event::{Pid, ProcessState, Tick};
use crate::intervals::{Interval, IntervalSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{self, Write};

/// Metrics for a single process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessStats {
    pub pid: Pid,
    pub start: Tick,
    pub end: Tick,
    /// `None` when the process was never READY before it first ran
    pub response: Option<Tick>,
    pub waiting: Tick,
    pub blocked: Tick,
    pub execution: Tick,
    pub turnaround: Tick,
}

impl ProcessStats {
    /// Ticks inside the lifetime not spent READY, RUNNING or BLOCKED
    pub fn idle(&self) -> Tick {
        self.turnaround
            .saturating_sub(self.waiting + self.blocked + self.execution)
    }
}

/// Compute metrics for one process; `None` if it has no intervals
pub fn compute_process_stats(pid: Pid, intervals: &[Interval]) -> Option<ProcessStats> {
    let start = intervals.iter().map(|i| i.start).min()?;

    let terminated_end = intervals
        .iter()
        .filter(|i| i.state == ProcessState::Terminated)
        .map(|i| i.end)
        .max();
    let end = terminated_end.or_else(|| intervals.iter().map(|i| i.end).max())?;

    let time_in = |state: ProcessState| -> Tick {
        intervals
            .iter()
            .filter(|i| i.state == state)
            .map(Interval::duration)
            .sum()
    };
    let first_start = |state: ProcessState| {
        intervals
            .iter()
            .filter(|i| i.state == state)
            .map(|i| i.start)
            .min()
    };

    let response = match (first_start(ProcessState::Ready), first_start(ProcessState::Running)) {
        (Some(ready), Some(running)) if running >= ready => Some(running - ready),
        _ => None,
    };

    Some(ProcessStats {
        pid,
        start,
        end,
        response,
        waiting: time_in(ProcessState::Ready),
        blocked: time_in(ProcessState::Blocked),
        execution: time_in(ProcessState::Running),
        turnaround: end.saturating_sub(start),
    })
}

/// Averages across all processes of a trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSummary {
    pub processes: usize,
    /// Processes with a defined response time
    pub responded: usize,
    pub avg_response: Option<f64>,
    pub avg_waiting: f64,
    pub avg_blocked: f64,
    pub avg_execution: f64,
    pub avg_turnaround: f64,
    pub total_execution: Tick,
}

impl StatsSummary {
    /// Averages over `stats`; every average is 0.0 for an empty input
    pub fn from_stats<'a>(stats: impl IntoIterator<Item = &'a ProcessStats>) -> Self {
        let mut processes = 0;
        let mut responded = 0;
        let (mut response, mut waiting, mut blocked) = (0u128, 0u128, 0u128);
        let (mut execution, mut turnaround) = (0u128, 0u128);

        for s in stats {
            processes += 1;
            if let Some(r) = s.response {
                responded += 1;
                response += u128::from(r);
            }
            waiting += u128::from(s.waiting);
            blocked += u128::from(s.blocked);
            execution += u128::from(s.execution);
            turnaround += u128::from(s.turnaround);
        }

        Self {
            processes,
            responded,
            avg_response: (responded > 0).then(|| mean(response, responded)),
            avg_waiting: mean(waiting, processes),
            avg_blocked: mean(blocked, processes),
            avg_execution: mean(execution, processes),
            avg_turnaround: mean(turnaround, processes),
            total_execution: Tick::try_from(execution).unwrap_or(Tick::MAX),
        }
    }
}

/// Metrics of every observed process, keyed by PID
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsTable {
    stats: BTreeMap<Pid, ProcessStats>,
}

impl StatsTable {
    /// Derive metrics for every process of `intervals`
    pub fn from_intervals(intervals: &IntervalSet) -> Self {
        let stats = intervals
            .processes()
            .filter_map(|(pid, run)| compute_process_stats(pid, run).map(|s| (pid, s)))
            .collect();
        Self { stats }
    }

    pub fn get(&self, pid: Pid) -> Option<&ProcessStats> {
        self.stats.get(&pid)
    }

    /// Stats in ascending PID order
    pub fn iter(&self) -> impl Iterator<Item = &ProcessStats> {
        self.stats.values()
    }

    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    /// Averages across every process of the trace
    pub fn summary(&self) -> StatsSummary {
        StatsSummary::from_stats(self.stats.values())
    }

    /// Write the per-process table, limited to `pids` when non-empty
    ///
    /// The closing `avg` row averages the rows printed above it.
    pub fn write_table<W: Write>(&self, out: &mut W, pids: &[Pid]) -> io::Result<()> {
        if self.stats.is_empty() {
            writeln!(out, "No processes traced.")?;
            return Ok(());
        }

        let selected: Vec<&ProcessStats> = self
            .stats
            .values()
            .filter(|s| pids.is_empty() || pids.contains(&s.pid))
            .collect();
        if selected.is_empty() {
            writeln!(out, "No traced process matches the PID filter.")?;
            return Ok(());
        }

        writeln!(
            out,
            "{:>6} {:>7} {:>7} {:>9} {:>8} {:>8} {:>9} {:>10}",
            "pid", "start", "end", "response", "waiting", "blocked", "execution", "turnaround"
        )?;
        writeln!(
            out,
            "------ ------- ------- --------- -------- -------- --------- ----------"
        )?;

        for s in &selected {
            writeln!(
                out,
                "{:>6} {:>7} {:>7} {:>9} {:>8} {:>8} {:>9} {:>10}",
                s.pid,
                s.start,
                s.end,
                s.response.map_or_else(|| "-".to_string(), |r| r.to_string()),
                s.waiting,
                s.blocked,
                s.execution,
                s.turnaround
            )?;
        }

        let summary = StatsSummary::from_stats(selected.iter().copied());
        writeln!(
            out,
            "------ ------- ------- --------- -------- -------- --------- ----------"
        )?;
        writeln!(
            out,
            "{:>6} {:>7} {:>7} {:>9} {:>8.2} {:>8.2} {:>9.2} {:>10.2}",
            "avg",
            "",
            "",
            summary
                .avg_response
                .map_or_else(|| "-".to_string(), |r| format!("{:.2}", r)),
            summary.avg_waiting,
            summary.avg_blocked,
            summary.avg_execution,
            summary.avg_turnaround
        )?;
        Ok(())
    }
}

/// Mean of an exact total over `count` items; 0.0 when `count` is zero
fn mean(total: u128, count: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    total as f64 / count as f64
}
