//! Global context switch counting
//!
//! Each RUNNING interval marks a tick where the CPU was handed to a process.
//! Under [`ContextSwitchPolicy::RunningEntries`] every such entry counts,
//! including the very first dispatch. Under [`ContextSwitchPolicy::Handoffs`]
//! only entries that change the CPU owner count; a process resuming with no
//! other process in between does not.

use crate::config::ContextSwitchPolicy;
use crate::event::{Pid, ProcessState, Tick};
use crate::intervals::IntervalSet;

/// Count context switches over all processes of `intervals`
pub fn count_context_switches(intervals: &IntervalSet, policy: ContextSwitchPolicy) -> u64 {
    let mut dispatches: Vec<(Tick, Pid)> = intervals
        .iter()
        .filter(|i| i.state == ProcessState::Running)
        .map(|i| (i.start, i.pid))
        .collect();

    let count = match policy {
        ContextSwitchPolicy::RunningEntries => dispatches.len() as u64,
        ContextSwitchPolicy::Handoffs => {
            dispatches.sort_unstable();
            let mut owner: Option<Pid> = None;
            let mut handoffs = 0u64;
            for (_, pid) in dispatches {
                if owner != Some(pid) {
                    handoffs += 1;
                    owner = Some(pid);
                }
            }
            handoffs
        }
    };

    tracing::debug!(?policy, count, "context switches counted");
    count
}
