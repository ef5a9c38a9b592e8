//! CPU occupancy over time
//!
//! A tick is busy when some process holds a RUNNING interval covering it.

use crate::error::Result;
use crate::event::{ProcessState, Tick};
use crate::intervals::{tick_buffer, IntervalSet};
use serde::{Deserialize, Serialize};

/// Busy/idle flag for every tick in `0..horizon`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CpuTimeline {
    busy: Vec<bool>,
}

impl CpuTimeline {
    /// Mark every tick covered by a RUNNING interval
    ///
    /// Fails with `MalformedTrace` when the horizon is too large to hold one
    /// flag per tick.
    pub fn from_intervals(intervals: &IntervalSet) -> Result<Self> {
        let mut busy = tick_buffer(intervals.horizon())?;
        busy.resize(intervals.horizon() as usize, false);
        for interval in intervals.iter().filter(|i| i.state == ProcessState::Running) {
            let end = (interval.end as usize).min(busy.len());
            let start = (interval.start as usize).min(end);
            busy[start..end].fill(true);
        }
        Ok(Self { busy })
    }

    pub fn is_busy(&self, tick: Tick) -> bool {
        self.busy.get(tick as usize).copied().unwrap_or(false)
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.busy
    }

    pub fn busy_ticks(&self) -> u64 {
        self.busy.iter().filter(|&&b| b).count() as u64
    }

    pub fn len(&self) -> usize {
        self.busy.len()
    }

    pub fn is_empty(&self) -> bool {
        self.busy.is_empty()
    }

    /// Share of busy ticks in percent; 0.0 for an empty timeline
    pub fn utilization(&self) -> f64 {
        if self.busy.is_empty() {
            return 0.0;
        }
        self.busy_ticks() as f64 / self.busy.len() as f64 * 100.0
    }
}
