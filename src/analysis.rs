//! One-shot analysis of a loaded trace
//!
//! Runs every derivation over the same immutable event stream and bundles
//! the results for the output formatters.

use crate::config::AnalysisConfig;
use crate::context_switch::count_context_switches;
use crate::cpu_timeline::CpuTimeline;
use crate::error::{Result, TraceError};
use crate::event::{Event, Tick};
use crate::intervals::{trace_horizon, IntervalBuilder, IntervalSet};
use crate::memory::{reconstruct_memory_curve, MemoryCurve};
use crate::stats::StatsTable;

/// Everything derived from one trace
#[derive(Debug, Clone, PartialEq)]
pub struct TraceAnalysis {
    pub event_count: usize,
    /// Last observed tick plus the configured padding
    pub horizon: Tick,
    pub intervals: IntervalSet,
    pub stats: StatsTable,
    /// Usage over ticks `0..=horizon`
    pub memory: MemoryCurve,
    pub cpu: CpuTimeline,
    pub context_switches: u64,
}

impl TraceAnalysis {
    /// Derive intervals, metrics, memory curve and switch count from `events`
    ///
    /// `events` must already be sorted by `(time, kind)`. An empty stream
    /// gives empty results. A horizon past `config.max_horizon` is a
    /// `MalformedTrace`.
    pub fn run(events: &[Event], config: &AnalysisConfig) -> Result<Self> {
        let horizon = trace_horizon(events, config.horizon_padding);
        if horizon > config.max_horizon {
            return Err(TraceError::malformed(format!(
                "trace horizon {} exceeds max_horizon {}",
                horizon, config.max_horizon
            )));
        }

        let intervals = IntervalBuilder::new(horizon)
            .extend_to_horizon(config.extend_to_horizon)
            .build(events)?;
        let stats = StatsTable::from_intervals(&intervals);
        let context_switches = count_context_switches(&intervals, config.context_switch_policy);
        let cpu = CpuTimeline::from_intervals(&intervals)?;
        let memory = if events.is_empty() {
            MemoryCurve::default()
        } else {
            reconstruct_memory_curve(events, horizon)?
        };

        tracing::debug!(
            events = events.len(),
            horizon,
            processes = stats.len(),
            context_switches,
            "trace analyzed"
        );

        Ok(Self {
            event_count: events.len(),
            horizon,
            intervals,
            stats,
            memory,
            cpu,
            context_switches,
        })
    }
}
