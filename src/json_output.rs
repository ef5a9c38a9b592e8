//! JSON output format for trace analyses
//!
//! `--format json` emits one document holding every derived structure, so a
//! dashboard can render without recomputing anything.

use crate::analysis::TraceAnalysis;
use crate::event::{Pid, ProcessState, Tick};
use crate::stats::{ProcessStats, StatsSummary};
use serde::{Deserialize, Serialize};

/// A state interval with its duration spelled out
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonInterval {
    pub pid: Pid,
    pub state: ProcessState,
    pub start: Tick,
    pub end: Tick,
    pub duration: Tick,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Trace-wide figures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonSummary {
    pub total_events: usize,
    pub horizon: Tick,
    pub context_switches: u64,
    pub cpu_utilization: f64,
    pub peak_memory: u64,
    #[serde(flatten)]
    pub averages: StatsSummary,
}

/// Root JSON output structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonOutput {
    pub version: String,
    pub format: String,
    pub intervals: Vec<JsonInterval>,
    pub processes: Vec<ProcessStats>,
    /// Bytes in use, indexed by tick
    pub memory: Vec<u64>,
    /// CPU busy flag, indexed by tick
    pub cpu: Vec<bool>,
    pub summary: JsonSummary,
}

impl JsonOutput {
    /// Build the document, keeping only `pids` in the per-process sections when non-empty
    pub fn from_analysis(analysis: &TraceAnalysis, pids: &[Pid]) -> Self {
        let selected = |pid: Pid| pids.is_empty() || pids.contains(&pid);

        let intervals = analysis
            .intervals
            .iter()
            .filter(|i| selected(i.pid))
            .map(|i| JsonInterval {
                pid: i.pid,
                state: i.state,
                start: i.start,
                end: i.end,
                duration: i.duration(),
                reason: i.reason.clone(),
            })
            .collect();

        let processes = analysis
            .stats
            .iter()
            .filter(|s| selected(s.pid))
            .cloned()
            .collect();

        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            format: "schedlens-json-v1".to_string(),
            intervals,
            processes,
            memory: analysis.memory.as_slice().to_vec(),
            cpu: analysis.cpu.as_slice().to_vec(),
            summary: JsonSummary {
                total_events: analysis.event_count,
                horizon: analysis.horizon,
                context_switches: analysis.context_switches,
                cpu_utilization: analysis.cpu.utilization(),
                peak_memory: analysis.memory.peak(),
                averages: analysis.stats.summary(),
            },
        }
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
