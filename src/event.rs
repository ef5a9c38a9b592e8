//! Scheduler trace event model
//!
//! Every row of a simulator trace becomes one [`Event`]: a tick, the owning
//! PID and either a process state announcement or a memory action. State and
//! action names are closed enums; anything the simulator does not emit is a
//! malformed trace.

use crate::error::{Result, TraceError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Process identifier as logged by the simulator (`-1` is the kernel itself)
pub type Pid = i64;

/// Simulation time in scheduler ticks
pub type Tick = u64;

/// Event stream a row belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    State,
    Memory,
}

/// Scheduling state held by a process
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessState {
    /// Created but not yet admitted to the ready queue
    New,
    Ready,
    Running,
    Blocked,
    Terminated,
}

impl ProcessState {
    pub const ALL: [ProcessState; 5] = [
        ProcessState::New,
        ProcessState::Ready,
        ProcessState::Running,
        ProcessState::Blocked,
        ProcessState::Terminated,
    ];

    /// Trace spelling of the state
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessState::New => "NEW",
            ProcessState::Ready => "READY",
            ProcessState::Running => "RUNNING",
            ProcessState::Blocked => "BLOCKED",
            ProcessState::Terminated => "TERMINATED",
        }
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProcessState {
    type Err = TraceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "NEW" => Ok(ProcessState::New),
            "READY" => Ok(ProcessState::Ready),
            "RUNNING" => Ok(ProcessState::Running),
            "BLOCKED" => Ok(ProcessState::Blocked),
            "TERMINATED" => Ok(ProcessState::Terminated),
            other => Err(TraceError::malformed(format!(
                "unknown process state '{}'",
                other
            ))),
        }
    }
}

/// Heap operation recorded by the simulator allocator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemoryAction {
    Alloc,
    Free,
}

impl MemoryAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryAction::Alloc => "ALLOC",
            MemoryAction::Free => "FREE",
        }
    }
}

impl fmt::Display for MemoryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemoryAction {
    type Err = TraceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "ALLOC" => Ok(MemoryAction::Alloc),
            "FREE" => Ok(MemoryAction::Free),
            other => Err(TraceError::malformed(format!(
                "unknown memory action '{}'",
                other
            ))),
        }
    }
}

/// What an event announces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventPayload {
    State(ProcessState),
    Memory(MemoryAction),
}

/// A single trace record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub time: Tick,
    pub pid: Pid,
    /// Raw `event` column value (`STATE`, `CREATE`, `MEMORY`, ...)
    pub label: String,
    pub payload: EventPayload,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Event {
    /// State announcement labelled `STATE`
    pub fn state_change(time: Tick, pid: Pid, state: ProcessState) -> Self {
        Self {
            time,
            pid,
            label: "STATE".to_string(),
            payload: EventPayload::State(state),
            reason: None,
        }
    }

    /// Memory event whose reason carries the byte count
    pub fn memory(time: Tick, pid: Pid, action: MemoryAction, bytes: u64) -> Self {
        Self {
            time,
            pid,
            label: "MEMORY".to_string(),
            payload: EventPayload::Memory(action),
            reason: Some(bytes.to_string()),
        }
    }

    /// Replace the reason payload
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = normalize_reason(&reason.into());
        self
    }

    pub fn kind(&self) -> EventKind {
        match self.payload {
            EventPayload::State(_) => EventKind::State,
            EventPayload::Memory(_) => EventKind::Memory,
        }
    }

    pub fn state(&self) -> Option<ProcessState> {
        match self.payload {
            EventPayload::State(state) => Some(state),
            EventPayload::Memory(_) => None,
        }
    }

    pub fn memory_action(&self) -> Option<MemoryAction> {
        match self.payload {
            EventPayload::Memory(action) => Some(action),
            EventPayload::State(_) => None,
        }
    }

    /// Byte count carried in the reason field
    ///
    /// Missing, non-numeric or negative values count as zero. Fractional
    /// values are truncated.
    pub fn memory_size(&self) -> u64 {
        let Some(reason) = self.reason.as_deref() else {
            return 0;
        };
        match reason.trim().parse::<f64>() {
            Ok(value) if value.is_finite() && value >= 0.0 => value as u64,
            _ => {
                tracing::debug!(
                    time = self.time,
                    pid = self.pid,
                    reason,
                    "unusable memory size, treating as 0"
                );
                0
            }
        }
    }
}

/// Map the placeholder spellings legacy traces use for "no reason" to `None`
pub fn normalize_reason(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    match trimmed {
        "" | "nan" | "NaN" | "None" => None,
        _ => Some(trimmed.to_string()),
    }
}

/// Stable sort by `(time, kind)`; same-tick events of one kind keep arrival order
pub fn sort_stream(events: &mut [Event]) {
    events.sort_by_key(|e| (e.time, e.kind()));
}
