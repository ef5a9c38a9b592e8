//! CSV trace ingestion
//!
//! Reads the simulator's `trace.csv` (`time,pid,event,state,reason,cpu,queue`)
//! into a sorted event stream. Columns are located by header name, so older
//! traces without `event` or `reason` columns still load: every row is then a
//! state event and reasons are empty.

use crate::error::{Result, TraceError};
use crate::event::{normalize_reason, sort_stream, Event, EventPayload, Pid, Tick};
use std::path::Path;

/// Column positions resolved from the header row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TraceColumns {
    time: usize,
    pid: usize,
    state: usize,
    event: Option<usize>,
    reason: Option<usize>,
}

impl TraceColumns {
    fn from_header(fields: &[String]) -> Result<Self> {
        let find = |name: &str| {
            fields.iter().position(|f| {
                f.trim()
                    .trim_start_matches('\u{feff}')
                    .eq_ignore_ascii_case(name)
            })
        };
        let require = |name: &str| {
            find(name).ok_or_else(|| {
                TraceError::malformed(format!("header is missing required column '{}'", name))
            })
        };

        let columns = Self {
            time: require("time")?,
            pid: require("pid")?,
            state: require("state")?,
            event: find("event"),
            reason: find("reason"),
        };

        if columns.event.is_none() {
            tracing::debug!("no 'event' column, treating every row as STATE");
        }
        if columns.reason.is_none() {
            tracing::debug!("no 'reason' column, reasons default to empty");
        }
        Ok(columns)
    }
}

/// Load and sort a trace file
///
/// # Errors
///
/// - `SourceUnavailable` if the file cannot be read
/// - `EmptyTrace` if it holds no event rows
/// - `MalformedTrace` for missing required columns or bad values
pub fn read_trace(path: &Path) -> Result<Vec<Event>> {
    let text = std::fs::read_to_string(path).map_err(|source| TraceError::SourceUnavailable {
        path: path.to_path_buf(),
        source,
    })?;
    let events = parse_trace(&text)?;
    tracing::debug!(path = %path.display(), events = events.len(), "trace loaded");
    Ok(events)
}

/// Parse CSV trace text into a stream sorted by `(time, kind)`
pub fn parse_trace(text: &str) -> Result<Vec<Event>> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim_end_matches('\r')))
        .filter(|(_, line)| !line.trim().is_empty());

    let Some((header_line, header)) = lines.next() else {
        return Err(TraceError::EmptyTrace);
    };
    let columns = TraceColumns::from_header(&split_record(header, header_line)?)?;

    let mut events = Vec::new();
    for (line_no, line) in lines {
        let fields = split_record(line, line_no)?;
        events.push(parse_row(&fields, &columns, line_no)?);
    }

    if events.is_empty() {
        return Err(TraceError::EmptyTrace);
    }

    sort_stream(&mut events);
    Ok(events)
}

fn parse_row(fields: &[String], columns: &TraceColumns, line_no: usize) -> Result<Event> {
    let required = |idx: usize, name: &str| {
        fields.get(idx).map(|f| f.trim()).ok_or_else(|| {
            TraceError::malformed(format!("line {}: missing '{}' field", line_no, name))
        })
    };
    let optional = |idx: Option<usize>| idx.and_then(|i| fields.get(i)).map(|f| f.trim());

    let time_raw = required(columns.time, "time")?;
    let time: Tick = time_raw.parse().map_err(|_| {
        TraceError::malformed(format!("line {}: invalid time '{}'", line_no, time_raw))
    })?;

    let pid_raw = required(columns.pid, "pid")?;
    let pid: Pid = pid_raw.parse().map_err(|_| {
        TraceError::malformed(format!("line {}: invalid pid '{}'", line_no, pid_raw))
    })?;

    let label = match optional(columns.event) {
        Some(label) if !label.is_empty() => label.to_string(),
        _ => "STATE".to_string(),
    };

    let state_raw = required(columns.state, "state")?;
    let with_line = |e: TraceError| match e {
        TraceError::MalformedTrace(msg) => {
            TraceError::malformed(format!("line {}: {}", line_no, msg))
        }
        other => other,
    };
    let payload = if label == "MEMORY" {
        EventPayload::Memory(state_raw.parse().map_err(with_line)?)
    } else {
        EventPayload::State(state_raw.parse().map_err(with_line)?)
    };

    let reason = optional(columns.reason).and_then(normalize_reason);

    Ok(Event {
        time,
        pid,
        label,
        payload,
        reason,
    })
}

/// Split one CSV record, honouring double-quoted fields and `""` escapes
fn split_record(line: &str, line_no: usize) -> Result<Vec<String>> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' if field.trim().is_empty() => {
                field.clear();
                in_quotes = true;
            }
            ',' if !in_quotes => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(TraceError::malformed(format!(
            "line {}: unterminated quoted field",
            line_no
        )));
    }
    fields.push(field);
    Ok(fields)
}
