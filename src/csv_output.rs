//! CSV output format for trace analyses
//!
//! One table per run, chosen with `--table`, for spreadsheet analysis and
//! plotting scripts.

use crate::analysis::TraceAnalysis;
use crate::event::{Pid, Tick};

/// Which derived table to emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum CsvTable {
    /// Per-process metrics
    #[default]
    Stats,
    /// State intervals
    Intervals,
    /// Memory usage per tick
    Memory,
    /// CPU busy flag per tick
    Cpu,
}

/// CSV output formatter
#[derive(Debug)]
pub struct CsvOutput<'a> {
    analysis: &'a TraceAnalysis,
    pids: &'a [Pid],
}

impl<'a> CsvOutput<'a> {
    /// Create a formatter; `pids` restricts per-process tables when non-empty
    pub fn new(analysis: &'a TraceAnalysis, pids: &'a [Pid]) -> Self {
        Self { analysis, pids }
    }

    fn selected(&self, pid: Pid) -> bool {
        self.pids.is_empty() || self.pids.contains(&pid)
    }

    /// Escape CSV field (handle commas, quotes, newlines)
    fn escape_field(field: &str) -> String {
        if field.contains(',') || field.contains('"') || field.contains('\n') {
            format!("\"{}\"", field.replace('"', "\"\""))
        } else {
            field.to_string()
        }
    }

    /// Generate CSV output for `table`
    pub fn to_csv(&self, table: CsvTable) -> String {
        match table {
            CsvTable::Stats => self.stats_csv(),
            CsvTable::Intervals => self.intervals_csv(),
            CsvTable::Memory => self.memory_csv(),
            CsvTable::Cpu => self.cpu_csv(),
        }
    }

    fn stats_csv(&self) -> String {
        let mut output =
            String::from("pid,start,end,response,waiting,blocked,execution,turnaround\n");
        for s in self.analysis.stats.iter().filter(|s| self.selected(s.pid)) {
            output.push_str(&format!(
                "{},{},{},{},{},{},{},{}\n",
                s.pid,
                s.start,
                s.end,
                s.response.map(|r| r.to_string()).unwrap_or_default(),
                s.waiting,
                s.blocked,
                s.execution,
                s.turnaround
            ));
        }
        output
    }

    fn intervals_csv(&self) -> String {
        let mut output = String::from("pid,state,start,end,duration,reason\n");
        for i in self.analysis.intervals.iter().filter(|i| self.selected(i.pid)) {
            output.push_str(&format!(
                "{},{},{},{},{},{}\n",
                i.pid,
                i.state,
                i.start,
                i.end,
                i.duration(),
                Self::escape_field(i.reason.as_deref().unwrap_or(""))
            ));
        }
        output
    }

    fn memory_csv(&self) -> String {
        let mut output = String::from("tick,bytes\n");
        for (tick, bytes) in self.analysis.memory.points() {
            output.push_str(&format!("{},{}\n", tick, bytes));
        }
        output
    }

    fn cpu_csv(&self) -> String {
        let mut output = String::from("tick,busy\n");
        let cpu = &self.analysis.cpu;
        for tick in 0..cpu.len() as Tick {
            output.push_str(&format!("{},{}\n", tick, u8::from(cpu.is_busy(tick))));
        }
        output
    }
}
