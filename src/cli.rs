//! CLI argument parsing for schedlens

use crate::config::ContextSwitchPolicy;
use crate::csv_output::CsvTable;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for analysis results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
    /// CSV format for spreadsheet analysis
    Csv,
}

#[derive(Parser, Debug)]
#[command(name = "schedlens")]
#[command(version)]
#[command(
    about = "Scheduler trace analyzer: state intervals, process metrics, memory and context switches",
    long_about = None
)]
pub struct Cli {
    /// Trace file written by the scheduler simulator (CSV)
    #[arg(value_name = "TRACE")]
    pub trace: PathBuf,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Table to emit with --format csv
    #[arg(long = "table", value_enum, default_value = "stats")]
    pub table: CsvTable,

    /// Analysis configuration file (TOML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Context switch counting rule (overrides the config file)
    #[arg(long = "switch-policy", value_enum, value_name = "POLICY")]
    pub switch_policy: Option<ContextSwitchPolicy>,

    /// Do not extend a live process's last state to the trace horizon
    #[arg(long = "no-extend")]
    pub no_extend: bool,

    /// Refuse traces whose horizon exceeds this many ticks (overrides the config file)
    #[arg(long = "max-horizon", value_name = "TICKS")]
    pub max_horizon: Option<u64>,

    /// Only report these PIDs (repeatable); derivations still use the whole trace
    #[arg(short = 'p', long = "pid", value_name = "PID", allow_negative_numbers = true)]
    pub pids: Vec<i64>,

    /// Also print the state intervals (text format)
    #[arg(short = 'i', long = "intervals")]
    pub intervals: bool,

    /// Also print the memory usage curve (text format)
    #[arg(short = 'm', long = "memory")]
    pub memory: bool,

    /// Enable debug logging to stderr
    #[arg(long = "debug")]
    pub debug: bool,
}
