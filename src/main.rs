use anyhow::{Context, Result};
use clap::Parser;
use schedlens::{
    analysis::TraceAnalysis,
    cli::{Cli, OutputFormat},
    config::AnalysisConfig,
    csv_output::CsvOutput,
    error::TraceError,
    event::Pid,
    json_output::JsonOutput,
    trace_reader,
};
use std::io::{self, Write};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Resolve the analysis configuration: file first, then CLI overrides
fn load_config(args: &Cli) -> Result<AnalysisConfig> {
    let mut config = match &args.config {
        Some(path) => AnalysisConfig::from_file(path).map_err(anyhow::Error::msg)?,
        None => AnalysisConfig::default(),
    };

    if let Some(policy) = args.switch_policy {
        config.context_switch_policy = policy;
    }
    if args.no_extend {
        config.extend_to_horizon = false;
    }
    if let Some(max_horizon) = args.max_horizon {
        config.max_horizon = max_horizon;
    }

    config.validate().map_err(anyhow::Error::msg)?;
    tracing::debug!(?config, "analysis configuration");
    Ok(config)
}

/// Print state intervals grouped by process
fn print_intervals(
    out: &mut impl Write,
    analysis: &TraceAnalysis,
    pids: &[Pid],
) -> io::Result<()> {
    writeln!(out, "=== State Intervals ===")?;
    for (pid, intervals) in analysis.intervals.processes() {
        if !pids.is_empty() && !pids.contains(&pid) {
            continue;
        }
        writeln!(out, "PID {}:", pid)?;
        for interval in intervals {
            write!(
                out,
                "  [{:>5}, {:>5})  {:<10} {:>5} ticks",
                interval.start,
                interval.end,
                interval.state,
                interval.duration()
            )?;
            match &interval.reason {
                Some(reason) => writeln!(out, "  ({})", reason)?,
                None => writeln!(out)?,
            }
        }
    }
    writeln!(out)
}

/// Print the memory curve as runs of constant usage
fn print_memory(out: &mut impl Write, analysis: &TraceAnalysis) -> io::Result<()> {
    writeln!(out, "=== Memory Usage ===")?;
    let curve = &analysis.memory;
    let mut run_start = 0;
    for (tick, bytes) in curve.points() {
        if curve.at(tick + 1) != Some(bytes) {
            writeln!(out, "  t=[{:>5}, {:>5}]  {:>10} bytes", run_start, tick, bytes)?;
            run_start = tick + 1;
        }
    }
    writeln!(out)
}

fn print_text(out: &mut impl Write, analysis: &TraceAnalysis, args: &Cli) -> io::Result<()> {
    if args.intervals {
        print_intervals(out, analysis, &args.pids)?;
    }
    if args.memory {
        print_memory(out, analysis)?;
    }

    writeln!(out, "=== Process Statistics ===")?;
    analysis.stats.write_table(out, &args.pids)?;
    writeln!(out)?;

    writeln!(out, "Events:           {}", analysis.event_count)?;
    writeln!(out, "Horizon:          {} ticks", analysis.horizon)?;
    writeln!(out, "Context switches: {}", analysis.context_switches)?;
    writeln!(out, "CPU utilization:  {:.2}%", analysis.cpu.utilization())?;
    writeln!(out, "Peak memory:      {} bytes", analysis.memory.peak())?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Cli::parse();

    // Initialize tracing if --debug flag is set
    init_tracing(args.debug);

    let config = load_config(&args)?;

    let events = match trace_reader::read_trace(&args.trace) {
        Ok(events) => events,
        Err(TraceError::EmptyTrace) => {
            eprintln!("No events in trace {}.", args.trace.display());
            return Ok(());
        }
        Err(e) => return Err(e).context("Failed to load trace"),
    };

    let analysis = TraceAnalysis::run(&events, &config).context("Failed to analyze trace")?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match args.format {
        OutputFormat::Text => print_text(&mut out, &analysis, &args)?,
        OutputFormat::Json => {
            let json = JsonOutput::from_analysis(&analysis, &args.pids).to_json()?;
            writeln!(out, "{}", json)?;
        }
        OutputFormat::Csv => {
            write!(out, "{}", CsvOutput::new(&analysis, &args.pids).to_csv(args.table))?;
        }
    }
    out.flush()?;

    Ok(())
}
