//! schedlens - scheduler trace analyzer
//!
//! This library turns the flat event log of a scheduler simulator into
//! per-process state intervals, scheduling metrics, a memory usage curve and
//! a global context switch count, ready for dashboards to render.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod context_switch;
pub mod cpu_timeline;
pub mod csv_output;
pub mod error;
pub mod event;
pub mod intervals;
pub mod json_output;
pub mod memory;
pub mod stats;
pub mod trace_reader;
