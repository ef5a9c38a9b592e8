//! Error types for trace loading and derivation

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or analyzing a scheduler trace
#[derive(Error, Debug)]
pub enum TraceError {
    #[error("Trace source unavailable: {path}: {source}")]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Trace contains no events")]
    EmptyTrace,

    #[error("Malformed trace: {0}")]
    MalformedTrace(String),
}

impl TraceError {
    /// Build a `MalformedTrace` error from anything displayable
    pub fn malformed(message: impl Into<String>) -> Self {
        TraceError::MalformedTrace(message.into())
    }
}

/// Result type for trace operations
pub type Result<T> = std::result::Result<T, TraceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_message() {
        let err = TraceError::malformed("line 3: unknown state 'ZOMBIE'");
        assert_eq!(
            err.to_string(),
            "Malformed trace: line 3: unknown state 'ZOMBIE'"
        );
    }

    #[test]
    fn test_source_unavailable_mentions_path() {
        let err = TraceError::SourceUnavailable {
            path: PathBuf::from("/no/such/trace.csv"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/no/such/trace.csv"));
        assert!(msg.contains("not found"));
    }

    #[test]
    fn test_empty_trace_display() {
        assert_eq!(TraceError::EmptyTrace.to_string(), "Trace contains no events");
    }
}
