//! Error types for terminal output.
//!
//! Nothing in this crate is fatal to the host process. Errors are returned
//! internally so state can be left untouched for a retry, then swallowed at
//! the public boundary by [`report`].

use crate::height::strip_escapes;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

/// Failures while driving the terminal.
#[derive(Error, Debug)]
pub enum TermError {
    /// The output stream rejected a write or flush.
    #[error("terminal write failed: {0}")]
    Io(#[from] io::Error),

    /// A periodic ticker thread could not be spawned.
    #[error("failed to start {name} ticker: {source}")]
    Ticker {
        /// Which ticker (`animation` or `redraw`).
        name: &'static str,
        /// Underlying spawn error.
        source: io::Error,
    },
}

/// Invalid configuration values.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable held a value that could not be parsed.
    #[error("invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        /// Variable name.
        key: &'static str,
        /// Raw value as found.
        value: String,
        /// What was expected instead.
        reason: &'static str,
    },
}

impl ConfigError {
    pub(crate) fn invalid(key: &'static str, value: &str, reason: &'static str) -> Self {
        Self::InvalidValue {
            key,
            value: value.to_string(),
            reason,
        }
    }
}

/// Set after the first failure has been logged.
static REPORTED: AtomicBool = AtomicBool::new(false);

/// Log a terminal failure once per process; later failures are only traced.
pub(crate) fn report(err: &TermError) {
    if REPORTED.swap(true, Ordering::Relaxed) {
        tracing::trace!(error = %err, "terminal output failed again");
    } else {
        tracing::warn!(error = %err, "terminal output failed; dropping frame");
    }
}

/// Print `text` without styling to stderr after a failed write.
pub(crate) fn fallback(err: &TermError, text: &str) {
    report(err);
    let _ = writeln!(io::stderr().lock(), "{}", strip_escapes(text));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::invalid("MARQUEE_INTERVAL_MS", "fast", "expected milliseconds");
        assert_eq!(
            err.to_string(),
            "invalid value for MARQUEE_INTERVAL_MS: \"fast\" (expected milliseconds)"
        );
    }

    #[test]
    fn test_term_error_from_io() {
        let err: TermError = io::Error::new(io::ErrorKind::BrokenPipe, "closed").into();
        assert!(matches!(err, TermError::Io(_)));
        assert!(err.to_string().contains("closed"));
    }

    #[test]
    fn test_report_never_panics() {
        let err = TermError::Io(io::Error::other("boom"));
        report(&err);
        report(&err);
    }
}
