//! Output configuration.
//!
//! Defaults are tuned for an interactive stderr. Every knob can be overridden
//! from the environment through [`Config::from_env`]:
//!
//! | Variable              | Meaning                                   |
//! |-----------------------|-------------------------------------------|
//! | `MARQUEE_INTERVAL_MS` | tick interval in milliseconds (> 0)       |
//! | `MARQUEE_INTERACTIVE` | force (`1`) or disable (`0`) live redraw  |
//! | `MARQUEE_STREAM`      | `stdout` or `stderr`                      |
//! | `MARQUEE_LABEL`       | prefix inherited by every indicator       |
//! | `NO_COLOR`            | any non-empty value disables styling      |

use crate::error::ConfigError;
use std::io::{self, IsTerminal, Write};
use std::str::FromStr;
use std::time::Duration;

/// Default animation/redraw interval.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(80);

/// Which standard stream the output owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stream {
    /// Standard output.
    Stdout,
    /// Standard error.
    #[default]
    Stderr,
}

impl Stream {
    /// A fresh writer for this stream.
    pub fn writer(self) -> Box<dyn Write + Send> {
        match self {
            Self::Stdout => Box::new(io::stdout()),
            Self::Stderr => Box::new(io::stderr()),
        }
    }

    /// Whether the stream is attached to a terminal.
    pub fn is_terminal(self) -> bool {
        match self {
            Self::Stdout => io::stdout().is_terminal(),
            Self::Stderr => io::stderr().is_terminal(),
        }
    }
}

impl FromStr for Stream {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stdout" | "out" => Ok(Self::Stdout),
            "stderr" | "err" => Ok(Self::Stderr),
            _ => Err(ConfigError::invalid(
                "MARQUEE_STREAM",
                s,
                "expected stdout or stderr",
            )),
        }
    }
}

/// Settings for an [`Output`](crate::Output).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Interval of both the animation and the redraw ticker.
    pub interval: Duration,
    /// Stream the output writes to.
    pub stream: Stream,
    /// Overrides terminal detection when set.
    pub interactive: Option<bool>,
    /// Whether callers should apply styling.
    pub color: bool,
    /// Prefix rendered by indicators that inherit it.
    pub label: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            stream: Stream::default(),
            interactive: None,
            color: true,
            label: None,
        }
    }
}

impl Config {
    /// Defaults overridden by the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for a variable that is set but malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for a value that does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = lookup("MARQUEE_INTERVAL_MS") {
            let ms: u64 = raw.trim().parse().map_err(|_| {
                ConfigError::invalid("MARQUEE_INTERVAL_MS", &raw, "expected milliseconds")
            })?;
            if ms == 0 {
                return Err(ConfigError::invalid(
                    "MARQUEE_INTERVAL_MS",
                    &raw,
                    "interval must be positive",
                ));
            }
            config.interval = Duration::from_millis(ms);
        }
        if let Some(raw) = lookup("MARQUEE_INTERACTIVE") {
            config.interactive = Some(parse_flag("MARQUEE_INTERACTIVE", &raw)?);
        }
        if let Some(raw) = lookup("MARQUEE_STREAM") {
            config.stream = raw.parse()?;
        }
        if let Some(label) = lookup("MARQUEE_LABEL").filter(|l| !l.is_empty()) {
            config.label = Some(label);
        }
        if lookup("NO_COLOR").is_some_and(|v| !v.is_empty()) {
            config.color = false;
        }

        Ok(config)
    }

    /// Set the tick interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the target stream.
    pub fn with_stream(mut self, stream: Stream) -> Self {
        self.stream = stream;
        self
    }

    /// Force or disable live redraw regardless of detection.
    pub fn with_interactive(mut self, interactive: bool) -> Self {
        self.interactive = Some(interactive);
        self
    }

    /// Enable or disable styling.
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Set the inherited prefix.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

fn parse_flag(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid(key, raw, "expected a boolean")),
    }
}
