//! marquee - run commands behind live terminal spinners
//!
//! Every command gets its own indicator; their output is forwarded as plain
//! lines above the live spinners, tagged with the command's position.
//!
//! # Example
//!
//! ```text
//! $ marquee run "cargo build" "npm test"
//! [2] > vitest run
//! ✓ cargo build (14.2s)
//! ⠼ npm test · 31 passed (16.8s)
//! ```

#![allow(clippy::missing_errors_doc)]

pub mod cmd;

use clap::{Parser, Subcommand};
use marquee_core::{Config, ConfigError, Stream};
use std::time::Duration;

/// Command-line interface.
#[derive(Debug, Parser)]
#[command(name = "marquee")]
#[command(author, version, about = "marquee - run commands behind live terminal spinners")]
pub struct Cli {
    /// Animation and redraw interval in milliseconds
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval_ms: Option<u64>,

    /// Write to stdout instead of stderr
    #[arg(long, global = true)]
    pub stdout: bool,

    /// Redraw in place even if no terminal is detected
    #[arg(long, global = true, conflicts_with = "plain")]
    pub interactive: bool,

    /// Never redraw in place; print one line per start and finish
    #[arg(long, global = true)]
    pub plain: bool,

    /// Disable colors
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Prefix shown before every indicator
    #[arg(long, global = true)]
    pub label: Option<String>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run shell commands concurrently, one spinner each
    Run {
        /// Commands, each passed to `sh -c`
        #[arg(required = true)]
        commands: Vec<String>,
        /// Show a wall-clock timestamp on each indicator
        #[arg(long)]
        show_date: bool,
        /// Hide the elapsed time
        #[arg(long)]
        no_duration: bool,
        /// Forward at most N lines of command output
        #[arg(long)]
        max_lines: Option<usize>,
        /// Do not forward command output
        #[arg(short, long, conflicts_with = "max_lines")]
        quiet: bool,
    },
    /// Show simulated concurrent tasks
    Demo {
        /// Number of tasks
        #[arg(long, default_value_t = 3)]
        tasks: usize,
        /// Steps per task
        #[arg(long, default_value_t = 20)]
        steps: usize,
        /// Base delay per step in milliseconds (task N waits N times this)
        #[arg(long, default_value_t = 60)]
        step_ms: u64,
        /// Make task N fail
        #[arg(long)]
        fail: Option<usize>,
    },
}

impl Cli {
    /// Environment configuration overridden by command-line flags.
    pub fn config(&self) -> Result<Config, ConfigError> {
        Ok(self.apply(Config::from_env()?))
    }

    /// Apply the command-line flags to `config`.
    pub fn apply(&self, mut config: Config) -> Config {
        if let Some(ms) = self.interval_ms {
            config.interval = Duration::from_millis(ms);
        }
        if self.stdout {
            config.stream = Stream::Stdout;
        }
        if self.interactive {
            config.interactive = Some(true);
        } else if self.plain {
            config.interactive = Some(false);
        }
        if self.no_color {
            config.color = false;
        }
        if let Some(label) = &self.label {
            config.label = Some(label.clone());
        }
        config
    }
}
