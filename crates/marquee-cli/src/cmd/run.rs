//! Run command - shell commands behind live indicators
//!
//! Each command runs under `sh -c` with its own indicator. Output lines are
//! forwarded above the indicators as `[N] line`, and the latest line is
//! mirrored into the indicator's text.

use futures::future::join_all;
use marquee_core::{IndicatorOptions, Limited, LineSink, Output, ProgressHandle, Theme};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::debug;

/// Longest command output shown inside an indicator.
const STATUS_CHARS: usize = 40;

/// Options for the run command.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Show a wall-clock timestamp on each indicator.
    pub show_date: bool,
    /// Show elapsed time.
    pub show_duration: bool,
    /// Forward at most this many output lines; `None` forwards everything.
    pub max_lines: Option<usize>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            show_date: false,
            show_duration: true,
            max_lines: None,
        }
    }
}

/// Run every command concurrently. Returns the number that failed.
pub async fn run(output: &Output, commands: &[String], opts: &RunOptions) -> usize {
    let sink = Limited::new(output.clone(), opts.max_lines.unwrap_or(usize::MAX));
    let theme = Theme::default();
    let options = theme
        .indicator_options(output.color())
        .show_date(opts.show_date)
        .show_duration(opts.show_duration);
    let tags: Vec<String> = (1..=commands.len())
        .map(|index| theme.secondary(&format!("[{index}]"), output.color()))
        .collect();

    let results = join_all(
        commands
            .iter()
            .zip(&tags)
            .map(|(command, tag)| run_one(output, &sink, tag, command, options.clone())),
    )
    .await;

    let suppressed = sink.suppressed();
    if suppressed > 0 {
        output.emit_line(&format!("({suppressed} output lines suppressed)"));
    }
    results.into_iter().filter(|ok| !ok).count()
}

async fn run_one(
    output: &Output,
    sink: &impl LineSink,
    tag: &str,
    command: &str,
    options: IndicatorOptions,
) -> bool {
    let handle = output.begin_indicator(command, options);
    handle.start();

    let spawned = Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn();
    let mut child = match spawned {
        Ok(child) => child,
        Err(err) => {
            handle.fail(Some(&format!("{command}: {err}")));
            return false;
        }
    };
    debug!(command, pid = child.id(), "spawned");

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    tokio::join!(
        forward(stdout, tag, sink, &handle, command),
        forward(stderr, tag, sink, &handle, command),
    );

    match child.wait().await {
        Ok(status) if status.success() => {
            handle.success(Some(command));
            true
        }
        Ok(status) => {
            let reason = status
                .code()
                .map_or_else(|| "killed".to_string(), |code| format!("exit {code}"));
            handle.fail(Some(&format!("{command} ({reason})")));
            false
        }
        Err(err) => {
            handle.fail(Some(&format!("{command}: {err}")));
            false
        }
    }
}

async fn forward<R: AsyncRead + Unpin>(
    stream: Option<R>,
    tag: &str,
    sink: &impl LineSink,
    handle: &ProgressHandle,
    command: &str,
) {
    let Some(stream) = stream else {
        return;
    };
    let mut lines = BufReader::new(stream).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let status = status_text(&line);
        if !status.is_empty() {
            handle.update(format!("{command} · {status}"));
        }
        sink.emit_line(&format!("{tag} {line}"));
    }
}

/// The trimmed line, cut to [`STATUS_CHARS`] characters.
fn status_text(line: &str) -> String {
    let line = line.trim();
    if line.chars().count() <= STATUS_CHARS {
        return line.to_string();
    }
    let mut cut: String = line.chars().take(STATUS_CHARS - 1).collect();
    cut.push('…');
    cut
}
