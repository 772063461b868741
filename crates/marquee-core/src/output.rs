//! Unified output interface.
//!
//! This module provides the API callers use: [`Output`] for plain lines and
//! for creating indicators, [`ProgressHandle`] for driving one indicator.
//! Every call is synchronous and serialized through the multiplexer lock;
//! failures are logged once and degrade to plain text on stderr, they never
//! reach the caller.

use crate::config::Config;
use crate::error::{fallback, report};
use crate::indicator::{Indicator, IndicatorOptions, IndicatorState, Outcome};
use crate::mux::{Multiplexer, Phase, SharedIndicator, lock};
use crate::screen::{Screen, TerminalScreen};
use crate::theme::Theme;
use crate::ticker::Tickers;
use crate::writer::TerminalWriter;
use std::io::Write;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Instant;

/// Process-wide output on the configured stream.
static GLOBAL: OnceLock<Output> = OnceLock::new();

/// A cloneable handle to one stream's multiplexer.
#[derive(Debug, Clone)]
pub struct Output {
    mux: Arc<Mutex<Multiplexer>>,
    screen: Arc<dyn Screen>,
    config: Arc<Config>,
}

impl Output {
    /// Output on the stream named by `config`.
    pub fn new(config: Config) -> Self {
        let screen = Arc::new(TerminalScreen::new(config.stream, config.interactive));
        let out = config.stream.writer();
        Self::with_parts(config, screen, out)
    }

    /// Output on an arbitrary writer with an explicit terminal description.
    pub fn with_parts(config: Config, screen: Arc<dyn Screen>, out: Box<dyn Write + Send>) -> Self {
        let mux = Multiplexer::new(TerminalWriter::new(out), Arc::clone(&screen));
        Self {
            mux: Arc::new(Mutex::new(mux)),
            screen,
            config: Arc::new(config),
        }
    }

    /// The shared process-wide output, configured from the environment on
    /// first use.
    pub fn global() -> &'static Self {
        GLOBAL.get_or_init(|| {
            let config = Config::from_env().unwrap_or_else(|err| {
                tracing::warn!(error = %err, "ignoring invalid output configuration");
                Config::default()
            });
            Self::new(config)
        })
    }

    /// Configuration in effect.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Whether indicators are redrawn in place.
    pub fn is_interactive(&self) -> bool {
        self.screen.is_interactive()
    }

    /// Whether callers should style their text.
    pub fn color(&self) -> bool {
        self.config.color && self.is_interactive()
    }

    /// Current multiplexer phase.
    pub fn phase(&self) -> Phase {
        lock(&self.mux).phase()
    }

    /// Create an indicator. Nothing is shown until [`ProgressHandle::start`].
    pub fn begin_indicator(
        &self,
        text: impl Into<String>,
        options: IndicatorOptions,
    ) -> ProgressHandle {
        let kind = if self.is_interactive() {
            IndicatorKind::Terminal
        } else {
            IndicatorKind::NonInteractive
        };
        let indicator = Indicator::new(text, options, self.config.label.as_deref());
        ProgressHandle {
            indicator: Arc::new(Mutex::new(indicator)),
            kind,
            output: self.clone(),
        }
    }

    /// Create and start an indicator with the default theme.
    pub fn spinner(&self, text: impl Into<String>) -> ProgressHandle {
        let handle = self.begin_indicator(text, Theme::default().indicator_options(self.color()));
        handle.start();
        handle
    }

    /// Write a plain line, above the live indicators if any are running.
    pub fn emit_line(&self, text: &str) {
        let result = lock(&self.mux).append_plain_line(text);
        if let Err(err) = result {
            fallback(&err, text);
        }
    }

    /// Re-measure and redraw after the terminal changed size.
    pub fn on_resize(&self) {
        if let Err(err) = lock(&self.mux).on_resize() {
            report(&err);
        }
    }

    /// Flush, restore the cursor and stop redrawing, even with indicators
    /// still running. Safe to call at any time.
    pub fn shutdown(&self) {
        if let Err(err) = lock(&self.mux).shutdown() {
            report(&err);
        }
    }

    /// A guard that calls [`Output::shutdown`] when dropped.
    pub fn guard(&self) -> OutputGuard {
        OutputGuard {
            output: self.clone(),
        }
    }

    fn ensure_tickers(&self, mux: &mut Multiplexer) {
        if !mux.is_active() || mux.has_tickers() {
            return;
        }
        match Tickers::spawn(&Arc::downgrade(&self.mux), self.config.interval) {
            Ok(tickers) => mux.install_tickers(tickers),
            Err(err) => {
                report(&err);
                if let Err(err) = mux.shutdown() {
                    report(&err);
                }
            }
        }
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

/// Restores the terminal when dropped.
#[derive(Debug)]
pub struct OutputGuard {
    output: Output,
}

impl Drop for OutputGuard {
    fn drop(&mut self) {
        self.output.shutdown();
    }
}

/// Where an indicator's renders go, fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorKind {
    /// No terminal: start and finish are written as plain lines
    NonInteractive,
    /// Redrawn in place by the multiplexer
    Terminal,
}

/// Owner's handle to one indicator.
///
/// A handle that is started and never finished keeps the multiplexer
/// redrawing for the life of the process.
#[derive(Debug)]
pub struct ProgressHandle {
    indicator: SharedIndicator,
    kind: IndicatorKind,
    output: Output,
}

impl ProgressHandle {
    /// Which rendering path this indicator uses.
    pub fn kind(&self) -> IndicatorKind {
        self.kind
    }

    /// Current lifecycle state.
    pub fn state(&self) -> IndicatorState {
        lock(&self.indicator).state()
    }

    /// Current text.
    pub fn text(&self) -> String {
        lock(&self.indicator).text().to_string()
    }

    /// What the next frame will show for this indicator.
    pub fn render(&self) -> String {
        lock(&self.indicator).render()
    }

    /// Start the indicator. Only the first call has an effect.
    pub fn start(&self) {
        match self.kind {
            IndicatorKind::NonInteractive => {
                let line = {
                    let mut indicator = lock(&self.indicator);
                    if !indicator.start(Instant::now()) {
                        return;
                    }
                    indicator.render()
                };
                self.output.emit_line(&line);
            }
            IndicatorKind::Terminal => {
                let mut mux = lock(&self.output.mux);
                if !lock(&self.indicator).start(Instant::now()) {
                    return;
                }
                let result = mux.register(Arc::clone(&self.indicator));
                self.output.ensure_tickers(&mut mux);
                if let Err(err) = result {
                    report(&err);
                }
            }
        }
    }

    /// Replace the text. Ignored once finished.
    pub fn update(&self, text: impl Into<String>) {
        lock(&self.indicator).set_text(text);
    }

    /// Finish as successful, optionally with new text.
    pub fn success(&self, text: Option<&str>) {
        self.finish(Outcome::Success, text);
    }

    /// Finish as failed, optionally with new text.
    pub fn fail(&self, text: Option<&str>) {
        self.finish(Outcome::Failure, text);
    }

    /// Finish without an outcome.
    pub fn stop(&self) {
        self.finish(Outcome::Stopped, None);
    }

    fn finish(&self, outcome: Outcome, text: Option<&str>) {
        let now = Instant::now();
        let text = text.map(str::to_string);
        match self.kind {
            IndicatorKind::NonInteractive => {
                let line = {
                    let mut indicator = lock(&self.indicator);
                    if !indicator.finish(outcome, text, now) {
                        return;
                    }
                    indicator.render()
                };
                self.output.emit_line(&line);
            }
            IndicatorKind::Terminal => {
                let mut mux = lock(&self.output.mux);
                let line = {
                    let mut indicator = lock(&self.indicator);
                    if !indicator.finish(outcome, text, now) {
                        return;
                    }
                    indicator.render()
                };
                if let Err(err) = mux.retire(&self.indicator, line.clone()) {
                    fallback(&err, &line);
                }
            }
        }
    }
}
