//! Progress indicator state
//!
//! An [`Indicator`] is the state behind one spinner line: its label, icon,
//! timestamps and lifecycle. It knows how to render itself but nothing about
//! where the rendering goes; [`ProgressHandle`](crate::ProgressHandle) routes
//! it either through the multiplexer or straight to the stream.

use crate::theme::{Theme, format_elapsed};
use chrono::{DateTime, Local};
use std::time::Instant;

/// Lifecycle of an indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorState {
    /// Created, not yet started
    Pending,
    /// Animating
    Running,
    /// Finished with `success`
    Succeeded,
    /// Finished with `fail`
    Failed,
    /// Finished with a bare `stop`
    Stopped,
}

impl IndicatorState {
    /// Whether no further transitions are possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Stopped)
    }
}

/// How an indicator finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Completed successfully
    Success,
    /// Failed
    Failure,
    /// Stopped without an outcome
    Stopped,
}

/// What precedes the icon.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Prefix {
    /// Use the output's configured label, if any
    #[default]
    Inherit,
    /// Use this text
    Text(String),
    /// No prefix at all
    Hidden,
}

/// Icon shown in front of the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Icon {
    /// A single glyph that never changes
    Fixed(String),
    /// Animation frames and the frame currently shown
    Animated {
        /// Frames in display order
        frames: Vec<String>,
        /// Index into `frames`
        index: usize,
    },
}

impl Icon {
    /// Animated icon positioned at its first frame.
    pub fn animated(frames: Vec<String>) -> Self {
        if frames.is_empty() {
            Self::Fixed(String::new())
        } else {
            Self::Animated { frames, index: 0 }
        }
    }

    /// The glyph currently displayed.
    pub fn glyph(&self) -> &str {
        match self {
            Self::Fixed(glyph) => glyph,
            Self::Animated { frames, index } => &frames[*index],
        }
    }

    /// Current frame index (always 0 for fixed icons).
    pub fn index(&self) -> usize {
        match self {
            Self::Fixed(_) => 0,
            Self::Animated { index, .. } => *index,
        }
    }

    /// Step to the next frame, wrapping around. Single-frame and fixed icons
    /// never change.
    pub fn advance(&mut self) {
        match self {
            Self::Animated { frames, index } if frames.len() > 1 => {
                *index = (*index + 1) % frames.len();
            }
            _ => {}
        }
    }
}

/// Rendering options for an indicator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorOptions {
    /// Prefix before everything else
    pub prefix: Prefix,
    /// Show a `[HH:MM:SS]` wall-clock timestamp
    pub show_date: bool,
    /// Show elapsed time after the text
    pub show_duration: bool,
    /// Animation frames while running
    pub running_icon: Vec<String>,
    /// Glyph after `success`
    pub success_icon: String,
    /// Glyph after `fail`
    pub fail_icon: String,
    /// Glyph after a bare `stop`
    pub stop_icon: String,
}

impl Default for IndicatorOptions {
    fn default() -> Self {
        Theme::default().indicator_options(false)
    }
}

impl IndicatorOptions {
    /// Replace the prefix.
    pub fn prefix(mut self, prefix: Prefix) -> Self {
        self.prefix = prefix;
        self
    }

    /// Toggle the wall-clock timestamp.
    pub fn show_date(mut self, show: bool) -> Self {
        self.show_date = show;
        self
    }

    /// Toggle the elapsed-time suffix.
    pub fn show_duration(mut self, show: bool) -> Self {
        self.show_duration = show;
        self
    }
}

/// State of one progress line.
#[derive(Debug)]
pub struct Indicator {
    state: IndicatorState,
    text: String,
    icon: Icon,
    prefix: Option<String>,
    started_at: Option<Instant>,
    stopped_at: Option<Instant>,
    options: IndicatorOptions,
}

impl Indicator {
    /// A pending indicator. `label` is used when the prefix is inherited.
    pub fn new(text: impl Into<String>, options: IndicatorOptions, label: Option<&str>) -> Self {
        let prefix = match &options.prefix {
            Prefix::Inherit => label.map(str::to_string),
            Prefix::Text(custom) => Some(custom.clone()),
            Prefix::Hidden => None,
        };
        Self {
            state: IndicatorState::Pending,
            text: text.into(),
            icon: Icon::animated(options.running_icon.clone()),
            prefix,
            started_at: None,
            stopped_at: None,
            options,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> IndicatorState {
        self.state
    }

    /// Current text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Current icon.
    pub fn icon(&self) -> &Icon {
        &self.icon
    }

    /// Move `Pending -> Running`. Returns `false` if already started.
    pub fn start(&mut self, now: Instant) -> bool {
        if self.state != IndicatorState::Pending {
            return false;
        }
        self.state = IndicatorState::Running;
        self.started_at = Some(now);
        true
    }

    /// Replace the text unless the indicator has finished.
    pub fn set_text(&mut self, text: impl Into<String>) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        self.text = text.into();
        true
    }

    /// Finish a running indicator. Returns `false` (and changes nothing) if
    /// it was never started or has already finished.
    pub fn finish(&mut self, outcome: Outcome, text: Option<String>, now: Instant) -> bool {
        if self.state != IndicatorState::Running {
            return false;
        }
        let (state, glyph) = match outcome {
            Outcome::Success => (IndicatorState::Succeeded, &self.options.success_icon),
            Outcome::Failure => (IndicatorState::Failed, &self.options.fail_icon),
            Outcome::Stopped => (IndicatorState::Stopped, &self.options.stop_icon),
        };
        self.icon = Icon::Fixed(glyph.clone());
        self.state = state;
        if let Some(text) = text {
            self.text = text;
        }
        self.stopped_at = Some(now);
        true
    }

    /// Advance the spinner by one frame while running.
    pub fn advance_frame(&mut self) {
        if self.state == IndicatorState::Running {
            self.icon.advance();
        }
    }

    /// Render as of now.
    pub fn render(&self) -> String {
        self.render_at(Instant::now(), Local::now())
    }

    /// Render as of `now`, stamping `wall` when timestamps are enabled.
    pub fn render_at(&self, now: Instant, wall: DateTime<Local>) -> String {
        let mut parts: Vec<String> = Vec::with_capacity(5);

        if let Some(prefix) = &self.prefix {
            parts.push(prefix.clone());
        }
        if self.options.show_date {
            parts.push(format!("[{}]", wall.format("%H:%M:%S")));
        }
        let glyph = self.icon.glyph();
        if !glyph.is_empty() {
            parts.push(glyph.to_string());
        }
        parts.push(self.text.clone());
        if let Some(started) = self.started_at.filter(|_| self.options.show_duration) {
            let end = self.stopped_at.unwrap_or(now);
            parts.push(format!(
                "({})",
                format_elapsed(end.saturating_duration_since(started))
            ));
        }

        parts.join(" ")
    }
}
