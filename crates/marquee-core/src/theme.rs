//! Indicator theme - glyphs and colors
//!
//! This module defines the visual elements an indicator is built from:
//! - Colors
//! - Icons (spinner frames and terminal glyphs)
//! - Elapsed-time formatting
//!
//! Styling is applied here, before strings reach the multiplexer, which
//! treats every rendered string as opaque.

use crate::indicator::{IndicatorOptions, Prefix};
use crossterm::style::{Color, Stylize};
use std::time::Duration;

/// Default theme for indicators
#[derive(Debug, Clone, Default)]
pub struct Theme {
    /// Colors for different states
    pub colors: ColorScheme,
    /// Status icons
    pub icons: Icons,
}

impl Theme {
    /// Indicator options using this theme's glyphs, styled when `color` is set.
    pub fn indicator_options(&self, color: bool) -> IndicatorOptions {
        let paint = |glyph: &str, tint: Color| {
            if color {
                glyph.with(tint).to_string()
            } else {
                glyph.to_string()
            }
        };

        IndicatorOptions {
            prefix: Prefix::Inherit,
            show_date: false,
            show_duration: false,
            running_icon: self
                .icons
                .running
                .iter()
                .map(|frame| paint(frame, self.colors.active))
                .collect(),
            success_icon: paint(self.icons.success, self.colors.success),
            fail_icon: paint(self.icons.error, self.colors.error),
            stop_icon: paint(self.icons.stopped, self.colors.secondary),
        }
    }

    /// Dim `text` when `color` is set.
    pub fn secondary(&self, text: &str, color: bool) -> String {
        if color {
            text.with(self.colors.secondary).to_string()
        } else {
            text.to_string()
        }
    }
}

/// Color scheme for indicator states
#[derive(Debug, Clone)]
pub struct ColorScheme {
    /// Running spinner
    pub active: Color,
    /// Success states
    pub success: Color,
    /// Error states
    pub error: Color,
    /// Stopped indicators and secondary info
    pub secondary: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            active: Color::Cyan,
            success: Color::Green,
            error: Color::Red,
            secondary: Color::DarkGrey,
        }
    }
}

/// Braille spinner frames.
pub const SPINNER: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Status icons for different states
#[derive(Debug, Clone)]
pub struct Icons {
    /// Running animation frames
    pub running: &'static [&'static str],
    /// Success/completed state (✓)
    pub success: &'static str,
    /// Error/failed state (✗)
    pub error: &'static str,
    /// Stopped without an outcome (■)
    pub stopped: &'static str,
}

impl Default for Icons {
    fn default() -> Self {
        Self {
            running: SPINNER,
            success: "✓",
            error: "✗",
            stopped: "■",
        }
    }
}

/// Format an elapsed duration for display
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs >= 60 {
        format!("{}m {:02}s", secs / 60, secs % 60)
    } else {
        format!("{:.1}s", elapsed.as_secs_f64())
    }
}
