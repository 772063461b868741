//! Terminal detection
//!
//! The multiplexer only needs two facts about the terminal: whether it can
//! be redrawn in place at all, and how wide it is right now.

use crate::config::Stream;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};

/// Width used when the terminal size cannot be queried.
pub const FALLBACK_WIDTH: u16 = 80;

/// What the multiplexer knows about the terminal.
pub trait Screen: Send + Sync + fmt::Debug {
    /// Whether the stream supports cursor control and has a column width.
    fn is_interactive(&self) -> bool;

    /// Current width in columns.
    fn width(&self) -> u16;
}

/// The real terminal behind a standard stream.
#[derive(Debug, Clone, Copy)]
pub struct TerminalScreen {
    stream: Stream,
    force: Option<bool>,
}

impl TerminalScreen {
    /// Detect from `stream`, unless `force` decides interactivity.
    pub fn new(stream: Stream, force: Option<bool>) -> Self {
        Self { stream, force }
    }
}

impl Screen for TerminalScreen {
    fn is_interactive(&self) -> bool {
        self.force.unwrap_or_else(|| {
            self.stream.is_terminal() && crossterm::terminal::size().is_ok_and(|(cols, _)| cols > 0)
        })
    }

    fn width(&self) -> u16 {
        match crossterm::terminal::size() {
            Ok((cols, _)) if cols > 0 => cols,
            _ => FALLBACK_WIDTH,
        }
    }
}

/// A screen with a settable width, for driving the multiplexer by hand.
///
/// Clones share the same width, so a test can keep one and resize the
/// terminal under a running output.
#[derive(Debug, Clone)]
pub struct FixedScreen {
    interactive: Arc<AtomicBool>,
    width: Arc<AtomicU16>,
}

impl FixedScreen {
    /// An interactive screen `width` columns wide.
    pub fn new(width: u16) -> Self {
        Self {
            interactive: Arc::new(AtomicBool::new(true)),
            width: Arc::new(AtomicU16::new(width)),
        }
    }

    /// A screen that reports no terminal.
    pub fn non_interactive() -> Self {
        let screen = Self::new(FALLBACK_WIDTH);
        screen.interactive.store(false, Ordering::Relaxed);
        screen
    }

    /// Change the width, as a terminal resize would.
    pub fn set_width(&self, width: u16) {
        self.width.store(width, Ordering::Relaxed);
    }
}

impl Screen for FixedScreen {
    fn is_interactive(&self) -> bool {
        self.interactive.load(Ordering::Relaxed)
    }

    fn width(&self) -> u16 {
        self.width.load(Ordering::Relaxed)
    }
}
