//! Pending plain lines
//!
//! While indicators are live every log line goes through this queue and is
//! written at the top of the next frame, so plain output never lands in the
//! middle of a spinner row.

use std::collections::VecDeque;

/// Plain lines produced since the last redraw, in arrival order.
#[derive(Debug, Default, Clone)]
pub struct FrameBuffer {
    lines: VecDeque<String>,
}

impl FrameBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a line behind everything already pending.
    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push_back(line.into());
    }

    /// Pending lines, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    /// Number of pending lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Forget every pending line (after they reached the terminal).
    pub fn clear(&mut self) {
        self.lines.clear();
    }
}
