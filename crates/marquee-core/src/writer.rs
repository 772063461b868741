//! Terminal Writer - Relative erase and atomic frames
//!
//! This module solves the "where is my cursor" problem the same way for
//! every frame: the cursor is left at the end of the last row drawn, so the
//! previous frame is erased by clearing that row and walking up one row at a
//! time. Every command is queued into an in-memory frame and reaches the
//! stream in a single write, so another writer can never interleave with
//! half a frame.

use crossterm::{
    QueueableCommand,
    cursor::{Hide, MoveToColumn, MoveUp, Show},
    terminal::{Clear, ClearType},
};
use std::fmt;
use std::io::{Result, Write};

/// Queues control sequences and text, then commits them as one write.
pub struct TerminalWriter {
    out: Box<dyn Write + Send>,
    frame: Vec<u8>,
}

impl fmt::Debug for TerminalWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TerminalWriter")
            .field("queued", &self.frame.len())
            .finish_non_exhaustive()
    }
}

impl TerminalWriter {
    /// Wrap an output stream.
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            out,
            frame: Vec::with_capacity(4096),
        }
    }

    /// Erase `rows` rows ending at the cursor, leaving it at column 0 of the
    /// topmost erased row.
    ///
    /// # Errors
    ///
    /// Fails if a control sequence cannot be encoded.
    pub fn erase_rows(&mut self, rows: usize) -> Result<()> {
        if rows == 0 {
            return Ok(());
        }
        self.frame
            .queue(MoveToColumn(0))?
            .queue(Clear(ClearType::CurrentLine))?;
        for _ in 1..rows {
            self.frame
                .queue(MoveUp(1))?
                .queue(Clear(ClearType::CurrentLine))?;
        }
        Ok(())
    }

    /// Hide the cursor.
    ///
    /// # Errors
    ///
    /// Fails if the control sequence cannot be encoded.
    pub fn hide_cursor(&mut self) -> Result<()> {
        self.frame.queue(Hide)?;
        Ok(())
    }

    /// Show the cursor.
    ///
    /// # Errors
    ///
    /// Fails if the control sequence cannot be encoded.
    pub fn show_cursor(&mut self) -> Result<()> {
        self.frame.queue(Show)?;
        Ok(())
    }

    /// Queue raw text.
    pub fn write_str(&mut self, text: &str) {
        self.frame.extend_from_slice(text.as_bytes());
    }

    /// Queue text followed by a line break.
    pub fn write_line(&mut self, text: &str) {
        self.write_str(text);
        self.frame.push(b'\n');
    }

    /// Drop everything queued since the last commit.
    pub fn discard(&mut self) {
        self.frame.clear();
    }

    /// Send the queued frame to the stream in one write and flush.
    ///
    /// The queue is emptied whether or not the write succeeds.
    ///
    /// # Errors
    ///
    /// Returns the stream's write or flush error.
    pub fn commit(&mut self) -> Result<()> {
        if self.frame.is_empty() {
            return Ok(());
        }
        let result = self
            .out
            .write_all(&self.frame)
            .and_then(|()| self.out.flush());
        self.frame.clear();
        result
    }
}
