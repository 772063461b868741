//! Terminal Multiplexer - one frame at a time
//!
//! The multiplexer owns the stream while any indicator is live. Every write
//! goes through a frame:
//!
//! ```text
//!   erase previous live region  (occupied_rows rows)
//!   pending plain lines         (arrival order, each ends the row)
//!   live indicator renders      (registration order, cursor stays on the last)
//! ```
//!
//! Plain lines scroll away into the history; only the live region is erased
//! by the next frame. `occupied_rows` is the height of that region at the
//! width it was last measured against and is recomputed whenever the width
//! changes, so the erase always matches how the terminal wrapped it.
//!
//! The multiplexer never spawns anything itself. [`Output`](crate::Output)
//! installs the tickers that call [`Multiplexer::animation_tick`] and
//! [`Multiplexer::redraw_tick`]; tests call them directly.

use crate::buffer::FrameBuffer;
use crate::error::{TermError, fallback};
use crate::height::block_rows;
use crate::indicator::Indicator;
use crate::screen::Screen;
use crate::ticker::Tickers;
use crate::writer::TerminalWriter;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace};

/// Indicator state shared between its handle and the live set.
pub type SharedIndicator = Arc<Mutex<Indicator>>;

/// Lock a mutex, recovering the data if a holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Whether the multiplexer currently owns the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No live indicators; plain lines are written immediately
    Idle,
    /// Redrawing periodically; plain lines are buffered
    Active,
}

/// Scheduler state for live indicators on one stream.
#[derive(Debug)]
pub struct Multiplexer {
    writer: TerminalWriter,
    screen: Arc<dyn Screen>,
    live: Vec<SharedIndicator>,
    pending: FrameBuffer,
    /// Rows taken by `last_region` at `width`.
    occupied_rows: usize,
    last_region: Vec<String>,
    width: u16,
    phase: Phase,
    cursor_hidden: bool,
    tickers: Option<Tickers>,
    frames: u64,
}

impl Multiplexer {
    /// An idle multiplexer writing through `writer`.
    pub fn new(writer: TerminalWriter, screen: Arc<dyn Screen>) -> Self {
        let width = screen.width();
        Self {
            writer,
            screen,
            live: Vec::new(),
            pending: FrameBuffer::new(),
            occupied_rows: 0,
            last_region: Vec::new(),
            width,
            phase: Phase::Idle,
            cursor_hidden: false,
            tickers: None,
            frames: 0,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether periodic mode is on.
    pub fn is_active(&self) -> bool {
        self.phase == Phase::Active
    }

    /// Rows the last frame's live region occupies at the current width.
    pub fn occupied_rows(&self) -> usize {
        self.occupied_rows
    }

    /// Number of live indicators.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Number of plain lines waiting for the next frame.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Frames successfully written since creation.
    pub fn frames_written(&self) -> u64 {
        self.frames
    }

    /// Whether tickers are installed.
    pub fn has_tickers(&self) -> bool {
        self.tickers.is_some()
    }

    pub(crate) fn install_tickers(&mut self, tickers: Tickers) {
        self.tickers = Some(tickers);
    }

    /// Add a started indicator to the live set, entering periodic mode with
    /// an immediate frame if idle.
    ///
    /// The indicator is registered even if that first frame fails to write.
    ///
    /// # Errors
    ///
    /// Returns the write error of the activation frame.
    pub fn register(&mut self, indicator: SharedIndicator) -> Result<(), TermError> {
        if self.live.iter().any(|live| Arc::ptr_eq(live, &indicator)) {
            return Ok(());
        }
        self.live.push(indicator);
        if self.phase == Phase::Idle {
            debug!("entering periodic mode");
            self.phase = Phase::Active;
            self.width = self.screen.width();
            self.redraw()?;
        }
        Ok(())
    }

    /// Remove a finished indicator and keep its final render in the history.
    ///
    /// When idle (after a forced shutdown) the render is written at once.
    ///
    /// # Errors
    ///
    /// Fails only if an immediate write fails.
    pub fn retire(
        &mut self,
        indicator: &SharedIndicator,
        final_render: String,
    ) -> Result<(), TermError> {
        self.live.retain(|live| !Arc::ptr_eq(live, indicator));
        self.append_plain_line(final_render)
    }

    /// Queue a plain line for the next frame, or write it now when idle.
    ///
    /// # Errors
    ///
    /// Fails only if an immediate write fails.
    pub fn append_plain_line(&mut self, text: impl Into<String>) -> Result<(), TermError> {
        let text = text.into();
        match self.phase {
            Phase::Active => {
                self.pending.push(text);
                Ok(())
            }
            Phase::Idle => {
                self.writer.write_line(&text);
                self.writer.commit()?;
                Ok(())
            }
        }
    }

    /// Advance every live spinner by one frame. Writes nothing.
    pub fn animation_tick(&mut self) {
        if self.phase == Phase::Idle {
            return;
        }
        for indicator in &self.live {
            lock(indicator).advance_frame();
        }
    }

    /// Draw one frame. When no indicator is left this frame is the final
    /// flush and the multiplexer returns to idle.
    ///
    /// # Errors
    ///
    /// Returns the write error. State is kept so the next tick retries.
    pub fn redraw_tick(&mut self) -> Result<Phase, TermError> {
        if self.phase == Phase::Idle {
            return Ok(Phase::Idle);
        }
        if self.live.is_empty() {
            self.flush_and_teardown()?;
        } else {
            self.redraw()?;
        }
        Ok(self.phase)
    }

    /// Re-measure the last live region at the current width, then redraw.
    ///
    /// # Errors
    ///
    /// Returns the write error of the redraw.
    pub fn on_resize(&mut self) -> Result<(), TermError> {
        self.sync_width();
        if self.phase == Phase::Active {
            self.redraw()?;
        }
        Ok(())
    }

    /// Leave periodic mode now: live indicators keep their current render
    /// in the history and the cursor is shown again. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns the write error of the final frame. There is no retry after
    /// a shutdown, so the pending lines go to stderr as plain text and the
    /// multiplexer is released anyway; the cursor is shown again on drop.
    pub fn shutdown(&mut self) -> Result<(), TermError> {
        if self.phase == Phase::Idle {
            return Ok(());
        }
        for indicator in std::mem::take(&mut self.live) {
            let render = lock(&indicator).render();
            self.pending.push(render);
        }
        let result = self.flush_and_teardown();
        if let Err(err) = &result {
            for line in self.pending.iter() {
                fallback(err, line);
            }
            self.pending.clear();
            self.release();
        }
        result
    }

    fn sync_width(&mut self) {
        let width = self.screen.width();
        if width != self.width {
            let before = self.occupied_rows;
            self.width = width;
            self.occupied_rows = block_rows(&self.last_region, width);
            debug!(width, before, after = self.occupied_rows, "terminal resized");
        }
    }

    /// Queue the erase of the last region and the pending lines; returns the
    /// live renders to draw after them.
    fn queue_frame(&mut self) -> Result<Vec<String>, TermError> {
        self.sync_width();
        if !self.cursor_hidden {
            self.writer.hide_cursor()?;
        }
        self.writer.erase_rows(self.occupied_rows)?;
        for line in self.pending.iter() {
            self.writer.write_line(line);
        }
        Ok(self.live.iter().map(|i| lock(i).render()).collect())
    }

    fn redraw(&mut self) -> Result<(), TermError> {
        let region = match self.queue_frame() {
            Ok(region) => region,
            Err(err) => {
                self.writer.discard();
                return Err(err);
            }
        };
        self.writer.write_str(&region.join("\n"));
        self.writer.commit()?;

        self.pending.clear();
        self.occupied_rows = block_rows(&region, self.width);
        self.last_region = region;
        self.cursor_hidden = true;
        self.frames += 1;
        trace!(rows = self.occupied_rows, live = self.live.len(), "frame written");
        Ok(())
    }

    /// Final frame: erase the region, write what is pending, show the cursor,
    /// cancel the tickers and go idle, all in one write.
    ///
    /// On a failed write nothing changes, so the next redraw tick repeats
    /// the whole frame.
    fn flush_and_teardown(&mut self) -> Result<(), TermError> {
        let queued = self.queue_frame().and_then(|_| {
            if self.cursor_hidden {
                self.writer.show_cursor()?;
            }
            Ok(())
        });
        if let Err(err) = queued.and_then(|()| self.writer.commit().map_err(TermError::from)) {
            self.writer.discard();
            return Err(err);
        }

        self.frames += 1;
        self.pending.clear();
        self.cursor_hidden = false;
        self.release();
        Ok(())
    }

    /// Cancel the tickers and go idle.
    fn release(&mut self) {
        if let Some(tickers) = self.tickers.take() {
            tickers.cancel();
        }
        self.occupied_rows = 0;
        self.last_region.clear();
        self.phase = Phase::Idle;
        debug!("periodic mode ended");
    }
}

impl Drop for Multiplexer {
    fn drop(&mut self) {
        if self.cursor_hidden {
            let _ = self.writer.show_cursor();
            let _ = self.writer.commit();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::height::rows;
    use crate::indicator::{IndicatorOptions, Outcome};
    use crate::screen::FixedScreen;
    use crate::writer::capture::{CLEAR_LINE, Capture, HIDE, SHOW};
    use std::time::Instant;

    struct Rig {
        mux: Multiplexer,
        capture: Capture,
        screen: FixedScreen,
    }

    fn rig(width: u16) -> Rig {
        let capture = Capture::default();
        let screen = FixedScreen::new(width);
        let mux = Multiplexer::new(
            TerminalWriter::new(Box::new(capture.clone())),
            Arc::new(screen.clone()),
        );
        Rig {
            mux,
            capture,
            screen,
        }
    }

    fn frames(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("<{i}>")).collect()
    }

    fn started(text: &str) -> SharedIndicator {
        let options = IndicatorOptions {
            running_icon: frames(4),
            ..IndicatorOptions::default()
        };
        let mut indicator = Indicator::new(text, options, None);
        indicator.start(Instant::now());
        Arc::new(Mutex::new(indicator))
    }

    fn finish(
        mux: &mut Multiplexer,
        indicator: &SharedIndicator,
        outcome: Outcome,
        text: Option<&str>,
    ) {
        let render = {
            let mut ind = lock(indicator);
            assert!(ind.finish(outcome, text.map(str::to_string), Instant::now()));
            ind.render()
        };
        mux.retire(indicator, render).unwrap();
    }

    /// Text written after the last erase sequence of a frame.
    fn after_erase(frame: &str) -> &str {
        frame.rsplit(CLEAR_LINE).next().unwrap_or(frame)
    }

    #[test]
    fn test_idle_lines_are_written_immediately() {
        let mut r = rig(80);
        r.mux.append_plain_line("hello").unwrap();
        assert_eq!(r.capture.take(), "hello\n");
        assert_eq!(r.mux.phase(), Phase::Idle);
    }

    #[test]
    fn test_register_activates_and_draws() {
        let mut r = rig(80);
        r.mux.register(started("Building")).unwrap();

        assert!(r.mux.is_active());
        assert_eq!(r.mux.frames_written(), 1);
        assert_eq!(r.capture.take(), format!("{HIDE}<0> Building"));
        assert_eq!(r.mux.occupied_rows(), 1);
    }

    #[test]
    fn test_register_twice_is_ignored() {
        let mut r = rig(80);
        let a = started("a");
        r.mux.register(Arc::clone(&a)).unwrap();
        r.mux.register(a).unwrap();
        assert_eq!(r.mux.live_count(), 1);
    }

    #[test]
    fn test_lines_are_buffered_while_active() {
        let mut r = rig(80);
        r.mux.register(started("a")).unwrap();
        r.capture.take();

        r.mux.append_plain_line("note").unwrap();
        assert_eq!(r.capture.text(), "");
        assert_eq!(r.mux.pending_len(), 1);

        r.mux.redraw_tick().unwrap();
        assert_eq!(r.mux.pending_len(), 0);
        assert!(r.capture.text().contains("note\n"));
    }

    #[test]
    fn test_frame_order() {
        let mut r = rig(80);
        let a = started("A");
        let b = started("B");
        r.mux.register(Arc::clone(&a)).unwrap();
        r.mux.register(Arc::clone(&b)).unwrap();
        r.mux.append_plain_line("note").unwrap();
        r.mux.append_plain_line("second").unwrap();
        r.capture.take();

        r.mux.redraw_tick().unwrap();
        let frame = r.capture.take();
        assert_eq!(after_erase(&frame), "note\nsecond\n<0> A\n<0> B");

        // B finishing first does not reorder A.
        finish(&mut r.mux, &b, Outcome::Success, None);
        r.mux.redraw_tick().unwrap();
        let frame = r.capture.take();
        assert_eq!(after_erase(&frame), "✓ B\n<0> A");
    }

    #[test]
    fn test_erase_matches_previous_frame() {
        let mut r = rig(10);
        let a = started("a much longer label");
        r.mux.register(Arc::clone(&a)).unwrap();
        r.mux.register(started("b")).unwrap();
        r.mux.redraw_tick().unwrap();
        r.capture.take();

        let expected = rows("<0> a much longer label", 10) + rows("<0> b", 10);
        assert_eq!(r.mux.occupied_rows(), expected);

        lock(&a).set_text("short");
        r.mux.redraw_tick().unwrap();
        assert_eq!(r.capture.take().matches(CLEAR_LINE).count(), expected);
        assert_eq!(r.mux.occupied_rows(), 2);

        r.mux.redraw_tick().unwrap();
        assert_eq!(r.capture.take().matches(CLEAR_LINE).count(), 2);
    }

    #[test]
    fn test_resize_uses_new_width() {
        let mut r = rig(40);
        r.mux.register(started("x".repeat(26).as_str())).unwrap();
        assert_eq!(r.mux.occupied_rows(), 1);
        r.capture.take();

        r.screen.set_width(10);
        r.mux.redraw_tick().unwrap();
        let frame = r.capture.take();
        assert_eq!(frame.matches(CLEAR_LINE).count(), 3);
        assert_eq!(r.mux.occupied_rows(), 3);
    }

    #[test]
    fn test_on_resize_redraws_at_once() {
        let mut r = rig(40);
        r.mux.register(started("x".repeat(26).as_str())).unwrap();
        r.capture.take();

        r.screen.set_width(15);
        r.mux.on_resize().unwrap();
        assert_eq!(r.mux.frames_written(), 2);
        assert_eq!(r.capture.take().matches(CLEAR_LINE).count(), 2);
    }

    #[test]
    fn test_animation_tick_cycles() {
        let mut r = rig(80);
        let a = started("spin");
        r.mux.register(Arc::clone(&a)).unwrap();

        r.mux.animation_tick();
        assert_eq!(lock(&a).icon().index(), 1);
        for _ in 0..3 {
            r.mux.animation_tick();
        }
        assert_eq!(lock(&a).icon().index(), 0);
    }

    #[test]
    fn test_animation_tick_writes_nothing() {
        let mut r = rig(80);
        r.mux.register(started("spin")).unwrap();
        let commits = r.capture.commits();
        r.mux.animation_tick();
        assert_eq!(r.capture.commits(), commits);
    }

    #[test]
    fn test_success_scenario() {
        let mut r = rig(80);
        let a = started("Building");
        r.mux.register(Arc::clone(&a)).unwrap();
        for _ in 0..3 {
            r.mux.animation_tick();
        }
        r.mux.redraw_tick().unwrap();
        assert!(r.capture.text().ends_with("<3> Building"));
        r.capture.take();

        finish(&mut r.mux, &a, Outcome::Success, Some("Built"));
        assert_eq!(r.mux.live_count(), 0);

        let phase = r.mux.redraw_tick().unwrap();
        assert_eq!(phase, Phase::Idle);
        assert_eq!(r.mux.occupied_rows(), 0);

        let frame = r.capture.take();
        assert_eq!(frame.matches(CLEAR_LINE).count(), 1);
        assert!(frame.ends_with(&format!("✓ Built\n{SHOW}")));
        assert!(!frame.contains("<3>"));
    }

    #[test]
    fn test_teardown_produces_exactly_one_frame() {
        let mut r = rig(80);
        let a = started("a");
        r.mux.register(Arc::clone(&a)).unwrap();
        finish(&mut r.mux, &a, Outcome::Stopped, None);

        let before = r.capture.commits();
        r.mux.redraw_tick().unwrap();
        assert_eq!(r.capture.commits(), before + 1);

        r.mux.redraw_tick().unwrap();
        r.mux.animation_tick();
        assert_eq!(r.capture.commits(), before + 1);

        let out = r.capture.text();
        assert_eq!(out.matches(HIDE).count(), out.matches(SHOW).count());
    }

    #[test]
    fn test_reactivation_after_teardown() {
        let mut r = rig(80);
        let a = started("a");
        r.mux.register(Arc::clone(&a)).unwrap();
        finish(&mut r.mux, &a, Outcome::Success, None);
        r.mux.redraw_tick().unwrap();
        r.capture.take();

        r.mux.register(started("b")).unwrap();
        assert!(r.mux.is_active());
        assert_eq!(r.capture.take(), format!("{HIDE}<0> b"));
    }

    #[test]
    fn test_write_failure_leaves_state_for_retry() {
        let mut r = rig(80);
        r.mux.register(started("a")).unwrap();
        r.mux.append_plain_line("queued").unwrap();
        let frames = r.mux.frames_written();

        r.capture.set_failing(true);
        assert!(r.mux.redraw_tick().is_err());
        assert_eq!(r.mux.frames_written(), frames);
        assert_eq!(r.mux.pending_len(), 1);
        assert_eq!(r.mux.occupied_rows(), 1);

        r.capture.set_failing(false);
        r.capture.take();
        r.mux.redraw_tick().unwrap();
        let frame = r.capture.take();
        assert_eq!(frame.matches(CLEAR_LINE).count(), 1);
        assert!(frame.contains("queued\n"));
    }

    #[test]
    fn test_failed_first_frame_hides_cursor_on_retry() {
        let mut r = rig(80);
        r.capture.set_failing(true);
        assert!(r.mux.register(started("a")).is_err());
        assert!(r.mux.is_active());

        r.capture.set_failing(false);
        r.mux.redraw_tick().unwrap();
        assert!(r.capture.text().starts_with(HIDE));
    }

    #[test]
    fn test_failed_teardown_is_retried() {
        let mut r = rig(80);
        let a = started("Building");
        r.mux.register(Arc::clone(&a)).unwrap();
        finish(&mut r.mux, &a, Outcome::Success, Some("Built"));
        r.capture.take();

        r.capture.set_failing(true);
        assert!(r.mux.redraw_tick().is_err());
        assert!(r.mux.is_active());
        assert_eq!(r.mux.pending_len(), 1);
        assert_eq!(r.mux.occupied_rows(), 1);

        r.capture.set_failing(false);
        assert_eq!(r.mux.redraw_tick().unwrap(), Phase::Idle);
        r.mux.animation_tick();

        let out = r.capture.take();
        assert_eq!(out.matches(CLEAR_LINE).count(), 1);
        assert!(out.ends_with(&format!("✓ Built\n{SHOW}")), "{out:?}");
    }

    #[test]
    fn test_failed_shutdown_releases_and_shows_cursor_on_drop() {
        let Rig { mut mux, capture, .. } = rig(80);
        mux.register(started("a")).unwrap();
        mux.append_plain_line("note").unwrap();
        capture.take();

        capture.set_failing(true);
        assert!(mux.shutdown().is_err());
        assert_eq!(mux.phase(), Phase::Idle);
        assert_eq!(mux.pending_len(), 0);
        assert_eq!(mux.live_count(), 0);

        capture.set_failing(false);
        drop(mux);
        assert_eq!(capture.take(), SHOW);
    }

    #[test]
    fn test_shutdown_keeps_live_renders() {
        let mut r = rig(80);
        let a = started("a");
        r.mux.register(Arc::clone(&a)).unwrap();
        r.capture.take();

        r.mux.shutdown().unwrap();
        assert_eq!(r.mux.phase(), Phase::Idle);
        let out = r.capture.take();
        assert!(out.ends_with(&format!("<0> a\n{SHOW}")));

        // A late stop after shutdown lands directly in the stream.
        finish(&mut r.mux, &a, Outcome::Success, None);
        assert_eq!(r.capture.take(), "✓ a\n");

        r.mux.shutdown().unwrap();
        assert_eq!(r.capture.text(), "");
    }

    #[test]
    fn test_row_count_invariant_over_many_frames() {
        let mut r = rig(12);
        let a = started("alpha");
        r.mux.register(Arc::clone(&a)).unwrap();
        r.mux.register(started("beta")).unwrap();

        let labels = ["x", "a label that wraps twice over", "", "mid length text"];
        let widths = [12, 7, 30, 12];
        for (step, (label, width)) in labels.into_iter().zip(widths).enumerate() {
            let previous = r.mux.last_region.clone();
            lock(&a).set_text(label);
            r.mux.append_plain_line(format!("log {step}")).unwrap();
            r.screen.set_width(width);
            r.capture.take();

            r.mux.redraw_tick().unwrap();
            let frame = r.capture.take();
            assert_eq!(
                frame.matches(CLEAR_LINE).count(),
                block_rows(&previous, width)
            );

            let marker = format!("log {step}\n");
            let (_, region) = after_erase(&frame).split_once(&marker).unwrap();
            assert_eq!(r.mux.occupied_rows(), rows(region, width));
        }
    }
}
