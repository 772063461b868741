//! Periodic ticks - Timer threads driving the multiplexer
//!
//! Each ticker is a dedicated thread that sleeps on its cancellation channel
//! with the tick interval as timeout, the same loop shape as a UI actor
//! driving animation off `recv_timeout`. A tick takes the multiplexer lock,
//! so ticks and the synchronous entry points never overlap.
//!
//! Cancellation never joins: the canceller usually holds the lock the ticker
//! is waiting on. Instead the ticker re-checks its channel after acquiring
//! the lock, so a cancelled ticker never touches a later activation.

use crate::error::{TermError, report};
use crate::mux::{Multiplexer, Phase, lock};
use std::ops::ControlFlow;
use std::sync::mpsc::{self, RecvTimeoutError, TryRecvError};
use std::sync::{Mutex, Weak};
use std::thread;
use std::time::Duration;
use tracing::trace;

/// One periodic task.
#[derive(Debug)]
pub struct Ticker {
    name: &'static str,
    cancel: mpsc::Sender<()>,
    _handle: thread::JoinHandle<()>,
}

impl Ticker {
    /// Spawn a thread calling `tick` every `interval` until it breaks, the
    /// ticker is cancelled, or the multiplexer is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`TermError::Ticker`] if the thread cannot be spawned.
    pub fn spawn<F>(
        name: &'static str,
        interval: Duration,
        target: Weak<Mutex<Multiplexer>>,
        mut tick: F,
    ) -> Result<Self, TermError>
    where
        F: FnMut(&mut Multiplexer) -> ControlFlow<()> + Send + 'static,
    {
        let (cancel, cancelled) = mpsc::channel::<()>();

        let handle = thread::Builder::new()
            .name(format!("marquee-{name}"))
            .spawn(move || {
                loop {
                    match cancelled.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {}
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                    let Some(shared) = target.upgrade() else {
                        break;
                    };
                    let mut mux = lock(&shared);
                    if !matches!(cancelled.try_recv(), Err(TryRecvError::Empty)) {
                        break;
                    }
                    if tick(&mut mux).is_break() {
                        break;
                    }
                }
                trace!(ticker = name, "ticker stopped");
            })
            .map_err(|source| TermError::Ticker { name, source })?;

        Ok(Self {
            name,
            cancel,
            _handle: handle,
        })
    }

    /// Ask the thread to stop. It exits at its next wake-up.
    pub fn cancel(self) {
        trace!(ticker = self.name, "cancelling ticker");
        let _ = self.cancel.send(());
    }
}

/// The animation and redraw tickers of one activation.
#[derive(Debug)]
pub struct Tickers {
    animation: Ticker,
    redraw: Ticker,
}

impl Tickers {
    /// Start both tickers against `target`.
    ///
    /// # Errors
    ///
    /// Fails if either thread cannot be spawned; no ticker is left running.
    pub fn spawn(target: &Weak<Mutex<Multiplexer>>, interval: Duration) -> Result<Self, TermError> {
        let animation = Ticker::spawn("animation", interval, target.clone(), |mux| {
            mux.animation_tick();
            if mux.is_active() {
                ControlFlow::Continue(())
            } else {
                ControlFlow::Break(())
            }
        })?;
        let redraw = Ticker::spawn("redraw", interval, target.clone(), |mux| {
            match mux.redraw_tick() {
                Ok(Phase::Idle) => ControlFlow::Break(()),
                Ok(Phase::Active) => ControlFlow::Continue(()),
                Err(err) => {
                    report(&err);
                    if mux.is_active() {
                        ControlFlow::Continue(())
                    } else {
                        ControlFlow::Break(())
                    }
                }
            }
        });
        match redraw {
            Ok(redraw) => Ok(Self { animation, redraw }),
            Err(err) => {
                animation.cancel();
                Err(err)
            }
        }
    }

    /// Cancel both tickers.
    pub fn cancel(self) {
        self.animation.cancel();
        self.redraw.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screen::FixedScreen;
    use crate::writer::TerminalWriter;
    use crate::writer::capture::Capture;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    fn shared_mux() -> Arc<Mutex<Multiplexer>> {
        Arc::new(Mutex::new(Multiplexer::new(
            TerminalWriter::new(Box::new(Capture::default())),
            Arc::new(FixedScreen::new(80)),
        )))
    }

    fn spawn_test<F>(mux: &Arc<Mutex<Multiplexer>>, tick: F) -> Ticker
    where
        F: FnMut(&mut Multiplexer) -> ControlFlow<()> + Send + 'static,
    {
        Ticker::spawn("test", Duration::from_millis(2), Arc::downgrade(mux), tick).unwrap()
    }

    fn wait_for(mut done: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if done() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn test_ticker_runs_until_break() {
        let mux = shared_mux();
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);

        let _ticker = spawn_test(&mux, move |_| {
            if seen.fetch_add(1, Ordering::SeqCst) + 1 >= 3 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });

        assert!(wait_for(|| count.load(Ordering::SeqCst) == 3));
        thread::sleep(Duration::from_millis(30));
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_cancel_stops_ticks() {
        let mux = shared_mux();
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);

        let ticker = spawn_test(&mux, move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
            ControlFlow::Continue(())
        });
        assert!(wait_for(|| count.load(Ordering::SeqCst) > 0));

        {
            // Cancel while holding the lock, as teardown does.
            let _guard = lock(&mux);
            ticker.cancel();
        }
        thread::sleep(Duration::from_millis(20));
        let after = count.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(30));
        assert_eq!(count.load(Ordering::SeqCst), after);
    }

    #[test]
    fn test_ticker_exits_when_mux_dropped() {
        let mux = shared_mux();
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let _ticker = spawn_test(&mux, move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
            ControlFlow::Continue(())
        });

        drop(mux);
        thread::sleep(Duration::from_millis(20));
        let after = count.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(20));
        assert_eq!(count.load(Ordering::SeqCst), after);
    }
}
