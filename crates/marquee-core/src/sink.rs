//! Line sinks for dependency injection
//!
//! Code that only produces log lines depends on [`LineSink`] rather than on
//! a concrete [`Output`], so it can be handed a decorated sink such as
//! [`Limited`].

use crate::output::Output;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Anything that accepts plain output lines.
pub trait LineSink: Send + Sync {
    /// Emit one line.
    fn emit_line(&self, text: &str);
}

impl LineSink for Output {
    fn emit_line(&self, text: &str) {
        Output::emit_line(self, text);
    }
}

impl<S: LineSink + ?Sized> LineSink for &S {
    fn emit_line(&self, text: &str) {
        (**self).emit_line(text);
    }
}

impl<S: LineSink + ?Sized> LineSink for Arc<S> {
    fn emit_line(&self, text: &str) {
        (**self).emit_line(text);
    }
}

/// Forwards the first `limit` lines and silently drops the rest.
#[derive(Debug)]
pub struct Limited<S> {
    inner: S,
    limit: usize,
    calls: AtomicUsize,
}

impl<S: LineSink> Limited<S> {
    /// Wrap `inner`, letting at most `limit` lines through.
    pub fn new(inner: S, limit: usize) -> Self {
        Self {
            inner,
            limit,
            calls: AtomicUsize::new(0),
        }
    }

    /// Lines dropped so far.
    pub fn suppressed(&self) -> usize {
        self.calls.load(Ordering::Relaxed).saturating_sub(self.limit)
    }

    /// Lines that will still be forwarded.
    pub fn remaining(&self) -> usize {
        self.limit.saturating_sub(self.calls.load(Ordering::Relaxed))
    }

    /// The wrapped sink.
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: LineSink> LineSink for Limited<S> {
    fn emit_line(&self, text: &str) {
        let previous = self
            .calls
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| {
                Some(n.saturating_add(1))
            })
            .unwrap_or(usize::MAX);
        if previous < self.limit {
            self.inner.emit_line(text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct Recorder {
        lines: Mutex<Vec<String>>,
    }

    impl LineSink for Recorder {
        fn emit_line(&self, text: &str) {
            self.lines.lock().unwrap().push(text.to_string());
        }
    }

    #[test]
    fn test_limited_forwards_first_n() {
        let limited = Limited::new(Recorder::default(), 2);
        for line in ["a", "b", "c", "d"] {
            limited.emit_line(line);
        }
        assert_eq!(*limited.inner().lines.lock().unwrap(), ["a", "b"]);
        assert_eq!(limited.suppressed(), 2);
        assert_eq!(limited.remaining(), 0);
    }

    #[test]
    fn test_limited_zero_drops_everything() {
        let limited = Limited::new(Recorder::default(), 0);
        limited.emit_line("a");
        assert!(limited.inner().lines.lock().unwrap().is_empty());
    }

    #[test]
    fn test_limited_through_arc_and_threads() {
        let limited = Arc::new(Limited::new(Recorder::default(), 10));
        let workers: Vec<_> = (0..4)
            .map(|i| {
                let sink = Arc::clone(&limited);
                std::thread::spawn(move || {
                    for j in 0..5 {
                        sink.emit_line(&format!("{i}-{j}"));
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }
        assert_eq!(limited.inner().lines.lock().unwrap().len(), 10);
        assert_eq!(limited.suppressed(), 10);
    }

    #[test]
    fn test_limited_wraps_a_reference() {
        let recorder = Recorder::default();
        {
            let limited = Limited::new(&recorder, 1);
            limited.emit_line("kept");
            limited.emit_line("dropped");
        }
        assert_eq!(*recorder.lines.lock().unwrap(), ["kept"]);
    }
}
