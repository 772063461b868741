//! Demo command - simulated concurrent tasks

use futures::future::join_all;
use marquee_core::{Output, Theme};
use std::time::Duration;

/// Options for the demo command.
#[derive(Debug, Clone)]
pub struct DemoOptions {
    /// Number of tasks.
    pub tasks: usize,
    /// Steps per task.
    pub steps: usize,
    /// Base step delay; task N waits N times this per step.
    pub step: Duration,
    /// 1-based task that fails instead of succeeding.
    pub fail: Option<usize>,
}

/// Run the simulated tasks. Returns the number that failed.
pub async fn demo(output: &Output, opts: &DemoOptions) -> usize {
    let options = Theme::default().indicator_options(output.color());
    let tasks = (1..=opts.tasks).map(|n| {
        let options = options.clone();
        async move {
            let handle = output.begin_indicator(format!("task {n}: starting"), options);
            handle.start();
            let delay = opts.step.saturating_mul(u32::try_from(n).unwrap_or(u32::MAX));
            for step in 1..=opts.steps {
                tokio::time::sleep(delay).await;
                handle.update(format!("task {n}: step {step}/{}", opts.steps));
                if step % 5 == 0 {
                    output.emit_line(&format!("task {n} reached step {step}"));
                }
            }
            if opts.fail == Some(n) {
                handle.fail(Some(&format!("task {n} failed")));
                false
            } else {
                handle.success(Some(&format!("task {n} done")));
                true
            }
        }
    });
    join_all(tasks).await.into_iter().filter(|ok| !ok).count()
}
