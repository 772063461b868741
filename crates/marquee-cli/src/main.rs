//! marquee - run commands behind live terminal spinners

use anyhow::{Context, Result};
use clap::Parser;
use marquee_cli::cmd::demo::DemoOptions;
use marquee_cli::cmd::run::RunOptions;
use marquee_cli::{Cli, Commands, cmd};
use marquee_core::Output;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config().context("invalid MARQUEE_* environment")?;
    tracing::debug!(?config, "starting");

    let output = Output::new(config);
    let guard = output.guard();

    // Restore the cursor if interrupted mid-frame.
    let interrupted = output.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupted.shutdown();
            std::process::exit(130);
        }
    });

    let failed = match cli.command {
        Commands::Run {
            commands,
            show_date,
            no_duration,
            max_lines,
            quiet,
        } => {
            let opts = RunOptions {
                show_date,
                show_duration: !no_duration,
                max_lines: if quiet { Some(0) } else { max_lines },
            };
            cmd::run::run(&output, &commands, &opts).await
        }
        Commands::Demo {
            tasks,
            steps,
            step_ms,
            fail,
        } => {
            let opts = DemoOptions {
                tasks,
                steps,
                step: Duration::from_millis(step_ms),
                fail,
            };
            cmd::demo::demo(&output, &opts).await
        }
    };

    drop(guard);
    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}
