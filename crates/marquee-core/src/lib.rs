//! marquee-core - live progress indicators sharing one terminal stream
//!
//! Several spinners and ordinary log lines can be written to the same
//! terminal without tearing each other's rows. While any indicator is live
//! the multiplexer owns the stream: it redraws every indicator in place on a
//! fixed tick and prints buffered log lines above them. When the last
//! indicator finishes it flushes, shows the cursor again and steps aside.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │   Callers   │  (commands, tasks, loggers)
//! └──────┬──────┘
//!        │ uses
//!        ▼
//! ┌─────────────┐
//! │   Output    │  Public API: begin_indicator, emit_line
//! └──────┬──────┘
//!        │ locks
//!        ▼
//! ┌─────────────┐      ┌─────────────┐
//! │ Multiplexer │ ◀─── │   Tickers   │  animation + redraw threads
//! └──────┬──────┘      └─────────────┘
//!        │ frames
//!        ▼
//! ┌─────────────┐
//! │   Writer    │  Control sequences, one write per frame
//! └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`height`] - rows a rendered string occupies at a width
//! - [`buffer`] - plain lines waiting for the next frame
//! - [`indicator`] - one indicator's state and rendering
//! - [`mux`] - the frame scheduler
//! - [`ticker`] - periodic ticks
//! - [`writer`] - control sequences and atomic frames
//! - [`screen`] - terminal detection
//! - [`output`] - public API
//! - [`sink`] - line sink trait and the call-limiting decorator
//! - [`theme`] - glyphs and colors
//!
//! # Example
//!
//! ```no_run
//! use marquee_core::{Config, Output};
//!
//! let output = Output::new(Config::default());
//! let _guard = output.guard();
//!
//! let fetch = output.spinner("Fetching index");
//! let build = output.spinner("Building");
//! output.emit_line("using cached toolchain");
//!
//! fetch.success(Some("Fetched index"));
//! build.fail(Some("Build failed"));
//! ```

pub mod buffer;
pub mod config;
pub mod error;
pub mod height;
pub mod indicator;
pub mod mux;
pub mod output;
pub mod screen;
pub mod sink;
pub mod theme;
pub mod ticker;
pub mod writer;

pub use config::{Config, Stream};
pub use error::{ConfigError, TermError};
pub use indicator::{IndicatorOptions, IndicatorState, Prefix};
pub use mux::Phase;
pub use output::{IndicatorKind, Output, OutputGuard, ProgressHandle};
pub use sink::{LineSink, Limited};
pub use theme::Theme;
