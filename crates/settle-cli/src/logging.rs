//! Tracing subscriber setup
//!
//! `RUST_LOG` wins when set and valid; otherwise the filter follows `-q`/`-v`.

use crate::config::{ColorChoice, Verbosity};
use tracing_subscriber::EnvFilter;

fn filter(verbosity: Verbosity) -> EnvFilter {
    let default_level = verbosity.log_filter();
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Install the global subscriber, writing to stderr
///
/// With `json` each event is one JSON object per line. A second call is a
/// no-op.
pub fn init(verbosity: Verbosity, color: ColorChoice, json: bool) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter(verbosity))
        .with_writer(std::io::stderr)
        .with_target(verbosity.is_verbose());
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.with_ansi(color.should_color()).try_init()
    };
}
