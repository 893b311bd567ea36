//! Tracing subscriber setup.

use std::sync::Once;

use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt;

use crate::config::LoggingSettings;

static INIT: Once = Once::new();

/// Install the global fmt subscriber. Safe to call multiple times.
///
/// `RUST_LOG` wins when set and valid; otherwise `settings.level` is used.
pub fn init(settings: &LoggingSettings) {
    INIT.call_once(|| {
        let filter = build_filter(std::env::var("RUST_LOG").ok().as_deref(), &settings.level);
        // A host application may already have installed one.
        let _ = fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
    });
}

fn build_filter(rust_log: Option<&str>, level: &str) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_new(level).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}
