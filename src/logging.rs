// Logging setup for the docvec CLI
// Console output is filtered by RUST_LOG (default "info"); a debug-level
// copy is appended to the log file under the config directory when possible.

use std::fs::OpenOptions;
use std::sync::{Arc, Once};

use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::Config;

static INIT: Once = Once::new();

/// Compact time format: HH:MM:SS.mmm
struct CompactTime;

impl FormatTime for CompactTime {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%H:%M:%S%.3f"))
    }
}

/// Initializes the global tracing subscriber. Safe to call more than once;
/// only the first call takes effect.
#[inline]
pub fn init() {
    INIT.call_once(|| {
        let console_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let console_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_timer(CompactTime)
            .with_writer(std::io::stderr)
            .with_filter(console_filter);

        let file_layer = open_log_file().map(|file| {
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_timer(CompactTime)
                .with_writer(Arc::new(file))
                .with_filter(EnvFilter::new("debug"))
        });

        tracing_subscriber::registry()
            .with(console_layer)
            .with(file_layer)
            .init();
    });
}

// Logging must come up even when the log file cannot, so failures here are
// swallowed rather than reported.
fn open_log_file() -> Option<std::fs::File> {
    let path = Config::log_file_path().ok()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok()?;
    }

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .ok()
}
