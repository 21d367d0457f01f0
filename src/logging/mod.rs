//! Tracing and logging infrastructure.
//!
//! Call [`setup_tracing`] once at startup. Output goes to stderr as plain text
//! without ANSI colors, filtered by `RUST_LOG` (default `info`):
//!
//! ```text
//! WARN  wordnames::wordlist: Empty content on configured page: Wordnames [WORDNAMES@local]
//! ```

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

mod format;

/// Initializes the tracing subscriber with console output.
///
/// # Panics
///
/// Panics if a global subscriber has already been installed.
pub fn setup_tracing() {
    Registry::default().with(setup_console_layer()).init();
    tracing::info!("Tracing initialized successfully [reporting to console only]");
}

fn setup_console_layer() -> Box<dyn Layer<Registry> + Send + Sync + 'static> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .event_format(format::DeploymentLogFormat::from_env())
        .with_filter(filter)
        .boxed()
}
