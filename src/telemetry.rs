//! Tracing and error-report setup for binaries embedding the crate.

use tracing_error::ErrorLayer;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global tracing subscriber.
///
/// Respects `RUST_LOG`; without it, only warnings from this crate and
/// errors from everything else are shown. Call once at startup, before the
/// first run. Returns an error if a subscriber is already installed.
pub fn init_tracing() -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("error,relaygraph=warn"))
        .unwrap_or_default();

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(ErrorLayer::default())
        .try_init()
}

/// Install miette's pretty panic hook so crashes render with the same
/// report style as diagnostics.
pub fn init_panic_reports() {
    miette::set_panic_hook();
}
