//! Tracing setup for the taskrun binary

use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Directive used when `RUST_LOG` is unset.
///
/// `taskrun` also matches the `taskrun_*` library targets.
#[must_use]
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "taskrun=debug,info"
    } else {
        "taskrun=info,warn"
    }
}

/// Span lifecycle events to log; only verbose mode reports span timings.
fn span_events(verbose: bool) -> FmtSpan {
    if verbose {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    }
}

/// Initialize the global tracing subscriber.
///
/// Logs always go to stderr so that task output on stdout stays clean.
/// Verbose mode adds targets and span close events.
pub fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive(verbose)))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbose)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_line_number(false)
                .with_file(false)
                .with_span_events(span_events(verbose))
                .compact(),
        )
        .try_init()?;

    Ok(())
}
