use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable holding the log filter, e.g. `REMIT_LOG=remit=debug`.
pub const LOG_ENV: &str = "REMIT_LOG";

/// Initialize tracing for the binary.
///
/// `REMIT_LOG` wins when set; otherwise `info`, or `debug` with `verbose`.
/// Logs go to stderr so command output on stdout stays machine readable.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

    // A second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
