//! Logging setup utilities for the TCP chat relay.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber with the specified default log level.
///
/// Every target in `targets` (library crates and the binary itself) gets
/// `default_log_level`. The whole filter can be overridden with `RUST_LOG`.
///
/// # Examples
///
/// ```no_run
/// use tcpchat_shared::logger::setup_logger;
///
/// setup_logger(&["tcpchat_server", "tcpchat"], "info");
/// ```
pub fn setup_logger(targets: &[&str], default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(targets, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn default_filter(targets: &[&str], default_log_level: &str) -> String {
    targets
        .iter()
        .map(|target| format!("{}={}", target.replace('-', "_"), default_log_level))
        .collect::<Vec<_>>()
        .join(",")
}
