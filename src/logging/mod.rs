// Logging module for structured logging using the tracing crate

use std::error::Error;
use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset or invalid
const DEFAULT_LOG_FILTER: &str = "info";

/// Initialize the tracing subscriber for structured logging
///
/// The subscriber is configured with:
/// - JSON formatting for easy parsing by log aggregation systems
/// - Filtering from `RUST_LOG` (default: info)
/// - Output to stderr, so page data and `--json` responses on stdout stay clean
///
/// Calling this more than once is harmless: if a global subscriber is
/// already installed the existing one is kept.
///
/// # Examples
///
/// ```
/// use pagemark::logging::init_subscriber;
///
/// init_subscriber().expect("Failed to initialize logging");
/// tracing::info!("Application started");
/// ```
pub fn init_subscriber() -> Result<(), Box<dyn Error>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let result = tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_current_span(false)
        .try_init();

    if let Err(e) = result {
        // Another subscriber won the race; keep it
        tracing::debug!(error = %e, "Tracing subscriber already initialized");
    }

    Ok(())
}
