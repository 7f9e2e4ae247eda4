//! FIPE Catalog application shell
//!
//! This is the thin shell that wires configuration, the data source and the
//! catalog store together and exposes them as commands. Core logic lives in
//! the `crates/` directory.

pub mod commands;
pub mod error;
pub mod state;

use tracing::info;

/// Command: Health check
pub fn health_check() -> String {
    info!("Health check called");
    "ok".to_string()
}

/// Command: Get application version
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Initialize tracing subscriber for logging.
///
/// `RUST_LOG` wins over `default_filter` when set.
pub fn init_tracing(default_filter: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // Logs go to stderr so command output on stdout stays machine readable
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}
