//! Tracing setup helpers.
//!
//! Thin wrappers over `tracing-subscriber` so binaries embedding the engine
//! get a consistent setup. `RUST_LOG` wins over the passed default.

use tracing_subscriber::{fmt, EnvFilter};

fn env_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
}

/// Installs a human-readable subscriber. Safe to call more than once; later
/// calls are no-ops.
pub fn init_tracing(default_directive: &str) {
    let _ = fmt()
        .with_env_filter(env_filter(default_directive))
        .try_init();
}

/// Installs a JSON subscriber for machine-read logs.
pub fn init_json_tracing(default_directive: &str) {
    let _ = fmt()
        .json()
        .with_env_filter(env_filter(default_directive))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init_tracing("shipflow=debug");
        init_tracing("shipflow=info");
        tracing::info!("still alive");
    }
}
