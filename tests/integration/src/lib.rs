//! Integration tests against a live BSD Tools install.
//!
//! These tests need real credentials and are marked `#[ignore]` so they don't
//! run during normal `cargo test`. Set `BSD_API_ID`, `BSD_API_SECRET` and
//! `BSD_API_BASEURL`, then run:
//!
//! ```text
//! cargo test -p bsdtools-integration -- --ignored
//! ```

use std::sync::Once;

use bsdtools_client::{Client, ClientConfig};

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Create a client from the `BSD_API_*` environment variables.
///
/// # Panics
///
/// Panics if the environment does not describe a valid client.
#[must_use]
pub fn live_client() -> Client {
    init_tracing();

    let config = ClientConfig::from_env().expect("valid BSD_* environment");
    Client::from_config(&config)
        .unwrap_or_else(|e| panic!("failed to create client for {}: {e}", config.base_url))
}

mod test_constituents;
mod test_deferred;
