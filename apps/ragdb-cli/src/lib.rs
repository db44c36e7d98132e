//! Shared start-up for the `ragdb-*` binaries.

use ragdb_core::config::{Config, Settings};
use tracing_subscriber::EnvFilter;

/// `RUST_LOG` wins when set; otherwise `--verbose` picks debug over info.
pub fn init_logging(verbose: bool) {
    let default = if verbose { "ragdb=debug,ragdb_core=debug,ragdb_query=debug,ragdb_embed=debug,ragdb_vector=debug" } else { "warn,ragdb_query=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

pub fn load_settings() -> anyhow::Result<Settings> {
    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {e}");
        e
    })?;
    config.settings()
}
