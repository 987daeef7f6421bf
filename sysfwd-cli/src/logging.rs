//! Logging initialization for the sysfwd CLI.
//!
//! Configures `tracing-subscriber` based on the `[general]` section
//! of `SysfwdConfig`. Diagnostics go to stderr so command output on stdout
//! stays machine-readable.

use anyhow::Result;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use sysfwd_core::config::GeneralConfig;
use sysfwd_forwarder::ForwarderLayer;

/// Initialize the global tracing subscriber.
///
/// Must be called exactly once, before any tracing macros are used.
///
/// The level filter applies to the stderr output only. When `forwarder` is
/// given, every event also reaches the forwarder, whose own level gate and
/// tag filter decide what leaves the host.
///
/// # Formats
///
/// * `"json"` - Machine-parseable JSON lines
/// * `"pretty"` - Human-readable colored output
pub fn init_tracing(config: &GeneralConfig, forwarder: Option<ForwarderLayer>) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let fmt_layer = match config.log_format.as_str() {
        "json" => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(env_filter)
            .boxed(),
        "pretty" => tracing_subscriber::fmt::layer()
            .pretty()
            .with_writer(std::io::stderr)
            .with_filter(env_filter)
            .boxed(),
        _ => {
            return Err(anyhow::anyhow!(
                "unknown log format '{}', expected 'json' or 'pretty'",
                config.log_format
            ));
        }
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(forwarder)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing subscriber: {}", e))?;

    Ok(())
}

/// Resolve the effective `[general]` section, applying a `--log-level` override.
pub fn effective_general(base: &GeneralConfig, log_level: Option<&str>) -> GeneralConfig {
    let mut general = base.clone();
    if let Some(level) = log_level {
        general.log_level = level.to_owned();
    }
    general
}
