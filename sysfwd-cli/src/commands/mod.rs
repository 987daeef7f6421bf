//! Command handlers -- one module per subcommand

pub mod config;
pub mod filter;
pub mod relay;
pub mod send;

use std::path::Path;
use std::sync::Arc;

use sysfwd_core::config::SysfwdConfig;
use sysfwd_core::types::Severity;
use sysfwd_forwarder::{ForwarderConfig, MemoryTransport, SyslogForwarder};

use crate::error::CliError;

/// Load `sysfwd.toml` with env overrides, mapping failures to a config error.
pub async fn load_config(path: &Path) -> Result<SysfwdConfig, CliError> {
    SysfwdConfig::load(path)
        .await
        .map_err(|e| CliError::Config(e.to_string()))
}

/// Parse a `--level` argument (name or 0-7).
pub fn parse_level(value: &str) -> Result<Severity, CliError> {
    Severity::parse_loose(value).ok_or_else(|| {
        CliError::Command(format!(
            "unknown level '{}' (expected EMERG..DEBUG or 0-7)",
            value
        ))
    })
}

/// Build a forwarder that sends over UDP to the configured server.
pub fn network_forwarder(config: &SysfwdConfig) -> Result<Arc<SyslogForwarder>, CliError> {
    let forwarder_config = ForwarderConfig::from_core(&config.syslog)?;
    Ok(SyslogForwarder::builder().config(forwarder_config).build()?)
}

/// Build a forwarder whose packets are captured in memory instead of sent.
///
/// The persisted filter state (if configured) is still read and written.
pub fn offline_forwarder(
    config: &SysfwdConfig,
) -> Result<(Arc<SyslogForwarder>, Arc<MemoryTransport>), CliError> {
    let forwarder_config = ForwarderConfig::from_core(&config.syslog)?;
    let capture = Arc::new(MemoryTransport::new(forwarder_config.server));
    let forwarder = SyslogForwarder::builder()
        .config(forwarder_config)
        .transport(capture.clone())
        .build()?;
    Ok((forwarder, capture))
}
