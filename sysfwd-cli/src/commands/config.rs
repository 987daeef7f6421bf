//! `sysfwd config` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use sysfwd_core::config::SysfwdConfig;
use sysfwd_forwarder::ForwarderConfig;

use crate::cli::{ConfigAction, ConfigArgs};
use crate::commands::load_config;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `config` command.
pub async fn execute(
    args: ConfigArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match args.action {
        ConfigAction::Validate => execute_validate(config_path, writer).await,
        ConfigAction::Show { section } => execute_show(config_path, section, writer).await,
    }
}

/// Load, validate and resolve the configuration, reporting any errors.
///
/// Besides the TOML checks this resolves the syslog section into a
/// forwarder configuration, so an unresolvable server address or client id
/// is reported here instead of at startup.
async fn execute_validate(config_path: &Path, writer: &OutputWriter) -> Result<(), CliError> {
    info!(path = %config_path.display(), "validating configuration");

    let report = validate(config_path).await;
    writer.render(&report)?;

    if !report.valid {
        return Err(CliError::Config("configuration is invalid".to_owned()));
    }

    Ok(())
}

/// Build a validation report for the file at `config_path`.
pub async fn validate(config_path: &Path) -> ConfigValidationReport {
    let result = match SysfwdConfig::load(config_path).await {
        Ok(config) => ForwarderConfig::from_core(&config.syslog)
            .map(|resolved| resolved.server.to_string())
            .map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    };

    let source = config_path.display().to_string();
    match result {
        Ok(endpoint) => ConfigValidationReport {
            source,
            valid: true,
            endpoint: Some(endpoint),
            errors: Vec::new(),
        },
        Err(e) => ConfigValidationReport {
            source,
            valid: false,
            endpoint: None,
            errors: vec![e],
        },
    }
}

async fn execute_show(
    config_path: &Path,
    section: Option<String>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    info!(path = %config_path.display(), "loading configuration");

    let config = load_config(config_path).await?;
    let report = show(&config, config_path, section.as_deref())?;
    writer.render(&report)?;

    Ok(())
}

/// Render the effective configuration, optionally a single section.
pub fn show(
    config: &SysfwdConfig,
    config_path: &Path,
    section: Option<&str>,
) -> Result<ConfigReport, CliError> {
    let config_toml = match section {
        None => toml::to_string_pretty(config),
        Some("general") => toml::to_string_pretty(&config.general),
        Some("syslog") => toml::to_string_pretty(&config.syslog),
        Some("metrics") => toml::to_string_pretty(&config.metrics),
        Some(other) => {
            return Err(CliError::Command(format!(
                "unknown section: {} (expected: general, syslog, metrics)",
                other
            )));
        }
    }
    .unwrap_or_else(|e| format!("(serialization error: {})", e));

    Ok(ConfigReport {
        source: config_path.display().to_string(),
        section: section.map(str::to_owned),
        config_toml,
    })
}

/// Configuration display report.
///
/// The `config_toml` field is skipped during JSON serialization (only used for text rendering).
#[derive(Debug, Serialize)]
pub struct ConfigReport {
    /// Configuration file path
    pub source: String,
    /// Optional section name (None = full config)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    /// Serialized TOML configuration
    #[serde(skip)]
    pub config_toml: String,
}

impl Render for ConfigReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        if let Some(ref section) = self.section {
            let section_label = format!("[{}]", section);
            writeln!(
                w,
                "Configuration {} (source: {})",
                section_label.bold(),
                self.source
            )?;
        } else {
            writeln!(w, "Configuration (source: {})", self.source.bold())?;
        }

        writeln!(w)?;
        write!(w, "{}", self.config_toml)?;

        Ok(())
    }
}

/// Configuration validation report.
#[derive(Serialize)]
pub struct ConfigValidationReport {
    /// Configuration file path
    pub source: String,
    /// Whether the configuration is valid
    pub valid: bool,
    /// Resolved syslog endpoint (valid configurations only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Validation error messages (empty if valid)
    pub errors: Vec<String>,
}

impl Render for ConfigValidationReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Config Validation: {}", self.source.bold())?;

        if self.valid {
            writeln!(w, "  Result: {}", "VALID".green().bold())?;
            if let Some(ref endpoint) = self.endpoint {
                writeln!(w, "  Endpoint: {}", endpoint)?;
            }
        } else {
            writeln!(w, "  Result: {}", "INVALID".red().bold())?;
            for err in &self.errors {
                writeln!(w, "  Error: {}", err.red())?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(report: &impl Render) -> String {
        let mut buffer = Vec::new();
        report
            .render_text(&mut buffer)
            .expect("text rendering should succeed");
        String::from_utf8(buffer).expect("valid UTF-8")
    }

    #[test]
    fn test_show_full_config() {
        let report = show(&SysfwdConfig::default(), Path::new("sysfwd.toml"), None).unwrap();
        assert!(report.section.is_none());
        assert!(report.config_toml.contains("[syslog]"));
        assert!(report.config_toml.contains("server_address"));
        assert!(report.config_toml.contains("[metrics]"));
    }

    #[test]
    fn test_show_single_section() {
        let report = show(
            &SysfwdConfig::default(),
            Path::new("sysfwd.toml"),
            Some("metrics"),
        )
        .unwrap();
        assert_eq!(report.section.as_deref(), Some("metrics"));
        assert!(report.config_toml.contains("port = 9514"));
        assert!(!report.config_toml.contains("server_address"));

        let output = render(&report);
        assert!(output.contains("[metrics]"), "should show section name");
    }

    #[test]
    fn test_show_unknown_section() {
        let err = show(&SysfwdConfig::default(), Path::new("x.toml"), Some("ebpf")).unwrap_err();
        assert!(err.to_string().contains("unknown section: ebpf"));
    }

    #[test]
    fn test_config_report_json_skips_toml() {
        let report = ConfigReport {
            source: "test.toml".to_owned(),
            section: Some("syslog".to_owned()),
            config_toml: "port = 514".to_owned(),
        };

        let json = serde_json::to_value(&report).expect("JSON serialization should succeed");
        assert_eq!(json["source"].as_str(), Some("test.toml"));
        assert_eq!(json["section"].as_str(), Some("syslog"));
        assert!(json.get("config_toml").is_none(), "config_toml should be skipped");
    }

    #[test]
    fn test_validation_report_valid() {
        let report = ConfigValidationReport {
            source: "sysfwd.toml".to_owned(),
            valid: true,
            endpoint: Some("10.0.0.1:514".to_owned()),
            errors: Vec::new(),
        };
        let output = render(&report);
        assert!(output.contains("VALID"));
        assert!(output.contains("10.0.0.1:514"));
        assert!(!output.contains("Error:"));
    }

    #[test]
    fn test_validation_report_invalid() {
        let report = ConfigValidationReport {
            source: "bad.toml".to_owned(),
            valid: false,
            endpoint: None,
            errors: vec!["invalid value for 'syslog.port'".to_owned()],
        };
        let output = render(&report);
        assert!(output.contains("INVALID"));
        assert!(output.contains("syslog.port"));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["valid"], false);
        assert!(json.get("endpoint").is_none());
    }
}
