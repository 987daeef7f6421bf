//! `sysfwd filter` command handler

use std::io::Write;

use serde::Serialize;
use tracing::{info, warn};

use sysfwd_core::config::SysfwdConfig;
use sysfwd_core::types::LogSource;
use sysfwd_forwarder::{SyslogForwarder, Verdict};

use crate::cli::{FilterAction, FilterArgs};
use crate::commands::{offline_forwarder, parse_level};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `filter` command.
pub fn execute(
    args: FilterArgs,
    config: &SysfwdConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match args.action {
        FilterAction::List => writer.render(&list(config)?),
        FilterAction::Check {
            tags,
            level,
            source,
        } => writer.render(&check(config, &tags, &level, source.into())?),
        FilterAction::Set { filter_string } => writer.render(&set(config, &filter_string)?),
        FilterAction::Clear => writer.render(&clear(config)?),
    }
}

/// Effective rule set after applying configuration and persisted state.
pub fn list(config: &SysfwdConfig) -> Result<FilterReport, CliError> {
    let (forwarder, _) = offline_forwarder(config)?;
    Ok(FilterReport::from_forwarder(&forwarder, config, None))
}

/// Evaluate each tag against every gate at the given level.
pub fn check(
    config: &SysfwdConfig,
    tags: &[String],
    level: &str,
    source: LogSource,
) -> Result<CheckReport, CliError> {
    let severity = parse_level(level)?;
    let (forwarder, _) = offline_forwarder(config)?;

    let results = tags
        .iter()
        .map(|tag| {
            let dropped_by = match forwarder.evaluate(source, severity, tag) {
                Verdict::Forward => None,
                Verdict::Drop(reason) => Some(reason.as_str().to_owned()),
            };
            TagVerdict {
                tag: tag.clone(),
                forwarded: dropped_by.is_none(),
                dropped_by,
            }
        })
        .collect();

    Ok(CheckReport {
        level: severity.name().to_owned(),
        source: source.as_str().to_owned(),
        mode: forwarder.filter_mode().as_str().to_owned(),
        results,
    })
}

/// Replace the persisted filter string.
pub fn set(config: &SysfwdConfig, filter_string: &str) -> Result<FilterReport, CliError> {
    require_state_path(config)?;
    let (forwarder, _) = offline_forwarder(config)?;

    let changed = forwarder.set_filter_string(filter_string);
    info!(changed, filter = %forwarder.filter_string(), "filter string updated");
    Ok(FilterReport::from_forwarder(&forwarder, config, Some(changed)))
}

/// Remove every persisted filter tag.
pub fn clear(config: &SysfwdConfig) -> Result<FilterReport, CliError> {
    require_state_path(config)?;
    let (forwarder, _) = offline_forwarder(config)?;

    let changed = !forwarder.filters().is_empty();
    forwarder.clear_filters();
    Ok(FilterReport::from_forwarder(&forwarder, config, Some(changed)))
}

fn require_state_path(config: &SysfwdConfig) -> Result<(), CliError> {
    if config.syslog.filter_state_path.is_none() {
        return Err(CliError::Command(
            "syslog.filter_state_path is not set; filter changes would not persist".to_owned(),
        ));
    }
    if configured_filters_override(config) {
        warn!("configured filters take precedence over the persisted filter string at startup");
    }
    Ok(())
}

fn configured_filters_override(config: &SysfwdConfig) -> bool {
    !config.syslog.filter_string.trim().is_empty() || !config.syslog.filters.is_empty()
}

/// Current rule set.
#[derive(Debug, Serialize)]
pub struct FilterReport {
    /// Filter mode (`include` / `exclude`)
    pub mode: String,
    /// Rule tags, sorted
    pub tags: Vec<String>,
    /// Canonical filter string
    pub filter_string: String,
    /// Persisted state file, if configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_path: Option<String>,
    /// Whether configured filters shadow the persisted state
    pub overridden_by_config: bool,
    /// Whether this command changed the rule set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changed: Option<bool>,
}

impl FilterReport {
    fn from_forwarder(
        forwarder: &SyslogForwarder,
        config: &SysfwdConfig,
        changed: Option<bool>,
    ) -> Self {
        Self {
            mode: forwarder.filter_mode().as_str().to_owned(),
            tags: forwarder.filters(),
            filter_string: forwarder.filter_string(),
            state_path: config.syslog.filter_state_path.clone(),
            overridden_by_config: configured_filters_override(config),
            changed,
        }
    }
}

impl Render for FilterReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Filter mode: {}", self.mode.bold())?;
        if self.tags.is_empty() {
            let effect = if self.mode == "include" {
                "nothing is forwarded"
            } else {
                "everything is forwarded"
            };
            writeln!(w, "  Tags: (none, {})", effect)?;
        } else {
            writeln!(w, "  Tags: {}", self.tags.join(", "))?;
        }
        if let Some(ref path) = self.state_path {
            writeln!(w, "  State: {}", path)?;
        }
        if self.overridden_by_config {
            writeln!(
                w,
                "  {}",
                "configured filters take precedence over persisted state".yellow()
            )?;
        }
        match self.changed {
            Some(true) => writeln!(w, "  {}", "updated".green())?,
            Some(false) => writeln!(w, "  unchanged")?,
            None => {}
        }
        Ok(())
    }
}

/// Result of `filter check`.
#[derive(Debug, Serialize)]
pub struct CheckReport {
    /// Severity the tags were evaluated at
    pub level: String,
    /// Entry point the tags were evaluated for
    pub source: String,
    /// Filter mode in effect
    pub mode: String,
    /// One verdict per tag, in argument order
    pub results: Vec<TagVerdict>,
}

/// Verdict for one tag.
#[derive(Debug, Serialize)]
pub struct TagVerdict {
    pub tag: String,
    pub forwarded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dropped_by: Option<String>,
}

impl Render for CheckReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(
            w,
            "Filter check at {} ({} source, {} mode)",
            self.level.bold(),
            self.source,
            self.mode
        )?;
        for result in &self.results {
            match result.dropped_by {
                None => writeln!(w, "  {:<24} {}", result.tag, "FORWARD".green())?,
                Some(ref reason) => writeln!(
                    w,
                    "  {:<24} {} ({})",
                    result.tag,
                    "DROP".red(),
                    reason
                )?,
            }
        }
        Ok(())
    }
}
