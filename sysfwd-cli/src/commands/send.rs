//! `sysfwd send` command handler

use std::io::Write;

use serde::Serialize;
use tracing::info;

use sysfwd_core::config::SysfwdConfig;
use sysfwd_core::types::LogSource;
use sysfwd_forwarder::{SyslogForwarder, Verdict};

use crate::cli::SendArgs;
use crate::commands::{network_forwarder, offline_forwarder, parse_level};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `send` command.
pub fn execute(
    args: SendArgs,
    config: &SysfwdConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let report = send_message(&args, config)?;
    writer.render(&report)?;

    if report.failed {
        return Err(CliError::Command(format!(
            "failed to send to {}",
            report.endpoint
        )));
    }
    Ok(())
}

/// Push one message through the pipeline and describe what happened.
///
/// With `dry_run` the packet is captured in memory and returned in the report.
pub fn send_message(args: &SendArgs, config: &SysfwdConfig) -> Result<SendReport, CliError> {
    let severity = parse_level(&args.level)?;

    let (forwarder, capture) = if args.dry_run {
        let (forwarder, capture) = offline_forwarder(config)?;
        (forwarder, Some(capture))
    } else {
        (network_forwarder(config)?, None)
    };

    let verdict = forwarder.evaluate(LogSource::Direct, severity, &args.tag);
    forwarder.log_direct(severity.as_u8(), &args.tag, &args.message);

    let stats = forwarder.stats();
    let packet = capture.and_then(|capture| {
        capture
            .packets()
            .first()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    });

    info!(tag = %args.tag, level = severity.name(), sent = stats.sent, "send finished");

    Ok(SendReport::new(
        &forwarder,
        &args.tag,
        severity.name(),
        verdict,
        args.dry_run,
        packet,
        stats.send_failures > 0,
    ))
}

/// Result of a single send.
#[derive(Debug, Serialize)]
pub struct SendReport {
    /// Destination `host:port`
    pub endpoint: String,
    /// Tag as given
    pub tag: String,
    /// Severity name
    pub level: String,
    /// Whether the event passed every gate
    pub forwarded: bool,
    /// Gate that rejected the event
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dropped_by: Option<String>,
    /// Whether the packet was captured instead of sent
    pub dry_run: bool,
    /// Captured packet text (dry run only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packet: Option<String>,
    /// Whether the socket send failed
    pub failed: bool,
}

impl SendReport {
    fn new(
        forwarder: &SyslogForwarder,
        tag: &str,
        level: &str,
        verdict: Verdict,
        dry_run: bool,
        packet: Option<String>,
        failed: bool,
    ) -> Self {
        let dropped_by = match verdict {
            Verdict::Forward => None,
            Verdict::Drop(reason) => Some(reason.as_str().to_owned()),
        };
        Self {
            endpoint: forwarder.endpoint().to_string(),
            tag: tag.to_owned(),
            level: level.to_owned(),
            forwarded: dropped_by.is_none(),
            dropped_by,
            dry_run,
            packet,
            failed,
        }
    }
}

impl Render for SendReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        let target = if self.dry_run {
            format!("{} (dry run)", self.endpoint)
        } else {
            self.endpoint.clone()
        };
        writeln!(w, "Send [{}] {} -> {}", self.level, self.tag.bold(), target)?;

        match (&self.dropped_by, self.failed) {
            (Some(reason), _) => {
                writeln!(w, "  Result: {} (by {} gate)", "DROPPED".yellow().bold(), reason)?
            }
            (None, true) => writeln!(w, "  Result: {}", "FAILED".red().bold())?,
            (None, false) => writeln!(w, "  Result: {}", "FORWARDED".green().bold())?,
        }

        if let Some(ref packet) = self.packet {
            writeln!(w, "  Packet: {}", packet.escape_debug())?;
        }

        Ok(())
    }
}
