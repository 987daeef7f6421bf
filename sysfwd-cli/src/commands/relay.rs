//! `sysfwd relay` command handler
//!
//! Reads stdin line by line and hands each line to the forwarder as a direct
//! log. The CLI's own tracing events reach the forwarder through the logger
//! hook installed in `main`. With `--watch-filter`, a background task polls a
//! file and publishes its content as the live filter string.

use std::future::Future;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use sysfwd_core::types::Severity;
use sysfwd_forwarder::{DynamicText, StatsSnapshot, SyslogForwarder};

use crate::cli::RelayArgs;
use crate::commands::parse_level;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `relay` command.
pub async fn execute(
    args: RelayArgs,
    forwarder: Arc<SyslogForwarder>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let severity = parse_level(&args.level)?;

    let watcher = args.watch_filter.map(|path| {
        let source = Arc::new(DynamicText::new(forwarder.filter_string()));
        forwarder.bind_filter_source(source.clone());
        let period = Duration::from_millis(args.watch_interval_ms.max(50));
        tokio::spawn(watch_filter_file(path, source, period))
    });

    info!(
        endpoint = %forwarder.endpoint(),
        tag = %args.tag,
        level = severity.name(),
        "relaying stdin"
    );

    let stdin = BufReader::new(tokio::io::stdin());
    let lines = relay_lines(stdin, &forwarder, &args.tag, severity, shutdown_signal()).await;

    if let Some(handle) = watcher {
        handle.abort();
    }

    let report = RelayReport {
        endpoint: forwarder.endpoint().to_string(),
        tag: args.tag,
        lines: lines?,
        stats: forwarder.stats(),
    };
    writer.render(&report)?;

    Ok(())
}

/// Forward every non-empty line from `reader` until EOF or `shutdown` resolves.
///
/// Returns the number of lines handed to the forwarder.
pub async fn relay_lines<R, F>(
    reader: R,
    forwarder: &SyslogForwarder,
    tag: &str,
    severity: Severity,
    shutdown: F,
) -> Result<u64, CliError>
where
    R: AsyncBufRead + Unpin,
    F: Future<Output = ()>,
{
    let mut lines = reader.lines();
    let mut relayed = 0u64;
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    debug!("stdin closed");
                    break;
                };
                let line = line.trim_end_matches('\r');
                if line.trim().is_empty() {
                    continue;
                }
                forwarder.log_direct(severity.as_u8(), tag, line);
                relayed += 1;
            }
            () = &mut shutdown => {
                info!("shutdown signal received, stopping relay");
                break;
            }
        }
    }

    Ok(relayed)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c, relaying until EOF");
        std::future::pending::<()>().await;
    }
}

/// Poll `path` and publish its trimmed content whenever it changes.
///
/// A missing file is not an error; the current rule set stays in place.
pub async fn watch_filter_file(path: PathBuf, source: Arc<DynamicText>, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    let mut last: Option<String> = None;

    loop {
        ticker.tick().await;
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => {
                let value = content.trim().to_owned();
                if last.as_deref() != Some(value.as_str()) {
                    info!(path = %path.display(), filter = %value, "filter file changed");
                    source.publish(value.clone());
                    last = Some(value);
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "filter file not found");
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read filter file");
            }
        }
    }
}

/// Summary printed when the relay stops.
#[derive(Debug, Serialize)]
pub struct RelayReport {
    /// Destination `host:port`
    pub endpoint: String,
    /// Tag applied to relayed lines
    pub tag: String,
    /// Lines read from stdin
    pub lines: u64,
    /// Forwarder counters at shutdown
    pub stats: StatsSnapshot,
}

impl Render for RelayReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Relay summary ({} -> {})", self.tag.bold(), self.endpoint)?;
        writeln!(w, "  Lines read:     {}", self.lines)?;
        writeln!(
            w,
            "  Received:       {} (logger {}, direct {})",
            self.stats.received(),
            self.stats.received_logger,
            self.stats.received_direct
        )?;
        writeln!(w, "  Sent:           {}", self.stats.sent.to_string().green())?;
        writeln!(
            w,
            "  Dropped:        {} (disabled {}, source {}, level {}, filter {})",
            self.stats.dropped(),
            self.stats.dropped_disabled,
            self.stats.dropped_source,
            self.stats.dropped_level,
            self.stats.dropped_filter
        )?;
        if self.stats.send_failures > 0 {
            writeln!(
                w,
                "  Send failures:  {}",
                self.stats.send_failures.to_string().red()
            )?;
        }
        writeln!(w, "  Truncated:      {}", self.stats.truncated)?;
        writeln!(w, "  Filter reloads: {}", self.stats.filter_reloads)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sysfwd_forwarder::{ForwarderConfigBuilder, MemoryTransport};

    fn setup() -> (Arc<SyslogForwarder>, Arc<MemoryTransport>) {
        let capture = Arc::new(MemoryTransport::new("127.0.0.1:514".parse().unwrap()));
        let forwarder = SyslogForwarder::builder()
            .config(
                ForwarderConfigBuilder::new()
                    .client_id("relay")
                    .include_timestamp(false)
                    .build()
                    .unwrap(),
            )
            .transport(capture.clone())
            .build()
            .unwrap();
        (forwarder, capture)
    }

    #[tokio::test]
    async fn relays_non_empty_lines_until_eof() {
        let (forwarder, capture) = setup();
        let input: &[u8] = b"first\n\n  \nsecond\r\n";

        let lines = relay_lines(
            input,
            &forwarder,
            "app",
            Severity::Notice,
            std::future::pending(),
        )
        .await
        .unwrap();

        assert_eq!(lines, 2);
        let packets = capture.packets();
        assert_eq!(packets.len(), 2);
        assert_eq!(&packets[0][..], "<13>1 - relay app - - - \u{FEFF}first".as_bytes());
        assert_eq!(&packets[1][..], "<13>1 - relay app - - - \u{FEFF}second".as_bytes());
    }

    #[tokio::test]
    async fn shutdown_stops_before_reading() {
        let (forwarder, capture) = setup();
        let (_writer, reader) = tokio::io::duplex(64);

        let lines = relay_lines(
            BufReader::new(reader),
            &forwarder,
            "app",
            Severity::Notice,
            std::future::ready(()),
        )
        .await
        .unwrap();

        assert_eq!(lines, 0);
        assert!(capture.is_empty());
    }

    #[tokio::test]
    async fn filter_applies_to_relayed_lines() {
        let (forwarder, capture) = setup();
        forwarder.add_filter("app");

        let lines = relay_lines(
            &b"hidden\n"[..],
            &forwarder,
            "app",
            Severity::Error,
            std::future::pending(),
        )
        .await
        .unwrap();

        assert_eq!(lines, 1);
        assert!(capture.is_empty());
        assert_eq!(forwarder.stats().dropped_filter, 1);
    }

    #[tokio::test]
    async fn watcher_publishes_file_changes() {
        let (forwarder, _) = setup();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("filters");
        std::fs::write(&path, "tagA, tagB\n").unwrap();

        let source = Arc::new(DynamicText::new(""));
        forwarder.bind_filter_source(source.clone());
        let handle = tokio::spawn(watch_filter_file(
            path.clone(),
            Arc::clone(&source),
            Duration::from_millis(10),
        ));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(forwarder.filters(), vec!["tagA", "tagB"]);

        std::fs::write(&path, "tagC").unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(forwarder.filters(), vec!["tagC"]);

        handle.abort();
    }

    #[test]
    fn report_text_lists_counters() {
        let report = RelayReport {
            endpoint: "127.0.0.1:514".to_owned(),
            tag: "stdin".to_owned(),
            lines: 3,
            stats: StatsSnapshot {
                received_direct: 3,
                sent: 2,
                dropped_filter: 1,
                ..Default::default()
            },
        };
        let mut buffer = Vec::new();
        report.render_text(&mut buffer).unwrap();
        let output = String::from_utf8(buffer).unwrap();

        assert!(output.contains("Lines read:     3"));
        assert!(output.contains("filter 1"));
        assert!(!output.contains("Send failures"));
    }
}
