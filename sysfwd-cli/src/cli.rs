//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use sysfwd_core::types::LogSource;

/// sysfwd -- forward log lines to a remote syslog collector over UDP.
///
/// Use `sysfwd <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "sysfwd", version, about, long_about = None)]
pub struct Cli {
    /// Path to the sysfwd.toml configuration file.
    #[arg(short, long, default_value = "sysfwd.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send a single log line to the configured syslog server.
    Send(SendArgs),

    /// Relay stdin lines to the syslog server until EOF or Ctrl-C.
    Relay(RelayArgs),

    /// Inspect and edit the tag filter.
    Filter(FilterArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- send ----

/// Send one message through the forwarding pipeline.
#[derive(Args, Debug)]
pub struct SendArgs {
    /// Message body.
    pub message: String,

    /// Severity name (EMERG..DEBUG) or number (0-7).
    #[arg(short, long, default_value = "info")]
    pub level: String,

    /// Tag used as the APP-NAME and filter key.
    #[arg(short, long, default_value = "sysfwd")]
    pub tag: String,

    /// Build the packet without touching the network and print it.
    #[arg(long)]
    pub dry_run: bool,
}

// ---- relay ----

/// Relay stdin to the syslog server.
#[derive(Args, Debug)]
pub struct RelayArgs {
    /// Tag applied to every relayed line.
    #[arg(short, long, default_value = "stdin")]
    pub tag: String,

    /// Severity applied to every relayed line.
    #[arg(short, long, default_value = "info")]
    pub level: String,

    /// Expose Prometheus metrics even if `[metrics] enabled = false`.
    #[arg(long)]
    pub metrics: bool,

    /// Reload the filter string from this file whenever it changes.
    #[arg(long)]
    pub watch_filter: Option<PathBuf>,

    /// Poll interval for `--watch-filter`, in milliseconds.
    #[arg(long, default_value_t = 1000)]
    pub watch_interval_ms: u64,
}

// ---- filter ----

/// Inspect and edit the tag filter.
#[derive(Args, Debug)]
pub struct FilterArgs {
    #[command(subcommand)]
    pub action: FilterAction,
}

#[derive(Subcommand, Debug)]
pub enum FilterAction {
    /// Show the effective rule set (configuration + persisted state).
    List,
    /// Report whether events with the given tags would be forwarded.
    Check {
        /// Tags to evaluate.
        #[arg(required = true)]
        tags: Vec<String>,

        /// Severity to evaluate at.
        #[arg(short, long, default_value = "info")]
        level: String,

        /// Entry point the event arrives through.
        #[arg(long, default_value = "direct")]
        source: SourceArg,
    },
    /// Replace the persisted filter string (requires `filter_state_path`).
    Set {
        /// Comma-separated tag list.
        filter_string: String,
    },
    /// Remove every persisted filter tag (requires `filter_state_path`).
    Clear,
}

/// Event entry point.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SourceArg {
    /// Host logging hook.
    Logger,
    /// Direct calls.
    Direct,
}

impl From<SourceArg> for LogSource {
    fn from(source: SourceArg) -> Self {
        match source {
            SourceArg::Logger => LogSource::Logger,
            SourceArg::Direct => LogSource::Direct,
        }
    }
}

// ---- config ----

/// Manage sysfwd configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, syslog, metrics).
        #[arg(long)]
        section: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_verify_structure() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_parse_send_defaults() {
        let cli = Cli::try_parse_from(["sysfwd", "send", "hello"]).expect("should parse send");
        assert_eq!(cli.config, PathBuf::from("sysfwd.toml"));
        match cli.command {
            Commands::Send(args) => {
                assert_eq!(args.message, "hello");
                assert_eq!(args.level, "info");
                assert_eq!(args.tag, "sysfwd");
                assert!(!args.dry_run, "dry_run should default to false");
            }
            _ => panic!("expected Send command"),
        }
    }

    #[test]
    fn test_cli_parse_send_with_options() {
        let cli = Cli::try_parse_from([
            "sysfwd", "send", "-l", "err", "-t", "wifi", "--dry-run", "link down",
        ])
        .expect("should parse send with options");
        match cli.command {
            Commands::Send(args) => {
                assert_eq!(args.level, "err");
                assert_eq!(args.tag, "wifi");
                assert!(args.dry_run);
                assert_eq!(args.message, "link down");
            }
            _ => panic!("expected Send command"),
        }
    }

    #[test]
    fn test_cli_parse_send_requires_message() {
        assert!(Cli::try_parse_from(["sysfwd", "send"]).is_err());
    }

    #[test]
    fn test_cli_parse_relay() {
        let cli = Cli::try_parse_from([
            "sysfwd",
            "relay",
            "--tag",
            "app",
            "--watch-filter",
            "/tmp/filters",
            "--metrics",
        ])
        .expect("should parse relay");
        match cli.command {
            Commands::Relay(args) => {
                assert_eq!(args.tag, "app");
                assert_eq!(args.level, "info");
                assert!(args.metrics);
                assert_eq!(args.watch_filter, Some(PathBuf::from("/tmp/filters")));
                assert_eq!(args.watch_interval_ms, 1000);
            }
            _ => panic!("expected Relay command"),
        }
    }

    #[test]
    fn test_cli_parse_filter_check() {
        let cli = Cli::try_parse_from([
            "sysfwd", "filter", "check", "wifi", "ota", "--level", "3", "--source", "logger",
        ])
        .expect("should parse filter check");
        match cli.command {
            Commands::Filter(FilterArgs {
                action: FilterAction::Check { tags, level, source },
            }) => {
                assert_eq!(tags, vec!["wifi", "ota"]);
                assert_eq!(level, "3");
                assert!(matches!(LogSource::from(source), LogSource::Logger));
            }
            _ => panic!("expected Filter Check command"),
        }
    }

    #[test]
    fn test_cli_parse_filter_check_requires_tag() {
        assert!(Cli::try_parse_from(["sysfwd", "filter", "check"]).is_err());
    }

    #[test]
    fn test_cli_parse_filter_set() {
        let cli = Cli::try_parse_from(["sysfwd", "filter", "set", "a,b"])
            .expect("should parse filter set");
        match cli.command {
            Commands::Filter(FilterArgs {
                action: FilterAction::Set { filter_string },
            }) => assert_eq!(filter_string, "a,b"),
            _ => panic!("expected Filter Set command"),
        }
    }

    #[test]
    fn test_cli_parse_config_show_section() {
        let cli = Cli::try_parse_from([
            "sysfwd", "-c", "/etc/sysfwd.toml", "config", "show", "--section", "syslog",
        ])
        .expect("should parse config show");
        assert_eq!(cli.config, PathBuf::from("/etc/sysfwd.toml"));
        match cli.command {
            Commands::Config(ConfigArgs {
                action: ConfigAction::Show { section },
            }) => assert_eq!(section.as_deref(), Some("syslog")),
            _ => panic!("expected Config Show command"),
        }
    }

    #[test]
    fn test_cli_global_output_flag() {
        let cli = Cli::try_parse_from(["sysfwd", "config", "validate", "--output", "json"])
            .expect("should parse global flag after subcommand");
        assert!(matches!(cli.output, OutputFormat::Json));
    }

    #[test]
    fn test_cli_unknown_subcommand() {
        assert!(Cli::try_parse_from(["sysfwd", "start"]).is_err());
    }
}
