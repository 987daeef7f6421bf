use clap::Parser;
use colored::Colorize;

use sysfwd_cli::cli::{Cli, Commands};
use sysfwd_cli::commands;
use sysfwd_cli::error::CliError;
use sysfwd_cli::logging::{effective_general, init_tracing};
use sysfwd_cli::metrics_server::install_metrics_recorder;
use sysfwd_cli::output::OutputWriter;
use sysfwd_core::config::GeneralConfig;
use sysfwd_forwarder::ForwarderLayer;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let writer = OutputWriter::new(cli.output);

    if let Err(e) = run(cli, &writer).await {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli, writer: &OutputWriter) -> Result<(), CliError> {
    match cli.command {
        Commands::Relay(args) => {
            let config = commands::load_config(&cli.config).await?;
            let forwarder = commands::network_forwarder(&config)?;

            // The relay forwards its own diagnostics too, through the logger hook.
            init_tracing(
                &effective_general(&config.general, cli.log_level.as_deref()),
                Some(ForwarderLayer::new(forwarder.clone())),
            )?;
            if args.metrics || config.metrics.enabled {
                install_metrics_recorder(&config.metrics)?;
            }

            commands::relay::execute(args, forwarder, writer).await
        }
        Commands::Send(args) => {
            init_cli_tracing(cli.log_level.as_deref())?;
            let config = commands::load_config(&cli.config).await?;
            commands::send::execute(args, &config, writer)
        }
        Commands::Filter(args) => {
            init_cli_tracing(cli.log_level.as_deref())?;
            let config = commands::load_config(&cli.config).await?;
            commands::filter::execute(args, &config, writer)
        }
        Commands::Config(args) => {
            init_cli_tracing(cli.log_level.as_deref())?;
            commands::config::execute(args, &cli.config, writer).await
        }
    }
}

/// One-shot commands log warnings only unless `--log-level` says otherwise.
fn init_cli_tracing(log_level: Option<&str>) -> Result<(), CliError> {
    let base = GeneralConfig {
        log_level: "warn".to_owned(),
        log_format: "pretty".to_owned(),
    };
    init_tracing(&effective_general(&base, log_level), None)?;
    Ok(())
}
