mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use airzone_core::Client;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't need a webserver
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "airzone", &mut std::io::stdout());
            Ok(())
        }

        // Backup and cache subcommands connect only when they need to
        Command::Backup(args) => {
            let cfg = config::load_config_or_default();
            commands::backup::handle(args, &cli.global, &cfg).await
        }
        Command::Cache(args) => {
            let cfg = config::load_config_or_default();
            commands::cache::handle(&args, &cli.global, &cfg)
        }

        cmd => {
            let client = connect(&cli.global, &config::load_config_or_default())?;
            tracing::debug!(command = ?cmd, host = client.host(), "dispatching command");
            commands::dispatch(cmd, &client, &cli.global).await
        }
    }
}

/// Build the HTTP client for the active profile and flag overrides.
pub(crate) fn connect(
    global: &cli::GlobalOpts,
    cfg: &config::Config,
) -> Result<Client<airzone_api::HttpTransport>, CliError> {
    let client_config = config::resolve_client_config(global, cfg)?;
    Ok(Client::from_config(&client_config)?)
}
