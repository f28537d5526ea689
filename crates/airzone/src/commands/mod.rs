//! Command dispatch: bridges CLI args -> core client calls -> output formatting.

pub mod backup;
pub mod cache;
pub mod check;
pub mod config_cmd;
pub mod errors;
pub mod hvac;
pub mod iaq;
pub mod util;

use airzone_api::HttpTransport;
use airzone_core::Client;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a webserver-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    client: &Client<HttpTransport>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::List => hvac::list(client, global).await,
        Command::Status(args) => hvac::status(client, &args, global).await,
        Command::Control(args) => hvac::control(client, &args, global).await,
        Command::Errors(args) => errors::handle(client, &args, global).await,
        Command::Check => check::handle(client, global).await,
        Command::Iaq(args) => iaq::handle(client, args, global).await,
        // Handled before a client is built
        Command::Backup(_) | Command::Cache(_) | Command::Config(_) | Command::Completions(_) => {
            unreachable!()
        }
    }
}
