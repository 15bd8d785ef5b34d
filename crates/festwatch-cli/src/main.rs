//! festwatch CLI - manage a festival watchlist from the terminal
//!
//! Every command loads the local snapshot, reconciles it with the service and
//! then acts on the result, so the CLI keeps working offline.

mod cli;
mod commands;
mod error;


use clap::Parser;

use crate::cli::{Cli, Commands};
use crate::commands::check::run_check;
use crate::commands::code::{run_code, run_import};
use crate::commands::common::{open_manager, resolve_client_config};
use crate::commands::film::{run_film_command, FilmCommand};
use crate::commands::list::run_list;
use crate::commands::whoami::run_whoami;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("festwatch=warn".parse().expect("valid directive")),
        )
        .init();

    let cli = Cli::parse();
    let config = resolve_client_config(cli.api_url, cli.data_dir)?;
    let manager = open_manager(&config).await?;

    match cli.command {
        Commands::List { json } => run_list(&manager, json)?,
        Commands::Check { film } => run_check(&manager, &film)?,
        Commands::Add { film } => run_film_command(&manager, FilmCommand::Add, &film).await?,
        Commands::Remove { film } => {
            run_film_command(&manager, FilmCommand::Remove, &film).await?;
        }
        Commands::Toggle { film } => {
            run_film_command(&manager, FilmCommand::Toggle, &film).await?;
        }
        Commands::Code => run_code(&manager).await,
        Commands::Import { code } => run_import(&manager, &code).await?,
        Commands::Whoami => run_whoami(&manager),
    }

    Ok(())
}
