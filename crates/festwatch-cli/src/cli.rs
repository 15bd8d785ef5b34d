use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "festwatch")]
#[command(about = "Keep a festival film watchlist in sync across devices")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Watchlist service base URL (defaults to FESTWATCH_API_URL)
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Directory holding the local identity and watchlist snapshot
    #[arg(long, global = true, value_name = "PATH")]
    pub data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the films on your watchlist
    #[command(alias = "ls")]
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check whether a film is on your watchlist
    Check {
        /// Film identifier
        film: String,
    },
    /// Add a film to your watchlist
    Add {
        /// Film identifier
        film: String,
    },
    /// Remove a film from your watchlist
    #[command(alias = "rm")]
    Remove {
        /// Film identifier
        film: String,
    },
    /// Add the film if missing, otherwise remove it
    Toggle {
        /// Film identifier
        film: String,
    },
    /// Mint a sync code for moving this watchlist to another device
    Code,
    /// Replace this device's watchlist with the one behind a sync code
    Import {
        /// Sync code shown on the other device
        code: String,
    },
    /// Show this device's identity and last sync code
    Whoami,
}
