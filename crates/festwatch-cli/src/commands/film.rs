use festwatch_core::api::WatchlistApi;
use festwatch_core::storage::LocalStore;
use festwatch_core::{MutationOutcome, WatchlistManager};

use crate::commands::common::normalize_film_id;
use crate::error::CliError;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FilmCommand {
    Add,
    Remove,
    Toggle,
}

/// Apply one film change and report how it settled.
pub async fn apply_film_command<A: WatchlistApi, L: LocalStore>(
    manager: &WatchlistManager<A, L>,
    command: FilmCommand,
    film: &str,
) -> Result<String, CliError> {
    let film_id = normalize_film_id(film)?;
    let outcome = match command {
        FilmCommand::Add => manager.add(&film_id).await,
        FilmCommand::Remove => manager.remove(&film_id).await,
        FilmCommand::Toggle => manager.toggle(&film_id).await,
    };
    Ok(outcome_message(
        command,
        &film_id,
        outcome,
        manager.is_in_watchlist(&film_id),
    ))
}

pub async fn run_film_command<A: WatchlistApi, L: LocalStore>(
    manager: &WatchlistManager<A, L>,
    command: FilmCommand,
    film: &str,
) -> Result<(), CliError> {
    let message = apply_film_command(manager, command, film).await?;
    println!("{message}");
    Ok(())
}

pub fn outcome_message(
    command: FilmCommand,
    film_id: &str,
    outcome: MutationOutcome,
    present: bool,
) -> String {
    match outcome {
        MutationOutcome::Applied if present => format!("Added {film_id} to your watchlist"),
        MutationOutcome::Applied => format!("Removed {film_id} from your watchlist"),
        MutationOutcome::Unchanged => match command {
            FilmCommand::Remove => format!("{film_id} is not on your watchlist"),
            FilmCommand::Add | FilmCommand::Toggle => {
                format!("{film_id} is already on your watchlist")
            }
        },
        MutationOutcome::RolledBack => {
            format!("Could not save the change to {film_id}; your watchlist was left as it was")
        }
    }
}
