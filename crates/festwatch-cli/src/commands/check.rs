use festwatch_core::api::WatchlistApi;
use festwatch_core::storage::LocalStore;
use festwatch_core::WatchlistManager;

use crate::commands::common::normalize_film_id;
use crate::error::CliError;

pub fn check_message(film_id: &str, present: bool) -> String {
    if present {
        format!("{film_id} is on your watchlist")
    } else {
        format!("{film_id} is not on your watchlist")
    }
}

pub fn run_check<A: WatchlistApi, L: LocalStore>(
    manager: &WatchlistManager<A, L>,
    film: &str,
) -> Result<(), CliError> {
    let film_id = normalize_film_id(film)?;
    println!(
        "{}",
        check_message(&film_id, manager.is_in_watchlist(&film_id))
    );
    Ok(())
}
