use festwatch_core::api::WatchlistApi;
use festwatch_core::storage::LocalStore;
use festwatch_core::WatchlistManager;
use serde::Serialize;

use crate::commands::common::format_watchlist_lines;
use crate::error::CliError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistListing {
    pub user_id: Option<String>,
    pub films: Vec<String>,
    pub sync_code: Option<String>,
}

pub fn watchlist_listing<A: WatchlistApi, L: LocalStore>(
    manager: &WatchlistManager<A, L>,
) -> WatchlistListing {
    WatchlistListing {
        user_id: manager.user_id().map(String::from),
        films: manager.watchlist().into(),
        sync_code: manager.last_sync_code().map(String::from),
    }
}

pub fn run_list<A: WatchlistApi, L: LocalStore>(
    manager: &WatchlistManager<A, L>,
    as_json: bool,
) -> Result<(), CliError> {
    if as_json {
        println!(
            "{}",
            serde_json::to_string_pretty(&watchlist_listing(manager))?
        );
    } else {
        for line in format_watchlist_lines(&manager.watchlist()) {
            println!("{line}");
        }
    }

    Ok(())
}
