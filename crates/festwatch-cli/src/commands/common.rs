use std::env;
use std::fs;
use std::path::PathBuf;

use festwatch_core::api::HttpWatchlistApi;
use festwatch_core::config::{ClientConfig, API_URL_ENV};
use festwatch_core::storage::FileLocalStore;
use festwatch_core::util::normalize_text_option;
use festwatch_core::{Watchlist, WatchlistManager};

use crate::error::CliError;

pub type CliManager = WatchlistManager<HttpWatchlistApi, FileLocalStore>;

pub fn resolve_client_config(
    api_url: Option<String>,
    data_dir: Option<PathBuf>,
) -> Result<ClientConfig, CliError> {
    Ok(ClientConfig::resolve(
        api_url,
        env::var(API_URL_ENV).ok(),
        data_dir,
        dirs::data_dir(),
    )?)
}

/// Build the manager for this device and run the initial load so the local
/// snapshot and the service copy are reconciled before any command runs.
pub async fn open_manager(config: &ClientConfig) -> Result<CliManager, CliError> {
    fs::create_dir_all(&config.data_dir)?;
    let api = HttpWatchlistApi::new(&config.api_base_url)?;
    let manager = WatchlistManager::new(api, FileLocalStore::new(&config.data_dir));
    manager.initialize().await;
    Ok(manager)
}

pub fn normalize_film_id(raw: &str) -> Result<String, CliError> {
    normalize_text_option(Some(raw.to_string())).ok_or(CliError::EmptyFilmId)
}

pub fn format_watchlist_lines(watchlist: &Watchlist) -> Vec<String> {
    if watchlist.is_empty() {
        return vec!["Your watchlist is empty.".to_string()];
    }
    let width = watchlist.len().to_string().len();
    watchlist
        .iter()
        .enumerate()
        .map(|(index, film)| format!("{:>width$}. {film}", index + 1))
        .collect()
}
