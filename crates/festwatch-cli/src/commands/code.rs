use festwatch_core::api::WatchlistApi;
use festwatch_core::storage::LocalStore;
use festwatch_core::util::normalize_text_option;
use festwatch_core::WatchlistManager;

use crate::error::CliError;

pub async fn run_code<A: WatchlistApi, L: LocalStore>(manager: &WatchlistManager<A, L>) {
    match manager.generate_sync_code().await {
        Some(code) => {
            println!("{code}");
            eprintln!("Enter this code on your other device within 30 days.");
        }
        None => eprintln!("Could not create a sync code. Check your connection and try again."),
    }
}

/// Replace the local watchlist with the one behind `code`. Returns the
/// message to show.
pub async fn import_sync_code<A: WatchlistApi, L: LocalStore>(
    manager: &WatchlistManager<A, L>,
    code: &str,
) -> Result<String, CliError> {
    let code = normalize_text_option(Some(code.to_string())).ok_or(CliError::EmptySyncCode)?;
    if manager.load_from_sync_code(&code).await {
        let count = manager.watchlist().len();
        Ok(format!(
            "Imported {count} film{} from {}",
            if count == 1 { "" } else { "s" },
            code.to_ascii_uppercase()
        ))
    } else {
        Ok("Sync code not found or expired; your watchlist was left as it was".to_string())
    }
}

pub async fn run_import<A: WatchlistApi, L: LocalStore>(
    manager: &WatchlistManager<A, L>,
    code: &str,
) -> Result<(), CliError> {
    println!("{}", import_sync_code(manager, code).await?);
    Ok(())
}
