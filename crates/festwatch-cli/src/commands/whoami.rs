use festwatch_core::api::WatchlistApi;
use festwatch_core::storage::LocalStore;
use festwatch_core::WatchlistManager;

pub fn whoami_lines<A: WatchlistApi, L: LocalStore>(manager: &WatchlistManager<A, L>) -> Vec<String> {
    let user = manager
        .user_id()
        .map_or_else(|| "(none yet)".to_string(), |user_id| user_id.to_string());
    let code = manager
        .last_sync_code()
        .map_or_else(|| "(none)".to_string(), |code| code.to_string());
    vec![format!("User ID:   {user}"), format!("Sync code: {code}")]
}

pub fn run_whoami<A: WatchlistApi, L: LocalStore>(manager: &WatchlistManager<A, L>) {
    for line in whoami_lines(manager) {
        println!("{line}");
    }
}
