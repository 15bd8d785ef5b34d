use std::time::Duration;

use festwatch_core::util::fingerprint;
use festwatch_core::Watchlist;

use crate::error::AppError;
use crate::store::{RemoteStore, StoreKeys};
use crate::watchlist::WatchlistService;

/// Maps short codes to the user id that minted them.
#[derive(Clone)]
pub struct SyncCodeService {
    store: RemoteStore,
    keys: StoreKeys,
    ttl: Duration,
    watchlists: WatchlistService,
}

impl SyncCodeService {
    pub fn new(
        store: RemoteStore,
        keys: StoreKeys,
        ttl: Duration,
        watchlists: WatchlistService,
    ) -> Self {
        Self {
            store,
            keys,
            ttl,
            watchlists,
        }
    }

    /// Register `raw_code` for `user_id`. Re-registering a code the same user
    /// already owns refreshes its expiry; a code owned by someone else is a
    /// conflict and is left untouched.
    pub async fn create(&self, user_id: &str, raw_code: &str) -> Result<String, AppError> {
        let code = canonical_code(raw_code)?;
        let key = self.keys.sync_code(&code);

        for _ in 0..2 {
            if self.store.set_if_absent(&key, user_id, self.ttl).await? {
                return Ok(code);
            }
            match self.store.get(&key).await? {
                Some(owner) if owner == user_id => {
                    self.store.set(&key, user_id, Some(self.ttl)).await?;
                    return Ok(code);
                }
                Some(_) => break,
                // Expired between the claim and the read.
                None => {}
            }
        }

        tracing::warn!(
            endpoint = "sync_code_create",
            user = fingerprint(user_id),
            "Sync code already belongs to another user"
        );
        Err(AppError::conflict("Sync code already in use"))
    }

    /// The code (canonical form) and the current watchlist of its owner.
    pub async fn resolve(&self, raw_code: &str) -> Result<(String, Watchlist), AppError> {
        let code = canonical_code(raw_code)?;
        let owner = self
            .store
            .get(&self.keys.sync_code(&code))
            .await?
            .ok_or_else(|| AppError::not_found("Sync code not found or expired"))?;
        let watchlist = self.watchlists.load(&owner).await?;
        Ok((code, watchlist))
    }
}

/// Codes are matched case-insensitively. Any non-blank code is a valid
/// lookup; one that was never registered simply resolves to nothing.
fn canonical_code(raw: &str) -> Result<String, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::bad_request("Missing required field: code"));
    }
    Ok(trimmed.to_ascii_uppercase())
}
