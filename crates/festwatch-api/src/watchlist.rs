use std::sync::Arc;

use festwatch_core::models::wire::{WatchlistResponse, WatchlistSource};
use festwatch_core::util::fingerprint;
use festwatch_core::Watchlist;
use tokio::sync::{Mutex, MutexGuard};

use crate::error::AppError;
use crate::store::{RemoteStore, StoreError, StoreKeys, StoreResult};

const USER_LOCK_STRIPES: usize = 64;

/// Reads and writes per-user watchlists, stored as one JSON array per user.
#[derive(Clone)]
pub struct WatchlistService {
    store: RemoteStore,
    keys: StoreKeys,
    locks: Arc<UserLocks>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilmChange {
    Add,
    Remove,
}

/// Striped lock table serializing read-modify-write spans for one user within
/// this process. Different users may share a stripe.
struct UserLocks {
    stripes: Vec<Mutex<()>>,
}

impl UserLocks {
    fn new(stripes: usize) -> Self {
        Self {
            stripes: (0..stripes.max(1)).map(|_| Mutex::new(())).collect(),
        }
    }

    async fn lock(&self, user_id: &str) -> MutexGuard<'_, ()> {
        let len = self.stripes.len() as u64;
        let index = usize::try_from(fingerprint(user_id) % len).unwrap_or(0);
        self.stripes[index].lock().await
    }
}

impl WatchlistService {
    pub fn new(store: RemoteStore, keys: StoreKeys) -> Self {
        Self {
            store,
            keys,
            locks: Arc::new(UserLocks::new(USER_LOCK_STRIPES)),
        }
    }

    /// The stored watchlist; a user with nothing stored reads as empty.
    pub async fn load(&self, user_id: &str) -> StoreResult<Watchlist> {
        let Some(raw) = self.store.get(&self.keys.watchlist(user_id)).await? else {
            return Ok(Watchlist::new());
        };
        serde_json::from_str::<Watchlist>(&raw)
            .map_err(|error| StoreError::Protocol(format!("stored watchlist is not a list: {error}")))
    }

    /// Read for display. Never fails: an unset store and a failing store both
    /// answer with an empty list tagged with where it came from.
    pub async fn read(&self, user_id: &str) -> WatchlistResponse {
        match self.load(user_id).await {
            Ok(watchlist) => WatchlistResponse {
                watchlist,
                source: WatchlistSource::Store,
            },
            Err(StoreError::Unavailable) => WatchlistResponse {
                watchlist: Watchlist::new(),
                source: WatchlistSource::Unconfigured,
            },
            Err(error) => {
                tracing::warn!(
                    user = fingerprint(user_id),
                    error = %error,
                    "Watchlist read failed, answering with empty list"
                );
                WatchlistResponse {
                    watchlist: Watchlist::new(),
                    source: WatchlistSource::Fallback,
                }
            }
        }
    }

    /// Add or remove one film and return the resulting list. The store is
    /// only written when membership actually changes.
    pub async fn apply(
        &self,
        user_id: &str,
        film_id: &str,
        change: FilmChange,
    ) -> Result<Watchlist, AppError> {
        let _guard = self.locks.lock(user_id).await;
        let mut watchlist = self.load(user_id).await?;
        let changed = match change {
            FilmChange::Add => watchlist.insert(film_id),
            FilmChange::Remove => watchlist.remove(film_id),
        };
        if changed {
            self.write(user_id, &watchlist).await?;
        }
        Ok(watchlist)
    }

    /// Overwrite the whole list.
    pub async fn replace(&self, user_id: &str, watchlist: &Watchlist) -> Result<Watchlist, AppError> {
        let _guard = self.locks.lock(user_id).await;
        self.write(user_id, watchlist).await?;
        Ok(watchlist.clone())
    }

    async fn write(&self, user_id: &str, watchlist: &Watchlist) -> Result<(), AppError> {
        let encoded = serde_json::to_string(watchlist)
            .map_err(|error| AppError::internal(format!("failed to encode watchlist: {error}")))?;
        self.store
            .set(&self.keys.watchlist(user_id), &encoded, None)
            .await?;
        Ok(())
    }
}
