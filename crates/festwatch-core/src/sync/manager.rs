use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::api::{ApiError, WatchlistApi};
use crate::models::{SyncCode, UserId, Watchlist};
use crate::state::{LoadPhase, MutationOutcome};
use crate::storage::{load_json, save_json, LocalStore, SYNC_CODE_KEY, USER_ID_KEY, WATCHLIST_KEY};

/// Codes minted per `generate_sync_code` call before giving up on collisions.
pub const MAX_CODE_ATTEMPTS: usize = 5;

#[derive(Debug, Default)]
struct ManagerState {
    phase: LoadPhase,
    user_id: Option<UserId>,
    watchlist: Watchlist,
    sync_code: Option<SyncCode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MutationKind {
    Add,
    Remove,
}

/// A tentatively applied change waiting for the service to confirm it.
#[derive(Debug)]
struct PendingMutation {
    user_id: UserId,
    film_id: String,
    kind: MutationKind,
}

struct Inner<A, L> {
    api: A,
    local: L,
    state: Mutex<ManagerState>,
}

/// Handle to one session's watchlist state.
///
/// Clones share the same state. Public operations never fail: remote errors
/// are logged and absorbed into fallbacks or rollbacks.
pub struct WatchlistManager<A, L> {
    inner: Arc<Inner<A, L>>,
}

impl<A, L> Clone for WatchlistManager<A, L> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A: WatchlistApi, L: LocalStore> WatchlistManager<A, L> {
    pub fn new(api: A, local: L) -> Self {
        Self {
            inner: Arc::new(Inner {
                api,
                local,
                state: Mutex::new(ManagerState::default()),
            }),
        }
    }

    pub fn phase(&self) -> LoadPhase {
        self.lock().phase
    }

    /// Snapshot of the current in-memory watchlist.
    pub fn watchlist(&self) -> Watchlist {
        self.lock().watchlist.clone()
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.lock().user_id.clone()
    }

    pub fn last_sync_code(&self) -> Option<SyncCode> {
        self.lock().sync_code.clone()
    }

    pub fn is_in_watchlist(&self, film_id: &str) -> bool {
        self.lock().watchlist.contains(film_id)
    }

    /// Load local state, then reconcile with the service copy.
    ///
    /// The local snapshot is visible as soon as the phase is `Loading`. A
    /// non-empty remote list is unioned with it and the union written to both
    /// sides; an empty remote list adopts the local one. When the service is
    /// unreachable the local snapshot stands. Always ends in `Ready`.
    pub async fn initialize(&self) {
        let user_id = {
            let mut state = self.lock();
            if state.phase != LoadPhase::Uninitialized {
                return;
            }
            state.phase = LoadPhase::Loading;

            let user_id = self.ensure_identity(&mut state);
            let snapshot = self.load_local_watchlist();
            state.watchlist = snapshot.union(&state.watchlist);
            state.sync_code = self.load_local_sync_code();
            user_id
        };

        match self.inner.api.fetch_watchlist(&user_id).await {
            Ok(remote) => self.reconcile(&user_id, &remote).await,
            Err(error) => {
                tracing::warn!("Remote watchlist unavailable, using local snapshot: {}", error);
            }
        }

        self.lock().phase = LoadPhase::Ready;
    }

    async fn reconcile(&self, user_id: &UserId, remote: &Watchlist) {
        let to_push = {
            let mut state = self.lock();
            if remote.is_empty() {
                if state.watchlist.is_empty() {
                    return;
                }
                state.watchlist.clone()
            } else {
                let merged = state.watchlist.union(remote);
                state.watchlist = merged.clone();
                self.persist_local(&state.watchlist);
                merged
            }
        };

        tracing::debug!(
            films = to_push.len(),
            remote_films = remote.len(),
            "Pushing reconciled watchlist"
        );
        if let Err(error) = self.inner.api.sync_watchlist(user_id, &to_push).await {
            tracing::warn!("Failed to push reconciled watchlist: {}", error);
        }
    }

    /// Add `film_id` now; the returned future confirms it with the service
    /// or rolls it back.
    pub fn add(&self, film_id: &str) -> impl Future<Output = MutationOutcome> + Send + 'static {
        self.settle(self.apply_tentative(film_id, MutationKind::Add))
    }

    /// Remove `film_id` now; the returned future confirms it with the service
    /// or rolls it back.
    pub fn remove(&self, film_id: &str) -> impl Future<Output = MutationOutcome> + Send + 'static {
        self.settle(self.apply_tentative(film_id, MutationKind::Remove))
    }

    pub fn toggle(&self, film_id: &str) -> impl Future<Output = MutationOutcome> + Send + 'static {
        let kind = if self.is_in_watchlist(film_id) {
            MutationKind::Remove
        } else {
            MutationKind::Add
        };
        self.settle(self.apply_tentative(film_id, kind))
    }

    fn apply_tentative(&self, film_id: &str, kind: MutationKind) -> Option<PendingMutation> {
        let film_id = film_id.trim();
        if film_id.is_empty() {
            return None;
        }

        let mut state = self.lock();
        let user_id = self.ensure_identity(&mut state);
        let changed = match kind {
            MutationKind::Add => state.watchlist.insert(film_id),
            MutationKind::Remove => state.watchlist.remove(film_id),
        };
        if !changed {
            return None;
        }
        self.persist_local(&state.watchlist);

        Some(PendingMutation {
            user_id,
            film_id: film_id.to_string(),
            kind,
        })
    }

    fn settle(
        &self,
        pending: Option<PendingMutation>,
    ) -> impl Future<Output = MutationOutcome> + Send + 'static {
        let this = self.clone();
        async move {
            let Some(pending) = pending else {
                return MutationOutcome::Unchanged;
            };

            let result = match pending.kind {
                MutationKind::Add => {
                    this.inner
                        .api
                        .add_film(&pending.user_id, &pending.film_id)
                        .await
                }
                MutationKind::Remove => {
                    this.inner
                        .api
                        .remove_film(&pending.user_id, &pending.film_id)
                        .await
                }
            };

            match result {
                Ok(_) => MutationOutcome::Applied,
                Err(error) => {
                    tracing::warn!(
                        film = %pending.film_id,
                        "Watchlist write failed, rolling back: {}",
                        error
                    );
                    this.rollback(&pending);
                    MutationOutcome::RolledBack
                }
            }
        }
    }

    fn rollback(&self, pending: &PendingMutation) {
        let mut state = self.lock();
        match pending.kind {
            MutationKind::Add => state.watchlist.remove(&pending.film_id),
            MutationKind::Remove => state.watchlist.insert(&pending.film_id),
        };
        self.persist_local(&state.watchlist);
    }

    /// Mint a code for this identity and register it with the service.
    ///
    /// Every call mints a fresh code; earlier codes keep working until they
    /// expire. Returns `None` when registration fails.
    pub async fn generate_sync_code(&self) -> Option<SyncCode> {
        let user_id = {
            let mut state = self.lock();
            self.ensure_identity(&mut state)
        };

        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let candidate = SyncCode::generate(&mut rand::thread_rng());
            match self.inner.api.create_sync_code(&user_id, &candidate).await {
                Ok(code) => {
                    if let Err(error) = save_json(&self.inner.local, SYNC_CODE_KEY, &code) {
                        tracing::warn!("Failed to persist sync code locally: {}", error);
                    }
                    self.lock().sync_code = Some(code.clone());
                    return Some(code);
                }
                Err(ApiError::Conflict(_)) => {
                    tracing::debug!(attempt, "Sync code collided, minting another");
                }
                Err(error) => {
                    tracing::warn!("Failed to register sync code: {}", error);
                    return None;
                }
            }
        }

        tracing::warn!(
            attempts = MAX_CODE_ATTEMPTS,
            "Giving up on sync code after repeated collisions"
        );
        None
    }

    /// Replace this device's watchlist with the one behind `code`.
    ///
    /// On success the adopted list is persisted locally and pushed to this
    /// identity's own record. Any failure before adoption leaves the current
    /// list untouched and returns `false`.
    pub async fn load_from_sync_code(&self, code: &str) -> bool {
        let code = match SyncCode::parse(code) {
            Ok(code) => code,
            Err(error) => {
                tracing::warn!("Rejected sync code: {}", error);
                return false;
            }
        };

        let resolved = match self.inner.api.resolve_sync_code(&code).await {
            Ok(watchlist) => watchlist,
            Err(error) => {
                tracing::warn!("Failed to resolve sync code: {}", error);
                return false;
            }
        };

        let user_id = {
            let mut state = self.lock();
            let user_id = self.ensure_identity(&mut state);
            state.watchlist = resolved.clone();
            self.persist_local(&state.watchlist);
            user_id
        };

        if let Err(error) = self.inner.api.sync_watchlist(&user_id, &resolved).await {
            tracing::warn!(
                "Adopted watchlist locally but failed to push it to the service: {}",
                error
            );
        }
        true
    }

    fn lock(&self) -> MutexGuard<'_, ManagerState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_identity(&self, state: &mut ManagerState) -> UserId {
        if let Some(user_id) = &state.user_id {
            return user_id.clone();
        }

        let user_id = match load_json::<UserId, _>(&self.inner.local, USER_ID_KEY) {
            Ok(Some(user_id)) => user_id,
            Ok(None) => self.create_identity(),
            Err(error) => {
                tracing::warn!("Stored identity unreadable, creating a new one: {}", error);
                self.create_identity()
            }
        };
        state.user_id = Some(user_id.clone());
        user_id
    }

    fn create_identity(&self) -> UserId {
        let user_id = UserId::generate();
        if let Err(error) = save_json(&self.inner.local, USER_ID_KEY, &user_id) {
            tracing::warn!("Failed to persist new identity: {}", error);
        }
        user_id
    }

    fn load_local_watchlist(&self) -> Watchlist {
        match load_json::<Watchlist, _>(&self.inner.local, WATCHLIST_KEY) {
            Ok(snapshot) => snapshot.unwrap_or_default(),
            Err(error) => {
                tracing::warn!("Ignoring unreadable local watchlist: {}", error);
                Watchlist::new()
            }
        }
    }

    fn load_local_sync_code(&self) -> Option<SyncCode> {
        load_json::<SyncCode, _>(&self.inner.local, SYNC_CODE_KEY).unwrap_or_else(|error| {
            tracing::warn!("Ignoring unreadable local sync code: {}", error);
            None
        })
    }

    fn persist_local(&self, watchlist: &Watchlist) {
        if let Err(error) = save_json(&self.inner.local, WATCHLIST_KEY, watchlist) {
            tracing::warn!("Failed to persist watchlist locally: {}", error);
        }
    }
}
