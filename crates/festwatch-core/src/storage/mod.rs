//! Device-local persistence for the watchlist client.
//!
//! The client keeps three values between sessions: its identity, the last
//! known watchlist and the last sync code it minted. Each lives under a fixed
//! key and is stored JSON-encoded.

mod local;

pub use local::{FileLocalStore, MemoryLocalStore};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::Result;

/// Key holding the device's [`UserId`](crate::models::UserId).
pub const USER_ID_KEY: &str = "festwatch-user-id";
/// Key holding the last known [`Watchlist`](crate::models::Watchlist).
pub const WATCHLIST_KEY: &str = "festwatch-watchlist";
/// Key holding the last minted [`SyncCode`](crate::models::SyncCode).
pub const SYNC_CODE_KEY: &str = "festwatch-sync-code";

/// Synchronous string key-value persistence local to one device.
pub trait LocalStore: Send + Sync + 'static {
    fn load(&self, key: &str) -> Result<Option<String>>;
    fn save(&self, key: &str, value: &str) -> Result<()>;
}

/// Load and decode a JSON value stored under `key`.
pub fn load_json<T, S>(store: &S, key: &str) -> Result<Option<T>>
where
    T: DeserializeOwned,
    S: LocalStore + ?Sized,
{
    match store.load(key)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Encode `value` as JSON and store it under `key`.
pub fn save_json<T, S>(store: &S, key: &str, value: &T) -> Result<()>
where
    T: Serialize + ?Sized,
    S: LocalStore + ?Sized,
{
    let serialized = serde_json::to_string(value)?;
    store.save(key, &serialized)
}
