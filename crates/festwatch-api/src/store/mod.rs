//! Remote key-value store adapter.
//!
//! Everything the service persists goes through [`RemoteStore`]. A store
//! without a backend is a normal state: every call then fails with
//! [`StoreError::Unavailable`] and callers degrade instead of crashing.

mod keys;
mod memory;
mod rest;

pub use keys::StoreKeys;
pub use memory::MemoryKv;
pub use rest::RestKvClient;

use std::collections::BTreeSet;
use std::time::Duration;

use thiserror::Error;

use crate::config::{AppConfig, StoreSettings};

/// Keys requested per `SCAN` round trip.
const SCAN_PAGE_SIZE: usize = 200;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("key-value store is not configured")]
    Unavailable,
    #[error("key-value store request failed: {0}")]
    Http(String),
    #[error("key-value store rejected the command: {0}")]
    Command(String),
    #[error("unexpected key-value store response: {0}")]
    Protocol(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// One page of a cursor-based key scan. A `"0"` cursor means exhausted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanPage {
    pub cursor: String,
    pub keys: Vec<String>,
}

#[derive(Clone)]
enum Backend {
    Rest(RestKvClient),
    Memory(MemoryKv),
}

#[derive(Clone)]
pub struct RemoteStore {
    backend: Option<Backend>,
}

impl RemoteStore {
    pub fn from_config(config: &AppConfig) -> StoreResult<Self> {
        match &config.store {
            StoreSettings::Disabled => Ok(Self::unavailable()),
            StoreSettings::Memory => Ok(Self::memory(MemoryKv::default())),
            StoreSettings::Rest(kv) => Ok(Self {
                backend: Some(Backend::Rest(RestKvClient::new(
                    kv.clone(),
                    config.store_timeout,
                )?)),
            }),
        }
    }

    pub const fn unavailable() -> Self {
        Self { backend: None }
    }

    pub fn memory(store: MemoryKv) -> Self {
        Self {
            backend: Some(Backend::Memory(store)),
        }
    }

    pub const fn is_configured(&self) -> bool {
        self.backend.is_some()
    }

    pub const fn backend_label(&self) -> &'static str {
        match &self.backend {
            Some(Backend::Rest(_)) => "rest",
            Some(Backend::Memory(_)) => "memory",
            None => "none",
        }
    }

    fn backend(&self) -> StoreResult<&Backend> {
        self.backend.as_ref().ok_or(StoreError::Unavailable)
    }

    pub async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        match self.backend()? {
            Backend::Rest(client) => client.get(key).await,
            Backend::Memory(store) => Ok(store.get(key).await),
        }
    }

    /// Store `value`, replacing any previous value and expiry.
    pub async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> StoreResult<()> {
        match self.backend()? {
            Backend::Rest(client) => client.set(key, value, ttl).await,
            Backend::Memory(store) => {
                store.set(key, value, ttl).await;
                Ok(())
            }
        }
    }

    /// Atomically increment an integer counter, creating it at 1.
    pub async fn increment(&self, key: &str) -> StoreResult<i64> {
        match self.backend()? {
            Backend::Rest(client) => client.increment(key).await,
            Backend::Memory(store) => store.increment(key).await,
        }
    }

    /// Set a key's expiry. Returns `false` when the key does not exist.
    pub async fn expire(&self, key: &str, ttl: Duration) -> StoreResult<bool> {
        match self.backend()? {
            Backend::Rest(client) => client.expire(key, ttl).await,
            Backend::Memory(store) => Ok(store.expire(key, ttl).await),
        }
    }

    /// Set an expiry only when the key has none. Returns `false` when the key
    /// is missing or already expires.
    pub async fn expire_if_unset(&self, key: &str, ttl: Duration) -> StoreResult<bool> {
        match self.backend()? {
            Backend::Rest(client) => client.expire_if_unset(key, ttl).await,
            Backend::Memory(store) => Ok(store.expire_if_unset(key, ttl).await),
        }
    }

    /// Store `value` with an expiry unless a live value already exists.
    /// Returns whether this call wrote the key.
    pub async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<bool> {
        match self.backend()? {
            Backend::Rest(client) => client.set_if_absent(key, value, ttl).await,
            Backend::Memory(store) => Ok(store.set_if_absent(key, value, ttl).await),
        }
    }

    /// All live keys starting with `prefix`, following scan cursors until the
    /// backend reports exhaustion.
    pub async fn scan_prefix(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let backend = self.backend()?;
        let pattern = format!("{prefix}*");
        let mut cursor = "0".to_string();
        let mut keys = BTreeSet::new();

        loop {
            let page = match backend {
                Backend::Rest(client) => client.scan(&cursor, &pattern, SCAN_PAGE_SIZE).await?,
                Backend::Memory(store) => store.scan(&cursor, prefix, SCAN_PAGE_SIZE).await?,
            };
            keys.extend(page.keys);
            if page.cursor == "0" {
                break;
            }
            cursor = page.cursor;
        }

        Ok(keys.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[tokio::test]
    async fn unconfigured_store_reports_unavailable() {
        let store = RemoteStore::unavailable();
        assert!(!store.is_configured());
        assert_eq!(store.backend_label(), "none");
        assert!(matches!(store.get("k").await, Err(StoreError::Unavailable)));
        assert!(matches!(
            store.set("k", "v", None).await,
            Err(StoreError::Unavailable)
        ));
        assert!(matches!(store.increment("k").await, Err(StoreError::Unavailable)));
        assert!(matches!(
            store.expire("k", Duration::from_secs(1)).await,
            Err(StoreError::Unavailable)
        ));
        assert!(matches!(
            store.expire_if_unset("k", Duration::from_secs(1)).await,
            Err(StoreError::Unavailable)
        ));
        assert!(matches!(
            store.set_if_absent("k", "v", Duration::from_secs(1)).await,
            Err(StoreError::Unavailable)
        ));
        assert!(matches!(
            store.scan_prefix("k").await,
            Err(StoreError::Unavailable)
        ));
    }

    #[tokio::test]
    async fn scan_prefix_follows_cursor_across_pages() {
        let store = RemoteStore::memory(MemoryKv::default());
        for index in 0..450 {
            store
                .set(&format!("fw:watchlist:user-{index:03}"), "[]", None)
                .await
                .unwrap();
        }
        store.set("fw:sync:ABCDEF", "user-001", None).await.unwrap();

        let keys = store.scan_prefix("fw:watchlist:").await.unwrap();
        assert_eq!(keys.len(), 450);
        assert_eq!(keys[0], "fw:watchlist:user-000");
        assert!(keys.iter().all(|key| key.starts_with("fw:watchlist:")));
    }

    #[test]
    fn disabled_config_builds_unconfigured_store() {
        let config = AppConfig::from_lookup(|_| None).unwrap();
        let store = RemoteStore::from_config(&config).unwrap();
        assert!(!store.is_configured());
    }
}
