use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use super::{ScanPage, StoreError, StoreResult};

#[derive(Debug, Clone)]
struct MemoryEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl MemoryEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |deadline| deadline > now)
    }
}

/// Process-local key-value backend with per-key expiry.
#[derive(Debug, Clone, Default)]
pub struct MemoryKv {
    entries: Arc<Mutex<HashMap<String, MemoryEntry>>>,
}

impl MemoryKv {
    pub async fn get(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        let entry = entries.get(key)?;
        if entry.is_live(now) {
            return Some(entry.value.clone());
        }
        entries.remove(key);
        None
    }

    pub async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) {
        let expires_at = ttl.map(|ttl| Instant::now() + ttl);
        self.entries.lock().await.insert(
            key.to_string(),
            MemoryEntry {
                value: value.to_string(),
                expires_at,
            },
        );
    }

    pub async fn increment(&self, key: &str) -> StoreResult<i64> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        let live = entries.get(key).is_some_and(|entry| entry.is_live(now));
        if !live {
            entries.insert(
                key.to_string(),
                MemoryEntry {
                    value: "1".to_string(),
                    expires_at: None,
                },
            );
            return Ok(1);
        }

        let entry = entries
            .get_mut(key)
            .ok_or_else(|| StoreError::Protocol(format!("key {key:?} vanished")))?;
        let current = entry.value.parse::<i64>().map_err(|_| {
            StoreError::Command("ERR value is not an integer or out of range".to_string())
        })?;
        let next = current
            .checked_add(1)
            .ok_or_else(|| StoreError::Command("ERR increment would overflow".to_string()))?;
        entry.value = next.to_string();
        Ok(next)
    }

    pub async fn expire(&self, key: &str, ttl: Duration) -> bool {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        match entries.get_mut(key) {
            Some(entry) if entry.is_live(now) => {
                entry.expires_at = Some(now + ttl);
                true
            }
            _ => false,
        }
    }

    /// Give a live key without an expiry one. Existing deadlines are kept.
    pub async fn expire_if_unset(&self, key: &str, ttl: Duration) -> bool {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        match entries.get_mut(key) {
            Some(entry) if entry.is_live(now) && entry.expires_at.is_none() => {
                entry.expires_at = Some(now + ttl);
                true
            }
            _ => false,
        }
    }

    pub async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> bool {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        if entries.get(key).is_some_and(|entry| entry.is_live(now)) {
            return false;
        }
        entries.insert(
            key.to_string(),
            MemoryEntry {
                value: value.to_string(),
                expires_at: Some(now + ttl),
            },
        );
        true
    }

    /// Page through live keys starting with `prefix` in sorted order. The
    /// cursor is the offset of the next key.
    pub async fn scan(&self, cursor: &str, prefix: &str, count: usize) -> StoreResult<ScanPage> {
        let offset = cursor
            .parse::<usize>()
            .map_err(|_| StoreError::Command(format!("ERR invalid cursor {cursor:?}")))?;

        let now = Instant::now();
        let entries = self.entries.lock().await;
        let mut keys: Vec<&String> = entries
            .iter()
            .filter(|(key, entry)| key.starts_with(prefix) && entry.is_live(now))
            .map(|(key, _)| key)
            .collect();
        keys.sort();

        let end = offset.saturating_add(count.max(1)).min(keys.len());
        let page = keys
            .get(offset..end)
            .unwrap_or_default()
            .iter()
            .copied()
            .cloned()
            .collect();
        let cursor = if end >= keys.len() {
            "0".to_string()
        } else {
            end.to_string()
        };

        Ok(ScanPage { cursor, keys: page })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn values_expire_after_ttl() {
        let store = MemoryKv::default();
        store.set("k", "v", Some(Duration::from_secs(10))).await;
        assert_eq!(store.get("k").await.as_deref(), Some("v"));

        tokio::time::advance(Duration::from_secs(11)).await;
        assert_eq!(store.get("k").await, None);
    }

    #[tokio::test]
    async fn set_without_ttl_clears_previous_expiry() {
        let store = MemoryKv::default();
        store.set("k", "v1", Some(Duration::from_secs(10))).await;
        store.set("k", "v2", None).await;
        let entries = store.entries.lock().await;
        assert!(entries.get("k").unwrap().expires_at.is_none());
    }

    #[tokio::test]
    async fn increment_counts_from_one() {
        let store = MemoryKv::default();
        assert_eq!(store.increment("c").await.unwrap(), 1);
        assert_eq!(store.increment("c").await.unwrap(), 2);
        assert_eq!(store.get("c").await.as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn increment_rejects_non_integer_values() {
        let store = MemoryKv::default();
        store.set("c", "not-a-number", None).await;
        assert!(matches!(
            store.increment("c").await,
            Err(StoreError::Command(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn increment_restarts_after_expiry() {
        let store = MemoryKv::default();
        store.increment("c").await.unwrap();
        assert!(store.expire("c", Duration::from_secs(60)).await);
        store.increment("c").await.unwrap();

        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(store.increment("c").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn expire_on_missing_key_returns_false() {
        let store = MemoryKv::default();
        assert!(!store.expire("missing", Duration::from_secs(5)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn expire_if_unset_only_arms_keys_without_deadline() {
        let store = MemoryKv::default();
        store.set("bare", "60", None).await;
        store.set("timed", "1", Some(Duration::from_secs(5))).await;

        assert!(store.expire_if_unset("bare", Duration::from_secs(60)).await);
        assert!(!store.expire_if_unset("bare", Duration::from_secs(3_600)).await);
        assert!(!store.expire_if_unset("timed", Duration::from_secs(3_600)).await);
        assert!(!store.expire_if_unset("missing", Duration::from_secs(60)).await);

        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(store.get("bare").await, None);
        assert_eq!(store.get("timed").await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn set_if_absent_claims_only_free_keys() {
        let store = MemoryKv::default();
        assert!(store.set_if_absent("k", "first", Duration::from_secs(10)).await);
        assert!(!store.set_if_absent("k", "second", Duration::from_secs(10)).await);
        assert_eq!(store.get("k").await.as_deref(), Some("first"));

        tokio::time::advance(Duration::from_secs(11)).await;
        assert!(store.set_if_absent("k", "second", Duration::from_secs(10)).await);
        assert_eq!(store.get("k").await.as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn scan_pages_through_prefix() {
        let store = MemoryKv::default();
        for name in ["p:a", "p:b", "p:c", "q:z"] {
            store.set(name, "1", None).await;
        }

        let first = store.scan("0", "p:", 2).await.unwrap();
        assert_eq!(first.keys, vec!["p:a".to_string(), "p:b".to_string()]);
        assert_eq!(first.cursor, "2");

        let second = store.scan(&first.cursor, "p:", 2).await.unwrap();
        assert_eq!(second.keys, vec!["p:c".to_string()]);
        assert_eq!(second.cursor, "0");

        assert!(store.scan("bogus", "p:", 2).await.is_err());
    }
}
