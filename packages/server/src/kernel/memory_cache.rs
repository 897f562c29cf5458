// In-memory moderation cache
//
// Key/value store with hash values and per-key TTLs, backed by a DashMap.
// Expired keys are dropped lazily on access. Field writes on one key are
// atomic because DashMap holds the shard lock for the whole entry update.

use anyhow::{bail, Result};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry as MapEntry;
use dashmap::DashMap;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::{BaseModerationCache, FieldWrite};

#[derive(Debug, Clone)]
enum Value {
    Plain(String),
    Hash(HashMap<String, String>),
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<String, Entry>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.iter().filter(|e| e.is_live(now)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains_key(&self, key: &str) -> bool {
        let now = Instant::now();
        self.entries.get(key).map_or(false, |e| e.is_live(now))
    }

    /// Remaining lifetime of `key`, `None` for missing or persistent keys.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        self.entries
            .get(key)
            .filter(|e| e.is_live(now))
            .and_then(|e| e.expires_at)
            .map(|at| at.saturating_duration_since(now))
    }

    fn purge_if_expired(&self, key: &str) {
        let now = Instant::now();
        self.entries.remove_if(key, |_, entry| !entry.is_live(now));
    }
}

#[async_trait]
impl BaseModerationCache for MemoryCache {
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        self.entries.insert(
            key.to_string(),
            Entry {
                value: Value::Plain(value.to_string()),
                expires_at: ttl.map(|ttl| Instant::now() + ttl),
            },
        );
        Ok(())
    }

    async fn set_nx(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<bool> {
        let now = Instant::now();
        let fresh = Entry {
            value: Value::Plain(value.to_string()),
            expires_at: ttl.map(|ttl| now + ttl),
        };
        match self.entries.entry(key.to_string()) {
            MapEntry::Occupied(slot) if slot.get().is_live(now) => Ok(false),
            MapEntry::Occupied(mut slot) => {
                slot.insert(fresh);
                Ok(true)
            }
            MapEntry::Vacant(slot) => {
                slot.insert(fresh);
                Ok(true)
            }
        }
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.purge_if_expired(key);
        match self.entries.get(key).map(|e| e.value.clone()) {
            None => Ok(None),
            Some(Value::Plain(value)) => Ok(Some(value)),
            Some(Value::Hash(_)) => bail!("key {} holds a hash, not a value", key),
        }
    }

    async fn hash_set(&self, key: &str, field: &str, value: &str) -> Result<()> {
        self.purge_if_expired(key);
        let mut entry = self.entries.entry(key.to_string()).or_insert_with(|| Entry {
            value: Value::Hash(HashMap::new()),
            expires_at: None,
        });
        match &mut entry.value {
            Value::Hash(fields) => {
                fields.insert(field.to_string(), value.to_string());
                Ok(())
            }
            Value::Plain(_) => bail!("key {} holds a value, not a hash", key),
        }
    }

    async fn hash_set_nx(&self, key: &str, field: &str, value: &str) -> Result<FieldWrite> {
        let Some(mut entry) = self.entries.get_mut(key) else {
            return Ok(FieldWrite::MissingKey);
        };
        if !entry.is_live(Instant::now()) {
            return Ok(FieldWrite::MissingKey);
        }
        match &mut entry.value {
            Value::Hash(fields) if fields.contains_key(field) => Ok(FieldWrite::Occupied),
            Value::Hash(fields) => {
                fields.insert(field.to_string(), value.to_string());
                Ok(FieldWrite::Written)
            }
            Value::Plain(_) => bail!("key {} holds a value, not a hash", key),
        }
    }

    async fn hash_get_all(&self, key: &str) -> Result<Option<HashMap<String, String>>> {
        self.purge_if_expired(key);
        match self.entries.get(key).map(|e| e.value.clone()) {
            None => Ok(None),
            Some(Value::Hash(fields)) => Ok(Some(fields)),
            Some(Value::Plain(_)) => bail!("key {} holds a value, not a hash", key),
        }
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let now = Instant::now();
        Ok(self
            .entries
            .remove(key)
            .map_or(false, |(_, entry)| entry.is_live(now)))
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        self.purge_if_expired(key);
        match self.entries.get_mut(key) {
            Some(mut entry) => {
                entry.expires_at = Some(Instant::now() + ttl);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_key_is_none() {
        let cache = MemoryCache::new();

        assert_eq!(cache.get("nope").await.unwrap(), None);
        assert_eq!(cache.hash_get_all("nope").await.unwrap(), None);
        assert!(!cache.delete("nope").await.unwrap());
    }

    #[tokio::test]
    async fn test_hash_set_nx_writes_once() {
        let cache = MemoryCache::new();
        cache.hash_set("mcr:p1", "mcr", "{}").await.unwrap();

        assert_eq!(
            cache.hash_set_nx("mcr:p1", "abc", "accepted").await.unwrap(),
            FieldWrite::Written
        );
        assert_eq!(
            cache.hash_set_nx("mcr:p1", "abc", "declined").await.unwrap(),
            FieldWrite::Occupied
        );

        let fields = cache.hash_get_all("mcr:p1").await.unwrap().unwrap();
        assert_eq!(fields.get("abc").map(String::as_str), Some("accepted"));
    }

    #[tokio::test]
    async fn test_hash_set_nx_never_creates_the_hash() {
        let cache = MemoryCache::new();

        assert_eq!(
            cache.hash_set_nx("mcr:p1", "abc", "accepted").await.unwrap(),
            FieldWrite::MissingKey
        );
        assert!(!cache.contains_key("mcr:p1"));

        cache.hash_set("mcr:p2", "mcr", "{}").await.unwrap();
        cache
            .expire("mcr:p2", Duration::from_millis(10))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(
            cache.hash_set_nx("mcr:p2", "abc", "accepted").await.unwrap(),
            FieldWrite::MissingKey
        );
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_set_nx_respects_live_keys_only() {
        let cache = MemoryCache::new();

        assert!(cache
            .set_nx("claim", "1", Some(Duration::from_millis(10)))
            .await
            .unwrap());
        assert!(!cache.set_nx("claim", "2", None).await.unwrap());

        tokio::time::sleep(Duration::from_millis(30)).await;

        assert!(cache.set_nx("claim", "3", None).await.unwrap());
        assert_eq!(cache.get("claim").await.unwrap().as_deref(), Some("3"));
    }

    #[tokio::test]
    async fn test_hash_set_overwrites() {
        let cache = MemoryCache::new();
        cache.hash_set("mcr:p1", "mcr", "v1").await.unwrap();
        cache.hash_set("mcr:p1", "mcr", "v2").await.unwrap();

        let fields = cache.hash_get_all("mcr:p1").await.unwrap().unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields["mcr"], "v2");
    }

    #[tokio::test]
    async fn test_expired_keys_disappear() {
        let cache = MemoryCache::new();
        cache
            .set("report", "profanity", Some(Duration::from_millis(10)))
            .await
            .unwrap();
        assert!(cache.ttl("report").is_some());

        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(cache.get("report").await.unwrap(), None);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_expire_only_touches_existing_keys() {
        let cache = MemoryCache::new();
        cache.hash_set("mcr:p1", "mcr", "{}").await.unwrap();

        assert!(cache.expire("mcr:p1", Duration::from_secs(60)).await.unwrap());
        assert!(!cache.expire("mcr:p2", Duration::from_secs(60)).await.unwrap());
        assert!(cache.ttl("mcr:p1").is_some());
    }

    #[tokio::test]
    async fn test_wrong_type_is_an_error() {
        let cache = MemoryCache::new();
        cache.set("plain", "value", None).await.unwrap();

        assert!(cache.hash_get_all("plain").await.is_err());
        assert!(cache.hash_set_nx("plain", "f", "v").await.is_err());
    }
}
