//! In-process sharded secret store.
//!
//! Secrets live in a fixed number of shards, each a mutex around a hash map
//! plus a min-heap of expiry deadlines. `put` calls for different keys land
//! on different shards and do not block each other; a `take_once` only
//! serializes against operations on its own shard. Critical sections touch
//! memory only - no lock is ever held across an `.await`.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::config::StoreConfig;
use crate::error::{SecretError, ValidationError};
use crate::keygen::{Key, KeyGenerator, RandomKeyGenerator};
use crate::store::SecretStore;

const SHARD_COUNT: usize = 16;

/// A stored secret. Presence in a shard map is exactly "live": consumption
/// removes the entry in the same critical section that reads it, so there is
/// no observable state where a secret is both consumed and retrievable.
struct Secret {
    payload: Vec<u8>,
    /// Set once at insertion, never mutated.
    #[allow(dead_code)]
    created_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
}

/// Heap entry scheduling a secret for removal. Entries are not unscheduled
/// on consumption; the sweep discards entries whose secret is already gone
/// or was reissued under a different deadline.
#[derive(PartialEq, Eq, PartialOrd, Ord)]
struct ExpiryEntry {
    expires_at: DateTime<Utc>,
    key: Key,
}

#[derive(Default)]
struct Shard {
    live: HashMap<Key, Secret>,
    expiry: BinaryHeap<Reverse<ExpiryEntry>>,
}

/// In-memory implementation of [`SecretStore`].
pub struct MemoryStore {
    shards: Vec<Mutex<Shard>>,
    keygen: Arc<dyn KeyGenerator>,
    config: StoreConfig,
}

impl MemoryStore {
    pub fn new(config: StoreConfig) -> Self {
        Self::with_keygen(config, Arc::new(RandomKeyGenerator))
    }

    pub fn with_keygen(config: StoreConfig, keygen: Arc<dyn KeyGenerator>) -> Self {
        Self {
            shards: (0..SHARD_COUNT).map(|_| Mutex::default()).collect(),
            keygen,
            config,
        }
    }

    fn shard_for(&self, key: &Key) -> &Mutex<Shard> {
        let mut hasher = std::hash::DefaultHasher::new();
        key.hash(&mut hasher);
        &self.shards[hasher.finish() as usize % self.shards.len()]
    }

    /// Critical sections cannot panic midway through a mutation, so a
    /// poisoned shard still holds consistent state.
    fn lock(shard: &Mutex<Shard>) -> MutexGuard<'_, Shard> {
        shard.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Requested TTL, falling back to the configured default, clamped by
    /// the configured ceiling. The ceiling applies even when neither the
    /// caller nor the default supplies a limit.
    fn effective_ttl(&self, requested: Option<Duration>) -> Option<Duration> {
        match (requested.or(self.config.default_ttl), self.config.max_ttl) {
            (Some(ttl), Some(ceiling)) => Some(ttl.min(ceiling)),
            (None, ceiling) => ceiling,
            (ttl, None) => ttl,
        }
    }

    /// Removes every secret whose deadline has passed. Called by the
    /// sweeper on its interval; cost is proportional to the entries popped,
    /// not to the number of live secrets. Secrets without a deadline never
    /// enter the heap and are removable only by consumption.
    pub(crate) fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let mut removed = 0;
        for shard in &self.shards {
            let mut guard = Self::lock(shard);
            let shard = &mut *guard;
            loop {
                match shard.expiry.peek() {
                    Some(Reverse(head)) if head.expires_at <= now => {}
                    _ => break,
                }
                let Some(Reverse(entry)) = shard.expiry.pop() else {
                    break;
                };
                let due = shard
                    .live
                    .get(&entry.key)
                    .is_some_and(|s| s.expires_at == Some(entry.expires_at));
                if due {
                    shard.live.remove(&entry.key);
                    removed += 1;
                }
            }
        }
        removed
    }
}

#[async_trait]
impl SecretStore for MemoryStore {
    async fn put(&self, payload: Vec<u8>, ttl: Option<Duration>) -> Result<Key, SecretError> {
        if payload.is_empty() {
            return Err(ValidationError::EmptyPayload.into());
        }
        if payload.len() > self.config.max_payload_bytes {
            return Err(ValidationError::PayloadTooLarge {
                size: payload.len(),
                max: self.config.max_payload_bytes,
            }
            .into());
        }

        let now = Utc::now();
        let expires_at = match self.effective_ttl(ttl) {
            Some(ttl) => Some(
                now + chrono::Duration::from_std(ttl)
                    .map_err(|e| anyhow::anyhow!("ttl out of range: {e}"))?,
            ),
            None => None,
        };

        for attempt in 1..=self.config.max_key_attempts {
            let key = self.keygen.generate()?;
            let mut shard = Self::lock(self.shard_for(&key));
            // Never overwrite a live secret: a collision means the generator
            // is asked again.
            if shard.live.contains_key(&key) {
                drop(shard);
                tracing::warn!(attempt, "generated key collided with a live secret");
                continue;
            }
            shard.live.insert(
                key.clone(),
                Secret {
                    payload,
                    created_at: now,
                    expires_at,
                },
            );
            if let Some(expires_at) = expires_at {
                shard.expiry.push(Reverse(ExpiryEntry {
                    expires_at,
                    key: key.clone(),
                }));
            }
            return Ok(key);
        }

        Err(SecretError::GenerationExhausted(self.config.max_key_attempts))
    }

    async fn take_once(&self, key: &Key) -> Result<Vec<u8>, SecretError> {
        let now = Utc::now();
        let mut shard = Self::lock(self.shard_for(key));
        // Single indivisible check-and-remove. A separate lookup followed by
        // a delete would let two racing callers both observe "exists".
        let Some(secret) = shard.live.remove(key) else {
            return Err(SecretError::NotFound);
        };
        if secret.expires_at.is_some_and(|at| at <= now) {
            // Lazy expiry, same as a sweep would have done. The stale heap
            // entry is discarded on the next sweep.
            return Err(SecretError::NotFound);
        }
        Ok(secret.payload)
    }

    async fn live_count(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| Self::lock(shard).live.len())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::Barrier;
    use tokio::task::JoinSet;

    use super::*;
    use crate::keygen::MockKeyGenerator;

    fn store() -> MemoryStore {
        MemoryStore::new(StoreConfig::default())
    }

    #[tokio::test]
    async fn put_then_take_returns_the_payload() {
        let store = store();
        let key = store.put(b"hello".to_vec(), None).await.unwrap();
        let payload = store.take_once(&key).await.unwrap();
        assert_eq!(payload, b"hello");
    }

    #[tokio::test]
    async fn second_take_returns_not_found() {
        let store = store();
        let key = store.put(b"hello".to_vec(), None).await.unwrap();
        store.take_once(&key).await.unwrap();
        assert!(matches!(
            store.take_once(&key).await,
            Err(SecretError::NotFound)
        ));
    }

    #[tokio::test]
    async fn unknown_key_returns_not_found() {
        let store = store();
        let key = Key::new("never-stored");
        assert!(matches!(
            store.take_once(&key).await,
            Err(SecretError::NotFound)
        ));
    }

    #[tokio::test]
    async fn expired_secret_is_not_found_even_if_never_read() {
        let store = store();
        let key = store
            .put(b"x".to_vec(), Some(Duration::from_millis(20)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(matches!(
            store.take_once(&key).await,
            Err(SecretError::NotFound)
        ));
        // lazy expiry removed the entry on access
        assert_eq!(store.live_count().await, 0);
    }

    #[tokio::test]
    async fn empty_payload_is_rejected_and_store_untouched() {
        let store = store();
        let err = store.put(Vec::new(), None).await.unwrap_err();
        assert!(matches!(
            err,
            SecretError::Validation(ValidationError::EmptyPayload)
        ));
        assert_eq!(store.live_count().await, 0);
    }

    #[tokio::test]
    async fn oversize_payload_is_rejected() {
        let store = MemoryStore::new(StoreConfig {
            max_payload_bytes: 8,
            ..StoreConfig::default()
        });
        let err = store.put(vec![0u8; 9], None).await.unwrap_err();
        assert!(matches!(
            err,
            SecretError::Validation(ValidationError::PayloadTooLarge { size: 9, max: 8 })
        ));
        assert_eq!(store.live_count().await, 0);
    }

    #[tokio::test]
    async fn collision_retries_until_a_fresh_key_appears() {
        let mut keygen = MockKeyGenerator::new();
        let mut calls = 0;
        keygen.expect_generate().times(3).returning(move || {
            calls += 1;
            if calls < 3 {
                Ok(Key::new("taken"))
            } else {
                Ok(Key::new("fresh"))
            }
        });

        let store = MemoryStore::with_keygen(StoreConfig::default(), Arc::new(keygen));
        // seed the occupant the generator will collide with
        {
            let mut shard = MemoryStore::lock(store.shard_for(&Key::new("taken")));
            shard.live.insert(
                Key::new("taken"),
                Secret {
                    payload: b"occupied".to_vec(),
                    created_at: Utc::now(),
                    expires_at: None,
                },
            );
        }

        let key = store.put(b"new".to_vec(), None).await.unwrap();
        assert_eq!(key.as_str(), "fresh");
        // the prior occupant was not overwritten
        let occupied = store.take_once(&Key::new("taken")).await.unwrap();
        assert_eq!(occupied, b"occupied");
    }

    #[tokio::test]
    async fn exhausted_generation_fails_after_bounded_attempts() {
        let mut keygen = MockKeyGenerator::new();
        keygen
            .expect_generate()
            .times(4)
            .returning(|| Ok(Key::new("stuck")));

        let store = MemoryStore::with_keygen(
            StoreConfig {
                max_key_attempts: 4,
                ..StoreConfig::default()
            },
            Arc::new(keygen),
        );
        {
            let mut shard = MemoryStore::lock(store.shard_for(&Key::new("stuck")));
            shard.live.insert(
                Key::new("stuck"),
                Secret {
                    payload: b"occupied".to_vec(),
                    created_at: Utc::now(),
                    expires_at: None,
                },
            );
        }

        let err = store.put(b"new".to_vec(), None).await.unwrap_err();
        assert!(matches!(err, SecretError::GenerationExhausted(4)));
        assert_eq!(store.live_count().await, 1);
    }

    #[tokio::test]
    async fn ttl_ceiling_clamps_the_requested_ttl() {
        let store = MemoryStore::new(StoreConfig {
            max_ttl: Some(Duration::from_millis(20)),
            ..StoreConfig::default()
        });
        let key = store
            .put(b"x".to_vec(), Some(Duration::from_secs(3600)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(matches!(
            store.take_once(&key).await,
            Err(SecretError::NotFound)
        ));
    }

    #[tokio::test]
    async fn default_ttl_applies_when_none_is_requested() {
        let store = MemoryStore::new(StoreConfig {
            default_ttl: Some(Duration::from_millis(20)),
            ..StoreConfig::default()
        });
        let key = store.put(b"x".to_vec(), None).await.unwrap();
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(matches!(
            store.take_once(&key).await,
            Err(SecretError::NotFound)
        ));
    }

    #[tokio::test]
    async fn sweep_removes_only_expired_secrets() {
        let store = store();
        let expired = store
            .put(b"old".to_vec(), Some(Duration::from_millis(10)))
            .await
            .unwrap();
        let fresh = store
            .put(b"new".to_vec(), Some(Duration::from_secs(3600)))
            .await
            .unwrap();
        let eternal = store.put(b"keep".to_vec(), None).await.unwrap();

        tokio::time::sleep(Duration::from_millis(40)).await;
        let removed = store.sweep_expired(Utc::now());

        assert_eq!(removed, 1);
        assert!(matches!(
            store.take_once(&expired).await,
            Err(SecretError::NotFound)
        ));
        assert_eq!(store.take_once(&fresh).await.unwrap(), b"new");
        assert_eq!(store.take_once(&eternal).await.unwrap(), b"keep");
    }

    #[tokio::test]
    async fn sweep_discards_stale_entries_for_consumed_secrets() {
        let store = store();
        let key = store
            .put(b"x".to_vec(), Some(Duration::from_millis(10)))
            .await
            .unwrap();
        store.take_once(&key).await.unwrap();

        tokio::time::sleep(Duration::from_millis(40)).await;
        // heap entry is still queued but its secret is gone; nothing counts
        assert_eq!(store.sweep_expired(Utc::now()), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_takes_have_exactly_one_winner() {
        const RACERS: usize = 32;

        let store = Arc::new(store());
        let key = store.put(b"race".to_vec(), None).await.unwrap();
        let barrier = Arc::new(Barrier::new(RACERS));

        let mut tasks = JoinSet::new();
        for _ in 0..RACERS {
            let store = store.clone();
            let key = key.clone();
            let barrier = barrier.clone();
            tasks.spawn(async move {
                barrier.wait().await;
                store.take_once(&key).await
            });
        }

        let mut wins = 0;
        let mut misses = 0;
        while let Some(result) = tasks.join_next().await {
            match result.unwrap() {
                Ok(payload) => {
                    assert_eq!(payload, b"race");
                    wins += 1;
                }
                Err(SecretError::NotFound) => misses += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(wins, 1);
        assert_eq!(misses, RACERS - 1);
        assert_eq!(store.live_count().await, 0);
    }

    #[tokio::test]
    async fn puts_do_not_reuse_live_keys() {
        let store = store();
        let mut keys = std::collections::HashSet::new();
        for i in 0..50 {
            let key = store.put(format!("s{i}").into_bytes(), None).await.unwrap();
            assert!(keys.insert(key));
        }
        assert_eq!(store.live_count().await, 50);
    }
}
