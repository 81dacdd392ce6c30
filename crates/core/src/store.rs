//! Secret storage boundary.
//!
//! All mutation goes through the two [`SecretStore`] operations plus the
//! sweep hook reserved for the [`crate::sweeper`]; the backing map is never
//! exposed. [`MemoryStore`] is the in-process implementation; a deployment
//! wanting durability can supply its own implementation of the trait.

mod memory;

pub use memory::MemoryStore;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::SecretError;
use crate::keygen::Key;

/// Store for secret lifecycle operations.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Stores a payload and returns its freshly generated key.
    ///
    /// Rejects empty payloads and payloads over the configured maximum with
    /// a validation error. `ttl` bounds the secret's lifetime; without one
    /// the configured default and ceiling apply.
    async fn put(&self, payload: Vec<u8>, ttl: Option<Duration>) -> Result<Key, SecretError>;

    /// Redeems a key: returns the payload and removes the secret in one
    /// atomic step. Racing callers presenting the same key see exactly one
    /// success; everyone else gets `NotFound`, as do callers holding an
    /// unknown, expired, or already-consumed key.
    ///
    /// There is no rollback: once a secret is consumed the payload is gone,
    /// even if the winning caller aborts before reading the response.
    async fn take_once(&self, key: &Key) -> Result<Vec<u8>, SecretError>;

    /// Number of live (unconsumed, unexpired-as-of-last-sweep) secrets.
    async fn live_count(&self) -> usize;
}
