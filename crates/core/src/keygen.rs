//! Secret key generation.
//!
//! Keys are the only credential needed to redeem a secret, so they come from
//! the operating system CSPRNG: 32 random bytes, base64 URL-safe encoded
//! (256 bits of entropy, 43 characters). Nothing about storage internals
//! leaks into a key - no counters, no timestamps.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

use crate::error::SecretError;

/// Raw entropy per key, before encoding.
pub const KEY_BYTES: usize = 32;

/// Opaque retrieval key for a stored secret.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Key(String);

impl Key {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix safe to put in logs. The full key is a capability and
    /// must never be logged.
    pub fn prefix(&self) -> &str {
        let end = self.0.len().min(8);
        &self.0[..end]
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Debug redacts: keys end up in error context and panic messages otherwise.
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({}..)", self.prefix())
    }
}

impl From<String> for Key {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

/// Source of fresh retrieval keys.
///
/// Collisions with live keys are the caller's problem: `put` checks for
/// absence before insertion and asks for another key if needed.
#[cfg_attr(test, mockall::automock)]
pub trait KeyGenerator: Send + Sync {
    /// Produces a key indistinguishable from uniform random over the key
    /// space. Fails only if the entropy source does, which is fatal to the
    /// request but not the process.
    fn generate(&self) -> Result<Key, SecretError>;
}

/// OS CSPRNG-backed generator used in production.
pub struct RandomKeyGenerator;

impl KeyGenerator for RandomKeyGenerator {
    fn generate(&self) -> Result<Key, SecretError> {
        let mut bytes = [0u8; KEY_BYTES];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| SecretError::Internal(anyhow::anyhow!("entropy source unavailable: {e}")))?;
        Ok(Key::new(URL_SAFE_NO_PAD.encode(bytes)))
    }
}
