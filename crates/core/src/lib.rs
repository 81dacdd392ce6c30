//! Ephemeral secret lifecycle engine.
//!
//! A caller submits an opaque payload and gets back a single opaque key.
//! Whoever presents that key next redeems the payload exactly once; after
//! that redemption, or after an optional time limit elapses, the payload is
//! permanently unrecoverable.
//!
//! ## Components
//!
//! - [`keygen`] - cryptographically random, URL-safe key generation
//! - [`store`] - the [`SecretStore`] boundary and the in-process
//!   [`MemoryStore`] with atomic consume-and-remove retrieval
//! - [`sweeper`] - background task that removes expired secrets
//!
//! ## Usage
//!
//! ```ignore
//! use std::{sync::Arc, time::Duration};
//! use vanish_core::{MemoryStore, SecretStore, StoreConfig, sweeper};
//!
//! let store = Arc::new(MemoryStore::new(StoreConfig::default()));
//! let sweep = sweeper::spawn(store.clone(), Duration::from_secs(30));
//!
//! let key = store.put(b"db password".to_vec(), Some(Duration::from_secs(3600))).await?;
//! let payload = store.take_once(&key).await?; // second call yields NotFound
//! ```

pub mod config;
pub mod error;
pub mod keygen;
pub mod store;
pub mod sweeper;

pub use config::StoreConfig;
pub use error::{SecretError, ValidationError};
pub use keygen::{Key, KeyGenerator, RandomKeyGenerator};
pub use store::{MemoryStore, SecretStore};
