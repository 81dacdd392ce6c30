//! Background expiry sweeping.
//!
//! Runs independently of request traffic so expired secrets disappear even
//! if nobody ever presents their key. The sweep takes the same shard locks
//! as `put`/`take_once`, so a sweep racing a consumption of the same key has
//! exactly one winner and a payload is never readable past its deadline.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::store::MemoryStore;

/// Spawns the sweep loop on the current tokio runtime. Abort the returned
/// handle to stop it; there is nothing to flush on shutdown.
pub fn spawn(store: Arc<MemoryStore>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let removed = store.sweep_expired(Utc::now());
            if removed > 0 {
                tracing::debug!(removed, "swept expired secrets");
            }
        }
    })
}
