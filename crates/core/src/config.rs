use std::time::Duration;

/// Policy knobs for a [`crate::MemoryStore`].
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Largest accepted payload. Larger payloads fail `put` with a
    /// validation error.
    pub max_payload_bytes: usize,
    /// Time limit applied when the caller requests none. `None` means such
    /// secrets live until consumed.
    pub default_ttl: Option<Duration>,
    /// Ceiling clamped onto every secret's time limit, including secrets
    /// stored without one. `None` disables the ceiling.
    pub max_ttl: Option<Duration>,
    /// Key generation attempts per `put` before giving up with
    /// `GenerationExhausted`.
    pub max_key_attempts: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_payload_bytes: 1024 * 1024,
            default_ttl: None,
            max_ttl: None,
            max_key_attempts: 8,
        }
    }
}
