use thiserror::Error;

/// Payload rejected at `put` time. Recoverable by the caller, never retried
/// internally.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("payload is empty")]
    EmptyPayload,
    #[error("payload of {size} bytes exceeds the {max} byte limit")]
    PayloadTooLarge { size: usize, max: usize },
}

/// Errors surfaced by [`crate::SecretStore`] operations.
///
/// Unknown, expired, and already-consumed keys all collapse into
/// [`SecretError::NotFound`]. The store does not distinguish these cases so
/// that a caller probing keys learns nothing about consumption timing.
#[derive(Debug, Error)]
pub enum SecretError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Key unknown, expired, or already consumed.
    #[error("secret not found")]
    NotFound,
    /// Key generation kept colliding with live secrets. Transient; the whole
    /// `put` is safe to retry.
    #[error("could not generate a unique key after {0} attempts")]
    GenerationExhausted(u32),
    /// Entropy source or backing storage failure. Surfaced generically,
    /// details stay in logs.
    #[error("storage failure: {0}")]
    Internal(#[from] anyhow::Error),
}
