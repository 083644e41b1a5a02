//! Error types shared across the matching system.

/// Errors surfaced by bootstrap validation and actor messaging.
#[derive(Debug, thiserror::Error)]
pub enum MatchingError {
    /// A preference list is not a complete permutation of the opposite
    /// universe. Fatal to bootstrap.
    #[error("Invalid preference list: {0}")]
    InvalidPreferenceList(String),

    /// A message was addressed to an id with no registered actor.
    #[error("Unknown actor: {0}")]
    UnknownActor(String),

    /// A proposal target could not respond (e.g., already torn down).
    #[error("Actor unavailable: {0}")]
    Unavailable(String),

    /// Failed to spawn part of the actor population.
    #[error("Spawn error: {0}")]
    Spawn(String),
}
