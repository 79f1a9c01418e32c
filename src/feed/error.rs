use thiserror::Error;

/// Loading the token collection failed.
///
/// The only recoverable error kind in the dashboard core. The store surfaces
/// it as an error flag and keeps the previous collection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Fetch cancelled")]
    Cancelled,
}

/// A real-time payload could not be turned into a price update.
///
/// Logged and dropped; never shown to the user.
#[derive(Debug, Error)]
pub enum MessageError {
    #[error("Malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Invalid update for '{id}': {reason}")]
    Invalid { id: String, reason: String },
}
