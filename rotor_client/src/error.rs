use rotor_protocol::FrameError;
use thiserror::Error;

/// Everything that can go wrong while routing one inbound frame.
///
/// None of these are fatal: the dispatch loop logs the error, drops the
/// frame and keeps running against the possibly misbehaving peer.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error("unknown message identifier '{0}'")]
    UnknownIdentifier(String),

    #[error("invalid {identifier} payload: {source}")]
    Payload {
        identifier: &'static str,
        source: serde_json::Error,
    },

    /// The favorites payload parsed but failed shape or capacity
    /// validation; the local list has been reset and resynced.
    #[error("favorites rejected: {0}")]
    InvalidFavorites(String),
}
