//! Error types

use crate::registry::ConnectionId;

/// Crate-level error
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O failure on a connection or the listener
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Direct send to a connection that is not in the registry
    #[error("connection {0} is not registered")]
    NotRegistered(ConnectionId),
}

/// Result alias using the crate error
pub type Result<T> = std::result::Result<T, Error>;
