//! Connection registry implementation
//!
//! Maps connection ids to the write side of their streams and fans payloads
//! out to every connection but the sender.

use std::collections::HashMap;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::Mutex;

use super::id::ConnectionId;
use crate::error::{Error, Result};

/// Table of live connections
///
/// All operations go through a single `Mutex`, held for the full duration of
/// a broadcast including the per-target writes.
pub struct ConnectionRegistry<W = OwnedWriteHalf> {
    /// Map of connection id to the write side of its stream
    connections: Mutex<HashMap<ConnectionId, W>>,
}

impl<W> ConnectionRegistry<W> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(HashMap::new()),
        }
    }

    /// Register a newly accepted connection
    ///
    /// Ids come from a monotonic sequence so a collision means a caller bug;
    /// the old writer is dropped and a warning logged.
    pub async fn register(&self, id: ConnectionId, writer: W) {
        let mut connections = self.connections.lock().await;

        if connections.insert(id, writer).is_some() {
            tracing::warn!(connection_id = %id, "Connection id registered twice");
        }

        tracing::debug!(
            connection_id = %id,
            connections = connections.len(),
            "Connection registered"
        );
    }

    /// Remove a connection, handing back its writer so the caller can close it
    ///
    /// Removing an id that is not present is a no-op.
    pub async fn unregister(&self, id: ConnectionId) -> Option<W> {
        let mut connections = self.connections.lock().await;
        let writer = connections.remove(&id);

        if writer.is_some() {
            tracing::debug!(
                connection_id = %id,
                connections = connections.len(),
                "Connection unregistered"
            );
        }

        writer
    }

    /// Check if a connection is registered
    pub async fn contains(&self, id: ConnectionId) -> bool {
        self.connections.lock().await.contains_key(&id)
    }

    /// Number of registered connections
    pub async fn len(&self) -> usize {
        self.connections.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.connections.lock().await.is_empty()
    }
}

impl<W: AsyncWrite + Unpin> ConnectionRegistry<W> {
    /// Send a payload to every registered connection except `exclude`
    ///
    /// A write failure on one target is logged and skipped. The failing
    /// connection stays registered; its own session removes it once its
    /// next read fails.
    ///
    /// Returns the number of targets that accepted the payload.
    pub async fn broadcast(&self, payload: &[u8], exclude: ConnectionId) -> usize {
        let mut connections = self.connections.lock().await;
        let mut delivered = 0;

        for (id, writer) in connections.iter_mut() {
            if *id == exclude {
                continue;
            }

            match write_payload(writer, payload).await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::warn!(
                        connection_id = %id,
                        sender = %exclude,
                        error = %e,
                        "Communication error while broadcasting message"
                    );
                }
            }
        }

        delivered
    }

    /// Send a payload to a single connection
    pub async fn send_to(&self, id: ConnectionId, payload: &[u8]) -> Result<()> {
        let mut connections = self.connections.lock().await;
        let writer = connections.get_mut(&id).ok_or(Error::NotRegistered(id))?;

        write_payload(writer, payload).await?;
        Ok(())
    }
}

impl<W> Default for ConnectionRegistry<W> {
    fn default() -> Self {
        Self::new()
    }
}

async fn write_payload<W>(writer: &mut W, payload: &[u8]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(payload).await?;
    writer.flush().await
}
