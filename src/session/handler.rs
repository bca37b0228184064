//! Per-connection session handler
//!
//! Reads chunks from one client, relays text to everyone else through the
//! registry, sends the one-time welcome, and tears the connection down when
//! the stream ends.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::tcp::OwnedWriteHalf;

use super::message::{arrival_notice, departure_notice, format_broadcast, welcome_message, Inbound};
use super::state::SessionPhase;
use crate::error::Result;
use crate::registry::{ConnectionId, ConnectionRegistry};

/// Session handler for a single client
///
/// Owns the read side of the stream. The write side lives in the registry,
/// which is how both broadcasts and the welcome reach the client.
pub struct Session<R, W = OwnedWriteHalf> {
    id: ConnectionId,
    reader: R,
    registry: Arc<ConnectionRegistry<W>>,
    phase: SessionPhase,
    read_buffer_size: usize,
}

impl<R, W> Session<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Create a session for a connection already present in `registry`
    pub fn new(
        id: ConnectionId,
        reader: R,
        registry: Arc<ConnectionRegistry<W>>,
        read_buffer_size: usize,
    ) -> Self {
        Self {
            id,
            reader,
            registry,
            phase: SessionPhase::default(),
            read_buffer_size: read_buffer_size.max(1),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Run the session until the client disconnects
    ///
    /// The connection is unregistered and its write side shut down on every
    /// exit path. A read error is returned after teardown; the departure
    /// notice is only broadcast on a clean end-of-stream.
    pub async fn run(&mut self) -> Result<()> {
        let result = self.relay().await;
        self.teardown().await;
        result
    }

    async fn relay(&mut self) -> Result<()> {
        let mut buf = vec![0u8; self.read_buffer_size];

        loop {
            let n = self.reader.read(&mut buf).await?;

            if n == 0 {
                tracing::info!(connection_id = %self.id, "Client closed connection");
                self.registry
                    .broadcast(&departure_notice(self.id), self.id)
                    .await;
                return Ok(());
            }

            self.handle_chunk(&buf[..n]).await?;
        }
    }

    async fn handle_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        let inbound = Inbound::classify(chunk);

        match &inbound {
            Inbound::Text(text) => {
                let payload = format_broadcast(self.id, text);
                let delivered = self.registry.broadcast(&payload, self.id).await;

                tracing::trace!(
                    connection_id = %self.id,
                    bytes = chunk.len(),
                    delivered = delivered,
                    "Relayed message"
                );
            }
            suppressed => {
                tracing::debug!(
                    connection_id = %self.id,
                    kind = ?suppressed,
                    bytes = chunk.len(),
                    "Suppressed non-text chunk"
                );
            }
        }

        if inbound.is_relayed() && self.phase.on_first_message() {
            self.registry
                .send_to(self.id, &welcome_message(self.id))
                .await?;
            self.registry
                .broadcast(&arrival_notice(self.id), self.id)
                .await;

            tracing::debug!(connection_id = %self.id, "Session active");
        }

        Ok(())
    }

    async fn teardown(&mut self) {
        // Remove before closing so no broadcast targets a dead stream
        if let Some(mut writer) = self.registry.unregister(self.id).await {
            if let Err(e) = writer.shutdown().await {
                tracing::debug!(
                    connection_id = %self.id,
                    error = %e,
                    "Shutdown failed"
                );
            }
        }

        self.phase.close();
    }
}
