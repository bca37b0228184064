//! Relay server listener
//!
//! Handles the TCP accept loop, assigns connection ids and spawns one
//! session task per client.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::Result;
use crate::registry::{ConnectionRegistry, IdSequence};
use crate::server::config::ServerConfig;
use crate::session::Session;

/// Chat relay server
pub struct ChatServer {
    config: ServerConfig,
    registry: Arc<ConnectionRegistry>,
    ids: IdSequence,
    connection_semaphore: Option<Arc<Semaphore>>,
}

impl ChatServer {
    /// Create a new server with the given configuration
    pub fn new(config: ServerConfig) -> Self {
        let connection_semaphore = if config.max_connections > 0 {
            Some(Arc::new(Semaphore::new(config.max_connections)))
        } else {
            None
        };

        Self {
            config,
            registry: Arc::new(ConnectionRegistry::new()),
            ids: IdSequence::new(),
            connection_semaphore,
        }
    }

    /// Get a reference to the connection registry
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Get the configured bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }

    /// Bind and run the server
    ///
    /// Runs until the process is killed.
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve(listener).await
    }

    /// Bind and run the server until `shutdown` resolves
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;

        tokio::select! {
            _ = shutdown => {
                tracing::info!("Shutdown signal received");
                Ok(())
            }
            result = self.serve(listener) => result,
        }
    }

    /// Run the accept loop on an already bound listener
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(addr = %addr, "Chat server started");

        loop {
            match listener.accept().await {
                Ok((socket, peer_addr)) => {
                    self.handle_connection(socket, peer_addr).await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }

    async fn handle_connection(&self, socket: TcpStream, peer_addr: SocketAddr) {
        // Check connection limit
        let permit = match self.try_acquire_permit() {
            Ok(permit) => permit,
            Err(()) => {
                tracing::warn!(peer = %peer_addr, "Connection rejected: limit reached");
                return;
            }
        };

        if self.config.tcp_nodelay {
            if let Err(e) = socket.set_nodelay(true) {
                tracing::warn!(peer = %peer_addr, error = %e, "Failed to set TCP_NODELAY");
            }
        }

        let id = self.ids.next_id();
        let (reader, writer) = socket.into_split();

        // Registered before the session starts so it can receive broadcasts
        // from the very first moment
        self.registry.register(id, writer).await;

        tracing::info!(connection_id = %id, peer = %peer_addr, "Client connected");

        let registry = Arc::clone(&self.registry);
        let read_buffer_size = self.config.read_buffer_size;

        tokio::spawn(async move {
            let _permit = permit;
            let mut session = Session::new(id, reader, registry, read_buffer_size);

            if let Err(e) = session.run().await {
                tracing::debug!(connection_id = %id, error = %e, "Connection error");
            }

            tracing::info!(connection_id = %id, "Client disconnected");
        });
    }

    fn try_acquire_permit(&self) -> std::result::Result<Option<OwnedSemaphorePermit>, ()> {
        match self.connection_semaphore {
            Some(ref sem) => sem.clone().try_acquire_owned().map(Some).map_err(|_| ()),
            None => Ok(None),
        }
    }
}
