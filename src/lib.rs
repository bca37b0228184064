//! Multi-client text broadcast relay
//!
//! Clients connect over TCP and every line one client sends is relayed to
//! all other connected clients, tagged with the sender's id.
//!
//! ```text
//!   TcpListener ──accept──► ChatServer ──register──► ConnectionRegistry
//!                               │                    (id -> write half)
//!                               │ spawn                  ▲
//!                               ▼                        │ broadcast / send_to
//!                          Session (read half) ──────────┘
//! ```
//!
//! # Example
//! ```no_run
//! use chat_relay::{ChatServer, ServerConfig};
//!
//! # async fn example() -> chat_relay::Result<()> {
//! let server = ChatServer::new(ServerConfig::default());
//! server.run().await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod registry;
pub mod server;
pub mod session;

pub use error::{Error, Result};
pub use registry::{ConnectionId, ConnectionRegistry};
pub use server::{ChatServer, ServerConfig};
pub use session::{Session, SessionPhase};
