//! Client session handling
//!
//! One [`Session`] runs per accepted connection. It moves through
//! [`SessionPhase::AwaitingFirstMessage`], [`SessionPhase::Active`] and
//! [`SessionPhase::Closed`].

pub mod handler;
pub mod message;
pub mod state;

pub use handler::Session;
pub use message::Inbound;
pub use state::SessionPhase;
