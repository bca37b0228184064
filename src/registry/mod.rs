//! Connection registry for fan-out
//!
//! The registry owns the write half of every live connection, keyed by
//! [`ConnectionId`]. Session handlers keep the read half and reach the other
//! peers only through [`ConnectionRegistry::broadcast`].
//!
//! # Architecture
//!
//! ```text
//!                     Arc<ConnectionRegistry>
//!                 ┌──────────────────────────────┐
//!                 │ Mutex<HashMap<ConnectionId,  │
//!                 │        OwnedWriteHalf>>      │
//!                 └──────────────┬───────────────┘
//!                                │
//!        ┌───────────────────────┼───────────────────────┐
//!        │                       │                       │
//!        ▼                       ▼                       ▼
//!   [Session 1]             [Session 2]             [Session 3]
//!   read() ──► broadcast(payload, exclude = 1) ──► write to 2, 3
//! ```
//!
//! # Locking
//!
//! Register, unregister and broadcast share one mutex, and broadcast keeps it
//! for the whole round of writes. Two broadcasts never interleave on a
//! recipient, at the price of a slow peer stalling everyone else.

pub mod id;
pub mod store;

pub use id::{ConnectionId, IdSequence};
pub use store::ConnectionRegistry;
