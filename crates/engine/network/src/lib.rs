//! Shared types for the voice chat presence layer.
//!
//! This crate provides:
//! - The per-client voice status model (`PlayerState`) and its identifiers
//! - Wire messages exchanged between clients and the server
//! - The collaborator contracts the server core is built against
//!   (`TransportAdapter`, `LifecycleAdapter`)

pub mod error;
pub mod message;
pub mod transport;

pub use error::{NetworkError, NetworkResult};
pub use message::{
    ClientGroup, ClientId, ClientMessage, MessageKind, PlayerState, ServerMessage, UpdateState,
    COMPATIBILITY_VERSION, MAX_NAME_LEN,
};
pub use transport::{
    ClientRecord, LifecycleAdapter, LifecycleHandler, MessageHandler, TransportAdapter,
};
