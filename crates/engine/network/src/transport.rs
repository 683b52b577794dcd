//! Collaborator contracts.
//!
//! The presence core never talks to the game engine or the network directly.
//! It is handed implementations of these traits and registers callbacks on
//! them, so tests and alternative hosts can substitute their own.

use std::sync::Arc;

use crate::message::{ClientId, ClientMessage, MessageKind, ServerMessage};

/// Identity lookup result for a connected client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientRecord {
    pub id: ClientId,
    pub name: String,
}

impl ClientRecord {
    pub fn new(id: ClientId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Callback invoked on a lifecycle event.
pub type LifecycleHandler = Arc<dyn Fn(&ClientRecord) + Send + Sync>;

/// Callback invoked for an inbound message, attributed to its sender.
pub type MessageHandler = Arc<dyn Fn(&ClientRecord, &ClientMessage) + Send + Sync>;

/// Source of client login/logout events.
pub trait LifecycleAdapter: Send + Sync {
    /// Register a callback for clients joining.
    fn on_login(&self, handler: LifecycleHandler);

    /// Register a callback for clients leaving.
    fn on_logout(&self, handler: LifecycleHandler);
}

/// Outbound delivery and inbound handler registration.
///
/// Sends are fire-and-forget: delivery failures stay inside the
/// implementation and are never reported back to the caller.
pub trait TransportAdapter: Send + Sync {
    /// Send a message to a single client.
    fn send_to_one(&self, client: ClientId, message: ServerMessage);

    /// Send a message to every client connected at the time of the call.
    fn send_to_all(&self, message: ServerMessage);

    /// Register a handler for inbound messages of the given kind.
    fn on_receive(&self, kind: MessageKind, handler: MessageHandler);
}
