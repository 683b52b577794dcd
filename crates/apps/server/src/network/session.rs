use crate::hub::{ClientHub, Registration};
use voicechat_network::{ClientMessage, ClientRecord};

/// Per-connection state after the hello frame.
#[derive(Debug)]
pub struct ClientSession {
    registration: Registration,
    validated: bool,
}

impl ClientSession {
    pub fn new(registration: Registration) -> Self {
        Self {
            registration,
            validated: false,
        }
    }

    pub fn record(&self) -> &ClientRecord {
        &self.registration.record
    }

    pub fn registration(&self) -> &Registration {
        &self.registration
    }

    pub fn is_validated(&self) -> bool {
        self.validated
    }

    /// Record that the compatibility check passed for this session.
    pub fn mark_validated(&mut self) {
        self.validated = true;
    }

    /// Route an inbound message to the hub, attributed to this session's client.
    ///
    /// Returns whether the message was dispatched. Nothing is dispatched once
    /// a reconnect under the same id has superseded this session.
    pub fn handle(&self, hub: &ClientHub, message: ClientMessage) -> bool {
        let name = &self.registration.record.name;
        if !hub.is_current(&self.registration) {
            tracing::warn!("Dropping {:?} from superseded session of {}", message.kind(), name);
            return false;
        }

        match message {
            ClientMessage::Hello { .. } => {
                tracing::warn!("Ignoring repeated hello from {}", name);
                false
            }
            ClientMessage::UpdateState(_) if !self.validated => {
                tracing::warn!("Dropping state update from unvalidated client {}", name);
                false
            }
            message => {
                hub.dispatch(&self.registration.record, &message);
                true
            }
        }
    }
}
