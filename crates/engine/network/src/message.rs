//! Voice chat presence messages.
//!
//! These are the message types exchanged between clients and the server.
//! They are transport-agnostic and can be serialized over any transport.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::NetworkError;
use crate::transport::ClientRecord;

/// Protocol version a client must report to receive presence state.
pub const COMPATIBILITY_VERSION: u32 = 18;

/// Longest display name, in bytes, a client may announce in its hello.
pub const MAX_NAME_LEN: usize = 64;

/// Unique client identity, stable across reconnects within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClientId(pub Uuid);

impl ClientId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl From<Uuid> for ClientId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Opaque reference to an audio group.
///
/// Only the reference travels with a `PlayerState`; the group itself lives
/// elsewhere and is never mutated through this handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientGroup(pub Uuid);

impl ClientGroup {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Known voice status of one client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    pub id: ClientId,
    /// Display name, cached so it is still available once the client is gone.
    pub name: String,
    /// Voice channel not connected.
    pub disconnected: bool,
    /// Voice disabled client-side.
    pub disabled: bool,
    pub group: Option<ClientGroup>,
}

impl PlayerState {
    pub fn new(id: ClientId, name: impl Into<String>, disconnected: bool, disabled: bool) -> Self {
        Self {
            id,
            name: name.into(),
            disconnected,
            disabled,
            group: None,
        }
    }

    /// State assumed for a client before it has reported anything.
    pub fn default_for(client: &ClientRecord) -> Self {
        Self::new(client.id, client.name.clone(), false, true)
    }

    pub fn has_group(&self) -> bool {
        self.group.is_some()
    }
}

impl fmt::Display for PlayerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{name={}, disconnected={}, disabled={}, group={}}}",
            self.name,
            self.disconnected,
            self.disabled,
            match &self.group {
                Some(group) => group.0.to_string(),
                None => "none".to_string(),
            }
        )
    }
}

/// Client-side voice settings change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateState {
    pub disconnected: bool,
    pub disabled: bool,
}

/// Messages a client sends to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientMessage {
    /// First frame of a session.
    Hello {
        id: ClientId,
        name: String,
        compatibility_version: u32,
    },

    /// Voice settings changed.
    UpdateState(UpdateState),
}

impl ClientMessage {
    pub fn kind(&self) -> MessageKind {
        match self {
            ClientMessage::Hello { .. } => MessageKind::Hello,
            ClientMessage::UpdateState(_) => MessageKind::UpdateState,
        }
    }
}

/// Discriminant of [`ClientMessage`], used to register inbound handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Hello,
    UpdateState,
}

/// Messages the server sends to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerMessage {
    /// One client's state, broadcast after every change.
    PlayerState(PlayerState),

    /// Every known state, sent once to a newly validated client.
    PlayerStates(Vec<PlayerState>),

    /// The client's protocol version does not match the server's.
    Incompatible { server_version: u32 },
}

/// Serialize a message to bytes using bincode.
pub fn serialize<T: Serialize>(message: &T) -> Result<Vec<u8>, NetworkError> {
    bincode::serialize(message).map_err(|e| NetworkError::Serialization(e.to_string()))
}

/// Deserialize bytes to a message using bincode.
pub fn deserialize<'a, T: Deserialize<'a>>(bytes: &'a [u8]) -> Result<T, NetworkError> {
    bincode::deserialize(bytes).map_err(|e| NetworkError::Deserialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> ClientRecord {
        ClientRecord::new(ClientId::new_v4(), name)
    }

    #[test]
    fn default_state_is_connected_but_disabled() {
        let client = record("alice");
        let state = PlayerState::default_for(&client);

        assert_eq!(state.id, client.id);
        assert_eq!(state.name, "alice");
        assert!(!state.disconnected);
        assert!(state.disabled);
        assert!(!state.has_group());
    }

    #[test]
    fn message_kind_matches_variant() {
        let hello = ClientMessage::Hello {
            id: ClientId::new_v4(),
            name: "bob".into(),
            compatibility_version: COMPATIBILITY_VERSION,
        };
        let update = ClientMessage::UpdateState(UpdateState {
            disconnected: true,
            disabled: false,
        });

        assert_eq!(hello.kind(), MessageKind::Hello);
        assert_eq!(update.kind(), MessageKind::UpdateState);
    }

    #[test]
    fn player_state_survives_encoding_with_group() {
        let mut state = PlayerState::new(ClientId::new_v4(), "carol", true, false);
        state.group = Some(ClientGroup::new_v4());

        let bytes = serialize(&ServerMessage::PlayerState(state.clone())).unwrap();
        let decoded: ServerMessage = deserialize(&bytes).unwrap();

        assert_eq!(decoded, ServerMessage::PlayerState(state));
    }

    #[test]
    fn garbage_fails_to_decode() {
        let result: Result<ClientMessage, _> = deserialize(&[0xff, 0xff, 0xff, 0xff, 0x01]);
        assert!(matches!(result, Err(NetworkError::Deserialization(_))));
    }

    #[test]
    fn display_shows_group_or_none() {
        let state = PlayerState::new(ClientId::new_v4(), "dave", false, true);
        assert_eq!(
            state.to_string(),
            "{name=dave, disconnected=false, disabled=true, group=none}"
        );
    }
}
