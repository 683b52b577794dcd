//! In-process client registry implementing both collaborator contracts.
//!
//! Each connected client owns an unbounded channel of outbound messages.
//! Whatever drives the client (a TCP session, a test) drains the receiver.

use crate::metrics::ServerMetrics;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use voicechat_network::{
    ClientId, ClientMessage, ClientRecord, LifecycleAdapter, LifecycleHandler, MessageHandler,
    MessageKind, ServerMessage, TransportAdapter,
};

struct Connection {
    record: ClientRecord,
    generation: u64,
    sender: mpsc::UnboundedSender<ServerMessage>,
}

/// Proof of a [`ClientHub::connect`] call, needed to disconnect.
///
/// A newer connection under the same id invalidates older registrations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub record: ClientRecord,
    generation: u64,
}

pub struct ClientHub {
    connections: DashMap<ClientId, Connection>,
    next_generation: AtomicU64,
    login_handlers: RwLock<Vec<LifecycleHandler>>,
    logout_handlers: RwLock<Vec<LifecycleHandler>>,
    message_handlers: RwLock<HashMap<MessageKind, Vec<MessageHandler>>>,
    metrics: Arc<ServerMetrics>,
}

impl ClientHub {
    pub fn new(metrics: Arc<ServerMetrics>) -> Self {
        Self {
            connections: DashMap::new(),
            next_generation: AtomicU64::new(0),
            login_handlers: RwLock::new(Vec::new()),
            logout_handlers: RwLock::new(Vec::new()),
            message_handlers: RwLock::new(HashMap::new()),
            metrics,
        }
    }

    pub fn metrics(&self) -> &Arc<ServerMetrics> {
        &self.metrics
    }

    /// Register a client, then fire login handlers.
    ///
    /// The client is registered before handlers run, so it receives the
    /// broadcasts they trigger.
    pub fn connect(
        &self,
        record: ClientRecord,
    ) -> (Registration, mpsc::UnboundedReceiver<ServerMessage>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);

        let replaced = self.connections.insert(
            record.id,
            Connection {
                record: record.clone(),
                generation,
                sender,
            },
        );
        if replaced.is_some() {
            tracing::warn!(
                "Client {} ({}) reconnected, replacing previous connection",
                record.name,
                record.id
            );
        }
        self.update_connected_gauge();

        tracing::info!("Client {} ({}) connected", record.name, record.id);
        let handlers = self.login_handlers.read().clone();
        for handler in handlers {
            handler(&record);
        }

        (Registration { record, generation }, receiver)
    }

    /// Unregister a client, then fire logout handlers.
    ///
    /// Returns `false` without firing anything if the registration was
    /// already superseded by a reconnect or disconnected before.
    pub fn disconnect(&self, registration: &Registration) -> bool {
        let removed = self
            .connections
            .remove_if(&registration.record.id, |_, connection| {
                connection.generation == registration.generation
            });
        if removed.is_none() {
            return false;
        }
        self.update_connected_gauge();

        let record = &registration.record;
        tracing::info!("Client {} ({}) disconnected", record.name, record.id);
        let handlers = self.logout_handlers.read().clone();
        for handler in handlers {
            handler(record);
        }
        true
    }

    /// Deliver an inbound message to the handlers registered for its kind.
    pub fn dispatch(&self, client: &ClientRecord, message: &ClientMessage) {
        self.metrics
            .messages_received
            .fetch_add(1, Ordering::Relaxed);

        let handlers = self
            .message_handlers
            .read()
            .get(&message.kind())
            .cloned()
            .unwrap_or_default();
        if handlers.is_empty() {
            tracing::debug!("No handler for {:?} from {}", message.kind(), client.name);
        }
        for handler in handlers {
            handler(client, message);
        }
    }

    /// Whether the registration still owns its client's connection, i.e. it
    /// has been neither disconnected nor superseded by a reconnect.
    pub fn is_current(&self, registration: &Registration) -> bool {
        self.connections
            .get(&registration.record.id)
            .is_some_and(|connection| connection.generation == registration.generation)
    }

    pub fn is_connected(&self, id: ClientId) -> bool {
        self.connections.contains_key(&id)
    }

    pub fn client_count(&self) -> usize {
        self.connections.len()
    }

    pub fn connected_clients(&self) -> Vec<ClientRecord> {
        self.connections
            .iter()
            .map(|entry| entry.value().record.clone())
            .collect()
    }

    fn update_connected_gauge(&self) {
        self.metrics
            .connected_clients
            .store(self.connections.len() as u64, Ordering::Relaxed);
    }

    fn deliver(&self, connection: &Connection, message: ServerMessage) {
        match connection.sender.send(message) {
            Ok(()) => {
                self.metrics.messages_sent.fetch_add(1, Ordering::Relaxed);
            }
            Err(_) => {
                tracing::trace!("Dropped message for closed client {}", connection.record.id);
            }
        }
    }
}

impl LifecycleAdapter for ClientHub {
    fn on_login(&self, handler: LifecycleHandler) {
        self.login_handlers.write().push(handler);
    }

    fn on_logout(&self, handler: LifecycleHandler) {
        self.logout_handlers.write().push(handler);
    }
}

impl TransportAdapter for ClientHub {
    fn send_to_one(&self, client: ClientId, message: ServerMessage) {
        match self.connections.get(&client) {
            Some(connection) => self.deliver(connection.value(), message),
            None => tracing::trace!("Dropped message for unknown client {}", client),
        }
    }

    fn send_to_all(&self, message: ServerMessage) {
        for entry in self.connections.iter() {
            self.deliver(entry.value(), message.clone());
        }
    }

    fn on_receive(&self, kind: MessageKind, handler: MessageHandler) {
        self.message_handlers
            .write()
            .entry(kind)
            .or_default()
            .push(handler);
    }
}
