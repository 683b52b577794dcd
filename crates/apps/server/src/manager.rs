use crate::store::StateStore;
use std::sync::{Arc, Weak};
use voicechat_network::{
    ClientGroup, ClientId, ClientMessage, ClientRecord, LifecycleAdapter, MessageKind,
    PlayerState, ServerMessage, TransportAdapter, UpdateState,
};

/// Authoritative voice state of every client, mirrored to all clients.
///
/// Every mutation stores exactly one entry and is followed by one broadcast
/// of the resulting state. Missing entries are never an error: paths that
/// read a client's state fall back to [`PlayerStateManager::default_state`].
pub struct PlayerStateManager {
    states: StateStore,
    transport: Arc<dyn TransportAdapter>,
}

impl PlayerStateManager {
    /// Create the manager and register its callbacks on both adapters.
    ///
    /// Callbacks only hold a weak reference, so dropping the returned `Arc`
    /// turns them into no-ops.
    pub fn new(
        lifecycle: Arc<dyn LifecycleAdapter>,
        transport: Arc<dyn TransportAdapter>,
    ) -> Arc<Self> {
        let manager = Arc::new(Self {
            states: StateStore::new(),
            transport: transport.clone(),
        });

        let weak = Arc::downgrade(&manager);
        lifecycle.on_login(Arc::new(move |client: &ClientRecord| {
            with_manager(&weak, |manager| manager.on_login(client));
        }));

        let weak = Arc::downgrade(&manager);
        lifecycle.on_logout(Arc::new(move |client: &ClientRecord| {
            with_manager(&weak, |manager| manager.on_logout(client));
        }));

        let weak = Arc::downgrade(&manager);
        transport.on_receive(
            MessageKind::UpdateState,
            Arc::new(move |client: &ClientRecord, message: &ClientMessage| {
                if let ClientMessage::UpdateState(update) = message {
                    with_manager(&weak, |manager| manager.on_update_state(client, *update));
                }
            }),
        );

        manager
    }

    pub fn state(&self, id: ClientId) -> Option<PlayerState> {
        self.states.get(id)
    }

    pub fn states(&self) -> Vec<PlayerState> {
        self.states.all()
    }

    /// State assumed for a client that has not reported anything yet.
    pub fn default_state(client: &ClientRecord) -> PlayerState {
        PlayerState::default_for(client)
    }

    /// Send the full snapshot to a client that just passed the version check.
    ///
    /// The client's own entry is created first so the snapshot includes it.
    pub fn on_compatibility_check_succeeded(&self, client: &ClientRecord) {
        let state = self
            .states
            .get_or_insert_with(client.id, || Self::default_state(client));
        tracing::debug!("Setting initial state of {}: {}", client.name, state);

        let snapshot = self.states.all();
        self.transport.send_to_one(client.id, ServerMessage::PlayerStates(snapshot));
    }

    /// Assign (or clear) the client's audio group.
    pub fn set_group(&self, client: &ClientRecord, group: Option<ClientGroup>) {
        let state = self.states.update(
            client.id,
            || {
                tracing::debug!("Defaulting to default state for {}", client.name);
                Self::default_state(client)
            },
            |state| state.group = group,
        );
        tracing::debug!("Setting group of {}: {}", client.name, state);
        self.broadcast_state(state);
    }

    fn on_update_state(&self, client: &ClientRecord, update: UpdateState) {
        let state = self.states.update(
            client.id,
            || Self::default_state(client),
            |state| {
                state.disconnected = update.disconnected;
                state.disabled = update.disabled;
            },
        );
        tracing::debug!("Got state of {}: {}", client.name, state);
        self.broadcast_state(state);
    }

    fn on_login(&self, client: &ClientRecord) {
        let state = Self::default_state(client);
        self.states.put(client.id, state.clone());
        tracing::debug!("Client {} logged in: {}", client.name, state);
        self.broadcast_state(state);
    }

    fn on_logout(&self, client: &ClientRecord) {
        let name = match self.states.remove(client.id) {
            Some(removed) => removed.name,
            None => client.name.clone(),
        };
        tracing::debug!("Removing state of {}", name);

        // Not stored: the entry is gone, this only tells clients it left.
        self.broadcast_state(PlayerState::new(client.id, name, true, true));
    }

    fn broadcast_state(&self, state: PlayerState) {
        self.transport.send_to_all(ServerMessage::PlayerState(state));
    }
}

fn with_manager(weak: &Weak<PlayerStateManager>, f: impl FnOnce(&PlayerStateManager)) {
    if let Some(manager) = weak.upgrade() {
        f(&manager);
    }
}
