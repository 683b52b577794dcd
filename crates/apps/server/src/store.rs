use dashmap::DashMap;
use voicechat_network::{ClientId, PlayerState};

/// Concurrent map from client identity to voice state.
///
/// Every operation touches exactly one key and is atomic for that key.
/// Callers never hold a lock across calls: values are cloned out.
#[derive(Debug, Default)]
pub struct StateStore {
    states: DashMap<ClientId, PlayerState>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: ClientId) -> Option<PlayerState> {
        self.states.get(&id).map(|entry| entry.value().clone())
    }

    /// Snapshot of every entry. Not atomic across keys.
    pub fn all(&self) -> Vec<PlayerState> {
        self.states
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Store a state, returning the one it replaced.
    pub fn put(&self, id: ClientId, state: PlayerState) -> Option<PlayerState> {
        self.states.insert(id, state)
    }

    pub fn remove(&self, id: ClientId) -> Option<PlayerState> {
        self.states.remove(&id).map(|(_, state)| state)
    }

    /// Read-modify-write under the key's lock.
    ///
    /// Inserts `default()` first when no entry exists, applies `mutate` and
    /// returns the stored result.
    pub fn update<D, F>(&self, id: ClientId, default: D, mutate: F) -> PlayerState
    where
        D: FnOnce() -> PlayerState,
        F: FnOnce(&mut PlayerState),
    {
        let mut entry = self.states.entry(id).or_insert_with(default);
        mutate(entry.value_mut());
        entry.value().clone()
    }

    /// Return the existing entry, inserting `default()` when absent.
    pub fn get_or_insert_with<D>(&self, id: ClientId, default: D) -> PlayerState
    where
        D: FnOnce() -> PlayerState,
    {
        self.states.entry(id).or_insert_with(default).value().clone()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
