//! Voice chat presence server crate.
//!
//! Keeps the authoritative record of every connected client's voice status
//! and mirrors it to all clients. The modules exposed here cover the state
//! store, the synchronization protocol, the version compatibility gate, an
//! in-process client hub and a TCP transport built on top of it.

pub mod compat;
pub mod config;
pub mod hub;
pub mod manager;
pub mod metrics;
pub mod network;
pub mod store;

pub use compat::CompatibilityCheck;
pub use config::ServerConfig;
pub use hub::{ClientHub, Registration};
pub use manager::PlayerStateManager;
pub use metrics::ServerMetrics;
pub use network::{ClientSession, ServerError, VoiceServer};
pub use store::StateStore;
