pub mod io;
pub mod listener;
pub mod session;

pub use listener::VoiceServer;
pub use session::ClientSession;

use thiserror::Error;
use voicechat_network::{MessageKind, NetworkError};

/// Errors emitted by the networking layer.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("network error: {0}")]
    Network(#[from] NetworkError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("client did not send hello in time")]
    HandshakeTimeout,
    #[error("unexpected {0:?} message")]
    UnexpectedMessage(MessageKind),
    #[error("client name of {len} bytes exceeds limit of {max} bytes")]
    NameTooLong { len: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, ServerError>;
