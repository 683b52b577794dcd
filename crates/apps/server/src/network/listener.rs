use super::{io, session::ClientSession, Result, ServerError};
use crate::{
    compat::CompatibilityCheck, config::ServerConfig, hub::ClientHub,
    manager::PlayerStateManager, metrics::ServerMetrics,
};
use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use voicechat_network::{
    message, ClientMessage, ClientRecord, NetworkError, ServerMessage, TransportAdapter,
    MAX_NAME_LEN,
};

struct SharedState {
    hub: Arc<ClientHub>,
    manager: Arc<PlayerStateManager>,
    compat: CompatibilityCheck,
    handshake_timeout: Duration,
    metrics: Arc<ServerMetrics>,
}

/// TCP front end feeding a [`ClientHub`].
///
/// One connection is one client: the hello frame logs it in, closing the
/// connection logs it out.
pub struct VoiceServer {
    listener: TcpListener,
    shared: Arc<SharedState>,
}

impl VoiceServer {
    pub async fn bind(
        config: &ServerConfig,
        hub: Arc<ClientHub>,
        manager: Arc<PlayerStateManager>,
    ) -> Result<Self> {
        let listener = TcpListener::bind(&config.bind_address).await?;
        tracing::info!(
            "Voice chat server listening on {} (compatibility version {})",
            listener.local_addr()?,
            config.compatibility_version
        );

        let metrics = hub.metrics().clone();
        Ok(Self {
            listener,
            shared: Arc::new(SharedState {
                hub,
                manager,
                compat: CompatibilityCheck::new(config.compatibility_version),
                handshake_timeout: config.handshake_timeout,
                metrics,
            }),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until the listener fails.
    pub async fn run(self) -> Result<()> {
        loop {
            let (stream, peer) = self.listener.accept().await?;
            let shared = self.shared.clone();

            tokio::spawn(async move {
                if let Err(e) = handle_connection(shared, stream, peer).await {
                    tracing::warn!("Connection from {} ended with error: {}", peer, e);
                }
            });
        }
    }
}

async fn handle_connection(
    shared: Arc<SharedState>,
    stream: TcpStream,
    peer: SocketAddr,
) -> Result<()> {
    stream.set_nodelay(true)?;
    let (mut reader, mut writer) = stream.into_split();

    let hello = tokio::time::timeout(
        shared.handshake_timeout,
        io::read_message::<ClientMessage, _>(&mut reader),
    )
    .await
    .map_err(|_| ServerError::HandshakeTimeout)??;

    let (record, client_version) = match hello {
        ClientMessage::Hello {
            id,
            name,
            compatibility_version,
        } => {
            if name.len() > MAX_NAME_LEN {
                return Err(ServerError::NameTooLong {
                    len: name.len(),
                    max: MAX_NAME_LEN,
                });
            }
            (ClientRecord::new(id, name), compatibility_version)
        }
        other => return Err(ServerError::UnexpectedMessage(other.kind())),
    };
    tracing::debug!("Hello from {} ({}) at {}", record.name, record.id, peer);

    let (registration, mut outbound) = shared.hub.connect(record);

    // Ends when the hub drops the sender (disconnect or reconnect elsewhere)
    // or when a write fails.
    let metrics = shared.metrics.clone();
    let mut writer_task = tokio::spawn(async move {
        while let Some(message) = outbound.recv().await {
            let written = io::write_message(&mut writer, &message).await?;
            metrics
                .bytes_sent
                .fetch_add(written as u64, Ordering::Relaxed);
        }
        Ok::<(), ServerError>(())
    });

    let mut session = ClientSession::new(registration);
    if shared.compat.check(client_version) {
        session.mark_validated();
        shared
            .manager
            .on_compatibility_check_succeeded(session.record());
    } else {
        tracing::warn!(
            "Client {} has incompatible version {} (server {})",
            session.record().name,
            client_version,
            shared.compat.version()
        );
        shared.metrics.rejected_clients.fetch_add(1, Ordering::Relaxed);
        shared.hub.send_to_one(
            session.record().id,
            ServerMessage::Incompatible {
                server_version: shared.compat.version(),
            },
        );
        shared.hub.disconnect(session.registration());
        let _ = writer_task.await;
        return Ok(());
    }

    let outcome = tokio::select! {
        result = read_loop(&shared, &session, &mut reader) => SessionEnd::Reader(result),
        joined = &mut writer_task => SessionEnd::Writer(joined),
    };

    // Dropping the hub's sender ends the writer once queued messages are out.
    shared.hub.disconnect(session.registration());
    match outcome {
        SessionEnd::Reader(result) => {
            let _ = writer_task.await;
            result
        }
        SessionEnd::Writer(Ok(Ok(()))) => {
            tracing::info!(
                "Session of {} at {} superseded by a reconnect",
                session.record().name,
                peer
            );
            Ok(())
        }
        SessionEnd::Writer(Ok(Err(e))) => Err(e),
        SessionEnd::Writer(Err(e)) => {
            tracing::error!("Writer task for {} failed: {}", peer, e);
            Ok(())
        }
    }
}

enum SessionEnd {
    Reader(Result<()>),
    Writer(std::result::Result<Result<()>, tokio::task::JoinError>),
}

async fn read_loop(
    shared: &SharedState,
    session: &ClientSession,
    reader: &mut tokio::net::tcp::OwnedReadHalf,
) -> Result<()> {
    loop {
        let data = match io::read_frame(reader).await {
            Ok(data) => data,
            Err(NetworkError::ConnectionClosed) => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        shared
            .metrics
            .bytes_received
            .fetch_add(data.len() as u64 + 4, Ordering::Relaxed);

        match message::deserialize::<ClientMessage>(&data) {
            Ok(message) => {
                session.handle(&shared.hub, message);
            }
            Err(e) => {
                tracing::warn!("Bad frame from {}: {}", session.record().name, e);
            }
        }
    }
}
