//! End-to-end sessions over loopback TCP.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use voicechat_network::{
    ClientId, ClientMessage, ClientRecord, NetworkError, PlayerState, ServerMessage, UpdateState,
    COMPATIBILITY_VERSION, MAX_NAME_LEN,
};
use voicechat_server::{
    network::io::{read_message, write_message},
    ClientHub, PlayerStateManager, ServerConfig, ServerMetrics, VoiceServer,
};

const STEP: Duration = Duration::from_secs(5);

struct Running {
    addr: SocketAddr,
    hub: Arc<ClientHub>,
    manager: Arc<PlayerStateManager>,
}

async fn start(handshake_timeout: Duration) -> Running {
    let config = ServerConfig {
        bind_address: "127.0.0.1:0".to_string(),
        handshake_timeout,
        metrics_interval: None,
        ..ServerConfig::default()
    };
    let hub = Arc::new(ClientHub::new(Arc::new(ServerMetrics::default())));
    let manager = PlayerStateManager::new(hub.clone(), hub.clone());

    let server = VoiceServer::bind(&config, hub.clone(), manager.clone())
        .await
        .unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.run());

    Running { addr, hub, manager }
}

async fn hello(addr: SocketAddr, id: ClientId, name: &str, version: u32) -> TcpStream {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let message = ClientMessage::Hello {
        id,
        name: name.to_string(),
        compatibility_version: version,
    };
    write_message(&mut stream, &message).await.unwrap();
    stream
}

async fn next(stream: &mut TcpStream) -> ServerMessage {
    tokio::time::timeout(STEP, read_message::<ServerMessage, _>(stream))
        .await
        .expect("server reply in time")
        .unwrap()
}

async fn send_update(stream: &mut TcpStream, disconnected: bool, disabled: bool) {
    let update = ClientMessage::UpdateState(UpdateState {
        disconnected,
        disabled,
    });
    write_message(stream, &update).await.unwrap();
}

async fn expect_closed(stream: &mut TcpStream) {
    let closed = tokio::time::timeout(STEP, read_message::<ServerMessage, _>(stream))
        .await
        .expect("connection closed in time");
    assert!(closed.is_err(), "expected closed stream, got {closed:?}");
}

async fn wait_for<F: Fn() -> bool>(condition: F) {
    tokio::time::timeout(STEP, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition reached in time");
}

#[tokio::test]
async fn compatible_client_gets_login_broadcast_then_snapshot() {
    let server = start(Duration::from_secs(5)).await;
    let id = ClientId::new_v4();
    let mut stream = hello(server.addr, id, "X", COMPATIBILITY_VERSION).await;

    let default = PlayerState::new(id, "X", false, true);
    assert_eq!(next(&mut stream).await, ServerMessage::PlayerState(default.clone()));
    assert_eq!(
        next(&mut stream).await,
        ServerMessage::PlayerStates(vec![default])
    );

    send_update(&mut stream, true, false).await;

    let updated = PlayerState::new(id, "X", true, false);
    assert_eq!(next(&mut stream).await, ServerMessage::PlayerState(updated.clone()));
    assert_eq!(server.manager.state(id), Some(updated));
}

#[tokio::test]
async fn other_clients_see_join_and_leave() {
    let server = start(Duration::from_secs(5)).await;
    let x = ClientId::new_v4();
    let mut x_stream = hello(server.addr, x, "X", COMPATIBILITY_VERSION).await;
    next(&mut x_stream).await;
    next(&mut x_stream).await;

    let y = ClientId::new_v4();
    let y_stream = hello(server.addr, y, "Y", COMPATIBILITY_VERSION).await;
    assert_eq!(
        next(&mut x_stream).await,
        ServerMessage::PlayerState(PlayerState::new(y, "Y", false, true))
    );

    drop(y_stream);
    assert_eq!(
        next(&mut x_stream).await,
        ServerMessage::PlayerState(PlayerState::new(y, "Y", true, true))
    );
    wait_for(|| server.manager.state(y).is_none()).await;
    assert!(!server.hub.is_connected(y));
}

#[tokio::test]
async fn incompatible_client_is_told_and_dropped() {
    let server = start(Duration::from_secs(5)).await;
    let id = ClientId::new_v4();
    let mut stream = hello(server.addr, id, "old", COMPATIBILITY_VERSION + 1).await;

    // Login precedes the version check, so the join broadcast arrives first.
    assert!(matches!(next(&mut stream).await, ServerMessage::PlayerState(_)));
    assert_eq!(
        next(&mut stream).await,
        ServerMessage::Incompatible {
            server_version: COMPATIBILITY_VERSION
        }
    );

    let closed = tokio::time::timeout(STEP, read_message::<ServerMessage, _>(&mut stream))
        .await
        .expect("connection closed in time");
    assert!(matches!(closed, Err(NetworkError::ConnectionClosed)));

    wait_for(|| !server.hub.is_connected(id)).await;
    assert_eq!(server.manager.state(id), None);
    assert_eq!(
        server
            .hub
            .metrics()
            .rejected_clients
            .load(std::sync::atomic::Ordering::Relaxed),
        1
    );
}

#[tokio::test]
async fn silent_connection_times_out() {
    let server = start(Duration::from_millis(100)).await;
    let mut stream = TcpStream::connect(server.addr).await.unwrap();

    let closed = tokio::time::timeout(STEP, read_message::<ServerMessage, _>(&mut stream))
        .await
        .expect("connection closed in time");
    assert!(matches!(closed, Err(NetworkError::ConnectionClosed)));
    assert_eq!(server.hub.client_count(), 0);
}

#[tokio::test]
async fn overlong_name_is_rejected_before_login() {
    let server = start(Duration::from_secs(5)).await;
    let id = ClientId::new_v4();
    let name = "n".repeat(MAX_NAME_LEN + 1);
    let mut stream = hello(server.addr, id, &name, COMPATIBILITY_VERSION).await;

    expect_closed(&mut stream).await;
    assert_eq!(server.hub.client_count(), 0);
    assert_eq!(server.manager.state(id), None);
}

#[tokio::test]
async fn name_at_limit_is_accepted() {
    let server = start(Duration::from_secs(5)).await;
    let id = ClientId::new_v4();
    let name = "n".repeat(MAX_NAME_LEN);
    let mut stream = hello(server.addr, id, &name, COMPATIBILITY_VERSION).await;

    assert_eq!(
        next(&mut stream).await,
        ServerMessage::PlayerState(PlayerState::new(id, name, false, true))
    );
}

#[tokio::test]
async fn failed_snapshot_write_ends_session() {
    let server = start(Duration::from_secs(5)).await;
    // Entries created without a connection, large enough that the
    // snapshot exceeds the frame limit.
    for _ in 0..3 {
        let record = ClientRecord::new(ClientId::new_v4(), "w".repeat(30_000));
        server.manager.set_group(&record, None);
    }

    let z = ClientId::new_v4();
    let mut stream = hello(server.addr, z, "Z", COMPATIBILITY_VERSION).await;
    assert_eq!(
        next(&mut stream).await,
        ServerMessage::PlayerState(PlayerState::new(z, "Z", false, true))
    );

    expect_closed(&mut stream).await;
    wait_for(|| !server.hub.is_connected(z)).await;
    wait_for(|| server.manager.state(z).is_none()).await;
}

#[tokio::test]
async fn superseded_socket_cannot_change_state() {
    let server = start(Duration::from_secs(5)).await;
    let id = ClientId::new_v4();
    let mut old = hello(server.addr, id, "X", COMPATIBILITY_VERSION).await;
    next(&mut old).await;
    next(&mut old).await;

    let mut new = hello(server.addr, id, "X", COMPATIBILITY_VERSION).await;
    let default = PlayerState::new(id, "X", false, true);
    assert_eq!(next(&mut new).await, ServerMessage::PlayerState(default.clone()));
    assert_eq!(
        next(&mut new).await,
        ServerMessage::PlayerStates(vec![default.clone()])
    );

    // The replaced session is shut down; a late update on it goes nowhere.
    expect_closed(&mut old).await;
    let _ = write_message(
        &mut old,
        &ClientMessage::UpdateState(UpdateState {
            disconnected: true,
            disabled: false,
        }),
    )
    .await;

    assert!(server.hub.is_connected(id));
    assert_eq!(server.manager.state(id), Some(default));

    // The next broadcast the live session sees is its own update.
    send_update(&mut new, false, false).await;
    assert_eq!(
        next(&mut new).await,
        ServerMessage::PlayerState(PlayerState::new(id, "X", false, false))
    );
}
