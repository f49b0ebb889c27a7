//! TCP server for network subscribers
//!
//! Each connection runs one session:
//!
//! ```text
//! handshake ──ok──▶ register ──▶ forward broadcasts ┐
//!     │                          drain client reads ┴─▶ unregister
//!     └─version mismatch──▶ error reply, close
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use shared::message::{
    BusMessage, EventType, HandshakePayload, PROTOCOL_VERSION, ResponsePayload, SyncPayload,
};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::bus::MessageBus;
use super::transport::{TcpTransport, Transport};
use crate::utils::{AppError, ErrorCode};

/// `error_code` of a handshake rejected for its protocol version
pub const VERSION_MISMATCH: &str = "version_mismatch";

/// Time a rejected client gets to read the reply before the socket closes
const REJECT_LINGER: Duration = Duration::from_millis(100);

impl MessageBus {
    /// Bind the configured address and serve until shutdown
    pub async fn start_tcp_server(&self) -> Result<(), AppError> {
        let addr = self.config.tcp_listen_addr.clone();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| AppError::internal(format!("Failed to bind bus on {addr}: {e}")))?;
        self.serve(listener).await
    }

    /// Serve an already bound listener until shutdown
    pub async fn serve(&self, listener: TcpListener) -> Result<(), AppError> {
        if let Ok(addr) = listener.local_addr() {
            tracing::info!("Message bus listening on {}", addr);
        }

        loop {
            let accepted = tokio::select! {
                _ = self.shutdown_token().cancelled() => break,
                accepted = listener.accept() => accepted,
            };
            match accepted {
                Ok((stream, addr)) => {
                    let bus = self.clone();
                    tokio::spawn(async move {
                        if let Err(e) = run_session(bus, stream, addr).await {
                            tracing::debug!(%addr, "Bus session ended: {}", e);
                        }
                    });
                }
                Err(e) => tracing::error!("Bus accept failed: {}", e),
            }
        }

        tracing::info!("Message bus stopped accepting");
        Ok(())
    }
}

async fn run_session(bus: MessageBus, stream: TcpStream, addr: SocketAddr) -> Result<(), AppError> {
    let transport: Arc<dyn Transport> = Arc::new(TcpTransport::from_stream(stream));

    // Subscribe before the handshake reply: anything published after the
    // client sees "connected" must reach it
    let rx = bus.subscribe();
    let client_id = accept_handshake(transport.as_ref()).await?;

    bus.clients.insert(client_id.clone(), transport.clone());
    tracing::info!(client_id = %client_id, %addr, "Bus client registered");

    let session = bus.shutdown_token().child_token();
    let forwarder = tokio::spawn(forward(
        transport.clone(),
        rx,
        client_id.clone(),
        session.clone(),
    ));
    drain(transport.as_ref(), &client_id, &session).await;

    session.cancel();
    let _ = forwarder.await;
    let _ = transport.close().await;
    bus.clients.remove(&client_id);
    tracing::info!(client_id = %client_id, "Bus client removed");
    Ok(())
}

/// Validate the client hello and answer it; returns the client id
async fn accept_handshake(transport: &dyn Transport) -> Result<String, AppError> {
    let hello = transport.read_message().await?;
    if hello.event_type != EventType::Handshake {
        return Err(AppError::invalid(format!(
            "Expected handshake, got {}",
            hello.event_type
        )));
    }
    let payload: HandshakePayload = hello
        .parse_payload()
        .map_err(|e| AppError::invalid(format!("Malformed handshake: {e}")))?;

    if payload.version != PROTOCOL_VERSION {
        let reason = format!(
            "Protocol version mismatch: server={}, client={}",
            PROTOCOL_VERSION, payload.version
        );
        tracing::warn!(client = ?payload.client_name, "{}", reason);
        reply(
            transport,
            &hello,
            ResponsePayload::error(reason.clone(), Some(VERSION_MISMATCH.to_string())),
        )
        .await;
        tokio::time::sleep(REJECT_LINGER).await;
        return Err(AppError::invalid(reason));
    }

    let client_id = payload
        .client_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    tracing::debug!(
        client_id = %client_id,
        client = ?payload.client_name,
        client_version = ?payload.client_version,
        "Handshake accepted"
    );
    reply(
        transport,
        &hello,
        ResponsePayload::success(format!("Connected as client: {client_id}"), None),
    )
    .await;
    Ok(client_id)
}

async fn reply(transport: &dyn Transport, request: &BusMessage, payload: ResponsePayload) {
    let msg = match BusMessage::response(&payload) {
        Ok(msg) => msg.with_correlation_id(request.request_id),
        Err(e) => {
            tracing::error!("Failed to encode handshake reply: {}", e);
            return;
        }
    };
    if let Err(e) = transport.write_message(&msg).await {
        tracing::warn!("Handshake reply not delivered: {}", e);
    }
}

/// Copy broadcasts to the client until the session ends
///
/// A lagging receiver gets one resync message in place of what it missed.
async fn forward(
    transport: Arc<dyn Transport>,
    mut rx: broadcast::Receiver<BusMessage>,
    client_id: String,
    session: CancellationToken,
) {
    loop {
        let msg = tokio::select! {
            _ = session.cancelled() => break,
            received = rx.recv() => match received {
                Ok(msg) => msg,
                Err(RecvError::Lagged(dropped)) => {
                    tracing::warn!(client_id = %client_id, dropped, "Bus client lagged, sending resync");
                    match BusMessage::sync(&SyncPayload::resync(dropped)) {
                        Ok(msg) => msg,
                        Err(e) => {
                            tracing::error!("Failed to encode resync: {}", e);
                            continue;
                        }
                    }
                }
                Err(RecvError::Closed) => break,
            },
        };

        if let Err(e) = transport.write_message(&msg).await {
            tracing::debug!(client_id = %client_id, "Bus write failed: {}", e);
            break;
        }
    }
    session.cancel();
}

/// Read and discard client frames until it hangs up or the session ends
async fn drain(transport: &dyn Transport, client_id: &str, session: &CancellationToken) {
    loop {
        let read = tokio::select! {
            _ = session.cancelled() => return,
            read = transport.read_message() => read,
        };
        match read {
            Ok(msg) => {
                tracing::debug!(client_id, event_type = %msg.event_type, "Ignoring client frame");
            }
            Err(e) if e.code == ErrorCode::ClientDisconnected => {
                tracing::debug!(client_id, "Bus client hung up");
                return;
            }
            Err(e) => {
                tracing::debug!(client_id, "Bus read error: {}", e);
                return;
            }
        }
    }
}
