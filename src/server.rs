//! WebSocket front-end
//!
//! One spawned task per connection, each owning its [`Session`]. Text frames
//! carry JSON messages in both directions; binary frames are ignored. The
//! per-frame analysis is synchronous, so a task suspends only while waiting for
//! the next inbound message or flushing replies.

use crate::config::{AnalyzerConfig, ServerConfig};
use crate::error::AnalysisError;
use crate::protocol::ServerMessage;
use crate::registry::SessionRegistry;
use crate::routine::RoutineStore;
use crate::session::Session;
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_websockets::{Message, ServerBuilder, WebSocketStream};
use tracing::{debug, info, warn};

/// Shared, read-only state handed to every connection task
#[derive(Clone)]
pub struct ServerState {
    pub analyzer: Arc<AnalyzerConfig>,
    pub registry: Arc<SessionRegistry>,
    pub store: Option<Arc<dyn RoutineStore>>,
    pub max_message_bytes: usize,
}

impl ServerState {
    pub fn new(analyzer: AnalyzerConfig, server: &ServerConfig) -> Self {
        Self {
            analyzer: Arc::new(analyzer),
            registry: Arc::new(SessionRegistry::new()),
            store: None,
            max_message_bytes: server.max_message_bytes,
        }
    }

    pub fn with_routine_store(mut self, store: Arc<dyn RoutineStore>) -> Self {
        self.store = Some(store);
        self
    }
}

/// A bound listener with its accept loop running in the background
pub struct PostureServer {
    local_addr: SocketAddr,
    registry: Arc<SessionRegistry>,
    accept_task: JoinHandle<()>,
}

impl PostureServer {
    /// Bind and start accepting connections
    pub async fn bind(addr: &str, state: ServerState) -> Result<Self, AnalysisError> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        let registry = state.registry.clone();
        info!(%local_addr, "posture server listening");

        let accept_task = tokio::spawn(accept_loop(listener, state));
        Ok(Self {
            local_addr,
            registry,
            accept_task,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Run until the accept loop ends
    pub async fn wait(&mut self) {
        if let Err(err) = (&mut self.accept_task).await {
            if !err.is_cancelled() {
                warn!(error = %err, "accept loop terminated");
            }
        }
    }

    pub fn shutdown(&self) {
        self.accept_task.abort();
    }
}

impl Drop for PostureServer {
    fn drop(&mut self) {
        self.accept_task.abort();
    }
}

async fn accept_loop(listener: TcpListener, state: ServerState) {
    loop {
        match listener.accept().await {
            Ok((tcp, peer)) => {
                let state = state.clone();
                tokio::spawn(async move {
                    match ServerBuilder::new().accept(tcp).await {
                        Ok((_request, ws)) => serve_connection(ws, peer, state).await,
                        Err(err) => warn!(%peer, error = %err, "websocket handshake failed"),
                    }
                });
            }
            Err(err) => {
                warn!(error = %err, "accept error");
                tokio::time::sleep(std::time::Duration::from_millis(100)).await;
            }
        }
    }
}

async fn serve_connection(mut ws: WebSocketStream<TcpStream>, peer: SocketAddr, state: ServerState) {
    let mut session = Session::new(state.analyzer.clone()).with_registry(
        state.registry.clone(),
        peer.to_string(),
        Utc::now(),
    );
    if let Some(store) = &state.store {
        session = session.with_routine_store(store.clone());
    }
    info!(session = %session.id(), %peer, "client connected");

    while let Some(next) = ws.next().await {
        let message = match next {
            Ok(message) => message,
            Err(err) => {
                warn!(session = %session.id(), error = %err, "connection error");
                break;
            }
        };
        let Some(text) = message.as_text() else {
            if message.is_binary() {
                debug!(session = %session.id(), "ignoring binary frame");
            }
            continue;
        };

        let replies = if text.len() > state.max_message_bytes {
            warn!(session = %session.id(), bytes = text.len(), "message too large");
            vec![ServerMessage::Error {
                message: format!(
                    "Message too large: {} bytes (limit {})",
                    text.len(),
                    state.max_message_bytes
                ),
                code: Some("MESSAGE_TOO_LARGE".to_string()),
                supported_exercises: None,
            }]
        } else {
            session.handle_text(text, Utc::now())
        };

        if let Err(err) = send_all(&mut ws, &replies).await {
            warn!(session = %session.id(), error = %err, "failed to send reply");
            break;
        }
    }

    info!(session = %session.id(), %peer, reps = session.rep_count(), "client disconnected");
}

async fn send_all(ws: &mut WebSocketStream<TcpStream>, replies: &[ServerMessage]) -> Result<(), tokio_websockets::Error> {
    for reply in replies {
        match reply.to_json() {
            Ok(json) => ws.feed(Message::text(json)).await?,
            Err(err) => warn!(error = %err, "failed to encode reply"),
        }
    }
    ws.flush().await
}
