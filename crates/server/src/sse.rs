// SSE transport: long-lived GET event streams fed by correlated POSTs
//
// HTTP is request/response, but a session needs a persistent push channel.
// Each GET on /sse opens one session whose responses stream back as events;
// the client learns its per-session POST URL from the first event and
// submits messages on /messages, correlated by session id.

use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tokio_stream::wrappers::ReceiverStream;
use tower_http::trace::TraceLayer;
use utility_mcp::protocol::{JsonRpcRequest, ServerInfo};
use utility_mcp::{Dispatcher, Session, ToolRegistry};
use uuid::Uuid;

const CHANNEL_CAPACITY: usize = 32;

/// Live sessions: id → inbound channel. Inserted on GET accept, looked up
/// by POST handlers, removed when the stream closes. The one piece of
/// shared mutable state in the transport.
type SessionMap = Arc<RwLock<HashMap<Uuid, mpsc::Sender<JsonRpcRequest>>>>;

/// State shared across all HTTP handlers
#[derive(Clone)]
pub struct SseState {
    registry: Arc<ToolRegistry>,
    info: ServerInfo,
    instructions: Option<String>,
    sessions: SessionMap,
}

impl SseState {
    pub fn new(registry: Arc<ToolRegistry>, info: ServerInfo, instructions: Option<String>) -> Self {
        Self {
            registry,
            info,
            instructions,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn live_sessions(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// Bind and run the SSE server
pub async fn serve(addr: &str, state: SseState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Remote MCP server listening on http://{}", addr);
    tracing::info!("  SSE endpoint:     http://{}/sse", addr);
    tracing::info!("  Message endpoint: http://{}/messages", addr);

    axum::serve(listener, router(state)).await?;

    Ok(())
}

/// Create the transport router: stream endpoint, message endpoint, and a
/// 404 for every other method/path combination.
pub fn router(state: SseState) -> Router {
    Router::new()
        .route("/sse", get(open_session))
        .route("/messages", post(deliver_message))
        .fallback(not_found)
        .method_not_allowed_fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn open_session(State(state): State<SseState>) -> impl IntoResponse {
    let mut session = Session::new(
        Dispatcher::new(state.registry.clone()),
        state.info.clone(),
        state.instructions.clone(),
    );
    let session_id = session.id();

    let (inbound_tx, mut inbound_rx) = mpsc::channel::<JsonRpcRequest>(CHANNEL_CAPACITY);
    let (outbound_tx, outbound_rx) = mpsc::channel::<Result<Event, Infallible>>(CHANNEL_CAPACITY);

    state.sessions.write().await.insert(session_id, inbound_tx);

    // The client learns where to POST from the very first event; no extra
    // handshake round-trip needed.
    let endpoint = format!("/messages?session_id={}", session_id);
    let _ = outbound_tx
        .send(Ok(Event::default().event("endpoint").data(endpoint)))
        .await;

    let sessions = state.sessions.clone();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                // The receiver half lives inside the HTTP response body;
                // when the client disconnects it is dropped and this fires.
                _ = outbound_tx.closed() => break,
                inbound = inbound_rx.recv() => {
                    let Some(request) = inbound else { break };
                    let Some(response) = session.handle(request).await else { continue };
                    match serde_json::to_string(&response) {
                        Ok(json) => {
                            let event = Event::default().event("message").data(json);
                            if outbound_tx.send(Ok(event)).await.is_err() {
                                break;
                            }
                        }
                        Err(err) => {
                            tracing::error!(session = %session_id, "failed to encode response: {}", err);
                        }
                    }
                }
            }
        }
        session.close();
        sessions.write().await.remove(&session_id);
        tracing::info!(session = %session_id, "SSE session closed");
    });

    tracing::info!(session = %session_id, "SSE session open");
    Sse::new(ReceiverStream::new(outbound_rx)).keep_alive(KeepAlive::default())
}

#[derive(Debug, Deserialize)]
struct MessageParams {
    session_id: Uuid,
}

async fn deliver_message(
    State(state): State<SseState>,
    Query(params): Query<MessageParams>,
    body: String,
) -> impl IntoResponse {
    let request: JsonRpcRequest = match serde_json::from_str(&body) {
        Ok(request) => request,
        Err(err) => {
            return (StatusCode::BAD_REQUEST, format!("invalid message: {}", err));
        }
    };

    // Clone the sender out so no lock is held while awaiting delivery.
    let sender = state.sessions.read().await.get(&params.session_id).cloned();
    let Some(sender) = sender else {
        tracing::warn!(session = %params.session_id, "POST for unknown session");
        return (
            StatusCode::NOT_FOUND,
            format!("session not found: {}", params.session_id),
        );
    };

    if sender.send(request).await.is_err() {
        // Session task exited between lookup and delivery.
        return (
            StatusCode::NOT_FOUND,
            format!("session closed: {}", params.session_id),
        );
    }

    (StatusCode::ACCEPTED, "Accepted".to_string())
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not Found")
}
