//! HTTP Server-Sent-Events transport.
//!
//! `GET /sse` opens a stream whose first event (`endpoint`) names the URL the
//! client must POST its JSON-RPC messages to. Every stream gets its own
//! [`CodexMcpServer`], connected through an in-memory pipe that carries
//! newline-delimited JSON-RPC, the same framing the stdio transport uses.

use std::{convert::Infallible, sync::Arc};

use anyhow::{Context, Result};
use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use dashmap::DashMap;
use rmcp::ServiceExt;
use serde::Deserialize;
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    sync::mpsc,
};
use tokio_stream::{Stream, StreamExt, wrappers::LinesStream};
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

use super::CodexMcpServer;
use crate::config::Settings;

pub const SSE_PATH: &str = "/sse";
pub const MESSAGE_PATH: &str = "/message";

const PIPE_BUFFER: usize = 64 * 1024;
const INBOX_CAPACITY: usize = 32;

#[derive(Clone)]
struct SseState {
    settings: Arc<Settings>,
    connections: Arc<DashMap<String, mpsc::Sender<String>>>,
}

/// Removes the connection from the routing table when its event stream is
/// dropped, which closes the server's input and ends the server.
struct ConnectionGuard {
    id: String,
    connections: Arc<DashMap<String, mpsc::Sender<String>>>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.connections.remove(&self.id);
        tracing::info!(session = %self.id, "SSE client disconnected");
    }
}

#[derive(Debug, Deserialize)]
struct MessageQuery {
    #[serde(rename = "sessionId")]
    session_id: String,
}

pub fn router(settings: Settings) -> Router {
    let state = SseState {
        settings: Arc::new(settings),
        connections: Arc::new(DashMap::new()),
    };

    Router::new()
        .route(SSE_PATH, get(open_stream))
        .route(MESSAGE_PATH, post(post_message))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

/// Serve the SSE transport until Ctrl+C.
pub async fn serve(settings: Settings, host: &str, port: u16) -> Result<()> {
    let listener = tokio::net::TcpListener::bind((host, port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", host, port))?;
    tracing::info!(
        "Starting Codex MCP server in SSE mode on http://{}",
        listener.local_addr()?
    );

    axum::serve(listener, router(settings))
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutting down");
            }
        })
        .await?;

    Ok(())
}

async fn open_stream(
    State(state): State<SseState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let id = Uuid::new_v4().simple().to_string();
    let (server_io, client_io) = tokio::io::duplex(PIPE_BUFFER);
    let (client_read, mut client_write) = tokio::io::split(client_io);
    let (tx, mut rx) = mpsc::channel::<String>(INBOX_CAPACITY);
    state.connections.insert(id.clone(), tx);
    tracing::info!(session = %id, "SSE client connected");

    tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let framed = format!("{}\n", message);
            if client_write.write_all(framed.as_bytes()).await.is_err() {
                break;
            }
        }
        let _ = client_write.shutdown().await;
    });

    let server = CodexMcpServer::new((*state.settings).clone());
    let server_id = id.clone();
    tokio::spawn(async move {
        match server.serve(tokio::io::split(server_io)).await {
            Ok(running) => {
                if let Err(err) = running.waiting().await {
                    tracing::warn!(session = %server_id, "MCP server task failed: {}", err);
                }
            }
            Err(err) => {
                tracing::warn!(session = %server_id, "MCP initialization failed: {}", err)
            }
        }
        tracing::debug!(session = %server_id, "MCP server stopped");
    });

    let endpoint = Event::default()
        .event("endpoint")
        .data(format!("{}?sessionId={}", MESSAGE_PATH, id));
    let guard = ConnectionGuard {
        id,
        connections: state.connections.clone(),
    };
    let messages = LinesStream::new(BufReader::new(client_read).lines())
        .map_while(Result::ok)
        .map(move |line| {
            let _ = &guard;
            Ok::<_, Infallible>(Event::default().event("message").data(line))
        });

    let events = tokio_stream::once(Ok::<_, Infallible>(endpoint)).chain(messages);
    Sse::new(events).keep_alive(KeepAlive::default())
}

async fn post_message(
    State(state): State<SseState>,
    Query(query): Query<MessageQuery>,
    body: String,
) -> Response {
    let Some(tx) = state
        .connections
        .get(&query.session_id)
        .map(|entry| entry.value().clone())
    else {
        return (StatusCode::NOT_FOUND, "Unknown session").into_response();
    };

    // Re-serialize so the message is guaranteed to fit on one line.
    let message: serde_json::Value = match serde_json::from_str(&body) {
        Ok(value) => value,
        Err(err) => {
            return (
                StatusCode::BAD_REQUEST,
                format!("Invalid JSON-RPC message: {}", err),
            )
                .into_response();
        }
    };

    if tx.send(message.to_string()).await.is_err() {
        return (StatusCode::GONE, "Session closed").into_response();
    }

    StatusCode::ACCEPTED.into_response()
}
