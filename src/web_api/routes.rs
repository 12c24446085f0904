//! API Routes

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::HeaderMap,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;

use super::camera_usage_routes;
use crate::error::Result;
use crate::models::ApiResponse;
use crate::state::AppState;
use crate::user_registry::PrincipalSummary;

/// Create API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health & Status
        .route("/healthz", get(super::health_check))
        .route("/api/status", get(super::device_status))
        // Camera usage
        .nest("/api", camera_usage_routes())
        // Health-exchange integration
        .route("/api/exchange/whoami", get(exchange_whoami))
        // WebSocket
        .route("/api/ws", get(websocket_handler))
        .with_state(state)
}

/// Connectivity check for the health exchange. Authenticated with the
/// exchange scheme only; answers with the service principal it resolved.
async fn exchange_whoami(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse> {
    let ctx = state.auth.authenticate_health_exchange(&headers).await?;
    Ok(Json(ApiResponse::success(PrincipalSummary::from(
        &ctx.principal,
    ))))
}

#[derive(Debug, Deserialize)]
struct WsQuery {
    /// Direct bearer token for clients that cannot set headers on upgrade
    token: Option<String>,
}

async fn websocket_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse> {
    let ctx = match &query.token {
        Some(token) => state.auth.authenticate_direct(token).await?,
        None => state.auth.authenticate(&headers).await?,
    };

    let username = ctx.principal.username;
    Ok(ws.on_upgrade(move |socket| handle_websocket(socket, state, username)))
}

/// Handle WebSocket connection
async fn handle_websocket(socket: WebSocket, state: AppState, username: String) {
    let (mut sender, mut receiver) = socket.split();

    let (conn_id, mut rx) = state.realtime.register(username).await;

    tracing::info!(connection_id = %conn_id, "WebSocket client connected");

    // Forward hub messages to the socket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg)).await.is_err() {
                break;
            }
        }
    });

    // Drain incoming frames until the client goes away
    let recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Close(_)) => {
                    tracing::info!(connection_id = %conn_id, "WebSocket client disconnected");
                    break;
                }
                Err(e) => {
                    tracing::warn!(connection_id = %conn_id, error = %e, "WebSocket error");
                    break;
                }
                _ => {}
            }
        }
        conn_id
    });

    let conn_id = tokio::select! {
        _ = send_task => conn_id,
        result = recv_task => result.unwrap_or(conn_id),
    };

    state.realtime.unregister(&conn_id).await;
}
