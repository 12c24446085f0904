//! Camera usage API routes
//!
//! Exclusive camera access: acquire, request, release, status. Every
//! endpoint authenticates the caller through the gateway (direct and
//! middleware schemes); lock contention is a 200 with `locked: false`,
//! never an error status.

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use crate::camera_usage::{AcquireOutcome, UsageStatus};
use crate::error::{Error, Result};
use crate::facility_registry::{Asset, DirectoryStore};
use crate::state::AppState;
use crate::user_registry::PrincipalSummary;

/// Create camera usage API router
pub fn camera_usage_routes() -> Router<AppState> {
    Router::new()
        .route("/cameras/:asset_id/acquire", post(acquire_camera))
        .route("/cameras/:asset_id/request_access", post(request_access))
        .route("/cameras/:asset_id/release", post(release_camera))
        .route("/cameras/:asset_id/cancel_request", post(cancel_request))
        .route("/cameras/:asset_id/usage", get(usage_status))
}

async fn load_asset(state: &AppState, asset_id: &str) -> Result<Asset> {
    state
        .directory
        .asset_by_external_id(asset_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Asset '{asset_id}' not found")))
}

fn outcome_body(outcome: AcquireOutcome) -> serde_json::Value {
    match outcome {
        AcquireOutcome::Locked => json!({
            "ok": true,
            "data": { "locked": true }
        }),
        AcquireOutcome::Queued { queue_length } => json!({
            "ok": true,
            "data": { "locked": false, "queue_length": queue_length }
        }),
    }
}

/// Take (or renew) the camera lock
async fn acquire_camera(
    State(state): State<AppState>,
    Path(asset_id): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse> {
    let ctx = state.auth.authenticate(&headers).await?;
    let asset = load_asset(&state, &asset_id).await?;

    let outcome = state.usage.acquire(&asset.external_id, &ctx.principal).await?;
    Ok(Json(outcome_body(outcome)))
}

/// Take the lock, or queue up and nudge the current holder
async fn request_access(
    State(state): State<AppState>,
    Path(asset_id): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse> {
    let ctx = state.auth.authenticate(&headers).await?;
    let asset = load_asset(&state, &asset_id).await?;

    let outcome = state
        .usage
        .request_access(&asset.external_id, &ctx.principal)
        .await?;
    Ok(Json(outcome_body(outcome)))
}

/// Release the lock (holder) or leave the queue (anyone else)
async fn release_camera(
    State(state): State<AppState>,
    Path(asset_id): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse> {
    let ctx = state.auth.authenticate(&headers).await?;
    let asset = load_asset(&state, &asset_id).await?;

    state.usage.release(&asset.external_id, &ctx.principal).await?;
    Ok(Json(json!({
        "ok": true,
        "data": { "released": true }
    })))
}

/// Leave the waiting list without touching the lock
async fn cancel_request(
    State(state): State<AppState>,
    Path(asset_id): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse> {
    let ctx = state.auth.authenticate(&headers).await?;
    let asset = load_asset(&state, &asset_id).await?;

    state
        .usage
        .cancel_request(&asset.external_id, &ctx.principal)
        .await?;
    Ok(Json(json!({
        "ok": true,
        "data": { "cancelled": true }
    })))
}

/// Current usage state of a camera
async fn usage_status(
    State(state): State<AppState>,
    Path(asset_id): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse> {
    let ctx = state.auth.authenticate(&headers).await?;
    let asset = load_asset(&state, &asset_id).await?;

    let has_access = state
        .usage
        .has_access(&asset.external_id, &ctx.principal)
        .await?;
    let current_holder = state
        .usage
        .current_holder(&asset.external_id)
        .await?
        .map(|p| PrincipalSummary::from(&p));
    let waiting = state
        .usage
        .waiting_list(&asset.external_id)
        .await?
        .iter()
        .map(PrincipalSummary::from)
        .collect();

    let status = UsageStatus {
        asset_id: asset.external_id,
        has_access,
        current_holder,
        waiting,
    };

    Ok(Json(json!({
        "ok": true,
        "data": status
    })))
}
